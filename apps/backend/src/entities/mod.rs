pub mod game_states;
