//! DTOs for game_states_sea adapter.

/// Columns written on every checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameStateWrite {
    pub room_id: i64,
    pub phase: String,
    pub day_number: i32,
    pub state_json: String,
}

impl GameStateWrite {
    pub fn new(room_id: i64, state_json: impl Into<String>) -> Self {
        Self {
            room_id,
            phase: String::new(),
            day_number: 0,
            state_json: state_json.into(),
        }
    }

    pub fn with_phase(mut self, phase: impl Into<String>, day_number: i32) -> Self {
        self.phase = phase.into();
        self.day_number = day_number;
        self
    }
}
