use std::time::Duration;

use werewolf_backend::ai::{DecisionTask, HeuristicGateway};
use werewolf_backend::domain::{Action, Audience, Phase, SubPhase, Team};
use werewolf_backend::events::GameEvent;
use werewolf_backend::repos::InMemoryGameStates;

use crate::support::event_helpers::{position, until};
use crate::support::room_builder::{
    registry_with, table, test_config, TestRoom, FOUR_SEATS, ROOM, TEN_SEATS,
};
use crate::support::scripted_gateway::ScriptedGateway;

fn is_step(event: &GameEvent, phase: Phase, sub: Option<SubPhase>) -> bool {
    matches!(event, GameEvent::PhaseChange { phase: p, sub_phase: s, .. } if *p == phase && *s == sub)
}

#[tokio::test]
async fn night_kill_on_hunter_is_revealed_before_the_revenge_shot() {
    let gw = ScriptedGateway::new().decide_for(1, DecisionTask::WerewolfKill, Action::Kill { target: 5 });
    let t = TestRoom::new(gw);
    t.registry.open_room(ROOM, table(&TEN_SEATS, &[5])).unwrap();
    let mut sub = t.registry.subscribe(ROOM, Audience::Operator).await.unwrap();
    t.registry.start_game(ROOM).await.unwrap();

    let events = until(&mut sub.events, |e| {
        matches!(e, GameEvent::RequestAction { seat: 5, task: DecisionTask::HunterShot })
    })
    .await;

    let dawn = position(&events, |e| is_step(e, Phase::Dawn, None)).expect("dawn reveal");
    let death = position(&events, |e| matches!(e, GameEvent::Death { seat: 5, day: 1 }))
        .expect("hunter death announced");
    let hunter = position(&events, |e| is_step(e, Phase::Dawn, Some(SubPhase::Hunter)))
        .expect("hunter sub-phase");
    assert!(dawn < death && death < hunter);

    let view = t.registry.snapshot(ROOM, Audience::Operator).await.unwrap();
    assert_eq!((view.phase, view.sub_phase), (Phase::Dawn, Some(SubPhase::Hunter)));
    assert_eq!(view.day_number, 1);
    assert!(!view.seats[4].is_alive);
    assert!(view.waiting_for_human_input);

    // the dead hunter takes a wolf along
    t.registry
        .submit_human_night_action(ROOM, 5, Action::Shoot { target: 1 })
        .await
        .unwrap();
    let events = until(&mut sub.events, |e| {
        is_step(e, Phase::Day, Some(SubPhase::Announcement))
    })
    .await;
    assert!(position(&events, |e| matches!(e, GameEvent::Death { seat: 1, .. })).is_some());

    let view = t.registry.snapshot(ROOM, Audience::Operator).await.unwrap();
    assert!(!view.seats[0].is_alive);
    t.registry.close_room(ROOM).await.unwrap();
}

#[tokio::test]
async fn plurality_vote_eliminates_the_leader() {
    let gw = ScriptedGateway::new()
        .vote_for(1, Some(2))
        .vote_for(2, None)
        .vote_for(3, Some(2))
        .vote_for(4, Some(3));
    let t = TestRoom::new(gw);
    t.registry.open_room(ROOM, table(&FOUR_SEATS, &[])).unwrap();
    let mut sub = t.registry.subscribe(ROOM, Audience::Public).await.unwrap();
    t.registry.start_game(ROOM).await.unwrap();

    let events = until(&mut sub.events, |e| matches!(e, GameEvent::VoteResult { .. })).await;
    let Some(GameEvent::VoteResult {
        tally,
        abstentions,
        eliminated,
        is_tie,
    }) = events.last().map(|e| e.event.clone())
    else {
        unreachable!()
    };
    assert_eq!(tally.get(&2), Some(&2));
    assert_eq!(tally.get(&3), Some(&1));
    assert_eq!(abstentions, 1);
    assert_eq!(eliminated, Some(2));
    assert!(!is_tie);

    // the eliminated seat gets the floor for last words
    until(&mut sub.events, |e| {
        matches!(e, GameEvent::RequestSpeech { seat: 2, task: DecisionTask::LastWords, .. })
    })
    .await;
    let view = t.registry.snapshot(ROOM, Audience::Operator).await.unwrap();
    assert!(!view.seats[1].is_alive);
    t.registry.close_room(ROOM).await.unwrap();
}

#[tokio::test]
async fn tied_vote_eliminates_nobody() {
    let gw = ScriptedGateway::new()
        .vote_for(1, Some(2))
        .vote_for(2, Some(3))
        .vote_for(3, Some(2))
        .vote_for(4, Some(3));
    let t = TestRoom::new(gw);
    t.registry.open_room(ROOM, table(&FOUR_SEATS, &[])).unwrap();
    let mut sub = t.registry.subscribe(ROOM, Audience::Public).await.unwrap();
    t.registry.start_game(ROOM).await.unwrap();

    let events = until(&mut sub.events, |e| matches!(e, GameEvent::VoteResult { .. })).await;
    match &events.last().unwrap().event {
        GameEvent::VoteResult {
            eliminated, is_tie, ..
        } => {
            assert_eq!(*eliminated, None);
            assert!(*is_tie);
        }
        other => panic!("unexpected {other:?}"),
    }

    // no last words after a tie; the day ends
    let events = until(&mut sub.events, |e| {
        is_step(e, Phase::Result, Some(SubPhase::Continue))
    })
    .await;
    assert!(position(&events, |e| is_step(e, Phase::Day, Some(SubPhase::LastWords))).is_none());
    let view = t.registry.snapshot(ROOM, Audience::Public).await.unwrap();
    assert!(view.seats.iter().all(|s| s.is_alive));
    t.registry.close_room(ROOM).await.unwrap();
}

#[tokio::test]
async fn discussion_follows_seat_order() {
    let t = TestRoom::new(ScriptedGateway::new());
    t.registry.open_room(ROOM, table(&TEN_SEATS, &[])).unwrap();
    let mut sub = t.registry.subscribe(ROOM, Audience::Public).await.unwrap();
    t.registry.start_game(ROOM).await.unwrap();

    let events = until(&mut sub.events, |e| {
        is_step(e, Phase::Day, Some(SubPhase::Vote))
    })
    .await;
    let speakers: Vec<u8> = events
        .iter()
        .filter_map(|e| match e.event {
            GameEvent::RequestSpeech {
                seat,
                task: DecisionTask::Speech,
                ..
            } => Some(seat),
            _ => None,
        })
        .collect();
    // the pack skipped its kill, so everybody speaks
    assert_eq!(speakers, (1..=10).collect::<Vec<_>>());
    assert_eq!(
        t.gateway.calls_for(DecisionTask::Speech),
        (1..=10).collect::<Vec<_>>()
    );
    t.registry.close_room(ROOM).await.unwrap();
}

#[tokio::test]
async fn night_runs_werewolf_then_seer_then_witch() {
    let t = TestRoom::new(ScriptedGateway::new());
    t.registry.open_room(ROOM, table(&TEN_SEATS, &[])).unwrap();
    let mut sub = t.registry.subscribe(ROOM, Audience::Public).await.unwrap();
    t.registry.start_game(ROOM).await.unwrap();

    let events = until(&mut sub.events, |e| is_step(e, Phase::Dawn, None)).await;
    let night: Vec<SubPhase> = events
        .iter()
        .filter_map(|e| match e.event {
            GameEvent::PhaseChange {
                phase: Phase::Night,
                sub_phase: Some(sub),
                ..
            } => Some(sub),
            _ => None,
        })
        .collect();
    assert_eq!(night, vec![SubPhase::Werewolf, SubPhase::Seer, SubPhase::Witch]);
    t.registry.close_room(ROOM).await.unwrap();
}

#[tokio::test]
async fn all_ai_game_runs_to_a_winner() {
    let store = InMemoryGameStates::shared();
    let config = test_config();
    let registry = registry_with(
        std::sync::Arc::new(HeuristicGateway::new(Some(11))),
        store.clone(),
        config,
    );
    registry.open_room(ROOM, table(&TEN_SEATS, &[])).unwrap();
    registry.start_game(ROOM).await.unwrap();

    let winner = tokio::time::timeout(Duration::from_secs(60), registry.wait_for_game_over(ROOM))
        .await
        .expect("game did not finish in time")
        .unwrap();
    assert!(matches!(winner, Team::Villagers | Team::Werewolves));

    let view = registry.snapshot(ROOM, Audience::Public).await.unwrap();
    assert_eq!((view.phase, view.sub_phase), (Phase::Result, Some(SubPhase::GameOver)));
    assert_eq!(view.winner, Some(winner));
    // roles are revealed once the game is over
    assert!(view.seats.iter().all(|s| s.role.is_some()));

    // the finished game's checkpoint goes away with the room
    assert!(store.lock_version(ROOM).is_some());
    registry.close_room(ROOM).await.unwrap();
    assert!(store.lock_version(ROOM).is_none());
}
