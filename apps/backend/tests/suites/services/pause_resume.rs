use std::time::Duration;

use werewolf_backend::domain::Audience;
use werewolf_backend::errors::ErrorCode;
use werewolf_backend::events::GameEvent;

use crate::support::event_helpers::{drain, until};
use crate::support::room_builder::{table, TestRoom, FOUR_SEATS, ROOM, TEN_SEATS};
use crate::support::scripted_gateway::ScriptedGateway;

#[tokio::test]
async fn pause_then_resume_leaves_the_game_unchanged() {
    let t = TestRoom::new(ScriptedGateway::new());
    t.registry.open_room(ROOM, table(&FOUR_SEATS, &[3])).unwrap();
    let mut sub = t.registry.subscribe(ROOM, Audience::Operator).await.unwrap();
    t.registry.start_game(ROOM).await.unwrap();
    until(&mut sub.events, |e| matches!(e, GameEvent::RequestSpeech { seat: 3, .. })).await;

    let before = t.registry.snapshot(ROOM, Audience::Operator).await.unwrap();
    let log_before = t.registry.replay_log(ROOM, Audience::Operator.into()).await.unwrap();

    t.registry.pause_game(ROOM).await.unwrap();
    let paused = t.registry.snapshot(ROOM, Audience::Operator).await.unwrap();
    assert!(paused.is_paused);
    t.registry.resume_game(ROOM).await.unwrap();

    let after = t.registry.snapshot(ROOM, Audience::Operator).await.unwrap();
    assert_eq!(after, before);
    let log_after = t.registry.replay_log(ROOM, Audience::Operator.into()).await.unwrap();
    assert_eq!(log_after, log_before);

    let events = drain(&mut sub.events);
    let names: Vec<&str> = events.iter().map(|e| e.event.name()).collect();
    assert_eq!(names, vec!["game_paused", "game_resumed"]);
    t.registry.close_room(ROOM).await.unwrap();
}

#[tokio::test]
async fn pausing_twice_is_rejected() {
    let t = TestRoom::new(ScriptedGateway::new());
    t.registry.open_room(ROOM, table(&FOUR_SEATS, &[3])).unwrap();

    let err = t.registry.pause_game(ROOM).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::GameNotRunning);

    t.registry.start_game(ROOM).await.unwrap();
    t.registry.pause_game(ROOM).await.unwrap();
    let err = t.registry.pause_game(ROOM).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::PauseStateUnchanged);

    t.registry.resume_game(ROOM).await.unwrap();
    let err = t.registry.resume_game(ROOM).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::PauseStateUnchanged);
    t.registry.close_room(ROOM).await.unwrap();
}

#[tokio::test]
async fn paused_room_does_not_advance() {
    let t = TestRoom::new(ScriptedGateway::new());
    t.registry.open_room(ROOM, table(&TEN_SEATS, &[])).unwrap();
    t.registry.start_game(ROOM).await.unwrap();
    t.registry.pause_game(ROOM).await.unwrap();

    // an AI call already past the gate may still land
    tokio::time::sleep(Duration::from_millis(100)).await;
    let hub = t.registry.hub().clone();
    let settled = hub.last_seq(ROOM);
    let view = t.registry.snapshot(ROOM, Audience::Operator).await.unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(hub.last_seq(ROOM), settled);
    let still = t.registry.snapshot(ROOM, Audience::Operator).await.unwrap();
    assert_eq!((still.phase, still.sub_phase), (view.phase, view.sub_phase));

    let mut sub = t.registry.subscribe(ROOM, Audience::Public).await.unwrap();
    t.registry.resume_game(ROOM).await.unwrap();
    until(&mut sub.events, |e| matches!(e, GameEvent::PhaseChange { .. })).await;
    t.registry.close_room(ROOM).await.unwrap();
}

#[tokio::test]
async fn start_is_accepted_once() {
    let t = TestRoom::new(ScriptedGateway::new());
    t.registry.open_room(ROOM, table(&FOUR_SEATS, &[3])).unwrap();
    t.registry.start_game(ROOM).await.unwrap();
    let err = t.registry.start_game(ROOM).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::GameAlreadyStarted);
    t.registry.close_room(ROOM).await.unwrap();
}
