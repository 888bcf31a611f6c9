use werewolf_backend::ai::DecisionTask;
use werewolf_backend::config::GameConfig;
use werewolf_backend::domain::{Audience, Channel, Phase, SubPhase};
use werewolf_backend::events::{EventEnvelope, GameEvent};

use crate::support::event_helpers::until;
use crate::support::room_builder::{table, test_config, TestRoom, ROOM, TEN_SEATS};
use crate::support::scripted_gateway::ScriptedGateway;

fn whispering_config() -> GameConfig {
    GameConfig {
        night_chat: true,
        ..test_config()
    }
}

fn until_vote(e: &GameEvent) -> bool {
    matches!(
        e,
        GameEvent::PhaseChange {
            phase: Phase::Day,
            sub_phase: Some(SubPhase::Vote),
            ..
        }
    )
}

/// Assert every narration is one uninterrupted start, chunks, end run.
fn assert_streams_contiguous(events: &[EventEnvelope]) -> usize {
    let mut streams = 0;
    let mut open: Option<u64> = None;
    for env in events {
        match (&env.event, open) {
            (GameEvent::SpeechStart { stream_id, .. }, None) => open = Some(*stream_id),
            (GameEvent::SpeechChunk { stream_id, .. }, Some(id)) => assert_eq!(*stream_id, id),
            (GameEvent::SpeechEnd { stream_id, log_id, .. }, Some(id)) => {
                assert_eq!(*stream_id, id);
                assert_eq!(*log_id, id, "a narration ends as the log entry it announced");
                open = None;
                streams += 1;
            }
            (other, Some(id)) => panic!("{} interleaved into stream {id}", other.name()),
            (GameEvent::SpeechChunk { .. } | GameEvent::SpeechEnd { .. }, None) => {
                panic!("narration event outside a stream")
            }
            _ => {}
        }
    }
    assert!(open.is_none());
    streams
}

#[tokio::test]
async fn sequence_numbers_are_gap_free() {
    let t = TestRoom::new(ScriptedGateway::new());
    t.registry.open_room(ROOM, table(&TEN_SEATS, &[])).unwrap();
    let mut sub = t.registry.subscribe(ROOM, Audience::Operator).await.unwrap();
    t.registry.start_game(ROOM).await.unwrap();

    let events = until(&mut sub.events, until_vote).await;
    let seqs: Vec<u64> = events.iter().map(|e| e.seq).collect();
    assert_eq!(seqs, (1..=events.len() as u64).collect::<Vec<_>>());
    assert!(events.iter().all(|e| e.room_id == ROOM));
    t.registry.close_room(ROOM).await.unwrap();
}

#[tokio::test]
async fn narrations_never_interleave() {
    let t = TestRoom::with_config(ScriptedGateway::new(), whispering_config());
    t.registry.open_room(ROOM, table(&TEN_SEATS, &[])).unwrap();
    let mut sub = t.registry.subscribe(ROOM, Audience::Operator).await.unwrap();
    t.registry.start_game(ROOM).await.unwrap();

    let events = until(&mut sub.events, until_vote).await;
    // three whispers at night, ten speeches by day
    assert_eq!(assert_streams_contiguous(&events), 13);
    t.registry.close_room(ROOM).await.unwrap();
}

#[tokio::test]
async fn host_announcement_is_one_complete_triple() {
    let t = TestRoom::new(ScriptedGateway::new());
    t.registry.open_room(ROOM, table(&TEN_SEATS, &[])).unwrap();
    let mut sub = t.registry.subscribe(ROOM, Audience::Public).await.unwrap();
    t.registry.start_game(ROOM).await.unwrap();

    let events = until(&mut sub.events, |e| matches!(e, GameEvent::HostAnnouncementEnd { .. })).await;
    let start = events
        .iter()
        .position(|e| matches!(e.event, GameEvent::HostAnnouncementStart { .. }))
        .expect("announcement start");
    let mut text = String::new();
    for env in &events[start + 1..events.len() - 1] {
        match &env.event {
            GameEvent::HostAnnouncementChunk { text: chunk, .. } => text.push_str(chunk),
            other => panic!("unexpected {} inside the announcement", other.name()),
        }
    }
    match &events.last().unwrap().event {
        GameEvent::HostAnnouncementEnd { content, .. } => {
            assert_eq!(content, &text);
            assert!(content.contains("Nobody died"));
        }
        other => panic!("unexpected {other:?}"),
    }
    t.registry.close_room(ROOM).await.unwrap();
}

#[tokio::test]
async fn pack_business_stays_with_the_pack() {
    let t = TestRoom::with_config(ScriptedGateway::new(), whispering_config());
    t.registry.open_room(ROOM, table(&TEN_SEATS, &[])).unwrap();
    let mut wolf = t.registry.subscribe(ROOM, Audience::Seat(2)).await.unwrap();
    let mut villager = t.registry.subscribe(ROOM, Audience::Seat(7)).await.unwrap();
    t.registry.start_game(ROOM).await.unwrap();

    let is_pack_event = |e: &EventEnvelope| {
        matches!(
            e.event,
            GameEvent::SpeechStart {
                channel: Some(Channel::Werewolf),
                ..
            } | GameEvent::RequestAction {
                task: DecisionTask::WerewolfKill,
                ..
            }
        )
    };
    let seen_by_wolf = until(&mut wolf.events, until_vote).await;
    let seen_by_villager = until(&mut villager.events, until_vote).await;

    assert_eq!(seen_by_wolf.iter().filter(|e| is_pack_event(e)).count(), 4);
    assert!(!seen_by_villager.iter().any(is_pack_event));
    // both see the same public day
    let public = |events: &[EventEnvelope]| {
        events
            .iter()
            .filter(|e| matches!(e.event, GameEvent::RequestSpeech { .. }))
            .count()
    };
    assert_eq!(public(&seen_by_wolf), public(&seen_by_villager));
    t.registry.close_room(ROOM).await.unwrap();
}
