use std::time::Duration;

use werewolf_backend::ai::DecisionTask;
use werewolf_backend::domain::{Action, Audience, Phase, SubPhase, VoteChoice};
use werewolf_backend::errors::{ErrorCode, ValidationKind};
use werewolf_backend::events::{GameEvent, NightResult};

use crate::support::event_helpers::{drain, until};
use crate::support::room_builder::{table, TestRoom, FOUR_SEATS, ROOM};
use crate::support::scripted_gateway::ScriptedGateway;

async fn room_waiting_on_speech(humans: &[u8], speaker: u8) -> (TestRoom, werewolf_backend::Subscription) {
    let t = TestRoom::new(ScriptedGateway::new());
    t.registry.open_room(ROOM, table(&FOUR_SEATS, humans)).unwrap();
    let mut sub = t.registry.subscribe(ROOM, Audience::Operator).await.unwrap();
    t.registry.start_game(ROOM).await.unwrap();
    until(&mut sub.events, |e| {
        matches!(e, GameEvent::RequestSpeech { seat, is_human: true, .. } if *seat == speaker)
    })
    .await;
    (t, sub)
}

#[tokio::test]
async fn human_speech_releases_the_floor() {
    let (t, mut sub) = room_waiting_on_speech(&[3], 3).await;

    let view = t.registry.snapshot(ROOM, Audience::Seat(3)).await.unwrap();
    assert_eq!(view.current_speaker_seat, Some(3));
    assert!(view.waiting_for_human_input);

    let err = t.registry.submit_human_speech(ROOM, 3, "   ").await.unwrap_err();
    assert_eq!(err.validation_kind(), Some(&ValidationKind::EmptySpeech));

    let entry = t
        .registry
        .submit_human_speech(ROOM, 3, "  Seat 1 has been very quiet.  ")
        .await
        .unwrap();
    assert_eq!(entry.content, "Seat 1 has been very quiet.");
    assert!(entry.is_public);

    let events = until(&mut sub.events, |e| matches!(e, GameEvent::RequestSpeech { seat: 4, .. })).await;
    assert!(matches!(
        events[0].event,
        GameEvent::Speech { seat: 3, log_id, .. } if log_id == entry.id
    ));
    t.registry.close_room(ROOM).await.unwrap();
}

#[tokio::test]
async fn speaking_out_of_turn_is_rejected() {
    let (t, _sub) = room_waiting_on_speech(&[3, 4], 3).await;

    let err = t.registry.submit_human_speech(ROOM, 4, "me first").await.unwrap_err();
    assert_eq!(err.validation_kind(), Some(&ValidationKind::OutOfTurn));
    assert_eq!(err.code(), ErrorCode::OutOfTurn);

    let err = t
        .registry
        .submit_human_vote(ROOM, 4, VoteChoice::Target(1))
        .await
        .unwrap_err();
    assert_eq!(err.validation_kind(), Some(&ValidationKind::PhaseMismatch));

    // the floor is untouched
    let view = t.registry.snapshot(ROOM, Audience::Operator).await.unwrap();
    assert_eq!(view.current_speaker_seat, Some(3));
    assert_eq!((view.phase, view.sub_phase), (Phase::Day, Some(SubPhase::Discussion)));
    t.registry.close_room(ROOM).await.unwrap();
}

#[tokio::test]
async fn ai_seats_cannot_be_driven_from_outside() {
    let (t, _sub) = room_waiting_on_speech(&[3], 3).await;
    let err = t.registry.submit_human_speech(ROOM, 1, "hello").await.unwrap_err();
    // seat 1 is not the speaker either; the turn check comes first
    assert_eq!(err.validation_kind(), Some(&ValidationKind::OutOfTurn));
    t.registry.close_room(ROOM).await.unwrap();
}

#[tokio::test]
async fn human_seer_learns_the_result_privately() {
    let t = TestRoom::new(ScriptedGateway::new());
    t.registry.open_room(ROOM, table(&FOUR_SEATS, &[2])).unwrap();
    let mut seer = t.registry.subscribe(ROOM, Audience::Seat(2)).await.unwrap();
    let mut villager = t.registry.subscribe(ROOM, Audience::Seat(3)).await.unwrap();
    t.registry.start_game(ROOM).await.unwrap();

    until(&mut seer.events, |e| {
        matches!(e, GameEvent::RequestAction { seat: 2, task: DecisionTask::SeerCheck })
    })
    .await;

    let err = t
        .registry
        .submit_human_night_action(ROOM, 2, Action::Check { target: 2 })
        .await
        .unwrap_err();
    assert_eq!(err.validation_kind(), Some(&ValidationKind::InvalidTarget));

    t.registry
        .submit_human_night_action(ROOM, 2, Action::Check { target: 1 })
        .await
        .unwrap();
    let events = until(&mut seer.events, |e| matches!(e, GameEvent::NightActionResult { .. })).await;
    assert!(matches!(
        events.last().unwrap().event,
        GameEvent::NightActionResult {
            seat: 2,
            result: NightResult::SeerResult {
                target: 1,
                is_werewolf: true
            }
        }
    ));

    let mut seen =
        until(&mut villager.events, |e| matches!(e, GameEvent::PhaseChange { phase: Phase::Dawn, .. })).await;
    seen.extend(drain(&mut villager.events));
    let leaked = seen
        .iter()
        .any(|e| matches!(e.event, GameEvent::NightActionResult { .. }));
    assert!(!leaked);
    t.registry.close_room(ROOM).await.unwrap();
}

#[tokio::test]
async fn vote_stays_open_until_every_human_voted() {
    let gw = ScriptedGateway::new()
        .vote_for(1, Some(3))
        .vote_for(2, Some(1))
        .vote_for(4, Some(1));
    let t = TestRoom::new(gw);
    t.registry.open_room(ROOM, table(&FOUR_SEATS, &[3])).unwrap();
    let mut sub = t.registry.subscribe(ROOM, Audience::Public).await.unwrap();
    t.registry.start_game(ROOM).await.unwrap();

    until(&mut sub.events, |e| matches!(e, GameEvent::RequestSpeech { seat: 3, .. })).await;
    t.registry.submit_human_speech(ROOM, 3, "Let's vote seat 1.").await.unwrap();

    // three AI votes in, the human's still missing
    let events = until(&mut sub.events, |e| {
        matches!(e, GameEvent::VoteUpdate { votes_cast: 3, .. })
    })
    .await;
    assert!(!events.iter().any(|e| matches!(e.event, GameEvent::VoteResult { .. })));
    tokio::time::sleep(Duration::from_millis(100)).await;
    let view = t.registry.snapshot(ROOM, Audience::Public).await.unwrap();
    assert_eq!(view.sub_phase, Some(SubPhase::Vote));
    assert!(view.waiting_for_human_input);

    t.registry
        .submit_human_vote(ROOM, 3, VoteChoice::Abstain)
        .await
        .unwrap();
    let events = until(&mut sub.events, |e| matches!(e, GameEvent::VoteResult { .. })).await;
    match &events.last().unwrap().event {
        GameEvent::VoteResult {
            eliminated,
            abstentions,
            ..
        } => {
            assert_eq!(*eliminated, Some(1));
            assert_eq!(*abstentions, 1);
        }
        other => panic!("unexpected {other:?}"),
    }
    t.registry.close_room(ROOM).await.unwrap();
}

#[tokio::test]
async fn changed_vote_replaces_the_first_one() {
    let gw = ScriptedGateway::new().vote_for(1, Some(4)).vote_for(2, Some(1));
    let t = TestRoom::new(gw);
    t.registry.open_room(ROOM, table(&FOUR_SEATS, &[3, 4])).unwrap();
    let mut sub = t.registry.subscribe(ROOM, Audience::Public).await.unwrap();
    t.registry.start_game(ROOM).await.unwrap();

    until(&mut sub.events, |e| matches!(e, GameEvent::RequestSpeech { seat: 3, .. })).await;
    t.registry.submit_human_speech(ROOM, 3, "Seat 4 is odd.").await.unwrap();
    until(&mut sub.events, |e| matches!(e, GameEvent::RequestSpeech { seat: 4, .. })).await;
    t.registry.submit_human_speech(ROOM, 4, "Seat 1, actually.").await.unwrap();
    until(&mut sub.events, |e| {
        matches!(
            e,
            GameEvent::PhaseChange {
                sub_phase: Some(SubPhase::Vote),
                ..
            }
        )
    })
    .await;

    t.registry
        .submit_human_vote(ROOM, 3, VoteChoice::Target(4))
        .await
        .unwrap();
    t.registry
        .submit_human_vote(ROOM, 3, VoteChoice::Target(1))
        .await
        .unwrap();
    t.registry
        .submit_human_vote(ROOM, 4, VoteChoice::Target(1))
        .await
        .unwrap();

    let events = until(&mut sub.events, |e| matches!(e, GameEvent::VoteResult { .. })).await;
    match &events.last().unwrap().event {
        GameEvent::VoteResult {
            tally,
            eliminated,
            is_tie,
            ..
        } => {
            assert_eq!(tally.get(&1), Some(&3));
            assert_eq!(tally.get(&4), Some(&1));
            assert_eq!(*eliminated, Some(1));
            assert!(!is_tie);
        }
        other => panic!("unexpected {other:?}"),
    }
    t.registry.close_room(ROOM).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn silent_human_gets_periodic_reminders() {
    let (t, mut sub) = room_waiting_on_speech(&[3], 3).await;
    drain(&mut sub.events);

    tokio::time::sleep(Duration::from_secs(65)).await;
    let counts: Vec<u32> = drain(&mut sub.events)
        .into_iter()
        .filter_map(|e| match e.event {
            GameEvent::SpeechReminder {
                seat: 3,
                reminder_count,
            } => Some(reminder_count),
            _ => None,
        })
        .collect();
    assert_eq!(counts, vec![1, 2]);
    let view = t.registry.snapshot(ROOM, Audience::Public).await.unwrap();
    assert_eq!(view.reminder_count, 2);

    t.registry.submit_human_speech(ROOM, 3, "Sorry, I was away.").await.unwrap();
    tokio::time::sleep(Duration::from_secs(90)).await;
    let late = drain(&mut sub.events)
        .into_iter()
        .any(|e| matches!(e.event, GameEvent::SpeechReminder { seat: 3, .. }));
    assert!(!late);
    t.registry.close_room(ROOM).await.unwrap();
}
