use futures::StreamExt;
use werewolf_backend::config::GameConfig;
use werewolf_backend::domain::{Audience, Channel, LogKind, LogView};
use werewolf_backend::events::GameEvent;

use crate::support::event_helpers::until;
use crate::support::room_builder::{table, test_config, TestRoom, ROOM, TEN_SEATS};
use crate::support::scripted_gateway::ScriptedGateway;

async fn room_after_first_night() -> TestRoom {
    let config = GameConfig {
        night_chat: true,
        ..test_config()
    };
    let t = TestRoom::with_config(ScriptedGateway::new(), config);
    t.registry.open_room(ROOM, table(&TEN_SEATS, &[7])).unwrap();
    let mut sub = t.registry.subscribe(ROOM, Audience::Public).await.unwrap();
    t.registry.start_game(ROOM).await.unwrap();
    // seat 7 is human, so discussion parks there
    until(&mut sub.events, |e| matches!(e, GameEvent::RequestSpeech { seat: 7, .. })).await;
    t
}

#[tokio::test]
async fn late_subscriber_gets_the_log_its_audience_may_see() {
    let t = room_after_first_night().await;

    let public = t.registry.subscribe(ROOM, Audience::Public).await.unwrap();
    let wolf = t.registry.subscribe(ROOM, Audience::Seat(1)).await.unwrap();
    let seer = t.registry.subscribe(ROOM, Audience::Seat(4)).await.unwrap();
    let operator = t.registry.subscribe(ROOM, Audience::Operator).await.unwrap();

    assert!(public.replay.iter().all(|e| e.is_public));
    let pack_channel = |replay: &[werewolf_backend::domain::LogEntry], kind: LogKind| {
        replay
            .iter()
            .filter(|e| e.channel == Some(Channel::Werewolf) && e.kind == kind)
            .count()
    };
    assert_eq!(pack_channel(&public.replay, LogKind::Speech), 0);
    assert_eq!(pack_channel(&wolf.replay, LogKind::Speech), 3);
    // the pack's kill decision sits on the same channel
    assert_eq!(pack_channel(&wolf.replay, LogKind::Skill), 1);
    assert_eq!(pack_channel(&seer.replay, LogKind::Speech), 0);
    assert_eq!(pack_channel(&seer.replay, LogKind::Skill), 0);
    assert!(operator.replay.len() >= wolf.replay.len());

    // ids stay in append order whatever the filter
    for replay in [&public.replay, &wolf.replay, &operator.replay] {
        assert!(replay.windows(2).all(|w| w[0].id < w[1].id));
    }

    // roles are masked for the public until the game ends
    assert!(public.view.seats.iter().all(|s| s.role.is_none()));
    let wolf_roles: Vec<_> = wolf
        .view
        .seats
        .iter()
        .filter(|s| s.role.is_some())
        .map(|s| s.seat_number)
        .collect();
    assert_eq!(wolf_roles, vec![1, 2, 3]);
    t.registry.close_room(ROOM).await.unwrap();
}

#[tokio::test]
async fn replay_log_matches_the_subscription_snapshot() {
    let t = room_after_first_night().await;

    let sub = t.registry.subscribe(ROOM, Audience::Seat(1)).await.unwrap();
    let replay = t.registry.replay_log(ROOM, LogView::Seat(1)).await.unwrap();
    assert_eq!(sub.replay, replay);

    let detailed = t.registry.replay_log(ROOM, LogView::Detailed).await.unwrap();
    let basic = t.registry.replay_log(ROOM, LogView::Basic).await.unwrap();
    assert!(basic.len() < detailed.len());
    assert!(basic.iter().all(|e| detailed.contains(e)));
    t.registry.close_room(ROOM).await.unwrap();
}

#[tokio::test]
async fn unsubscribed_listener_stops_receiving() {
    let t = room_after_first_night().await;
    let sub = t.registry.subscribe(ROOM, Audience::Public).await.unwrap();
    let before = t.registry.hub().listener_count(ROOM);
    t.registry.unsubscribe(ROOM, sub.listener_id);
    assert_eq!(t.registry.hub().listener_count(ROOM), before - 1);

    t.registry.pause_game(ROOM).await.unwrap();
    let mut events = sub.into_stream();
    assert!(events.next().await.is_none());
    t.registry.close_room(ROOM).await.unwrap();
}
