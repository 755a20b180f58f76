//! Session controller tests against a scripted backend.
//!
//! A `snapshot()` round-trip is used as a barrier: the controller answers
//! it only after every earlier command and every backend event already
//! queued, so the events drained right after it are complete.

mod common;

use common::{
    CLIENT_ID, Call, MockBackend, drain, messages, peer, spawn_controller, wait_for,
};
use lanparty::{
    BackendEvent, LanPartyError, Player, PlayerId, SessionEvent, SessionHandle, SessionState,
    messages as text,
};

// =========================================================================
// Hosting
// =========================================================================

#[tokio::test]
async fn test_start_host_registers_local_host_player() {
    let mock = MockBackend::new();
    let session = spawn_controller(mock.clone());
    let mut events = session.subscribe();

    session.start_host().await.unwrap();
    let snapshot = session.snapshot().await.unwrap();

    assert_eq!(snapshot.state, SessionState::InLobby);
    assert!(snapshot.host_addr.is_some());
    let local = snapshot.local_player.expect("host player is local");
    assert_eq!(local.id, PlayerId::HOST);
    assert_eq!(local.number, 1);

    let seen = drain(&mut events);
    assert!(seen.contains(&SessionEvent::StateChanged(SessionState::InLobby)));
    assert!(seen.iter().any(|e| matches!(e, SessionEvent::PlayerRegistered(p) if p.id == PlayerId::HOST)));
}

#[tokio::test]
async fn test_start_host_twice_tears_down_exactly_once() {
    let mock = MockBackend::new();
    let session = spawn_controller(mock.clone());

    session.start_host().await.unwrap();
    session.start_host().await.unwrap();
    let snapshot = session.snapshot().await.unwrap();

    assert_eq!(mock.calls(), vec![Call::StartHost, Call::Shutdown, Call::StartHost]);
    assert_eq!(snapshot.state, SessionState::InLobby);
    assert_eq!(snapshot.players.len(), 1, "no leftover player from the first host");
}

#[tokio::test]
async fn test_start_host_failure_reports_message_and_stays_inactive() {
    let mock = MockBackend::failing_host();
    let session = spawn_controller(mock.clone());
    let mut events = session.subscribe();

    session.start_host().await.unwrap();

    assert_eq!(session.current_state().await.unwrap(), SessionState::Inactive);
    assert_eq!(messages(&drain(&mut events)), vec![text::HOST_FAILED]);
}

#[tokio::test]
async fn test_stop_hosting_when_idle_is_a_no_op() {
    let mock = MockBackend::new();
    let session = spawn_controller(mock.clone());
    let mut events = session.subscribe();

    session.stop_hosting().await.unwrap();
    session.leave_session().await.unwrap();
    session.snapshot().await.unwrap();

    assert!(mock.calls().is_empty());
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn test_stop_hosting_unregisters_players_and_goes_inactive() {
    let mock = MockBackend::new();
    let session = spawn_controller(mock.clone());
    session.start_host().await.unwrap();
    session.snapshot().await.unwrap();
    let mut events = session.subscribe();

    session.stop_hosting().await.unwrap();
    let snapshot = session.snapshot().await.unwrap();

    assert_eq!(snapshot.state, SessionState::Inactive);
    assert!(snapshot.players.is_empty());
    assert!(snapshot.host_addr.is_none());
    assert_eq!(mock.count(|c| *c == Call::Shutdown), 1);
    let seen = drain(&mut events);
    assert!(seen.iter().any(|e| matches!(e, SessionEvent::PlayerUnregistered(p) if p.id == PlayerId::HOST)));
    assert!(seen.contains(&SessionEvent::StateChanged(SessionState::Inactive)));
}

// =========================================================================
// Joining
// =========================================================================

#[tokio::test]
async fn test_join_session_connects_and_registers_roster() {
    let mock = MockBackend::connecting();
    let session = spawn_controller(mock.clone());
    let mut events = session.subscribe();

    session.join_session(peer(9100, "Den")).await.unwrap();
    let snapshot = session.snapshot().await.unwrap();

    assert_eq!(mock.calls(), vec![Call::StartClient(peer(9100, "Den").socket_addr())]);
    assert_eq!(snapshot.state, SessionState::InLobby);
    let numbers: Vec<(PlayerId, u32)> = snapshot.players.iter().map(|p| (p.id, p.number)).collect();
    assert_eq!(numbers, vec![(PlayerId::HOST, 1), (CLIENT_ID, 2)]);
    assert_eq!(snapshot.local_player.map(|p| p.id), Some(CLIENT_ID));

    let seen = drain(&mut events);
    assert_eq!(seen[0], SessionEvent::Message(text::JOINING.into()));
    let states: Vec<&SessionEvent> = seen
        .iter()
        .filter(|e| matches!(e, SessionEvent::StateChanged(_)))
        .collect();
    assert_eq!(
        states,
        vec![
            &SessionEvent::StateChanged(SessionState::Connecting),
            &SessionEvent::StateChanged(SessionState::InLobby),
        ]
    );
}

#[tokio::test]
async fn test_join_session_refused_by_backend_stays_inactive() {
    let mock = MockBackend::failing_client();
    let session = spawn_controller(mock.clone());
    let mut events = session.subscribe();

    session.join_session(peer(9101, "Den")).await.unwrap();

    assert_eq!(session.current_state().await.unwrap(), SessionState::Inactive);
    assert_eq!(messages(&drain(&mut events)), vec![text::JOINING, text::JOIN_FAILED]);
}

#[tokio::test]
async fn test_connect_failed_event_resets_to_inactive() {
    let mock = MockBackend::new();
    let session = spawn_controller(mock.clone());
    session.join_session(peer(9102, "Den")).await.unwrap();
    assert_eq!(session.current_state().await.unwrap(), SessionState::Connecting);
    let mut events = session.subscribe();

    mock.emit(BackendEvent::ConnectFailed {
        reason: "refused".into(),
    });
    let snapshot = session.snapshot().await.unwrap();

    assert_eq!(snapshot.state, SessionState::Inactive);
    assert_eq!(mock.calls().last(), Some(&Call::Shutdown));
    let seen = drain(&mut events);
    assert_eq!(messages(&seen), vec![text::JOIN_FAILED]);
    assert!(seen.contains(&SessionEvent::StateChanged(SessionState::Inactive)));
}

#[tokio::test]
async fn test_host_disconnect_resets_and_clears_players() {
    let mock = MockBackend::connecting();
    let session = spawn_controller(mock.clone());
    session.join_session(peer(9103, "Den")).await.unwrap();
    session.snapshot().await.unwrap();
    let mut events = session.subscribe();

    mock.emit(BackendEvent::Disconnected {
        reason: "host closed the connection".into(),
    });
    let snapshot = session.snapshot().await.unwrap();

    assert_eq!(snapshot.state, SessionState::Inactive);
    assert!(snapshot.players.is_empty());
    let seen = drain(&mut events);
    assert_eq!(messages(&seen), vec![text::HOST_DISCONNECTED]);
    assert_eq!(
        seen.iter()
            .filter(|e| matches!(e, SessionEvent::PlayerUnregistered(_)))
            .count(),
        2
    );
}

#[tokio::test]
async fn test_events_from_torn_down_role_are_ignored() {
    let mock = MockBackend::new();
    let session = spawn_controller(mock.clone());
    session.start_host().await.unwrap();
    session.snapshot().await.unwrap();
    let old_sink = mock.sink().unwrap();

    session.leave_session().await.unwrap();
    session.snapshot().await.unwrap();
    old_sink.emit(BackendEvent::PlayerAttached {
        player: PlayerId(7),
        label: "Ghost".into(),
        is_local: false,
    });
    old_sink.emit(BackendEvent::GameStarted);
    let snapshot = session.snapshot().await.unwrap();

    assert_eq!(snapshot.state, SessionState::Inactive);
    assert!(snapshot.players.is_empty());
}

#[tokio::test]
async fn test_events_from_previous_host_ignored_after_rehosting() {
    let mock = MockBackend::new();
    let session = spawn_controller(mock.clone());
    session.start_host().await.unwrap();
    session.snapshot().await.unwrap();
    let old_sink = mock.sink().unwrap();

    session.start_host().await.unwrap();
    session.snapshot().await.unwrap();
    old_sink.emit(BackendEvent::PlayerAttached {
        player: PlayerId(7),
        label: "Ghost".into(),
        is_local: false,
    });
    let snapshot = session.snapshot().await.unwrap();

    assert_eq!(snapshot.players.len(), 1);
}

// =========================================================================
// Players
// =========================================================================

/// Hosts on `mock` and waits until the host player is registered.
async fn hosted(mock: &MockBackend) -> SessionHandle {
    let session = spawn_controller(mock.clone());
    session.start_host().await.unwrap();
    session.snapshot().await.unwrap();
    session
}

async fn numbers(session: &SessionHandle) -> Vec<u32> {
    session.players().await.unwrap().iter().map(|p| p.number).collect()
}

#[tokio::test]
async fn test_register_player_numbers_stay_dense_after_each_registration() {
    let session = hosted(&MockBackend::new()).await;
    let mut events = session.subscribe();

    for id in [10, 11, 12] {
        assert!(session.register_player(Player::new(PlayerId(id), format!("p{id}"))).await.unwrap());
    }
    assert!(session.unregister_player(PlayerId(11)).await.unwrap());
    assert_eq!(numbers(&session).await, vec![1, 2, 4], "removal does not renumber");

    assert!(session.register_player(Player::new(PlayerId(13), "p13")).await.unwrap());
    assert_eq!(numbers(&session).await, vec![1, 2, 3, 4]);

    let seen = drain(&mut events);
    let registered = seen
        .iter()
        .filter(|e| matches!(e, SessionEvent::PlayerRegistered(_)))
        .count();
    assert_eq!(registered, 4);
    assert!(seen.iter().any(|e| matches!(e, SessionEvent::PlayerUnregistered(p) if p.id == PlayerId(11))));
}

#[tokio::test]
async fn test_register_player_reports_every_renumbered_player() {
    let session = hosted(&MockBackend::new()).await;
    for id in [2, 3, 4] {
        session.register_player(Player::new(PlayerId(id), format!("p{id}"))).await.unwrap();
    }
    session.unregister_player(PlayerId(3)).await.unwrap();
    let mut events = session.subscribe();

    assert!(session.register_player(Player::new(PlayerId(5), "p5")).await.unwrap());
    session.snapshot().await.unwrap();

    let seen = drain(&mut events);
    assert_eq!(seen.len(), 2, "{seen:?}");
    assert!(matches!(&seen[0], SessionEvent::PlayerRegistered(p) if p.id == PlayerId(5) && p.number == 4));
    assert!(matches!(&seen[1], SessionEvent::PlayerRenumbered(p) if p.id == PlayerId(4) && p.number == 3));
}

#[tokio::test]
async fn test_register_player_outside_a_session_is_refused() {
    let mock = MockBackend::new();
    let session = spawn_controller(mock.clone());
    let mut events = session.subscribe();

    assert!(!session.register_player(Player::new(PlayerId(7), "Early")).await.unwrap());
    assert_eq!(session.current_state().await.unwrap(), SessionState::Inactive);

    session.start_search().await.unwrap();
    assert_eq!(session.current_state().await.unwrap(), SessionState::Pregame);
    assert!(!session.register_player(Player::local(PlayerId(8), "Me")).await.unwrap());

    let snapshot = session.snapshot().await.unwrap();
    assert!(snapshot.players.is_empty());
    assert!(snapshot.local_player.is_none());
    assert!(!drain(&mut events).iter().any(|e| matches!(e, SessionEvent::PlayerRegistered(_))));
    session.leave_session().await.unwrap();
}

#[tokio::test]
async fn test_register_duplicate_and_unregister_missing_are_no_ops() {
    let session = hosted(&MockBackend::new()).await;
    assert!(session.register_player(Player::new(PlayerId(3), "a")).await.unwrap());
    let mut events = session.subscribe();

    assert!(!session.register_player(Player::new(PlayerId(3), "again")).await.unwrap());
    assert!(!session.unregister_player(PlayerId(99)).await.unwrap());

    assert_eq!(session.players().await.unwrap().len(), 2);
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn test_all_ready_is_vacuous_and_tracks_local_readiness() {
    let mock = MockBackend::new();
    let session = spawn_controller(mock.clone());
    assert!(session.all_ready().await.unwrap(), "empty registry is all ready");

    session.start_host().await.unwrap();
    assert!(!session.all_ready().await.unwrap());
    let mut events = session.subscribe();

    session.set_ready(true).await.unwrap();

    assert!(session.all_ready().await.unwrap());
    assert_eq!(
        drain(&mut events),
        vec![
            SessionEvent::PlayerReadyChanged {
                player: PlayerId::HOST,
                ready: true
            },
            SessionEvent::LocalPlayerReady,
        ]
    );
}

#[tokio::test]
async fn test_remote_ready_does_not_fire_local_player_ready() {
    let mock = MockBackend::new();
    let session = spawn_controller(mock.clone());
    session.start_host().await.unwrap();
    session.snapshot().await.unwrap();
    mock.emit(BackendEvent::PlayerAttached {
        player: PlayerId(2),
        label: "Guest".into(),
        is_local: false,
    });
    session.snapshot().await.unwrap();
    let mut events = session.subscribe();

    mock.emit(BackendEvent::ReadyChanged {
        player: PlayerId(2),
        ready: true,
    });
    session.snapshot().await.unwrap();

    assert_eq!(
        drain(&mut events),
        vec![SessionEvent::PlayerReadyChanged {
            player: PlayerId(2),
            ready: true
        }]
    );
}

#[tokio::test]
async fn test_set_ready_without_session_is_ignored() {
    let mock = MockBackend::new();
    let session = spawn_controller(mock.clone());
    let mut events = session.subscribe();

    session.set_ready(true).await.unwrap();
    session.clear_all_ready().await.unwrap();
    let snapshot = session.snapshot().await.unwrap();

    assert!(mock.calls().is_empty());
    assert!(snapshot.local_player.is_none());
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn test_clear_all_ready_asks_backend_for_every_player() {
    let mock = MockBackend::new();
    let session = spawn_controller(mock.clone());
    session.start_host().await.unwrap();
    session.snapshot().await.unwrap();
    mock.emit(BackendEvent::PlayerAttached {
        player: PlayerId(2),
        label: "Guest".into(),
        is_local: false,
    });
    mock.emit(BackendEvent::ReadyChanged {
        player: PlayerId(2),
        ready: true,
    });
    session.set_ready(true).await.unwrap();
    assert!(session.all_ready().await.unwrap());

    session.clear_all_ready().await.unwrap();
    let snapshot = session.snapshot().await.unwrap();

    assert_eq!(mock.count(|c| matches!(c, Call::ClearReady(_))), 2);
    assert!(mock.calls().contains(&Call::ClearReady(PlayerId::HOST)));
    assert!(mock.calls().contains(&Call::ClearReady(PlayerId(2))));
    assert!(snapshot.players.iter().all(|p| !p.ready));
}

// =========================================================================
// Starting the game
// =========================================================================

#[tokio::test]
async fn test_start_game_waits_for_everyone_ready() {
    let mock = MockBackend::new();
    let session = spawn_controller(mock.clone());
    session.start_host().await.unwrap();
    session.snapshot().await.unwrap();
    mock.emit(BackendEvent::PlayerAttached {
        player: PlayerId(2),
        label: "Guest".into(),
        is_local: false,
    });
    session.set_ready(true).await.unwrap();
    let mut events = session.subscribe();

    assert!(!session.start_game().await.unwrap());
    assert_eq!(messages(&drain(&mut events)), vec![text::NOT_ALL_READY]);

    mock.emit(BackendEvent::ReadyChanged {
        player: PlayerId(2),
        ready: true,
    });
    assert!(session.start_game().await.unwrap());

    assert_eq!(session.current_state().await.unwrap(), SessionState::InGame);
    assert_eq!(mock.count(|c| *c == Call::StartGame), 1);
    let seen = drain(&mut events);
    assert!(seen.contains(&SessionEvent::StateChanged(SessionState::InGame)));
    assert!(seen.contains(&SessionEvent::GameStarted));
}

#[tokio::test]
async fn test_start_game_as_client_is_refused() {
    let mock = MockBackend::connecting();
    let session = spawn_controller(mock.clone());
    session.join_session(peer(9104, "Den")).await.unwrap();

    assert!(!session.start_game().await.unwrap());
    assert_eq!(mock.count(|c| *c == Call::StartGame), 0);
}

#[tokio::test]
async fn test_client_follows_host_into_game() {
    let mock = MockBackend::connecting();
    let session = spawn_controller(mock.clone());
    session.join_session(peer(9105, "Den")).await.unwrap();
    session.snapshot().await.unwrap();
    let mut events = session.subscribe();

    mock.emit(BackendEvent::GameStarted);

    assert_eq!(session.current_state().await.unwrap(), SessionState::InGame);
    let seen = drain(&mut events);
    assert_eq!(
        seen,
        vec![
            SessionEvent::StateChanged(SessionState::InGame),
            SessionEvent::GameStarted,
        ]
    );
}

// =========================================================================
// Reset and shutdown
// =========================================================================

#[tokio::test]
async fn test_reset_from_any_state_is_inactive() {
    let mock = MockBackend::connecting();
    let session = spawn_controller(mock.clone());

    session.reset().await.unwrap();
    assert_eq!(session.current_state().await.unwrap(), SessionState::Inactive);

    session.join_session(peer(9106, "Den")).await.unwrap();
    session.reset().await.unwrap();
    let snapshot = session.snapshot().await.unwrap();

    assert_eq!(snapshot.state, SessionState::Inactive);
    assert!(snapshot.players.is_empty());
    assert_eq!(mock.count(|c| *c == Call::Shutdown), 1);
}

#[tokio::test]
async fn test_shutdown_stops_the_controller() {
    let mock = MockBackend::new();
    let session = spawn_controller(mock.clone());
    session.start_host().await.unwrap();

    session.shutdown().await.unwrap();

    assert_eq!(mock.calls().last(), Some(&Call::Shutdown));
    assert!(matches!(
        session.snapshot().await,
        Err(LanPartyError::ControllerStopped)
    ));
}

#[tokio::test]
async fn test_start_search_enters_pregame() {
    let session = spawn_controller(MockBackend::new());
    let mut events = session.subscribe();

    session.start_search().await.unwrap();

    assert_eq!(session.current_state().await.unwrap(), SessionState::Pregame);
    assert_eq!(
        wait_for(&mut events, |e| matches!(e, SessionEvent::StateChanged(_))).await,
        SessionEvent::StateChanged(SessionState::Pregame)
    );
    // Discovery is running: the peer list refreshes even when empty.
    let update = wait_for(&mut events, |e| matches!(e, SessionEvent::PeerListUpdated(_))).await;
    assert_eq!(update, SessionEvent::PeerListUpdated(Vec::new()));
}
