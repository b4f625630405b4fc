//! Session lifecycle across servers sharing one database.


use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use playersync::{
    Clock, FailureKind, LocalClock, LockRecord, LockStore, SessionState, SnapshotCause, SyncError,
};

use support::{init_tracing, Database, Gamer, Node, UnreachableLocks};

fn causes(node: &Node, player: &Gamer) -> Vec<SnapshotCause> {
    node.sync
        .snapshots()
        .list(&player.id)
        .unwrap()
        .into_iter()
        .map(|s| s.cause)
        .collect()
}

// ============================================================================
// Moving between servers
// ============================================================================

#[test]
fn player_state_follows_them_to_another_server() {
    init_tracing();
    let db = Database::new();
    let lobby = Node::start(&db);
    let survival = Node::start(&db);
    let alex = Gamer::new("Alex");

    assert!(lobby.sync.join(&alex).unwrap().is_none());
    *alex.level.lock().unwrap() = 17;
    alex.inventory.lock().unwrap().push("elytra".into());
    lobby.settle();
    lobby.sync.quit(alex.as_ref()).unwrap().unwrap();
    assert!(db.locks.get(&alex.id).unwrap().is_none());

    // fresh client-side state on the new server
    *alex.level.lock().unwrap() = 0;
    alex.inventory.lock().unwrap().clear();

    let report = survival.sync.join(&alex).unwrap().unwrap();

    assert!(report.is_complete());
    assert_eq!(alex.level(), 17);
    assert_eq!(*alex.inventory.lock().unwrap(), vec!["elytra"]);
    assert_eq!(survival.sync.state(&alex.id), SessionState::Active);
    assert_eq!(db.locks.get(&alex.id).unwrap().unwrap().server_id, survival.id());
}

#[test]
fn join_refused_while_still_playing_elsewhere() {
    init_tracing();
    let db = Database::new();
    let lobby = Node::start(&db);
    let survival = Node::start(&db);
    let alex = Gamer::new("Alex");
    lobby.sync.join(&alex).unwrap();

    let err = survival.sync.join(&alex).unwrap_err();

    assert_eq!(err.kind(), FailureKind::Contention);
    assert!(err.to_string().contains("still in use"));
    assert_eq!(survival.sync.state(&alex.id), SessionState::Idle);
    assert_eq!(db.locks.get(&alex.id).unwrap().unwrap().server_id, lobby.id());
}

#[test]
fn join_refused_when_owner_does_not_answer() {
    init_tracing();
    let db = Database::new();
    let crashed = Node::silent(&db);
    let survival = Node::start(&db);
    let alex = Gamer::new("Alex");
    crashed.sync.join(&alex).unwrap();

    let err = survival.sync.join(&alex).unwrap_err();

    assert_eq!(err.kind(), FailureKind::Timeout);
    assert!(err.to_string().contains("could not reach"));
    assert_eq!(db.locks.get(&alex.id).unwrap().unwrap().server_id, crashed.id());
}

#[test]
fn join_reports_lock_table_failure() {
    init_tracing();
    let db = Database::new();
    let broken = Node::build(&db, Arc::new(UnreachableLocks));
    let alex = Gamer::new("Alex");

    let err = broken.sync.join(&alex).unwrap_err();

    assert_eq!(err.kind(), FailureKind::Persistence);
    assert!(matches!(err, SyncError::Lock(_)));
    assert_eq!(broken.sync.state(&alex.id), SessionState::Idle);
}

#[test]
fn restart_reclaims_players_still_connected() {
    init_tracing();
    let db = Database::new();
    let alex = Gamer::new("Alex");
    {
        let before = Node::start(&db);
        before.sync.join(&alex).unwrap();
        before.settle();
        // process exits without quit hooks
    }

    let after = Node::start(&db);
    let other = Node::start(&db);
    assert_eq!(after.sync.start([alex.as_ref()]).unwrap(), 1);

    assert_eq!(after.sync.state(&alex.id), SessionState::Active);
    assert_eq!(db.locks.get(&alex.id).unwrap().unwrap().server_id, after.id());
    let err = other.sync.join(&alex).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Contention);
}

/// Level stored with the player's newest snapshot.
fn latest_level(db: &Database, node: &Node, player: &Gamer) -> Option<u32> {
    let latest = node.sync.snapshots().latest(&player.id).unwrap()?;
    db.level.get(latest.id).unwrap()
}

/// Alex plays on `lobby` up to level 30 and leaves.
fn play_to_level_30(lobby: &Node, alex: &Arc<Gamer>) {
    lobby.sync.join(alex).unwrap();
    *alex.level.lock().unwrap() = 30;
    lobby.settle();
    lobby.sync.quit(alex.as_ref()).unwrap().unwrap();
    // fresh client-side state for the next server
    *alex.level.lock().unwrap() = 0;
}

#[test]
fn quit_while_lock_is_being_taken_leaves_no_trace() {
    init_tracing();
    let db = Database::new();
    let lobby = Node::start(&db);
    let survival = Node::start(&db);
    let alex = Gamer::new("Alex");
    play_to_level_30(&lobby, &alex);
    // a row the lobby failed to clean up, so survival has to ask
    db.locks
        .upsert(LockRecord::new(alex.id, lobby.id(), LocalClock.now()))
        .unwrap();
    let history = causes(&survival, &alex);

    survival.gates.lock_query.arm();
    thread::scope(|s| {
        let join = s.spawn(|| survival.sync.join(&alex));
        survival.gates.lock_query.meet();
        assert_eq!(survival.sync.state(&alex.id), SessionState::Locking);

        assert_eq!(survival.sync.quit(alex.as_ref()).unwrap(), None);

        survival.gates.lock_query.meet();
        let err = join.join().unwrap().unwrap_err();
        assert_eq!(err, SyncError::JoinAborted(alex.id));
        assert_eq!(err.kind(), FailureKind::Admission);
    });
    survival.settle();

    assert_eq!(causes(&survival, &alex), history);
    assert_eq!(latest_level(&db, &survival, &alex), Some(30));
    assert_eq!(survival.sync.state(&alex.id), SessionState::Idle);
    assert!(db.locks.get(&alex.id).unwrap().is_none());
    assert!(!survival.sync.locks().is_owned(&alex.id));
}

#[test]
fn quit_while_restoring_leaves_no_trace() {
    init_tracing();
    let db = Database::new();
    let lobby = Node::start(&db);
    let survival = Node::start(&db);
    let alex = Gamer::new("Alex");
    play_to_level_30(&lobby, &alex);
    let history = causes(&survival, &alex);

    survival.gates.restore.arm();
    thread::scope(|s| {
        let join = s.spawn(|| survival.sync.join(&alex));
        survival.gates.restore.meet();
        assert_eq!(survival.sync.state(&alex.id), SessionState::Restoring);
        assert!(survival.sync.should_not_save_snapshot(&alex.id));

        assert_eq!(survival.sync.quit(alex.as_ref()).unwrap(), None);

        survival.gates.restore.meet();
        let err = join.join().unwrap().unwrap_err();
        assert_eq!(err, SyncError::JoinAborted(alex.id));
    });
    survival.settle();

    assert_eq!(causes(&survival, &alex), history);
    assert_eq!(latest_level(&db, &survival, &alex), Some(30));
    assert_eq!(survival.sync.state(&alex.id), SessionState::Idle);
    assert!(db.locks.get(&alex.id).unwrap().is_none());

    // the player can come back normally afterwards
    survival.sync.join(&alex).unwrap().unwrap();
    assert_eq!(alex.level(), 30);
}

// ============================================================================
// Restore window
// ============================================================================

#[test]
fn restore_marker_is_up_only_while_applying() {
    init_tracing();
    let db = Database::new();
    let node = Node::start(&db);
    let alex = Gamer::new("Alex");
    node.sync.join(&alex).unwrap();
    node.settle();
    node.sync.quit(alex.as_ref()).unwrap();

    node.sync.join(&alex).unwrap().unwrap();

    assert!(node.saw_marker.load(Ordering::SeqCst));
    assert!(!node.sync.should_not_save_snapshot(&alex.id));
    assert!(node.sync.admit_death(&alex.id));
}

// ============================================================================
// Event-driven captures
// ============================================================================

#[test]
fn gameplay_events_are_captured_in_background() {
    init_tracing();
    let db = Database::new();
    let node = Node::start(&db);
    let alex = Gamer::new("Alex");
    node.sync.join(&alex).unwrap();
    node.settle();

    assert!(node.sync.on_death(Arc::clone(&alex)));
    node.settle();
    assert!(node.sync.on_game_mode_change(Arc::clone(&alex)));
    node.settle();
    assert!(!node.sync.on_world_save(false, vec![Arc::clone(&alex)]));
    assert!(node.sync.on_world_save(true, vec![Arc::clone(&alex)]));
    node.settle();
    node.sync.quit(alex.as_ref()).unwrap();

    assert_eq!(
        causes(&node, &alex),
        vec![
            SnapshotCause::PlayerJoin,
            SnapshotCause::PlayerDeath,
            SnapshotCause::PlayerGameModeChange,
            SnapshotCause::WorldSave,
            SnapshotCause::PlayerQuit,
        ]
    );
}

#[test]
fn shutdown_captures_everyone_and_frees_their_locks() {
    init_tracing();
    let db = Database::new();
    let lobby = Node::start(&db);
    let survival = Node::start(&db);
    let players = vec![Gamer::new("Alex"), Gamer::new("Steve")];
    for player in &players {
        lobby.sync.join(player).unwrap();
    }
    lobby.settle();

    let report = lobby.sync.shutdown(&players);

    assert_eq!(report.captured, 2);
    assert_eq!(report.released, 2);
    assert!(db.locks.is_empty());
    for player in &players {
        assert_eq!(causes(&lobby, player).last(), Some(&SnapshotCause::PluginDisable));
        // no row left, so no query is needed
        let sent = db.bus.sent();
        survival.sync.join(player).unwrap();
        assert_eq!(db.bus.sent(), sent);
    }
}

#[test]
fn shutdown_finishes_queued_captures_before_freeing_locks() {
    init_tracing();
    let db = Database::new();
    let lobby = Node::start(&db);
    let alex = Gamer::new("Alex");
    lobby.sync.join(&alex).unwrap();
    lobby.settle();

    lobby.gates.save.arm();
    assert!(lobby.sync.on_death(Arc::clone(&alex)));
    // the death capture is now parked inside its save
    lobby.gates.save.meet();

    let players = vec![Arc::clone(&alex)];
    let report = thread::scope(|s| {
        let shutdown = s.spawn(|| lobby.sync.shutdown(&players));
        thread::sleep(Duration::from_millis(100));
        lobby.gates.save.meet();
        shutdown.join().unwrap()
    });

    assert!(!lobby.saved_unlocked.load(Ordering::SeqCst));
    assert_eq!(report.released, 1);
    assert!(db.locks.is_empty());
    assert!(causes(&lobby, &alex).contains(&SnapshotCause::PlayerDeath));
}
