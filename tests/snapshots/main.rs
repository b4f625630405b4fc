//! Capture, restore, and retention against table-backed providers.

mod support;

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use playersync::{
    CaptureError, Category, FixedClock, InMemorySnapshotStore, ProviderError, ProviderRegistry,
    RemoveError, RestoreMarkers, RetentionPolicy, SnapshotCause, SnapshotId, SnapshotManager,
    SnapshotProvider, SnapshotStore, WorkerPool,
};

use support::{at, init_tracing, Gamer, World};

// ============================================================================
// Capture
// ============================================================================

#[test]
fn capture_writes_header_and_every_component() {
    init_tracing();
    let world = World::new(45, 7);
    let alex = Gamer::new("Alex");

    let id = world.manager.create(&alex, SnapshotCause::WorldSave).unwrap();
    world.settle();

    let header = world.manager.get(id).unwrap().unwrap();
    assert_eq!(header.player_id, alex.id);
    assert_eq!(header.cause, SnapshotCause::WorldSave);
    assert_eq!(header.created_at, at(10, 12));
    assert_eq!(world.inventory.get(id).unwrap().unwrap(), vec!["diamond_sword"]);
    assert_eq!(world.level.get(id).unwrap(), Some(1));
    assert!(world.advancements.contains(id));
}

/// Records whether the header was already stored when `save` ran.
struct HeaderCheck {
    headers: InMemorySnapshotStore,
    seen: Mutex<Vec<bool>>,
}

impl SnapshotProvider<Gamer> for HeaderCheck {
    fn name(&self) -> &str {
        "header-check"
    }
    fn category(&self) -> Category {
        Category::TaggedData
    }
    fn save(&self, id: SnapshotId, _: &Gamer) -> Result<(), ProviderError> {
        let stored = self.headers.get(id).unwrap().is_some();
        self.seen.lock().unwrap().push(stored);
        Ok(())
    }
    fn restore(&self, _: SnapshotId, _: &Gamer) -> Result<bool, ProviderError> {
        Ok(false)
    }
    fn remove(&self, _: &[SnapshotId]) -> Result<(), ProviderError> {
        Ok(())
    }
    fn contains(&self, _: SnapshotId) -> Result<bool, ProviderError> {
        Ok(false)
    }
}

#[test]
fn header_exists_before_any_provider_runs() {
    init_tracing();
    let headers = InMemorySnapshotStore::new();
    let check = Arc::new(HeaderCheck {
        headers: headers.clone(),
        seen: Mutex::new(Vec::new()),
    });
    let manager = SnapshotManager::new(
        Arc::new(headers),
        ProviderRegistry::new().register_default(check.clone()),
        Arc::new(RestoreMarkers::new()),
        RetentionPolicy::new(45, 7),
        Arc::new(FixedClock::new(at(10, 12))),
        Arc::new(WorkerPool::new("header-check", 1).unwrap()),
    );
    let alex = Gamer::new("Alex");

    manager.create(&alex, SnapshotCause::PlayerJoin).unwrap();
    manager.create(&alex, SnapshotCause::PlayerQuit).unwrap();

    assert_eq!(*check.seen.lock().unwrap(), vec![true, true]);
}

#[test]
fn ids_are_never_reused() {
    init_tracing();
    let world = World::new(45, 7);
    let alex = Gamer::new("Alex");

    let first = world.manager.create(&alex, SnapshotCause::PlayerJoin).unwrap();
    let second = world.manager.create(&alex, SnapshotCause::PlayerDeath).unwrap();
    world.manager.remove(&[second]).unwrap();
    let third = world.manager.create(&alex, SnapshotCause::PlayerQuit).unwrap();
    world.settle();

    assert!(first < second && second < third);
}

#[test]
fn failing_provider_does_not_block_the_rest() {
    init_tracing();
    let world = World::new(45, 7);
    let steve = Gamer::new("Steve");
    world.advancement_faults.capture.store(true, Ordering::SeqCst);

    let id = world.manager.create(&steve, SnapshotCause::PlayerDeath).unwrap();
    world.settle();

    let header = world.manager.get(id).unwrap().unwrap();
    assert_eq!(header.cause, SnapshotCause::PlayerDeath);
    assert!(world.inventory.contains(id));
    assert!(world.level.contains(id));
    assert!(!world.advancements.contains(id));

    *steve.inventory.lock().unwrap() = Vec::new();
    *steve.level.lock().unwrap() = 0;
    let report = world.manager.restore(&header, &steve).unwrap();

    assert!(report.is_complete());
    assert_eq!(report.applied, vec![Category::Inventory, Category::Profile]);
    assert_eq!(report.missing, vec![Category::Advancements]);
    assert_eq!(*steve.inventory.lock().unwrap(), vec!["diamond_sword"]);
    assert_eq!(*steve.level.lock().unwrap(), 1);
}

#[test]
fn capture_refused_while_restoring() {
    init_tracing();
    let world = World::new(45, 7);
    let alex = Gamer::new("Alex");

    let guard = world.manager.markers().begin(&alex.id);
    let err = world
        .manager
        .create(&alex, SnapshotCause::PlayerGameModeChange)
        .unwrap_err();
    assert_eq!(err, CaptureError::RestoreInProgress(alex.id));
    assert!(world.headers.is_empty());

    drop(guard);
    world
        .manager
        .create(&alex, SnapshotCause::PlayerGameModeChange)
        .unwrap();
    world.settle();
    assert_eq!(world.headers.len(), 1);
}

#[test]
fn batch_capture_counts_successes() {
    init_tracing();
    let world = World::new(45, 7);
    let players = [Gamer::new("Alex"), Gamer::new("Steve"), Gamer::new("Notch")];
    let _restoring = world.manager.markers().begin(&players[1].id);

    let captured = world
        .manager
        .create_many(players.iter(), SnapshotCause::WorldSave);
    world.settle();

    assert_eq!(captured, 2);
    assert_eq!(world.manager.list(&players[0].id).unwrap().len(), 1);
    assert!(world.manager.list(&players[1].id).unwrap().is_empty());
    assert_eq!(world.manager.list(&players[2].id).unwrap().len(), 1);
}

#[test]
fn latest_snapshot_wins_on_restore() {
    init_tracing();
    let world = World::new(45, 7);
    let alex = Gamer::new("Alex");

    world.manager.create(&alex, SnapshotCause::WorldSave).unwrap();
    world.clock.set(at(10, 13));
    *alex.level.lock().unwrap() = 12;
    let newest = world.manager.create(&alex, SnapshotCause::PlayerQuit).unwrap();
    world.settle();

    *alex.level.lock().unwrap() = 0;
    let latest = world.manager.latest(&alex.id).unwrap().unwrap();
    assert_eq!(latest.id, newest);
    world.manager.restore(&latest, &alex).unwrap();
    assert_eq!(*alex.level.lock().unwrap(), 12);
}

// ============================================================================
// Removal
// ============================================================================

#[test]
fn removal_leaves_nothing_behind_including_cache() {
    init_tracing();
    let world = World::new(45, 7);
    let alex = Gamer::new("Alex");
    let id = world.manager.create(&alex, SnapshotCause::PlayerDeath).unwrap();
    world.settle();
    assert_eq!(world.inventory_cache.cached_id(), Some(id));

    assert_eq!(world.manager.remove(&[id]).unwrap(), 1);

    assert!(world.manager.get(id).unwrap().is_none());
    assert!(!world.has_components(id));
    assert_eq!(world.inventory_cache.cached_id(), None);
    assert_eq!(world.inventory_cache.fetch_latest(id).unwrap(), None);
}

#[test]
fn failed_component_removal_keeps_headers() {
    init_tracing();
    let world = World::new(45, 7);
    let alex = Gamer::new("Alex");
    let id = world.manager.create(&alex, SnapshotCause::WorldSave).unwrap();
    world.settle();
    world.advancement_faults.delete.store(true, Ordering::SeqCst);

    let err = world.manager.remove(&[id]).unwrap_err();

    assert_eq!(
        err,
        RemoveError::Incomplete {
            providers: vec!["advancements".to_string()],
            removed: vec![Category::Profile, Category::Inventory],
        }
    );
    // the kept header now restores without the categories already removed
    let restored = Gamer::new("Alex");
    let header = world.manager.get(id).unwrap().unwrap();
    let report = world.manager.restore(&header, &restored).unwrap();
    assert_eq!(report.applied, vec![Category::Advancements]);
    assert_eq!(report.missing, vec![Category::Profile, Category::Inventory]);
    assert!(world.manager.get(id).unwrap().is_some());

    world.advancement_faults.delete.store(false, Ordering::SeqCst);
    assert_eq!(world.manager.remove(&[id]).unwrap(), 1);
    assert!(world.manager.get(id).unwrap().is_none());
    assert!(!world.has_components(id));
}

// ============================================================================
// Retention
// ============================================================================

/// Writes a header plus components at a given time without going through
/// `create`, so no sweep runs.
fn seed(world: &World, player: &Gamer, when: chrono::NaiveDateTime) -> SnapshotId {
    let header = world
        .headers
        .insert(&player.id, SnapshotCause::WorldSave, when)
        .unwrap();
    world.inventory.put(header.id, &vec!["dirt".to_string()]).unwrap();
    world.level.put(header.id, &1).unwrap();
    header.id
}

#[test]
fn sweep_trims_old_days_first_and_keeps_each_recent_day() {
    init_tracing();
    // today is June 10th; the three-day window starts on the 7th
    let world = World::new(5, 3);
    let alex = Gamer::new("Alex");

    let old: Vec<_> = [at(5, 9), at(5, 18)]
        .into_iter()
        .map(|t| seed(&world, &alex, t))
        .collect();
    let eighth: Vec<_> = [at(8, 8), at(8, 12), at(8, 20)]
        .into_iter()
        .map(|t| seed(&world, &alex, t))
        .collect();
    let ninth: Vec<_> = [at(9, 8), at(9, 12), at(9, 20)]
        .into_iter()
        .map(|t| seed(&world, &alex, t))
        .collect();
    let tenth: Vec<_> = [at(10, 8), at(10, 11)]
        .into_iter()
        .map(|t| seed(&world, &alex, t))
        .collect();

    let removed = world.manager.wipe(&alex.id).unwrap();

    let expected = vec![old[0], old[1], eighth[0], eighth[1], ninth[0]];
    assert_eq!(removed, expected);

    let remaining: Vec<_> = world
        .manager
        .list(&alex.id)
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(remaining, vec![eighth[2], ninth[1], ninth[2], tenth[0], tenth[1]]);
    for id in expected {
        assert!(!world.has_components(id));
    }
    for id in remaining {
        assert!(world.inventory.contains(id));
    }
}

#[test]
fn sweep_never_removes_last_snapshot_of_recent_day() {
    init_tracing();
    let world = World::new(2, 7);
    let alex = Gamer::new("Alex");
    for day in 4..=10 {
        seed(&world, &alex, at(day, 12));
    }

    let removed = world.manager.wipe(&alex.id).unwrap();

    assert!(removed.is_empty());
    assert_eq!(world.manager.list(&alex.id).unwrap().len(), 7);
}

#[test]
fn sweep_removes_no_more_than_needed() {
    init_tracing();
    let world = World::new(4, 1);
    let alex = Gamer::new("Alex");
    for hour in 1..=6 {
        seed(&world, &alex, at(1, hour));
    }
    seed(&world, &alex, at(10, 9));

    let removed = world.manager.wipe(&alex.id).unwrap();

    assert_eq!(removed.len(), 3);
    assert_eq!(world.manager.list(&alex.id).unwrap().len(), 4);
}

#[test]
fn capture_schedules_a_sweep() {
    init_tracing();
    let world = World::new(3, 0);
    let alex = Gamer::new("Alex");

    let mut last = 0;
    for _ in 0..6 {
        last = world.manager.create(&alex, SnapshotCause::WorldSave).unwrap();
        world.settle();
    }

    let history = world.manager.list(&alex.id).unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history.last().unwrap().id, last);
    assert_eq!(world.inventory.len(), 3);
}
