//! Test player, table-backed providers, and a manager wired to them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use playersync::{
    CachedProvider, Category, ComponentSource, ComponentTable, FixedClock, InMemorySnapshotStore,
    Player, PlayerId, Priority, ProviderError, ProviderRegistry, RestoreMarkers, RetentionPolicy,
    SnapshotId, SnapshotManager, WorkerPool,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

pub struct Gamer {
    pub id: PlayerId,
    pub name: String,
    pub inventory: Mutex<Vec<String>>,
    pub advancements: Mutex<Vec<String>>,
    pub level: Mutex<u32>,
}

impl Gamer {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            inventory: Mutex::new(vec!["diamond_sword".into()]),
            advancements: Mutex::new(vec!["story/mine_stone".into()]),
            level: Mutex::new(1),
        }
    }
}

impl Player for Gamer {
    fn id(&self) -> PlayerId {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

/// Switches a test can flip to make one provider fail.
#[derive(Default)]
pub struct Faults {
    pub capture: AtomicBool,
    pub delete: AtomicBool,
}

/// One player field persisted into a component table.
pub struct Field<C> {
    name: &'static str,
    category: Category,
    table: ComponentTable<C>,
    read: fn(&Gamer) -> C,
    write: fn(&Gamer, &C),
    faults: Arc<Faults>,
}

impl<C> ComponentSource for Field<C>
where
    C: Serialize + DeserializeOwned + Clone + Send + 'static,
{
    type Player = Gamer;
    type Component = C;

    fn name(&self) -> &str {
        self.name
    }

    fn category(&self) -> Category {
        self.category
    }

    fn capture(&self, id: SnapshotId, player: &Gamer) -> Result<Option<C>, ProviderError> {
        if self.faults.capture.load(Ordering::SeqCst) {
            return Err(ProviderError::Save(self.category, "criteria table unavailable".into()));
        }
        let value = (self.read)(player);
        self.table.put(id, &value)?;
        Ok(Some(value))
    }

    fn load(&self, id: SnapshotId) -> Result<Option<C>, ProviderError> {
        self.table.get(id)
    }

    fn apply(&self, component: &C, player: &Gamer) -> Result<(), ProviderError> {
        (self.write)(player, component);
        Ok(())
    }

    fn delete(&self, ids: &[SnapshotId]) -> Result<(), ProviderError> {
        if self.faults.delete.load(Ordering::SeqCst) {
            return Err(ProviderError::Remove(self.category, "lock wait timeout".into()));
        }
        self.table.delete(ids).map(|_| ())
    }
}

pub struct World {
    pub manager: SnapshotManager<Gamer>,
    pub headers: InMemorySnapshotStore,
    pub clock: FixedClock,
    pub inventory: ComponentTable<Vec<String>>,
    pub advancements: ComponentTable<Vec<String>>,
    pub level: ComponentTable<u32>,
    pub inventory_cache: Arc<CachedProvider<Field<Vec<String>>>>,
    pub advancement_faults: Arc<Faults>,
}

impl World {
    pub fn new(capacity: usize, keep_days: u32) -> Self {
        let headers = InMemorySnapshotStore::new();
        let clock = FixedClock::new(at(10, 12));
        let inventory = ComponentTable::new(Category::Inventory);
        let advancements = ComponentTable::new(Category::Advancements);
        let level = ComponentTable::new(Category::Profile);
        let advancement_faults = Arc::new(Faults::default());

        let inventory_cache = Arc::new(CachedProvider::new(Field {
            name: "inventory",
            category: Category::Inventory,
            table: inventory.clone(),
            read: |p: &Gamer| p.inventory.lock().unwrap().clone(),
            write: |p: &Gamer, c: &Vec<String>| *p.inventory.lock().unwrap() = c.clone(),
            faults: Arc::new(Faults::default()),
        }));
        let advancement_provider = Arc::new(CachedProvider::new(Field {
            name: "advancements",
            category: Category::Advancements,
            table: advancements.clone(),
            read: |p: &Gamer| p.advancements.lock().unwrap().clone(),
            write: |p: &Gamer, c: &Vec<String>| *p.advancements.lock().unwrap() = c.clone(),
            faults: Arc::clone(&advancement_faults),
        }));
        let level_provider = Arc::new(CachedProvider::new(Field {
            name: "profile",
            category: Category::Profile,
            table: level.clone(),
            read: |p: &Gamer| *p.level.lock().unwrap(),
            write: |p: &Gamer, c: &u32| *p.level.lock().unwrap() = *c,
            faults: Arc::new(Faults::default()),
        }));

        let providers = ProviderRegistry::new()
            .register_default(inventory_cache.clone())
            .register_default(advancement_provider)
            .register(Priority::Highest, level_provider);

        let manager = SnapshotManager::new(
            Arc::new(headers.clone()),
            providers,
            Arc::new(RestoreMarkers::new()),
            RetentionPolicy::new(capacity, keep_days),
            Arc::new(clock.clone()),
            Arc::new(WorkerPool::new("snapshots-test", 2).unwrap()),
        );

        Self {
            manager,
            headers,
            clock,
            inventory,
            advancements,
            level,
            inventory_cache,
            advancement_faults,
        }
    }

    /// Wait for background sweeps to finish.
    pub fn settle(&self) {
        assert!(self.manager.pool().wait_idle(Duration::from_secs(5)));
    }

    /// Whether any table still has a component for `id`.
    pub fn has_components(&self, id: SnapshotId) -> bool {
        self.inventory.contains(id) || self.advancements.contains(id) || self.level.contains(id)
    }
}
