#![allow(dead_code)]
use std::cell::Cell;

use sqlobject::{AssociationOptions, Database, PersistenceMode, Result, Row, SqliteStore, Store, Value};
use tracing_subscriber::EnvFilter;

pub const POKEDEX: &str = include_str!("../fixtures/pokedex.sql");

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn store() -> SqliteStore {
    SqliteStore::with_seed(PersistenceMode::InMemory, POKEDEX).unwrap()
}

// The classic trio: a Pokemon belongs to its GymLeader, who belongs to a Gym.
pub fn declare<S: Store>(db: &mut Database<S>) {
    db.declare("Pokemon")
        .belongs_to("GymLeader", AssociationOptions::new().foreign_key("gym_leader_id"))
        .has_one_through("gym", "GymLeader", "gym")
        .finalize()
        .unwrap();
    db.declare("GymLeader")
        .table_name("gym_leaders")
        .has_many("pokemons", AssociationOptions::new().foreign_key("gym_leader_id"))
        .belongs_to("gym", AssociationOptions::new())
        .finalize()
        .unwrap();
    db.declare("Gym")
        .has_many("gym_leaders", AssociationOptions::new())
        .finalize()
        .unwrap();
}

pub fn setup() -> Database {
    init_tracing();
    let mut db = Database::new(store());
    declare(&mut db);
    db
}

/// Passes everything through to a seeded in-memory store, counting calls.
pub struct CountingStore {
    inner: SqliteStore,
    pub executions: Cell<usize>,
    pub introspections: Cell<usize>,
}
impl CountingStore {
    pub fn new() -> Self {
        init_tracing();
        Self {
            inner: store(),
            executions: Cell::new(0),
            introspections: Cell::new(0),
        }
    }
}
impl Store for CountingStore {
    fn execute(&self, sql: &str, binds: &[Value]) -> Result<Vec<Row>> {
        self.executions.set(self.executions.get() + 1);
        self.inner.execute(sql, binds)
    }
    fn execute_with_columns(&self, sql: &str) -> Result<(Vec<String>, Vec<Row>)> {
        self.introspections.set(self.introspections.get() + 1);
        self.inner.execute_with_columns(sql)
    }
    fn last_insert_id(&self) -> Result<i64> {
        self.inner.last_insert_id()
    }
    fn reset(&self) -> Result<()> {
        self.inner.reset()
    }
}
