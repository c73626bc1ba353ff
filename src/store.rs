//! The relational backend the mapping layer talks to.
//!
//! Everything above this module speaks only the [`Store`] trait: run a
//! parameterized statement and get rows back, run a statement and get its
//! column names, read the last generated key. [`SqliteStore`] is the rusqlite
//! implementation used in practice and in the tests.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use indexmap::IndexMap;
use rusqlite::{params_from_iter, Connection};
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::datatype::Value;
use crate::error::{Error, Result};

/// One result row, field name to value, in select-list order.
pub type Row = IndexMap<String, Value>;

pub trait Store {
    /// Runs `sql` with positional `?` placeholders bound left to right.
    fn execute(&self, sql: &str, binds: &[Value]) -> Result<Vec<Row>>;
    /// Runs `sql` and also reports the statement's result column names,
    /// even when no rows come back.
    fn execute_with_columns(&self, sql: &str) -> Result<(Vec<String>, Vec<Row>)>;
    /// Key generated by the most recent insert on this store.
    fn last_insert_id(&self) -> Result<i64>;
    /// Test hook: throw the backing data away and start over.
    fn reset(&self) -> Result<()>;
}

impl<S: Store + ?Sized> Store for &S {
    fn execute(&self, sql: &str, binds: &[Value]) -> Result<Vec<Row>> {
        (**self).execute(sql, binds)
    }
    fn execute_with_columns(&self, sql: &str) -> Result<(Vec<String>, Vec<Row>)> {
        (**self).execute_with_columns(sql)
    }
    fn last_insert_id(&self) -> Result<i64> {
        (**self).last_insert_id()
    }
    fn reset(&self) -> Result<()> {
        (**self).reset()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceMode {
    InMemory,
    File(PathBuf),
}

// ------------- SQLite -------------
pub struct SqliteStore {
    connection: Mutex<Connection>,
    mode: PersistenceMode,
    seed: Option<String>,
}

impl SqliteStore {
    pub fn new(mode: PersistenceMode) -> Result<Self> {
        let connection = Self::connect(&mode)?;
        Ok(Self {
            connection: Mutex::new(connection),
            mode,
            seed: None,
        })
    }
    /// Opens the store and runs `seed` against it. The same script is run
    /// again on every [`Store::reset`].
    pub fn with_seed(mode: PersistenceMode, seed: impl Into<String>) -> Result<Self> {
        let seed = seed.into();
        let connection = Self::connect(&mode)?;
        connection.execute_batch(&seed)?;
        Ok(Self {
            connection: Mutex::new(connection),
            mode,
            seed: Some(seed),
        })
    }
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let mode = match &config.path {
            Some(path) => PersistenceMode::File(path.clone()),
            None => PersistenceMode::InMemory,
        };
        info!(?mode, seed = ?config.seed, "opening sqlite store");
        match &config.seed {
            Some(seed) => Self::with_seed(mode, fs::read_to_string(seed)?),
            None => Self::new(mode),
        }
    }
    pub fn mode(&self) -> &PersistenceMode {
        &self.mode
    }
    fn connect(mode: &PersistenceMode) -> Result<Connection> {
        let connection = match mode {
            PersistenceMode::InMemory => Connection::open_in_memory()?,
            PersistenceMode::File(path) => Connection::open(path)?,
        };
        connection.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(connection)
    }
    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|e| Error::Lock(e.to_string()))
    }
    // `discard` gets the database file once its connection is closed. When
    // closing or discarding fails, the store stays on the file it had.
    fn reset_with(&self, discard: impl FnOnce(&Path) -> io::Result<()>) -> Result<()> {
        let mut connection = self.lock()?;
        if let PersistenceMode::File(path) = &self.mode {
            let previous = std::mem::replace(&mut *connection, Connection::open_in_memory()?);
            if let Err((previous, e)) = previous.close() {
                *connection = previous;
                return Err(e.into());
            }
            if let Err(e) = discard(path) {
                *connection = Self::connect(&self.mode)?;
                warn!(?path, error = %e, "store file kept, reset abandoned");
                return Err(e.into());
            }
        }
        *connection = Self::connect(&self.mode)?;
        if let Some(seed) = &self.seed {
            connection.execute_batch(seed)?;
        }
        debug!(mode = ?self.mode, "store reset");
        Ok(())
    }
    fn run(connection: &Connection, sql: &str, binds: &[Value]) -> Result<(Vec<String>, Vec<Row>)> {
        debug!(sql, binds = binds.len(), "executing statement");
        let mut statement = connection.prepare(sql)?;
        let columns: Vec<String> = statement
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let mut rows = statement.query(params_from_iter(binds.iter()))?;
        let mut mapped = Vec::new();
        while let Some(row) = rows.next()? {
            let mut fields = Row::with_capacity(columns.len());
            for (index, column) in columns.iter().enumerate() {
                fields.insert(column.clone(), row.get::<_, Value>(index)?);
            }
            mapped.push(fields);
        }
        Ok((columns, mapped))
    }
}

impl Store for SqliteStore {
    fn execute(&self, sql: &str, binds: &[Value]) -> Result<Vec<Row>> {
        let connection = self.lock()?;
        Self::run(&connection, sql, binds).map(|(_, rows)| rows)
    }
    fn execute_with_columns(&self, sql: &str) -> Result<(Vec<String>, Vec<Row>)> {
        let connection = self.lock()?;
        Self::run(&connection, sql, &[])
    }
    fn last_insert_id(&self) -> Result<i64> {
        Ok(self.lock()?.last_insert_rowid())
    }
    fn reset(&self) -> Result<()> {
        self.reset_with(|path| if path.exists() { fs::remove_file(path) } else { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_reset_keeps_the_file_store() {
        let path = std::env::temp_dir().join(format!("sqlobject-kept-{}.db", std::process::id()));
        let _ = fs::remove_file(&path);
        let store = SqliteStore::with_seed(
            PersistenceMode::File(path.clone()),
            "CREATE TABLE gyms (id INTEGER PRIMARY KEY, name TEXT);",
        )
        .unwrap();
        store.execute("INSERT INTO gyms (name) VALUES (?)", &["Rock".into()]).unwrap();

        let err = store.reset_with(|_| Err(io::Error::other("file busy"))).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        let rows = store.execute("SELECT name FROM gyms", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], Value::from("Rock"));

        store.reset().unwrap();
        assert!(store.execute("SELECT name FROM gyms", &[]).unwrap().is_empty());
        drop(store);
        fs::remove_file(&path).unwrap();
    }
}
