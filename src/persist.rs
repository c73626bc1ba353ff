// used for persistence: the write path from records to the store
use std::sync::Arc;

use tracing::debug;

use crate::construct::Database;
use crate::error::{Error, Result};
use crate::record::Record;
use crate::store::Store;

pub(crate) fn insert_sql(table: &str, columns: &[String]) -> String {
    if columns.is_empty() {
        return format!("INSERT INTO {table} DEFAULT VALUES");
    }
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders})",
        columns.join(", ")
    )
}

pub(crate) fn update_sql(table: &str, primary_key: &str, columns: &[String]) -> String {
    let assignments: Vec<String> = columns.iter().map(|column| format!("{column} = ?")).collect();
    format!(
        "UPDATE {table} SET {} WHERE {primary_key} = ?",
        assignments.join(", ")
    )
}

impl<S: Store> Database<S> {
    /// Inserts every non-key column, then takes the generated key as the
    /// record's id.
    pub fn insert<R: AsMut<Record>>(&self, record: &mut R) -> Result<()> {
        let record = record.as_mut();
        let schema = Arc::clone(record.schema());
        let values = record.attribute_values();
        let sql = insert_sql(schema.table_name(), &schema.columns()[1..]);
        self.store.execute(&sql, &values[1..])?;
        let id = self.store.last_insert_id()?;
        record.set_id(id);
        debug!(record_type = schema.type_name(), id, "inserted");
        Ok(())
    }
    pub fn update<R: AsMut<Record>>(&self, record: &mut R) -> Result<()> {
        let record = record.as_mut();
        let schema = Arc::clone(record.schema());
        let id = record.id().clone();
        if id.is_null() {
            return Err(Error::Persistence {
                type_name: schema.type_name().to_owned(),
                reason: "record has no identity".to_owned(),
            });
        }
        let columns = &schema.columns()[1..];
        if columns.is_empty() {
            // a key-only row has nothing to update
            return Ok(());
        }
        let mut binds = record.attribute_values().split_off(1);
        binds.push(id);
        let sql = update_sql(schema.table_name(), schema.primary_key(), columns);
        self.store.execute(&sql, &binds)?;
        debug!(record_type = schema.type_name(), id = %record.id(), "updated");
        Ok(())
    }
    /// Inserts records without an id, updates the rest.
    pub fn save<R: AsMut<Record>>(&self, record: &mut R) -> Result<()> {
        if record.as_mut().id().is_null() {
            self.insert(record)
        } else {
            self.update(record)
        }
    }
}
