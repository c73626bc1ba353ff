// Per record type metadata: table name, introspected columns, finalized layout.
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::hash::BuildHasherDefault;
use std::sync::{Arc, OnceLock};

use seahash::SeaHasher;
use tracing::{info, trace, warn};

use crate::associatable::AssociationKeeper;
use crate::error::{Error, Result};
use crate::inflect;
use crate::store::Store;

pub type NameHasher = BuildHasherDefault<SeaHasher>;

// ------------- Schema -------------
/// The fixed layout of a finalized record type. Records share it by `Arc`.
#[derive(Debug, PartialEq, Eq)]
pub struct Schema {
    type_name: String,
    table_name: String,
    columns: Arc<[String]>,
}
impl Schema {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
    pub fn table_name(&self) -> &str {
        &self.table_name
    }
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
    // columns are never empty, introspection refuses that
    pub fn primary_key(&self) -> &str {
        &self.columns[0]
    }
    pub fn position(&self, field: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == field)
    }
    pub fn contains(&self, field: &str) -> bool {
        self.position(field).is_some()
    }
    /// Fails unless `fields` are exactly the columns, in column order.
    pub fn check_fields(&self, declared_by: &str, fields: &[&str]) -> Result<()> {
        if fields.iter().copied().eq(self.columns.iter().map(String::as_str)) {
            return Ok(());
        }
        Err(Error::Schema {
            table: self.table_name.clone(),
            reason: format!(
                "{declared_by} declares fields [{}] but the table has columns [{}]",
                fields.join(", "),
                self.columns.join(", ")
            ),
        })
    }
}
impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.type_name, self.columns.join(", "))
    }
}

// ------------- RecordType -------------
#[derive(Debug)]
pub struct RecordType {
    name: String,
    table_name: String,
    columns: OnceLock<Arc<[String]>>,
    // set for types declared through `model!`, checked against the columns
    fields: Option<&'static [&'static str]>,
    schema: Option<Arc<Schema>>,
    associations: AssociationKeeper,
}
impl RecordType {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            table_name: inflect::tableize(name),
            columns: OnceLock::new(),
            fields: None,
            schema: None,
            associations: AssociationKeeper::new(),
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn table_name(&self) -> &str {
        &self.table_name
    }
    pub fn is_finalized(&self) -> bool {
        self.schema.is_some()
    }
    pub fn schema(&self) -> Option<&Arc<Schema>> {
        self.schema.as_ref()
    }
    pub fn fields(&self) -> Option<&'static [&'static str]> {
        self.fields
    }
    pub fn associations(&self) -> &AssociationKeeper {
        &self.associations
    }
    pub(crate) fn associations_mut(&mut self) -> &mut AssociationKeeper {
        &mut self.associations
    }
    pub(crate) fn set_fields(&mut self, fields: &'static [&'static str]) {
        self.fields = Some(fields);
    }
    /// Renaming is only honoured while the columns have not been read yet.
    pub(crate) fn set_table_name(&mut self, table_name: &str) {
        if self.columns.get().is_some() {
            warn!(
                record_type = %self.name,
                table = %self.table_name,
                ignored = table_name,
                "columns already introspected, keeping table name"
            );
            return;
        }
        self.table_name = table_name.to_owned();
    }
    /// Column names of the table, primary key first. The store is asked once.
    pub fn columns<S: Store + ?Sized>(&self, store: &S) -> Result<Arc<[String]>> {
        if let Some(columns) = self.columns.get() {
            trace!(record_type = %self.name, "columns cached");
            return Ok(Arc::clone(columns));
        }
        let sql = format!("SELECT * FROM {} LIMIT 0", self.table_name);
        let (names, _) = store
            .execute_with_columns(&sql)
            .map_err(|e| Error::Schema {
                table: self.table_name.clone(),
                reason: e.to_string(),
            })?;
        if names.is_empty() {
            return Err(Error::Schema {
                table: self.table_name.clone(),
                reason: "introspection returned no columns".to_owned(),
            });
        }
        let columns: Arc<[String]> = names.into();
        Ok(Arc::clone(self.columns.get_or_init(|| columns)))
    }
    pub(crate) fn finalize<S: Store + ?Sized>(&mut self, store: &S) -> Result<Arc<Schema>> {
        if let Some(schema) = &self.schema {
            return Ok(Arc::clone(schema));
        }
        let columns = self.columns(store)?;
        let schema = Arc::new(Schema {
            type_name: self.name.clone(),
            table_name: self.table_name.clone(),
            columns,
        });
        if let Some(fields) = self.fields {
            schema.check_fields(&self.name, fields)?;
        }
        info!(
            record_type = %self.name,
            table = %self.table_name,
            columns = schema.columns().len(),
            "finalized"
        );
        self.schema = Some(Arc::clone(&schema));
        Ok(schema)
    }
}

// ------------- SchemaKeeper -------------
#[derive(Debug, Default)]
pub struct SchemaKeeper {
    kept: HashMap<String, RecordType, NameHasher>,
}
impl SchemaKeeper {
    pub fn new() -> Self {
        Self {
            kept: HashMap::default(),
        }
    }
    /// Returns the kept type, creating it on first sight, and whether it
    /// had been kept before.
    pub fn keep(&mut self, name: &str) -> (&mut RecordType, bool) {
        match self.kept.entry(name.to_owned()) {
            Entry::Occupied(e) => (e.into_mut(), true),
            Entry::Vacant(e) => (e.insert(RecordType::new(name)), false),
        }
    }
    pub fn get(&self, name: &str) -> Option<&RecordType> {
        self.kept.get(name)
    }
    pub fn lookup(&self, name: &str) -> Result<&RecordType> {
        self.kept.get(name).ok_or_else(|| Error::UnknownType {
            type_name: name.to_owned(),
        })
    }
    pub fn lookup_mut(&mut self, name: &str) -> Result<&mut RecordType> {
        self.kept.get_mut(name).ok_or_else(|| Error::UnknownType {
            type_name: name.to_owned(),
        })
    }
    /// Symbolic name to finalized layout, as association targets need it.
    pub fn resolve(&self, name: &str) -> Result<Arc<Schema>> {
        self.kept
            .get(name)
            .and_then(RecordType::schema)
            .map(Arc::clone)
            .ok_or_else(|| Error::ClassResolution {
                type_name: name.to_owned(),
            })
    }
    pub fn iter(&self) -> impl Iterator<Item = &RecordType> {
        self.kept.values()
    }
    pub fn len(&self) -> usize {
        self.kept.len()
    }
    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }
}
