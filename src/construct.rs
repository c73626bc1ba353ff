// This sets up the database with the necessary structures
use std::sync::Arc;

use tracing::debug;

use crate::associatable::{AssocOptions, AssociationDescriptor, AssociationOptions};
use crate::datatype::Value;
use crate::error::{Error, Result};
use crate::record::{Model, Record};
use crate::schema::{RecordType, Schema, SchemaKeeper};
use crate::store::{SqliteStore, Store};

/// Owns the store and the metadata of every declared record type.
///
/// Declaration and finalization take `&mut self` and happen once, at setup.
/// Everything afterwards (searching, saving, following associations) only
/// needs `&self`.
pub struct Database<S: Store = SqliteStore> {
    pub(crate) store: S,
    pub(crate) schema_keeper: SchemaKeeper,
}

impl<S: Store> Database<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            schema_keeper: SchemaKeeper::new(),
        }
    }
    pub fn store(&self) -> &S {
        &self.store
    }
    pub fn schema_keeper(&self) -> &SchemaKeeper {
        &self.schema_keeper
    }
    /// Declares a record type, or reopens one declared earlier.
    pub fn declare(&mut self, type_name: &str) -> Declaration<'_, S> {
        let (record_type, previously_kept) = self.schema_keeper.keep(type_name);
        if !previously_kept {
            debug!(record_type = type_name, table = record_type.table_name(), "declared");
        }
        Declaration {
            store: &self.store,
            record_type,
        }
    }
    /// Declares the type behind a `model!` struct, carrying its table name
    /// and field list along.
    pub fn declare_model<M: Model>(&mut self) -> Declaration<'_, S> {
        let mut declaration = self.declare(M::TYPE_NAME);
        declaration.record_type.set_fields(M::FIELDS);
        if let Some(table_name) = M::TABLE_NAME {
            declaration = declaration.table_name(table_name);
        }
        declaration
    }
    pub fn finalize(&mut self, type_name: &str) -> Result<Arc<Schema>> {
        self.schema_keeper.lookup_mut(type_name)?.finalize(&self.store)
    }
    pub fn table_name(&self, type_name: &str) -> Result<&str> {
        Ok(self.schema_keeper.lookup(type_name)?.table_name())
    }
    pub fn columns(&self, type_name: &str) -> Result<Arc<[String]>> {
        self.schema_keeper.lookup(type_name)?.columns(&self.store)
    }
    /// Layout of a finalized type; declared but unfinalized types have no
    /// accessors and therefore no layout.
    pub fn schema(&self, type_name: &str) -> Result<Arc<Schema>> {
        self.schema_keeper
            .lookup(type_name)?
            .schema()
            .map(Arc::clone)
            .ok_or_else(|| Error::NotFinalized {
                type_name: type_name.to_owned(),
            })
    }
    pub fn new_record<K, V>(&self, type_name: &str, params: impl IntoIterator<Item = (K, V)>) -> Result<Record>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        Record::new(self.schema(type_name)?, params)
    }
    pub fn build<M, K, V>(&self, params: impl IntoIterator<Item = (K, V)>) -> Result<M>
    where
        M: Model,
        K: AsRef<str>,
        V: Into<Value>,
    {
        Record::new(self.model_schema::<M>()?, params).map(M::wrap)
    }
    /// Layout of `M`'s type, provided its columns are exactly `M::FIELDS`.
    /// Guards every typed entry point, whichever way the type was declared.
    pub fn model_schema<M: Model>(&self) -> Result<Arc<Schema>> {
        let schema = self.schema(M::TYPE_NAME)?;
        schema.check_fields(M::TYPE_NAME, M::FIELDS)?;
        Ok(schema)
    }
}

/// Builder handed out by [`Database::declare`].
pub struct Declaration<'db, S: Store> {
    store: &'db S,
    record_type: &'db mut RecordType,
}

impl<'db, S: Store> Declaration<'db, S> {
    pub fn table_name(self, table_name: &str) -> Self {
        self.record_type.set_table_name(table_name);
        self
    }
    pub fn belongs_to(self, name: &str, options: AssociationOptions) -> Self {
        let descriptor = AssociationDescriptor::BelongsTo(AssocOptions::belongs_to(name, &options));
        self.associate(name, descriptor)
    }
    pub fn has_many(self, name: &str, options: AssociationOptions) -> Self {
        let owner = self.record_type.name().to_owned();
        let descriptor = AssociationDescriptor::HasMany(AssocOptions::has_many(name, &owner, &options));
        self.associate(name, descriptor)
    }
    /// Neither `through` nor `source` has to exist yet; both are looked up
    /// by name when the association is followed.
    pub fn has_one_through(self, name: &str, through: &str, source: &str) -> Self {
        let descriptor = AssociationDescriptor::HasOneThrough {
            through_name: through.to_owned(),
            source_name: source.to_owned(),
        };
        self.associate(name, descriptor)
    }
    fn associate(self, name: &str, descriptor: AssociationDescriptor) -> Self {
        debug!(
            record_type = self.record_type.name(),
            association = name,
            kind = descriptor.kind(),
            "association declared"
        );
        self.record_type.associations_mut().keep(name, descriptor);
        self
    }
    pub fn record_type(&self) -> &RecordType {
        &*self.record_type
    }
    pub fn finalize(self) -> Result<Arc<Schema>> {
        self.record_type.finalize(self.store)
    }
}
