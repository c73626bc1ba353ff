//! Associations between record types.
//!
//! Declaring an association only records an [`AssociationDescriptor`] under
//! its name in the declaring type's [`AssociationKeeper`]. Target types are
//! kept as symbolic names and resolved when the association is followed, so
//! types may be declared in any order. A `has-one-through` refers to two
//! other descriptors by name and is composed the same way, at call time.
//!
//! [`Database::link`] runs the same resolution eagerly over every declared
//! association, for callers that want a misspelt name to fail at startup.
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::construct::Database;
use crate::error::{Error, Result};
use crate::inflect;
use crate::record::{Model, Record};
use crate::schema::{NameHasher, Schema};
use crate::searchable::{materialize, Criteria};
use crate::store::Store;

/// Overrides for the conventional keys and target type of an association.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationOptions {
    foreign_key: Option<String>,
    primary_key: Option<String>,
    class_name: Option<String>,
}
impl AssociationOptions {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn foreign_key(mut self, foreign_key: &str) -> Self {
        self.foreign_key = Some(foreign_key.to_owned());
        self
    }
    pub fn primary_key(mut self, primary_key: &str) -> Self {
        self.primary_key = Some(primary_key.to_owned());
        self
    }
    pub fn class_name(mut self, class_name: &str) -> Self {
        self.class_name = Some(class_name.to_owned());
        self
    }
}

/// Resolved keys of a direct association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssocOptions {
    pub foreign_key: String,
    pub primary_key: String,
    pub class_name: String,
}
impl AssocOptions {
    /// `belongs_to :gym` -> foreign key `gym_id`, primary key `id`, class `Gym`.
    pub fn belongs_to(name: &str, options: &AssociationOptions) -> Self {
        Self {
            foreign_key: options
                .foreign_key
                .clone()
                .unwrap_or_else(|| format!("{name}_id").to_lowercase()),
            primary_key: options.primary_key.clone().unwrap_or_else(|| "id".to_owned()),
            class_name: options
                .class_name
                .clone()
                .unwrap_or_else(|| inflect::camelize(&inflect::singularize(name))),
        }
    }
    /// The default foreign key is the owner's type name lower-cased as a
    /// whole, so `GymLeader` owns through `gymleader_id`.
    pub fn has_many(name: &str, owner: &str, options: &AssociationOptions) -> Self {
        Self {
            foreign_key: options
                .foreign_key
                .clone()
                .unwrap_or_else(|| format!("{owner}_id").to_lowercase()),
            primary_key: options.primary_key.clone().unwrap_or_else(|| "id".to_owned()),
            class_name: options
                .class_name
                .clone()
                .unwrap_or_else(|| inflect::camelize(&inflect::singularize(name))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssociationDescriptor {
    BelongsTo(AssocOptions),
    HasMany(AssocOptions),
    HasOneThrough {
        through_name: String,
        source_name: String,
    },
}
impl AssociationDescriptor {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BelongsTo(_) => "belongs_to",
            Self::HasMany(_) => "has_many",
            Self::HasOneThrough { .. } => "has_one_through",
        }
    }
    /// Keys and target of a direct association, `None` for a through.
    pub fn options(&self) -> Option<&AssocOptions> {
        match self {
            Self::BelongsTo(options) | Self::HasMany(options) => Some(options),
            Self::HasOneThrough { .. } => None,
        }
    }
}

// ------------- AssociationKeeper -------------
/// The association registry of one record type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationKeeper {
    kept: HashMap<String, AssociationDescriptor, NameHasher>,
}
impl AssociationKeeper {
    pub fn new() -> Self {
        Self::default()
    }
    /// A later declaration under the same name replaces the earlier one.
    /// Returns whether something was replaced.
    pub fn keep(&mut self, name: &str, descriptor: AssociationDescriptor) -> bool {
        self.kept.insert(name.to_owned(), descriptor).is_some()
    }
    pub fn get(&self, name: &str) -> Option<&AssociationDescriptor> {
        self.kept.get(name)
    }
    pub fn contains(&self, name: &str) -> bool {
        self.kept.contains_key(name)
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AssociationDescriptor)> {
        self.kept.iter().map(|(name, descriptor)| (name.as_str(), descriptor))
    }
    pub fn len(&self) -> usize {
        self.kept.len()
    }
    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }
}

/// What following an association yields.
#[derive(Debug, Clone, PartialEq)]
pub enum Associated {
    One(Option<Record>),
    Many(Vec<Record>),
}
impl Associated {
    pub fn into_one(self) -> Option<Record> {
        match self {
            Self::One(record) => record,
            Self::Many(records) => records.into_iter().next(),
        }
    }
    pub fn into_many(self) -> Vec<Record> {
        match self {
            Self::One(record) => record.into_iter().collect(),
            Self::Many(records) => records,
        }
    }
}

// Both halves of a has-one-through, resolved.
struct Through<'a> {
    through: &'a AssocOptions,
    through_schema: Arc<Schema>,
    source: &'a AssocOptions,
    source_schema: Arc<Schema>,
}

pub(crate) fn through_sql(through_table: &str, through_pk: &str, source_table: &str, source_fk: &str, source_pk: &str) -> String {
    format!(
        "SELECT {source_table}.* FROM {through_table} \
         JOIN {source_table} ON {through_table}.{source_fk} = {source_table}.{source_pk} \
         WHERE {through_table}.{through_pk} = ?"
    )
}

impl<S: Store> Database<S> {
    /// The association registry of `type_name`; empty if it declared none.
    pub fn association_options(&self, type_name: &str) -> Result<&AssociationKeeper> {
        Ok(self.schema_keeper.lookup(type_name)?.associations())
    }
    /// The finalized type an association points at.
    pub fn model_class(&self, options: &AssocOptions) -> Result<Arc<Schema>> {
        self.schema_keeper.resolve(&options.class_name)
    }
    /// Table of the type an association points at.
    pub fn assoc_table_name(&self, options: &AssocOptions) -> Result<String> {
        Ok(self.model_class(options)?.table_name().to_owned())
    }
    fn descriptor(&self, type_name: &str, name: &str) -> Result<&AssociationDescriptor> {
        self.association_options(type_name)?
            .get(name)
            .ok_or_else(|| Error::AssociationNotFound {
                type_name: type_name.to_owned(),
                association: name.to_owned(),
            })
    }
    // a through or source slot has to hold a direct association
    fn direct(&self, type_name: &str, name: &str) -> Result<&AssocOptions> {
        self.descriptor(type_name, name)?
            .options()
            .ok_or_else(|| Error::AssociationNotFound {
                type_name: type_name.to_owned(),
                association: name.to_owned(),
            })
    }
    fn through(&self, type_name: &str, through_name: &str, source_name: &str) -> Result<Through<'_>> {
        let through = self.direct(type_name, through_name)?;
        let through_schema = self.model_class(through)?;
        let source = self.direct(through_schema.type_name(), source_name)?;
        let source_schema = self.model_class(source)?;
        Ok(Through {
            through,
            through_schema,
            source,
            source_schema,
        })
    }
    /// Follows the association `name` declared on `record`'s type.
    pub fn associated<R: AsRef<Record>>(&self, record: &R, name: &str) -> Result<Associated> {
        let record = record.as_ref();
        debug!(record_type = record.type_name(), association = name, "following association");
        match self.descriptor(record.type_name(), name)? {
            AssociationDescriptor::BelongsTo(options) => {
                let target = self.model_class(options)?;
                let criteria = Criteria::new().and(&options.primary_key, record.get(&options.foreign_key)?.clone());
                let found = self.where_(target.type_name(), &criteria)?;
                Ok(Associated::One(found.into_iter().next()))
            }
            AssociationDescriptor::HasMany(options) => {
                let target = self.model_class(options)?;
                let criteria = Criteria::new().and(&options.foreign_key, record.get(&options.primary_key)?.clone());
                Ok(Associated::Many(self.where_(target.type_name(), &criteria)?))
            }
            AssociationDescriptor::HasOneThrough {
                through_name,
                source_name,
            } => {
                let resolved = self.through(record.type_name(), through_name, source_name)?;
                let key = record.get(&resolved.through.foreign_key)?.clone();
                let sql = through_sql(
                    resolved.through_schema.table_name(),
                    &resolved.through.primary_key,
                    resolved.source_schema.table_name(),
                    &resolved.source.foreign_key,
                    &resolved.source.primary_key,
                );
                let rows = self.store.execute(&sql, &[key])?;
                let found = materialize(&resolved.source_schema, rows)?;
                Ok(Associated::One(found.into_iter().next()))
            }
        }
    }
    pub fn one_as<M: Model, R: AsRef<Record>>(&self, record: &R, name: &str) -> Result<Option<M>> {
        self.model_schema::<M>()?;
        self.associated(record, name)?
            .into_one()
            .map(M::from_record)
            .transpose()
    }
    pub fn many_as<M: Model, R: AsRef<Record>>(&self, record: &R, name: &str) -> Result<Vec<M>> {
        self.model_schema::<M>()?;
        self.associated(record, name)?
            .into_many()
            .into_iter()
            .map(M::from_record)
            .collect()
    }
    /// Resolves every declared association now instead of when it is first
    /// followed. Fails on the first target type that is not finalized and on
    /// the first through or source association that does not exist.
    pub fn link(&self) -> Result<()> {
        let mut linked = 0;
        for record_type in self.schema_keeper.iter() {
            for (_, descriptor) in record_type.associations().iter() {
                match descriptor {
                    AssociationDescriptor::BelongsTo(options) | AssociationDescriptor::HasMany(options) => {
                        self.model_class(options)?;
                    }
                    AssociationDescriptor::HasOneThrough {
                        through_name,
                        source_name,
                    } => {
                        self.through(record_type.name(), through_name, source_name)?;
                    }
                }
                linked += 1;
            }
        }
        info!(types = self.schema_keeper.len(), associations = linked, "associations linked");
        Ok(())
    }
}
