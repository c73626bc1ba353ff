//! Records and their attribute store.
//!
//! A [`Record`] is nothing but a shared [`Schema`] plus an [`Attributes`]
//! map; every field read and write goes through that map. Dynamic access
//! (`get`/`set` by field name) is checked against the schema's columns.
//! Typed access comes from the [`model!`](crate::model) macro, which generates
//! one getter and one setter per declared field and whose field list is
//! checked against the table when the type is finalized.
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::datatype::{FromValue, NULL, Value};
use crate::error::{Error, Result};
use crate::schema::{NameHasher, Schema};

// ------------- Attributes -------------
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    kept: HashMap<String, Value, NameHasher>,
}
impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.kept.get(field)
    }
    pub fn insert(&mut self, field: &str, value: Value) -> Option<Value> {
        self.kept.insert(field.to_owned(), value)
    }
    pub fn contains(&self, field: &str) -> bool {
        self.kept.contains_key(field)
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.kept.iter().map(|(field, value)| (field.as_str(), value))
    }
    pub fn len(&self) -> usize {
        self.kept.len()
    }
    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }
}

// ------------- Record -------------
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<Schema>,
    attributes: Attributes,
}
impl Record {
    pub fn blank(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            attributes: Attributes::new(),
        }
    }
    /// Builds a record from field/value pairs, in the order given. The first
    /// field that is not a column of the schema is an error.
    pub fn new<K, V>(schema: Arc<Schema>, params: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut record = Self::blank(schema);
        for (field, value) in params {
            record.set(field.as_ref(), value)?;
        }
        Ok(record)
    }
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
    pub fn type_name(&self) -> &str {
        self.schema.type_name()
    }
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
    fn check(&self, field: &str) -> Result<()> {
        if self.schema.contains(field) {
            Ok(())
        } else {
            Err(Error::UnknownAttribute {
                type_name: self.schema.type_name().to_owned(),
                attribute: field.to_owned(),
            })
        }
    }
    /// Value of a declared field; unset fields read as NULL.
    pub fn get(&self, field: &str) -> Result<&Value> {
        self.check(field)?;
        Ok(self.attributes.get(field).unwrap_or(&NULL))
    }
    pub fn get_as<T: FromValue>(&self, field: &str) -> Result<Option<T>> {
        self.get(field).map(T::from_value)
    }
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        self.check(field)?;
        self.attributes.insert(field, value.into());
        Ok(())
    }
    // unchecked variants backing the generated accessors of `model!`;
    // a model only wraps records whose columns are exactly its fields
    #[doc(hidden)]
    pub fn field<T: FromValue>(&self, field: &str) -> Option<T> {
        self.attributes.get(field).and_then(T::from_value)
    }
    #[doc(hidden)]
    pub fn put(&mut self, field: &str, value: Value) {
        self.attributes.insert(field, value);
    }
    pub fn id(&self) -> &Value {
        self.attributes
            .get(self.schema.primary_key())
            .unwrap_or(&NULL)
    }
    pub fn set_id(&mut self, id: impl Into<Value>) {
        let primary_key = self.schema.primary_key().to_owned();
        self.attributes.insert(&primary_key, id.into());
    }
    /// Field values in column order, primary key first, NULL where unset.
    pub fn attribute_values(&self) -> Vec<Value> {
        self.schema
            .columns()
            .iter()
            .map(|column| self.attributes.get(column).cloned().unwrap_or_default())
            .collect()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.type_name() == other.type_name() && self.attribute_values() == other.attribute_values()
    }
}
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let fields: Vec<String> = self
            .schema
            .columns()
            .iter()
            .zip(self.attribute_values())
            .map(|(column, value)| format!("{column}: {value}"))
            .collect();
        write!(f, "{} {{{}}}", self.type_name(), fields.join(", "))
    }
}
impl AsRef<Record> for Record {
    fn as_ref(&self) -> &Record {
        self
    }
}
impl AsMut<Record> for Record {
    fn as_mut(&mut self) -> &mut Record {
        self
    }
}

// ------------- Model -------------
/// A record type with compile-time accessors, normally produced by [`model!`](crate::model).
pub trait Model: AsRef<Record> + AsMut<Record> + Sized {
    const TYPE_NAME: &'static str;
    const TABLE_NAME: Option<&'static str>;
    const FIELDS: &'static [&'static str];

    #[doc(hidden)]
    fn wrap(record: Record) -> Self;
    fn into_record(self) -> Record;

    /// Fails on a record of another type, and on a record whose layout is
    /// not exactly `FIELDS`.
    fn from_record(record: Record) -> Result<Self> {
        if record.type_name() != Self::TYPE_NAME {
            return Err(Error::TypeMismatch {
                expected: Self::TYPE_NAME.to_owned(),
                found: record.type_name().to_owned(),
            });
        }
        record.schema().check_fields(Self::TYPE_NAME, Self::FIELDS)?;
        Ok(Self::wrap(record))
    }
}

/// Declares a typed record.
///
/// Each field is written `getter / setter: Type`, in column order with the
/// primary key first. An optional `in "table"` overrides the default table
/// name.
///
/// ```
/// sqlobject::model! {
///     pub struct GymLeader in "gym_leaders" {
///         id / set_id: i64,
///         name / set_name: String,
///         gym_id / set_gym_id: i64,
///     }
/// }
/// ```
#[macro_export]
macro_rules! model {
    (@table $table:literal) => { Some($table) };
    (@table) => { None };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident $(in $table:literal)? {
            $( $field:ident / $setter:ident : $ty:ty ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $name($crate::Record);

        impl $crate::Model for $name {
            const TYPE_NAME: &'static str = stringify!($name);
            const TABLE_NAME: Option<&'static str> = $crate::model!(@table $($table)?);
            const FIELDS: &'static [&'static str] = &[$(stringify!($field)),+];

            fn wrap(record: $crate::Record) -> Self {
                Self(record)
            }
            fn into_record(self) -> $crate::Record {
                self.0
            }
        }

        impl AsRef<$crate::Record> for $name {
            fn as_ref(&self) -> &$crate::Record {
                &self.0
            }
        }
        impl AsMut<$crate::Record> for $name {
            fn as_mut(&mut self) -> &mut $crate::Record {
                &mut self.0
            }
        }

        #[allow(dead_code)]
        impl $name {
            $(
                pub fn $field(&self) -> Option<$ty> {
                    self.0.field::<$ty>(stringify!($field))
                }
                pub fn $setter(&mut self, value: impl Into<$crate::Value>) {
                    self.0.put(stringify!($field), value.into());
                }
            )+
        }
    };
}
