//! Equality searches over a record type's table.
//!
//! [`Criteria`] keeps its pairs in insertion order, and that order is the
//! order of both the `field = ?` predicates and their binds. No criteria at
//! all means no WHERE clause, so every row matches.
use std::sync::Arc;

use indexmap::IndexMap;

use crate::construct::Database;
use crate::datatype::Value;
use crate::error::{Error, Result};
use crate::record::{Model, Record};
use crate::schema::Schema;
use crate::store::{Row, Store};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    pairs: IndexMap<String, Value>,
}
impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }
    /// Adds `field = value`. Repeating a field replaces its value but keeps
    /// its original position.
    pub fn and(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }
    pub fn insert(&mut self, field: &str, value: impl Into<Value>) {
        self.pairs.insert(field.to_owned(), value.into());
    }
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.pairs.keys().map(String::as_str)
    }
    pub fn binds(&self) -> Vec<Value> {
        self.pairs.values().cloned().collect()
    }
    pub fn len(&self) -> usize {
        self.pairs.len()
    }
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
    pub(crate) fn where_clause(&self) -> String {
        self.fields()
            .map(|field| format!("{field} = ?"))
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}
impl<K: AsRef<str>, V: Into<Value>> FromIterator<(K, V)> for Criteria {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut criteria = Self::new();
        for (field, value) in iter {
            criteria.insert(field.as_ref(), value);
        }
        criteria
    }
}
impl<K: AsRef<str>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Criteria {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

pub(crate) fn select_sql(table: &str, criteria: &Criteria) -> String {
    if criteria.is_empty() {
        format!("SELECT * FROM {table}")
    } else {
        format!("SELECT * FROM {table} WHERE {}", criteria.where_clause())
    }
}

pub(crate) fn materialize(schema: &Arc<Schema>, rows: Vec<Row>) -> Result<Vec<Record>> {
    rows.into_iter()
        .map(|row| Record::new(Arc::clone(schema), row))
        .collect()
}

impl<S: Store> Database<S> {
    pub fn where_(&self, type_name: &str, criteria: &Criteria) -> Result<Vec<Record>> {
        let schema = self.schema(type_name)?;
        // field names go into the SQL text verbatim, so only columns pass
        if let Some(field) = criteria.fields().find(|field| !schema.contains(field)) {
            return Err(Error::UnknownAttribute {
                type_name: type_name.to_owned(),
                attribute: field.to_owned(),
            });
        }
        let rows = self
            .store
            .execute(&select_sql(schema.table_name(), criteria), &criteria.binds())?;
        materialize(&schema, rows)
    }
    pub fn all(&self, type_name: &str) -> Result<Vec<Record>> {
        let schema = self.schema(type_name)?;
        let table = schema.table_name();
        let rows = self.store.execute(&format!("SELECT {table}.* FROM {table}"), &[])?;
        materialize(&schema, rows)
    }
    pub fn find(&self, type_name: &str, id: impl Into<Value>) -> Result<Option<Record>> {
        let schema = self.schema(type_name)?;
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ? LIMIT 1",
            schema.table_name(),
            schema.primary_key()
        );
        let rows = self.store.execute(&sql, &[id.into()])?;
        Ok(materialize(&schema, rows)?.into_iter().next())
    }
    /// Turns field/value mappings into records of `type_name`, exactly as
    /// rows coming back from the store are.
    pub fn parse_all<I, K, V>(&self, type_name: &str, rows: impl IntoIterator<Item = I>) -> Result<Vec<Record>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let schema = self.schema(type_name)?;
        rows.into_iter()
            .map(|row| Record::new(Arc::clone(&schema), row))
            .collect()
    }

    // ------------- typed -------------
    pub fn where_as<M: Model>(&self, criteria: &Criteria) -> Result<Vec<M>> {
        self.model_schema::<M>()?;
        Ok(self.where_(M::TYPE_NAME, criteria)?.into_iter().map(M::wrap).collect())
    }
    pub fn all_as<M: Model>(&self) -> Result<Vec<M>> {
        self.model_schema::<M>()?;
        Ok(self.all(M::TYPE_NAME)?.into_iter().map(M::wrap).collect())
    }
    pub fn find_as<M: Model>(&self, id: impl Into<Value>) -> Result<Option<M>> {
        self.model_schema::<M>()?;
        Ok(self.find(M::TYPE_NAME, id)?.map(M::wrap))
    }
}
