use crate::Error;
use crate::Result;
use crate::Schema;
use crate::Tuple;
use crate::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One entity row bound to its [`Schema`].
///
/// Attribute values live in an explicit map; reads fall back to the
/// descriptor's declared default, which is evaluated once and cached on
/// the record. Persistence state is not tracked here; callers choose
/// between [`save`](Record::save), [`update`](Record::update), and
/// [`remove`](Record::remove) explicitly.
#[derive(Clone, Debug)]
pub struct Record {
    schema: Arc<Schema>,
    values: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            values: BTreeMap::new(),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Stores `value` under `name`, overwriting any previous value.
    /// No validation happens against the column's declared SQL type;
    /// attributes outside the schema are rejected.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        if self.schema.field(name).is_none() {
            return Err(Error::InvalidArgument(format!(
                "unknown attribute ({})",
                name
            )));
        }
        self.values.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Stored value only; absent attributes yield `None`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Stored value, else the field's default, evaluated and cached on
    /// this record. Fields without a default resolve to `Null`.
    pub fn get_or_default(&mut self, name: &str) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            return Ok(value.clone());
        }
        let field = self.schema.field(name).ok_or_else(|| {
            Error::InvalidArgument(format!("unknown attribute ({})", name))
        })?;
        let value = field
            .default()
            .map(|default| default.resolve())
            .unwrap_or(Value::Null);
        log::debug!("using default for attribute ({})", name);
        self.values.insert(name.to_string(), value.clone());
        Ok(value)
    }

    /// Rebuilds a record from one decoded row, mapping database column
    /// names back to attribute names. Columns outside the schema (for
    /// example aggregate aliases) are dropped.
    pub(crate) fn from_tuple(schema: &Arc<Schema>, tuple: Tuple) -> Self {
        let mut record = Self::new(Arc::clone(schema));
        for (column, value) in tuple {
            if let Some(attribute) = schema.attribute_for_column(&column) {
                record.values.insert(attribute.to_string(), value);
            }
        }
        record
    }
}
