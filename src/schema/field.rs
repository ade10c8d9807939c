use crate::Value;

/// Zero-argument default producer, evaluated at save time. See [`next_id`].
pub type Producer = fn() -> Value;

/// Default source for a column: a fixed scalar or a producer.
#[derive(Clone, Debug)]
pub enum ColumnDefault {
    Fixed(Value),
    Computed(Producer),
}

impl ColumnDefault {
    pub fn resolve(&self) -> Value {
        match self {
            ColumnDefault::Fixed(value) => value.clone(),
            ColumnDefault::Computed(producer) => producer(),
        }
    }
}

/// Column kind, one per concrete descriptor constructor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    String,
    Boolean,
    Integer,
    Float,
    Text,
}

impl Kind {
    fn descriptor(&self) -> &'static str {
        match self {
            Kind::String => "StringField",
            Kind::Boolean => "BooleanField",
            Kind::Integer => "IntegerField",
            Kind::Float => "FloatField",
            Kind::Text => "TextField",
        }
    }
}

/// Describes one column mapping: attribute name, SQL type literal,
/// key-ness, and default. The SQL type is fixed by the constructor.
/// Constructed once when the entity type is declared and immutable after
/// the schema builder takes it.
#[derive(Clone, Debug)]
pub struct Field {
    name: String,
    column: Option<String>,
    ddl: String,
    kind: Kind,
    primary: bool,
    default: Option<ColumnDefault>,
}

impl Field {
    fn new(name: &str, kind: Kind, ddl: String) -> Self {
        Self {
            name: name.to_string(),
            column: None,
            ddl,
            kind,
            primary: false,
            default: None,
        }
    }

    /// `varchar(100)` string column.
    pub fn string(name: &str) -> Self {
        Self::varchar(name, 100)
    }
    /// `varchar(width)` string column.
    pub fn varchar(name: &str, width: usize) -> Self {
        Self::new(name, Kind::String, format!("varchar({})", width))
    }
    /// `boolean` column.
    pub fn boolean(name: &str) -> Self {
        Self::new(name, Kind::Boolean, "boolean".to_string())
    }
    /// `bigint` column.
    pub fn integer(name: &str) -> Self {
        Self::new(name, Kind::Integer, "bigint".to_string())
    }
    /// `real` column.
    pub fn float(name: &str) -> Self {
        Self::new(name, Kind::Float, "real".to_string())
    }
    /// `text` column.
    pub fn text(name: &str) -> Self {
        Self::new(name, Kind::Text, "text".to_string())
    }

    /// Marks this field as the table's primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Overrides the database column name. Without an override the
    /// declaring attribute name is the column name.
    pub fn column(mut self, column: &str) -> Self {
        self.column = Some(column.to_string());
        self
    }

    /// Fixed default, used when no explicit value is supplied at save time.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(ColumnDefault::Fixed(value.into()));
        self
    }

    /// Computed default, evaluated once per save of an absent attribute.
    pub fn default_with(mut self, producer: Producer) -> Self {
        self.default = Some(ColumnDefault::Computed(producer));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn column_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }
    pub fn ddl(&self) -> &str {
        &self.ddl
    }
    pub fn is_primary_key(&self) -> bool {
        self.primary
    }
    pub fn default(&self) -> Option<&ColumnDefault> {
        self.default.as_ref()
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}, {}:{}>", self.kind.descriptor(), self.ddl, self.name)
    }
}

/// Time-ordered unique key producer for varchar primary keys.
pub fn next_id() -> Value {
    Value::Text(uuid::Uuid::now_v7().simple().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_representation() {
        assert_eq!(
            Field::string("id").primary_key().to_string(),
            "<StringField, varchar(100):id>"
        );
        assert_eq!(
            Field::integer("age").to_string(),
            "<IntegerField, bigint:age>"
        );
        assert_eq!(
            Field::varchar("email", 50).to_string(),
            "<StringField, varchar(50):email>"
        );
    }

    #[test]
    fn column_name_defaults_to_attribute() {
        let field = Field::string("name");
        assert_eq!(field.column_name(), "name");
        let field = Field::string("name").column("user_name");
        assert_eq!(field.column_name(), "user_name");
    }

    #[test]
    fn defaults_resolve() {
        let fixed = Field::integer("age").default_value(0i64);
        assert_eq!(fixed.default().unwrap().resolve(), Value::Int(0));
        let computed = Field::varchar("id", 50).default_with(next_id);
        assert!(!computed.default().unwrap().resolve().is_null());
    }

    #[test]
    fn generated_keys_are_unique() {
        let (a, b) = (next_id(), next_id());
        assert_ne!(a, b);
        match a {
            Value::Text(id) => assert_eq!(id.len(), 32),
            other => panic!("unexpected key shape: {:?}", other),
        }
    }
}
