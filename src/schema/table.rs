use super::Field;
use crate::Error;
use crate::Result;

/// Accumulates field declarations for one table, in declaration order.
/// Hand the finished builder to [`Registry::declare`](super::Registry::declare)
/// or derive directly with [`SchemaBuilder::build`].
pub struct SchemaBuilder {
    table: String,
    fields: Vec<Field>,
}

impl SchemaBuilder {
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Result<Schema> {
        Schema::derive(self)
    }

    pub(crate) fn table(&self) -> &str {
        &self.table
    }
}

/// Derived, immutable table metadata: primary key, ordered non-key
/// columns, and precomputed SQL templates with `?` positional
/// placeholders. Derivation runs once per entity type and never touches
/// the database; safely shared across tasks after that.
#[derive(Debug)]
pub struct Schema {
    table: String,
    fields: Vec<Field>,
    primary_key: String,
    others: Vec<String>,
    select: String,
    insert: String,
    update: String,
    delete: String,
}

impl Schema {
    pub fn builder(table: &str) -> SchemaBuilder {
        SchemaBuilder {
            table: table.to_string(),
            fields: Vec::new(),
        }
    }

    /// Partitions declared fields into exactly one primary key plus the
    /// ordered rest, quotes every identifier, and builds the four SQL
    /// templates. Fails when the primary-key count is not exactly one or
    /// when two fields share an attribute name.
    fn derive(builder: SchemaBuilder) -> Result<Schema> {
        let table = builder.table;
        let fields = builder.fields;
        let fail = |reason: String| Error::Schema {
            table: table.clone(),
            reason,
        };
        let mut seen = std::collections::HashSet::new();
        for field in &fields {
            if !seen.insert(field.name()) {
                return Err(fail(format!("duplicate attribute ({})", field.name())));
            }
        }
        let primaries = fields
            .iter()
            .filter(|field| field.is_primary_key())
            .collect::<Vec<&Field>>();
        let primary = match primaries.as_slice() {
            [] => return Err(fail("no primary key declared".to_string())),
            [primary] => *primary,
            many => return Err(fail(format!("{} primary keys declared", many.len()))),
        };
        let primary_key = primary.name().to_string();
        let key = quote(primary.column_name());
        let others = fields
            .iter()
            .filter(|field| !field.is_primary_key())
            .map(|field| field.name().to_string())
            .collect::<Vec<String>>();
        let columns = fields
            .iter()
            .filter(|field| !field.is_primary_key())
            .map(|field| quote(field.column_name()))
            .collect::<Vec<String>>();
        let mut selected = vec![key.clone()];
        selected.extend(columns.iter().cloned());
        let mut inserted = columns.clone();
        inserted.push(key.clone());
        let select = format!("SELECT {} FROM {}", selected.join(", "), quote(&table));
        let insert = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(&table),
            inserted.join(", "),
            placeholders(inserted.len()),
        );
        let update = format!(
            "UPDATE {} SET {} WHERE {}=?",
            quote(&table),
            columns
                .iter()
                .map(|column| format!("{}=?", column))
                .collect::<Vec<String>>()
                .join(", "),
            key,
        );
        let delete = format!("DELETE FROM {} WHERE {}=?", quote(&table), key);
        log::info!("derived table ({})", table);
        for field in &fields {
            log::info!("mapped attribute ({}) as {}", field.name(), field);
        }
        Ok(Schema {
            table,
            fields,
            primary_key,
            others,
            select,
            insert,
            update,
            delete,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
    /// Attribute name of the primary key.
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }
    /// Non-key attribute names, declaration order.
    pub fn others(&self) -> &[String] {
        &self.others
    }
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name() == name)
    }
    /// Attribute behind a database column name, honoring overrides.
    pub fn attribute_for_column(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.column_name() == column)
            .map(|field| field.name())
    }
    /// Quoted primary-key column, for WHERE clauses built on the fly.
    pub fn key_column(&self) -> String {
        self.field(&self.primary_key)
            .map(|field| quote(field.column_name()))
            .expect("primary key field")
    }
    pub(crate) fn quoted_table(&self) -> String {
        quote(&self.table)
    }

    pub fn select_sql(&self) -> &str {
        &self.select
    }
    pub fn insert_sql(&self) -> &str {
        &self.insert
    }
    pub fn update_sql(&self) -> &str {
        &self.update
    }
    pub fn delete_sql(&self) -> &str {
        &self.delete
    }
}

/// Double-quote identifier escaping, embedded quotes doubled.
pub(crate) fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// `?, ?, ..., ?` argument list of the given arity.
fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
