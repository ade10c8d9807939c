use super::Record;
use crate::Backend;
use crate::Error;
use crate::Result;
use crate::Schema;
use crate::Value;
use std::sync::Arc;

/// Row-count bound for [`Lookup::find_all`]: the first `n` rows, or an
/// `(offset, count)` window into the ordered result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Limit {
    Count(u64),
    Range { offset: u64, count: u64 },
}

impl Limit {
    /// Parses the dynamic limit shapes accepted from callers binding
    /// request parameters: one non-negative integer (count) or two
    /// (offset, count). Anything else is a caller-contract violation.
    pub fn parse(args: &[Value]) -> Result<Self> {
        match args {
            [Value::Int(count)] if *count >= 0 => Ok(Self::Count(*count as u64)),
            [Value::Int(offset), Value::Int(count)] if *offset >= 0 && *count >= 0 => {
                Ok(Self::Range {
                    offset: *offset as u64,
                    count: *count as u64,
                })
            }
            _ => Err(Error::InvalidArgument(format!(
                "malformed limit shape ({:?})",
                args
            ))),
        }
    }
}

/// Optional clauses appended to the schema's SELECT template.
///
/// The WHERE fragment is caller-supplied SQL; positional parameters are
/// the only injection protection.
#[derive(Clone, Debug, Default)]
pub struct Filter {
    condition: Option<String>,
    args: Vec<Value>,
    order_by: Option<String>,
    limit: Option<Limit>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn condition(mut self, sql: &str, args: Vec<Value>) -> Self {
        self.condition = Some(sql.to_string());
        self.args = args;
        self
    }

    pub fn order_by(mut self, clause: &str) -> Self {
        self.order_by = Some(clause.to_string());
        self
    }

    pub fn limit(mut self, limit: Limit) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Read-side entity operations, implemented on the shared schema handle
/// so every decoded row is bound back to the schema it came from.
#[async_trait::async_trait]
pub trait Lookup {
    /// Fetches every row matching `filter`, in database result order.
    /// An empty result set is an empty vector, never an error.
    async fn find_all<B: Backend>(&self, db: &B, filter: Filter) -> Result<Vec<Record>>;

    /// Primary-key lookup.
    async fn find<B: Backend, K: Into<Value> + Send>(
        &self,
        db: &B,
        key: K,
    ) -> Result<Option<Record>>;

    /// Matching-row count over the primary key, with an optional
    /// caller-supplied condition.
    async fn count<B: Backend>(
        &self,
        db: &B,
        condition: Option<&str>,
        args: &[Value],
    ) -> Result<i64>;
}

#[async_trait::async_trait]
impl Lookup for Arc<Schema> {
    async fn find_all<B: Backend>(&self, db: &B, filter: Filter) -> Result<Vec<Record>> {
        let mut sql = self.select_sql().to_string();
        let mut args = filter.args;
        if let Some(condition) = &filter.condition {
            sql.push_str(" WHERE ");
            sql.push_str(condition);
        }
        if let Some(order_by) = &filter.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }
        match filter.limit {
            Some(Limit::Count(count)) => {
                sql.push_str(" LIMIT ?");
                args.push(Value::Int(count as i64));
            }
            Some(Limit::Range { offset, count }) => {
                sql.push_str(" LIMIT ? OFFSET ?");
                args.push(Value::Int(count as i64));
                args.push(Value::Int(offset as i64));
            }
            None => {}
        }
        let rows = db.read(&sql, &args, None).await?;
        Ok(rows
            .into_iter()
            .map(|tuple| Record::from_tuple(self, tuple))
            .collect())
    }

    async fn find<B: Backend, K: Into<Value> + Send>(
        &self,
        db: &B,
        key: K,
    ) -> Result<Option<Record>> {
        let sql = format!("{} WHERE {}=?", self.select_sql(), self.key_column());
        let rows = db.read(&sql, &[key.into()], Some(1)).await?;
        Ok(rows
            .into_iter()
            .next()
            .map(|tuple| Record::from_tuple(self, tuple)))
    }

    async fn count<B: Backend>(
        &self,
        db: &B,
        condition: Option<&str>,
        args: &[Value],
    ) -> Result<i64> {
        let mut sql = format!(
            "SELECT COUNT({}) AS num FROM {}",
            self.key_column(),
            self.quoted_table()
        );
        if let Some(condition) = condition {
            sql.push_str(" WHERE ");
            sql.push_str(condition);
        }
        let rows = db.read(&sql, args, Some(1)).await?;
        match rows.first().and_then(|tuple| tuple.get("num")) {
            Some(Value::Int(count)) => Ok(*count),
            _ => Ok(0),
        }
    }
}

impl Record {
    /// INSERT this record: non-key fields in declaration order, primary
    /// key last, matching the template's placeholder order. Absent
    /// attributes resolve through their declared defaults, so producer
    /// defaults fire here.
    pub async fn save<B>(&mut self, db: &B) -> Result<()>
    where
        B: Backend,
    {
        let schema = Arc::clone(self.schema());
        let mut args = Vec::with_capacity(schema.others().len() + 1);
        for name in schema.others() {
            args.push(self.get_or_default(name)?);
        }
        args.push(self.get_or_default(schema.primary_key())?);
        let affected = db.write(schema.insert_sql(), &args, db.autocommit()).await?;
        expect_single(affected, "insert", db.strict_writes())
    }

    /// UPDATE by primary key, binding stored values only; attributes
    /// never set on this record are written as NULL.
    pub async fn update<B>(&self, db: &B) -> Result<()>
    where
        B: Backend,
    {
        let schema = self.schema();
        let mut args = schema
            .others()
            .iter()
            .map(|name| self.get(name).cloned().unwrap_or(Value::Null))
            .collect::<Vec<Value>>();
        args.push(
            self.get(schema.primary_key())
                .cloned()
                .unwrap_or(Value::Null),
        );
        let affected = db.write(schema.update_sql(), &args, db.autocommit()).await?;
        expect_single(affected, "update", db.strict_writes())
    }

    /// DELETE by primary key.
    pub async fn remove<B>(&self, db: &B) -> Result<()>
    where
        B: Backend,
    {
        let schema = self.schema();
        let key = self
            .get(schema.primary_key())
            .cloned()
            .unwrap_or(Value::Null);
        let affected = db.write(schema.delete_sql(), &[key], db.autocommit()).await?;
        expect_single(affected, "delete", db.strict_writes())
    }
}

/// Single-row write policy: strict mode fails, permissive mode warns and
/// carries on.
fn expect_single(affected: u64, operation: &str, strict: bool) -> Result<()> {
    if affected == 1 {
        return Ok(());
    }
    if strict {
        return Err(Error::RowCount(affected));
    }
    log::warn!(
        "{} affected {} rows where exactly one was expected",
        operation,
        affected
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Field;
    use crate::Tuple;
    use crate::next_id;
    use std::sync::Mutex;

    /// Records every statement it is handed and answers with canned rows.
    struct Stub {
        issued: Mutex<Vec<(String, Vec<Value>)>>,
        rows: Vec<Tuple>,
        affected: u64,
        strict: bool,
    }

    impl Stub {
        fn new() -> Self {
            Self {
                issued: Mutex::new(Vec::new()),
                rows: Vec::new(),
                affected: 1,
                strict: false,
            }
        }

        fn issued(&self) -> Vec<(String, Vec<Value>)> {
            self.issued.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Backend for Stub {
        async fn read(
            &self,
            sql: &str,
            args: &[Value],
            limit: Option<usize>,
        ) -> Result<Vec<Tuple>> {
            self.issued
                .lock()
                .unwrap()
                .push((sql.to_string(), args.to_vec()));
            let mut rows = self.rows.clone();
            if let Some(limit) = limit {
                rows.truncate(limit);
            }
            Ok(rows)
        }

        async fn write(&self, sql: &str, args: &[Value], _autocommit: bool) -> Result<u64> {
            self.issued
                .lock()
                .unwrap()
                .push((sql.to_string(), args.to_vec()));
            Ok(self.affected)
        }

        fn strict_writes(&self) -> bool {
            self.strict
        }
    }

    fn users() -> Arc<Schema> {
        Arc::new(
            Schema::builder("users")
                .field(Field::varchar("id", 50).primary_key().default_with(next_id))
                .field(Field::string("name"))
                .field(Field::integer("age").default_value(0i64))
                .build()
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn save_orders_args_and_resolves_defaults() {
        let db = Stub::new();
        let mut user = Record::new(users());
        user.set("id", "u1").unwrap();
        user.set("name", "Alice").unwrap();
        user.save(&db).await.unwrap();
        let issued = db.issued();
        assert_eq!(issued.len(), 1);
        assert_eq!(
            issued[0].0,
            r#"INSERT INTO "users" ("name", "age", "id") VALUES (?, ?, ?)"#
        );
        assert_eq!(
            issued[0].1,
            vec![
                Value::Text("Alice".to_string()),
                Value::Int(0),
                Value::Text("u1".to_string()),
            ]
        );
        // The resolved default is now cached on the record.
        assert_eq!(user.get("age"), Some(&Value::Int(0)));
    }

    #[tokio::test]
    async fn save_generates_missing_keys() {
        let db = Stub::new();
        let mut user = Record::new(users());
        user.set("name", "Alice").unwrap();
        user.save(&db).await.unwrap();
        match user.get("id") {
            Some(Value::Text(id)) => assert_eq!(id.len(), 32),
            other => panic!("expected generated key, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn save_row_count_policy() {
        let mut permissive = Stub::new();
        permissive.affected = 0;
        let mut user = Record::new(users());
        user.set("id", "u1").unwrap();
        assert!(user.save(&permissive).await.is_ok());

        let mut strict = Stub::new();
        strict.affected = 0;
        strict.strict = true;
        let mut user = Record::new(users());
        user.set("id", "u1").unwrap();
        assert!(matches!(user.save(&strict).await, Err(Error::RowCount(0))));
    }

    #[tokio::test]
    async fn find_all_appends_clauses_in_order() {
        let db = Stub::new();
        users()
            .find_all(
                &db,
                Filter::new()
                    .condition(r#""name" = ?"#, vec![Value::from("Alice")])
                    .order_by(r#""age" DESC"#)
                    .limit(Limit::Range {
                        offset: 2,
                        count: 3,
                    }),
            )
            .await
            .unwrap();
        let issued = db.issued();
        assert_eq!(
            issued[0].0,
            r#"SELECT "id", "name", "age" FROM "users" WHERE "name" = ? ORDER BY "age" DESC LIMIT ? OFFSET ?"#
        );
        assert_eq!(
            issued[0].1,
            vec![
                Value::Text("Alice".to_string()),
                Value::Int(3),
                Value::Int(2),
            ]
        );
    }

    #[tokio::test]
    async fn find_all_with_count_limit() {
        let db = Stub::new();
        users()
            .find_all(&db, Filter::new().limit(Limit::Count(5)))
            .await
            .unwrap();
        let issued = db.issued();
        assert_eq!(
            issued[0].0,
            r#"SELECT "id", "name", "age" FROM "users" LIMIT ?"#
        );
        assert_eq!(issued[0].1, vec![Value::Int(5)]);
    }

    #[tokio::test]
    async fn find_all_yields_empty_not_error() {
        let db = Stub::new();
        let found = users().find_all(&db, Filter::new()).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn find_maps_one_row() {
        let mut db = Stub::new();
        db.rows = vec![Tuple::new(vec![
            ("id".to_string(), Value::Text("u1".to_string())),
            ("name".to_string(), Value::Text("Alice".to_string())),
            ("age".to_string(), Value::Int(7)),
        ])];
        let found = users().find(&db, "u1").await.unwrap().unwrap();
        assert_eq!(found.get("name"), Some(&Value::Text("Alice".to_string())));
        let issued = db.issued();
        assert_eq!(
            issued[0].0,
            r#"SELECT "id", "name", "age" FROM "users" WHERE "id"=?"#
        );
        assert_eq!(issued[0].1, vec![Value::Text("u1".to_string())]);
    }

    #[tokio::test]
    async fn count_reads_the_aggregate() {
        let mut db = Stub::new();
        db.rows = vec![Tuple::new(vec![("num".to_string(), Value::Int(42))])];
        let counted = users()
            .count(&db, Some(r#""age" > ?"#), &[Value::Int(18)])
            .await
            .unwrap();
        assert_eq!(counted, 42);
        let issued = db.issued();
        assert_eq!(
            issued[0].0,
            r#"SELECT COUNT("id") AS num FROM "users" WHERE "age" > ?"#
        );
    }

    #[tokio::test]
    async fn update_binds_stored_values_and_key_last() {
        let db = Stub::new();
        let mut user = Record::new(users());
        user.set("id", "u1").unwrap();
        user.set("age", 31i64).unwrap();
        user.update(&db).await.unwrap();
        let issued = db.issued();
        assert_eq!(
            issued[0].0,
            r#"UPDATE "users" SET "name"=?, "age"=? WHERE "id"=?"#
        );
        assert_eq!(
            issued[0].1,
            vec![Value::Null, Value::Int(31), Value::Text("u1".to_string())]
        );
    }

    #[tokio::test]
    async fn remove_binds_primary_key() {
        let db = Stub::new();
        let mut user = Record::new(users());
        user.set("id", "u1").unwrap();
        user.remove(&db).await.unwrap();
        let issued = db.issued();
        assert_eq!(issued[0].0, r#"DELETE FROM "users" WHERE "id"=?"#);
        assert_eq!(issued[0].1, vec![Value::Text("u1".to_string())]);
    }

    #[test]
    fn limit_shapes() {
        assert_eq!(Limit::parse(&[Value::Int(5)]).unwrap(), Limit::Count(5));
        assert_eq!(
            Limit::parse(&[Value::Int(2), Value::Int(3)]).unwrap(),
            Limit::Range {
                offset: 2,
                count: 3
            }
        );
        for malformed in [
            vec![],
            vec![Value::Text("x".to_string())],
            vec![Value::Int(-1)],
            vec![Value::Int(1), Value::Int(2), Value::Int(3)],
            vec![Value::Real(1.5)],
        ] {
            assert!(matches!(
                Limit::parse(&malformed),
                Err(Error::InvalidArgument(_))
            ));
        }
    }
}
