//! Query execution over pooled connections: placeholder translation,
//! row decoding, and the read/write seam entity operations call.

use crate::Error;
use crate::PgErr;
use crate::Pool;
use crate::Result;
use crate::Value;
use tokio_postgres::types::ToSql;

/// One decoded result row: `(column, value)` pairs in result-set order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tuple {
    columns: Vec<(String, Value)>,
}

impl Tuple {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub(crate) fn decode(row: &tokio_postgres::Row) -> std::result::Result<Self, PgErr> {
        let mut columns = Vec::with_capacity(row.len());
        for (index, column) in row.columns().iter().enumerate() {
            columns.push((column.name().to_string(), Value::decode(row, index)?));
        }
        Ok(Self { columns })
    }
}

impl IntoIterator for Tuple {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;
    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

/// Rewrites `?` positional placeholders into the driver's `$1..$n` form.
/// Question marks inside single-quoted literals are left alone.
pub(crate) fn translate(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut position = 0;
    let mut quoted = false;
    for ch in sql.chars() {
        match ch {
            '\'' => {
                quoted = !quoted;
                out.push(ch);
            }
            '?' if !quoted => {
                position += 1;
                out.push('$');
                out.push_str(&position.to_string());
            }
            _ => out.push(ch),
        }
    }
    out
}

fn bind(args: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    args.iter()
        .map(|value| value as &(dyn ToSql + Sync))
        .collect()
}

/// Read/write interface between entity operations and the database.
/// Consolidates execution behind one seam, decoupling CRUD from the
/// driver and the pool.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Runs a SELECT and decodes every returned row, truncated to the
    /// first `limit` rows when given.
    async fn read(&self, sql: &str, args: &[Value], limit: Option<usize>) -> Result<Vec<Tuple>>;

    /// Runs one INSERT/UPDATE/DELETE and returns the affected-row count
    /// exactly as the driver reports it. With `autocommit` off the
    /// statement runs inside an explicit transaction; failures roll back
    /// before propagating.
    async fn write(&self, sql: &str, args: &[Value], autocommit: bool) -> Result<u64>;

    /// Default execution mode for entity writes.
    fn autocommit(&self) -> bool {
        true
    }

    /// Whether a single-row write anomaly fails instead of warning.
    fn strict_writes(&self) -> bool {
        false
    }
}

#[async_trait::async_trait]
impl Backend for Pool {
    async fn read(&self, sql: &str, args: &[Value], limit: Option<usize>) -> Result<Vec<Tuple>> {
        log::info!("sql ({})", sql);
        let statement = translate(sql);
        let conn = self.acquire().await?;
        let rows = conn
            .query(statement.as_str(), &bind(args))
            .await
            .map_err(|source| Error::Query {
                sql: sql.to_string(),
                source,
            })?;
        let keep = limit.unwrap_or(rows.len());
        let tuples = rows
            .iter()
            .take(keep)
            .map(Tuple::decode)
            .collect::<std::result::Result<Vec<Tuple>, PgErr>>()
            .map_err(|source| Error::Query {
                sql: sql.to_string(),
                source,
            })?;
        log::info!("rows returned ({})", tuples.len());
        Ok(tuples)
    }

    async fn write(&self, sql: &str, args: &[Value], autocommit: bool) -> Result<u64> {
        log::info!("sql ({})", sql);
        let statement = translate(sql);
        let mut conn = self.acquire().await?;
        let wrap = |source: PgErr| Error::Query {
            sql: sql.to_string(),
            source,
        };
        if autocommit {
            conn.execute(statement.as_str(), &bind(args)).await.map_err(wrap)
        } else {
            let transaction = conn.transaction().await.map_err(wrap)?;
            match transaction.execute(statement.as_str(), &bind(args)).await {
                Ok(affected) => {
                    transaction.commit().await.map_err(wrap)?;
                    Ok(affected)
                }
                Err(source) => {
                    // Report rollback failure, but propagate the original.
                    if let Err(rollback) = transaction.rollback().await {
                        log::error!("rollback failed ({})", rollback);
                    }
                    Err(wrap(source))
                }
            }
        }
    }

    fn autocommit(&self) -> bool {
        self.config().autocommit
    }

    fn strict_writes(&self) -> bool {
        self.config().strict_writes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_numbered_in_order() {
        assert_eq!(
            translate("SELECT 1 FROM t WHERE a = ? AND b = ?"),
            "SELECT 1 FROM t WHERE a = $1 AND b = $2"
        );
    }

    #[test]
    fn quoted_literals_are_untouched() {
        assert_eq!(
            translate("SELECT 1 FROM t WHERE a = '?' AND b = ?"),
            "SELECT 1 FROM t WHERE a = '?' AND b = $1"
        );
    }

    #[test]
    fn translation_is_identity_without_placeholders() {
        assert_eq!(translate("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn two_digit_positions() {
        let sql = vec!["?"; 12].join(", ");
        assert!(translate(&sql).ends_with("$11, $12"));
    }

    #[test]
    fn tuple_lookup_by_column() {
        let tuple = Tuple::new(vec![
            ("id".to_string(), Value::Text("u1".to_string())),
            ("age".to_string(), Value::Int(7)),
        ]);
        assert_eq!(tuple.get("age"), Some(&Value::Int(7)));
        assert_eq!(tuple.get("name"), None);
        assert_eq!(tuple.len(), 2);
    }
}
