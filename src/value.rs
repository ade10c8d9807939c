use crate::PgErr;
use bytes::BytesMut;
use tokio_postgres::Row;
use tokio_postgres::types::IsNull;
use tokio_postgres::types::ToSql;
use tokio_postgres::types::Type;
use tokio_postgres::types::to_sql_checked;

/// Runtime value for one column position.
///
/// Covers the five declared column kinds plus SQL NULL. Values bind to
/// statements positionally and are narrowed to the parameter's wire type
/// where the driver expects a smaller integer or float; a genuinely
/// mismatched binding surfaces as a server-side error, never a silent cast.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Decodes one column of a result row, driven by its declared type.
    /// Anything outside the supported kinds is read back as text, which
    /// fails with the driver's conversion error for non-textual columns.
    pub(crate) fn decode(row: &Row, index: usize) -> Result<Self, PgErr> {
        let ty = row.columns()[index].type_();
        if *ty == Type::BOOL {
            Ok(row
                .try_get::<_, Option<bool>>(index)?
                .map_or(Value::Null, Value::Bool))
        } else if *ty == Type::INT2 {
            Ok(row
                .try_get::<_, Option<i16>>(index)?
                .map_or(Value::Null, |i| Value::Int(i as i64)))
        } else if *ty == Type::INT4 {
            Ok(row
                .try_get::<_, Option<i32>>(index)?
                .map_or(Value::Null, |i| Value::Int(i as i64)))
        } else if *ty == Type::INT8 {
            Ok(row
                .try_get::<_, Option<i64>>(index)?
                .map_or(Value::Null, Value::Int))
        } else if *ty == Type::FLOAT4 {
            Ok(row
                .try_get::<_, Option<f32>>(index)?
                .map_or(Value::Null, |r| Value::Real(r as f64)))
        } else if *ty == Type::FLOAT8 {
            Ok(row
                .try_get::<_, Option<f64>>(index)?
                .map_or(Value::Null, Value::Real))
        } else {
            Ok(row
                .try_get::<_, Option<String>>(index)?
                .map_or(Value::Null, Value::Text))
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}
impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}
impl From<f32> for Value {
    fn from(r: f32) -> Self {
        Value::Real(r as f64)
    }
}
impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Value::Real(r)
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}
impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => b.to_sql(ty, out),
            Value::Int(i) if *ty == Type::INT2 => (*i as i16).to_sql(ty, out),
            Value::Int(i) if *ty == Type::INT4 => (*i as i32).to_sql(ty, out),
            Value::Int(i) => i.to_sql(ty, out),
            Value::Real(r) if *ty == Type::FLOAT4 => (*r as f32).to_sql(ty, out),
            Value::Real(r) => r.to_sql(ty, out),
            Value::Text(s) => s.to_sql(ty, out),
        }
    }

    fn accepts(_: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(42i32), Value::Int(42));
        assert_eq!(Value::from(42i64), Value::Int(42));
        assert_eq!(Value::from(2.5f64), Value::Real(2.5));
        assert_eq!(Value::from("alice"), Value::Text("alice".to_string()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(7i64)), Value::Int(7));
    }

    #[test]
    fn nullness() {
        assert!(Value::Null.is_null());
        assert!(!Value::Int(0).is_null());
    }
}
