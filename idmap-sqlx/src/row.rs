//! Row types and conversion utilities.

use serde_json::Value as JsonValue;
use sqlx::Row;

use crate::config::Driver;

/// A row from any of the supported databases.
pub enum DbRow {
    /// PostgreSQL row
    #[cfg(feature = "postgres")]
    Postgres(sqlx::postgres::PgRow),
    /// MySQL row
    #[cfg(feature = "mysql")]
    MySql(sqlx::mysql::MySqlRow),
    /// SQLite row
    #[cfg(feature = "sqlite")]
    Sqlite(sqlx::sqlite::SqliteRow),
}

impl DbRow {
    /// Get the database driver.
    pub fn driver(&self) -> Driver {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(_) => Driver::Postgres,
            #[cfg(feature = "mysql")]
            Self::MySql(_) => Driver::MySql,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => Driver::Sqlite,
        }
    }

    /// Get a column value by index.
    pub fn get<T: ColumnDecode>(&self, index: usize) -> Result<T, sqlx::Error> {
        T::decode_at(self, index)
    }

    /// Get a column value by name.
    pub fn get_by_name<T: ColumnDecode>(&self, name: &str) -> Result<T, sqlx::Error> {
        T::decode_named(self, name)
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(row) => row.len(),
            #[cfg(feature = "mysql")]
            Self::MySql(row) => row.len(),
            #[cfg(feature = "sqlite")]
            Self::Sqlite(row) => row.len(),
        }
    }

    /// Get the column names in select order.
    pub fn column_names(&self) -> Vec<&str> {
        use sqlx::Column;

        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(row) => row.columns().iter().map(|c| c.name()).collect(),
            #[cfg(feature = "mysql")]
            Self::MySql(row) => row.columns().iter().map(|c| c.name()).collect(),
            #[cfg(feature = "sqlite")]
            Self::Sqlite(row) => row.columns().iter().map(|c| c.name()).collect(),
        }
    }

    /// Check if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert the row to a JSON object keyed by column name.
    pub fn to_json(&self) -> JsonValue {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(row) => row_to_json(row),
            #[cfg(feature = "mysql")]
            Self::MySql(row) => row_to_json(row),
            #[cfg(feature = "sqlite")]
            Self::Sqlite(row) => row_to_json(row),
        }
    }
}

impl std::fmt::Debug for DbRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbRow")
            .field("driver", &self.driver())
            .field("columns", &self.column_names())
            .finish()
    }
}

/// Decode a column from a [`DbRow`].
pub trait ColumnDecode: Sized {
    /// Decode the column at `index`.
    fn decode_at(row: &DbRow, index: usize) -> Result<Self, sqlx::Error>;
    /// Decode the column called `name`.
    fn decode_named(row: &DbRow, name: &str) -> Result<Self, sqlx::Error>;
}

macro_rules! impl_decode {
    ($ty:ty) => {
        impl ColumnDecode for $ty {
            fn decode_at(row: &DbRow, index: usize) -> Result<Self, sqlx::Error> {
                match row {
                    #[cfg(feature = "postgres")]
                    DbRow::Postgres(r) => r.try_get(index),
                    #[cfg(feature = "mysql")]
                    DbRow::MySql(r) => r.try_get(index),
                    #[cfg(feature = "sqlite")]
                    DbRow::Sqlite(r) => r.try_get(index),
                }
            }

            fn decode_named(row: &DbRow, name: &str) -> Result<Self, sqlx::Error> {
                match row {
                    #[cfg(feature = "postgres")]
                    DbRow::Postgres(r) => r.try_get(name),
                    #[cfg(feature = "mysql")]
                    DbRow::MySql(r) => r.try_get(name),
                    #[cfg(feature = "sqlite")]
                    DbRow::Sqlite(r) => r.try_get(name),
                }
            }
        }
    };
}

impl_decode!(i32);
impl_decode!(i64);
impl_decode!(f64);
impl_decode!(bool);
impl_decode!(String);
impl_decode!(Option<String>);
impl_decode!(Option<i64>);

// Each column is tried against the common scalar types in turn; anything else
// (binary, temporal, driver-specific) is rendered as null.
fn row_to_json<R>(row: &R) -> JsonValue
where
    R: Row,
    usize: sqlx::ColumnIndex<R>,
    String: sqlx::Type<R::Database> + for<'r> sqlx::Decode<'r, R::Database>,
    i64: sqlx::Type<R::Database> + for<'r> sqlx::Decode<'r, R::Database>,
    i32: sqlx::Type<R::Database> + for<'r> sqlx::Decode<'r, R::Database>,
    f64: sqlx::Type<R::Database> + for<'r> sqlx::Decode<'r, R::Database>,
    bool: sqlx::Type<R::Database> + for<'r> sqlx::Decode<'r, R::Database>,
{
    use sqlx::Column;

    let mut obj = serde_json::Map::new();
    for (i, col) in row.columns().iter().enumerate() {
        let name = col.name().to_string();
        let value = if let Ok(v) = row.try_get::<Option<String>, _>(i) {
            v.map_or(JsonValue::Null, JsonValue::String)
        } else if let Ok(v) = row.try_get::<Option<i64>, _>(i) {
            v.map_or(JsonValue::Null, |n| JsonValue::Number(n.into()))
        } else if let Ok(v) = row.try_get::<Option<i32>, _>(i) {
            v.map_or(JsonValue::Null, |n| JsonValue::Number(n.into()))
        } else if let Ok(v) = row.try_get::<Option<f64>, _>(i) {
            v.and_then(serde_json::Number::from_f64)
                .map_or(JsonValue::Null, JsonValue::Number)
        } else if let Ok(v) = row.try_get::<Option<bool>, _>(i) {
            v.map_or(JsonValue::Null, JsonValue::Bool)
        } else {
            JsonValue::Null
        };
        obj.insert(name, value);
    }
    JsonValue::Object(obj)
}
