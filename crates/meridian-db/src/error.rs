//! # Storage Errors
//!
//! Every repository returns [`DbResult`]. Raw `sqlx::Error`s are sorted
//! into a handful of cases the API layer can map to a status code:
//!
//! ```text
//! sqlx::Error ──► DbError ──► ApiError (meridian-api) ──► JSON body
//! ```

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// No row for the id, or a conditional update matched nothing.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the write: promocode, email, username, SKU,
    /// category name or a `(country, region)` shipping pair.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A referenced row (category, product) does not exist.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// CHECK constraints and other statement-level failures.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Timed out waiting for a free connection.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Names the field and value the caller sent, which the raw SQLite
    /// message does not carry.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// `column` is `table.column`, as SQLite reports it.
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        matches!(self, DbError::UniqueViolation { field, .. } if field.contains(column))
    }
}

const UNIQUE_PREFIX: &str = "UNIQUE constraint failed: ";

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                if let Some(columns) = msg.strip_prefix(UNIQUE_PREFIX) {
                    DbError::duplicate(columns, "unknown")
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(DbError::not_found("Order", "o-1").to_string(), "Order not found: o-1");
        assert_eq!(
            DbError::duplicate("promocode", "SAVE20").to_string(),
            "Duplicate promocode: 'SAVE20' already exists"
        );
    }

    #[test]
    fn test_unique_violation_matching() {
        let err = DbError::duplicate("shipping_rates.country, shipping_rates.region", "unknown");
        assert!(err.is_unique_violation_on("shipping_rates.country"));
        assert!(!err.is_unique_violation_on("discounts.promocode"));
        assert!(!DbError::PoolExhausted.is_unique_violation_on("x"));
    }

    #[test]
    fn test_sqlx_mapping() {
        assert!(matches!(DbError::from(sqlx::Error::RowNotFound), DbError::NotFound { .. }));
        assert!(matches!(DbError::from(sqlx::Error::PoolTimedOut), DbError::PoolExhausted));
        assert!(matches!(DbError::from(sqlx::Error::PoolClosed), DbError::ConnectionFailed(_)));
    }

    #[tokio::test]
    async fn test_unique_index_names_the_columns() {
        let db = crate::Database::new(crate::DbConfig::in_memory()).await.unwrap();
        let insert = "INSERT INTO categories (id, name, created_at) VALUES (?, 'Lamps', '2026-01-01T00:00:00+00:00')";
        sqlx::query(insert).bind("c1").execute(db.pool()).await.unwrap();

        let err: DbError = sqlx::query(insert).bind("c2").execute(db.pool()).await.unwrap_err().into();
        assert!(err.is_unique_violation_on("categories.name"));
    }
}
