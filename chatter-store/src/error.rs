use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Fixture error: {0}")]
    Fixture(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn is_constraint(&self) -> bool {
        matches!(self, StoreError::Constraint(_))
    }
}

// Constraint failures get their own variant so callers can tell a rejected
// write from a broken connection.
impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                StoreError::Constraint(
                    message.clone().unwrap_or_else(|| failure.to_string()),
                )
            }
            _ => StoreError::Sqlite(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_constraint_failures_are_classified() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT NOT NULL);")
            .unwrap();

        let err: StoreError = conn
            .execute("INSERT INTO t (id, name) VALUES (1, NULL)", [])
            .unwrap_err()
            .into();
        assert!(err.is_constraint(), "NOT NULL should be a constraint error: {err}");

        conn.execute("INSERT INTO t (id, name) VALUES (1, 'a')", []).unwrap();
        let err: StoreError = conn
            .execute("INSERT INTO t (id, name) VALUES (1, 'b')", [])
            .unwrap_err()
            .into();
        assert!(err.is_constraint(), "duplicate key should be a constraint error: {err}");
    }

    #[test]
    fn test_other_failures_stay_sqlite_errors() {
        let conn = Connection::open_in_memory().unwrap();
        let err: StoreError = conn
            .execute("INSERT INTO missing (id) VALUES (1)", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, StoreError::Sqlite(_)));
    }
}
