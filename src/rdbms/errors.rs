use thiserror::Error;

/// Failure kinds surfaced by the statement executor.
///
/// Callers switch on the variant (or on [`RdbmsError::code`]); the wrapped
/// driver error is kept only as a `source` for logs and never needs to be
/// inspected.
#[derive(Debug, Error)]
pub enum RdbmsError {
    #[error("error when trying to prepare statement")]
    PrepareStatement(#[source] sqlx::Error),

    #[error("error when trying to create entry")]
    Create(#[source] sqlx::Error),

    #[error("entry exists")]
    Duplicate(#[source] sqlx::Error),

    #[error("error when trying to read entry")]
    Read(#[source] sqlx::Error),

    #[error("there is no entry with provided arguments")]
    ReadNotFound,

    #[error("error when trying to update entry")]
    Update(#[source] sqlx::Error),

    #[error("error when trying to delete entry")]
    Delete(#[source] sqlx::Error),

    #[error("error doing migrations")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

impl RdbmsError {
    /// Stable string key of the failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            RdbmsError::PrepareStatement(_) => "prepare_statement",
            RdbmsError::Create(_) => "create",
            RdbmsError::Duplicate(_) => "duplicate",
            RdbmsError::Read(_) => "read",
            RdbmsError::ReadNotFound => "read_not_found",
            RdbmsError::Update(_) => "update",
            RdbmsError::Delete(_) => "delete",
            RdbmsError::Migration(_) => "migration",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RdbmsError::ReadNotFound)
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, RdbmsError::Duplicate(_))
    }
}

/// Splits a failed insert into a uniqueness violation or a generic create failure.
pub(crate) fn classify_create(err: sqlx::Error) -> RdbmsError {
    let duplicate = err
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);
    if duplicate {
        RdbmsError::Duplicate(err)
    } else {
        RdbmsError::Create(err)
    }
}
