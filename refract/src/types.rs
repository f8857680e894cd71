use sea_orm::sea_query;

pub type QueryError = sea_orm::DbErr;
// Crate-wide result alias for ergonomics (non-conflicting)
pub type RefractResult<T> = std::result::Result<T, sea_orm::DbErr>;

/// Typed refract errors that can be converted into `sea_orm::DbErr`.
///
/// All of these are programming/configuration errors: they surface
/// synchronously and are never retried.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RefractError {
    #[error("entity '{entity}' is not registered in the metamodel")]
    UnknownEntity { entity: String },

    #[error("unknown attribute '{attribute}' on entity '{entity}'")]
    UnknownAttribute { entity: String, attribute: String },

    #[error("invalid property path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("cannot traverse '{path}': {reason}")]
    UnsupportedTraversal { path: String, reason: String },

    #[error("invalid projection '{shape}': {message}")]
    InvalidProjection { shape: String, message: String },

    #[error("field '{field}' of shape '{shape}' was not part of the selection")]
    FieldNotSelected { shape: String, field: String },

    #[error("query for '{entity}' returned more than one row")]
    NonUniqueResult { entity: String },
}

impl From<RefractError> for sea_orm::DbErr {
    fn from(err: RefractError) -> Self {
        sea_orm::DbErr::Custom(err.to_string())
    }
}

/// Pessimistic lock applied uniformly to the data query of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockBehavior {
    Shared,
    Exclusive,
}

impl LockBehavior {
    pub(crate) fn lock_type(self) -> sea_query::LockType {
        match self {
            LockBehavior::Shared => sea_query::LockType::Share,
            LockBehavior::Exclusive => sea_query::LockType::Update,
        }
    }
}

/// Caller-scoped execution metadata applied to every query an operation
/// builds: lock mode plus the association paths an eager-fetch configuration
/// already covers (those joins are seeded into the join graph and reused
/// instead of being added again).
#[derive(Debug, Clone, Default)]
pub struct ExecutionMetadata {
    pub lock: Option<LockBehavior>,
    pub fetch_paths: Vec<String>,
}

impl ExecutionMetadata {
    pub fn with_lock(mut self, lock: LockBehavior) -> Self {
        self.lock = Some(lock);
        self
    }

    pub fn with_fetch_path(mut self, path: impl Into<String>) -> Self {
        self.fetch_paths.push(path.into());
        self
    }
}

/// Named fetch-graph hint. Accepted by `find_all_with_graph` and currently
/// treated as equivalent to the no-hint form.
#[derive(Debug, Clone, Default)]
pub struct EntityGraph {
    pub name: String,
    pub attribute_paths: Vec<String>,
}

impl EntityGraph {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute_paths: Vec::new(),
        }
    }
}
