pub trait ErrorKind {
    fn kind(&self) -> &'static str;
}

impl ErrorKind for diesel::result::DatabaseErrorKind {
    fn kind(&self) -> &'static str {
        match self {
            Self::CheckViolation => "CheckViolation",
            Self::ClosedConnection => "ClosedConnection",
            Self::ForeignKeyViolation => "ForeignKeyViolation",
            Self::NotNullViolation => "NotNullViolation",
            Self::ReadOnlyTransaction => "ReadOnlyTransaction",
            Self::SerializationFailure => "SerializationFailure",
            Self::UnableToSendCommand => "UnableToSendCommand",
            Self::UniqueViolation => "UniqueViolation",
            _ => "UnknownDatabaseError",
        }
    }
}

impl ErrorKind for diesel::result::Error {
    fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyInTransaction => "AlreadyInTransaction",
            Self::BrokenTransactionManager => "BrokenTransactionManager",
            Self::DatabaseError(err, _) => err.kind(),
            Self::DeserializationError(_) => "DeserializationError",
            Self::InvalidCString(_) => "InvalidCString",
            Self::NotFound => "NotFound",
            Self::NotInTransaction => "NotInTransaction",
            Self::QueryBuilderError(_) => "QueryBuilderError",
            Self::RollbackErrorOnCommit { rollback_error, .. } => rollback_error.kind(),
            Self::RollbackTransaction => "RollbackTransaction",
            Self::SerializationError(_) => "SerializationError",
            _ => "UnknownQueryError",
        }
    }
}

impl ErrorKind for crate::store::StoreError {
    fn kind(&self) -> &'static str {
        match self {
            Self::FailedConnection(_) => "FailedConnection",
            Self::FailedQuery(err) => err.kind(),
        }
    }
}

impl ErrorKind for crate::api::ApiError {
    fn kind(&self) -> &'static str {
        match self {
            Self::Banned(_) => "Banned",
            Self::FailedConnection(_) => "FailedConnection",
            Self::FailedQuery(err) => err.kind(),
            Self::HeaderDeserialization(_) => "HeaderDeserialization",
            Self::InvalidParent(_) => "InvalidParent",
            Self::JsonRejection(_) => "JsonRejection",
            Self::MissingContent => "MissingContent",
            Self::NotAnInteger(_) => "NotAnInteger",
            Self::NotLoggedIn => "NotLoggedIn",
            Self::QueryRejection(_) => "QueryRejection",
            Self::UnknownUser(_) => "UnknownUser",
        }
    }
}
