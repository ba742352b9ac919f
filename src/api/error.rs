use crate::api::{Empty, Envelope};
use crate::error::ErrorKind;
use crate::store::StoreError;
use axum::response::{IntoResponse, Response};
use tracing::warn;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub enum ApiError {
    #[error(
        "Posting comments has been disabled for this account until {0} because of a violation of the \
        community guidelines. Please contact the site administrator if you have any questions."
    )]
    Banned(String),
    FailedConnection(#[from] diesel::r2d2::PoolError),
    FailedQuery(#[from] diesel::result::Error),
    HeaderDeserialization(#[from] axum::http::header::ToStrError),
    #[error("Comment {0} cannot be replied to on this book")]
    InvalidParent(i64),
    JsonRejection(#[from] axum::extract::rejection::JsonRejection),
    #[error("Please enter the comment content")]
    MissingContent,
    #[error("User id is not an integer: {0}")]
    NotAnInteger(#[from] std::num::ParseIntError),
    #[error("This action requires you to be logged in")]
    NotLoggedIn,
    QueryRejection(#[from] axum::extract::rejection::QueryRejection),
    #[error("User {0} does not exist")]
    UnknownUser(i64),
}

impl ApiError {
    fn category(&self) -> &'static str {
        match self {
            Self::Banned(_) => "Banned",
            Self::FailedConnection(_) => "Failed Connection",
            Self::FailedQuery(_) => "Failed Query",
            Self::HeaderDeserialization(_) => "Header Deserialization",
            Self::InvalidParent(_) => "Invalid Parent",
            Self::JsonRejection(_) => "JSON Rejection",
            Self::MissingContent => "Missing Content",
            Self::NotAnInteger(_) => "Parse Int Error",
            Self::NotLoggedIn => "Not Logged In",
            Self::QueryRejection(_) => "Query Rejection",
            Self::UnknownUser(_) => "Unknown User",
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::FailedConnection(err) => Self::FailedConnection(err),
            StoreError::FailedQuery(err) => Self::FailedQuery(err),
        }
    }
}

/// Errors are reported inside the response envelope, so the status code stays 200.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!("{} ({}): {self}", self.category(), self.kind());
        Envelope::<Empty>::error(self.to_string()).into_response()
    }
}
