//! Data access for comments, users and roles.
//!
//! Request handlers only talk to the [`Store`] trait. [`postgres::PgStore`] is the
//! production implementation; the test suite runs against an in-memory one.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use crate::model::comment::{Comment, NewComment};
use crate::model::enums::{CommentStatus, RoleType};
use crate::model::user::{User, UserRole};
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
#[error(transparent)]
pub enum StoreError {
    FailedConnection(#[from] diesel::r2d2::PoolError),
    FailedQuery(#[from] diesel::result::Error),
}

/// A page of a listing, already translated into row offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: i64,
    pub limit: i64,
}

pub trait Store: Send + Sync {
    /// Returns the total number of top-level comments on `book_id` with one of the given
    /// `statuses`, along with the slice of them selected by `window`, newest first.
    fn top_level_comments(
        &self,
        book_id: i64,
        statuses: &[CommentStatus],
        window: Window,
    ) -> StoreResult<(i64, Vec<Comment>)>;

    /// Returns all direct children of the given parents with one of the given `statuses`,
    /// oldest first.
    fn child_comments(&self, parent_ids: &[i64], statuses: &[CommentStatus]) -> StoreResult<Vec<Comment>>;

    /// Returns the ids of every direct child of `parent_id`, regardless of status.
    fn child_comment_ids(&self, parent_id: i64) -> StoreResult<Vec<i64>>;

    fn find_comment(&self, id: i64) -> StoreResult<Option<Comment>>;

    fn insert_comment(&self, new_comment: &NewComment) -> StoreResult<Comment>;

    /// Deletes the comments in `comment_ids` that belong to `uid`. Returns the number of deleted rows.
    fn delete_owned_comments(&self, comment_ids: &[i64], uid: i64) -> StoreResult<usize>;

    fn user(&self, uid: i64) -> StoreResult<Option<User>>;

    /// Returns the users with the given ids. Unknown ids are skipped.
    fn users(&self, uids: &[i64]) -> StoreResult<Vec<User>>;

    fn roles(&self, role_ids: &[&str], role_type: RoleType) -> StoreResult<Vec<UserRole>>;
}
