use crate::model::comment::{Comment, NewComment};
use crate::model::enums::{CommentStatus, RoleType};
use crate::model::user::{User, UserRole};
use crate::store::{Store, StoreError, StoreResult, Window};
use crate::time::DateTime;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// [`Store`] that keeps its rows in memory. Rows can be seeded directly, and
/// every operation can be made to fail to exercise error paths.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

#[derive(Default)]
struct Tables {
    comments: Vec<Comment>,
    users: Vec<User>,
    roles: Vec<UserRole>,
    last_comment_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail as if the database was unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn add_user(&self, user: User) {
        self.tables().users.push(user);
    }

    pub fn add_role(&self, role: UserRole) {
        self.tables().roles.push(role);
    }

    /// Inserts `comment` as is, keeping its id and creation date.
    pub fn add_comment(&self, comment: Comment) {
        let mut tables = self.tables();
        tables.last_comment_id = tables.last_comment_id.max(comment.id);
        tables.comments.push(comment);
    }

    pub fn comment(&self, id: i64) -> Option<Comment> {
        self.tables().comments.iter().find(|comment| comment.id == id).cloned()
    }

    pub fn comment_count(&self) -> usize {
        self.tables().comments.len()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|err| panic!("{err}"))
    }

    fn check_available(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        match self.unavailable.load(Ordering::SeqCst) {
            true => Err(StoreError::FailedQuery(diesel::result::Error::BrokenTransactionManager)),
            false => Ok(self.tables()),
        }
    }
}

impl Store for MemoryStore {
    fn top_level_comments(
        &self,
        book_id: i64,
        statuses: &[CommentStatus],
        window: Window,
    ) -> StoreResult<(i64, Vec<Comment>)> {
        let tables = self.check_available()?;
        let mut comments: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|comment| comment.book_id == book_id && comment.parent_id == 0)
            .filter(|comment| statuses.contains(&comment.status))
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.create_date.cmp(&a.create_date).then(b.id.cmp(&a.id)));

        let total = comments.len() as i64;
        let page = comments
            .into_iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .collect();
        Ok((total, page))
    }

    fn child_comments(&self, parent_ids: &[i64], statuses: &[CommentStatus]) -> StoreResult<Vec<Comment>> {
        let tables = self.check_available()?;
        let mut children: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|comment| parent_ids.contains(&comment.parent_id))
            .filter(|comment| statuses.contains(&comment.status))
            .cloned()
            .collect();
        children.sort_by(|a, b| a.create_date.cmp(&b.create_date).then(a.id.cmp(&b.id)));
        Ok(children)
    }

    fn child_comment_ids(&self, parent_id: i64) -> StoreResult<Vec<i64>> {
        let tables = self.check_available()?;
        Ok(tables
            .comments
            .iter()
            .filter(|comment| comment.parent_id == parent_id)
            .map(|comment| comment.id)
            .collect())
    }

    fn find_comment(&self, id: i64) -> StoreResult<Option<Comment>> {
        let tables = self.check_available()?;
        Ok(tables.comments.iter().find(|comment| comment.id == id).cloned())
    }

    fn insert_comment(&self, new_comment: &NewComment) -> StoreResult<Comment> {
        let mut tables = self.check_available()?;
        tables.last_comment_id += 1;
        let comment = Comment {
            id: tables.last_comment_id,
            parent_id: new_comment.parent_id,
            books_id: new_comment.books_id,
            book_id: new_comment.book_id,
            star: new_comment.star,
            uid: new_comment.uid,
            reply_uid: new_comment.reply_uid,
            content: new_comment.content.to_owned(),
            status: new_comment.status,
            create_date: DateTime::now(),
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    fn delete_owned_comments(&self, comment_ids: &[i64], uid: i64) -> StoreResult<usize> {
        let mut tables = self.check_available()?;
        let count_before = tables.comments.len();
        tables
            .comments
            .retain(|comment| !(comment_ids.contains(&comment.id) && comment.uid == uid));
        Ok(count_before - tables.comments.len())
    }

    fn user(&self, uid: i64) -> StoreResult<Option<User>> {
        let tables = self.check_available()?;
        Ok(tables.users.iter().find(|user| user.uid == uid).cloned())
    }

    fn users(&self, uids: &[i64]) -> StoreResult<Vec<User>> {
        let tables = self.check_available()?;
        Ok(tables
            .users
            .iter()
            .filter(|user| uids.contains(&user.uid))
            .cloned()
            .collect())
    }

    fn roles(&self, role_ids: &[&str], role_type: RoleType) -> StoreResult<Vec<UserRole>> {
        let tables = self.check_available()?;
        Ok(tables
            .roles
            .iter()
            .filter(|role| role.user_role_type == role_type && role_ids.contains(&&*role.user_role_id))
            .cloned()
            .collect())
    }
}
