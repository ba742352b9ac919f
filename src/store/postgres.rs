use crate::db::{ConnectionPool, PooledPgConnection};
use crate::model::comment::{Comment, NewComment};
use crate::model::enums::{CommentStatus, RoleType};
use crate::model::user::{User, UserRole};
use crate::schema::{book_comment, user, user_role};
use crate::store::{Store, StoreResult, Window};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_builder::{QueryFragment, QueryId};

/// [`Store`] backed by PostgreSQL. Every call checks a connection out of the pool
/// and runs on its own, outside of any shared transaction.
pub struct PgStore {
    pool: ConnectionPool,
}

impl PgStore {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    fn get_connection(&self) -> StoreResult<PooledPgConnection> {
        self.pool.get().map_err(Into::into)
    }

    fn run<T>(&self, query: impl FnOnce(&mut PgConnection) -> QueryResult<T>) -> StoreResult<T> {
        let mut conn = self.get_connection()?;
        query(&mut conn).map_err(Into::into)
    }
}

impl Store for PgStore {
    fn top_level_comments(
        &self,
        book_id: i64,
        statuses: &[CommentStatus],
        window: Window,
    ) -> StoreResult<(i64, Vec<Comment>)> {
        self.run(|conn| load_top_level(conn, book_id, statuses, window))
    }

    fn child_comments(&self, parent_ids: &[i64], statuses: &[CommentStatus]) -> StoreResult<Vec<Comment>> {
        self.run(|conn| load_children(conn, parent_ids, statuses))
    }

    fn child_comment_ids(&self, parent_id: i64) -> StoreResult<Vec<i64>> {
        self.run(|conn| load_child_ids(conn, parent_id))
    }

    fn find_comment(&self, id: i64) -> StoreResult<Option<Comment>> {
        self.run(|conn| load_comment(conn, id))
    }

    fn insert_comment(&self, new_comment: &NewComment) -> StoreResult<Comment> {
        self.run(|conn| insert_comment(conn, new_comment))
    }

    fn delete_owned_comments(&self, comment_ids: &[i64], uid: i64) -> StoreResult<usize> {
        if comment_ids.is_empty() {
            return Ok(0);
        }
        self.run(|conn| delete_owned(comment_ids, uid).execute(conn))
    }

    fn user(&self, uid: i64) -> StoreResult<Option<User>> {
        self.run(|conn| load_user(conn, uid))
    }

    fn users(&self, uids: &[i64]) -> StoreResult<Vec<User>> {
        if uids.is_empty() {
            return Ok(Vec::new());
        }
        self.run(|conn| load_users(conn, uids))
    }

    fn roles(&self, role_ids: &[&str], role_type: RoleType) -> StoreResult<Vec<UserRole>> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.run(|conn| roles_query(role_ids, role_type).select(UserRole::as_select()).load(conn))
    }
}

/// Listed top-level comments on a book, in no particular order.
fn top_level_filter(book_id: i64, statuses: &[CommentStatus]) -> book_comment::BoxedQuery<'_, Pg> {
    book_comment::table
        .filter(book_comment::book_id.eq(book_id))
        .filter(book_comment::parent_id.eq(0_i64))
        .filter(book_comment::status.eq_any(statuses))
        .into_boxed()
}

/// Newest first. Ties on `create_date` are broken by id so pages never overlap.
fn top_level_page(book_id: i64, statuses: &[CommentStatus], window: Window) -> book_comment::BoxedQuery<'_, Pg> {
    top_level_filter(book_id, statuses)
        .order_by((book_comment::create_date.desc(), book_comment::id.desc()))
        .offset(window.offset)
        .limit(window.limit)
}

fn children_query<'a>(parent_ids: &'a [i64], statuses: &'a [CommentStatus]) -> book_comment::BoxedQuery<'a, Pg> {
    book_comment::table
        .filter(book_comment::parent_id.eq_any(parent_ids))
        .filter(book_comment::status.eq_any(statuses))
        .order_by((book_comment::create_date.asc(), book_comment::id.asc()))
        .into_boxed()
}

fn delete_owned(comment_ids: &[i64], uid: i64) -> impl QueryFragment<Pg> + QueryId + RunQueryDsl<PgConnection> {
    diesel::delete(book_comment::table)
        .filter(book_comment::id.eq_any(comment_ids))
        .filter(book_comment::uid.eq(uid))
}

fn roles_query<'a>(role_ids: &[&'a str], role_type: RoleType) -> user_role::BoxedQuery<'a, Pg> {
    user_role::table
        .filter(user_role::user_role_id.eq_any(role_ids.iter().copied()))
        .filter(user_role::user_role_type.eq(role_type))
        .into_boxed()
}

fn load_top_level(
    conn: &mut PgConnection,
    book_id: i64,
    statuses: &[CommentStatus],
    window: Window,
) -> QueryResult<(i64, Vec<Comment>)> {
    let total = top_level_filter(book_id, statuses).count().get_result(conn)?;
    let comments = top_level_page(book_id, statuses, window)
        .select(Comment::as_select())
        .load(conn)?;
    Ok((total, comments))
}

fn load_children(conn: &mut PgConnection, parent_ids: &[i64], statuses: &[CommentStatus]) -> QueryResult<Vec<Comment>> {
    if parent_ids.is_empty() {
        return Ok(Vec::new());
    }
    children_query(parent_ids, statuses).select(Comment::as_select()).load(conn)
}

fn load_child_ids(conn: &mut PgConnection, parent_id: i64) -> QueryResult<Vec<i64>> {
    book_comment::table
        .select(book_comment::id)
        .filter(book_comment::parent_id.eq(parent_id))
        .load(conn)
}

fn load_comment(conn: &mut PgConnection, id: i64) -> QueryResult<Option<Comment>> {
    book_comment::table
        .find(id)
        .select(Comment::as_select())
        .first(conn)
        .optional()
}

fn insert_comment(conn: &mut PgConnection, new_comment: &NewComment) -> QueryResult<Comment> {
    diesel::insert_into(book_comment::table)
        .values(new_comment)
        .returning(Comment::as_returning())
        .get_result(conn)
}

fn load_user(conn: &mut PgConnection, uid: i64) -> QueryResult<Option<User>> {
    user::table
        .find(uid)
        .select(User::as_select())
        .first(conn)
        .optional()
}

fn load_users(conn: &mut PgConnection, uids: &[i64]) -> QueryResult<Vec<User>> {
    user::table
        .select(User::as_select())
        .filter(user::uid.eq_any(uids))
        .load(conn)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::*;
    use crate::time::DateTime;
    use diesel::debug_query;
    use serial_test::serial;
    use time::Duration;

    const DB_BOOK_ID: i64 = 9_000_042;
    const DB_UID: i64 = 9_000_001;
    const DB_OTHER_UID: i64 = 9_000_002;

    fn sql(query: &impl QueryFragment<Pg>) -> String {
        debug_query::<Pg, _>(query).to_string()
    }

    #[test]
    fn top_level_sql() {
        let window = Window { offset: 20, limit: 10 };
        let page = sql(&top_level_page(TEST_BOOK_ID, &CommentStatus::LISTED, window));

        assert!(page.contains(r#""book_comment"."book_id" = $1"#));
        assert!(page.contains(r#""book_comment"."parent_id" = $2"#));
        assert!(page.contains(r#""book_comment"."status""#));
        assert!(page.contains(r#"ORDER BY "book_comment"."create_date" DESC, "book_comment"."id" DESC"#));
        assert!(page.contains(" LIMIT $"));
        assert!(page.contains(" OFFSET $"));
        assert!(page.contains(r#""book_comment"."star""#));
        assert!(page.contains("Approved"));
        assert!(!page.contains("Deleted"));

        let count = sql(&top_level_filter(TEST_BOOK_ID, &CommentStatus::LISTED).count());
        assert!(count.starts_with("SELECT COUNT(*) FROM \"book_comment\""));
        assert!(!count.contains("LIMIT"));
        assert!(!count.contains("ORDER BY"));
    }

    #[test]
    fn children_sql() {
        let children = sql(&children_query(&[1, 2, 3], &CommentStatus::LISTED));
        assert!(children.contains(r#""book_comment"."parent_id""#));
        assert!(children.contains(r#""book_comment"."status""#));
        assert!(children.contains(r#"ORDER BY "book_comment"."create_date" ASC, "book_comment"."id" ASC"#));
        assert!(!children.contains("LIMIT"));
    }

    #[test]
    fn delete_sql() {
        let delete = sql(&delete_owned(&[4, 5], 7));
        assert!(delete.starts_with(r#"DELETE FROM "book_comment""#));
        assert!(delete.contains(r#""book_comment"."id""#));
        assert!(delete.contains(r#""book_comment"."uid" = $"#));
    }

    #[test]
    fn roles_sql() {
        let roles = sql(&roles_query(&["member", "trusted"], RoleType::Default));
        assert!(roles.contains(r#""user_role"."user_role_id""#));
        assert!(roles.contains(r#""user_role"."user_role_type" = $"#));
        assert!(roles.contains("member"));
    }

    fn insert_db_user(conn: &mut PgConnection, uid: i64, user_role_ids: &str) -> QueryResult<User> {
        diesel::insert_into(user::table)
            .values((
                user::uid.eq(uid),
                user::username.eq(format!("db_reader_{uid}")),
                user::nickname.eq(format!("DB Reader {uid}")),
                user::user_role_ids.eq(user_role_ids),
            ))
            .returning(User::as_returning())
            .get_result(conn)
    }

    fn insert_db_comment(
        conn: &mut PgConnection,
        parent_id: i64,
        uid: i64,
        status: CommentStatus,
        age: Duration,
    ) -> QueryResult<Comment> {
        let content = format!("Comment by reader {uid}");
        let new_comment = NewComment {
            parent_id,
            books_id: None,
            book_id: DB_BOOK_ID,
            star: Some(4),
            uid,
            reply_uid: 0,
            content: &content,
            status,
        };
        let comment = insert_comment(conn, &new_comment)?;

        // NOW() is fixed for the whole transaction, so creation dates are set explicitly
        diesel::update(book_comment::table.find(comment.id))
            .set(book_comment::create_date.eq(DateTime::now() - age))
            .returning(Comment::as_returning())
            .get_result(conn)
    }

    #[test]
    #[serial]
    #[ignore = "requires a PostgreSQL database configured through POSTGRES_* variables"]
    fn top_level_paging() {
        test_transaction(|conn| {
            let oldest = insert_db_comment(conn, 0, DB_UID, CommentStatus::Approved, Duration::hours(3))?;
            let middle = insert_db_comment(conn, 0, DB_UID, CommentStatus::PendingReview, Duration::hours(2))?;
            let newest = insert_db_comment(conn, 0, DB_UID, CommentStatus::Rejected, Duration::hours(1))?;
            insert_db_comment(conn, 0, DB_UID, CommentStatus::Deleted, Duration::minutes(1))?;
            insert_db_comment(conn, newest.id, DB_UID, CommentStatus::Approved, Duration::minutes(1))?;

            let statuses = CommentStatus::LISTED;
            let (total, first) = load_top_level(conn, DB_BOOK_ID, &statuses, Window { offset: 0, limit: 2 })?;
            assert_eq!(total, 3);
            assert_eq!(first.iter().map(|comment| comment.id).collect::<Vec<_>>(), [newest.id, middle.id]);
            assert_eq!(first[0].star, Some(4));

            let (_, last) = load_top_level(conn, DB_BOOK_ID, &statuses, Window { offset: 2, limit: 2 })?;
            assert_eq!(last.len(), 1);
            assert_eq!(last[0].id, oldest.id);
            Ok(())
        });
    }

    #[test]
    #[serial]
    #[ignore = "requires a PostgreSQL database configured through POSTGRES_* variables"]
    fn children_and_lookup() {
        test_transaction(|conn| {
            let parent = insert_db_comment(conn, 0, DB_UID, CommentStatus::Approved, Duration::hours(3))?;
            let late = insert_db_comment(conn, parent.id, DB_UID, CommentStatus::Approved, Duration::minutes(5))?;
            let early = insert_db_comment(conn, parent.id, DB_UID, CommentStatus::PendingReview, Duration::hours(1))?;
            let deleted = insert_db_comment(conn, parent.id, DB_UID, CommentStatus::Deleted, Duration::hours(2))?;

            let children = load_children(conn, &[parent.id], &CommentStatus::LISTED)?;
            assert_eq!(children.iter().map(|comment| comment.id).collect::<Vec<_>>(), [early.id, late.id]);

            let mut child_ids = load_child_ids(conn, parent.id)?;
            child_ids.sort_unstable();
            assert_eq!(child_ids, [late.id, early.id, deleted.id]);

            assert_eq!(load_comment(conn, late.id)?.map(|comment| comment.parent_id), Some(parent.id));
            assert!(load_comment(conn, -1)?.is_none());
            Ok(())
        });
    }

    #[test]
    #[serial]
    #[ignore = "requires a PostgreSQL database configured through POSTGRES_* variables"]
    fn ownership_scoped_delete() {
        test_transaction(|conn| {
            let parent = insert_db_comment(conn, 0, DB_UID, CommentStatus::Approved, Duration::hours(1))?;
            let own = insert_db_comment(conn, parent.id, DB_UID, CommentStatus::Approved, Duration::minutes(30))?;
            let other = insert_db_comment(conn, parent.id, DB_OTHER_UID, CommentStatus::Approved, Duration::minutes(20))?;

            assert_eq!(delete_owned(&[parent.id], DB_OTHER_UID).execute(conn)?, 0);
            assert_eq!(delete_owned(&[own.id, other.id], DB_UID).execute(conn)?, 1);
            assert!(load_comment(conn, own.id)?.is_none());
            assert!(load_comment(conn, other.id)?.is_some());
            Ok(())
        });
    }

    #[test]
    #[serial]
    #[ignore = "requires a PostgreSQL database configured through POSTGRES_* variables"]
    fn users_and_roles() {
        test_transaction(|conn| {
            insert_db_user(conn, DB_UID, "db-member")?;
            insert_db_user(conn, DB_OTHER_UID, "")?;
            diesel::insert_into(user_role::table)
                .values(&vec![
                    (
                        user_role::user_role_id.eq("db-member"),
                        user_role::user_role_name.eq("Member"),
                        user_role::user_role_type.eq(RoleType::Default),
                        user_role::user_authority_ids.eq("10,120"),
                    ),
                    (
                        user_role::user_role_id.eq("db-curator"),
                        user_role::user_role_name.eq("Curator"),
                        user_role::user_role_type.eq(RoleType::Custom),
                        user_role::user_authority_ids.eq(TEST_NO_REVIEW_AUTHORITY),
                    ),
                ])
                .execute(conn)?;

            let user = load_user(conn, DB_UID)?.unwrap();
            assert_eq!(user.role_ids().collect::<Vec<_>>(), ["db-member"]);
            assert!(user.ban_dt.is_none());
            assert_eq!(load_users(conn, &[DB_UID, DB_OTHER_UID, -1])?.len(), 2);

            let roles = roles_query(&["db-member", "db-curator"], RoleType::Default)
                .select(UserRole::as_select())
                .load(conn)?;
            assert_eq!(roles.len(), 1);
            assert_eq!(&*roles[0].user_role_id, "db-member");
            Ok(())
        });
    }
}
