use crate::model::enums::CommentStatus;
use crate::schema::book_comment;
use crate::time::DateTime;
use diesel::pg::Pg;
use diesel::prelude::*;

#[derive(Debug, Insertable)]
#[diesel(table_name = book_comment)]
#[diesel(check_for_backend(Pg))]
pub struct NewComment<'a> {
    pub parent_id: i64,
    pub books_id: Option<i64>,
    pub book_id: i64,
    #[diesel(column_name = star_rating)]
    pub star: Option<i16>,
    pub uid: i64,
    pub reply_uid: i64,
    pub content: &'a str,
    pub status: CommentStatus,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = book_comment)]
#[diesel(check_for_backend(Pg))]
pub struct Comment {
    pub id: i64,
    pub parent_id: i64,
    pub books_id: Option<i64>,
    pub book_id: i64,
    #[diesel(column_name = star_rating)]
    pub star: Option<i16>,
    pub uid: i64,
    pub reply_uid: i64,
    pub content: String,
    pub status: CommentStatus,
    pub create_date: DateTime,
}

impl Comment {
    /// Returns the id of the user this comment replies to, unless it is
    /// not a reply or the author is replying to themselves.
    pub fn reply_target(&self) -> Option<i64> {
        (self.reply_uid != 0 && self.reply_uid != self.uid).then_some(self.reply_uid)
    }
}
