use crate::model::comment::Comment;
use crate::model::enums::CommentStatus;
use crate::model::user::User;
use crate::resource::user::{MicroUser, UserInfo, UserRef};
use crate::time::DateTime;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use utoipa::ToSchema;

/// A comment together with the users it involves. Nullable columns and a
/// missing author serialize as null.
#[derive(Debug, Serialize, ToSchema)]
pub struct CommentInfo {
    pub id: i64,
    /// 0 for top-level comments.
    pub parent_id: i64,
    pub books_id: Option<i64>,
    pub book_id: i64,
    pub star: Option<i16>,
    pub uid: i64,
    /// 0 when the comment is not a reply to a specific user.
    pub reply_uid: i64,
    pub content: String,
    #[schema(value_type = i16)]
    pub status: CommentStatus,
    #[schema(value_type = String, format = DateTime)]
    pub create_date: DateTime,
    /// Time since the comment was posted, e.g. "5 minutes ago".
    pub create_dt: String,
    /// Author of the comment.
    pub user: Option<UserRef>,
    /// User being replied to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_user: Option<MicroUser>,
    /// Replies to a top-level comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(no_recursion)]
    pub children: Option<Vec<CommentInfo>>,
}

impl CommentInfo {
    fn new(comment: Comment, now: DateTime) -> Self {
        Self {
            id: comment.id,
            parent_id: comment.parent_id,
            books_id: comment.books_id,
            book_id: comment.book_id,
            star: comment.star,
            uid: comment.uid,
            reply_uid: comment.reply_uid,
            content: comment.content,
            status: comment.status,
            create_date: comment.create_date,
            create_dt: comment.create_date.elapsed_since(now),
            user: None,
            reply_user: None,
            children: None,
        }
    }

    /// Assembles a page of top-level comments with their children attached.
    ///
    /// Top-level comments that are not publicly visible have their content replaced by a
    /// placeholder. Children are shown as they are. `users` must contain every user
    /// returned by [`referenced_users`]. Users that are missing from it are shown as null.
    pub fn new_thread_batch(
        top_level: Vec<Comment>,
        children: Vec<Comment>,
        users: &HashMap<i64, User>,
        now: DateTime,
    ) -> Vec<Self> {
        let micro_user = |uid: i64| users.get(&uid).map(MicroUser::new);

        let mut children_by_parent: HashMap<i64, Vec<Self>> = HashMap::new();
        for child in children {
            let reply_target = child.reply_target();
            let mut info = Self::new(child, now);
            info.user = micro_user(info.uid).map(UserRef::Micro);
            info.reply_user = reply_target.and_then(micro_user);
            children_by_parent.entry(info.parent_id).or_default().push(info);
        }

        top_level
            .into_iter()
            .map(|comment| {
                let mut info = Self::new(comment, now);
                if let Some(placeholder) = info.status.placeholder() {
                    info.content = placeholder.to_owned();
                }
                info.user = micro_user(info.uid).map(UserRef::Micro);
                info.children = Some(children_by_parent.remove(&info.id).unwrap_or_default());
                info
            })
            .collect()
    }

    /// Presents a freshly created comment. The author is shown in full.
    pub fn new_created(comment: Comment, author: Option<User>, reply_user: Option<&User>, now: DateTime) -> Self {
        let mut info = Self::new(comment, now);
        info.user = author.map(UserInfo::new).map(UserRef::Full);
        info.reply_user = reply_user.map(MicroUser::new);
        info.children = Some(Vec::new());
        info
    }
}

/// Returns the ids of every user shown alongside `top_level` comments and their `children`,
/// sorted and without duplicates.
pub fn referenced_users(top_level: &[Comment], children: &[Comment]) -> Vec<i64> {
    let authors = top_level.iter().chain(children).map(|comment| comment.uid);
    let reply_targets = children.iter().filter_map(Comment::reply_target);
    authors.chain(reply_targets).collect::<BTreeSet<_>>().into_iter().collect()
}
