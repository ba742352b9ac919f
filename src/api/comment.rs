use crate::api::doc::COMMENT_TAG;
use crate::api::extract::{Json, Query};
use crate::api::middleware::Client;
use crate::api::{ApiError, ApiResult, Empty, Envelope};
use crate::app::AppState;
use crate::config::CommentConfig;
use crate::model::comment::NewComment;
use crate::model::enums::{CommentStatus, RoleType};
use crate::model::user::User;
use crate::moderation;
use crate::resource::comment::{self, CommentInfo};
use crate::store::{Store, Window};
use crate::string::escape_markup;
use crate::time::{DateTime, Timer};
use axum::extract::{Extension, State};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list))
        .routes(routes!(create))
        .routes(routes!(delete))
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct ListParams {
    /// Book whose comments are listed.
    book_id: i64,
    /// 1-based page number. Defaults to `comment.default_page` from server's configuration.
    page: Option<i64>,
    /// Number of top-level comments per page. Defaults to `comment.default_page_size`.
    #[serde(rename = "pageSize")]
    page_size: Option<i64>,
}

/// A page of top-level comments, each with all of its replies.
#[derive(Debug, Serialize, ToSchema)]
struct CommentPage {
    page: i64,
    #[serde(rename = "pageSize")]
    page_size: i64,
    /// Total number of listed top-level comments on the book.
    count: i64,
    comment_list: Vec<CommentInfo>,
}

/// Lists the comments on a book, newest first.
///
/// Replies are not paginated: every listed reply of a top-level comment is included,
/// oldest first. Top-level comments that are pending review or were rejected have their
/// content replaced by a notice.
#[utoipa::path(
    get,
    path = "/book-comment/list",
    tag = COMMENT_TAG,
    params(ListParams),
    responses(
        (status = 200, description = "A page of comments, or an error envelope", body = Envelope<CommentPage>),
    ),
)]
async fn list(State(state): State<AppState>, Query(params): Query<ListParams>) -> ApiResult<Envelope<CommentPage>> {
    let _timer = Timer::new("list_comments");
    let page = list_comments(state.store.as_ref(), &state.config.comment, &params, DateTime::now())?;
    Ok(Envelope::success("Comments retrieved", page))
}

/// Request body for creating a comment.
#[derive(Deserialize, ToSchema)]
struct CreateBody {
    /// Comment text. Markup is escaped before the comment is stored.
    content: Option<String>,
    books_id: Option<i64>,
    book_id: i64,
    /// Rating given alongside the comment.
    star: Option<i16>,
    /// Comment being replied to. 0 or absent for a top-level comment.
    #[serde(default)]
    parent_id: i64,
    /// User being replied to. 0 or absent when not replying to anyone in particular.
    #[serde(default)]
    reply_uid: i64,
}

/// Posts a comment as the requesting user.
///
/// Comments are held for moderation unless one of the author's roles grants the
/// `comment.no_review_authority_id` authority from server's configuration.
#[utoipa::path(
    post,
    path = "/book-comment/create",
    tag = COMMENT_TAG,
    request_body = CreateBody,
    responses(
        (status = 200, description = "The new comment, or an error envelope", body = Envelope<CommentInfo>),
    ),
)]
async fn create(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    Json(body): Json<CreateBody>,
) -> ApiResult<Envelope<CommentInfo>> {
    let author = client.user()?;
    let comment = create_comment(state.store.as_ref(), &state.config.comment, author, body, DateTime::now())?;
    let message = match comment.status.is_published() {
        true => "Comment published",
        false => "Comment published, it will be visible once it has been reviewed",
    };
    Ok(Envelope::success(message, comment))
}

/// Request body for deleting a comment.
#[derive(Deserialize, ToSchema)]
struct DeleteBody {
    comment_id: i64,
}

/// Deletes a comment along with the replies to it written by the same user.
///
/// Only the requesting user's own comments are deleted. Replies by other users are
/// left in place. Succeeds even when nothing was deleted.
#[utoipa::path(
    post,
    path = "/book-comment/delete",
    tag = COMMENT_TAG,
    request_body = DeleteBody,
    responses(
        (status = 200, description = "Confirmation, or an error envelope", body = Envelope<Empty>),
    ),
)]
async fn delete(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    Json(body): Json<DeleteBody>,
) -> ApiResult<Envelope<Empty>> {
    let requester = client.user()?;
    delete_comment(state.store.as_ref(), requester, body.comment_id)?;
    Ok(Envelope::message("Comment deleted"))
}

fn list_comments(
    store: &dyn Store,
    config: &CommentConfig,
    params: &ListParams,
    now: DateTime,
) -> ApiResult<CommentPage> {
    let page = params.page.unwrap_or(config.default_page).max(1);
    let page_size = params.page_size.unwrap_or(config.default_page_size).max(1);
    let window = Window {
        offset: (page - 1).saturating_mul(page_size),
        limit: page_size,
    };

    let (count, top_level) = store.top_level_comments(params.book_id, &CommentStatus::LISTED, window)?;
    let parent_ids: Vec<i64> = top_level.iter().map(|comment| comment.id).collect();
    let children = store.child_comments(&parent_ids, &CommentStatus::LISTED)?;

    let user_ids = comment::referenced_users(&top_level, &children);
    let users: HashMap<i64, User> = store
        .users(&user_ids)?
        .into_iter()
        .map(|user| (user.uid, user))
        .collect();

    Ok(CommentPage {
        page,
        page_size,
        count,
        comment_list: CommentInfo::new_thread_batch(top_level, children, &users, now),
    })
}

fn create_comment(
    store: &dyn Store,
    config: &CommentConfig,
    author: &User,
    body: CreateBody,
    now: DateTime,
) -> ApiResult<CommentInfo> {
    let content = escape_markup(body.content.as_deref().unwrap_or_default().trim());
    if content.is_empty() {
        return Err(ApiError::MissingContent);
    }
    if let Some(ban_end) = author.banned_until(now) {
        return Err(ApiError::Banned(ban_end.display()));
    }
    if body.parent_id != 0 {
        // Threads are two levels deep, so replies attach to top-level comments on the same book
        let parent = store.find_comment(body.parent_id)?;
        if !parent.is_some_and(|parent| parent.parent_id == 0 && parent.book_id == body.book_id) {
            return Err(ApiError::InvalidParent(body.parent_id));
        }
    }

    let role_ids: Vec<&str> = author.role_ids().collect();
    let roles = store.roles(&role_ids, RoleType::Default)?;
    let status = moderation::initial_status(&roles, &config.no_review_authority_id);

    let new_comment = NewComment {
        parent_id: body.parent_id,
        books_id: body.books_id,
        book_id: body.book_id,
        star: body.star,
        uid: author.uid,
        reply_uid: body.reply_uid,
        content: &content,
        status,
    };
    let comment = store.insert_comment(&new_comment)?;
    info!("User {} posted comment {} on book {}", author.uid, comment.id, comment.book_id);

    let reply_user = comment.reply_target().map(|uid| store.user(uid)).transpose()?.flatten();
    Ok(CommentInfo::new_created(comment, Some(author.clone()), reply_user.as_ref(), now))
}

fn delete_comment(store: &dyn Store, requester: &User, comment_id: i64) -> ApiResult<()> {
    let child_ids = store.child_comment_ids(comment_id)?;
    let deleted_children = store.delete_owned_comments(&child_ids, requester.uid)?;
    let deleted = store.delete_owned_comments(&[comment_id], requester.uid)?;
    debug!(
        "User {} deleted {deleted} comment(s) with id {comment_id} and {deleted_children} of its replies",
        requester.uid
    );
    Ok(())
}
