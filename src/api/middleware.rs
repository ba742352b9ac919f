use crate::api::{ApiError, ApiResult};
use crate::app::AppState;
use crate::model::user::User;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

/// Header carrying the id of the user an upstream gateway has authenticated.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The user making a request, if any.
#[derive(Debug, Clone)]
pub struct Client {
    user: Option<User>,
}

impl Client {
    pub fn new(user: Option<User>) -> Self {
        Self { user }
    }

    /// Returns the requesting user, or an error for anonymous requests.
    pub fn user(&self) -> ApiResult<&User> {
        self.user.as_ref().ok_or(ApiError::NotLoggedIn)
    }
}

/// Resolves the requesting user from [`USER_ID_HEADER`]. Requests without the header are anonymous.
pub async fn identify(State(state): State<AppState>, mut request: Request, next: Next) -> ApiResult<Response> {
    let user = match request.headers().get(USER_ID_HEADER) {
        Some(value) => {
            let uid: i64 = value.to_str()?.trim().parse()?;
            let user = state.store.user(uid)?.ok_or(ApiError::UnknownUser(uid))?;
            Some(user)
        }
        None => None,
    };

    request.extensions_mut().insert(Client::new(user));
    Ok(next.run(request).await)
}
