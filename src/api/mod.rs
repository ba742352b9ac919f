mod comment;
pub mod doc;
pub mod error;
pub mod extract;
pub mod middleware;

use crate::api::doc::ApiDoc;
use crate::app::AppState;
use axum::Router;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_with::skip_serializing_none;
use tower_http::trace::TraceLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

pub use error::{ApiError, ApiResult};

/// Builds the full application router, including the Swagger UI.
pub fn routes(state: AppState) -> Router {
    let (router, openapi) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(comment::routes())
        .split_for_parts();

    router
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), middleware::identify))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseState {
    Success,
    Error,
}

/// Body of every response.
#[skip_serializing_none]
#[derive(Serialize, ToSchema)]
pub struct Envelope<T> {
    state: ResponseState,
    message: String,
    data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            state: ResponseState::Success,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl Envelope<Empty> {
    /// A successful response without a payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            state: ResponseState::Success,
            message: message.into(),
            data: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            state: ResponseState::Error,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        axum::Json(self).into_response()
    }
}

/// Payload of responses that carry none.
#[derive(Debug, Serialize, ToSchema)]
pub struct Empty {}
