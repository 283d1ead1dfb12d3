//! REST API layer: route handlers, DTOs, OpenAPI document and router
//! composition.
//!
//! All endpoints except `/health` are mounted under `/api/v1`.

pub mod dto;
pub mod handlers;
pub mod openapi;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
    };

    router
}

/// Builds the full application: REST, `/ws`, tracing and CORS layers.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::context::StorefrontContext;

    async fn app() -> Router {
        let Ok(context) = StorefrontContext::start(&StorefrontConfig::default()).await else {
            panic!("default storefront should start");
        };
        build_app(AppState::new(Arc::new(context)))
    }

    fn get(uri: &str) -> Request<Body> {
        let Ok(request) = Request::builder().uri(uri).body(Body::empty()) else {
            panic!("valid request");
        };
        request
    }

    #[tokio::test]
    async fn health_is_mounted_at_root() {
        let Ok(response) = app().await.oneshot(get("/health")).await else {
            panic!("router is infallible");
        };
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_answer_unauthorized_when_signed_out() {
        let Ok(response) = app().await.oneshot(get("/api/v1/purchases")).await else {
            panic!("router is infallible");
        };
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_event_is_not_found() {
        let Ok(response) = app().await.oneshot(get("/api/v1/events/999")).await else {
            panic!("router is infallible");
        };
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
