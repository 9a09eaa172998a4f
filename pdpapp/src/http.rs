use axum::{
    Extension,
    Router,
    middleware,
    routing::{get, post},
};
use pdpac::Platform;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod policy;

pub use auth::ApiKey;

/// Build the application router.
///
/// Policy creation and reload require the bearer API key; checks and
/// health are public.
pub fn router(platform: Platform, api_key: ApiKey) -> Router {
    let protected = Router::new()
        .route("/policies", post(policy::create_policy))
        .route("/reload", post(policy::reload))
        .route_layer(middleware::from_fn_with_state(api_key, auth::require_api_key));

    Router::new()
        .route("/check", post(policy::check))
        .route("/health", get(policy::health))
        .merge(protected)
        .layer(Extension(platform))
        .layer(TraceLayer::new_for_http())
}
