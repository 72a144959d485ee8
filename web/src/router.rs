use crate::controller::{health_check_controller, passport_controller};
use crate::AppState;
use axum::{routing::get, Router};

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Pipeflow Platform API"
        ),
        paths(
            health_check_controller::health_check,
            passport_controller::authorize,
            passport_controller::callback,
        ),
        tags(
            (name = "pipeflow_platform", description = "Pipeflow Data Integration API")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(passport_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi2.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn passport_routes(app_state: AppState) -> Router {
    Router::new()
        // The static callback segment takes priority over the pipe id match.
        .route(
            "/auth/passport/callback",
            get(passport_controller::callback),
        )
        .route(
            "/auth/passport/{pipe_id}",
            get(passport_controller::authorize),
        )
        .with_state(app_state)
}
