use axum::http::{HeaderValue, Method};
use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::middleware::role::{require_principal, require_user};
use crate::modules::auth::init_auth_router;
use crate::modules::classrooms::router::{init_classrooms_router, init_public_classrooms_router};
use crate::modules::timetables::router::init_timetables_router;
use crate::modules::users::router::{
    init_users_admin_router, init_users_router, init_users_self_router,
};
use crate::state::AppState;

pub fn init_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .nest("/auth", init_auth_router())
        .nest(
            "/user",
            init_users_router()
                .merge(
                    init_users_admin_router().route_layer(middleware::from_fn_with_state(
                        state.clone(),
                        require_principal,
                    )),
                )
                .merge(
                    init_users_self_router()
                        .route_layer(middleware::from_fn_with_state(state.clone(), require_user)),
                ),
        )
        .nest(
            "/classroom",
            init_classrooms_router()
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    require_principal,
                ))
                .merge(init_public_classrooms_router()),
        )
        .nest("/timetable", init_timetables_router())
        .with_state(state.clone())
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                ])
                .allow_credentials(true)
        })
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
