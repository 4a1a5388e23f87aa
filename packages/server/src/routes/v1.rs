use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/cafes", cafe_routes())
        .nest("/reviews", review_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::admin_login))
        .routes(routes!(handlers::auth::me))
}

fn cafe_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::cafe::list_cafes, handlers::cafe::create_cafe))
        .routes(routes!(
            handlers::cafe::get_cafe,
            handlers::cafe::update_cafe,
            handlers::cafe::delete_cafe
        ))
}

fn review_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::review::create_review))
        .routes(routes!(handlers::review::list_cafe_reviews))
}
