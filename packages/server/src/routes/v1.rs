use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes(config))
        .nest("/avatars", avatar_routes())
        .nest("/problems", problem_routes())
        .routes(routes!(handlers::health::healthcheck))
}

fn auth_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::auth::upload_avatar))
        .layer(handlers::auth::avatar_body_limit(
            config.storage.max_avatar_bytes,
        ));

    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::logout))
        .routes(routes!(handlers::auth::me))
        .merge(upload)
}

fn avatar_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::avatar::get_avatar))
}

fn problem_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::problem::create_problem,
            handlers::problem::list_problems
        ))
        .routes(routes!(
            handlers::problem::get_problem,
            handlers::problem::update_problem,
            handlers::problem::delete_problem
        ))
}
