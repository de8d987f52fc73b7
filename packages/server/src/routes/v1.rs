use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/projects", project_routes())
}

fn project_routes() -> OpenApiRouter<AppState> {
    let reads = OpenApiRouter::new()
        .routes(routes!(handlers::project::list_projects))
        .routes(routes!(
            handlers::project::get_project,
            handlers::project::delete_project
        ))
        .routes(routes!(handlers::download::download_project));

    let multipart = OpenApiRouter::new()
        .routes(routes!(handlers::project::upload_project))
        .routes(routes!(handlers::project::update_project))
        .layer(handlers::project::upload_body_limit());

    reads.merge(multipart)
}
