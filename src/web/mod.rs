//! HTTP surface

pub mod forms;
pub mod middleware;
pub mod pages;
pub mod state;

use axum::{middleware::from_fn_with_state, routing::get, routing::post, Router};
use tower_http::trace::TraceLayer;

pub use middleware::route_gate;
pub use state::{AppState, RequestContext};

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::landing))
        .route("/login", get(pages::login).post(forms::login))
        .route("/signup", get(pages::signup).post(forms::signup))
        .route("/logout", post(forms::logout))
        .route("/dashboard", get(pages::dashboard))
        .route("/projects", get(pages::projects).post(forms::create_project))
        .route(
            "/projects/{project_id}",
            get(pages::project).post(forms::update_project),
        )
        .route("/projects/{project_id}/delete", post(forms::delete_project))
        .route("/projects/{project_id}/archive", post(forms::archive_project))
        .route(
            "/projects/{project_id}/unarchive",
            post(forms::unarchive_project),
        )
        .route("/projects/{project_id}/items", post(forms::create_item))
        .route(
            "/projects/{project_id}/{item_id}",
            get(pages::item).post(forms::update_item),
        )
        .route(
            "/projects/{project_id}/{item_id}/toggle",
            post(forms::toggle_item),
        )
        .layer(from_fn_with_state(state.clone(), route_gate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
