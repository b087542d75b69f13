//! Form submission handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form, Json,
};
use serde_json::json;

use crate::actions::{ActionOutcome, Actions, ItemForm, LoginForm, ProjectForm, SignupForm};
use crate::web::state::{AppState, RequestContext};

/// Completed actions land on `done`; rejected ones answer 422
fn respond(outcome: ActionOutcome, done: &str) -> Response {
    match outcome {
        ActionOutcome::Completed => Redirect::to(done).into_response(),
        ActionOutcome::Redirect(to) => Redirect::to(&to).into_response(),
        ActionOutcome::Failed { error } => {
            (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({"error": error}))).into_response()
        }
    }
}

pub async fn login(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<LoginForm>,
) -> Response {
    let db = ctx.db(&state.backend);
    let outcome = Actions::new(&*ctx.auth, &db).login(&form).await;
    respond(outcome, "/dashboard")
}

pub async fn signup(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<SignupForm>,
) -> Response {
    let db = ctx.db(&state.backend);
    let outcome = Actions::new(&*ctx.auth, &db).signup(&form).await;
    respond(outcome, "/login")
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    let db = ctx.db(&state.backend);
    let outcome = Actions::new(&*ctx.auth, &db).logout().await;
    respond(outcome, "/login")
}

pub async fn create_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<ProjectForm>,
) -> Response {
    let db = ctx.db(&state.backend);
    let outcome = Actions::new(&*ctx.auth, &db).create_project(&form).await;
    respond(outcome, "/projects")
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(project_id): Path<String>,
    Form(form): Form<ProjectForm>,
) -> Response {
    let db = ctx.db(&state.backend);
    let outcome = Actions::new(&*ctx.auth, &db)
        .update_project(&project_id, &form)
        .await;
    respond(outcome, &format!("/projects/{}", project_id))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(project_id): Path<String>,
) -> Response {
    let db = ctx.db(&state.backend);
    let outcome = Actions::new(&*ctx.auth, &db)
        .delete_project(&project_id)
        .await;
    respond(outcome, "/projects")
}

pub async fn archive_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(project_id): Path<String>,
) -> Response {
    let db = ctx.db(&state.backend);
    let outcome = Actions::new(&*ctx.auth, &db)
        .archive_project(&project_id)
        .await;
    respond(outcome, "/projects")
}

pub async fn unarchive_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(project_id): Path<String>,
) -> Response {
    let db = ctx.db(&state.backend);
    let outcome = Actions::new(&*ctx.auth, &db)
        .unarchive_project(&project_id)
        .await;
    respond(outcome, &format!("/projects/{}", project_id))
}

pub async fn create_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(project_id): Path<String>,
    Form(form): Form<ItemForm>,
) -> Response {
    let db = ctx.db(&state.backend);
    let outcome = Actions::new(&*ctx.auth, &db)
        .create_item(&project_id, &form)
        .await;
    respond(outcome, &format!("/projects/{}", project_id))
}

pub async fn update_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((project_id, item_id)): Path<(String, String)>,
    Form(form): Form<ItemForm>,
) -> Response {
    let db = ctx.db(&state.backend);
    let outcome = Actions::new(&*ctx.auth, &db)
        .update_item(&project_id, &item_id, &form)
        .await;
    respond(outcome, &format!("/projects/{}/{}", project_id, item_id))
}

pub async fn toggle_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((project_id, item_id)): Path<(String, String)>,
) -> Response {
    let db = ctx.db(&state.backend);
    let outcome = Actions::new(&*ctx.auth, &db)
        .toggle_item_status(&project_id, &item_id)
        .await;
    respond(outcome, &format!("/projects/{}", project_id))
}
