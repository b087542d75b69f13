//! Page handlers, rendered as JSON documents

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use crate::error::Error;
use crate::profile::ProfileProvisioner;
use crate::web::state::{AppState, RequestContext};

/// Why a page could not be shown
#[derive(Debug)]
pub enum PageError {
    Redirect(String),
    NotFound,
    Backend(Error),
}

impl From<Error> for PageError {
    fn from(e: Error) -> Self {
        match e {
            Error::NotAuthenticated => PageError::Redirect("/login".to_string()),
            e => PageError::Backend(e),
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::Redirect(to) => Redirect::to(&to).into_response(),
            PageError::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({"error": "Not found"}))).into_response()
            }
            PageError::Backend(e) => {
                error!("Page failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "Something went wrong"})),
                )
                    .into_response()
            }
        }
    }
}

type PageResult = Result<Json<Value>, PageError>;

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub message: Option<String>,
}

pub async fn landing(Extension(ctx): Extension<RequestContext>) -> Json<Value> {
    Json(json!({
        "page": "landing",
        "signed_in": ctx.user.is_some(),
    }))
}

pub async fn login(Query(query): Query<MessageQuery>) -> Json<Value> {
    Json(json!({"page": "login", "message": query.message}))
}

pub async fn signup(Query(query): Query<MessageQuery>) -> Json<Value> {
    Json(json!({"page": "signup", "message": query.message}))
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> PageResult {
    let db = ctx.db(&state.backend);
    let user = db.require_user()?;

    let profiles = db.profiles();
    let profile = ProfileProvisioner::new(&*ctx.auth, &profiles)
        .get_user_profile(&user.id)
        .await
        .into_profile();
    let summary = db.dashboard().summary().await?;

    Ok(Json(json!({
        "page": "dashboard",
        "user": {"id": user.id, "email": user.email},
        "profile": profile,
        "summary": summary,
    })))
}

pub async fn projects(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> PageResult {
    let db = ctx.db(&state.backend);
    let overview = db.dashboard().projects_overview().await?;

    Ok(Json(json!({"page": "projects", "projects": overview})))
}

pub async fn project(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(project_id): Path<String>,
) -> PageResult {
    let db = ctx.db(&state.backend);
    let view = db
        .dashboard()
        .project_view(&project_id)
        .await?
        .ok_or(PageError::NotFound)?;

    Ok(Json(json!({"page": "project", "project": view})))
}

pub async fn item(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((project_id, item_id)): Path<(String, String)>,
) -> PageResult {
    let db = ctx.db(&state.backend);
    let view = db
        .dashboard()
        .item_view(&project_id, &item_id)
        .await?
        .ok_or(PageError::NotFound)?;

    Ok(Json(json!({"page": "item", "item": view})))
}
