use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::error::AppError;
use crate::models::{Entry, Tag};
use crate::service;
use crate::validate::validate_name;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/entries/{name}/tags/", get(list_tags).post(add_tag))
        .route(
            "/entries/{name}/tags/{tag_name}/",
            get(show_tag).post(add_named_tag).delete(remove_tag),
        )
}

async fn list_tags(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Tag>>, AppError> {
    validate_name(&name)?;
    Ok(Json(service::list_entry_tags(&state.db, &name).await?))
}

async fn add_tag(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(tag): Json<Tag>,
) -> Result<Json<Entry>, AppError> {
    validate_name(&name)?;
    validate_name(&tag.name)?;
    Ok(Json(service::add_tag_to_entry(&state.db, &name, &tag).await?))
}

async fn show_tag(
    State(state): State<AppState>,
    Path((name, tag_name)): Path<(String, String)>,
) -> Result<Json<Tag>, AppError> {
    validate_name(&name)?;
    validate_name(&tag_name)?;
    Ok(Json(service::get_entry_tag(&state.db, &name, &tag_name).await?))
}

async fn add_named_tag(
    State(state): State<AppState>,
    Path((name, tag_name)): Path<(String, String)>,
    Json(tag): Json<Tag>,
) -> Result<Json<Entry>, AppError> {
    validate_name(&name)?;
    validate_name(&tag_name)?;
    validate_name(&tag.name)?;
    Ok(Json(
        service::add_named_tag(&state.db, &name, &tag_name, &tag).await?,
    ))
}

async fn remove_tag(
    State(state): State<AppState>,
    Path((name, tag_name)): Path<(String, String)>,
) -> Result<Json<Entry>, AppError> {
    validate_name(&name)?;
    validate_name(&tag_name)?;
    Ok(Json(
        service::remove_tag_from_entry(&state.db, &name, &tag_name).await?,
    ))
}
