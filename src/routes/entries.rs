use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::error::AppError;
use crate::models::{Entry, NewEntry};
use crate::service;
use crate::validate::validate_name;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/entries/", get(list_entries).post(create_entry))
        .route("/entries/{name}/", get(show_entry).delete(delete_entry))
}

async fn list_entries(State(state): State<AppState>) -> Result<Json<Vec<Entry>>, AppError> {
    Ok(Json(service::get_all_entries(&state.db).await?))
}

async fn create_entry(
    State(state): State<AppState>,
    Json(new): Json<NewEntry>,
) -> Result<Json<Entry>, AppError> {
    new.validate()?;
    Ok(Json(service::create_entry(&state.db, &new).await?))
}

async fn show_entry(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Entry>, AppError> {
    validate_name(&name)?;
    Ok(Json(service::get_entry(&state.db, &name).await?))
}

async fn delete_entry(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Entry>, AppError> {
    validate_name(&name)?;
    Ok(Json(service::delete_entry(&state.db, &name).await?))
}
