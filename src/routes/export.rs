use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::NewEntry;
use crate::service;
use crate::AppState;

/// Snapshot of every stored entry, tagged or not.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportData {
    pub exported_at: String,
    pub entries: Vec<NewEntry>,
}

impl ExportData {
    pub async fn collect(db: &sqlx::SqlitePool) -> Result<Self, AppError> {
        let entries = service::export_entries(db).await?;
        Ok(Self {
            exported_at: chrono::Utc::now().to_rfc3339(),
            entries: entries.into_iter().map(NewEntry::from).collect(),
        })
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/export", get(export_data))
}

async fn export_data(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let export = ExportData::collect(&state.db).await?;

    let filename = format!("cmdb-export-{}.json", chrono::Local::now().format("%Y-%m-%d"));
    let content_disposition = format!("attachment; filename=\"{}\"", filename);

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(value) = HeaderValue::from_str(&content_disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok((headers, Json(export)))
}
