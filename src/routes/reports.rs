use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::time::Instant;
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::ReportData;
use crate::services::{pdf_generator_service, report_analysis_service, report_service};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/data", get(get_report_data))
        .route("/generate", post(generate_report_pdf))
        .route("/summary", get(get_report_summary))
}

async fn get_report_data(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ReportData>, AppError> {
    report_analysis_service::generate_report_data(
        &state.pool,
        state.price_oracle.as_ref(),
        auth.user_id,
    )
    .await
    .map(Json)
}

async fn generate_report_pdf(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let assembly_started = Instant::now();
    let data = report_analysis_service::generate_report_data(
        &state.pool,
        state.price_oracle.as_ref(),
        auth.user_id,
    )
    .await?;
    info!(
        "📊 Report data for {} assembled in {}ms ({} positions)",
        auth.user_id,
        assembly_started.elapsed().as_millis(),
        data.positions.len()
    );

    let report_id = data.report_id.clone();
    let render_started = Instant::now();
    // Rendering is pure CPU work; keep it off the async workers.
    let bytes = tokio::task::spawn_blocking(move || pdf_generator_service::render_report(&data))
        .await
        .map_err(|e| AppError::Render(e.to_string()))??;
    info!(
        "📄 PDF {} rendered in {}ms ({} bytes)",
        report_id,
        render_started.elapsed().as_millis(),
        bytes.len()
    );

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"Report_{}.pdf\"", report_id))
            .map_err(|e| AppError::Render(e.to_string()))?,
    );

    Ok((headers, bytes))
}

async fn get_report_summary(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    let data = report_analysis_service::generate_report_data(
        &state.pool,
        state.price_oracle.as_ref(),
        auth.user_id,
    )
    .await?;

    Ok(Html(report_service::build_summary_html(&data)))
}
