use axum::{
    Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use crate::{application::error::RenderError, domain::prescription::PrescriptionRequest};

use super::HttpState;

/// `POST /compile` — render one prescription and stream the PDF back.
pub async fn compile(
    State(state): State<HttpState>,
    Json(request): Json<PrescriptionRequest>,
) -> Result<Response, RenderError> {
    let pdf = state.renderer.render(&request).await?;
    Ok(([(header::CONTENT_TYPE, "application/pdf")], pdf).into_response())
}
