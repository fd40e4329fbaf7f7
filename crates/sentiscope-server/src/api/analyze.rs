use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use sentiscope_analysis::{AnalysisRequest, AnalysisResult};

use super::{ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

/// `POST /api/analyze` and `POST /api/analyze-reddit`.
pub(super) async fn analyze(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AnalysisResult>>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        tracing::warn!(
            request_id = %req_id.0,
            error = %rejection,
            "rejecting unreadable analysis request body"
        );
        ApiError::new(req_id.0.clone(), "validation_error", rejection.body_text())
    })?;

    tracing::info!(request_id = %req_id.0, keyword = %request.keyword, "analysis requested");

    match state.analysis.analyze(&request).await {
        Ok(result) => Ok(Json(ApiResponse {
            data: result,
            meta: ResponseMeta::new(req_id.0),
        })),
        Err(descriptor) => {
            tracing::warn!(
                request_id = %req_id.0,
                category = %descriptor.category,
                "analysis request failed"
            );
            Err(ApiError::from_descriptor(
                req_id.0,
                descriptor,
                state.expose_error_details(),
            ))
        }
    }
}
