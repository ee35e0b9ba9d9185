use crate::{
    http_server::response::{ApiError, ApiResponse, VerificationResponse},
    types::VerificationContext,
    VerificationPipeline,
};
use actix_web::web::{self, Json};

pub async fn verify(
    pipeline: web::Data<VerificationPipeline>,
    context: Json<VerificationContext>,
) -> Result<Json<ApiResponse<VerificationResponse>>, ApiError> {
    let verified = pipeline.verify(context.into_inner()).await?;
    Ok(Json(ApiResponse::ok(VerificationResponse { verified })))
}
