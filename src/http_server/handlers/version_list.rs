use crate::{http_server::response::ApiResponse, VerificationPipeline};
use actix_web::web::{self, Json};

pub async fn get_version_list(
    pipeline: web::Data<VerificationPipeline>,
) -> Json<ApiResponse<Vec<String>>> {
    let versions = pipeline
        .supported_versions()
        .iter()
        .map(ToString::to_string)
        .collect();
    Json(ApiResponse::ok(versions))
}
