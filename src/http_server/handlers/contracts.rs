//! Lookups of verified contracts.

use crate::{
    http_server::response::{ApiError, ApiResponse},
    types::VerificationRecord,
    VerificationPipeline,
};
use actix_web::web::{self, Json};
use ethers_core::types::Address;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
pub struct TimeRange {
    pub start: u64,
    pub end: u64,
}

fn parse_address(address: &str) -> Result<Address, ApiError> {
    Address::from_str(address.trim())
        .map_err(|_| ApiError::BadRequest(format!("invalid contract address: {address}")))
}

async fn find_record(
    pipeline: &VerificationPipeline,
    address: &str,
) -> Result<VerificationRecord, ApiError> {
    let address = parse_address(address)?;
    pipeline
        .get_record(address)
        .await?
        .ok_or(ApiError::NotVerified)
}

pub async fn get_verify_info(
    pipeline: web::Data<VerificationPipeline>,
    address: web::Path<String>,
) -> Result<Json<ApiResponse<VerificationRecord>>, ApiError> {
    let record = find_record(&pipeline, &address).await?;
    Ok(Json(ApiResponse::ok(record)))
}

/// The ABI as a JSON document rather than the text the compiler wrote.
pub async fn get_abi(
    pipeline: web::Data<VerificationPipeline>,
    address: web::Path<String>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let record = find_record(&pipeline, &address).await?;
    let abi = serde_json::from_str(&record.abi).unwrap_or(Value::String(record.abi));
    Ok(Json(ApiResponse::ok(abi)))
}

pub async fn get_source_code(
    pipeline: web::Data<VerificationPipeline>,
    address: web::Path<String>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let record = find_record(&pipeline, &address).await?;
    Ok(Json(ApiResponse::ok(record.context.flattened_source)))
}

pub async fn verified_contracts(
    pipeline: web::Data<VerificationPipeline>,
    range: web::Query<TimeRange>,
) -> Result<Json<ApiResponse<Vec<Address>>>, ApiError> {
    let addresses = pipeline.list_verified(range.start, range.end).await?;
    Ok(Json(ApiResponse::ok(addresses)))
}
