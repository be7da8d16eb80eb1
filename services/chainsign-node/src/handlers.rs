use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use chainsign_domain::{SignatureRecord, SigningDevice};
use chainsign_store::PutOutcome;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

const OPENAPI_SPEC: &str = include_str!("../openapi/openapi.yaml");

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateDeviceRequest {
    pub signature_algorithm: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeviceResponse {
    pub id: Uuid,
    pub signature_algorithm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub counter: u64,
    pub last_signature: String,
    pub public_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeviceSummary {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignatureRequest {
    pub data_to_be_signed: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignatureResponse {
    pub signature: String,
    pub signed_data: String,
}

impl From<SignatureRecord> for SignatureResponse {
    fn from(record: SignatureRecord) -> Self {
        Self {
            signature: record.signature,
            signed_data: record.signed_data,
        }
    }
}

impl DeviceResponse {
    fn from_device(device: &SigningDevice) -> Result<Self, ApiError> {
        let snapshot = device.snapshot()?;
        Ok(Self {
            id: snapshot.id,
            signature_algorithm: snapshot.algorithm.to_string(),
            label: snapshot.label,
            counter: snapshot.counter,
            last_signature: snapshot.last_signature,
            public_key: snapshot.public_key,
        })
    }
}

fn device_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "data": {
            "status": "pass",
            "version": "v0",
            "timestamp": Utc::now().to_rfc3339()
        }
    }))
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

pub async fn openapi_spec() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/yaml")],
        OPENAPI_SPEC,
    )
}

pub async fn create_device(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateDeviceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DeviceResponse>), ApiError> {
    let request = json_body(body)?;

    // Key generation is CPU-bound, RSA especially.
    let factory = state.factory.clone();
    let device = tokio::task::spawn_blocking(move || {
        factory.create(&request.signature_algorithm, request.label)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    let device = state.store.add(Arc::new(device)).await?;
    info!(
        device_id = %device.id(),
        algorithm = %device.algorithm(),
        "Device created"
    );

    Ok((StatusCode::CREATED, Json(DeviceResponse::from_device(&device)?)))
}

pub async fn list_devices(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DeviceSummary>>, ApiError> {
    let devices = state.store.list().await?;
    let summaries = devices
        .iter()
        .map(|device| DeviceSummary {
            id: device.id(),
            label: device.label().map(str::to_string),
        })
        .collect();
    Ok(Json(summaries))
}

pub async fn get_device(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<DeviceResponse>, ApiError> {
    let id = device_id(path)?;
    let device = state.store.get(id).await?;
    Ok(Json(DeviceResponse::from_device(&device)?))
}

pub async fn sign_transaction(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<SignatureRequest>, JsonRejection>,
) -> Result<Json<SignatureResponse>, ApiError> {
    let id = device_id(path)?;
    let request = json_body(body)?;

    let device = state.store.get(id).await?;
    let signer = device.clone();
    let record = tokio::task::spawn_blocking(move || signer.sign(&request.data_to_be_signed))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    match state.store.put(device.clone()).await? {
        PutOutcome::Updated(stored) => {
            let (counter, _) = stored.counter_and_last_signature();
            info!(device_id = %id, counter, "Transaction signed");
        }
        PutOutcome::Ignored => {
            warn!(device_id = %id, "Signed device no longer stored");
        }
        PutOutcome::Stale { stored_counter } => {
            warn!(device_id = %id, stored_counter, "Stored device is ahead of signed copy");
        }
    }

    Ok(Json(record.into()))
}
