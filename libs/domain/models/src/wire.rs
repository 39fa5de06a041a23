// [libs/domain/models/src/wire.rs]
/*!
 * APARATO: CONTRATOS DE ALAMBRE (WIRE DTOS)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: FORMAS JSON EXACTAS DE `/v1/...` (§6)
 *
 * Estos tipos son deliberadamente distintos de las entidades de
 * persistencia: el alambre usa `camelCase`, las entidades usan los
 * nombres de columna soberanos.
 */

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::Platform;
use crate::health::{HealthEndpointSpec, HealthEventSpec};

// ---- POST /v1/devices/register ----

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeviceRequest {
    pub app_id: Uuid,
    pub device_id: Uuid,
    pub platform: Platform,
    pub app_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeviceResponse {
    pub access_token: String,
    pub expires_at: i64,
}

// ---- POST /v1/updates/check ----

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckUpdateRequest {
    pub app_id: Uuid,
    pub device_id: Uuid,
    pub platform: Platform,
    pub app_version: String,
    pub current_bundle_version: Option<String>,
    pub current_bundle_hash: Option<String>,
    pub channel_hint: Option<String>,
    #[serde(default)]
    pub device_info: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseWireInfo {
    pub version: String,
    pub bundle_url: String,
    pub bundle_size: u64,
    pub bundle_hash: String,
    pub release_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub release_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckUpdateResponse {
    pub update_available: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub requires_app_store_update: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub app_store_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub release: Option<ReleaseWireInfo>,
}

impl CheckUpdateResponse {
    pub fn no_update() -> Self {
        Self {
            update_available: false,
            requires_app_store_update: None,
            app_store_message: None,
            release: None,
        }
    }

    pub fn requires_store_update(message: impl Into<String>) -> Self {
        Self {
            update_available: false,
            requires_app_store_update: Some(true),
            app_store_message: Some(message.into()),
            release: None,
        }
    }

    pub fn update_available(release: ReleaseWireInfo) -> Self {
        Self {
            update_available: true,
            requires_app_store_update: None,
            app_store_message: None,
            release: Some(release),
        }
    }
}

// ---- GET /v1/apps/{appId}/health-config ----

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthConfigResponse {
    pub events: Vec<HealthEventSpec>,
    pub endpoints: Vec<HealthEndpointSpec>,
}

// ---- POST /v1/health/failure ----

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthFailureRequest {
    pub release_id: Uuid,
    pub device_id: Uuid,
    pub missing_events: Vec<String>,
    pub app_version: Option<String>,
    pub os_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthFailureResponse {
    pub received: bool,
}

// ---- POST /v1/telemetry, /v1/telemetry/batch, /v1/telemetry/crash ----

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    pub device_id: Uuid,
    pub app_id: Uuid,
    pub event_name: String,
    #[serde(default)]
    pub properties: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryBatchRequest {
    pub events: Vec<TelemetryEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryAckResponse {
    pub accepted: bool,
}

// ---- Admin surface (§12) ----

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReleaseRequest {
    pub channel_name: Option<String>,
    pub version: String,
    pub bundle_url: String,
    pub bundle_size: u64,
    pub bundle_hash: String,
    pub rollout_percentage: Option<u8>,
    #[serde(default)]
    pub targeting_rules: crate::constraints::Constraints,
    pub release_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub kind: String,
    pub message: String,
}

impl From<&crate::errors::DomainError> for ErrorResponse {
    fn from(error: &crate::errors::DomainError) -> Self {
        Self {
            kind: error.kind.to_string(),
            message: error.message.clone(),
        }
    }
}
