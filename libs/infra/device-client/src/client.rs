// [libs/infra/device-client/src/client.rs]
/*!
 * =================================================================
 * APARATO: DEVICE CONTROL-PLANE UPLINK
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: NEGOCIACIÓN DE REGISTRO, CONSULTA DE ACTUALIZACIONES
 *    Y REPORTE DE SALUD/TELEMETRÍA DESDE EL DISPOSITIVO
 *
 * A diferencia de un uplink con secreto fijo en cabecera, el token de
 * acceso aquí es emitido dinámicamente por `/v1/devices/register` y
 * rota cada 30 días (§6) — por eso viaja como parámetro por llamada en
 * vez de fijarse una sola vez en el constructor.
 * =================================================================
 */

use bundlenudge_domain_models::{
    CheckUpdateRequest, CheckUpdateResponse, HealthConfigResponse, HealthFailureRequest, HealthFailureResponse,
    RegisterDeviceRequest, RegisterDeviceResponse, TelemetryAckResponse, TelemetryBatchRequest, TelemetryEvent,
};
use reqwest::{Client, StatusCode};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::DeviceClientError;

#[derive(Clone)]
pub struct DeviceControlPlaneClient {
    network_session_client: Client,
    control_plane_base_endpoint: String,
}

impl DeviceControlPlaneClient {
    pub fn new(base_url: String) -> Self {
        Self {
            network_session_client: Client::builder()
                .user_agent("BundleNudge-Device-Agent/1.0")
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("FATAL: device client initialization failed"),
            control_plane_base_endpoint: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[instrument(skip(self, request))]
    pub async fn register_device(
        &self,
        request: &RegisterDeviceRequest,
    ) -> Result<RegisterDeviceResponse, DeviceClientError> {
        let url = format!("{}/v1/devices/register", self.control_plane_base_endpoint);
        let response = self.network_session_client.post(&url).json(request).send().await?;
        decode_or_reject(response).await
    }

    #[instrument(skip(self, request, access_token))]
    pub async fn check_update(
        &self,
        request: &CheckUpdateRequest,
        access_token: &str,
    ) -> Result<CheckUpdateResponse, DeviceClientError> {
        let url = format!("{}/v1/updates/check", self.control_plane_base_endpoint);
        let response = self
            .network_session_client
            .post(&url)
            .bearer_auth(access_token)
            .json(request)
            .send()
            .await?;
        decode_or_reject(response).await
    }

    #[instrument(skip(self, access_token))]
    pub async fn fetch_health_config(
        &self,
        app_id: Uuid,
        access_token: &str,
    ) -> Result<HealthConfigResponse, DeviceClientError> {
        let url = format!("{}/v1/apps/{}/health-config", self.control_plane_base_endpoint, app_id);
        let response = self.network_session_client.get(&url).bearer_auth(access_token).send().await?;
        decode_or_reject(response).await
    }

    #[instrument(skip(self, request, access_token))]
    pub async fn report_health_failure(
        &self,
        request: &HealthFailureRequest,
        access_token: &str,
    ) -> Result<HealthFailureResponse, DeviceClientError> {
        let url = format!("{}/v1/health/failure", self.control_plane_base_endpoint);
        let response = self
            .network_session_client
            .post(&url)
            .bearer_auth(access_token)
            .json(request)
            .send()
            .await?;
        decode_or_reject(response).await
    }

    #[instrument(skip(self, events, access_token))]
    pub async fn send_telemetry_batch(
        &self,
        events: Vec<TelemetryEvent>,
        access_token: &str,
    ) -> Result<TelemetryAckResponse, DeviceClientError> {
        let url = format!("{}/v1/telemetry/batch", self.control_plane_base_endpoint);
        let response = self
            .network_session_client
            .post(&url)
            .bearer_auth(access_token)
            .json(&TelemetryBatchRequest { events })
            .send()
            .await?;
        decode_or_reject(response).await
    }

    /// Descarga el bundle crudo sin verificar su hash; la verificación
    /// de integridad vive en `crate::downloader` para poder probarse
    /// sin un servidor HTTP real.
    #[instrument(skip(self))]
    pub async fn download_bundle_bytes(&self, bundle_url: &str) -> Result<Vec<u8>, DeviceClientError> {
        let response = self.network_session_client.get(bundle_url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(DeviceClientError::ServerRejection {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

async fn decode_or_reject<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, DeviceClientError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        warn!("🔒 [DEVICE_CLIENT]: control plane rejected the access token");
        return Err(DeviceClientError::Unauthorized);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(DeviceClientError::ServerRejection { status: status.as_u16(), body });
    }
    let body = response.json::<T>().await?;
    info!("📡 [DEVICE_CLIENT]: control plane call succeeded with status {}", status);
    Ok(body)
}
