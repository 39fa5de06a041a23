// [libs/infra/device-client/src/lib.rs]
/*!
 * APARATO: DEVICE CLIENT ROOT
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PUNTO DE ENTRADA DEL UPLINK DISPOSITIVO -> CONTROL PLANE
 */

pub mod client;
pub mod downloader;
pub mod errors;

pub use client::DeviceControlPlaneClient;
pub use downloader::verify_bundle_integrity;
pub use errors::DeviceClientError;
