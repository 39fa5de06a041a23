// [libs/infra/db/src/repositories/mod.rs]
pub mod app_repository;
pub mod channel_repository;
pub mod device_repository;
pub mod health_repository;
pub mod release_repository;
pub mod rollback_repository;

pub use app_repository::AppRepository;
pub use channel_repository::ChannelRepository;
pub use device_repository::DeviceRepository;
pub use health_repository::HealthRepository;
pub use release_repository::ReleaseRepository;
pub use rollback_repository::RollbackRepository;
