// [libs/infra/db/tests/lifecycle.rs]
//! Ejercita el ciclo de vida completo app -> channel -> release ->
//! activación atómica -> rollback contra una base de datos en memoria.

use bundlenudge_domain_models::{Constraints, Platform, ReleaseStatus, RollbackReason};
use bundlenudge_infra_db::{AppRepository, ChannelRepository, DbClient, DbError, ReleaseRepository};
use chrono::Utc;

async fn memory_client() -> DbClient {
    DbClient::connect(":memory:", None).await.expect("in-memory db connects")
}

#[tokio::test]
async fn full_release_lifecycle_activates_and_supersedes() {
    let client = memory_client().await;
    let apps = AppRepository::new(client.clone());
    let channels = ChannelRepository::new(client.clone());
    let releases = ReleaseRepository::new(client.clone());

    let app = apps.create(Platform::Ios, "org_test").await.unwrap();
    let channel = channels
        .create(app.id, "production", true, 100, &Constraints::default())
        .await
        .unwrap();

    let release_one = releases
        .create_pending(app.id, Some(channel.id), "1.0.0", "https://cdn/b1.zip", 1024, "a".repeat(64).as_str(), 100, &Constraints::default(), None)
        .await
        .unwrap();
    assert_eq!(release_one.status, ReleaseStatus::Pending);

    releases.acquire_processing_lease(release_one.id, "worker-1", chrono::Duration::seconds(60), Utc::now()).await.unwrap();
    releases.activate(release_one.id, channel.id, &channels).await.unwrap();

    let activated = releases.get_by_id(release_one.id).await.unwrap().unwrap();
    assert_eq!(activated.status, ReleaseStatus::Active);

    let channel_after = channels.get_by_id(channel.id).await.unwrap().unwrap();
    assert_eq!(channel_after.active_release_id, Some(release_one.id));

    // Reactivating an already-active release is an idempotent no-op.
    releases.activate(release_one.id, channel.id, &channels).await.unwrap();

    let release_two = releases
        .create_pending(app.id, Some(channel.id), "1.1.0", "https://cdn/b2.zip", 2048, "b".repeat(64).as_str(), 100, &Constraints::default(), None)
        .await
        .unwrap();
    releases.acquire_processing_lease(release_two.id, "worker-1", chrono::Duration::seconds(60), Utc::now()).await.unwrap();
    releases.activate(release_two.id, channel.id, &channels).await.unwrap();

    let release_one_after = releases.get_by_id(release_one.id).await.unwrap().unwrap();
    assert_eq!(release_one_after.status, ReleaseStatus::Superseded);

    let channel_final = channels.get_by_id(channel.id).await.unwrap().unwrap();
    assert_eq!(channel_final.active_release_id, Some(release_two.id));

    releases.rollback(release_two.id, RollbackReason::HealthTimeout, &channels).await.unwrap();
    let rolled_back = releases.get_by_id(release_two.id).await.unwrap().unwrap();
    assert_eq!(rolled_back.status, ReleaseStatus::RolledBack);
    assert_eq!(rolled_back.rollback_reason, Some(RollbackReason::HealthTimeout));

    // The channel repoints to the superseded predecessor; it must never keep serving
    // the release that was just rolled back.
    let channel_post_rollback = channels.get_by_id(channel.id).await.unwrap().unwrap();
    assert_eq!(channel_post_rollback.active_release_id, Some(release_one.id));
}

#[tokio::test]
async fn concurrent_lease_acquisition_has_exactly_one_winner() {
    let client = memory_client().await;
    let apps = AppRepository::new(client.clone());
    let releases = ReleaseRepository::new(client.clone());

    let app = apps.create(Platform::Android, "org_test").await.unwrap();
    let release = releases
        .create_pending(app.id, None, "2.0.0", "https://cdn/b3.zip", 512, "c".repeat(64).as_str(), 100, &Constraints::default(), None)
        .await
        .unwrap();

    let first = releases.acquire_processing_lease(release.id, "worker-a", chrono::Duration::seconds(60), Utc::now()).await;
    let second = releases.acquire_processing_lease(release.id, "worker-b", chrono::Duration::seconds(60), Utc::now()).await;

    assert!(first.is_ok());
    assert!(matches!(second, Err(DbError::Conflict(_))));
}

#[tokio::test]
async fn rollback_with_no_predecessor_clears_the_channel() {
    let client = memory_client().await;
    let apps = AppRepository::new(client.clone());
    let channels = ChannelRepository::new(client.clone());
    let releases = ReleaseRepository::new(client.clone());

    let app = apps.create(Platform::Android, "org_test").await.unwrap();
    let channel = channels.create(app.id, "production", true, 100, &Constraints::default()).await.unwrap();
    let release = releases
        .create_pending(app.id, Some(channel.id), "1.0.0", "https://cdn/b5.zip", 10, "e".repeat(64).as_str(), 100, &Constraints::default(), None)
        .await
        .unwrap();
    releases.acquire_processing_lease(release.id, "worker-1", chrono::Duration::seconds(60), Utc::now()).await.unwrap();
    releases.activate(release.id, channel.id, &channels).await.unwrap();

    releases.rollback(release.id, RollbackReason::Manual, &channels).await.unwrap();

    let channel_after = channels.get_by_id(channel.id).await.unwrap().unwrap();
    assert_eq!(channel_after.active_release_id, None);
}

#[tokio::test]
async fn activating_non_processing_release_is_rejected() {
    let client = memory_client().await;
    let apps = AppRepository::new(client.clone());
    let channels = ChannelRepository::new(client.clone());
    let releases = ReleaseRepository::new(client.clone());

    let app = apps.create(Platform::Ios, "org_test").await.unwrap();
    let channel = channels.create(app.id, "production", true, 100, &Constraints::default()).await.unwrap();
    let release = releases
        .create_pending(app.id, Some(channel.id), "1.0.0", "https://cdn/b4.zip", 10, "d".repeat(64).as_str(), 100, &Constraints::default(), None)
        .await
        .unwrap();

    let result = releases.activate(release.id, channel.id, &channels).await;
    assert!(matches!(result, Err(DbError::Conflict(_))));
}
