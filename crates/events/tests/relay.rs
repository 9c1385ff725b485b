//! Integration tests for persist-then-broadcast publishing.

use std::sync::Arc;

use atrium_db::models::tenant::CreateTenant;
use atrium_db::repositories::{EventRepo, TenantRepo};
use atrium_events::{EventBus, EventRelay, PlatformEvent, PublishOptions};
use sqlx::PgPool;

async fn tenant_id(pool: &PgPool) -> i64 {
    TenantRepo::create(
        pool,
        &CreateTenant {
            name: "Acme".to_string(),
            slug: "acme".to_string(),
            plan: None,
            settings: None,
        },
    )
    .await
    .unwrap()
    .id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_published_event_is_persisted_before_broadcast(pool: PgPool) {
    let tenant_id = tenant_id(&pool).await;
    let bus = Arc::new(EventBus::default());
    let mut rx = bus.subscribe();
    let relay = EventRelay::new(pool.clone(), bus);

    let correlation = uuid::Uuid::new_v4();
    let published = relay
        .publish_event(
            "deal.closed",
            "domain",
            serde_json::json!({"deal_id": 9}),
            serde_json::json!({"request_id": "r-1"}),
            PublishOptions {
                tenant_id: Some(tenant_id),
                source: Some(("deal".to_string(), 9)),
                correlation_id: Some(correlation),
                notify_user_ids: vec![1, 1, 2],
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let received = rx.recv().await.unwrap();
    assert_eq!(received.id, published.id);
    assert_eq!(received.event.notify_user_ids, vec![1, 2]);

    let row = EventRepo::find_in_tenant(&pool, tenant_id, published.id)
        .await
        .unwrap()
        .expect("row must exist by the time subscribers see it");
    assert_eq!(row.name, "deal.closed");
    assert_eq!(row.correlation_id, Some(correlation));
    assert_eq!(row.meta["request_id"], "r-1");
    assert_eq!(row.source_entity_type.as_deref(), Some("deal"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_insert_broadcasts_nothing(pool: PgPool) {
    let bus = Arc::new(EventBus::default());
    let mut rx = bus.subscribe();
    let relay = EventRelay::new(pool.clone(), bus);

    // Unknown tenant violates the foreign key.
    let result = relay.publish(PlatformEvent::new("task.assigned").with_tenant(424_242)).await;
    assert!(result.is_err());
    assert!(rx.try_recv().is_err(), "nothing should be broadcast");

    let logged = relay
        .publish_logged(PlatformEvent::new("task.assigned").with_tenant(424_242))
        .await;
    assert!(logged.is_none());
}
