use std::path::{Path, PathBuf};

use recall_service::{MemoryService, SearchRequest, ServiceConfig};
use recall_types::{Category, NewMemory};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .try_init();
}

fn temp_root() -> PathBuf {
    std::env::temp_dir().join(format!("recall_lifecycle_{}", Uuid::new_v4()))
}

fn service_at(root: &Path) -> MemoryService {
    let mut config = ServiceConfig::default();
    config.store.root_dir = root.to_path_buf();
    MemoryService::from_config(config).expect("local service")
}

fn memory(
    project: &str,
    category: Category,
    title: &str,
    content: &str,
    tags: &[&str],
) -> NewMemory {
    NewMemory {
        project: project.to_string(),
        category,
        title: title.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        references: Vec::new(),
        content: content.to_string(),
    }
}

#[tokio::test]
async fn save_search_update_lifecycle() {
    init_tracing();
    let root = temp_root();
    let service = service_at(&root);

    let pool_fix = service
        .save(memory(
            "api-gateway",
            Category::Debugging,
            "Connection pool tuning",
            "pool exhaustion under burst traffic",
            &["database", "timeout"],
        ))
        .await
        .unwrap();
    assert!(pool_fix.indexed);

    service
        .save(memory(
            "api-gateway",
            Category::Architecture,
            "Rate limiter design",
            "token bucket per client id",
            &[],
        ))
        .await
        .unwrap();
    service
        .save(memory(
            "web-app",
            Category::Documentation,
            "Deploy runbook",
            "blue green deploy steps",
            &[],
        ))
        .await
        .unwrap();

    // Query repeating the indexed text of the pool fix wins the ranking.
    let hits = service
        .search(SearchRequest::new(
            "pool exhaustion under burst traffic database timeout debugging",
        ))
        .await
        .unwrap();
    assert_eq!(hits[0].entry.id, pool_fix.id);
    assert!(hits[0].score > 0.99);

    // Project-scoped listing is newest first.
    let gateway = service.list(Some("api-gateway"), None).await.unwrap();
    assert_eq!(gateway.len(), 2);
    assert_eq!(gateway[0].title, "Rate limiter design");
    assert_eq!(gateway[1].title, "Connection pool tuning");

    // Marking the fix outdated removes it from default search only.
    service.update_status(pool_fix.id, true).await.unwrap();
    let default_hits = service
        .search(SearchRequest::new(
            "pool exhaustion under burst traffic database timeout debugging",
        ))
        .await
        .unwrap();
    assert!(default_hits.iter().all(|hit| hit.entry.id != pool_fix.id));

    let with_outdated = service
        .search(SearchRequest {
            include_outdated: true,
            ..SearchRequest::new("pool exhaustion under burst traffic database timeout debugging")
        })
        .await
        .unwrap();
    assert_eq!(with_outdated[0].entry.id, pool_fix.id);
    assert!(with_outdated[0].entry.outdated);

    let stats = service.stats().await.unwrap();
    assert_eq!(stats.total_entries, 3);
    assert_eq!(stats.outdated_entries, 1);
    assert_eq!(stats.entries_by_project.get("api-gateway"), Some(&2));
    assert_eq!(stats.entries_by_project.get("web-app"), Some(&1));

    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn rebuilt_index_answers_like_the_original() {
    init_tracing();
    let root = temp_root();

    let original = service_at(&root);
    for (title, content) in [
        ("Cache keys", "cache key naming scheme for sessions"),
        ("Split brain", "etcd quorum loss during network partition"),
        ("Slow joins", "missing index on the orders table"),
    ] {
        original
            .save(memory("api-gateway", Category::Debugging, title, content, &[]))
            .await
            .unwrap();
    }
    let before = original
        .search(SearchRequest::new("etcd quorum loss during network partition debugging"))
        .await
        .unwrap();
    assert_eq!(before[0].entry.title, "Split brain");

    // A fresh service over the same files starts with an empty engine.
    let rebuilt = service_at(&root);
    assert_eq!(rebuilt.reconcile().await.unwrap(), 3);
    assert_eq!(rebuilt.reconcile().await.unwrap(), 0);

    let after = rebuilt
        .search(SearchRequest::new("etcd quorum loss during network partition debugging"))
        .await
        .unwrap();
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(after.iter()) {
        assert_eq!(b.entry.id, a.entry.id);
        assert_eq!(b.score, a.score);
    }

    let _ = std::fs::remove_dir_all(&root);
}
