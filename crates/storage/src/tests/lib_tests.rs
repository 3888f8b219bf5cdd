use shared::domain::ItemId;

use crate::Storage;

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn new_items_go_in_front() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let a = storage.create_item("first", "").await.expect("item a");
    let b = storage.create_item("second", "").await.expect("item b");
    let c = storage.create_item("third", "").await.expect("item c");

    let items = storage.list_items().await.expect("list");
    let ids: Vec<ItemId> = items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![c, b, a]);
}

#[tokio::test]
async fn loads_stored_content() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let id = storage
        .create_item("groceries", "milk, eggs")
        .await
        .expect("item");

    let item = storage
        .load_item(id)
        .await
        .expect("load")
        .expect("item exists");
    assert_eq!(item.title, "groceries");
    assert_eq!(item.body, "milk, eggs");
}

#[tokio::test]
async fn load_returns_none_for_unknown_id() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let missing = storage.load_item(ItemId(999)).await.expect("load");
    assert!(missing.is_none());
}

#[tokio::test]
async fn update_edits_content_and_keeps_position() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let a = storage.create_item("a", "").await.expect("a");
    let b = storage.create_item("b", "").await.expect("b");

    let updated = storage
        .update_item(a, "a2", "edited")
        .await
        .expect("update");
    assert!(updated);

    let items = storage.list_items().await.expect("list");
    let ids: Vec<ItemId> = items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![b, a]);
    assert_eq!(items[1].title, "a2");
    assert_eq!(items[1].body, "edited");
}

#[tokio::test]
async fn update_reports_unknown_id() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let updated = storage
        .update_item(ItemId(999), "x", "y")
        .await
        .expect("update");
    assert!(!updated);
}

#[tokio::test]
async fn reorder_moves_item_between_neighbors() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let a = storage.create_item("a", "").await.expect("a");
    let b = storage.create_item("b", "").await.expect("b");
    let c = storage.create_item("c", "").await.expect("c");
    // list is now [c, b, a]

    storage
        .reorder_item(Some(c), a, Some(b))
        .await
        .expect("reorder");

    let ids: Vec<ItemId> = storage
        .list_items()
        .await
        .expect("list")
        .iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(ids, vec![c, a, b]);
}

#[tokio::test]
async fn reorder_moves_item_to_front() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let a = storage.create_item("a", "").await.expect("a");
    let b = storage.create_item("b", "").await.expect("b");
    let c = storage.create_item("c", "").await.expect("c");
    // [c, b, a]

    storage
        .reorder_item(None, a, Some(c))
        .await
        .expect("reorder");

    let ids: Vec<ItemId> = storage
        .list_items()
        .await
        .expect("list")
        .iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(ids, vec![a, c, b]);
}

#[tokio::test]
async fn reorder_moves_item_to_back() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let a = storage.create_item("a", "").await.expect("a");
    let b = storage.create_item("b", "").await.expect("b");
    let c = storage.create_item("c", "").await.expect("c");
    // [c, b, a]

    storage
        .reorder_item(Some(a), c, None)
        .await
        .expect("reorder");

    let ids: Vec<ItemId> = storage
        .list_items()
        .await
        .expect("list")
        .iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(ids, vec![b, a, c]);
}

#[tokio::test]
async fn reorder_without_neighbors_is_a_noop() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let only = storage.create_item("only", "").await.expect("only");

    storage
        .reorder_item(None, only, None)
        .await
        .expect("reorder");

    let ids: Vec<ItemId> = storage
        .list_items()
        .await
        .expect("list")
        .iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(ids, vec![only]);
}

#[tokio::test]
async fn reorder_rejects_unknown_ids() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let a = storage.create_item("a", "").await.expect("a");

    assert!(storage.reorder_item(None, ItemId(999), None).await.is_err());
    assert!(storage
        .reorder_item(Some(ItemId(999)), a, None)
        .await
        .is_err());
}

#[tokio::test]
async fn repeated_front_moves_keep_generating_distinct_keys() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let a = storage.create_item("a", "").await.expect("a");
    let b = storage.create_item("b", "").await.expect("b");
    // [b, a]

    // bounce the back item to the front a few dozen times; keys must keep
    // subdividing without collisions (the unique index would refuse)
    for _ in 0..32 {
        let ids: Vec<ItemId> = storage
            .list_items()
            .await
            .expect("list")
            .iter()
            .map(|i| i.id)
            .collect();
        let (front, back) = (ids[0], ids[1]);
        storage
            .reorder_item(None, back, Some(front))
            .await
            .expect("reorder");
    }

    let items = storage.list_items().await.expect("list");
    assert_eq!(items.len(), 2);
    assert!(items.iter().any(|i| i.id == a));
    assert!(items.iter().any(|i| i.id == b));
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("orderboard_storage_test_{suffix}"));
    let db_path = temp_root.join("nested").join("items.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    std::fs::remove_dir_all(temp_root).expect("cleanup");
}
