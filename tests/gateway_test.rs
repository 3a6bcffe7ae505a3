//! CRUD门面集成测试（内存适配器）

use cfx_mongodb::{
    doc, Bson, ChannelNotifier, ConnectionConfig, ConnectionConfigBuilder, ConnectionManager,
    ConnectionOptions, CrudGateway, Document, FindOptions, MemoryAdapter, ObjectId,
    NOT_CONNECTED_MESSAGE,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

const TEST_URI: &str = "mongodb://localhost:27017/redm_test";

fn setup() -> (MemoryAdapter, CrudGateway) {
    cfx_mongodb::init();
    let adapter = MemoryAdapter::new();
    let manager = ConnectionManager::new(
        Arc::new(adapter.clone()),
        ConnectionConfig::new(TEST_URI, ConnectionOptions::default()),
    );
    (adapter, CrudGateway::new(Arc::new(manager)))
}

async fn connected() -> (MemoryAdapter, CrudGateway) {
    let (adapter, gateway) = setup();
    assert_ok!(gateway.manager().connect(None).await);
    (adapter, gateway)
}

fn inserted_id(response: &cfx_mongodb::InsertResponse) -> Bson {
    response.body().expect("插入应当成功").inserted_id.clone()
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Player {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    level: i32,
}

#[tokio::test]
async fn test_every_data_operation_fails_when_disconnected() {
    let (adapter, gateway) = setup();

    let insert = gateway.insert("users", &doc! { "name": "a" }).await;
    let find = gateway.find_many::<Document>("users", doc! {}, FindOptions::default()).await;
    let find_one = gateway.find_one::<Document>("users", doc! {}).await;
    let update = gateway.update("users", doc! {}, doc! { "level": 1 }).await;
    let delete = gateway.delete("users", doc! {}).await;
    let count = gateway.count("users", doc! {}).await;

    assert_eq!(insert.error(), Some(NOT_CONNECTED_MESSAGE));
    assert_eq!(find.error(), Some(NOT_CONNECTED_MESSAGE));
    assert_eq!(find_one.error(), Some(NOT_CONNECTED_MESSAGE));
    assert_eq!(update.error(), Some(NOT_CONNECTED_MESSAGE));
    assert_eq!(delete.error(), Some(NOT_CONNECTED_MESSAGE));
    assert_eq!(count.error(), Some(NOT_CONNECTED_MESSAGE));
    assert_eq!(
        serde_json::to_value(&count).unwrap(),
        json!({ "success": false, "error": "Database not connected" })
    );

    // 没有任何驱动调用
    assert_eq!(adapter.operation_count(), 0);
    assert_eq!(adapter.connect_count(), 0);
}

#[tokio::test]
async fn test_connect_twice_is_idempotent() {
    let (adapter, gateway) = connected().await;
    let first = gateway.manager().get_handle().unwrap();

    assert_ok!(gateway.manager().connect(None).await);
    let second = gateway.manager().get_handle().unwrap();

    assert!(gateway.is_connected());
    assert_eq!(adapter.connect_count(), 1);
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn test_connect_with_new_config_switches_handle() {
    let (adapter, gateway) = connected().await;
    assert!(gateway.insert("users", &doc! { "name": "old" }).await.is_success());

    let config = ConnectionConfig::new("mongodb://localhost:27017/redm_prod", ConnectionOptions::default());
    assert_ok!(gateway.manager().connect(Some(config)).await);
    assert_eq!(adapter.close_count(), 1);

    assert!(gateway.insert("users", &doc! { "name": "new" }).await.is_success());
    assert_eq!(adapter.documents("redm_test", "users").len(), 1);
    assert_eq!(adapter.documents("redm_prod", "users").len(), 1);
    assert_eq!(gateway.manager().status().database_name.as_deref(), Some("redm_prod"));
}

#[tokio::test]
async fn test_failed_reconnect_leaves_manager_disconnected() {
    let (adapter, gateway) = connected().await;
    assert!(gateway.insert("users", &doc! { "name": "old" }).await.is_success());

    adapter.fail_next_connect("connection refused");
    let config = ConnectionConfig::new("mongodb://localhost:27017/redm_prod", ConnectionOptions::default());
    assert_err!(gateway.manager().connect(Some(config)).await);

    // 旧连接已关闭，新配置已保存
    assert!(!gateway.is_connected());
    assert!(gateway.manager().get_handle().is_none());
    assert_eq!(adapter.close_count(), 1);
    assert_eq!(gateway.manager().config().connection_string, "mongodb://localhost:27017/redm_prod");

    let count = gateway.count("users", doc! {}).await;
    assert_eq!(count.error(), Some(NOT_CONNECTED_MESSAGE));

    // 再次连接使用新配置
    assert_ok!(gateway.manager().connect(None).await);
    assert_eq!(gateway.manager().status().database_name.as_deref(), Some("redm_prod"));
}

#[test]
fn test_repeated_init_keeps_errors_usable() {
    cfx_mongodb::init();
    cfx_mongodb::init();

    let err = ConnectionConfigBuilder::new().connection_string("postgres://x").build();
    assert!(err.unwrap_err().to_string().contains("postgres://x"));
    assert_err!(ConnectionOptions::from_json(json!({ "maxPoolSize": "x" })));
}

#[tokio::test]
async fn test_inc_overflow_fails_without_changes() {
    let (_adapter, gateway) = connected().await;
    gateway.insert("users", &doc! { "name": "a", "gold": i64::MAX }).await;

    let response = gateway.update("users", doc! { "name": "a" }, doc! { "$inc": { "gold": 1_i64 } }).await;
    assert!(!response.is_success());
    assert!(response.error().unwrap().contains("overflow"));

    let player = gateway.find_one::<Document>("users", doc! { "name": "a" }).await;
    assert_eq!(player.into_result().unwrap().data.get_i64("gold").unwrap(), i64::MAX);
}

#[tokio::test]
async fn test_admin_connect_applies_options_without_url() {
    let (adapter, gateway) = connected().await;

    let options = ConnectionOptions {
        server_selection_timeout_ms: Some(1000),
        ..ConnectionOptions::default()
    };
    assert_ok!(gateway.connect("7", None, options).await);
    assert_eq!(adapter.connect_count(), 2);
    assert_eq!(gateway.manager().config().connection_string, TEST_URI);
    assert_eq!(gateway.manager().config().options.server_selection_timeout_ms, Some(1000));

    // 默认选项且已连接时不重连
    assert_ok!(gateway.connect("7", Some(String::new()), ConnectionOptions::default()).await);
    assert_eq!(adapter.connect_count(), 2);
}

#[tokio::test]
async fn test_read_results_present_string_ids() {
    let (_adapter, gateway) = connected().await;
    let native = gateway.insert("users", &doc! { "name": "native", "level": 1 }).await;
    assert!(matches!(inserted_id(&native), Bson::ObjectId(_)));
    gateway.insert("users", &doc! { "_id": 42, "name": "numeric", "level": 2 }).await;
    gateway.insert("users", &doc! { "_id": "custom", "name": "text", "level": 3 }).await;

    let many = gateway
        .find_many::<Document>("users", doc! {}, FindOptions::default())
        .await
        .into_result()
        .expect("查询应当成功")
        .data;
    assert_eq!(many.len(), 3);
    for document in &many {
        assert!(matches!(document.get("_id"), Some(Bson::String(_))), "{:?}", document);
    }
    assert_eq!(many[1].get_str("_id").unwrap(), "42");
    assert_eq!(many[2].get_str("_id").unwrap(), "custom");

    let one = gateway.find_one::<Document>("users", doc! { "name": "native" }).await;
    let Bson::ObjectId(oid) = inserted_id(&native) else { unreachable!() };
    assert_eq!(one.body().unwrap().data.get_str("_id").unwrap(), oid.to_hex());
}

#[tokio::test]
async fn test_typed_documents_round_through_gateway() {
    let (_adapter, gateway) = connected().await;
    let player = Player { id: None, name: "Arthur".into(), level: 7 };
    assert!(gateway.insert("players", &player).await.is_success());

    let found = gateway.find_one::<Player>("players", doc! { "name": "Arthur" }).await;
    let found = found.into_result().expect("应当找到文档").data;
    assert_eq!(found.name, "Arthur");
    assert_eq!(found.level, 7);
    assert!(ObjectId::parse_str(found.id.unwrap()).is_ok());
}

#[tokio::test]
async fn test_plain_update_equals_set_update() {
    let (adapter, gateway) = connected().await;
    gateway.insert("users", &doc! { "name": "a", "level": 1 }).await;

    gateway.update("users", doc! { "name": "a" }, doc! { "level": 10 }).await;
    let plain = adapter.last_update();
    gateway.update("users", doc! { "name": "a" }, doc! { "$set": { "level": 10 } }).await;
    let explicit = adapter.last_update();

    assert_eq!(plain, Some(doc! { "$set": { "level": 10 } }));
    assert_eq!(plain, explicit);
}

#[tokio::test]
async fn test_update_merges_fields() {
    let (adapter, gateway) = connected().await;
    gateway.insert("users", &doc! { "name": "a", "level": 1, "gold": 5 }).await;

    let response = gateway
        .update("users", doc! { "name": "a" }, doc! { "level": 2, "title": "Deputy" })
        .await;
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({ "success": true, "matchedCount": 1, "modifiedCount": 1 })
    );

    let stored = &adapter.documents("redm_test", "users")[0];
    assert_eq!(stored.get_i32("gold").unwrap(), 5);
    assert_eq!(stored.get_i32("level").unwrap(), 2);
    assert_eq!(stored.get_str("title").unwrap(), "Deputy");
}

#[tokio::test]
async fn test_update_without_match_reports_zero_counts() {
    let (_adapter, gateway) = connected().await;
    let response = gateway.update("users", doc! { "name": "ghost" }, doc! { "level": 2 }).await;
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({ "success": true, "matchedCount": 0, "modifiedCount": 0 })
    );
}

#[tokio::test]
async fn test_delete_reports_not_found_and_single_delete() {
    let (_adapter, gateway) = connected().await;
    let missing = gateway.delete("users", doc! { "name": "ghost" }).await;
    assert_eq!(
        serde_json::to_value(&missing).unwrap(),
        json!({ "success": false, "error": "Document not found" })
    );

    gateway.insert("users", &doc! { "name": "a" }).await;
    let deleted = gateway.delete("users", doc! { "name": "a" }).await;
    assert_eq!(
        serde_json::to_value(&deleted).unwrap(),
        json!({ "success": true, "deletedCount": 1 })
    );
}

#[tokio::test]
async fn test_full_crud_scenario() {
    let (_adapter, gateway) = connected().await;

    let inserted = gateway.insert("users", &doc! { "name": "testUser", "level": 1 }).await;
    assert!(inserted.is_success());
    let id = inserted_id(&inserted);
    let Bson::ObjectId(oid) = id.clone() else { panic!("主键应当是ObjectId") };

    let found = gateway
        .find_many::<Document>("users", doc! { "name": "testUser" }, FindOptions::default())
        .await;
    assert_eq!(
        serde_json::to_value(&found).unwrap(),
        json!({ "success": true, "data": [ { "_id": oid.to_hex(), "name": "testUser", "level": 1 } ] })
    );

    // 脚本侧拿到的是字符串形式的主键
    let updated = gateway
        .update("users", doc! { "_id": oid.to_hex() }, doc! { "level": 10 })
        .await;
    assert_eq!(
        serde_json::to_value(&updated).unwrap(),
        json!({ "success": true, "matchedCount": 1, "modifiedCount": 1 })
    );

    let deleted = gateway.delete("users", doc! { "_id": id.clone() }).await;
    assert_eq!(
        serde_json::to_value(&deleted).unwrap(),
        json!({ "success": true, "deletedCount": 1 })
    );

    let after = gateway.find_one::<Document>("users", doc! { "_id": id }).await;
    assert_eq!(
        serde_json::to_value(&after).unwrap(),
        json!({ "success": false, "error": "Document not found" })
    );
}

#[tokio::test]
async fn test_count_on_empty_collection() {
    let (_adapter, gateway) = connected().await;
    let count = gateway.count("users", doc! {}).await;
    assert_eq!(serde_json::to_value(&count).unwrap(), json!({ "success": true, "data": 0 }));

    gateway.insert("users", &doc! { "level": 1 }).await;
    gateway.insert("users", &doc! { "level": 5 }).await;
    let count = gateway.count("users", doc! { "level": { "$gt": 2 } }).await;
    assert_eq!(count.body().unwrap().data, 1);
}

#[tokio::test]
async fn test_is_connected_tracks_lifecycle() {
    let (_adapter, gateway) = setup();
    assert!(!gateway.is_connected());

    for _ in 0..2 {
        assert_ok!(gateway.manager().connect(None).await);
        assert!(gateway.is_connected());
        assert_ok!(gateway.manager().disconnect().await);
        assert!(!gateway.is_connected());
    }
    assert_ok!(gateway.manager().disconnect().await);
    assert!(!gateway.is_connected());
}

#[tokio::test]
async fn test_operations_after_disconnect_fail_cleanly() {
    let (adapter, gateway) = connected().await;
    assert_ok!(gateway.manager().disconnect().await);
    let before = adapter.operation_count();

    let response = gateway.count("users", doc! {}).await;
    assert_eq!(response.error(), Some(NOT_CONNECTED_MESSAGE));
    assert_eq!(adapter.operation_count(), before);
}

#[tokio::test]
async fn test_driver_errors_become_failure_envelopes() {
    let (_adapter, gateway) = connected().await;
    assert!(gateway.insert("users", &doc! { "_id": "dup" }).await.is_success());

    let duplicate = gateway.insert("users", &doc! { "_id": "dup" }).await;
    assert!(duplicate.error().unwrap().contains("E11000"));

    let bad_filter = gateway.count("users", doc! { "level": { "$near": 1 } }).await;
    assert!(!bad_filter.is_success());
}

#[tokio::test]
async fn test_find_options_are_applied() {
    let (_adapter, gateway) = connected().await;
    for level in [4, 2, 9, 1] {
        gateway.insert("users", &doc! { "level": level }).await;
    }

    let options = FindOptions {
        sort: Some(doc! { "level": 1 }),
        limit: Some(2),
        projection: Some(doc! { "_id": 0 }),
        ..FindOptions::default()
    };
    let data = gateway
        .find_many::<Document>("users", doc! {}, options)
        .await
        .into_result()
        .unwrap()
        .data;
    assert_eq!(data, vec![doc! { "level": 1 }, doc! { "level": 2 }]);
}

#[tokio::test]
async fn test_admin_connect_and_disconnect_emit_events() {
    let (adapter, gateway) = setup();
    let (notifier, mut events) = ChannelNotifier::channel();
    let gateway = CrudGateway::with_notifier(gateway.manager().clone(), Arc::new(notifier));

    assert_ok!(
        gateway
            .connect("12", Some("mongodb://localhost:27017/redm_live".into()), ConnectionOptions::default())
            .await
    );
    let event = events.recv().await.unwrap();
    assert_eq!(event.name, "cfx-mongodb:connected");
    assert_eq!(event.target, "12");
    assert!(event.success);
    assert_eq!(gateway.manager().config().connection_string, "mongodb://localhost:27017/redm_live");

    assert_ok!(gateway.disconnect("12").await);
    let event = events.recv().await.unwrap();
    assert_eq!(event.name, "cfx-mongodb:disconnected");
    assert!(event.success);

    adapter.fail_next_connect("connection refused");
    assert_err!(gateway.connect("12", None, ConnectionOptions::default()).await);
    let event = events.recv().await.unwrap();
    assert!(!event.success);
    assert_eq!(event.error.as_deref(), Some("connection refused"));
    assert!(!gateway.is_connected());
}

#[tokio::test]
async fn test_list_collections() {
    let (_adapter, gateway) = setup();
    assert!(gateway.list_collections().await.is_empty());

    gateway.manager().connect(None).await.unwrap();
    gateway.insert("users", &doc! { "a": 1 }).await;
    gateway.insert("horses", &doc! { "a": 1 }).await;
    assert_eq!(gateway.list_collections().await, vec!["horses".to_string(), "users".to_string()]);
}
