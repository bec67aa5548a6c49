//! Admin API flows over the in-process store.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};

use cbm_backend::services::auth_service::Claims;
use common::{at, test_config, TestContext, ADMIN_USERNAME, JWT_SECRET};

fn fields(body: &Value) -> Vec<String> {
    body["fields"]
        .as_array()
        .map(|fields| {
            fields
                .iter()
                .filter_map(|f| f["field"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn backup_body(node_id: i64, start: &str, end: Option<&str>) -> Value {
    json!({
        "node_id": node_id,
        "start_time": start,
        "end_time": end,
        "backup_path": "/backups/db-a/20240101",
        "status": "success",
        "backup_size": 2048,
        "compressed_size": 1024,
    })
}

#[tokio::test]
async fn test_admin_routes_require_a_token() {
    let ctx = TestContext::new(at(2024, 1, 1, 0, 0));

    let (status, body) = ctx.json(Method::GET, "/admin/clusters", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "AUTH_ERROR");

    let (status, _) = ctx
        .json(Method::GET, "/admin/clusters", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let response = tower::ServiceExt::oneshot(
        ctx.app.clone(),
        Request::get("/admin/clusters").body(Body::empty()).unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
}

#[tokio::test]
async fn test_non_admin_token_is_forbidden() {
    let ctx = TestContext::new(at(2024, 1, 1, 0, 0));
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: "viewer".into(),
        is_admin: false,
        iat: now,
        exp: now + 600,
        token_type: "access".into(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();

    let (status, body) = ctx
        .json(Method::GET, "/admin/clusters", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let ctx = TestContext::new(at(2024, 1, 1, 0, 0));

    let (status, _) = ctx
        .json(
            Method::POST,
            "/admin/login",
            None,
            Some(json!({"username": ADMIN_USERNAME, "password": "wrong"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .json(
            Method::POST,
            "/admin/login",
            None,
            Some(json!({"username": "", "password": ""})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_disabled_without_password_hash() {
    let mut config = test_config();
    config.admin_password_hash = None;
    let ctx = TestContext::with_config(config, at(2024, 1, 1, 0, 0));

    let (status, body) = ctx
        .json(
            Method::POST,
            "/admin/login",
            None,
            Some(json!({"username": ADMIN_USERNAME, "password": "anything"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Admin login is disabled");
}

#[tokio::test]
async fn test_login_is_rate_limited() {
    let ctx = TestContext::new(at(2024, 1, 1, 0, 0));
    let attempt = || {
        ctx.json(
            Method::POST,
            "/admin/login",
            None,
            Some(json!({"username": ADMIN_USERNAME, "password": "guess"})),
        )
    };

    for _ in 0..10 {
        let (status, _) = attempt().await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, body) = attempt().await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "RATE_LIMITED");
}

#[tokio::test]
async fn test_cluster_crud() {
    let ctx = TestContext::new(at(2024, 1, 1, 0, 0));
    let token = ctx.login().await;
    let token = Some(token.as_str());

    let (status, created) = ctx
        .json(Method::POST, "/admin/clusters", token, Some(json!({"name": "prod-1"})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["name"], "prod-1");

    let (status, fetched) = ctx
        .json(Method::GET, &format!("/admin/clusters/{id}"), token, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    ctx.clock.advance(chrono::Duration::hours(1));
    let (status, updated) = ctx
        .json(
            Method::PUT,
            &format!("/admin/clusters/{id}"),
            token,
            Some(json!({"name": "prod-2"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "prod-2");
    assert_eq!(updated["inserted_at"], created["inserted_at"]);
    assert_ne!(updated["updated_at"], created["updated_at"]);

    let (status, listed) = ctx
        .json(Method::GET, "/admin/clusters?q=PROD", token, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["items"].as_array().unwrap().len(), 1);
    assert_eq!(listed["pagination"]["total"], 1);

    let (status, _) = ctx
        .json(Method::GET, "/admin/clusters/999", token, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_cluster_name_is_rejected() {
    let ctx = TestContext::new(at(2024, 1, 1, 0, 0));
    let token = ctx.login().await;
    let token = Some(token.as_str());

    ctx.json(Method::POST, "/admin/clusters", token, Some(json!({"name": "prod-1"})))
        .await;
    let (status, body) = ctx
        .json(Method::POST, "/admin/clusters", token, Some(json!({"name": "prod-1"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(fields(&body), vec!["name"]);
}

#[tokio::test]
async fn test_node_validation() {
    let ctx = TestContext::new(at(2024, 1, 1, 0, 0));
    let token = ctx.login().await;
    let token = Some(token.as_str());

    let (status, body) = ctx
        .json(
            Method::POST,
            "/admin/nodes",
            token,
            Some(json!({"cluster_id": 1, "name": " ", "db_type": "postgres", "port": 0})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(fields(&body), vec!["name", "port"]);

    let (status, body) = ctx
        .json(
            Method::POST,
            "/admin/nodes",
            token,
            Some(json!({"cluster_id": 42, "name": "db-a", "db_type": "postgres", "port": 5432})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(fields(&body), vec!["cluster_id"]);
}

#[tokio::test]
async fn test_backup_ending_before_start_is_never_stored() {
    let ctx = TestContext::new(at(2024, 1, 2, 0, 0));
    let (_, node_id, _) = ctx.seed_prod1().await;
    let token = ctx.login().await;

    let (status, body) = ctx
        .json(
            Method::POST,
            "/admin/backups",
            Some(&token),
            Some(backup_body(
                node_id.into(),
                "2024-01-01T01:00:00Z",
                Some("2024-01-01T00:00:00Z"),
            )),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(fields(&body), vec!["end_time"]);

    let (_, listed) = ctx.get_json("/api/v1/backups").await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_backup_round_trip_through_reports() {
    let ctx = TestContext::new(at(2024, 1, 2, 0, 0));
    let (_, node_id, _) = ctx.seed_prod1().await;
    let token = ctx.login().await;

    let (status, created) = ctx
        .json(
            Method::POST,
            "/admin/backups",
            Some(&token),
            Some(backup_body(node_id.into(), "2024-01-01T12:00:00Z", None)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created["end_time"].is_null());

    let (_, listed) = ctx.get_json("/api/v1/backups").await;
    let newest = &listed[0];
    assert_eq!(newest["id"], created["id"]);
    for field in [
        "node_id",
        "start_time",
        "end_time",
        "backup_path",
        "status",
        "backup_size",
        "compressed_size",
    ] {
        assert_eq!(newest[field], created[field], "{field} differs");
    }

    // A running backup renders a placeholder end time.
    let (_, html) = ctx.get("/backup").await;
    assert!(html.contains("<td>—</td>"));
}

#[tokio::test]
async fn test_backup_search_filters() {
    let ctx = TestContext::new(at(2024, 2, 1, 0, 0));
    let (_, node_id, _) = ctx.seed_prod1().await;
    ctx.add_backup(node_id, at(2024, 1, 20, 0, 0), "failed").await;
    let token = ctx.login().await;

    let (_, body) = ctx
        .json(Method::GET, "/admin/backups?q=FAILED", Some(&token), None)
        .await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let (_, body) = ctx
        .json(
            Method::GET,
            "/admin/backups?start_from=2024-01-10T00:00:00Z",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["status"], "failed");
}

#[tokio::test]
async fn test_cluster_delete_cascades() {
    let ctx = TestContext::new(at(2024, 1, 2, 0, 0));
    let (cluster_id, node_id, _) = ctx.seed_prod1().await;
    ctx.add_backup(node_id, at(2024, 1, 1, 12, 0), "success").await;
    let token = ctx.login().await;

    let (status, body) = ctx
        .json(
            Method::DELETE,
            &format!("/admin/clusters/{cluster_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], json!({"clusters": 1, "nodes": 1, "backups": 2}));

    let (_, nodes) = ctx.get_json("/api/v1/nodes").await;
    assert!(nodes.as_array().unwrap().is_empty());
    let (_, backups) = ctx.get_json("/api/v1/backups").await;
    assert!(backups.as_array().unwrap().is_empty());

    let (status, _) = ctx
        .json(
            Method::DELETE,
            &format!("/admin/clusters/{cluster_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_node_delete_keeps_cluster() {
    let ctx = TestContext::new(at(2024, 1, 2, 0, 0));
    let (_, node_id, _) = ctx.seed_prod1().await;
    let token = ctx.login().await;

    let (status, body) = ctx
        .json(Method::DELETE, &format!("/admin/nodes/{node_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], json!({"clusters": 0, "nodes": 1, "backups": 1}));

    let (_, clusters) = ctx.get_json("/api/v1/clusters").await;
    assert_eq!(clusters.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_admin_reports_store_outage() {
    let ctx = TestContext::new(at(2024, 1, 1, 0, 0));
    let token = ctx.login().await;
    ctx.store.set_available(false);

    let (status, body) = ctx
        .json(Method::POST, "/admin/clusters", Some(&token), Some(json!({"name": "prod-1"})))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "STORE_UNAVAILABLE");
}
