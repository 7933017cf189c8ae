//! End-to-end tests through the full router, session middleware included.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use petstore::{AppState, Migrator, router};
use petstore_db::{ConnectOpts, DbHandle, SessionProvider};
use sea_orm_migration::MigratorTrait;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Fresh app over a named shared-cache in-memory database, so every pooled
/// connection sees the same data.
async fn app(name: &str) -> Router {
    let dsn = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let db = DbHandle::connect(&dsn, ConnectOpts::default())
        .await
        .expect("connect");
    Migrator::up(db.sea(), None).await.expect("migrate");

    let provider = SessionProvider::new(&db);
    let state = AppState::new("test");
    state.health.set_started();
    router(state, provider)
}

fn req(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("infallible");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

#[tokio::test]
async fn category_crud_roundtrip() {
    let app = app("api_category_crud").await;

    let (status, created) = send(&app, req("POST", "/v1/categories", Some(json!({"name": "dogs"})))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "dogs");
    let id = created["id"].as_str().expect("id").to_owned();

    let (status, fetched) = send(&app, req("GET", &format!("/v1/categories/{id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, _) = send(&app, req("DELETE", &format!("/v1/categories/{id}"), None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, problem) = send(&app, req("GET", &format!("/v1/categories/{id}"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(problem["entity_type"], "Category");
    assert_eq!(problem["id"], id);
}

#[tokio::test]
async fn pet_with_dangling_category_is_rejected() {
    let app = app("api_pet_dangling_fk").await;

    let response = app
        .clone()
        .oneshot(req(
            "POST",
            "/v1/pets",
            Some(json!({"name": "Bella", "category_id": "does-not-exist"})),
        ))
        .await
        .expect("infallible");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("application/problem+json")
    );

    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let problem: Value = serde_json::from_slice(&bytes).expect("problem json");
    assert_eq!(problem["status"], 400);
    assert_eq!(problem["field"], "category_id");
    assert_eq!(problem["value"], "does-not-exist");
    assert_eq!(problem["referenced_entity"], "Category");
}

#[tokio::test]
async fn pet_create_links_category_and_tags() {
    let app = app("api_pet_create_full").await;

    let (_, category) = send(&app, req("POST", "/v1/categories", Some(json!({"name": "cats"})))).await;
    let category_id = category["id"].as_str().expect("id");

    let (status, pet) = send(
        &app,
        req(
            "POST",
            "/v1/pets",
            Some(json!({
                "name": "Maja",
                "category_id": category_id,
                "status": "pending",
                "photo_urls": ["http://img/maja.png"],
                "tags": ["fluffy", "cute", "fluffy"],
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(pet["category"]["name"], "cats");
    assert_eq!(pet["status"], "pending");
    assert_eq!(pet["photo_urls"][0], "http://img/maja.png");

    // Duplicate tag names collapse; output is sorted by name.
    let names: Vec<&str> = pet["tags"]
        .as_array()
        .expect("tags")
        .iter()
        .map(|t| t["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["cute", "fluffy"]);

    let (_, tags) = send(&app, req("GET", "/v1/tags", None)).await;
    assert_eq!(tags["total"], 2);
}

#[tokio::test]
async fn failed_pet_create_rolls_back_upserted_tags() {
    let app = app("api_pet_create_rollback").await;

    // Tag upsert happens before the owner check fails; the rollback must
    // take the tag with it.
    let (status, problem) = send(
        &app,
        req(
            "POST",
            "/v1/pets",
            Some(json!({"name": "Rex", "tags": ["ghost"], "owner_id": "nobody"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(problem["field"], "owner_id");
    assert_eq!(problem["referenced_entity"], "User");

    let (_, tags) = send(&app, req("GET", "/v1/tags", None)).await;
    assert_eq!(tags["total"], 0);
}

#[tokio::test]
async fn duplicate_tag_yields_conflict_problem() {
    let app = app("api_tag_duplicate").await;

    let (status, _) = send(&app, req("POST", "/v1/tags", Some(json!({"name": "cute"})))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, problem) = send(&app, req("POST", "/v1/tags", Some(json!({"name": "cute"})))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(problem["entity_type"], "Tag");
    assert_eq!(problem["field"], "name");
    assert_eq!(problem["value"], "cute");
    assert_eq!(problem["type"], "//localhost/error/duplicate-entity");
}

#[tokio::test]
async fn patch_pet_updates_and_clears_fields() {
    let app = app("api_pet_patch").await;

    let (_, category) = send(&app, req("POST", "/v1/categories", Some(json!({"name": "birds"})))).await;
    let category_id = category["id"].as_str().expect("id");

    let (_, pet) = send(&app, req("POST", "/v1/pets", Some(json!({"name": "Piper"})))).await;
    let pet_id = pet["id"].as_str().expect("id");
    assert!(pet["category"].is_null());

    let (status, patched) = send(
        &app,
        req(
            "PATCH",
            &format!("/v1/pets/{pet_id}"),
            Some(json!({"category_id": category_id, "status": "sold", "tags": ["songbird"]})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["category"]["name"], "birds");
    assert_eq!(patched["status"], "sold");
    assert_eq!(patched["tags"][0]["name"], "songbird");

    // Explicit null clears the reference; absent fields stay as they are.
    let (status, cleared) = send(
        &app,
        req(
            "PATCH",
            &format!("/v1/pets/{pet_id}"),
            Some(json!({"category_id": null})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cleared["category"].is_null());
    assert_eq!(cleared["status"], "sold");
    assert_eq!(cleared["tags"][0]["name"], "songbird");
}

#[tokio::test]
async fn delete_pet_keeps_tags_but_drops_links() {
    let app = app("api_pet_delete").await;

    let (_, pet) = send(
        &app,
        req("POST", "/v1/pets", Some(json!({"name": "Momo", "tags": ["shy"]}))),
    )
    .await;
    let pet_id = pet["id"].as_str().expect("id");

    let (status, body) = send(&app, req("DELETE", &format!("/v1/pets/{pet_id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (status, _) = send(&app, req("GET", &format!("/v1/pets/{pet_id}"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Association rows cascade away; the tag itself survives.
    let (_, tags) = send(&app, req("GET", "/v1/tags", None)).await;
    assert_eq!(tags["total"], 1);
}

#[tokio::test]
async fn deleting_a_referenced_category_is_a_conflict() {
    let app = app("api_category_in_use").await;

    let (_, category) = send(&app, req("POST", "/v1/categories", Some(json!({"name": "fish"})))).await;
    let category_id = category["id"].as_str().expect("id");
    let (status, _) = send(
        &app,
        req(
            "POST",
            "/v1/pets",
            Some(json!({"name": "Bubbles", "category_id": category_id})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, problem) = send(&app, req("DELETE", &format!("/v1/categories/{category_id}"), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(problem["type"], "//localhost/error/conflict");
}

#[tokio::test]
async fn user_responses_never_expose_the_password() {
    let app = app("api_user_password").await;

    let payload = json!({
        "username": "ada",
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": "ada@example.com",
        "password": "s3cret",
    });
    let (status, user) = send(&app, req("POST", "/v1/users", Some(payload))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(user.get("password").is_none());
    assert_eq!(user["username"], "ada");

    let (status, problem) = send(
        &app,
        req(
            "POST",
            "/v1/users",
            Some(json!({
                "username": "ada2",
                "first_name": "A",
                "last_name": "L",
                "email": "ada@example.com",
                "password": "x",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(problem["field"], "email");
    assert_eq!(problem["value"], "ada@example.com");
}

#[tokio::test]
async fn order_requires_existing_pet_and_user() {
    let app = app("api_order").await;

    let (status, problem) = send(
        &app,
        req(
            "POST",
            "/v1/orders",
            Some(json!({"pet_id": "nope", "user_id": "nope"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(problem["field"], "pet_id");
    assert_eq!(problem["referenced_entity"], "Pet");

    let (_, pet) = send(&app, req("POST", "/v1/pets", Some(json!({"name": "Taco"})))).await;
    let (_, user) = send(
        &app,
        req(
            "POST",
            "/v1/users",
            Some(json!({
                "username": "bob",
                "first_name": "Bob",
                "last_name": "B",
                "email": "bob@example.com",
                "password": "pw",
            })),
        ),
    )
    .await;

    let (status, order) = send(
        &app,
        req(
            "POST",
            "/v1/orders",
            Some(json!({"pet_id": pet["id"], "user_id": user["id"]})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["quantity"], 1);
    assert_eq!(order["status"], "placed");
    assert_eq!(order["complete"], false);
}

#[tokio::test]
async fn list_pagination_windows_and_bounds() {
    let app = app("api_pagination").await;

    for name in ["ants", "bees", "cats"] {
        let (status, _) = send(&app, req("POST", "/v1/categories", Some(json!({"name": name})))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, page) = send(&app, req("GET", "/v1/categories?page=2&size=2", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 3);
    assert_eq!(page["page"], 2);
    assert_eq!(page["size"], 2);
    assert_eq!(page["items"].as_array().expect("items").len(), 1);
    assert_eq!(page["items"][0]["name"], "cats");

    let (status, _) = send(&app, req("GET", "/v1/categories?page=0", None)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, req("GET", "/v1/categories?size=101", None)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // A page far past the end of the table is a valid, empty window.
    let path = format!("/v1/categories?page={}&size=100", u64::MAX);
    let (status, page) = send(&app, req("GET", &path, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 3);
    assert!(page["items"].as_array().expect("items").is_empty());
}

#[tokio::test]
async fn empty_names_are_rejected_before_storage() {
    let app = app("api_validation").await;

    let (status, problem) = send(&app, req("POST", "/v1/pets", Some(json!({"name": "  "})))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(problem["field"], "name");
    assert_eq!(problem["type"], "//localhost/error/validation");
}

#[tokio::test]
async fn health_probes_follow_the_lifecycle() {
    let dsn = "sqlite:file:api_health?mode=memory&cache=shared";
    let db = DbHandle::connect(dsn, ConnectOpts::default())
        .await
        .expect("connect");
    Migrator::up(db.sea(), None).await.expect("migrate");
    let state = AppState::new("test");
    let health = state.health.clone();
    let app = router(state, SessionProvider::new(&db));

    let (status, _) = send(&app, req("GET", "/.internal/healthz/liveness", None)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, req("GET", "/.internal/healthz/startup", None)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    health.set_started();
    let (status, body) = send(&app, req("GET", "/.internal/healthz/startup", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("UP".to_owned()));
    let (status, _) = send(&app, req("GET", "/.internal/healthz/readiness", None)).await;
    assert_eq!(status, StatusCode::OK);

    health.set_ready(false);
    let (status, _) = send(&app, req("GET", "/.internal/healthz/readiness", None)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn error_response_survives_a_failed_rollback() {
    use axum::response::IntoResponse;
    use petstore::api::rest::middleware::db_session;
    use petstore_db::current_session;
    use petstore_problem::Problem;
    use sea_orm::ConnectionTrait;

    let dsn = "sqlite:file:api_failed_rollback?mode=memory&cache=shared";
    let db = DbHandle::connect(dsn, ConnectOpts::default())
        .await
        .expect("connect");
    db.sea()
        .execute_unprepared(
            "CREATE TABLE flags (id INTEGER PRIMARY KEY, v TEXT UNIQUE ON CONFLICT ROLLBACK)",
        )
        .await
        .expect("create table");

    // The conflicting insert makes the backend abandon the transaction on its
    // own, so the middleware's rollback finds no active transaction and
    // fails. The handler's conflict body must still reach the client instead
    // of being replaced by an opaque 500.
    async fn conflicting_handler() -> axum::response::Response {
        let session = current_session().expect("session in context");
        session.begin().await.expect("begin");
        session
            .execute_unprepared("INSERT INTO flags (v) VALUES ('x')")
            .await
            .expect("first insert");
        session
            .execute_unprepared("INSERT INTO flags (v) VALUES ('x')")
            .await
            .expect_err("conflicting insert");
        Problem::new(StatusCode::CONFLICT, "Duplicate flag").into_response()
    }

    let app = Router::new()
        .route("/flags", axum::routing::post(conflicting_handler))
        .layer(axum::middleware::from_fn_with_state(
            SessionProvider::new(&db),
            db_session,
        ));

    let (status, problem) = send(&app, req("POST", "/flags", None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(problem["detail"], "Duplicate flag");
}

#[tokio::test]
async fn root_reports_service_identity() {
    let app = app("api_root").await;
    let (status, body) = send(&app, req("GET", "/", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "petstore");
    assert_eq!(body["env"], "test");
}
