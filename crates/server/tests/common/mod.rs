#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{Duration, NaiveDate};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

use taskmanager_server::{
    app,
    clock::Clock,
    config::Config,
    db::{models::User, Database, UserRepo},
    routes::auth::{create_session, hash_password},
    AppState,
};

pub const PASSWORD: &str = "correct horse battery";

/// Build a test `Config` with a fixed secret and default lifetimes.
pub fn test_config() -> Config {
    Config {
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test-secret".to_string(),
        session_ttl: Duration::hours(1),
        confirm_ttl: Duration::minutes(30),
        secure_cookies: false,
    }
}

/// The date the test clock reports as "today".
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
}

/// Build the full application router over the given pool with a fixed clock.
pub fn build_test_app(pool: SqlitePool) -> Router {
    app(AppState {
        db: Database::from_pool(pool),
        config: test_config(),
        clock: Clock::Fixed(today()),
    })
}

pub struct TestUser {
    pub user: User,
    pub cookie: String,
}

/// Insert a user directly and mint a session cookie for it.
pub async fn create_user(pool: &SqlitePool, username: &str) -> TestUser {
    let hash = hash_password(PASSWORD).unwrap();
    let user = UserRepo::create(pool, username, &hash).await.unwrap();
    let token = create_session(&user, &test_config()).unwrap();
    TestUser {
        cookie: format!("session={token}"),
        user,
    }
}

pub async fn status_id(pool: &SqlitePool, name: &str) -> String {
    sqlx::query_scalar("SELECT id FROM statuses WHERE name = ?")
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("seeded status")
}

pub async fn get(app: Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_form(app: Router, uri: &str, cookie: Option<&str>, body: &str) -> Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert a 303 redirect and return its target.
pub fn redirect_location(response: &Response) -> String {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string()
}

/// Create a project through the HTTP form and return its id.
pub async fn create_project(pool: &SqlitePool, owner: &TestUser, name: &str, members: &[&User]) -> String {
    let mut body = format!("name={}", name.replace(' ', "+"));
    for member in members {
        body.push_str(&format!("&members={}", member.id));
    }

    let response = post_form(
        build_test_app(pool.clone()),
        "/projects/new",
        Some(&owner.cookie),
        &body,
    )
    .await;
    assert_eq!(redirect_location(&response), "/projects");

    let id: String = sqlx::query_scalar("SELECT id FROM projects WHERE name = ?")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap();
    id
}

/// Create a task through the HTTP form and return its id.
pub async fn create_task(
    pool: &SqlitePool,
    user: &TestUser,
    project_id: &str,
    name: &str,
    assigned: &User,
) -> String {
    let status = status_id(pool, "Open").await;
    let body = format!(
        "name={}&start_date=2024-01-01&end_date=2024-01-15&assigned={}&status={}",
        name.replace(' ', "+"),
        assigned.id,
        status
    );

    let response = post_form(
        build_test_app(pool.clone()),
        &format!("/task/new/{project_id}"),
        Some(&user.cookie),
        &body,
    )
    .await;
    assert_eq!(redirect_location(&response), format!("/projects/{project_id}"));

    let id: String = sqlx::query_scalar("SELECT id FROM tasks WHERE project_id = ? AND name = ?")
        .bind(project_id)
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap();
    id
}
