//! HTTP-level tests for sign-up, login, logout and the session gate.

mod common;

use axum::http::{header, StatusCode};
use axum::response::Response;
use common::{body_json, build_test_app, create_user, get, post_form, redirect_location};
use sqlx::SqlitePool;

fn session_cookie(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .unwrap()
        .to_string()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_health_needs_no_session(pool: SqlitePool) {
    let response = get(build_test_app(pool), "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_signup_creates_user_and_logs_in(pool: SqlitePool) {
    let response = post_form(
        build_test_app(pool.clone()),
        "/signup",
        None,
        "username=alice&password1=correct+horse&password2=correct+horse",
    )
    .await;
    assert_eq!(redirect_location(&response), "/");
    let cookie = session_cookie(&response);
    assert!(cookie.starts_with("session="));

    let response = get(build_test_app(pool), "/projects", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["user"], "alice");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_signup_rejects_duplicate_username(pool: SqlitePool) {
    create_user(&pool, "alice").await;

    let response = post_form(
        build_test_app(pool.clone()),
        "/signup",
        None,
        "username=alice&password1=correct+horse&password2=correct+horse",
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(
        json["errors"]["username"][0],
        "A user with that username already exists."
    );
    assert!(json["values"].get("password1").is_none());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_sets_session_and_follows_next(pool: SqlitePool) {
    create_user(&pool, "alice").await;

    let response = post_form(
        build_test_app(pool.clone()),
        "/login",
        None,
        "username=alice&password=correct+horse+battery&next=/projects/new",
    )
    .await;
    assert_eq!(redirect_location(&response), "/projects/new");

    let cookie = session_cookie(&response);
    let response = get(build_test_app(pool), "/projects/new", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_with_wrong_password_is_rejected(pool: SqlitePool) {
    create_user(&pool, "alice").await;

    let response = post_form(
        build_test_app(pool),
        "/login",
        None,
        "username=alice&password=wrong",
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let json = body_json(response).await;
    assert!(json["errors"]["__all__"].is_array());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_form_carries_next(pool: SqlitePool) {
    let response = get(build_test_app(pool), "/login?next=/projects", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["values"]["next"], "/projects");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_logout_clears_session_cookie(pool: SqlitePool) {
    let alice = create_user(&pool, "alice").await;

    let response = post_form(build_test_app(pool), "/logout", Some(&alice.cookie), "").await;
    assert_eq!(redirect_location(&response), "/login");
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(cookie.starts_with("session=;"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_bearer_token_is_accepted(pool: SqlitePool) {
    let alice = create_user(&pool, "alice").await;
    let token = alice.cookie.trim_start_matches("session=");

    let request = axum::http::Request::builder()
        .uri("/projects")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(build_test_app(pool), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_tampered_session_redirects_to_login(pool: SqlitePool) {
    let response = get(
        build_test_app(pool),
        "/task/abc",
        Some("session=not-a-token"),
    )
    .await;
    assert_eq!(redirect_location(&response), "/login?next=%2Ftask%2Fabc");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_next_path_survives_login_round_trip(pool: SqlitePool) {
    let response = get(build_test_app(pool.clone()), "/task/a+b%20c", None).await;
    let location = redirect_location(&response);
    assert_eq!(location, "/login?next=%2Ftask%2Fa%2Bb%2520c");

    let response = get(build_test_app(pool), &location, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["values"]["next"], "/task/a+b%20c");
}
