use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use gallerist::{Config, create_app, likes::LikedImagesResponse, session};
use serde_json::json;
use tempfile::TempDir;

const SECRET: &str = "integration-secret";

fn test_config(temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.app.session_secret = SECRET.to_string();
    config.storage.galleries_file = temp_dir.path().join("galleries.toml");
    config.storage.attachments_file = temp_dir.path().join("attachments.toml");
    config.storage.likes_file = temp_dir.path().join("likes.toml");
    config
}

async fn test_server(temp_dir: &TempDir) -> TestServer {
    let app = create_app(test_config(temp_dir)).await.unwrap();
    TestServer::new(app).unwrap()
}

fn cookie_header(pairs: &[String]) -> HeaderValue {
    HeaderValue::from_str(&pairs.join("; ")).unwrap()
}

fn auth(username: &str) -> String {
    session::auth_cookie_pair(SECRET, username).unwrap()
}

fn set_cookies(response: &axum_test::TestResponse) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_toggle_requires_login() {
    let temp_dir = TempDir::new().unwrap();
    let server = test_server(&temp_dir).await;

    let response = server
        .post("/api/likes/toggle")
        .json(&json!({ "image_id": 4 }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "User not logged in.");
    assert!(!temp_dir.path().join("likes.toml").exists());
}

#[tokio::test]
async fn test_toggle_with_forged_cookie_is_anonymous() {
    let temp_dir = TempDir::new().unwrap();
    let server = test_server(&temp_dir).await;

    let forged = session::auth_cookie_pair("some-other-secret", "alice").unwrap();
    let response = server
        .post("/api/likes/toggle")
        .add_header(header::COOKIE, cookie_header(&[forged]))
        .json(&json!({ "image_id": 4 }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_toggle_like_and_unlike() {
    let temp_dir = TempDir::new().unwrap();
    let server = test_server(&temp_dir).await;
    let cookies = cookie_header(&[auth("alice")]);

    let response = server
        .post("/api/likes/toggle")
        .add_header(header::COOKIE, cookies.clone())
        .json(&json!({ "image_id": 4 }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["liked"], true);
    assert_eq!(body["message"], "Image liked successfully.");
    assert!(
        set_cookies(&response)
            .iter()
            .any(|cookie| cookie.starts_with("liked_images=%5B4%5D;"))
    );

    let response = server
        .post("/api/likes/toggle")
        .add_header(header::COOKIE, cookies.clone())
        .json(&json!({ "image_id": 4 }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["liked"], false);
    assert_eq!(body["message"], "Image unliked successfully.");

    let liked: LikedImagesResponse = server
        .get("/api/likes")
        .add_header(header::COOKIE, cookies)
        .await
        .json();
    assert!(liked.logged_in);
    assert!(liked.liked_images.is_empty());
}

#[tokio::test]
async fn test_toggle_rejects_invalid_image() {
    let temp_dir = TempDir::new().unwrap();
    let server = test_server(&temp_dir).await;

    let response = server
        .post("/api/likes/toggle")
        .add_header(header::COOKIE, cookie_header(&[auth("alice")]))
        .json(&json!({ "image_id": -2 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_anonymous_liked_images_are_empty() {
    let temp_dir = TempDir::new().unwrap();
    let server = test_server(&temp_dir).await;

    let response = server
        .get("/api/likes")
        .add_header(
            header::COOKIE,
            cookie_header(&["liked_images=%5B1%2C2%5D".to_string()]),
        )
        .await;

    response.assert_status_ok();
    let liked: LikedImagesResponse = response.json();
    assert!(!liked.logged_in);
    assert!(liked.liked_images.is_empty());
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_page_load_sync_adopts_cookie() {
    let temp_dir = TempDir::new().unwrap();
    let server = test_server(&temp_dir).await;
    let login = auth("alice");

    for id in [1, 2, 3] {
        server
            .post("/api/likes/toggle")
            .add_header(header::COOKIE, cookie_header(&[login.clone()]))
            .json(&json!({ "image_id": id }))
            .await
            .assert_status_ok();
    }

    // The browser unliked 1 and liked 4 while the server was not told
    let response = server
        .get("/api/likes")
        .add_header(
            header::COOKIE,
            cookie_header(&[login.clone(), "liked_images=%5B2%2C3%2C4%5D".to_string()]),
        )
        .await;

    response.assert_status_ok();
    let liked: LikedImagesResponse = response.json();
    let ids: Vec<i64> = liked.liked_images.iter().map(|id| id.0).collect();
    assert_eq!(ids, vec![2, 3, 4]);
    assert!(
        set_cookies(&response)
            .iter()
            .any(|cookie| cookie.starts_with("liked_images=%5B2%2C3%2C4%5D;"))
    );

    // Same set again: nothing to persist, no cookie refresh
    let response = server
        .get("/api/likes")
        .add_header(
            header::COOKIE,
            cookie_header(&[login, "liked_images=%5B4%2C3%2C2%5D".to_string()]),
        )
        .await;
    response.assert_status_ok();
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_malformed_cookie_clears_likes() {
    let temp_dir = TempDir::new().unwrap();
    let server = test_server(&temp_dir).await;
    let login = auth("bob");

    server
        .post("/api/likes/toggle")
        .add_header(header::COOKIE, cookie_header(&[login.clone()]))
        .json(&json!({ "image_id": 8 }))
        .await
        .assert_status_ok();

    let liked: LikedImagesResponse = server
        .get("/api/likes")
        .add_header(
            header::COOKIE,
            cookie_header(&[login, "liked_images=garbage".to_string()]),
        )
        .await
        .json();

    assert!(liked.liked_images.is_empty());
}
