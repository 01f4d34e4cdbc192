// Integration tests for Book Portal
//
// These tests drive the full router: access gate, sign-in callbacks,
// cookie writes and the book API views against a mock remote API.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use clap::Parser;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use book_portal::{
    config::{CliArgs, Config},
    routes::{self, AppState},
};

// ==================================================================================================
// Test Helpers
// ==================================================================================================

/// Build the app against the given book API and identity provider URLs
fn create_test_app(book_api_url: &str, auth_url: &str) -> Router {
    let config = Config::from_args(CliArgs::parse_from([
        "book-portal",
        "--book-api-url",
        book_api_url,
        "--primary-auth-url",
        auth_url,
        "--add-book-auth-url",
        auth_url,
        "--public-url",
        "http://portal.test",
    ]));
    let state = AppState::new(config).expect("Failed to create app state");
    routes::app(state)
}

fn create_offline_app() -> Router {
    create_test_app("http://127.0.0.1:9", "https://id.example.com")
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, cookie: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("missing Location header")
        .to_str()
        .unwrap()
        .to_string()
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// Turn Set-Cookie values into the Cookie header a browser would send next
fn cookie_header(set_cookies: &[String]) -> String {
    set_cookies
        .iter()
        .filter_map(|c| c.split(';').next())
        .collect::<Vec<_>>()
        .join("; ")
}

async fn body_text(response: Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

// ==================================================================================================
// Access Gate
// ==================================================================================================

#[tokio::test]
async fn test_public_paths_without_session() {
    let app = create_offline_app();

    for uri in ["/login", "/health"] {
        let response = app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
    }

    // Callback path is public even though there is nothing to consume
    let response = app.oneshot(get("/auth/callback", None)).await.unwrap();
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_protected_paths_redirect_to_login() {
    let app = create_offline_app();

    for uri in ["/", "/get-book", "/borrow-book", "/return-book", "/add-book"] {
        let response = app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{}", uri);
        assert_eq!(location(&response), "/login", "{}", uri);
    }
}

#[tokio::test]
async fn test_form_post_without_session_lands_on_login() {
    let app = create_offline_app();

    let request = Request::builder()
        .method("POST")
        .uri("/borrow-book")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"bookId":"1","username":"ana"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_login_with_session_goes_home() {
    let app = create_offline_app();

    let response = app
        .oneshot(get("/login", Some("auth_token=abc")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_login_page_links_primary_provider() {
    let app = create_offline_app();

    let response = app.oneshot(get("/login", None)).await.unwrap();
    let html = body_text(response).await;
    assert!(html.contains("https://id.example.com/login?client_id=3ejtntva2t08gh0a8kucibqdit"));
    assert!(html.contains("redirect_uri=http%3A%2F%2Fportal.test%2Fauth%2Fcallback"));
}

// ==================================================================================================
// Primary Sign-in
// ==================================================================================================

#[tokio::test]
async fn test_sign_in_then_borrow_page() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/books")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"id":"1","title":"Dune","author":"Frank Herbert"}]"#)
        .create_async()
        .await;
    let app = create_test_app(&server.url(), "https://id.example.com");

    // Fresh browser is sent to sign in
    let response = app
        .clone()
        .oneshot(get("/borrow-book", None))
        .await
        .unwrap();
    assert_eq!(location(&response), "/login");

    // Provider returns with a code
    let response = app
        .clone()
        .oneshot(get("/auth/callback?code=XYZ", None))
        .await
        .unwrap();
    assert_eq!(location(&response), "/");
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("auth_token=XYZ;"));
    assert!(cookies[0].contains("Max-Age=3600"));
    assert!(cookies[0].contains("HttpOnly"));

    // The stored credential now opens the page
    let response = app
        .oneshot(get("/borrow-book", Some(&cookie_header(&cookies))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let value = body_json(response).await;
    assert_eq!(value["books"][0]["title"], "Dune");
    assert_eq!(value["borrow_days"], serde_json::json!([7, 14, 30]));
}

#[tokio::test]
async fn test_callback_error_shows_message_and_writes_nothing() {
    let app = create_offline_app();

    let response = app
        .oneshot(get(
            "/auth/callback?error=access_denied&error_description=User%20cancelled",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());

    let html = body_text(response).await;
    assert!(html.contains("User cancelled"));
    assert!(html.contains("Return to Login"));
}

#[tokio::test]
async fn test_callback_code_that_cannot_be_stored_shows_error() {
    let app = create_offline_app();

    let response = app
        .oneshot(get("/auth/callback?code=a%20b", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::LOCATION).is_none());
    assert!(set_cookies(&response).is_empty());

    let html = body_text(response).await;
    assert!(html.contains("could not be stored"));
    assert!(html.contains("Return to Login"));
}

#[tokio::test]
async fn test_logout_then_protected_page() {
    let app = create_offline_app();

    let response = app
        .clone()
        .oneshot(get("/logout", Some("auth_token=abc")))
        .await
        .unwrap();
    assert_eq!(location(&response), "/login");
    let cookies = set_cookies(&response);
    assert!(cookies[0].contains("Max-Age=0"));

    // Browser drops the cookie and arrives without it
    let response = app.oneshot(get("/get-book", None)).await.unwrap();
    assert_eq!(location(&response), "/login");
}

// ==================================================================================================
// Add-book Sign-in
// ==================================================================================================

#[tokio::test]
async fn test_add_book_callback_stores_secondary_credential() {
    let app = create_offline_app();

    let response = app
        .clone()
        .oneshot(get("/add-book?code=ABC", Some("auth_token=abc")))
        .await
        .unwrap();
    assert_eq!(location(&response), "/add-book");
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("add_book_token=ABC;"));
    assert!(cookies[0].contains("Max-Age=86400"));

    // Secondary credential alone opens the add-book page
    let response = app
        .oneshot(get("/add-book", Some("add_book_token=ABC")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let value = body_json(response).await;
    assert_eq!(value["authorized"], true);
}

#[tokio::test]
async fn test_add_book_without_secondary_goes_home() {
    let app = create_offline_app();

    let response = app
        .oneshot(get("/add-book", Some("auth_token=abc")))
        .await
        .unwrap();
    assert_eq!(location(&response), "/");
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_add_book_callback_error_links_home() {
    let app = create_offline_app();

    let response = app
        .oneshot(get(
            "/add-book?error=access_denied&error_description=Denied",
            Some("auth_token=abc"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let html = body_text(response).await;
    assert!(html.contains("Denied"));
    assert!(html.contains("Return to Home"));
}

#[tokio::test]
async fn test_add_book_submit_creates_book() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/books")
        .match_body(mockito::Matcher::PartialJsonString(
            r#"{"title":"Dune","author":"Frank Herbert","published_year":0,"rating":0.0}"#
                .to_string(),
        ))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"Book added","book":{"id":"42"}}"#)
        .create_async()
        .await;
    let app = create_test_app(&server.url(), "https://id.example.com");

    let response = app
        .oneshot(post_json(
            "/add-book",
            "add_book_token=ABC",
            r#"{"title":"Dune","author":"Frank Herbert"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let value = body_json(response).await;
    assert_eq!(value["message"], "Book added");
    assert_eq!(value["book"]["id"], "42");
    mock.assert_async().await;
}

// ==================================================================================================
// Book Views
// ==================================================================================================

#[tokio::test]
async fn test_get_book_not_found() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/books/404")
        .with_status(404)
        .create_async()
        .await;
    let app = create_test_app(&server.url(), "https://id.example.com");

    let response = app
        .oneshot(get("/get-book?id=404", Some("auth_token=abc")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let value = body_json(response).await;
    assert_eq!(value["error"]["type"], "not_found");
}

#[tokio::test]
async fn test_borrow_book() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/books/1")
        .with_status(200)
        .with_body(r#"{"id":"1","title":"Dune","author":"Frank Herbert"}"#)
        .create_async()
        .await;
    let borrow = server
        .mock("POST", "/borrow")
        .match_body(mockito::Matcher::PartialJsonString(
            r#"{"bookId":"1","username":"ana","borrowDays":14}"#.to_string(),
        ))
        .with_status(200)
        .with_body(r#"{"id":"r-1"}"#)
        .create_async()
        .await;
    let app = create_test_app(&server.url(), "https://id.example.com");

    let response = app
        .oneshot(post_json(
            "/borrow-book",
            "auth_token=abc",
            r#"{"bookId":"1","username":"ana","borrowDays":14}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let value = body_json(response).await;
    assert_eq!(value["message"], "\"Dune\" borrowed for 14 days");
    borrow.assert_async().await;
}

#[tokio::test]
async fn test_return_book_remote_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/return")
        .with_status(400)
        .with_body(r#"{"error":"Record already returned"}"#)
        .create_async()
        .await;
    let app = create_test_app(&server.url(), "https://id.example.com");

    let response = app
        .oneshot(post_json(
            "/return-book",
            "auth_token=abc",
            r#"{"id":"r-1","bookId":"1","username":"ana"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let value = body_json(response).await;
    assert_eq!(value["error"]["message"], "Record already returned");
    assert_eq!(value["error"]["type"], "remote_call_failure");
}

#[tokio::test]
async fn test_remote_api_unreachable_is_bad_gateway() {
    let app = create_offline_app();

    let response = app
        .oneshot(get("/return-book", Some("auth_token=abc")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

// ==================================================================================================
// Token Exchange
// ==================================================================================================

#[tokio::test]
async fn test_token_exchange_uses_selected_client() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/oauth2/token")
        .match_body(mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded("client_id".into(), "5f9uq8bi165es9rjpffnevjdcp".into()),
            mockito::Matcher::UrlEncoded(
                "redirect_uri".into(),
                "http://portal.test/add-book".into(),
            ),
        ]))
        .with_status(200)
        .with_body(r#"{"access_token":"at","expires_in":3600}"#)
        .create_async()
        .await;
    let app = create_test_app("http://127.0.0.1:9", &server.url());

    // Token endpoint is public
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"code":"XYZ","flow":"add_book"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let value = body_json(response).await;
    assert_eq!(value["access_token"], "at");
    mock.assert_async().await;
}
