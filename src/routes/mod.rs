use axum::{
    async_trait,
    extract::{FromRequestParts, Query, State},
    http::{request::Parts, StatusCode},
    middleware::{self as axum_middleware},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::{
    exchange_code, AuthFlow, CallbackOutcome, CallbackParams, FlowKind, TokenExchangeRequest,
    TokenResponse,
};
use crate::books::{
    AddBookForm, BookApiClient, BorrowForm, BorrowRequest, ReturnForm, BORROW_DAY_OPTIONS,
};
use crate::config::Config;
use crate::credentials::{CookieJar, CredentialName, CredentialStore};
use crate::error::ApiError;
use crate::gate::{ADD_BOOK_PATH, LOGIN_PATH, TOKEN_EXCHANGE_PATH};
use crate::http_client::HttpClient;
use crate::middleware;
use crate::pages;

/// Application version from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Entry point of the add-book sign-in
pub const ADD_BOOK_START_PATH: &str = "/add-book/start";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http_client: Arc<HttpClient>,
    pub books: Arc<BookApiClient>,
    pub primary_flow: Arc<AuthFlow>,
    pub add_book_flow: Arc<AuthFlow>,
}

impl AppState {
    /// Build the shared HTTP client, book API client and both sign-in flows
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http_client = Arc::new(HttpClient::new(
            config.http_max_connections,
            config.http_connect_timeout,
            config.http_request_timeout,
        )?);
        let books = Arc::new(BookApiClient::new(
            http_client.clone(),
            config.book_api_url.clone(),
            config.lenient_create_success,
        ));

        Ok(Self {
            primary_flow: Arc::new(AuthFlow::primary(&config)),
            add_book_flow: Arc::new(AuthFlow::add_book(&config)),
            config: Arc::new(config),
            http_client,
            books,
        })
    }

    fn flow(&self, kind: FlowKind) -> &AuthFlow {
        match kind {
            FlowKind::Primary => self.primary_flow.as_ref(),
            FlowKind::AddBook => self.add_book_flow.as_ref(),
        }
    }
}

/// Handlers take the request's cookie jar as an extractor and hand it back
/// in the response to emit any queued Set-Cookie headers.
#[async_trait]
impl FromRequestParts<AppState> for CookieJar {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(CookieJar::from_headers(
            &parts.headers,
            state.config.cookie_policy(),
        ))
    }
}

/// Build the application: all routes behind the access gate, plus CORS and
/// request tracing
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route(LOGIN_PATH, get(login_handler))
        .route("/logout", get(logout_handler))
        .route("/auth/callback", get(auth_callback_handler))
        .route(ADD_BOOK_START_PATH, get(add_book_start_handler))
        .route(
            ADD_BOOK_PATH,
            get(add_book_page_handler).post(add_book_submit_handler),
        )
        .route("/get-book", get(get_book_handler))
        .route(
            "/borrow-book",
            get(borrow_dashboard_handler).post(borrow_submit_handler),
        )
        .route(
            "/return-book",
            get(return_dashboard_handler).post(return_submit_handler),
        )
        .route(TOKEN_EXCHANGE_PATH, post(token_exchange_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::access_gate,
        ))
        .layer(middleware::cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / - Home view
///
/// Reports which credentials the browser holds and where each feature lives.
async fn root_handler(jar: CookieJar) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Book Portal is running",
        "version": VERSION,
        "authenticated": jar.contains(CredentialName::Primary),
        "add_book_access": jar.contains(CredentialName::AddBook),
        "links": {
            "get_book": "/get-book",
            "add_book": ADD_BOOK_START_PATH,
            "borrow_book": "/borrow-book",
            "return_book": "/return-book",
            "logout": "/logout"
        }
    }))
}

/// GET /health - Liveness check, reachable without a session
async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "version": VERSION
    }))
}

/// GET /login - Sign-in page
async fn login_handler(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let url = state.primary_flow.authorize_url()?;
    Ok(pages::login_page(url.as_str()))
}

/// GET /logout - Drop the primary credential. The add-book credential stays.
async fn logout_handler(mut jar: CookieJar) -> (CookieJar, Redirect) {
    jar.delete(CredentialName::Primary);
    tracing::info!("Signed out, redirecting to {}", LOGIN_PATH);
    (jar, Redirect::to(LOGIN_PATH))
}

/// GET /auth/callback - Return leg of the primary sign-in
async fn auth_callback_handler(
    State(state): State<AppState>,
    mut jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    let flow = &state.primary_flow;
    match flow.handle_callback(&params, &mut jar) {
        CallbackOutcome::Complete { location } => (jar, Redirect::to(&location)).into_response(),
        CallbackOutcome::Failed { message, .. } => {
            pages::auth_error_page(flow.credential(), &message)
        }
        CallbackOutcome::SignInRequired { location } => Redirect::to(&location).into_response(),
        CallbackOutcome::Idle => Redirect::to(flow.target_path()).into_response(),
    }
}

/// GET /add-book/start - Begin the add-book sign-in, or go straight to the
/// page when its credential is already held
async fn add_book_start_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Redirect, ApiError> {
    let location = state.add_book_flow.start(&jar)?;
    Ok(Redirect::to(&location))
}

/// GET /add-book - Return leg of the add-book sign-in, and the add-book view
async fn add_book_page_handler(
    State(state): State<AppState>,
    mut jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    let flow = &state.add_book_flow;
    match flow.handle_callback(&params, &mut jar) {
        CallbackOutcome::Complete { location } => (jar, Redirect::to(&location)).into_response(),
        CallbackOutcome::Failed { message, .. } => {
            pages::auth_error_page(flow.credential(), &message)
        }
        CallbackOutcome::SignInRequired { location } => Redirect::to(&location).into_response(),
        CallbackOutcome::Idle => Json(json!({
            "authorized": true,
            "submit": ADD_BOOK_PATH,
            "fields": {
                "required": ["title", "author"],
                "optional": ["genre", "published_year", "rating"]
            },
            "rating_range": [0, 5]
        }))
        .into_response(),
    }
}

/// POST /add-book - Create a book. Needs the add-book credential.
async fn add_book_submit_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(form): Json<AddBookForm>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if !jar.contains(CredentialName::AddBook) {
        return Err(ApiError::MissingCredential {
            location: ADD_BOOK_START_PATH.to_string(),
        });
    }

    let book = form.validate()?;
    tracing::info!("Request to add book: title={}, author={}", book.title, book.author);

    let created = state.books.create_book(&book).await?;
    Ok((StatusCode::CREATED, Json(json!(created))))
}

#[derive(Debug, Deserialize)]
struct GetBookQuery {
    id: Option<String>,
}

/// GET /get-book - The whole catalogue, or one book with `?id=`
async fn get_book_handler(
    State(state): State<AppState>,
    Query(query): Query<GetBookQuery>,
) -> Result<Json<Value>, ApiError> {
    match query.id {
        Some(id) => {
            tracing::info!("Request to /get-book: id={}", id);
            let book = state
                .books
                .get_book(&id)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("Book with ID {} not found", id.trim())))?;
            Ok(Json(json!(book)))
        }
        None => {
            let books = state.books.list_books().await?;
            tracing::info!("Request to /get-book: {} books", books.len());
            Ok(Json(json!(books)))
        }
    }
}

/// GET /borrow-book - Books available to borrow and the allowed durations
async fn borrow_dashboard_handler(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let books = state.books.list_books().await?;
    Ok(Json(json!({
        "books": books,
        "borrow_days": BORROW_DAY_OPTIONS
    })))
}

/// POST /borrow-book - Borrow a book for 7, 14 or 30 days
async fn borrow_submit_handler(
    State(state): State<AppState>,
    Json(form): Json<BorrowForm>,
) -> Result<Json<Value>, ApiError> {
    let (book_id, username, days) = form.validate()?;

    let book = state
        .books
        .get_book(&book_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No book found with ID {}", book_id)))?;

    let request = BorrowRequest {
        book_id,
        username,
        borrow_days: days,
        borrow_date: Utc::now().to_rfc3339(),
    };
    let result = state.books.borrow(&request).await?;

    Ok(Json(json!({
        "message": format!("\"{}\" borrowed for {} days", book.title, days),
        "borrow": result
    })))
}

/// GET /return-book - Current borrow records
async fn return_dashboard_handler(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let borrows = state.books.list_borrows().await?;
    Ok(Json(json!({ "borrows": borrows })))
}

/// POST /return-book - Return a borrowed book
async fn return_submit_handler(
    State(state): State<AppState>,
    Json(form): Json<ReturnForm>,
) -> Result<Json<Value>, ApiError> {
    let request = form.validate()?;
    let result = state.books.return_book(&request).await?;

    Ok(Json(json!({
        "message": format!("Book {} returned successfully", request.book_id),
        "result": result
    })))
}

/// POST /api/auth/token - Exchange an authorization code for provider tokens
async fn token_exchange_handler(
    State(state): State<AppState>,
    Json(request): Json<TokenExchangeRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let flow = state.flow(request.flow);
    tracing::info!("Request to {}: credential={}", TOKEN_EXCHANGE_PATH, flow.credential());

    let tokens = exchange_code(&state.http_client, flow.provider(), &request.code).await?;
    Ok(Json(tokens))
}
