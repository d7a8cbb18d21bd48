#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Every test builds its own [`TestApp`]: the real router and handlers over
//! an in-memory blog store and in-memory sessions, so tests need no
//! external services and never share data.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use chrono::Utc;
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use uuid::Uuid;

use blogicum::config::Config;
use blogicum::models::{
    Category, Comment, CreateCategory, CreateComment, CreateLocation, CreatePost, CreateUser,
    Location, Post, User,
};
use blogicum::state::AppState;
use blogicum::store::{BlogStore, MemoryBlogStore};
use blogicum::{routes, session};
use blogicum_test_utils::{
    MultipartBody, TestPost, cookie_pair, extract_csrf_token, form_body, test_user,
};

/// Test application wrapper using the REAL routes and state.
pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryBlogStore>,
    pub state: AppState,
    pub config: Config,
}

impl TestApp {
    /// Create a test application with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::for_memory_store())
    }

    /// Create a test application with the given configuration. Uploads go
    /// to a fresh temporary directory.
    pub fn with_config(mut config: Config) -> Self {
        config.uploads_dir = std::env::temp_dir().join(format!("blogicum-test-{}", Uuid::now_v7()));

        let store = Arc::new(MemoryBlogStore::new());
        let state = AppState::with_store(&config, store.clone())
            .expect("Failed to initialize AppState");

        let session_layer = session::configure_layer(MemoryStore::default(), &config);
        let router = routes::app(state.clone(), session_layer);

        Self {
            router,
            store,
            state,
            config,
        }
    }

    // -------------------------------------------------------------------------
    // Requests
    // -------------------------------------------------------------------------

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// Send a request with cookies from a previous response.
    pub async fn request_with_cookies(
        &self,
        mut request: Request<Body>,
        cookies: &str,
    ) -> Response {
        if !cookies.is_empty() {
            request.headers_mut().insert(
                header::COOKIE,
                cookies.parse().expect("Invalid cookie header"),
            );
        }
        self.request(request).await
    }

    /// GET `path`.
    pub async fn get(&self, path: &str, cookies: &str) -> Response {
        self.request_with_cookies(Request::get(path).body(Body::empty()).unwrap(), cookies)
            .await
    }

    /// POST an urlencoded form to `path`.
    pub async fn post_form(&self, path: &str, cookies: &str, fields: &[(&str, &str)]) -> Response {
        let request = Request::post(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form_body(fields)))
            .unwrap();
        self.request_with_cookies(request, cookies).await
    }

    /// POST a multipart form to `path`.
    pub async fn post_multipart(&self, path: &str, cookies: &str, body: MultipartBody) -> Response {
        let request = Request::post(path)
            .header(header::CONTENT_TYPE, body.content_type())
            .body(Body::from(body.finish()))
            .unwrap();
        self.request_with_cookies(request, cookies).await
    }

    /// Load the form page at `path` and return its CSRF token.
    pub async fn csrf_token(&self, path: &str, cookies: &str) -> String {
        let response = self.get(path, cookies).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {path} for a CSRF token");
        let html = response_text(response).await;
        extract_csrf_token(&html).unwrap_or_else(|| panic!("No CSRF token on {path}"))
    }

    /// Log in through the login form and return the session cookies.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self.get("/auth/login/", "").await;
        let cookies = extract_cookies(&response);
        let html = response_text(response).await;
        let token = extract_csrf_token(&html).expect("No CSRF token on login page");

        let response = self
            .post_form(
                "/auth/login/",
                &cookies,
                &[
                    ("username", username),
                    ("password", password),
                    ("csrf_token", &token),
                ],
            )
            .await;
        assert_eq!(
            response.status(),
            StatusCode::SEE_OTHER,
            "Login failed for user '{username}'"
        );

        let cycled = extract_cookies(&response);
        if cycled.is_empty() { cookies } else { cycled }
    }

    /// Create a user and return it with session cookies after logging in.
    pub async fn create_and_login_user(&self, username: &str) -> (User, String) {
        let user = self.create_user(username).await;
        let cookies = self.login(username, blogicum_test_utils::TEST_PASSWORD).await;
        (user, cookies)
    }

    // -------------------------------------------------------------------------
    // Fixtures
    // -------------------------------------------------------------------------

    /// Create a user directly in the store.
    pub async fn create_user(&self, username: &str) -> User {
        let fixture = test_user(username);
        self.store
            .create_user(CreateUser {
                username: fixture.username,
                email: fixture.email,
                first_name: fixture.first_name,
                last_name: fixture.last_name,
                password: fixture.password,
            })
            .await
            .expect("Failed to create user")
    }

    pub async fn create_category(&self, slug: &str, published: bool) -> Category {
        self.store
            .create_category(CreateCategory {
                title: format!("Category {slug}"),
                description: format!("All about {slug}"),
                slug: slug.to_string(),
                is_published: published,
            })
            .await
            .expect("Failed to create category")
    }

    pub async fn create_location(&self, name: &str, published: bool) -> Location {
        self.store
            .create_location(CreateLocation {
                name: name.to_string(),
                is_published: published,
            })
            .await
            .expect("Failed to create location")
    }

    pub async fn create_post(&self, author: &User, category: &Category, fixture: TestPost) -> Post {
        self.store
            .create_post(CreatePost {
                pub_date: fixture.pub_date(Utc::now()),
                title: fixture.title,
                text: fixture.text,
                image: None,
                is_published: fixture.is_published,
                author_id: author.id,
                category_id: Some(category.id),
                location_id: None,
            })
            .await
            .expect("Failed to create post")
    }

    pub async fn create_comment(&self, author: &User, post: &Post, text: &str) -> Comment {
        self.store
            .create_comment(CreateComment {
                post_id: post.id,
                author_id: author.id,
                text: text.to_string(),
            })
            .await
            .expect("Failed to create comment")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.config.uploads_dir).ok();
    }
}

/// Join the `name=value` pairs of every `Set-Cookie` header.
pub fn extract_cookies(response: &Response) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(cookie_pair)
        .collect::<Vec<_>>()
        .join("; ")
}

/// The `Location` header of a redirect.
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("Expected a Location header")
        .to_str()
        .unwrap()
        .to_string()
}

/// Assert a 303 redirect to `target`.
pub fn assert_redirect(response: &Response, target: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(response), target);
}

pub async fn response_text(response: Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&body).to_string()
}

pub async fn response_json(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap_or_else(|_| {
        let text = String::from_utf8_lossy(&body);
        panic!("Failed to parse JSON: {text}");
    })
}
