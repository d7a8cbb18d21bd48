#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for registration, login, logout and profile editing.

use axum::http::StatusCode;

use blogicum::store::BlogStore;
use blogicum_test_utils::{TEST_PASSWORD, assert, extract_csrf_token};

mod common;
use common::{TestApp, assert_redirect, extract_cookies, response_text};

/// Fetch the login page and return `(cookies, csrf_token)`.
async fn login_page(app: &TestApp) -> (String, String) {
    let response = app.get("/auth/login/", "").await;
    let cookies = extract_cookies(&response);
    let html = response_text(response).await;
    (cookies, extract_csrf_token(&html).unwrap())
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn registration_creates_account_and_allows_login() {
    let app = TestApp::new();

    let response = app.get("/auth/registration/", "").await;
    let cookies = extract_cookies(&response);
    let token = extract_csrf_token(&response_text(response).await).unwrap();

    let response = app
        .post_form(
            "/auth/registration/",
            &cookies,
            &[
                ("username", "carol"),
                ("email", "carol@example.com"),
                ("first_name", "Carol"),
                ("last_name", "Jones"),
                ("password1", "a-long-password"),
                ("password2", "a-long-password"),
                ("csrf_token", &token),
            ],
        )
        .await;
    assert_redirect(&response, "/auth/login/");

    let user = app.store.find_user_by_username("carol").await.unwrap().unwrap();
    assert_eq!(user.first_name, "Carol");
    assert!(user.verify_password("a-long-password"));

    let cookies = app.login("carol", "a-long-password").await;
    let html = response_text(app.get("/", &cookies).await).await;
    assert::contains(&html, "/profile/carol/");
}

#[tokio::test]
async fn registration_rejects_taken_username() {
    let app = TestApp::new();
    app.create_user("carol").await;

    let response = app.get("/auth/registration/", "").await;
    let cookies = extract_cookies(&response);
    let token = extract_csrf_token(&response_text(response).await).unwrap();

    let response = app
        .post_form(
            "/auth/registration/",
            &cookies,
            &[
                ("username", "carol"),
                ("password1", "a-long-password"),
                ("password2", "a-long-password"),
                ("csrf_token", &token),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert::contains(
        &response_text(response).await,
        "A user with that username already exists.",
    );
}

// =============================================================================
// Login / logout
// =============================================================================

#[tokio::test]
async fn wrong_password_rerenders_login_form() {
    let app = TestApp::new();
    app.create_user("alice").await;
    let (cookies, token) = login_page(&app).await;

    let response = app
        .post_form(
            "/auth/login/",
            &cookies,
            &[
                ("username", "alice"),
                ("password", "not-the-password"),
                ("csrf_token", &token),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert::contains(
        &response_text(response).await,
        "Please enter a correct username and password.",
    );
}

#[tokio::test]
async fn login_without_csrf_token_is_forbidden() {
    let app = TestApp::new();
    app.create_user("alice").await;
    let (cookies, _) = login_page(&app).await;

    let response = app
        .post_form(
            "/auth/login/",
            &cookies,
            &[("username", "alice"), ("password", TEST_PASSWORD)],
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn login_follows_local_next_only() {
    let app = TestApp::new();
    app.create_user("alice").await;

    for (next, expected) in [
        ("/posts/create/", "/posts/create/"),
        ("https://evil.example/", "/"),
        ("//evil.example/", "/"),
    ] {
        let (cookies, token) = login_page(&app).await;
        let response = app
            .post_form(
                "/auth/login/",
                &cookies,
                &[
                    ("username", "alice"),
                    ("password", TEST_PASSWORD),
                    ("csrf_token", &token),
                    ("next", next),
                ],
            )
            .await;
        assert_redirect(&response, expected);
    }
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = TestApp::new();
    let (_, cookies) = app.create_and_login_user("alice").await;

    let html = response_text(app.get("/", &cookies).await).await;
    assert::contains(&html, "Log out");

    let response = app.get("/auth/logout/", &cookies).await;
    assert_redirect(&response, "/");

    let response = app.get("/posts/create/", &cookies).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

// =============================================================================
// Profile editing
// =============================================================================

#[tokio::test]
async fn editing_someone_elses_profile_redirects_to_it() {
    let app = TestApp::new();
    app.create_user("alice").await;
    let (_, cookies) = app.create_and_login_user("bob").await;

    let response = app.get("/profile/alice/edit/", &cookies).await;
    assert_redirect(&response, "/profile/alice/");

    let token = app.csrf_token("/posts/create/", &cookies).await;
    let response = app
        .post_form(
            "/profile/alice/edit/",
            &cookies,
            &[("username", "mallory"), ("csrf_token", &token)],
        )
        .await;
    assert_redirect(&response, "/profile/alice/");
    assert!(app.store.find_user_by_username("alice").await.unwrap().is_some());
}

#[tokio::test]
async fn owner_can_rename_themselves() {
    let app = TestApp::new();
    let (user, cookies) = app.create_and_login_user("alice").await;

    let token = app.csrf_token("/profile/alice/edit/", &cookies).await;
    let response = app
        .post_form(
            "/profile/alice/edit/",
            &cookies,
            &[
                ("username", "alice.w"),
                ("email", "alice@example.org"),
                ("first_name", "Alice"),
                ("last_name", "Walker"),
                ("csrf_token", &token),
            ],
        )
        .await;
    assert_redirect(&response, "/profile/alice.w/");

    let stored = app.store.find_user_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.username, "alice.w");
    assert_eq!(stored.last_name, "Walker");

    let html = response_text(app.get("/profile/alice.w/", "").await).await;
    assert::contains(&html, "Alice Walker");
}

#[tokio::test]
async fn rename_to_taken_username_is_rejected() {
    let app = TestApp::new();
    app.create_user("bob").await;
    let (user, cookies) = app.create_and_login_user("alice").await;

    let token = app.csrf_token("/profile/alice/edit/", &cookies).await;
    let response = app
        .post_form(
            "/profile/alice/edit/",
            &cookies,
            &[("username", "bob"), ("csrf_token", &token)],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert::contains(
        &response_text(response).await,
        "A user with that username already exists.",
    );

    let stored = app.store.find_user_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.username, "alice");
}
