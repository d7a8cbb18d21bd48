#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for post detail, creation, editing and deletion.

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use uuid::Uuid;

use blogicum::form::post::format_pub_date;
use blogicum::models::{Category, User};
use blogicum::policy::{PostQuery, ProfileListingPolicy, Viewer};
use blogicum::store::BlogStore;
use blogicum_test_utils::{MultipartBody, PNG_BYTES, assert, test_post};

mod common;
use common::{TestApp, assert_redirect, location, response_text};

/// A complete, valid post form.
fn post_form(token: &str, title: &str, category: &Category) -> MultipartBody {
    MultipartBody::new()
        .text("csrf_token", token)
        .text("title", title)
        .text("text", "Some words about the trip.")
        .text("pub_date", &format_pub_date(Utc::now() - Duration::hours(1)))
        .text("category", &category.id.to_string())
        .text("location", "")
        .text("is_published", "on")
}

async fn posts_by(app: &TestApp, author: &User) -> Vec<blogicum::models::PostSummary> {
    let query = PostQuery::profile(
        author,
        &Viewer::anonymous(),
        ProfileListingPolicy::Full,
        Utc::now(),
    );
    app.store.list_posts(&query, 0, 100).await.unwrap()
}

// =============================================================================
// Detail
// =============================================================================

#[tokio::test]
async fn anonymous_viewer_cannot_see_unpublished_post() {
    let app = TestApp::new();
    let author = app.create_user("alice").await;
    let category = app.create_category("travel", true).await;
    let post = app.create_post(&author, &category, test_post("Secret draft").unpublished()).await;

    let response = app.get(&format!("/posts/{}/", post.id), "").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn other_users_cannot_see_scheduled_or_hidden_category_posts() {
    let app = TestApp::new();
    let author = app.create_user("alice").await;
    let (_, cookies) = app.create_and_login_user("bob").await;
    let open = app.create_category("travel", true).await;
    let hidden = app.create_category("secret", false).await;

    let scheduled = app.create_post(&author, &open, test_post("Later").scheduled()).await;
    let hidden_post = app.create_post(&author, &hidden, test_post("Hidden")).await;

    for id in [scheduled.id, hidden_post.id] {
        let response = app.get(&format!("/posts/{id}/"), &cookies).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn author_sees_own_unpublished_post() {
    let app = TestApp::new();
    let (author, cookies) = app.create_and_login_user("alice").await;
    let category = app.create_category("travel", true).await;
    let post = app.create_post(&author, &category, test_post("Secret draft").unpublished()).await;

    let response = app.get(&format!("/posts/{}/", post.id), &cookies).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = response_text(response).await;
    assert::contains(&html, "Secret draft");
    assert::contains(&html, "Unpublished");
    assert::contains(&html, &format!("/posts/{}/edit/", post.id));
}

#[tokio::test]
async fn detail_lists_comments_oldest_first() {
    let app = TestApp::new();
    let author = app.create_user("alice").await;
    let category = app.create_category("travel", true).await;
    let post = app.create_post(&author, &category, test_post("Chatty")).await;
    app.create_comment(&author, &post, "comment one").await;
    app.create_comment(&author, &post, "comment two").await;

    let html = response_text(app.get(&format!("/posts/{}/", post.id), "").await).await;
    assert::appears_before(&html, "comment one", "comment two");
    assert::contains(&html, "Comments (2)");
    assert::contains(&html, "to comment");
}

#[tokio::test]
async fn unknown_or_malformed_post_id_is_not_found() {
    let app = TestApp::new();

    let response = app.get(&format!("/posts/{}/", Uuid::now_v7()), "").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/posts/42/", "").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn create_requires_login() {
    let app = TestApp::new();
    let response = app.get("/posts/create/", "").await;
    assert_redirect(&response, "/auth/login/?next=%2Fposts%2Fcreate%2F");
}

#[tokio::test]
async fn create_post_with_image_redirects_to_profile() {
    let app = TestApp::new();
    let (author, cookies) = app.create_and_login_user("alice").await;
    let category = app.create_category("travel", true).await;
    let token = app.csrf_token("/posts/create/", &cookies).await;

    let form = post_form(&token, "Trip report", &category)
        .file("image", "photo.png", "image/png", PNG_BYTES);
    let response = app.post_multipart("/posts/create/", &cookies, form).await;
    assert_redirect(&response, "/profile/alice/");

    let posts = posts_by(&app, &author).await;
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "Trip report");
    assert!(posts[0].is_published);

    let image = posts[0].image.clone().expect("image stored");
    assert!(image.starts_with("/media/posts/"), "{image}");
    assert!(image.ends_with(".png"), "{image}");
    let key = image.trim_start_matches("/media/");
    assert!(app.config.uploads_dir.join(key).exists());
}

#[tokio::test]
async fn invalid_post_form_is_rerendered_without_saving() {
    let app = TestApp::new();
    let (author, cookies) = app.create_and_login_user("alice").await;
    let category = app.create_category("travel", true).await;
    let token = app.csrf_token("/posts/create/", &cookies).await;

    let form = MultipartBody::new()
        .text("csrf_token", &token)
        .text("title", "   ")
        .text("text", "Body")
        .text("pub_date", "not a date")
        .text("category", &category.id.to_string());
    let response = app.post_multipart("/posts/create/", &cookies, form).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = response_text(response).await;
    assert::contains(&html, "This field is required.");
    // Form errors go through autoescaping, which encodes the slash.
    assert::contains(&html, "Enter a valid date&#x2F;time.");

    assert!(posts_by(&app, &author).await.is_empty());
}

#[tokio::test]
async fn unknown_category_is_rejected() {
    let app = TestApp::new();
    let (author, cookies) = app.create_and_login_user("alice").await;
    app.create_category("travel", true).await;
    let token = app.csrf_token("/posts/create/", &cookies).await;

    let form = MultipartBody::new()
        .text("csrf_token", &token)
        .text("title", "Lost")
        .text("text", "Nowhere to file this.")
        .text("pub_date", &format_pub_date(Utc::now()))
        .text("category", &Uuid::now_v7().to_string());
    let response = app.post_multipart("/posts/create/", &cookies, form).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert::contains(&response_text(response).await, "Select a valid choice.");
    assert!(posts_by(&app, &author).await.is_empty());
}

#[tokio::test]
async fn non_image_upload_is_rejected() {
    let app = TestApp::new();
    let (author, cookies) = app.create_and_login_user("alice").await;
    let category = app.create_category("travel", true).await;
    let token = app.csrf_token("/posts/create/", &cookies).await;

    let form = post_form(&token, "With attachment", &category).file(
        "image",
        "notes.png",
        "image/png",
        b"definitely not a picture",
    );
    let response = app.post_multipart("/posts/create/", &cookies, form).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(posts_by(&app, &author).await.is_empty());
}

#[tokio::test]
async fn create_without_csrf_token_is_forbidden() {
    let app = TestApp::new();
    let (author, cookies) = app.create_and_login_user("alice").await;
    let category = app.create_category("travel", true).await;

    let response = app
        .post_multipart("/posts/create/", &cookies, post_form("", "Forged", &category))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(posts_by(&app, &author).await.is_empty());
}

// =============================================================================
// Edit
// =============================================================================

#[tokio::test]
async fn non_owner_edit_redirects_and_leaves_post_unchanged() {
    let app = TestApp::new();
    let owner = app.create_user("alice").await;
    let (_, cookies) = app.create_and_login_user("bob").await;
    let category = app.create_category("travel", true).await;
    let post = app.create_post(&owner, &category, test_post("Original")).await;
    let edit_path = format!("/posts/{}/edit/", post.id);

    let response = app.get(&edit_path, &cookies).await;
    assert_redirect(&response, &format!("/posts/{}/", post.id));

    let token = app.csrf_token("/posts/create/", &cookies).await;
    let response = app
        .post_multipart(&edit_path, &cookies, post_form(&token, "Vandalised", &category))
        .await;
    assert_redirect(&response, &format!("/posts/{}/", post.id));

    let stored = app.store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Original");
}

#[tokio::test]
async fn owner_can_edit_post() {
    let app = TestApp::new();
    let (owner, cookies) = app.create_and_login_user("alice").await;
    let category = app.create_category("travel", true).await;
    let location = app.create_location("Lisbon", true).await;
    let post = app.create_post(&owner, &category, test_post("Original")).await;
    let edit_path = format!("/posts/{}/edit/", post.id);

    let token = app.csrf_token(&edit_path, &cookies).await;
    let form = post_form(&token, "Revised", &category).text("location", &location.id.to_string());
    let response = app.post_multipart(&edit_path, &cookies, form).await;
    assert_redirect(&response, &format!("/posts/{}/", post.id));

    let stored = app.store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Revised");
    assert_eq!(stored.location_id, Some(location.id));

    let html = response_text(app.get(&format!("/posts/{}/", post.id), "").await).await;
    assert::contains(&html, "in Lisbon");
}

#[tokio::test]
async fn clearing_image_removes_the_file() {
    let app = TestApp::new();
    let (author, cookies) = app.create_and_login_user("alice").await;
    let category = app.create_category("travel", true).await;

    let token = app.csrf_token("/posts/create/", &cookies).await;
    let form = post_form(&token, "Pictured", &category)
        .file("image", "photo.png", "image/png", PNG_BYTES);
    app.post_multipart("/posts/create/", &cookies, form).await;

    let post = posts_by(&app, &author).await.pop().unwrap();
    let image = post.image.clone().unwrap();
    let file = app.config.uploads_dir.join(image.trim_start_matches("/media/"));
    assert!(file.exists());

    let edit_path = format!("/posts/{}/edit/", post.id);
    let token = app.csrf_token(&edit_path, &cookies).await;
    let form = post_form(&token, "Pictured", &category).text("image_clear", "on");
    let response = app.post_multipart(&edit_path, &cookies, form).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let stored = app.store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.image, None);
    assert!(!file.exists());
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn deleting_twice_is_not_found() {
    let app = TestApp::new();
    let (owner, cookies) = app.create_and_login_user("alice").await;
    let category = app.create_category("travel", true).await;
    let post = app.create_post(&owner, &category, test_post("Short-lived")).await;
    app.create_comment(&owner, &post, "soon gone").await;
    let delete_path = format!("/posts/{}/delete/", post.id);

    let token = app.csrf_token(&delete_path, &cookies).await;
    let response = app
        .post_form(&delete_path, &cookies, &[("csrf_token", &token)])
        .await;
    assert_redirect(&response, "/");
    assert!(app.store.find_post(post.id).await.unwrap().is_none());
    assert!(app.store.list_comments(post.id).await.unwrap().is_empty());

    let token = app.csrf_token("/posts/create/", &cookies).await;
    let response = app
        .post_form(&delete_path, &cookies, &[("csrf_token", &token)])
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_owner_delete_redirects_to_detail() {
    let app = TestApp::new();
    let owner = app.create_user("alice").await;
    let (_, cookies) = app.create_and_login_user("bob").await;
    let category = app.create_category("travel", true).await;
    let post = app.create_post(&owner, &category, test_post("Keep me")).await;
    let delete_path = format!("/posts/{}/delete/", post.id);

    let response = app.get(&delete_path, &cookies).await;
    assert_eq!(location(&response), format!("/posts/{}/", post.id));

    let token = app.csrf_token("/posts/create/", &cookies).await;
    let response = app
        .post_form(&delete_path, &cookies, &[("csrf_token", &token)])
        .await;
    assert_redirect(&response, &format!("/posts/{}/", post.id));
    assert!(app.store.find_post(post.id).await.unwrap().is_some());
}

#[tokio::test]
async fn anonymous_delete_goes_to_login() {
    let app = TestApp::new();
    let owner = app.create_user("alice").await;
    let category = app.create_category("travel", true).await;
    let post = app.create_post(&owner, &category, test_post("Keep me")).await;

    let response = app.post_form(&format!("/posts/{}/delete/", post.id), "", &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/auth/login/?next="));
    assert!(app.store.find_post(post.id).await.unwrap().is_some());
}
