//! Blogicum test utilities.
//!
//! Helpers for integration testing: fixture builders, request body
//! encoders, and assertion utilities for rendered pages.

use chrono::{DateTime, Duration, Utc};

/// Password given to every fixture user.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Smallest byte string `infer` recognises as a PNG.
pub const PNG_BYTES: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R',
];

/// Create a test user with default values.
pub fn test_user(username: &str) -> TestUser {
    TestUser {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        first_name: String::new(),
        last_name: String::new(),
        password: TEST_PASSWORD.to_string(),
    }
}

/// A test user builder.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl TestUser {
    /// Set first and last name.
    pub fn with_name(mut self, first: &str, last: &str) -> Self {
        self.first_name = first.to_string();
        self.last_name = last.to_string();
        self
    }
}

/// Create a published test post dated an hour ago.
pub fn test_post(title: &str) -> TestPost {
    TestPost {
        title: title.to_string(),
        text: format!("Body of {title}"),
        is_published: true,
        pub_offset: -Duration::hours(1),
    }
}

/// A test post builder.
///
/// `pub_offset` is relative to the moment the fixture is stored, so
/// scheduled posts stay in the future for the duration of a test.
#[derive(Debug, Clone)]
pub struct TestPost {
    pub title: String,
    pub text: String,
    pub is_published: bool,
    pub pub_offset: Duration,
}

impl TestPost {
    /// Set the body text.
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    /// Set as unpublished.
    pub fn unpublished(mut self) -> Self {
        self.is_published = false;
        self
    }

    /// Date the post a day into the future.
    pub fn scheduled(mut self) -> Self {
        self.pub_offset = Duration::days(1);
        self
    }

    /// Date the post `minutes` before now. Larger values sort later in
    /// newest-first listings.
    pub fn minutes_ago(mut self, minutes: i64) -> Self {
        self.pub_offset = -Duration::minutes(minutes);
        self
    }

    /// Publication date relative to `now`.
    pub fn pub_date(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.pub_offset
    }
}

/// Encode fields as `application/x-www-form-urlencoded`.
pub fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                urlencoding::encode(name),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Builder for `multipart/form-data` request bodies.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: "----blogicum-test-boundary".to_string(),
            body: Vec::new(),
        }
    }

    /// Add a text field.
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    /// Add a file field.
    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// The `Content-Type` header value for this body.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Close the body.
    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.body
    }
}

/// Pull the CSRF token out of the first form on a rendered page.
pub fn extract_csrf_token(html: &str) -> Option<String> {
    let pattern = regex::Regex::new(r#"name="csrf_token" value="([0-9a-f]+)""#).ok()?;
    pattern
        .captures(html)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

/// The `name=value` pair of a `Set-Cookie` header, for replaying it.
pub fn cookie_pair(set_cookie: &str) -> &str {
    set_cookie.split(';').next().unwrap_or(set_cookie).trim()
}

/// Assertion helpers for rendered pages.
pub mod assert {
    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{}'\nActual: {}",
            needle,
            haystack
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string to NOT contain '{}'\nActual: {}",
            needle,
            haystack
        );
    }

    /// Assert that `first` appears before `second`.
    pub fn appears_before(haystack: &str, first: &str, second: &str) {
        match (haystack.find(first), haystack.find(second)) {
            (Some(a), Some(b)) => assert!(
                a < b,
                "Expected '{}' before '{}'\nActual: {}",
                first,
                second,
                haystack
            ),
            _ => panic!(
                "Expected both '{}' and '{}'\nActual: {}",
                first, second, haystack
            ),
        }
    }
}
