//! Registration, login and profile forms.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{FormErrors, max_length, required};
use crate::models::{CreateUser, UpdateProfile};

/// Longest accepted username.
pub const USERNAME_MAX_LENGTH: usize = 150;

/// Shortest accepted password.
pub const PASSWORD_MIN_LENGTH: usize = 8;

static USERNAME_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").ok());

const USERNAME_HELP: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";

fn check_username(errors: &mut FormErrors, value: &str) -> Option<String> {
    let username = required(errors, "username", value)?;
    max_length(errors, "username", &username, USERNAME_MAX_LENGTH);
    let valid = USERNAME_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(&username));
    if !valid {
        errors.add("username", USERNAME_HELP);
    }
    Some(username)
}

fn trimmed(value: &str) -> String {
    value.trim().to_string()
}

/// Profile edit form.
///
/// Username uniqueness needs the store and is checked by the handler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing)]
    pub csrf_token: String,
}

impl ProfileForm {
    pub fn from_user(user: &crate::models::User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            csrf_token: String::new(),
        }
    }

    pub fn validate(&self) -> Result<UpdateProfile, FormErrors> {
        let mut errors = FormErrors::new();
        let username = check_username(&mut errors, &self.username);
        max_length(&mut errors, "first_name", &self.first_name, 150);
        max_length(&mut errors, "last_name", &self.last_name, 150);

        match username {
            Some(username) if errors.is_empty() => Ok(UpdateProfile {
                username,
                email: trimmed(&self.email),
                first_name: trimmed(&self.first_name),
                last_name: trimmed(&self.last_name),
            }),
            _ => Err(errors),
        }
    }
}

/// Account registration form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing)]
    pub password1: String,
    #[serde(default, skip_serializing)]
    pub password2: String,
    #[serde(default, skip_serializing)]
    pub csrf_token: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<CreateUser, FormErrors> {
        let mut errors = FormErrors::new();
        let username = check_username(&mut errors, &self.username);

        if self.password1.is_empty() {
            errors.add("password1", super::REQUIRED);
        } else if self.password1.chars().count() < PASSWORD_MIN_LENGTH {
            errors.add(
                "password1",
                format!(
                    "This password is too short. It must contain at least {PASSWORD_MIN_LENGTH} characters."
                ),
            );
        }
        if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }

        match username {
            Some(username) if errors.is_empty() => Ok(CreateUser {
                username,
                email: trimmed(&self.email),
                first_name: trimmed(&self.first_name),
                last_name: trimmed(&self.last_name),
                password: self.password1.clone(),
            }),
            _ => Err(errors),
        }
    }
}

/// Login form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default, skip_serializing)]
    pub csrf_token: String,
    /// Where to go after logging in.
    #[serde(default)]
    pub next: String,
}

impl LoginForm {
    /// Both fields present. Credentials are checked by the handler.
    pub fn validate(&self) -> Result<(String, String), FormErrors> {
        let mut errors = FormErrors::new();
        let username = required(&mut errors, "username", &self.username);
        if self.password.is_empty() {
            errors.add("password", super::REQUIRED);
        }
        match username {
            Some(username) if errors.is_empty() => Ok((username, self.password.clone())),
            _ => Err(errors),
        }
    }
}

/// Accept only local absolute paths as post-login targets.
pub fn safe_next(next: &str) -> Option<&str> {
    let next = next.trim();
    let local = next.starts_with('/') && !next.starts_with("//") && !next.contains('\\');
    local.then_some(next)
}
