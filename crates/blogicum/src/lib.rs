//! Blogicum library.
//!
//! A small blogging service: posts with categories and locations, user
//! profiles, and comments. The `blogicum` binary serves [`routes::app`];
//! the modules are public for integration testing.

pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod form;
pub mod models;
pub mod policy;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;
pub mod theme;
