//! To-do List Client Library
//!
//! A task list client for a REST backend. Every call goes through an
//! authenticated gateway that attaches a bearer token and refreshes an
//! expired access token once before retrying.

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod gateway;
pub mod list;
pub mod logging;
pub mod preferences;
pub mod store;
pub mod types;
