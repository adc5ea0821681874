//! Contact Keeper: a contacts REST API plus the client-side state it feeds.

pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod contacts;
pub mod db;
pub mod error;
pub mod memory;
pub mod state;
