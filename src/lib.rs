//! Opinion Hub — market and intelligence-feed pages with demo-data fallback.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod archive;
pub mod catalog;
pub mod config;
pub mod feed;
pub mod server;
pub mod types;
