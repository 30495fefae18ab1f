//! Document Forgery Verification Service
//!
//! This library provides the core functionality for the doc-forensics system,
//! which accepts uploaded document images, queues them for asynchronous
//! verification and runs a pre-trained forgery detection model over them.

pub mod app_state;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod telemetry;
