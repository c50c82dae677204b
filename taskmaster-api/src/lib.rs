//! # TaskMaster API Server Library
//!
//! HTTP layer of the TaskMaster task-management backend.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Validating request extractors
//! - `middleware`: Authentication gate and security headers
//! - `notify`: Invitation email delivery
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod notify;
pub mod routes;
