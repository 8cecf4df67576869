//! Platform API integration
//!
//! HTTP client, credential lookup and the wire types shared by the lesson,
//! progress and interaction layers.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;

pub use auth::TokenStore;
pub use client::ApiClient;
pub use error::ApiError;
pub use models::{ExecuteRequest, ExecutionResponse, UserProfile};
