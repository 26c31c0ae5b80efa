//! # salonads-client
//!
//! Session and authentication client for the salon advertising platform.
//!
//! This crate provides:
//! - A single shared identity cache with a freshness window
//! - Single-flight identity lookups and token refreshes
//! - An intercepting client that refreshes on 401 and replays once
//! - Identity-change listeners
//! - Typed access to the ad and salon resources
//!
//! ## Modules
//!
//! - [`auth`] - Account operations (login, logout, sign-up, password reset)
//! - [`cache`] - Identity cache and session states
//! - [`client`] - Intercepting API client
//! - [`config`] - Endpoint and timing configuration
//! - [`error`] - Error type shared by every operation
//! - [`refresh`] - Token refresh coordination and the login redirect hook
//! - [`services`] - Ad and salon resource services
//! - [`subscribers`] - Identity-change listener registry
//! - [`transport`] - HTTP transport seam and its `reqwest` implementation
//! - [`types`] - User and request payloads

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod refresh;
pub mod services;
pub mod subscribers;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use auth::{AuthService, AuthServiceBuilder};
pub use cache::{SessionCache, SessionState};
pub use client::ApiClient;
pub use config::{AuthEndpoints, SessionConfig};
pub use error::{SessionError, SessionResult};
pub use refresh::{LoginRedirect, RefreshCoordinator, TracingRedirect};
pub use services::{AdService, AdStatus, SalonService};
pub use subscribers::{Listener, Subscribers, SubscriptionId};
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};
pub use types::{Credentials, MeResponse, RegisterRequest, User, UserId};
