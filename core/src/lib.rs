//! Synchronous client for the GIIA platform services.
//!
//! # Overview
//! The platform is six HTTP/JSON services on one host, each on its own
//! port: auth, catalog, buffers (DDMRP), execution (purchase orders),
//! analytics and notifications. `PlatformClient` logs in once and then
//! calls any of them with the session's bearer token and organization id.
//!
//! # Design
//! - `GiiaClient` is sans-IO: `build_*` produces an `HttpRequest`,
//!   `parse_*` consumes an `HttpResponse`. It owns the `Session`.
//! - `Transport` executes requests; `UreqTransport` is the blocking
//!   implementation with one reused agent.
//! - `PlatformClient` pairs the two into one method per remote operation.
//! - Missing optional JSON fields decode to fixed defaults (see `types`).

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod platform;
pub mod session;
pub mod transport;
pub mod types;

pub use client::GiiaClient;
pub use config::{ClientConfig, Service, ServicePorts};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use platform::PlatformClient;
pub use session::Session;
pub use transport::{Transport, UreqTransport};
pub use types::{Buffer, LineItem, NewProduct, NewPurchaseOrder, Product, User, Zone};
