//! # Academix Gateway
//!
//! The REST face of the student portal: an axum router over
//! [`academix::Portal`], translating HTTP requests into service calls and
//! [`academix::PortalError`]s into `{status, message}` responses.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use academix::{Portal, Settings};
//! use academix_gateway::create_router;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::new()?;
//!     let address = settings.server.bind_address.clone();
//!     let app = create_router(Portal::connect(settings).await?)?;
//!
//!     let listener = tokio::net::TcpListener::bind(address).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod extract;
pub mod handlers;
pub mod openapi;
pub mod response;
pub mod router;

pub use error::ApiError;
pub use router::{create_router, GatewayState};
