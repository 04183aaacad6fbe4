//! # Academix - Student Portal Core
//!
//! Accounts with email OTP verification, blogs with tags, views and likes,
//! and threaded comments, on top of a document store (MongoDB, or an
//! in-memory store for tests and local runs).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use academix::{Portal, Settings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let portal = Portal::connect(Settings::new()?).await?;
//!     portal.start_sweeper();
//!
//!     let page = portal.blogs.list(&Default::default()).await?;
//!     println!("{} blogs", page.total_count);
//!     Ok(())
//! }
//! ```

pub mod accounts;
pub mod auth;
pub mod blogs;
pub mod comments;
pub mod connection;
pub mod engagement;
pub mod error;
pub mod listing;
pub mod mailer;
pub mod mis;
pub mod models;
pub mod service;
pub mod settings;
pub mod store;
pub mod sweeper;
pub mod thread;

mod authors;
#[cfg(test)]
mod testing;

pub use accounts::{AccountService, AuthToken, Session};
pub use blogs::{BlogPage, BlogService};
pub use comments::{CommentListing, CommentService};
pub use engagement::EngagementService;
pub use error::{PortalError, Result};
pub use listing::{BlogListQuery, BlogSearchQuery};
pub use mailer::{LogMailer, Mailer, Notification, RecordingMailer};
pub use service::Portal;
pub use settings::{Settings, StoreBackend};
pub use store::{MemoryStore, MongoStore, Store};
pub use thread::CommentThread;
