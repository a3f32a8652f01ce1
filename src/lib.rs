//! # CrewDesk
//!
//! Client library for the CrewDesk volunteer-scheduling service. The backend
//! REST API owns every entity; this crate holds the session, routes between
//! screens, drives the recurring-event composer and the SMS broadcast
//! composer, and keeps one state object per screen.
//!
//! ## Modules
//!
//! - [`api`]: authenticated REST client and wire types
//! - [`session`]: logged-in user, organization and token
//! - [`storage`]: `localStorage`-style key/value store
//! - [`router`]: path → screen/view resolution with history
//! - [`recurrence`]: recurring-event expansion and debounced preview
//! - [`views`]: per-screen state (broadcast, invitations, billing, ...)
//! - [`i18n`]: locale catalogs and keyed translation
//! - [`notify`]: toast queue
//! - [`app`]: the context that wires it all together
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use crewdesk::{AppContext, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ctx = AppContext::open(Config::load_default())?;
//!     ctx.api.login("coord@example.org", "correct horse").await?;
//!
//!     let (mut router, loader) = ctx.router();
//!     let route = router.navigate("/app/people").await;
//!     println!("{:?} -> {:?}", route.view, loader.data(crewdesk::router::View::People));
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod i18n;
pub mod notify;
pub mod recurrence;
pub mod router;
pub mod session;
pub mod storage;
pub mod views;

pub use api::{ApiClient, ApiError, ApiResult};
pub use app::{AppContext, ApiViewLoader, ViewData};
pub use config::{Config, ConfigError};
pub use i18n::{I18n, I18nError, LocaleSource};
pub use notify::{Toast, ToastKind, Toasts};
pub use recurrence::{PreviewController, RecurrenceError, RecurrencePattern};
pub use router::{Location, RouteState, Router, Screen, TokenValidator, View, ViewLoader};
pub use session::{Organization, Session, SessionManager, User};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError, StorageResult};
