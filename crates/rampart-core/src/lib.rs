//! Auth, polling, and mutation layer between `rampart-api` and front ends.
//!
//! - **[`Controller`]** — Facade over the API client. Typed reads call the
//!   endpoint bindings directly; writes are [`Command`]s that emit a success
//!   notice and invalidate the queries they affect.
//!
//! - **[`QueryClient`]** — Key-addressed cache. [`subscribe`](QueryClient::subscribe)
//!   spawns a poll task per observer; triggers for the same [`QueryKey`]
//!   share one in-flight request; [`focus`](QueryClient::focus) and
//!   [`invalidate`](QueryClient::invalidate) force refetches.
//!
//! - **[`AuthService`]** — Login/logout over the session store, with state
//!   published on a `watch` channel.
//!
//! - **[`validate`]** and **[`templates`]** — Client-side checks and built-in
//!   rule bundles.

pub mod auth;
pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod query;
pub mod templates;
pub mod validate;

// ── Primary re-exports ──────────────────────────────────────────────
pub use auth::{AuthService, AuthState};
pub use command::{Command, CommandResult};
pub use config::{ClientConfig, Credentials, DEFAULT_API_URL, RefreshIntervals, TlsVerification};
pub use controller::Controller;
pub use error::CoreError;
pub use query::{
    QueryClient, QueryData, QueryError, QueryFetcher, QueryKey, QueryState, QueryStream,
    RefreshPolicy, Subscription,
};
pub use templates::{RuleTemplate, TemplateId, all_templates};
