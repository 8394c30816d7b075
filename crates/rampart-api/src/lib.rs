// rampart-api: Async Rust client for the rampart firewall management API

pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod notify;
pub mod session;
pub mod transport;

pub use client::{ApiClient, RequestOptions};
pub use error::Error;
pub use models::*;
pub use notify::{LogRedirect, LoginRedirect, Notice, NoticeLevel, Notifier, TracingNotifier};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
pub use transport::{TlsMode, TransportConfig};
