// User-facing side channels of the client core: transient notices and the
// login redirect. Both are injected so the CLI, tests, and any other front
// end can decide how they surface.

use std::fmt;

use tracing::{error, info, warn};

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A transient, human-readable notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Receives notices. The client core emits exactly one error notice per
/// failed call.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

impl<F> Notifier for F
where
    F: Fn(&Notice) + Send + Sync,
{
    fn notify(&self, notice: &Notice) {
        self(notice);
    }
}

/// Default notifier: routes notices into `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Success | NoticeLevel::Info => info!(notice = %notice.message),
            NoticeLevel::Warning => warn!(notice = %notice.message),
            NoticeLevel::Error => error!(notice = %notice.message),
        }
    }
}

/// Invoked by the client core when the server rejects the session (HTTP 401).
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self);
}

impl<F> LoginRedirect for F
where
    F: Fn() + Send + Sync,
{
    fn redirect_to_login(&self) {
        self();
    }
}

/// Redirect that only logs. Used when no front end is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRedirect;

impl LoginRedirect for LogRedirect {
    fn redirect_to_login(&self) {
        warn!("session rejected by server; login required");
    }
}
