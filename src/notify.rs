//! User-facing notices raised by the request client.
//!
//! The browser panel shows modals and toasts; here the presentation layer
//! is whatever implements `Notifier`. The CLI prints to stderr, tests
//! record, and headless callers can just log.

use std::sync::Mutex;

/// How loudly a notice should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Blocking error dialog.
    Fatal,
    /// Blocking warning dialog (401).
    Warning,
    /// Short-lived toast.
    Transient,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub title: String,
    pub content: String,
}

impl Notice {
    pub fn new(severity: Severity, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Presentation hooks the request client calls on failure.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);

    /// Send the user to another screen (the login screen after a 401).
    fn redirect(&self, path: &str);
}

/// Notifier that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Fatal => log::error!("{}: {}", notice.title, notice.content),
            Severity::Warning => log::warn!("{}: {}", notice.title, notice.content),
            Severity::Transient => log::info!("{}", notice.content),
        }
    }

    fn redirect(&self, path: &str) {
        log::info!("Redirect requested to {}", path);
    }
}

/// Notifier that keeps everything it receives, for inspection.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
    redirects: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }

    fn redirect(&self, path: &str) {
        if let Ok(mut redirects) = self.redirects.lock() {
            redirects.push(path.to_string());
        }
    }
}
