//! Outgoing email. Delivery providers and HTML templates live outside this
//! crate; the portal only decides *what* to send.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::{PortalError, Result};

/// A message the portal sends to one of its users
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    SignupOtp {
        to: String,
        name: String,
        code: String,
        expires_in_minutes: i64,
    },
    PasswordReset {
        to: String,
        name: String,
        reset_url: String,
        expires_in_minutes: i64,
    },
}

impl Notification {
    pub fn recipient(&self) -> &str {
        match self {
            Self::SignupOtp { to, .. } | Self::PasswordReset { to, .. } => to,
        }
    }

    pub fn subject(&self) -> String {
        match self {
            Self::SignupOtp {
                expires_in_minutes, ..
            } => format!("Your OTP for Signup (valid for {expires_in_minutes} min)"),
            Self::PasswordReset {
                expires_in_minutes, ..
            } => format!("Your password reset token (valid for {expires_in_minutes} min)"),
        }
    }

    /// Plain-text body
    pub fn body(&self) -> String {
        match self {
            Self::SignupOtp {
                name,
                code,
                expires_in_minutes,
                ..
            } => format!(
                "Hi {name},\n\nYour OTP code is {code}. It will expire in {expires_in_minutes} minutes."
            ),
            Self::PasswordReset {
                name,
                reset_url,
                expires_in_minutes,
                ..
            } => format!(
                "Hi {name},\n\nForgot your password? Set a new one at {reset_url}\n\
                 The link is valid for {expires_in_minutes} minutes. If you didn't \
                 request a reset, please ignore this email."
            ),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<()>;
}

/// Writes notifications to the log instead of delivering them. The body
/// carries the OTP or reset link, so it is logged at `info`, the level the
/// server runs at by default.
#[derive(Debug, Clone)]
pub struct LogMailer {
    sender: String,
}

impl LogMailer {
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, notification: Notification) -> Result<()> {
        info!(
            "📧 {} -> {}: {}\n{}",
            self.sender,
            notification.recipient(),
            notification.subject(),
            notification.body()
        );
        Ok(())
    }
}

/// Keeps every notification in memory; used by tests to read OTPs and reset
/// links, and to simulate delivery failures.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    outbox: Arc<Mutex<Vec<Notification>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<Notification> {
        self.outbox.lock().await.clone()
    }

    /// Most recent signup code mailed to `email`
    pub async fn last_otp_for(&self, email: &str) -> Option<String> {
        self.outbox
            .lock()
            .await
            .iter()
            .rev()
            .find_map(|n| match n {
                Notification::SignupOtp { to, code, .. } if to == email => Some(code.clone()),
                _ => None,
            })
    }

    /// Raw token from the most recent reset link mailed to `email`
    pub async fn last_reset_token_for(&self, email: &str) -> Option<String> {
        self.outbox
            .lock()
            .await
            .iter()
            .rev()
            .find_map(|n| match n {
                Notification::PasswordReset { to, reset_url, .. } if to == email => {
                    reset_url.rsplit('/').next().map(str::to_string)
                }
                _ => None,
            })
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, notification: Notification) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PortalError::mail_error(format!(
                "delivery to {} refused",
                notification.recipient()
            )));
        }
        self.outbox.lock().await.push(notification);
        Ok(())
    }
}
