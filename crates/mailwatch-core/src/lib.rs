//! Shared data model for the mailwatch workspace.

use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

pub const DEFAULT_INTERVAL_SECS: f64 = 3.0;
pub const MIN_INTERVAL_SECS: f64 = 0.5;
pub const DEFAULT_TEXT_LIMIT: usize = 50;
pub const MIN_TEXT_LIMIT: usize = 10;
pub const DEFAULT_RECREATE_INTERVAL: Duration = Duration::from_secs(120);
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_DEDUP_CLEAR_INTERVAL: Duration = Duration::from_secs(300);
pub const DEFAULT_RECENCY_WINDOW: Duration = Duration::from_secs(120);
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// One IMAP account as configured: `"host,user,secret"`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub host: String,
    pub user: String,
    pub secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountParseError {
    #[error("expected three comma-separated fields, got {0}")]
    FieldCount(usize),
    #[error("blank {0} field")]
    BlankField(&'static str),
}

impl Account {
    /// Parses a `"host,user,secret"` descriptor. Fields are trimmed and
    /// must all be non-empty.
    pub fn parse(descriptor: &str) -> Result<Self, AccountParseError> {
        let parts: Vec<&str> = descriptor.split(',').collect();
        if parts.len() != 3 {
            return Err(AccountParseError::FieldCount(parts.len()));
        }
        let host = parts[0].trim();
        let user = parts[1].trim();
        let secret = parts[2].trim();
        for (name, value) in [("host", host), ("user", user), ("secret", secret)] {
            if value.is_empty() {
                return Err(AccountParseError::BlankField(name));
            }
        }
        Ok(Self {
            host: host.to_string(),
            user: user.to_string(),
            secret: secret.to_string(),
        })
    }

    pub fn user_id(&self) -> AccountUser {
        AccountUser(self.user.clone())
    }
}

// The secret must never reach a log line.
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Poller map key: the account's user address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountUser(pub String);

impl fmt::Display for AccountUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Delivery destination key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub String);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What extraction produces for a single message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub received_at: Option<DateTime<Local>>,
    pub subject: String,
    pub body_excerpt: String,
}

/// A message record bound to the account it arrived on, ready for
/// dedup and delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub account_user: AccountUser,
    pub received_at: Option<DateTime<Local>>,
    pub subject: String,
    pub body_excerpt: String,
}

impl Notification {
    pub fn from_record(account_user: AccountUser, record: MessageRecord) -> Self {
        Self {
            account_user,
            received_at: record.received_at,
            subject: record.subject,
            body_excerpt: record.body_excerpt,
        }
    }
}

/// Engine tunables. `normalized` enforces the floors; everything else is
/// taken as configured.
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    pub interval_secs: f64,
    pub text_limit: usize,
    pub recreate_interval: Duration,
    pub check_timeout: Duration,
    pub dedup_clear_interval: Duration,
    pub recency_window: Duration,
    pub stop_timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            text_limit: DEFAULT_TEXT_LIMIT,
            recreate_interval: DEFAULT_RECREATE_INTERVAL,
            check_timeout: DEFAULT_CHECK_TIMEOUT,
            dedup_clear_interval: DEFAULT_DEDUP_CLEAR_INTERVAL,
            recency_window: DEFAULT_RECENCY_WINDOW,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }
}

impl PollConfig {
    pub fn normalized(mut self) -> Self {
        if !self.interval_secs.is_finite() || self.interval_secs < MIN_INTERVAL_SECS {
            self.interval_secs = MIN_INTERVAL_SECS;
        }
        self.text_limit = self.text_limit.max(MIN_TEXT_LIMIT);
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_secs.max(MIN_INTERVAL_SECS))
    }
}

pub const UNKNOWN_TIME_KEY: &str = "unknown";

pub fn dedup_key(
    user: &AccountUser,
    subject: &str,
    received_at: Option<&DateTime<Local>>,
) -> String {
    let minute = received_at
        .map(|t| t.format("%Y%m%d%H%M").to_string())
        .unwrap_or_else(|| UNKNOWN_TIME_KEY.to_string());
    format!("{}|{}|{}", user, subject, minute)
}

/// Rolling set of already-delivered notification keys. The whole set is
/// cleared once its age exceeds the clear interval; keys do not expire
/// individually.
#[derive(Debug)]
pub struct DedupWindow {
    delivered: HashSet<String>,
    last_cleared: Instant,
    clear_interval: Duration,
}

impl DedupWindow {
    pub fn new(clear_interval: Duration) -> Self {
        Self {
            delivered: HashSet::new(),
            last_cleared: Instant::now(),
            clear_interval,
        }
    }

    /// Records the notification key and reports whether it was already
    /// delivered since the last clear.
    pub fn insert_checked(
        &mut self,
        user: &AccountUser,
        subject: &str,
        received_at: Option<&DateTime<Local>>,
    ) -> bool {
        if self.last_cleared.elapsed() > self.clear_interval {
            self.delivered.clear();
            self.last_cleared = Instant::now();
        }
        !self.delivered.insert(dedup_key(user, subject, received_at))
    }

    pub fn len(&self) -> usize {
        self.delivered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty()
    }
}

/// Read accessor over the configured account descriptors. Entries are raw
/// `"host,user,secret"` strings; the caller parses and skips bad ones.
pub trait AccountSource: Send + Sync {
    fn descriptors(&self) -> Vec<String>;
}

/// Where notifications go. One sink serves every registered target; a
/// failure for one target must not affect the others.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn deliver(&self, target: &TargetId, notification: &Notification) -> Result<()>;
}
