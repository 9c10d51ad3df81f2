//! IMAP integration: one blocking TLS session per account plus the
//! per-account poll state machine. Everything here blocks on network I/O;
//! the orchestrator dispatches it onto worker threads.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Local};
use imap::{ClientBuilder, ConnectionMode};
use tracing::{debug, warn};

use mailwatch_core::{Account, AccountUser, Notification};

const IMAPS_PORT: u16 = 993;

/// Message identifiers are IMAP UIDs: per-mailbox, monotonically
/// increasing, so numeric order matches arrival order.
pub type Uid = u32;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// TLS, auth, or socket failure; the account is unreachable this cycle.
    #[error("connection failed: {0}")]
    Connection(String),
    /// The session answered but is no longer usable; discard and reconnect.
    #[error("protocol error: {0}")]
    Protocol(String),
}

fn classify_command_error(err: imap::Error) -> MailError {
    if matches!(err, imap::Error::Io(_) | imap::Error::ConnectionLost) {
        MailError::Connection(err.to_string())
    } else {
        MailError::Protocol(err.to_string())
    }
}

/// The seam between the poller and the wire. `MailboxConnection` is the
/// real IMAP implementation; tests drive the poller with an in-memory one.
pub trait Mailbox {
    fn ensure_connected(&mut self) -> Result<(), MailError>;
    fn search_all(&mut self) -> Result<Vec<Uid>, MailError>;
    fn search_unseen(&mut self) -> Result<Vec<Uid>, MailError>;
    /// `Ok(None)` means the message no longer exists (expunged between
    /// search and fetch) and must be tolerated.
    fn fetch_raw(&mut self, uid: Uid) -> Result<Option<Vec<u8>>, MailError>;
    fn close(&mut self);
}

/// One IMAP/TLS session to one account's INBOX. The session is opened
/// lazily and torn down on any error; the next use reconnects.
pub struct MailboxConnection {
    account: Account,
    session: Option<imap::Session<imap::Connection>>,
}

impl MailboxConnection {
    pub fn new(account: Account) -> Self {
        Self {
            account,
            session: None,
        }
    }

    /// One-shot credential check: connect, login, select, logout. Failure
    /// is reported, never raised.
    pub fn test_connection(account: &Account) -> (bool, Option<String>) {
        match Self::open_session(account) {
            Ok(mut session) => {
                let _ = session.logout();
                (true, None)
            }
            Err(err) => (false, Some(err.to_string())),
        }
    }

    fn open_session(account: &Account) -> Result<imap::Session<imap::Connection>, MailError> {
        let client = ClientBuilder::new(account.host.as_str(), IMAPS_PORT)
            .tls_kind(imap::TlsKind::Native)
            .mode(ConnectionMode::Tls)
            .connect()
            .map_err(|err| MailError::Connection(err.to_string()))?;
        let mut session = client
            .login(&account.user, &account.secret)
            .map_err(|err| MailError::Connection(err.0.to_string()))?;
        session
            .select("INBOX")
            .map_err(|err| MailError::Connection(err.to_string()))?;
        Ok(session)
    }

    fn session(&mut self) -> Result<&mut imap::Session<imap::Connection>, MailError> {
        self.session
            .as_mut()
            .ok_or_else(|| MailError::Protocol("no live session".to_string()))
    }

    fn search(&mut self, query: &str) -> Result<Vec<Uid>, MailError> {
        let result = self
            .session()?
            .uid_search(query)
            .map_err(classify_command_error)?;
        let mut uids: Vec<Uid> = result.into_iter().collect();
        uids.sort_unstable();
        Ok(uids)
    }
}

impl Mailbox for MailboxConnection {
    fn ensure_connected(&mut self) -> Result<(), MailError> {
        if let Some(session) = self.session.as_mut() {
            if session.noop().is_ok() {
                return Ok(());
            }
            debug!(user = %self.account.user, "keep-alive probe failed, reconnecting");
        }
        self.close();
        self.session = Some(Self::open_session(&self.account)?);
        Ok(())
    }

    fn search_all(&mut self) -> Result<Vec<Uid>, MailError> {
        self.search("ALL")
    }

    fn search_unseen(&mut self) -> Result<Vec<Uid>, MailError> {
        self.search("UNSEEN")
    }

    fn fetch_raw(&mut self, uid: Uid) -> Result<Option<Vec<u8>>, MailError> {
        let fetches = self
            .session()?
            .uid_fetch(uid.to_string(), "RFC822")
            .map_err(classify_command_error)?;
        Ok(fetches.iter().find_map(|fetch| fetch.body().map(|b| b.to_vec())))
    }

    fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            let _ = session.logout();
        }
    }
}

/// Per-account poll state machine. The cursor is the highest UID already
/// accounted for; only strictly newer UIDs are ever fetched. The first
/// successful poll establishes the cursor without emitting anything, so
/// mailbox history is never replayed.
pub struct AccountPoller<M: Mailbox> {
    mailbox: M,
    user: AccountUser,
    cursor: Option<Uid>,
    text_limit: usize,
    recency_window: Duration,
}

pub type ImapPoller = AccountPoller<MailboxConnection>;

impl ImapPoller {
    /// Builds a poller over a real IMAP connection. No network I/O happens
    /// until the first `poll`.
    pub fn for_account(account: Account, text_limit: usize, recency_window: Duration) -> Self {
        let user = account.user_id();
        Self::new(MailboxConnection::new(account), user, text_limit, recency_window)
    }
}

impl<M: Mailbox> AccountPoller<M> {
    pub fn new(mailbox: M, user: AccountUser, text_limit: usize, recency_window: Duration) -> Self {
        Self {
            mailbox,
            user,
            cursor: None,
            text_limit,
            recency_window,
        }
    }

    pub fn user(&self) -> &AccountUser {
        &self.user
    }

    pub fn cursor(&self) -> Option<Uid> {
        self.cursor
    }

    /// Carries a cursor across a poller rebuild so reconnection never
    /// reintroduces already-seen mail.
    pub fn restore_cursor(&mut self, cursor: Option<Uid>) {
        self.cursor = cursor;
    }

    /// Checks for new mail. On any error the connection is discarded, the
    /// cursor rolls back to its value at entry, and the half-processed
    /// batch is dropped; the next successful poll resumes from the same
    /// point.
    pub fn poll(&mut self) -> Result<Vec<Notification>, MailError> {
        let entry_cursor = self.cursor;
        match self.poll_inner() {
            Ok(notifications) => Ok(notifications),
            Err(err) => {
                self.cursor = entry_cursor;
                self.mailbox.close();
                Err(err)
            }
        }
    }

    fn poll_inner(&mut self) -> Result<Vec<Notification>, MailError> {
        self.mailbox.ensure_connected()?;

        let all = self.mailbox.search_all()?;
        let newest = all.last().copied();
        let baseline = match self.cursor {
            Some(cursor) if !all.is_empty() => cursor,
            _ => {
                if self.cursor.is_none() {
                    self.cursor = newest;
                    debug!(user = %self.user, cursor = ?self.cursor, "baseline established");
                }
                return Ok(Vec::new());
            }
        };

        // Unseen first: catches mail another client marked read between
        // polls. UNSEEN failing is not worth aborting the cycle over.
        let unseen = match self.mailbox.search_unseen() {
            Ok(unseen) => unseen,
            Err(err) => {
                warn!(user = %self.user, error = %err, "unseen search failed, using all-mail pass only");
                Vec::new()
            }
        };

        let mut processed: HashSet<Uid> = HashSet::new();
        let mut notifications = Vec::new();
        for uid in unseen.into_iter().chain(all) {
            if uid <= baseline || !processed.insert(uid) {
                continue;
            }
            self.handle_message(uid, &mut notifications)?;
        }
        Ok(notifications)
    }

    fn handle_message(
        &mut self,
        uid: Uid,
        out: &mut Vec<Notification>,
    ) -> Result<(), MailError> {
        let raw = match self.mailbox.fetch_raw(uid)? {
            Some(raw) => raw,
            None => {
                debug!(user = %self.user, uid, "message vanished before fetch");
                self.advance_cursor(uid);
                return Ok(());
            }
        };
        let record = mailwatch_content::extract(&raw, self.text_limit);
        if self.is_recent(record.received_at.as_ref()) {
            out.push(Notification::from_record(self.user.clone(), record));
        } else {
            debug!(user = %self.user, uid, "stale message, cursor advanced without notifying");
        }
        self.advance_cursor(uid);
        Ok(())
    }

    /// Unknown receive time errs toward notifying; a known time must fall
    /// within the trailing recency window.
    fn is_recent(&self, received_at: Option<&DateTime<Local>>) -> bool {
        let Some(received_at) = received_at else {
            return true;
        };
        let age = Local::now().signed_duration_since(*received_at);
        age.num_milliseconds() <= self.recency_window.as_millis() as i64
    }

    fn advance_cursor(&mut self, uid: Uid) {
        if self.cursor.is_none_or(|cursor| uid > cursor) {
            self.cursor = Some(uid);
        }
    }

    /// Releases the connection; the cursor is kept for carry-over.
    pub fn close(&mut self) {
        self.mailbox.close();
    }
}
