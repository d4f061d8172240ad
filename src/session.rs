// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Login state of one context, and the background watcher that logs the
//! context out once the account signs in somewhere else.
//!
//! A context is the CLI counterpart of a browser tab: it keeps one token for
//! its whole life and remembers which account it is logged in as. Detection
//! of a newer login is poll based, so two contexts may both believe they are
//! active for up to one poll interval.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::accounts::{AccountStore, SessionStatus};
use crate::error::{Error, Result};
use crate::models::Account;
use crate::persistence::Persistence;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct ContextSession {
    persistence: Persistence,
    accounts: AccountStore,
    context: String,
    token: String,
}

impl ContextSession {
    pub fn open(persistence: Persistence, accounts: AccountStore, context: &str) -> Result<Self> {
        let token = persistence.context_token(context)?;
        Ok(ContextSession {
            persistence,
            accounts,
            context: context.to_string(),
            token,
        })
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn login(&self, username: &str, password: &str) -> Result<Account> {
        let account = self.accounts.login(username, password, &self.token)?;
        self.persistence.set_context_user(&self.context, &account.id)?;
        Ok(account)
    }

    /// Leave the session. The account marker is only cleared while it still
    /// names this context, so a newer session elsewhere survives.
    pub fn logout(&self) -> Result<()> {
        if let Some(id) = self.persistence.context_user(&self.context)? {
            if self.accounts.check_session(&id, &self.token)? == SessionStatus::Active {
                self.accounts.logout(&id)?;
            }
            self.persistence.clear_context_user(&self.context)?;
        }
        Ok(())
    }

    /// The single validity check shared by polling and change notifications.
    /// A superseded or vanished session is logged out locally.
    pub fn check(&self) -> Result<SessionStatus> {
        let id = self
            .persistence
            .context_user(&self.context)?
            .ok_or(Error::NotLoggedIn)?;
        let status = self.accounts.check_session(&id, &self.token)?;
        match status {
            SessionStatus::Active => {}
            SessionStatus::Superseded => {
                tracing::warn!(context = %self.context, "session superseded; logging out");
                self.persistence.clear_context_user(&self.context)?;
            }
            SessionStatus::Missing => {
                tracing::warn!(context = %self.context, "account no longer exists; logging out");
                self.persistence.clear_context_user(&self.context)?;
            }
        }
        Ok(status)
    }

    /// The logged-in account, after a validity check.
    pub fn current(&self) -> Result<Account> {
        let id = self
            .persistence
            .context_user(&self.context)?
            .ok_or(Error::NotLoggedIn)?;
        match self.check()? {
            SessionStatus::Active => self.accounts.find(&id),
            SessionStatus::Superseded => Err(Error::SessionSuperseded),
            SessionStatus::Missing => Err(Error::NotLoggedIn),
        }
    }
}

enum Signal {
    Check,
    Stop,
}

/// Runs a session check every interval and on demand until the session ends
/// or the watcher is stopped.
pub struct SessionWatcher {
    tx: mpsc::Sender<Signal>,
    handle: Option<JoinHandle<()>>,
}

impl SessionWatcher {
    /// `on_end` receives the outcome that ended the session: a non-active
    /// status or a non-storage error. Storage errors are logged and the next
    /// poll tries again.
    pub fn spawn<C, E>(interval: Duration, mut check: C, on_end: E) -> Self
    where
        C: FnMut() -> Result<SessionStatus> + Send + 'static,
        E: FnOnce(Result<SessionStatus>) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            loop {
                match rx.recv_timeout(interval) {
                    Ok(Signal::Check) | Err(RecvTimeoutError::Timeout) => {}
                    Ok(Signal::Stop) | Err(RecvTimeoutError::Disconnected) => return,
                }
                match check() {
                    Ok(SessionStatus::Active) => {}
                    Err(e @ (Error::Storage(_) | Error::Serialization(_))) => {
                        tracing::warn!(error = %e, "session check failed; retrying on next poll");
                    }
                    outcome => {
                        on_end(outcome);
                        return;
                    }
                }
            }
        });
        SessionWatcher {
            tx,
            handle: Some(handle),
        }
    }

    /// Change notification: check now instead of waiting for the next tick.
    pub fn notify(&self) {
        let _ = self.tx.send(Signal::Check);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Block until the watcher ends on its own.
    pub fn join(mut self) {
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.tx.send(Signal::Stop);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

impl Drop for SessionWatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
