// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Domain errors shared by the ledger, account store and persistence layer.

/// Every failure a ledger or account operation can report to its caller.
///
/// None of these are retried automatically. The CLI turns them into a message
/// for the triggering command and exits.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum Error {
    /// Username and password did not match any account.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The account logged in from another context after this one did.
    #[error("logged out: this account signed in from another window or device")]
    SessionSuperseded,

    /// The command needs a logged-in context.
    #[error("not logged in")]
    NotLoggedIn,

    /// The mutation would leave the system without an admin account.
    #[error("at least one admin account must remain")]
    LastAdmin,

    /// An account tried to delete itself while logged in.
    #[error("you cannot delete the account you are logged in with")]
    SelfDelete,

    #[error("username '{0}' already exists")]
    DuplicateUsername(String),

    #[error("username and password must not be empty")]
    EmptyCredentials,

    #[error("account '{0}' not found")]
    AccountNotFound(String),

    /// A snapshot file was not JSON or lacked the ledger keys.
    #[error("invalid backup file: {0}")]
    InvalidBackupFile(String),

    /// The extraction service call failed or returned something unusable.
    #[error("extraction failed: {0}")]
    ExtractionFailure(String),

    /// Another ingestion on the same ingestor has not finished yet.
    #[error("an ingestion is already in progress")]
    IngestionInProgress,

    /// A rate edit that did not parse as a number. The previous rate stays.
    #[error("invalid rate '{0}'")]
    InvalidRate(String),

    #[error("currency '{0}' already exists")]
    CurrencyExists(String),

    #[error("invalid currency code '{0}'")]
    InvalidCurrency(String),

    #[error("invalid amount '{0}'")]
    InvalidAmount(String),

    /// The key-value store failed underneath us.
    #[error("storage error: {0}")]
    Storage(String),

    /// A stored document could not be encoded or decoded.
    #[error("could not (de)serialize {0}")]
    Serialization(String),
}

impl Error {
    /// Inputs the ledger rejects without changing any state.
    pub fn is_ignored_input(&self) -> bool {
        matches!(
            self,
            Error::InvalidRate(_) | Error::CurrencyExists(_) | Error::InvalidCurrency(_)
        )
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        Error::Storage(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Serialization(value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
