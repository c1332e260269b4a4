// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Credential storage.
//!
//! GitHub access tokens never touch the cache store. They live in a
//! __credential store__ keyed by account id, normally the operating system's
//! secret store through [`KeyringCredentials`].
//!
//! The single-account schema kept one token under a fixed legacy key. That
//! entry is only ever read, by the cache store migration.

use crate::path::APP_ID;

use std::{
    collections::HashMap,
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Mutex,
};
use tracing::debug;

/// Key of the token stored by the single-account schema.
pub const LEGACY_TOKEN_KEY: &str = "github-token";

/// Opaque GitHub access token.
///
/// Redacted from debug output so it cannot leak into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Construct new token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token, for handing over to the GitHub client.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl Debug for Token {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str("Token(<redacted>)")
    }
}

/// Layer of indirection for token storage.
pub trait CredentialStore {
    /// Store token for account, replacing any previous one.
    fn save(&self, token: &Token, account_id: &str) -> Result<()>;

    /// Load token of account.
    fn load(&self, account_id: &str) -> Result<Token>;

    /// Delete token of account. Deleting a missing token is not an error.
    fn delete(&self, account_id: &str) -> Result<()>;

    /// Load token stored by the single-account schema.
    fn load_legacy(&self) -> Result<Token>;

    /// Check if account has a stored token.
    fn exists(&self, account_id: &str) -> bool {
        self.load(account_id).is_ok()
    }
}

/// Credential storage through the operating system's secret store.
///
/// # Backends
///
/// Keyring ships no platform backend by default, and silently falls back to
/// a mock store that forgets every token. Commit-tracker enables the native
/// ones: Keychain on macOS, Credential Manager on Windows, and the Secret
/// Service (GNOME Keyring, KWallet) over D-Bus elsewhere.
#[derive(Debug, Clone)]
pub struct KeyringCredentials {
    service: String,
}

impl KeyringCredentials {
    /// Construct new keyring credential store under given service name.
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, user: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, user).map_err(CredentialError::from)
    }

    fn user(account_id: &str) -> String {
        format!("{LEGACY_TOKEN_KEY}.{account_id}")
    }
}

impl Default for KeyringCredentials {
    fn default() -> Self {
        Self::new(APP_ID)
    }
}

impl CredentialStore for KeyringCredentials {
    fn save(&self, token: &Token, account_id: &str) -> Result<()> {
        debug!("store token of {account_id:?} in keyring service {:?}", self.service);
        self.entry(&Self::user(account_id))?
            .set_password(token.expose())
            .map_err(CredentialError::from)
    }

    fn load(&self, account_id: &str) -> Result<Token> {
        self.entry(&Self::user(account_id))?
            .get_password()
            .map(Token)
            .map_err(CredentialError::from)
    }

    fn delete(&self, account_id: &str) -> Result<()> {
        debug!("delete token of {account_id:?} from keyring service {:?}", self.service);
        match self.entry(&Self::user(account_id))?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(error.into()),
        }
    }

    fn load_legacy(&self) -> Result<Token> {
        self.entry(LEGACY_TOKEN_KEY)?
            .get_password()
            .map(Token)
            .map_err(CredentialError::from)
    }
}

/// Credential storage held in process memory.
///
/// Nothing survives the process. Useful for tests, and for hosts that
/// manage secrets some other way.
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    tokens: Mutex<HashMap<String, Token>>,
    legacy: Option<Token>,
}

impl MemoryCredentials {
    /// Construct new empty in-memory credential store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct in-memory credential store holding a legacy token.
    pub fn with_legacy(token: Token) -> Self {
        Self {
            tokens: Mutex::default(),
            legacy: Some(token),
        }
    }

    fn tokens(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Token>>> {
        self.tokens
            .lock()
            .map_err(|_| CredentialError::Backend("in-memory credential map is poisoned".into()))
    }
}

impl CredentialStore for MemoryCredentials {
    fn save(&self, token: &Token, account_id: &str) -> Result<()> {
        self.tokens()?.insert(account_id.into(), token.clone());
        Ok(())
    }

    fn load(&self, account_id: &str) -> Result<Token> {
        self.tokens()?
            .get(account_id)
            .cloned()
            .ok_or(CredentialError::NotFound)
    }

    fn delete(&self, account_id: &str) -> Result<()> {
        self.tokens()?.remove(account_id);
        Ok(())
    }

    fn load_legacy(&self) -> Result<Token> {
        self.legacy.clone().ok_or(CredentialError::NotFound)
    }
}

/// Credential storage error types.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// No token stored under requested key.
    #[error("no token stored for this account")]
    NotFound,

    /// Secret store backend failed.
    #[error("credential store failure: {0}")]
    Backend(String),
}

impl From<keyring::Error> for CredentialError {
    fn from(error: keyring::Error) -> Self {
        match error {
            keyring::Error::NoEntry => Self::NotFound,
            other => Self::Backend(other.to_string()),
        }
    }
}

/// Friendly result alias :3
pub type Result<T, E = CredentialError> = std::result::Result<T, E>;
