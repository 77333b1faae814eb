//! Upstream session credential rotation
//!
//! The pool is built once at startup from the configured credentials and shared
//! behind an `Arc`. Each outbound upstream call takes the next credential in
//! ring order. There is no affinity: consecutive calls for the same job may go
//! out under different credentials.

use crate::error::{Error, Result};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// An opaque upstream session token
///
/// `Debug` and `Display` print the masked form only.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw credential string
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw token, for building the outbound cookie header
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First and last 10 characters when longer than 20, the whole value otherwise
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() > 20 {
            let head: String = chars[..10].iter().collect();
            let tail: String = chars[chars.len() - 10..].iter().collect();
            format!("{head}...{tail}")
        } else {
            self.0.clone()
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

/// Round-robin pool of upstream credentials
///
/// `next()` advances the cursor and reads the slot in one atomic step, so
/// concurrent callers never skip or duplicate a slot.
#[derive(Debug)]
pub struct CredentialPool {
    credentials: Vec<Credential>,
    cursor: AtomicUsize,
}

impl CredentialPool {
    /// Create a pool from raw credential strings, in the given order
    pub fn new<I, S>(credentials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            credentials: credentials.into_iter().map(Credential::new).collect(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Hand out the next credential in ring order
    ///
    /// # Errors
    ///
    /// [`Error::NoCredentialsAvailable`] when the pool is empty. Callers treat
    /// this as fatal for the current operation.
    pub fn next(&self) -> Result<&Credential> {
        if self.credentials.is_empty() {
            return Err(Error::NoCredentialsAvailable);
        }
        let slot = self.cursor.fetch_add(1, Ordering::Relaxed) % self.credentials.len();
        Ok(&self.credentials[slot])
    }

    /// Number of credentials in the pool
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// Whether the pool holds no credentials
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}
