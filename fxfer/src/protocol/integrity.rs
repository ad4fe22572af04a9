//! Payload integrity: SHA-256 digest verification
// (c) 2025 fxfer developers

use sha2::{Digest as _, Sha256};

use super::response::{DIGEST_SIZE, ServerResponse};
use crate::Error;

/// Payloads are hashed in chunks of this size
pub const CHUNK_SIZE: usize = 1024;

/// Computes the digest of a payload
#[must_use]
pub fn digest(payload: &[u8]) -> [u8; DIGEST_SIZE] {
    let mut hasher = Sha256::new();
    for chunk in payload.chunks(CHUNK_SIZE) {
        hasher.update(chunk);
    }
    hasher.finalize().into()
}

/// Does `payload` match `expected`?
#[must_use]
pub fn verify(payload: &[u8], expected: &[u8; DIGEST_SIZE]) -> bool {
    digest(payload) == *expected
}

impl ServerResponse {
    /// Checks the payload against the digest the server sent.
    ///
    /// Returns false if either is missing. The caller must check this before acting on the payload.
    #[must_use]
    pub fn verify(&self) -> bool {
        match (&self.payload, &self.digest) {
            (Some(payload), Some(digest)) => verify(payload, digest),
            _ => false,
        }
    }

    /// The payload, if there is one and it passes its integrity check.
    ///
    /// `Ok(None)` means the response carried no payload.
    pub fn verified_payload(&self) -> Result<Option<&[u8]>, Error> {
        match &self.payload {
            None => Ok(None),
            Some(payload) if self.verify() => Ok(Some(payload)),
            Some(_) => Err(Error::Integrity),
        }
    }
}
