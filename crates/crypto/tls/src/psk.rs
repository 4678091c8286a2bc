//! Pre-shared keys (RFC 8446 §4.2.11): external PSKs configured ahead of time
//! and resumption PSKs derived from a previous session's `NewSessionTicket`.
//!
//! A connection holds its configured PSKs as an ordered list (insertion order
//! preserved, per spec.md §3's "PSK" entry); selection during the handshake
//! produces an index into that list, surfaced back to the embedder as the
//! identity bytes of the PSK that was actually used.

use crate::{
    cipher_suite::PrfHash,
    key_schedule::hkdf_expand_label,
    provider::{Hmac, HmacSha256, HmacSha384},
    TLSError,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PskKind {
    /// Configured out-of-band by the embedder before any connection exists.
    External,
    /// Derived from a `NewSessionTicket` issued by a prior connection.
    Resumption,
}

#[derive(Clone, Debug)]
pub struct Psk {
    pub kind: PskKind,
    pub identity: Vec<u8>,
    pub secret: Vec<u8>,
    pub hash: PrfHash,
    /// `NewSessionTicket.ticket_age_add`-obfuscated age, for resumption PSKs.
    pub obfuscated_ticket_age: Option<u32>,
}

impl Psk {
    #[must_use]
    pub const fn external(identity: Vec<u8>, secret: Vec<u8>, hash: PrfHash) -> Self {
        Self {
            kind: PskKind::External,
            identity,
            secret,
            hash,
            obfuscated_ticket_age: None,
        }
    }

    /// `Derive-Secret(psk, "finished", "")` bound to this PSK's own hash,
    /// used to key the PSK binder HMAC (RFC 8446 §4.2.11.2).
    fn finished_key(&self) -> Vec<u8> {
        let len = match self.hash {
            PrfHash::Sha384 => 48,
            PrfHash::Sha256 | PrfHash::Md5Sha1 => 32,
        };
        hkdf_expand_label(&self.secret, b"finished", &[], len)
    }

    /// The PSK binder (RFC 8446 §4.2.11.2): `HMAC(finished_key, transcript_hash)`,
    /// where `transcript_hash` covers the ClientHello up to and excluding the
    /// binder list itself.
    #[must_use]
    pub fn binder(&self, transcript_hash_up_to_binders: &[u8]) -> Vec<u8> {
        let finished_key = self.finished_key();
        match self.hash {
            PrfHash::Sha384 => HmacSha384::mac(&finished_key, transcript_hash_up_to_binders),
            PrfHash::Sha256 | PrfHash::Md5Sha1 => HmacSha256::mac(&finished_key, transcript_hash_up_to_binders),
        }
    }

    /// Verifies a binder received from the peer in constant time.
    #[must_use]
    pub fn verify_binder(&self, transcript_hash_up_to_binders: &[u8], received: &[u8]) -> bool {
        let expected = self.binder(transcript_hash_up_to_binders);
        expected.len() == received.len() && expected.iter().zip(received).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
    }
}

/// The ordered list of PSKs a [`crate::config::Config`] or connection holds.
/// Selection is a callback into the embedder: it is handed the identities the
/// peer offered and returns the index of the one to use, if any (spec.md
/// §5's "blocked_on_app_callback").
#[derive(Clone, Debug, Default)]
pub struct PskStore {
    psks: Vec<Psk>,
}

impl PskStore {
    #[must_use]
    pub const fn new() -> Self {
        Self { psks: vec![] }
    }

    pub fn push(&mut self, psk: Psk) {
        self.psks.push(psk);
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Psk] {
        &self.psks
    }

    /// Finds the PSK whose identity bytes exactly match `identity`, returning
    /// its index, the same index `get_selected_psk_identity` would report.
    #[must_use]
    pub fn find_by_identity(&self, identity: &[u8]) -> Option<usize> {
        self.psks.iter().position(|psk| psk.identity == identity)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Psk> {
        self.psks.get(index)
    }
}

/// Looks up `index` in `store`, the final step of PSK selection once the
/// embedder (or, in the absence of a callback, the first-match default) has
/// picked one.
pub fn resolve_selected_psk(store: &PskStore, index: usize) -> Result<&Psk, TLSError> {
    store.get(index).ok_or(TLSError::BadMessage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binder_roundtrips_through_verification() {
        let psk = Psk::external(b"one".to_vec(), vec![0x42; 32], PrfHash::Sha256);
        let transcript = b"client-hello-prefix";
        let binder = psk.binder(transcript);
        assert!(psk.verify_binder(transcript, &binder));
    }

    #[test]
    fn binder_rejects_wrong_transcript() {
        let psk = Psk::external(b"one".to_vec(), vec![0x42; 32], PrfHash::Sha256);
        let binder = psk.binder(b"client-hello-prefix");
        assert!(!psk.verify_binder(b"different-prefix", &binder));
    }

    #[test]
    fn store_preserves_insertion_order_and_finds_by_identity() {
        let mut store = PskStore::new();
        store.push(Psk::external(b"one".to_vec(), vec![1; 32], PrfHash::Sha256));
        store.push(Psk::external(b"two".to_vec(), vec![2; 32], PrfHash::Sha256));

        assert_eq!(store.find_by_identity(b"two"), Some(1));
        assert_eq!(resolve_selected_psk(&store, 1).unwrap().identity, b"two");
    }
}
