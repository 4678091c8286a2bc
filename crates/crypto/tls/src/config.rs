//! Per-connection configuration: protocol-version bounds, cipher suite
//! preference order, trust store, ALPN protocol list and PSK store.
//!
//! A [Config] is reference-counted (spec.md §9's "cyclic references between
//! connection and config use shared ownership with a runtime refcount"
//! resolution) so the same configuration can be attached to many connections
//! without cloning the trust store or PSK material for each one. It is built
//! through [ConfigBuilder] and becomes immutable the moment it is handed to a
//! [`crate::connection::Connection`]: further mutating calls return
//! [`TLSError::State`] instead of silently changing a configuration already
//! in use by a live handshake.

use std::cell::Cell;
use std::rc::Rc;

use crate::{
    certificate::X509Certificate,
    cipher_suite::CipherSuite,
    connection::ProtocolVersion,
    psk::{Psk, PskStore},
    TLSError,
};

/// RFC 5246/8446 wire values for the versions this crate negotiates.
const TLS_1_0: ProtocolVersion = ProtocolVersion::new(3, 1);
const TLS_1_3: ProtocolVersion = ProtocolVersion::new(3, 4);

pub struct Config {
    min_version: ProtocolVersion,
    max_version: ProtocolVersion,
    cipher_suites: Vec<CipherSuite>,
    trust_store: Vec<X509Certificate>,
    alpn_protocols: Vec<String>,
    psk_store: PskStore,
    /// Set once this config is attached to a connection; blocks further
    /// mutation through the `add_*`/`set_*` methods below.
    attached: Cell<bool>,
}

impl Config {
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    #[must_use]
    pub const fn min_version(&self) -> ProtocolVersion {
        self.min_version
    }

    #[must_use]
    pub const fn max_version(&self) -> ProtocolVersion {
        self.max_version
    }

    #[must_use]
    pub fn cipher_suites(&self) -> &[CipherSuite] {
        &self.cipher_suites
    }

    #[must_use]
    pub fn trust_store(&self) -> &[X509Certificate] {
        &self.trust_store
    }

    #[must_use]
    pub fn alpn_protocols(&self) -> &[String] {
        &self.alpn_protocols
    }

    #[must_use]
    pub const fn psk_store(&self) -> &PskStore {
        &self.psk_store
    }

    /// Called by [`crate::connection::Connection::client`]/`server` the
    /// moment this config is wrapped in the `Rc` a connection holds onto.
    pub(crate) fn mark_attached(&self) {
        self.attached.set(true);
    }

    /// Registers an additional pre-shared key. Fails once this config has
    /// been attached to a connection.
    pub fn add_psk(&mut self, psk: Psk) -> Result<(), TLSError> {
        if self.attached.get() {
            return Err(TLSError::State);
        }
        self.psk_store.push(psk);
        Ok(())
    }
}

/// Builds an immutable [Config]. Mirrors the order `TLSConnection::establish`
/// used to configure a connection before this type existed, now split out so
/// the non-blocking [`crate::connection::Connection`] has somewhere to keep
/// that state instead of a socket.
pub struct ConfigBuilder {
    min_version: ProtocolVersion,
    max_version: ProtocolVersion,
    cipher_suites: Vec<CipherSuite>,
    trust_store: Vec<X509Certificate>,
    alpn_protocols: Vec<String>,
    psk_store: PskStore,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_version: TLS_1_0,
            max_version: TLS_1_3,
            cipher_suites: vec![],
            trust_store: vec![],
            alpn_protocols: vec![],
            psk_store: PskStore::new(),
        }
    }

    #[must_use]
    pub const fn min_version(mut self, version: ProtocolVersion) -> Self {
        self.min_version = version;
        self
    }

    #[must_use]
    pub const fn max_version(mut self, version: ProtocolVersion) -> Self {
        self.max_version = version;
        self
    }

    /// Sets the cipher suite preference order, most-preferred first.
    #[must_use]
    pub fn cipher_suites(mut self, suites: Vec<CipherSuite>) -> Self {
        self.cipher_suites = suites;
        self
    }

    #[must_use]
    pub fn trust(mut self, certificate: X509Certificate) -> Self {
        self.trust_store.push(certificate);
        self
    }

    #[must_use]
    pub fn alpn_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.alpn_protocols.push(protocol.into());
        self
    }

    #[must_use]
    pub fn psk(mut self, psk: Psk) -> Self {
        self.psk_store.push(psk);
        self
    }

    #[must_use]
    pub fn build(self) -> Rc<Config> {
        Rc::new(Config {
            min_version: self.min_version,
            max_version: self.max_version,
            cipher_suites: self.cipher_suites,
            trust_store: self.trust_store,
            alpn_protocols: self.alpn_protocols,
            psk_store: self.psk_store,
            attached: Cell::new(false),
        })
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_carries_cipher_suite_preference_order() {
        let config = Config::builder()
            .cipher_suites(vec![CipherSuite::TLS_AES_128_GCM_SHA256, CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA])
            .build();

        assert_eq!(
            config.cipher_suites(),
            &[CipherSuite::TLS_AES_128_GCM_SHA256, CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA]
        );
    }

    #[test]
    fn mutating_an_attached_config_is_rejected() {
        let config = Config::builder().build();
        config.mark_attached();

        let mut config = Rc::try_unwrap(config).unwrap_or_else(|_| panic!("config has other owners"));
        let err = config.add_psk(Psk::external(b"id".to_vec(), vec![0; 32], crate::cipher_suite::PrfHash::Sha256));
        assert!(matches!(err, Err(TLSError::State)));
    }
}
