//! TLS cipher suites, as registered by IANA and referenced throughout
//! [RFC 5246 Appendix A.5](https://www.rfc-editor.org/rfc/rfc5246#appendix-A.5) and
//! [RFC 8446 Appendix B.4](https://www.rfc-editor.org/rfc/rfc8446#appendix-B.4).

use crate::TLSError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum CipherSuite {
    /// Used during the initial handshake (before any keys have been exchanged).
    /// **MUST NOT** be negotiated since it provides no security.
    TLS_NULL_WITH_NULL_NULL,
    TLS_RSA_WITH_NULL_MD5,
    TLS_RSA_WITH_NULL_SHA,
    TLS_RSA_WITH_NULL_SHA256,
    TLS_RSA_WITH_RC4_128_MD5,
    TLS_RSA_WITH_RC4_128_SHA,
    TLS_RSA_WITH_3DES_EDE_CBC_SHA,
    TLS_RSA_WITH_AES_128_CBC_SHA,
    TLS_RSA_WITH_AES_256_CBC_SHA,
    TLS_RSA_WITH_AES_128_CBC_SHA256,
    TLS_RSA_WITH_AES_256_CBC_SHA256,
    // Diffie-Hellman suites
    TLS_DH_DSS_WITH_3DES_EDE_CBC_SHA,
    TLS_DH_RSA_WITH_3DES_EDE_CBC_SHA,
    TLS_DHE_DSS_WITH_3DES_EDE_CBC_SHA,
    TLS_DHE_RSA_WITH_3DES_EDE_CBC_SHA,
    TLS_DH_DSS_WITH_AES_128_CBC_SHA,
    TLS_DH_RSA_WITH_AES_128_CBC_SHA,
    TLS_DHE_DSS_WITH_AES_128_CBC_SHA,
    TLS_DHE_RSA_WITH_AES_128_CBC_SHA,
    TLS_DH_DSS_WITH_AES_256_CBC_SHA,
    TLS_DH_RSA_WITH_AES_256_CBC_SHA,
    TLS_DHE_DSS_WITH_AES_256_CBC_SHA,
    TLS_DHE_RSA_WITH_AES_256_CBC_SHA,
    TLS_DH_DSS_WITH_AES_128_CBC_SHA256,
    TLS_DH_RSA_WITH_AES_128_CBC_SHA256,
    TLS_DHE_DSS_WITH_AES_128_CBC_SHA256,
    TLS_DHE_RSA_WITH_AES_128_CBC_SHA256,
    TLS_DH_DSS_WITH_AES_256_CBC_SHA256,
    TLS_DH_RSA_WITH_AES_256_CBC_SHA256,
    TLS_DHE_DSS_WITH_AES_256_CBC_SHA256,
    TLS_DHE_RSA_WITH_AES_256_CBC_SHA256,
    // Anonymous Diffie-Hellman suites
    // NOTE: These are vulnerable to MITM.
    // They must not be used unless explicitly requested by the application layer.
    TLS_DH_anon_WITH_RC4_128_MD5,
    TLS_DH_anon_WITH_3DES_EDE_CBC_SHA,
    TLS_DH_anon_WITH_AES_128_CBC_SHA,
    TLS_DH_anon_WITH_AES_256_CBC_SHA,
    TLS_DH_anon_WITH_AES_128_CBC_SHA256,
    TLS_DH_anon_WITH_AES_256_CBC_SHA256,
    // Elliptic-curve suites (RFC 8422), the ones actually reachable by this crate's
    // key-exchange code.
    TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA,
    TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA,
    TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
    TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
    TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
    TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
    // TLS 1.3 suites (RFC 8446 §B.4) - no key exchange/auth component, those are
    // negotiated separately via `key_share`/`signature_algorithms`.
    TLS_AES_128_GCM_SHA256,
    TLS_AES_256_GCM_SHA384,
    TLS_CHACHA20_POLY1305_SHA256,
}

/// The asymmetric key exchange method a suite uses, or `None` for TLS 1.3 suites
/// (where it is negotiated independently via `key_share`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyExchangeAlgorithm {
    None,
    Rsa,
    Dh,
    DhAnon,
    Ecdhe,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMethod {
    /// TLS 1.3: authentication is always via the certificate's own signature
    /// scheme, not tied to the suite.
    Any,
    Rsa,
    Ecdsa,
    Anonymous,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BulkCipher {
    Null,
    Rc4_128,
    TripleDesEdeCbc,
    Aes128Cbc,
    Aes256Cbc,
    Aes128Gcm,
    Aes256Gcm,
    ChaCha20Poly1305,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mac {
    Null,
    Md5,
    Sha1,
    Sha256,
    /// Integrated into the AEAD cipher itself (GCM / ChaCha20-Poly1305).
    Aead,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrfHash {
    Md5Sha1,
    Sha256,
    Sha384,
}

/// The immutable, statically-known properties of a cipher suite (§3 "Cipher suite
/// descriptor"): how it negotiates keys, authenticates the peer, and protects
/// records, plus the minimum protocol version it may be used with.
#[derive(Clone, Copy, Debug)]
pub struct CipherSuiteDescriptor {
    pub suite: CipherSuite,
    pub key_exchange: KeyExchangeAlgorithm,
    pub auth: AuthMethod,
    pub cipher: BulkCipher,
    pub mac: Mac,
    pub min_version: (u8, u8),
    pub prf_hash: PrfHash,
}

impl CipherSuite {
    #[must_use]
    pub const fn descriptor(self) -> CipherSuiteDescriptor {
        use AuthMethod::*;
        use BulkCipher::*;
        use KeyExchangeAlgorithm::*;
        use Mac::*;
        use PrfHash::*;

        let (key_exchange, auth, cipher, mac, min_version, prf_hash) = match self {
            Self::TLS_NULL_WITH_NULL_NULL => (None, Any, Null, Null, (3, 1), Md5Sha1),
            Self::TLS_RSA_WITH_NULL_MD5 => (Rsa, Rsa, Null, Md5, (3, 1), Md5Sha1),
            Self::TLS_RSA_WITH_NULL_SHA => (Rsa, Rsa, Null, Sha1, (3, 1), Md5Sha1),
            Self::TLS_RSA_WITH_NULL_SHA256 => (Rsa, Rsa, Null, Sha256, (3, 3), Sha256),
            Self::TLS_RSA_WITH_RC4_128_MD5 => (Rsa, Rsa, Rc4_128, Md5, (3, 1), Md5Sha1),
            Self::TLS_RSA_WITH_RC4_128_SHA => (Rsa, Rsa, Rc4_128, Sha1, (3, 1), Md5Sha1),
            Self::TLS_RSA_WITH_3DES_EDE_CBC_SHA => (Rsa, Rsa, TripleDesEdeCbc, Sha1, (3, 1), Md5Sha1),
            Self::TLS_RSA_WITH_AES_128_CBC_SHA => (Rsa, Rsa, Aes128Cbc, Sha1, (3, 1), Md5Sha1),
            Self::TLS_RSA_WITH_AES_256_CBC_SHA => (Rsa, Rsa, Aes256Cbc, Sha1, (3, 1), Md5Sha1),
            Self::TLS_RSA_WITH_AES_128_CBC_SHA256 => (Rsa, Rsa, Aes128Cbc, Sha256, (3, 3), Sha256),
            Self::TLS_RSA_WITH_AES_256_CBC_SHA256 => (Rsa, Rsa, Aes256Cbc, Sha256, (3, 3), Sha256),
            Self::TLS_DH_DSS_WITH_3DES_EDE_CBC_SHA => (Dh, Rsa, TripleDesEdeCbc, Sha1, (3, 1), Md5Sha1),
            Self::TLS_DH_RSA_WITH_3DES_EDE_CBC_SHA => (Dh, Rsa, TripleDesEdeCbc, Sha1, (3, 1), Md5Sha1),
            Self::TLS_DHE_DSS_WITH_3DES_EDE_CBC_SHA => (Dh, Rsa, TripleDesEdeCbc, Sha1, (3, 1), Md5Sha1),
            Self::TLS_DHE_RSA_WITH_3DES_EDE_CBC_SHA => (Dh, Rsa, TripleDesEdeCbc, Sha1, (3, 1), Md5Sha1),
            Self::TLS_DH_DSS_WITH_AES_128_CBC_SHA => (Dh, Rsa, Aes128Cbc, Sha1, (3, 1), Md5Sha1),
            Self::TLS_DH_RSA_WITH_AES_128_CBC_SHA => (Dh, Rsa, Aes128Cbc, Sha1, (3, 1), Md5Sha1),
            Self::TLS_DHE_DSS_WITH_AES_128_CBC_SHA => (Dh, Rsa, Aes128Cbc, Sha1, (3, 1), Md5Sha1),
            Self::TLS_DHE_RSA_WITH_AES_128_CBC_SHA => (Dh, Rsa, Aes128Cbc, Sha1, (3, 1), Md5Sha1),
            Self::TLS_DH_DSS_WITH_AES_256_CBC_SHA => (Dh, Rsa, Aes256Cbc, Sha1, (3, 1), Md5Sha1),
            Self::TLS_DH_RSA_WITH_AES_256_CBC_SHA => (Dh, Rsa, Aes256Cbc, Sha1, (3, 1), Md5Sha1),
            Self::TLS_DHE_DSS_WITH_AES_256_CBC_SHA => (Dh, Rsa, Aes256Cbc, Sha1, (3, 1), Md5Sha1),
            Self::TLS_DHE_RSA_WITH_AES_256_CBC_SHA => (Dh, Rsa, Aes256Cbc, Sha1, (3, 1), Md5Sha1),
            Self::TLS_DH_DSS_WITH_AES_128_CBC_SHA256 => (Dh, Rsa, Aes128Cbc, Sha256, (3, 3), Sha256),
            Self::TLS_DH_RSA_WITH_AES_128_CBC_SHA256 => (Dh, Rsa, Aes128Cbc, Sha256, (3, 3), Sha256),
            Self::TLS_DHE_DSS_WITH_AES_128_CBC_SHA256 => (Dh, Rsa, Aes128Cbc, Sha256, (3, 3), Sha256),
            Self::TLS_DHE_RSA_WITH_AES_128_CBC_SHA256 => (Dh, Rsa, Aes128Cbc, Sha256, (3, 3), Sha256),
            Self::TLS_DH_DSS_WITH_AES_256_CBC_SHA256 => (Dh, Rsa, Aes256Cbc, Sha256, (3, 3), Sha256),
            Self::TLS_DH_RSA_WITH_AES_256_CBC_SHA256 => (Dh, Rsa, Aes256Cbc, Sha256, (3, 3), Sha256),
            Self::TLS_DHE_DSS_WITH_AES_256_CBC_SHA256 => (Dh, Rsa, Aes256Cbc, Sha256, (3, 3), Sha256),
            Self::TLS_DHE_RSA_WITH_AES_256_CBC_SHA256 => (Dh, Rsa, Aes256Cbc, Sha256, (3, 3), Sha256),
            Self::TLS_DH_anon_WITH_RC4_128_MD5 => (DhAnon, Anonymous, Rc4_128, Md5, (3, 1), Md5Sha1),
            Self::TLS_DH_anon_WITH_3DES_EDE_CBC_SHA => (DhAnon, Anonymous, TripleDesEdeCbc, Sha1, (3, 1), Md5Sha1),
            Self::TLS_DH_anon_WITH_AES_128_CBC_SHA => (DhAnon, Anonymous, Aes128Cbc, Sha1, (3, 1), Md5Sha1),
            Self::TLS_DH_anon_WITH_AES_256_CBC_SHA => (DhAnon, Anonymous, Aes256Cbc, Sha1, (3, 1), Md5Sha1),
            Self::TLS_DH_anon_WITH_AES_128_CBC_SHA256 => (DhAnon, Anonymous, Aes128Cbc, Sha256, (3, 3), Sha256),
            Self::TLS_DH_anon_WITH_AES_256_CBC_SHA256 => (DhAnon, Anonymous, Aes256Cbc, Sha256, (3, 3), Sha256),
            Self::TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA => (Ecdhe, Rsa, Aes128Cbc, Sha1, (3, 1), Md5Sha1),
            Self::TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA => (Ecdhe, Rsa, Aes256Cbc, Sha1, (3, 1), Md5Sha1),
            Self::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256 => (Ecdhe, Rsa, Aes128Gcm, Aead, (3, 3), Sha256),
            Self::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384 => (Ecdhe, Rsa, Aes256Gcm, Aead, (3, 3), Sha384),
            Self::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256 => (Ecdhe, Ecdsa, Aes128Gcm, Aead, (3, 3), Sha256),
            Self::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384 => (Ecdhe, Ecdsa, Aes256Gcm, Aead, (3, 3), Sha384),
            Self::TLS_AES_128_GCM_SHA256 => (None, Any, Aes128Gcm, Aead, (3, 4), Sha256),
            Self::TLS_AES_256_GCM_SHA384 => (None, Any, Aes256Gcm, Aead, (3, 4), Sha384),
            Self::TLS_CHACHA20_POLY1305_SHA256 => (None, Any, ChaCha20Poly1305, Aead, (3, 4), Sha256),
        };

        CipherSuiteDescriptor {
            suite: self,
            key_exchange,
            auth,
            cipher,
            mac,
            min_version,
            prf_hash,
        }
    }

    #[must_use]
    pub const fn is_tls13(self) -> bool {
        matches!(
            self,
            Self::TLS_AES_128_GCM_SHA256 | Self::TLS_AES_256_GCM_SHA384 | Self::TLS_CHACHA20_POLY1305_SHA256
        )
    }
}

impl From<CipherSuite> for [u8; 2] {
    fn from(value: CipherSuite) -> Self {
        match value {
            CipherSuite::TLS_NULL_WITH_NULL_NULL => [0x00, 0x00],
            CipherSuite::TLS_RSA_WITH_NULL_MD5 => [0x00, 0x01],
            CipherSuite::TLS_RSA_WITH_NULL_SHA => [0x00, 0x02],
            CipherSuite::TLS_RSA_WITH_NULL_SHA256 => [0x00, 0x3B],
            CipherSuite::TLS_RSA_WITH_RC4_128_MD5 => [0x00, 0x04],
            CipherSuite::TLS_RSA_WITH_RC4_128_SHA => [0x00, 0x05],
            CipherSuite::TLS_RSA_WITH_3DES_EDE_CBC_SHA => [0x00, 0x0A],
            CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA => [0x00, 0x2F],
            CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA => [0x00, 0x35],
            CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA256 => [0x00, 0x3C],
            CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA256 => [0x00, 0x3D],
            CipherSuite::TLS_DH_DSS_WITH_3DES_EDE_CBC_SHA => [0x00, 0x0D],
            CipherSuite::TLS_DH_RSA_WITH_3DES_EDE_CBC_SHA => [0x00, 0x10],
            CipherSuite::TLS_DHE_DSS_WITH_3DES_EDE_CBC_SHA => [0x00, 0x13],
            CipherSuite::TLS_DHE_RSA_WITH_3DES_EDE_CBC_SHA => [0x00, 0x16],
            CipherSuite::TLS_DH_DSS_WITH_AES_128_CBC_SHA => [0x00, 0x30],
            CipherSuite::TLS_DH_RSA_WITH_AES_128_CBC_SHA => [0x00, 0x31],
            CipherSuite::TLS_DHE_DSS_WITH_AES_128_CBC_SHA => [0x00, 0x32],
            CipherSuite::TLS_DHE_RSA_WITH_AES_128_CBC_SHA => [0x00, 0x33],
            CipherSuite::TLS_DH_DSS_WITH_AES_256_CBC_SHA => [0x00, 0x36],
            CipherSuite::TLS_DH_RSA_WITH_AES_256_CBC_SHA => [0x00, 0x37],
            CipherSuite::TLS_DHE_DSS_WITH_AES_256_CBC_SHA => [0x00, 0x38],
            CipherSuite::TLS_DHE_RSA_WITH_AES_256_CBC_SHA => [0x00, 0x39],
            CipherSuite::TLS_DH_DSS_WITH_AES_128_CBC_SHA256 => [0x00, 0x3E],
            CipherSuite::TLS_DH_RSA_WITH_AES_128_CBC_SHA256 => [0x00, 0x3F],
            CipherSuite::TLS_DHE_DSS_WITH_AES_128_CBC_SHA256 => [0x00, 0x40],
            CipherSuite::TLS_DHE_RSA_WITH_AES_128_CBC_SHA256 => [0x00, 0x67],
            CipherSuite::TLS_DH_DSS_WITH_AES_256_CBC_SHA256 => [0x00, 0x68],
            CipherSuite::TLS_DH_RSA_WITH_AES_256_CBC_SHA256 => [0x00, 0x69],
            CipherSuite::TLS_DHE_DSS_WITH_AES_256_CBC_SHA256 => [0x00, 0x6A],
            CipherSuite::TLS_DHE_RSA_WITH_AES_256_CBC_SHA256 => [0x00, 0x6B],
            CipherSuite::TLS_DH_anon_WITH_RC4_128_MD5 => [0x00, 0x18],
            CipherSuite::TLS_DH_anon_WITH_3DES_EDE_CBC_SHA => [0x00, 0x1B],
            CipherSuite::TLS_DH_anon_WITH_AES_128_CBC_SHA => [0x00, 0x34],
            CipherSuite::TLS_DH_anon_WITH_AES_256_CBC_SHA => [0x00, 0x3A],
            CipherSuite::TLS_DH_anon_WITH_AES_128_CBC_SHA256 => [0x00, 0x6C],
            CipherSuite::TLS_DH_anon_WITH_AES_256_CBC_SHA256 => [0x00, 0x6D],
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA => [0xC0, 0x13],
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA => [0xC0, 0x14],
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256 => [0xC0, 0x2F],
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384 => [0xC0, 0x30],
            CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256 => [0xC0, 0x2B],
            CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384 => [0xC0, 0x2C],
            CipherSuite::TLS_AES_128_GCM_SHA256 => [0x13, 0x01],
            CipherSuite::TLS_AES_256_GCM_SHA384 => [0x13, 0x02],
            CipherSuite::TLS_CHACHA20_POLY1305_SHA256 => [0x13, 0x03],
        }
    }
}

impl TryFrom<[u8; 2]> for CipherSuite {
    type Error = TLSError;

    fn try_from(value: [u8; 2]) -> Result<Self, Self::Error> {
        let cipher_suite = match value {
            [0x00, 0x00] => Self::TLS_NULL_WITH_NULL_NULL,
            [0x00, 0x01] => Self::TLS_RSA_WITH_NULL_MD5,
            [0x00, 0x02] => Self::TLS_RSA_WITH_NULL_SHA,
            [0x00, 0x3B] => Self::TLS_RSA_WITH_NULL_SHA256,
            [0x00, 0x04] => Self::TLS_RSA_WITH_RC4_128_MD5,
            [0x00, 0x05] => Self::TLS_RSA_WITH_RC4_128_SHA,
            [0x00, 0x0A] => Self::TLS_RSA_WITH_3DES_EDE_CBC_SHA,
            [0x00, 0x2F] => Self::TLS_RSA_WITH_AES_128_CBC_SHA,
            [0x00, 0x35] => Self::TLS_RSA_WITH_AES_256_CBC_SHA,
            [0x00, 0x3C] => Self::TLS_RSA_WITH_AES_128_CBC_SHA256,
            [0x00, 0x3D] => Self::TLS_RSA_WITH_AES_256_CBC_SHA256,
            [0x00, 0x0D] => Self::TLS_DH_DSS_WITH_3DES_EDE_CBC_SHA,
            [0x00, 0x10] => Self::TLS_DH_RSA_WITH_3DES_EDE_CBC_SHA,
            [0x00, 0x13] => Self::TLS_DHE_DSS_WITH_3DES_EDE_CBC_SHA,
            [0x00, 0x16] => Self::TLS_DHE_RSA_WITH_3DES_EDE_CBC_SHA,
            [0x00, 0x30] => Self::TLS_DH_DSS_WITH_AES_128_CBC_SHA,
            [0x00, 0x31] => Self::TLS_DH_RSA_WITH_AES_128_CBC_SHA,
            [0x00, 0x32] => Self::TLS_DHE_DSS_WITH_AES_128_CBC_SHA,
            [0x00, 0x33] => Self::TLS_DHE_RSA_WITH_AES_128_CBC_SHA,
            [0x00, 0x36] => Self::TLS_DH_DSS_WITH_AES_256_CBC_SHA,
            [0x00, 0x37] => Self::TLS_DH_RSA_WITH_AES_256_CBC_SHA,
            [0x00, 0x38] => Self::TLS_DHE_DSS_WITH_AES_256_CBC_SHA,
            [0x00, 0x39] => Self::TLS_DHE_RSA_WITH_AES_256_CBC_SHA,
            [0x00, 0x3E] => Self::TLS_DH_DSS_WITH_AES_128_CBC_SHA256,
            [0x00, 0x3F] => Self::TLS_DH_RSA_WITH_AES_128_CBC_SHA256,
            [0x00, 0x40] => Self::TLS_DHE_DSS_WITH_AES_128_CBC_SHA256,
            [0x00, 0x67] => Self::TLS_DHE_RSA_WITH_AES_128_CBC_SHA256,
            [0x00, 0x68] => Self::TLS_DH_DSS_WITH_AES_256_CBC_SHA256,
            [0x00, 0x69] => Self::TLS_DH_RSA_WITH_AES_256_CBC_SHA256,
            [0x00, 0x6A] => Self::TLS_DHE_DSS_WITH_AES_256_CBC_SHA256,
            [0x00, 0x6B] => Self::TLS_DHE_RSA_WITH_AES_256_CBC_SHA256,
            [0x00, 0x18] => Self::TLS_DH_anon_WITH_RC4_128_MD5,
            [0x00, 0x1B] => Self::TLS_DH_anon_WITH_3DES_EDE_CBC_SHA,
            [0x00, 0x34] => Self::TLS_DH_anon_WITH_AES_128_CBC_SHA,
            [0x00, 0x3A] => Self::TLS_DH_anon_WITH_AES_256_CBC_SHA,
            [0x00, 0x6C] => Self::TLS_DH_anon_WITH_AES_128_CBC_SHA256,
            [0x00, 0x6D] => Self::TLS_DH_anon_WITH_AES_256_CBC_SHA256,
            [0xC0, 0x13] => Self::TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA,
            [0xC0, 0x14] => Self::TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA,
            [0xC0, 0x2F] => Self::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
            [0xC0, 0x30] => Self::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
            [0xC0, 0x2B] => Self::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
            [0xC0, 0x2C] => Self::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
            [0x13, 0x01] => Self::TLS_AES_128_GCM_SHA256,
            [0x13, 0x02] => Self::TLS_AES_256_GCM_SHA384,
            [0x13, 0x03] => Self::TLS_CHACHA20_POLY1305_SHA256,
            _ => {
                log::warn!("Unknown TLS cipher suite: {value:?}");
                return Err(TLSError::UnknownCipherSuite);
            },
        };
        Ok(cipher_suite)
    }
}

impl crate::encoding::Encoding for CipherSuite {
    fn encode(&self, bytes: &mut Vec<u8>) {
        let raw: [u8; 2] = (*self).into();
        bytes.extend_from_slice(&raw);
    }
}

impl<'a> crate::encoding::Decoding<'a> for CipherSuite {
    fn decode(cursor: &mut crate::encoding::Cursor<'a>) -> crate::encoding::Result<Self> {
        let raw: [u8; 2] = cursor.decode()?;
        Self::try_from(raw).map_err(|_| crate::encoding::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_every_suite() {
        let suites = [
            CipherSuite::TLS_NULL_WITH_NULL_NULL,
            CipherSuite::TLS_RSA_WITH_NULL_SHA256,
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
            CipherSuite::TLS_AES_128_GCM_SHA256,
            CipherSuite::TLS_CHACHA20_POLY1305_SHA256,
        ];

        for suite in suites {
            let raw: [u8; 2] = suite.into();
            assert_eq!(CipherSuite::try_from(raw).unwrap(), suite);
        }
    }

    #[test]
    fn tls13_suites_have_no_key_exchange() {
        assert_eq!(
            CipherSuite::TLS_AES_128_GCM_SHA256.descriptor().key_exchange,
            KeyExchangeAlgorithm::None
        );
        assert!(CipherSuite::TLS_AES_128_GCM_SHA256.is_tls13());
    }
}
