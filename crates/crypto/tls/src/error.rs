//! The single typed error returned by every fallible operation in this crate.
//!
//! Every error kind in the design has an explicit conversion to a TLS alert when
//! it is the kind of failure that should be surfaced to the peer; see
//! [TLSError::as_alert_description].

use error_derive::Error;

use crate::{alert::Description, alert::AlertError, certificate, der};

#[derive(Debug, Error)]
pub enum TLSError {
    // --- internal invariant / resource errors ---
    #[msg = "an internal invariant was violated"]
    Safety,
    #[msg = "allocation failed"]
    Alloc,
    #[msg = "an arithmetic value overflowed its representable range"]
    Overflow,
    #[msg = "a required value was absent"]
    Null,

    // --- I/O / lifecycle ---
    #[msg = "the operation would block"]
    IoBlocked,
    #[msg = "the underlying transport failed"]
    IoFailed(std::io::Error),
    #[msg = "the connection is closed"]
    Closed,
    #[msg = "the connection is not in a state that allows this operation"]
    State,

    // --- wire format ---
    #[msg = "the peer sent a malformed message"]
    BadMessage,
    #[msg = "the peer sent an extension that is not valid for this message"]
    UnsupportedExtension,
    #[msg = "the peer sent the same extension twice"]
    DuplicateExtension,
    #[msg = "unsupported or invalid protocol version"]
    BadVersion,
    #[msg = "unknown record content type"]
    UnknownContentType,
    #[msg = "unknown handshake message type"]
    UnknownHandshakeMessageType,
    #[msg = "the cipher suite is unknown or not enabled"]
    UnknownCipherSuite,
    #[msg = "the compression method is unknown or not enabled"]
    UnknownCompressionMethod,
    #[msg = "a message arrived in a state that did not expect it"]
    HandshakeFailure,

    // --- cryptography ---
    #[msg = "the record's cipher type does not match what was negotiated"]
    CipherType,
    #[msg = "key material could not be initialized"]
    KeyInit,
    #[msg = "encryption failed"]
    Encrypt,
    #[msg = "decryption or authentication failed"]
    Decrypt,
    #[msg = "the peer's Finished verify_data did not match"]
    FinishedMismatch,
    #[msg = "this connection has no certificate/key material for the negotiated suite"]
    NoServerCredentials,
    #[msg = "the requested signature algorithm is not supported"]
    InvalidSignatureAlgorithm,
    #[msg = "hybrid post-quantum key exchange is disabled"]
    PqDisabled,
    #[msg = "the post-quantum primitive failed"]
    PqCrypto,

    // --- certificate validation ---
    #[msg = "the certificate is malformed"]
    CertInvalid,
    #[msg = "the certificate chain does not terminate in a trusted root"]
    CertUntrusted,
    #[msg = "the certificate has expired or is not yet valid"]
    CertExpired,
    #[msg = "the certificate has been revoked"]
    CertRevoked,
    #[msg = "the certificate's key type is not supported"]
    CertTypeUnsupported,

    // --- alerts and wrapped errors from lower layers ---
    #[msg = "the peer sent a fatal alert"]
    Alert(AlertError),
    #[msg = "DNS resolution failed"]
    Dns(dns::DNSError),
    #[msg = "malformed DER data"]
    Der(der::Error),
    #[msg = "malformed certificate"]
    Certificate(certificate::Error),
    #[msg = "malformed TLS wire encoding"]
    Decode(crate::encoding::Error),
}

impl TLSError {
    /// Maps an internally observed error to the alert description that should
    /// be sent to the peer, if any (§7). Purely internal failures (allocation,
    /// safety violations) have no externally visible alert; they close the
    /// connection without telling the peer why.
    #[must_use]
    pub fn as_alert_description(&self) -> Option<Description> {
        let description = match self {
            Self::BadMessage | Self::Decode(_) => Description::DecodeError,
            Self::UnsupportedExtension => Description::UnsupportedExtension,
            Self::DuplicateExtension => Description::DecodeError,
            Self::BadVersion => Description::ProtocolVersion,
            Self::Decrypt => Description::BadRecordMAC,
            Self::FinishedMismatch => Description::DecryptError,
            Self::HandshakeFailure | Self::NoServerCredentials => Description::HandshakeFailure,
            Self::CertInvalid | Self::CertTypeUnsupported => Description::BadCertificate,
            Self::CertUntrusted => Description::UnknownCA,
            Self::CertExpired => Description::CertificateExpired,
            Self::CertRevoked => Description::CertificateRevoked,
            Self::InvalidSignatureAlgorithm => Description::IllegalParameter,
            Self::Safety | Self::Alloc => Description::InternalError,
            _ => return None,
        };
        Some(description)
    }
}

impl From<std::io::ErrorKind> for TLSError {
    fn from(kind: std::io::ErrorKind) -> Self {
        if kind == std::io::ErrorKind::WouldBlock {
            Self::IoBlocked
        } else {
            Self::IoFailed(kind.into())
        }
    }
}
