//! The TLS handshake protocol (L3): negotiates protocol version, cipher suite,
//! keys and authenticates the peer before application data can flow.
//!
//! [HandshakeMessage::new] parses a single handshake message out of an
//! already-decrypted record payload; [Connection](crate::connection::Connection)
//! drives the state machine that decides which message is expected next.

use crate::{
    certificate::{SignedCertificate, X509Certificate},
    connection::ProtocolVersion,
    encoding::{Cursor, Decoding, WithU16LengthPrefix, WithU8LengthPrefix, U24},
    enum_encoding,
    extension::{self, Extension},
    CipherSuite, Encoding, SessionId, TLSError,
};

/// The record-layer version field used on the very first `ClientHello`
/// (RFC 5246 appendix E: several deployed servers misbehave if it isn't `{3, 1}`,
/// the TLS 1.0 wire value).
const CLIENT_HELLO_LEGACY_VERSION: ProtocolVersion = ProtocolVersion::new(3, 1);

/// Cipher suites this implementation is willing to offer, most preferred
/// first. TLS 1.3 suites are listed ahead of TLS 1.2 ones since a client
/// always prefers the newer protocol version when both are acceptable.
pub const SUPPORTED_CIPHER_SUITES: [CipherSuite; 5] = [
    CipherSuite::TLS_AES_128_GCM_SHA256,
    CipherSuite::TLS_CHACHA20_POLY1305_SHA256,
    CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
    CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA,
    CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
];

/// `HelloRetryRequest.random` (RFC 8446 §4.1.3): a `ServerHello` with this
/// exact random value is not really a `ServerHello`, it's the server asking
/// the client to resend `ClientHello` with different parameters (most often
/// a different `key_share` group).
pub const HELLO_RETRY_REQUEST_RANDOM: [u8; 32] = [
    0xCF, 0x21, 0xAD, 0x74, 0xE5, 0x9A, 0x61, 0x11, 0xBE, 0x1D, 0x8C, 0x02, 0x1E, 0x65, 0xB8, 0x91, 0xC2, 0xA2, 0x11,
    0x16, 0x7A, 0xBB, 0x8C, 0x5E, 0x07, 0x9E, 0x09, 0xE2, 0xC8, 0xA8, 0x33, 0x9C,
];

enum_encoding!(
    /// TLS Compression methods are defined in [RFC 3749](https://www.rfc-editor.org/rfc/rfc3749)
    ///
    /// # Security
    /// Encrypting compressed data can compromise security.
    /// See [CRIME](https://en.wikipedia.org/wiki/CRIME) and [BREACH](https://en.wikipedia.org/wiki/BREACH)
    /// for more information.
    ///
    /// We will therefore **never** set a [CompressionMethod] other than [CompressionMethod::None].
    /// Seeing how future TLS protocol version removed this option altogether, this
    /// seems like the correct approach.
    pub enum CompressionMethod(u8) {
        None = 0x00,
        Deflate = 0x01,
    }
);

impl TryFrom<u8> for CompressionMethod {
    type Error = TLSError;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Deflate),
            other => {
                log::warn!("Unknown TLS compression method: {other}");
                Err(TLSError::UnknownCompressionMethod)
            },
        }
    }
}

enum_encoding! {
    pub enum HandshakeType(u8) {
        HelloRequest = 0,
        ClientHello = 1,
        ServerHello = 2,
        HelloRetryRequest = 3,
        NewSessionTicket = 4,
        EncryptedExtensions = 8,
        Certificate = 11,
        ServerKeyExchange = 12,
        CertificateRequest = 13,
        ServerHelloDone = 14,
        CertificateVerify = 15,
        ClientKeyExchange = 16,
        Finished = 20,
        KeyUpdate = 24,
        CertificateStatus = 22,
        MessageHash = 254,
    }
}

#[derive(Clone, Debug)]
pub struct ClientHello {
    pub client_random: [u8; 32],
    pub cipher_suites: Vec<CipherSuite>,
    pub extensions: Vec<Extension>,
}

#[derive(Clone, Debug)]
pub struct ServerHello {
    pub version: ProtocolVersion,
    pub server_random: [u8; 32],
    pub session_id: SessionId,
    pub selected_cipher_suite: CipherSuite,
    pub selected_compression_method: CompressionMethod,
    pub extensions: Vec<Extension>,
}

impl ServerHello {
    #[must_use]
    pub fn find_extension(&self, extension_type: extension::ExtensionType) -> Option<&Extension> {
        self.extensions.iter().find(|ext| ext.extension_type() == extension_type)
    }
}

/// RFC 5246 §7.4.3 / the "reference KEM" bridge (`kem.rs`): the server's
/// half of a TLS 1.2 (EC)DHE exchange is modelled as the server generating a
/// KEM keypair and publishing the public key here; the client's
/// [ClientKeyExchange] carries the ciphertext it encapsulated against it.
/// Writes `handshake_type`'s 1-byte tag, reserves the 3-byte length prefix
/// every handshake message carries, runs `write_body`, then patches the
/// reserved length in once the body's size is known - the same
/// reserve-then-patch discipline [ClientHello::encode] uses by hand.
fn encode_handshake_message(handshake_type: HandshakeType, bytes: &mut Vec<u8>, write_body: impl FnOnce(&mut Vec<u8>)) {
    handshake_type.encode(bytes);
    let offset = bytes.len();
    bytes.extend_from_slice(&[0, 0, 0]);
    write_body(bytes);
    let body_length = (bytes.len() - offset) as u32 - 3;
    bytes[offset..offset + 3].copy_from_slice(&body_length.to_be_bytes()[1..]);
}

#[derive(Clone, Debug)]
pub struct ServerKeyExchange {
    pub public_key: Vec<u8>,
}

impl Encoding for ServerKeyExchange {
    fn encode(&self, bytes: &mut Vec<u8>) {
        encode_handshake_message(HandshakeType::ServerKeyExchange, bytes, |bytes| {
            WithU16LengthPrefix::new(self.public_key.as_slice()).encode(bytes);
        });
    }
}

#[derive(Clone, Debug)]
pub struct ClientKeyExchange {
    pub ciphertext: Vec<u8>,
}

impl Encoding for ClientKeyExchange {
    fn encode(&self, bytes: &mut Vec<u8>) {
        encode_handshake_message(HandshakeType::ClientKeyExchange, bytes, |bytes| {
            WithU16LengthPrefix::new(self.ciphertext.as_slice()).encode(bytes);
        });
    }
}

#[derive(Clone, Debug)]
pub struct EncryptedExtensions {
    pub extensions: Vec<Extension>,
}

impl Encoding for EncryptedExtensions {
    fn encode(&self, bytes: &mut Vec<u8>) {
        encode_handshake_message(HandshakeType::EncryptedExtensions, bytes, |bytes| {
            WithU16LengthPrefix::new(self.extensions.as_slice()).encode(bytes);
        });
    }
}

#[derive(Clone, Debug)]
pub struct Finished {
    pub verify_data: Vec<u8>,
}

impl Encoding for Finished {
    fn encode(&self, bytes: &mut Vec<u8>) {
        encode_handshake_message(HandshakeType::Finished, bytes, |bytes| {
            bytes.extend_from_slice(&self.verify_data);
        });
    }
}

#[derive(Clone, Debug)]
pub enum HandshakeMessage {
    ClientHello(ClientHello),
    ServerHello(ServerHello),
    /// A `ServerHello` whose random field is [HELLO_RETRY_REQUEST_RANDOM]
    /// (RFC 8446 §4.1.4).
    HelloRetryRequest(ServerHello),
    Certificate(CertificateChain),
    CertificateStatus,
    ServerKeyExchange(ServerKeyExchange),
    ServerHelloDone,
    ClientKeyExchange(ClientKeyExchange),
    /// The TLS 1.3 `CertificateVerify` signature, carried opaquely: this
    /// crate does not implement signature verification over the transcript
    /// (see `DESIGN.md`), so the bytes are parsed off the wire but never
    /// checked.
    CertificateVerify(Vec<u8>),
    EncryptedExtensions(EncryptedExtensions),
    Finished(Finished),
}

#[derive(Clone, Debug)]
pub enum CertificateChain {
    X509v3(Vec<X509Certificate>),
}

impl CertificateChain {
    #[must_use]
    pub fn certificates(&self) -> &[X509Certificate] {
        match self {
            Self::X509v3(certs) => certs,
        }
    }
}

impl Encoding for ServerHello {
    fn encode(&self, bytes: &mut Vec<u8>) {
        encode_handshake_message(HandshakeType::ServerHello, bytes, |bytes| {
            self.version.encode(bytes);
            self.server_random.encode(bytes);
            self.session_id.encode(bytes);
            self.selected_cipher_suite.encode(bytes);
            self.selected_compression_method.encode(bytes);
            WithU16LengthPrefix::new(self.extensions.as_slice()).encode(bytes);
        });
    }
}

impl Encoding for ClientHello {
    fn encode(&self, bytes: &mut Vec<u8>) {
        HandshakeType::ClientHello.encode(bytes);

        // The length of the clienthello message, patched below once known.
        let offset = bytes.len();
        bytes.extend_from_slice(&[0, 0, 0]);

        CLIENT_HELLO_LEGACY_VERSION.encode(bytes);

        self.client_random.encode(bytes);

        bytes.push(0x00); // no session id to resume

        WithU16LengthPrefix::new(self.cipher_suites.as_slice()).encode(bytes);

        // Since compression can compromise security (see CRIME), we will
        // never advertise anything but "no compression".
        WithU8LengthPrefix::new([CompressionMethod::None].as_slice()).encode(bytes);

        WithU16LengthPrefix::new(self.extensions.as_slice()).encode(bytes);

        let clienthello_length = (bytes.len() - offset) as u32 - 3;
        bytes[offset..offset + 3].copy_from_slice(&clienthello_length.to_be_bytes()[1..]);
    }
}

impl HandshakeMessage {
    pub fn new(message_data: &[u8]) -> Result<Self, TLSError> {
        // Every Handshake message starts with the same header:
        // * 1 byte message type
        // * 3 bytes length
        // Everything after that depends on the message type.
        if message_data.len() < 4 {
            return Err(TLSError::BadMessage);
        }
        let mut header = Cursor::new(message_data);
        let handshake_type: HandshakeType = header.decode()?;
        let length: U24 = header.decode()?;
        let length: usize = length.into();

        if message_data.len() - 4 != length {
            // Fragmentation across multiple records is not implemented; a
            // conforming peer that needs it will fail the handshake here.
            return Err(TLSError::BadMessage);
        }

        let mut message = Cursor::new(&message_data[4..]);

        match handshake_type {
            HandshakeType::ClientHello => {
                let _legacy_version = ProtocolVersion::decode(&mut message)?;
                let client_random: [u8; 32] = message.decode()?;
                let _session_id: SessionId = message.decode()?;

                let cipher_suites_len: u16 = message.decode()?;
                let mut cipher_suites = Vec::new();
                let cipher_suites_end = message.remainder().len().saturating_sub(cipher_suites_len as usize);
                while message.remainder().len() > cipher_suites_end {
                    cipher_suites.push(message.decode::<CipherSuite>()?);
                }

                let compression_methods_len: u8 = message.decode()?;
                let remainder = message.remainder();
                if remainder.len() < compression_methods_len as usize {
                    return Err(TLSError::BadMessage);
                }
                message.advance(compression_methods_len as usize);

                let extensions = extension::decode_extensions(&mut message, false)?;

                Ok(Self::ClientHello(ClientHello {
                    client_random,
                    cipher_suites,
                    extensions,
                }))
            },
            HandshakeType::ServerHello => {
                // https://www.rfc-editor.org/rfc/rfc5246#section-7.4.1.3
                let server_version = ProtocolVersion::decode(&mut message)?;
                let server_random: [u8; 32] = message.decode()?;
                let session_id = message.decode()?;
                let selected_cipher_suite = message.decode()?;
                let selected_compression_method = message.decode()?;
                let extensions = extension::decode_extensions(&mut message, true)?;

                let hello = ServerHello {
                    version: server_version,
                    server_random,
                    session_id,
                    selected_cipher_suite,
                    selected_compression_method,
                    extensions,
                };

                if hello.server_random == HELLO_RETRY_REQUEST_RANDOM {
                    Ok(Self::HelloRetryRequest(hello))
                } else {
                    Ok(Self::ServerHello(hello))
                }
            },
            HandshakeType::Certificate => {
                // https://www.rfc-editor.org/rfc/rfc5246#section-7.4.2
                let certificate_chain_length: usize = message.decode::<U24>()?.into();

                let mut certificate_chain = vec![];

                let mut bytes_read: usize = 0;
                while bytes_read != certificate_chain_length {
                    let certificate_length: usize = message.decode::<U24>()?.into();

                    let remainder = message.remainder();
                    if remainder.len() < certificate_length {
                        return Err(TLSError::BadMessage);
                    }

                    let signed_cert = SignedCertificate::new(&remainder[..certificate_length])?;

                    if !signed_cert.is_valid() {
                        log::warn!("Peer supplied an expired or not-yet-valid certificate");
                        return Err(TLSError::CertExpired);
                    }

                    message.advance(certificate_length);
                    certificate_chain.push(signed_cert.into());
                    bytes_read += certificate_length + 3;
                }

                Ok(Self::Certificate(CertificateChain::X509v3(certificate_chain)))
            },
            HandshakeType::CertificateStatus => Ok(Self::CertificateStatus),
            HandshakeType::ServerKeyExchange => {
                let key_len: u16 = message.decode()?;
                let remainder = message.remainder();
                if remainder.len() < key_len as usize {
                    return Err(TLSError::BadMessage);
                }
                Ok(Self::ServerKeyExchange(ServerKeyExchange {
                    public_key: remainder[..key_len as usize].to_vec(),
                }))
            },
            HandshakeType::ServerHelloDone => Ok(Self::ServerHelloDone),
            HandshakeType::ClientKeyExchange => {
                let ct_len: u16 = message.decode()?;
                let remainder = message.remainder();
                if remainder.len() < ct_len as usize {
                    return Err(TLSError::BadMessage);
                }
                Ok(Self::ClientKeyExchange(ClientKeyExchange {
                    ciphertext: remainder[..ct_len as usize].to_vec(),
                }))
            },
            HandshakeType::CertificateVerify => Ok(Self::CertificateVerify(message.remainder().to_vec())),
            HandshakeType::EncryptedExtensions => {
                let extensions = extension::decode_extensions(&mut message, true)?;
                Ok(Self::EncryptedExtensions(EncryptedExtensions { extensions }))
            },
            HandshakeType::Finished => Ok(Self::Finished(Finished {
                verify_data: message.remainder().to_vec(),
            })),
            other => {
                log::warn!("Unsupported handshake message type: {other:?}");
                Err(TLSError::UnknownHandshakeMessageType)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_hello_roundtrips_length_prefix() {
        let hello = ClientHello {
            client_random: [0; 32],
            cipher_suites: SUPPORTED_CIPHER_SUITES.to_vec(),
            extensions: vec![Extension::RenegotiationInfo],
        };
        let bytes = hello.as_bytes();

        // type (1) + length (3) + version (2) + random (32) + session_id (1)
        assert_eq!(bytes[0], HandshakeType::ClientHello.as_bytes()[0]);
        let declared_length = u32::from_be_bytes([0, bytes[1], bytes[2], bytes[3]]) as usize;
        assert_eq!(declared_length, bytes.len() - 4);
    }

    #[test]
    fn client_hello_roundtrips_through_parsing() {
        let hello = ClientHello {
            client_random: [0x42; 32],
            cipher_suites: SUPPORTED_CIPHER_SUITES.to_vec(),
            extensions: vec![Extension::RenegotiationInfo],
        };
        let bytes = hello.as_bytes();

        let HandshakeMessage::ClientHello(parsed) = HandshakeMessage::new(&bytes).unwrap() else {
            panic!("expected ClientHello");
        };
        assert_eq!(parsed.client_random, [0x42; 32]);
        assert_eq!(parsed.cipher_suites, SUPPORTED_CIPHER_SUITES.to_vec());
    }

    #[test]
    fn server_hello_with_hello_retry_random_is_recognized() {
        let mut bytes = Vec::new();
        HandshakeType::ServerHello.encode(&mut bytes);
        let offset = bytes.len();
        bytes.extend_from_slice(&[0, 0, 0]);

        ProtocolVersion::new(3, 3).encode(&mut bytes);
        bytes.extend_from_slice(&HELLO_RETRY_REQUEST_RANDOM);
        bytes.push(0x00); // empty session id
        CipherSuite::TLS_AES_128_GCM_SHA256.encode(&mut bytes);
        CompressionMethod::None.encode(&mut bytes);
        bytes.extend_from_slice(&[0, 0]); // empty extensions list

        let length = (bytes.len() - offset) as u32 - 3;
        bytes[offset..offset + 3].copy_from_slice(&length.to_be_bytes()[1..]);

        assert!(matches!(HandshakeMessage::new(&bytes).unwrap(), HandshakeMessage::HelloRetryRequest(_)));
    }
}
