//! The connection state machine (L4): negotiates a TLS session and then shuttles
//! application data through the negotiated record protection.
//!
//! Unlike the blocking design this module replaces, a [Connection] never owns a
//! socket. The embedder drives it by repeatedly calling [Connection::poll] (or
//! [Connection::send]/[Connection::recv] once the handshake is done) and feeding
//! bytes through a [TransportContext] implementation of its own choosing - a TCP
//! socket, an in-memory duplex buffer in tests, anything byte-oriented.

use std::rc::Rc;

use crate::{
    alert::{Alert, AlertQueue, Severity},
    auth_selection::{certificate_type_valid_for_auth, chain_is_trusted},
    cipher_suite::{BulkCipher, CipherSuite, KeyExchangeAlgorithm},
    config::Config,
    encoding::{self, Cursor, Decoding, Encoding},
    extension::{Extension, ExtensionType},
    handshake::{
        CertificateChain, ClientHello, ClientKeyExchange, EncryptedExtensions, Finished, HandshakeMessage, ServerHello,
        ServerKeyExchange, HELLO_RETRY_REQUEST_RANDOM, SUPPORTED_CIPHER_SUITES,
    },
    kem::{Kem, ReferenceKem},
    key_schedule::{
        tls12_finished_verify_data, tls12_key_block, tls12_prf, tls13_application_traffic_secrets, tls13_finished_key,
        tls13_handshake_secrets, tls13_traffic_keys,
    },
    provider::{Hash, HashSha256, Hmac, HmacSha256, Random},
    psk::resolve_selected_psk,
    random::CryptographicRand,
    record_layer::{ContentType, RecordProtection, TrafficKeys},
    server_name::ServerName,
    session::SessionId,
    stuffer::Stuffer,
    TLSError,
};

/// The record-layer version field value. Frozen at `{3, 3}` (TLS 1.2) on the
/// wire for TLS 1.3 compatibility (RFC 8446 §5.1); the very first ClientHello
/// record instead uses `{3, 1}` for compatibility with middleboxes (RFC 5246
/// appendix E), see [crate::handshake].
pub const TLS_RECORD_VERSION: ProtocolVersion = ProtocolVersion::new(3, 3);

/// A hybrid key-share "group" id drawn from TLS's private-use range
/// (RFC 8446 §4.2.7), standing in for whatever concrete (EC)DHE/KEM group a
/// hardened provider would negotiate - see `kem.rs`.
const HYBRID_GROUP: u16 = 0xFE30;

/// The two-byte version field exactly as it appears on the wire (e.g. `{3, 3}`
/// for TLS 1.2, `{3, 4}` for TLS 1.3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProtocolVersion {
    pub major: u8,
    pub minor: u8,
}

impl ProtocolVersion {
    #[must_use]
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    #[must_use]
    pub const fn is_tls13(&self) -> bool {
        self.major == 3 && self.minor == 4
    }
}

impl Encoding for ProtocolVersion {
    fn encode(&self, bytes: &mut Vec<u8>) {
        bytes.extend_from_slice(&[self.major, self.minor]);
    }
}

impl<'a> Decoding<'a> for ProtocolVersion {
    fn decode(cursor: &mut Cursor<'a>) -> encoding::Result<Self> {
        let buf: [u8; 2] = cursor.decode()?;

        if buf[0] < 3 {
            log::warn!("Invalid TLS version: {}.{}", buf[0], buf[1]);
            return Err(encoding::Error);
        }

        Ok(Self::new(buf[0], buf[1]))
    }
}

/// Result of a single non-blocking operation on a [Connection] (spec §5).
///
/// A [Connection] never blocks the calling thread. Instead, every entry point
/// returns one of these variants telling the embedder exactly what it is
/// waiting for before it can make more progress.
#[derive(Debug)]
pub enum Poll<T> {
    Ready(T),
    BlockedOnRead,
    BlockedOnWrite,
    /// Waiting on an application-supplied callback (e.g. certificate
    /// verification, PSK lookup) to complete.
    BlockedOnAppCallback,
    Err(TLSError),
}

impl<T> Poll<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Poll<U> {
        match self {
            Self::Ready(t) => Poll::Ready(f(t)),
            Self::BlockedOnRead => Poll::BlockedOnRead,
            Self::BlockedOnWrite => Poll::BlockedOnWrite,
            Self::BlockedOnAppCallback => Poll::BlockedOnAppCallback,
            Self::Err(err) => Poll::Err(err),
        }
    }
}

impl<T> From<Result<T, TLSError>> for Poll<T> {
    fn from(value: Result<T, TLSError>) -> Self {
        match value {
            Ok(t) => Self::Ready(t),
            Err(TLSError::IoBlocked) => Self::BlockedOnRead,
            Err(err) => Self::Err(err),
        }
    }
}

/// Non-blocking byte transport, supplied by the embedder.
///
/// Both methods follow `std::io::Read`/`Write`'s non-blocking convention: `Ok(0)`
/// means "no progress right now", callers should treat that as
/// [TLSError::IoBlocked] rather than EOF, since TLS has its own `close_notify`
/// signal for orderly shutdown (spec §4.4).
pub trait TransportContext {
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TLSError>;
    fn send(&mut self, buf: &[u8]) -> Result<usize, TLSError>;
}

/// Every state either side of this implementation's handshake can be in.
/// TLS 1.2 and TLS 1.3 share the `Start`/`WaitServerHello`/`Connected`/`Closed`
/// states and otherwise diverge, since the two versions' messages after
/// `ServerHello` don't correspond to each other one-to-one (RFC 8446 §D.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HandshakeState {
    Start,
    WaitServerHello,

    // --- TLS 1.2 client ---
    WaitCertificate,
    WaitServerKeyExchange,
    WaitServerHelloDone,
    WaitServerChangeCipherSpec,
    WaitServerFinished,

    // --- TLS 1.3 client ---
    WaitEncryptedExtensions,
    WaitTls13Certificate,
    WaitCertificateVerify,
    WaitTls13Finished,

    // --- TLS 1.3 server (PSK-only, see `DESIGN.md`) ---
    WaitClientHello,
    WaitClientFinished,

    Connected,
    Closed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Role {
    Client,
    Server,
}

/// A TLS connection, in whatever state of the handshake (or post-handshake
/// application data phase) it is currently in.
pub struct Connection {
    role: Role,
    config: Rc<Config>,
    state: HandshakeState,
    negotiated_version: ProtocolVersion,
    negotiated_suite: Option<CipherSuite>,
    server_name: Option<ServerName>,

    /// The raw bytes of every handshake message sent or received so far, in
    /// wire order, feeding the transcript hash the key schedule and every
    /// `Finished` verification are built on (RFC 5246 §7.4.9 / RFC 8446 §4.4.1).
    transcript: Vec<u8>,
    client_random: [u8; 32],
    server_random: [u8; 32],
    /// How many `HelloRetryRequest`s this handshake has seen. A second one is
    /// fatal (RFC 8446 §4.1.4): the client already responded once, so the
    /// server asking again can only be a looping/confused peer.
    hello_retry_count: u8,

    /// This side's own hybrid key-share secret key, kept from the moment the
    /// `ClientHello`/`ClientKeyExchange` carrying the public half went out
    /// until the peer's share arrives to decapsulate/encapsulate against.
    own_kem_secret: Option<Vec<u8>>,

    // --- TLS 1.2 key schedule state ---
    tls12_master_secret: Option<Vec<u8>>,

    // --- TLS 1.3 key schedule state ---
    tls13_master_secret: Option<Vec<u8>>,
    client_handshake_traffic_secret: Option<Vec<u8>>,
    server_handshake_traffic_secret: Option<Vec<u8>>,
    /// Transcript hash through the peer's `Finished` (RFC 8446 §7.1's
    /// `CH..SF`), needed both to verify that `Finished` and, unchanged, to
    /// derive the application traffic secrets afterwards.
    transcript_hash_through_peer_finished: Option<Vec<u8>>,
    /// The PSK secret selected for this handshake (server side), or all
    /// zeros for a non-PSK handshake (RFC 8446 §7.1).
    selected_psk_secret: Option<Vec<u8>>,

    /// Bytes read from the transport but not yet assembled into a full record.
    read_buffer: Stuffer,
    /// Bytes encoded but not yet handed to the transport.
    write_buffer: Stuffer,
    /// Decrypted application data records, waiting for [Connection::recv].
    incoming_application_data: Stuffer,

    /// Queues alerts generated while processing peer data, to be sent on the
    /// next call that can write, and alerts received from the peer, to be
    /// surfaced to the application. Kept separate per spec §4.4.
    outgoing_alerts: AlertQueue,
    incoming_alerts: AlertQueue,

    record_protection: RecordProtection,
}

impl Connection {
    #[must_use]
    pub fn client(config: Rc<Config>, server_name: ServerName) -> Self {
        config.mark_attached();
        Self {
            role: Role::Client,
            config,
            state: HandshakeState::Start,
            negotiated_version: TLS_RECORD_VERSION,
            negotiated_suite: None,
            server_name: Some(server_name),
            transcript: Vec::new(),
            client_random: [0; 32],
            server_random: [0; 32],
            hello_retry_count: 0,
            own_kem_secret: None,
            tls12_master_secret: None,
            tls13_master_secret: None,
            client_handshake_traffic_secret: None,
            server_handshake_traffic_secret: None,
            transcript_hash_through_peer_finished: None,
            selected_psk_secret: None,
            read_buffer: Stuffer::new(),
            write_buffer: Stuffer::new(),
            incoming_application_data: Stuffer::new(),
            outgoing_alerts: AlertQueue::new(),
            incoming_alerts: AlertQueue::new(),
            record_protection: RecordProtection::cleartext(),
        }
    }

    #[must_use]
    pub fn server(config: Rc<Config>) -> Self {
        config.mark_attached();
        Self {
            role: Role::Server,
            config,
            state: HandshakeState::WaitClientHello,
            negotiated_version: TLS_RECORD_VERSION,
            negotiated_suite: None,
            server_name: None,
            transcript: Vec::new(),
            client_random: [0; 32],
            server_random: [0; 32],
            hello_retry_count: 0,
            own_kem_secret: None,
            tls12_master_secret: None,
            tls13_master_secret: None,
            client_handshake_traffic_secret: None,
            server_handshake_traffic_secret: None,
            transcript_hash_through_peer_finished: None,
            selected_psk_secret: None,
            read_buffer: Stuffer::new(),
            write_buffer: Stuffer::new(),
            incoming_application_data: Stuffer::new(),
            outgoing_alerts: AlertQueue::new(),
            incoming_alerts: AlertQueue::new(),
            record_protection: RecordProtection::cleartext(),
        }
    }

    #[must_use]
    pub const fn is_established(&self) -> bool {
        matches!(self.state, HandshakeState::Connected)
    }

    /// The last alert received from the peer, if any, draining it from the
    /// incoming queue.
    pub fn take_incoming_alert(&mut self) -> Option<Alert> {
        self.incoming_alerts.drain()
    }

    /// Drives the handshake forward by at most one step, reading from and
    /// writing to `transport` as needed. Call repeatedly until it returns
    /// `Poll::Ready(())`.
    pub fn poll_handshake(&mut self, transport: &mut impl TransportContext) -> Poll<()> {
        if self.state == HandshakeState::Connected {
            return Poll::Ready(());
        }

        if self.state == HandshakeState::Start && self.role == Role::Client {
            match self.send_client_hello(transport) {
                Ok(()) => self.state = HandshakeState::WaitServerHello,
                Err(err) => return Poll::Err(err),
            }
        }

        match self.drive_record_loop(transport) {
            Ok(()) if self.state == HandshakeState::Connected => Poll::Ready(()),
            Ok(()) => Poll::BlockedOnRead,
            Err(TLSError::IoBlocked) => Poll::BlockedOnRead,
            Err(err) => {
                if let Some(description) = err.as_alert_description() {
                    self.outgoing_alerts.push(Alert::fatal(description));
                    let _ = self.flush_alerts(transport);
                }
                Poll::Err(err)
            },
        }
    }

    /// Appends `message`'s wire bytes to the transcript and writes them as a
    /// handshake record. Every message this side originates goes through
    /// here, so the transcript hash always matches what both peers computed
    /// the key schedule and `Finished` values over.
    fn write_handshake_message(&mut self, message: &impl Encoding, transport: &mut impl TransportContext) -> Result<(), TLSError> {
        let bytes = message.as_bytes();
        self.transcript.extend_from_slice(&bytes);
        self.write_record(ContentType::Handshake, &bytes, transport)
    }

    fn transcript_hash(&self) -> Vec<u8> {
        HashSha256::hash(&self.transcript)
    }

    fn send_client_hello(&mut self, transport: &mut impl TransportContext) -> Result<(), TLSError> {
        let mut rng = CryptographicRand::new().map_err(|_| TLSError::Alloc)?;
        let mut client_random = [0; 32];
        rng.fill(&mut client_random);
        self.client_random = client_random;

        let (kem_public_key, kem_secret_key) = ReferenceKem::keypair(&mut rng);
        self.own_kem_secret = Some(kem_secret_key);

        let mut extensions = vec![
            Extension::StatusRequest,
            Extension::RenegotiationInfo,
            Extension::SignedCertificateTimestamp,
            Extension::SupportedVersions(vec![(3, 4), (3, 3)]),
            Extension::KeyShare {
                group: HYBRID_GROUP,
                key_exchange: kem_public_key,
            },
        ];

        if let Some(ServerName::Domain(domain)) = &self.server_name {
            extensions.push(Extension::ServerName(domain.clone()));
        }

        let cipher_suites = if self.config.cipher_suites().is_empty() {
            SUPPORTED_CIPHER_SUITES.to_vec()
        } else {
            self.config.cipher_suites().to_vec()
        };

        // The PSK binder covers the transcript up to (and excluding) the
        // binders list itself (RFC 8446 §4.2.11.2); this crate approximates
        // that boundary as "the ClientHello with the PSK extension itself
        // left out", rather than splitting the binder bytes out of an
        // otherwise-complete extension (see `DESIGN.md`).
        if let Some(psk) = self.config.psk_store().as_slice().first() {
            let without_psk = ClientHello {
                client_random,
                cipher_suites: cipher_suites.clone(),
                extensions: extensions.clone(),
            };
            let transcript_hash_up_to_binders = HashSha256::hash(&without_psk.as_bytes());
            let binder = psk.binder(&transcript_hash_up_to_binders);
            extensions.push(Extension::PskOffer {
                identity: psk.identity.clone(),
                obfuscated_ticket_age: 0,
                binder,
            });
        }

        let client_hello = ClientHello {
            client_random,
            cipher_suites,
            extensions,
        };
        self.write_handshake_message(&client_hello, transport)
    }

    /// Reads whatever the transport currently has available, assembles
    /// complete records out of it, and processes as many as are ready without
    /// blocking.
    fn drive_record_loop(&mut self, transport: &mut impl TransportContext) -> Result<(), TLSError> {
        let mut chunk = [0; 4096];
        loop {
            let n = match transport.recv(&mut chunk) {
                Ok(0) => return Err(TLSError::IoBlocked),
                Ok(n) => n,
                Err(err) => return Err(err),
            };
            self.read_buffer.write_bytes(&chunk[..n])?;

            while let Some((content_type, payload)) = self.try_take_record()? {
                self.process_record(content_type, &payload, transport)?;
                if matches!(self.state, HandshakeState::Connected) {
                    return Ok(());
                }
            }
        }
    }

    /// Parses one record header + body out of `self.read_buffer` if a full
    /// record is already present, consuming it. Returns `None` if more bytes
    /// are needed.
    fn try_take_record(&mut self) -> Result<Option<(ContentType, Vec<u8>)>, TLSError> {
        if self.read_buffer.readable() < 5 {
            return Ok(None);
        }

        let available = self.read_buffer.as_slice();
        let content_type = ContentType::try_from(available[0])?;
        let length = u16::from_be_bytes([available[3], available[4]]) as usize;

        if available.len() < 5 + length {
            return Ok(None);
        }

        let ciphertext = available[5..5 + length].to_vec();
        self.read_buffer.skip_read(5 + length)?;

        let (content_type, plaintext) = self.record_protection.decrypt(content_type, &ciphertext)?;
        Ok(Some((content_type, plaintext)))
    }

    fn process_record(&mut self, content_type: ContentType, payload: &[u8], transport: &mut impl TransportContext) -> Result<(), TLSError> {
        match content_type {
            ContentType::Alert => {
                let alert = Alert::try_from(payload).map_err(TLSError::Alert)?;
                if alert.is_fatal(self.negotiated_version, false) {
                    self.state = HandshakeState::Closed;
                }
                self.incoming_alerts.push(alert);
                if alert.severity == Severity::Fatal {
                    return Err(TLSError::HandshakeFailure);
                }
                Ok(())
            },
            ContentType::Handshake => self.process_handshake_message(payload, transport),
            ContentType::ChangeCipherSpec => self.process_change_cipher_spec(),
            ContentType::ApplicationData => self.incoming_application_data.write_bytes(payload),
        }
    }

    /// `ChangeCipherSpec` is a real barrier in TLS 1.2 (it marks the point
    /// the peer switches to the negotiated keys, RFC 5246 §7.1) but a
    /// content-free compatibility record in TLS 1.3, sent only so
    /// middleboxes that choke on an unfamiliar handshake see a record shape
    /// they recognize (RFC 8446 appendix D.4) - harmless to receive in any
    /// state.
    fn process_change_cipher_spec(&mut self) -> Result<(), TLSError> {
        if self.negotiated_version.is_tls13() {
            return Ok(());
        }
        match self.state {
            HandshakeState::WaitServerChangeCipherSpec => {
                self.state = HandshakeState::WaitServerFinished;
                Ok(())
            },
            _ => Err(TLSError::HandshakeFailure),
        }
    }

    fn process_handshake_message(&mut self, payload: &[u8], transport: &mut impl TransportContext) -> Result<(), TLSError> {
        let message = HandshakeMessage::new(payload)?;

        // `Finished` messages are verified against the transcript hash *as
        // of just before this message*, so they can't be appended up front
        // like every other message is.
        if !matches!(message, HandshakeMessage::Finished(_)) {
            self.transcript.extend_from_slice(payload);
        }

        match (self.state, message) {
            (HandshakeState::WaitServerHello, HandshakeMessage::HelloRetryRequest(_)) => {
                // The HRR's bytes were just appended above; undo that and
                // restart the handshake as RFC 8446 §4.1.4 prescribes for at
                // most one retry.
                self.transcript.truncate(self.transcript.len() - payload.len());
                if self.hello_retry_count >= 1 {
                    return Err(TLSError::HandshakeFailure);
                }
                self.hello_retry_count += 1;
                self.transcript.clear();
                self.send_client_hello(transport)?;
                Ok(())
            },

            (HandshakeState::WaitServerHello, HandshakeMessage::ServerHello(hello)) => self.handle_server_hello(hello),

            // --- TLS 1.2 client ---
            (HandshakeState::WaitCertificate, HandshakeMessage::Certificate(chain)) => self.handle_certificate(&chain),
            (HandshakeState::WaitServerKeyExchange, HandshakeMessage::ServerKeyExchange(ske)) => {
                self.handle_server_key_exchange(&ske)
            },
            (HandshakeState::WaitServerHelloDone, HandshakeMessage::ServerHelloDone) => {
                self.handle_server_hello_done(transport)
            },
            (HandshakeState::WaitServerFinished, HandshakeMessage::Finished(finished)) => {
                self.verify_tls12_server_finished(&finished, payload)
            },

            // --- TLS 1.3 client ---
            (HandshakeState::WaitEncryptedExtensions, HandshakeMessage::EncryptedExtensions(_)) => {
                self.state = if self.selected_psk_secret.is_some() {
                    HandshakeState::WaitTls13Finished
                } else {
                    HandshakeState::WaitTls13Certificate
                };
                Ok(())
            },
            (HandshakeState::WaitTls13Certificate, HandshakeMessage::Certificate(chain)) => self.handle_certificate(&chain),
            (HandshakeState::WaitCertificateVerify, HandshakeMessage::CertificateVerify(_)) => {
                self.state = HandshakeState::WaitTls13Finished;
                Ok(())
            },
            (HandshakeState::WaitTls13Finished, HandshakeMessage::Finished(finished)) => {
                self.verify_tls13_peer_finished_then_respond(&finished, payload, transport)
            },

            // --- TLS 1.3 server (PSK-only) ---
            (HandshakeState::WaitClientHello, HandshakeMessage::ClientHello(hello)) => {
                self.handle_client_hello(&hello, payload, transport)
            },
            (HandshakeState::WaitClientFinished, HandshakeMessage::Finished(finished)) => {
                self.verify_tls13_client_finished(&finished, payload)
            },

            _ => Err(TLSError::HandshakeFailure),
        }
    }

    fn handle_server_hello(&mut self, hello: ServerHello) -> Result<(), TLSError> {
        // The legacy `version` field is frozen at `{3, 3}` for TLS 1.3 (RFC
        // 8446 §4.1.3); the real negotiated version travels in
        // `supported_versions` instead.
        let negotiated_version = match hello.find_extension(ExtensionType::SupportedVersions) {
            Some(Extension::SupportedVersions(versions)) if !versions.is_empty() => {
                ProtocolVersion::new(versions[0].0, versions[0].1)
            },
            _ => hello.version,
        };

        if negotiated_version < self.config.min_version() || negotiated_version > self.config.max_version() {
            log::warn!(
                "server selected {negotiated_version:?}, outside the configured [{:?}, {:?}] range",
                self.config.min_version(),
                self.config.max_version()
            );
            return Err(TLSError::BadVersion);
        }

        self.negotiated_version = negotiated_version;
        self.negotiated_suite = Some(hello.selected_cipher_suite);
        self.server_random = hello.server_random;

        if negotiated_version.is_tls13() {
            self.handle_tls13_server_hello(&hello)
        } else {
            self.handle_tls12_server_hello(hello.selected_cipher_suite)
        }
    }

    fn handle_tls12_server_hello(&mut self, suite: CipherSuite) -> Result<(), TLSError> {
        let descriptor = suite.descriptor();
        if descriptor.key_exchange != KeyExchangeAlgorithm::Ecdhe {
            // Plain RSA/DH static key exchange has no real key this crate
            // can derive (see `DESIGN.md`); the suite stays offered for
            // compatibility but fails cleanly the moment it's negotiated.
            return Err(TLSError::CipherType);
        }
        if !matches!(descriptor.cipher, BulkCipher::Aes128Gcm | BulkCipher::Aes128Cbc) {
            return Err(TLSError::CipherType);
        }
        self.state = HandshakeState::WaitCertificate;
        Ok(())
    }

    fn handle_tls13_server_hello(&mut self, hello: &ServerHello) -> Result<(), TLSError> {
        let shared_secret = match hello.find_extension(ExtensionType::KeyShare) {
            Some(Extension::KeyShare { key_exchange, .. }) => {
                let secret = self.own_kem_secret.take().ok_or(TLSError::State)?;
                ReferenceKem::decapsulate(&secret, key_exchange)
            },
            None => vec![0u8; 32],
            _ => return Err(TLSError::BadMessage),
        };

        let psk_secret = match hello.find_extension(ExtensionType::PreSharedKey) {
            Some(Extension::PskSelected(index)) => {
                let psk = resolve_selected_psk(self.config.psk_store(), *index as usize)?;
                Some(psk.secret.clone())
            },
            _ => None,
        };
        let psk_input = psk_secret.clone().unwrap_or_else(|| vec![0u8; 32]);
        self.selected_psk_secret = psk_secret;

        let transcript_hash_hello = self.transcript_hash();
        let secrets = tls13_handshake_secrets(&psk_input, &shared_secret, &transcript_hash_hello);

        let (key_len, iv_len) = tls13_key_iv_lens(hello.selected_cipher_suite);
        let (client_key, client_iv) = tls13_traffic_keys(&secrets.client_handshake_traffic_secret, key_len, iv_len);
        let (server_key, server_iv) = tls13_traffic_keys(&secrets.server_handshake_traffic_secret, key_len, iv_len);

        self.record_protection.install_keys(
            hello.selected_cipher_suite,
            self.negotiated_version,
            TrafficKeys { key: client_key, iv: client_iv, mac_key: vec![] },
            TrafficKeys { key: server_key, iv: server_iv, mac_key: vec![] },
        )?;

        self.tls13_master_secret = Some(secrets.master_secret);
        self.client_handshake_traffic_secret = Some(secrets.client_handshake_traffic_secret);
        self.server_handshake_traffic_secret = Some(secrets.server_handshake_traffic_secret);
        self.state = HandshakeState::WaitEncryptedExtensions;
        Ok(())
    }

    fn handle_certificate(&mut self, chain: &CertificateChain) -> Result<(), TLSError> {
        let suite = self.negotiated_suite.ok_or(TLSError::State)?;
        let certificates = chain.certificates();
        let leaf = certificates.first().ok_or(TLSError::CertInvalid)?;

        certificate_type_valid_for_auth(leaf, suite)?;
        if !chain_is_trusted(certificates, self.config.trust_store()) {
            return Err(TLSError::CertUntrusted);
        }

        self.state = if self.negotiated_version.is_tls13() {
            HandshakeState::WaitCertificateVerify
        } else {
            HandshakeState::WaitServerKeyExchange
        };
        Ok(())
    }

    fn handle_server_key_exchange(&mut self, ske: &ServerKeyExchange) -> Result<(), TLSError> {
        let mut rng = CryptographicRand::new().map_err(|_| TLSError::Alloc)?;
        let (ciphertext, shared_secret) = ReferenceKem::encapsulate(&mut rng, &ske.public_key);
        self.own_kem_secret = Some(ciphertext);
        self.tls12_master_secret = Some(shared_secret);
        self.state = HandshakeState::WaitServerHelloDone;
        Ok(())
    }

    fn handle_server_hello_done(&mut self, transport: &mut impl TransportContext) -> Result<(), TLSError> {
        let suite = self.negotiated_suite.ok_or(TLSError::State)?;
        // `own_kem_secret` carries the ciphertext we encapsulated against
        // the server's published public key back in `handle_server_key_exchange`.
        let ciphertext = self.own_kem_secret.take().ok_or(TLSError::State)?;
        let pre_master_secret = self.tls12_master_secret.take().ok_or(TLSError::State)?;

        self.write_handshake_message(&ClientKeyExchange { ciphertext }, transport)?;

        let mut seed = self.client_random.to_vec();
        seed.extend_from_slice(&self.server_random);
        let master_secret = tls12_prf(&pre_master_secret, b"master secret", &seed, 48);

        let (mac_key_len, enc_key_len, fixed_iv_len) = tls12_key_block_params(suite);
        let key_block = tls12_key_block(&master_secret, &self.server_random, &self.client_random, mac_key_len, enc_key_len, fixed_iv_len);

        self.write_record(ContentType::ChangeCipherSpec, &[1], transport)?;
        self.record_protection.install_keys(
            suite,
            self.negotiated_version,
            TrafficKeys { key: key_block.client_write_key, iv: key_block.client_write_iv, mac_key: key_block.client_write_mac_key },
            TrafficKeys { key: key_block.server_write_key, iv: key_block.server_write_iv, mac_key: key_block.server_write_mac_key },
        )?;

        let transcript_hash = self.transcript_hash();
        let verify_data = tls12_finished_verify_data(&master_secret, b"client finished", &transcript_hash);
        self.write_handshake_message(&Finished { verify_data }, transport)?;

        self.tls12_master_secret = Some(master_secret);
        self.state = HandshakeState::WaitServerChangeCipherSpec;
        Ok(())
    }

    fn verify_tls12_server_finished(&mut self, finished: &Finished, raw_message: &[u8]) -> Result<(), TLSError> {
        let master_secret = self.tls12_master_secret.clone().ok_or(TLSError::State)?;
        let transcript_hash = self.transcript_hash();
        let expected = tls12_finished_verify_data(&master_secret, b"server finished", &transcript_hash);

        if !constant_time_eq(&expected, &finished.verify_data) {
            return Err(TLSError::FinishedMismatch);
        }

        self.transcript.extend_from_slice(raw_message);
        self.state = HandshakeState::Connected;
        Ok(())
    }

    fn verify_tls13_peer_finished_then_respond(
        &mut self,
        finished: &Finished,
        raw_message: &[u8],
        transport: &mut impl TransportContext,
    ) -> Result<(), TLSError> {
        let server_handshake_traffic_secret = self.server_handshake_traffic_secret.clone().ok_or(TLSError::State)?;
        let transcript_hash_before = self.transcript_hash();
        let server_finished_key = tls13_finished_key(&server_handshake_traffic_secret, HashSha256::OUTPUT_LEN);
        let expected = HmacSha256::mac(&server_finished_key, &transcript_hash_before);

        if !constant_time_eq(&expected, &finished.verify_data) {
            return Err(TLSError::FinishedMismatch);
        }

        self.transcript.extend_from_slice(raw_message);
        // RFC 8446 §7.1's `CH..SF`: the transcript through the peer's
        // Finished, used for both the client's own Finished and the
        // application traffic secrets derived right after it.
        let transcript_hash_server_finished = self.transcript_hash();
        self.transcript_hash_through_peer_finished = Some(transcript_hash_server_finished.clone());

        let client_handshake_traffic_secret = self.client_handshake_traffic_secret.clone().ok_or(TLSError::State)?;
        let client_finished_key = tls13_finished_key(&client_handshake_traffic_secret, HashSha256::OUTPUT_LEN);
        let client_verify_data = HmacSha256::mac(&client_finished_key, &transcript_hash_server_finished);
        self.write_handshake_message(&Finished { verify_data: client_verify_data }, transport)?;

        self.install_tls13_application_keys()?;
        self.state = HandshakeState::Connected;
        Ok(())
    }

    fn install_tls13_application_keys(&mut self) -> Result<(), TLSError> {
        let suite = self.negotiated_suite.ok_or(TLSError::State)?;
        let master_secret = self.tls13_master_secret.clone().ok_or(TLSError::State)?;
        let transcript_hash = self.transcript_hash_through_peer_finished.clone().ok_or(TLSError::State)?;

        let (client_secret, server_secret) = tls13_application_traffic_secrets(&master_secret, &transcript_hash);
        let (key_len, iv_len) = tls13_key_iv_lens(suite);

        let (write_secret, read_secret) = match self.role {
            Role::Client => (client_secret, server_secret),
            Role::Server => (server_secret, client_secret),
        };
        let (write_key, write_iv) = tls13_traffic_keys(&write_secret, key_len, iv_len);
        let (read_key, read_iv) = tls13_traffic_keys(&read_secret, key_len, iv_len);

        self.record_protection.install_keys(
            suite,
            self.negotiated_version,
            TrafficKeys { key: write_key, iv: write_iv, mac_key: vec![] },
            TrafficKeys { key: read_key, iv: read_iv, mac_key: vec![] },
        )
    }

    /// Server side of the PSK-only (spec §8.3) TLS 1.3 flow: this crate's
    /// [Config] carries no server certificate/private key (see `config.rs`),
    /// so a live server handshake only ever completes when the client offers
    /// a PSK this config recognizes.
    fn handle_client_hello(&mut self, hello: &ClientHello, raw_message: &[u8], transport: &mut impl TransportContext) -> Result<(), TLSError> {
        self.client_random = hello.client_random;

        let Some(Extension::PskOffer { identity, .. }) = hello.find_extension(ExtensionType::PreSharedKey) else {
            return Err(TLSError::NoServerCredentials);
        };
        let psk_index = self.config.psk_store().find_by_identity(identity).ok_or(TLSError::BadMessage)?;
        let psk = resolve_selected_psk(self.config.psk_store(), psk_index)?.clone();

        let suite = *hello
            .cipher_suites
            .iter()
            .find(|suite| SUPPORTED_CIPHER_SUITES.contains(suite) && suite.descriptor().key_exchange == KeyExchangeAlgorithm::None)
            .ok_or(TLSError::UnknownCipherSuite)?;
        self.negotiated_suite = Some(suite);
        self.negotiated_version = ProtocolVersion::new(3, 4);

        let mut rng = CryptographicRand::new().map_err(|_| TLSError::Alloc)?;
        let mut server_random = [0; 32];
        rng.fill(&mut server_random);
        self.server_random = server_random;

        let server_hello = ServerHello {
            version: ProtocolVersion::new(3, 3),
            server_random,
            session_id: SessionId::empty(),
            selected_cipher_suite: suite,
            selected_compression_method: crate::handshake::CompressionMethod::None,
            extensions: vec![
                Extension::SupportedVersions(vec![(3, 4)]),
                Extension::PskSelected(psk_index as u16),
            ],
        };
        self.write_handshake_message(&server_hello, transport)?;

        let transcript_hash_hello = self.transcript_hash();
        let secrets = tls13_handshake_secrets(&psk.secret, &[0u8; 32], &transcript_hash_hello);
        let (key_len, iv_len) = tls13_key_iv_lens(suite);
        let (client_key, client_iv) = tls13_traffic_keys(&secrets.client_handshake_traffic_secret, key_len, iv_len);
        let (server_key, server_iv) = tls13_traffic_keys(&secrets.server_handshake_traffic_secret, key_len, iv_len);

        self.record_protection.install_keys(
            suite,
            self.negotiated_version,
            TrafficKeys { key: server_key, iv: server_iv, mac_key: vec![] },
            TrafficKeys { key: client_key, iv: client_iv, mac_key: vec![] },
        )?;

        self.tls13_master_secret = Some(secrets.master_secret);
        self.client_handshake_traffic_secret = Some(secrets.client_handshake_traffic_secret.clone());
        self.server_handshake_traffic_secret = Some(secrets.server_handshake_traffic_secret.clone());
        self.selected_psk_secret = Some(psk.secret);

        self.write_handshake_message(&EncryptedExtensions { extensions: vec![] }, transport)?;

        let transcript_hash_before_finished = self.transcript_hash();
        let server_finished_key = tls13_finished_key(&secrets.server_handshake_traffic_secret, HashSha256::OUTPUT_LEN);
        let verify_data = HmacSha256::mac(&server_finished_key, &transcript_hash_before_finished);
        self.write_handshake_message(&Finished { verify_data }, transport)?;

        let _ = raw_message; // already folded into the transcript generically
        self.state = HandshakeState::WaitClientFinished;
        Ok(())
    }

    fn verify_tls13_client_finished(&mut self, finished: &Finished, raw_message: &[u8]) -> Result<(), TLSError> {
        let client_handshake_traffic_secret = self.client_handshake_traffic_secret.clone().ok_or(TLSError::State)?;
        let transcript_hash_before = self.transcript_hash();
        let client_finished_key = tls13_finished_key(&client_handshake_traffic_secret, HashSha256::OUTPUT_LEN);
        let expected = HmacSha256::mac(&client_finished_key, &transcript_hash_before);

        if !constant_time_eq(&expected, &finished.verify_data) {
            return Err(TLSError::FinishedMismatch);
        }

        // `CH..SF` (server's Finished) is exactly the transcript hash we just
        // computed `expected` over, since the server's own Finished was
        // already appended by the time this message arrives.
        self.transcript_hash_through_peer_finished = Some(transcript_hash_before);
        self.transcript.extend_from_slice(raw_message);

        self.install_tls13_application_keys()?;
        self.state = HandshakeState::Connected;
        Ok(())
    }

    fn write_record(
        &mut self,
        content_type: ContentType,
        plaintext: &[u8],
        transport: &mut impl TransportContext,
    ) -> Result<(), TLSError> {
        let (wire_content_type, ciphertext) = self.record_protection.encrypt(content_type, plaintext)?;

        let mut header = Vec::with_capacity(5 + ciphertext.len());
        header.push(wire_content_type as u8);
        header.extend_from_slice(&[TLS_RECORD_VERSION.major, TLS_RECORD_VERSION.minor]);
        header.extend_from_slice(&u16::try_from(ciphertext.len()).map_err(|_| TLSError::Overflow)?.to_be_bytes());
        header.extend_from_slice(&ciphertext);

        let mut written = 0;
        while written < header.len() {
            match transport.send(&header[written..]) {
                Ok(0) => return Err(TLSError::IoBlocked),
                Ok(n) => written += n,
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn flush_alerts(&mut self, transport: &mut impl TransportContext) -> Result<(), TLSError> {
        while let Some(alert) = self.outgoing_alerts.drain() {
            self.write_record(ContentType::Alert, &alert.as_bytes(), transport)?;
        }
        Ok(())
    }

    /// Sends `plaintext` as application data. Must only be called once
    /// [Connection::is_established] is `true`.
    pub fn send(&mut self, plaintext: &[u8], transport: &mut impl TransportContext) -> Poll<()> {
        if self.state != HandshakeState::Connected {
            return Poll::Err(TLSError::State);
        }
        self.write_record(ContentType::ApplicationData, plaintext, transport).into()
    }

    /// Reads decrypted application data into `out`, returning the number of
    /// bytes written. Drains whatever is already buffered first; only talks
    /// to `transport` if the buffer is empty. Must only be called once
    /// [Connection::is_established] is `true`.
    pub fn recv(&mut self, out: &mut [u8], transport: &mut impl TransportContext) -> Poll<usize> {
        if self.state != HandshakeState::Connected {
            return Poll::Err(TLSError::State);
        }

        if self.incoming_application_data.readable() == 0 {
            if let Err(err) = self.drive_record_loop(transport) {
                if !matches!(err, TLSError::IoBlocked) {
                    return Poll::Err(err);
                }
            }
        }

        let available = self.incoming_application_data.readable();
        if available == 0 {
            return Poll::BlockedOnRead;
        }

        let n = available.min(out.len());
        match self.incoming_application_data.read_n(n) {
            Ok(bytes) => {
                out[..n].copy_from_slice(bytes);
                Poll::Ready(n)
            },
            Err(err) => Poll::Err(err),
        }
    }

    /// Initiates an orderly shutdown by sending `close_notify` (spec §4.4).
    /// The connection is considered closed locally as soon as this returns
    /// `Poll::Ready`; a well-behaved peer will reply with its own
    /// `close_notify`, which is surfaced via [Connection::take_incoming_alert].
    pub fn shutdown(&mut self, transport: &mut impl TransportContext) -> Poll<()> {
        if self.state == HandshakeState::Closed {
            return Poll::Ready(());
        }
        let result = self.write_record(ContentType::Alert, &Alert::close_notify().as_bytes(), transport);
        if result.is_ok() {
            self.state = HandshakeState::Closed;
        }
        result.into()
    }
}

/// `key_len`/`iv_len` for a TLS 1.3 suite's AEAD (RFC 8446 §5.2): the only
/// two this crate's `ciphers`/`provider` stack backs are AES-128-GCM-like
/// (16-byte key) and ChaCha20-Poly1305-like (32-byte key); both use a
/// 12-byte IV.
fn tls13_key_iv_lens(suite: CipherSuite) -> (usize, usize) {
    match suite.descriptor().cipher {
        BulkCipher::ChaCha20Poly1305 => (32, 12),
        _ => (16, 12),
    }
}

/// `mac_key_len`/`enc_key_len`/`fixed_iv_len` for RFC 5246 §6.3's
/// `key_block`, per bulk cipher family: CBC has no fixed IV (its IV is a
/// fresh random value per record, see `record_layer.rs`) but needs a MAC
/// key; GCM is the reverse.
fn tls12_key_block_params(suite: CipherSuite) -> (usize, usize, usize) {
    match suite.descriptor().cipher {
        BulkCipher::Aes128Cbc => (32, 16, 0),
        _ => (0, 16, 4),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
