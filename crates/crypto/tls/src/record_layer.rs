//! TLS Record Layer Protocol (L2): turns plaintext handshake/application/alert
//! messages into the protected records that actually go on the wire, and back.

use crate::{
    cipher_suite::{BulkCipher, CipherSuite},
    provider::{aes128_cbc_decrypt, aes128_cbc_encrypt, Aead, Aes128GcmLike, ChaCha20Poly1305Like, Hmac, HmacSha256, Random},
    random::CryptographicRand,
    TLSError,
};

/// The maximum length allowed for an individual TLS record's plaintext
/// (RFC 8446 §5.1: `2^14` bytes, plus room for the TLS 1.3 content-type byte
/// and authentication tag).
const TLS_RECORD_MAX_LENGTH: usize = (1 << 14) + 256;

/// The record-layer version field baked into every AAD computation. Frozen at
/// `{3, 3}` for both TLS 1.2 and TLS 1.3 records (RFC 8446 §5.1).
const RECORD_VERSION: [u8; 2] = [3, 3];

/// HMAC tag length used uniformly as the CBC record MAC, standing in for
/// every negotiable MAC (`Sha1`, `Sha256`) this crate's cipher suite table
/// advertises - the `hash` crate backing this workspace has no SHA-1, so
/// every CBC suite's MAC is computed with [HmacSha256] instead (see
/// `DESIGN.md`).
const CBC_MAC_LEN: usize = 32;
const CBC_BLOCK_LEN: usize = 16;
/// Upper bound on how much padding a record is allowed to claim, fixed so the
/// constant-time scan below always walks the same number of bytes regardless
/// of what the peer actually sent.
const MAX_PADDING_SCAN: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentType {
    ChangeCipherSpec,
    Alert,
    Handshake,
    ApplicationData,
}

impl TryFrom<u8> for ContentType {
    type Error = TLSError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            20 => Ok(Self::ChangeCipherSpec),
            21 => Ok(Self::Alert),
            22 => Ok(Self::Handshake),
            23 => Ok(Self::ApplicationData),
            other => {
                log::warn!("Unknown TLS content type: {other}");
                Err(TLSError::UnknownContentType)
            },
        }
    }
}

impl From<ContentType> for u8 {
    fn from(value: ContentType) -> Self {
        match value {
            ContentType::ChangeCipherSpec => 20,
            ContentType::Alert => 21,
            ContentType::Handshake => 22,
            ContentType::ApplicationData => 23,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Record {
    pub content_type: ContentType,
    pub data: Vec<u8>,
}

/// Which AEAD/cipher family the negotiated cipher suite maps to. `None`
/// before the handshake establishes keys (records flow in cleartext, spec
/// §4.2's "null cipher" state).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AeadKind {
    None,
    Aes128Gcm,
    ChaCha20Poly1305,
    Aes128Cbc,
}

impl AeadKind {
    fn from_cipher_suite(suite: CipherSuite) -> Result<Self, TLSError> {
        match suite.descriptor().cipher {
            BulkCipher::Aes128Gcm => Ok(Self::Aes128Gcm),
            BulkCipher::ChaCha20Poly1305 => Ok(Self::ChaCha20Poly1305),
            BulkCipher::Aes128Cbc => Ok(Self::Aes128Cbc),
            // AES-256 (GCM or CBC) has no block-cipher primitive in this
            // workspace's `ciphers` crate (AES-128 only); plain RSA key
            // exchange has no supported auth path either. Both fail cleanly
            // here rather than being silently downgraded.
            _ => Err(TLSError::CipherType),
        }
    }

    const fn is_cbc(self) -> bool {
        matches!(self, Self::Aes128Cbc)
    }
}

/// Traffic secrets produced by the key schedule (`tls12_key_block` for TLS
/// 1.2, `tls13_traffic_keys` for TLS 1.3) for a single direction.
#[derive(Clone, Default)]
pub struct TrafficKeys {
    pub key: Vec<u8>,
    /// AEAD fixed IV (GCM) or HMAC key (CBC's MAC). Unused for CBC's own IV,
    /// which is a fresh random value generated per record instead.
    pub iv: Vec<u8>,
    pub mac_key: Vec<u8>,
}

/// One direction's worth of record protection state: the cipher key, the
/// fixed part of its per-record nonce (AEAD) or its MAC key (CBC), and the
/// 64-bit sequence number folded into the nonce/AAD (RFC 8446 §5.3 / RFC 5246
/// §6.2.3.3).
#[derive(Clone)]
struct DirectionKeys {
    key: Vec<u8>,
    fixed_iv: Vec<u8>,
    mac_key: Vec<u8>,
    sequence_number: u64,
}

impl DirectionKeys {
    /// The fully-implicit TLS 1.3 nonce: `fixed_iv XOR sequence_number` (RFC
    /// 8446 §5.3).
    fn implicit_nonce(&self) -> Vec<u8> {
        let mut nonce = self.fixed_iv.clone();
        let sequence_bytes = self.sequence_number.to_be_bytes();
        let offset = nonce.len() - sequence_bytes.len();
        for (byte, seq_byte) in nonce[offset..].iter_mut().zip(sequence_bytes) {
            *byte ^= seq_byte;
        }
        nonce
    }

    /// The TLS 1.2 GCM "partially explicit" nonce: `fixed_iv(4) ||
    /// explicit_nonce(8)` (RFC 5288). The explicit part is simply the
    /// sequence number's big-endian bytes - unique per record by
    /// construction, without needing to thread an RNG through `encrypt`.
    fn explicit_nonce(&self) -> (Vec<u8>, [u8; 8]) {
        let explicit = self.sequence_number.to_be_bytes();
        let mut nonce = self.fixed_iv.clone();
        nonce.extend_from_slice(&explicit);
        (nonce, explicit)
    }
}

/// Encrypts and decrypts records for the two independent directions of a
/// connection. Starts out in the "null cipher" state (records pass through
/// unmodified) and is upgraded to real protection once the handshake's key
/// schedule produces traffic keys.
pub struct RecordProtection {
    kind: AeadKind,
    is_tls13: bool,
    write: Option<DirectionKeys>,
    read: Option<DirectionKeys>,
    /// CBC's explicit per-record IV needs genuine unpredictability (a
    /// BEAST-class attacker that can predict it can adaptively choose
    /// plaintext blocks); GCM's explicit nonce reuses the sequence number
    /// instead, since GCM only needs nonce uniqueness, not
    /// unpredictability. Built lazily inside `install_keys` only when a CBC
    /// suite is actually negotiated.
    rng: Option<CryptographicRand>,
}

impl RecordProtection {
    #[must_use]
    pub const fn cleartext() -> Self {
        Self {
            kind: AeadKind::None,
            is_tls13: false,
            write: None,
            read: None,
            rng: None,
        }
    }

    /// Installs traffic keys for both directions, switching a previously
    /// cleartext connection over to real record protection. `version.is_tls13()`
    /// selects the TLS 1.3 fully-implicit nonce / inner-content-type framing
    /// over the TLS 1.2 explicit-nonce / flat-AAD framing.
    pub fn install_keys(
        &mut self,
        suite: CipherSuite,
        version: crate::connection::ProtocolVersion,
        write: TrafficKeys,
        read: TrafficKeys,
    ) -> Result<(), TLSError> {
        let kind = AeadKind::from_cipher_suite(suite)?;

        if kind.is_cbc() {
            self.rng = Some(CryptographicRand::new().map_err(|_| TLSError::Alloc)?);
        }

        self.kind = kind;
        self.is_tls13 = version.is_tls13();
        self.write = Some(DirectionKeys {
            key: write.key,
            fixed_iv: write.iv,
            mac_key: write.mac_key,
            sequence_number: 0,
        });
        self.read = Some(DirectionKeys {
            key: read.key,
            fixed_iv: read.iv,
            mac_key: read.mac_key,
            sequence_number: 0,
        });
        Ok(())
    }

    /// TLS 1.3 AAD (RFC 8446 §5.2): the wire record header itself
    /// (`ApplicationData || {3,3} || ciphertext_length`), since the real
    /// content type travels inside the encrypted inner plaintext instead.
    fn tls13_aad(ciphertext_len: u16) -> Vec<u8> {
        let mut aad = vec![u8::from(ContentType::ApplicationData)];
        aad.extend_from_slice(&RECORD_VERSION);
        aad.extend_from_slice(&ciphertext_len.to_be_bytes());
        aad
    }

    /// TLS 1.2 AAD (RFC 5246 §6.2.3.3 for AEAD, §6.2.3.2 for the CBC MAC):
    /// `seq_num(8) || type || version || length`.
    fn tls12_aad(sequence_number: u64, content_type: ContentType, length: u16) -> Vec<u8> {
        let mut aad = Vec::with_capacity(8 + 1 + 2 + 2);
        aad.extend_from_slice(&sequence_number.to_be_bytes());
        aad.push(u8::from(content_type));
        aad.extend_from_slice(&RECORD_VERSION);
        aad.extend_from_slice(&length.to_be_bytes());
        aad
    }

    /// Encrypts one record's plaintext, returning the content type that
    /// belongs on the wire (always `ApplicationData` for a TLS 1.3 protected
    /// record, since the real type is hidden inside) and the record body.
    pub fn encrypt(&mut self, content_type: ContentType, plaintext: &[u8]) -> Result<(ContentType, Vec<u8>), TLSError> {
        if plaintext.len() > TLS_RECORD_MAX_LENGTH {
            return Err(TLSError::Overflow);
        }

        let Some(keys) = &mut self.write else {
            return Ok((content_type, plaintext.to_vec()));
        };

        let wire = match self.kind {
            AeadKind::None => plaintext.to_vec(),
            AeadKind::Aes128Gcm | AeadKind::ChaCha20Poly1305 if self.is_tls13 => {
                let mut inner = plaintext.to_vec();
                inner.push(u8::from(content_type));
                let nonce = keys.implicit_nonce();
                let aad = Self::tls13_aad((inner.len() + tag_len(self.kind)) as u16);
                seal(self.kind, &keys.key, &nonce, &aad, &inner)
            },
            AeadKind::Aes128Gcm | AeadKind::ChaCha20Poly1305 => {
                let (nonce, explicit) = keys.explicit_nonce();
                let aad = Self::tls12_aad(keys.sequence_number, content_type, plaintext.len() as u16);
                let mut out = explicit.to_vec();
                out.extend_from_slice(&seal(self.kind, &keys.key, &nonce, &aad, plaintext));
                out
            },
            AeadKind::Aes128Cbc => {
                let aad = Self::tls12_aad(keys.sequence_number, content_type, plaintext.len() as u16);
                let mac = HmacSha256::mac(&keys.mac_key, &[aad.as_slice(), plaintext].concat());

                let mut to_encrypt = plaintext.to_vec();
                to_encrypt.extend_from_slice(&mac);
                let pad_len = (CBC_BLOCK_LEN - (to_encrypt.len() + 1) % CBC_BLOCK_LEN) % CBC_BLOCK_LEN;
                to_encrypt.extend(std::iter::repeat(pad_len as u8).take(pad_len + 1));

                let rng = self.rng.as_mut().ok_or(TLSError::KeyInit)?;
                let mut iv = [0u8; CBC_BLOCK_LEN];
                rng.fill(&mut iv);
                let key: [u8; 16] = keys.key.as_slice().try_into().map_err(|_| TLSError::KeyInit)?;

                let mut out = iv.to_vec();
                out.extend_from_slice(&aes128_cbc_encrypt(&key, &iv, &to_encrypt));
                out
            },
        };

        keys.sequence_number = keys.sequence_number.checked_add(1).ok_or(TLSError::Overflow)?;
        Ok((if self.is_tls13 && self.kind != AeadKind::None { ContentType::ApplicationData } else { content_type }, wire))
    }

    /// Decrypts one record body, returning the *real* content type (recovered
    /// from the trailing non-zero byte of the inner plaintext for TLS 1.3,
    /// or simply the wire content type for TLS 1.2/cleartext) and the
    /// decrypted payload.
    pub fn decrypt(&mut self, content_type: ContentType, ciphertext: &[u8]) -> Result<(ContentType, Vec<u8>), TLSError> {
        let Some(keys) = &mut self.read else {
            return Ok((content_type, ciphertext.to_vec()));
        };

        let result = match self.kind {
            AeadKind::None => Ok((content_type, ciphertext.to_vec())),
            AeadKind::Aes128Gcm | AeadKind::ChaCha20Poly1305 if self.is_tls13 => {
                let nonce = keys.implicit_nonce();
                let aad = Self::tls13_aad(ciphertext.len() as u16);
                open(self.kind, &keys.key, &nonce, &aad, ciphertext).and_then(|inner| recover_inner_content_type(inner))
            },
            AeadKind::Aes128Gcm | AeadKind::ChaCha20Poly1305 => {
                let explicit_len = 8;
                if ciphertext.len() < explicit_len {
                    Err(TLSError::Decrypt)
                } else {
                    let (explicit, body) = ciphertext.split_at(explicit_len);
                    let mut nonce = keys.fixed_iv.clone();
                    nonce.extend_from_slice(explicit);
                    let aad = Self::tls12_aad(keys.sequence_number, content_type, (body.len() - tag_len(self.kind)) as u16);
                    open(self.kind, &keys.key, &nonce, &aad, body).map(|plaintext| (content_type, plaintext))
                }
            },
            AeadKind::Aes128Cbc => {
                decrypt_cbc_record(keys, content_type, ciphertext).map(|plaintext| (content_type, plaintext))
            },
        };

        keys.sequence_number = keys.sequence_number.checked_add(1).ok_or(TLSError::Overflow)?;
        result
    }
}

fn tag_len(kind: AeadKind) -> usize {
    match kind {
        AeadKind::Aes128Gcm => Aes128GcmLike::TAG_LEN,
        AeadKind::ChaCha20Poly1305 => ChaCha20Poly1305Like::TAG_LEN,
        AeadKind::Aes128Cbc | AeadKind::None => 0,
    }
}

fn seal(kind: AeadKind, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Vec<u8> {
    match kind {
        AeadKind::Aes128Gcm => Aes128GcmLike::seal(key, nonce, aad, plaintext),
        AeadKind::ChaCha20Poly1305 => ChaCha20Poly1305Like::seal(key, nonce, aad, plaintext),
        AeadKind::Aes128Cbc | AeadKind::None => plaintext.to_vec(),
    }
}

fn open(kind: AeadKind, key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, TLSError> {
    match kind {
        AeadKind::Aes128Gcm => Aes128GcmLike::open(key, nonce, aad, ciphertext),
        AeadKind::ChaCha20Poly1305 => ChaCha20Poly1305Like::open(key, nonce, aad, ciphertext),
        AeadKind::Aes128Cbc | AeadKind::None => Ok(ciphertext.to_vec()),
    }
}

/// TLS 1.3 inner-plaintext framing (RFC 8446 §5.2): the decrypted AEAD output
/// is `content || content_type || zeros*`. The real type is the last
/// non-zero byte; everything after it (including that byte) is padding and
/// gets discarded.
fn recover_inner_content_type(mut inner: Vec<u8>) -> Result<(ContentType, Vec<u8>), TLSError> {
    while let Some(&0) = inner.last() {
        inner.pop();
    }
    let Some(type_byte) = inner.pop() else {
        return Err(TLSError::Decrypt);
    };
    let content_type = ContentType::try_from(type_byte)?;
    Ok((content_type, inner))
}

/// Decrypts and verifies a CBC record (RFC 5246 §6.2.3.2) with a single
/// control flow regardless of whether the padding or the MAC turns out to be
/// valid, so a peer watching response timing cannot distinguish "bad padding"
/// from "bad MAC" (the Lucky 13 class of attack). The comparison work itself
/// (MAC recomputed over a secret-dependent slice length) is not fully
/// cycle-constant - see `DESIGN.md` for the honest limits of this
/// mitigation.
fn decrypt_cbc_record(keys: &mut DirectionKeys, content_type: ContentType, ciphertext: &[u8]) -> Result<Vec<u8>, TLSError> {
    if ciphertext.len() < CBC_BLOCK_LEN + CBC_BLOCK_LEN {
        return Err(TLSError::Decrypt);
    }
    let (iv, body) = ciphertext.split_at(CBC_BLOCK_LEN);
    if body.len() % CBC_BLOCK_LEN != 0 {
        return Err(TLSError::Decrypt);
    }

    let iv: [u8; CBC_BLOCK_LEN] = iv.try_into().map_err(|_| TLSError::Decrypt)?;
    let key: [u8; 16] = keys.key.as_slice().try_into().map_err(|_| TLSError::Decrypt)?;
    let decrypted = aes128_cbc_decrypt(&key, &iv, body);

    let total_len = decrypted.len();
    // The last byte, whatever it is, is read unconditionally: this is what
    // keeps the rest of the function's shape identical for every input.
    let claimed_pad_len = *decrypted.last().ok_or(TLSError::Decrypt)? as usize;

    let max_content_len = total_len.saturating_sub(CBC_MAC_LEN + 1);
    let content_len = max_content_len.saturating_sub(claimed_pad_len);
    let pad_len = max_content_len - content_len;

    let mut padding_diff: u8 = 0;
    for i in 0..MAX_PADDING_SCAN {
        // Every iteration touches a byte, clamped into range, so the loop
        // performs the same number of reads/XORs no matter how long the real
        // padding is.
        let index = (content_len + CBC_MAC_LEN + i).min(total_len.saturating_sub(1)).max(content_len);
        let expected = if i < pad_len { claimed_pad_len as u8 } else { padding_diff };
        padding_diff |= decrypted.get(index).copied().unwrap_or(0) ^ expected;
    }
    let padding_ok = padding_diff == 0 && claimed_pad_len < CBC_BLOCK_LEN && total_len >= CBC_MAC_LEN + 1;

    let content_end = content_len.min(total_len);
    let received_mac_start = content_end;
    let received_mac_end = (received_mac_start + CBC_MAC_LEN).min(total_len);
    let received_mac = &decrypted[received_mac_start..received_mac_end];

    let aad = RecordProtection::tls12_aad(keys.sequence_number, content_type, content_end as u16);
    let expected_mac = HmacSha256::mac(&keys.mac_key, &[aad.as_slice(), &decrypted[..content_end]].concat());

    let mac_ok = received_mac.len() == CBC_MAC_LEN
        && expected_mac.iter().zip(received_mac).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0;

    if padding_ok & mac_ok {
        Ok(decrypted[..content_end].to_vec())
    } else {
        Err(TLSError::Decrypt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ProtocolVersion;

    fn keys(key: Vec<u8>, iv: Vec<u8>) -> TrafficKeys {
        TrafficKeys {
            key,
            iv,
            mac_key: vec![],
        }
    }

    #[test]
    fn cleartext_passes_through_unmodified() {
        let mut protection = RecordProtection::cleartext();
        let (_, ciphertext) = protection.encrypt(ContentType::Handshake, b"client hello").unwrap();
        assert_eq!(ciphertext, b"client hello");
    }

    #[test]
    fn aes_gcm_tls13_roundtrips_and_advances_sequence_numbers() {
        let mut writer = RecordProtection::cleartext();
        writer
            .install_keys(
                CipherSuite::TLS_AES_128_GCM_SHA256,
                ProtocolVersion::new(3, 4),
                keys(vec![0x11; 16], vec![0x22; 12]),
                keys(vec![0x33; 16], vec![0x44; 12]),
            )
            .unwrap();

        let mut reader = RecordProtection::cleartext();
        reader
            .install_keys(
                CipherSuite::TLS_AES_128_GCM_SHA256,
                ProtocolVersion::new(3, 4),
                keys(vec![0x33; 16], vec![0x44; 12]),
                keys(vec![0x11; 16], vec![0x22; 12]),
            )
            .unwrap();

        let (wire_type, first) = writer.encrypt(ContentType::ApplicationData, b"ping").unwrap();
        let (_, second) = writer.encrypt(ContentType::ApplicationData, b"ping").unwrap();
        assert_eq!(wire_type, ContentType::ApplicationData);
        assert_ne!(first, second, "sequence number must perturb the nonce");

        let (real_type, plaintext) = reader.decrypt(ContentType::ApplicationData, &first).unwrap();
        assert_eq!(real_type, ContentType::ApplicationData);
        assert_eq!(plaintext, b"ping");
        assert_eq!(reader.decrypt(ContentType::ApplicationData, &second).unwrap().1, b"ping");
    }

    #[test]
    fn tls13_inner_content_type_survives_trailing_zero_padding() {
        let mut writer = RecordProtection::cleartext();
        writer
            .install_keys(
                CipherSuite::TLS_AES_128_GCM_SHA256,
                ProtocolVersion::new(3, 4),
                keys(vec![0x11; 16], vec![0x22; 12]),
                keys(vec![0x11; 16], vec![0x22; 12]),
            )
            .unwrap();

        let (_, ciphertext) = writer.encrypt(ContentType::Handshake, b"finished-body").unwrap();

        let mut reader = RecordProtection::cleartext();
        reader
            .install_keys(
                CipherSuite::TLS_AES_128_GCM_SHA256,
                ProtocolVersion::new(3, 4),
                keys(vec![0x11; 16], vec![0x22; 12]),
                keys(vec![0x11; 16], vec![0x22; 12]),
            )
            .unwrap();

        let (real_type, plaintext) = reader.decrypt(ContentType::ApplicationData, &ciphertext).unwrap();
        assert_eq!(real_type, ContentType::Handshake);
        assert_eq!(plaintext, b"finished-body");
    }

    #[test]
    fn gcm_tls12_explicit_nonce_is_sequence_number_and_roundtrips() {
        let mut writer = RecordProtection::cleartext();
        writer
            .install_keys(
                CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
                ProtocolVersion::new(3, 3),
                keys(vec![0x11; 16], vec![0x22; 4]),
                keys(vec![0x11; 16], vec![0x22; 4]),
            )
            .unwrap();
        let mut reader = RecordProtection::cleartext();
        reader
            .install_keys(
                CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
                ProtocolVersion::new(3, 3),
                keys(vec![0x11; 16], vec![0x22; 4]),
                keys(vec![0x11; 16], vec![0x22; 4]),
            )
            .unwrap();

        let (_, wire) = writer.encrypt(ContentType::ApplicationData, b"hello").unwrap();
        assert_eq!(&wire[..8], &0u64.to_be_bytes(), "first record's explicit nonce is sequence number 0");

        let (_, plaintext) = reader.decrypt(ContentType::ApplicationData, &wire).unwrap();
        assert_eq!(plaintext, b"hello");
    }

    #[test]
    fn cbc_roundtrips_with_random_iv_each_record() {
        let mac_key = vec![0x55; 32];
        let mut writer = RecordProtection::cleartext();
        writer
            .install_keys(
                CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
                ProtocolVersion::new(3, 3),
                TrafficKeys { key: vec![0x11; 16], iv: vec![], mac_key: mac_key.clone() },
                TrafficKeys { key: vec![0x11; 16], iv: vec![], mac_key: mac_key.clone() },
            )
            .unwrap();
        let mut reader = RecordProtection::cleartext();
        reader
            .install_keys(
                CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
                ProtocolVersion::new(3, 3),
                TrafficKeys { key: vec![0x11; 16], iv: vec![], mac_key: mac_key.clone() },
                TrafficKeys { key: vec![0x11; 16], iv: vec![], mac_key },
            )
            .unwrap();

        let (_, first) = writer.encrypt(ContentType::ApplicationData, b"hello world").unwrap();
        let (_, second) = writer.encrypt(ContentType::ApplicationData, b"hello world").unwrap();
        assert_ne!(&first[..CBC_BLOCK_LEN], &second[..CBC_BLOCK_LEN], "IV must be fresh every record");

        assert_eq!(reader.decrypt(ContentType::ApplicationData, &first).unwrap().1, b"hello world");
        assert_eq!(reader.decrypt(ContentType::ApplicationData, &second).unwrap().1, b"hello world");
    }

    #[test]
    fn cbc_rejects_tampered_padding_and_tampered_mac_identically() {
        let mac_key = vec![0x55; 32];
        let mut writer = RecordProtection::cleartext();
        writer
            .install_keys(
                CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
                ProtocolVersion::new(3, 3),
                TrafficKeys { key: vec![0x11; 16], iv: vec![], mac_key: mac_key.clone() },
                TrafficKeys { key: vec![0x11; 16], iv: vec![], mac_key: mac_key.clone() },
            )
            .unwrap();
        let (_, good) = writer.encrypt(ContentType::ApplicationData, b"0123456789abcdef").unwrap();

        let mut tampered_padding = good.clone();
        *tampered_padding.last_mut().unwrap() ^= 0x01;

        let mut tampered_body = good.clone();
        let mid = tampered_body.len() / 2;
        tampered_body[mid] ^= 0x01;

        let mut reader_a = RecordProtection::cleartext();
        reader_a
            .install_keys(
                CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
                ProtocolVersion::new(3, 3),
                TrafficKeys { key: vec![0x11; 16], iv: vec![], mac_key: mac_key.clone() },
                TrafficKeys { key: vec![0x11; 16], iv: vec![], mac_key: mac_key.clone() },
            )
            .unwrap();
        let err_a = reader_a.decrypt(ContentType::ApplicationData, &tampered_padding).unwrap_err();

        let mut reader_b = RecordProtection::cleartext();
        reader_b
            .install_keys(
                CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
                ProtocolVersion::new(3, 3),
                TrafficKeys { key: vec![0x11; 16], iv: vec![], mac_key: mac_key.clone() },
                TrafficKeys { key: vec![0x11; 16], iv: vec![], mac_key },
            )
            .unwrap();
        let err_b = reader_b.decrypt(ContentType::ApplicationData, &tampered_body).unwrap_err();

        assert!(matches!(err_a, TLSError::Decrypt));
        assert!(matches!(err_b, TLSError::Decrypt));
    }
}
