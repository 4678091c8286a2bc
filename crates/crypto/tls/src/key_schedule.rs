//! Key derivation: the TLS 1.2 PRF ([RFC 5246 §5](https://www.rfc-editor.org/rfc/rfc5246#section-5))
//! and the TLS 1.3 HKDF-based schedule ([RFC 8446 §7.1](https://www.rfc-editor.org/rfc/rfc8446#section-7.1)),
//! both built on this workspace's own [hash]/HMAC primitives via [crate::provider::Hmac].

use crate::provider::{Hash, HashSha256, Hmac, HmacSha256};

/// `P_hash(secret, seed)` (RFC 5246 §5): the HMAC-iterated expansion function
/// both the PRF and HKDF-Expand are built from.
fn p_hash<H: Hmac>(secret: &[u8], seed: &[u8], output_len: usize) -> Vec<u8> {
    let mut result = Vec::with_capacity(output_len);
    let mut a = H::mac(secret, seed);

    while result.len() < output_len {
        let mut input = a.clone();
        input.extend_from_slice(seed);
        result.extend_from_slice(&H::mac(secret, &input));
        a = H::mac(secret, &a);
    }

    result.truncate(output_len);
    result
}

/// The TLS 1.2 PRF (RFC 5246 §5): `PRF(secret, label, seed) = P_<hash>(secret, label + seed)`.
/// This implementation always uses SHA-256, matching every suite this crate
/// negotiates (RFC 5246 §7.4.9 says TLS 1.2 ties the PRF hash to the cipher
/// suite; SHA-384 suites would use [crate::provider::HmacSha384] instead).
#[must_use]
pub fn tls12_prf(secret: &[u8], label: &[u8], seed: &[u8], output_len: usize) -> Vec<u8> {
    let mut labeled_seed = label.to_vec();
    labeled_seed.extend_from_slice(seed);
    p_hash::<HmacSha256>(secret, &labeled_seed, output_len)
}

/// `HKDF-Extract(salt, ikm)` (RFC 5869 §2.2), i.e. `HMAC-Hash(salt, ikm)`.
#[must_use]
pub fn hkdf_extract(salt: &[u8], ikm: &[u8]) -> Vec<u8> {
    HmacSha256::mac(salt, ikm)
}

/// `HKDF-Expand(prk, info, len)` (RFC 5869 §2.3).
#[must_use]
pub fn hkdf_expand(prk: &[u8], info: &[u8], len: usize) -> Vec<u8> {
    let mut result = Vec::with_capacity(len);
    let mut previous_block: Vec<u8> = vec![];
    let mut counter = 1u8;

    while result.len() < len {
        let mut input = previous_block.clone();
        input.extend_from_slice(info);
        input.push(counter);

        previous_block = HmacSha256::mac(prk, &input);
        result.extend_from_slice(&previous_block);
        counter += 1;
    }

    result.truncate(len);
    result
}

/// `HKDF-Expand-Label` (RFC 8446 §7.1): builds the `info` parameter as
/// `length || "tls13 " + label || context` and calls [hkdf_expand].
#[must_use]
pub fn hkdf_expand_label(secret: &[u8], label: &[u8], context: &[u8], len: usize) -> Vec<u8> {
    let mut info = Vec::with_capacity(2 + 1 + 6 + label.len() + 1 + context.len());
    info.extend_from_slice(&(len as u16).to_be_bytes());

    let mut full_label = Vec::with_capacity(6 + label.len());
    full_label.extend_from_slice(b"tls13 ");
    full_label.extend_from_slice(label);
    info.push(full_label.len() as u8);
    info.extend_from_slice(&full_label);

    info.push(context.len() as u8);
    info.extend_from_slice(context);

    hkdf_expand(secret, &info, len)
}

/// `Derive-Secret(secret, label, messages)` (RFC 8446 §7.1).
#[must_use]
pub fn derive_secret(secret: &[u8], label: &[u8], transcript_hash: &[u8]) -> Vec<u8> {
    hkdf_expand_label(secret, label, transcript_hash, 32)
}

/// `PRF(master_secret, "client finished" | "server finished", transcript_hash, 12)`
/// (RFC 5246 §7.4.9): the TLS 1.2 `Finished.verify_data`.
#[must_use]
pub fn tls12_finished_verify_data(master_secret: &[u8], label: &[u8], transcript_hash: &[u8]) -> Vec<u8> {
    tls12_prf(master_secret, label, transcript_hash, 12)
}

/// RFC 5246 §6.3's `key_block`: one PRF call sized to produce every traffic
/// secret a TLS 1.2 connection needs, split in the wire order
/// (`client_write_MAC_key, server_write_MAC_key, client_write_key,
/// server_write_key, client_write_IV, server_write_IV`). `mac_key_len` is 0 for
/// AEAD suites (the MAC is integrated into the cipher); `fixed_iv_len` is 0 for
/// CBC suites (their IV is an explicit per-record random value instead, RFC
/// 5246 §6.2.3.2), 4 for the GCM suites' partially-explicit nonce.
pub struct Tls12KeyBlock {
    pub client_write_mac_key: Vec<u8>,
    pub server_write_mac_key: Vec<u8>,
    pub client_write_key: Vec<u8>,
    pub server_write_key: Vec<u8>,
    pub client_write_iv: Vec<u8>,
    pub server_write_iv: Vec<u8>,
}

#[must_use]
pub fn tls12_key_block(
    master_secret: &[u8],
    server_random: &[u8; 32],
    client_random: &[u8; 32],
    mac_key_len: usize,
    enc_key_len: usize,
    fixed_iv_len: usize,
) -> Tls12KeyBlock {
    let mut seed = server_random.to_vec();
    seed.extend_from_slice(client_random);

    let total_len = 2 * mac_key_len + 2 * enc_key_len + 2 * fixed_iv_len;
    let block = tls12_prf(master_secret, b"key expansion", &seed, total_len);

    let mut offset = 0;
    let mut take = |len: usize| -> Vec<u8> {
        let slice = block[offset..offset + len].to_vec();
        offset += len;
        slice
    };

    let client_write_mac_key = take(mac_key_len);
    let server_write_mac_key = take(mac_key_len);
    let client_write_key = take(enc_key_len);
    let server_write_key = take(enc_key_len);
    let client_write_iv = take(fixed_iv_len);
    let server_write_iv = take(fixed_iv_len);

    Tls12KeyBlock {
        client_write_mac_key,
        server_write_mac_key,
        client_write_key,
        server_write_key,
        client_write_iv,
        server_write_iv,
    }
}

/// The secrets produced at the "handshake" stage of RFC 8446 §7.1's key
/// schedule diagram: `early_secret -> handshake_secret ->
/// {client,server}_handshake_traffic_secret`, plus the `master_secret` one
/// more `Derive-Secret`/`HKDF-Extract` step down the same chain (needed before
/// application traffic secrets can be derived once the handshake finishes).
pub struct Tls13HandshakeSecrets {
    pub client_handshake_traffic_secret: Vec<u8>,
    pub server_handshake_traffic_secret: Vec<u8>,
    pub master_secret: Vec<u8>,
}

/// `psk` is the PSK secret for a resumed/external-PSK handshake, or 32 zero
/// bytes when none is in use; `shared_secret` is the (EC)DHE/KEM shared
/// secret, or 32 zero bytes for a PSK-only handshake (RFC 8446 §7.1).
#[must_use]
pub fn tls13_handshake_secrets(psk: &[u8], shared_secret: &[u8], transcript_hash_hello: &[u8]) -> Tls13HandshakeSecrets {
    let zero_salt = vec![0u8; HashSha256::OUTPUT_LEN];
    let empty_hash = HashSha256::hash(b"");

    let early_secret = hkdf_extract(&zero_salt, psk);
    let derived1 = derive_secret(&early_secret, b"derived", &empty_hash);
    let handshake_secret = hkdf_extract(&derived1, shared_secret);

    let client_handshake_traffic_secret = derive_secret(&handshake_secret, b"c hs traffic", transcript_hash_hello);
    let server_handshake_traffic_secret = derive_secret(&handshake_secret, b"s hs traffic", transcript_hash_hello);

    let derived2 = derive_secret(&handshake_secret, b"derived", &empty_hash);
    let master_secret = hkdf_extract(&derived2, &zero_salt);

    Tls13HandshakeSecrets {
        client_handshake_traffic_secret,
        server_handshake_traffic_secret,
        master_secret,
    }
}

/// `{client,server}_application_traffic_secret_0` (RFC 8446 §7.1), derived
/// from `master_secret` once the transcript includes the server's `Finished`.
#[must_use]
pub fn tls13_application_traffic_secrets(master_secret: &[u8], transcript_hash_server_finished: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let client = derive_secret(master_secret, b"c ap traffic", transcript_hash_server_finished);
    let server = derive_secret(master_secret, b"s ap traffic", transcript_hash_server_finished);
    (client, server)
}

/// `HKDF-Expand-Label(secret, "key"/"iv", "", len)` (RFC 8446 §7.3): turns a
/// traffic secret into the actual AEAD key/IV pair for a direction.
#[must_use]
pub fn tls13_traffic_keys(secret: &[u8], key_len: usize, iv_len: usize) -> (Vec<u8>, Vec<u8>) {
    let key = hkdf_expand_label(secret, b"key", &[], key_len);
    let iv = hkdf_expand_label(secret, b"iv", &[], iv_len);
    (key, iv)
}

/// `HKDF-Expand-Label(traffic_secret, "finished", "", Hash.length)` (RFC 8446
/// §4.4.4): keys the HMAC used to compute/verify that direction's `Finished`.
#[must_use]
pub fn tls13_finished_key(traffic_secret: &[u8], hash_len: usize) -> Vec<u8> {
    hkdf_expand_label(traffic_secret, b"finished", &[], hash_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p_hash_produces_requested_length() {
        let output = p_hash::<HmacSha256>(b"secret", b"seed", 100);
        assert_eq!(output.len(), 100);
    }

    #[test]
    fn tls12_prf_is_deterministic() {
        let a = tls12_prf(b"master secret", b"key expansion", b"random bytes", 64);
        let b = tls12_prf(b"master secret", b"key expansion", b"random bytes", 64);
        assert_eq!(a, b);
    }

    #[test]
    fn hkdf_roundtrips_rfc5869_case1() {
        // RFC 5869 appendix A.1 test vector (SHA-256).
        let ikm = [0x0b; 22];
        let salt: [u8; 13] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
        let info: [u8; 10] = [0xf0, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8, 0xf9];

        let prk = hkdf_extract(&salt, &ikm);
        let expected_prk = [
            0x07, 0x77, 0x09, 0x36, 0x2c, 0x2e, 0x32, 0xdf, 0x0d, 0xdc, 0x3f, 0x0d, 0xc4, 0x7b, 0xba, 0x63, 0x90,
            0xb6, 0xc7, 0x3b, 0xb5, 0x0f, 0x9c, 0x31, 0x22, 0xec, 0x84, 0x4a, 0xd7, 0xc2, 0xb3, 0xe5,
        ];
        assert_eq!(prk, expected_prk);

        let okm = hkdf_expand(&prk, &info, 42);
        let expected_okm = [
            0x3c, 0xb2, 0x5f, 0x25, 0xfa, 0xac, 0xd5, 0x7a, 0x90, 0x43, 0x4f, 0x64, 0xd0, 0x36, 0x2f, 0x2a, 0x2d,
            0x2d, 0x0a, 0x90, 0xcf, 0x1a, 0x5a, 0x4c, 0x5d, 0xb0, 0x2d, 0x56, 0xec, 0xc4, 0xc5, 0xbf, 0x34, 0x00,
            0x72, 0x08, 0xd5, 0xb8, 0x87, 0x18, 0x58, 0x65,
        ];
        assert_eq!(okm, expected_okm);
    }
}
