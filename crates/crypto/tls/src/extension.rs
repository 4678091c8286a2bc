//! TLS extensions ([RFC 5246 §7.4.1.4](https://www.rfc-editor.org/rfc/rfc5246#section-7.4.1.4),
//! [RFC 8446 §4.2](https://www.rfc-editor.org/rfc/rfc8446#section-4.2)).
//!
//! Every extension carries an IANA-assigned [ExtensionType] code, an owning
//! message (`ClientHello`, `ServerHello`, `EncryptedExtensions`, ...), and is
//! encoded as `type (2 bytes) || length (2 bytes) || data`. Unknown extensions
//! are never an error on their own (spec §4.3's "missing-handler policy"): the
//! handshake layer skips them and only fails if an extension it *does*
//! recognize shows up somewhere it must not, or twice.

use crate::{
    encoding::{Cursor, Decoding, Encoding},
    TLSError,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum ExtensionType {
    ServerName,
    StatusRequest,
    SupportedGroups,
    SignatureAlgorithms,
    RenegotiationInfo,
    SignedCertificateTimestamp,
    KeyShare,
    PreSharedKey,
    PskKeyExchangeModes,
    SupportedVersions,
    Unknown(u16),
}

impl ExtensionType {
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::ServerName => 0x0000,
            Self::StatusRequest => 0x0005,
            Self::SupportedGroups => 0x000A,
            Self::SignatureAlgorithms => 0x000D,
            Self::RenegotiationInfo => 0xFF01,
            Self::SignedCertificateTimestamp => 0x0012,
            Self::KeyShare => 0x0033,
            Self::PreSharedKey => 0x0029,
            Self::PskKeyExchangeModes => 0x002D,
            Self::SupportedVersions => 0x002B,
            Self::Unknown(code) => code,
        }
    }

    #[must_use]
    pub const fn from_code(code: u16) -> Self {
        match code {
            0x0000 => Self::ServerName,
            0x0005 => Self::StatusRequest,
            0x000A => Self::SupportedGroups,
            0x000D => Self::SignatureAlgorithms,
            0xFF01 => Self::RenegotiationInfo,
            0x0012 => Self::SignedCertificateTimestamp,
            0x0033 => Self::KeyShare,
            0x0029 => Self::PreSharedKey,
            0x002D => Self::PskKeyExchangeModes,
            0x002B => Self::SupportedVersions,
            other => Self::Unknown(other),
        }
    }
}

/// The set of extensions this implementation knows how to produce and
/// consume. A `ClientHello` sends a subset of these; a `ServerHello` or
/// `EncryptedExtensions` message echoes back the ones it negotiated.
#[derive(Clone, Debug)]
pub enum Extension {
    ServerName(String),
    StatusRequest,
    RenegotiationInfo,
    SignedCertificateTimestamp,
    /// TLS 1.3 `supported_versions` (RFC 8446 §4.2.1): a `ClientHello` sends
    /// the list of versions it is willing to negotiate, most-preferred first;
    /// a `ServerHello` echoes back the single version it selected.
    SupportedVersions(Vec<(u8, u8)>),
    /// TLS 1.3 `key_share` (RFC 8446 §4.2.8). This crate only ever offers or
    /// selects a single group, so the client's `KeyShareClientHello` list and
    /// the server's single `KeyShareServerHello` entry collapse to the same
    /// `(group, key_exchange)` shape; `group` is otherwise uninterpreted
    /// (there is only the one reference key-exchange primitive, see
    /// `kem.rs`).
    KeyShare { group: u16, key_exchange: Vec<u8> },
    /// TLS 1.3 `pre_shared_key` as sent by the client (RFC 8446 §4.2.11): one
    /// identity/binder pair, since this crate never offers more than one PSK
    /// per handshake.
    PskOffer {
        identity: Vec<u8>,
        obfuscated_ticket_age: u32,
        binder: Vec<u8>,
    },
    /// TLS 1.3 `pre_shared_key` as echoed by the server: the index into the
    /// client's offered identity list that was selected.
    PskSelected(u16),
}

impl Extension {
    #[must_use]
    pub const fn extension_type(&self) -> ExtensionType {
        match self {
            Self::ServerName(_) => ExtensionType::ServerName,
            Self::StatusRequest => ExtensionType::StatusRequest,
            Self::RenegotiationInfo => ExtensionType::RenegotiationInfo,
            Self::SignedCertificateTimestamp => ExtensionType::SignedCertificateTimestamp,
            Self::SupportedVersions(_) => ExtensionType::SupportedVersions,
            Self::KeyShare { .. } => ExtensionType::KeyShare,
            Self::PskOffer { .. } | Self::PskSelected(_) => ExtensionType::PreSharedKey,
        }
    }
}

impl Encoding for Extension {
    fn encode(&self, bytes: &mut Vec<u8>) {
        bytes.extend_from_slice(&self.extension_type().code().to_be_bytes());

        let mut data = vec![];
        match self {
            Self::ServerName(hostname) => {
                let hostname_bytes = hostname.as_bytes();
                let hostname_len = hostname_bytes.len() as u16;

                let mut server_name_list = Vec::with_capacity(3 + hostname_bytes.len());
                server_name_list.push(0x00); // entry is a DNS hostname
                server_name_list.extend_from_slice(&hostname_len.to_be_bytes());
                server_name_list.extend_from_slice(hostname_bytes);

                data.extend_from_slice(&(server_name_list.len() as u16).to_be_bytes());
                data.extend_from_slice(&server_name_list);
            },
            Self::StatusRequest => {
                data.push(0x01); // OCSP status type
                data.extend_from_slice(&[0x00, 0x00]); // no responder ID
                data.extend_from_slice(&[0x00, 0x00]); // no request extension info
            },
            Self::RenegotiationInfo => {
                data.push(0x00); // new connection, no prior verify data
            },
            Self::SignedCertificateTimestamp => {},
            Self::SupportedVersions(versions) => {
                data.push((versions.len() * 2) as u8);
                for (major, minor) in versions {
                    data.push(*major);
                    data.push(*minor);
                }
            },
            Self::KeyShare { group, key_exchange } => {
                data.extend_from_slice(&group.to_be_bytes());
                data.extend_from_slice(&(key_exchange.len() as u16).to_be_bytes());
                data.extend_from_slice(key_exchange);
            },
            Self::PskOffer {
                identity,
                obfuscated_ticket_age,
                binder,
            } => {
                let mut identities = Vec::new();
                identities.extend_from_slice(&(identity.len() as u16).to_be_bytes());
                identities.extend_from_slice(identity);
                identities.extend_from_slice(&obfuscated_ticket_age.to_be_bytes());
                data.extend_from_slice(&(identities.len() as u16).to_be_bytes());
                data.extend_from_slice(&identities);

                let mut binders = Vec::new();
                binders.push(binder.len() as u8);
                binders.extend_from_slice(binder);
                data.extend_from_slice(&(binders.len() as u16).to_be_bytes());
                data.extend_from_slice(&binders);
            },
            Self::PskSelected(index) => {
                data.extend_from_slice(&index.to_be_bytes());
            },
        }

        bytes.extend_from_slice(&(data.len() as u16).to_be_bytes());
        bytes.extend_from_slice(&data);
    }
}

/// Parses a `u16`-length-prefixed extension list. The wire shape of
/// `type || length || data` is the same for a `ClientHello` and a
/// `ServerHello`/`EncryptedExtensions`, but `key_share` and `pre_shared_key`
/// carry different bodies depending on who sent them (an offer vs. a
/// selection); `from_server` picks which one to parse. An extension this
/// crate does not recognize, or recognizes but has no use for on the
/// receiving side, is skipped rather than rejected.
pub fn decode_extensions<'a>(cursor: &mut Cursor<'a>, from_server: bool) -> Result<Vec<Extension>, TLSError> {
    let total_len: u16 = cursor.decode()?;
    let total_len = total_len as usize;

    let remainder = cursor.remainder();
    if remainder.len() < total_len {
        return Err(TLSError::BadMessage);
    }
    let list_bytes = &remainder[..total_len];
    cursor.advance(total_len);

    let mut list_cursor = Cursor::new(list_bytes);
    let mut extensions = Vec::new();

    while !list_cursor.remainder().is_empty() {
        let ext_type_code: u16 = list_cursor.decode()?;
        let ext_type = ExtensionType::from_code(ext_type_code);
        let ext_len: u16 = list_cursor.decode()?;
        let ext_len = ext_len as usize;

        let remainder = list_cursor.remainder();
        if remainder.len() < ext_len {
            return Err(TLSError::BadMessage);
        }
        let body = &remainder[..ext_len];
        list_cursor.advance(ext_len);

        let mut body_cursor = Cursor::new(body);
        match ext_type {
            ExtensionType::KeyShare => {
                if from_server {
                    let group: u16 = body_cursor.decode()?;
                    let kx_len: u16 = body_cursor.decode()?;
                    let kx_len = kx_len as usize;
                    let remainder = body_cursor.remainder();
                    if remainder.len() < kx_len {
                        return Err(TLSError::BadMessage);
                    }
                    extensions.push(Extension::KeyShare {
                        group,
                        key_exchange: remainder[..kx_len].to_vec(),
                    });
                } else {
                    let _client_shares_len: u16 = body_cursor.decode()?;
                    let group: u16 = body_cursor.decode()?;
                    let kx_len: u16 = body_cursor.decode()?;
                    let kx_len = kx_len as usize;
                    let remainder = body_cursor.remainder();
                    if remainder.len() < kx_len {
                        return Err(TLSError::BadMessage);
                    }
                    extensions.push(Extension::KeyShare {
                        group,
                        key_exchange: remainder[..kx_len].to_vec(),
                    });
                }
            },
            ExtensionType::SupportedVersions => {
                if from_server {
                    let buf: [u8; 2] = body_cursor.decode()?;
                    extensions.push(Extension::SupportedVersions(vec![(buf[0], buf[1])]));
                } else {
                    let _list_len: u8 = body_cursor.decode()?;
                    let mut versions = Vec::new();
                    while !body_cursor.remainder().is_empty() {
                        let buf: [u8; 2] = body_cursor.decode()?;
                        versions.push((buf[0], buf[1]));
                    }
                    extensions.push(Extension::SupportedVersions(versions));
                }
            },
            ExtensionType::PreSharedKey => {
                if from_server {
                    let index: u16 = body_cursor.decode()?;
                    extensions.push(Extension::PskSelected(index));
                } else {
                    let identities_len: u16 = body_cursor.decode()?;
                    let identities_bytes = body_cursor
                        .remainder()
                        .get(..identities_len as usize)
                        .ok_or(TLSError::BadMessage)?
                        .to_vec();
                    body_cursor.advance(identities_len as usize);

                    let mut id_cursor = Cursor::new(&identities_bytes);
                    let id_len: u16 = id_cursor.decode()?;
                    let identity = id_cursor
                        .remainder()
                        .get(..id_len as usize)
                        .ok_or(TLSError::BadMessage)?
                        .to_vec();
                    id_cursor.advance(id_len as usize);
                    let obfuscated_ticket_age: u32 = id_cursor.decode()?;

                    let binders_len: u16 = body_cursor.decode()?;
                    let binders_bytes = body_cursor
                        .remainder()
                        .get(..binders_len as usize)
                        .ok_or(TLSError::BadMessage)?
                        .to_vec();
                    let mut binder_cursor = Cursor::new(&binders_bytes);
                    let binder_len: u8 = binder_cursor.decode()?;
                    let binder = binder_cursor
                        .remainder()
                        .get(..binder_len as usize)
                        .ok_or(TLSError::BadMessage)?
                        .to_vec();

                    extensions.push(Extension::PskOffer {
                        identity,
                        obfuscated_ticket_age,
                        binder,
                    });
                }
            },
            // Everything else (server_name, status_request, ...) is only ever
            // produced by this crate, never consumed back; nothing downstream
            // needs its content once it round-trips through a real peer.
            _ => {},
        }
    }

    Ok(extensions)
}
