//! TLS 1.2 ([RFC 5246](https://www.rfc-editor.org/rfc/rfc5246)) and TLS 1.3
//! ([RFC 8446](https://www.rfc-editor.org/rfc/rfc8446)) record-and-handshake core.

#![feature(
    cursor_remaining,
    array_chunks,
    result_flattening,
    exclusive_range_pattern,
    ascii_char,
    ascii_char_variants
)]

pub mod alert;
pub mod auth_selection;
pub mod certificate;
pub mod cipher_suite;
pub mod config;
pub mod connection;
pub mod der;
mod encoding;
pub mod error;
pub mod extension;
pub mod handshake;
pub mod kem;
pub mod key_schedule;
pub mod provider;
pub mod psk;
pub mod random;
pub mod record_layer;
mod server_name;
mod session;
pub mod stuffer;

use encoding::Encoding;
use session::SessionId;

pub use cipher_suite::CipherSuite;
pub use connection::Connection;
pub use error::TLSError;
pub use server_name::ServerName;
