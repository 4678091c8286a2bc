//! The alert protocol, as defined by
//! [RFC 5246 §7.2](https://www.rfc-editor.org/rfc/rfc5246#section-7.2.2) and
//! carried over unchanged by TLS 1.3.

use crate::{
    connection::ProtocolVersion,
    encoding::{self, Cursor, Decoding, Encoding},
    enum_encoding,
};

use error_derive::Error;

#[derive(Clone, Copy, Debug, Error)]
pub enum AlertError {
    #[msg = "unknown alert severity"]
    UnknownAlertSeverity,
    #[msg = "unknown alert description"]
    UnknownAlertCode,
    #[msg = "an alert message must be exactly 2 bytes"]
    MismatchedDataLength,
}

enum_encoding!(
    pub enum Severity(u8) {
        Warning = 1,
        Fatal = 2,
    }
);

enum_encoding!(
    pub enum Description(u8) {
        CloseNotify = 0,
        UnexpectedMessage = 10,
        BadRecordMAC = 20,
        DecryptionFailedReservedDoNotUse = 21,
        RecordOverflow = 22,
        DecompressionFailure = 30,
        HandshakeFailure = 40,
        NoCertificateReservedDoNotUse = 41,
        BadCertificate = 42,
        UnsupportedCertificate = 43,
        CertificateRevoked = 44,
        CertificateExpired = 45,
        CertificateUnknown = 46,
        IllegalParameter = 47,
        UnknownCA = 48,
        AccessDenied = 49,
        DecodeError = 50,
        DecryptError = 51,
        ExportRestrictionReservedDoNotUse = 60,
        ProtocolVersion = 70,
        InsufficientSecurity = 71,
        InternalError = 80,
        UserCanceled = 90,
        NoRenegotiation = 100,
        UnsupportedExtension = 110,
    }
);

#[derive(Clone, Copy, Debug)]
pub struct Alert {
    pub severity: Severity,
    pub description: Description,
}

impl Alert {
    #[must_use]
    pub const fn fatal(description: Description) -> Self {
        Self {
            severity: Severity::Fatal,
            description,
        }
    }

    #[must_use]
    pub const fn close_notify() -> Self {
        Self {
            severity: Severity::Warning,
            description: Description::CloseNotify,
        }
    }

    /// Whether this alert terminates the connection, per the rules in RFC 8446 §6:
    /// in TLS 1.3, every alert is fatal except `close_notify` and `user_canceled`.
    /// In TLS 1.2, warnings are fatal too unless the embedder opted out.
    #[must_use]
    pub fn is_fatal(&self, negotiated: ProtocolVersion, tolerate_warnings: bool) -> bool {
        if negotiated.major == 3 && negotiated.minor == 4 {
            !matches!(
                self.description,
                Description::CloseNotify | Description::UserCanceled
            )
        } else {
            match self.severity {
                Severity::Fatal => true,
                Severity::Warning => !tolerate_warnings,
            }
        }
    }
}

impl Encoding for Alert {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.severity.encode(bytes);
        self.description.encode(bytes);
    }
}

impl<'a> Decoding<'a> for Alert {
    fn decode(cursor: &mut Cursor<'a>) -> encoding::Result<Self> {
        let severity = cursor.decode()?;
        let description = cursor.decode()?;

        Ok(Self {
            severity,
            description,
        })
    }
}

impl TryFrom<&[u8]> for Alert {
    type Error = AlertError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != 2 {
            return Err(AlertError::MismatchedDataLength);
        }

        let mut cursor = Cursor::new(bytes);
        cursor.decode().map_err(|_| AlertError::UnknownAlertCode)
    }
}

/// One of the two independent alert queues a connection holds (`4.4`): alerts
/// raised by something the reader observed (a bad record) and alerts raised by
/// the writer (e.g. an application-requested shutdown). At most one alert is
/// ever pending per queue; a second push to a non-empty queue replaces the first,
/// since only the next outgoing record can carry it anyway.
#[derive(Debug, Default)]
pub struct AlertQueue {
    pending: Option<Alert>,
}

impl AlertQueue {
    #[must_use]
    pub const fn new() -> Self {
        Self { pending: None }
    }

    pub fn push(&mut self, alert: Alert) {
        self.pending = Some(alert);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_none()
    }

    /// Removes and returns the pending alert, if any, draining the queue.
    pub fn drain(&mut self) -> Option<Alert> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tls13_warning_other_than_close_notify_is_fatal() {
        let alert = Alert {
            severity: Severity::Warning,
            description: Description::DecodeError,
        };
        assert!(alert.is_fatal(ProtocolVersion::new(3, 4), true));
    }

    #[test]
    fn tls13_close_notify_is_not_fatal() {
        let alert = Alert::close_notify();
        assert!(!alert.is_fatal(ProtocolVersion::new(3, 4), false));
    }

    #[test]
    fn roundtrip() {
        let alert = Alert::fatal(Description::HandshakeFailure);
        let bytes = alert.as_bytes();
        let decoded = Alert::try_from(bytes.as_slice()).unwrap();
        assert_eq!(decoded.description, alert.description);
    }
}
