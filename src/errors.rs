//! The crate's internal error taxonomy.
//!
//! `ErrorKind` covers every way parsing, dispatch, or I/O can fail before
//! or during a request/response cycle. Unlike a typical web framework,
//! this type carries no response-synthesis capability: the connection
//! pipeline never turns an `ErrorKind` into bytes on the wire. A
//! pre-response error means the socket is closed, full stop (§7).

use crate::query;
use std::{error, fmt, io};

#[derive(Debug, PartialEq)]
pub(crate) enum ErrorKind {
    /// More bytes are needed before the current phase can be decided.
    /// Always recovered locally by the I/O loop; never terminal.
    NeedMore,
    /// The peer closed the socket with nothing (or an incomplete
    /// message) pending.
    EndOfStream,
    /// The buffer is full of unrecognized bytes and the current phase has
    /// nowhere left to scan without overflowing `NeedMore`.
    BufferOverflow,

    EmptyMethod,
    BadMethod,
    UnknownMethod,

    BadUri,
    BadScheme,
    EmptyHost,
    BadHost,
    TooBigPort,
    BadPort,
    BadPath,
    Query(query::Error),

    BadVersion,
    UnknownStatus,
    BadStatus,
    BadReason,

    EmptyHeaderName,
    EmptyHeaderValue,
    BadHeader,
    BadLineEnding,
    BadContentLength,
    MultipleContentLength,
    TooManyHeaders,

    UnexpectedBody,
    BodyTooLarge,
    BodySizeBiggerThanContentLength,

    /// Dispatch found no handler registered for the request's method.
    EmptyHandler,

    RecvRequestTimeoutWithNothing,
    RecvRequestLineTimeout,
    RecvRequestHeadersTimeout,
    RecvRequestBodyTimeout,
    SendTimeout,

    /// The handler produced a `Response` that fails `valid_response`'s
    /// well-formedness checks (§4.G) — wrong protocol version or an
    /// unknown status code.
    InvalidResponse,

    Io(IoError),
}

impl error::Error for ErrorKind {}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl ErrorKind {
    /// Whether this error is recoverable by reading more bytes and
    /// retrying the same parse call (§7, Propagation).
    #[inline(always)]
    pub(crate) const fn is_need_more(&self) -> bool {
        matches!(self, ErrorKind::NeedMore)
    }
}

impl From<query::Error> for ErrorKind {
    fn from(err: query::Error) -> Self {
        ErrorKind::Query(err)
    }
}

impl From<io::Error> for ErrorKind {
    fn from(err: io::Error) -> Self {
        ErrorKind::Io(IoError(err))
    }
}

#[derive(Debug)]
pub(crate) struct IoError(pub(crate) io::Error);

impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_compares_by_kind() {
        let a = ErrorKind::from(io::Error::from(io::ErrorKind::UnexpectedEof));
        let b = ErrorKind::from(io::Error::from(io::ErrorKind::UnexpectedEof));
        assert_eq!(a, b);

        let c = ErrorKind::from(io::Error::from(io::ErrorKind::ConnectionReset));
        assert_ne!(a, c);
    }

    #[test]
    fn display_uses_debug_form() {
        assert_eq!(format!("{}", ErrorKind::TooManyHeaders), "TooManyHeaders");
    }

    #[test]
    fn need_more_is_the_only_recoverable_variant() {
        assert!(ErrorKind::NeedMore.is_need_more());
        assert!(!ErrorKind::BadMethod.is_need_more());
    }
}
