//! Grammar primitives shared by the request and response parsers.
//!
//! Every sub-machine in [`crate::http::request`] works the same way: given
//! the full span of bytes accumulated so far, it tries to recognize one
//! grammar production starting at offset 0. If the delimiter it's
//! scanning for isn't in the span yet, that's [`crate::errors::ErrorKind::NeedMore`]
//! — not a partial result to resume from, just "try again once more bytes
//! land". Re-deriving from the start of the span on every call is what
//! makes the parser's output depend only on the bytes seen so far, never
//! on where the socket happened to split them.

use crate::errors::ErrorKind;
use memchr::memchr;

/// How far the last parse attempt on the current message got before
/// running out of bytes. The connection pipeline reads this after a
/// [`ErrorKind::NeedMore`] to decide which of the phase-specific timeout
/// errors applies (§4.D/§4.G).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Nothing has arrived for this message yet.
    NothingYet,
    RequestLine,
    Headers,
    Body,
}

/// Splits off one CRLF-terminated line from the front of `data`.
///
/// Returns `Ok(None)` when no `\n` has arrived yet (caller's cue to
/// return `NeedMore`). A `\n` not preceded by `\r` is a malformed line
/// ending and fails immediately rather than waiting for more bytes —
/// that byte will never become valid no matter what follows it.
#[inline]
pub(crate) fn read_line(data: &[u8]) -> Result<Option<(&[u8], usize)>, ErrorKind> {
    let Some(pos) = memchr(b'\n', data) else {
        return Ok(None);
    };

    if pos == 0 || data[pos - 1] != b'\r' {
        return Err(ErrorKind::BadLineEnding);
    }

    Ok(Some((&data[..pos - 1], pos + 1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_line_needs_more_without_lf() {
        assert_eq!(read_line(b"GET / HTTP/1.1\r"), Ok(None));
        assert_eq!(read_line(b""), Ok(None));
    }

    #[test]
    fn read_line_splits_on_crlf() {
        assert_eq!(
            read_line(b"GET / HTTP/1.1\r\nHost: a\r\n"),
            Ok(Some((b"GET / HTTP/1.1".as_slice(), 16)))
        );
    }

    #[test]
    fn read_line_rejects_bare_lf() {
        assert_eq!(read_line(b"bad\n"), Err(ErrorKind::BadLineEnding));
    }
}
