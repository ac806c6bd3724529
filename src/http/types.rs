#![allow(rustdoc::bare_urls)]

//! Core HTTP protocol types and utilities

use crate::{errors::ErrorKind, limits::ReqLimits};

// TO LOWER CASE

#[rustfmt::skip]
const ASCII_TABLE: [u8; 256] = [
    //   x0    x1    x2    x3    x4    x5    x6    x7    x8    x9    xA    xB    xC    xD    xE    xF
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F, // 0x
    0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1A, 0x1B, 0x1C, 0x1D, 0x1E, 0x1F, // 1x
    0x20, 0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27, 0x28, 0x29, 0x2A, 0x2B, 0x2C, 0x2D, 0x2E, 0x2F, // 2x
    0x30, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3A, 0x3B, 0x3C, 0x3D, 0x3E, 0x3F, // 3x
    0x40, b'a', b'b', b'c', b'd', b'e', b'f', b'g', b'h', b'i', b'j', b'k', b'l', b'm', b'n', b'o', // 4x
    b'p', b'q', b'r', b's', b't', b'u', b'v', b'w', b'x', b'y', b'z', 0x5B, 0x5C, 0x5D, 0x5E, 0x5F, // 5x
    0x60, b'a', b'b', b'c', b'd', b'e', b'f', b'g', b'h', b'i', b'j', b'k', b'l', b'm', b'n', b'o', // 6x
    b'p', b'q', b'r', b's', b't', b'u', b'v', b'w', b'x', b'y', b'z', 0x7B, 0x7C, 0x7D, 0x7E, 0x7F, // 7x
    0x80, 0x81, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8A, 0x8B, 0x8C, 0x8D, 0x8E, 0x8F, // 8x
    0x90, 0x91, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9A, 0x9B, 0x9C, 0x9D, 0x9E, 0x9F, // 9x
    0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7, 0xA8, 0xA9, 0xAA, 0xAB, 0xAC, 0xAD, 0xAE, 0xAF, // Ax
    0xB0, 0xB1, 0xB2, 0xB3, 0xB4, 0xB5, 0xB6, 0xB7, 0xB8, 0xB9, 0xBA, 0xBB, 0xBC, 0xBD, 0xBE, 0xBF, // Bx
    0xC0, 0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0xCA, 0xCB, 0xCC, 0xCD, 0xCE, 0xCF, // Cx
    0xD0, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0xDA, 0xDB, 0xDC, 0xDD, 0xDE, 0xDF, // Dx
    0xE0, 0xE1, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0xEA, 0xEB, 0xEC, 0xED, 0xEE, 0xEF, // Ex
    0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0xFA, 0xFB, 0xFC, 0xFD, 0xFE, 0xFF, // Fx
];

#[inline(always)]
pub(crate) fn to_lower_case(src: &mut [u8]) {
    for byte in src.iter_mut() {
        *byte = ASCII_TABLE[*byte as usize];
    }
}

#[inline(always)]
pub(crate) fn into_lower_case(src: &[u8], result: &mut [u8]) -> usize {
    let len = src.len().min(result.len());
    for i in 0..len {
        result[i] = ASCII_TABLE[src[i] as usize];
    }
    len
}

#[inline(always)]
pub(crate) fn slice_to_usize(bytes: &[u8]) -> Option<usize> {
    let mut result: usize = 0;

    for &byte in bytes {
        if !byte.is_ascii_digit() {
            return None;
        }

        result = result
            .checked_mul(10)?
            .checked_add((byte - b'0') as usize)?;
    }

    Some(result)
}

/// RFC 9110 `tchar` classification table, indexed by byte value. Used by
/// the header-name and token sub-machines in [`crate::http::parser`].
pub(crate) const fn build_token_table() -> [bool; 256] {
    let mut table = [false; 256];
    let mut i = 0;
    while i < 256 {
        let b = i as u8;
        let is_alpha = b.is_ascii_alphanumeric();
        let is_special = matches!(
            b,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~'
        );
        table[i] = is_alpha || is_special;
        i += 1;
    }
    table
}

/// Characters permitted in a request-target by this crate's restricted
/// grammar (space, `?`, `#` and control bytes are always delimiters and
/// never reach this table).
pub(crate) const fn build_uri_table() -> [bool; 256] {
    let mut table = [false; 256];
    let mut i = 0;
    while i < 256 {
        let b = i as u8;
        let is_alpha = b.is_ascii_alphanumeric();
        let is_special = matches!(
            b,
            b'-' | b'.' | b'_' | b'~' | b':' | b'/' | b'@' | b'!' | b'$' | b'&' | b'\'' | b'('
                | b')' | b'*' | b'+' | b',' | b';' | b'=' | b'%'
        );
        table[i] = is_alpha || is_special;
        i += 1;
    }
    table
}

pub(crate) static TOKEN_TABLE: [bool; 256] = build_token_table();
pub(crate) static URI_TABLE: [bool; 256] = build_uri_table();

// SCHEME

/// The scheme portion of an absolute-form request-target. Most requests
/// use origin-form (just a path), in which case this is `Unknown` — it
/// only becomes `Http`/`Https` for proxy-style absolute-form targets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
    Unknown,
}

impl Scheme {
    #[inline(always)]
    pub(crate) fn from_bytes(src: &[u8]) -> Self {
        if src.eq_ignore_ascii_case(b"http") {
            Scheme::Http
        } else if src.eq_ignore_ascii_case(b"https") {
            Scheme::Https
        } else {
            Scheme::Unknown
        }
    }

    /// Default port implied by this scheme when the target carries none.
    #[inline(always)]
    pub const fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
            Scheme::Unknown => 0,
        }
    }
}

// METHOD

/// HTTP request methods recognized by the parser.
///
/// # References
///
/// - [RFC 9110, Section 9](https://datatracker.ietf.org/doc/html/rfc9110#section-9)
///
/// Any method token outside this list parses successfully as
/// [`Method::Unknown`] (the raw bytes remain available from the request
/// line) rather than failing the request — method dispatch is the
/// handler layer's concern, not the parser's.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Trace,
    Control,
    Purge,
    Options,
    Connect,
    /// Any method token not in the list above.
    Unknown,
}

/// Number of variants with a dense handler-table slot, i.e. every variant
/// except [`Method::Unknown`].
pub(crate) const METHOD_COUNT: usize = 10;

impl Method {
    /// Dense index used to key the per-method handler table in
    /// [`crate::dispatch`]. `Unknown` has no slot and no index.
    #[inline(always)]
    pub const fn index(self) -> Option<usize> {
        match self {
            Method::Get => Some(0),
            Method::Head => Some(1),
            Method::Post => Some(2),
            Method::Put => Some(3),
            Method::Delete => Some(4),
            Method::Trace => Some(5),
            Method::Control => Some(6),
            Method::Purge => Some(7),
            Method::Options => Some(8),
            Method::Connect => Some(9),
            Method::Unknown => None,
        }
    }

    #[inline(always)]
    pub(crate) fn from_bytes(src: &[u8]) -> Self {
        match src {
            b"GET" => Method::Get,
            b"HEAD" => Method::Head,
            b"POST" => Method::Post,
            b"PUT" => Method::Put,
            b"DELETE" => Method::Delete,
            b"TRACE" => Method::Trace,
            b"CONTROL" => Method::Control,
            b"PURGE" => Method::Purge,
            b"OPTIONS" => Method::Options,
            b"CONNECT" => Method::Connect,
            _ => Method::Unknown,
        }
    }
}

// VERSION

/// HTTP protocol version carried in the start line.
///
/// Only [`Version::Http10`] and [`Version::Http11`] are ever produced by
/// the parser. The request line grammar rejects anything else with
/// [`ErrorKind::BadVersion`] (§7).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Version {
    /// HTTP/1.0 [[RFC 1945](https://tools.ietf.org/html/rfc1945)] — no
    /// persistent connections unless `Connection: keep-alive` is present.
    Http10,
    /// HTTP/1.1 [[RFC 9112](https://tools.ietf.org/html/rfc9112)] —
    /// persistent connections by default, chunked transfer coding.
    Http11,
}

impl Version {
    #[inline(always)]
    pub(crate) const fn from_bytes(src: &[u8]) -> Result<Self, ErrorKind> {
        match src {
            b"HTTP/1.1" => Ok(Self::Http11),
            b"HTTP/1.0" => Ok(Self::Http10),
            _ => Err(ErrorKind::BadVersion),
        }
    }

    #[inline(always)]
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            Version::Http10 => b"HTTP/1.0",
            Version::Http11 => b"HTTP/1.1",
        }
    }

    /// Whether this version defaults to a persistent connection absent
    /// an explicit `Connection` header (§3, Connection.lifecycle).
    #[inline(always)]
    pub const fn default_keep_alive(self) -> bool {
        matches!(self, Version::Http11)
    }
}

// STATUS_CODE

macro_rules! set_status_codes {
    ($(
        $(#[$docs:meta])+
        $name:ident = ($num:expr, $str:expr);
    )+) => {
        /// HTTP status codes recognized by the response serializer.
        ///
        /// Represents valid HTTP status codes as defined in
        /// [RFC 9110](https://tools.ietf.org/html/rfc9110#section-15) and other standards.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum StatusCode { $(
            #[doc = concat!(stringify!($num), " ", $str)]
            $(#[$docs])+
            $name = $num,
        )+ }

        impl StatusCode {
            /// The HTTP status line as bytes, e.g. `b"HTTP/1.1 200 OK\r\n"`.
            #[inline]
            pub(crate) const fn into_first_line(&self, version: Version) -> &'static [u8] {
                match (self, version) { $(
                    (StatusCode::$name, Version::Http11) => {
                        concat!("HTTP/1.1 ", $num, " ", $str, "\r\n").as_bytes()
                    },
                    (StatusCode::$name, Version::Http10) => {
                        concat!("HTTP/1.0 ", $num, " ", $str, "\r\n").as_bytes()
                    },
                )+ }
            }

            /// The three-digit status code as an unsigned integer.
            #[inline]
            pub const fn code(&self) -> u16 {
                match self { $(StatusCode::$name => $num,)+ }
            }

            /// The standard reason phrase for this status code.
            #[inline]
            pub const fn reason(&self) -> &'static str {
                match self { $(StatusCode::$name => $str,)+ }
            }

            /// Attempts to map a raw three-digit status code to a known
            /// variant; unrecognized codes have no `StatusCode` value.
            #[inline]
            pub const fn from_u16(code: u16) -> Option<Self> {
                match code { $($num => Some(StatusCode::$name),)+ _ => None }
            }
        }
    }
}

set_status_codes! {
    /// [[RFC9110, Section 15.2.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.2.1)]
    Continue = (100, "Continue");
    /// [[RFC9110, Section 15.2.2](https://datatracker.ietf.org/doc/html/rfc9110#section-15.2.2)]
    SwitchingProtocols = (101, "Switching Protocols");

    /// [[RFC9110, Section 15.3.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.3.1)]
    Ok = (200, "OK");
    /// [[RFC9110, Section 15.3.2](https://datatracker.ietf.org/doc/html/rfc9110#section-15.3.2)]
    Created = (201, "Created");
    /// [[RFC9110, Section 15.3.3](https://datatracker.ietf.org/doc/html/rfc9110#section-15.3.3)]
    Accepted = (202, "Accepted");
    /// [[RFC9110, Section 15.3.5](https://datatracker.ietf.org/doc/html/rfc9110#section-15.3.5)]
    NoContent = (204, "No Content");
    /// [[RFC9110, Section 15.3.6](https://datatracker.ietf.org/doc/html/rfc9110#section-15.3.6)]
    ResetContent = (205, "Reset Content");
    /// [[RFC9110, Section 15.3.7](https://datatracker.ietf.org/doc/html/rfc9110#section-15.3.7)]
    PartialContent = (206, "Partial Content");

    /// [[RFC9110, Section 15.4.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.4.1)]
    MultipleChoices = (300, "Multiple Choices");
    /// [[RFC9110, Section 15.4.2](https://datatracker.ietf.org/doc/html/rfc9110#section-15.4.2)]
    MovedPermanently = (301, "Moved Permanently");
    /// [[RFC9110, Section 15.4.3](https://datatracker.ietf.org/doc/html/rfc9110#section-15.4.3)]
    Found = (302, "Found");
    /// [[RFC9110, Section 15.4.4](https://datatracker.ietf.org/doc/html/rfc9110#section-15.4.4)]
    SeeOther = (303, "See Other");
    /// [[RFC9110, Section 15.4.5](https://datatracker.ietf.org/doc/html/rfc9110#section-15.4.5)]
    NotModified = (304, "Not Modified");
    /// [[RFC9110, Section 15.4.7](https://datatracker.ietf.org/doc/html/rfc9110#section-15.4.7)]
    TemporaryRedirect = (307, "Temporary Redirect");
    /// [[RFC9110, Section 15.4.8](https://datatracker.ietf.org/doc/html/rfc9110#section-15.4.8)]
    PermanentRedirect = (308, "Permanent Redirect");

    /// [[RFC9110, Section 15.5.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.1)]
    BadRequest = (400, "Bad Request");
    /// [[RFC9110, Section 15.5.2](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.2)]
    Unauthorized = (401, "Unauthorized");
    /// [[RFC9110, Section 15.5.4](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.4)]
    Forbidden = (403, "Forbidden");
    /// [[RFC9110, Section 15.5.5](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.5)]
    NotFound = (404, "Not Found");
    /// [[RFC9110, Section 15.5.6](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.6)]
    MethodNotAllowed = (405, "Method Not Allowed");
    /// [[RFC9110, Section 15.5.7](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.7)]
    NotAcceptable = (406, "Not Acceptable");
    /// [[RFC9110, Section 15.5.9](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.9)]
    RequestTimeout = (408, "Request Timeout");
    /// [[RFC9110, Section 15.5.10](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.10)]
    Conflict = (409, "Conflict");
    /// [[RFC9110, Section 15.5.11](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.11)]
    Gone = (410, "Gone");
    /// [[RFC9110, Section 15.5.12](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.12)]
    LengthRequired = (411, "Length Required");
    /// [[RFC9110, Section 15.5.14](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.14)]
    PayloadTooLarge = (413, "Payload Too Large");
    /// [[RFC9110, Section 15.5.15](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.15)]
    UriTooLong = (414, "URI Too Long");
    /// [[RFC9110, Section 15.5.16](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.16)]
    UnsupportedMediaType = (415, "Unsupported Media Type");
    /// [[RFC9110, Section 15.5.17](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.17)]
    RangeNotSatisfiable = (416, "Range Not Satisfiable");
    /// [[RFC9110, Section 15.5.18](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.18)]
    ExpectationFailed = (417, "Expectation Failed");
    /// [[RFC9110, Section 15.5.21](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.21)]
    UnprocessableEntity = (422, "Unprocessable Entity");
    /// [[RFC6585, Section 5](https://datatracker.ietf.org/doc/html/rfc6585#section-5)]
    TooManyRequests = (429, "Too Many Requests");
    /// [[RFC6585, Section 5](https://datatracker.ietf.org/doc/html/rfc6585#section-5)]
    RequestHeaderFieldsTooLarge = (431, "Request Header Fields Too Large");

    /// [[RFC9110, Section 15.6.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.6.1)]
    InternalServerError = (500, "Internal Server Error");
    /// [[RFC9110, Section 15.6.2](https://datatracker.ietf.org/doc/html/rfc9110#section-15.6.2)]
    NotImplemented = (501, "Not Implemented");
    /// [[RFC9110, Section 15.6.3](https://datatracker.ietf.org/doc/html/rfc9110#section-15.6.3)]
    BadGateway = (502, "Bad Gateway");
    /// [[RFC9110, Section 15.6.4](https://datatracker.ietf.org/doc/html/rfc9110#section-15.6.4)]
    ServiceUnavailable = (503, "Service Unavailable");
    /// [[RFC9110, Section 15.6.5](https://datatracker.ietf.org/doc/html/rfc9110#section-15.6.5)]
    GatewayTimeout = (504, "Gateway Timeout");
    /// [[RFC9110, Section 15.6.6](https://datatracker.ietf.org/doc/html/rfc9110#section-15.6.6)]
    HttpVersionNotSupported = (505, "HTTP Version Not Supported");
}

// Url

/// A parsed request-target, optimized for zero-allocation dispatch.
///
/// # Components
///
/// - **Target**: Full path with query string (e.g., `/api/users/123?sort=name&debug`)
/// - **Path**: Path without query string (e.g., `/api/users/123`)
/// - **Segments**: Path split by `/` (e.g., `["api", "users", "123"]`)
/// - **Query**: Optional query string with parameters
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Url {
    pub(crate) scheme: Scheme,
    pub(crate) host: &'static [u8],
    pub(crate) port: u16,
    pub(crate) target: &'static [u8],
    pub(crate) path: &'static [u8],
    pub(crate) parts: Vec<&'static [u8]>,
    pub(crate) query: Option<&'static [u8]>,
    pub(crate) query_parts: Vec<(&'static [u8], &'static [u8])>,
}

impl Url {
    #[inline(always)]
    pub(crate) fn new(limits: &ReqLimits) -> Self {
        Self {
            scheme: Scheme::Unknown,
            host: b"",
            port: 0,
            target: b"",
            path: b"",
            parts: Vec::with_capacity(limits.path_parts),
            query: None,
            query_parts: Vec::with_capacity(limits.query_parts),
        }
    }

    #[inline(always)]
    pub(crate) fn clear(&mut self) {
        self.scheme = Scheme::Unknown;
        self.host = b"";
        self.port = 0;
        self.target = b"";
        self.path = b"";
        self.parts.clear();
        self.query = None;
        self.query_parts.clear();
    }
}

// Public API
impl Url {
    /// The scheme of an absolute-form target, or [`Scheme::Unknown`] for
    /// the common origin-form case (just a path).
    #[inline(always)]
    pub const fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// The host of an absolute-form target, empty for the common
    /// origin-form case (just a path).
    #[inline(always)]
    pub const fn host(&self) -> &[u8] {
        self.host
    }

    /// The port of an absolute-form target. `0` for origin-form targets
    /// that carry no authority at all; otherwise the explicit port or
    /// the scheme's [`Scheme::default_port`] when none was given.
    #[inline(always)]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the raw request target as bytes.
    ///
    /// The target is the full path and query string from the request line.
    ///
    /// # Examples
    ///
    /// For path `/api/users/123?sort=name&debug`:
    /// ```text
    /// /api/users/123?sort=name&debug
    /// ```
    #[inline(always)]
    pub const fn target(&self) -> &[u8] {
        self.target
    }

    /// Returns the path component of the URL.
    ///
    /// This is the target without the query string.
    ///
    /// # Examples
    ///
    /// For path `/api/users/123?sort=name&debug`:
    /// ```text
    /// /api/users/123
    /// ```
    #[inline(always)]
    pub const fn path(&self) -> &[u8] {
        self.path
    }

    /// Returns the path segment at the specified index.
    ///
    /// Path segments are the parts between `/` characters.
    /// Index 0 is the first segment after the initial `/`.
    #[inline(always)]
    pub fn path_segment(&self, index: usize) -> Option<&[u8]> {
        self.parts.get(index).copied()
    }

    /// Returns all path segments as a slice.
    #[inline(always)]
    pub fn path_segments(&self) -> &[&[u8]] {
        self.parts.as_slice()
    }

    /// Checks if the path matches the given pattern exactly.
    #[inline(always)]
    pub fn matches(&self, pattern: &[&[u8]]) -> bool {
        self.path_segments() == pattern
    }

    /// Checks if the path starts with the given pattern.
    #[inline(always)]
    pub fn starts_with(&self, pattern: &[&[u8]]) -> bool {
        self.path_segments().starts_with(pattern)
    }

    /// Checks if the path ends with the given pattern.
    #[inline(always)]
    pub fn ends_with(&self, pattern: &[&[u8]]) -> bool {
        self.path_segments().ends_with(pattern)
    }

    /// Returns the full query string including the leading `?`.
    #[inline(always)]
    pub const fn query_full(&self) -> Option<&[u8]> {
        self.query
    }

    /// Returns the first value for the specified query parameter key.
    ///
    /// Performs case-sensitive lookup (§3, Request.params invariant).
    #[inline(always)]
    pub fn query(&self, key: &[u8]) -> Option<&[u8]> {
        self.query_parts
            .iter()
            .find(|&&(k, _)| k == key)
            .map(|&(_, v)| v)
    }

    /// Iterates every value for `key` in the order they appeared in the
    /// query string (§8 invariant 5 applies equally to params as to
    /// headers).
    #[inline(always)]
    pub fn query_all<'a>(&'a self, key: &'a [u8]) -> impl Iterator<Item = &'a [u8]> {
        self.query_parts
            .iter()
            .filter(move |&&(k, _)| k == key)
            .map(|&(_, v)| v)
    }
}

// HEADER MAP

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct HeaderMap {
    pub(crate) headers: Vec<Header>,
    pub(crate) content_length: Option<usize>,
}

impl HeaderMap {
    #[inline(always)]
    pub(crate) fn new(size_vec: usize) -> Self {
        Self {
            headers: Vec::with_capacity(size_vec),
            content_length: None,
        }
    }

    #[inline(always)]
    pub(crate) fn reset(&mut self) {
        self.headers.clear();
        self.content_length = None;
    }

    /// The first value for `name`, case-insensitive.
    #[inline(always)]
    pub(crate) fn get(&self, name: &[u8]) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value)
    }

    /// Every value for `name`, case-insensitive, in the order the header
    /// lines appeared on the wire (§8 invariant 5).
    #[inline(always)]
    pub(crate) fn get_all<'a>(&'a self, name: &'a [u8]) -> impl Iterator<Item = &'a [u8]> {
        self.headers
            .iter()
            .filter(move |h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value)
    }
}

// HEADER

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub(crate) struct Header {
    pub(crate) name: &'static [u8],
    pub(crate) value: &'static [u8],
}

impl Header {
    #[inline(always)]
    pub const fn new(name: &'static [u8], value: &'static [u8]) -> Self {
        Header { name, value }
    }
}

#[cfg(test)]
mod method_tests {
    use super::*;

    #[test]
    fn from_bytes_known() {
        assert_eq!(Method::from_bytes(b"GET"), Method::Get);
        assert_eq!(Method::from_bytes(b"DELETE"), Method::Delete);
        assert_eq!(Method::from_bytes(b"CONNECT"), Method::Connect);
    }

    #[test]
    fn from_bytes_unknown_falls_through() {
        assert_eq!(Method::from_bytes(b"PATCH"), Method::Unknown);
        assert_eq!(Method::from_bytes(b"get"), Method::Unknown);
    }

    #[test]
    fn index_is_dense_and_unknown_has_none() {
        let known = [
            Method::Get,
            Method::Head,
            Method::Post,
            Method::Put,
            Method::Delete,
            Method::Trace,
            Method::Control,
            Method::Purge,
            Method::Options,
            Method::Connect,
        ];
        for (i, m) in known.iter().enumerate() {
            assert_eq!(m.index(), Some(i));
        }
        assert_eq!(known.len(), METHOD_COUNT);
        assert_eq!(Method::Unknown.index(), None);
    }
}


#[cfg(test)]
mod scheme_tests {
    use super::*;

    #[test]
    fn from_bytes_case_insensitive() {
        assert_eq!(Scheme::from_bytes(b"HTTP"), Scheme::Http);
        assert_eq!(Scheme::from_bytes(b"HtTpS"), Scheme::Https);
        assert_eq!(Scheme::from_bytes(b"ftp"), Scheme::Unknown);
    }

    #[test]
    fn default_ports() {
        assert_eq!(Scheme::Http.default_port(), 80);
        assert_eq!(Scheme::Https.default_port(), 443);
    }
}

#[cfg(test)]
mod status_tests {
    use super::*;

    #[test]
    fn code_and_reason() {
        assert_eq!(StatusCode::NotFound.code(), 404);
        assert_eq!(StatusCode::NotFound.reason(), "Not Found");
    }

    #[test]
    fn from_u16_round_trip() {
        assert_eq!(StatusCode::from_u16(200), Some(StatusCode::Ok));
        assert_eq!(StatusCode::from_u16(999), None);
    }

    #[test]
    fn first_line_bytes() {
        assert_eq!(
            StatusCode::Ok.into_first_line(Version::Http11),
            b"HTTP/1.1 200 OK\r\n"
        );
        assert_eq!(
            StatusCode::NotFound.into_first_line(Version::Http10),
            b"HTTP/1.0 404 Not Found\r\n"
        );
    }
}

#[cfg(test)]
mod header_map_tests {
    use super::*;

    #[test]
    fn get_all_preserves_wire_order() {
        let mut map = HeaderMap::new(4);
        map.headers.push(Header::new(b"X-Tag", b"a"));
        map.headers.push(Header::new(b"x-tag", b"b"));
        map.headers.push(Header::new(b"X-TAG", b"c"));

        let values: Vec<&[u8]> = map.get_all(b"x-tag").collect();
        assert_eq!(values, vec![b"a".as_slice(), b"b", b"c"]);
        assert_eq!(map.get(b"x-tag"), Some(b"a".as_slice()));
    }
}

#[cfg(test)]
mod url_tests {
    use super::*;

    fn url(target: &'static [u8], path: &'static [u8], parts: Vec<&'static [u8]>) -> Url {
        Url {
            scheme: Scheme::Unknown,
            host: b"",
            port: 0,
            target,
            path,
            parts,
            query: None,
            query_parts: Vec::new(),
        }
    }

    #[test]
    fn path_patterns() {
        let u = url(b"/api/users/123", b"/api/users/123", vec![b"api", b"users", b"123"]);
        assert!(u.matches(&[b"api", b"users", b"123"]));
        assert!(!u.matches(&[b"api"]));
        assert!(u.starts_with(&[b"api", b"users"]));
        assert!(u.ends_with(&[b"users", b"123"]));
    }

    #[test]
    fn query_all_preserves_order() {
        let mut u = url(b"/x", b"/x", vec![]);
        u.query_parts = vec![(b"a".as_slice(), b"1".as_slice()), (b"a", b"2")];
        let values: Vec<&[u8]> = u.query_all(b"a").collect();
        assert_eq!(values, vec![b"1".as_slice(), b"2"]);
    }
}
