//! The parsed HTTP request and its resumable parser.
//!
//! [`Request::parse`] is handed the connection's entire unconsumed buffer
//! on every call and re-derives the whole message from byte 0 each time.
//! There is no cursor to save and resume: if the bytes seen so far are a
//! valid prefix of a request, parsing either finishes or reports
//! [`ErrorKind::NeedMore`]; if they're not a valid prefix, it fails right
//! away. Running the same bytes through this function twice, split
//! however the socket happened to split them, always produces the same
//! `Request` (§8, invariant 1).

use crate::{
    buffer,
    errors::ErrorKind,
    http::{
        parser::{read_line, Phase},
        query::Query,
        types::{Header, HeaderMap, Method, Scheme, Url, Version, TOKEN_TABLE, URI_TABLE},
    },
    limits::ReqLimits,
    metric::Metric,
};
use memchr::memchr;

/// A fully- or partially-parsed HTTP/1.x request.
///
/// Uses strategic memory alignment for optimal cache performance. Every
/// byte slice held here (request-target components, header names and
/// values, the body) borrows from the owning connection's buffer rather
/// than copying — see [`buffer::into_static`].
#[derive(Debug, Clone, PartialEq)]
#[repr(align(128))]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) version: Version,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<&'static [u8]>,
    pub(crate) metric: Metric,
    pub(crate) phase: Phase,
}

impl Request {
    #[inline(always)]
    pub(crate) fn new(limits: &ReqLimits) -> Self {
        Request {
            method: Method::Get,
            url: Url::new(limits),
            version: Version::Http11,
            headers: HeaderMap::new(limits.header_count),
            body: None,
            metric: Metric::new(),
            phase: Phase::NothingYet,
        }
    }

    #[inline(always)]
    pub(crate) fn reset(&mut self) {
        self.method = Method::Get;
        self.url.clear();
        self.version = Version::Http11;
        self.headers.reset();
        self.body = None;
        self.metric.reset();
        self.phase = Phase::NothingYet;
    }
}

// Public API
impl Request {
    #[inline(always)]
    pub const fn method(&self) -> Method {
        self.method
    }

    #[inline(always)]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    #[inline(always)]
    pub const fn version(&self) -> Version {
        self.version
    }

    /// Returns the first header value with case-insensitive name matching
    /// (per [RFC 9110](https://tools.ietf.org/html/rfc9110#section-5.1)).
    /// Uses linear search.
    #[inline(always)]
    pub fn header(&self, name: &[u8]) -> Option<&[u8]> {
        self.headers.get(name)
    }

    /// Every value for `name`, case-insensitive, in wire order.
    #[inline(always)]
    pub fn header_all<'a>(&'a self, name: &'a [u8]) -> impl Iterator<Item = &'a [u8]> {
        self.headers.get_all(name)
    }

    /// Returns the value of the `Content-Length` header if present.
    #[inline(always)]
    pub const fn content_length(&self) -> Option<usize> {
        self.headers.content_length
    }

    /// Returns the request body if present.
    #[inline(always)]
    pub const fn body(&self) -> Option<&[u8]> {
        self.body
    }
}

impl Request {
    /// Tries to parse one complete request from `data`, the connection
    /// buffer's entire unconsumed span.
    ///
    /// Returns the number of leading bytes of `data` the request
    /// occupied (request-line, headers and body — a pipelined
    /// follow-up request may start immediately after). On
    /// [`ErrorKind::NeedMore`], `self.phase()` reports how far this
    /// attempt got, for the caller to pick the right timeout error
    /// (§4.D/§4.G); every other field is left in whatever state this
    /// attempt reached and must not be read until a later call
    /// succeeds.
    pub(crate) fn parse(&mut self, data: &[u8], limits: &ReqLimits) -> Result<usize, ErrorKind> {
        if data.is_empty() {
            self.phase = Phase::NothingYet;
            return Err(ErrorKind::NeedMore);
        }
        self.phase = Phase::RequestLine;

        let Some((line, mut offset)) = read_line(data)? else {
            return Err(ErrorKind::NeedMore);
        };

        let sp1 = memchr(b' ', line).ok_or(ErrorKind::BadMethod)?;
        let method_bytes = &line[..sp1];
        if method_bytes.is_empty() {
            return Err(ErrorKind::EmptyMethod);
        }
        if !method_bytes.iter().all(|&b| TOKEN_TABLE[b as usize]) {
            return Err(ErrorKind::BadMethod);
        }
        self.method = Method::from_bytes(method_bytes);
        if self.method == Method::Unknown {
            return Err(ErrorKind::UnknownMethod);
        }

        let rest = &line[sp1 + 1..];
        let sp2 = memchr(b' ', rest).ok_or(ErrorKind::BadUri)?;
        let target = &rest[..sp2];
        if target.is_empty() {
            return Err(ErrorKind::BadUri);
        }
        self.parse_target(target, limits)?;

        let version_bytes = &rest[sp2 + 1..];
        self.version = Version::from_bytes(version_bytes)?;

        self.phase = Phase::Headers;
        self.headers.reset();

        loop {
            let Some((hline, hlen)) = read_line(&data[offset..])? else {
                return Err(ErrorKind::NeedMore);
            };

            if hline.is_empty() {
                offset += hlen;
                break;
            }

            self.parse_header_line(hline, limits)?;
            offset += hlen;
        }

        self.phase = Phase::Body;
        let content_length = self.headers.content_length.unwrap_or(0);
        if content_length > limits.body_size {
            return Err(ErrorKind::BodyTooLarge);
        }
        if self.method == Method::Trace && content_length > 0 {
            return Err(ErrorKind::UnexpectedBody);
        }

        let available = data.len() - offset;
        if available < content_length {
            return Err(ErrorKind::NeedMore);
        }

        self.body = if content_length > 0 {
            let body = &data[offset..offset + content_length];
            Some(unsafe { buffer::into_static(body) })
        } else {
            None
        };

        Ok(offset + content_length)
    }

    /// Returns how far the most recent [`Self::parse`] call got before
    /// returning `NeedMore`.
    #[inline(always)]
    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    fn parse_header_line(&mut self, line: &[u8], limits: &ReqLimits) -> Result<(), ErrorKind> {
        let colon = memchr(b':', line).ok_or(ErrorKind::BadHeader)?;
        let name = &line[..colon];
        if name.is_empty() {
            return Err(ErrorKind::EmptyHeaderName);
        }
        if name.len() > limits.header_name_size || !name.iter().all(|&b| TOKEN_TABLE[b as usize])
        {
            return Err(ErrorKind::BadHeader);
        }

        let mut value = &line[colon + 1..];
        while matches!(value.first(), Some(b' ') | Some(b'\t')) {
            value = &value[1..];
        }
        while matches!(value.last(), Some(b' ') | Some(b'\t')) {
            value = &value[..value.len() - 1];
        }
        if value.is_empty() {
            return Err(ErrorKind::EmptyHeaderValue);
        }
        if value.len() > limits.header_value_size {
            return Err(ErrorKind::BadHeader);
        }

        if self.headers.headers.len() >= limits.header_count {
            return Err(ErrorKind::TooManyHeaders);
        }

        if name.eq_ignore_ascii_case(b"content-length") {
            if self.headers.content_length.is_some() {
                return Err(ErrorKind::MultipleContentLength);
            }
            let length =
                crate::http::types::slice_to_usize(value).ok_or(ErrorKind::BadContentLength)?;
            self.headers.content_length = Some(length);
        }

        let name = unsafe { buffer::into_static(name) };
        let value = unsafe { buffer::into_static(value) };
        self.headers.headers.push(Header::new(name, value));

        Ok(())
    }

    /// Populates `self.url` from a request-target: either origin-form
    /// (`/path?query`) or absolute-form (`http://host[:port]/path?query`,
    /// used by requests through a proxy). See §8, scenario 2.
    fn parse_target(&mut self, target: &[u8], limits: &ReqLimits) -> Result<(), ErrorKind> {
        if target.len() > limits.uri_size {
            return Err(ErrorKind::BadUri);
        }

        let (scheme, remainder, is_absolute) = match strip_scheme(target)? {
            Some((scheme, remainder)) => (scheme, remainder, true),
            None => (Scheme::Unknown, target, false),
        };

        let path_and_query = if is_absolute {
            let (authority, path_and_query) = match memchr(b'/', remainder) {
                Some(idx) => (&remainder[..idx], Some(&remainder[idx..])),
                None => (remainder, None),
            };
            if authority.is_empty() {
                return Err(ErrorKind::EmptyHost);
            }
            // No `/` after the authority means no path at all (not even a
            // bare `/`) — §8 boundary: "Empty path after scheme/host is
            // `BadPath`."
            let path_and_query = path_and_query.ok_or(ErrorKind::BadPath)?;

            let (host, port) = match memchr(b':', authority) {
                Some(idx) => {
                    let host = &authority[..idx];
                    let port_bytes = &authority[idx + 1..];
                    if host.is_empty() {
                        return Err(ErrorKind::EmptyHost);
                    }
                    if port_bytes.len() > 5 {
                        return Err(ErrorKind::TooBigPort);
                    }
                    let port = crate::http::types::slice_to_usize(port_bytes)
                        .ok_or(ErrorKind::BadPort)?;
                    if port > u16::MAX as usize {
                        return Err(ErrorKind::TooBigPort);
                    }
                    (host, port as u16)
                }
                None => (authority, scheme.default_port()),
            };
            if !host.iter().all(|&b| URI_TABLE[b as usize]) {
                return Err(ErrorKind::BadHost);
            }

            self.url.scheme = scheme;
            self.url.host = unsafe { buffer::into_static(host) };
            self.url.port = port;
            path_and_query
        } else {
            if target.first() != Some(&b'/') {
                return Err(ErrorKind::BadUri);
            }
            self.url.scheme = Scheme::Unknown;
            self.url.host = b"";
            // Origin-form carries no authority at all; §8 scenario 1 still
            // expects the conventional HTTP default port here.
            self.url.port = 80;
            target
        };

        let (path, query) = match memchr(b'?', path_and_query) {
            Some(idx) => (
                &path_and_query[..idx],
                Some(&path_and_query[idx..]),
            ),
            None => (path_and_query, None),
        };
        if !path.iter().all(|&b| URI_TABLE[b as usize]) {
            return Err(ErrorKind::BadPath);
        }

        self.url.target = unsafe { buffer::into_static(path_and_query) };
        self.url.path = unsafe { buffer::into_static(path) };

        self.url.parts.clear();
        for segment in path.split(|&b| b == b'/') {
            if segment.is_empty() {
                continue;
            }
            if self.url.parts.len() >= limits.path_parts {
                return Err(ErrorKind::BadPath);
            }
            self.url.parts.push(unsafe { buffer::into_static(segment) });
        }

        self.url.query_parts.clear();
        self.url.query = query.map(|q| unsafe { buffer::into_static(q) });
        if let Some(query) = self.url.query {
            Query::parse_into(&mut self.url.query_parts, query, limits.query_parts)?;
        }

        Ok(())
    }
}

/// Splits an absolute-form target into its scheme and the bytes past
/// `://`. A leading `/` is origin-form, not a scheme attempt — `Ok(None)`
/// (§4.B: "Initial peeks one byte: `/` ⇒ go straight to Path"). Anything
/// else must be `[A-Za-z0-9+-.]+` followed by exactly `://`; a scheme
/// token present without that exact delimiter is `BadScheme`. The token
/// itself is matched case-insensitively against `http`/`https` and
/// otherwise mapped to `Scheme::Unknown` — unrecognized schemes are
/// still valid absolute-form targets (§4.B).
fn strip_scheme(target: &[u8]) -> Result<Option<(Scheme, &[u8])>, ErrorKind> {
    if target.first() == Some(&b'/') {
        return Ok(None);
    }

    let scheme_len = target
        .iter()
        .position(|&b| !is_scheme_char(b))
        .unwrap_or(target.len());

    if scheme_len == 0 || target[scheme_len..].first() != Some(&b':') {
        return Err(ErrorKind::BadScheme);
    }
    if !target[scheme_len..].starts_with(b"://") {
        return Err(ErrorKind::BadScheme);
    }

    let scheme = Scheme::from_bytes(&target[..scheme_len]);
    Ok(Some((scheme, &target[scheme_len + 3..])))
}

#[inline(always)]
fn is_scheme_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::*;

    fn limits() -> ReqLimits {
        ReqLimits::default().precalculate()
    }

    #[test]
    fn parses_origin_form_request_line() {
        let mut req = Request::new(&limits());
        let consumed = req
            .parse(b"GET /a/b?x=1 HTTP/1.1\r\nHost: h\r\n\r\n", &limits())
            .unwrap();

        assert_eq!(req.method(), Method::Get);
        assert_eq!(req.version(), Version::Http11);
        assert_eq!(str_op(req.url().path()), "/a/b");
        assert_eq!(req.url().port(), 80);
        assert_eq!(req.url().query(b"x"), Some(b"1".as_slice()));
        assert_eq!(consumed, b"GET /a/b?x=1 HTTP/1.1\r\nHost: h\r\n\r\n".len());
    }

    #[test]
    fn parses_absolute_form_request_line() {
        // §8, scenario 2.
        let mut req = Request::new(&limits());
        req.parse(
            b"GET http://example.com:8080/a?x=1&y= HTTP/1.1\r\n\r\n",
            &limits(),
        )
        .unwrap();

        assert_eq!(req.url().scheme(), Scheme::Http);
        assert_eq!(str_op(req.url().host()), "example.com");
        assert_eq!(req.url().port(), 8080);
        assert_eq!(str_op(req.url().path()), "/a");
        assert_eq!(req.url().query(b"x"), Some(b"1".as_slice()));
        assert_eq!(req.url().query(b"y"), Some(b"".as_slice()));
    }

    #[test]
    fn resumes_identically_regardless_of_fragmentation() {
        let whole: &[u8] = b"POST /x HTTP/1.1\r\ncontent-length: 5\r\n\r\nhello";
        let limits = limits();

        let mut one_shot = Request::new(&limits);
        one_shot.parse(whole, &limits).unwrap();

        let mut byte_by_byte = Request::new(&limits);
        let mut result = Err(ErrorKind::NeedMore);
        for end in 1..=whole.len() {
            result = byte_by_byte.parse(&whole[..end], &limits);
            if result.is_ok() {
                break;
            }
            assert_eq!(result, Err(ErrorKind::NeedMore));
        }

        assert_eq!(result, Ok(whole.len()));
        assert_eq!(one_shot.body(), byte_by_byte.body());
        assert_eq!(one_shot.url(), byte_by_byte.url());
    }

    #[test]
    fn incomplete_request_line_needs_more() {
        let mut req = Request::new(&limits());
        let result = req.parse(b"GET /x HTTP/1.1", &limits());
        assert_eq!(result, Err(ErrorKind::NeedMore));
        assert_eq!(req.phase(), Phase::RequestLine);
    }

    #[test]
    fn incomplete_body_needs_more_and_reports_body_phase() {
        let mut req = Request::new(&limits());
        let result = req.parse(
            b"POST /x HTTP/1.1\r\ncontent-length: 10\r\n\r\nabc",
            &limits(),
        );
        assert_eq!(result, Err(ErrorKind::NeedMore));
        assert_eq!(req.phase(), Phase::Body);
    }

    #[test]
    fn nothing_received_reports_nothing_yet() {
        let mut req = Request::new(&limits());
        let result = req.parse(b"", &limits());
        assert_eq!(result, Err(ErrorKind::NeedMore));
        assert_eq!(req.phase(), Phase::NothingYet);
    }

    #[test]
    fn trailing_bytes_are_left_for_the_next_pipelined_request() {
        let limits = limits();
        let mut req = Request::new(&limits);
        let data = b"GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n";
        let consumed = req.parse(data, &limits).unwrap();

        assert_eq!(str_op(req.url().path()), "/a");
        assert!(consumed < data.len());

        let mut second = Request::new(&limits);
        second.parse(&data[consumed..], &limits).unwrap();
        assert_eq!(str_op(second.url().path()), "/b");
    }

    #[test]
    fn trace_with_body_is_rejected() {
        let mut req = Request::new(&limits());
        let result = req.parse(
            b"TRACE /x HTTP/1.1\r\ncontent-length: 3\r\n\r\nabc",
            &limits(),
        );
        assert_eq!(result, Err(ErrorKind::UnexpectedBody));
    }

    #[test]
    fn duplicate_content_length_is_rejected() {
        let mut req = Request::new(&limits());
        let result = req.parse(
            b"POST /x HTTP/1.1\r\ncontent-length: 1\r\ncontent-length: 2\r\n\r\na",
            &limits(),
        );
        assert_eq!(result, Err(ErrorKind::MultipleContentLength));
    }

    #[test]
    fn unknown_method_is_rejected() {
        let mut req = Request::new(&limits());
        let result = req.parse(b"PATCH /x HTTP/1.1\r\n\r\n", &limits());
        assert_eq!(result, Err(ErrorKind::UnknownMethod));
    }

    #[test]
    fn absolute_form_with_no_path_is_rejected() {
        // §8 boundary: empty path after scheme/host is `BadPath`, not a
        // silent default to `/`.
        let mut req = Request::new(&limits());
        let result = req.parse(b"GET http://example.com HTTP/1.1\r\n\r\n", &limits());
        assert_eq!(result, Err(ErrorKind::BadPath));
    }

    #[test]
    fn unrecognized_scheme_parses_as_unknown() {
        let mut req = Request::new(&limits());
        req.parse(b"GET ftp://h/p HTTP/1.1\r\n\r\n", &limits())
            .unwrap();

        assert_eq!(req.url().scheme(), Scheme::Unknown);
        assert_eq!(str_op(req.url().host()), "h");
        assert_eq!(str_op(req.url().path()), "/p");
    }

    #[test]
    fn malformed_scheme_delimiter_is_rejected() {
        let mut req = Request::new(&limits());
        let result = req.parse(b"GET http:/x HTTP/1.1\r\n\r\n", &limits());
        assert_eq!(result, Err(ErrorKind::BadScheme));
    }

    #[test]
    fn bad_version_is_rejected() {
        let mut req = Request::new(&limits());
        let result = req.parse(b"GET /x HTTP/2.0\r\n\r\n", &limits());
        assert_eq!(result, Err(ErrorKind::BadVersion));
    }

    #[test]
    fn too_many_headers_is_rejected() {
        let mut limits = ReqLimits::default();
        limits.header_count = 1;
        limits = limits.precalculate();

        let mut req = Request::new(&limits);
        let result = req.parse(b"GET /x HTTP/1.1\r\na: 1\r\nb: 2\r\n\r\n", &limits);
        assert_eq!(result, Err(ErrorKind::TooManyHeaders));
    }
}
