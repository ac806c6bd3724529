//! Web server configuration limits and timeouts
//!
//! # Security-First Defaults
//!
//! Default limits are intentionally conservative to prevent:
//! - Resource exhaustion attacks
//! - Memory overflows
//! - Slowloris attacks
//! - Header flooding
//!
//! # Memory Consumption
//!
//! Each active connection consumes memory according to:
//!
//! `Total` = [`Request Buffer`](crate::limits::ReqLimits#memory-allocation-strategy) +
//!           [`Response Buffer`](crate::limits::RespLimits#buffer-management) +
//!           `Runtime Overhead`
//!
//! See each component's documentation for details and configuration options.
//!
//! # Examples
//!
//! ```no_run
//! # wireloop::impt_default_handler!{MyHandler}
//! use wireloop::{Server, limits::{ConnLimits, ReqLimits, ServerLimits}};
//! use tokio::net::TcpListener;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     Server::builder()
//!         .listener(TcpListener::bind("127.0.0.1:8080").await.unwrap())
//!         .handler(MyHandler)
//!         .server_limits(ServerLimits {
//!             max_connections: 5000, // Higher concurrency
//!             ..ServerLimits::default()
//!         })
//!         .connection_limits(ConnLimits {
//!             total_recv_timeout: Duration::from_secs(30),
//!             max_requests_per_connection: 10_000,
//!             ..ConnLimits::default()
//!         })
//!         .request_limits(ReqLimits {
//!             header_count: 18,      // More headers for complex APIs
//!             body_size: 16 * 1024,  // 16KB for larger payloads
//!             ..ReqLimits::default()
//!         })
//!         .build()
//!         .launch()
//!         .await;
//! }
//! ```

use std::time::Duration;

/// Controls server-level concurrency and socket tuning.
///
/// Each accepted socket gets its own task (spawned via [`tokio::spawn`]);
/// `max_connections` bounds how many of those tasks may be in flight at
/// once. There is no overload-response path — this crate never
/// synthesizes HTTP bytes on the server's own behalf, so once the limit
/// is reached new accepts are simply left unspawned until a slot frees
/// up (see `server::server_impl`).
#[derive(Debug, Clone)]
pub struct ServerLimits {
    /// Maximum number of concurrently active connection tasks (default: `100`).
    pub max_connections: usize,

    /// Whether accepted sockets have `TCP_NODELAY` set (default: `true`).
    ///
    /// Disables Nagle's algorithm so small response writes (a status
    /// line, a short JSON body) aren't held back waiting to coalesce
    /// with a follow-up write.
    pub tcp_nodelay: bool,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for ServerLimits {
    fn default() -> Self {
        Self {
            max_connections: 100,
            tcp_nodelay: true,

            _priv: (),
        }
    }
}

/// Connection-level limits and timeouts.
///
/// Controls individual TCP connection behavior including timeouts,
/// keep-alive policy, and request limits.
///
/// Default values balance performance, resource usage, and security.
/// Only change if you understand the consequences.
#[derive(Debug, Clone)]
pub struct ConnLimits {
    /// Maximum duration to receive a single request, from the first byte
    /// read to the last (default: `600 seconds`).
    ///
    /// Resets at the start of every request on a persistent connection.
    /// Prevents slowloris-style attacks without penalizing a connection
    /// that is simply idle between requests (see `keepalive_timeout`).
    pub total_recv_timeout: Duration,

    /// Maximum duration to send a single response, from the first byte
    /// written to the last (default: `600 seconds`).
    pub total_send_timeout: Duration,

    /// Maximum idle duration between requests on a persistent connection
    /// before it is closed (default: `120 seconds`).
    pub keepalive_timeout: Duration,

    /// Maximum number of requests allowed per connection (default: `100`).
    ///
    /// Connection closes after processing this many requests, helping
    /// bound memory accumulation and connection lifetime.
    pub max_requests_per_connection: usize,

    /// Whether a persistent connection is required even when the
    /// negotiated protocol would otherwise default to one (default:
    /// `false`).
    ///
    /// When `true`, a response that would otherwise close the connection
    /// (e.g. an HTTP/1.0 request lacking `Connection: keep-alive`) is
    /// instead kept open, subject to the limits above. This exists for
    /// deployments behind a trusted reverse proxy that wants every
    /// backend connection reused regardless of what the client asked for.
    pub need_keepalive: bool,

    /// Maximum total lifetime of a connection regardless of keep-alive
    /// activity (default: `3600 seconds`).
    ///
    /// Bounds the worst case where a client keeps a connection
    /// perpetually busy just under `keepalive_timeout` — eventually it
    /// is closed and forced to reconnect.
    pub connection_lifetime: Duration,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for ConnLimits {
    #[inline(always)]
    fn default() -> Self {
        Self {
            total_recv_timeout: Duration::from_secs(600),
            total_send_timeout: Duration::from_secs(600),
            keepalive_timeout: Duration::from_secs(120),
            max_requests_per_connection: 100,
            need_keepalive: false,
            connection_lifetime: Duration::from_secs(3600),

            _priv: (),
        }
    }
}

/// HTTP request parsing limits and buffer pre-allocation strategy.
///
/// ⚠️ **SECURITY-FIRST DEFAULTS**
///
/// These limits are intentionally conservative to prevent resource
/// exhaustion and various parsing attacks. They work well for:
/// - Simple REST APIs
/// - Microservices
/// - Internal tools
/// - Low-memory environments
///
/// 🔧 **You MAY need to increase these if you see:**
/// - `413 Payload Too Large` for legitimate requests
/// - `414 URI Too Long` for normal API calls
/// - `431 Request Header Fields Too Large`
///
/// # Memory Allocation Strategy
///
/// Each TCP connection pre-allocates a fixed-size buffer based on these limits:
///
/// ```text
/// Total Buffer = First Line + (Headers x Header Line) + Body + Overhead
/// ```
///
/// ## Buffer Size Calculation (Default Values)
///
/// | Component | Formula | Size | Purpose |
/// |-----------|---------|------|---------|
/// | First Line | `19 + uri_size` | 275 B | `METHOD URI HTTP/1.1\r\n` |
/// | Headers | `header_count x Header Line` | 9,280 B | Headers storage |
/// | Header Line | `header_name_size + header_value_size + 4` | 580 B | `Name: Value\r\n` |
/// | Body | `body_size` | 4,096 B | Request payload |
/// | **Total** | **Sum + 2 bytes CRLF** | **13,653 B = ~13.3 KB** | Per connection buffer |
///
/// # Example
/// ```
/// use wireloop::limits::ReqLimits;
///
/// let limits = ReqLimits::default();
/// let buffer_size = limits.estimated_buffer_size();
/// println!("Each connection needs {} bytes for data buffer", buffer_size);
/// ```
#[derive(Debug, Clone)]
pub struct ReqLimits {
    /// Maximum request-target length in bytes, scheme and authority
    /// included (absolute-form requests carry both; default: `256 B`).
    pub uri_size: usize,
    /// Maximum number of path segments in the request-target (default: `8 segments`).
    pub path_parts: usize,
    /// Maximum query string length (default: `128 B`).
    pub query_size: usize,
    /// Maximum number of query parameters (default: `8`).
    pub query_parts: usize,

    /// Maximum number of headers per request (default: `16 headers`).
    pub header_count: usize,
    /// Maximum header name length in bytes (default: `64 B`).
    pub header_name_size: usize,
    /// Maximum header value length in bytes (default: `512 B`).
    pub header_value_size: usize,

    /// Maximum request body size in bytes (default: `4 KB`).
    pub body_size: usize,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub precalc: ReqLimitsPrecalc,
}

impl Default for ReqLimits {
    fn default() -> Self {
        Self {
            uri_size: 256,
            path_parts: 8,
            query_size: 128,
            query_parts: 8,

            header_count: 16,
            header_name_size: 64,
            header_value_size: 512,

            body_size: 4 * 1024,

            precalc: ReqLimitsPrecalc::default(),
        }
    }
}

impl ReqLimits {
    /// Returns the estimated memory buffer size required per connection.
    ///
    /// This calculates the total buffer size needed to parse HTTP requests
    /// based on the current limits. The buffer includes space for:
    /// - HTTP request line
    /// - Headers (name + value for each header)
    /// - Request body
    /// - CRLF terminators
    #[inline(always)]
    pub fn estimated_buffer_size(self) -> usize {
        self.precalculate().precalc.buffer
    }

    #[inline(always)]
    pub(crate) fn precalculate(mut self) -> Self {
        self.precalc.first_line = self.first_line();
        self.precalc.h_line = self.h_line();
        self.precalc.buffer = self.buffer();
        self.precalc.req_without_body = self.precalc.buffer - self.body_size;

        self
    }

    #[inline(always)]
    // First line + Header * N + "\r\n" + Body
    fn buffer(&self) -> usize {
        self.precalc.first_line + self.header_count * self.precalc.h_line + 2 + self.body_size
    }

    #[inline(always)]
    // First line HTTP request:
    // CONNECT http://host:port/url/test HTTP/1.1\r\n
    // |-----| |--------------------------| |------|
    //  Method            URI                Version
    //
    // Formula: Method(7) + " " + URI + " " + Version(8) + "\r\n"
    // In Code: 19 + uri_size
    fn first_line(&self) -> usize {
        19 + self.uri_size
    }

    #[inline(always)]
    // Header:
    // Authorization: Sample%20Data\r\n
    // |-----------|  |-----------|
    //     Name           Value
    //
    // Formula: Name + ": " + Value +  "\r\n"
    // In Code: 4 + header_name_size + header_value_size
    fn h_line(&self) -> usize {
        self.header_name_size + self.header_value_size + 4
    }
}

#[doc(hidden)]
#[derive(Debug, Clone, Default)]
pub struct ReqLimitsPrecalc {
    pub(crate) buffer: usize,
    pub(crate) first_line: usize,
    pub(crate) req_without_body: usize,
    pub(crate) h_line: usize,
}

/// Configuration for response processing and memory allocation limits.
///
/// Controls how response buffers are allocated and managed to balance
/// memory usage and performance.
///
/// # Buffer Management
///
/// Based on the configured limits, response buffers are managed as follows:
/// ```rust
/// # use wireloop::limits::RespLimits;
/// # let limits = RespLimits::default();
/// # let mut buffer: Vec<()> = Vec::with_capacity(limits.default_capacity);
/// #
/// // `buffer` is Vec
/// if buffer.capacity() > limits.max_capacity {
///     buffer = Vec::with_capacity(limits.default_capacity);
/// } else {
///     buffer.clear();
/// }
/// ```
///
/// When a connection starts, its response buffer is created with a
/// capacity equal to `default_capacity`.
#[derive(Debug, Clone)]
pub struct RespLimits {
    /// Initial buffer capacity allocated for responses (default: `1024 B`).
    pub default_capacity: usize,
    /// Maximum allowed buffer capacity for responses (default: `8192 B`).
    //
    // Note: If the response exceeds `max_capacity * 2`, it may be sent in 1 or more `syscall`
    pub max_capacity: usize,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for RespLimits {
    fn default() -> Self {
        Self {
            default_capacity: 1024,
            max_capacity: 8 * 1024,

            _priv: (),
        }
    }
}

#[cfg(test)]
mod req_limits_tests {
    use super::*;

    #[test]
    fn estimated_buffer_size_matches_formula() {
        let limits = ReqLimits::default();
        let first_line = 19 + limits.uri_size;
        let h_line = limits.header_name_size + limits.header_value_size + 4;
        let expected = first_line + limits.header_count * h_line + 2 + limits.body_size;

        assert_eq!(limits.estimated_buffer_size(), expected);
    }

    #[test]
    fn req_without_body_excludes_body_size() {
        let limits = ReqLimits::default().precalculate();
        assert_eq!(
            limits.precalc.req_without_body,
            limits.precalc.buffer - limits.body_size
        );
    }
}

#[cfg(test)]
mod conn_limits_tests {
    use super::*;

    #[test]
    fn defaults_match_configured_policy() {
        let limits = ConnLimits::default();
        assert_eq!(limits.total_recv_timeout, Duration::from_secs(600));
        assert_eq!(limits.total_send_timeout, Duration::from_secs(600));
        assert_eq!(limits.keepalive_timeout, Duration::from_secs(120));
        assert_eq!(limits.max_requests_per_connection, 100);
        assert!(!limits.need_keepalive);
    }
}
