//! The per-connection pipeline: one TCP socket, one task, one buffer.
//!
//! [`HttpConnection::run`] is the whole of §4.G: receive a request, hand
//! it to the handler, send the response, decide whether to loop. Nothing
//! here is shared with any other connection — the only process-wide
//! state is [`NEXT_CONNECTION_ID`], a counter handed out once per
//! accepted socket (§9).

use crate::{
    buffer::FlatBuffer,
    errors::ErrorKind,
    http::{parser::Phase, request::Request, response::Response},
    limits::{ConnLimits, ReqLimits, RespLimits},
    metric::{Metric, ServerMetrics},
    server::server_impl::{ConnLimitsBundle, Handler},
};
use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

use crate::timeout::with_deadline;

/// Managing user session data stored between requests within a single HTTP connection.
///
/// This trait allows you to store arbitrary state (e.g., authentication data,
/// multistep form status, cache, etc.). The state is available across all requests
/// within a single HTTP keep-alive connection.
///
/// # Examples
/// ```no_run
/// use wireloop::ConnectionData;
/// use std::collections::HashMap;
///
/// struct MyConnectionData {
///     user_id: Option<i32>,
///     request_count: usize,
///     cache: HashMap<usize, [u8; 4]>,
/// }
///
/// impl ConnectionData for MyConnectionData {
///     fn new() -> Self {
///         Self {
///             user_id: None,
///             request_count: 0,
///             cache: HashMap::new(),
///         }
///     }
///
///     fn reset(&mut self) {
///         self.user_id = None;
///         self.request_count = 0;
///         self.cache.clear(); // Saving the allocated memory
///     }
/// }
/// ```
///
/// Check out the `request_counter` example in the `demos/` directory
/// for a fuller illustration.
pub trait ConnectionData: Sync + Send + 'static {
    /// Creates a new instance of user data.
    ///
    /// Called once, when the connection it belongs to is accepted.
    fn new() -> Self;

    /// Resets the internal state of the instance to its initial values.
    ///
    /// Each connection gets a fresh instance from [`ConnectionData::new`],
    /// so nothing in this crate calls `reset` itself; it's here for
    /// callers who want to recycle an instance across connections of
    /// their own (e.g. a custom pooled `Handler`).
    fn reset(&mut self);
}

impl ConnectionData for () {
    #[inline(always)]
    fn new() -> Self {}

    #[inline(always)]
    fn reset(&mut self) {}
}

/// Process-wide connection-id counter — the sole piece of global state
/// in this crate (§9). Handed out once per accepted socket and never
/// reused.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(0);

/// Identity and bookkeeping for one TCP connection, independent of the
/// protocol state living in `Request`/`Response`.
#[derive(Debug)]
pub(crate) struct Connection {
    id: u64,
    created: Instant,
    request_count: usize,
    recv_metric: Metric,
    send_metric: Metric,
}

impl Connection {
    #[inline]
    fn new() -> Self {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            created: Instant::now(),
            request_count: 0,
            recv_metric: Metric::new(),
            send_metric: Metric::new(),
        }
    }
}

/// Owns everything one accepted socket needs: the buffer bytes land in,
/// the request/response being built from them, and the limits that size
/// and bound all of it. Never shared with another connection (§9,
/// ownership note).
pub(crate) struct HttpConnection<H: Handler<S>, S: ConnectionData> {
    handler: Arc<H>,
    connection_data: S,

    connection: Connection,
    buffer: FlatBuffer,
    request: Request,
    response: Response,

    conn_limits: ConnLimits,
    req_limits: ReqLimits,
    resp_limits: RespLimits,

    server_metrics: Arc<ServerMetrics>,
}

impl<H: Handler<S>, S: ConnectionData> HttpConnection<H, S> {
    #[inline]
    pub(crate) fn new(
        handler: Arc<H>,
        limits: ConnLimitsBundle,
        server_metrics: Arc<ServerMetrics>,
    ) -> Self {
        let ConnLimitsBundle {
            conn_limits,
            req_limits,
            resp_limits,
        } = limits;

        let buffer = FlatBuffer::with_capacity(req_limits.clone().estimated_buffer_size());

        Self {
            handler,
            connection_data: S::new(),

            connection: Connection::new(),
            buffer,
            request: Request::new(&req_limits),
            response: Response::new(&resp_limits),

            conn_limits,
            req_limits,
            resp_limits,

            server_metrics,
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> u64 {
        self.connection.id
    }

    /// Resets the request/response for the next keep-alive iteration.
    /// The buffer is deliberately left alone: any bytes past the
    /// just-consumed request are a pipelined follow-up request already
    /// sitting in the readable span (§3 Lifecycles, §4.G) and must
    /// survive into the next `recv_request` call. The buffer's cursors
    /// are only ever reset when the connection itself ends, along with
    /// everything else this struct owns.
    #[inline]
    fn reset_request_response(&mut self) {
        self.request.reset();
        self.response.reset(&self.resp_limits);
    }
}

impl<H: Handler<S>, S: ConnectionData> HttpConnection<H, S> {
    /// Runs the pipeline (§4.G) until the connection should close:
    /// `recv_request → update_recv_metric → handle_request →
    /// valid_response → send_response → update_send_metric →
    /// check_keepalive`, looped.
    pub(crate) async fn run(&mut self, stream: &mut TcpStream) -> Result<(), ErrorKind> {
        loop {
            match self.recv_request(stream).await {
                Ok(()) => {}
                Err(ErrorKind::EndOfStream) if self.connection.request_count == 0 => {
                    return Ok(());
                }
                Err(err) => return Err(err),
            }

            self.prepare_response();

            let handled = self
                .handler
                .handle(&mut self.connection_data, &self.request, &mut self.response)
                .await;
            drop(handled);

            if !self.response.is_complete() {
                return Err(ErrorKind::InvalidResponse);
            }

            if self.conn_limits.need_keepalive {
                self.response.keep_alive = true;
            }

            self.server_metrics.add_recv(self.request.metric.total_bytes());

            self.send_response(stream).await?;

            self.server_metrics.add_send(self.response.metric.total_bytes());
            self.server_metrics.add_request();

            log::trace!(
                "connection {} served {:?} {:?} -> {:?}",
                self.connection.id,
                self.request.method(),
                self.request.url().path(),
                self.response.status(),
            );

            self.connection.request_count += 1;

            if !self.should_continue() {
                return Ok(());
            }

            self.reset_request_response();
        }
    }

    /// Sets the response's protocol fields from the just-parsed request,
    /// before the handler runs: version always follows the request, and
    /// the initial keep-alive stance follows the request's own
    /// `Connection` header (or the version's default when absent). The
    /// handler can still override either via [`Response::close`].
    #[inline]
    fn prepare_response(&mut self) {
        self.response.version = self.request.version();
        self.response.keep_alive = match self.request.header(b"connection") {
            Some(value) if value.eq_ignore_ascii_case(b"close") => false,
            Some(value) if value.eq_ignore_ascii_case(b"keep-alive") => true,
            _ => self.request.version().default_keep_alive(),
        };
    }

    #[inline]
    fn should_continue(&self) -> bool {
        self.response.keep_alive
            && self.connection.request_count < self.conn_limits.max_requests_per_connection
            && self.connection.created.elapsed() <= self.conn_limits.connection_lifetime
    }

    /// Reads and parses one request (§4.E). Bounded by a single logical
    /// deadline — `keepalive_timeout` while waiting for the first byte
    /// of a request after the first, `total_recv_timeout` otherwise —
    /// that shrinks by however long each successful read took, so a
    /// slow-trickling peer can't reset its budget one byte at a time.
    async fn recv_request(&mut self, stream: &mut TcpStream) -> Result<(), ErrorKind> {
        let mut remaining = if self.connection.request_count > 0 {
            self.conn_limits.keepalive_timeout
        } else {
            self.conn_limits.total_recv_timeout
        };

        loop {
            self.buffer.prepare()?;
            let phase = self.request.phase();

            let (start, stop, bytes_read) = with_deadline(
                remaining,
                async { stream.read(self.buffer.writable_span()).await.map_err(ErrorKind::from) },
                || recv_timeout_error(phase),
            )
            .await?;

            if bytes_read == 0 {
                return Err(ErrorKind::EndOfStream);
            }

            self.connection.recv_metric.record(start, stop, bytes_read);
            self.request.metric.record(start, stop, bytes_read);
            self.buffer.commit(bytes_read);
            remaining = remaining.saturating_sub(stop.saturating_duration_since(start));

            match self.request.parse(self.buffer.readable_span(), &self.req_limits) {
                Ok(consumed) => {
                    self.buffer.consume(consumed);
                    return Ok(());
                }
                Err(ErrorKind::NeedMore) => continue,
                Err(err) => return Err(err),
            }
        }
    }

    /// Writes the already-serialized response buffer to the socket
    /// (§4.E), bounded by `total_send_timeout`, shrinking the same way
    /// `recv_request`'s deadline does.
    async fn send_response(&mut self, stream: &mut TcpStream) -> Result<(), ErrorKind> {
        let mut remaining = self.conn_limits.total_send_timeout;
        let mut offset = 0;

        while offset < self.response.buffer().len() {
            let (start, stop, bytes_written) = with_deadline(
                remaining,
                async {
                    stream
                        .write(&self.response.buffer()[offset..])
                        .await
                        .map_err(ErrorKind::from)
                },
                || ErrorKind::SendTimeout,
            )
            .await?;

            if bytes_written == 0 {
                return Err(ErrorKind::from(std::io::Error::from(
                    std::io::ErrorKind::WriteZero,
                )));
            }

            self.connection.send_metric.record(start, stop, bytes_written);
            self.response.metric.record(start, stop, bytes_written);
            offset += bytes_written;
            remaining = remaining.saturating_sub(stop.saturating_duration_since(start));
        }

        Ok(())
    }
}

/// Maps how far the last `NeedMore` attempt got to the phase-specific
/// timeout error (§4.D/§4.E) that should fire if no more bytes arrive
/// in time.
#[inline]
const fn recv_timeout_error(phase: Phase) -> ErrorKind {
    match phase {
        Phase::NothingYet => ErrorKind::RecvRequestTimeoutWithNothing,
        Phase::RequestLine => ErrorKind::RecvRequestLineTimeout,
        Phase::Headers => ErrorKind::RecvRequestHeadersTimeout,
        Phase::Body => ErrorKind::RecvRequestBodyTimeout,
    }
}

#[cfg(test)]
mod def_handler {
    use super::*;
    use crate::{limits::ConnLimits, Handled, StatusCode};

    pub(crate) struct DefHandler;

    impl Handler<()> for DefHandler {
        async fn handle(&self, _: &mut (), _: &Request, r: &mut Response) -> Handled {
            r.status(StatusCode::Ok).body("test")
        }
    }

    impl HttpConnection<DefHandler, ()> {
        /// Builds a connection whose buffer already contains `value`,
        /// for tests that only care about what a pipeline step does
        /// with bytes already on hand, without running a real socket.
        #[inline]
        pub(crate) fn from_bytes<V: AsRef<[u8]>>(value: V) -> Self {
            let req_limits = ReqLimits::default().precalculate();
            let resp_limits = RespLimits::default();
            let bytes = value.as_ref();

            let mut buffer = FlatBuffer::with_capacity(req_limits.clone().estimated_buffer_size());
            buffer.writable_span()[..bytes.len()].copy_from_slice(bytes);
            buffer.commit(bytes.len());

            Self {
                handler: Arc::new(DefHandler),
                connection_data: (),

                connection: Connection::new(),
                buffer,
                request: Request::new(&req_limits),
                response: Response::new(&resp_limits),

                conn_limits: ConnLimits::default(),
                req_limits,
                resp_limits,

                server_metrics: Arc::new(ServerMetrics::new()),
            }
        }
    }

    #[test]
    fn parses_a_request_already_sitting_in_the_buffer() {
        let mut conn = HttpConnection::<DefHandler, ()>::from_bytes(
            "GET /a HTTP/1.1\r\nHost: x\r\n\r\n",
        );

        let consumed = conn
            .request
            .parse(conn.buffer.readable_span(), &conn.req_limits)
            .unwrap();
        conn.buffer.consume(consumed);

        assert_eq!(conn.request.url().path(), b"/a");
    }

    #[test]
    fn should_continue_respects_max_requests_per_connection() {
        let mut conn = HttpConnection::<DefHandler, ()>::from_bytes(b"" as &[u8]);
        conn.conn_limits.max_requests_per_connection = 1;
        conn.response.keep_alive = true;
        conn.connection.request_count = 1;

        assert!(!conn.should_continue());
    }

    #[test]
    fn should_continue_false_once_response_closes() {
        let mut conn = HttpConnection::<DefHandler, ()>::from_bytes(b"" as &[u8]);
        conn.response.keep_alive = false;

        assert!(!conn.should_continue());
    }

    #[test]
    fn prepare_response_honors_request_connection_close_header() {
        let mut conn = HttpConnection::<DefHandler, ()>::from_bytes(
            "GET / HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n",
        );
        let consumed = conn
            .request
            .parse(conn.buffer.readable_span(), &conn.req_limits)
            .unwrap();
        conn.buffer.consume(consumed);

        conn.prepare_response();
        assert!(!conn.response.keep_alive);
    }

    #[tokio::test]
    async fn run_updates_server_metrics_with_request_and_response_sizes() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let metrics = Arc::new(crate::metric::ServerMetrics::new());
        let limits = crate::server::server_impl::ConnLimitsBundle {
            conn_limits: ConnLimits::default(),
            req_limits: ReqLimits::default().precalculate(),
            resp_limits: RespLimits::default(),
        };
        let mut server_conn =
            HttpConnection::<DefHandler, ()>::new(Arc::new(DefHandler), limits, metrics.clone());

        let client = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            let request = b"GET / HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n";
            stream.write_all(request).await.unwrap();

            let mut received = Vec::new();
            stream.read_to_end(&mut received).await.unwrap();
            (request.len(), received.len())
        });

        let (mut stream, _) = listener.accept().await.unwrap();
        server_conn.run(&mut stream).await.unwrap();
        drop(stream);
        let (sent_len, received_len) = client.await.unwrap();

        assert_eq!(metrics.total_requests(), 1);
        assert_eq!(metrics.total_recv_size(), sent_len as u64);
        assert_eq!(metrics.total_send_size(), received_len as u64);
    }

    #[test]
    fn recv_timeout_error_matches_phase() {
        assert_eq!(
            recv_timeout_error(Phase::NothingYet),
            ErrorKind::RecvRequestTimeoutWithNothing
        );
        assert_eq!(
            recv_timeout_error(Phase::RequestLine),
            ErrorKind::RecvRequestLineTimeout
        );
        assert_eq!(
            recv_timeout_error(Phase::Headers),
            ErrorKind::RecvRequestHeadersTimeout
        );
        assert_eq!(recv_timeout_error(Phase::Body), ErrorKind::RecvRequestBodyTimeout);
    }
}
