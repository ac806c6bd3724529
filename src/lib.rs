//! wireloop - an incremental, resumable HTTP/1.x server library
//!
//! A performance-oriented HTTP server built around an incremental parser
//! (tolerant of arbitrary byte-wise fragmentation) and one cooperatively
//! scheduled task per connection. Designed for services that want
//! fine-grained control over per-connection memory and timeouts without
//! pulling in a full framework.
//!
//! # Protocol Support
//!
//! - **HTTP/1.1**: persistent connections, default keep-alive.
//! - **HTTP/1.0**: basic protocol support, keep-alive only with an
//!   explicit `Connection: keep-alive` header.
//!
//! Chunked transfer encoding, HTTP/2, HTTP/3 and TLS are out of scope —
//! terminate TLS in front of this server if you need it.
//!
//! # Features
//!
//! - **Exact-path dispatch** - the built-in [`dispatch::Router`] matches
//!   request-target path segments exactly; bring your own [`Handler`]
//!   for anything fancier.
//! - **Per-phase timeouts** - receive, dispatch and send each race an
//!   independent deadline instead of one timeout for the whole request.
//! - **Zero-allocation hot path** - every connection's buffer, header
//!   table and URL component vectors are sized up front from its
//!   [`limits::ReqLimits`]/[`limits::RespLimits`] and reused across
//!   requests.
//! - **Storing data between requests** - ability to store data between
//!   requests in a single connection using the [`ConnectionData`] trait.
//! - **Server-wide metrics** - [`ServerMetrics`] aggregates bytes and
//!   request counts across every connection; grab a handle with
//!   [`Server::metrics`].
//!
//! # Quick Start
//!
//! ## 1. Installation
//!
//! Add `wireloop` and [`tokio`](https://crates.io/crates/tokio) to your `Cargo.toml`:
//!
//! ```bash
//! cargo add wireloop tokio --features tokio/full
//! ```
//! Or manually:
//! ```toml
//! [dependencies]
//! wireloop = "0.1"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! ## 2. Usage example
//! ```no_run
//! use wireloop::{Server, Handler, Request, Response, Handled, StatusCode};
//! use tokio::net::TcpListener;
//!
//! struct MyHandler;
//!
//! impl Handler for MyHandler {
//!     async fn handle(&self, _: &mut (), _: &Request, resp: &mut Response) -> Handled {
//!         resp.status(StatusCode::Ok).body("Hello World!")
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     Server::builder()
//!         .listener(TcpListener::bind("127.0.0.1:8080").await.unwrap())
//!         .handler(MyHandler)
//!         .build()
//!         .launch()
//!         .await;
//! }
//! ```
//!
//! For more examples see the `demos/` directory in the repository.
//!
//! # Use Cases
//!
//! - **High-throughput microservices** - configurable for specific workloads
//! - **Resource-constrained environments** - predictable memory usage
//! - **Internal APIs** - security-conscious defaults
//! - **Performance-critical applications** - zero-allocation design
pub(crate) mod buffer;
pub mod dispatch;
pub(crate) mod errors;
pub mod limits;
pub mod metric;
pub(crate) mod timeout;

pub(crate) mod http {
    pub mod query;
    pub(crate) mod parser;
    pub(crate) mod request;
    pub(crate) mod response;
    pub(crate) mod types;
}
pub(crate) mod server {
    pub(crate) mod connection;
    pub(crate) mod server_impl;
}

pub use crate::{
    http::{
        query,
        request::Request,
        response::{
            write::{BodyWriter, WriteBuffer},
            Handled, Response,
        },
        types::{Method, StatusCode, Url, Version},
    },
    metric::ServerMetrics,
    server::{
        connection::ConnectionData,
        server_impl::{Handler, Server, ServerBuilder},
    },
};

#[doc(hidden)]
pub fn run_test<F: FnOnce(&Request, &mut Response) -> Handled>(f: F) {
    f(
        &Request::new(&crate::limits::ReqLimits::default()),
        &mut Response::new(&crate::limits::RespLimits::default()),
    );
}

#[doc(hidden)]
#[macro_export]
macro_rules! impt_default_handler {
    ($name:ident) => {
        use wireloop::{Handled, Handler, Request, Response, StatusCode};
        struct $name;

        // `<()>` to check functionality
        impl Handler<()> for $name {
            async fn handle(&self, _: &mut (), _: &Request, resp: &mut Response) -> Handled {
                resp.status(StatusCode::Ok).body("Hello world!")
            }
        }
    };
}
