//! Built-in exact-match request router.
//!
//! The server is generic over any [`Handler`](crate::Handler) — a
//! connection owns exactly one and calls its `handle` once per request.
//! `Router` is this crate's own `Handler` implementation: it keeps a
//! per-method table of `(pattern, callback)` pairs and does the dispatch
//! the spec describes, so callers who want that behavior don't have to
//! hand-roll it inside their own `Handler::handle`.

use crate::{
    http::{
        request::Request,
        response::{Handled, Response},
        types::{Method, METHOD_COUNT},
    },
    server::connection::ConnectionData,
    Handler,
};
use log::trace;
use std::future::Future;

/// A request-target pattern: exact match against
/// [`Url::path_segments`](crate::Url::path_segments).
pub type Pattern = &'static [&'static [u8]];

type Callback<S> = Box<dyn Fn(&mut S, &Request, &mut Response) -> Handled + Send + Sync>;

/// Every bit *i* set in a registration mask enables
/// `Method::index() == Some(i)`; see [`Router::register_methods`].
pub type MethodMask = u16;

#[inline(always)]
const fn mask_bit(method: Method) -> MethodMask {
    match method.index() {
        Some(i) => 1 << i,
        None => 0,
    }
}

/// A single registered route: the slot a method's list has no bearing
/// on ordering within the list, only the order routes were pushed into
/// it (§4.F, §8 invariant 5's sibling rule for dispatch).
struct Route<S> {
    pattern: Pattern,
    callback: Callback<S>,
}

/// Method-indexed table of routes, with last-registered-match-wins
/// lookup (§4.F). Implements [`Handler`] itself, so it plugs directly
/// into [`crate::ServerBuilder::handler`].
pub struct Router<S = ()> {
    table: [Vec<Route<S>>; METHOD_COUNT],
}

impl<S> Router<S> {
    pub fn new() -> Self {
        Self {
            table: std::array::from_fn(|_| Vec::new()),
        }
    }

    /// Registers `callback` for `method` at the exact-match `pattern`.
    /// Later registrations for the same `(method, pattern)` take
    /// priority over earlier ones (§4.F, §8 invariant: "last match
    /// wins" — preserved deliberately rather than treated as a bug).
    pub fn register<F>(mut self, method: Method, pattern: Pattern, callback: F) -> Self
    where
        F: Fn(&mut S, &Request, &mut Response) -> Handled + Send + Sync + 'static,
    {
        if let Some(i) = method.index() {
            self.table[i].push(Route {
                pattern,
                callback: Box::new(callback),
            });
        }
        self
    }

    /// Registers `callback` for every method whose bit is set in
    /// `mask` — built from [`mask_bit`] or by OR-ing several of them
    /// together — at the exact-match `pattern`.
    pub fn register_methods<F>(mut self, mask: MethodMask, pattern: Pattern, callback: F) -> Self
    where
        F: Fn(&mut S, &Request, &mut Response) -> Handled + Send + Sync + 'static,
    {
        let callback = std::sync::Arc::new(callback);
        for i in 0..METHOD_COUNT {
            if mask & (1 << i) != 0 {
                let callback = callback.clone();
                self.table[i].push(Route {
                    pattern,
                    callback: Box::new(move |s, req, resp| callback(s, req, resp)),
                });
            }
        }
        self
    }

    /// Builds a mask selecting exactly the given methods, for use with
    /// [`Self::register_methods`].
    pub fn methods(methods: &[Method]) -> MethodMask {
        methods.iter().fold(0, |acc, &m| acc | mask_bit(m))
    }

    fn dispatch(&self, data: &mut S, request: &Request, response: &mut Response) -> Handled {
        let Some(index) = request.method().index() else {
            trace!("dispatch: no handler slot for unknown method");
            return Handled::default();
        };

        let routes = &self.table[index];
        if routes.is_empty() {
            trace!("dispatch: EmptyHandler, no routes registered for this method");
            return Handled::default();
        }

        let segments = request.url().path_segments();
        match routes.iter().rev().find(|r| r.pattern == segments) {
            Some(route) => (route.callback)(data, request, response),
            None => {
                trace!("dispatch: EmptyHandler, no pattern matched {:?}", segments);
                Handled::default()
            }
        }
    }
}

impl<S> Default for Router<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Handler<S> for Router<S>
where
    S: ConnectionData,
{
    fn handle(
        &self,
        connection_data: &mut S,
        request: &Request,
        response: &mut Response,
    ) -> impl Future<Output = Handled> + Send {
        let handled = self.dispatch(connection_data, request, response);
        async move { handled }
    }
}
