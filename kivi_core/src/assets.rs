// Copyright 2026 the Kivi Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Asynchronous geometry loading.
//!
//! STL frames only name an asset; loading it is someone else's job. The
//! [`PatchEngine`](crate::patch::PatchEngine) hands each load to an
//! [`AssetFetcher`] as a [`GeometryRequest`] and keeps going. The fetcher
//! answers later, from any thread, by calling
//! [`GeometryRequest::complete`]. The answer travels over a channel and is
//! only applied to the scene when the engine pumps completions on its own
//! thread.
//!
//! Every request carries a [`FetchTicket`] naming the node it was issued for
//! (generation included) plus a serial number. The engine uses the ticket to
//! discard answers for nodes that were removed or re-targeted in the
//! meantime.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use hashbrown::HashMap;
use tracing::debug;

use crate::scene::{GeometryId, NodeId};

/// Identifies one geometry request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    node: NodeId,
    serial: u64,
}

impl FetchTicket {
    /// The node the geometry is meant for.
    #[inline]
    #[must_use]
    pub const fn node(self) -> NodeId {
        self.node
    }

    /// Issue order; later requests have larger serials.
    #[inline]
    #[must_use]
    pub const fn serial(self) -> u64 {
        self.serial
    }
}

/// Why a geometry load did not produce a resource.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Nothing is stored under the key.
    #[error("asset `{key}` not found")]
    NotFound {
        /// The requested asset key.
        key: String,
    },
    /// The asset exists but could not be retrieved or parsed.
    #[error("failed to load asset `{key}`: {reason}")]
    Failed {
        /// The requested asset key.
        key: String,
        /// Loader-specific description.
        reason: String,
    },
    /// The request was cancelled before it ran.
    #[error("fetch cancelled")]
    Cancelled,
}

/// The result of a geometry request, as delivered back to the engine.
#[derive(Clone, Debug)]
pub struct FetchCompletion {
    /// The request this answers.
    pub ticket: FetchTicket,
    /// The requested asset key.
    pub key: String,
    /// Loaded geometry or the failure.
    pub result: Result<GeometryId, FetchError>,
}

/// A pending geometry load handed to an [`AssetFetcher`].
///
/// The request is `Send`; it may be completed on any thread. Dropping it
/// without completing answers with [`FetchError::Cancelled`], which releases
/// the engine's pending ticket and leaves the node's geometry unchanged.
#[derive(Debug)]
pub struct GeometryRequest {
    key: String,
    ticket: FetchTicket,
    cancelled: Arc<AtomicBool>,
    // `None` once answered.
    reply: Option<Sender<FetchCompletion>>,
}

impl GeometryRequest {
    /// The asset key named by the STL frame.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The ticket identifying this request.
    #[must_use]
    pub fn ticket(&self) -> FetchTicket {
        self.ticket
    }

    /// Returns whether the engine no longer wants this result. Fetchers may
    /// skip work for cancelled requests.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Delivers the result. Returns `false` if the engine has been dropped.
    pub fn complete(mut self, result: Result<GeometryId, FetchError>) -> bool {
        self.reply_with(result)
    }

    fn reply_with(&mut self, result: Result<GeometryId, FetchError>) -> bool {
        let Some(reply) = self.reply.take() else {
            return false;
        };
        reply
            .send(FetchCompletion {
                ticket: self.ticket,
                key: core::mem::take(&mut self.key),
                result,
            })
            .is_ok()
    }
}

impl Drop for GeometryRequest {
    fn drop(&mut self) {
        if self.reply.is_some() {
            debug!(key = self.key.as_str(), "geometry request dropped without an answer");
            self.reply_with(Err(FetchError::Cancelled));
        }
    }
}

/// Starts geometry loads on behalf of the patch engine.
///
/// Implementations must not block for the duration of the load; they queue
/// the request somewhere and complete it later.
pub trait AssetFetcher {
    /// Begins loading `request.key()`.
    fn fetch_geometry(&mut self, request: GeometryRequest);
}

impl<F: AssetFetcher + ?Sized> AssetFetcher for Box<F> {
    fn fetch_geometry(&mut self, request: GeometryRequest) {
        (**self).fetch_geometry(request);
    }
}

impl<F: AssetFetcher + ?Sized> AssetFetcher for &mut F {
    fn fetch_geometry(&mut self, request: GeometryRequest) {
        (**self).fetch_geometry(request);
    }
}

/// A fetcher that parks requests until the host services them.
///
/// Useful when the host already has its own loading loop, and in tests.
#[derive(Debug, Default)]
pub struct DeferredFetcher {
    queue: VecDeque<GeometryRequest>,
}

impl DeferredFetcher {
    /// Creates an empty fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of parked requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns whether no requests are parked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Takes the oldest parked request.
    pub fn pop(&mut self) -> Option<GeometryRequest> {
        self.queue.pop_front()
    }

    /// Takes every parked request, oldest first.
    pub fn take_requests(&mut self) -> Vec<GeometryRequest> {
        self.queue.drain(..).collect()
    }
}

impl AssetFetcher for DeferredFetcher {
    fn fetch_geometry(&mut self, request: GeometryRequest) {
        self.queue.push_back(request);
    }
}

/// A fetcher that runs a loader closure on a dedicated worker thread.
///
/// Requests are processed one at a time in issue order. Dropping the fetcher
/// closes the request channel and joins the worker after it finishes the
/// requests already queued.
#[derive(Debug)]
pub struct ThreadFetcher {
    requests: Option<Sender<GeometryRequest>>,
    worker: Option<JoinHandle<()>>,
}

impl ThreadFetcher {
    /// Spawns the worker thread.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    pub fn spawn<L>(mut loader: L) -> std::io::Result<Self>
    where
        L: FnMut(&str) -> Result<GeometryId, FetchError> + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::unbounded::<GeometryRequest>();
        let worker = thread::Builder::new()
            .name("kivi-asset-fetch".into())
            .spawn(move || {
                for request in rx {
                    if request.is_cancelled() {
                        debug!(key = request.key(), "skipping cancelled geometry request");
                        request.complete(Err(FetchError::Cancelled));
                        continue;
                    }
                    let result = loader(request.key());
                    request.complete(result);
                }
            })?;
        Ok(Self {
            requests: Some(tx),
            worker: Some(worker),
        })
    }
}

impl AssetFetcher for ThreadFetcher {
    fn fetch_geometry(&mut self, request: GeometryRequest) {
        let Some(requests) = &self.requests else {
            return;
        };
        if let Err(err) = requests.send(request) {
            // The worker died (loader panicked); fail the request instead of
            // leaving it pending forever.
            let request = err.into_inner();
            let key = request.key().to_owned();
            request.complete(Err(FetchError::Failed {
                key,
                reason: "fetch worker has stopped".into(),
            }));
        }
    }
}

impl Drop for ThreadFetcher {
    fn drop(&mut self) {
        drop(self.requests.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Engine-side bookkeeping: the completion channel and the cancel flags of
/// outstanding requests.
#[derive(Debug)]
pub(crate) struct FetchQueue {
    tx: Sender<FetchCompletion>,
    rx: Receiver<FetchCompletion>,
    pending: HashMap<FetchTicket, Arc<AtomicBool>>,
    next_serial: u64,
}

impl FetchQueue {
    pub(crate) fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            tx,
            rx,
            pending: HashMap::new(),
            next_serial: 0,
        }
    }

    /// Registers a new request for `node`.
    pub(crate) fn issue(&mut self, node: NodeId, key: &str) -> GeometryRequest {
        let ticket = FetchTicket {
            node,
            serial: self.next_serial,
        };
        self.next_serial += 1;
        let cancelled = Arc::new(AtomicBool::new(false));
        self.pending.insert(ticket, Arc::clone(&cancelled));
        GeometryRequest {
            key: key.to_owned(),
            ticket,
            cancelled,
            reply: Some(self.tx.clone()),
        }
    }

    /// Claims a completed ticket. Returns `false` if it was cancelled or
    /// already claimed.
    pub(crate) fn claim(&mut self, ticket: FetchTicket) -> bool {
        self.pending.remove(&ticket).is_some()
    }

    /// Cancels every outstanding request matching `pred`. Returns how many
    /// were cancelled.
    pub(crate) fn cancel_where(&mut self, mut pred: impl FnMut(FetchTicket) -> bool) -> usize {
        let mut cancelled = 0;
        self.pending.retain(|&ticket, flag| {
            if pred(ticket) {
                flag.store(true, Ordering::Release);
                cancelled += 1;
                false
            } else {
                true
            }
        });
        cancelled
    }

    pub(crate) fn cancel_all(&mut self) -> usize {
        self.cancel_where(|_| true)
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn try_recv(&self) -> Option<FetchCompletion> {
        self.rx.try_recv().ok()
    }

    pub(crate) fn recv_timeout(&self, timeout: std::time::Duration) -> Option<FetchCompletion> {
        match self.rx.recv_timeout(timeout) {
            Ok(completion) => Some(completion),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}
