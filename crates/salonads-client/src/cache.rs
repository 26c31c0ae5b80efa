//! In-memory identity cache.
//!
//! [`SessionCache`] holds the currently authenticated user shared by every
//! consumer of the client. It provides:
//!
//! - A TTL so repeated identity checks inside the window never touch the network
//! - Single-flight resolution: concurrent callers share one in-flight lookup
//! - Listener notification whenever the resolved identity changes
//!
//! Every `invalidate`/`expire` bumps a generation counter. A lookup that was
//! started under an older generation still answers its own waiters but never
//! writes the cache or notifies listeners.
//!
//! Each notification takes a sequence number under the state lock and is
//! delivered under a separate delivery lock. A notification whose number is
//! older than the last one delivered is dropped, so listeners always end on
//! the identity the cache holds.

use std::cell::Cell;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, ReentrantMutex};

use crate::error::SessionResult;
use crate::subscribers::Subscribers;
use crate::types::User;

type Resolution = Shared<BoxFuture<'static, Option<User>>>;

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No user is known.
    NoSession,
    /// An identity lookup is in flight.
    ResolvingSession,
    /// A user is cached and inside the TTL window.
    ValidSession,
    /// A user is cached but the TTL elapsed; the next check re-resolves.
    StaleSession,
    /// A token refresh is in flight.
    Refreshing,
}

struct CacheState {
    user: Option<User>,
    cached_at: Option<Instant>,
    pending: Option<Resolution>,
    generation: u64,
    notify_seq: u64,
}

impl CacheState {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.user.is_some() && self.cached_at.is_some_and(|at| at.elapsed() < ttl)
    }
}

struct CacheInner {
    state: Mutex<CacheState>,
    subscribers: Arc<Subscribers>,
    ttl: Duration,
    /// Sequence number of the last delivered notification. Reentrant so a
    /// listener may end the session from inside its callback.
    delivered: ReentrantMutex<Cell<u64>>,
}

/// Shared, cheaply clonable identity cache.
#[derive(Clone)]
pub struct SessionCache {
    inner: Arc<CacheInner>,
}

impl SessionCache {
    #[must_use]
    pub fn new(ttl: Duration, subscribers: Arc<Subscribers>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                state: Mutex::new(CacheState {
                    user: None,
                    cached_at: None,
                    pending: None,
                    generation: 0,
                    notify_seq: 0,
                }),
                subscribers,
                ttl,
                delivered: ReentrantMutex::new(Cell::new(0)),
            }),
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    #[must_use]
    pub fn subscribers(&self) -> &Arc<Subscribers> {
        &self.inner.subscribers
    }

    /// Returns the cached user without any I/O. The value may be stale.
    #[must_use]
    pub fn cached_user(&self) -> Option<User> {
        self.inner.state.lock().user.clone()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        let state = self.inner.state.lock();
        if state.pending.is_some() {
            SessionState::ResolvingSession
        } else if state.is_fresh(self.inner.ttl) {
            SessionState::ValidSession
        } else if state.user.is_some() {
            SessionState::StaleSession
        } else {
            SessionState::NoSession
        }
    }

    /// Resolves the current user.
    ///
    /// Joins the in-flight lookup if there is one, returns the cached user if
    /// it is fresh, and otherwise starts a lookup with `fetch`. `fetch` is only
    /// called when a new lookup starts. A failed lookup resolves to `None` and
    /// clears the cache.
    pub async fn resolve_with<F, Fut>(&self, fetch: F) -> Option<User>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = SessionResult<Option<User>>> + Send + 'static,
    {
        let resolution = {
            let mut state = self.inner.state.lock();
            if let Some(pending) = &state.pending {
                tracing::trace!("Joining in-flight identity lookup");
                pending.clone()
            } else if state.is_fresh(self.inner.ttl) {
                tracing::trace!("Identity cache hit");
                return state.user.clone();
            } else {
                tracing::debug!(stale = state.user.is_some(), "Identity cache miss");
                let generation = state.generation;
                let inner = Arc::clone(&self.inner);
                let lookup = fetch();
                let resolution = async move {
                    let outcome = lookup.await;
                    inner.complete(generation, outcome)
                }
                .boxed()
                .shared();
                state.pending = Some(resolution.clone());
                resolution
            }
        };
        resolution.await
    }

    /// Drops the cached user and any in-flight lookup without notifying
    /// listeners.
    pub fn invalidate(&self) {
        let mut state = self.inner.state.lock();
        state.reset();
        tracing::debug!(generation = state.generation, "Identity cache invalidated");
    }

    /// Ends the session: clears the cache and notifies every listener with
    /// `None`.
    pub fn expire(&self) {
        let seq = {
            let mut state = self.inner.state.lock();
            state.reset();
            tracing::debug!(generation = state.generation, "Session expired");
            state.next_notification()
        };
        self.inner.deliver(seq, None);
    }
}

impl CacheState {
    fn reset(&mut self) {
        self.user = None;
        self.cached_at = None;
        self.pending = None;
        self.generation += 1;
    }

    fn next_notification(&mut self) -> u64 {
        self.notify_seq += 1;
        self.notify_seq
    }
}

impl CacheInner {
    fn complete(&self, generation: u64, outcome: SessionResult<Option<User>>) -> Option<User> {
        let resolved = match outcome {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!(error = %err, "Identity lookup failed");
                None
            }
        };

        let notification = {
            let mut state = self.state.lock();
            if state.generation != generation {
                tracing::debug!("Discarding identity lookup from an ended session");
                return resolved;
            }
            state.pending = None;
            let changed = state.user != resolved;
            state.cached_at = resolved.as_ref().map(|_| Instant::now());
            state.user.clone_from(&resolved);
            changed.then(|| state.next_notification())
        };

        if let Some(seq) = notification {
            self.deliver(seq, resolved.as_ref());
        }
        resolved
    }

    fn deliver(&self, seq: u64, user: Option<&User>) {
        let delivered = self.delivered.lock();
        if seq <= delivered.get() {
            tracing::debug!(seq, latest = delivered.get(), "Dropping superseded identity notification");
            return;
        }
        delivered.set(seq);
        self.subscribers.notify(user);
    }
}
