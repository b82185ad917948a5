//! In-memory per-identity coalescing state.
//!
//! Mirrors the pattern in [`concurrency`](crate::concurrency)'s
//! [`BroadcastConcurrencyManager`](crate::concurrency::BroadcastConcurrencyManager) — a
//! [`DashMap`] keyed by identity, with a broadcast channel per in-flight entry — but
//! exposes the dispatcher's own state vocabulary (`Initial` / `Fetching` / `HitForPass` /
//! `Cacheable` / `Passed`) instead of a generic hit/miss/await decision. Use this when the
//! caller needs to know *which* state a request landed in, not just whether to proceed.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::broadcast;
pub use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Per-identity coalescing state.
///
/// See the module-level documentation for the transition semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// No entry exists yet, or the previous one expired.
    Initial,
    /// Exactly one request currently owns the upstream fetch for this identity.
    Fetching,
    /// The origin indicated this identity is not cacheable; bypass the store
    /// until the negative-cache window elapses.
    HitForPass,
    /// A fresh record exists in the response store.
    Cacheable,
    /// Terminal marker for requests handed straight through (non-GET/HEAD).
    Passed,
}

/// Outcome of [`StateRegistry::acquire`].
pub enum Acquired {
    /// The caller owns the fetch for this identity and must eventually call
    /// [`FetchGuard::publish`] or [`FetchGuard::abandon`].
    Owner(FetchGuard),
    /// The identity already resolved to a stable state; no fetch is needed.
    Ready(EntryState),
}

/// Error surfaced when waiting for another request's fetch to complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AcquireError {
    /// The waiter exceeded [`StateRegistry`]'s configured retry cap after
    /// repeated `abandon`s.
    #[error("exceeded retry cap waiting for identity to resolve")]
    RetryCapExceeded,
    /// The waiter's cancellation token fired while suspended.
    #[error("acquire canceled")]
    Canceled,
    /// The waiter exceeded the registry's configured max coalescing wait
    /// before the owner published a result.
    #[error("acquire timed out waiting for identity to resolve")]
    Timeout,
}

struct Slot {
    state: EntryState,
    /// Set when `state` is `Cacheable` or `HitForPass`: the instant after which the
    /// entry must be treated as expired (`CreatedAt + TTL`, or the negative-cache window).
    expires_at: Option<Instant>,
    /// Present only while `state == Fetching`; `None` once published/abandoned and
    /// about to be removed.
    owner_channel: Option<broadcast::Sender<Option<EntryState>>>,
}

/// Maps request identity to coalescing state, serializing concurrent fetches per key.
///
/// Entries for `Cacheable` and `HitForPass` are evicted lazily on read once expired, and
/// proactively bounded: once the number of `HitForPass` entries exceeds `max_hit_for_pass`,
/// the oldest is evicted to bound memory under a flood of unique, uncacheable identities.
pub struct StateRegistry {
    entries: DashMap<Bytes, Slot>,
    hit_for_pass_order: Mutex<VecDeque<Bytes>>,
    max_hit_for_pass: usize,
    max_retries: u32,
    max_wait: Duration,
}

impl StateRegistry {
    /// Creates a registry with the given `HitForPass` entry cap, abandon-retry
    /// cap, and per-wait timeout (see [`Self::acquire`]).
    pub fn new(max_hit_for_pass: usize, max_retries: u32, max_wait: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            hit_for_pass_order: Mutex::new(VecDeque::new()),
            max_hit_for_pass,
            max_retries,
            max_wait,
        }
    }

    /// Atomically reads or creates the entry for `id`.
    ///
    /// Blocks (without holding any registry lock across the await) while another
    /// request owns the fetch, retrying up to `max_retries` times if the owner
    /// `abandon`s. Returns [`AcquireError::RetryCapExceeded`] if that cap is hit.
    ///
    /// A waiter (never the owner) stops waiting as soon as one of two things
    /// happens first: `cancel` fires, in which case it deregisters and returns
    /// [`AcquireError::Canceled`]; or `max_wait` elapses with no publish, in
    /// which case it returns [`AcquireError::Timeout`] so the caller can fall
    /// back to an uncoalesced fetch instead of blocking the request further.
    pub async fn acquire(
        &self,
        id: &Bytes,
        cancel: &CancellationToken,
    ) -> Result<Acquired, AcquireError> {
        let mut retries = 0u32;
        loop {
            let wait = match self.entries.entry(id.clone()) {
                Entry::Occupied(mut entry) => {
                    let slot = entry.get_mut();
                    match slot.state {
                        EntryState::Fetching => {
                            let sender = slot
                                .owner_channel
                                .as_ref()
                                .expect("Fetching slot always has an owner channel")
                                .clone();
                            Some(sender.subscribe())
                        }
                        EntryState::Cacheable | EntryState::HitForPass => {
                            if slot.expires_at.is_some_and(|t| Instant::now() >= t) {
                                entry.insert(Slot {
                                    state: EntryState::Fetching,
                                    expires_at: None,
                                    owner_channel: Some(self.new_owner_channel()),
                                });
                                None
                            } else {
                                let outcome = match slot.state {
                                    EntryState::Cacheable => "ready_cacheable",
                                    _ => "ready_hit_for_pass",
                                };
                                crate::metrics::record_coalesce(outcome);
                                return Ok(Acquired::Ready(slot.state));
                            }
                        }
                        EntryState::Initial | EntryState::Passed => {
                            entry.insert(Slot {
                                state: EntryState::Fetching,
                                expires_at: None,
                                owner_channel: Some(self.new_owner_channel()),
                            });
                            None
                        }
                    }
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(Slot {
                        state: EntryState::Fetching,
                        expires_at: None,
                        owner_channel: Some(self.new_owner_channel()),
                    });
                    None
                }
            };

            let Some(mut receiver) = wait else {
                trace!(retries, "became fetch owner");
                crate::metrics::record_coalesce("owner");
                return Ok(Acquired::Owner(FetchGuard {
                    id: id.clone(),
                    published: false,
                    registry: self,
                }));
            };

            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    crate::metrics::record_coalesce("canceled");
                    return Err(AcquireError::Canceled);
                }
                () = tokio::time::sleep(self.max_wait) => {
                    crate::metrics::record_coalesce("timeout");
                    return Err(AcquireError::Timeout);
                }
                recv = receiver.recv() => match recv {
                    Ok(Some(state)) => {
                        let outcome = match state {
                            EntryState::Cacheable => "ready_cacheable",
                            _ => "ready_hit_for_pass",
                        };
                        crate::metrics::record_coalesce(outcome);
                        return Ok(Acquired::Ready(state));
                    }
                    Ok(None) => {
                        retries += 1;
                        if retries > self.max_retries {
                            crate::metrics::record_coalesce("retry_cap_exceeded");
                            return Err(AcquireError::RetryCapExceeded);
                        }
                        continue;
                    }
                    Err(_closed_or_lagged) => {
                        retries += 1;
                        if retries > self.max_retries {
                            crate::metrics::record_coalesce("retry_cap_exceeded");
                            return Err(AcquireError::RetryCapExceeded);
                        }
                        continue;
                    }
                },
            }
        }
    }

    fn new_owner_channel(&self) -> broadcast::Sender<Option<EntryState>> {
        broadcast::channel(1).0
    }

    fn publish(&self, id: &Bytes, state: EntryState, ttl: Duration) {
        trace!(?state, ttl_secs = ttl.as_secs(), "publishing fetch outcome");
        let channel = match state {
            EntryState::Passed | EntryState::Initial => {
                let removed = self.entries.remove(id);
                removed.and_then(|(_, slot)| slot.owner_channel)
            }
            EntryState::Cacheable | EntryState::HitForPass => {
                let channel = self
                    .entries
                    .get(id)
                    .and_then(|slot| slot.owner_channel.clone());
                self.entries.insert(
                    id.clone(),
                    Slot {
                        state,
                        expires_at: Some(Instant::now() + ttl),
                        owner_channel: None,
                    },
                );
                if state == EntryState::HitForPass {
                    self.track_hit_for_pass(id);
                }
                channel
            }
            EntryState::Fetching => {
                unreachable!("publish never re-enters Fetching")
            }
        };

        if let Some(sender) = channel {
            let _ = sender.send(Some(state));
        }
    }

    fn track_hit_for_pass(&self, id: &Bytes) {
        let mut order = self.hit_for_pass_order.lock().expect("poisoned");
        order.push_back(id.clone());
        while order.len() > self.max_hit_for_pass {
            if let Some(oldest) = order.pop_front() {
                self.entries.remove_if(&oldest, |_, slot| {
                    slot.state == EntryState::HitForPass
                });
            } else {
                break;
            }
        }
    }

    fn abandon(&self, id: &Bytes) {
        if let Some((_, slot)) = self.entries.remove(id) {
            if let Some(sender) = slot.owner_channel {
                let _ = sender.send(None);
            }
        }
    }

    /// Current number of tracked entries, for tests and diagnostics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry currently holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Exclusive right to drive the upstream fetch for one identity.
///
/// Obtained from [`StateRegistry::acquire`]. Must be consumed via [`publish`](Self::publish)
/// or [`abandon`](Self::abandon); dropping it without either is treated as an abandon so a
/// panicking fetch doesn't wedge other waiters forever.
pub struct FetchGuard<'a> {
    id: Bytes,
    published: bool,
    registry: &'a StateRegistry,
}

impl FetchGuard<'_> {
    /// Publishes the outcome of the fetch, waking all waiters.
    ///
    /// `ttl` is ignored for [`EntryState::Passed`]; it is the cache or negative-cache
    /// window for [`EntryState::Cacheable`] / [`EntryState::HitForPass`] respectively.
    pub fn publish(mut self, state: EntryState, ttl: Duration) {
        self.registry.publish(&self.id, state, ttl);
        self.published = true;
    }

    /// Reverts the entry to `Initial` and wakes waiters to retry.
    pub fn abandon(mut self) {
        self.registry.abandon(&self.id);
        self.published = true;
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        if !self.published {
            self.registry.abandon(&self.id);
        }
    }
}
