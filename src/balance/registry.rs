//! Endpoint registry and round-robin selection.
//!
//! # Responsibilities
//! - Own the ordered endpoint list and the rotation cursor
//! - Select the next alive endpoint, with all-dead failover
//! - Record probe results from the health monitor
//!
//! # Design Decisions
//! - One exclusive lock covers every read-modify-write on shared state;
//!   network I/O never happens under it
//! - The endpoint list is fixed at construction, only flags and the cursor
//!   mutate afterwards
//! - Selection cannot fail: a full scan with no alive endpoint resets every
//!   flag and serves the scan's starting position

use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::time::Instant;

use crate::balance::endpoint::{Endpoint, EndpointError, Target};

/// Error constructing a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The configured endpoint list is empty.
    #[error("no endpoints configured")]
    Empty,

    /// One of the configured URLs did not parse.
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}

/// Outcome of a selection: the chosen slot and its rewrite target.
#[derive(Debug, Clone)]
pub struct Selection {
    pub index: usize,
    pub target: Target,
}

/// Read-only view of one endpoint's health, as last recorded.
#[derive(Debug, Clone)]
pub struct EndpointStatus {
    pub target: Target,
    pub alive: bool,
    pub last_checked: Instant,
}

/// Ordered, lock-guarded collection of backend endpoints.
#[derive(Debug)]
pub struct Registry {
    state: Mutex<State>,
}

#[derive(Debug)]
struct State {
    endpoints: Vec<Endpoint>,
    current: usize,
}

impl Registry {
    /// Build a registry from configured base URLs, in rotation order.
    ///
    /// All URLs must parse; a registry is never built from a partial list.
    pub fn new<S: AsRef<str>>(endpoints: &[S]) -> Result<Self, RegistryError> {
        if endpoints.is_empty() {
            return Err(RegistryError::Empty);
        }

        let endpoints = endpoints
            .iter()
            .map(|raw| Target::parse(raw.as_ref()).map(Endpoint::new))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            state: Mutex::new(State {
                endpoints,
                current: 0,
            }),
        })
    }

    /// Number of endpoints in rotation.
    pub fn len(&self) -> usize {
        self.lock().endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Select the next endpoint in rotation, skipping endpoints marked not
    /// alive. The scan starts one past the cursor and the cursor moves to
    /// whatever got picked.
    ///
    /// If the scan comes full circle without finding an alive endpoint the
    /// outage is treated as stale knowledge: every flag is reset to alive
    /// and the scan's starting position is served. Callers always get an
    /// endpoint.
    pub fn select_next(&self) -> Selection {
        let mut state = self.lock();
        let n = state.endpoints.len();
        let start = (state.current + 1) % n;

        let mut pos = start;
        loop {
            if state.endpoints[pos].alive {
                state.current = pos;
                return Selection {
                    index: pos,
                    target: state.endpoints[pos].target.clone(),
                };
            }
            pos = (pos + 1) % n;
            if pos == start {
                break;
            }
        }

        // Full circle with nothing alive: reset every flag and serve the
        // wrap point. The next probe round re-marks whatever is still down.
        tracing::warn!("No alive endpoints, resetting all to alive");
        for endpoint in &mut state.endpoints {
            endpoint.alive = true;
        }
        state.current = start;
        Selection {
            index: start,
            target: state.endpoints[start].target.clone(),
        }
    }

    /// Record a probe result for the endpoint at `index`.
    ///
    /// Out-of-range indices are ignored; the list never shrinks, so they
    /// can only come from a caller bug.
    pub fn record_probe(&self, index: usize, alive: bool) {
        let mut state = self.lock();
        if let Some(endpoint) = state.endpoints.get_mut(index) {
            endpoint.alive = alive;
            endpoint.last_checked = Instant::now();
        }
    }

    /// Snapshot every endpoint's target, for probing outside the lock.
    pub fn targets(&self) -> Vec<(usize, Target)> {
        self.lock()
            .endpoints
            .iter()
            .enumerate()
            .map(|(index, endpoint)| (index, endpoint.target.clone()))
            .collect()
    }

    /// Snapshot the recorded health of every endpoint.
    pub fn status(&self) -> Vec<EndpointStatus> {
        self.lock()
            .endpoints
            .iter()
            .map(|endpoint| EndpointStatus {
                target: endpoint.target.clone(),
                alive: endpoint.alive,
                last_checked: endpoint.last_checked,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A poisoned lock means some thread panicked mid-update; the state
        // itself stays index-valid, so keep serving.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
