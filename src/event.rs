use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Indicates why a recompute cycle was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecomputeReason {
    /// A mutation batch landed inside the watched scope.
    Mutation,
    /// A facilitator-reassignment control was activated.
    Reassign,
    /// The summary panel's refresh affordance requested an immediate pass.
    ManualRefresh,
}

/// Events emitted by the [`TallyService`](crate::watch::TallyService) to its host.
///
/// Delivery is best-effort notification only; the service never blocks on the
/// host draining these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TallyEvent {
    /// The host view root appeared and the session was initialized.
    SessionStarted,
    /// The host view root disappeared and the session was torn down.
    SessionStopped,
    /// A recompute cycle was requested (it may still be superseded before it runs).
    RecomputeRequested(RecomputeReason),
    /// A recompute cycle completed; carries the number of facilitators in the
    /// freshly rendered aggregate.
    AggregateUpdated(usize),
}

impl Display for RecomputeReason {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            RecomputeReason::Mutation => write!(f, "Mutation"),
            RecomputeReason::Reassign => write!(f, "Reassign"),
            RecomputeReason::ManualRefresh => write!(f, "ManualRefresh"),
        }
    }
}

impl Display for TallyEvent {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            TallyEvent::SessionStarted => write!(f, "SessionStarted"),
            TallyEvent::SessionStopped => write!(f, "SessionStopped"),
            TallyEvent::RecomputeRequested(reason) => write!(f, "RecomputeRequested({reason})"),
            TallyEvent::AggregateUpdated(count) => write!(f, "AggregateUpdated({count})"),
        }
    }
}
