//! Tracking session host interface
//!
//! The platform session (anchor detection and pose updates) is an external
//! collaborator. The core only tells it which reference images to track;
//! anchor events flow back in as `CoreEvent`s.

/// Host-side tracking session controlled by the core.
pub trait TrackingSessionHost: Send + Sync {
    /// Start tracking exactly the given set of reference images, replacing
    /// whatever was tracked before. `reset_existing` also discards anchors
    /// the host may still hold from the previous set.
    fn start_tracking(&self, images: Vec<crate::imagery::ReferenceImage>, reset_existing: bool);

    /// Stop tracking entirely.
    fn stop_tracking(&self);
}

/// Failure kinds reported by the session host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionErrorKind {
    /// A reference image handed to the host turned out to be untrackable.
    /// The session stays stopped until restarted, so the pool performs a
    /// full reset, but there is no benefit in surfacing this to the user.
    InvalidReferenceImage,
    /// Any other unrecoverable session failure. Surfaced to the user as an
    /// actionable restart prompt.
    Fatal(String),
}

impl SessionErrorKind {
    /// Whether this failure should be shown to the user.
    pub fn user_visible(&self) -> bool {
        matches!(self, SessionErrorKind::Fatal(_))
    }
}

impl std::fmt::Display for SessionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionErrorKind::InvalidReferenceImage => {
                write!(f, "the detected rectangle cannot be tracked")
            }
            SessionErrorKind::Fatal(message) => write!(f, "{message}"),
        }
    }
}
