/// Track state enumeration for the object tracking lifecycle.
///
/// Transitions only move forward: `Tentative -> Confirmed -> Deleted`, or
/// `Tentative -> Deleted` for tracks that never gather enough hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Newly created track, not yet confirmed
    #[default]
    Tentative,
    /// Enough consecutive hits to be reported
    Confirmed,
    /// Retired; the identity is never reused
    Deleted,
}
