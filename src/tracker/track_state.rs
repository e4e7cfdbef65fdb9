/// Track state enumeration for the single target lifecycle.
///
/// States only move forward: `Tentative` → `Confirmed` → `Deleted`.
/// A tentative track may also be deleted directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Newly created track, not enough evidence collected yet
    #[default]
    Tentative,
    /// Track that received enough measurement updates
    Confirmed,
    /// Dead track, eligible for removal from the active set
    Deleted,
}

impl TrackState {
    fn rank(self) -> u8 {
        match self {
            TrackState::Tentative => 0,
            TrackState::Confirmed => 1,
            TrackState::Deleted => 2,
        }
    }

    /// Whether moving to `next` goes strictly forward in the lifecycle.
    #[inline]
    pub fn can_transition_to(self, next: TrackState) -> bool {
        next.rank() > self.rank()
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        self == TrackState::Deleted
    }
}
