use super::{Participant, ParticipantId};

/// Round and turn bookkeeping.
///
/// The roster is kept in initiative order, so `index` points directly into
/// [`super::BattleState::roster`].
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnState {
    /// Current round, starting at 1 once the battle has started.
    pub round: u32,

    /// Index of the participant whose turn it is.
    pub index: usize,

    /// True once `start()` has sorted the roster and fired battle-start hooks.
    pub started: bool,

    /// Summons waiting to join at the next start of round.
    #[cfg_attr(feature = "serde", serde(default))]
    pub pending: Vec<Participant>,

    /// Participants whose start-of-turn bookkeeping already ran this round.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ticked: Vec<ParticipantId>,
}

impl TurnState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_ticked(&self, id: ParticipantId) -> bool {
        self.ticked.contains(&id)
    }
}
