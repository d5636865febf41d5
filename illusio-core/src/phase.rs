/// Defines per-trial phases and behavior
pub trait Phase: Copy + Clone + PartialEq + Send + Sync + std::fmt::Debug + Default {
    fn allows_input(&self) -> bool;
    fn charges_reaction_time(&self) -> bool;
    /// `None` once the phase is terminal.
    fn next(&self) -> Option<Self>;
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum TrialPhase {
    #[default]
    Fixation,
    Responding,
    Finalized,
}

impl Phase for TrialPhase {
    fn allows_input(&self) -> bool {
        matches!(self, Self::Responding)
    }

    fn charges_reaction_time(&self) -> bool {
        matches!(self, Self::Responding)
    }

    fn next(&self) -> Option<Self> {
        use TrialPhase::*;
        Some(match self {
            Fixation => Responding,
            Responding => Finalized,
            Finalized => return None,
        })
    }
}
