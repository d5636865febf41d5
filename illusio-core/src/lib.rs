pub mod event;
pub mod phase;
pub mod stimulus;
pub mod trial;

pub use event::InputEvent;
pub use phase::{Phase, TrialPhase};
pub use stimulus::Stimulus;
pub use trial::{AdjustmentRecord, Condition, ForcedChoiceRecord, GroundTruth, Label, TrialRecord};
