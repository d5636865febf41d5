pub mod config;
pub mod error;
pub mod plan;
pub mod port;
pub mod recorder;
pub mod runner;
pub mod session;
pub mod state;
pub mod trial;

pub use config::{AdjustmentDesign, Design, DisplayConfig, ExperimentConfig, ForcedChoiceDesign};
pub use error::{ConfigError, PresentationError, SessionError, StorageError};
pub use plan::{DesignSpec, TrialPlan};
pub use port::RenderInputPort;
pub use recorder::SessionRecorder;
pub use runner::{TrialOutcome, TrialRunner};
pub use session::{ExperimentSession, Session, SessionOutcome, SessionReport};
pub use state::{TrialMachine, Transition};
pub use trial::{Adjustment, ForcedChoice, Modality, Response, TrialContext};
