pub mod clock;
pub mod manual;
pub mod timer;

pub use clock::{FrameLimiter, ReactionClock};
pub use manual::ManualTimer;
pub use timer::{CalibrationStats, HighPrecisionTimer, Timer};
