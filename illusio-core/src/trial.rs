use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// One point in the design space: a wing angle or a signed length difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Condition(pub i32);

impl Condition {
    pub fn value(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A forced-choice answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Top,
    Bottom,
}

/// Which of two displayed quantities is actually larger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroundTruth {
    Top,
    Bottom,
    Equal,
}

impl GroundTruth {
    pub fn from_lengths(top: i32, bottom: i32) -> Self {
        match top.cmp(&bottom) {
            std::cmp::Ordering::Greater => GroundTruth::Top,
            std::cmp::Ordering::Less => GroundTruth::Bottom,
            std::cmp::Ordering::Equal => GroundTruth::Equal,
        }
    }

    /// `None` when the lengths are equal: the question has no right answer.
    pub fn score(self, response: Label) -> Option<bool> {
        match (self, response) {
            (GroundTruth::Equal, _) => None,
            (GroundTruth::Top, label) => Some(label == Label::Top),
            (GroundTruth::Bottom, label) => Some(label == Label::Bottom),
        }
    }
}

/// Seconds as plain decimal text with microsecond resolution, never in
/// exponent notation.
fn fixed_seconds<S: Serializer>(seconds: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&format_args!("{seconds:.6}"))
}

/// Recorded result of one adjustment trial. Field order is column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentRecord {
    pub subject_id: String,
    pub trial_index: usize,
    pub angle: i32,
    pub ref_length: i32,
    pub initial_test_length: i32,
    pub final_test_length: i32,
    pub adjustment_steps: u32,
    #[serde(serialize_with = "fixed_seconds")]
    pub rt: f64,
}

impl AdjustmentRecord {
    pub const COLUMNS: &'static [&'static str] = &[
        "subject_id",
        "trial_index",
        "angle",
        "ref_length",
        "initial_test_length",
        "final_test_length",
        "adjustment_steps",
        "rt",
    ];
}

/// Recorded result of one forced-choice trial. Field order is column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForcedChoiceRecord {
    pub subject_id: String,
    pub trial_index: usize,
    pub length_diff: i32,
    pub top_length: i32,
    pub bottom_length: i32,
    pub correct_answer: GroundTruth,
    pub response: Label,
    pub is_correct: Option<bool>,
    #[serde(serialize_with = "fixed_seconds")]
    pub rt: f64,
}

impl ForcedChoiceRecord {
    pub const COLUMNS: &'static [&'static str] = &[
        "subject_id",
        "trial_index",
        "length_diff",
        "top_length",
        "bottom_length",
        "correct_answer",
        "response",
        "is_correct",
        "rt",
    ];
}

/// Durable output of one completed trial
#[derive(Debug, Clone, PartialEq)]
pub enum TrialRecord {
    Adjustment(AdjustmentRecord),
    ForcedChoice(ForcedChoiceRecord),
}

impl TrialRecord {
    pub fn trial_index(&self) -> usize {
        match self {
            TrialRecord::Adjustment(r) => r.trial_index,
            TrialRecord::ForcedChoice(r) => r.trial_index,
        }
    }

    pub fn reaction_time(&self) -> f64 {
        match self {
            TrialRecord::Adjustment(r) => r.rt,
            TrialRecord::ForcedChoice(r) => r.rt,
        }
    }
}
