use crate::config::AdjustmentDesign;
use illusio_core::{
    AdjustmentRecord, Condition, ForcedChoiceRecord, GroundTruth, Label, Stimulus, TrialRecord,
};
use std::time::Duration;

/// Free-adjustment response state. The test length is never clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
    pub angle: i32,
    pub reference_length: i32,
    pub start_length: i32,
    pub step_size: i32,
    pub length: i32,
    pub steps: u32,
}

impl Adjustment {
    pub fn new(condition: Condition, design: &AdjustmentDesign) -> Self {
        Self {
            angle: condition.value(),
            reference_length: design.reference_length,
            start_length: design.start_length,
            step_size: design.step_size,
            length: design.start_length,
            steps: 0,
        }
    }

    pub fn increase(mut self) -> Self {
        self.length += self.step_size;
        self.steps += 1;
        self
    }

    pub fn decrease(mut self) -> Self {
        self.length -= self.step_size;
        self.steps += 1;
        self
    }

    pub fn stimulus(&self) -> Stimulus {
        Stimulus::MullerLyer {
            angle_deg: self.angle,
            reference_length: self.reference_length,
            test_length: self.length,
        }
    }
}

/// Two-alternative comparison with its answer fixed before display.
#[derive(Debug, Clone, PartialEq)]
pub struct ForcedChoice {
    pub length_diff: i32,
    pub top_length: i32,
    pub bottom_length: i32,
    pub ground_truth: GroundTruth,
}

impl ForcedChoice {
    pub fn new(condition: Condition, base_length: i32) -> Self {
        let top_length = base_length + condition.value();
        let bottom_length = base_length;
        Self {
            length_diff: condition.value(),
            top_length,
            bottom_length,
            ground_truth: GroundTruth::from_lengths(top_length, bottom_length),
        }
    }

    pub fn stimulus(&self) -> Stimulus {
        Stimulus::Ponzo {
            top_length: self.top_length,
            bottom_length: self.bottom_length,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Modality {
    Adjustment(Adjustment),
    ForcedChoice(ForcedChoice),
}

impl Modality {
    pub fn condition(&self) -> Condition {
        match self {
            Modality::Adjustment(a) => Condition(a.angle),
            Modality::ForcedChoice(f) => Condition(f.length_diff),
        }
    }

    pub fn stimulus(&self) -> Stimulus {
        match self {
            Modality::Adjustment(a) => a.stimulus(),
            Modality::ForcedChoice(f) => f.stimulus(),
        }
    }
}

/// A finalized response, waiting for its reaction time.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Adjusted(Adjustment),
    Chose { trial: ForcedChoice, label: Label },
}

/// Identifies the trial a record belongs to.
#[derive(Debug, Clone, Copy)]
pub struct TrialContext<'a> {
    pub subject_id: &'a str,
    /// 1-based.
    pub trial_index: usize,
}

impl Response {
    pub fn into_record(self, ctx: TrialContext<'_>, reaction_time: Duration) -> TrialRecord {
        let rt = reaction_time.as_secs_f64();
        match self {
            Response::Adjusted(a) => TrialRecord::Adjustment(AdjustmentRecord {
                subject_id: ctx.subject_id.to_string(),
                trial_index: ctx.trial_index,
                angle: a.angle,
                ref_length: a.reference_length,
                initial_test_length: a.start_length,
                final_test_length: a.length,
                adjustment_steps: a.steps,
                rt,
            }),
            Response::Chose { trial, label } => TrialRecord::ForcedChoice(ForcedChoiceRecord {
                subject_id: ctx.subject_id.to_string(),
                trial_index: ctx.trial_index,
                length_diff: trial.length_diff,
                top_length: trial.top_length,
                bottom_length: trial.bottom_length,
                correct_answer: trial.ground_truth,
                response: label,
                is_correct: trial.ground_truth.score(label),
                rt,
            }),
        }
    }
}
