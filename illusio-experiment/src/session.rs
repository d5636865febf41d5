use crate::config::ExperimentConfig;
use crate::error::{PresentationError, SessionError};
use crate::plan::TrialPlan;
use crate::port::RenderInputPort;
use crate::recorder::SessionRecorder;
use crate::runner::{TrialOutcome, TrialRunner};
use crate::state::TrialMachine;
use crate::trial::TrialContext;
use chrono::{DateTime, Local};
use illusio_core::{Condition, Stimulus, TrialRecord};
use illusio_timing::Timer;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const INSTRUCTION_TEXT_SIZE: f32 = 28.0;
const CLOSING_TEXT_SIZE: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    /// Operator quit. Not an error: every finished trial is on disk.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    pub planned: usize,
    pub recorded: usize,
    pub output_path: PathBuf,
}

/// Per-run bookkeeping, threaded explicitly through the trial loop.
#[derive(Debug, Clone)]
pub struct Session {
    pub subject_id: String,
    pub created_at: DateTime<Local>,
    pub output_path: PathBuf,
    /// Empty until the subject begins.
    pub plan: TrialPlan,
    pub trials_recorded: usize,
}

impl Session {
    pub fn new(subject_id: impl Into<String>, config: &ExperimentConfig, created_at: DateTime<Local>) -> Self {
        let subject_id = subject_id.into();
        let output_path = output_path(&config.output_dir, &subject_id, &config.name, created_at);
        Self {
            subject_id,
            created_at,
            output_path,
            plan: TrialPlan::default(),
            trials_recorded: 0,
        }
    }

    pub fn next_trial_index(&self) -> usize {
        self.trials_recorded + 1
    }

    /// Condition of the next unrecorded trial, `None` once the plan is done.
    pub fn next_condition(&self) -> Option<Condition> {
        self.plan.conditions().get(self.trials_recorded).copied()
    }

    fn record(&mut self, record: &TrialRecord) {
        debug_assert_eq!(record.trial_index(), self.next_trial_index());
        self.trials_recorded += 1;
    }
}

/// `<dir>/<subject>_<experiment>_<YYYYmmdd_HHMMSS>.csv`
pub fn output_path(dir: &Path, subject_id: &str, experiment: &str, at: DateTime<Local>) -> PathBuf {
    dir.join(format!(
        "{}_{}_{}.csv",
        sanitize_subject_id(subject_id),
        experiment,
        at.format("%Y%m%d_%H%M%S")
    ))
}

/// Keeps the identifier usable as a single path component.
pub fn sanitize_subject_id(subject_id: &str) -> String {
    subject_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}

/// Top-level orchestrator: instructions, trial loop, closing screen.
pub struct ExperimentSession<P, T> {
    config: ExperimentConfig,
    session: Session,
    port: P,
    timer: T,
}

impl<P, T> ExperimentSession<P, T>
where
    P: RenderInputPort,
    T: Timer<Timestamp = u64>,
{
    pub fn new(config: ExperimentConfig, subject_id: impl Into<String>, port: P, timer: T) -> Self {
        let session = Session::new(subject_id, &config, Local::now());
        Self::with_session(config, session, port, timer)
    }

    pub fn with_session(config: ExperimentConfig, session: Session, port: P, timer: T) -> Self {
        Self {
            config,
            session,
            port,
            timer,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Runs to completion or cancellation. The recorder is closed and the
    /// port released on every path out.
    pub fn run(mut self) -> Result<SessionReport, SessionError> {
        info!(
            subject = %self.session.subject_id,
            experiment = %self.config.name,
            path = %self.session.output_path.display(),
            "session starting"
        );

        let mut recorder =
            match SessionRecorder::open(&self.session.output_path, self.config.design.columns()) {
                Ok(recorder) => recorder,
                Err(err) => {
                    self.port.release();
                    return Err(err.into());
                }
            };

        let driven = self.drive(&mut recorder);
        let closed = recorder.close();
        self.port.release();

        let (outcome, planned) = driven?;
        closed?;

        info!(
            ?outcome,
            recorded = self.session.trials_recorded,
            planned,
            "session finished"
        );
        Ok(SessionReport {
            outcome,
            planned,
            recorded: self.session.trials_recorded,
            output_path: self.session.output_path,
        })
    }

    fn drive(&mut self, recorder: &mut SessionRecorder) -> Result<(SessionOutcome, usize), SessionError> {
        if !self.await_begin()? {
            info!("cancelled on instruction screen");
            return Ok((SessionOutcome::Cancelled, 0));
        }

        let spec = self.config.design.spec();
        self.session.plan = match self.config.seed {
            Some(seed) => TrialPlan::seeded(&spec, seed),
            None => TrialPlan::from_entropy(&spec),
        };
        let planned = self.session.plan.len();
        info!(trials = planned, seed = ?self.config.seed, "trial plan generated");

        let fixation = self.config.fixation();
        while let Some(condition) = self.session.next_condition() {
            let machine = TrialMachine::new(self.config.design.modality_for(condition));
            let ctx = TrialContext {
                subject_id: &self.session.subject_id,
                trial_index: self.session.next_trial_index(),
            };
            let outcome = TrialRunner::new(&mut self.port, &self.timer, fixation, self.config.refresh_hz)
                .run(machine, ctx)?;

            match outcome {
                TrialOutcome::Completed {
                    record,
                    cancel_requested,
                } => {
                    recorder.append(&record)?;
                    info!(
                        trial = record.trial_index(),
                        %condition,
                        rt = record.reaction_time(),
                        "trial recorded"
                    );
                    self.session.record(&record);
                    if cancel_requested {
                        warn!(recorded = self.session.trials_recorded, "cancelled after trial");
                        return Ok((SessionOutcome::Cancelled, planned));
                    }
                }
                TrialOutcome::Cancelled => {
                    warn!(
                        trial = self.session.next_trial_index(),
                        recorded = self.session.trials_recorded,
                        "cancelled mid-trial, in-flight trial discarded"
                    );
                    return Ok((SessionOutcome::Cancelled, planned));
                }
            }
        }

        self.show_closing()?;
        Ok((SessionOutcome::Completed, planned))
    }

    /// Shows instructions until the subject begins. `false` on quit.
    fn await_begin(&mut self) -> Result<bool, PresentationError> {
        let screen = Stimulus::text(self.config.instructions.clone(), INSTRUCTION_TEXT_SIZE);
        loop {
            self.port.draw_stimulus(&screen)?;
            for event in self.port.poll_events()? {
                if event.is_cancel() {
                    return Ok(false);
                }
                if event.starts_session() {
                    return Ok(true);
                }
            }
            self.port.tick(self.config.refresh_hz);
        }
    }

    fn show_closing(&mut self) -> Result<(), PresentationError> {
        let screen = Stimulus::text(self.config.closing_message.clone(), CLOSING_TEXT_SIZE);
        self.port.draw_stimulus(&screen)?;
        self.timer.sleep(self.config.closing());
        Ok(())
    }
}
