use crate::error::PresentationError;
use crate::port::RenderInputPort;
use crate::state::{Transition, TrialMachine};
use crate::trial::TrialContext;
use illusio_core::{InputEvent, Phase, TrialRecord};
use illusio_timing::{ReactionClock, Timer};
use std::time::Duration;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq)]
pub enum TrialOutcome {
    /// The trial finished. `cancel_requested` is set when a quit arrived in
    /// the same poll cycle after the finalizing event.
    Completed {
        record: TrialRecord,
        cancel_requested: bool,
    },
    /// Quit before the trial finished; nothing to record.
    Cancelled,
}

/// Drives one trial through fixation and response collection on a port.
pub struct TrialRunner<'a, P, T> {
    port: &'a mut P,
    timer: &'a T,
    fixation: Duration,
    refresh_hz: u32,
}

impl<'a, P, T> TrialRunner<'a, P, T>
where
    P: RenderInputPort,
    T: Timer<Timestamp = u64>,
{
    pub fn new(port: &'a mut P, timer: &'a T, fixation: Duration, refresh_hz: u32) -> Self {
        Self {
            port,
            timer,
            fixation,
            refresh_hz,
        }
    }

    pub fn run(
        &mut self,
        machine: TrialMachine,
        ctx: TrialContext<'_>,
    ) -> Result<TrialOutcome, PresentationError> {
        debug!(
            trial = ctx.trial_index,
            condition = %machine.modality().condition(),
            "fixation"
        );
        self.port.draw_fixation()?;
        self.timer.sleep(self.fixation);

        // Input queued during fixation is dropped; only a quit survives it.
        let queued = self.port.poll_events()?;
        if queued.iter().any(InputEvent::is_cancel) {
            return Ok(TrialOutcome::Cancelled);
        }
        if !queued.is_empty() {
            trace!(dropped = queued.len(), "discarding input received during fixation");
        }

        let mut machine = machine.fixation_elapsed();
        let mut clock = ReactionClock::new();

        loop {
            self.port.draw_stimulus(&machine.stimulus())?;
            if machine.phase().charges_reaction_time() {
                clock.mark_onset(self.timer.now());
            }

            let mut events = self.port.poll_events()?.into_iter();
            for event in events.by_ref() {
                match machine.on_event(event) {
                    Transition::Pending(next) => machine = next,
                    Transition::Cancelled => return Ok(TrialOutcome::Cancelled),
                    Transition::Finalized(response) => {
                        let rt = clock.reaction_time(self.timer.now());
                        let cancel_requested = events.any(|e| e.is_cancel());
                        return Ok(TrialOutcome::Completed {
                            record: response.into_record(ctx, rt),
                            cancel_requested,
                        });
                    }
                }
            }

            self.port.tick(self.refresh_hz);
        }
    }
}
