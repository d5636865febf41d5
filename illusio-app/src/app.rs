use crate::port::WindowPort;
use anyhow::{Context, Result};
use illusio_experiment::{ExperimentConfig, ExperimentSession, SessionOutcome};
use illusio_timing::HighPrecisionTimer;
use std::io::{self, BufRead, Write};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// `RUST_LOG` wins; otherwise `info`.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

pub struct App {
    config: ExperimentConfig,
}

impl App {
    /// Applies `ILLUSIO_CONFIG` overrides on top of the preset.
    pub fn new(preset: ExperimentConfig) -> Result<Self> {
        let config = ExperimentConfig::load(preset).context("loading configuration")?;
        Ok(Self { config })
    }

    pub fn run(self) -> Result<()> {
        println!("=== {} ===", self.config.display.title.to_uppercase());
        println!("Platform: {}", std::env::consts::OS);
        println!("Architecture: {}", std::env::consts::ARCH);

        let subject_id = prompt_subject_id()?;

        let timer = HighPrecisionTimer::new();
        let port = WindowPort::open(&self.config.display, timer.clone())
            .context("opening experiment window")?;
        println!("Press SPACE to start or ESC to exit.\n");

        let report = ExperimentSession::new(self.config, subject_id, port, timer).run()?;

        match report.outcome {
            SessionOutcome::Completed => println!("\nExperiment completed."),
            SessionOutcome::Cancelled => println!(
                "\nExperiment stopped after {} of {} trials.",
                report.recorded, report.planned
            ),
        }
        println!("Data saved in: {}", report.output_path.display());
        Ok(())
    }
}

/// Accepts whatever is typed, including an empty line.
fn prompt_subject_id() -> Result<String> {
    print!("Enter subject identifier: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading subject identifier")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
