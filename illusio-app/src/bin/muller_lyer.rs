use illusio_app::{init_tracing, App};
use illusio_experiment::ExperimentConfig;

fn main() -> anyhow::Result<()> {
    init_tracing();
    App::new(ExperimentConfig::muller_lyer())?.run()
}
