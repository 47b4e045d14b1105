//! picogpt binary: configuration from the environment, then the full
//! pipeline (load data, train, checkpoint, sample).

use picogpt::{config, pipeline};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::from_env()?;
    cfg.validate()?;
    pipeline::run(&cfg)
}
