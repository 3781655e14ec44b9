use std::env;

use anyhow::Context;
use log::info;

use learned_index::config::HarnessConfig;

const DEFAULT_PRESET: &str = "linear";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let arg = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_PRESET.to_string());

    let config = match HarnessConfig::preset(&arg) {
        Some(config) => config,
        None => HarnessConfig::from_path(&arg)
            .with_context(|| format!("'{arg}' is neither a preset nor a valid config file"))?,
    };

    let evaluation = learned_index::run(&config)?;

    for p in evaluation.predictions() {
        println!("{:.0}, {:.0}, {:.0}", p.key, p.position, p.predicted);
    }

    info!(
        spearman = evaluation.spearman(),
        mean_abs_error = evaluation.mean_abs_error(),
        max_abs_error = evaluation.max_abs_error();
        "evaluated {} keys",
        evaluation.len()
    );

    Ok(())
}
