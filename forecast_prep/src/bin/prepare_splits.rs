use forecast_prep::config::ExperimentConfig;
use forecast_prep::pipeline::Experiment;
use std::env;
use std::fs;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("forecast_prep=info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let Some(config_path) = args.get(1) else {
        eprintln!("usage: prepare_splits <experiment.json>");
        std::process::exit(2);
    };

    let config = ExperimentConfig::from_json_file(config_path)?;
    let mut experiment = Experiment::new(config)?;
    let config = experiment.config().clone();

    let table = experiment.load_table()?;
    info!(path = %config.data_path.display(), rows = table.len(), "loaded table");

    for (entity, step) in table.validate_frequency()? {
        info!(%entity, step_seconds = step.num_seconds(), "frequency");
    }

    let prepared = experiment.prepare(&table)?;
    let raw = &prepared.raw_splits;
    fs::create_dir_all(&config.output_dir)?;
    raw.train.write_csv(config.output_dir.join("train.csv"))?;
    raw.valid.write_csv(config.output_dir.join("valid.csv"))?;
    raw.test.write_csv(config.output_dir.join("test.csv"))?;
    info!(dir = %config.output_dir.display(), "wrote split tables");

    info!(
        train = prepared.train_windows.len(),
        valid = prepared.valid_windows.len(),
        test = prepared.test_windows.len(),
        few_shot = prepared.few_shot_indices.as_ref().map(|s| s.len()),
        "prepared forecast windows"
    );

    let model_config = experiment.model_config();
    println!("{}", serde_json::to_string_pretty(&model_config)?);

    Ok(())
}
