//! Trains the disaster message classifier and saves the fitted pipeline.

use std::path::PathBuf;

use disaster_tagger::config::TrainConfig;
use disaster_tagger::logging;
use disaster_tagger::training::run_training;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = match parse_args(std::env::args().skip(1).collect())? {
        Command::Usage => {
            println!("{}", help_text());
            return Ok(());
        }
        Command::Train(options) => options,
    };
    if let Err(err) = logging::init("disaster-tagger-train") {
        eprintln!("Logging disabled: {err}");
    }

    let mut config =
        TrainConfig::load_or_default(options.config.as_deref()).map_err(|err| err.to_string())?;
    if let Some(seed) = options.seed {
        config = config.with_seed(seed);
    }
    let summary = run_training(&options.database, &options.model_out, &config)
        .map_err(|err| err.to_string())?;
    tracing::info!(
        split_seed = summary.split_seed,
        forest_seed = ?summary.forest_seed,
        train_rows = summary.train_rows,
        test_rows = summary.test_rows,
        fingerprint = %summary.corpus_fingerprint,
        "Saved {}",
        summary.model_path.display()
    );
    Ok(())
}

#[derive(Debug, Clone)]
struct CliOptions {
    database: PathBuf,
    model_out: PathBuf,
    config: Option<PathBuf>,
    seed: Option<u64>,
}

#[derive(Debug)]
enum Command {
    Usage,
    Train(CliOptions),
}

fn parse_args(args: Vec<String>) -> Result<Command, String> {
    let mut positional = Vec::new();
    let mut config = None;
    let mut seed = None;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Ok(Command::Usage),
            "--config" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--config requires a value".to_string())?;
                config = Some(PathBuf::from(value));
            }
            "--seed" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--seed requires a value".to_string())?;
                seed = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("Invalid --seed value: {value}"))?,
                );
            }
            flag if flag.starts_with("--") => {
                return Err(format!("Unknown argument: {flag}\n\n{}", help_text()));
            }
            value => positional.push(PathBuf::from(value)),
        }
        idx += 1;
    }

    let [database, model_out]: [PathBuf; 2] = match positional.try_into() {
        Ok(paths) => paths,
        Err(_) => return Ok(Command::Usage),
    };
    Ok(Command::Train(CliOptions {
        database,
        model_out,
        config,
        seed,
    }))
}

fn help_text() -> String {
    [
        "Please provide the filepath of the disaster messages database as the first argument",
        "and the filepath of the model file to save the model to as the second argument.",
        "",
        "Usage:",
        "  disaster-tagger-train [--config <file>] [--seed <u64>] <database> <model>",
        "",
        "Example:",
        "  disaster-tagger-train ../data/DisasterResponse.db classifier.json",
        "",
        "Options:",
        "  --config <file>  Training config TOML (default: config.toml in the app directory).",
        "  --seed <u64>     Seed for the train/test split and the random forests.",
    ]
    .join("\n")
}
