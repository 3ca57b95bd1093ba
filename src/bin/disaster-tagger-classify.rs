//! Classifies messages with a saved disaster message model.

use std::path::PathBuf;

use disaster_tagger::logging;
use disaster_tagger::ml::persist::load_saved_model;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    if let Err(err) = logging::init("disaster-tagger-classify") {
        eprintln!("Logging disabled: {err}");
    }
    let saved = load_saved_model(&options.model).map_err(|err| err.to_string())?;
    if let Some(training) = &saved.training {
        eprintln!(
            "model v{} trained on {} rows (split seed {})",
            saved.crate_version, training.train_rows, training.split_seed
        );
    }

    let pipeline = &saved.pipeline;
    let predicted = pipeline
        .predict(&options.messages)
        .map_err(|err| err.to_string())?;
    let probabilities = if options.show_probabilities {
        Some(
            pipeline
                .predict_proba(&options.messages)
                .map_err(|err| err.to_string())?,
        )
    } else {
        None
    };

    for (row, message) in options.messages.iter().enumerate() {
        println!("{message}");
        let mut any = false;
        for (column, category) in pipeline.categories().iter().enumerate() {
            if predicted[[row, column]] == 0 {
                continue;
            }
            any = true;
            match &probabilities {
                Some(proba) => println!("  {category} ({:.2})", proba[[row, column]]),
                None => println!("  {category}"),
            }
        }
        if !any {
            println!("  (no categories)");
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct CliOptions {
    model: PathBuf,
    messages: Vec<String>,
    show_probabilities: bool,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut show_probabilities = false;
    let mut positional = Vec::new();
    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--proba" => show_probabilities = true,
            flag if flag.starts_with("--") => {
                return Err(format!("Unknown argument: {flag}\n\n{}", help_text()));
            }
            _ => positional.push(arg),
        }
    }
    if positional.len() < 2 {
        return Err(help_text());
    }
    let messages = positional.split_off(1);
    let model = PathBuf::from(positional.remove(0));
    Ok(CliOptions {
        model,
        messages,
        show_probabilities,
    })
}

fn help_text() -> String {
    [
        "disaster-tagger-classify",
        "",
        "Prints the categories a saved model predicts for each message.",
        "",
        "Usage:",
        "  disaster-tagger-classify [--proba] <model> <message>...",
        "",
        "Options:",
        "  --proba  Show the positive-class probability next to each category.",
    ]
    .join("\n")
}
