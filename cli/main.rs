#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

use clap::{Args, CommandFactory, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;

use gradecast::app::{self, AppState};
use gradecast::batch::infer_csv;
use gradecast::config::{DEFAULT_MODEL_PATH, ServerConfig, ServerConfigFile};
use gradecast::context::ServingContext;

#[derive(Parser)]
#[command(
    name = "gradecast",
    about = "Serve a pre-trained regression model behind a minimal web form",
    long_about = "Loads a fitted regression model and its feature list from a TOML artifact, \
                 then answers form submissions with a prediction, an ensemble spread when the \
                 model is an ensemble, and ranked feature importances when it has them."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Path to the model artifact (.toml). Overrides the config file.
    #[arg(long, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:5000. Overrides the config file.
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,

    /// Optional TOML file with `model_path`, `bind` and `title` keys
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct InspectArgs {
    /// Path to the model artifact (.toml)
    #[arg(long, value_name = "PATH", default_value = DEFAULT_MODEL_PATH)]
    pub model: PathBuf,
}

#[derive(Args)]
pub struct InferArgs {
    /// CSV file whose header names the feature columns
    pub rows: PathBuf,

    /// Path to the model artifact (.toml)
    #[arg(long, value_name = "PATH", default_value = DEFAULT_MODEL_PATH)]
    pub model: PathBuf,

    /// Where to write the predictions
    #[arg(long, value_name = "PATH", default_value = "predictions.tsv")]
    pub output: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the prediction form over HTTP
    #[command(about = "Serve the prediction web form")]
    Serve(ServeArgs),

    /// Print the feature schema and model summary of an artifact
    #[command(about = "Describe a model artifact")]
    Inspect(InspectArgs),

    /// Predict every row of a CSV file
    #[command(about = "Apply the model to a CSV file (outputs: predictions.tsv)")]
    Infer(InferArgs),

    /// Display version and build information
    #[command(about = "Display version and build information")]
    Version,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Cli { command } = Cli::parse();

    let result = match command {
        Some(Commands::Serve(args)) => serve(args),
        Some(Commands::Inspect(args)) => inspect(args),
        Some(Commands::Infer(args)) => infer(args),
        Some(Commands::Version) => {
            print_version_info();
            Ok(())
        }
        None => print_usage(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

pub fn serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let file = args
        .config
        .as_deref()
        .map(ServerConfigFile::load)
        .transpose()?;
    let config = ServerConfig::resolve(file, args.model, args.bind);

    // The artifact is loaded before the listener exists, so a bad artifact
    // means nothing is ever served.
    let context = ServingContext::load(&config.model_path)?;
    let state = AppState::new(context, &config.title);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(app::serve(config.bind, state))?;
    Ok(())
}

pub fn inspect(args: InspectArgs) -> Result<(), Box<dyn std::error::Error>> {
    let context = ServingContext::load(&args.model)?;
    let schema = context.schema();
    let model = context.model();

    println!("Model kind: {}", model.kind());
    match model.ensemble() {
        Some(members) => println!("Ensemble members: {}", members.len()),
        None => println!("Ensemble members: none (no uncertainty estimate)"),
    }

    println!("Features ({}):", schema.len());
    for (i, name) in schema.names().enumerate() {
        println!("  {:>3}. {name}", i + 1);
    }

    let booleans: Vec<&str> = schema.boolean_names().collect();
    if booleans.is_empty() {
        println!("Checkbox features: none");
    } else {
        println!("Checkbox features: {}", booleans.join(", "));
    }

    match context.importances() {
        Some(importances) => {
            println!("Feature importances:");
            for entry in importances {
                println!("  {:<24} {:.4}", entry.name, entry.weight);
            }
        }
        None => println!("Feature importances: not available"),
    }

    Ok(())
}

pub fn infer(args: InferArgs) -> Result<(), Box<dyn std::error::Error>> {
    let context = ServingContext::load(&args.model)?;
    println!("Loading rows from: {}", args.rows.display());
    let summary = infer_csv(&context, &args.rows, &args.output)?;
    if summary.failed > 0 {
        println!(
            "{} of {} rows could not be predicted (written as NA)",
            summary.failed, summary.rows
        );
    }
    println!("Predictions saved to: {}", args.output.display());
    Ok(())
}

fn print_usage() -> Result<(), Box<dyn std::error::Error>> {
    Cli::command().print_help()?;
    println!();
    Ok(())
}

fn print_version_info() {
    let version = env!("CARGO_PKG_VERSION");
    let build_timestamp: u64 = env!("GRADECAST_BUILD_TIMESTAMP").parse().unwrap_or(0);

    println!("gradecast {version}");

    if build_timestamp > 0 {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        if now > build_timestamp {
            println!("Built: {}", format_duration_ago(now - build_timestamp));
        } else {
            println!("Built: just now");
        }
    }
}

/// Format seconds into a human-readable duration like "2.4 hours ago"
fn format_duration_ago(seconds: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;
    const YEAR: u64 = 365 * DAY;

    if seconds < MINUTE {
        format!("{seconds} seconds ago")
    } else if seconds < HOUR {
        format!("{:.1} minutes ago", seconds as f64 / MINUTE as f64)
    } else if seconds < DAY {
        format!("{:.1} hours ago", seconds as f64 / HOUR as f64)
    } else if seconds < YEAR {
        format!("{:.1} days ago", seconds as f64 / DAY as f64)
    } else {
        format!("{:.1} years ago", seconds as f64 / YEAR as f64)
    }
}
