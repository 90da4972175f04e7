// botd-logs - lines up bot-detection telemetry with the web access log
//
// This is the main entry point. Parses CLI args, resolves configuration and
// dispatches to handlers.

use anyhow::Context;
use botd_logs_lib::{
    telemetry::{TelemetryRecorder, BOT_FIELDS},
    BotdError, Config, LogAligner,
};
use clap::{Args, Parser, Subcommand};
use std::env;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "botd-logs",
    version,
    about = "Merge bot-detection telemetry into the web access log"
)]
struct Cli {
    /// Config file (takes precedence over BOTD_CONFIG and ~/.botd/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the combined log: one row per access-log row, telemetry attached
    Combine(CombineArgs),

    /// Append one telemetry payload (JSON) to the bot-detections file
    Record {
        /// Bot-detections file to append to
        #[arg(long)]
        bot: Option<PathBuf>,

        /// Payload file; reads stdin when omitted
        file: Option<PathBuf>,
    },

    /// Print the bot-detection columns, one per line
    Fields,

    /// Print the resolved configuration as TOML
    Config,
}

#[derive(Args, Debug)]
struct CombineArgs {
    /// Web access log
    #[arg(long)]
    access: Option<PathBuf>,

    /// Bot-detection log
    #[arg(long)]
    bot: Option<PathBuf>,

    /// Combined output (truncated on every run)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Request substring that marks a telemetry POST
    #[arg(long)]
    marker: Option<String>,

    /// Print the run summary as JSON instead of text
    #[arg(long)]
    json: bool,
}

/// Logs go to stderr so `fields` and `config` output stays clean
fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "botd_logs=info,botd_logs_lib=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Library errors carry a friendlier message than the raw chain
            match err.downcast_ref::<BotdError>() {
                Some(botd) => eprintln!("Error: {}", botd.user_message()),
                None => eprintln!("Error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Combine(args) => handle_combine(config, args),
        Command::Record { bot, file } => handle_record(config, bot, file),
        Command::Fields => {
            for field in BOT_FIELDS {
                println!("{}", field);
            }
            Ok(())
        }
        Command::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn load_config(explicit: Option<&PathBuf>) -> anyhow::Result<Config> {
    match explicit {
        Some(path) => {
            let mut config = Config::from_file(path)?;
            config.apply_env(|key| env::var(key).ok());
            Ok(config)
        }
        None => Ok(Config::load()?),
    }
}

fn handle_combine(mut config: Config, args: CombineArgs) -> anyhow::Result<()> {
    // Flags beat file and environment
    if let Some(access) = args.access {
        config.paths.access_log_path = access;
    }
    if let Some(bot) = args.bot {
        config.paths.bot_detections_path = bot;
    }
    if let Some(out) = args.out {
        config.paths.combined_log_path = out;
    }
    if let Some(marker) = args.marker {
        config.post_marker = marker;
    }

    let aligner = LogAligner::from_config(&config)?;
    let report = aligner.run(&config.paths)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\nCombined log written to {}", config.paths.combined_log_path.display());
    println!("{}", "=".repeat(60));
    println!("  Access rows:        {}", report.access_rows);
    println!("  Realigned:          {}", report.realigned_rows);
    println!("  Malformed:          {}", report.malformed_rows);
    println!("  Telemetry POSTs:    {}", report.bot_posts);
    println!("  Paired:             {}", report.paired_rows);
    println!("  Without telemetry:  {}", report.exhausted_rows);
    println!("  Unused bot records: {}", report.unconsumed_bot_records);
    println!("  Width mismatches:   {}", report.width_mismatches);
    println!("{}", "=".repeat(60));

    if report.out_of_sync() {
        println!("\nNote: the two logs did not pair up one-to-one.");
        println!("Telemetry on rows after the first gap may belong to a neighbouring request.");
    }

    Ok(())
}

fn handle_record(
    config: Config,
    bot: Option<PathBuf>,
    file: Option<PathBuf>,
) -> anyhow::Result<()> {
    let path = bot.unwrap_or(config.paths.bot_detections_path);

    let text = match file {
        Some(file) => std::fs::read_to_string(&file)
            .with_context(|| format!("reading payload from {}", file.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading payload from stdin")?;
            buf
        }
    };

    let recorder = TelemetryRecorder::new(path);
    recorder.record_json(&text)?;
    println!("Recorded telemetry to {}", recorder.path().display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_combine_flags_parse() {
        let cli = Cli::try_parse_from([
            "botd-logs",
            "combine",
            "--access",
            "a.csv",
            "--marker",
            "POST /collect",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Command::Combine(args) => {
                assert_eq!(args.access, Some(PathBuf::from("a.csv")));
                assert_eq!(args.marker.as_deref(), Some("POST /collect"));
                assert!(args.json);
                assert!(args.out.is_none());
            }
            other => panic!("Expected combine, got {:?}", other),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["botd-logs", "fields", "--config", "/etc/botd.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/botd.toml")));
        assert!(matches!(cli.command, Command::Fields));
    }
}
