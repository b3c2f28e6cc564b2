use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter};

use crate::{
    session::{
        finalizer::build_analysis_url, shutdown::detect_shutdown, Collaborators, EndReason,
        SessionConfig, SessionController, SessionReport, DEFAULT_POLL_INTERVAL,
        DEFAULT_SESSION_DURATION,
    },
    utils::{
        clock::DefaultClock,
        dir::create_application_default_path,
        logging::{enable_logging, SESSION_PREFIX},
        time::event_time,
    },
    window_api::{
        clipboard::GenericClipboard, keyboard::GenericKeySource, GenericWindowManager,
    },
};

#[derive(Parser, Debug)]
#[command(name = "pomodoro-logger", version, long_about = None)]
#[command(
    about = "Records keystrokes, clipboard and window activity for a pomodoro session",
    long_about = None
)]
pub struct Args {
    #[command(subcommand)]
    commands: Option<Commands>,
    #[arg(long, help = "Mirror application logs to the console")]
    log: bool,
    #[arg(long = "log-filter", help = "Application log level")]
    log_filter: Option<LevelFilter>,
    #[arg(
        long,
        help = "Application directory. By default $XDG_STATE_HOME/pomodoro-logger or $HOME/.local/state/pomodoro-logger"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Start a logging session. This is the default command")]
    Start {
        #[arg(
            long,
            short,
            help = "Session length in seconds",
            default_value_t = DEFAULT_SESSION_DURATION.as_secs()
        )]
        duration: u64,
        #[arg(
            long = "poll-interval",
            help = "Seconds between clipboard and window checks",
            default_value_t = DEFAULT_POLL_INTERVAL.as_secs(),
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        poll_interval: u64,
        #[arg(long, help = "Directory for session logs. By default <application dir>/sessions")]
        output: Option<PathBuf>,
    },
    #[command(about = "Print the analysis link for an existing session log")]
    Url { file: PathBuf },
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Start {
            duration: DEFAULT_SESSION_DURATION.as_secs(),
            poll_interval: DEFAULT_POLL_INTERVAL.as_secs(),
            output: None,
        }
    }
}

pub fn parse_args() -> Args {
    Args::parse()
}

/// Resolves the application directory and installs logging for the process.
pub fn prepare(args: &Args) -> Result<PathBuf> {
    let app_dir = args
        .dir
        .clone()
        .map_or_else(create_application_default_path, Ok)?;
    let level = if args.log && args.log_filter.is_none() {
        Some(LevelFilter::TRACE)
    } else {
        args.log_filter
    };
    enable_logging(SESSION_PREFIX, &app_dir.join("logs"), level, args.log)?;
    Ok(app_dir)
}

pub async fn run_cli(args: Args, app_dir: PathBuf) -> Result<()> {
    match args.commands.unwrap_or_default() {
        Commands::Start {
            duration,
            poll_interval,
            output,
        } => {
            let config = SessionConfig {
                session_duration: Duration::from_secs(duration),
                poll_interval: Duration::from_secs(poll_interval),
                output_directory: output.unwrap_or_else(|| sessions_dir(&app_dir)),
            };
            let report = start_session(config).await?;
            print_report(&report);
            Ok(())
        }
        Commands::Url { file } => {
            let log = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read session log {file:?}"))?;
            println!("{}", build_analysis_url(&log));
            Ok(())
        }
    }
}

pub fn sessions_dir(app_dir: &Path) -> PathBuf {
    app_dir.join("sessions")
}

fn describe_duration(duration: Duration) -> String {
    let seconds = duration.as_secs();
    if seconds >= 60 && seconds % 60 == 0 {
        format!("{}-minute", seconds / 60)
    } else {
        format!("{seconds}-second")
    }
}

async fn start_session(config: SessionConfig) -> Result<SessionReport> {
    let collaborators = Collaborators {
        windows: Box::new(GenericWindowManager::new()),
        clipboard: Box::new(GenericClipboard::new()),
        keys: Box::new(GenericKeySource::new()),
    };
    let cancel = CancellationToken::new();
    println!(
        "Starting {} pomodoro session... Press Ctrl+C to stop early.",
        describe_duration(config.session_duration)
    );
    info!("Writing session logs into {:?}", config.output_directory);
    let mut controller =
        SessionController::new(config, collaborators, cancel.clone(), Arc::new(DefaultClock));

    let ((), report) = tokio::join!(detect_shutdown(cancel.clone()), async {
        let report = controller.run().await;
        // Releases the interrupt listener.
        cancel.cancel();
        report
    });
    report
}

fn print_report(report: &SessionReport) {
    if report.ended_by == EndReason::Cancelled {
        println!("\nSession stopped early by user.");
    }
    println!(
        "Session complete (started {}). {} events logged to {}",
        event_time(&report.started_at),
        report.event_count,
        report.log_path.display()
    );
    println!("\nAI Studio URL (click to analyze your session):");
    println!("{}", report.analysis_url);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::Parser;

    use super::{describe_duration, Args, Commands};

    #[test]
    fn bare_invocation_starts_default_session() {
        let args = Args::try_parse_from(["pomodoro-logger"]).unwrap();

        match args.commands.unwrap_or_default() {
            Commands::Start {
                duration,
                poll_interval,
                output,
            } => {
                assert_eq!(duration, 1500);
                assert_eq!(poll_interval, 2);
                assert!(output.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn duration_can_be_overridden() {
        let args = Args::try_parse_from(["pomodoro-logger", "start", "--duration", "4"]).unwrap();

        assert!(matches!(
            args.commands,
            Some(Commands::Start { duration: 4, .. })
        ));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        assert!(
            Args::try_parse_from(["pomodoro-logger", "start", "--poll-interval", "0"]).is_err()
        );
    }

    #[test]
    fn durations_read_naturally() {
        assert_eq!(describe_duration(Duration::from_secs(1500)), "25-minute");
        assert_eq!(describe_duration(Duration::from_secs(4)), "4-second");
        assert_eq!(describe_duration(Duration::from_secs(90)), "90-second");
    }
}
