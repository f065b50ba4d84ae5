use budget_tracker::ai::{self, Generator, Unavailable};
use budget_tracker::args::{Args, Command};
use budget_tracker::render::Palette;
use budget_tracker::session::Session;
use budget_tracker::{commands, Config, Mode, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;
use tokio::io::BufReader;
use tracing::{debug, error, trace, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let common = args.common();
    let home = common.home().path();
    let theme = common.theme();
    let palette = Palette::new(theme, std::io::stdout().is_terminal());

    // The hidden --test-mode flag answers AI requests with canned replies so that the whole
    // program can be exercised without a Gemini API key.
    let mode = if common.test_mode() {
        Mode::Testing
    } else {
        Mode::Gemini
    };

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init => commands::init(home).await?.print(),

        Command::List(list_args) => {
            commands::list(Config::load(home).await?, list_args.filter(), palette)
                .await?
                .print()
        }

        Command::Summary => commands::summary(Config::load(home).await?, palette)
            .await?
            .print(),

        Command::Add(add_args) => commands::add(Config::load(home).await?, add_args.clone())
            .await?
            .print(),

        Command::Delete(delete_args) => {
            commands::delete(Config::load(home).await?, delete_args.id())
                .await?
                .print()
        }

        Command::SmartAdd(smart_args) => {
            let config = Config::load(home).await?;
            let generator = ai::generator(&config, common.api_key(), mode)?;
            let mut input = BufReader::new(tokio::io::stdin());
            let mut out = std::io::stdout();
            commands::smart_add(
                config,
                generator,
                smart_args,
                theme,
                palette,
                &mut input,
                &mut out,
            )
            .await?
            .print()
        }

        Command::Insights => {
            let config = Config::load(home).await?;
            let generator = ai::generator(&config, common.api_key(), mode)?;
            commands::insights(config, generator, theme, palette)
                .await?
                .print()
        }

        Command::Shell => {
            let config = Config::load(home).await?;
            // The shell is useful without the AI features, so a missing key only disables them.
            let generator: Box<dyn Generator> = match ai::generator(&config, common.api_key(), mode)
            {
                Ok(generator) => generator,
                Err(e) => {
                    warn!("Smart add and insights are unavailable: {e:#}");
                    Box::new(Unavailable::new(format!("{e:#}")))
                }
            };
            let session = Session::load(&config, generator, theme).await;
            let input = BufReader::new(tokio::io::stdin());
            let colour = std::io::stdout().is_terminal();
            commands::shell(session, input, &mut std::io::stdout(), colour)
                .await?
                .print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                "budget_tracker",
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
