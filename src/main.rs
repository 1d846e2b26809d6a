use std::{
    path::{
        Path,
        PathBuf,
    },
    process::ExitCode,
    sync::Arc,
    time::Duration,
};

use clap::{
    Parser,
    Subcommand,
};
use duosync::{
    anki::{
        self,
        AnkiClient,
    },
    core::{
        config::CONFIG_FILE,
        Config,
        DuoSyncError,
    },
    export::to_tsv,
    page::SnapshotPage,
    persistence,
    session::{
        ConsoleNotifier,
        Driver,
        Phase,
    },
    websocket::{
        BridgeNotifier,
        BridgeServer,
    },
};
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "duosync", about = "Sync Duolingo sentences to Anki", version)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the browser bridge and watch the lesson
    Serve {
        /// Anki deck to add notes to
        #[arg(long)]
        deck: Option<String>,
        /// Only extract on the manual trigger
        #[arg(long)]
        no_auto: bool,
        /// Show results without asking to continue
        #[arg(long)]
        no_confirm: bool,
        /// Log results instead of showing them in the browser
        #[arg(long)]
        quiet: bool,
    },

    /// Extract once from a saved page
    Extract {
        /// HTML snapshot of the page
        snapshot: PathBuf,
        #[arg(long)]
        deck: Option<String>,
        /// Print the TSV without contacting Anki
        #[arg(long)]
        no_sync: bool,
    },

    /// Check that AnkiConnect answers
    Check,

    /// Write config.json with the current settings
    Init,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::load();
    init_logging(cli.verbose || config.verbose_logging);

    let result = match cli.command {
        Command::Serve { deck, no_auto, no_confirm, quiet } => {
            let config = Config {
                deck_name: deck.unwrap_or(config.deck_name),
                auto_run: config.auto_run && !no_auto,
                confirm_continue: config.confirm_continue && !no_confirm,
                notify_on_result: config.notify_on_result && !quiet,
                ..config
            };
            serve(config).await
        }
        Command::Extract { snapshot, deck, no_sync } => {
            let config = Config {
                deck_name: deck.unwrap_or(config.deck_name),
                auto_run: false,
                confirm_continue: false,
                ..config
            };
            extract_snapshot(config, &snapshot, no_sync).await
        }
        Command::Check => check(&config).await,
        Command::Init => persistence::save_json(&config, CONFIG_FILE).map(|path| {
            println!("Configuration written to {}", path.display());
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn serve(config: Config) -> Result<(), DuoSyncError> {
    let page = Arc::new(SnapshotPage::empty());
    let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
    let server = BridgeServer::new(page.clone(), trigger_tx);
    let listener = BridgeServer::bind(&config.bridge_addr).await?;
    let _click_forwarder = server.forward_clicks();

    let service = Arc::new(AnkiClient::new(&config.anki_url)?);
    if !anki::wait_awake(service.as_ref(), Duration::from_secs(2), 3).await {
        log::warn!(
            "AnkiConnect is not reachable at {}; sentences will only be exported",
            config.anki_url
        );
    }

    let notifier = Arc::new(BridgeNotifier::new(server.clone(), config.confirm_timeout()));
    let driver = Arc::new(Driver::new(config, page, service, notifier));
    let shutdown = driver.shutdown_handle();
    let session = tokio::spawn({
        let driver = driver.clone();
        async move { driver.run(trigger_rx).await }
    });

    let served = tokio::select! {
        result = server.serve(listener) => result,
        _ = tokio::signal::ctrl_c() => {
            log::info!("Shutting down");
            Ok(())
        }
    };

    shutdown.shutdown();
    session.await.map_err(|e| DuoSyncError::Custom(format!("Session task failed: {}", e)))?;
    served
}

async fn extract_snapshot(config: Config, path: &Path, no_sync: bool) -> Result<(), DuoSyncError> {
    let html = std::fs::read_to_string(path)?;
    let page = Arc::new(SnapshotPage::new(html));
    let service = Arc::new(AnkiClient::new(&config.anki_url)?);
    let driver = Driver::new(config, page, service, Arc::new(ConsoleNotifier::new(false)));

    if no_sync {
        let (state, pairs) = driver.extract_current().await?;
        log::info!("Read {} pairs from the {} screen", pairs.len(), state);
        println!("{}", to_tsv(&pairs));
    } else {
        driver.manual_trigger(Phase::Idle).await;
    }
    Ok(())
}

async fn check(config: &Config) -> Result<(), DuoSyncError> {
    let client = AnkiClient::new(&config.anki_url)?;
    if !client.is_reachable().await {
        println!("AnkiConnect is not reachable at {}", client.base_url());
        return Err(DuoSyncError::ServiceUnreachable(client.base_url().to_string()));
    }

    let version = client.version().await?;
    println!("AnkiConnect v{} is reachable at {}", version, client.base_url());
    Ok(())
}
