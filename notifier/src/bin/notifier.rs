//! Headless notifier binary.
//!
//! Polls the followed channels, logs notifications, and takes commands on
//! stdin. Press Ctrl+C (or type `quit`) to stop.

use tracing_subscriber::EnvFilter;

use twitch_client::api::KrakenClient;
use twitch_notifier_lib::app::Controller;
use twitch_notifier_lib::assets::HttpLogoFetcher;
use twitch_notifier_lib::console;
use twitch_notifier_lib::notification::LogSink;
use twitch_notifier_lib::presentation::ConsolePresentation;
use twitch_notifier_lib::reconciler::{ReconcilerSettings, StateReconciler};
use twitch_notifier_lib::shutdown::{SHUTDOWN_TIMEOUT, graceful_shutdown};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Step 1: Tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level())),
        )
        .init();

    tracing::info!("Starting Twitch notifier (headless mode)");

    // Step 2: Settings
    let config = twitch_notifier_lib::init_foundation()?;

    // Step 3: Controller
    let mut client =
        KrakenClient::new(config.client_id.clone()).with_base_url(&config.api_base_url);
    if let Some(token) = &config.oauth_token {
        client.set_oauth_token(token);
    }

    let reconciler = StateReconciler::new(
        client,
        ConsolePresentation::new(),
        ReconcilerSettings::from(&config),
    );
    let mut controller = Controller::new(
        reconciler,
        LogSink::new(config.notification_display),
        HttpLogoFetcher::new(),
    );
    let scheduler = controller.scheduler();

    let mut controller_handle = tokio::spawn(async move { controller.run().await });

    // Step 4: Console input
    console::spawn_stdin(scheduler.clone());

    tracing::info!("Notifier running. Type 'help' for commands, Ctrl+C to stop.");

    let finished = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            None
        }
        finished = &mut controller_handle => Some(finished),
    };

    match finished {
        Some(finished) => finished??,
        None => {
            tracing::info!("Shutting down...");
            let stopped = graceful_shutdown(&scheduler, controller_handle, SHUTDOWN_TIMEOUT).await;
            if let Some(result) = stopped {
                result?;
            }
        }
    }
    Ok(())
}

/// `DEBUG_OUTPUT` is read straight from the environment here since the
/// subscriber has to exist before settings are loaded and logged.
fn default_level() -> &'static str {
    let _ = dotenvy::dotenv();
    match std::env::var("DEBUG_OUTPUT").as_deref() {
        Ok("true") => "debug",
        _ => "info",
    }
}
