mod analyzer;
mod config;
mod display;
mod fetcher;
mod model;
mod utils;

use analyzer::{Analyzer, AnalyzerImpl};
use chrono::{DateTime, Utc};
use config::{load_config, AppConfig, ConfigSource};
use display::{Frame, TerminalDisplay};
use fetcher::{BtcSource, MarketDataSource, StooqTechSource};
use model::{FetchError, WindowReport};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::{sleep, Duration};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};

/// Result of one successful polling cycle.
struct CycleSnapshot {
    current_price: f64,
    updated_at: DateTime<Utc>,
    reports: BTreeMap<u32, WindowReport>,
    tech_changes: HashMap<u32, Option<f64>>,
}

enum Wake {
    Timer,
    Shutdown,
}

#[tokio::main]
async fn main() {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".into());

    // Load configuration before logging so the level can come from it
    let (config, config_source) = match load_config(&config_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Config load error: {}", e);
            return;
        }
    };

    // Logs go to stderr, stdout belongs to the screen
    let level = config.log_level.parse::<LevelFilter>().unwrap_or(LevelFilter::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if config_source == ConfigSource::Defaults {
        info!("No {} found, using built-in defaults", config_path);
    }

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        error!("😱 Panic occurred: {}", panic_info);
    }));

    let client = match fetcher::build_client(&config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            return;
        }
    };

    let btc = fetcher::btc_source(client.clone(), &config);
    let tech = fetcher::tech_source(client, &config);
    let analyzer = AnalyzerImpl::new(&config);
    let mut display = TerminalDisplay::new(
        config.app_title.clone(),
        tech.symbol().to_string(),
        config.display_utc_offset_hours,
        config.refresh_interval_seconds,
    );

    // Ctrl-C is latched so it is not lost while a cycle is running
    let shutdown = Arc::new(Notify::new());
    spawn_ctrl_c_listener(shutdown.clone());

    info!(
        "Starting with windows {:?}, refresh every {}s",
        config.windows, config.refresh_interval_seconds
    );
    display.hide_cursor();

    // Main polling loop
    loop {
        display.render_loading();

        let wait = match run_cycle(&config, &btc, &tech, &analyzer).await {
            Ok(snapshot) => {
                display.render(&Frame {
                    current_price: snapshot.current_price,
                    updated_at: snapshot.updated_at,
                    reports: &snapshot.reports,
                    tech_changes: &snapshot.tech_changes,
                });
                config.refresh_interval_seconds
            }
            Err(e) => {
                warn!("Cycle failed: {}", e);
                display.show_cursor();
                display.render_error(&e.to_string(), config.retry_interval_seconds);
                config.retry_interval_seconds
            }
        };

        match wait_for_next_cycle(wait, &shutdown).await {
            Wake::Timer => {
                display.hide_cursor();
                debug!("Timer triggered.");
            }
            Wake::Shutdown => break,
        }
    }

    display.show_cursor();
    display.render_goodbye();
    info!("Shutting down");
}

/// Fetches, splits and analyses once. Only a failure to get BTC prices is an
/// error; the tech index is optional.
async fn run_cycle(
    config: &AppConfig,
    btc: &BtcSource,
    tech: &StooqTechSource,
    analyzer: &AnalyzerImpl,
) -> Result<CycleSnapshot, FetchError> {
    let max_days = config.max_window_days();
    info!("Fetching {} days of BTC prices...", max_days);

    let (series, tech_changes) = futures::join!(
        btc.fetch(max_days),
        tech.get_period_changes(&config.windows)
    );
    let series = series?;

    let tech_changes = tech_changes.unwrap_or_else(|e| {
        warn!("Tech index unavailable: {}", e);
        HashMap::new()
    });

    let current_price = series
        .last()
        .map(|p| p.price)
        .ok_or(FetchError::Empty("price history"))?;

    // One reference instant for every window of this cycle
    let now = Utc::now();
    let reports = analyzer.analyze_series(&series, now);

    info!(
        "Analysed {} points ({}s sampling): {}/{} windows, price {:.2}",
        series.len(),
        series.sampling_period().num_seconds(),
        reports.len(),
        config.windows.len(),
        current_price
    );

    Ok(CycleSnapshot {
        current_price,
        updated_at: now,
        reports,
        tech_changes,
    })
}

async fn wait_for_next_cycle(seconds: u64, shutdown: &Notify) -> Wake {
    info!("Waiting for timer ({}s) or Ctrl-C...", seconds);
    tokio::select! {
        _ = sleep(Duration::from_secs(seconds)) => Wake::Timer,
        _ = shutdown.notified() => Wake::Shutdown,
    }
}

fn spawn_ctrl_c_listener(shutdown: Arc<Notify>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received.");
                shutdown.notify_one();
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });
}
