use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use train_status::domain::LocationCode;
use train_status::monitor::{LogSubscriber, MonitorConfig, TrainMonitor};
use train_status::resilience::{BreakerState, ClientRegistry, Transition};
use train_status::rtt::{Route, RttClient, RttConfig};

/// Dependency name for the timetable API in the client registry.
const RTT_DEPENDENCY: &str = "rtt";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Get credentials from environment
    let username = std::env::var("RTT_USERNAME").unwrap_or_else(|_| {
        warn!("RTT_USERNAME not set, API calls will fail");
        String::new()
    });
    let password = std::env::var("RTT_PASSWORD").unwrap_or_else(|_| {
        warn!("RTT_PASSWORD not set, API calls will fail");
        String::new()
    });

    let route = match read_route() {
        Ok(route) => route,
        Err(message) => {
            error!("{message}");
            std::process::exit(2);
        }
    };

    let mut rtt_config = RttConfig::new(&username, &password);
    if let Ok(base_url) = std::env::var("RTT_BASE_URL") {
        rtt_config = rtt_config.with_base_url(base_url);
    }
    let rtt = match RttClient::new(rtt_config) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "failed to create timetable client");
            std::process::exit(1);
        }
    };

    let config = MonitorConfig::new(route);
    let registry = ClientRegistry::new(config.retry.clone(), config.breaker.clone());
    let client = registry.get_or_insert(RTT_DEPENDENCY);
    client.breaker().on_transition(|t: &Transition| {
        if t.to == BreakerState::Open {
            warn!(dependency = %t.dependency, "timetable API unavailable, reporting unknown status");
        }
    });

    let mut monitor = TrainMonitor::new(config, rtt, client);
    monitor.subscribe(LogSubscriber);
    let handle = monitor.spawn();

    info!(%route, "watching for status changes, Ctrl-C to stop");
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl-C");
    }

    handle.stop();
    handle.join().await;
    for (dependency, snapshot) in registry.snapshots() {
        info!(%dependency, ?snapshot, "final breaker state");
    }
}

fn read_route() -> Result<Route, String> {
    let code = |var: &str| -> Result<LocationCode, String> {
        let raw = std::env::var(var).map_err(|_| format!("{var} not set"))?;
        LocationCode::parse(&raw).map_err(|e| format!("{var}: {e}"))
    };
    Ok(Route::new(code("RTT_ORIGIN")?, code("RTT_DESTINATION")?))
}
