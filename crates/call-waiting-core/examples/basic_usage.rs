//! Basic usage of call-waiting-core
//!
//! Runs a single phone through carrier provisioning, a user toggle, a SIM
//! removal and a restart against a JSON preference file.
//!
//! ```text
//! cargo run -p call-waiting-core --example basic_usage -- /tmp/call_waiting.json
//! ```

use call_waiting_core::logging::setup_logging;
use call_waiting_core::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let store_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("call_waiting_demo.json"));

    let config = CallWaitingConfig::from_env()?.with_store_path(&store_path);
    setup_logging(&config.logging)?;

    let sub = SubscriptionId(1);
    let phone = Arc::new(PhoneLine::new(PhoneId(0), sub));
    let configs = Arc::new(InMemoryCarrierConfigSource::new());
    let broadcaster = Arc::new(CarrierConfigBroadcaster::new());
    configs.set_config(sub, CarrierConfig::terminal_based(true));

    let collaborators = Collaborators {
        phone: phone.clone(),
        store: config.open_store()?,
        carrier_configs: configs.clone(),
        notifier: broadcaster.clone(),
    };
    let handle = CallWaitingService::spawn(collaborators, &config);

    handle.set_terminal_based_call_waiting_supported(true).await?;
    info!("After provisioning: {}", handle.terminal_based_state().await?);

    if handle.set_call_waiting(false, ServiceClass::VOICE).await? {
        info!("User turned call waiting off locally");
    }
    match handle.get_call_waiting().await? {
        Some(status) => info!(
            "Interrogation answered locally: state={}, service_class={}",
            status.state,
            status.service_class.bits()
        ),
        None => info!("Interrogation must go to the network"),
    }

    phone.set_sub_id(SubscriptionId::INVALID);
    broadcaster.notify(CarrierConfigChanged::for_slot(PhoneId(0)));
    info!("SIM removed: {}", handle.terminal_based_state().await?);

    handle.shutdown().await?;

    // Restart over the same preference file
    phone.set_sub_id(sub);
    let handle = CallWaitingService::spawn(
        Collaborators {
            phone: phone.clone(),
            store: config.open_store()?,
            carrier_configs: configs,
            notifier: broadcaster,
        },
        &config,
    );
    handle.set_terminal_based_call_waiting_supported(true).await?;
    info!(
        "After restart: {} (record in {})",
        handle.terminal_based_state().await?,
        store_path.display()
    );
    handle.shutdown().await?;

    Ok(())
}
