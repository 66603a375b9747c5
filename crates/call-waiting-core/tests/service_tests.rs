//! Tests for the per-phone call waiting service

use call_waiting_core::prelude::*;
use call_waiting_core::service::Command;
use call_waiting_core::store::{DEFAULT_PREFERENCE_GROUP, PreferenceKey};
use std::sync::Arc;
use std::time::Duration;

struct Setup {
    phone: Arc<PhoneLine>,
    store: Arc<MemoryPreferenceStore>,
    configs: Arc<InMemoryCarrierConfigSource>,
    broadcaster: Arc<CarrierConfigBroadcaster>,
}

impl Setup {
    fn new(phone_id: i32, sub_id: i32) -> Self {
        Self {
            phone: Arc::new(PhoneLine::new(PhoneId(phone_id), SubscriptionId(sub_id))),
            store: Arc::new(MemoryPreferenceStore::new()),
            configs: Arc::new(InMemoryCarrierConfigSource::new()),
            broadcaster: Arc::new(CarrierConfigBroadcaster::new()),
        }
    }

    fn collaborators(&self) -> Collaborators {
        Collaborators {
            phone: self.phone.clone(),
            store: self.store.clone(),
            carrier_configs: self.configs.clone(),
            notifier: self.broadcaster.clone(),
        }
    }

    fn spawn(&self) -> CallWaitingHandle {
        CallWaitingService::spawn(self.collaborators(), &CallWaitingConfig::default())
    }
}

#[tokio::test]
async fn test_service_round_trip() {
    let setup = Setup::new(0, 1);
    setup
        .configs
        .set_config(SubscriptionId(1), CarrierConfig::terminal_based(false));
    let handle = setup.spawn();

    assert_eq!(handle.terminal_based_state().await.unwrap(), CallWaitingState::NotSupported);
    assert_eq!(handle.get_call_waiting().await.unwrap(), None);

    handle.set_terminal_based_call_waiting_supported(true).await.unwrap();
    assert_eq!(handle.terminal_based_state().await.unwrap(), CallWaitingState::NotActivated);

    assert!(handle.set_call_waiting(true, ServiceClass::VOICE).await.unwrap());
    assert!(!handle.set_call_waiting(false, ServiceClass::DATA).await.unwrap());

    let status = handle.get_call_waiting().await.unwrap().unwrap();
    assert_eq!(status.state, CallWaitingState::Activated);
    assert_eq!(status.service_class, ServiceClass::VOICE);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_broadcast_events_are_serialized_with_commands() {
    let setup = Setup::new(0, 1);
    let handle = setup.spawn();
    handle.set_terminal_based_call_waiting_supported(true).await.unwrap();
    assert_eq!(setup.broadcaster.listener_count(), 1);

    setup
        .configs
        .set_config(SubscriptionId(1), CarrierConfig::terminal_based(true));
    setup
        .broadcaster
        .notify(CarrierConfigChanged::for_slot(PhoneId(0)));

    // The event is queued ahead of this request
    assert_eq!(handle.terminal_based_state().await.unwrap(), CallWaitingState::Activated);
    assert_eq!(
        setup.phone.terminal_based_call_waiting_status(),
        Some(CallWaitingState::Activated)
    );
}

#[tokio::test]
async fn test_enforced_update_through_handle() {
    let setup = Setup::new(2, 7);
    let handle = setup.spawn();
    setup.store
        .put_ints(
            DEFAULT_PREFERENCE_GROUP,
            &[(PreferenceKey::state(SubscriptionId(7)), CallWaitingState::Activated.code())],
        )
        .unwrap();

    handle
        .update_carrier_config(SubscriptionId(7), Some(CarrierConfig::terminal_based(false)), false)
        .await
        .unwrap();
    assert_eq!(handle.terminal_based_state().await.unwrap(), CallWaitingState::Activated);

    handle
        .update_carrier_config(SubscriptionId(7), Some(CarrierConfig::terminal_based(false)), true)
        .await
        .unwrap();
    assert_eq!(handle.terminal_based_state().await.unwrap(), CallWaitingState::NotActivated);
}

#[tokio::test]
async fn test_commands_fed_through_sender() {
    let setup = Setup::new(0, 3);
    setup
        .configs
        .set_config(SubscriptionId(3), CarrierConfig::terminal_based(true));
    let handle = setup.spawn();
    handle.set_terminal_based_call_waiting_supported(true).await.unwrap();

    setup.phone.set_sub_id(SubscriptionId::INVALID);
    handle
        .sender()
        .send(Command::from(CarrierConfigChanged::for_slot(PhoneId(0))))
        .unwrap();

    assert_eq!(handle.terminal_based_state().await.unwrap(), CallWaitingState::NotSupported);
}

#[tokio::test]
async fn test_shutdown_closes_service_and_unsubscribes() {
    let setup = Setup::new(0, 1);
    let handle = setup.spawn();
    let other = handle.clone();
    handle.set_terminal_based_call_waiting_supported(true).await.unwrap();
    assert_eq!(setup.broadcaster.listener_count(), 1);

    handle.shutdown().await.unwrap();

    assert!(other.is_closed());
    assert!(matches!(
        other.terminal_based_state().await,
        Err(CallWaitingError::ServiceClosed)
    ));
    assert_eq!(setup.broadcaster.listener_count(), 0);
    // Second shutdown is harmless
    other.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_dropping_all_handles_stops_task() {
    let setup = Setup::new(0, 1);
    let handle = setup.spawn();
    handle.set_terminal_based_call_waiting_supported(true).await.unwrap();
    assert_eq!(setup.broadcaster.listener_count(), 1);

    drop(handle);

    // The registered forwarder holds only a weak sender
    tokio::time::timeout(Duration::from_secs(1), async {
        while setup.broadcaster.listener_count() != 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("task did not stop after its handles were dropped");
}

#[tokio::test]
async fn test_phones_are_independent() {
    let store = Arc::new(MemoryPreferenceStore::new());
    let configs = Arc::new(InMemoryCarrierConfigSource::new());
    let broadcaster = Arc::new(CarrierConfigBroadcaster::new());
    configs.set_config(SubscriptionId(1), CarrierConfig::terminal_based(true));
    configs.set_config(SubscriptionId(2), CarrierConfig::terminal_based(true));

    let handles: Vec<_> = [(0, 1), (1, 2)]
        .into_iter()
        .map(|(phone_id, sub_id)| {
            CallWaitingService::spawn(
                Collaborators {
                    phone: Arc::new(PhoneLine::new(PhoneId(phone_id), SubscriptionId(sub_id))),
                    store: store.clone(),
                    carrier_configs: configs.clone(),
                    notifier: broadcaster.clone(),
                },
                &CallWaitingConfig::default(),
            )
        })
        .collect();

    for handle in &handles {
        handle.set_terminal_based_call_waiting_supported(true).await.unwrap();
    }
    assert!(handles[0].set_call_waiting(false, ServiceClass::VOICE).await.unwrap());

    broadcaster.notify(CarrierConfigChanged::for_slot(PhoneId(1)));

    assert_eq!(handles[0].terminal_based_state().await.unwrap(), CallWaitingState::NotActivated);
    assert_eq!(handles[1].terminal_based_state().await.unwrap(), CallWaitingState::Activated);
    assert_eq!(handles[1].phone_id(), PhoneId(1));
}

#[tokio::test]
async fn test_custom_preference_group() {
    let setup = Setup::new(0, 4);
    setup
        .configs
        .set_config(SubscriptionId(4), CarrierConfig::terminal_based(true));
    let config = CallWaitingConfig::new().with_preference_group("tbcw_custom");
    let handle = CallWaitingService::spawn(setup.collaborators(), &config);

    handle.set_terminal_based_call_waiting_supported(true).await.unwrap();

    assert_eq!(
        setup.store.get("tbcw_custom", PreferenceKey::state(SubscriptionId(4))),
        Some(CallWaitingState::Activated.code())
    );
    assert_eq!(
        setup
            .store
            .get(DEFAULT_PREFERENCE_GROUP, PreferenceKey::state(SubscriptionId(4))),
        None
    );
}
