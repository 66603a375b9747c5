//! Per-phone serialized execution context
//!
//! [`CallWaitingService::spawn`] moves a [`CallWaitingController`] onto its
//! own tokio task. Carrier configuration events and requests made through a
//! [`CallWaitingHandle`] share one queue, so the controller only ever runs one
//! operation at a time and needs no locking.
//!
//! ```rust,no_run
//! use call_waiting_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> call_waiting_core::Result<()> {
//! let configs = Arc::new(InMemoryCarrierConfigSource::new());
//! configs.set_config(SubscriptionId(1), CarrierConfig::terminal_based(true));
//!
//! let handle = CallWaitingService::spawn(
//!     Collaborators {
//!         phone: Arc::new(PhoneLine::new(PhoneId(0), SubscriptionId(1))),
//!         store: Arc::new(MemoryPreferenceStore::new()),
//!         carrier_configs: configs,
//!         notifier: Arc::new(CarrierConfigBroadcaster::new()),
//!     },
//!     &CallWaitingConfig::default(),
//! );
//!
//! handle.set_terminal_based_call_waiting_supported(true).await?;
//! assert!(handle.set_call_waiting(false, ServiceClass::VOICE).await?);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::carrier_config::CarrierConfig;
use crate::config::CallWaitingConfig;
use crate::controller::{CallWaitingController, Collaborators};
use crate::error::{CallWaitingError, Result};
use crate::events::{CarrierConfigChanged, ChannelForwarder};
use crate::types::{CallWaitingState, CallWaitingStatus, PhoneId, ServiceClass, SubscriptionId};

/// Work item processed by the phone's task
#[derive(Debug)]
pub enum Command {
    CarrierConfigChanged(CarrierConfigChanged),
    GetState {
        reply: oneshot::Sender<CallWaitingState>,
    },
    GetCallWaiting {
        reply: oneshot::Sender<Option<CallWaitingStatus>>,
    },
    SetCallWaiting {
        enable: bool,
        service_class: ServiceClass,
        reply: oneshot::Sender<bool>,
    },
    UpdateCarrierConfig {
        sub_id: SubscriptionId,
        config: Option<CarrierConfig>,
        enforced: bool,
        reply: oneshot::Sender<()>,
    },
    SetSupported {
        supported: bool,
        reply: oneshot::Sender<()>,
    },
    Shutdown,
}

impl From<CarrierConfigChanged> for Command {
    fn from(event: CarrierConfigChanged) -> Self {
        Command::CarrierConfigChanged(event)
    }
}

/// Spawns per-phone controller tasks
pub struct CallWaitingService;

impl CallWaitingService {
    /// Build a controller for `collaborators.phone` and run it on a new task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(collaborators: Collaborators, config: &CallWaitingConfig) -> CallWaitingHandle {
        let phone_id = collaborators.phone.phone_id();
        let (tx, rx) = mpsc::unbounded_channel();
        let listener = Arc::new(ChannelForwarder::<Command>::new(&tx));
        let controller = CallWaitingController::new(collaborators, listener)
            .with_preference_group(config.preference_group.clone());

        let task = tokio::spawn(run(controller, rx));

        info!(target: "call_waiting", "Started call waiting service for phone {}", phone_id);

        CallWaitingHandle {
            phone_id,
            tx,
            task: Arc::new(parking_lot::Mutex::new(Some(task))),
        }
    }
}

async fn run(mut controller: CallWaitingController, mut rx: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::CarrierConfigChanged(event) => {
                controller.on_carrier_config_changed(event);
            }
            Command::GetState { reply } => {
                let _ = reply.send(controller.terminal_based_call_waiting_state());
            }
            Command::GetCallWaiting { reply } => {
                let (sink, mut response) = oneshot::channel();
                let status = if controller.get_call_waiting(Some(sink)) {
                    response.try_recv().ok()
                } else {
                    None
                };
                let _ = reply.send(status);
            }
            Command::SetCallWaiting {
                enable,
                service_class,
                reply,
            } => {
                let handled = controller.set_call_waiting(enable, service_class, None);
                let _ = reply.send(handled);
            }
            Command::UpdateCarrierConfig {
                sub_id,
                config,
                enforced,
                reply,
            } => {
                controller.update_carrier_config(sub_id, config.as_ref(), enforced);
                let _ = reply.send(());
            }
            Command::SetSupported { supported, reply } => {
                controller.set_terminal_based_call_waiting_supported(supported);
                let _ = reply.send(());
            }
            Command::Shutdown => break,
        }
    }

    debug!(
        target: "call_waiting",
        "Call waiting service for phone {} stopped",
        controller.phone().phone_id()
    );
    // Dropping the controller unregisters its carrier config listener
}

/// Cloneable handle to a running per-phone service
#[derive(Clone)]
pub struct CallWaitingHandle {
    phone_id: PhoneId,
    tx: mpsc::UnboundedSender<Command>,
    task: Arc<parking_lot::Mutex<Option<JoinHandle<()>>>>,
}

impl CallWaitingHandle {
    pub fn phone_id(&self) -> PhoneId {
        self.phone_id
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Sender for feeding events or commands directly into the queue
    pub fn sender(&self) -> mpsc::UnboundedSender<Command> {
        self.tx.clone()
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .map_err(|_| CallWaitingError::ServiceClosed)?;
        rx.await.map_err(|_| CallWaitingError::ServiceClosed)
    }

    pub async fn terminal_based_state(&self) -> Result<CallWaitingState> {
        self.request(|reply| Command::GetState { reply }).await
    }

    /// Interrogate call waiting; `None` when it must go to the network
    pub async fn get_call_waiting(&self) -> Result<Option<CallWaitingStatus>> {
        self.request(|reply| Command::GetCallWaiting { reply }).await
    }

    /// Returns false when the request was not handled locally
    pub async fn set_call_waiting(&self, enable: bool, service_class: ServiceClass) -> Result<bool> {
        self.request(|reply| Command::SetCallWaiting {
            enable,
            service_class,
            reply,
        })
        .await
    }

    pub async fn update_carrier_config(
        &self,
        sub_id: SubscriptionId,
        config: Option<CarrierConfig>,
        enforced: bool,
    ) -> Result<()> {
        self.request(|reply| Command::UpdateCarrierConfig {
            sub_id,
            config,
            enforced,
            reply,
        })
        .await
    }

    pub async fn set_terminal_based_call_waiting_supported(&self, supported: bool) -> Result<()> {
        self.request(|reply| Command::SetSupported { supported, reply })
            .await
    }

    /// Stop the task and wait for it to finish
    pub async fn shutdown(&self) -> Result<()> {
        // Already gone is fine
        let _ = self.tx.send(Command::Shutdown);

        let task = self.task.lock().take();
        if let Some(task) = task {
            task.await
                .map_err(|e| CallWaitingError::internal(format!("call waiting task failed: {}", e)))?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for CallWaitingHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallWaitingHandle")
            .field("phone_id", &self.phone_id)
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}
