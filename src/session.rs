//! Device session: the ordered configurables of one device and the
//! notification pump that routes device reports to them.
//!
//! Device notifications name a capability but not the unit it belongs to.
//! [`DeviceSession::route`] resolves this by trying the device-level
//! configurable first, then each channel group in registration order; the
//! first configurable with a property for the capability claims the
//! notification. Unclaimed notifications are logged and dropped.
//!
//! This is a heuristic. If two units expose the same capability with
//! different meanings, notifications for the later unit are delivered to
//! the earlier one. The protocol carries nothing to tell them apart.
//!
//! # Example
//!
//! ```rust,ignore
//! let session = DeviceSession::open(adapter, DeviceInfo::new("PSU", DeviceType::PowerSupply, "psu-1"), &config);
//!
//! // Synchronous pump, e.g. once per UI frame:
//! session.process_pending();
//!
//! // Or as a task:
//! tokio::spawn(async move { session.run().await });
//! ```

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info, warn};

use crate::adapter::{DeviceAdapter, Notification, NotificationReceiver, UnitId};
use crate::catalog::DeviceType;
use crate::config::{PropertiesConfig, SessionConfig};
use crate::configurable::{Configurable, ConfigurableIdentity, ConfigurableSnapshot};

/// Static description of the device behind a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Display name.
    pub name: String,
    /// Category.
    pub device_type: DeviceType,
    /// Identifier used to key persisted settings.
    pub settings_id: String,
}

impl DeviceInfo {
    /// Create a device description.
    pub fn new(name: impl Into<String>, device_type: DeviceType, settings_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            device_type,
            settings_id: settings_id.into(),
        }
    }
}

/// Result of routing one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A configurable owned the capability and received the notification.
    Claimed {
        /// Index of the claiming configurable.
        index: u32,
        /// Group name of the claiming configurable, empty for the device.
        name: String,
    },
    /// No configurable owns the capability; the notification was dropped.
    Unrouted,
}

/// All configurables of one device plus its notification stream.
pub struct DeviceSession {
    info: DeviceInfo,
    configurables: Vec<Arc<Configurable>>,
    notifications: Mutex<Option<NotificationReceiver>>,
    config: SessionConfig,
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("info", &self.info)
            .field("configurables", &self.configurables.len())
            .finish()
    }
}

impl DeviceSession {
    /// Discover the device-level unit and every channel group.
    ///
    /// The device-level configurable gets index 0; groups follow in the
    /// order the adapter reports them. The adapter's notification stream is
    /// taken here; without one the session never routes anything.
    pub fn open(
        adapter: Arc<dyn DeviceAdapter>,
        info: DeviceInfo,
        config: &PropertiesConfig,
    ) -> DeviceSession {
        let units = std::iter::once(UnitId::Device).chain(
            adapter
                .channel_groups()
                .into_iter()
                .map(UnitId::ChannelGroup),
        );

        let configurables: Vec<Arc<Configurable>> = units
            .enumerate()
            .map(|(index, unit)| {
                let identity = ConfigurableIdentity {
                    index: index as u32,
                    device_name: info.name.clone(),
                    device_type: info.device_type,
                    settings_id: info.settings_id.clone(),
                    unit,
                };
                Configurable::discover(Arc::clone(&adapter), identity, &config.discovery)
            })
            .collect();

        let notifications = adapter.take_notifications();
        if notifications.is_none() {
            debug!(device = %info.name, "Adapter provides no notification stream");
        }

        info!(
            device = %info.name,
            configurables = configurables.len(),
            "Device session opened"
        );

        DeviceSession {
            info,
            configurables,
            notifications: Mutex::new(notifications),
            config: config.session.clone(),
        }
    }

    /// Device description.
    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    /// Configurables in routing order.
    pub fn configurables(&self) -> &[Arc<Configurable>] {
        &self.configurables
    }

    /// The device-level configurable.
    pub fn device(&self) -> &Arc<Configurable> {
        // `open` always creates it first.
        &self.configurables[0]
    }

    /// Channel group by name.
    pub fn group(&self, name: &str) -> Option<&Arc<Configurable>> {
        self.configurables
            .iter()
            .skip(1)
            .find(|c| c.name() == name)
    }

    /// Deliver `notification` to the first configurable that owns its
    /// capability: the device level, then groups in registration order.
    pub fn route(&self, notification: &Notification) -> RouteOutcome {
        let key = notification.capability;
        let Some(owner) = self.configurables.iter().find(|c| c.has_property(key)) else {
            warn!(device = %self.info.name, key = %key, "Dropping unrouted notification");
            return RouteOutcome::Unrouted;
        };

        // A cast failure is logged by the property and does not change the
        // claim.
        if let Err(err) = owner.deliver(notification) {
            debug!(key = %key, error = %err, "Notification not applied");
        }
        RouteOutcome::Claimed {
            index: owner.index(),
            name: owner.name().to_string(),
        }
    }

    /// Route every queued notification without waiting, in arrival order.
    ///
    /// Stops after `max_notifications_per_pump` (0 = no limit). Returns the
    /// number of notifications taken from the queue. The queue lock is
    /// released while each notification is routed, so a listener may pump
    /// the session again.
    pub fn process_pending(&self) -> usize {
        let limit = match self.config.max_notifications_per_pump {
            0 => usize::MAX,
            n => n,
        };
        let mut processed = 0;
        while processed < limit {
            let next = match self.notifications.lock().as_mut() {
                Some(rx) => rx.try_recv(),
                None => return processed,
            };
            match next {
                Ok(notification) => {
                    self.route(&notification);
                    processed += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!(device = %self.info.name, "Notification stream closed");
                    break;
                }
            }
        }
        processed
    }

    /// Route notifications as they arrive until the adapter closes the
    /// stream.
    ///
    /// Takes the stream out of the session; afterwards `process_pending`
    /// returns 0. Returns immediately if the stream was already taken.
    pub async fn run(&self) {
        let taken = self.notifications.lock().take();
        let Some(mut rx) = taken else {
            warn!(device = %self.info.name, "Notification stream already taken");
            return;
        };
        while let Some(notification) = rx.recv().await {
            self.route(&notification);
        }
        debug!(device = %self.info.name, "Notification stream closed");
    }

    /// Serializable view of every configurable.
    pub fn snapshot(&self) -> Vec<ConfigurableSnapshot> {
        self.configurables.iter().map(|c| c.snapshot()).collect()
    }
}
