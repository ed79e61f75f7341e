//! Device protocol adapter interface.
//!
//! The adapter is the boundary to the transport/driver that performs the
//! actual device I/O. This crate consumes it; implementations live outside
//! (a protocol binding, or [`MockAdapter`](crate::adapters::MockAdapter) for
//! tests and the demo binary).
//!
//! All verbs are synchronous and may block the calling thread. Asynchronous
//! value-changed notifications originate on the adapter's acquisition
//! thread and are handed to the session through an unbounded tokio mpsc
//! channel, which is the only cross-thread boundary in the property layer.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::catalog::CapabilityId;
use crate::error::AdapterError;
use crate::value::DynamicValue;

/// A controllable unit of a device: the device itself or one named
/// channel group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitId {
    /// The device-level unit.
    Device,
    /// A named channel group.
    ChannelGroup(String),
}

impl UnitId {
    /// Group name, empty for the device-level unit.
    pub fn name(&self) -> &str {
        match self {
            UnitId::Device => "",
            UnitId::ChannelGroup(name) => name,
        }
    }
}

/// Access verbs a unit supports for one capability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityAccess {
    /// `get` is supported.
    pub readable: bool,
    /// `set` is supported.
    pub writable: bool,
    /// `enumerate` is supported.
    pub enumerable: bool,
}

impl CapabilityAccess {
    /// Read, write and enumerate.
    pub const ALL: CapabilityAccess = CapabilityAccess {
        readable: true,
        writable: true,
        enumerable: true,
    };

    /// Read-only.
    pub const READ_ONLY: CapabilityAccess = CapabilityAccess {
        readable: true,
        writable: false,
        enumerable: false,
    };

    /// Read and write without enumeration.
    pub const READ_WRITE: CapabilityAccess = CapabilityAccess {
        readable: true,
        writable: true,
        enumerable: false,
    };

    /// True if no verb is supported.
    pub fn is_empty(&self) -> bool {
        !(self.readable || self.writable || self.enumerable)
    }
}

/// Asynchronous value-changed report from the device.
///
/// Carries no unit: the session decides which configurable claims it.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Capability whose value changed.
    pub capability: CapabilityId,
    /// New value in the adapter's container format.
    pub value: DynamicValue,
}

impl Notification {
    /// Create a notification.
    pub fn new(capability: CapabilityId, value: impl Into<DynamicValue>) -> Self {
        Self {
            capability,
            value: value.into(),
        }
    }
}

/// Sending half of the notification hand-off, owned by the adapter.
pub type NotificationSender = mpsc::UnboundedSender<Notification>;

/// Receiving half of the notification hand-off, owned by the session.
pub type NotificationReceiver = mpsc::UnboundedReceiver<Notification>;

/// Interface a device protocol binding implements.
pub trait DeviceAdapter: Send + Sync {
    /// Names of the device's channel groups, in device order.
    fn channel_groups(&self) -> Vec<String>;

    /// Every capability id the unit reports, recognised or not.
    fn config_keys(&self, unit: &UnitId) -> Vec<CapabilityId>;

    /// Whether the unit reports `key` at all.
    fn has_capability(&self, unit: &UnitId, key: CapabilityId) -> bool {
        self.config_keys(unit).contains(&key)
    }

    /// Supported verbs for `key` on `unit`.
    fn capability_access(&self, unit: &UnitId, key: CapabilityId) -> CapabilityAccess;

    /// Read the current value.
    fn get(&self, unit: &UnitId, key: CapabilityId) -> Result<DynamicValue, AdapterError>;

    /// Write a new value.
    fn set(&self, unit: &UnitId, key: CapabilityId, value: DynamicValue)
        -> Result<(), AdapterError>;

    /// Legal values: either a list of values or a `(min, max, step)` tuple.
    fn enumerate(&self, unit: &UnitId, key: CapabilityId) -> Result<DynamicValue, AdapterError>;

    /// Take the device's notification stream. Returns `None` once taken or
    /// when the device does not emit notifications.
    fn take_notifications(&self) -> Option<NotificationReceiver>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_names() {
        assert_eq!(UnitId::Device.name(), "");
        assert_eq!(UnitId::ChannelGroup("CH1".into()).name(), "CH1");
    }

    #[test]
    fn access_presets() {
        assert!(CapabilityAccess::default().is_empty());
        assert!(!CapabilityAccess::READ_ONLY.is_empty());
        assert!(CapabilityAccess::ALL.enumerable);
    }
}
