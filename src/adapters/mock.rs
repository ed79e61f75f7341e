//! In-memory device adapter.
//!
//! `MockAdapter` simulates a device with a device-level unit and any number
//! of channel groups. Each capability has an access set, a current value and
//! an optional list of legal values. A list can also depend on the current
//! value of another capability on the same unit, which is how real
//! instruments behave for ranges that follow the selected quantity.
//!
//! Used by the test suite and by the `property-dump` demo binary.
//!
//! # Example
//!
//! ```rust
//! use daq_properties::adapter::{CapabilityAccess, DeviceAdapter, UnitId};
//! use daq_properties::adapters::MockAdapter;
//! use daq_properties::catalog::CapabilityId;
//! use daq_properties::value::DynamicValue;
//!
//! let mock = MockAdapter::new().with_capability(
//!     UnitId::Device,
//!     CapabilityId::Enabled,
//!     CapabilityAccess::READ_WRITE,
//!     DynamicValue::Bool(false),
//! );
//! mock.set(&UnitId::Device, CapabilityId::Enabled, DynamicValue::Bool(true))
//!     .unwrap();
//! assert_eq!(mock.set_calls(&UnitId::Device, CapabilityId::Enabled), 1);
//! ```

use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::debug;

use crate::adapter::{
    CapabilityAccess, DeviceAdapter, Notification, NotificationReceiver, NotificationSender,
    UnitId,
};
use crate::catalog::{CapabilityId, Quantity, QuantityFlag};
use crate::error::AdapterError;
use crate::value::{DynamicValue, Marshal, MeasuredQuantity};

// =============================================================================
// State
// =============================================================================

enum ListSource {
    None,
    Static(DynamicValue),
    /// Legal values selected by the current value of `driver`.
    DependsOn {
        driver: CapabilityId,
        table: Vec<(DynamicValue, DynamicValue)>,
    },
}

struct MockEntry {
    access: CapabilityAccess,
    value: Option<DynamicValue>,
    list: ListSource,
    reject: Option<String>,
    set_calls: usize,
}

#[derive(Default)]
struct UnitState {
    order: Vec<CapabilityId>,
    entries: HashMap<CapabilityId, MockEntry>,
}

#[derive(Default)]
struct MockState {
    groups: Vec<String>,
    units: HashMap<UnitId, UnitState>,
    echo_sets: bool,
}

impl MockState {
    fn entry(&self, unit: &UnitId, key: CapabilityId) -> Option<&MockEntry> {
        self.units.get(unit)?.entries.get(&key)
    }

    fn entry_mut(&mut self, unit: &UnitId, key: CapabilityId) -> Option<&mut MockEntry> {
        self.units.get_mut(unit)?.entries.get_mut(&key)
    }
}

// =============================================================================
// MockAdapter
// =============================================================================

/// Simulated device for tests and demos.
pub struct MockAdapter {
    state: Mutex<MockState>,
    notify_tx: NotificationSender,
    notify_rx: Mutex<Option<NotificationReceiver>>,
}

impl MockAdapter {
    /// Create an empty device with only a device-level unit.
    pub fn new() -> Self {
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let mut state = MockState::default();
        state.units.insert(UnitId::Device, UnitState::default());
        Self {
            state: Mutex::new(state),
            notify_tx,
            notify_rx: Mutex::new(Some(notify_rx)),
        }
    }

    /// Add a channel group. Groups are reported in insertion order.
    pub fn with_channel_group(self, name: &str) -> Self {
        {
            let mut state = self.state.lock();
            state.groups.push(name.to_string());
            state
                .units
                .entry(UnitId::ChannelGroup(name.to_string()))
                .or_default();
        }
        self
    }

    /// Add a capability with an initial value.
    pub fn with_capability(
        self,
        unit: UnitId,
        key: CapabilityId,
        access: CapabilityAccess,
        value: impl Into<DynamicValue>,
    ) -> Self {
        self.insert(unit, key, access, Some(value.into()));
        self
    }

    /// Add a capability that has no value yet (reads fail with `Io`).
    pub fn with_capability_no_value(
        self,
        unit: UnitId,
        key: CapabilityId,
        access: CapabilityAccess,
    ) -> Self {
        self.insert(unit, key, access, None);
        self
    }

    /// Set the fixed list of legal values for a capability.
    pub fn with_list(self, unit: UnitId, key: CapabilityId, list: DynamicValue) -> Self {
        if let Some(entry) = self.state.lock().entry_mut(&unit, key) {
            entry.list = ListSource::Static(list);
        }
        self
    }

    /// Make the legal values of `key` depend on the current value of
    /// `driver` on the same unit.
    pub fn with_dependent_list(
        self,
        unit: UnitId,
        key: CapabilityId,
        driver: CapabilityId,
        table: Vec<(DynamicValue, DynamicValue)>,
    ) -> Self {
        if let Some(entry) = self.state.lock().entry_mut(&unit, key) {
            entry.list = ListSource::DependsOn { driver, table };
        }
        self
    }

    /// Emit a notification for every successful `set`, as devices that
    /// report their own state changes do.
    pub fn with_set_echo(self, echo: bool) -> Self {
        self.state.lock().echo_sets = echo;
        self
    }

    fn insert(
        &self,
        unit: UnitId,
        key: CapabilityId,
        access: CapabilityAccess,
        value: Option<DynamicValue>,
    ) {
        let mut state = self.state.lock();
        let unit_state = state.units.entry(unit).or_default();
        if !unit_state.entries.contains_key(&key) {
            unit_state.order.push(key);
        }
        unit_state.entries.insert(
            key,
            MockEntry {
                access,
                value,
                list: ListSource::None,
                reject: None,
                set_calls: 0,
            },
        );
    }

    /// Make subsequent `set` calls on `key` fail with `Rejected(reason)`,
    /// or succeed again with `None`.
    pub fn reject_sets(&self, unit: &UnitId, key: CapabilityId, reason: Option<&str>) {
        if let Some(entry) = self.state.lock().entry_mut(unit, key) {
            entry.reject = reason.map(str::to_string);
        }
    }

    /// Replace the fixed list of legal values at runtime.
    pub fn set_list(&self, unit: &UnitId, key: CapabilityId, list: DynamicValue) {
        if let Some(entry) = self.state.lock().entry_mut(unit, key) {
            entry.list = ListSource::Static(list);
        }
    }

    /// Number of `set` calls that reached `key`, including rejected ones.
    pub fn set_calls(&self, unit: &UnitId, key: CapabilityId) -> usize {
        self.state
            .lock()
            .entry(unit, key)
            .map_or(0, |entry| entry.set_calls)
    }

    /// Current device-side value, bypassing access checks.
    pub fn raw_value(&self, unit: &UnitId, key: CapabilityId) -> Option<DynamicValue> {
        self.state.lock().entry(unit, key)?.value.clone()
    }

    /// Change a value on the device side and notify, as if the user turned
    /// a knob on the front panel.
    pub fn device_change(&self, unit: &UnitId, key: CapabilityId, value: DynamicValue) {
        if let Some(entry) = self.state.lock().entry_mut(unit, key) {
            entry.value = Some(value.clone());
        }
        self.notify(Notification {
            capability: key,
            value,
        });
    }

    /// Send a raw notification, known capability or not.
    pub fn notify(&self, notification: Notification) {
        if self.notify_tx.send(notification).is_err() {
            debug!("Notification receiver dropped, discarding notification");
        }
    }

    /// Handle for pushing notifications from another thread.
    pub fn notification_sender(&self) -> NotificationSender {
        self.notify_tx.clone()
    }

    // =========================================================================
    // Demo device
    // =========================================================================

    /// Two-channel programmable power supply.
    ///
    /// The device-level unit carries the channel configuration and an
    /// over-temperature flag plus one capability the catalog does not model.
    /// `CH1` has a selectable output range that drives the legal values of
    /// its voltage target and current limit; `CH2` has a fixed range.
    pub fn demo_power_supply() -> Self {
        use CapabilityAccess as A;
        use CapabilityId as C;

        let dev = UnitId::Device;
        let ch1 = UnitId::ChannelGroup("CH1".to_string());
        let ch2 = UnitId::ChannelGroup("CH2".to_string());

        let low_range = DynamicValue::pair(0.0.into(), 30.0.into());
        let high_range = DynamicValue::pair(0.0.into(), 60.0.into());
        let triple = |min: f64, max: f64, step: f64| {
            DynamicValue::Tuple(vec![min.into(), max.into(), step.into()])
        };
        let strings = |items: &[&str]| {
            DynamicValue::Array(items.iter().map(|s| DynamicValue::from(*s)).collect())
        };

        let mut mock = MockAdapter::new()
            .with_channel_group("CH1")
            .with_channel_group("CH2")
            .with_capability(dev.clone(), C::ChannelConfig, A::ALL, "Independent")
            .with_list(
                dev.clone(),
                C::ChannelConfig,
                strings(&["Independent", "Series", "Parallel"]),
            )
            .with_capability(dev.clone(), C::OverTemperatureProtectionActive, A::READ_ONLY, false)
            .with_capability(dev.clone(), C::Other(30_001), A::READ_ONLY, 1u64);

        for (unit, ranged) in [(ch1, true), (ch2, false)] {
            mock = mock
                .with_capability(unit.clone(), C::Enabled, A::READ_WRITE, false)
                .with_capability(unit.clone(), C::Regulation, A::READ_ONLY, "CV")
                .with_capability(unit.clone(), C::Voltage, A::READ_ONLY, 0.0)
                .with_capability(unit.clone(), C::Current, A::READ_ONLY, 0.0)
                .with_capability(unit.clone(), C::VoltageTarget, A::ALL, 5.0)
                .with_capability(unit.clone(), C::CurrentLimit, A::ALL, 1.0)
                .with_capability(unit.clone(), C::OverVoltageProtectionEnabled, A::READ_WRITE, true)
                .with_capability(unit.clone(), C::OverVoltageProtectionThreshold, A::ALL, 33.0)
                .with_capability(unit.clone(), C::OverCurrentProtectionEnabled, A::READ_WRITE, false)
                .with_capability(unit.clone(), C::OverCurrentProtectionThreshold, A::ALL, 5.5);

            if ranged {
                mock = mock
                    .with_capability(unit.clone(), C::Range, A::ALL, low_range.clone())
                    .with_list(
                        unit.clone(),
                        C::Range,
                        DynamicValue::Array(vec![low_range.clone(), high_range.clone()]),
                    )
                    .with_dependent_list(
                        unit.clone(),
                        C::VoltageTarget,
                        C::Range,
                        vec![
                            (low_range.clone(), triple(0.0, 30.0, 0.001)),
                            (high_range.clone(), triple(0.0, 60.0, 0.01)),
                        ],
                    )
                    .with_dependent_list(
                        unit.clone(),
                        C::CurrentLimit,
                        C::Range,
                        vec![
                            (low_range.clone(), triple(0.0, 5.0, 0.001)),
                            (high_range.clone(), triple(0.0, 2.5, 0.001)),
                        ],
                    )
                    .with_dependent_list(
                        unit.clone(),
                        C::OverVoltageProtectionThreshold,
                        C::Range,
                        vec![
                            (low_range.clone(), triple(0.01, 33.0, 0.01)),
                            (high_range.clone(), triple(0.01, 66.0, 0.01)),
                        ],
                    )
                    .with_dependent_list(
                        unit.clone(),
                        C::OverCurrentProtectionThreshold,
                        C::Range,
                        vec![
                            (low_range.clone(), triple(0.01, 5.5, 0.001)),
                            (high_range.clone(), triple(0.01, 2.75, 0.001)),
                        ],
                    );
            } else {
                mock = mock
                    .with_list(unit.clone(), C::VoltageTarget, triple(0.0, 30.0, 0.001))
                    .with_list(unit.clone(), C::CurrentLimit, triple(0.0, 3.0, 0.001))
                    .with_list(unit.clone(), C::OverVoltageProtectionThreshold, triple(0.01, 33.0, 0.01))
                    .with_list(unit.clone(), C::OverCurrentProtectionThreshold, triple(0.01, 3.3, 0.001));
            }
        }

        mock
    }

    /// Single-unit multimeter whose range list follows the measured quantity.
    pub fn demo_multimeter() -> Self {
        use CapabilityAccess as A;
        use CapabilityId as C;

        let dev = UnitId::Device;
        let voltage = MeasuredQuantity::new(Quantity::Voltage, [QuantityFlag::Dc]).to_dynamic();
        let current = MeasuredQuantity::new(Quantity::Current, [QuantityFlag::Dc]).to_dynamic();
        let range_list = |high: f64| {
            DynamicValue::Array(vec![DynamicValue::pair(0.0.into(), high.into())])
        };

        MockAdapter::new()
            .with_capability(dev.clone(), C::MeasuredQuantity, A::ALL, voltage.clone())
            .with_list(
                dev.clone(),
                C::MeasuredQuantity,
                DynamicValue::Array(vec![voltage.clone(), current.clone()]),
            )
            .with_capability(
                dev.clone(),
                C::Range,
                A::ALL,
                DynamicValue::pair(0.0.into(), 10.0.into()),
            )
            .with_dependent_list(
                dev.clone(),
                C::Range,
                C::MeasuredQuantity,
                vec![(voltage, range_list(10.0)), (current, range_list(100.0))],
            )
            .with_capability(dev, C::HoldMax, A::READ_WRITE, false)
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceAdapter for MockAdapter {
    fn channel_groups(&self) -> Vec<String> {
        self.state.lock().groups.clone()
    }

    fn config_keys(&self, unit: &UnitId) -> Vec<CapabilityId> {
        self.state
            .lock()
            .units
            .get(unit)
            .map(|u| u.order.clone())
            .unwrap_or_default()
    }

    fn capability_access(&self, unit: &UnitId, key: CapabilityId) -> CapabilityAccess {
        self.state
            .lock()
            .entry(unit, key)
            .map(|entry| entry.access)
            .unwrap_or_default()
    }

    fn get(&self, unit: &UnitId, key: CapabilityId) -> Result<DynamicValue, AdapterError> {
        let state = self.state.lock();
        let entry = state.entry(unit, key).ok_or(AdapterError::Unsupported)?;
        if !entry.access.readable {
            return Err(AdapterError::Unsupported);
        }
        entry
            .value
            .clone()
            .ok_or_else(|| AdapterError::Io(format!("no value for {}", key)))
    }

    fn set(
        &self,
        unit: &UnitId,
        key: CapabilityId,
        value: DynamicValue,
    ) -> Result<(), AdapterError> {
        let echo = {
            let mut state = self.state.lock();
            let echo = state.echo_sets;
            let entry = state.entry_mut(unit, key).ok_or(AdapterError::Unsupported)?;
            if !entry.access.writable {
                return Err(AdapterError::Unsupported);
            }
            entry.set_calls += 1;
            if let Some(reason) = &entry.reject {
                return Err(AdapterError::Rejected(reason.clone()));
            }
            entry.value = Some(value.clone());
            echo
        };

        if echo {
            self.notify(Notification {
                capability: key,
                value,
            });
        }
        Ok(())
    }

    fn enumerate(&self, unit: &UnitId, key: CapabilityId) -> Result<DynamicValue, AdapterError> {
        let state = self.state.lock();
        let entry = state.entry(unit, key).ok_or(AdapterError::Unsupported)?;
        if !entry.access.enumerable {
            return Err(AdapterError::Unsupported);
        }
        match &entry.list {
            ListSource::None => Err(AdapterError::Unsupported),
            ListSource::Static(list) => Ok(list.clone()),
            ListSource::DependsOn { driver, table } => {
                let current = state
                    .entry(unit, *driver)
                    .and_then(|d| d.value.as_ref())
                    .ok_or_else(|| AdapterError::Io(format!("{} has no value", driver)))?;
                table
                    .iter()
                    .find(|(when, _)| when == current)
                    .map(|(_, list)| list.clone())
                    .ok_or_else(|| {
                        AdapterError::Rejected(format!("no legal values for current {}", driver))
                    })
            }
        }
    }

    fn take_notifications(&self) -> Option<NotificationReceiver> {
        self.notify_rx.lock().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_is_enforced() {
        let mock = MockAdapter::new().with_capability(
            UnitId::Device,
            CapabilityId::Voltage,
            CapabilityAccess::READ_ONLY,
            1.5,
        );
        assert_eq!(
            mock.get(&UnitId::Device, CapabilityId::Voltage),
            Ok(DynamicValue::Double(1.5))
        );
        assert_eq!(
            mock.set(&UnitId::Device, CapabilityId::Voltage, 2.0.into()),
            Err(AdapterError::Unsupported)
        );
        assert_eq!(
            mock.enumerate(&UnitId::Device, CapabilityId::Voltage),
            Err(AdapterError::Unsupported)
        );
    }

    #[test]
    fn rejected_sets_keep_value() {
        let mock = MockAdapter::new().with_capability(
            UnitId::Device,
            CapabilityId::VoltageTarget,
            CapabilityAccess::ALL,
            1.0,
        );
        mock.reject_sets(&UnitId::Device, CapabilityId::VoltageTarget, Some("too high"));
        assert!(matches!(
            mock.set(&UnitId::Device, CapabilityId::VoltageTarget, 99.0.into()),
            Err(AdapterError::Rejected(_))
        ));
        assert_eq!(
            mock.raw_value(&UnitId::Device, CapabilityId::VoltageTarget),
            Some(DynamicValue::Double(1.0))
        );
        assert_eq!(mock.set_calls(&UnitId::Device, CapabilityId::VoltageTarget), 1);
    }

    #[test]
    fn dependent_list_follows_driver() {
        let mock = MockAdapter::demo_multimeter();
        let dev = UnitId::Device;
        let first = mock.enumerate(&dev, CapabilityId::Range).unwrap();
        assert_eq!(
            first,
            DynamicValue::Array(vec![DynamicValue::pair(0.0.into(), 10.0.into())])
        );

        let current = MeasuredQuantity::new(Quantity::Current, [QuantityFlag::Dc]).to_dynamic();
        mock.set(&dev, CapabilityId::MeasuredQuantity, current).unwrap();
        let second = mock.enumerate(&dev, CapabilityId::Range).unwrap();
        assert_eq!(
            second,
            DynamicValue::Array(vec![DynamicValue::pair(0.0.into(), 100.0.into())])
        );
    }

    #[tokio::test]
    async fn set_echo_emits_notification() {
        let mock = MockAdapter::new()
            .with_capability(
                UnitId::Device,
                CapabilityId::Enabled,
                CapabilityAccess::READ_WRITE,
                false,
            )
            .with_set_echo(true);
        let mut rx = mock.take_notifications().unwrap();
        assert!(mock.take_notifications().is_none());

        mock.set(&UnitId::Device, CapabilityId::Enabled, true.into())
            .unwrap();
        let notification = rx.recv().await.unwrap();
        assert_eq!(notification, Notification::new(CapabilityId::Enabled, true));
    }

    #[test]
    fn demo_power_supply_layout() {
        let mock = MockAdapter::demo_power_supply();
        assert_eq!(mock.channel_groups(), vec!["CH1", "CH2"]);
        let ch1 = UnitId::ChannelGroup("CH1".into());
        assert!(mock.has_capability(&ch1, CapabilityId::Range));
        assert!(!mock.has_capability(&UnitId::ChannelGroup("CH2".into()), CapabilityId::Range));
        assert!(mock.has_capability(&UnitId::Device, CapabilityId::Other(30_001)));
    }
}
