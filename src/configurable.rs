//! Configurables: one per controllable unit of a device.
//!
//! A [`Configurable`] represents either the whole device or one named
//! channel group. [`Configurable::discover`] asks the adapter for every
//! capability the unit reports, records which verbs each supports, and builds
//! exactly one property per capability the catalog recognises. The property
//! map is never resized afterwards; only metadata inside the properties is
//! refreshed.
//!
//! Properties hold a weak reference back to their configurable and call
//! [`get_config`](Configurable::get_config) /
//! [`set_config`](Configurable::set_config) /
//! [`list_config`](Configurable::list_config) through it, which is where the
//! access sets are enforced and adapter failures are logged.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::adapter::{DeviceAdapter, Notification, UnitId};
use crate::catalog::{CapabilityId, DeviceType, ValueKind};
use crate::config::DiscoveryConfig;
use crate::dependency;
use crate::error::{AdapterError, AppResult, DaqError};
use crate::properties::{self, Property, PropertySnapshot, StringProperty};
use crate::value::DynamicValue;

/// Static identity of a configurable, fixed at discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurableIdentity {
    /// Stable index within the device session.
    pub index: u32,
    /// Display name of the owning device.
    pub device_name: String,
    /// Category of the owning device.
    pub device_type: DeviceType,
    /// Identifier used to key persisted settings.
    pub settings_id: String,
    /// Which unit of the device this is.
    pub unit: UnitId,
}

/// Access verb used to select a capability set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    /// Capabilities supporting `get`.
    Read,
    /// Capabilities supporting `set`.
    Write,
    /// Capabilities supporting `enumerate`.
    Enumerate,
}

/// One controllable unit and its properties.
pub struct Configurable {
    identity: ConfigurableIdentity,
    adapter: Arc<dyn DeviceAdapter>,
    getable: BTreeSet<CapabilityId>,
    setable: BTreeSet<CapabilityId>,
    listable: BTreeSet<CapabilityId>,
    order: Vec<CapabilityId>,
    properties: BTreeMap<CapabilityId, Arc<dyn Property>>,
}

impl fmt::Debug for Configurable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configurable")
            .field("identity", &self.identity)
            .field("properties", &self.order)
            .finish()
    }
}

impl Configurable {
    /// Discover the unit's capabilities and build its properties.
    ///
    /// Capabilities of unknown kind are skipped. Capabilities with no
    /// supported verb are still registered so their unit and name can be
    /// inspected. With `config.initial_list`, every enumerable property is
    /// listed once; a string property whose list fails falls back to free
    /// text. With `config.wire_dependencies`, the dependency rules are
    /// wired before returning.
    pub fn discover(
        adapter: Arc<dyn DeviceAdapter>,
        identity: ConfigurableIdentity,
        config: &DiscoveryConfig,
    ) -> Arc<Configurable> {
        let configurable = Arc::new_cyclic(|weak| {
            let mut getable = BTreeSet::new();
            let mut setable = BTreeSet::new();
            let mut listable = BTreeSet::new();
            let mut order = Vec::new();
            let mut properties = BTreeMap::new();

            for key in adapter.config_keys(&identity.unit) {
                if key.kind() == ValueKind::Unknown {
                    debug!(unit = ?identity.unit, key = %key, "Skipping capability of unknown kind");
                    continue;
                }
                if properties.contains_key(&key) {
                    continue;
                }

                let access = adapter.capability_access(&identity.unit, key);
                debug!(
                    unit = ?identity.unit,
                    key = %key,
                    readable = access.readable,
                    writable = access.writable,
                    enumerable = access.enumerable,
                    "Discovered capability"
                );
                if access.readable {
                    getable.insert(key);
                }
                if access.writable {
                    setable.insert(key);
                }
                if access.enumerable {
                    listable.insert(key);
                }

                if let Some(property) = properties::new_property(weak.clone(), key, access) {
                    order.push(key);
                    properties.insert(key, property);
                }
            }

            Configurable {
                identity,
                adapter,
                getable,
                setable,
                listable,
                order,
                properties,
            }
        });

        if config.initial_list {
            configurable.refresh_lists();
        }
        if config.wire_dependencies {
            dependency::wire_dependencies(&configurable);
        }

        debug!(
            configurable = %configurable.display_name(),
            properties = configurable.properties.len(),
            "Discovery complete"
        );
        configurable
    }

    /// List every enumerable property once.
    ///
    /// Bool properties are skipped; they never carry a list.
    pub fn refresh_lists(&self) {
        for property in self.properties() {
            if !property.is_enumerable() || property.kind() == ValueKind::Bool {
                continue;
            }
            if let Err(err) = property.list() {
                warn!(
                    configurable = %self.display_name(),
                    key = %property.capability(),
                    error = %err,
                    "Initial list failed"
                );
                if let Some(string) = property.as_any().downcast_ref::<StringProperty>() {
                    string.fall_back_to_free_text();
                }
            }
        }
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Group name, empty for the device-level configurable.
    pub fn name(&self) -> &str {
        self.identity.unit.name()
    }

    /// Group name, or the device name for the device-level configurable.
    pub fn display_name(&self) -> String {
        let name = self.name();
        if name.is_empty() {
            self.identity.device_name.clone()
        } else {
            name.to_string()
        }
    }

    /// Stable index within the session.
    pub fn index(&self) -> u32 {
        self.identity.index
    }

    /// Category of the owning device.
    pub fn device_type(&self) -> DeviceType {
        self.identity.device_type
    }

    /// Settings identifier.
    pub fn settings_id(&self) -> &str {
        &self.identity.settings_id
    }

    /// Unit on the device.
    pub fn unit(&self) -> &UnitId {
        &self.identity.unit
    }

    /// Full identity.
    pub fn identity(&self) -> &ConfigurableIdentity {
        &self.identity
    }

    /// Whether the unit supports any verb on any capability.
    pub fn is_controllable(&self) -> bool {
        !(self.getable.is_empty() && self.setable.is_empty() && self.listable.is_empty())
    }

    // =========================================================================
    // Capabilities and properties
    // =========================================================================

    /// Capabilities supporting the given verb.
    pub fn capabilities(&self, access: AccessKind) -> BTreeSet<CapabilityId> {
        match access {
            AccessKind::Read => self.getable.clone(),
            AccessKind::Write => self.setable.clone(),
            AccessKind::Enumerate => self.listable.clone(),
        }
    }

    /// `get` is supported for `key`.
    pub fn has_get_config(&self, key: CapabilityId) -> bool {
        self.getable.contains(&key)
    }

    /// `set` is supported for `key`.
    pub fn has_set_config(&self, key: CapabilityId) -> bool {
        self.setable.contains(&key)
    }

    /// `enumerate` is supported for `key`.
    pub fn has_list_config(&self, key: CapabilityId) -> bool {
        self.listable.contains(&key)
    }

    /// Property for `key`.
    pub fn property(&self, key: CapabilityId) -> Option<Arc<dyn Property>> {
        self.properties.get(&key).cloned()
    }

    /// Property for `key` as its concrete type.
    pub fn property_as<T: Property + 'static>(&self, key: CapabilityId) -> Option<Arc<T>> {
        self.property(key)?.into_any().downcast::<T>().ok()
    }

    /// Whether a property exists for `key`.
    pub fn has_property(&self, key: CapabilityId) -> bool {
        self.properties.contains_key(&key)
    }

    /// Properties in discovery order.
    pub fn properties(&self) -> impl Iterator<Item = &Arc<dyn Property>> {
        self.order.iter().filter_map(|key| self.properties.get(key))
    }

    /// Capability ids in discovery order.
    pub fn keys(&self) -> &[CapabilityId] {
        &self.order
    }

    // =========================================================================
    // Device access
    // =========================================================================

    fn adapter_error(&self, key: CapabilityId, source: AdapterError) -> DaqError {
        warn!(
            configurable = %self.display_name(),
            key = %key,
            error = %source,
            "Adapter call failed"
        );
        DaqError::Adapter { key, source }
    }

    /// Read the raw value of `key`.
    pub fn get_config(&self, key: CapabilityId) -> AppResult<DynamicValue> {
        if !self.has_get_config(key) {
            return Err(DaqError::NotReadable { key });
        }
        self.adapter
            .get(&self.identity.unit, key)
            .map_err(|e| self.adapter_error(key, e))
    }

    /// Write the raw value of `key`.
    pub fn set_config(&self, key: CapabilityId, value: DynamicValue) -> AppResult<()> {
        if !self.has_set_config(key) {
            return Err(DaqError::NotWritable { key });
        }
        self.adapter
            .set(&self.identity.unit, key, value)
            .map_err(|e| self.adapter_error(key, e))
    }

    /// Enumerate the raw legal values of `key`.
    pub fn list_config(&self, key: CapabilityId) -> AppResult<DynamicValue> {
        if !self.has_list_config(key) {
            return Err(DaqError::NotEnumerable { key });
        }
        self.adapter
            .enumerate(&self.identity.unit, key)
            .map_err(|e| self.adapter_error(key, e))
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Hand a device notification to the matching property.
    ///
    /// Fails with `UnknownCapability` if this configurable has no property
    /// for the capability, or with the property's cast error.
    pub fn deliver(&self, notification: &Notification) -> AppResult<()> {
        let property = self
            .properties
            .get(&notification.capability)
            .ok_or(DaqError::UnknownCapability(notification.capability))?;
        property.on_value_changed(&notification.value)
    }

    /// Apply a batch of value reports addressed to this configurable.
    ///
    /// Stops at the first capability this configurable does not know and
    /// returns false.
    pub fn feed_in_meta(&self, entries: &[Notification]) -> bool {
        for entry in entries {
            if !self.has_property(entry.capability) {
                warn!(
                    configurable = %self.display_name(),
                    key = %entry.capability,
                    "Unknown capability in meta packet"
                );
                return false;
            }
            // Cast failures are already logged by the property.
            let _ = self.deliver(entry);
        }
        true
    }

    /// Serializable view of this configurable and all its properties.
    pub fn snapshot(&self) -> ConfigurableSnapshot {
        ConfigurableSnapshot {
            index: self.index(),
            name: self.name().to_string(),
            display_name: self.display_name(),
            device_type: self.device_type(),
            properties: self.properties().map(|p| p.snapshot()).collect(),
        }
    }
}

/// Serializable view of a configurable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurableSnapshot {
    /// Index within the session.
    pub index: u32,
    /// Group name, empty for the device level.
    pub name: String,
    /// Name shown to users.
    pub display_name: String,
    /// Device category.
    pub device_type: DeviceType,
    /// Properties in discovery order.
    pub properties: Vec<PropertySnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::CapabilityAccess;
    use crate::adapters::MockAdapter;
    use crate::properties::DoubleProperty;

    fn identity(unit: UnitId) -> ConfigurableIdentity {
        ConfigurableIdentity {
            index: 0,
            device_name: "Mock PSU".into(),
            device_type: DeviceType::PowerSupply,
            settings_id: "mock-psu".into(),
            unit,
        }
    }

    #[test]
    fn unknown_kinds_are_skipped() {
        let mock = MockAdapter::new()
            .with_capability(
                UnitId::Device,
                CapabilityId::Other(77),
                CapabilityAccess::READ_ONLY,
                1u64,
            )
            .with_capability(
                UnitId::Device,
                CapabilityId::Enabled,
                CapabilityAccess::READ_WRITE,
                true,
            );
        let cfg = Configurable::discover(
            Arc::new(mock),
            identity(UnitId::Device),
            &DiscoveryConfig::default(),
        );
        assert_eq!(cfg.keys(), &[CapabilityId::Enabled]);
        assert!(cfg.property(CapabilityId::Other(77)).is_none());
    }

    #[test]
    fn capability_without_access_is_registered() {
        let mock = MockAdapter::new().with_capability(
            UnitId::Device,
            CapabilityId::Voltage,
            CapabilityAccess::default(),
            0.0,
        );
        let cfg = Configurable::discover(
            Arc::new(mock),
            identity(UnitId::Device),
            &DiscoveryConfig::default(),
        );
        let prop = cfg.property(CapabilityId::Voltage).unwrap();
        assert!(!cfg.is_controllable());
        assert!(matches!(prop.value(), Err(DaqError::NotReadable { .. })));
        assert!(matches!(
            prop.change_value(1.0.into()),
            Err(DaqError::NotWritable { .. })
        ));
        assert!(matches!(prop.list(), Err(DaqError::NotEnumerable { .. })));
    }

    #[test]
    fn identity_names() {
        let mock = Arc::new(MockAdapter::new().with_channel_group("CH1"));
        let dev = Configurable::discover(
            mock.clone(),
            identity(UnitId::Device),
            &DiscoveryConfig::default(),
        );
        let ch1 = Configurable::discover(
            mock,
            identity(UnitId::ChannelGroup("CH1".into())),
            &DiscoveryConfig::default(),
        );
        assert_eq!(dev.name(), "");
        assert_eq!(dev.display_name(), "Mock PSU");
        assert_eq!(ch1.name(), "CH1");
        assert_eq!(ch1.display_name(), "CH1");
    }

    #[test]
    fn typed_property_lookup() {
        let mock = MockAdapter::new().with_capability(
            UnitId::Device,
            CapabilityId::VoltageTarget,
            CapabilityAccess::READ_WRITE,
            12.5,
        );
        let cfg = Configurable::discover(
            Arc::new(mock),
            identity(UnitId::Device),
            &DiscoveryConfig::default(),
        );
        let prop = cfg
            .property_as::<DoubleProperty>(CapabilityId::VoltageTarget)
            .unwrap();
        assert_eq!(prop.double_value().unwrap(), 12.5);
        assert!(cfg
            .property_as::<StringProperty>(CapabilityId::VoltageTarget)
            .is_none());
    }

    #[test]
    fn feed_in_meta_stops_at_unknown_key() {
        let mock = MockAdapter::new().with_capability(
            UnitId::Device,
            CapabilityId::Enabled,
            CapabilityAccess::READ_WRITE,
            false,
        );
        let cfg = Configurable::discover(
            Arc::new(mock),
            identity(UnitId::Device),
            &DiscoveryConfig::default(),
        );
        assert!(cfg.feed_in_meta(&[Notification::new(CapabilityId::Enabled, true)]));
        assert!(!cfg.feed_in_meta(&[Notification::new(CapabilityId::Voltage, 1.0)]));
    }
}
