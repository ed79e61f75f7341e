//! Automatic metadata refresh between properties of one configurable.
//!
//! Some devices narrow the legal values of one capability according to the
//! current value of another: a multimeter's ranges follow the selected
//! measured quantity, a power supply's voltage and current limits follow its
//! output range. Each [`DependencyRule`] names such a driver and the
//! capabilities whose lists it drives.
//!
//! [`wire_dependencies`] connects a listener to the driver's signal that
//! calls `list()` on every enumerable dependent whenever the driver's value
//! changes, whether through `change_value` or a device notification. The
//! listener runs synchronously, so the dependent's cache is fresh by the
//! time the triggering call returns.

use std::sync::{Arc, Weak};
use tracing::{debug, warn};

use crate::catalog::{CapabilityId, DeviceType};
use crate::configurable::Configurable;
use crate::properties::Property;
use crate::signal::PropertyEvent;

/// A driver capability and the capabilities whose legal values follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyRule {
    /// Capability whose value changes trigger the refresh.
    pub driver: CapabilityId,
    /// Capabilities re-listed after each change.
    pub dependents: &'static [CapabilityId],
    /// Device categories the rule applies to, `None` for every category.
    pub device_types: Option<&'static [DeviceType]>,
}

impl DependencyRule {
    /// Whether the rule is wired on devices of `device_type`.
    pub fn applies_to(&self, device_type: DeviceType) -> bool {
        self.device_types
            .map_or(true, |types| types.contains(&device_type))
    }
}

/// Known dependencies.
pub const RULES: &[DependencyRule] = &[
    DependencyRule {
        driver: CapabilityId::MeasuredQuantity,
        dependents: &[CapabilityId::Range],
        device_types: None,
    },
    DependencyRule {
        driver: CapabilityId::Range,
        dependents: &[
            CapabilityId::VoltageTarget,
            CapabilityId::CurrentLimit,
            CapabilityId::OverVoltageProtectionThreshold,
            CapabilityId::OverCurrentProtectionThreshold,
            CapabilityId::UnderVoltageConditionThreshold,
        ],
        device_types: Some(&[DeviceType::PowerSupply, DeviceType::ElectronicLoad]),
    },
];

/// Rules whose driver is `key`.
pub fn rules_for(key: CapabilityId) -> impl Iterator<Item = &'static DependencyRule> {
    RULES.iter().filter(move |rule| rule.driver == key)
}

/// Wire every applicable rule on `configurable`.
///
/// A pair is wired when the rule applies to the configurable's device
/// type, both properties exist and the dependent is enumerable. Returns the
/// number of pairs wired.
pub fn wire_dependencies(configurable: &Configurable) -> usize {
    let mut wired = 0;
    for rule in RULES {
        if !rule.applies_to(configurable.device_type()) {
            continue;
        }
        let Some(driver) = configurable.property(rule.driver) else {
            continue;
        };
        for &dependent_key in rule.dependents {
            let Some(dependent) = configurable.property(dependent_key) else {
                continue;
            };
            if !dependent.is_enumerable() {
                continue;
            }
            wire(&driver, &dependent);
            wired += 1;
        }
    }
    if wired > 0 {
        debug!(
            configurable = %configurable.display_name(),
            pairs = wired,
            "Wired property dependencies"
        );
    }
    wired
}

/// Re-list `dependent` whenever `driver`'s value changes.
pub fn wire(driver: &Arc<dyn Property>, dependent: &Arc<dyn Property>) {
    let driver_key = driver.capability();
    let dependent_key = dependent.capability();
    // Weak: the configurable owns both properties.
    let target: Weak<dyn Property> = Arc::downgrade(dependent);

    driver.signal().connect(move |event| {
        if !matches!(event, PropertyEvent::ValueChanged { .. }) {
            return;
        }
        let Some(dependent) = target.upgrade() else {
            return;
        };
        if let Err(err) = dependent.list() {
            warn!(
                driver = %driver_key,
                dependent = %dependent_key,
                error = %err,
                "Dependent list refresh failed"
            );
        }
    });
}
