//! Discovery builds exactly one property per recognised capability.

use std::collections::BTreeSet;
use std::sync::Arc;

use daq_properties::adapter::{CapabilityAccess, DeviceAdapter, UnitId};
use daq_properties::adapters::MockAdapter;
use daq_properties::catalog::{CapabilityId, DeviceType, ValueKind};
use daq_properties::config::{DiscoveryConfig, PropertiesConfig};
use daq_properties::configurable::{AccessKind, Configurable, ConfigurableIdentity};
use daq_properties::properties::{Property, PropertyMetadata, StringProperty};
use daq_properties::session::{DeviceInfo, DeviceSession};
use daq_properties::value::DynamicValue;
use tracing_test::traced_test;

fn identity(unit: UnitId) -> ConfigurableIdentity {
    ConfigurableIdentity {
        index: 0,
        device_name: "Test Device".into(),
        device_type: DeviceType::DemoDev,
        settings_id: "test-device".into(),
        unit,
    }
}

#[test]
fn every_recognised_capability_has_one_property() {
    let mock = Arc::new(MockAdapter::demo_power_supply());
    let session = DeviceSession::open(
        mock.clone(),
        DeviceInfo::new("Demo PSU", DeviceType::PowerSupply, "demo-psu"),
        &PropertiesConfig::default(),
    );

    for configurable in session.configurables() {
        let unit = configurable.unit().clone();
        let reported = mock.config_keys(&unit);
        let recognised: Vec<_> = reported
            .iter()
            .copied()
            .filter(|key| key.kind() != ValueKind::Unknown)
            .collect();

        assert_eq!(configurable.keys(), recognised.as_slice(), "unit {:?}", unit);

        for key in recognised {
            let property = configurable.property(key).unwrap();
            let access = mock.capability_access(&unit, key);
            assert_eq!(property.capability(), key);
            assert_eq!(property.is_readable(), access.readable, "{key}");
            assert_eq!(property.is_writable(), access.writable, "{key}");
            assert_eq!(property.is_enumerable(), access.enumerable, "{key}");
            assert_eq!(configurable.has_get_config(key), access.readable);
            assert_eq!(configurable.has_set_config(key), access.writable);
            assert_eq!(configurable.has_list_config(key), access.enumerable);
        }
    }

    // The uncatalogued id on the device level is skipped.
    assert!(session.device().property(CapabilityId::Other(30_001)).is_none());
}

#[test]
fn capability_sets_by_access_kind() {
    let mock = MockAdapter::new()
        .with_capability(UnitId::Device, CapabilityId::Voltage, CapabilityAccess::READ_ONLY, 0.0)
        .with_capability(UnitId::Device, CapabilityId::Enabled, CapabilityAccess::READ_WRITE, true)
        .with_capability(
            UnitId::Device,
            CapabilityId::Regulation,
            CapabilityAccess::ALL,
            "CV",
        );
    let cfg = Configurable::discover(
        Arc::new(mock),
        identity(UnitId::Device),
        &DiscoveryConfig {
            initial_list: false,
            wire_dependencies: false,
        },
    );

    let read = cfg.capabilities(AccessKind::Read);
    let write = cfg.capabilities(AccessKind::Write);
    let list = cfg.capabilities(AccessKind::Enumerate);
    assert_eq!(read.len(), 3);
    assert_eq!(
        write,
        BTreeSet::from([CapabilityId::Enabled, CapabilityId::Regulation])
    );
    assert!(list.contains(&CapabilityId::Regulation));
    assert_eq!(list.len(), 1);
    assert!(cfg.is_controllable());
}

#[test]
fn initial_list_fills_metadata() {
    let mock = Arc::new(MockAdapter::demo_power_supply());
    let ch2 = Configurable::discover(
        mock,
        identity(UnitId::ChannelGroup("CH2".into())),
        &DiscoveryConfig::default(),
    );
    let target = ch2.property(CapabilityId::VoltageTarget).unwrap();
    assert_eq!(
        target.metadata(),
        PropertyMetadata::DoubleBounds {
            min: 0.0,
            max: 30.0,
            step: 0.001,
            digits: Some(5),
            decimal_places: 3,
        }
    );
}

#[test]
fn string_without_list_falls_back_to_free_text() {
    let mock = Arc::new(MockAdapter::new().with_capability(
        UnitId::Device,
        CapabilityId::Regulation,
        CapabilityAccess::ALL,
        "CC",
    ));
    let cfg = Configurable::discover(
        mock.clone(),
        identity(UnitId::Device),
        &DiscoveryConfig::default(),
    );
    let regulation = cfg
        .property_as::<StringProperty>(CapabilityId::Regulation)
        .unwrap();
    // Flags still mirror the adapter; only the cached list is empty.
    assert!(mock.capability_access(&UnitId::Device, CapabilityId::Regulation).enumerable);
    assert!(cfg.has_list_config(CapabilityId::Regulation));
    assert!(regulation.is_enumerable());
    assert!(regulation.list_values().is_none());
    assert_eq!(regulation.metadata(), PropertyMetadata::FreeText);
    assert_eq!(regulation.string_value().unwrap(), "CC");

    // Once the device can list, the property becomes enumerated again.
    mock.set_list(
        &UnitId::Device,
        CapabilityId::Regulation,
        DynamicValue::Array(vec!["CC".into(), "CV".into()]),
    );
    regulation.list().unwrap();
    assert_eq!(
        regulation.list_values().as_deref(),
        Some(&vec!["CC".to_string(), "CV".to_string()])
    );
}

#[test]
fn disabled_initial_list_leaves_defaults() {
    let mock = Arc::new(MockAdapter::demo_power_supply());
    let ch2 = Configurable::discover(
        mock,
        identity(UnitId::ChannelGroup("CH2".into())),
        &DiscoveryConfig {
            initial_list: false,
            wire_dependencies: true,
        },
    );
    let target = ch2.property(CapabilityId::VoltageTarget).unwrap();
    assert!(matches!(
        target.metadata(),
        PropertyMetadata::DoubleBounds { digits: None, decimal_places: 3, .. }
    ));
}

#[test]
fn session_snapshot_serializes() {
    let session = DeviceSession::open(
        Arc::new(MockAdapter::demo_power_supply()),
        DeviceInfo::new("Demo PSU", DeviceType::PowerSupply, "demo-psu"),
        &PropertiesConfig::default(),
    );
    let snapshot = session.snapshot();
    let names: Vec<_> = snapshot.iter().map(|c| c.display_name.as_str()).collect();
    assert_eq!(names, ["Demo PSU", "CH1", "CH2"]);

    let target = snapshot[1]
        .properties
        .iter()
        .find(|p| p.capability == CapabilityId::VoltageTarget)
        .unwrap();
    assert!(target.writable);
    assert_eq!(target.display.as_deref(), Some("5.000 V"));

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json.as_array().map(Vec::len), Some(3));
}

#[traced_test]
#[test]
fn enumerable_bool_is_not_listed_at_discovery() {
    let cfg = Configurable::discover(
        Arc::new(MockAdapter::new().with_capability(
            UnitId::Device,
            CapabilityId::HoldMax,
            CapabilityAccess::ALL,
            false,
        )),
        identity(UnitId::Device),
        &DiscoveryConfig::default(),
    );
    let hold = cfg.property(CapabilityId::HoldMax).unwrap();
    assert!(hold.is_enumerable());
    assert_eq!(hold.metadata(), PropertyMetadata::None);
    assert!(!logs_contain("Initial list failed"));
}
