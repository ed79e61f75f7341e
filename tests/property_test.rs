//! Typed access, marshaling and formatting through configurables.

use std::sync::Arc;

use daq_properties::adapter::{CapabilityAccess, UnitId};
use daq_properties::adapters::MockAdapter;
use daq_properties::catalog::{CapabilityId, DeviceType, Quantity, QuantityFlag, ValueKind};
use daq_properties::config::{DiscoveryConfig, PropertiesConfig};
use daq_properties::configurable::{Configurable, ConfigurableIdentity};
use daq_properties::error::DaqError;
use daq_properties::properties::{
    BoolProperty, DoubleProperty, Int32Property, Property, PropertyMetadata, RationalProperty,
    UInt64Property, UInt64RangeProperty,
};
use daq_properties::session::{DeviceInfo, DeviceSession};
use daq_properties::signal::{PropertyEvent, ValueOrigin};
use daq_properties::value::{
    DoubleRange, DynamicValue, Marshal, MeasuredQuantity, NativeValue, Rational, UInt64Range,
};

fn device(mock: MockAdapter) -> (Arc<MockAdapter>, Arc<Configurable>) {
    let mock = Arc::new(mock);
    let cfg = Configurable::discover(
        mock.clone(),
        ConfigurableIdentity {
            index: 0,
            device_name: "Test Device".into(),
            device_type: DeviceType::DemoDev,
            settings_id: "test-device".into(),
            unit: UnitId::Device,
        },
        &DiscoveryConfig::default(),
    );
    (mock, cfg)
}

/// A legal value different from `current`, chosen from cached metadata.
fn candidate(property: &dyn Property, current: &NativeValue) -> Option<NativeValue> {
    match (property.metadata(), current) {
        (_, NativeValue::Bool(v)) => Some(NativeValue::Bool(!v)),
        (PropertyMetadata::DoubleBounds { max, step, .. }, NativeValue::Double(v)) => {
            let next = if *v + step <= max { *v + step } else { *v - step };
            Some(NativeValue::Double(next))
        }
        (PropertyMetadata::Values { values }, _) => {
            values.into_iter().find(|value| value != current)
        }
        _ => None,
    }
}

#[test]
fn round_trip_every_writable_capability() {
    let session = DeviceSession::open(
        Arc::new(MockAdapter::demo_power_supply()),
        DeviceInfo::new("Demo PSU", DeviceType::PowerSupply, "demo-psu"),
        &PropertiesConfig::default(),
    );

    let mut exercised = 0;
    for configurable in session.configurables() {
        for property in configurable.properties() {
            if !(property.is_readable() && property.is_writable()) {
                continue;
            }
            let current = property.value().unwrap();
            let Some(next) = candidate(property.as_ref(), &current) else {
                continue;
            };
            property.change_value(next.clone()).unwrap();
            assert_eq!(property.value().unwrap(), next, "{}", property.capability());
            exercised += 1;
        }
    }
    // ChannelConfig, plus per channel Enabled, both targets, both protection
    // flags and thresholds, plus Range on CH1.
    assert_eq!(exercised, 1 + 2 * 7 + 1);
}

#[test]
fn round_trip_one_capability_of_every_kind() {
    let cases: Vec<(CapabilityId, DynamicValue, NativeValue)> = vec![
        (CapabilityId::Enabled, false.into(), NativeValue::Bool(true)),
        (CapabilityId::NumHDiv, 10i32.into(), NativeValue::Int32(12)),
        (
            CapabilityId::Samplerate,
            1_000u64.into(),
            NativeValue::UInt64(200_000),
        ),
        (
            CapabilityId::VoltageTarget,
            5.0.into(),
            NativeValue::Double(12.5),
        ),
        (
            CapabilityId::Regulation,
            "CV".into(),
            NativeValue::String("CC".into()),
        ),
        (
            CapabilityId::TimeBase,
            Rational::new(1, 1000).to_dynamic(),
            NativeValue::Rational(Rational::new(1, 100)),
        ),
        (
            CapabilityId::MeasuredQuantity,
            MeasuredQuantity::new(Quantity::Voltage, [QuantityFlag::Dc]).to_dynamic(),
            NativeValue::MeasuredQuantity(MeasuredQuantity::new(
                Quantity::Current,
                [QuantityFlag::Ac, QuantityFlag::Rms],
            )),
        ),
        (
            CapabilityId::Range,
            DoubleRange::new(0.0, 10.0).to_dynamic(),
            NativeValue::DoubleRange(DoubleRange::new(0.0, 100.0)),
        ),
        (
            CapabilityId::SplMeasurementRange,
            UInt64Range::new(30, 130).to_dynamic(),
            NativeValue::UInt64Range(UInt64Range::new(40, 120)),
        ),
    ];

    let mock = cases.iter().fold(MockAdapter::new(), |mock, (key, initial, _)| {
        mock.with_capability(UnitId::Device, *key, CapabilityAccess::READ_WRITE, initial.clone())
    });
    let (mock, cfg) = device(mock);

    let mut kinds = Vec::new();
    for (key, _, next) in cases {
        let property = cfg.property(key).unwrap();
        kinds.push(property.kind());
        assert_eq!(property.kind(), next.kind(), "{key}");

        property.change_value(next.clone()).unwrap();
        assert_eq!(property.value().unwrap(), next, "{key}");
        assert_eq!(mock.set_calls(&UnitId::Device, key), 1, "{key}");
    }
    kinds.sort_by_key(|kind| kind.name());
    kinds.dedup();
    assert_eq!(kinds.len(), 9);
    assert!(!kinds.contains(&ValueKind::Unknown));
}

#[test]
fn int32_lists_bounds() {
    let (mock, cfg) = device(
        MockAdapter::new()
            .with_capability(UnitId::Device, CapabilityId::NumHDiv, CapabilityAccess::ALL, 10i32)
            .with_list(
                UnitId::Device,
                CapabilityId::NumHDiv,
                DynamicValue::Tuple(vec![1i32.into(), 20i32.into(), 1i32.into()]),
            ),
    );
    let divisions = cfg
        .property_as::<Int32Property>(CapabilityId::NumHDiv)
        .unwrap();
    assert_eq!((divisions.min(), divisions.max(), divisions.step()), (1, 20, 1));
    assert_eq!(
        divisions.metadata(),
        PropertyMetadata::Int32Bounds {
            min: 1,
            max: 20,
            step: 1
        }
    );
    assert_eq!(divisions.int32_value().unwrap(), 10);
    assert_eq!(divisions.to_string(), "10");

    // A pair where a triple is required keeps the old bounds.
    mock.set_list(
        &UnitId::Device,
        CapabilityId::NumHDiv,
        DynamicValue::Tuple(vec![1i32.into(), 40i32.into()]),
    );
    assert!(matches!(
        divisions.list(),
        Err(DaqError::ArityMismatch { expected: 3, found: 2, .. })
    ));
    assert_eq!(divisions.max(), 20);
}

#[test]
fn uint64_range_lists_and_formats() {
    let (_mock, cfg) = device(
        MockAdapter::new()
            .with_capability(
                UnitId::Device,
                CapabilityId::SplMeasurementRange,
                CapabilityAccess::ALL,
                UInt64Range::new(30, 130).to_dynamic(),
            )
            .with_list(
                UnitId::Device,
                CapabilityId::SplMeasurementRange,
                DynamicValue::Array(vec![
                    UInt64Range::new(30, 130).to_dynamic(),
                    UInt64Range::new(50, 100).to_dynamic(),
                ]),
            ),
    );
    let spl = cfg
        .property_as::<UInt64RangeProperty>(CapabilityId::SplMeasurementRange)
        .unwrap();
    assert_eq!(
        *spl.list_values(),
        vec![UInt64Range::new(30, 130), UInt64Range::new(50, 100)]
    );
    assert_eq!(spl.uint64_range_value().unwrap(), UInt64Range::new(30, 130));
    assert_eq!(spl.to_string(), "30 - 130");

    let mut events = spl.observe();
    let err = spl
        .on_value_changed(&DynamicValue::Tuple(vec![1u64.into(), 2u64.into(), 3u64.into()]))
        .unwrap_err();
    assert!(matches!(err, DaqError::ArityMismatch { expected: 2, found: 3, .. }));
    assert!(events.try_recv().is_err());
}

#[test]
fn change_value_emits_local_edit() {
    let (_mock, cfg) = device(MockAdapter::new().with_capability(
        UnitId::Device,
        CapabilityId::Enabled,
        CapabilityAccess::READ_WRITE,
        false,
    ));
    let property = cfg.property(CapabilityId::Enabled).unwrap();
    let mut events = property.observe();

    property.change_value(NativeValue::Bool(true)).unwrap();
    assert_eq!(
        events.try_recv().unwrap(),
        PropertyEvent::ValueChanged {
            value: NativeValue::Bool(true),
            origin: ValueOrigin::LocalEdit,
        }
    );
}

#[test]
fn wrong_native_kind_is_rejected_before_the_device() {
    let (mock, cfg) = device(MockAdapter::new().with_capability(
        UnitId::Device,
        CapabilityId::VoltageTarget,
        CapabilityAccess::READ_WRITE,
        1.0,
    ));
    let property = cfg.property(CapabilityId::VoltageTarget).unwrap();
    let err = property.change_value(NativeValue::Bool(true)).unwrap_err();
    assert!(matches!(
        err,
        DaqError::TypeMismatch {
            expected: "double",
            found: "bool",
            ..
        }
    ));
    assert_eq!(mock.set_calls(&UnitId::Device, CapabilityId::VoltageTarget), 0);
}

#[test]
fn wrong_dynamic_type_is_a_type_mismatch() {
    let (_mock, cfg) = device(MockAdapter::new().with_capability(
        UnitId::Device,
        CapabilityId::Voltage,
        CapabilityAccess::READ_ONLY,
        "12 V",
    ));
    let err = cfg.property(CapabilityId::Voltage).unwrap().value().unwrap_err();
    assert!(err.is_contract_violation());
    assert!(matches!(err, DaqError::TypeMismatch { found: "string", .. }));
}

#[test]
fn failed_change_leaves_state_unchanged() {
    let mock = MockAdapter::new()
        .with_capability(UnitId::Device, CapabilityId::VoltageTarget, CapabilityAccess::ALL, 5.0)
        .with_list(
            UnitId::Device,
            CapabilityId::VoltageTarget,
            DynamicValue::Tuple(vec![0.0.into(), 30.0.into(), 0.01.into()]),
        );
    let (mock, cfg) = device(mock);
    let property = cfg.property(CapabilityId::VoltageTarget).unwrap();
    let before = property.metadata();
    let mut events = property.observe();

    mock.reject_sets(&UnitId::Device, CapabilityId::VoltageTarget, Some("output locked"));
    let err = property.change_value(NativeValue::Double(12.0)).unwrap_err();

    assert!(matches!(err, DaqError::Adapter { .. }));
    assert!(!err.is_contract_violation());
    assert_eq!(property.value().unwrap(), NativeValue::Double(5.0));
    assert_eq!(property.metadata(), before);
    assert!(events.try_recv().is_err());
}

#[test]
fn failed_list_keeps_previous_cache() {
    let mock = MockAdapter::new()
        .with_capability(UnitId::Device, CapabilityId::CurrentLimit, CapabilityAccess::ALL, 1.0)
        .with_list(
            UnitId::Device,
            CapabilityId::CurrentLimit,
            DynamicValue::Tuple(vec![0.0.into(), 5.0.into(), 0.001.into()]),
        );
    let (mock, cfg) = device(mock);
    let limit = cfg
        .property_as::<DoubleProperty>(CapabilityId::CurrentLimit)
        .unwrap();
    assert_eq!(limit.max(), 5.0);

    // Two elements instead of three.
    mock.set_list(
        &UnitId::Device,
        CapabilityId::CurrentLimit,
        DynamicValue::Tuple(vec![0.0.into(), 9.0.into()]),
    );
    let err = limit.list().unwrap_err();
    assert!(matches!(err, DaqError::ArityMismatch { expected: 3, found: 2, .. }));
    assert_eq!(limit.max(), 5.0);
}

#[test]
fn composite_kinds_enforce_arity() {
    let one = DynamicValue::Tuple(vec![1u64.into()]);
    let three = DynamicValue::Tuple(vec![1u64.into(), 2u64.into(), 3u64.into()]);

    for key in [
        CapabilityId::TimeBase,
        CapabilityId::MeasuredQuantity,
        CapabilityId::Range,
        CapabilityId::SplMeasurementRange,
    ] {
        let (_mock, cfg) = device(MockAdapter::new().with_capability(
            UnitId::Device,
            key,
            CapabilityAccess::READ_ONLY,
            one.clone(),
        ));
        let property = cfg.property(key).unwrap();
        let mut events = property.observe();

        let err = property.value().unwrap_err();
        assert!(
            matches!(err, DaqError::ArityMismatch { expected: 2, found: 1, .. }),
            "{key}: {err}"
        );

        let err = property.on_value_changed(&three).unwrap_err();
        assert!(
            matches!(err, DaqError::ArityMismatch { expected: 2, found: 3, .. }),
            "{key}: {err}"
        );
        assert!(events.try_recv().is_err(), "{key} emitted on bad input");
    }
}

#[test]
fn bool_is_never_enumerable() {
    let (_mock, cfg) = device(MockAdapter::new().with_capability(
        UnitId::Device,
        CapabilityId::HoldMax,
        CapabilityAccess::ALL,
        false,
    ));
    let hold = cfg.property_as::<BoolProperty>(CapabilityId::HoldMax).unwrap();
    assert!(matches!(hold.list(), Err(DaqError::NotEnumerable { .. })));
    assert_eq!(hold.metadata(), PropertyMetadata::None);
}

#[test]
fn rational_formats_with_si_prefix() {
    let (_mock, cfg) = device(
        MockAdapter::new()
            .with_capability(
                UnitId::Device,
                CapabilityId::TimeBase,
                CapabilityAccess::ALL,
                Rational::new(1, 1000).to_dynamic(),
            )
            .with_list(
                UnitId::Device,
                CapabilityId::TimeBase,
                DynamicValue::Array(vec![
                    Rational::new(1, 1000).to_dynamic(),
                    Rational::new(1, 100).to_dynamic(),
                ]),
            ),
    );
    let timebase = cfg
        .property_as::<RationalProperty>(CapabilityId::TimeBase)
        .unwrap();
    assert_eq!(timebase.to_string(), "1 ms");
    assert_eq!(timebase.to_string_value(Rational::new(1, 100)), "10 ms");
    assert_eq!(timebase.list_values().len(), 2);
}

#[test]
fn measured_quantity_formats_name_and_flags() {
    let (_mock, cfg) = device(MockAdapter::new().with_capability(
        UnitId::Device,
        CapabilityId::MeasuredQuantity,
        CapabilityAccess::READ_ONLY,
        MeasuredQuantity::new(Quantity::Voltage, [QuantityFlag::Max, QuantityFlag::Rms, QuantityFlag::Ac])
            .to_dynamic(),
    ));
    let property = cfg.property(CapabilityId::MeasuredQuantity).unwrap();
    assert_eq!(property.to_string(), "Voltage AC RMS max");
}

#[test]
fn range_formats_low_high() {
    let (_mock, cfg) = device(MockAdapter::new().with_capability(
        UnitId::Device,
        CapabilityId::VoltageThreshold,
        CapabilityAccess::READ_ONLY,
        DoubleRange::new(0.8, 2.0).to_dynamic(),
    ));
    let property = cfg.property(CapabilityId::VoltageThreshold).unwrap();
    assert_eq!(property.to_string(), "0.8 - 2 V");
}

#[test]
fn uint64_accepts_value_list() {
    let (_mock, cfg) = device(
        MockAdapter::new()
            .with_capability(UnitId::Device, CapabilityId::Samplerate, CapabilityAccess::ALL, 1_000u64)
            .with_list(
                UnitId::Device,
                CapabilityId::Samplerate,
                DynamicValue::Array(vec![1_000u64.into(), 200_000u64.into(), 1_000_000u64.into()]),
            ),
    );
    let rate = cfg
        .property_as::<UInt64Property>(CapabilityId::Samplerate)
        .unwrap();
    assert_eq!(rate.list_values(), vec![1_000, 200_000, 1_000_000]);
    assert_eq!(rate.min(), 1_000);
    assert_eq!(rate.max(), 1_000_000);
    assert_eq!(rate.to_string_value(200_000), "200.0 kHz");
}

#[test]
fn unreadable_property_formats_empty() {
    let (_mock, cfg) = device(MockAdapter::new().with_capability_no_value(
        UnitId::Device,
        CapabilityId::Voltage,
        CapabilityAccess::READ_ONLY,
    ));
    let property = cfg.property(CapabilityId::Voltage).unwrap();
    assert!(matches!(property.value(), Err(DaqError::Adapter { .. })));
    assert_eq!(property.to_string(), "");
}

#[test]
fn property_outliving_configurable_reports_it() {
    let (_mock, cfg) = device(MockAdapter::new().with_capability(
        UnitId::Device,
        CapabilityId::Voltage,
        CapabilityAccess::READ_ONLY,
        1.0,
    ));
    let property = cfg.property(CapabilityId::Voltage).unwrap();
    drop(cfg);
    assert!(matches!(
        property.value(),
        Err(DaqError::ConfigurableDropped { .. })
    ));
}
