//! Capability identifiers and their static catalog entries.
//!
//! Every identifier resolves through one exhaustive `match` to a
//! [`CapabilityInfo`], so adding a variant without a catalog entry is a
//! compile error rather than a runtime "unknown data type" assertion.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::units::Unit;

/// The closed set of value kinds a capability can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueKind {
    /// `bool`
    Bool,
    /// `i32`
    Int32,
    /// `u64`
    UInt64,
    /// `f64`
    Double,
    /// Free text or one of an enumerated set of strings.
    String,
    /// Numerator/denominator pair of `u64`.
    Rational,
    /// Quantity id plus a set of quantity flags.
    MeasuredQuantity,
    /// `(low, high)` pair of `f64`.
    DoubleRange,
    /// `(low, high)` pair of `u64`.
    UInt64Range,
    /// Sentinel for protocol capabilities this catalog does not model.
    Unknown,
}

impl ValueKind {
    /// Short lowercase name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int32 => "int32",
            ValueKind::UInt64 => "uint64",
            ValueKind::Double => "double",
            ValueKind::String => "string",
            ValueKind::Rational => "rational",
            ValueKind::MeasuredQuantity => "measured quantity",
            ValueKind::DoubleRange => "double range",
            ValueKind::UInt64Range => "uint64 range",
            ValueKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static description of one capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityInfo {
    /// Human-readable name.
    pub name: &'static str,
    /// Identifier the device protocol uses for this capability.
    pub protocol_key: &'static str,
    /// Value kind carried by the capability.
    pub kind: ValueKind,
    /// Physical unit of the value.
    pub unit: Unit,
}

const fn entry(
    name: &'static str,
    protocol_key: &'static str,
    kind: ValueKind,
    unit: Unit,
) -> CapabilityInfo {
    CapabilityInfo {
        name,
        protocol_key,
        kind,
        unit,
    }
}

/// Identifier of a configurable device attribute.
///
/// `Other` carries a raw protocol id for capabilities the catalog does not
/// know; those resolve to [`ValueKind::Unknown`] and are skipped by discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum CapabilityId {
    Samplerate,
    CaptureRatio,
    PatternMode,
    Rle,
    TriggerSlope,
    Averaging,
    AvgSamples,
    TriggerSource,
    HorizTriggerPos,
    BufferSize,
    TimeBase,
    Filter,
    VDiv,
    Coupling,
    TriggerMatch,
    SampleInterval,
    NumHDiv,
    NumVDiv,
    SplWeightFreq,
    SplWeightTime,
    SplMeasurementRange,
    HoldMax,
    HoldMin,
    VoltageThreshold,
    ExternalClock,
    Swap,
    CenterFrequency,
    NumLogicChannels,
    NumAnalogChannels,
    Voltage,
    VoltageTarget,
    Current,
    CurrentLimit,
    Enabled,
    ChannelConfig,
    OverVoltageProtectionEnabled,
    OverVoltageProtectionActive,
    OverVoltageProtectionThreshold,
    OverCurrentProtectionEnabled,
    OverCurrentProtectionActive,
    OverCurrentProtectionThreshold,
    OverTemperatureProtectionEnabled,
    OverTemperatureProtectionActive,
    UnderVoltageConditionEnabled,
    UnderVoltageConditionActive,
    UnderVoltageConditionThreshold,
    ClockEdge,
    Amplitude,
    Regulation,
    OutputFrequency,
    OutputFrequencyTarget,
    MeasuredQuantity,
    EquivCircuitModel,
    TriggerLevel,
    ExternalClockSource,
    Offset,
    TriggerPattern,
    HighResolution,
    PeakDetection,
    LogicThreshold,
    LogicThresholdCustom,
    Range,
    Digits,
    SessionFile,
    CaptureFile,
    CaptureUnitSize,
    PowerOff,
    DataSource,
    ProbeFactor,
    AdcPowerlineCycles,
    DataLog,
    DeviceMode,
    TestMode,
    /// Protocol capability not modeled by the catalog.
    Other(u32),
}

impl CapabilityId {
    /// Every catalogued identifier, in declaration order.
    pub const ALL: &'static [CapabilityId] = &[
        CapabilityId::Samplerate,
        CapabilityId::CaptureRatio,
        CapabilityId::PatternMode,
        CapabilityId::Rle,
        CapabilityId::TriggerSlope,
        CapabilityId::Averaging,
        CapabilityId::AvgSamples,
        CapabilityId::TriggerSource,
        CapabilityId::HorizTriggerPos,
        CapabilityId::BufferSize,
        CapabilityId::TimeBase,
        CapabilityId::Filter,
        CapabilityId::VDiv,
        CapabilityId::Coupling,
        CapabilityId::TriggerMatch,
        CapabilityId::SampleInterval,
        CapabilityId::NumHDiv,
        CapabilityId::NumVDiv,
        CapabilityId::SplWeightFreq,
        CapabilityId::SplWeightTime,
        CapabilityId::SplMeasurementRange,
        CapabilityId::HoldMax,
        CapabilityId::HoldMin,
        CapabilityId::VoltageThreshold,
        CapabilityId::ExternalClock,
        CapabilityId::Swap,
        CapabilityId::CenterFrequency,
        CapabilityId::NumLogicChannels,
        CapabilityId::NumAnalogChannels,
        CapabilityId::Voltage,
        CapabilityId::VoltageTarget,
        CapabilityId::Current,
        CapabilityId::CurrentLimit,
        CapabilityId::Enabled,
        CapabilityId::ChannelConfig,
        CapabilityId::OverVoltageProtectionEnabled,
        CapabilityId::OverVoltageProtectionActive,
        CapabilityId::OverVoltageProtectionThreshold,
        CapabilityId::OverCurrentProtectionEnabled,
        CapabilityId::OverCurrentProtectionActive,
        CapabilityId::OverCurrentProtectionThreshold,
        CapabilityId::OverTemperatureProtectionEnabled,
        CapabilityId::OverTemperatureProtectionActive,
        CapabilityId::UnderVoltageConditionEnabled,
        CapabilityId::UnderVoltageConditionActive,
        CapabilityId::UnderVoltageConditionThreshold,
        CapabilityId::ClockEdge,
        CapabilityId::Amplitude,
        CapabilityId::Regulation,
        CapabilityId::OutputFrequency,
        CapabilityId::OutputFrequencyTarget,
        CapabilityId::MeasuredQuantity,
        CapabilityId::EquivCircuitModel,
        CapabilityId::TriggerLevel,
        CapabilityId::ExternalClockSource,
        CapabilityId::Offset,
        CapabilityId::TriggerPattern,
        CapabilityId::HighResolution,
        CapabilityId::PeakDetection,
        CapabilityId::LogicThreshold,
        CapabilityId::LogicThresholdCustom,
        CapabilityId::Range,
        CapabilityId::Digits,
        CapabilityId::SessionFile,
        CapabilityId::CaptureFile,
        CapabilityId::CaptureUnitSize,
        CapabilityId::PowerOff,
        CapabilityId::DataSource,
        CapabilityId::ProbeFactor,
        CapabilityId::AdcPowerlineCycles,
        CapabilityId::DataLog,
        CapabilityId::DeviceMode,
        CapabilityId::TestMode,
    ];

    /// Catalog entry for this identifier.
    pub const fn info(self) -> CapabilityInfo {
        use CapabilityId as C;
        use Unit as U;
        use ValueKind as K;

        match self {
            C::Samplerate => entry("Samplerate", "samplerate", K::UInt64, U::Hertz),
            C::CaptureRatio => entry("Capture Ratio", "captureratio", K::UInt64, U::Unitless),
            C::PatternMode => entry("Pattern Mode", "pattern", K::String, U::Unitless),
            C::Rle => entry("Run-Length Encoding", "rle", K::Bool, U::Boolean),
            C::TriggerSlope => entry("Trigger Slope", "triggerslope", K::String, U::Unitless),
            C::Averaging => entry("Averaging", "averaging", K::Bool, U::Boolean),
            C::AvgSamples => entry("Averaging Samples", "avg_samples", K::UInt64, U::Unitless),
            C::TriggerSource => entry("Trigger Source", "triggersource", K::String, U::Unitless),
            C::HorizTriggerPos => {
                entry("Horizonal Trigger Position", "horiz_triggerpos", K::Double, U::Unknown)
            }
            C::BufferSize => entry("Buffer Size", "buffersize", K::UInt64, U::Unknown),
            C::TimeBase => entry("Time Base", "timebase", K::Rational, U::Second),
            C::Filter => entry("Filter", "filter", K::Bool, U::Boolean),
            C::VDiv => entry("Vertical Division", "vdiv", K::Rational, U::Volt),
            C::Coupling => entry("Coupling", "coupling", K::String, U::Unitless),
            C::TriggerMatch => entry("Trigger Match", "triggermatch", K::Int32, U::Unknown),
            C::SampleInterval => {
                entry("Sample Interval", "sample_interval", K::UInt64, U::Second)
            }
            C::NumHDiv => entry("Number Horizontal Divisions", "num_hdiv", K::Int32, U::Unitless),
            C::NumVDiv => entry("Number Vertical Divisions", "num_vdiv", K::Int32, U::Unitless),
            C::SplWeightFreq => {
                entry("SPL-Weight Frequency", "spl_weight_freq", K::String, U::Unitless)
            }
            C::SplWeightTime => entry("SPL-Weight Time", "spl_weight_time", K::String, U::Unitless),
            C::SplMeasurementRange => {
                entry("SPL Measurement Range", "spl_meas_range", K::UInt64Range, U::Unknown)
            }
            C::HoldMax => entry("Hold Max", "hold_max", K::Bool, U::Boolean),
            C::HoldMin => entry("Hold Min", "hold_min", K::Bool, U::Boolean),
            C::VoltageThreshold => {
                entry("Voltage Threshold", "voltage_threshold", K::DoubleRange, U::Volt)
            }
            C::ExternalClock => entry("External Clock", "external_clock", K::Bool, U::Boolean),
            C::Swap => entry("Swap", "swap", K::Bool, U::Boolean),
            C::CenterFrequency => {
                entry("Center Frequency", "center_frequency", K::UInt64, U::Hertz)
            }
            C::NumLogicChannels => {
                entry("Number of Logic Channels", "logic_channels", K::Int32, U::Unitless)
            }
            C::NumAnalogChannels => {
                entry("Number of Analog Channels", "analog_channels", K::Int32, U::Unitless)
            }
            C::Voltage => entry("Voltage", "voltage", K::Double, U::Volt),
            C::VoltageTarget => entry("Voltage Target", "voltage_target", K::Double, U::Volt),
            C::Current => entry("Current", "current", K::Double, U::Ampere),
            C::CurrentLimit => entry("Current Limit", "current_limit", K::Double, U::Ampere),
            C::Enabled => entry("Enabled", "enabled", K::Bool, U::Boolean),
            C::ChannelConfig => entry("ChannelConfig", "channel_config", K::String, U::Unitless),
            C::OverVoltageProtectionEnabled => entry(
                "Over Voltage Protection Enabled",
                "ovp_enabled",
                K::Bool,
                U::Boolean,
            ),
            C::OverVoltageProtectionActive => entry(
                "Over Voltage Protection Active",
                "ovp_active",
                K::Bool,
                U::Boolean,
            ),
            C::OverVoltageProtectionThreshold => entry(
                "Over Voltage Protection Threshold",
                "ovp_threshold",
                K::Double,
                U::Volt,
            ),
            C::OverCurrentProtectionEnabled => entry(
                "Over Current Protection Enabled",
                "ocp_enabled",
                K::Bool,
                U::Boolean,
            ),
            C::OverCurrentProtectionActive => entry(
                "Over Current Protection Active",
                "ocp_active",
                K::Bool,
                U::Boolean,
            ),
            C::OverCurrentProtectionThreshold => entry(
                "Over Current Protection Threshold",
                "ocp_threshold",
                K::Double,
                U::Ampere,
            ),
            C::OverTemperatureProtectionEnabled => entry(
                "Over Temperature Protection Enabled",
                "otp_enabled",
                K::Bool,
                U::Boolean,
            ),
            C::OverTemperatureProtectionActive => entry(
                "Over Temperature Protection Active",
                "otp_active",
                K::Bool,
                U::Boolean,
            ),
            C::UnderVoltageConditionEnabled => entry(
                "Under Voltage Condition Enabled",
                "uvc_enabled",
                K::Bool,
                U::Boolean,
            ),
            C::UnderVoltageConditionActive => entry(
                "Under Voltage Condition Active",
                "uvc_active",
                K::Bool,
                U::Boolean,
            ),
            C::UnderVoltageConditionThreshold => entry(
                "Under Voltage Condition Threshold",
                "uvc_threshold",
                K::Double,
                U::Volt,
            ),
            C::ClockEdge => entry("Clock Edge", "clock_edge", K::String, U::Unitless),
            C::Amplitude => entry("Amplitude", "amplitude", K::Double, U::Unknown),
            C::Regulation => entry("Regulation", "regulation", K::String, U::Unitless),
            C::OutputFrequency => {
                entry("Output Frequency", "output_frequency", K::Double, U::Hertz)
            }
            C::OutputFrequencyTarget => entry(
                "Output Frequency Target",
                "output_frequency_target",
                K::Double,
                U::Hertz,
            ),
            C::MeasuredQuantity => entry(
                "Measured Quantity",
                "measured_quantity",
                K::MeasuredQuantity,
                U::Unitless,
            ),
            C::EquivCircuitModel => {
                entry("Equivalent Circuit Model", "equiv_circuit_model", K::String, U::Unitless)
            }
            C::TriggerLevel => entry("Trigger Level", "triggerlevel", K::Double, U::Volt),
            C::ExternalClockSource => {
                entry("External Clock Source", "external_clock_source", K::String, U::Unitless)
            }
            C::Offset => entry("Offset", "offset", K::Double, U::Unknown),
            C::TriggerPattern => entry("Trigger Pattern", "triggerpattern", K::String, U::Unitless),
            C::HighResolution => entry("High Resolution", "highresolution", K::Bool, U::Unitless),
            C::PeakDetection => entry("Peak Detection", "peakdetection", K::Bool, U::Unitless),
            C::LogicThreshold => {
                entry("Logic Threshold", "logic_threshold", K::String, U::Unitless)
            }
            C::LogicThresholdCustom => entry(
                "Logic Threshold Custom",
                "logic_threshold_custom",
                K::Double,
                U::Volt,
            ),
            // Legal ranges are (low, high) pairs whose unit follows the
            // currently measured quantity.
            C::Range => entry("Range", "range", K::DoubleRange, U::Unitless),
            C::Digits => entry("Digits", "digits", K::String, U::Unitless),
            C::SessionFile => entry("Session File", "sessionfile", K::String, U::Unitless),
            C::CaptureFile => entry("Capture File", "capturefile", K::String, U::Unitless),
            C::CaptureUnitSize => {
                entry("Capture Unit Size", "capture_unitsize", K::UInt64, U::Unknown)
            }
            C::PowerOff => entry("Power Off", "power_off", K::Bool, U::Boolean),
            C::DataSource => entry("Data Source", "data_source", K::String, U::Unitless),
            C::ProbeFactor => entry("Probe Factor", "probe_factor", K::UInt64, U::Unitless),
            C::AdcPowerlineCycles => {
                entry("ADC Powerline Cycles", "nplc", K::Double, U::Unitless)
            }
            C::DataLog => entry("Data Log", "datalog", K::Bool, U::Boolean),
            C::DeviceMode => entry("Device Mode", "device_mode", K::String, U::Unitless),
            C::TestMode => entry("Test Mode", "test_mode", K::String, U::Unitless),
            C::Other(_) => entry("Unknown", "", K::Unknown, U::Unknown),
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Value kind carried by this capability.
    pub fn kind(self) -> ValueKind {
        self.info().kind
    }

    /// Physical unit of this capability's value.
    pub fn unit(self) -> Unit {
        self.info().unit
    }

    /// Resolve a protocol identifier (e.g. `"voltage_target"`).
    pub fn from_protocol_key(key: &str) -> Option<CapabilityId> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.info().protocol_key == key)
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityId::Other(raw) => write!(f, "Unknown({})", raw),
            id => f.write_str(id.name()),
        }
    }
}
