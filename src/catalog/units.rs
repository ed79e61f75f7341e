//! Physical units, measured quantities, quantity flags and device categories.
//!
//! These are pure data tables. Quantities and flags also carry the numeric
//! identifiers the device protocol uses for them, so measured-quantity
//! values can be marshaled to and from the adapter's dynamic container.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Physical unit of a capability value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum Unit {
    Volt,
    Ampere,
    Ohm,
    Farad,
    Kelvin,
    Celsius,
    Fahrenheit,
    Hertz,
    Percentage,
    Boolean,
    Second,
    Siemens,
    DecibelMw,
    DecibelVolt,
    Unitless,
    DecibelSpl,
    Concentration,
    RevolutionsPerMinute,
    VoltAmpere,
    Watt,
    WattHour,
    Joule,
    AmpereHour,
    Coulomb,
    MeterPerSecond,
    HectoPascal,
    Humidity293K,
    Degree,
    Henry,
    Gram,
    Carat,
    Ounce,
    TroyOunce,
    Pound,
    Pennyweight,
    Grain,
    Tael,
    Momme,
    Tola,
    Piece,
    Unknown,
}

impl Unit {
    /// Symbol printed after a value.
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Volt => "V",
            Unit::Ampere => "A",
            Unit::Ohm => "\u{2126}",
            Unit::Farad => "F",
            Unit::Kelvin => "K",
            Unit::Celsius => "°C",
            Unit::Fahrenheit => "°F",
            Unit::Hertz => "Hz",
            Unit::Percentage => "%",
            Unit::Boolean => "bool",
            Unit::Second => "s",
            Unit::Siemens => "S",
            Unit::DecibelMw => "dBm",
            Unit::DecibelVolt => "dBV",
            Unit::Unitless => "",
            Unit::DecibelSpl => "dB",
            Unit::Concentration => "ppx",
            Unit::RevolutionsPerMinute => "RPM",
            Unit::VoltAmpere => "VA",
            Unit::Watt => "W",
            Unit::WattHour => "Wh",
            Unit::Joule => "J",
            Unit::AmpereHour => "Ah",
            Unit::Coulomb => "C",
            Unit::MeterPerSecond => "m/s",
            Unit::HectoPascal => "hPa",
            Unit::Humidity293K => "%",
            Unit::Degree => "°",
            Unit::Henry => "H",
            Unit::Gram => "g",
            Unit::Carat => "ct",
            Unit::Ounce => "oz.",
            Unit::TroyOunce => "oz.tr.",
            Unit::Pound => "lb",
            Unit::Pennyweight => "dwt.",
            Unit::Grain => "gr.",
            Unit::Tael => "\u{4E24}",
            Unit::Momme => "\u{5301}",
            Unit::Tola => "tola",
            Unit::Piece => "pc.",
            Unit::Unknown => "??",
        }
    }

    /// Whether values in this unit are printed with a unit suffix.
    pub fn has_suffix(self) -> bool {
        !matches!(self, Unit::Unknown | Unit::Unitless)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// The physical quantity an instrument measures or regulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum Quantity {
    Voltage,
    Current,
    Resistance,
    Capacitance,
    Temperature,
    Frequency,
    DutyCycle,
    Continuity,
    PulseWidth,
    Conductance,
    Power,
    Gain,
    SoundPressureLevel,
    CarbonMonoxide,
    RelativeHumidity,
    Time,
    WindSpeed,
    Pressure,
    ParallelInductance,
    ParallelCapacitance,
    ParallelResistance,
    SeriesInductance,
    SeriesCapacitance,
    SeriesResistance,
    DissipationFactor,
    QualityFactor,
    PhaseAngle,
    Difference,
    Count,
    PowerFactor,
    ApparentPower,
    Mass,
    HarmonicRatio,
    Energy,
    ElectricCharge,
    Unknown,
}

/// Protocol id of the first quantity; the rest follow in declaration order.
const QUANTITY_ID_BASE: u32 = 10_000;

impl Quantity {
    const KNOWN: [Quantity; 35] = [
        Quantity::Voltage,
        Quantity::Current,
        Quantity::Resistance,
        Quantity::Capacitance,
        Quantity::Temperature,
        Quantity::Frequency,
        Quantity::DutyCycle,
        Quantity::Continuity,
        Quantity::PulseWidth,
        Quantity::Conductance,
        Quantity::Power,
        Quantity::Gain,
        Quantity::SoundPressureLevel,
        Quantity::CarbonMonoxide,
        Quantity::RelativeHumidity,
        Quantity::Time,
        Quantity::WindSpeed,
        Quantity::Pressure,
        Quantity::ParallelInductance,
        Quantity::ParallelCapacitance,
        Quantity::ParallelResistance,
        Quantity::SeriesInductance,
        Quantity::SeriesCapacitance,
        Quantity::SeriesResistance,
        Quantity::DissipationFactor,
        Quantity::QualityFactor,
        Quantity::PhaseAngle,
        Quantity::Difference,
        Quantity::Count,
        Quantity::PowerFactor,
        Quantity::ApparentPower,
        Quantity::Mass,
        Quantity::HarmonicRatio,
        Quantity::Energy,
        Quantity::ElectricCharge,
    ];

    /// Protocol id, `0` for [`Quantity::Unknown`].
    pub fn protocol_id(self) -> u32 {
        Self::KNOWN
            .iter()
            .position(|q| *q == self)
            .map_or(0, |pos| QUANTITY_ID_BASE + pos as u32)
    }

    /// Decode a protocol id; unrecognised ids map to [`Quantity::Unknown`].
    pub fn from_protocol_id(id: u32) -> Quantity {
        id.checked_sub(QUANTITY_ID_BASE)
            .and_then(|pos| Self::KNOWN.get(pos as usize).copied())
            .unwrap_or(Quantity::Unknown)
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Quantity::Voltage => "Voltage",
            Quantity::Current => "Current",
            Quantity::Resistance => "Resistance",
            Quantity::Capacitance => "Capacitance",
            Quantity::Temperature => "Temperature",
            Quantity::Frequency => "Frequency",
            Quantity::DutyCycle => "Duty Cycle",
            Quantity::Continuity => "Continuity",
            Quantity::PulseWidth => "Pulse Width",
            Quantity::Conductance => "Conductance",
            Quantity::Power => "Power",
            Quantity::Gain => "Gain",
            Quantity::SoundPressureLevel => "Sound Pressure Level",
            Quantity::CarbonMonoxide => "Carbon Monoxide",
            Quantity::RelativeHumidity => "Relative Humidity",
            Quantity::Time => "Time",
            Quantity::WindSpeed => "Wind Speed",
            Quantity::Pressure => "Pressure",
            Quantity::ParallelInductance => "Parallel Inductance",
            Quantity::ParallelCapacitance => "Parallel Capacitance",
            Quantity::ParallelResistance => "Parallel Resistance",
            Quantity::SeriesInductance => "Series Inductance",
            Quantity::SeriesCapacitance => "Series Capacitance",
            Quantity::SeriesResistance => "Series Resistance",
            Quantity::DissipationFactor => "Dissipation Factor",
            Quantity::QualityFactor => "Quality Factor",
            Quantity::PhaseAngle => "Phase Angle",
            Quantity::Difference => "Difference",
            Quantity::Count => "Count",
            Quantity::PowerFactor => "Power Factor",
            Quantity::ApparentPower => "Apparent Power",
            Quantity::Mass => "Mass",
            Quantity::HarmonicRatio => "Harmonic Ratio",
            Quantity::Energy => "Energy",
            Quantity::ElectricCharge => "Electric Charge",
            Quantity::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Qualifier of a measured quantity (AC, RMS, hold mode, ...).
///
/// Declaration order matches bit order in the protocol bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum QuantityFlag {
    Ac,
    Dc,
    Rms,
    Diode,
    Hold,
    Max,
    Min,
    Autorange,
    Relative,
    SplFreqWeightA,
    SplFreqWeightC,
    SplFreqWeightZ,
    SplFreqWeightFlat,
    SplTimeWeightS,
    SplTimeWeightF,
    SplLat,
    SplPctOverAlarm,
    Duration,
    Avg,
    Reference,
    Unstable,
    FourWire,
    Unknown,
}

impl QuantityFlag {
    const KNOWN: [QuantityFlag; 22] = [
        QuantityFlag::Ac,
        QuantityFlag::Dc,
        QuantityFlag::Rms,
        QuantityFlag::Diode,
        QuantityFlag::Hold,
        QuantityFlag::Max,
        QuantityFlag::Min,
        QuantityFlag::Autorange,
        QuantityFlag::Relative,
        QuantityFlag::SplFreqWeightA,
        QuantityFlag::SplFreqWeightC,
        QuantityFlag::SplFreqWeightZ,
        QuantityFlag::SplFreqWeightFlat,
        QuantityFlag::SplTimeWeightS,
        QuantityFlag::SplTimeWeightF,
        QuantityFlag::SplLat,
        QuantityFlag::SplPctOverAlarm,
        QuantityFlag::Duration,
        QuantityFlag::Avg,
        QuantityFlag::Reference,
        QuantityFlag::Unstable,
        QuantityFlag::FourWire,
    ];

    /// Flags printed before all others, in this order.
    const LEADING: [QuantityFlag; 6] = [
        QuantityFlag::Ac,
        QuantityFlag::Dc,
        QuantityFlag::Rms,
        QuantityFlag::Min,
        QuantityFlag::Max,
        QuantityFlag::Avg,
    ];

    /// Protocol bit for this flag, `0` for [`QuantityFlag::Unknown`].
    pub fn bit(self) -> u64 {
        Self::KNOWN
            .iter()
            .position(|f| *f == self)
            .map_or(0, |pos| 1u64 << pos)
    }

    /// Encode a flag set into the protocol bitmask.
    pub fn to_bitmask(flags: &BTreeSet<QuantityFlag>) -> u64 {
        flags.iter().fold(0, |mask, flag| mask | flag.bit())
    }

    /// Decode a protocol bitmask. Bits without a known flag decode to
    /// [`QuantityFlag::Unknown`].
    pub fn from_bitmask(mask: u64) -> BTreeSet<QuantityFlag> {
        let mut flags = BTreeSet::new();
        for bit in 0..64 {
            if mask & (1u64 << bit) == 0 {
                continue;
            }
            let flag = Self::KNOWN
                .get(bit)
                .copied()
                .unwrap_or(QuantityFlag::Unknown);
            flags.insert(flag);
        }
        flags
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            QuantityFlag::Ac => "AC",
            QuantityFlag::Dc => "DC",
            QuantityFlag::Rms => "RMS",
            QuantityFlag::Diode => "Diode",
            QuantityFlag::Hold => "Hold",
            QuantityFlag::Max => "max",
            QuantityFlag::Min => "min",
            QuantityFlag::Autorange => "Autorange",
            QuantityFlag::Relative => "Relative",
            QuantityFlag::SplFreqWeightA => "SPL A-weighted F",
            QuantityFlag::SplFreqWeightC => "SPL C-weighted F",
            QuantityFlag::SplFreqWeightZ => "SPL Z-weighted F",
            QuantityFlag::SplFreqWeightFlat => "SPL flat weighted",
            QuantityFlag::SplTimeWeightS => "SPL S-weighted t",
            QuantityFlag::SplTimeWeightF => "SPL F-weighted t",
            QuantityFlag::SplLat => "SPL LAT",
            QuantityFlag::SplPctOverAlarm => "SPL Over%",
            QuantityFlag::Duration => "Duration",
            QuantityFlag::Avg => "avg",
            QuantityFlag::Reference => "Reference",
            QuantityFlag::Unstable => "Unstable",
            QuantityFlag::FourWire => "4W",
            QuantityFlag::Unknown => "Unknown",
        }
    }

    /// Join flag names: AC/DC first, then RMS, then min/max/avg, then the
    /// rest in declaration order. Unknown flags are not printed.
    pub fn format_set(flags: &BTreeSet<QuantityFlag>, separator: &str) -> String {
        let leading = Self::LEADING.iter().filter(|f| flags.contains(f));
        let rest = flags
            .iter()
            .filter(|f| !Self::LEADING.contains(f) && **f != QuantityFlag::Unknown);

        leading
            .chain(rest)
            .map(|f| f.name())
            .collect::<Vec<_>>()
            .join(separator)
    }
}

impl fmt::Display for QuantityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Category of the device a configurable belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum DeviceType {
    LogicAnalyzer,
    Oscilloscope,
    Multimeter,
    DemoDev,
    SoundLevelMeter,
    Thermometer,
    Hygrometer,
    Energymeter,
    Demodulator,
    PowerSupply,
    LcrMeter,
    ElectronicLoad,
    Scale,
    SignalGenerator,
    Powermeter,
    UserDevice,
    Unknown,
}

impl DeviceType {
    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            DeviceType::LogicAnalyzer => "Logic Analyzer",
            DeviceType::Oscilloscope => "Oscilloscope",
            DeviceType::Multimeter => "Multimeter",
            DeviceType::DemoDev => "Demo Device",
            DeviceType::SoundLevelMeter => "Soundlevelmeter",
            DeviceType::Thermometer => "Thermometer",
            DeviceType::Hygrometer => "Hygrometer",
            DeviceType::Energymeter => "Energymeter",
            DeviceType::Demodulator => "Demodulator",
            DeviceType::PowerSupply => "Power Supply",
            DeviceType::LcrMeter => "LCR Meter",
            DeviceType::ElectronicLoad => "Electronic Load",
            DeviceType::Scale => "Scale",
            DeviceType::SignalGenerator => "Signal Generator",
            DeviceType::Powermeter => "Power Meter",
            DeviceType::UserDevice => "Virtual User Device",
            DeviceType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
