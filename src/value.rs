//! Value representations on both sides of the adapter boundary.
//!
//! [`DynamicValue`] is the type-erased container the device adapter speaks.
//! [`NativeValue`] is the closed set of statically typed values properties
//! expose. The [`Marshal`] trait converts between the two for each native
//! type; composite values (rational, measured quantity, ranges) must travel
//! as containers of exactly two elements.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::catalog::{CapabilityId, Quantity, QuantityFlag, ValueKind};
use crate::error::DaqError;

// =============================================================================
// Dynamic container
// =============================================================================

/// Type-erased value as exchanged with a device adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DynamicValue {
    /// Boolean.
    Bool(bool),
    /// Signed 32-bit integer.
    Int32(i32),
    /// Unsigned 32-bit integer (quantity ids).
    UInt32(u32),
    /// Unsigned 64-bit integer.
    UInt64(u64),
    /// Double precision float.
    Double(f64),
    /// Text.
    String(String),
    /// Fixed-arity ordered group: composite values and `(min, max, step)`.
    Tuple(Vec<DynamicValue>),
    /// Variable-length list, e.g. legal values returned by `enumerate`.
    Array(Vec<DynamicValue>),
}

impl DynamicValue {
    /// Short name of the contained type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            DynamicValue::Bool(_) => "bool",
            DynamicValue::Int32(_) => "int32",
            DynamicValue::UInt32(_) => "uint32",
            DynamicValue::UInt64(_) => "uint64",
            DynamicValue::Double(_) => "double",
            DynamicValue::String(_) => "string",
            DynamicValue::Tuple(_) => "tuple",
            DynamicValue::Array(_) => "array",
        }
    }

    /// Elements of a tuple or array.
    pub fn as_sequence(&self) -> Option<&[DynamicValue]> {
        match self {
            DynamicValue::Tuple(items) | DynamicValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Build a two-element tuple.
    pub fn pair(first: DynamicValue, second: DynamicValue) -> DynamicValue {
        DynamicValue::Tuple(vec![first, second])
    }
}

impl From<bool> for DynamicValue {
    fn from(v: bool) -> Self {
        DynamicValue::Bool(v)
    }
}

impl From<i32> for DynamicValue {
    fn from(v: i32) -> Self {
        DynamicValue::Int32(v)
    }
}

impl From<u64> for DynamicValue {
    fn from(v: u64) -> Self {
        DynamicValue::UInt64(v)
    }
}

impl From<f64> for DynamicValue {
    fn from(v: f64) -> Self {
        DynamicValue::Double(v)
    }
}

impl From<&str> for DynamicValue {
    fn from(v: &str) -> Self {
        DynamicValue::String(v.to_string())
    }
}

impl From<String> for DynamicValue {
    fn from(v: String) -> Self {
        DynamicValue::String(v)
    }
}

// =============================================================================
// Composite native types
// =============================================================================

/// Numerator/denominator pair, e.g. a time base of 1/1000 s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    /// Numerator.
    pub p: u64,
    /// Denominator.
    pub q: u64,
}

impl Rational {
    /// Create a rational `p/q`.
    pub fn new(p: u64, q: u64) -> Self {
        Self { p, q }
    }

    /// Decimal value; `NaN` for a zero denominator.
    pub fn as_f64(&self) -> f64 {
        if self.q == 0 {
            return f64::NAN;
        }
        self.p as f64 / self.q as f64
    }
}

/// A quantity together with its qualifying flags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeasuredQuantity {
    /// What is measured.
    pub quantity: Quantity,
    /// Qualifiers (AC, RMS, ...).
    pub flags: BTreeSet<QuantityFlag>,
}

impl MeasuredQuantity {
    /// Create a measured quantity.
    pub fn new(quantity: Quantity, flags: impl IntoIterator<Item = QuantityFlag>) -> Self {
        Self {
            quantity,
            flags: flags.into_iter().collect(),
        }
    }
}

/// `(low, high)` range of doubles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoubleRange {
    /// Lower bound.
    pub low: f64,
    /// Upper bound.
    pub high: f64,
}

impl DoubleRange {
    /// Create a range.
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }
}

/// `(low, high)` range of unsigned integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UInt64Range {
    /// Lower bound.
    pub low: u64,
    /// Upper bound.
    pub high: u64,
}

impl UInt64Range {
    /// Create a range.
    pub fn new(low: u64, high: u64) -> Self {
        Self { low, high }
    }
}

// =============================================================================
// Native value
// =============================================================================

/// Statically typed property value, one variant per [`ValueKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NativeValue {
    /// Boolean.
    Bool(bool),
    /// Signed 32-bit integer.
    Int32(i32),
    /// Unsigned 64-bit integer.
    UInt64(u64),
    /// Double.
    Double(f64),
    /// Text.
    String(String),
    /// Numerator/denominator pair.
    Rational(Rational),
    /// Quantity plus flags.
    MeasuredQuantity(MeasuredQuantity),
    /// Range of doubles.
    DoubleRange(DoubleRange),
    /// Range of unsigned integers.
    UInt64Range(UInt64Range),
}

impl NativeValue {
    /// Kind of the contained value.
    pub fn kind(&self) -> ValueKind {
        match self {
            NativeValue::Bool(_) => ValueKind::Bool,
            NativeValue::Int32(_) => ValueKind::Int32,
            NativeValue::UInt64(_) => ValueKind::UInt64,
            NativeValue::Double(_) => ValueKind::Double,
            NativeValue::String(_) => ValueKind::String,
            NativeValue::Rational(_) => ValueKind::Rational,
            NativeValue::MeasuredQuantity(_) => ValueKind::MeasuredQuantity,
            NativeValue::DoubleRange(_) => ValueKind::DoubleRange,
            NativeValue::UInt64Range(_) => ValueKind::UInt64Range,
        }
    }

    /// Get as bool if this is a bool value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NativeValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as i32 if this is an Int32 value.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            NativeValue::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as u64 if this is a UInt64 value.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            NativeValue::UInt64(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as f64 if this is a Double value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NativeValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as string slice if this is a String value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::String(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeValue::Bool(v) => write!(f, "{}", v),
            NativeValue::Int32(v) => write!(f, "{}", v),
            NativeValue::UInt64(v) => write!(f, "{}", v),
            NativeValue::Double(v) => write!(f, "{}", v),
            NativeValue::String(v) => f.write_str(v),
            NativeValue::Rational(r) => write!(f, "{}/{}", r.p, r.q),
            NativeValue::MeasuredQuantity(mq) => {
                f.write_str(mq.quantity.name())?;
                if !mq.flags.is_empty() {
                    write!(f, " {}", QuantityFlag::format_set(&mq.flags, " "))?;
                }
                Ok(())
            }
            NativeValue::DoubleRange(r) => write!(f, "{} - {}", r.low, r.high),
            NativeValue::UInt64Range(r) => write!(f, "{} - {}", r.low, r.high),
        }
    }
}

// =============================================================================
// Marshaling
// =============================================================================

/// Shape error found while converting a dynamic container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarshalError {
    /// The container holds a different type than expected.
    TypeMismatch {
        /// Expected type name.
        expected: &'static str,
        /// Type name found in the container.
        found: &'static str,
    },
    /// A composite container has the wrong number of elements.
    ArityMismatch {
        /// Expected element count.
        expected: usize,
        /// Element count found.
        found: usize,
    },
}

impl MarshalError {
    /// Attach the capability the value belongs to.
    pub fn with_key(self, key: CapabilityId) -> DaqError {
        match self {
            MarshalError::TypeMismatch { expected, found } => DaqError::TypeMismatch {
                key,
                expected,
                found,
            },
            MarshalError::ArityMismatch { expected, found } => DaqError::ArityMismatch {
                key,
                expected,
                found,
            },
        }
    }
}

fn mismatch(expected: &'static str, found: &DynamicValue) -> MarshalError {
    MarshalError::TypeMismatch {
        expected,
        found: found.type_name(),
    }
}

/// Split a composite container into its two elements.
pub fn expect_pair(value: &DynamicValue) -> Result<(&DynamicValue, &DynamicValue), MarshalError> {
    let items = value.as_sequence().ok_or_else(|| mismatch("tuple", value))?;
    match items {
        [first, second] => Ok((first, second)),
        _ => Err(MarshalError::ArityMismatch {
            expected: 2,
            found: items.len(),
        }),
    }
}

/// Conversion between a native type and the adapter's dynamic container.
pub trait Marshal: Sized + Clone {
    /// Kind this type represents.
    const KIND: ValueKind;

    /// Wrap into the dynamic container.
    fn to_dynamic(&self) -> DynamicValue;

    /// Cast out of the dynamic container.
    fn from_dynamic(value: &DynamicValue) -> Result<Self, MarshalError>;

    /// Wrap into the native sum type.
    fn into_native(self) -> NativeValue;

    /// Extract from the native sum type; `None` when the kind differs.
    fn from_native(value: NativeValue) -> Option<Self>;
}

macro_rules! scalar_marshal {
    ($ty:ty, $kind:ident, $dyn:ident, $name:literal) => {
        impl Marshal for $ty {
            const KIND: ValueKind = ValueKind::$kind;

            fn to_dynamic(&self) -> DynamicValue {
                DynamicValue::$dyn(self.clone())
            }

            fn from_dynamic(value: &DynamicValue) -> Result<Self, MarshalError> {
                match value {
                    DynamicValue::$dyn(v) => Ok(v.clone()),
                    other => Err(mismatch($name, other)),
                }
            }

            fn into_native(self) -> NativeValue {
                NativeValue::$kind(self)
            }

            fn from_native(value: NativeValue) -> Option<Self> {
                match value {
                    NativeValue::$kind(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

scalar_marshal!(bool, Bool, Bool, "bool");
scalar_marshal!(i32, Int32, Int32, "int32");
scalar_marshal!(u64, UInt64, UInt64, "uint64");
scalar_marshal!(f64, Double, Double, "double");
scalar_marshal!(String, String, String, "string");

impl Marshal for Rational {
    const KIND: ValueKind = ValueKind::Rational;

    fn to_dynamic(&self) -> DynamicValue {
        DynamicValue::pair(self.p.into(), self.q.into())
    }

    fn from_dynamic(value: &DynamicValue) -> Result<Self, MarshalError> {
        let (p, q) = expect_pair(value)?;
        Ok(Rational::new(u64::from_dynamic(p)?, u64::from_dynamic(q)?))
    }

    fn into_native(self) -> NativeValue {
        NativeValue::Rational(self)
    }

    fn from_native(value: NativeValue) -> Option<Self> {
        match value {
            NativeValue::Rational(v) => Some(v),
            _ => None,
        }
    }
}

impl Marshal for MeasuredQuantity {
    const KIND: ValueKind = ValueKind::MeasuredQuantity;

    fn to_dynamic(&self) -> DynamicValue {
        DynamicValue::pair(
            DynamicValue::UInt32(self.quantity.protocol_id()),
            DynamicValue::UInt64(QuantityFlag::to_bitmask(&self.flags)),
        )
    }

    fn from_dynamic(value: &DynamicValue) -> Result<Self, MarshalError> {
        let (quantity, flags) = expect_pair(value)?;
        let quantity = match quantity {
            DynamicValue::UInt32(id) => Quantity::from_protocol_id(*id),
            other => return Err(mismatch("uint32", other)),
        };
        let flags = QuantityFlag::from_bitmask(u64::from_dynamic(flags)?);
        Ok(MeasuredQuantity { quantity, flags })
    }

    fn into_native(self) -> NativeValue {
        NativeValue::MeasuredQuantity(self)
    }

    fn from_native(value: NativeValue) -> Option<Self> {
        match value {
            NativeValue::MeasuredQuantity(v) => Some(v),
            _ => None,
        }
    }
}

impl Marshal for DoubleRange {
    const KIND: ValueKind = ValueKind::DoubleRange;

    fn to_dynamic(&self) -> DynamicValue {
        DynamicValue::pair(self.low.into(), self.high.into())
    }

    fn from_dynamic(value: &DynamicValue) -> Result<Self, MarshalError> {
        let (low, high) = expect_pair(value)?;
        Ok(DoubleRange::new(f64::from_dynamic(low)?, f64::from_dynamic(high)?))
    }

    fn into_native(self) -> NativeValue {
        NativeValue::DoubleRange(self)
    }

    fn from_native(value: NativeValue) -> Option<Self> {
        match value {
            NativeValue::DoubleRange(v) => Some(v),
            _ => None,
        }
    }
}

impl Marshal for UInt64Range {
    const KIND: ValueKind = ValueKind::UInt64Range;

    fn to_dynamic(&self) -> DynamicValue {
        DynamicValue::pair(self.low.into(), self.high.into())
    }

    fn from_dynamic(value: &DynamicValue) -> Result<Self, MarshalError> {
        let (low, high) = expect_pair(value)?;
        Ok(UInt64Range::new(u64::from_dynamic(low)?, u64::from_dynamic(high)?))
    }

    fn into_native(self) -> NativeValue {
        NativeValue::UInt64Range(self)
    }

    fn from_native(value: NativeValue) -> Option<Self> {
        match value {
            NativeValue::UInt64Range(v) => Some(v),
            _ => None,
        }
    }
}

macro_rules! native_from {
    ($ty:ty) => {
        impl From<$ty> for NativeValue {
            fn from(v: $ty) -> Self {
                v.into_native()
            }
        }
    };
}

native_from!(bool);
native_from!(i32);
native_from!(u64);
native_from!(f64);
native_from!(String);
native_from!(Rational);
native_from!(MeasuredQuantity);
native_from!(DoubleRange);
native_from!(UInt64Range);

impl From<&str> for NativeValue {
    fn from(v: &str) -> Self {
        NativeValue::String(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_type_mismatch() {
        let err = f64::from_dynamic(&DynamicValue::UInt64(3)).unwrap_err();
        assert_eq!(
            err,
            MarshalError::TypeMismatch {
                expected: "double",
                found: "uint64"
            }
        );
    }

    #[test]
    fn composite_requires_exactly_two_elements() {
        let one = DynamicValue::Tuple(vec![DynamicValue::Double(1.0)]);
        let three = DynamicValue::Tuple(vec![1.0.into(), 2.0.into(), 3.0.into()]);

        for value in [&one, &three] {
            assert!(matches!(
                DoubleRange::from_dynamic(value),
                Err(MarshalError::ArityMismatch { expected: 2, .. })
            ));
            assert!(matches!(
                Rational::from_dynamic(value),
                Err(MarshalError::ArityMismatch { expected: 2, .. })
            ));
            assert!(matches!(
                MeasuredQuantity::from_dynamic(value),
                Err(MarshalError::ArityMismatch { expected: 2, .. })
            ));
        }
    }

    #[test]
    fn measured_quantity_wire_form() {
        let mq = MeasuredQuantity::new(Quantity::Voltage, [QuantityFlag::Dc]);
        let dynamic = mq.to_dynamic();
        assert_eq!(
            dynamic,
            DynamicValue::pair(DynamicValue::UInt32(10_000), DynamicValue::UInt64(0x2))
        );
        assert_eq!(MeasuredQuantity::from_dynamic(&dynamic).unwrap(), mq);
    }

    #[test]
    fn arity_error_gets_key() {
        let err = MarshalError::ArityMismatch {
            expected: 2,
            found: 1,
        }
        .with_key(CapabilityId::TimeBase);
        assert!(matches!(
            err,
            DaqError::ArityMismatch {
                key: CapabilityId::TimeBase,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn native_kind_and_display() {
        let value = NativeValue::from(DoubleRange::new(0.0, 10.0));
        assert_eq!(value.kind(), ValueKind::DoubleRange);
        assert_eq!(value.to_string(), "0 - 10");
        assert_eq!(NativeValue::from("CV").as_str(), Some("CV"));
    }
}
