//! Typed, observable device properties.
//!
//! A property wraps exactly one capability on exactly one
//! [`Configurable`](crate::configurable::Configurable). Every kind exposes the
//! same object-safe [`Property`] contract, so UI, scripting and dependency
//! wiring can work with `Arc<dyn Property>` without knowing the value type:
//!
//! - `value()` reads from the device and casts to the declared kind
//! - `change_value()` validates, writes and emits a `LocalEdit` event
//! - `list()` refreshes the cached bounds or legal values and emits
//!   `ListChanged`
//! - `on_value_changed()` casts a device notification and emits a
//!   `DeviceNotification` event on the same signal
//!
//! Cached metadata is a snapshot. It reflects the last successful `list()`
//! and is replaced whole, so a concurrent reader sees either the old or the
//! new cache, never a partial one. A failed `list()` keeps the old cache.
//!
//! # Kinds
//!
//! | Kind | Type | Metadata |
//! |------|------|----------|
//! | Bool | [`BoolProperty`] | none |
//! | Int32 | [`Int32Property`] | min/max/step |
//! | UInt64 | [`UInt64Property`] | min/max/step or value list |
//! | Double | [`DoubleProperty`] | min/max/step, digits |
//! | String | [`StringProperty`] | legal strings or free text |
//! | Rational | [`RationalProperty`] | legal pairs |
//! | MeasuredQuantity | [`MeasuredQuantityProperty`] | legal quantities |
//! | DoubleRange | [`DoubleRangeProperty`] | legal ranges |
//! | UInt64Range | [`UInt64RangeProperty`] | legal ranges |

mod base;
mod boolean;
mod double;
mod double_range;
mod int32;
mod measured_quantity;
mod rational;
mod string;
mod uint64;
mod uint64_range;

pub use self::base::PropertyBase;
pub use self::boolean::BoolProperty;
pub use self::double::DoubleProperty;
pub use self::double_range::DoubleRangeProperty;
pub use self::int32::Int32Property;
pub use self::measured_quantity::MeasuredQuantityProperty;
pub use self::rational::RationalProperty;
pub use self::string::StringProperty;
pub use self::uint64::UInt64Property;
pub use self::uint64_range::UInt64RangeProperty;

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

use crate::adapter::CapabilityAccess;
use crate::catalog::{CapabilityId, Unit, ValueKind};
use crate::configurable::Configurable;
use crate::error::AppResult;
use crate::signal::{PropertySignal, Subscription};
use crate::value::{DynamicValue, NativeValue};

// =============================================================================
// Property trait
// =============================================================================

/// Contract shared by every property kind.
pub trait Property: Send + Sync + fmt::Debug {
    /// Shared identity, flags and signal.
    fn base(&self) -> &PropertyBase;

    /// Read the current value from the device.
    ///
    /// Fails with `NotReadable`, an adapter error, or `TypeMismatch` /
    /// `ArityMismatch` when the device answers with the wrong shape.
    fn value(&self) -> AppResult<NativeValue>;

    /// Write a new value and emit a `LocalEdit` value-changed event.
    ///
    /// On failure nothing is emitted and cached state is unchanged.
    fn change_value(&self, value: NativeValue) -> AppResult<()>;

    /// Refresh the cached bounds or legal values and emit `ListChanged`.
    fn list(&self) -> AppResult<()>;

    /// Handle an asynchronous device notification for this capability.
    fn on_value_changed(&self, value: &DynamicValue) -> AppResult<()>;

    /// Human-readable rendering of `value` for this kind and unit.
    fn format_value(&self, value: &NativeValue) -> String;

    /// Current cached metadata.
    fn metadata(&self) -> PropertyMetadata;

    /// Downcast support.
    fn as_any(&self) -> &dyn Any;

    /// Downcast support for shared handles.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Capability this property wraps.
    fn capability(&self) -> CapabilityId {
        self.base().key()
    }

    /// Declared value kind.
    fn kind(&self) -> ValueKind {
        self.base().kind()
    }

    /// Physical unit.
    fn unit(&self) -> Unit {
        self.base().unit()
    }

    /// Catalog name of the capability.
    fn name(&self) -> &'static str {
        self.base().key().name()
    }

    /// Name shown to users.
    fn display_name(&self) -> String {
        self.name().to_string()
    }

    /// `value()` is allowed.
    fn is_readable(&self) -> bool {
        self.base().is_readable()
    }

    /// `change_value()` is allowed.
    fn is_writable(&self) -> bool {
        self.base().is_writable()
    }

    /// `list()` is allowed.
    fn is_enumerable(&self) -> bool {
        self.base().is_enumerable()
    }

    /// Owning configurable.
    fn configurable(&self) -> AppResult<Arc<Configurable>> {
        self.base().configurable()
    }

    /// Event source for synchronous listeners.
    fn signal(&self) -> &PropertySignal {
        self.base().signal()
    }

    /// Async subscription to value-changed and list-changed events.
    fn observe(&self) -> Subscription {
        self.base().signal().subscribe()
    }

    /// Current value rendered for display, empty if it cannot be read.
    fn to_string(&self) -> String {
        match self.value() {
            Ok(value) => self.format_value(&value),
            Err(err) => {
                debug!(key = %self.capability(), error = %err, "No value to format");
                String::new()
            }
        }
    }

    /// Serializable view of identity, value and metadata.
    fn snapshot(&self) -> PropertySnapshot {
        let value = if self.is_readable() {
            self.value().ok()
        } else {
            None
        };
        PropertySnapshot {
            capability: self.capability(),
            name: self.display_name(),
            kind: self.kind(),
            unit: self.unit(),
            readable: self.is_readable(),
            writable: self.is_writable(),
            enumerable: self.is_enumerable(),
            display: value.as_ref().map(|v| self.format_value(v)),
            value,
            metadata: self.metadata(),
        }
    }
}

// =============================================================================
// Metadata and snapshots
// =============================================================================

/// Cached bounds or legal values of a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyMetadata {
    /// The kind carries no metadata.
    None,
    /// Any string is accepted.
    FreeText,
    /// Integer bounds.
    Int32Bounds {
        /// Minimum.
        min: i32,
        /// Maximum.
        max: i32,
        /// Step.
        step: i32,
    },
    /// Unsigned bounds, or a discrete list when `values` is non-empty.
    UInt64Bounds {
        /// Minimum.
        min: u64,
        /// Maximum.
        max: u64,
        /// Step.
        step: u64,
        /// Discrete legal values.
        values: Vec<u64>,
    },
    /// Floating-point bounds and display precision.
    DoubleBounds {
        /// Minimum.
        min: f64,
        /// Maximum.
        max: f64,
        /// Step.
        step: f64,
        /// Total display digits, if known.
        digits: Option<usize>,
        /// Decimal places shown.
        decimal_places: usize,
    },
    /// Ordered legal values.
    Values {
        /// Legal values in device order.
        values: Vec<NativeValue>,
    },
}

/// Serializable view of one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySnapshot {
    /// Capability id.
    pub capability: CapabilityId,
    /// Display name.
    pub name: String,
    /// Value kind.
    pub kind: ValueKind,
    /// Unit.
    pub unit: Unit,
    /// Readable flag.
    pub readable: bool,
    /// Writable flag.
    pub writable: bool,
    /// Enumerable flag.
    pub enumerable: bool,
    /// Current value, if readable and the read succeeded.
    pub value: Option<NativeValue>,
    /// Formatted current value.
    pub display: Option<String>,
    /// Cached metadata.
    pub metadata: PropertyMetadata,
}

// =============================================================================
// Construction
// =============================================================================

/// Build the property matching the capability's kind.
///
/// Returns `None` only for [`ValueKind::Unknown`]; the match is exhaustive,
/// so a new kind cannot be added without a property type.
pub fn new_property(
    configurable: Weak<Configurable>,
    key: CapabilityId,
    access: CapabilityAccess,
) -> Option<Arc<dyn Property>> {
    let base = PropertyBase::new(configurable, key, access);
    let property: Arc<dyn Property> = match key.kind() {
        ValueKind::Bool => Arc::new(BoolProperty::new(base)),
        ValueKind::Int32 => Arc::new(Int32Property::new(base)),
        ValueKind::UInt64 => Arc::new(UInt64Property::new(base)),
        ValueKind::Double => Arc::new(DoubleProperty::new(base)),
        ValueKind::String => Arc::new(StringProperty::new(base)),
        ValueKind::Rational => Arc::new(RationalProperty::new(base)),
        ValueKind::MeasuredQuantity => Arc::new(MeasuredQuantityProperty::new(base)),
        ValueKind::DoubleRange => Arc::new(DoubleRangeProperty::new(base)),
        ValueKind::UInt64Range => Arc::new(UInt64RangeProperty::new(base)),
        ValueKind::Unknown => return None,
    };
    Some(property)
}
