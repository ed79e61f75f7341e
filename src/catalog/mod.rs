//! Static capability catalog.
//!
//! Maps every [`CapabilityId`] to its value kind, physical unit and
//! human-readable name. The catalog holds no state; ids it does not know
//! resolve to [`ValueKind::Unknown`], which discovery skips.

mod keys;
mod units;

pub use keys::{CapabilityId, CapabilityInfo, ValueKind};
pub use units::{DeviceType, Quantity, QuantityFlag, Unit};

/// Value kind of a capability.
pub fn kind_of(id: CapabilityId) -> ValueKind {
    id.kind()
}

/// Physical unit of a capability.
pub fn unit_of(id: CapabilityId) -> Unit {
    id.unit()
}
