use parking_lot::RwLock;
use std::any::Any;
use std::sync::Arc;

use super::{Property, PropertyBase, PropertyMetadata};
use crate::catalog::QuantityFlag;
use crate::error::AppResult;
use crate::value::{DynamicValue, MeasuredQuantity, NativeValue};

/// Selected measurement function of a multimeter-like device: a quantity
/// plus its flags, e.g. `Voltage DC` or `Current AC RMS`.
///
/// Travels as `(quantity id, flag bitmask)`.
#[derive(Debug)]
pub struct MeasuredQuantityProperty {
    base: PropertyBase,
    values: RwLock<Arc<Vec<MeasuredQuantity>>>,
}

impl MeasuredQuantityProperty {
    pub(crate) fn new(base: PropertyBase) -> Self {
        Self {
            base,
            values: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Typed read.
    pub fn measured_quantity_value(&self) -> AppResult<MeasuredQuantity> {
        self.base.read::<MeasuredQuantity>()
    }

    /// Legal quantity/flag combinations as of the last `list()`.
    pub fn list_values(&self) -> Arc<Vec<MeasuredQuantity>> {
        Arc::clone(&self.values.read())
    }

    /// Quantity name followed by flag names.
    pub fn to_string_value(&self, value: &MeasuredQuantity) -> String {
        let mut text = value.quantity.name().to_string();
        if !value.flags.is_empty() {
            text.push(' ');
            text.push_str(&QuantityFlag::format_set(&value.flags, " "));
        }
        text
    }
}

impl Property for MeasuredQuantityProperty {
    fn base(&self) -> &PropertyBase {
        &self.base
    }

    fn value(&self) -> AppResult<NativeValue> {
        self.measured_quantity_value()
            .map(NativeValue::MeasuredQuantity)
    }

    fn change_value(&self, value: NativeValue) -> AppResult<()> {
        self.base.write::<MeasuredQuantity>(value)
    }

    fn list(&self) -> AppResult<()> {
        let raw = self.base.enumerate()?;
        let values = self.base.cast_list::<MeasuredQuantity>(&raw)?;
        *self.values.write() = Arc::new(values);
        self.base.emit_list_changed();
        Ok(())
    }

    fn on_value_changed(&self, value: &DynamicValue) -> AppResult<()> {
        self.base.notify::<MeasuredQuantity>(value)
    }

    fn format_value(&self, value: &NativeValue) -> String {
        match value {
            NativeValue::MeasuredQuantity(v) => self.to_string_value(v),
            other => other.to_string(),
        }
    }

    fn metadata(&self) -> PropertyMetadata {
        PropertyMetadata::Values {
            values: self
                .list_values()
                .iter()
                .cloned()
                .map(NativeValue::MeasuredQuantity)
                .collect(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
