use parking_lot::RwLock;
use std::any::Any;
use std::sync::Arc;

use super::{Property, PropertyBase, PropertyMetadata};
use crate::error::AppResult;
use crate::format;
use crate::value::{DoubleRange, DynamicValue, NativeValue};

/// `(low, high)` capability of doubles, e.g. `Range` or `VoltageThreshold`.
#[derive(Debug)]
pub struct DoubleRangeProperty {
    base: PropertyBase,
    values: RwLock<Arc<Vec<DoubleRange>>>,
}

impl DoubleRangeProperty {
    pub(crate) fn new(base: PropertyBase) -> Self {
        Self {
            base,
            values: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Typed read.
    pub fn double_range_value(&self) -> AppResult<DoubleRange> {
        self.base.read::<DoubleRange>()
    }

    /// Legal ranges as of the last `list()`.
    pub fn list_values(&self) -> Arc<Vec<DoubleRange>> {
        Arc::clone(&self.values.read())
    }

    /// `"low - high <unit>"`.
    pub fn to_string_value(&self, value: DoubleRange) -> String {
        format::with_unit(format!("{} - {}", value.low, value.high), self.base.unit())
    }
}

impl Property for DoubleRangeProperty {
    fn base(&self) -> &PropertyBase {
        &self.base
    }

    fn value(&self) -> AppResult<NativeValue> {
        self.double_range_value().map(NativeValue::DoubleRange)
    }

    fn change_value(&self, value: NativeValue) -> AppResult<()> {
        self.base.write::<DoubleRange>(value)
    }

    fn list(&self) -> AppResult<()> {
        let raw = self.base.enumerate()?;
        let values = self.base.cast_list::<DoubleRange>(&raw)?;
        *self.values.write() = Arc::new(values);
        self.base.emit_list_changed();
        Ok(())
    }

    fn on_value_changed(&self, value: &DynamicValue) -> AppResult<()> {
        self.base.notify::<DoubleRange>(value)
    }

    fn format_value(&self, value: &NativeValue) -> String {
        match value {
            NativeValue::DoubleRange(v) => self.to_string_value(*v),
            other => other.to_string(),
        }
    }

    fn metadata(&self) -> PropertyMetadata {
        PropertyMetadata::Values {
            values: self
                .list_values()
                .iter()
                .copied()
                .map(NativeValue::DoubleRange)
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
