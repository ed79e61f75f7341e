use parking_lot::RwLock;
use std::any::Any;
use std::sync::Arc;

use super::{Property, PropertyBase, PropertyMetadata};
use crate::error::AppResult;
use crate::format;
use crate::value::{DynamicValue, NativeValue, UInt64Range};

/// `(low, high)` capability of unsigned integers (`SplMeasurementRange`).
#[derive(Debug)]
pub struct UInt64RangeProperty {
    base: PropertyBase,
    values: RwLock<Arc<Vec<UInt64Range>>>,
}

impl UInt64RangeProperty {
    pub(crate) fn new(base: PropertyBase) -> Self {
        Self {
            base,
            values: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Typed read.
    pub fn uint64_range_value(&self) -> AppResult<UInt64Range> {
        self.base.read::<UInt64Range>()
    }

    /// Legal ranges as of the last `list()`.
    pub fn list_values(&self) -> Arc<Vec<UInt64Range>> {
        Arc::clone(&self.values.read())
    }

    /// `"low - high <unit>"`.
    pub fn to_string_value(&self, value: UInt64Range) -> String {
        format::with_unit(format!("{} - {}", value.low, value.high), self.base.unit())
    }
}

impl Property for UInt64RangeProperty {
    fn base(&self) -> &PropertyBase {
        &self.base
    }

    fn value(&self) -> AppResult<NativeValue> {
        self.uint64_range_value().map(NativeValue::UInt64Range)
    }

    fn change_value(&self, value: NativeValue) -> AppResult<()> {
        self.base.write::<UInt64Range>(value)
    }

    fn list(&self) -> AppResult<()> {
        let raw = self.base.enumerate()?;
        let values = self.base.cast_list::<UInt64Range>(&raw)?;
        *self.values.write() = Arc::new(values);
        self.base.emit_list_changed();
        Ok(())
    }

    fn on_value_changed(&self, value: &DynamicValue) -> AppResult<()> {
        self.base.notify::<UInt64Range>(value)
    }

    fn format_value(&self, value: &NativeValue) -> String {
        match value {
            NativeValue::UInt64Range(v) => self.to_string_value(*v),
            other => other.to_string(),
        }
    }

    fn metadata(&self) -> PropertyMetadata {
        PropertyMetadata::Values {
            values: self
                .list_values()
                .iter()
                .copied()
                .map(NativeValue::UInt64Range)
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
