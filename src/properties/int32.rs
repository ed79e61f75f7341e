use parking_lot::RwLock;
use std::any::Any;
use std::sync::Arc;

use super::{Property, PropertyBase, PropertyMetadata};
use crate::error::AppResult;
use crate::format;
use crate::value::{DynamicValue, NativeValue};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    min: i32,
    max: i32,
    step: i32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: i32::MIN,
            max: i32::MAX,
            step: 1,
        }
    }
}

/// Signed integer capability, e.g. the number of divisions on a scope.
#[derive(Debug)]
pub struct Int32Property {
    base: PropertyBase,
    bounds: RwLock<Bounds>,
}

impl Int32Property {
    pub(crate) fn new(base: PropertyBase) -> Self {
        Self {
            base,
            bounds: RwLock::new(Bounds::default()),
        }
    }

    /// Typed read.
    pub fn int32_value(&self) -> AppResult<i32> {
        self.base.read::<i32>()
    }

    /// Lower bound, full range until listed.
    pub fn min(&self) -> i32 {
        self.bounds.read().min
    }

    /// Upper bound, full range until listed.
    pub fn max(&self) -> i32 {
        self.bounds.read().max
    }

    /// Step size, `1` until listed.
    pub fn step(&self) -> i32 {
        self.bounds.read().step
    }

    /// Render a value with its unit.
    pub fn to_string_value(&self, value: i32) -> String {
        format::with_unit(value.to_string(), self.base.unit())
    }
}

impl Property for Int32Property {
    fn base(&self) -> &PropertyBase {
        &self.base
    }

    fn value(&self) -> AppResult<NativeValue> {
        self.int32_value().map(NativeValue::Int32)
    }

    fn change_value(&self, value: NativeValue) -> AppResult<()> {
        self.base.write::<i32>(value)
    }

    fn list(&self) -> AppResult<()> {
        let raw = self.base.enumerate()?;
        let (min, max, step) = self.base.cast_triple::<i32>(&raw)?;
        *self.bounds.write() = Bounds { min, max, step };
        self.base.emit_list_changed();
        Ok(())
    }

    fn on_value_changed(&self, value: &DynamicValue) -> AppResult<()> {
        self.base.notify::<i32>(value)
    }

    fn format_value(&self, value: &NativeValue) -> String {
        match value {
            NativeValue::Int32(v) => self.to_string_value(*v),
            other => other.to_string(),
        }
    }

    fn metadata(&self) -> PropertyMetadata {
        let b = *self.bounds.read();
        PropertyMetadata::Int32Bounds {
            min: b.min,
            max: b.max,
            step: b.step,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
