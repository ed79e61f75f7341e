use parking_lot::RwLock;
use std::any::Any;
use std::sync::Arc;

use super::{Property, PropertyBase, PropertyMetadata};
use crate::error::AppResult;
use crate::format;
use crate::value::{DynamicValue, NativeValue};

#[derive(Debug, Clone, PartialEq)]
struct UInt64Meta {
    min: u64,
    max: u64,
    step: u64,
    values: Vec<u64>,
}

impl Default for UInt64Meta {
    fn default() -> Self {
        Self {
            min: u64::MIN,
            max: u64::MAX,
            step: 1,
            values: Vec::new(),
        }
    }
}

/// Unsigned integer capability such as `Samplerate` or `BufferSize`.
///
/// Devices describe the legal values either as a `(min, max, step)` tuple
/// or as a list of discrete values (typical for samplerates). Both shapes
/// are accepted; with a list, `min`/`max` follow the smallest and largest
/// entry.
#[derive(Debug)]
pub struct UInt64Property {
    base: PropertyBase,
    meta: RwLock<Arc<UInt64Meta>>,
}

impl UInt64Property {
    pub(crate) fn new(base: PropertyBase) -> Self {
        Self {
            base,
            meta: RwLock::new(Arc::new(UInt64Meta::default())),
        }
    }

    fn meta(&self) -> Arc<UInt64Meta> {
        Arc::clone(&self.meta.read())
    }

    /// Typed read.
    pub fn uint64_value(&self) -> AppResult<u64> {
        self.base.read::<u64>()
    }

    /// Lower bound.
    pub fn min(&self) -> u64 {
        self.meta().min
    }

    /// Upper bound.
    pub fn max(&self) -> u64 {
        self.meta().max
    }

    /// Step size.
    pub fn step(&self) -> u64 {
        self.meta().step
    }

    /// Discrete legal values, empty when the device reports bounds.
    pub fn list_values(&self) -> Vec<u64> {
        self.meta().values.clone()
    }

    /// Render a value with SI prefix and unit.
    pub fn to_string_value(&self, value: u64) -> String {
        let (mut text, prefix) = format::format_value_si(value as f64, 1);
        let unit = self.base.unit();
        if !prefix.is_empty() || unit.has_suffix() {
            text.push(' ');
            text.push_str(prefix);
            if unit.has_suffix() {
                text.push_str(unit.symbol());
            }
        }
        text
    }
}

impl Property for UInt64Property {
    fn base(&self) -> &PropertyBase {
        &self.base
    }

    fn value(&self) -> AppResult<NativeValue> {
        self.uint64_value().map(NativeValue::UInt64)
    }

    fn change_value(&self, value: NativeValue) -> AppResult<()> {
        self.base.write::<u64>(value)
    }

    fn list(&self) -> AppResult<()> {
        let raw = self.base.enumerate()?;
        let meta = match &raw {
            DynamicValue::Tuple(_) => {
                let (min, max, step) = self.base.cast_triple::<u64>(&raw)?;
                UInt64Meta {
                    min,
                    max,
                    step,
                    values: Vec::new(),
                }
            }
            _ => {
                let values = self.base.cast_list::<u64>(&raw)?;
                let defaults = UInt64Meta::default();
                UInt64Meta {
                    min: values.iter().copied().min().unwrap_or(defaults.min),
                    max: values.iter().copied().max().unwrap_or(defaults.max),
                    step: defaults.step,
                    values,
                }
            }
        };
        *self.meta.write() = Arc::new(meta);
        self.base.emit_list_changed();
        Ok(())
    }

    fn on_value_changed(&self, value: &DynamicValue) -> AppResult<()> {
        self.base.notify::<u64>(value)
    }

    fn format_value(&self, value: &NativeValue) -> String {
        match value {
            NativeValue::UInt64(v) => self.to_string_value(*v),
            other => other.to_string(),
        }
    }

    fn metadata(&self) -> PropertyMetadata {
        let meta = self.meta();
        PropertyMetadata::UInt64Bounds {
            min: meta.min,
            max: meta.max,
            step: meta.step,
            values: meta.values.clone(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
