use parking_lot::RwLock;
use std::any::Any;
use std::sync::Arc;

use super::{Property, PropertyBase, PropertyMetadata};
use crate::error::AppResult;
use crate::format;
use crate::value::{DynamicValue, NativeValue};

const DEFAULT_STEP: f64 = 0.001;
const DEFAULT_DECIMAL_PLACES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
struct DoubleMeta {
    min: f64,
    max: f64,
    step: f64,
    digits: Option<usize>,
    decimal_places: usize,
}

impl Default for DoubleMeta {
    fn default() -> Self {
        Self {
            min: f64::MIN,
            max: f64::MAX,
            step: DEFAULT_STEP,
            digits: None,
            decimal_places: DEFAULT_DECIMAL_PLACES,
        }
    }
}

/// Floating-point capability such as `VoltageTarget` or `CurrentLimit`.
///
/// Bounds come from a `(min, max, step)` tuple. The display precision is
/// derived from them: `decimal_places` from the step, `digits` from the
/// integer digits of `max` plus the decimal places.
#[derive(Debug)]
pub struct DoubleProperty {
    base: PropertyBase,
    meta: RwLock<DoubleMeta>,
}

impl DoubleProperty {
    pub(crate) fn new(base: PropertyBase) -> Self {
        Self {
            base,
            meta: RwLock::new(DoubleMeta::default()),
        }
    }

    /// Typed read.
    pub fn double_value(&self) -> AppResult<f64> {
        self.base.read::<f64>()
    }

    /// Lower bound.
    pub fn min(&self) -> f64 {
        self.meta.read().min
    }

    /// Upper bound.
    pub fn max(&self) -> f64 {
        self.meta.read().max
    }

    /// Step size.
    pub fn step(&self) -> f64 {
        self.meta.read().step
    }

    /// Total display digits; `None` until bounds have been listed.
    pub fn digits(&self) -> Option<usize> {
        self.meta.read().digits
    }

    /// Decimal places used for display.
    pub fn decimal_places(&self) -> usize {
        self.meta.read().decimal_places
    }

    /// Render a value at the current precision with its unit.
    pub fn to_string_value(&self, value: f64) -> String {
        let text = format!("{:.*}", self.decimal_places(), value);
        format::with_unit(text, self.base.unit())
    }
}

impl Property for DoubleProperty {
    fn base(&self) -> &PropertyBase {
        &self.base
    }

    fn value(&self) -> AppResult<NativeValue> {
        self.double_value().map(NativeValue::Double)
    }

    fn change_value(&self, value: NativeValue) -> AppResult<()> {
        self.base.write::<f64>(value)
    }

    fn list(&self) -> AppResult<()> {
        let raw = self.base.enumerate()?;
        let (min, max, step) = self.base.cast_triple::<f64>(&raw)?;
        *self.meta.write() = DoubleMeta {
            min,
            max,
            step,
            digits: Some(format::count_double_digits(max, step)),
            decimal_places: format::decimal_places(step),
        };
        self.base.emit_list_changed();
        Ok(())
    }

    fn on_value_changed(&self, value: &DynamicValue) -> AppResult<()> {
        self.base.notify::<f64>(value)
    }

    fn format_value(&self, value: &NativeValue) -> String {
        match value {
            NativeValue::Double(v) => self.to_string_value(*v),
            other => other.to_string(),
        }
    }

    fn metadata(&self) -> PropertyMetadata {
        let m = *self.meta.read();
        PropertyMetadata::DoubleBounds {
            min: m.min,
            max: m.max,
            step: m.step,
            digits: m.digits,
            decimal_places: m.decimal_places,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
