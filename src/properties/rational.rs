use parking_lot::RwLock;
use std::any::Any;
use std::sync::Arc;

use super::{Property, PropertyBase, PropertyMetadata};
use crate::error::AppResult;
use crate::format;
use crate::value::{DynamicValue, NativeValue, Rational};

/// Numerator/denominator capability (`TimeBase`, `VDiv`).
#[derive(Debug)]
pub struct RationalProperty {
    base: PropertyBase,
    values: RwLock<Arc<Vec<Rational>>>,
}

impl RationalProperty {
    pub(crate) fn new(base: PropertyBase) -> Self {
        Self {
            base,
            values: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Typed read.
    pub fn rational_value(&self) -> AppResult<Rational> {
        self.base.read::<Rational>()
    }

    /// Legal values as of the last `list()`.
    pub fn list_values(&self) -> Arc<Vec<Rational>> {
        Arc::clone(&self.values.read())
    }

    /// Render `p/q` as a decimal with SI prefix and unit, e.g. `"1 ms"`.
    pub fn to_string_value(&self, value: Rational) -> String {
        let (mut text, prefix) = format::format_value_si(value.as_f64(), 0);
        text.push(' ');
        text.push_str(prefix);
        let unit = self.base.unit();
        if unit.has_suffix() {
            text.push_str(unit.symbol());
        }
        text
    }
}

impl Property for RationalProperty {
    fn base(&self) -> &PropertyBase {
        &self.base
    }

    fn value(&self) -> AppResult<NativeValue> {
        self.rational_value().map(NativeValue::Rational)
    }

    fn change_value(&self, value: NativeValue) -> AppResult<()> {
        self.base.write::<Rational>(value)
    }

    fn list(&self) -> AppResult<()> {
        let raw = self.base.enumerate()?;
        let values = self.base.cast_list::<Rational>(&raw)?;
        *self.values.write() = Arc::new(values);
        self.base.emit_list_changed();
        Ok(())
    }

    fn on_value_changed(&self, value: &DynamicValue) -> AppResult<()> {
        self.base.notify::<Rational>(value)
    }

    fn format_value(&self, value: &NativeValue) -> String {
        match value {
            NativeValue::Rational(v) => self.to_string_value(*v),
            other => other.to_string(),
        }
    }

    fn metadata(&self) -> PropertyMetadata {
        PropertyMetadata::Values {
            values: self
                .list_values()
                .iter()
                .copied()
                .map(NativeValue::Rational)
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
