use parking_lot::RwLock;
use std::any::Any;
use std::sync::Arc;

use super::{Property, PropertyBase, PropertyMetadata};
use crate::error::AppResult;
use crate::value::{DynamicValue, NativeValue};

/// Text capability, either one of an enumerated set (`Regulation`,
/// `Coupling`, ...) or free text when the device offers no list.
#[derive(Debug)]
pub struct StringProperty {
    base: PropertyBase,
    values: RwLock<Option<Arc<Vec<String>>>>,
}

impl StringProperty {
    pub(crate) fn new(base: PropertyBase) -> Self {
        Self {
            base,
            values: RwLock::new(None),
        }
    }

    /// Typed read.
    pub fn string_value(&self) -> AppResult<String> {
        self.base.read::<String>()
    }

    /// Legal values, `None` for free text or before the first `list()`.
    pub fn list_values(&self) -> Option<Arc<Vec<String>>> {
        self.values.read().clone()
    }

    /// Accept any text after the initial list failed.
    ///
    /// The access flags are untouched; a later successful `list()` turns the
    /// property back into an enumerated one.
    pub(crate) fn fall_back_to_free_text(&self) {
        *self.values.write() = None;
    }
}

impl Property for StringProperty {
    fn base(&self) -> &PropertyBase {
        &self.base
    }

    fn value(&self) -> AppResult<NativeValue> {
        self.string_value().map(NativeValue::String)
    }

    fn change_value(&self, value: NativeValue) -> AppResult<()> {
        self.base.write::<String>(value)
    }

    fn list(&self) -> AppResult<()> {
        let raw = self.base.enumerate()?;
        let values = self.base.cast_list::<String>(&raw)?;
        *self.values.write() = Some(Arc::new(values));
        self.base.emit_list_changed();
        Ok(())
    }

    fn on_value_changed(&self, value: &DynamicValue) -> AppResult<()> {
        self.base.notify::<String>(value)
    }

    fn format_value(&self, value: &NativeValue) -> String {
        value.to_string()
    }

    fn metadata(&self) -> PropertyMetadata {
        match self.list_values() {
            Some(values) => PropertyMetadata::Values {
                values: values.iter().cloned().map(NativeValue::String).collect(),
            },
            None => PropertyMetadata::FreeText,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
