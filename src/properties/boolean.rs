use std::any::Any;
use std::sync::Arc;

use super::{Property, PropertyBase, PropertyMetadata};
use crate::error::{AppResult, DaqError};
use crate::value::{DynamicValue, NativeValue};

/// On/off capability such as `Enabled` or `OverVoltageProtectionActive`.
///
/// Booleans have no legal-value list; `list()` always fails.
#[derive(Debug)]
pub struct BoolProperty {
    base: PropertyBase,
}

impl BoolProperty {
    pub(crate) fn new(base: PropertyBase) -> Self {
        Self { base }
    }

    /// Typed read.
    pub fn bool_value(&self) -> AppResult<bool> {
        self.base.read::<bool>()
    }

    /// Render a value.
    pub fn to_string_value(&self, value: bool) -> String {
        value.to_string()
    }
}

impl Property for BoolProperty {
    fn base(&self) -> &PropertyBase {
        &self.base
    }

    fn value(&self) -> AppResult<NativeValue> {
        self.bool_value().map(NativeValue::Bool)
    }

    fn change_value(&self, value: NativeValue) -> AppResult<()> {
        self.base.write::<bool>(value)
    }

    fn list(&self) -> AppResult<()> {
        Err(DaqError::NotEnumerable {
            key: self.base.key(),
        })
    }

    fn on_value_changed(&self, value: &DynamicValue) -> AppResult<()> {
        self.base.notify::<bool>(value)
    }

    fn format_value(&self, value: &NativeValue) -> String {
        match value {
            NativeValue::Bool(v) => self.to_string_value(*v),
            other => other.to_string(),
        }
    }

    fn metadata(&self) -> PropertyMetadata {
        PropertyMetadata::None
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
