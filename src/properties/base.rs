//! State and verbs shared by every property kind.

use std::sync::{Arc, Weak};
use tracing::error;

use crate::adapter::CapabilityAccess;
use crate::catalog::{CapabilityId, Unit, ValueKind};
use crate::configurable::Configurable;
use crate::error::{AppResult, DaqError};
use crate::signal::{PropertyEvent, PropertySignal, ValueOrigin};
use crate::value::{DynamicValue, Marshal, MarshalError, NativeValue};

/// Identity, access flags and signal of one property.
///
/// Holds only a weak reference to the owning configurable; the
/// configurable owns its properties.
#[derive(Debug)]
pub struct PropertyBase {
    configurable: Weak<Configurable>,
    key: CapabilityId,
    kind: ValueKind,
    unit: Unit,
    readable: bool,
    writable: bool,
    enumerable: bool,
    signal: PropertySignal,
}

impl PropertyBase {
    /// Create the base for `key` with the access flags discovery recorded.
    pub fn new(configurable: Weak<Configurable>, key: CapabilityId, access: CapabilityAccess) -> Self {
        Self {
            configurable,
            key,
            kind: key.kind(),
            unit: key.unit(),
            readable: access.readable,
            writable: access.writable,
            enumerable: access.enumerable,
            signal: PropertySignal::new(),
        }
    }

    /// Capability this property wraps.
    pub fn key(&self) -> CapabilityId {
        self.key
    }

    /// Declared value kind.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Physical unit.
    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// `get` is supported.
    pub fn is_readable(&self) -> bool {
        self.readable
    }

    /// `set` is supported.
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// `enumerate` is supported.
    pub fn is_enumerable(&self) -> bool {
        self.enumerable
    }

    /// Event source of this property.
    pub fn signal(&self) -> &PropertySignal {
        &self.signal
    }

    /// Owning configurable.
    pub fn configurable(&self) -> AppResult<Arc<Configurable>> {
        self.configurable
            .upgrade()
            .ok_or(DaqError::ConfigurableDropped { key: self.key })
    }

    /// Log and key a marshaling failure.
    pub fn contract_violation(&self, err: MarshalError) -> DaqError {
        let err = err.with_key(self.key);
        error!(key = %self.key, error = %err, "Adapter value does not match catalog");
        err
    }

    /// Read the current value from the device and cast it to `T`.
    pub fn read<T: Marshal>(&self) -> AppResult<T> {
        if !self.readable {
            return Err(DaqError::NotReadable { key: self.key });
        }
        let raw = self.configurable()?.get_config(self.key)?;
        T::from_dynamic(&raw).map_err(|e| self.contract_violation(e))
    }

    /// Validate `value` against `T`, write it and emit a local-edit event.
    ///
    /// Nothing is emitted if validation or the device write fails.
    pub fn write<T: Marshal>(&self, value: NativeValue) -> AppResult<()> {
        if !self.writable {
            return Err(DaqError::NotWritable { key: self.key });
        }
        let found = value.kind();
        let typed = T::from_native(value.clone()).ok_or_else(|| {
            self.contract_violation(MarshalError::TypeMismatch {
                expected: T::KIND.name(),
                found: found.name(),
            })
        })?;
        self.configurable()?
            .set_config(self.key, typed.to_dynamic())?;
        self.signal.emit(PropertyEvent::ValueChanged {
            value,
            origin: ValueOrigin::LocalEdit,
        });
        Ok(())
    }

    /// Query the device for the legal values of this capability.
    pub fn enumerate(&self) -> AppResult<DynamicValue> {
        if !self.enumerable {
            return Err(DaqError::NotEnumerable { key: self.key });
        }
        self.configurable()?.list_config(self.key)
    }

    /// Cast a device notification to `T` and emit it.
    pub fn notify<T: Marshal>(&self, raw: &DynamicValue) -> AppResult<()> {
        let value = T::from_dynamic(raw).map_err(|e| self.contract_violation(e))?;
        self.signal.emit(PropertyEvent::ValueChanged {
            value: value.into_native(),
            origin: ValueOrigin::DeviceNotification,
        });
        Ok(())
    }

    /// Emit a list-changed event.
    pub fn emit_list_changed(&self) {
        self.signal.emit(PropertyEvent::ListChanged);
    }

    /// Cast every element of an enumerated list.
    pub fn cast_list<T: Marshal>(&self, raw: &DynamicValue) -> AppResult<Vec<T>> {
        let items = raw.as_sequence().ok_or_else(|| {
            self.contract_violation(MarshalError::TypeMismatch {
                expected: "array",
                found: raw.type_name(),
            })
        })?;
        items
            .iter()
            .map(|item| T::from_dynamic(item).map_err(|e| self.contract_violation(e)))
            .collect()
    }

    /// Cast a `(min, max, step)` tuple.
    pub fn cast_triple<T: Marshal>(&self, raw: &DynamicValue) -> AppResult<(T, T, T)> {
        let items = match raw {
            DynamicValue::Tuple(items) => items,
            other => {
                return Err(self.contract_violation(MarshalError::TypeMismatch {
                    expected: "tuple",
                    found: other.type_name(),
                }))
            }
        };
        match items.as_slice() {
            [min, max, step] => {
                let cast = |v: &DynamicValue| T::from_dynamic(v).map_err(|e| self.contract_violation(e));
                Ok((cast(min)?, cast(max)?, cast(step)?))
            }
            _ => Err(self.contract_violation(MarshalError::ArityMismatch {
                expected: 3,
                found: items.len(),
            })),
        }
    }
}
