//! Custom error types for the property layer.
//!
//! This module defines the primary error type, `DaqError`, returned by every
//! property, configurable and session operation. Using the `thiserror` crate,
//! it provides a centralized and consistent way to handle the ways a
//! capability access can fail.
//!
//! ## Error Hierarchy
//!
//! - **`NotReadable` / `NotWritable` / `NotEnumerable`**: capability-access
//!   violations. The caller asked for a verb the device does not support for
//!   that capability; check `is_readable()` and friends first.
//! - **`TypeMismatch` / `ArityMismatch`**: protocol contract violations. The
//!   adapter returned a container whose shape disagrees with the catalog.
//!   These are logged at error level where they are detected and are not
//!   expected on a correctly configured system.
//! - **`Adapter`**: the device call itself failed. Always recoverable and
//!   surfaced to the caller; a failed write never touches cached state.
//! - **`Config`** / **`Logging`**: ambient setup failures.
//!
//! Unrouted notifications are not an error variant: nobody is waiting for
//! them, so the session logs and drops them.

use thiserror::Error;

use crate::catalog::CapabilityId;
use crate::config::ConfigError;

/// Convenience alias for results using the crate error type.
pub type AppResult<T> = std::result::Result<T, DaqError>;

/// Failure reported by a [`DeviceAdapter`](crate::adapter::DeviceAdapter).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// The device refused the value or the request.
    #[error("device rejected the request: {0}")]
    Rejected(String),

    /// The adapter does not implement this verb for the capability.
    #[error("operation not supported by the device")]
    Unsupported,

    /// Transport failure.
    #[error("I/O error: {0}")]
    Io(String),

    /// The device connection is gone.
    #[error("device disconnected")]
    Disconnected,
}

/// Error type of the property layer.
#[derive(Error, Debug)]
pub enum DaqError {
    /// `get` is not supported for the capability.
    #[error("Capability '{key}' is not readable")]
    NotReadable {
        /// Capability accessed.
        key: CapabilityId,
    },

    /// `set` is not supported for the capability.
    #[error("Capability '{key}' is not writable")]
    NotWritable {
        /// Capability accessed.
        key: CapabilityId,
    },

    /// `enumerate` is not supported for the capability.
    #[error("Capability '{key}' is not enumerable")]
    NotEnumerable {
        /// Capability accessed.
        key: CapabilityId,
    },

    /// A value has a different type than the catalog declares.
    #[error("Type mismatch for '{key}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Capability the value belongs to.
        key: CapabilityId,
        /// Type name the catalog declares.
        expected: &'static str,
        /// Type name received.
        found: &'static str,
    },

    /// A composite value has the wrong number of elements.
    #[error("Arity mismatch for '{key}': expected {expected} elements, found {found}")]
    ArityMismatch {
        /// Capability the value belongs to.
        key: CapabilityId,
        /// Element count the kind requires.
        expected: usize,
        /// Element count received.
        found: usize,
    },

    /// The device call failed.
    #[error("Adapter error for '{key}': {source}")]
    Adapter {
        /// Capability accessed.
        key: CapabilityId,
        /// Failure reported by the adapter.
        #[source]
        source: AdapterError,
    },

    /// No property exists for the capability on this configurable.
    #[error("Capability '{0}' is not registered on this configurable")]
    UnknownCapability(CapabilityId),

    /// The property outlived its configurable.
    #[error("Configurable owning '{key}' no longer exists")]
    ConfigurableDropped {
        /// Capability of the orphaned property.
        key: CapabilityId,
    },

    /// Configuration could not be loaded or validated.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The global tracing subscriber could not be installed.
    #[error("Logging initialisation failed: {0}")]
    Logging(String),
}

impl DaqError {
    /// True for errors that indicate the adapter and the catalog disagree
    /// about the shape of a value.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            DaqError::TypeMismatch { .. } | DaqError::ArityMismatch { .. }
        )
    }

    /// Capability the error refers to, if any.
    pub fn capability(&self) -> Option<CapabilityId> {
        match self {
            DaqError::NotReadable { key }
            | DaqError::NotWritable { key }
            | DaqError::NotEnumerable { key }
            | DaqError::TypeMismatch { key, .. }
            | DaqError::ArityMismatch { key, .. }
            | DaqError::Adapter { key, .. }
            | DaqError::ConfigurableDropped { key } => Some(*key),
            DaqError::UnknownCapability(key) => Some(*key),
            DaqError::Config(_) | DaqError::Logging(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DaqError::NotWritable {
            key: CapabilityId::Voltage,
        };
        assert_eq!(err.to_string(), "Capability 'Voltage' is not writable");
    }

    #[test]
    fn test_adapter_error_source() {
        use std::error::Error as _;

        let err = DaqError::Adapter {
            key: CapabilityId::VoltageTarget,
            source: AdapterError::Rejected("out of range".into()),
        };
        assert!(err.to_string().contains("out of range"));
        assert!(err.source().is_some());
        assert!(!err.is_contract_violation());
    }

    #[test]
    fn test_contract_violations() {
        let err = DaqError::ArityMismatch {
            key: CapabilityId::Range,
            expected: 2,
            found: 3,
        };
        assert!(err.is_contract_violation());
        assert_eq!(err.capability(), Some(CapabilityId::Range));
    }
}
