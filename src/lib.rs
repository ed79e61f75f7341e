//! Capability discovery and typed, observable device properties.
//!
//! A device is driven through a [`DeviceAdapter`](adapter::DeviceAdapter)
//! that speaks in capability ids and type-erased values. This crate turns
//! that into a [`DeviceSession`](session::DeviceSession): one
//! [`Configurable`](configurable::Configurable) per controllable unit (the
//! device itself and each channel group), each owning one typed
//! [`Property`](properties::Property) per capability the catalog knows.
//!
//! Properties read, write and enumerate through their configurable, cast
//! between the adapter's [`DynamicValue`](value::DynamicValue) and a typed
//! [`NativeValue`](value::NativeValue), and publish every value change,
//! local or device-reported, on one [`PropertySignal`](signal::PropertySignal).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use daq_properties::adapters::MockAdapter;
//! use daq_properties::catalog::{CapabilityId, DeviceType};
//! use daq_properties::config::PropertiesConfig;
//! use daq_properties::properties::Property;
//! use daq_properties::session::{DeviceInfo, DeviceSession};
//! use daq_properties::value::NativeValue;
//!
//! let session = DeviceSession::open(
//!     Arc::new(MockAdapter::demo_power_supply()),
//!     DeviceInfo::new("Demo PSU", DeviceType::PowerSupply, "demo-psu"),
//!     &PropertiesConfig::default(),
//! );
//! let ch1 = session.group("CH1").unwrap();
//! let target = ch1.property(CapabilityId::VoltageTarget).unwrap();
//! target.change_value(NativeValue::Double(12.0))?;
//! println!("{}", target.to_string());
//! # Ok::<(), daq_properties::error::DaqError>(())
//! ```

pub mod adapter;
pub mod adapters;
pub mod binding;
pub mod catalog;
pub mod config;
pub mod configurable;
pub mod dependency;
pub mod error;
pub mod format;
pub mod logging;
pub mod properties;
pub mod session;
pub mod signal;
pub mod value;

pub use adapter::{CapabilityAccess, DeviceAdapter, Notification, UnitId};
pub use binding::{BindingOptions, EditOutcome, PropertyBinding};
pub use catalog::{CapabilityId, DeviceType, Unit, ValueKind};
pub use config::PropertiesConfig;
pub use configurable::{AccessKind, Configurable};
pub use error::{AppResult, DaqError};
pub use properties::Property;
pub use session::{DeviceInfo, DeviceSession, RouteOutcome};
pub use signal::{PropertyEvent, ValueOrigin};
pub use value::{DynamicValue, NativeValue};
