//! Display/edit binding between a UI element and one property.
//!
//! A widget that both shows and edits a property sees every value change,
//! including the ones it caused itself, through the property's single
//! value-changed event. Many toolkits also report programmatic display
//! updates through the same callback as user edits. Without care a
//! binding would write back every value it is shown.
//!
//! [`PropertyBinding`] applies incoming values with the edit path
//! suppressed, so a display hook that calls [`PropertyBinding::user_edit`]
//! while a value is being applied gets [`EditOutcome::Suppressed`] instead
//! of a second `change_value`. A value-changed event tagged
//! [`ValueOrigin::LocalEdit`] that carries the value the binding is
//! committing is recognised as its own echo and not re-applied.
//!
//! The displayed value only moves on a successful commit, a successful
//! [`refresh`](PropertyBinding::refresh), or a value-changed event. A
//! rejected edit leaves the last good value on display.
//!
//! # Example
//!
//! ```rust,ignore
//! let binding = PropertyBinding::new(property, BindingOptions::default());
//! binding.on_display(|binding, value| {
//!     spin_box.set_value(value);
//! });
//! spin_box.on_edited(move |v| { let _ = binding.user_edit(v); });
//! ```

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

use crate::error::AppResult;
use crate::properties::{Property, PropertyMetadata};
use crate::signal::{ListenerId, PropertyEvent, ValueOrigin};
use crate::value::NativeValue;

/// Binding behaviour flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingOptions {
    /// Write user edits to the device immediately.
    pub auto_commit: bool,
    /// Follow value changes reported by the property.
    pub auto_update: bool,
}

impl Default for BindingOptions {
    fn default() -> Self {
        Self {
            auto_commit: true,
            auto_update: true,
        }
    }
}

/// What happened to a user edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// Written to the device.
    Committed,
    /// Held until [`PropertyBinding::commit`] (auto-commit off).
    Deferred,
    /// Arrived while a value was being applied to the display; ignored.
    Suppressed,
}

type DisplayHook = Arc<dyn Fn(&PropertyBinding, &NativeValue) + Send + Sync>;

struct Inner {
    property: Arc<dyn Property>,
    options: BindingOptions,
    display: RwLock<Option<NativeValue>>,
    metadata: RwLock<PropertyMetadata>,
    pending: Mutex<Option<NativeValue>>,
    in_flight: Mutex<Option<NativeValue>>,
    applying: AtomicBool,
    commits: AtomicUsize,
    hook: RwLock<Option<DisplayHook>>,
    listener: Mutex<Option<ListenerId>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(id) = self.listener.get_mut().take() {
            self.property.signal().disconnect(id);
        }
    }
}

/// Resets the apply flag when the display update finishes.
struct ApplyGuard<'a>(&'a AtomicBool);

impl Drop for ApplyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Echo-free binding of one property to one display element.
///
/// Cloning yields another handle to the same binding. The binding detaches
/// from the property when the last handle is dropped.
#[derive(Clone)]
pub struct PropertyBinding {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for PropertyBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyBinding")
            .field("key", &self.inner.property.capability())
            .field("options", &self.inner.options)
            .field("display", &*self.inner.display.read())
            .finish()
    }
}

impl PropertyBinding {
    /// Bind to `property`, reading its current value and metadata.
    pub fn new(property: Arc<dyn Property>, options: BindingOptions) -> Self {
        let display = if property.is_readable() {
            match property.value() {
                Ok(value) => Some(value),
                Err(err) => {
                    debug!(key = %property.capability(), error = %err, "Initial read failed");
                    None
                }
            }
        } else {
            None
        };

        let inner = Arc::new(Inner {
            metadata: RwLock::new(property.metadata()),
            property,
            options,
            display: RwLock::new(display),
            pending: Mutex::new(None),
            in_flight: Mutex::new(None),
            applying: AtomicBool::new(false),
            commits: AtomicUsize::new(0),
            hook: RwLock::new(None),
            listener: Mutex::new(None),
        });

        let weak: Weak<Inner> = Arc::downgrade(&inner);
        let id = inner.property.signal().connect(move |event| {
            if let Some(inner) = weak.upgrade() {
                PropertyBinding { inner }.handle_event(event);
            }
        });
        *inner.listener.lock() = Some(id);

        PropertyBinding { inner }
    }

    /// Register the callback that pushes applied values into the widget.
    ///
    /// Replaces any previous hook.
    pub fn on_display<F>(&self, hook: F)
    where
        F: Fn(&PropertyBinding, &NativeValue) + Send + Sync + 'static,
    {
        *self.inner.hook.write() = Some(Arc::new(hook));
    }

    /// Bound property.
    pub fn property(&self) -> &Arc<dyn Property> {
        &self.inner.property
    }

    /// Behaviour flags.
    pub fn options(&self) -> BindingOptions {
        self.inner.options
    }

    /// Last known-good value.
    pub fn display(&self) -> Option<NativeValue> {
        self.inner.display.read().clone()
    }

    /// Last known-good value formatted by the property.
    pub fn display_text(&self) -> String {
        self.display()
            .map(|value| self.inner.property.format_value(&value))
            .unwrap_or_default()
    }

    /// Bounds or legal values as of the last list change.
    pub fn metadata(&self) -> PropertyMetadata {
        self.inner.metadata.read().clone()
    }

    /// Edit held back because auto-commit is off.
    pub fn pending(&self) -> Option<NativeValue> {
        self.inner.pending.lock().clone()
    }

    /// Number of successful writes issued by this binding.
    pub fn commit_count(&self) -> usize {
        self.inner.commits.load(Ordering::Acquire)
    }

    /// Whether a value is currently being applied to the display.
    pub fn is_applying(&self) -> bool {
        self.inner.applying.load(Ordering::Acquire)
    }

    /// Handle an edit made in the widget.
    ///
    /// On failure the display keeps its last good value and the error is
    /// returned.
    pub fn user_edit(&self, value: NativeValue) -> AppResult<EditOutcome> {
        if self.is_applying() {
            return Ok(EditOutcome::Suppressed);
        }
        if !self.inner.options.auto_commit {
            *self.inner.pending.lock() = Some(value);
            return Ok(EditOutcome::Deferred);
        }
        self.write(value)?;
        Ok(EditOutcome::Committed)
    }

    /// Write the deferred edit. Returns false if there was none.
    pub fn commit(&self) -> AppResult<bool> {
        let Some(value) = self.inner.pending.lock().take() else {
            return Ok(false);
        };
        self.write(value)?;
        Ok(true)
    }

    /// Re-read the property and apply the result.
    pub fn refresh(&self) -> AppResult<()> {
        let value = self.inner.property.value()?;
        self.apply(value);
        Ok(())
    }

    fn write(&self, value: NativeValue) -> AppResult<()> {
        *self.inner.in_flight.lock() = Some(value.clone());
        let result = self.inner.property.change_value(value.clone());
        *self.inner.in_flight.lock() = None;

        match result {
            Ok(()) => {
                self.inner.commits.fetch_add(1, Ordering::AcqRel);
                *self.inner.display.write() = Some(value);
                Ok(())
            }
            Err(err) => {
                warn!(
                    key = %self.inner.property.capability(),
                    error = %err,
                    "Edit rejected, keeping last value"
                );
                Err(err)
            }
        }
    }

    fn handle_event(&self, event: &PropertyEvent) {
        match event {
            PropertyEvent::ValueChanged { value, origin } => {
                if !self.inner.options.auto_update {
                    return;
                }
                if *origin == ValueOrigin::LocalEdit
                    && self.inner.in_flight.lock().as_ref() == Some(value)
                {
                    // Our own write.
                    return;
                }
                self.apply(value.clone());
            }
            PropertyEvent::ListChanged => {
                *self.inner.metadata.write() = self.inner.property.metadata();
            }
        }
    }

    fn apply(&self, value: NativeValue) {
        *self.inner.display.write() = Some(value.clone());

        if self.inner.applying.swap(true, Ordering::AcqRel) {
            // Nested apply from inside the hook: the display is updated,
            // the outer apply is still pushing to the widget.
            return;
        }
        let _guard = ApplyGuard(&self.inner.applying);
        let hook = self.inner.hook.read().clone();
        if let Some(hook) = hook {
            hook(self, &value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{CapabilityAccess, Notification, UnitId};
    use crate::adapters::MockAdapter;
    use crate::catalog::{CapabilityId, DeviceType};
    use crate::config::DiscoveryConfig;
    use crate::configurable::{Configurable, ConfigurableIdentity};
    use crate::error::DaqError;

    fn target() -> (Arc<MockAdapter>, Arc<Configurable>) {
        let mock = Arc::new(MockAdapter::new().with_capability(
            UnitId::Device,
            CapabilityId::VoltageTarget,
            CapabilityAccess::READ_WRITE,
            1.0,
        ));
        let cfg = Configurable::discover(
            mock.clone(),
            ConfigurableIdentity {
                index: 0,
                device_name: "PSU".into(),
                device_type: DeviceType::PowerSupply,
                settings_id: "psu".into(),
                unit: UnitId::Device,
            },
            &DiscoveryConfig::default(),
        );
        (mock, cfg)
    }

    #[test]
    fn reads_initial_value() {
        let (_mock, cfg) = target();
        let binding = PropertyBinding::new(
            cfg.property(CapabilityId::VoltageTarget).unwrap(),
            BindingOptions::default(),
        );
        assert_eq!(binding.display(), Some(NativeValue::Double(1.0)));
    }

    #[test]
    fn device_value_applied_without_commit() {
        let (_mock, cfg) = target();
        let binding = PropertyBinding::new(
            cfg.property(CapabilityId::VoltageTarget).unwrap(),
            BindingOptions::default(),
        );
        // A naive widget echoes every display update as an edit.
        binding.on_display(|binding, value| {
            let outcome = binding.user_edit(value.clone()).unwrap();
            assert_eq!(outcome, EditOutcome::Suppressed);
        });

        cfg.deliver(&Notification::new(CapabilityId::VoltageTarget, 4.0))
            .unwrap();
        assert_eq!(binding.display(), Some(NativeValue::Double(4.0)));
        assert_eq!(binding.commit_count(), 0);
        assert!(!binding.is_applying());
    }

    #[test]
    fn rejected_edit_keeps_display() {
        let (mock, cfg) = target();
        let binding = PropertyBinding::new(
            cfg.property(CapabilityId::VoltageTarget).unwrap(),
            BindingOptions::default(),
        );
        mock.reject_sets(&UnitId::Device, CapabilityId::VoltageTarget, Some("over limit"));

        let err = binding.user_edit(NativeValue::Double(99.0)).unwrap_err();
        assert!(matches!(err, DaqError::Adapter { .. }));
        assert_eq!(binding.display(), Some(NativeValue::Double(1.0)));
        assert_eq!(binding.commit_count(), 0);
    }

    #[test]
    fn deferred_edit_waits_for_commit() {
        let (mock, cfg) = target();
        let binding = PropertyBinding::new(
            cfg.property(CapabilityId::VoltageTarget).unwrap(),
            BindingOptions {
                auto_commit: false,
                auto_update: true,
            },
        );
        assert_eq!(
            binding.user_edit(NativeValue::Double(2.0)).unwrap(),
            EditOutcome::Deferred
        );
        assert_eq!(mock.set_calls(&UnitId::Device, CapabilityId::VoltageTarget), 0);
        assert!(binding.commit().unwrap());
        assert_eq!(mock.set_calls(&UnitId::Device, CapabilityId::VoltageTarget), 1);
        assert_eq!(binding.display(), Some(NativeValue::Double(2.0)));
        assert!(!binding.commit().unwrap());
    }

    #[test]
    fn no_auto_update_ignores_device_changes() {
        let (_mock, cfg) = target();
        let binding = PropertyBinding::new(
            cfg.property(CapabilityId::VoltageTarget).unwrap(),
            BindingOptions {
                auto_commit: true,
                auto_update: false,
            },
        );
        cfg.deliver(&Notification::new(CapabilityId::VoltageTarget, 7.0))
            .unwrap();
        assert_eq!(binding.display(), Some(NativeValue::Double(1.0)));
        binding.refresh().unwrap();
        assert_eq!(binding.display(), Some(NativeValue::Double(1.0)));
    }

    #[test]
    fn drop_disconnects_listener() {
        let (_mock, cfg) = target();
        let property = cfg.property(CapabilityId::VoltageTarget).unwrap();
        let binding = PropertyBinding::new(Arc::clone(&property), BindingOptions::default());
        let second = binding.clone();
        assert_eq!(property.signal().listener_count(), 1);
        drop(binding);
        assert_eq!(property.signal().listener_count(), 1);
        drop(second);
        assert_eq!(property.signal().listener_count(), 0);
    }
}
