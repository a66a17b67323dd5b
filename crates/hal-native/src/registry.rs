//! Name-keyed device registry.
//!
//! Built once at startup from descriptors (usually a [`BoardTable`]). Devices
//! are constructed at most once: always-on kinds at registration, everything
//! else on first [`Registry::resolve`]. Every later lookup of the same name
//! returns a handle to the same state. Handles are never reference counted
//! by the registry; devices live as long as it does.
//!
//! [`BoardTable`]: crate::board::BoardTable

use std::collections::BTreeMap;

use hal::{DeviceKind, DeviceName, HalError, HalResult};

use crate::board::BoardTable;
use crate::clock::SimClock;
use crate::config::RegistryLimits;
use crate::descriptor::DeviceDescriptor;
use crate::device::Device;
use crate::devices::{
    NativeAdc, NativeCrc, NativeDac, NativeGpio, NativeI2c, NativeOptionBytes, NativeRtc,
    NativeSpi, NativeTimer, NativeUart, NativeUsb, NativeWatchdog,
};

struct Entry {
    descriptor: DeviceDescriptor,
    device: Option<Device>,
}

/// Device registry and factory for the simulated backend.
pub struct Registry {
    limits: RegistryLimits,
    clock: SimClock,
    entries: Vec<Entry>,
    by_name: BTreeMap<DeviceName, usize>,
    constructed: BTreeMap<DeviceKind, usize>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(RegistryLimits::default())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("limits", &self.limits)
            .field("devices", &self.entries.len())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

macro_rules! typed_resolver {
    ($($fn:ident => $into:ident -> $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Resolve `name` as a [`", stringify!($ty), "`]; `None` if unknown, not constructible or of another kind.")]
            pub fn $fn(&mut self, name: &str) -> Option<$ty> {
                self.resolve(name)?.$into()
            }
        )*
    };
}

impl Registry {
    /// Empty registry on a fresh clock.
    #[must_use]
    pub fn new(limits: RegistryLimits) -> Self {
        Self::with_clock(limits, SimClock::new())
    }

    /// Empty registry on `clock`.
    #[must_use]
    pub fn with_clock(limits: RegistryLimits, clock: SimClock) -> Self {
        Self {
            limits,
            clock,
            entries: Vec::new(),
            by_name: BTreeMap::new(),
            constructed: BTreeMap::new(),
        }
    }

    /// Registry holding every descriptor of `table`.
    pub fn from_board(table: &BoardTable) -> HalResult<Self> {
        let mut registry = Self::new(table.limits);
        for descriptor in &table.devices {
            registry.register(descriptor.clone())?;
        }
        tracing::debug!(devices = registry.entries.len(), "registry built from board table");
        Ok(registry)
    }

    /// Add a descriptor.
    ///
    /// Duplicate names and duplicate `(kind, index)` pairs are
    /// `InvalidArgument`; a full registry is `NoMemory`. Always-on kinds are
    /// constructed here, and a failure to construct them rejects the
    /// registration.
    pub fn register(&mut self, descriptor: DeviceDescriptor) -> HalResult<()> {
        descriptor.validate()?;
        if self.entries.len() >= self.limits.max_devices {
            tracing::warn!(device = descriptor.name.as_str(), "registry full");
            return Err(HalError::NoMemory);
        }
        if self.by_name.contains_key(&descriptor.name)
            || self
                .entries
                .iter()
                .any(|e| e.descriptor.kind == descriptor.kind && e.descriptor.index == descriptor.index)
        {
            return Err(HalError::InvalidArgument);
        }

        let device = if descriptor.kind.constructs_eagerly() {
            Some(self.construct(&descriptor)?)
        } else {
            None
        };
        tracing::debug!(
            device = descriptor.name.as_str(),
            kind = descriptor.kind.as_str(),
            index = descriptor.index,
            eager = device.is_some(),
            "register"
        );
        self.by_name
            .insert(descriptor.name.clone(), self.entries.len());
        self.entries.push(Entry { descriptor, device });
        Ok(())
    }

    fn construct(&mut self, descriptor: &DeviceDescriptor) -> HalResult<Device> {
        let count = self.constructed.get(&descriptor.kind).copied().unwrap_or(0);
        if count >= self.limits.max_per_kind {
            return Err(HalError::NoMemory);
        }
        let device = descriptor.construct(&self.clock)?;
        self.constructed
            .insert(descriptor.kind, count.saturating_add(1));
        Ok(device)
    }

    /// Handle to the device registered as `name`, constructing it on first
    /// use. Unknown names and failed constructions are `None`.
    pub fn resolve(&mut self, name: &str) -> Option<Device> {
        let slot = *self.by_name.get(name)?;
        if let Some(device) = self.entries.get(slot).and_then(|e| e.device.as_ref()) {
            return Some(device.clone());
        }
        let descriptor = self.entries.get(slot)?.descriptor.clone();
        match self.construct(&descriptor) {
            Ok(device) => {
                if let Some(entry) = self.entries.get_mut(slot) {
                    entry.device = Some(device.clone());
                }
                Some(device)
            }
            Err(e) => {
                tracing::warn!(device = name, error = e.as_str(), "construction failed");
                None
            }
        }
    }

    typed_resolver! {
        gpio => into_gpio -> NativeGpio,
        uart => into_uart -> NativeUart,
        spi => into_spi -> NativeSpi,
        i2c => into_i2c -> NativeI2c,
        adc => into_adc -> NativeAdc,
        dac => into_dac -> NativeDac,
        timer => into_timer -> NativeTimer,
        rtc => into_rtc -> NativeRtc,
        crc => into_crc -> NativeCrc,
        watchdog => into_watchdog -> NativeWatchdog,
        usb => into_usb -> NativeUsb,
        option_bytes => into_option_bytes -> NativeOptionBytes,
    }

    /// Give a handle back. Devices are not reference counted, so this does
    /// nothing; the device stays constructed.
    pub fn release(&self, device: Device) {
        drop(device);
    }

    /// `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// `name` is registered and has been constructed.
    #[must_use]
    pub fn is_constructed(&self, name: &str) -> bool {
        self.entry(name).is_some_and(|e| e.device.is_some())
    }

    /// Descriptor registered as `name`.
    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<&DeviceDescriptor> {
        self.entry(name).map(|e| &e.descriptor)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &DeviceName> + '_ {
        self.entries.iter().map(|e| &e.descriptor.name)
    }

    /// Registered descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Nothing registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Capacity limits.
    #[must_use]
    pub fn limits(&self) -> RegistryLimits {
        self.limits
    }

    fn entry(&self, name: &str) -> Option<&Entry> {
        self.by_name.get(name).and_then(|&i| self.entries.get(i))
    }

    // ── Test support ─────────────────────────────────────────────────────

    /// The clock every time-driven device of this registry follows.
    #[must_use]
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Advance simulated time; due callbacks run before this returns.
    pub fn advance_time(&self, ticks: u64) {
        self.clock.advance(ticks);
    }

    /// Return the clock to tick 0.
    pub fn reset_clock(&self) {
        self.clock.reset();
    }

    /// Power-on reset of one device. `NotFound` for unknown names; a device
    /// not yet constructed is already in its power-on state.
    pub fn reset_device(&self, name: &str) -> HalResult<()> {
        let entry = self.entry(name).ok_or(HalError::NotFound)?;
        if let Some(device) = &entry.device {
            device.power_on_reset();
        }
        Ok(())
    }

    /// Power-on reset of every constructed device of `kind`.
    pub fn reset_kind(&self, kind: DeviceKind) {
        for device in self.constructed_devices().filter(|d| d.kind() == kind) {
            device.power_on_reset();
        }
        tracing::debug!(kind = kind.as_str(), "reset kind");
    }

    /// Power-on reset of every constructed device.
    pub fn reset_all(&self) {
        for device in self.constructed_devices() {
            device.power_on_reset();
        }
        tracing::debug!("reset all");
    }

    fn constructed_devices(&self) -> impl Iterator<Item = &Device> + '_ {
        self.entries.iter().filter_map(|e| e.device.as_ref())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::descriptor::DeviceConfig;
    use hal::{DeviceState, UartConfig};

    fn registry() -> Registry {
        let mut r = Registry::default();
        r.register(DeviceDescriptor::new(DeviceKind::Uart, 0).unwrap())
            .unwrap();
        r.register(DeviceDescriptor::new(DeviceKind::OptionBytes, 0).unwrap())
            .unwrap();
        r
    }

    #[test]
    fn lazy_and_eager_construction() {
        let mut r = registry();
        assert!(!r.is_constructed("UART0"));
        assert!(r.is_constructed("OPTBYTES0"));
        assert!(r.resolve("UART0").is_some());
        assert!(r.is_constructed("UART0"));
    }

    #[test]
    fn repeated_resolution_aliases() {
        let mut r = registry();
        let a = r.resolve("UART0").unwrap();
        let mut b = r.resolve("UART0").unwrap();
        b.lifecycle().init().unwrap();
        assert_eq!(a.state(), DeviceState::Running);
        assert!(a.same_device(&b));
    }

    #[test]
    fn unknown_and_mistyped_names() {
        let mut r = registry();
        assert!(r.resolve("UART9").is_none());
        assert!(r.resolve("uart0").is_none());
        assert!(r.resolve("not a name").is_none());
        assert!(r.spi("UART0").is_none());
        assert!(r.uart("UART0").is_some());
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut r = registry();
        let same_name = DeviceDescriptor::named(DeviceKind::Uart, 5, "UART0").unwrap();
        assert_eq!(r.register(same_name), Err(HalError::InvalidArgument));
        let same_index = DeviceDescriptor::named(DeviceKind::Uart, 0, "CONSOLE").unwrap();
        assert_eq!(r.register(same_index), Err(HalError::InvalidArgument));
    }

    #[test]
    fn full_registry_is_no_memory() {
        let mut r = Registry::new(RegistryLimits {
            max_devices: 1,
            ..RegistryLimits::default()
        });
        r.register(DeviceDescriptor::new(DeviceKind::Adc, 0).unwrap())
            .unwrap();
        assert_eq!(
            r.register(DeviceDescriptor::new(DeviceKind::Adc, 1).unwrap()),
            Err(HalError::NoMemory)
        );
    }

    #[test]
    fn per_kind_limit_surfaces_as_not_found() {
        let mut r = Registry::new(RegistryLimits {
            max_per_kind: 1,
            ..RegistryLimits::default()
        });
        r.register(DeviceDescriptor::new(DeviceKind::Timer, 0).unwrap())
            .unwrap();
        r.register(DeviceDescriptor::new(DeviceKind::Timer, 1).unwrap())
            .unwrap();
        assert!(r.timer("TIMER0").is_some());
        assert!(r.timer("TIMER1").is_none());
        assert!(!r.is_constructed("TIMER1"));
    }

    #[test]
    fn invalid_config_fails_registration() {
        let mut r = Registry::default();
        let desc = DeviceDescriptor::new(DeviceKind::Spi, 0)
            .unwrap()
            .with_config(DeviceConfig::Uart(UartConfig::default()));
        assert_eq!(r.register(desc), Err(HalError::InvalidArgument));
        assert!(r.is_empty());
    }

    #[test]
    fn reset_device_returns_to_power_on() {
        let mut r = registry();
        let mut uart = r.resolve("UART0").unwrap();
        uart.lifecycle().init().unwrap();
        r.reset_device("UART0").unwrap();
        assert_eq!(uart.state(), DeviceState::Uninitialized);
        assert_eq!(r.reset_device("NOPE"), Err(HalError::NotFound));
    }

    #[test]
    fn names_keep_registration_order() {
        let r = registry();
        let names: Vec<&str> = r.names().map(DeviceName::as_str).collect();
        assert_eq!(names, ["UART0", "OPTBYTES0"]);
    }
}
