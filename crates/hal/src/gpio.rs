//! GPIO capabilities.
//!
//! One physical pin exposes several roles: [`GpioRead`], [`GpioWrite`], the
//! combined [`GpioReadWrite`] and [`GpioInterrupt`]. All of them share the
//! pin's level and lifecycle.

use crate::callback::EdgeCallback;
use crate::error::HalResult;

/// Logic level of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinLevel {
    /// Logic 0
    #[default]
    Low,
    /// Logic 1
    High,
}

impl PinLevel {
    /// The opposite level.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }

    /// `true` for [`PinLevel::High`].
    #[must_use]
    pub const fn is_high(self) -> bool {
        matches!(self, Self::High)
    }
}

impl From<bool> for PinLevel {
    fn from(value: bool) -> Self {
        if value {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl From<PinLevel> for bool {
    fn from(value: PinLevel) -> Self {
        value.is_high()
    }
}

/// Pin direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// Input only; writes are not supported.
    Input,
    /// Output only; reads return the driven level.
    Output,
    /// Bidirectional.
    #[default]
    InputOutput,
}

impl PinMode {
    /// `true` when the pin may be driven.
    #[must_use]
    pub const fn can_drive(self) -> bool {
        matches!(self, Self::Output | Self::InputOutput)
    }
}

/// Pin configuration, read once at construction and on every `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioConfig {
    /// Direction
    pub mode: PinMode,
    /// Level after `init`
    pub initial_level: PinLevel,
}

/// Edge that fires an interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgeTrigger {
    /// 0 → 1 only
    Rising,
    /// 1 → 0 only
    Falling,
    /// Either transition
    Both,
}

impl EdgeTrigger {
    /// Whether an `old → new` transition fires under this trigger.
    ///
    /// No transition (`old == new`) never fires.
    #[must_use]
    pub const fn fires(self, old: PinLevel, new: PinLevel) -> bool {
        match (old, new) {
            (PinLevel::Low, PinLevel::High) => matches!(self, Self::Rising | Self::Both),
            (PinLevel::High, PinLevel::Low) => matches!(self, Self::Falling | Self::Both),
            _ => false,
        }
    }
}

/// Which way a pin moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// 0 → 1
    Rising,
    /// 1 → 0
    Falling,
}

/// Delivered to an [`EdgeCallback`] when an interrupt fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeEvent {
    /// Pin index within its port
    pub pin: u8,
    /// Direction of the transition
    pub edge: Edge,
    /// Level after the transition
    pub level: PinLevel,
    /// Trigger count including this event
    pub count: u32,
}

/// Read role.
pub trait GpioRead {
    /// Sample the pin.
    fn read(&self) -> HalResult<PinLevel>;
}

/// Write role.
pub trait GpioWrite {
    /// Drive the pin.
    fn write(&mut self, level: PinLevel) -> HalResult<()>;

    /// Invert the driven level.
    fn toggle(&mut self) -> HalResult<()>;
}

/// Combined read-write role.
///
/// Deliberately not a supertrait of [`GpioRead`] + [`GpioWrite`]: every role
/// is a flat, independent table.
pub trait GpioReadWrite {
    /// Sample the pin.
    fn read_level(&self) -> HalResult<PinLevel>;

    /// Drive the pin.
    fn write_level(&mut self, level: PinLevel) -> HalResult<()>;

    /// Invert the driven level and return the new level.
    fn toggle_level(&mut self) -> HalResult<PinLevel>;
}

/// Edge-interrupt role.
pub trait GpioInterrupt {
    /// Register `callback` for `trigger`, replacing any previous registration.
    /// `None` disables the interrupt.
    fn set_interrupt(&mut self, trigger: EdgeTrigger, callback: Option<EdgeCallback>)
        -> HalResult<()>;

    /// Remove the registration.
    fn disable_interrupt(&mut self) -> HalResult<()>;

    /// Currently armed trigger, if any.
    fn interrupt_trigger(&self) -> Option<EdgeTrigger>;
}
