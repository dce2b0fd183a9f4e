//! Driver state machine.
//!
//! Unlike limits or unit conversions, faults arise from runtime transport
//! failures, so the state is a runtime value rather than a compile-time
//! marker. `Faulted` is terminal until an explicit reinitialization.

/// Runtime state of a motor driver instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriveState {
    /// Constructed but the controller has not completed its first reset.
    #[default]
    Uninitialized,
    /// Controller reachable, coils de-energized.
    Disabled,
    /// Energized and holding position.
    EnabledIdle,
    /// Energized with a motion command outstanding.
    EnabledMoving,
    /// A transport failure was latched; every command fails fast until
    /// reinitialized.
    Faulted,
}

impl DriveState {
    /// Whether motion commands are accepted in this state.
    #[inline]
    pub fn is_enabled(self) -> bool {
        matches!(self, DriveState::EnabledIdle | DriveState::EnabledMoving)
    }

    /// Whether the driver has latched a fault.
    #[inline]
    pub fn is_faulted(self) -> bool {
        self == DriveState::Faulted
    }

    /// State name for display/debugging.
    pub fn name(self) -> &'static str {
        match self {
            DriveState::Uninitialized => "Uninitialized",
            DriveState::Disabled => "Disabled",
            DriveState::EnabledIdle => "EnabledIdle",
            DriveState::EnabledMoving => "EnabledMoving",
            DriveState::Faulted => "Faulted",
        }
    }
}
