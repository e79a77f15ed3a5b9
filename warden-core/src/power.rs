//! Power state bitmask as reported by the collaborator.

use std::fmt;

/// Snapshot of a VM's power state flags.
///
/// Never cached: every health check reads a fresh value. Only
/// [`PowerState::POWERED_OFF`] drives any decision in the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PowerState(u32);

impl PowerState {
    pub const POWERING_OFF: Self = Self(0x0001);
    pub const POWERED_OFF: Self = Self(0x0002);
    pub const POWERING_ON: Self = Self(0x0004);
    pub const POWERED_ON: Self = Self(0x0008);
    pub const SUSPENDING: Self = Self(0x0010);
    pub const SUSPENDED: Self = Self(0x0020);
    pub const TOOLS_RUNNING: Self = Self(0x0040);
    pub const RESETTING: Self = Self(0x0080);
    pub const BLOCKED_ON_MSG: Self = Self(0x0100);
    pub const PAUSED: Self = Self(0x0200);
    pub const RESUMING: Self = Self(0x0800);

    const NAMES: [(Self, &'static str); 11] = [
        (Self::POWERING_OFF, "powering-off"),
        (Self::POWERED_OFF, "powered-off"),
        (Self::POWERING_ON, "powering-on"),
        (Self::POWERED_ON, "powered-on"),
        (Self::SUSPENDING, "suspending"),
        (Self::SUSPENDED, "suspended"),
        (Self::TOOLS_RUNNING, "tools-running"),
        (Self::RESETTING, "resetting"),
        (Self::BLOCKED_ON_MSG, "blocked-on-msg"),
        (Self::PAUSED, "paused"),
        (Self::RESUMING, "resuming"),
    ];

    /// Wraps a raw bitmask.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw bitmask.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if every flag in `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if the powered-off flag is set, regardless of any
    /// other flags.
    #[must_use]
    pub const fn is_powered_off(self) -> bool {
        self.contains(Self::POWERED_OFF)
    }
}

impl std::ops::BitOr for PowerState {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::LowerHex for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut known = 0u32;
        for (flag, name) in Self::NAMES {
            known |= flag.0;
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        let unknown = self.0 & !known;
        if unknown != 0 {
            if !first {
                f.write_str("|")?;
            }
            write!(f, "0x{unknown:x}")?;
            first = false;
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}
