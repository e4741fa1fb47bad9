use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MiaError;

pub const ADDRESS_MASK: u32 = 0x00FF_FFFF;

/// A 24-bit backing-store offset. The mask is applied on construction, so a
/// stored value can never carry bits above bit 23.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Address24(u32);

impl Address24 {
    pub const fn new(address: u32) -> Self {
        Address24(address & ADDRESS_MASK)
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    /// Byte `index` (0 = low, 1 = mid, 2 = high).
    pub fn byte(self, index: u8) -> u8 {
        (self.0 >> (8 * index as u32)) as u8
    }

    pub fn with_byte(self, index: u8, value: u8) -> Self {
        let shift = 8 * index as u32;
        Address24::new((self.0 & !(0xFF << shift)) | ((value as u32) << shift))
    }

    /// Adds `step`, wrapping modulo 2^24. The flag reports a carry out of bit 23.
    pub fn forward(self, step: u8) -> (Self, bool) {
        let next = self.0 + step as u32;
        (Address24::new(next), next > ADDRESS_MASK)
    }

    /// Subtracts `step`, wrapping modulo 2^24. The flag reports a borrow.
    pub fn backward(self, step: u8) -> (Self, bool) {
        let borrowed = (step as u32) > self.0;
        (Address24::new(self.0.wrapping_sub(step as u32)), borrowed)
    }
}

impl fmt::Display for Address24 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:06X}", self.0)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotFlags(u8);

impl SlotFlags {
    pub const NONE: SlotFlags = SlotFlags(0x00);
    pub const AUTO_STEP: SlotFlags = SlotFlags(0x01);
    /// 0 = forward, 1 = backward.
    pub const DIRECTION: SlotFlags = SlotFlags(0x02);
    pub const WRAP_ON_LIMIT: SlotFlags = SlotFlags(0x04);

    pub const fn from_bits(bits: u8) -> Self {
        SlotFlags(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: SlotFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: SlotFlags) -> Self {
        SlotFlags(self.0 | other.0)
    }
}

impl std::ops::BitOr for SlotFlags {
    type Output = SlotFlags;

    fn bitor(self, rhs: SlotFlags) -> SlotFlags {
        self.union(rhs)
    }
}

/// Selector written to CFG_FIELD_SELECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    AddressLow,
    AddressMid,
    AddressHigh,
    DefaultLow,
    DefaultMid,
    DefaultHigh,
    LimitLow,
    LimitMid,
    LimitHigh,
    Step,
    Flags,
    // DMA configuration is global; it is only reachable through a slot.
    CopySource,
    CopyDestination,
    CopyCountLow,
    CopyCountHigh,
}

impl TryFrom<u8> for ConfigField {
    type Error = MiaError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x00 => ConfigField::AddressLow,
            0x01 => ConfigField::AddressMid,
            0x02 => ConfigField::AddressHigh,
            0x03 => ConfigField::DefaultLow,
            0x04 => ConfigField::DefaultMid,
            0x05 => ConfigField::DefaultHigh,
            0x06 => ConfigField::LimitLow,
            0x07 => ConfigField::LimitMid,
            0x08 => ConfigField::LimitHigh,
            0x09 => ConfigField::Step,
            0x0A => ConfigField::Flags,
            0x0B => ConfigField::CopySource,
            0x0C => ConfigField::CopyDestination,
            0x0D => ConfigField::CopyCountLow,
            0x0E => ConfigField::CopyCountHigh,
            other => return Err(MiaError::UnknownConfigField(other)),
        })
    }
}

impl From<ConfigField> for u8 {
    fn from(field: ConfigField) -> u8 {
        field as u8
    }
}

/// Result of one auto-step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Auto-step disabled; the address did not move.
    Held,
    Moved,
    /// Crossed the limit and snapped back to the default address.
    Wrapped,
    /// Carried out of the 24-bit space without a limit catching it.
    Overflowed,
}

/// One of the 256 indirection entries.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub current: Address24,
    pub default: Address24,
    pub limit: Address24,
    pub step: u8,
    pub flags: SlotFlags,
}

impl Slot {
    /// A slot parked at `base`, with `current` and `default` both there.
    pub fn at(base: u32, step: u8, flags: SlotFlags) -> Self {
        Slot {
            current: Address24::new(base),
            default: Address24::new(base),
            limit: Address24::default(),
            step,
            flags,
        }
    }

    /// Same as [`Slot::at`], wrapping back to `base` once `base + size` is reached.
    pub fn region(base: u32, size: u32, step: u8) -> Self {
        Slot {
            limit: Address24::new(base + size),
            ..Slot::at(base, step, SlotFlags::AUTO_STEP | SlotFlags::WRAP_ON_LIMIT)
        }
    }

    /// Moves `current` after an access.
    pub fn advance(&mut self) -> Step {
        if !self.flags.contains(SlotFlags::AUTO_STEP) {
            return Step::Held;
        }

        let wrap = self.flags.contains(SlotFlags::WRAP_ON_LIMIT);
        // The limit is compared against the unmasked result: a borrow below
        // zero is always under the limit, a carry past bit 23 always over it.
        let (next, carried, crossed) = if self.flags.contains(SlotFlags::DIRECTION) {
            let (next, borrowed) = self.current.backward(self.step);
            (next, borrowed, wrap && (borrowed || next < self.limit))
        } else {
            let (next, carried) = self.current.forward(self.step);
            (next, carried, wrap && (carried || next >= self.limit))
        };

        if crossed {
            self.current = self.default;
            Step::Wrapped
        } else {
            self.current = next;
            if carried {
                Step::Overflowed
            } else {
                Step::Moved
            }
        }
    }

    pub fn reset(&mut self) {
        self.current = self.default;
    }

    /// Per-slot fields only; the DMA fields are answered by the engine.
    pub fn field(&self, field: ConfigField) -> Option<u8> {
        Some(match field {
            ConfigField::AddressLow => self.current.byte(0),
            ConfigField::AddressMid => self.current.byte(1),
            ConfigField::AddressHigh => self.current.byte(2),
            ConfigField::DefaultLow => self.default.byte(0),
            ConfigField::DefaultMid => self.default.byte(1),
            ConfigField::DefaultHigh => self.default.byte(2),
            ConfigField::LimitLow => self.limit.byte(0),
            ConfigField::LimitMid => self.limit.byte(1),
            ConfigField::LimitHigh => self.limit.byte(2),
            ConfigField::Step => self.step,
            ConfigField::Flags => self.flags.bits(),
            _ => return None,
        })
    }

    /// Returns `false` for the DMA fields, which the slot does not own.
    pub fn set_field(&mut self, field: ConfigField, value: u8) -> bool {
        match field {
            ConfigField::AddressLow => self.current = self.current.with_byte(0, value),
            ConfigField::AddressMid => self.current = self.current.with_byte(1, value),
            ConfigField::AddressHigh => self.current = self.current.with_byte(2, value),
            ConfigField::DefaultLow => self.default = self.default.with_byte(0, value),
            ConfigField::DefaultMid => self.default = self.default.with_byte(1, value),
            ConfigField::DefaultHigh => self.default = self.default.with_byte(2, value),
            ConfigField::LimitLow => self.limit = self.limit.with_byte(0, value),
            ConfigField::LimitMid => self.limit = self.limit.with_byte(1, value),
            ConfigField::LimitHigh => self.limit = self.limit.with_byte(2, value),
            ConfigField::Step => self.step = value,
            ConfigField::Flags => self.flags = SlotFlags::from_bits(value),
            _ => return false,
        }
        true
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cur={} def={} lim={} step={} flags={:02X}",
            self.current,
            self.default,
            self.limit,
            self.step,
            self.flags.bits()
        )
    }
}
