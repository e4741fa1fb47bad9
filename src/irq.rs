//! Interrupt controller.
//!
//! Sources accumulate into a 16-bit cause register. A source only reaches
//! the CPU when its mask bit is set and the global enable is on:
//!
//! | Bit | Source                |
//! |-----|-----------------------|
//! | 0   | Memory error          |
//! | 1   | Index overflow        |
//! | 2   | DMA complete          |
//! | 3   | DMA error             |
//! | 4   | USB keyboard          |
//! | 5   | USB device change     |
//! | 8   | Video frame complete  |
//! | 9   | Video collision       |
//!
//! The CPU acknowledges a source by writing 1 to its cause bit. The IRQ line
//! is driven from every mutating operation so that it always equals
//! [`IrqController::is_pending`].

use std::{cell::Cell, fmt, rc::Rc};

use derivative::Derivative;

pub const IRQ_NONE: u16 = 0x0000;
pub const IRQ_MEMORY_ERROR: u16 = 0x0001;
pub const IRQ_INDEX_OVERFLOW: u16 = 0x0002;
pub const IRQ_DMA_COMPLETE: u16 = 0x0004;
pub const IRQ_DMA_ERROR: u16 = 0x0008;
pub const IRQ_USB_KEYBOARD: u16 = 0x0010;
pub const IRQ_USB_DEVICE_CHANGE: u16 = 0x0020;
pub const IRQ_VIDEO_FRAME_COMPLETE: u16 = 0x0100;
pub const IRQ_VIDEO_COLLISION: u16 = 0x0200;

/// Physical IRQ output towards the 6502.
pub trait IrqLine {
    fn set_asserted(&mut self, asserted: bool);
}

/// Active-low IRQ pin. Clones share the same electrical level, so a host can
/// keep one handle while the controller drives another.
#[derive(Clone)]
pub struct IrqPin {
    level_low: Rc<Cell<bool>>,
}

impl IrqPin {
    pub fn new() -> Self {
        IrqPin {
            level_low: Rc::new(Cell::new(false)),
        }
    }

    /// `true` while the line is pulled low (IRQ asserted).
    pub fn is_low(&self) -> bool {
        self.level_low.get()
    }
}

impl Default for IrqPin {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for IrqPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IrqPin({})", if self.is_low() { "LOW" } else { "HIGH" })
    }
}

impl IrqLine for IrqPin {
    fn set_asserted(&mut self, asserted: bool) {
        self.level_low.set(asserted);
    }
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct IrqController {
    cause: u16,
    mask: u16,
    enable: bool,
    line_asserted: bool,
    #[derivative(Debug = "ignore")]
    line: Option<Box<dyn IrqLine>>,
}

impl IrqController {
    pub fn new() -> Self {
        IrqController {
            cause: IRQ_NONE,
            mask: 0xFFFF,
            enable: true,
            line_asserted: false,
            line: None,
        }
    }

    /// Attaches the physical line and drives it to the current state.
    pub fn connect(&mut self, line: Box<dyn IrqLine>) {
        self.line = Some(line);
        self.update_line();
    }

    /// Power-on state: nothing pending, every source unmasked, globally enabled.
    pub fn reset(&mut self) {
        self.cause = IRQ_NONE;
        self.mask = 0xFFFF;
        self.enable = true;
        self.update_line();
    }

    pub fn raise(&mut self, cause: u16) {
        self.cause |= cause;
        tracing::trace!(
            "[IRQ] raise {:04X} -> cause {:04X} mask {:04X}",
            cause,
            self.cause,
            self.mask
        );
        self.update_line();
    }

    pub fn clear(&mut self, cause: u16) {
        self.cause &= !cause;
        self.update_line();
    }

    pub fn clear_all(&mut self) {
        self.cause = IRQ_NONE;
        self.update_line();
    }

    /// Write-1-to-clear on the low cause byte.
    pub fn acknowledge_low(&mut self, clear_bits: u8) {
        self.clear(clear_bits as u16);
    }

    /// Write-1-to-clear on the high cause byte.
    pub fn acknowledge_high(&mut self, clear_bits: u8) {
        self.clear((clear_bits as u16) << 8);
    }

    pub fn cause(&self) -> u16 {
        self.cause
    }

    pub fn cause_low(&self) -> u8 {
        (self.cause & 0xFF) as u8
    }

    pub fn cause_high(&self) -> u8 {
        (self.cause >> 8) as u8
    }

    pub fn mask(&self) -> u16 {
        self.mask
    }

    pub fn mask_low(&self) -> u8 {
        (self.mask & 0xFF) as u8
    }

    pub fn mask_high(&self) -> u8 {
        (self.mask >> 8) as u8
    }

    pub fn set_mask(&mut self, mask: u16) {
        self.mask = mask;
        self.update_line();
    }

    pub fn set_mask_low(&mut self, value: u8) {
        self.set_mask((self.mask & 0xFF00) | value as u16);
    }

    pub fn set_mask_high(&mut self, value: u8) {
        self.set_mask((self.mask & 0x00FF) | ((value as u16) << 8));
    }

    /// Reads back as 0 or 1.
    pub fn global_enable(&self) -> u8 {
        self.enable as u8
    }

    /// Any nonzero value enables.
    pub fn set_global_enable(&mut self, enable: u8) {
        self.enable = enable != 0;
        self.update_line();
    }

    pub fn is_pending(&self) -> bool {
        self.enable && (self.cause & self.mask) != 0
    }

    /// Level most recently driven onto the IRQ line.
    pub fn line_asserted(&self) -> bool {
        self.line_asserted
    }

    fn update_line(&mut self) {
        let pending = self.is_pending();
        if pending != self.line_asserted {
            tracing::debug!(
                "[IRQ] line {} (cause {:04X} mask {:04X} enable {})",
                if pending { "asserted" } else { "released" },
                self.cause,
                self.mask,
                self.enable
            );
        }
        self.drive_line(pending);
    }

    fn drive_line(&mut self, asserted: bool) {
        self.line_asserted = asserted;
        if let Some(line) = self.line.as_mut() {
            line.set_asserted(asserted);
        }
    }
}

impl Default for IrqController {
    fn default() -> Self {
        Self::new()
    }
}
