// +-----------+------------------------------------------------+
// | Range     | Description                                    |
// +-----------+------------------------------------------------+
// | 0x00-0x0F | Window A                                       |
// | 0x10-0x1F | Window B                                       |
// | 0x20-0x2F | Window C                                       |
// | 0x30-0x3F | Window D                                       |
// | 0x40-0x7F | Reserved (windows E-H)                         |
// | 0x80-0xEF | Reserved shared space                          |
// | 0xF0      | DEVICE_STATUS (read-only)                      |
// | 0xF1      | IRQ_CAUSE_LOW (write 1 to clear)               |
// | 0xF2      | IRQ_CAUSE_HIGH (write 1 to clear)              |
// | 0xF3      | IRQ_MASK_LOW                                   |
// | 0xF4      | IRQ_MASK_HIGH                                  |
// | 0xF5      | IRQ_ENABLE                                     |
// | 0xFF      | SHARED_COMMAND (write-only)                    |
// +-----------+------------------------------------------------+

use crate::error::MiaError;

pub const REG_DEVICE_STATUS: u8 = 0xF0;
pub const REG_IRQ_CAUSE_LOW: u8 = 0xF1;
pub const REG_IRQ_CAUSE_HIGH: u8 = 0xF2;
pub const REG_IRQ_MASK_LOW: u8 = 0xF3;
pub const REG_IRQ_MASK_HIGH: u8 = 0xF4;
pub const REG_IRQ_ENABLE: u8 = 0xF5;
pub const REG_SHARED_COMMAND: u8 = 0xFF;

pub const REG_OFFSET_IDX_SELECT: u8 = 0x00;
pub const REG_OFFSET_DATA_PORT: u8 = 0x01;
pub const REG_OFFSET_CFG_FIELD_SELECT: u8 = 0x02;
pub const REG_OFFSET_CFG_DATA: u8 = 0x03;
pub const REG_OFFSET_COMMAND: u8 = 0x04;

/// Windows backed by state; E-H decode as reserved.
pub const WIRED_WINDOWS: usize = 4;

pub const STATUS_IRQ_PENDING: u8 = 0x02;
pub const STATUS_MEMORY_ERROR: u8 = 0x04;
pub const STATUS_INDEX_OVERFLOW: u8 = 0x08;
pub const STATUS_DMA_ACTIVE: u8 = 0x40;
pub const STATUS_SYSTEM_READY: u8 = 0x80;

/// Base address of window `window`.
pub const fn window_base(window: u8) -> u8 {
    window << 4
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRegister {
    IdxSelect,
    DataPort,
    CfgFieldSelect,
    CfgData,
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedRegister {
    DeviceStatus,
    IrqCauseLow,
    IrqCauseHigh,
    IrqMaskLow,
    IrqMaskHigh,
    IrqEnable,
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    Window { window: u8, register: WindowRegister },
    Shared(SharedRegister),
    /// Reads as zero, writes are dropped.
    Reserved,
}

/// Maps a local bus address to the register it selects.
pub fn decode(address: u8) -> Register {
    if address & 0x80 != 0 {
        let register = match address {
            REG_DEVICE_STATUS => SharedRegister::DeviceStatus,
            REG_IRQ_CAUSE_LOW => SharedRegister::IrqCauseLow,
            REG_IRQ_CAUSE_HIGH => SharedRegister::IrqCauseHigh,
            REG_IRQ_MASK_LOW => SharedRegister::IrqMaskLow,
            REG_IRQ_MASK_HIGH => SharedRegister::IrqMaskHigh,
            REG_IRQ_ENABLE => SharedRegister::IrqEnable,
            REG_SHARED_COMMAND => SharedRegister::Command,
            _ => return Register::Reserved,
        };
        return Register::Shared(register);
    }

    let window = (address >> 4) & 0x07;
    if window as usize >= WIRED_WINDOWS {
        return Register::Reserved;
    }

    let register = match address & 0x0F {
        REG_OFFSET_IDX_SELECT => WindowRegister::IdxSelect,
        REG_OFFSET_DATA_PORT => WindowRegister::DataPort,
        REG_OFFSET_CFG_FIELD_SELECT => WindowRegister::CfgFieldSelect,
        REG_OFFSET_CFG_DATA => WindowRegister::CfgData,
        REG_OFFSET_COMMAND => WindowRegister::Command,
        _ => return Register::Reserved,
    };
    Register::Window { window, register }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowCommand {
    Nop = 0x00,
    ResetIndex = 0x01,
    SetDefaultToAddr = 0x02,
    SetLimitToAddr = 0x03,
}

impl TryFrom<u8> for WindowCommand {
    type Error = MiaError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(WindowCommand::Nop),
            0x01 => Ok(WindowCommand::ResetIndex),
            0x02 => Ok(WindowCommand::SetDefaultToAddr),
            0x03 => Ok(WindowCommand::SetLimitToAddr),
            other => Err(MiaError::UnknownWindowCommand(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedCommand {
    Nop = 0x00,
    ResetAll = 0x01,
    FactoryReset = 0x02,
    ClearIrq = 0x03,
    CopyBlock = 0x04,
    SystemReset = 0x05,
}

impl TryFrom<u8> for SharedCommand {
    type Error = MiaError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(SharedCommand::Nop),
            0x01 => Ok(SharedCommand::ResetAll),
            0x02 => Ok(SharedCommand::FactoryReset),
            0x03 => Ok(SharedCommand::ClearIrq),
            0x04 => Ok(SharedCommand::CopyBlock),
            0x05 => Ok(SharedCommand::SystemReset),
            other => Err(MiaError::UnknownSharedCommand(other)),
        }
    }
}
