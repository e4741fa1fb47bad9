use serde::{Deserialize, Serialize};

use crate::{
    indexed_memory::IndexedMemory,
    irq::IrqController,
    registers::{
        decode, Register, SharedCommand, SharedRegister, WindowRegister, STATUS_IRQ_PENDING,
        WIRED_WINDOWS,
    },
};

/// Per-window selection state seen by the external CPU.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub active_slot: u8,
    pub selected_config_field: u8,
}

#[derive(Debug)]
pub struct Bus {
    pub memory: IndexedMemory,
    pub irq: IrqController,

    windows: [Window; WIRED_WINDOWS],
}

impl Bus {
    pub fn new(memory: IndexedMemory, irq: IrqController) -> Self {
        Self {
            memory,
            irq,
            windows: [Window::default(); WIRED_WINDOWS],
        }
    }

    pub fn reset_windows(&mut self) {
        self.windows = [Window::default(); WIRED_WINDOWS];
    }

    pub fn window(&self, window: usize) -> &Window {
        &self.windows[window]
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    /// Engine status with the live interrupt state folded in.
    pub fn device_status(&self) -> u8 {
        if self.irq.is_pending() {
            self.memory.status() | STATUS_IRQ_PENDING
        } else {
            self.memory.status() & !STATUS_IRQ_PENDING
        }
    }

    pub fn read(&mut self, address: u8) -> u8 {
        let value = match decode(address) {
            Register::Window { window, register } => {
                let Window {
                    active_slot,
                    selected_config_field,
                } = self.windows[window as usize];
                match register {
                    WindowRegister::IdxSelect => active_slot,
                    WindowRegister::DataPort => self.memory.read(&mut self.irq, active_slot),
                    WindowRegister::CfgFieldSelect => selected_config_field,
                    WindowRegister::CfgData => {
                        self.memory.get_config_field(active_slot, selected_config_field)
                    }
                    WindowRegister::Command => 0x00,
                }
            }
            Register::Shared(register) => match register {
                SharedRegister::DeviceStatus => self.device_status(),
                SharedRegister::IrqCauseLow => self.irq.cause_low(),
                SharedRegister::IrqCauseHigh => self.irq.cause_high(),
                SharedRegister::IrqMaskLow => self.irq.mask_low(),
                SharedRegister::IrqMaskHigh => self.irq.mask_high(),
                SharedRegister::IrqEnable => self.irq.global_enable(),
                SharedRegister::Command => 0x00,
            },
            Register::Reserved => {
                tracing::trace!("[BUS] Reserved register {:02X} read", address);
                0x00
            }
        };

        tracing::trace!("[BUS] [RD] {:02X} = {:02X}", address, value);
        value
    }

    pub fn write(&mut self, address: u8, data: u8) {
        tracing::trace!("[BUS] [WR] {:02X} = {:02X}", address, data);

        match decode(address) {
            Register::Window { window, register } => {
                let state = &mut self.windows[window as usize];
                match register {
                    WindowRegister::IdxSelect => state.active_slot = data,
                    WindowRegister::DataPort => {
                        self.memory.write(&mut self.irq, state.active_slot, data)
                    }
                    WindowRegister::CfgFieldSelect => state.selected_config_field = data,
                    WindowRegister::CfgData => self.memory.set_config_field(
                        state.active_slot,
                        state.selected_config_field,
                        data,
                    ),
                    WindowRegister::Command => {
                        self.memory.execute_window_command(state.active_slot, data)
                    }
                }
            }
            Register::Shared(register) => match register {
                SharedRegister::DeviceStatus => {
                    tracing::trace!("[BUS] Ignored write to read-only status: {:02X}", data);
                }
                SharedRegister::IrqCauseLow => self.irq.acknowledge_low(data),
                SharedRegister::IrqCauseHigh => self.irq.acknowledge_high(data),
                SharedRegister::IrqMaskLow => self.irq.set_mask_low(data),
                SharedRegister::IrqMaskHigh => self.irq.set_mask_high(data),
                SharedRegister::IrqEnable => self.irq.set_global_enable(data),
                SharedRegister::Command => {
                    self.memory.execute_shared_command(&mut self.irq, data);
                    if data == SharedCommand::SystemReset as u8 {
                        self.reset_windows();
                    }
                }
            },
            Register::Reserved => {
                tracing::trace!("[BUS] Reserved register {:02X} write ignored", address);
            }
        }
    }

    pub fn poll(&mut self) {
        self.memory.poll(&mut self.irq);
    }
}
