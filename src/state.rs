use serde::{Deserialize, Serialize};

use crate::{bus::Window, indexed_memory::DmaConfig, mia::Mia, slot::Slot};

/// Point-in-time view of everything the external CPU can observe, plus the
/// whole slot table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    pub status: u8,
    pub irq_cause: u16,
    pub irq_mask: u16,
    pub irq_enabled: bool,
    pub irq_asserted: bool,
    pub dma: DmaConfig,
    pub windows: Vec<Window>,
    pub slots: Vec<Slot>,
}

impl DeviceState {
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub trait ReportState {
    fn report_state(&mut self) -> anyhow::Result<DeviceState>;
}

impl ReportState for Mia {
    fn report_state(&mut self) -> anyhow::Result<DeviceState> {
        let bus = &self.bus;
        Ok(DeviceState {
            status: bus.device_status(),
            irq_cause: bus.irq.cause(),
            irq_mask: bus.irq.mask(),
            irq_enabled: bus.irq.global_enable() != 0,
            irq_asserted: bus.irq.is_pending(),
            dma: bus.memory.dma_config(),
            windows: bus.windows().to_vec(),
            slots: bus.memory.slots().to_vec(),
        })
    }
}
