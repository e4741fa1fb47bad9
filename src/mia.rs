use crate::{
    bus::Bus,
    config::MiaConfig,
    dma::DmaMode,
    error::MiaError,
    indexed_memory::IndexedMemory,
    irq::{IrqController, IrqLine},
    layout::FACTORY_MEMORY_SIZE,
    utils::hexdump,
};

/// The memory interface adapter as the external CPU sees it: one 8-bit
/// register bus plus an interrupt line.
#[derive(Debug)]
pub struct Mia {
    pub bus: Bus,
}

impl Mia {
    pub fn new(memory: IndexedMemory, irq: IrqController) -> Self {
        Self {
            bus: Bus::new(memory, irq),
        }
    }

    pub fn read(&mut self, address: u8) -> u8 {
        self.bus.read(address)
    }

    pub fn write(&mut self, address: u8, data: u8) {
        self.bus.write(address, data);
    }

    /// Runs one pass of the background loop.
    pub fn poll(&mut self) {
        self.bus.poll();
    }

    pub fn status(&self) -> u8 {
        self.bus.device_status()
    }

    pub fn irq_asserted(&self) -> bool {
        self.bus.irq.is_pending()
    }

    /// `true` once after the CPU issued `SYSTEM_RESET`.
    pub fn take_reboot_request(&mut self) -> bool {
        self.bus.memory.take_reboot_request()
    }

    pub fn load(&mut self, address: u32, data: &[u8]) -> Result<(), MiaError> {
        self.bus.memory.load(address, data)
    }

    pub fn memory(&self) -> &[u8] {
        self.bus.memory.memory().as_slice()
    }

    pub fn memory_dump(&self, start: u32, end: u32) -> Result<String, MiaError> {
        let memory = self.bus.memory.memory();
        let address = memory.address(start)?;
        let count = end.saturating_sub(start) as usize;
        let bytes = memory.slice(address, count)?;
        Ok(hexdump(bytes, address.value()))
    }
}

pub struct MiaBuilder {
    memory_size: usize,
    dma: DmaMode,
    irq_line: Option<Box<dyn IrqLine>>,
}

impl Default for MiaBuilder {
    fn default() -> Self {
        Self {
            memory_size: FACTORY_MEMORY_SIZE,
            dma: DmaMode::default(),
            irq_line: None,
        }
    }
}

impl MiaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &MiaConfig) -> Self {
        let mut builder = Self::new();
        builder.memory_size(config.memory_size).dma(config.dma);
        builder
    }

    pub fn memory_size(&mut self, size: usize) -> &mut Self {
        self.memory_size = size;
        self
    }

    pub fn dma(&mut self, mode: DmaMode) -> &mut Self {
        self.dma = mode;
        self
    }

    pub fn irq_line(&mut self, line: Box<dyn IrqLine>) -> &mut Self {
        self.irq_line = Some(line);
        self
    }

    /// Consumes the configured IRQ line; later builds start unconnected.
    pub fn build(&mut self) -> Result<Mia, MiaError> {
        tracing::info!(
            "Initializing MIA with {:#X} bytes, {:?} DMA",
            self.memory_size,
            self.dma
        );
        let memory = IndexedMemory::new(self.memory_size, self.dma.transport())?;
        let mut irq = IrqController::new();
        if let Some(line) = self.irq_line.take() {
            irq.connect(line);
        }
        Ok(Mia::new(memory, irq))
    }
}
