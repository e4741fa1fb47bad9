//! The 256-slot indexed memory engine.
//!
//! Every slot is a cursor into a flat backing store that may be far larger
//! than an 8-bit CPU can address. Reads and writes go through a slot, then
//! move its cursor by `step` in the configured direction, snapping back to
//! the default address when the limit is crossed and wrap is enabled.
//!
//! Bounds violations never stop the engine. They latch a status bit and raise
//! an interrupt; the read returns [`INVALID_READ_VALUE`] or the write is dropped.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use derivative::Derivative;
use serde::{Deserialize, Serialize};

use crate::{
    dma::{CompletionQueue, DmaEvent, DmaTransport, Transfer},
    error::MiaError,
    irq::{IrqController, IRQ_DMA_COMPLETE, IRQ_DMA_ERROR, IRQ_INDEX_OVERFLOW, IRQ_MEMORY_ERROR},
    layout::{self, FACTORY_MEMORY_SIZE, MAX_MEMORY_SIZE, SLOT_COUNT},
    memory::Memory,
    registers::{
        SharedCommand, WindowCommand, STATUS_DMA_ACTIVE, STATUS_INDEX_OVERFLOW,
        STATUS_MEMORY_ERROR, STATUS_SYSTEM_READY,
    },
    slot::{Address24, ConfigField, Slot, Step},
};

/// Returned by a read whose address lies outside the backing store.
pub const INVALID_READ_VALUE: u8 = 0x00;

/// Global copy parameters, exposed through the config fields of any slot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmaConfig {
    pub src_slot: u8,
    pub dst_slot: u8,
    pub count: u16,
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct IndexedMemory {
    #[derivative(Debug = "ignore")]
    slots: Box<[Slot; SLOT_COUNT]>,
    dma_config: DmaConfig,
    status: u8,
    #[derivative(Debug = "ignore")]
    memory: Memory,
    #[derivative(Debug = "ignore")]
    dma: Box<dyn DmaTransport>,
    #[derivative(Debug = "ignore")]
    dma_events: CompletionQueue,
    reboot_requested: bool,
}

impl IndexedMemory {
    pub fn new(memory_size: usize, mut dma: Box<dyn DmaTransport>) -> Result<Self, MiaError> {
        if !(FACTORY_MEMORY_SIZE..=MAX_MEMORY_SIZE).contains(&memory_size) {
            return Err(MiaError::InvalidMemorySize { size: memory_size });
        }

        let dma_events: CompletionQueue = Rc::new(RefCell::new(VecDeque::new()));
        dma.set_completion_callback(dma_events.clone());

        let mut engine = IndexedMemory {
            slots: Box::new([Slot::default(); SLOT_COUNT]),
            dma_config: DmaConfig::default(),
            status: 0,
            memory: Memory::new(memory_size),
            dma,
            dma_events,
            reboot_requested: false,
        };
        engine.initialize();
        Ok(engine)
    }

    /// Clears the backing store and installs the factory slot table.
    pub fn initialize(&mut self) {
        self.memory.reset();
        layout::install_factory_layout(&mut self.slots);
        self.dma_config = DmaConfig::default();
        self.dma.reset();
        self.dma_events.borrow_mut().clear();
        self.status = STATUS_SYSTEM_READY;
        tracing::info!(
            "Indexed memory initialized: {} slots over {:#X} bytes",
            SLOT_COUNT,
            self.memory.size()
        );
    }

    /// Moves every slot back to its default address.
    pub fn reset_all(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.reset();
        }
    }

    pub fn read(&mut self, irq: &mut IrqController, index: u8) -> u8 {
        let slot = &mut self.slots[index as usize];
        let address = slot.current;
        match self.memory.read_byte(address) {
            Ok(value) => {
                let step = slot.advance();
                tracing::trace!("[MEM] [RD] [{:3}] {} = {:02X}", index, address, value);
                self.after_step(irq, index, step);
                value
            }
            Err(err) => {
                self.memory_error(irq, index, err);
                INVALID_READ_VALUE
            }
        }
    }

    pub fn write(&mut self, irq: &mut IrqController, index: u8, value: u8) {
        let slot = &mut self.slots[index as usize];
        let address = slot.current;
        match self.memory.write_byte(address, value) {
            Ok(()) => {
                let step = slot.advance();
                tracing::trace!("[MEM] [WR] [{:3}] {} = {:02X}", index, address, value);
                self.after_step(irq, index, step);
            }
            Err(err) => self.memory_error(irq, index, err),
        }
    }

    /// Reads at the slot's current address without stepping or signalling.
    pub fn peek(&self, index: u8) -> Result<u8, MiaError> {
        self.memory.read_byte(self.slots[index as usize].current)
    }

    /// Writes at the slot's current address without stepping or signalling.
    pub fn poke(&mut self, index: u8, value: u8) -> Result<(), MiaError> {
        self.memory.write_byte(self.slots[index as usize].current, value)
    }

    /// Unknown fields read as zero.
    pub fn get_config_field(&self, index: u8, field: u8) -> u8 {
        let Ok(field) = ConfigField::try_from(field) else {
            return 0;
        };

        match self.slots[index as usize].field(field) {
            Some(value) => value,
            None => match field {
                ConfigField::CopySource => self.dma_config.src_slot,
                ConfigField::CopyDestination => self.dma_config.dst_slot,
                ConfigField::CopyCountLow => (self.dma_config.count & 0xFF) as u8,
                ConfigField::CopyCountHigh => (self.dma_config.count >> 8) as u8,
                _ => 0,
            },
        }
    }

    /// Unknown fields are ignored.
    pub fn set_config_field(&mut self, index: u8, field: u8, value: u8) {
        let field = match ConfigField::try_from(field) {
            Ok(field) => field,
            Err(err) => {
                tracing::trace!("[MEM] [CFG] slot {} ignored: {}", index, err);
                return;
            }
        };

        if self.slots[index as usize].set_field(field, value) {
            return;
        }

        let dma = &mut self.dma_config;
        match field {
            ConfigField::CopySource => dma.src_slot = value,
            ConfigField::CopyDestination => dma.dst_slot = value,
            ConfigField::CopyCountLow => dma.count = (dma.count & 0xFF00) | value as u16,
            ConfigField::CopyCountHigh => dma.count = (dma.count & 0x00FF) | ((value as u16) << 8),
            _ => {}
        }
    }

    pub fn execute_window_command(&mut self, index: u8, command: u8) {
        let slot = &mut self.slots[index as usize];
        match WindowCommand::try_from(command) {
            Ok(WindowCommand::Nop) => {}
            Ok(WindowCommand::ResetIndex) => slot.reset(),
            Ok(WindowCommand::SetDefaultToAddr) => slot.default = slot.current,
            Ok(WindowCommand::SetLimitToAddr) => slot.limit = slot.current,
            Err(err) => tracing::trace!("[MEM] [CMD] slot {} ignored: {}", index, err),
        }
    }

    pub fn execute_shared_command(&mut self, irq: &mut IrqController, command: u8) {
        match SharedCommand::try_from(command) {
            Ok(SharedCommand::Nop) => {}
            Ok(SharedCommand::ResetAll) => self.reset_all(),
            Ok(SharedCommand::FactoryReset) => self.factory_reset(irq),
            Ok(SharedCommand::ClearIrq) => irq.clear_all(),
            Ok(SharedCommand::CopyBlock) => self.copy_block(irq),
            Ok(SharedCommand::SystemReset) => {
                // There is no watchdog to reboot through, so reinitialize in
                // place and let the host observe the request.
                tracing::warn!("System reset requested");
                self.factory_reset(irq);
                self.reboot_requested = true;
            }
            Err(err) => tracing::trace!("[MEM] [CMD] ignored: {}", err),
        }
    }

    pub fn factory_reset(&mut self, irq: &mut IrqController) {
        irq.clear_all();
        self.initialize();
    }

    /// Starts the configured copy. Slots are only used as address sources:
    /// neither cursor moves.
    fn copy_block(&mut self, irq: &mut IrqController) {
        let DmaConfig {
            src_slot,
            dst_slot,
            count,
        } = self.dma_config;
        if count == 0 {
            return;
        }

        let src = self.slots[src_slot as usize].current;
        let dst = self.slots[dst_slot as usize].current;
        let size = self.memory.size();

        if src.value() as usize >= size || dst.value() as usize >= size {
            tracing::warn!("[DMA] rejected: {} -> {} outside backing store", src, dst);
            self.status |= STATUS_MEMORY_ERROR;
            irq.raise(IRQ_MEMORY_ERROR);
            return;
        }

        let (src_range, dst_range) = match (
            self.memory.range(src, count as usize),
            self.memory.range(dst, count as usize),
        ) {
            (Ok(src_range), Ok(dst_range)) => (src_range, dst_range),
            (Err(err), _) | (_, Err(err)) => {
                tracing::warn!("[DMA] rejected: {}", err);
                self.status |= STATUS_MEMORY_ERROR;
                irq.raise(IRQ_DMA_ERROR);
                return;
            }
        };

        if self.is_dma_busy() || self.dma.is_busy() {
            tracing::warn!("[DMA] rejected: transfer already in flight");
            irq.raise(IRQ_DMA_ERROR);
            return;
        }

        self.status |= STATUS_DMA_ACTIVE;
        self.dma.start_transfer(
            self.memory.as_mut_slice(),
            Transfer {
                src: src_range.start,
                dst: dst_range.start,
                count: count as usize,
            },
        );
        self.process_dma_events(irq);
    }

    /// Background-loop hook: lets the transport make progress and delivers
    /// any completions.
    pub fn poll(&mut self, irq: &mut IrqController) {
        self.dma.service(self.memory.as_mut_slice());
        self.process_dma_events(irq);
    }

    fn process_dma_events(&mut self, irq: &mut IrqController) {
        while let Some(event) = self.dma_events.borrow_mut().pop_front() {
            match event {
                DmaEvent::Complete(transfer) => {
                    tracing::debug!("[DMA] complete: {} bytes", transfer.count);
                    self.status &= !STATUS_DMA_ACTIVE;
                    irq.raise(IRQ_DMA_COMPLETE);
                }
            }
        }
    }

    fn after_step(&mut self, irq: &mut IrqController, index: u8, step: Step) {
        if step == Step::Overflowed {
            tracing::warn!("[MEM] slot {} stepped out of the 24-bit address space", index);
            self.status |= STATUS_INDEX_OVERFLOW;
            irq.raise(IRQ_INDEX_OVERFLOW);
        }
    }

    fn memory_error(&mut self, irq: &mut IrqController, index: u8, err: MiaError) {
        tracing::warn!("[MEM] slot {}: {}", index, err);
        self.status |= STATUS_MEMORY_ERROR;
        irq.raise(IRQ_MEMORY_ERROR);
    }

    pub fn status(&self) -> u8 {
        self.status
    }

    pub fn is_dma_busy(&self) -> bool {
        self.status & STATUS_DMA_ACTIVE != 0
    }

    pub fn slot(&self, index: u8) -> &Slot {
        &self.slots[index as usize]
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots[..]
    }

    pub fn dma_config(&self) -> DmaConfig {
        self.dma_config
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Seeds the backing store at an absolute address.
    pub fn load(&mut self, address: u32, data: &[u8]) -> Result<(), MiaError> {
        let address = self.memory.address(address)?;
        self.memory.load(address, data)
    }

    /// Returns and clears the reboot latch set by `SYSTEM_RESET`.
    pub fn take_reboot_request(&mut self) -> bool {
        std::mem::take(&mut self.reboot_requested)
    }
}
