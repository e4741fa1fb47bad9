//! Byte-block mover used by the copy command.
//!
//! A transport starts a transfer and returns immediately. When the bytes have
//! landed it pushes exactly one [`DmaEvent::Complete`] onto the completion
//! queue registered by the engine, after which `is_busy()` reports `false`.
//! Whether that happens inline or on a later [`DmaTransport::service`] call is
//! up to the transport.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use serde::{Deserialize, Serialize};

/// Offsets into the backing store. Ranges are validated by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub src: usize,
    pub dst: usize,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaEvent {
    Complete(Transfer),
}

pub type CompletionQueue = Rc<RefCell<VecDeque<DmaEvent>>>;

pub trait DmaTransport {
    fn set_completion_callback(&mut self, queue: CompletionQueue);

    fn start_transfer(&mut self, memory: &mut [u8], transfer: Transfer);

    fn is_busy(&self) -> bool;

    /// Called from the background loop.
    fn service(&mut self, _memory: &mut [u8]) {}

    /// Drops any in-flight transfer without signalling completion.
    fn reset(&mut self) {}
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DmaMode {
    /// Copies inline and completes before `start_transfer` returns.
    #[default]
    Immediate,
    /// Completes on the next background poll.
    Deferred,
}

impl DmaMode {
    pub fn transport(self) -> Box<dyn DmaTransport> {
        match self {
            DmaMode::Immediate => Box::new(ImmediateDma::new()),
            DmaMode::Deferred => Box::new(DeferredDma::new()),
        }
    }
}

fn copy(memory: &mut [u8], transfer: Transfer) {
    memory.copy_within(transfer.src..transfer.src + transfer.count, transfer.dst);
}

fn signal(queue: &Option<CompletionQueue>, transfer: Transfer) {
    if let Some(queue) = queue {
        queue.borrow_mut().push_back(DmaEvent::Complete(transfer));
    }
}

#[derive(Debug, Default)]
pub struct ImmediateDma {
    busy: bool,
    completed: usize,
    queue: Option<CompletionQueue>,
}

impl ImmediateDma {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed(&self) -> usize {
        self.completed
    }
}

impl DmaTransport for ImmediateDma {
    fn set_completion_callback(&mut self, queue: CompletionQueue) {
        self.queue = Some(queue);
    }

    fn start_transfer(&mut self, memory: &mut [u8], transfer: Transfer) {
        self.busy = true;
        tracing::debug!(
            "[DMA] copy {:06X} -> {:06X} ({} bytes)",
            transfer.src,
            transfer.dst,
            transfer.count
        );
        copy(memory, transfer);
        self.busy = false;
        self.completed += 1;
        signal(&self.queue, transfer);
    }

    fn is_busy(&self) -> bool {
        self.busy
    }
}

#[derive(Debug, Default)]
pub struct DeferredDma {
    pending: Option<Transfer>,
    queue: Option<CompletionQueue>,
}

impl DeferredDma {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DmaTransport for DeferredDma {
    fn set_completion_callback(&mut self, queue: CompletionQueue) {
        self.queue = Some(queue);
    }

    fn start_transfer(&mut self, _memory: &mut [u8], transfer: Transfer) {
        if let Some(previous) = self.pending.replace(transfer) {
            tracing::warn!("[DMA] transfer {:?} overwritten before completion", previous);
        }
    }

    fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    fn service(&mut self, memory: &mut [u8]) {
        if let Some(transfer) = self.pending.take() {
            tracing::debug!(
                "[DMA] deferred copy {:06X} -> {:06X} ({} bytes)",
                transfer.src,
                transfer.dst,
                transfer.count
            );
            copy(memory, transfer);
            signal(&self.queue, transfer);
        }
    }

    fn reset(&mut self) {
        self.pending = None;
    }
}
