pub mod bus;
pub mod config;
pub mod dma;
pub mod error;
pub mod indexed_memory;
pub mod irq;
pub mod layout;
pub mod logging;
pub mod memory;
pub mod mia;
pub mod registers;
pub mod slot;
pub mod state;
pub mod utils;
pub mod wasm;

pub use bus::{Bus, Window};
pub use config::MiaConfig;
pub use dma::{DeferredDma, DmaMode, DmaTransport, ImmediateDma};
pub use error::MiaError;
pub use indexed_memory::{DmaConfig, IndexedMemory};
pub use irq::{IrqController, IrqLine, IrqPin};
pub use mia::{Mia, MiaBuilder};
pub use state::{DeviceState, ReportState};
pub use utils::hexdump;
