use thiserror::Error;

#[derive(Debug, Error)]
pub enum MiaError {
    #[error("address {address:#08X} is outside the {size:#X}-byte backing store")]
    AddressOutOfRange { address: u32, size: usize },

    #[error("range {address:#08X}+{count:#X} exceeds the {size:#X}-byte backing store")]
    RangeOutOfBounds {
        address: u32,
        count: usize,
        size: usize,
    },

    #[error("invalid memory size {size:#X}: must hold the factory layout and fit 24-bit addressing")]
    InvalidMemorySize { size: usize },

    #[error("unknown configuration field {0:#04X}")]
    UnknownConfigField(u8),

    #[error("unknown window command {0:#04X}")]
    UnknownWindowCommand(u8),

    #[error("unknown shared command {0:#04X}")]
    UnknownSharedCommand(u8),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
