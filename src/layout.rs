// +-----------+----------+---------------------------------------------+
// | Slots     | Base     | Region                                      |
// +-----------+----------+---------------------------------------------+
// | 0         | 0x000800 | System error log                            |
// | 16-23     | 0x004800 | Character tables (256 chars x 24 bytes)     |
// | 32-47     | 0x010800 | Palette banks (8 colors x 2 bytes)          |
// | 48-51     | 0x010900 | Nametables (40x25)                          |
// | 52-55     | 0x0118A0 | Palette tables (40x25)                      |
// | 56        | 0x012840 | Sprite OAM (256 sprites x 4 bytes)          |
// | 57        | 0x012C40 | Active frame select                         |
// | 64-65     | 0x03C000 | USB keyboard buffer / USB status            |
// | 80-84     | 0x001800 | System control                              |
// | 128-255   | 0x013800 | User RAM                                    |
// +-----------+----------+---------------------------------------------+

use crate::slot::{Slot, SlotFlags};

pub const SLOT_COUNT: usize = 256;

pub const SYSTEM_AREA_BASE: u32 = 0x00_0800;
pub const VIDEO_AREA_BASE: u32 = 0x00_4800;
pub const USER_AREA_BASE: u32 = 0x01_3800;
pub const IO_BUFFER_BASE: u32 = 0x03_C000;
/// Smallest backing store that holds every factory region.
pub const FACTORY_MEMORY_SIZE: usize = 0x04_0000;
/// Everything a 24-bit address can reach.
pub const MAX_MEMORY_SIZE: usize = 0x100_0000;

pub const IDX_SYSTEM_ERROR: u8 = 0;
pub const IDX_CHARACTER_START: u8 = 16;
pub const IDX_PALETTE_START: u8 = 32;
pub const IDX_NAMETABLE_START: u8 = 48;
pub const IDX_PALETTE_TABLE_START: u8 = 52;
pub const IDX_SPRITE_OAM: u8 = 56;
pub const IDX_ACTIVE_FRAME: u8 = 57;
pub const IDX_USB_KEYBOARD: u8 = 64;
pub const IDX_USB_STATUS: u8 = 65;
pub const IDX_CLOCK_CONTROL: u8 = 80;
pub const IDX_RESET_CONTROL: u8 = 81;
pub const IDX_IRQ_MASK_LOW: u8 = 83;
pub const IDX_IRQ_MASK_HIGH: u8 = 84;
pub const IDX_USER_START: u8 = 128;

pub const CHARACTER_TABLE_SIZE: u32 = 256 * 24;
pub const PALETTE_BANK_SIZE: u32 = 16;
pub const NAMETABLE_SIZE: u32 = 40 * 25;
pub const SPRITE_OAM_SIZE: u32 = 256 * 4;
pub const USB_KEYBOARD_BUFFER_SIZE: u32 = 64;

pub const PALETTE_BASE: u32 = VIDEO_AREA_BASE + 8 * CHARACTER_TABLE_SIZE;
pub const NAMETABLE_BASE: u32 = PALETTE_BASE + 16 * PALETTE_BANK_SIZE;
pub const PALETTE_TABLE_BASE: u32 = NAMETABLE_BASE + 4 * NAMETABLE_SIZE;
pub const SPRITE_OAM_BASE: u32 = PALETTE_TABLE_BASE + 4 * NAMETABLE_SIZE;
pub const ACTIVE_FRAME_BASE: u32 = SPRITE_OAM_BASE + SPRITE_OAM_SIZE;
pub const SYSCTRL_BASE: u32 = SYSTEM_AREA_BASE + 0x1000;

/// Writes the power-on slot table. Slots without a role are left zeroed.
pub fn install_factory_layout(slots: &mut [Slot; SLOT_COUNT]) {
    slots.fill(Slot::default());

    slots[IDX_SYSTEM_ERROR as usize] = Slot::at(SYSTEM_AREA_BASE, 1, SlotFlags::AUTO_STEP);

    for i in 0..8 {
        slots[(IDX_CHARACTER_START + i) as usize] = Slot::region(
            VIDEO_AREA_BASE + i as u32 * CHARACTER_TABLE_SIZE,
            CHARACTER_TABLE_SIZE,
            1,
        );
    }

    for i in 0..16 {
        slots[(IDX_PALETTE_START + i) as usize] =
            Slot::region(PALETTE_BASE + i as u32 * PALETTE_BANK_SIZE, PALETTE_BANK_SIZE, 1);
    }

    for i in 0..4 {
        slots[(IDX_NAMETABLE_START + i) as usize] =
            Slot::region(NAMETABLE_BASE + i as u32 * NAMETABLE_SIZE, NAMETABLE_SIZE, 1);
        slots[(IDX_PALETTE_TABLE_START + i) as usize] = Slot::region(
            PALETTE_TABLE_BASE + i as u32 * NAMETABLE_SIZE,
            NAMETABLE_SIZE,
            1,
        );
    }

    // step by one sprite record
    slots[IDX_SPRITE_OAM as usize] = Slot::region(SPRITE_OAM_BASE, SPRITE_OAM_SIZE, 4);
    slots[IDX_ACTIVE_FRAME as usize] = Slot::at(ACTIVE_FRAME_BASE, 1, SlotFlags::NONE);

    slots[IDX_USB_KEYBOARD as usize] =
        Slot::region(IO_BUFFER_BASE, USB_KEYBOARD_BUFFER_SIZE, 1);
    slots[IDX_USB_STATUS as usize] = Slot::at(
        IO_BUFFER_BASE + USB_KEYBOARD_BUFFER_SIZE,
        1,
        SlotFlags::NONE,
    );

    slots[IDX_CLOCK_CONTROL as usize] = Slot::at(SYSCTRL_BASE, 1, SlotFlags::NONE);
    slots[IDX_RESET_CONTROL as usize] = Slot::at(SYSCTRL_BASE + 16, 1, SlotFlags::NONE);
    slots[IDX_IRQ_MASK_LOW as usize] = Slot::at(SYSCTRL_BASE + 48, 1, SlotFlags::NONE);
    slots[IDX_IRQ_MASK_HIGH as usize] = Slot::at(SYSCTRL_BASE + 49, 1, SlotFlags::NONE);

    for slot in slots[IDX_USER_START as usize..].iter_mut() {
        *slot = Slot::at(USER_AREA_BASE, 1, SlotFlags::AUTO_STEP);
    }
}
