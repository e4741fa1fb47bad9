use mia::{
    irq::{IRQ_DMA_COMPLETE, IRQ_DMA_ERROR, IRQ_MEMORY_ERROR},
    layout::USER_AREA_BASE,
    registers::{
        window_base, SharedCommand, WindowCommand, REG_DEVICE_STATUS, REG_IRQ_CAUSE_HIGH,
        REG_IRQ_CAUSE_LOW, REG_IRQ_ENABLE, REG_IRQ_MASK_HIGH, REG_IRQ_MASK_LOW,
        REG_OFFSET_CFG_DATA, REG_OFFSET_CFG_FIELD_SELECT, REG_OFFSET_COMMAND,
        REG_OFFSET_DATA_PORT, REG_OFFSET_IDX_SELECT, REG_SHARED_COMMAND, STATUS_DMA_ACTIVE,
        STATUS_IRQ_PENDING, STATUS_MEMORY_ERROR, STATUS_SYSTEM_READY,
    },
    slot::SlotFlags,
    DmaMode, Mia, MiaBuilder,
};

#[cfg(test)]
#[ctor::ctor]
fn init() {
    mia::logging::init_host_logging("warn").expect("Unable to set global tracing subscriber");
}

const ADDRESS: u8 = 0x00;
const DEFAULT: u8 = 0x03;
const LIMIT: u8 = 0x06;
const STEP: u8 = 0x09;
const FLAGS: u8 = 0x0A;

fn mia() -> Mia {
    MiaBuilder::new().build().unwrap()
}

fn select(mia: &mut Mia, window: u8, slot: u8) {
    mia.write(window_base(window) + REG_OFFSET_IDX_SELECT, slot);
}

fn set_field(mia: &mut Mia, window: u8, field: u8, value: u8) {
    mia.write(window_base(window) + REG_OFFSET_CFG_FIELD_SELECT, field);
    mia.write(window_base(window) + REG_OFFSET_CFG_DATA, value);
}

fn get_field(mia: &mut Mia, window: u8, field: u8) -> u8 {
    mia.write(window_base(window) + REG_OFFSET_CFG_FIELD_SELECT, field);
    mia.read(window_base(window) + REG_OFFSET_CFG_DATA)
}

/// `first` is the low-byte field of the address triple.
fn set_address(mia: &mut Mia, window: u8, first: u8, address: u32) {
    for i in 0..3 {
        set_field(mia, window, first + i, (address >> (8 * i)) as u8);
    }
}

fn get_address(mia: &mut Mia, window: u8, first: u8) -> u32 {
    (0..3).fold(0, |acc, i| {
        acc | (get_field(mia, window, first + i) as u32) << (8 * i)
    })
}

fn write_data(mia: &mut Mia, window: u8, data: &[u8]) {
    for &byte in data {
        mia.write(window_base(window) + REG_OFFSET_DATA_PORT, byte);
    }
}

fn read_data(mia: &mut Mia, window: u8, count: usize) -> Vec<u8> {
    (0..count)
        .map(|_| mia.read(window_base(window) + REG_OFFSET_DATA_PORT))
        .collect()
}

fn window_command(mia: &mut Mia, window: u8, command: WindowCommand) {
    mia.write(window_base(window) + REG_OFFSET_COMMAND, command as u8);
}

#[test]
fn test_round_trip_without_auto_step() {
    let mut mia = mia();
    select(&mut mia, 0, 130);
    set_field(&mut mia, 0, FLAGS, SlotFlags::NONE.bits());

    for value in [0x00, 0x5A, 0xA5, 0xFF] {
        write_data(&mut mia, 0, &[value]);
        assert_eq!(read_data(&mut mia, 0, 1), vec![value]);
    }
    assert_eq!(get_address(&mut mia, 0, ADDRESS), USER_AREA_BASE);
}

#[test]
fn test_auto_step_forward() {
    let mut mia = mia();
    select(&mut mia, 1, 140);
    set_field(&mut mia, 1, STEP, 3);

    let pattern = [1, 2, 3, 4, 5, 6, 7];
    write_data(&mut mia, 1, &pattern);
    assert_eq!(get_address(&mut mia, 1, ADDRESS), USER_AREA_BASE + 7 * 3);

    window_command(&mut mia, 1, WindowCommand::ResetIndex);
    assert_eq!(read_data(&mut mia, 1, pattern.len()), pattern);

    // the gaps between strided bytes were never touched
    assert_eq!(mia.memory()[USER_AREA_BASE as usize + 1], 0);
}

#[test]
fn test_wrap_on_limit_overwrites_first_byte() {
    let mut mia = mia();
    select(&mut mia, 0, 200);
    set_address(&mut mia, 0, ADDRESS, 0);
    set_address(&mut mia, 0, DEFAULT, 0);
    set_address(&mut mia, 0, LIMIT, 5);
    set_field(
        &mut mia,
        0,
        FLAGS,
        (SlotFlags::AUTO_STEP | SlotFlags::WRAP_ON_LIMIT).bits(),
    );

    write_data(&mut mia, 0, &[10, 11, 12, 13, 14, 15]);

    assert_eq!(&mia.memory()[0..6], &[15, 11, 12, 13, 14, 0]);
    assert_eq!(get_address(&mut mia, 0, ADDRESS), 1);
}

#[test]
fn test_backward_wrap() {
    let mut mia = mia();
    select(&mut mia, 2, 150);
    set_address(&mut mia, 2, ADDRESS, 0x2003);
    set_address(&mut mia, 2, DEFAULT, 0x2003);
    set_address(&mut mia, 2, LIMIT, 0x2000);
    set_field(
        &mut mia,
        2,
        FLAGS,
        (SlotFlags::AUTO_STEP | SlotFlags::DIRECTION | SlotFlags::WRAP_ON_LIMIT).bits(),
    );

    write_data(&mut mia, 2, &[1, 2, 3, 4]);
    assert_eq!(&mia.memory()[0x2000..0x2004], &[4, 3, 2, 1]);
    assert_eq!(get_address(&mut mia, 2, ADDRESS), 0x2003);
}

#[test]
fn test_window_commands_capture_address() {
    let mut mia = mia();
    select(&mut mia, 3, 160);
    write_data(&mut mia, 3, &[0; 4]);
    window_command(&mut mia, 3, WindowCommand::SetDefaultToAddr);
    write_data(&mut mia, 3, &[0; 4]);
    window_command(&mut mia, 3, WindowCommand::SetLimitToAddr);

    assert_eq!(get_address(&mut mia, 3, DEFAULT), USER_AREA_BASE + 4);
    assert_eq!(get_address(&mut mia, 3, LIMIT), USER_AREA_BASE + 8);

    window_command(&mut mia, 3, WindowCommand::ResetIndex);
    assert_eq!(get_address(&mut mia, 3, ADDRESS), USER_AREA_BASE + 4);

    // unknown command is a no-op
    mia.write(window_base(3) + REG_OFFSET_COMMAND, 0x7E);
    assert_eq!(get_address(&mut mia, 3, ADDRESS), USER_AREA_BASE + 4);
}

#[test]
fn test_bounds_violation_is_contained() {
    let mut mia = mia();
    select(&mut mia, 1, 131);
    write_data(&mut mia, 1, &[0x77]);

    select(&mut mia, 0, 130);
    set_address(&mut mia, 0, ADDRESS, 0x40000);
    assert_eq!(read_data(&mut mia, 0, 1), vec![0x00]);
    write_data(&mut mia, 0, &[0xEE]);
    assert_eq!(get_address(&mut mia, 0, ADDRESS), 0x40000);

    assert_eq!(
        mia.read(REG_DEVICE_STATUS),
        STATUS_SYSTEM_READY | STATUS_MEMORY_ERROR | STATUS_IRQ_PENDING
    );
    assert_eq!(mia.read(REG_IRQ_CAUSE_LOW), IRQ_MEMORY_ERROR as u8);
    assert!(mia.irq_asserted());

    // slot 131 still sees its byte
    window_command(&mut mia, 1, WindowCommand::ResetIndex);
    assert_eq!(read_data(&mut mia, 1, 1), vec![0x77]);

    // acknowledging clears the line, the error bit stays latched
    mia.write(REG_IRQ_CAUSE_LOW, 0xFF);
    assert!(!mia.irq_asserted());
    assert_eq!(
        mia.read(REG_DEVICE_STATUS),
        STATUS_SYSTEM_READY | STATUS_MEMORY_ERROR
    );
}

#[test]
fn test_irq_line_invariant_over_registers() {
    let mut mia = mia();
    // MEMORY_ERROR (bit 0) then DMA_COMPLETE (bit 2) via an empty copy target
    select(&mut mia, 0, 130);
    set_address(&mut mia, 0, ADDRESS, 0xFF_0000);
    read_data(&mut mia, 0, 1);
    select(&mut mia, 0, 131);
    set_field(&mut mia, 0, 0x0B, 131);
    set_field(&mut mia, 0, 0x0C, 132);
    set_field(&mut mia, 0, 0x0D, 1);
    mia.write(REG_SHARED_COMMAND, SharedCommand::CopyBlock as u8);
    assert_eq!(mia.read(REG_IRQ_CAUSE_LOW), 0x05);

    for mask_low in 0..8u8 {
        for enable in [0u8, 1] {
            mia.write(REG_IRQ_MASK_LOW, mask_low);
            mia.write(REG_IRQ_ENABLE, enable);
            let expected = enable != 0 && (0x05 & mask_low) != 0;
            assert_eq!(mia.irq_asserted(), expected, "mask {mask_low:02X} enable {enable}");
            assert_eq!(mia.read(REG_DEVICE_STATUS) & STATUS_IRQ_PENDING != 0, expected);
        }
    }

    assert_eq!(mia.read(REG_IRQ_MASK_LOW), 7);
    assert_eq!(mia.read(REG_IRQ_ENABLE), 1);
}

#[test]
fn test_write_one_to_clear() {
    let mut mia = mia();
    select(&mut mia, 0, 130);
    set_address(&mut mia, 0, ADDRESS, 0xFF_0000);
    read_data(&mut mia, 0, 1);
    set_address(&mut mia, 0, ADDRESS, USER_AREA_BASE);
    set_field(&mut mia, 0, 0x0B, 130);
    set_field(&mut mia, 0, 0x0C, 131);
    set_field(&mut mia, 0, 0x0D, 4);
    mia.write(REG_SHARED_COMMAND, SharedCommand::CopyBlock as u8);
    assert_eq!(mia.read(REG_IRQ_CAUSE_LOW), (IRQ_MEMORY_ERROR | IRQ_DMA_COMPLETE) as u8);

    mia.write(REG_IRQ_CAUSE_LOW, 0x04);
    assert_eq!(mia.read(REG_IRQ_CAUSE_LOW), IRQ_MEMORY_ERROR as u8);

    // zero bits clear nothing, high byte untouched
    mia.write(REG_IRQ_CAUSE_LOW, 0x00);
    mia.write(REG_IRQ_CAUSE_HIGH, 0xFF);
    assert_eq!(mia.read(REG_IRQ_CAUSE_LOW), IRQ_MEMORY_ERROR as u8);

    mia.write(REG_SHARED_COMMAND, SharedCommand::ClearIrq as u8);
    assert_eq!(mia.read(REG_IRQ_CAUSE_LOW), 0);
    assert!(!mia.irq_asserted());
}

#[test]
fn test_mask_high_byte() {
    let mut mia = mia();
    mia.write(REG_IRQ_MASK_HIGH, 0x01);
    assert_eq!(mia.read(REG_IRQ_MASK_HIGH), 0x01);
    assert_eq!(mia.read(REG_IRQ_MASK_LOW), 0xFF);
    assert_eq!(mia.bus.irq.mask(), 0x01FF);
}

#[test]
fn test_dma_copy() {
    let mut mia = mia();
    let pattern: Vec<u8> = (0..10).map(|i| 0xC0 + i).collect();

    select(&mut mia, 0, 130);
    write_data(&mut mia, 0, &pattern);
    window_command(&mut mia, 0, WindowCommand::ResetIndex);

    select(&mut mia, 1, 131);
    set_address(&mut mia, 1, ADDRESS, USER_AREA_BASE + 0x1000);

    set_field(&mut mia, 0, 0x0B, 130);
    set_field(&mut mia, 0, 0x0C, 131);
    set_field(&mut mia, 0, 0x0D, 10);
    set_field(&mut mia, 0, 0x0E, 0);
    mia.write(REG_SHARED_COMMAND, SharedCommand::CopyBlock as u8);

    assert_eq!(get_address(&mut mia, 0, ADDRESS), USER_AREA_BASE);
    assert_eq!(get_address(&mut mia, 1, ADDRESS), USER_AREA_BASE + 0x1000);
    assert_eq!(mia.read(REG_DEVICE_STATUS) & STATUS_DMA_ACTIVE, 0);
    assert_eq!(mia.read(REG_IRQ_CAUSE_LOW), IRQ_DMA_COMPLETE as u8);

    assert_eq!(read_data(&mut mia, 1, 10), pattern);
}

#[test]
fn test_dma_out_of_bounds() {
    let mut mia = mia();
    select(&mut mia, 0, 130);
    set_address(&mut mia, 0, ADDRESS, 0x3FFF8);
    set_field(&mut mia, 0, 0x0B, 131);
    set_field(&mut mia, 0, 0x0C, 130);
    set_field(&mut mia, 0, 0x0D, 16);
    mia.write(REG_SHARED_COMMAND, SharedCommand::CopyBlock as u8);

    assert_eq!(mia.read(REG_IRQ_CAUSE_LOW), IRQ_DMA_ERROR as u8);
    assert_ne!(mia.read(REG_DEVICE_STATUS) & STATUS_MEMORY_ERROR, 0);
    assert_eq!(mia.read(REG_DEVICE_STATUS) & STATUS_DMA_ACTIVE, 0);
}

#[test]
fn test_dma_count_zero_is_noop() {
    let mut mia = mia();
    mia.write(REG_SHARED_COMMAND, SharedCommand::CopyBlock as u8);
    assert_eq!(mia.read(REG_IRQ_CAUSE_LOW), 0);
    assert_eq!(mia.read(REG_DEVICE_STATUS), STATUS_SYSTEM_READY);
}

#[test]
fn test_dma_rejected_while_active() {
    let mut mia = MiaBuilder::new().dma(DmaMode::Deferred).build().unwrap();
    select(&mut mia, 0, 130);
    write_data(&mut mia, 0, &[1, 2, 3, 4]);
    window_command(&mut mia, 0, WindowCommand::ResetIndex);
    select(&mut mia, 1, 131);
    set_address(&mut mia, 1, ADDRESS, USER_AREA_BASE + 0x100);
    select(&mut mia, 2, 132);
    set_address(&mut mia, 2, ADDRESS, USER_AREA_BASE + 0x200);

    set_field(&mut mia, 0, 0x0B, 130);
    set_field(&mut mia, 0, 0x0C, 131);
    set_field(&mut mia, 0, 0x0D, 4);
    mia.write(REG_SHARED_COMMAND, SharedCommand::CopyBlock as u8);
    assert_ne!(mia.read(REG_DEVICE_STATUS) & STATUS_DMA_ACTIVE, 0);

    set_field(&mut mia, 0, 0x0C, 132);
    mia.write(REG_SHARED_COMMAND, SharedCommand::CopyBlock as u8);
    assert_eq!(mia.read(REG_IRQ_CAUSE_LOW), IRQ_DMA_ERROR as u8);

    mia.poll();
    assert_eq!(mia.read(REG_DEVICE_STATUS) & STATUS_DMA_ACTIVE, 0);
    assert_eq!(
        mia.read(REG_IRQ_CAUSE_LOW),
        (IRQ_DMA_ERROR | IRQ_DMA_COMPLETE) as u8
    );

    let base = USER_AREA_BASE as usize;
    assert_eq!(&mia.memory()[base + 0x100..base + 0x104], &[1, 2, 3, 4]);
    assert_eq!(&mia.memory()[base + 0x200..base + 0x204], &[0, 0, 0, 0]);

    // a second poll delivers nothing new
    mia.write(REG_IRQ_CAUSE_LOW, 0xFF);
    mia.poll();
    assert_eq!(mia.read(REG_IRQ_CAUSE_LOW), 0);
}

#[test]
fn test_window_independence() {
    let mut mia = mia();
    for (window, slot) in [(0u8, 128u8), (1, 129), (2, 130), (3, 131)] {
        select(&mut mia, window, slot);
        set_address(&mut mia, window, ADDRESS, USER_AREA_BASE + window as u32 * 0x10);
        write_data(&mut mia, window, &[0xA0 + window, 0xB0 + window]);
        window_command(&mut mia, window, WindowCommand::ResetIndex);
        set_address(&mut mia, window, ADDRESS, USER_AREA_BASE + window as u32 * 0x10);
    }

    for round in 0..2u8 {
        for window in 0..4u8 {
            let expected = [0xA0, 0xB0][round as usize] + window;
            assert_eq!(read_data(&mut mia, window, 1), vec![expected]);
        }
    }
}

#[test]
fn test_reserved_addresses_are_inert() {
    let mut mia = mia();
    let before = mia.memory().to_vec();
    for address in (0x40..=0xEFu8).chain([0x05, 0x1F, 0xF6, 0xFE]) {
        mia.write(address, 0xFF);
        assert_eq!(mia.read(address), 0, "address {address:02X}");
    }
    assert_eq!(mia.memory(), &before[..]);
    assert_eq!(mia.read(REG_DEVICE_STATUS), STATUS_SYSTEM_READY);
    assert!(!mia.irq_asserted());
}
