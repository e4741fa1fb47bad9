/// Classic 16-bytes-per-row dump. `base` is the absolute address of
/// `buffer[0]` and labels each row.
pub fn hexdump(buffer: &[u8], base: u32) -> String {
    let mut str = String::new();
    for (row, chunk) in buffer.chunks(16).enumerate() {
        let mut line = format!("{:06x}: ", base as usize + row * 16);
        let mut chars = String::new();
        for &byte in chunk {
            line.push_str(&format!("{:02x} ", byte));
            let c = byte as char;
            chars.push(if c.is_ascii_graphic() || c == ' ' {
                c
            } else {
                '.'
            });
        }

        let dump_line = format!("{:<56} {}\n", line, chars);
        str.push_str(&dump_line);
    }

    str
}
