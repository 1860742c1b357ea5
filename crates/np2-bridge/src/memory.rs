//! Typed read/write primitives over module memory.
//!
//! All accessors are little-endian and operate on module-relative byte
//! offsets. They perform no bounds validation beyond what the underlying
//! region provides; an out-of-range access panics, which is fatal for the
//! owning instance.

use crate::module::NativeModule;

/// Scalar width for [`read_scalar`] / [`write_scalar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    W8,
    W16,
    W32,
}

impl Width {
    pub fn bytes(self) -> usize {
        match self {
            Width::W8 => 1,
            Width::W16 => 2,
            Width::W32 => 4,
        }
    }
}

/// Copy `len` bytes out of module memory.
pub fn read_bytes<M: NativeModule + ?Sized>(module: &M, addr: u32, len: u32) -> Vec<u8> {
    let mut out = vec![0u8; len as usize];
    module.read_mem(addr, &mut out);
    out
}

/// Copy `src` into module memory.
pub fn write_bytes<M: NativeModule + ?Sized>(module: &mut M, addr: u32, src: &[u8]) {
    module.write_mem(addr, src);
}

/// Read a fixed-width little-endian scalar, sign- or zero-extended to `i64`.
pub fn read_scalar<M: NativeModule + ?Sized>(
    module: &M,
    addr: u32,
    width: Width,
    signed: bool,
) -> i64 {
    let mut buf = [0u8; 4];
    let n = width.bytes();
    module.read_mem(addr, &mut buf[..n]);
    match (width, signed) {
        (Width::W8, false) => buf[0] as i64,
        (Width::W8, true) => buf[0] as i8 as i64,
        (Width::W16, false) => u16::from_le_bytes([buf[0], buf[1]]) as i64,
        (Width::W16, true) => i16::from_le_bytes([buf[0], buf[1]]) as i64,
        (Width::W32, false) => u32::from_le_bytes(buf) as i64,
        (Width::W32, true) => i32::from_le_bytes(buf) as i64,
    }
}

/// Write a fixed-width little-endian scalar.
///
/// The value is truncated to `width` by wrapping, matching a typed store
/// into a narrower heap view.
pub fn write_scalar<M: NativeModule + ?Sized>(module: &mut M, addr: u32, width: Width, value: i64) {
    let bytes = value.to_le_bytes();
    module.write_mem(addr, &bytes[..width.bytes()]);
}

/// Read a NUL-terminated string, bounded by the end of module memory.
///
/// Invalid UTF-8 is replaced rather than rejected; the native side owns the
/// encoding and the host should not crash on a malformed name.
pub fn read_cstr<M: NativeModule + ?Sized>(module: &M, addr: u32) -> String {
    let mut out = Vec::new();
    let mut at = addr;
    let end = module.mem_len();
    let mut chunk = [0u8; 64];
    while at < end {
        let take = chunk.len().min((end - at) as usize);
        module.read_mem(at, &mut chunk[..take]);
        if let Some(nul) = chunk[..take].iter().position(|&b| b == 0) {
            out.extend_from_slice(&chunk[..nul]);
            break;
        }
        out.extend_from_slice(&chunk[..take]);
        at += take as u32;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Write a NUL-terminated UTF-8 string into at most `max_len` bytes
/// (terminator included), never splitting a multi-byte sequence.
///
/// `max_len == 0` writes nothing, not even the terminator.
pub fn write_cstr<M: NativeModule + ?Sized>(module: &mut M, addr: u32, value: &str, max_len: u32) {
    if max_len == 0 {
        return;
    }
    let budget = (max_len - 1) as usize;
    let mut cut = value.len().min(budget);
    while !value.is_char_boundary(cut) {
        cut -= 1;
    }
    let bytes = &value.as_bytes()[..cut];
    module.write_mem(addr, bytes);
    module.write_mem(addr + bytes.len() as u32, &[0]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockModule;

    #[test]
    fn scalar_sign_extension() {
        let mut m = MockModule::new(16);
        write_scalar(&mut m, 0, Width::W8, -1);
        assert_eq!(read_scalar(&m, 0, Width::W8, true), -1);
        assert_eq!(read_scalar(&m, 0, Width::W8, false), 0xFF);

        write_scalar(&mut m, 4, Width::W16, -2);
        assert_eq!(read_scalar(&m, 4, Width::W16, true), -2);
        assert_eq!(read_scalar(&m, 4, Width::W16, false), 0xFFFE);

        write_scalar(&mut m, 8, Width::W32, -3);
        assert_eq!(read_scalar(&m, 8, Width::W32, true), -3);
        assert_eq!(read_scalar(&m, 8, Width::W32, false), 0xFFFF_FFFD);
    }

    #[test]
    fn scalar_truncates_by_wrapping() {
        let mut m = MockModule::new(8);
        write_scalar(&mut m, 0, Width::W8, 0x1FF);
        assert_eq!(read_scalar(&m, 0, Width::W8, false), 0xFF);
    }

    #[test]
    fn cstr_roundtrip_and_nul_bound() {
        let mut m = MockModule::new(32);
        m.mem.fill(0xAA);
        write_cstr(&mut m, 0, "font.bmp", 32);
        assert_eq!(m.mem[8], 0);
        assert_eq!(read_cstr(&m, 0), "font.bmp");
    }

    #[test]
    fn cstr_truncates_inside_budget() {
        let mut m = MockModule::new(16);
        write_cstr(&mut m, 0, "abcdef", 4);
        assert_eq!(&m.mem[..4], b"abc\0");
        assert_eq!(read_cstr(&m, 0), "abc");
    }

    #[test]
    fn cstr_never_splits_a_multibyte_sequence() {
        let mut m = MockModule::new(16);
        // "héllo": 'é' is two bytes; a 3-byte budget leaves room for only
        // "h" + NUL since writing half of 'é' is not allowed.
        write_cstr(&mut m, 0, "héllo", 3);
        assert_eq!(&m.mem[..2], b"h\0");
    }

    #[test]
    fn cstr_zero_budget_writes_nothing() {
        let mut m = MockModule::new(4);
        m.mem.fill(0xAA);
        write_cstr(&mut m, 0, "x", 0);
        assert_eq!(m.mem, vec![0xAA; 4]);
    }

    #[test]
    fn cstr_read_is_bounded_by_memory_end() {
        let mut m = MockModule::new(4);
        m.mem.copy_from_slice(b"abcd");
        // No terminator anywhere; the read must stop at the end of memory.
        assert_eq!(read_cstr(&m, 0), "abcd");
    }
}
