#[cfg(feature = "bit_ext")]
pub mod bit_ext;

#[cfg(feature = "io_ext")]
pub mod io_ext;

pub mod texture;

/// Scales a 4 bit value to 8 bits
pub const fn scale4to8(b: u8) -> u8 {
	b | b << 4
}

/// Scales a 5 bit value to 8 bits
pub const fn scale5to8(b: u8) -> u8 {
	b << 3 | b >> 2
}

/// Scales a 6 bit value to 8 bits
pub const fn scale6to8(b: u8) -> u8 {
	b << 2 | b >> 4
}

/// Scales an 8 bit value to 5 bits
pub const fn scale8to5(b: u8) -> u8 {
	(b & 0xF8) >> 3
}

/// Number of whole bytes needed to store `bits` bits
pub const fn bytes_for_bits(bits: u8) -> usize {
	(bits as usize + 7) / 8
}

/// Compares two `len`-byte runs of the same buffer, starting at `a` and `b`.
/// Runs that reach past the end of the buffer never compare equal.
pub fn elements_eq(buf: &[u8], a: usize, b: usize, len: usize) -> bool {
	match (buf.get(a..a + len), buf.get(b..b + len)) {
		(Some(x), Some(y)) => x == y,
		_ => false,
	}
}
