use bitvec::prelude::*;

/// Reads `n` bits starting at bit `start` of an MSB-first word stream, returning them as an
/// integer with the first bit read in the most significant position.
///
/// Returns `None` if the requested bits run past the end of the stream.
pub fn read_msb(bits: &BitSlice<u16, Msb0>, start: usize, n: usize) -> Option<usize> {
	let span = bits.get(start..start.checked_add(n)?)?;

	Some(span.iter().by_vals().fold(0, |acc, bit| acc << 1 | bit as usize))
}

/// Number of bits needed to address `count` distinct values, never less than 1
pub fn code_width(count: usize) -> usize {
	let mut width = 1;

	while count > (1 << width) {
		width += 1;
	}

	width
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_read_msb() {
		let words: [u16; 2] = [0b1010_0000_0000_0011, 0b1100_0000_0000_0000];
		let bits = words.view_bits::<Msb0>();

		assert_eq!(read_msb(bits, 0, 3), Some(0b101));
		// spans the word boundary
		assert_eq!(read_msb(bits, 14, 4), Some(0b1111));
		assert_eq!(read_msb(bits, 30, 2), Some(0));
		assert_eq!(read_msb(bits, 31, 2), None);
	}

	#[test]
	fn test_code_width() {
		assert_eq!(code_width(0), 1);
		assert_eq!(code_width(1), 1);
		assert_eq!(code_width(2), 1);
		assert_eq!(code_width(3), 2);
		assert_eq!(code_width(4), 2);
		assert_eq!(code_width(5), 3);
		assert_eq!(code_width(256), 8);
		assert_eq!(code_width(257), 9);
	}
}
