//! Run-length packets for TGA image data.
//!
//! Each packet starts with a header byte. With the top bit set the packet is a run: one pixel
//! follows, repeated `(header & 0x7F) + 1` times. Otherwise it is a raw packet of `header + 1`
//! literal pixels.
//!
//! The encoder never lets a packet cross a scanline and always gives the last pixel of a row a
//! packet of its own. The decoder only cares about the total byte count, so streams from other
//! encoders whose packets straddle rows still decode.

#[cfg(feature = "import")]
use byteorder::ReadBytesExt;

#[cfg(feature = "import")]
use std::io;

#[cfg(feature = "export")]
use ucmv_core::elements_eq;

#[cfg(feature = "import")]
use crate::TargaImportError;

#[cfg(feature = "export")]
use crate::TargaExportError;

/// Most pixels a single packet can describe
pub const MAX_PACKET_PIXELS: usize = 128;

const RUN_FLAG: u8 = 0x80;

/// Decode buffers start at most this large and grow with the packets read
#[cfg(feature = "import")]
const INITIAL_CAPACITY: usize = 1 << 20;

#[cfg(feature = "export")]
pub fn encode(data: &[u8], width: usize, height: usize, bpp: usize) -> Result<Vec<u8>, TargaExportError> {
	let line = width * bpp;

	if data.len() != line * height {
		return Err(TargaExportError::ImageDataLength {
			expected: line * height,
			actual: data.len(),
		});
	}

	let mut out = Vec::with_capacity(data.len());

	if line == 0 || height == 0 {
		return Ok(out);
	}

	for row in data.chunks_exact(line) {
		let same = |a: usize, b: usize| elements_eq(row, a * bpp, b * bpp, bpp);
		let last = width - 1;
		let mut pos = 0;

		while pos < last {
			let room = (last - pos).min(MAX_PACKET_PIXELS);

			if pos + 1 < last && same(pos, pos + 1) {
				let mut count = 2;
				while count < room && same(pos, pos + count) {
					count += 1;
				}

				out.push(RUN_FLAG | (count - 1) as u8);
				out.extend_from_slice(&row[pos * bpp..(pos + 1) * bpp]);
				pos += count;
			} else {
				// stop short of any pixel that starts a run
				let mut count = 1;
				while count < room && !(pos + count + 1 < last && same(pos + count, pos + count + 1)) {
					count += 1;
				}

				out.push((count - 1) as u8);
				out.extend_from_slice(&row[pos * bpp..(pos + count) * bpp]);
				pos += count;
			}
		}

		out.push(0);
		out.extend_from_slice(&row[last * bpp..]);
	}

	Ok(out)
}

#[cfg(feature = "import")]
pub fn decode<R>(buf: &mut R, width: usize, height: usize, bpp: usize) -> Result<Vec<u8>, TargaImportError>
where
	R: ReadBytesExt,
{
	let expected = width * height * bpp;
	let mut out = Vec::with_capacity(expected.min(INITIAL_CAPACITY));
	let mut pixel = vec![0; bpp];

	while out.len() < expected {
		let header = buf.read_u8().map_err(|e| underflow(e, expected, out.len()))?;
		let count = (header & !RUN_FLAG) as usize + 1;
		let start = out.len();

		if start + count * bpp > expected {
			return Err(TargaImportError::RleOverflow {
				expected: expected,
				actual: start + count * bpp,
			});
		}

		if header & RUN_FLAG != 0 {
			buf.read_exact(&mut pixel).map_err(|e| underflow(e, expected, start))?;
			for _ in 0..count {
				out.extend_from_slice(&pixel);
			}
		} else {
			out.resize(start + count * bpp, 0);
			buf.read_exact(&mut out[start..]).map_err(|e| underflow(e, expected, start))?;
		}
	}

	Ok(out)
}

#[cfg(feature = "import")]
fn underflow(e: io::Error, expected: usize, actual: usize) -> TargaImportError {
	if e.kind() == io::ErrorKind::UnexpectedEof {
		TargaImportError::RleUnderflow {
			expected: expected,
			actual: actual,
		}
	} else {
		TargaImportError::from(e)
	}
}
