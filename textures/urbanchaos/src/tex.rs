//! Urban Chaos `.tex` textures.
//!
//! A file is a 10 byte header followed by little endian 16-bit words. The first
//! `palette_size` words are the palette: RGBA4444 colors when the header flags alpha,
//! RGB565 otherwise. The remaining words hold one palette index per pixel, packed
//! most significant bit first with no alignment, so an index may continue into the next
//! word. The first pixel is not stored and always takes the first palette entry.

use bitvec::prelude::*;

use byteorder::{
	ByteOrder,
	LE,
	ReadBytesExt
};

use std::io;
use thiserror::Error;

use tracing::debug;

use ucmv_core::{
	bit_ext::{
		code_width,
		read_msb
	},
	texture::{
		Image,
		Rgba
	}
};

pub const HEADER_SIZE: usize = 10;
pub const SIGNATURE: i16 = -1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TexHeader {
	pub signature: i16,
	pub has_alpha: bool,
	pub width: u16,
	pub height: u16,
	pub palette_size: u16,
}

impl TexHeader {
	fn read<R>(buf: &mut R) -> Result<TexHeader, TexImportError>
	where
		R: ReadBytesExt,
	{
		let signature = buf.read_i16::<LE>()?;
		if signature != SIGNATURE {
			return Err(TexImportError::Magic(signature));
		}

		Ok(TexHeader {
			signature: signature,
			has_alpha: buf.read_i16::<LE>()? != 0,
			width: buf.read_u16::<LE>()?,
			height: buf.read_u16::<LE>()?,
			palette_size: buf.read_u16::<LE>()?,
		})
	}

	pub fn pixel_count(&self) -> usize {
		self.width as usize * self.height as usize
	}

	/// Bits per packed palette index
	pub fn code_width(&self) -> usize {
		code_width(self.palette_size as usize)
	}

	/// Number of code words needed after the palette
	pub fn code_words(&self) -> usize {
		let bits = self.pixel_count().saturating_sub(1) * self.code_width();
		(bits + 15) / 16
	}
}

/// A decoded texture: the header plus each pixel's 16-bit palette color
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tex {
	pub header: TexHeader,
	pub palette: Vec<u16>,
	pub colors: Vec<u16>,
}

impl Tex {
	pub fn read<R>(buf: &mut R) -> Result<Tex, TexImportError>
	where
		R: ReadBytesExt,
	{
		let header = TexHeader::read(buf)?;

		debug!(width = header.width, height = header.height, has_alpha = header.has_alpha,
			palette_size = header.palette_size, "tex header");

		let mut bytes = vec![];
		buf.read_to_end(&mut bytes)?;

		// a dangling odd byte is not part of any word
		let mut words = vec![0; bytes.len() / 2];
		LE::read_u16_into(&bytes[..words.len() * 2], &mut words);

		let palette_size = header.palette_size as usize;
		if words.len() < palette_size {
			return Err(TexImportError::Truncated {
				section: "palette",
				expected: palette_size,
				actual: words.len(),
			});
		}

		let (palette, codes) = words.split_at(palette_size);
		if codes.len() < header.code_words() {
			return Err(TexImportError::Truncated {
				section: "code stream",
				expected: header.code_words(),
				actual: codes.len(),
			});
		}

		let bits = codes.view_bits::<Msb0>();
		let width = header.code_width();
		let count = header.pixel_count();

		// slots past the palette read as zero
		let lookup = |i: usize| palette.get(i).copied().unwrap_or(0);

		let mut colors = Vec::with_capacity(count);
		if count > 0 {
			colors.push(lookup(0));
		}

		for i in 1..count {
			let index = read_msb(bits, (i - 1) * width, width).ok_or_else(|| TexImportError::Truncated {
				section: "code stream",
				expected: header.code_words(),
				actual: codes.len(),
			})?;

			colors.push(lookup(index));
		}

		Ok(Tex {
			header: header,
			palette: palette.to_vec(),
			colors: colors,
		})
	}

	/// Expands the palette colors to RGBA. Without alpha every pixel's alpha is 0.
	pub fn to_image(&self) -> Image {
		let expand: fn(u16) -> Rgba = if self.header.has_alpha {
			Rgba::from_rgba4444
		} else {
			Rgba::from_rgb565
		};

		Image {
			width: self.header.width as usize,
			height: self.header.height as usize,
			has_alpha: self.header.has_alpha,
			pixels: self.colors.iter().map(|c| expand(*c)).collect(),
		}
	}
}

#[derive(Error, Debug)]
pub enum TexImportError {
	#[error("I/O error")]
	IO {
		#[from]
		source: io::Error,
	},
	#[error("Not an Urban Chaos texture: signature {0}")]
	Magic(i16),
	#[error("Truncated {section}: expected {expected} words, got {actual}")]
	Truncated {
		section: &'static str,
		expected: usize,
		actual: usize,
	},
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn tex_bytes(has_alpha: bool, width: u16, height: u16, palette: &[u16], codes: &[u16]) -> Vec<u8> {
		let mut out = vec![];
		out.extend_from_slice(&SIGNATURE.to_le_bytes());
		out.extend_from_slice(&(has_alpha as i16).to_le_bytes());
		out.extend_from_slice(&width.to_le_bytes());
		out.extend_from_slice(&height.to_le_bytes());
		out.extend_from_slice(&(palette.len() as u16).to_le_bytes());

		for w in palette.iter().chain(codes.iter()) {
			out.extend_from_slice(&w.to_le_bytes());
		}

		out
	}

	#[test]
	fn test_codes_span_words() {
		// 5 colors -> 3 bit codes; 6 codes = 18 bits, the last one straddles the word boundary
		let palette: [u16; 5] = [10, 11, 12, 13, 14];
		// codes 1 2 3 4 0 4 -> 001 010 011 100 000 100
		let codes: [u16; 2] = [0b0010_1001_1100_0001, 0b0000_0000_0000_0000];
		let bytes = tex_bytes(false, 7, 1, &palette, &codes);

		let tex = Tex::read(&mut bytes.as_slice()).unwrap();
		assert_eq!(vec![10, 11, 12, 13, 14, 10, 14], tex.colors);
		assert_eq!(2, tex.header.code_words());
	}

	#[test]
	fn test_seed_pixel() {
		let bytes = tex_bytes(false, 1, 1, &[0xF800], &[]);
		let tex = Tex::read(&mut bytes.as_slice()).unwrap();

		assert_eq!(vec![0xF800], tex.colors);
		assert_eq!(vec![Rgba::new(0, 0, 255, 0)], tex.to_image().pixels);
	}

	#[test]
	fn test_tiny_palettes() {
		// no palette at all: one bit codes, every lookup reads zero
		let bytes = tex_bytes(false, 4, 1, &[], &[0b1010_0000_0000_0000]);
		let tex = Tex::read(&mut bytes.as_slice()).unwrap();
		assert_eq!(vec![0, 0, 0, 0], tex.colors);

		let bytes = tex_bytes(true, 3, 1, &[0xF00F], &[0]);
		let tex = Tex::read(&mut bytes.as_slice()).unwrap();
		assert_eq!(1, tex.header.code_width());
		assert_eq!(vec![0xF00F; 3], tex.colors);
	}

	#[test]
	fn test_pixel_count() {
		let palette: Vec<u16> = (0..256).collect();
		let codes: Vec<u16> = vec![0x1234; 32];
		let bytes = tex_bytes(true, 8, 8, &palette, &codes);

		let img = Tex::read(&mut bytes.as_slice()).unwrap().to_image();
		assert_eq!(64, img.pixels.len());
		assert!(img.has_alpha);
	}

	#[test]
	fn test_truncated_codes() {
		let palette: Vec<u16> = (0..16).collect();
		// 4 bit codes, 15 codes need 4 words
		let bytes = tex_bytes(false, 4, 4, &palette, &[0; 3]);

		assert!(matches!(Tex::read(&mut bytes.as_slice()),
			Err(TexImportError::Truncated { section: "code stream", expected: 4, actual: 3 })));
	}

	#[test]
	fn test_huge_header_short_stream() {
		let bytes = tex_bytes(false, 0xFFFF, 0xFFFF, &[1, 2], &[0]);
		let pixels: usize = 0xFFFF * 0xFFFF;

		assert!(matches!(Tex::read(&mut bytes.as_slice()),
			Err(TexImportError::Truncated { section: "code stream", expected, actual: 1 }) if expected == (pixels - 1 + 15) / 16));
	}

	#[test]
	fn test_truncated_palette() {
		let mut bytes = tex_bytes(false, 2, 2, &[1, 2, 3], &[]);
		bytes.truncate(HEADER_SIZE + 3);

		assert!(matches!(Tex::read(&mut bytes.as_slice()),
			Err(TexImportError::Truncated { section: "palette", expected: 3, actual: 1 })));
	}

	#[test]
	fn test_bad_signature() {
		let mut bytes = tex_bytes(false, 1, 1, &[0], &[]);
		bytes[0] = 0;

		assert!(matches!(Tex::read(&mut bytes.as_slice()), Err(TexImportError::Magic(-256))));
	}
}
