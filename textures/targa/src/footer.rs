use byteorder::{
	LE,
	ReadBytesExt,
	WriteBytesExt
};

use std::io;

pub const FOOTER_SIZE: usize = 26;
pub const SIGNATURE: &[u8; 16] = b"TRUEVISION-XFILE";

/// Trailer marking a TGA 2.0 file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Footer {
	pub ext_area_offset: u32,
	pub dev_dir_offset: u32,
	pub signature: [u8; 16],
	reserved: u8, // '.'
	terminator: u8, // NUL
}

impl Footer {
	pub fn new(ext_area_offset: u32, dev_dir_offset: u32) -> Footer {
		Footer {
			ext_area_offset: ext_area_offset,
			dev_dir_offset: dev_dir_offset,
			..Footer::default()
		}
	}

	pub(crate) fn read<R>(buf: &mut R) -> io::Result<Footer>
	where
		R: ReadBytesExt,
	{
		let ext_area_offset = buf.read_u32::<LE>()?;
		let dev_dir_offset = buf.read_u32::<LE>()?;
		let mut signature = [0; 16];
		buf.read_exact(&mut signature)?;

		Ok(Footer {
			ext_area_offset: ext_area_offset,
			dev_dir_offset: dev_dir_offset,
			signature: signature,
			reserved: buf.read_u8()?,
			terminator: buf.read_u8()?,
		})
	}

	pub(crate) fn write<W>(&self, buf: &mut W) -> io::Result<()>
	where
		W: WriteBytesExt,
	{
		buf.write_u32::<LE>(self.ext_area_offset)?;
		buf.write_u32::<LE>(self.dev_dir_offset)?;
		buf.write_all(&self.signature)?;
		buf.write_u8(self.reserved)?;
		buf.write_u8(self.terminator)
	}

	/// Only the signature decides whether a footer is genuine
	pub fn is_valid(&self) -> bool {
		&self.signature == SIGNATURE
	}
}

impl Default for Footer {
	fn default() -> Self {
		Footer {
			ext_area_offset: 0,
			dev_dir_offset: 0,
			signature: *SIGNATURE,
			reserved: b'.',
			terminator: 0,
		}
	}
}
