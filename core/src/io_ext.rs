use byteorder::{
	ReadBytesExt,
	WriteBytesExt
};

use std::io::{
	self,
	Read,
	Result
};

pub const NUL: u8 = 0;
pub const SPACE: u8 = b' ';

/// A fixed-width ASCII field.
///
/// The stored text is padded up to `width` bytes with `padding`. When `terminated` is set,
/// the final byte of the field is always a NUL and the text may use at most `width - 1` bytes.
/// Reading a field remembers which padding byte was used so it can be written back unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FixedStr {
	pub text: String,
	pub width: usize,
	pub padding: u8,
	pub terminated: bool,
}

impl FixedStr {
	/// Creates an empty NUL-padded field
	pub fn new(width: usize, terminated: bool) -> FixedStr {
		FixedStr {
			text: String::new(),
			width: width,
			padding: NUL,
			terminated: terminated,
		}
	}

	pub fn with_text(text: &str, width: usize, terminated: bool) -> FixedStr {
		FixedStr {
			text: text.to_string(),
			..FixedStr::new(width, terminated)
		}
	}

	/// Interprets `bytes` as a complete field
	pub fn from_bytes(bytes: &[u8], terminated: bool) -> FixedStr {
		let body = if terminated && !bytes.is_empty() {
			&bytes[..bytes.len() - 1]
		} else {
			bytes
		};

		let mut field = FixedStr::new(bytes.len(), terminated);

		match body.last() {
			Some(&pad) if pad == NUL || pad == SPACE => {
				let end = body.iter().rposition(|b| *b != pad).map_or(0, |i| i + 1);
				field.padding = pad;
				field.text = body[..end].iter().map(|b| *b as char).collect();
			},
			_ => field.text = body.iter().map(|b| *b as char).collect(),
		}

		field
	}

	/// Number of bytes available to the text
	pub fn capacity(&self) -> usize {
		if self.terminated {
			self.width.saturating_sub(1)
		} else {
			self.width
		}
	}

	/// Serializes the field to exactly `width` bytes, truncating overlong text
	pub fn to_bytes(&self) -> Vec<u8> {
		let cap = self.capacity();
		let mut out: Vec<u8> = self.text.chars()
			.take(cap)
			.map(|c| if (c as u32) <= 0xFF { c as u32 as u8 } else { b'?' })
			.collect();

		out.resize(cap, self.padding);

		if self.terminated && self.width > 0 {
			out.push(NUL);
		}

		out
	}
}

pub trait ReadBinExt: ReadBytesExt {
	/// Reads exactly `len` bytes, growing the buffer as data arrives. Short input is
	/// `UnexpectedEof`.
	#[inline]
	fn read_vec(&mut self, len: usize) -> Result<Vec<u8>> {
		let mut buf = vec![];
		let read = Read::take(&mut *self, len as u64).read_to_end(&mut buf)?;

		if read != len {
			return Err(io::Error::new(io::ErrorKind::UnexpectedEof,
				format!("expected {} bytes, got {}", len, read)));
		}

		Ok(buf)
	}

	/// Reads a fixed-width ASCII field
	#[inline]
	fn read_fixed_str(&mut self, width: usize, terminated: bool) -> Result<FixedStr> {
		let buf = self.read_vec(width)?;

		Ok(FixedStr::from_bytes(&buf, terminated))
	}
}

impl<R> ReadBinExt for R
where
	R: ReadBytesExt + ?Sized,
{
}

pub trait WriteBinExt: WriteBytesExt {
	/// Writes a fixed-width ASCII field
	#[inline]
	fn write_fixed_str(&mut self, s: &FixedStr) -> Result<()> {
		self.write_all(&s.to_bytes())
	}
}

impl<W> WriteBinExt for W
where
	W: WriteBytesExt + ?Sized,
{
}
