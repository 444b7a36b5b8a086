use byteorder::{
	LE,
	ReadBytesExt,
	WriteBytesExt
};

use std::io::{
	self,
	Seek,
	SeekFrom
};

use tracing::trace;

use ucmv_core::io_ext::ReadBinExt;

/// Size of one tag/offset/size record in the directory table
pub const DEV_ENTRY_SIZE: usize = 10;

/// A developer field: an application-defined tag and its payload.
/// `offset` is where the payload sits in the file, filled in on read and on layout.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DevEntry {
	pub tag: u16,
	pub offset: u32,
	pub data: Vec<u8>,
}

impl DevEntry {
	pub fn new(tag: u16, data: Vec<u8>) -> DevEntry {
		DevEntry {
			tag: tag,
			offset: 0,
			data: data,
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DevDirectory {
	pub entries: Vec<DevEntry>,
}

impl DevDirectory {
	/// Reads the directory table at the current position, then seeks to each payload.
	/// Payload offsets are relative to `base`.
	pub(crate) fn read<R>(buf: &mut R, base: u64) -> io::Result<DevDirectory>
	where
		R: ReadBytesExt + Seek,
	{
		let count = buf.read_u16::<LE>()?;
		let mut fields = Vec::with_capacity(count as usize);

		for _ in 0..count {
			let tag = buf.read_u16::<LE>()?;
			let offset = buf.read_u32::<LE>()?;
			let size = buf.read_u32::<LE>()?;
			fields.push((tag, offset, size));
		}

		let mut entries = Vec::with_capacity(fields.len());
		for (tag, offset, size) in fields {
			trace!(tag, offset, size, "developer field");

			buf.seek(SeekFrom::Start(base + offset as u64))?;
			entries.push(DevEntry {
				tag: tag,
				offset: offset,
				data: buf.read_vec(size as usize)?,
			});
		}

		Ok(DevDirectory {
			entries: entries,
		})
	}

	/// Writes the directory table using each entry's stored offset
	pub(crate) fn write_table<W>(&self, buf: &mut W) -> io::Result<()>
	where
		W: WriteBytesExt,
	{
		buf.write_u16::<LE>(self.entries.len() as u16)?;

		for e in self.entries.iter() {
			buf.write_u16::<LE>(e.tag)?;
			buf.write_u32::<LE>(e.offset)?;
			buf.write_u32::<LE>(e.data.len() as u32)?;
		}

		Ok(())
	}

	/// Size of the directory table on disk
	pub fn table_size(&self) -> usize {
		2 + self.entries.len() * DEV_ENTRY_SIZE
	}

	pub fn get(&self, tag: u16) -> Option<&DevEntry> {
		self.entries.iter().find(|e| e.tag == tag)
	}
}
