use byteorder::{
	LE,
	ReadBytesExt,
	WriteBytesExt
};

use std::io::{
	Seek,
	SeekFrom
};

use tracing::{
	debug,
	trace,
	warn
};

use ucmv_core::io_ext::{
	FixedStr,
	ReadBinExt,
	WriteBinExt
};

use crate::{
	dev::{
		DevDirectory,
		DevEntry
	},
	ext::{
		COLOR_CORRECTION_ENTRIES,
		EXT_AREA_MIN_SIZE,
		ExtensionArea,
		PostageStamp
	},
	footer::{
		FOOTER_SIZE,
		Footer
	},
	header::*,
	rle
};

#[cfg(feature = "import")]
use crate::TargaImportError;

#[cfg(feature = "export")]
use crate::TargaExportError;

/// In-memory model of a TGA file.
///
/// `image_data` always holds the uncompressed pixel bytes in file order; whether it is
/// run-length encoded on disk is decided by `header.image_type`. A file without a footer
/// cannot carry a developer directory or an extension area.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Targa {
	pub header: Header,
	pub image_id: Option<FixedStr>,
	pub color_map: Vec<u8>,
	pub image_data: Vec<u8>,
	pub dev_dir: Option<DevDirectory>,
	pub ext_area: Option<ExtensionArea>,
	pub footer: Option<Footer>,
}

#[cfg(feature = "import")]
impl Targa {
	/// Reads a complete file. Offsets stored in the file are relative to the position the
	/// stream is at when this is called.
	pub fn read<R>(buf: &mut R) -> Result<Targa, TargaImportError>
	where
		R: ReadBytesExt + Seek,
	{
		let base = buf.stream_position()?;
		let header = Header::read(buf)?;
		let spec = header.image_spec;

		trace!(?header, "TGA header");

		let image_id = if header.id_length > 0 {
			Some(buf.read_fixed_str(header.id_length as usize, false)?)
		} else {
			None
		};

		let color_map = match header.color_map_type {
			ColorMapType::ColorMap => buf.read_vec(header.color_map_spec.data_size())?,
			ColorMapType::NoColorMap => vec![],
		};

		let image_data = if header.image_type == ImageType::NoImageData {
			vec![]
		} else if header.image_type.is_rle() {
			rle::decode(buf, spec.width as usize, spec.height as usize, spec.bytes_per_pixel())?
		} else {
			let pos = buf.stream_position()?;
			let remaining = (buf.seek(SeekFrom::End(0))? - pos) as usize;
			buf.seek(SeekFrom::Start(pos))?;

			if remaining < spec.data_size() {
				return Err(TargaImportError::ImageDataLength {
					expected: spec.data_size(),
					actual: remaining,
				});
			}

			buf.read_vec(spec.data_size())?
		};

		let data_end = buf.stream_position()? - base;
		let file_len = buf.seek(SeekFrom::End(0))? - base;

		let mut tga = Targa {
			header: header,
			image_id: image_id,
			color_map: color_map,
			image_data: image_data,
			dev_dir: None,
			ext_area: None,
			footer: None,
		};

		if file_len < data_end + FOOTER_SIZE as u64 {
			debug!(file_len, "no room for a footer, reading as a legacy TGA");
			return Ok(tga);
		}

		let footer_pos = file_len - FOOTER_SIZE as u64;
		buf.seek(SeekFrom::Start(base + footer_pos))?;
		let footer = Footer::read(buf)?;

		if !footer.is_valid() {
			debug!("no footer signature, reading as a legacy TGA");
			return Ok(tga);
		}

		debug!(ext_area_offset = footer.ext_area_offset, dev_dir_offset = footer.dev_dir_offset, "TGA 2.0 footer");

		let bounds = Bounds {
			base: base,
			start: data_end,
			end: footer_pos,
		};

		if footer.dev_dir_offset != 0 {
			bounds.seek(buf, "developer directory", footer.dev_dir_offset)?;
			let dir = DevDirectory::read(buf, base)?;

			for e in dir.entries.iter() {
				bounds.check_span("developer field", e.offset, e.data.len())?;
			}

			tga.dev_dir = Some(dir);
		}

		if footer.ext_area_offset != 0 {
			bounds.seek(buf, "extension area", footer.ext_area_offset)?;
			let size = buf.read_u16::<LE>()?;
			if (size as usize) < EXT_AREA_MIN_SIZE {
				warn!(size, "extension area is smaller than {} bytes", EXT_AREA_MIN_SIZE);
			}

			buf.seek(SeekFrom::Current(-2))?;
			let mut ext = ExtensionArea::read(buf, size as usize)?;

			if ext.scan_line_offset != 0 {
				bounds.seek(buf, "scan line table", ext.scan_line_offset)?;

				let mut table = Vec::with_capacity(spec.height as usize);
				for _ in 0..spec.height {
					table.push(buf.read_u32::<LE>()?);
				}

				ext.scan_line_table = Some(table);
			}

			if ext.postage_stamp_offset != 0 {
				bounds.seek(buf, "postage stamp", ext.postage_stamp_offset)?;

				let width = buf.read_u8()?;
				let height = buf.read_u8()?;
				let len = width as usize * height as usize * spec.bytes_per_pixel();

				ext.postage_stamp = Some(PostageStamp {
					width: width,
					height: height,
					data: buf.read_vec(len)?,
				});
			}

			if ext.color_correction_offset != 0 {
				bounds.seek(buf, "color correction table", ext.color_correction_offset)?;

				let mut table = Vec::with_capacity(COLOR_CORRECTION_ENTRIES);
				for _ in 0..COLOR_CORRECTION_ENTRIES {
					table.push(buf.read_u16::<LE>()?);
				}

				ext.color_correction_table = Some(table);
			}

			tga.ext_area = Some(ext);
		}

		tga.footer = Some(footer);
		Ok(tga)
	}
}

/// Region of the file optional sections may live in: after the image data, before the footer
#[cfg(feature = "import")]
struct Bounds {
	base: u64,
	start: u64,
	end: u64,
}

#[cfg(feature = "import")]
impl Bounds {
	fn check_span(&self, section: &'static str, offset: u32, len: usize) -> Result<(), TargaImportError> {
		let first = offset as u64;

		if first < self.start || first + len as u64 > self.end {
			return Err(TargaImportError::Offset {
				section: section,
				offset: offset,
				start: self.start,
				end: self.end,
			});
		}

		Ok(())
	}

	fn seek<R>(&self, buf: &mut R, section: &'static str, offset: u32) -> Result<(), TargaImportError>
	where
		R: Seek,
	{
		self.check_span(section, offset, 0)?;
		buf.seek(SeekFrom::Start(self.base + offset as u64))?;

		Ok(())
	}
}

/// Result of the validation pass: every section that needs rewriting, with offsets filled in
#[cfg(feature = "export")]
struct Layout {
	header: Header,
	image_bytes: Vec<u8>,
	dev_dir: Option<DevDirectory>,
	ext_area: Option<ExtensionArea>,
	footer: Option<Footer>,
	size: usize,
}

#[cfg(feature = "export")]
fn file_offset(pos: usize) -> Result<u32, TargaExportError> {
	u32::try_from(pos).map_err(|_| TargaExportError::TooLarge(pos))
}

/// Drops empty fields. Larger directories are sorted by tag and must not repeat one.
#[cfg(feature = "export")]
fn prepare_dev_dir(dir: &DevDirectory) -> Result<Option<DevDirectory>, TargaExportError> {
	let mut entries: Vec<DevEntry> = dir.entries.iter().filter(|e| !e.data.is_empty()).cloned().collect();

	if entries.is_empty() {
		return Ok(None);
	}

	if entries.len() > u16::MAX as usize {
		return Err(TargaExportError::TooLarge(entries.len()));
	}

	if entries.len() > 2 {
		entries.sort_by_key(|e| e.tag);

		if let Some(pair) = entries.windows(2).find(|pair| pair[0].tag == pair[1].tag) {
			return Err(TargaExportError::DuplicateDevTag(pair[0].tag));
		}
	}

	Ok(Some(DevDirectory {
		entries: entries,
	}))
}

#[cfg(feature = "export")]
impl Targa {
	/// Validates every section and assigns offsets in file order: header, image ID, color map,
	/// image data, developer fields, developer directory, extension area, scan line table,
	/// postage stamp, color correction table, footer.
	fn layout(&self) -> Result<Layout, TargaExportError> {
		let spec = self.header.image_spec;
		let mut header = self.header;

		let id_len = self.image_id.as_ref().map_or(0, |id| id.width);
		if id_len > u8::MAX as usize {
			return Err(TargaExportError::ImageIdLength(id_len));
		}
		header.id_length = id_len as u8;

		match header.color_map_type {
			ColorMapType::ColorMap => {
				let cm = header.color_map_spec;

				if !matches!(cm.entry_size, 15 | 16 | 24 | 32) {
					return Err(TargaExportError::ColorMapEntrySize(cm.entry_size));
				}

				if self.color_map.len() != cm.data_size() {
					return Err(TargaExportError::ColorMapLength {
						expected: cm.data_size(),
						actual: self.color_map.len(),
					});
				}
			},
			ColorMapType::NoColorMap => {
				if header.image_type.is_color_mapped() {
					return Err(TargaExportError::ColorMapMissing);
				}

				if !self.color_map.is_empty() {
					return Err(TargaExportError::ColorMapLength {
						expected: 0,
						actual: self.color_map.len(),
					});
				}
			},
		}

		let image_bytes = if header.image_type == ImageType::NoImageData {
			if !self.image_data.is_empty() {
				return Err(TargaExportError::ImageDataLength {
					expected: 0,
					actual: self.image_data.len(),
				});
			}

			vec![]
		} else {
			if spec.width == 0 || spec.height == 0 {
				return Err(TargaExportError::ZeroDimensions);
			}

			if !matches!(spec.pixel_depth, 8 | 15 | 16 | 24 | 32) {
				return Err(TargaExportError::PixelDepth(spec.pixel_depth));
			}

			if self.image_data.len() != spec.data_size() {
				return Err(TargaExportError::ImageDataLength {
					expected: spec.data_size(),
					actual: self.image_data.len(),
				});
			}

			if header.image_type.is_rle() {
				rle::encode(&self.image_data, spec.width as usize, spec.height as usize, spec.bytes_per_pixel())?
			} else {
				self.image_data.clone()
			}
		};

		let mut pos = HEADER_SIZE + id_len + self.color_map.len() + image_bytes.len();

		let mut dev_dir = match self.dev_dir {
			Some(ref dir) => prepare_dev_dir(dir)?,
			None => None,
		};

		let mut dev_dir_offset = 0;
		if let Some(ref mut dir) = dev_dir {
			for e in dir.entries.iter_mut() {
				e.offset = file_offset(pos)?;
				pos += e.data.len();
			}

			dev_dir_offset = file_offset(pos)?;
			pos += dir.table_size();
		}

		let mut ext_area = self.ext_area.clone();
		let mut ext_area_offset = 0;
		if let Some(ref mut ext) = ext_area {
			let ext_size = ext.size();
			ext.extension_size = u16::try_from(ext_size).map_err(|_| TargaExportError::TooLarge(ext_size))?;
			ext_area_offset = file_offset(pos)?;
			pos += ext_size;

			ext.scan_line_offset = match ext.scan_line_table {
				Some(ref table) => {
					if table.len() != spec.height as usize {
						return Err(TargaExportError::ScanLineTableLength {
							expected: spec.height as usize,
							actual: table.len(),
						});
					}

					let offset = file_offset(pos)?;
					pos += table.len() * 4;
					offset
				},
				None => 0,
			};

			ext.postage_stamp_offset = match ext.postage_stamp {
				Some(ref stamp) => {
					let expected = stamp.width as usize * stamp.height as usize * spec.bytes_per_pixel();
					if stamp.data.len() != expected {
						return Err(TargaExportError::PostageStampLength {
							expected: expected,
							actual: stamp.data.len(),
						});
					}

					let offset = file_offset(pos)?;
					pos += stamp.size();
					offset
				},
				None => 0,
			};

			ext.color_correction_offset = match ext.color_correction_table {
				Some(ref table) => {
					if table.len() != COLOR_CORRECTION_ENTRIES {
						return Err(TargaExportError::ColorCorrectionLength(table.len()));
					}

					let offset = file_offset(pos)?;
					pos += table.len() * 2;
					offset
				},
				None => 0,
			};
		}

		if (dev_dir.is_some() || ext_area.is_some()) && self.footer.is_none() {
			return Err(TargaExportError::MissingFooter);
		}

		let footer = self.footer.map(|_| Footer::new(ext_area_offset, dev_dir_offset));
		if footer.is_some() {
			pos += FOOTER_SIZE;
		}

		file_offset(pos)?;

		Ok(Layout {
			header: header,
			image_bytes: image_bytes,
			dev_dir: dev_dir,
			ext_area: ext_area,
			footer: footer,
			size: pos,
		})
	}

	/// Recomputes the ID length and every stored offset, as they would be written
	pub fn update_offsets(&mut self) -> Result<(), TargaExportError> {
		let layout = self.layout()?;

		self.header = layout.header;
		self.dev_dir = layout.dev_dir;
		self.ext_area = layout.ext_area;
		self.footer = layout.footer;

		Ok(())
	}

	/// Serializes the whole file. Nothing is produced unless every section validates.
	pub fn to_bytes(&self) -> Result<Vec<u8>, TargaExportError> {
		let layout = self.layout()?;
		let mut out = Vec::with_capacity(layout.size);

		layout.header.write(&mut out)?;

		if let Some(ref id) = self.image_id {
			out.write_fixed_str(id)?;
		}

		out.extend_from_slice(&self.color_map);
		out.extend_from_slice(&layout.image_bytes);

		if let Some(ref dir) = layout.dev_dir {
			for e in dir.entries.iter() {
				out.extend_from_slice(&e.data);
			}

			dir.write_table(&mut out)?;
		}

		if let Some(ref ext) = layout.ext_area {
			ext.write(&mut out)?;

			if let Some(ref table) = ext.scan_line_table {
				for offset in table.iter() {
					out.write_u32::<LE>(*offset)?;
				}
			}

			if let Some(ref stamp) = ext.postage_stamp {
				stamp.write(&mut out)?;
			}

			if let Some(ref table) = ext.color_correction_table {
				for v in table.iter() {
					out.write_u16::<LE>(*v)?;
				}
			}
		}

		if let Some(ref footer) = layout.footer {
			footer.write(&mut out)?;
		}

		debug!(size = out.len(), rle = self.header.image_type.is_rle(), "TGA encoded");
		Ok(out)
	}

	pub fn write<W>(&self, buf: &mut W) -> Result<(), TargaExportError>
	where
		W: WriteBytesExt,
	{
		let bytes = self.to_bytes()?;
		buf.write_all(&bytes)?;

		Ok(())
	}
}

#[cfg(all(test, feature = "import", feature = "export"))]
mod tests {
	use pretty_assertions::assert_eq;

	use std::io::Cursor;

	use crate::ext::TgaComment;

	use super::*;

	fn gray_2x2() -> Targa {
		Targa {
			header: Header {
				image_type: ImageType::BlackWhite,
				image_spec: ImageSpec {
					width: 2,
					height: 2,
					pixel_depth: 8,
					..ImageSpec::default()
				},
				..Header::default()
			},
			image_data: vec![10, 20, 30, 40],
			..Targa::default()
		}
	}

	#[test]
	fn test_legacy_has_no_footer() {
		let bytes = gray_2x2().to_bytes().unwrap();
		assert_eq!(HEADER_SIZE + 4, bytes.len());

		let tga = Targa::read(&mut Cursor::new(bytes)).unwrap();
		assert_eq!(None, tga.footer);
		assert_eq!(vec![10, 20, 30, 40], tga.image_data);
	}

	#[test]
	fn test_trailing_bytes_without_signature() {
		let mut bytes = gray_2x2().to_bytes().unwrap();
		bytes.extend_from_slice(&[0x55; 40]);

		let tga = Targa::read(&mut Cursor::new(bytes)).unwrap();
		assert_eq!(None, tga.footer);
		assert_eq!(None, tga.ext_area);
	}

	#[test]
	fn test_offsets_in_file_order() {
		let mut tga = gray_2x2();
		tga.image_id = Some(FixedStr::with_text("id", 4, false));
		tga.dev_dir = Some(DevDirectory {
			entries: vec![DevEntry::new(3, vec![1, 2, 3]), DevEntry::new(1, vec![]), DevEntry::new(2, vec![9])],
		});
		let mut ext = ExtensionArea::default();
		ext.author_comments = TgaComment::from_text("layout");
		ext.scan_line_table = Some(vec![0, 2]);
		tga.ext_area = Some(ext);
		tga.footer = Some(Footer::default());

		tga.update_offsets().unwrap();

		// header 18, id 4, data 4
		assert_eq!(4, tga.header.id_length);
		let dir = tga.dev_dir.as_ref().unwrap();
		assert_eq!(2, dir.entries.len());
		assert_eq!(26, dir.entries[0].offset);
		assert_eq!(29, dir.entries[1].offset);

		let footer = tga.footer.unwrap();
		assert_eq!(30, footer.dev_dir_offset);
		assert_eq!(30 + 2 + 2 * 10, footer.ext_area_offset);

		let ext = tga.ext_area.as_ref().unwrap();
		assert_eq!(footer.ext_area_offset + EXT_AREA_MIN_SIZE as u32, ext.scan_line_offset);
		assert_eq!(0, ext.postage_stamp_offset);

		let bytes = tga.to_bytes().unwrap();
		assert_eq!(ext.scan_line_offset as usize + 8 + FOOTER_SIZE, bytes.len());
		assert_eq!(tga, Targa::read(&mut Cursor::new(bytes)).unwrap());
	}

	#[test]
	fn test_stream_offsets_are_relative() {
		let mut tga = gray_2x2();
		tga.ext_area = Some(ExtensionArea::default());
		tga.footer = Some(Footer::default());

		let mut bytes = vec![0xEE; 7];
		bytes.extend(tga.to_bytes().unwrap());

		let mut cur = Cursor::new(bytes);
		cur.set_position(7);
		let back = Targa::read(&mut cur).unwrap();
		assert!(back.ext_area.is_some());
	}

	#[test]
	fn test_bad_offset() {
		let mut bytes = gray_2x2().to_bytes().unwrap();
		// extension area pointing into the header
		bytes.extend_from_slice(&[4, 0, 0, 0, 0, 0, 0, 0]);
		bytes.extend_from_slice(b"TRUEVISION-XFILE.\0");

		assert!(matches!(Targa::read(&mut Cursor::new(bytes)),
			Err(TargaImportError::Offset { section: "extension area", offset: 4, .. })));
	}

	#[test]
	fn test_validation() {
		let mut tga = gray_2x2();
		tga.image_data.pop();
		assert!(matches!(tga.to_bytes(), Err(TargaExportError::ImageDataLength { expected: 4, actual: 3 })));

		let mut tga = gray_2x2();
		tga.ext_area = Some(ExtensionArea::default());
		assert!(matches!(tga.to_bytes(), Err(TargaExportError::MissingFooter)));

		let mut tga = gray_2x2();
		tga.footer = Some(Footer::default());
		tga.dev_dir = Some(DevDirectory {
			entries: vec![DevEntry::new(5, vec![1]), DevEntry::new(2, vec![1]), DevEntry::new(5, vec![2])],
		});
		assert!(matches!(tga.to_bytes(), Err(TargaExportError::DuplicateDevTag(5))));

		let mut tga = gray_2x2();
		tga.footer = Some(Footer::default());
		let mut ext = ExtensionArea::default();
		ext.scan_line_table = Some(vec![0]);
		tga.ext_area = Some(ext);
		assert!(matches!(tga.to_bytes(), Err(TargaExportError::ScanLineTableLength { expected: 2, actual: 1 })));

		let mut tga = gray_2x2();
		tga.footer = Some(Footer::default());
		let mut ext = ExtensionArea::default();
		ext.color_correction_table = Some(vec![0; 10]);
		tga.ext_area = Some(ext);
		assert!(matches!(tga.to_bytes(), Err(TargaExportError::ColorCorrectionLength(10))));

		let mut tga = gray_2x2();
		tga.footer = Some(Footer::default());
		let mut ext = ExtensionArea::default();
		ext.postage_stamp = Some(PostageStamp {
			width: 2,
			height: 1,
			data: vec![0; 3],
		});
		tga.ext_area = Some(ext);
		assert!(matches!(tga.to_bytes(), Err(TargaExportError::PostageStampLength { expected: 2, actual: 3 })));

		let mut tga = gray_2x2();
		tga.header.image_type = ImageType::ColorMapped;
		assert!(matches!(tga.to_bytes(), Err(TargaExportError::ColorMapMissing)));
	}

	#[test]
	fn test_empty_dev_dir_needs_no_footer() {
		let mut tga = gray_2x2();
		tga.dev_dir = Some(DevDirectory {
			entries: vec![DevEntry::new(1, vec![])],
		});

		assert_eq!(HEADER_SIZE + 4, tga.to_bytes().unwrap().len());
	}
}
