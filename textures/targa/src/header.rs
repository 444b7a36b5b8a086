use bitflags::bitflags;

use byteorder::{
	LE,
	ReadBytesExt,
	WriteBytesExt
};

use std::io;

use ucmv_core::bytes_for_bits;

#[cfg(feature = "import")]
use crate::TargaImportError;

pub const HEADER_SIZE: usize = 18;

bitflags! {
	/// Orientation bits of the image descriptor byte
	pub struct DescriptorFlags: u8 {
		const RIGHT_TO_LEFT = 0x10;
		const TOP_TO_BOTTOM = 0x20;
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ColorMapType {
	NoColorMap = 0,
	ColorMap = 1,
}

impl ColorMapType {
	#[cfg(feature = "import")]
	fn read<R>(buf: &mut R) -> Result<ColorMapType, TargaImportError>
	where
		R: ReadBytesExt,
	{
		let kind = buf.read_u8()?;
		match kind {
			0 => Ok(ColorMapType::NoColorMap),
			1 => Ok(ColorMapType::ColorMap),
			_ => Err(TargaImportError::ColorMapType(kind)),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ImageType {
	NoImageData = 0,
	ColorMapped = 1,
	TrueColor = 2,
	BlackWhite = 3,
	RleColorMapped = 9,
	RleTrueColor = 10,
	RleBlackWhite = 11,
}

impl ImageType {
	#[cfg(feature = "import")]
	fn read<R>(buf: &mut R) -> Result<ImageType, TargaImportError>
	where
		R: ReadBytesExt,
	{
		let kind = buf.read_u8()?;
		match kind {
			0 => Ok(ImageType::NoImageData),
			1 => Ok(ImageType::ColorMapped),
			2 => Ok(ImageType::TrueColor),
			3 => Ok(ImageType::BlackWhite),
			9 => Ok(ImageType::RleColorMapped),
			10 => Ok(ImageType::RleTrueColor),
			11 => Ok(ImageType::RleBlackWhite),
			_ => Err(TargaImportError::ImageType(kind)),
		}
	}

	pub fn is_rle(self) -> bool {
		matches!(self, ImageType::RleColorMapped | ImageType::RleTrueColor | ImageType::RleBlackWhite)
	}

	pub fn is_color_mapped(self) -> bool {
		matches!(self, ImageType::ColorMapped | ImageType::RleColorMapped)
	}

	pub fn is_black_white(self) -> bool {
		matches!(self, ImageType::BlackWhite | ImageType::RleBlackWhite)
	}

	/// The run-length encoded variant of this image type
	pub fn rle(self) -> ImageType {
		match self {
			ImageType::ColorMapped => ImageType::RleColorMapped,
			ImageType::TrueColor => ImageType::RleTrueColor,
			ImageType::BlackWhite => ImageType::RleBlackWhite,
			_ => self,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ImageOrigin {
	BottomLeft = 0,
	BottomRight,
	TopLeft,
	TopRight,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageDescriptor {
	pub origin: ImageOrigin,
	pub alpha_bits: u8,
	reserved: u8, // interleave bits, kept as read
}

impl ImageDescriptor {
	pub fn new(origin: ImageOrigin, alpha_bits: u8) -> ImageDescriptor {
		ImageDescriptor {
			origin: origin,
			alpha_bits: alpha_bits & 0x0F,
			reserved: 0,
		}
	}

	pub fn from_byte(b: u8) -> ImageDescriptor {
		let flags = DescriptorFlags::from_bits_truncate(b);
		let origin = match (flags.contains(DescriptorFlags::TOP_TO_BOTTOM),
			flags.contains(DescriptorFlags::RIGHT_TO_LEFT)) {
			(false, false) => ImageOrigin::BottomLeft,
			(false, true) => ImageOrigin::BottomRight,
			(true, false) => ImageOrigin::TopLeft,
			(true, true) => ImageOrigin::TopRight,
		};

		ImageDescriptor {
			origin: origin,
			alpha_bits: b & 0x0F,
			reserved: b & 0xC0,
		}
	}

	pub fn to_byte(&self) -> u8 {
		let mut flags = DescriptorFlags::empty();
		flags.set(DescriptorFlags::RIGHT_TO_LEFT,
			matches!(self.origin, ImageOrigin::BottomRight | ImageOrigin::TopRight));
		flags.set(DescriptorFlags::TOP_TO_BOTTOM,
			matches!(self.origin, ImageOrigin::TopLeft | ImageOrigin::TopRight));

		self.reserved | flags.bits() | (self.alpha_bits & 0x0F)
	}
}

impl Default for ImageDescriptor {
	fn default() -> Self {
		ImageDescriptor::new(ImageOrigin::BottomLeft, 0)
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColorMapSpec {
	pub first_entry_index: u16,
	pub length: u16,
	pub entry_size: u8, // 15, 16, 24 or 32
}

impl ColorMapSpec {
	#[cfg(feature = "import")]
	fn read<R>(buf: &mut R) -> io::Result<ColorMapSpec>
	where
		R: ReadBytesExt,
	{
		Ok(ColorMapSpec {
			first_entry_index: buf.read_u16::<LE>()?,
			length: buf.read_u16::<LE>()?,
			entry_size: buf.read_u8()?,
		})
	}

	#[cfg(feature = "export")]
	fn write<W>(&self, buf: &mut W) -> io::Result<()>
	where
		W: WriteBytesExt,
	{
		buf.write_u16::<LE>(self.first_entry_index)?;
		buf.write_u16::<LE>(self.length)?;
		buf.write_u8(self.entry_size)
	}

	pub fn bytes_per_entry(&self) -> usize {
		bytes_for_bits(self.entry_size)
	}

	/// Size of the color map in bytes
	pub fn data_size(&self) -> usize {
		self.length as usize * self.bytes_per_entry()
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImageSpec {
	pub x_origin: u16,
	pub y_origin: u16,
	pub width: u16,
	pub height: u16,
	pub pixel_depth: u8, // 8, 16, 24 or 32
	pub descriptor: ImageDescriptor,
}

impl ImageSpec {
	#[cfg(feature = "import")]
	fn read<R>(buf: &mut R) -> io::Result<ImageSpec>
	where
		R: ReadBytesExt,
	{
		Ok(ImageSpec {
			x_origin: buf.read_u16::<LE>()?,
			y_origin: buf.read_u16::<LE>()?,
			width: buf.read_u16::<LE>()?,
			height: buf.read_u16::<LE>()?,
			pixel_depth: buf.read_u8()?,
			descriptor: ImageDescriptor::from_byte(buf.read_u8()?),
		})
	}

	#[cfg(feature = "export")]
	fn write<W>(&self, buf: &mut W) -> io::Result<()>
	where
		W: WriteBytesExt,
	{
		buf.write_u16::<LE>(self.x_origin)?;
		buf.write_u16::<LE>(self.y_origin)?;
		buf.write_u16::<LE>(self.width)?;
		buf.write_u16::<LE>(self.height)?;
		buf.write_u8(self.pixel_depth)?;
		buf.write_u8(self.descriptor.to_byte())
	}

	pub fn bytes_per_pixel(&self) -> usize {
		bytes_for_bits(self.pixel_depth)
	}

	/// Size of the uncompressed image data in bytes
	pub fn data_size(&self) -> usize {
		self.width as usize * self.height as usize * self.bytes_per_pixel()
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
	pub id_length: u8,
	pub color_map_type: ColorMapType,
	pub image_type: ImageType,
	pub color_map_spec: ColorMapSpec,
	pub image_spec: ImageSpec,
}

impl Header {
	#[cfg(feature = "import")]
	pub fn read<R>(buf: &mut R) -> Result<Header, TargaImportError>
	where
		R: ReadBytesExt,
	{
		Ok(Header {
			id_length: buf.read_u8()?,
			color_map_type: ColorMapType::read(buf)?,
			image_type: ImageType::read(buf)?,
			color_map_spec: ColorMapSpec::read(buf)?,
			image_spec: ImageSpec::read(buf)?,
		})
	}

	#[cfg(feature = "export")]
	pub fn write<W>(&self, buf: &mut W) -> io::Result<()>
	where
		W: WriteBytesExt,
	{
		buf.write_u8(self.id_length)?;
		buf.write_u8(self.color_map_type as u8)?;
		buf.write_u8(self.image_type as u8)?;
		self.color_map_spec.write(buf)?;
		self.image_spec.write(buf)
	}
}

impl Default for Header {
	fn default() -> Self {
		Header {
			id_length: 0,
			color_map_type: ColorMapType::NoColorMap,
			image_type: ImageType::NoImageData,
			color_map_spec: ColorMapSpec::default(),
			image_spec: ImageSpec::default(),
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn test_descriptor_bits() {
		let d = ImageDescriptor::from_byte(0x28);
		assert_eq!(ImageOrigin::TopLeft, d.origin);
		assert_eq!(8, d.alpha_bits);
		assert_eq!(0x28, d.to_byte());

		assert_eq!(ImageOrigin::BottomRight, ImageDescriptor::from_byte(0x10).origin);
		assert_eq!(ImageOrigin::TopRight, ImageDescriptor::from_byte(0x30).origin);
		assert_eq!(0xC0, ImageDescriptor::from_byte(0xC0).to_byte());
	}

	#[test]
	fn test_sizes() {
		let cm = ColorMapSpec {
			first_entry_index: 0,
			length: 16,
			entry_size: 15,
		};
		assert_eq!(32, cm.data_size());

		let spec = ImageSpec {
			width: 3,
			height: 2,
			pixel_depth: 24,
			..ImageSpec::default()
		};
		assert_eq!(18, spec.data_size());
	}

	#[cfg(all(feature = "import", feature = "export"))]
	#[test]
	fn test_header_bytes() {
		let raw: [u8; HEADER_SIZE] = [0, 0, 10, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 0, 1, 0, 32, 0x28];
		let header = Header::read(&mut &raw[..]).unwrap();

		assert_eq!(ImageType::RleTrueColor, header.image_type);
		assert_eq!(2, header.image_spec.width);
		assert_eq!(1, header.image_spec.height);
		assert_eq!(32, header.image_spec.pixel_depth);

		let mut out = vec![];
		header.write(&mut out).unwrap();
		assert_eq!(raw.to_vec(), out);
	}

	#[cfg(feature = "import")]
	#[test]
	fn test_bad_image_type() {
		let raw: [u8; HEADER_SIZE] = [0, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 0, 1, 0, 32, 0];
		assert!(matches!(Header::read(&mut &raw[..]), Err(TargaImportError::ImageType(4))));
	}
}
