pub mod convert;
pub mod dev;
pub mod ext;
pub mod footer;
pub mod header;
pub mod rle;
pub mod tga;

use std::{
	fs,
	io
};

use thiserror::Error;

use ucmv_core::texture::Image;

#[cfg(feature = "export")]
use ucmv_core::texture::{
	PaletteError,
	Texture
};

pub use tga::Targa;

/// Encoding choices for turning images into TGA files
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TgaOptions {
	/// Run-length encode the image data
	pub use_rle: bool,
	/// Append an extension area and footer
	pub new_format: bool,
	/// Store color map entries in 15/16 bits instead of 24/32
	pub two_byte_color_map_entries: bool,
}

/// Decodes a complete TGA file held in memory
#[cfg(feature = "import")]
pub fn decode_tga(bytes: &[u8]) -> Result<Image, TargaImportError> {
	let tga = Targa::read(&mut io::Cursor::new(bytes))?;
	tga.to_image()
}

#[cfg(feature = "import")]
pub fn read_tga(filepath: &str) -> Result<Image, TargaImportError> {
	let input = fs::read(filepath)?;
	decode_tga(&input)
}

/// Encodes an image as a true color TGA
#[cfg(feature = "export")]
pub fn encode_tga(img: &Image, opts: &TgaOptions) -> Result<Vec<u8>, TargaExportError> {
	Targa::from_image(img, opts)?.to_bytes()
}

/// Encodes an indexed texture as a color mapped (or black and white) TGA
#[cfg(feature = "export")]
pub fn encode_indexed_tga(tex: &Texture, opts: &TgaOptions) -> Result<Vec<u8>, TargaExportError> {
	Targa::from_texture(tex, opts)?.to_bytes()
}

#[cfg(feature = "export")]
pub fn write_tga(filepath: &str, img: &Image, opts: &TgaOptions) -> Result<(), TargaExportError> {
	let bytes = encode_tga(img, opts)?;
	fs::write(filepath, bytes)?;

	Ok(())
}

#[cfg(feature = "import")]
#[derive(Error, Debug)]
pub enum TargaImportError {
	#[error("Color map entry {0} is outside the color map")]
	ColorMapIndex(usize),
	#[error("Image is color mapped but has no color map")]
	ColorMapMissing,
	#[error("Unsupported color map entry size: {0}")]
	ColorMapEntrySize(u8),
	#[error("Unknown color map type: {0}")]
	ColorMapType(u8),
	#[error("Image data length mismatch: expected {expected} bytes, got {actual}")]
	ImageDataLength {
		expected: usize,
		actual: usize,
	},
	#[error("Unknown image type: {0}")]
	ImageType(u8),
	#[error("I/O error")]
	IO {
		#[from]
		source: io::Error,
	},
	#[error("{section} offset {offset} lies outside {start}..{end}")]
	Offset {
		section: &'static str,
		offset: u32,
		start: u64,
		end: u64,
	},
	#[error("Unsupported pixel depth: {0}")]
	PixelDepth(u8),
	#[error("RLE stream overruns the image: expected {expected} bytes, packets produce {actual}")]
	RleOverflow {
		expected: usize,
		actual: usize,
	},
	#[error("RLE stream ended early: expected {expected} bytes, got {actual}")]
	RleUnderflow {
		expected: usize,
		actual: usize,
	},
}

#[cfg(feature = "export")]
#[derive(Error, Debug)]
pub enum TargaExportError {
	#[error("Color correction table must have 1024 entries, got {0}")]
	ColorCorrectionLength(usize),
	#[error("Unsupported color map entry size: {0}")]
	ColorMapEntrySize(u8),
	#[error("Color map length mismatch: expected {expected} bytes, got {actual}")]
	ColorMapLength {
		expected: usize,
		actual: usize,
	},
	#[error("Image is color mapped but has no color map")]
	ColorMapMissing,
	#[error("Duplicate developer field tag: {0}")]
	DuplicateDevTag(u16),
	#[error("Image data length mismatch: expected {expected} bytes, got {actual}")]
	ImageDataLength {
		expected: usize,
		actual: usize,
	},
	#[error("Image ID is {0} bytes, at most 255 fit")]
	ImageIdLength(usize),
	#[error("Image is {width}x{height}, dimensions must fit in 16 bits")]
	ImageSize {
		width: usize,
		height: usize,
	},
	#[error("I/O error")]
	IO {
		#[from]
		source: io::Error,
	},
	#[error("Extension area and developer directory need a footer")]
	MissingFooter,
	#[error(transparent)]
	Palette(#[from] PaletteError),
	#[error("Index {0} is outside the palette")]
	PaletteIndex(usize),
	#[error("Unsupported pixel depth: {0}")]
	PixelDepth(u8),
	#[error("Postage stamp length mismatch: expected {expected} bytes, got {actual}")]
	PostageStampLength {
		expected: usize,
		actual: usize,
	},
	#[error("Scan line table length mismatch: expected {expected} entries, got {actual}")]
	ScanLineTableLength {
		expected: usize,
		actual: usize,
	},
	#[error("Section size or offset {0} does not fit the format")]
	TooLarge(usize),
	#[error("Image has a zero dimension")]
	ZeroDimensions,
}
