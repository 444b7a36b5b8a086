//! Conversion between [`Targa`] containers and decoded images.

#[cfg(feature = "import")]
use byteorder::{
	ByteOrder,
	LE
};

use ucmv_core::texture::{
	Image,
	Rgba
};

#[cfg(feature = "export")]
use ucmv_core::{
	scale8to5,
	texture::{
		PaletteError,
		Texture
	}
};

#[cfg(feature = "export")]
use crate::{
	ext::{
		AttrType,
		ExtensionArea,
		TgaDateTime
	},
	footer::Footer,
	TargaExportError,
	TgaOptions
};

#[cfg(feature = "import")]
use crate::TargaImportError;

use crate::{
	header::*,
	tga::Targa
};

/// Most entries an 8-bit color map can address
pub const MAX_PALETTE_ENTRIES: usize = 256;

/// Palette entries this opaque or more count as having no alpha
#[cfg(feature = "export")]
const OPAQUE_THRESHOLD: u8 = 248;

#[cfg(feature = "import")]
fn gray8(px: &[u8]) -> Rgba {
	Rgba::new(px[0], px[0], px[0], 255)
}

#[cfg(feature = "import")]
fn gray16(px: &[u8]) -> Rgba {
	Rgba::new(px[0], px[0], px[0], px[1])
}

#[cfg(feature = "import")]
fn xrgb1555(px: &[u8]) -> Rgba {
	Rgba {
		alpha: 255,
		..Rgba::from_argb1555(LE::read_u16(px))
	}
}

#[cfg(feature = "import")]
fn argb1555(px: &[u8]) -> Rgba {
	Rgba::from_argb1555(LE::read_u16(px))
}

#[cfg(feature = "import")]
fn bgr(px: &[u8]) -> Rgba {
	Rgba::new(px[2], px[1], px[0], 255)
}

#[cfg(feature = "import")]
fn bgra(px: &[u8]) -> Rgba {
	Rgba::new(px[2], px[1], px[0], px[3])
}

#[cfg(feature = "export")]
fn to_argb1555(c: &Rgba, with_alpha: bool) -> u16 {
	let alpha = if with_alpha && c.alpha >= 0x80 { 0x8000 } else { 0 };

	alpha | (scale8to5(c.red) as u16) << 10 | (scale8to5(c.green) as u16) << 5 | scale8to5(c.blue) as u16
}

#[cfg(feature = "import")]
impl Targa {
	/// Whether the alpha channel carries data: the descriptor must reserve alpha bits and an
	/// extension area, if present, must not declare the alpha undefined.
	pub fn uses_alpha(&self) -> bool {
		self.header.image_spec.descriptor.alpha_bits > 0
			&& self.ext_area.as_ref().map_or(true, |ext| ext.attr_type.has_alpha())
	}

	/// Decodes the color map into colors, in entry order
	pub fn palette(&self) -> Result<Vec<Rgba>, TargaImportError> {
		let cm = self.header.color_map_spec;
		let entry: fn(&[u8]) -> Rgba = match cm.entry_size {
			15 => xrgb1555,
			16 => argb1555,
			24 => bgr,
			32 => bgra,
			size => return Err(TargaImportError::ColorMapEntrySize(size)),
		};

		Ok(self.color_map.chunks_exact(cm.bytes_per_entry()).map(entry).collect())
	}

	/// Decodes the image data into top-to-bottom, left-to-right pixels
	pub fn to_image(&self) -> Result<Image, TargaImportError> {
		self.to_image_with_alpha(false)
	}

	/// Same as [`Targa::to_image`], except that with `force` the stored alpha samples are kept
	/// even when the descriptor or the extension area says the alpha is undefined.
	pub fn to_image_with_alpha(&self, force: bool) -> Result<Image, TargaImportError> {
		let spec = self.header.image_spec;
		self.convert_pixels(&self.image_data, spec.width as usize, spec.height as usize, force)
	}

	/// Decodes the postage stamp, if the extension area carries one
	pub fn postage_stamp_image(&self) -> Result<Option<Image>, TargaImportError> {
		match self.ext_area.as_ref().and_then(|ext| ext.postage_stamp.as_ref()) {
			Some(stamp) => self.convert_pixels(&stamp.data, stamp.width as usize, stamp.height as usize, false).map(Some),
			None => Ok(None),
		}
	}

	fn convert_pixels(&self, data: &[u8], width: usize, height: usize, force_alpha: bool) -> Result<Image, TargaImportError> {
		let spec = self.header.image_spec;
		let image_type = self.header.image_type;

		if image_type == ImageType::NoImageData {
			return Ok(Image::new(0, 0, false));
		}

		let bpp = spec.bytes_per_pixel();
		let count = width * height;

		if bpp == 0 {
			return Err(TargaImportError::PixelDepth(spec.pixel_depth));
		}

		if data.len() != count * bpp {
			return Err(TargaImportError::ImageDataLength {
				expected: count * bpp,
				actual: data.len(),
			});
		}

		let mut colors = Vec::with_capacity(count);

		if image_type.is_color_mapped() {
			if self.header.color_map_type != ColorMapType::ColorMap {
				return Err(TargaImportError::ColorMapMissing);
			}

			let palette = self.palette()?;
			let first = self.header.color_map_spec.first_entry_index as usize;

			for px in data.chunks_exact(bpp) {
				let index = match bpp {
					1 => px[0] as usize,
					2 => LE::read_u16(px) as usize,
					_ => return Err(TargaImportError::PixelDepth(spec.pixel_depth)),
				};

				let color = index.checked_sub(first).and_then(|i| palette.get(i));
				colors.push(*color.ok_or(TargaImportError::ColorMapIndex(index))?);
			}
		} else {
			let pixel: fn(&[u8]) -> Rgba = match (image_type.is_black_white(), spec.pixel_depth) {
				(true, 8) => gray8,
				(true, 16) => gray16,
				(false, 15) => xrgb1555,
				(false, 16) => argb1555,
				(false, 24) => bgr,
				(false, 32) => bgra,
				(_, depth) => return Err(TargaImportError::PixelDepth(depth)),
			};

			colors.extend(data.chunks_exact(bpp).map(pixel));
		}

		let (flip_x, flip_y) = match spec.descriptor.origin {
			ImageOrigin::BottomLeft => (false, true),
			ImageOrigin::BottomRight => (true, true),
			ImageOrigin::TopLeft => (false, false),
			ImageOrigin::TopRight => (true, false),
		};

		let mut img = Image::new(width, height, true);

		for (i, c) in colors.into_iter().enumerate() {
			let x = if flip_x { width - 1 - i % width } else { i % width };
			let y = if flip_y { height - 1 - i / width } else { i / width };
			img.pixels[(y * width) + x] = c;
		}

		if !force_alpha && !self.uses_alpha() {
			img.strip_alpha();
		}

		if let Some(ref ext) = self.ext_area {
			let key = ext.key_color;

			if key.to_argb() != 0 {
				for p in img.pixels.iter_mut() {
					if (p.red, p.green, p.blue) == (key.red, key.green, key.blue) {
						p.alpha = 0;
					} else if !img.has_alpha {
						p.alpha = 255;
					}
				}

				img.has_alpha = true;
			}
		}

		Ok(img)
	}
}

#[cfg(feature = "export")]
fn image_size(width: usize, height: usize) -> Result<(u16, u16), TargaExportError> {
	if width == 0 || height == 0 {
		return Err(TargaExportError::ZeroDimensions);
	}

	match (u16::try_from(width), u16::try_from(height)) {
		(Ok(w), Ok(h)) => Ok((w, h)),
		_ => Err(TargaExportError::ImageSize {
			width: width,
			height: height,
		}),
	}
}

#[cfg(feature = "export")]
impl Targa {
	/// Builds a top-left origin true color container: 24-bit BGR, or 32-bit BGRA when the image has alpha
	pub fn from_image(img: &Image, opts: &TgaOptions) -> Result<Targa, TargaExportError> {
		let (width, height) = image_size(img.width, img.height)?;

		if img.pixels.len() != img.width * img.height {
			return Err(TargaExportError::ImageDataLength {
				expected: img.width * img.height,
				actual: img.pixels.len(),
			});
		}

		let (depth, alpha_bits) = if img.has_alpha { (32, 8) } else { (24, 0) };
		let mut data = Vec::with_capacity(img.pixels.len() * depth as usize / 8);

		for p in img.pixels.iter() {
			data.extend_from_slice(&[p.blue, p.green, p.red]);

			if img.has_alpha {
				data.push(p.alpha);
			}
		}

		let mut tga = Targa {
			header: Header {
				image_type: if opts.use_rle { ImageType::TrueColor.rle() } else { ImageType::TrueColor },
				image_spec: ImageSpec {
					width: width,
					height: height,
					pixel_depth: depth,
					descriptor: ImageDescriptor::new(ImageOrigin::TopLeft, alpha_bits),
					..ImageSpec::default()
				},
				..Header::default()
			},
			image_data: data,
			..Targa::default()
		};

		if opts.new_format {
			tga.attach_extension_area(img.has_alpha);
		}

		Ok(tga)
	}

	/// Builds a color mapped container with 8-bit indices.
	///
	/// A palette of only gray shades is stored as a black and white image instead, with no
	/// color map. Alpha is kept only if some entry is noticeably translucent.
	pub fn from_texture(tex: &Texture, opts: &TgaOptions) -> Result<Targa, TargaExportError> {
		let (width, height) = image_size(tex.width, tex.height)?;

		if tex.palette.len() > MAX_PALETTE_ENTRIES {
			return Err(PaletteError::TooManyColors(MAX_PALETTE_ENTRIES).into());
		}

		if tex.indices.len() != tex.width * tex.height {
			return Err(TargaExportError::ImageDataLength {
				expected: tex.width * tex.height,
				actual: tex.indices.len(),
			});
		}

		if let Some(i) = tex.indices.iter().find(|i| **i >= tex.palette.len()) {
			return Err(TargaExportError::PaletteIndex(*i));
		}

		let has_alpha = tex.palette.iter().any(|c| c.alpha < OPAQUE_THRESHOLD)
			&& tex.palette.iter().any(|c| c.alpha != 0);
		let is_gray = tex.palette.iter().all(|c| c.is_gray());

		let mut header = Header::default();
		let mut color_map = vec![];
		let mut data = Vec::with_capacity(tex.indices.len() * 2);

		if is_gray {
			header.image_type = ImageType::BlackWhite;
			header.image_spec.pixel_depth = if has_alpha { 16 } else { 8 };

			for i in tex.indices.iter() {
				let c = tex.palette[*i];
				data.push(c.red);

				if has_alpha {
					data.push(c.alpha);
				}
			}
		} else {
			let entry_size = match (opts.two_byte_color_map_entries, has_alpha) {
				(true, false) => 15,
				(true, true) => 16,
				(false, false) => 24,
				(false, true) => 32,
			};

			for c in tex.palette.iter() {
				match entry_size {
					15 | 16 => color_map.extend_from_slice(&to_argb1555(c, has_alpha).to_le_bytes()),
					_ => {
						color_map.extend_from_slice(&[c.blue, c.green, c.red]);

						if has_alpha {
							color_map.push(c.alpha);
						}
					},
				}
			}

			header.image_type = ImageType::ColorMapped;
			header.color_map_type = ColorMapType::ColorMap;
			header.color_map_spec = ColorMapSpec {
				first_entry_index: 0,
				length: tex.palette.len() as u16,
				entry_size: entry_size,
			};
			header.image_spec.pixel_depth = 8;

			data.extend(tex.indices.iter().map(|i| *i as u8));
		}

		let alpha_bits = match (has_alpha, header.color_map_spec.entry_size) {
			(false, _) => 0,
			(true, 16) => 1,
			(true, _) => 8,
		};

		header.image_spec.width = width;
		header.image_spec.height = height;
		header.image_spec.descriptor = ImageDescriptor::new(ImageOrigin::TopLeft, alpha_bits);

		if opts.use_rle {
			header.image_type = header.image_type.rle();
		}

		let mut tga = Targa {
			header: header,
			color_map: color_map,
			image_data: data,
			..Targa::default()
		};

		if opts.new_format {
			tga.attach_extension_area(has_alpha);
		}

		Ok(tga)
	}

	/// Adds a footer and a fresh extension area stamped with the current time
	fn attach_extension_area(&mut self, has_alpha: bool) {
		self.ext_area = Some(ExtensionArea {
			date_time: TgaDateTime::now(),
			attr_type: if has_alpha { AttrType::UsefulAlpha } else { AttrType::NoAlpha },
			..ExtensionArea::default()
		});
		self.footer = Some(Footer::default());
	}
}

#[cfg(all(test, feature = "import", feature = "export"))]
mod tests {
	use pretty_assertions::assert_eq;

	use crate::ext::{
		PostageStamp,
		TgaColorKey
	};

	use super::*;

	fn checker() -> Texture {
		let mut tex = Texture::new(2, 2);
		tex.palette = vec![Rgba::new(200, 10, 10, 0), Rgba::new(10, 10, 200, 0)];
		tex.indices = vec![0, 1, 1, 0];
		tex
	}

	#[test]
	fn test_origin_is_normalized() {
		// bottom-left: first stored row is the bottom one
		let tga = Targa {
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
			image_data: vec![1, 2, 3, 4],
			..Targa::default()
		};

		let img = tga.to_image().unwrap();
		let reds: Vec<u8> = img.pixels.iter().map(|p| p.red).collect();
		assert_eq!(vec![3, 4, 1, 2], reds);
		assert!(!img.has_alpha);

		let mut mirrored = tga.clone();
		mirrored.header.image_spec.descriptor = ImageDescriptor::new(ImageOrigin::TopRight, 0);
		let reds: Vec<u8> = mirrored.to_image().unwrap().pixels.iter().map(|p| p.red).collect();
		assert_eq!(vec![2, 1, 4, 3], reds);
	}

	#[test]
	fn test_forced_alpha() {
		let mut tga = Targa {
			header: Header {
				image_type: ImageType::TrueColor,
				image_spec: ImageSpec {
					width: 2,
					height: 1,
					pixel_depth: 32,
					..ImageSpec::default()
				},
				..Header::default()
			},
			image_data: vec![1, 2, 3, 7, 4, 5, 6, 9],
			..Targa::default()
		};

		let alphas = |img: &Image| img.pixels.iter().map(|p| p.alpha).collect::<Vec<u8>>();

		// no alpha bits in the descriptor
		let img = tga.to_image().unwrap();
		assert!(!img.has_alpha);
		assert_eq!(vec![0, 0], alphas(&img));

		let img = tga.to_image_with_alpha(true).unwrap();
		assert!(img.has_alpha);
		assert_eq!(vec![7, 9], alphas(&img));
		assert_eq!(Rgba::new(6, 5, 4, 9), img.pixels[1]);

		// alpha bits present but declared undefined
		tga.header.image_spec.descriptor = ImageDescriptor::new(ImageOrigin::TopLeft, 8);
		tga.ext_area = Some(ExtensionArea {
			attr_type: AttrType::UndefinedIgnorable,
			..ExtensionArea::default()
		});

		assert_eq!(vec![0, 0], alphas(&tga.to_image().unwrap()));
		assert_eq!(vec![7, 9], alphas(&tga.to_image_with_alpha(true).unwrap()));
	}

	#[test]
	fn test_color_mapped_round_trip() {
		let tex = checker();

		for two_byte in [false, true] {
			let opts = TgaOptions {
				two_byte_color_map_entries: two_byte,
				..TgaOptions::default()
			};

			let tga = Targa::from_texture(&tex, &opts).unwrap();
			assert_eq!(ColorMapType::ColorMap, tga.header.color_map_type);
			assert_eq!(if two_byte { 15 } else { 24 }, tga.header.color_map_spec.entry_size);
			assert_eq!(vec![0, 1, 1, 0], tga.image_data);

			let img = tga.to_image().unwrap();
			assert!(!img.has_alpha);
			assert_eq!(tex.pixels()[0].red >> 3, img.pixels[0].red >> 3);
			assert_eq!(tex.pixels()[1].blue >> 3, img.pixels[1].blue >> 3);
		}
	}

	#[test]
	fn test_palette_alpha() {
		let mut tex = checker();
		tex.palette[0].alpha = 0;
		tex.palette[1].alpha = 255;

		let tga = Targa::from_texture(&tex, &TgaOptions::default()).unwrap();
		assert_eq!(32, tga.header.color_map_spec.entry_size);
		assert_eq!(8, tga.header.image_spec.descriptor.alpha_bits);

		let img = tga.to_image().unwrap();
		assert!(img.has_alpha);
		assert_eq!(tex.pixels(), img.pixels);

		let opts = TgaOptions {
			two_byte_color_map_entries: true,
			..TgaOptions::default()
		};
		let tga = Targa::from_texture(&tex, &opts).unwrap();
		assert_eq!(16, tga.header.color_map_spec.entry_size);
		assert_eq!(1, tga.header.image_spec.descriptor.alpha_bits);
		assert_eq!(vec![0, 255, 255, 0], tga.to_image().unwrap().pixels.iter().map(|p| p.alpha).collect::<Vec<u8>>());
	}

	#[test]
	fn test_gray_palette() {
		let mut tex = Texture::new(3, 1);
		tex.palette = vec![Rgba::new(0, 0, 0, 0), Rgba::new(128, 128, 128, 0)];
		tex.indices = vec![1, 0, 1];

		let tga = Targa::from_texture(&tex, &TgaOptions::default()).unwrap();
		assert_eq!(ImageType::BlackWhite, tga.header.image_type);
		assert_eq!(ColorMapType::NoColorMap, tga.header.color_map_type);
		assert!(tga.color_map.is_empty());
		assert_eq!(vec![128, 0, 128], tga.image_data);
		assert_eq!(tex.pixels(), tga.to_image().unwrap().pixels);
	}

	#[test]
	fn test_texture_errors() {
		let mut tex = checker();
		tex.indices[3] = 2;
		assert!(matches!(Targa::from_texture(&tex, &TgaOptions::default()), Err(TargaExportError::PaletteIndex(2))));

		let mut tex = Texture::new(1, 1);
		tex.palette = (0..=256u32).map(|i| Rgba::new(i as u8, (i >> 8) as u8, 0, 0)).collect();
		tex.indices = vec![0];
		assert!(matches!(Targa::from_texture(&tex, &TgaOptions::default()),
			Err(TargaExportError::Palette(PaletteError::TooManyColors(256)))));
	}

	#[test]
	fn test_color_map_first_entry() {
		let mut tga = Targa::from_texture(&checker(), &TgaOptions::default()).unwrap();
		tga.header.color_map_spec.first_entry_index = 1;
		assert!(matches!(tga.to_image(), Err(TargaImportError::ColorMapIndex(0))));

		tga.image_data = vec![1, 2, 2, 1];
		assert_eq!(checker().pixels(), tga.to_image().unwrap().pixels);
	}

	#[test]
	fn test_key_color() {
		let mut img = Image::new(2, 1, false);
		img.pixels[0] = Rgba::new(255, 0, 255, 0);
		img.pixels[1] = Rgba::new(1, 2, 3, 0);

		let opts = TgaOptions {
			new_format: true,
			..TgaOptions::default()
		};
		let mut tga = Targa::from_image(&img, &opts).unwrap();
		if let Some(ref mut ext) = tga.ext_area {
			ext.key_color = TgaColorKey {
				alpha: 255,
				red: 255,
				green: 0,
				blue: 255,
			};
		}

		let out = tga.to_image().unwrap();
		assert!(out.has_alpha);
		assert_eq!(0, out.pixels[0].alpha);
		assert_eq!(255, out.pixels[1].alpha);
	}

	#[test]
	fn test_undefined_alpha_is_dropped() {
		let mut img = Image::new(1, 1, true);
		img.pixels[0] = Rgba::new(9, 8, 7, 100);

		let opts = TgaOptions {
			new_format: true,
			..TgaOptions::default()
		};
		let mut tga = Targa::from_image(&img, &opts).unwrap();
		assert_eq!(Some(AttrType::UsefulAlpha), tga.ext_area.as_ref().map(|e| e.attr_type));
		assert_eq!(img, tga.to_image().unwrap());

		if let Some(ref mut ext) = tga.ext_area {
			ext.attr_type = AttrType::UndefinedIgnorable;
		}
		assert_eq!(Rgba::new(9, 8, 7, 0), tga.to_image().unwrap().pixels[0]);
	}

	#[test]
	fn test_postage_stamp_image() {
		let mut img = Image::new(2, 2, false);
		img.pixels[3] = Rgba::new(5, 6, 7, 0);
		let opts = TgaOptions {
			new_format: true,
			..TgaOptions::default()
		};

		let mut tga = Targa::from_image(&img, &opts).unwrap();
		assert_eq!(None, tga.postage_stamp_image().unwrap());

		if let Some(ref mut ext) = tga.ext_area {
			ext.postage_stamp = Some(PostageStamp {
				width: 1,
				height: 1,
				data: vec![7, 6, 5],
			});
		}

		let stamp = tga.postage_stamp_image().unwrap().unwrap();
		assert_eq!(vec![Rgba::new(5, 6, 7, 0)], stamp.pixels);
	}

	#[test]
	fn test_bad_depth() {
		let mut tga = Targa::from_image(&Image::new(1, 1, false), &TgaOptions::default()).unwrap();
		tga.header.image_spec.pixel_depth = 20;
		tga.image_data = vec![0; 3];
		assert!(matches!(tga.to_image(), Err(TargaImportError::PixelDepth(20))));
	}
}
