use thiserror::Error;

use crate::{
	scale4to8,
	scale5to8,
	scale6to8
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgba {
	pub red: u8,
	pub green: u8,
	pub blue: u8,
	pub alpha: u8,
}

impl Rgba {
	pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Rgba {
		Rgba {
			red: red,
			green: green,
			blue: blue,
			alpha: alpha,
		}
	}

	/// Unpacks a 16-bit value holding four nibbles, red in the lowest
	pub fn from_rgba4444(color: u16) -> Rgba {
		Rgba {
			red: scale4to8((color & 15) as u8),
			green: scale4to8(((color >> 4) & 15) as u8),
			blue: scale4to8(((color >> 8) & 15) as u8),
			alpha: scale4to8((color >> 12) as u8),
		}
	}

	/// Unpacks a 16-bit 5-6-5 value, red in the lowest bits. Alpha is left at 0.
	pub fn from_rgb565(color: u16) -> Rgba {
		Rgba {
			red: scale5to8((color & 31) as u8),
			green: scale6to8(((color >> 5) & 63) as u8),
			blue: scale5to8((color >> 11) as u8),
			alpha: 0,
		}
	}

	/// Unpacks a 16-bit A1R5G5B5 value, blue in the lowest bits
	pub fn from_argb1555(color: u16) -> Rgba {
		Rgba {
			red: scale5to8(((color >> 10) & 31) as u8),
			green: scale5to8(((color >> 5) & 31) as u8),
			blue: scale5to8((color & 31) as u8),
			alpha: if color & 0x8000 != 0 { 255 } else { 0 },
		}
	}

	pub fn is_gray(&self) -> bool {
		self.red == self.green && self.green == self.blue
	}
}

/// A decoded true-color image.
///
/// Pixels are stored row-major, top row first. When `has_alpha` is false the alpha channel
/// carries no information and every pixel's alpha is 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
	pub width: usize,
	pub height: usize,
	pub has_alpha: bool,
	pub pixels: Vec<Rgba>,
}

impl Image {
	pub fn new(width: usize, height: usize, has_alpha: bool) -> Image {
		Image {
			width: width,
			height: height,
			has_alpha: has_alpha,
			pixels: vec![Rgba::default(); width * height],
		}
	}

	/// Clears every alpha sample and marks the image as having no alpha
	pub fn strip_alpha(&mut self) {
		self.has_alpha = false;

		for p in self.pixels.iter_mut() {
			p.alpha = 0;
		}
	}
}

#[derive(Debug, Error, PartialEq)]
pub enum PaletteError {
	#[error("Image needs more than {0} palette entries")]
	TooManyColors(usize),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
	pub palette: Vec<Rgba>,
	pub indices: Vec<usize>,
	pub width: usize,
	pub height: usize,
}

impl Texture {
	pub fn new(width: usize, height: usize) -> Texture {
		Texture {
			palette: vec![],
			indices: vec![],
			width: width,
			height: height,
		}
	}

	/// Builds a palette from the distinct colors of an image, in first-seen order
	pub fn from_image(img: &Image, max_colors: usize) -> Result<Texture, PaletteError> {
		let mut texture = Texture::new(img.width, img.height);

		for c in img.pixels.iter() {
			if let Some(i) = find_palette_index(&texture.palette, c) {
				texture.indices.push(i);
			} else {
				if texture.palette.len() == max_colors {
					return Err(PaletteError::TooManyColors(max_colors));
				}

				texture.indices.push(texture.palette.len());
				texture.palette.push(*c);
			}
		}

		Ok(texture)
	}

	/// Returns the (X, Y) coordinates of every instance of a specified palette index
	pub fn find_indices(&self, index: usize) -> Vec<(usize, usize)> {
		let mut indices = vec![];

		for y in 0..self.height {
			for x in 0..self.width {
				if self.indices[(y * self.width) + x] == index {
					indices.push((x, y));
				}
			}
		}

		indices
	}

	/// Optimise the palette, removing duplicate entries, and adjusting indices accordingly.
	pub fn optimize(&mut self) {
		let mut opt_pal: Vec<Rgba> = vec![];
		let mut remap = Vec::with_capacity(self.palette.len());

		for c in self.palette.iter() {
			match find_palette_index(&opt_pal, c) {
				Some(i) => remap.push(i),
				None => {
					remap.push(opt_pal.len());
					opt_pal.push(*c);
				},
			}
		}

		for i in self.indices.iter_mut() {
			*i = remap[*i];
		}

		self.palette = opt_pal;
	}

	/// Uses the palette and indices to build a pixel array. Out of range indices yield black.
	pub fn pixels(&self) -> Vec<Rgba> {
		self.indices.iter().map(|i| self.palette.get(*i).copied().unwrap_or_default()).collect()
	}

	pub fn to_image(&self, has_alpha: bool) -> Image {
		let mut pixels = self.pixels();

		if !has_alpha {
			pixels.iter_mut().for_each(|p| p.alpha = 0);
		}

		Image {
			width: self.width,
			height: self.height,
			has_alpha: has_alpha,
			pixels: pixels,
		}
	}
}

/// Returns the index of the specified color, if present
pub fn find_palette_index(palette: &[Rgba], color: &Rgba) -> Option<usize> {
	palette.iter().position(|c| c == color)
}
