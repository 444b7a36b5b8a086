//! Texture atlas lookup for model faces.
//!
//! Face UVs address a page of 8x8 tiles, each 32 units square. The tile a face uses is
//! picked from the mean of its UVs, and the UVs are rewritten relative to that tile.

use thiserror::Error;
use tracing::trace;
use ultraviolet::DVec2;

pub const TILE_SIZE: i32 = 32;
pub const TILES_PER_ROW: i32 = 8;
pub const TILES_PER_PAGE: i32 = TILES_PER_ROW * TILES_PER_ROW;

/// Pages below this one do not belong to the texture catalog
pub const FIRST_PAGE: i32 = TILES_PER_PAGE * 11;

/// Highest image index a quad may resolve to
pub const MAX_IMAGE_INDEX: i32 = 352;

/// Image indices quads must never use
pub const INVALID_IMAGES: [i32; 2] = [140, 161];

#[derive(Clone, Debug, PartialEq)]
pub struct AtlasTile {
	pub tile_origin_u: i32,
	pub tile_origin_v: i32,
	pub image_index: i32,
	/// Tile-local UVs with V flipped, one per face vertex
	pub uvs: Vec<DVec2>,
}

#[derive(Debug, Error, PartialEq)]
pub enum AtlasError {
	#[error("Faces have 3 or 4 vertices, got {0}")]
	VertexCount(usize),
}

fn tile_local(c: f64, origin: i32) -> f64 {
	let local = (c - origin as f64) / TILE_SIZE as f64;

	// a coordinate exactly 31 tiles past the origin snaps to 32
	if local == 31.0 {
		32.0
	} else {
		local
	}
}

fn resolve(uvs: &[DVec2], texture_page: i32) -> AtlasTile {
	let n = uvs.len() as f64;
	let mean_u = uvs.iter().map(|uv| uv.x).sum::<f64>() / n;
	let mean_v = uvs.iter().map(|uv| uv.y).sum::<f64>() / n;

	let tile_u = (mean_u / TILE_SIZE as f64).floor() as i32;
	let tile_v = (mean_v / TILE_SIZE as f64).floor() as i32;
	let origin_u = tile_u * TILE_SIZE;
	let origin_v = tile_v * TILE_SIZE;

	let page = tile_u + tile_v * TILES_PER_ROW + texture_page * TILES_PER_PAGE;

	AtlasTile {
		tile_origin_u: origin_u,
		tile_origin_v: origin_v,
		image_index: page - FIRST_PAGE,
		uvs: uvs.iter()
			.map(|uv| DVec2::new(tile_local(uv.x, origin_u), (1.0 - tile_local(uv.y, origin_v)).abs()))
			.collect(),
	}
}

fn remember(seen: &mut Vec<i32>, index: i32) {
	if !seen.contains(&index) {
		seen.push(index);
	}
}

/// Resolves a quad. Indices outside `0..=352`, and the two known bad images, fall back to image 0.
pub fn resolve_quad(uvs: [DVec2; 4], texture_page: i32, seen: &mut Vec<i32>) -> AtlasTile {
	let mut tile = resolve(&uvs, texture_page);

	if tile.image_index < 0 || tile.image_index > MAX_IMAGE_INDEX || INVALID_IMAGES.contains(&tile.image_index) {
		trace!(index = tile.image_index, texture_page, "quad image index replaced with 0");
		tile.image_index = 0;
	}

	remember(seen, tile.image_index);
	tile
}

/// Resolves a triangle. Unlike quads the image index is used as computed.
pub fn resolve_triangle(uvs: [DVec2; 3], texture_page: i32, seen: &mut Vec<i32>) -> AtlasTile {
	let tile = resolve(&uvs, texture_page);

	remember(seen, tile.image_index);
	tile
}

/// Resolves a face of either shape
pub fn resolve_face(uvs: &[DVec2], texture_page: i32, seen: &mut Vec<i32>) -> Result<AtlasTile, AtlasError> {
	match *uvs {
		[a, b, c] => Ok(resolve_triangle([a, b, c], texture_page, seen)),
		[a, b, c, d] => Ok(resolve_quad([a, b, c, d], texture_page, seen)),
		_ => Err(AtlasError::VertexCount(uvs.len())),
	}
}
