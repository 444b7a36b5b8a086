pub mod atlas;

pub use atlas::{
	AtlasError,
	AtlasTile,
	resolve_face,
	resolve_quad,
	resolve_triangle
};
