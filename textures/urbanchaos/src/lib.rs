#[cfg(feature = "import")]
pub mod tex;

#[cfg(feature = "import")]
use std::{
	fs,
	io,
	path::Path
};

#[cfg(feature = "import")]
use thiserror::Error;

#[cfg(feature = "import")]
use ucmv_core::texture::Image;

#[cfg(feature = "import")]
use ucmv_textures_targa::{
	encode_tga,
	TargaExportError,
	TgaOptions
};

#[cfg(feature = "import")]
use tex::{
	Tex,
	TexImportError
};

#[cfg(feature = "import")]
pub fn decode_tex(bytes: &[u8]) -> Result<Image, TexImportError> {
	let tex = Tex::read(&mut &bytes[..])?;
	Ok(tex.to_image())
}

#[cfg(feature = "import")]
pub fn read_tex(filepath: &str) -> Result<Image, TexImportError> {
	let input = fs::read(filepath)?;
	decode_tex(&input)
}

/// Decodes a texture and re-encodes it as a true color TGA, 32-bit if the texture has alpha
#[cfg(feature = "import")]
pub fn convert_tex_to_tga(bytes: &[u8], opts: &TgaOptions) -> Result<Vec<u8>, TexConvertError> {
	let img = decode_tex(bytes)?;
	Ok(encode_tga(&img, opts)?)
}

#[cfg(feature = "import")]
pub fn convert_tex_file<P, Q>(input: P, output: Q, opts: &TgaOptions) -> Result<(), TexConvertError>
where
	P: AsRef<Path>,
	Q: AsRef<Path>,
{
	let bytes = fs::read(input)?;
	fs::write(output, convert_tex_to_tga(&bytes, opts)?)?;

	Ok(())
}

#[cfg(feature = "import")]
#[derive(Error, Debug)]
pub enum TexConvertError {
	#[error("Could not write TGA: {0}")]
	Export(#[from] TargaExportError),
	#[error("Could not read texture: {0}")]
	Import(#[from] TexImportError),
	#[error("I/O error")]
	IO {
		#[from]
		source: io::Error,
	},
}
