use clap::Parser;

use std::{
	error::Error,
	path::PathBuf
};

use tracing::info;
use tracing_subscriber::{
	filter::LevelFilter,
	fmt,
	prelude::*
};

use ucmv_textures_targa::TgaOptions;
use ucmv_textures_urbanchaos::convert_tex_file;

#[derive(Parser, Debug)]
#[command(author, version, about = "Converts Urban Chaos .tex textures to TGA", long_about = None)]
struct Cli {
	#[arg(help = "Path to the .tex file")]
	input: PathBuf,
	#[arg(help = "Where to write the TGA, defaults to the input path with a .tga extension")]
	output: Option<PathBuf>,
	#[arg(long, help = "Run-length encode the image data")]
	rle: bool,
	#[arg(long, help = "Write a TGA 2.0 extension area and footer")]
	new_format: bool,
	#[arg(short, long, help = "Log every decoding step")]
	verbose: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();

	tracing_subscriber::registry()
		.with(fmt::layer())
		.with(if cli.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO })
		.init();

	let output = cli.output.clone().unwrap_or_else(|| cli.input.with_extension("tga"));
	let opts = TgaOptions {
		use_rle: cli.rle,
		new_format: cli.new_format,
		..TgaOptions::default()
	};

	info!("Converting {} to {}", cli.input.display(), output.display());
	convert_tex_file(&cli.input, &output, &opts)?;
	info!("Done");

	Ok(())
}
