use byteorder::{
	LE,
	ReadBytesExt,
	WriteBytesExt
};

use chrono::{
	Datelike,
	NaiveDate,
	NaiveDateTime,
	Timelike
};

use std::{
	fmt,
	io
};

use ucmv_core::io_ext::{
	FixedStr,
	ReadBinExt,
	WriteBinExt
};

/// Size of the extension area without any trailing developer bytes
pub const EXT_AREA_MIN_SIZE: usize = 495;
pub const COLOR_CORRECTION_ENTRIES: usize = 256 * 4;

const NAME_WIDTH: usize = 41;
const COMMENT_LINES: usize = 4;
const COMMENT_WIDTH: usize = 81;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TgaDateTime {
	pub month: u16,
	pub day: u16,
	pub year: u16,
	pub hour: u16,
	pub minute: u16,
	pub second: u16,
}

impl TgaDateTime {
	fn read<R>(buf: &mut R) -> io::Result<TgaDateTime>
	where
		R: ReadBytesExt,
	{
		Ok(TgaDateTime {
			month: buf.read_u16::<LE>()?,
			day: buf.read_u16::<LE>()?,
			year: buf.read_u16::<LE>()?,
			hour: buf.read_u16::<LE>()?,
			minute: buf.read_u16::<LE>()?,
			second: buf.read_u16::<LE>()?,
		})
	}

	fn write<W>(&self, buf: &mut W) -> io::Result<()>
	where
		W: WriteBytesExt,
	{
		for v in [self.month, self.day, self.year, self.hour, self.minute, self.second] {
			buf.write_u16::<LE>(v)?;
		}

		Ok(())
	}

	/// Current UTC time
	pub fn now() -> TgaDateTime {
		TgaDateTime::from(chrono::Utc::now().naive_utc())
	}

	/// Returns `None` for an unset (all zero) or invalid stamp
	pub fn to_naive(&self) -> Option<NaiveDateTime> {
		NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)?
			.and_hms_opt(self.hour as u32, self.minute as u32, self.second as u32)
	}
}

impl From<NaiveDateTime> for TgaDateTime {
	fn from(dt: NaiveDateTime) -> Self {
		TgaDateTime {
			month: dt.month() as u16,
			day: dt.day() as u16,
			year: dt.year().clamp(0, u16::MAX as i32) as u16,
			hour: dt.hour() as u16,
			minute: dt.minute() as u16,
			second: dt.second() as u16,
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TgaTime {
	pub hours: u16,
	pub minutes: u16,
	pub seconds: u16,
}

impl TgaTime {
	fn read<R>(buf: &mut R) -> io::Result<TgaTime>
	where
		R: ReadBytesExt,
	{
		Ok(TgaTime {
			hours: buf.read_u16::<LE>()?,
			minutes: buf.read_u16::<LE>()?,
			seconds: buf.read_u16::<LE>()?,
		})
	}

	fn write<W>(&self, buf: &mut W) -> io::Result<()>
	where
		W: WriteBytesExt,
	{
		buf.write_u16::<LE>(self.hours)?;
		buf.write_u16::<LE>(self.minutes)?;
		buf.write_u16::<LE>(self.seconds)
	}
}

/// Software version, stored as the version number times 100 plus a letter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TgaSoftVersion {
	pub number: u16,
	pub letter: u8,
}

impl TgaSoftVersion {
	fn read<R>(buf: &mut R) -> io::Result<TgaSoftVersion>
	where
		R: ReadBytesExt,
	{
		Ok(TgaSoftVersion {
			number: buf.read_u16::<LE>()?,
			letter: buf.read_u8()?,
		})
	}

	fn write<W>(&self, buf: &mut W) -> io::Result<()>
	where
		W: WriteBytesExt,
	{
		buf.write_u16::<LE>(self.number)?;
		buf.write_u8(self.letter)
	}
}

impl Default for TgaSoftVersion {
	fn default() -> Self {
		TgaSoftVersion {
			number: 0,
			letter: b' ',
		}
	}
}

impl fmt::Display for TgaSoftVersion {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}.{:02}", self.number / 100, self.number % 100)?;

		match self.letter {
			b' ' | 0 => Ok(()),
			l => write!(f, "{}", l as char),
		}
	}
}

/// Transparent key color. Stored as a little endian ARGB integer, so B, G, R, A on disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TgaColorKey {
	pub alpha: u8,
	pub red: u8,
	pub green: u8,
	pub blue: u8,
}

impl TgaColorKey {
	fn read<R>(buf: &mut R) -> io::Result<TgaColorKey>
	where
		R: ReadBytesExt,
	{
		let argb = buf.read_u32::<LE>()?;

		Ok(TgaColorKey {
			alpha: (argb >> 24) as u8,
			red: (argb >> 16) as u8,
			green: (argb >> 8) as u8,
			blue: argb as u8,
		})
	}

	fn write<W>(&self, buf: &mut W) -> io::Result<()>
	where
		W: WriteBytesExt,
	{
		buf.write_u32::<LE>(self.to_argb())
	}

	pub fn to_argb(&self) -> u32 {
		(self.alpha as u32) << 24 | (self.red as u32) << 16 | (self.green as u32) << 8 | self.blue as u32
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TgaFraction {
	pub numerator: u16,
	pub denominator: u16,
}

impl TgaFraction {
	pub const EMPTY: TgaFraction = TgaFraction {
		numerator: 0,
		denominator: 0,
	};

	pub const ONE: TgaFraction = TgaFraction {
		numerator: 1,
		denominator: 1,
	};

	fn read<R>(buf: &mut R) -> io::Result<TgaFraction>
	where
		R: ReadBytesExt,
	{
		Ok(TgaFraction {
			numerator: buf.read_u16::<LE>()?,
			denominator: buf.read_u16::<LE>()?,
		})
	}

	fn write<W>(&self, buf: &mut W) -> io::Result<()>
	where
		W: WriteBytesExt,
	{
		buf.write_u16::<LE>(self.numerator)?;
		buf.write_u16::<LE>(self.denominator)
	}

	/// A zero denominator means the field is unused
	pub fn value(&self) -> Option<f64> {
		if self.denominator == 0 {
			None
		} else {
			Some(self.numerator as f64 / self.denominator as f64)
		}
	}
}

/// Four comment lines of up to 80 characters, each NUL terminated
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TgaComment {
	pub lines: [FixedStr; COMMENT_LINES],
}

impl TgaComment {
	/// Splits text into lines at newlines and every 80 characters; anything past four lines is dropped
	pub fn from_text(text: &str) -> TgaComment {
		let mut comment = TgaComment::default();
		let cap = COMMENT_WIDTH - 1;

		let chunks = text.lines().flat_map(|line| {
			let chars: Vec<char> = line.chars().collect();
			if chars.is_empty() {
				vec![String::new()]
			} else {
				chars.chunks(cap).map(|c| c.iter().collect::<String>()).collect()
			}
		});

		for (slot, chunk) in comment.lines.iter_mut().zip(chunks) {
			slot.text = chunk;
		}

		comment
	}

	pub fn text(&self) -> String {
		let lines: Vec<&str> = self.lines.iter().map(|l| l.text.as_str()).collect();
		lines.join("\n").trim_end_matches('\n').to_string()
	}

	fn read<R>(buf: &mut R) -> io::Result<TgaComment>
	where
		R: ReadBytesExt,
	{
		Ok(TgaComment {
			lines: [
				buf.read_fixed_str(COMMENT_WIDTH, true)?,
				buf.read_fixed_str(COMMENT_WIDTH, true)?,
				buf.read_fixed_str(COMMENT_WIDTH, true)?,
				buf.read_fixed_str(COMMENT_WIDTH, true)?,
			],
		})
	}

	fn write<W>(&self, buf: &mut W) -> io::Result<()>
	where
		W: WriteBytesExt,
	{
		for line in self.lines.iter() {
			buf.write_fixed_str(line)?;
		}

		Ok(())
	}
}

impl Default for TgaComment {
	fn default() -> Self {
		TgaComment {
			lines: [
				FixedStr::new(COMMENT_WIDTH, true),
				FixedStr::new(COMMENT_WIDTH, true),
				FixedStr::new(COMMENT_WIDTH, true),
				FixedStr::new(COMMENT_WIDTH, true),
			],
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttrType {
	NoAlpha,
	UndefinedIgnorable,
	UndefinedRetained,
	UsefulAlpha,
	PreMultipliedAlpha,
	Reserved(u8),
}

impl AttrType {
	pub fn from_u8(b: u8) -> AttrType {
		match b {
			0 => AttrType::NoAlpha,
			1 => AttrType::UndefinedIgnorable,
			2 => AttrType::UndefinedRetained,
			3 => AttrType::UsefulAlpha,
			4 => AttrType::PreMultipliedAlpha,
			_ => AttrType::Reserved(b),
		}
	}

	pub fn to_u8(self) -> u8 {
		match self {
			AttrType::NoAlpha => 0,
			AttrType::UndefinedIgnorable => 1,
			AttrType::UndefinedRetained => 2,
			AttrType::UsefulAlpha => 3,
			AttrType::PreMultipliedAlpha => 4,
			AttrType::Reserved(b) => b,
		}
	}

	/// Whether the alpha channel holds meaningful data
	pub fn has_alpha(self) -> bool {
		matches!(self, AttrType::UsefulAlpha | AttrType::PreMultipliedAlpha)
	}
}

impl Default for AttrType {
	fn default() -> Self {
		AttrType::NoAlpha
	}
}

/// Small preview image stored after the extension area
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PostageStamp {
	pub width: u8,
	pub height: u8,
	pub data: Vec<u8>,
}

impl PostageStamp {
	/// Size on disk, including the two dimension bytes
	pub fn size(&self) -> usize {
		2 + self.data.len()
	}

	pub(crate) fn write<W>(&self, buf: &mut W) -> io::Result<()>
	where
		W: WriteBytesExt,
	{
		buf.write_u8(self.width)?;
		buf.write_u8(self.height)?;
		buf.write_all(&self.data)
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionArea {
	pub extension_size: u16,
	pub author_name: FixedStr,
	pub author_comments: TgaComment,
	pub date_time: TgaDateTime,
	pub job_name: FixedStr,
	pub job_time: TgaTime,
	pub software_id: FixedStr,
	pub software_version: TgaSoftVersion,
	pub key_color: TgaColorKey,
	pub pixel_aspect_ratio: TgaFraction,
	pub gamma: TgaFraction,
	pub color_correction_offset: u32,
	pub postage_stamp_offset: u32,
	pub scan_line_offset: u32,
	pub attr_type: AttrType,
	/// Bytes following the fixed fields, up to `extension_size`
	pub other_data: Vec<u8>,

	pub scan_line_table: Option<Vec<u32>>,
	pub postage_stamp: Option<PostageStamp>,
	pub color_correction_table: Option<Vec<u16>>,
}

impl ExtensionArea {
	/// Reads the fixed fields and any trailing bytes of an area `size` bytes long.
	/// The offset tables are left for the caller to resolve.
	pub(crate) fn read<R>(buf: &mut R, size: usize) -> io::Result<ExtensionArea>
	where
		R: ReadBytesExt,
	{
		let size = size.max(EXT_AREA_MIN_SIZE);

		Ok(ExtensionArea {
			extension_size: buf.read_u16::<LE>()?,
			author_name: buf.read_fixed_str(NAME_WIDTH, true)?,
			author_comments: TgaComment::read(buf)?,
			date_time: TgaDateTime::read(buf)?,
			job_name: buf.read_fixed_str(NAME_WIDTH, true)?,
			job_time: TgaTime::read(buf)?,
			software_id: buf.read_fixed_str(NAME_WIDTH, true)?,
			software_version: TgaSoftVersion::read(buf)?,
			key_color: TgaColorKey::read(buf)?,
			pixel_aspect_ratio: TgaFraction::read(buf)?,
			gamma: TgaFraction::read(buf)?,
			color_correction_offset: buf.read_u32::<LE>()?,
			postage_stamp_offset: buf.read_u32::<LE>()?,
			scan_line_offset: buf.read_u32::<LE>()?,
			attr_type: AttrType::from_u8(buf.read_u8()?),
			other_data: buf.read_vec(size - EXT_AREA_MIN_SIZE)?,
			scan_line_table: None,
			postage_stamp: None,
			color_correction_table: None,
		})
	}

	/// Writes the fixed fields and trailing bytes; the offset tables are written separately
	pub(crate) fn write<W>(&self, buf: &mut W) -> io::Result<()>
	where
		W: WriteBytesExt,
	{
		buf.write_u16::<LE>(self.extension_size)?;
		buf.write_fixed_str(&self.author_name)?;
		self.author_comments.write(buf)?;
		self.date_time.write(buf)?;
		buf.write_fixed_str(&self.job_name)?;
		self.job_time.write(buf)?;
		buf.write_fixed_str(&self.software_id)?;
		self.software_version.write(buf)?;
		self.key_color.write(buf)?;
		self.pixel_aspect_ratio.write(buf)?;
		self.gamma.write(buf)?;
		buf.write_u32::<LE>(self.color_correction_offset)?;
		buf.write_u32::<LE>(self.postage_stamp_offset)?;
		buf.write_u32::<LE>(self.scan_line_offset)?;
		buf.write_u8(self.attr_type.to_u8())?;
		buf.write_all(&self.other_data)
	}

	/// Size the area will occupy when written
	pub fn size(&self) -> usize {
		EXT_AREA_MIN_SIZE + self.other_data.len()
	}
}

impl Default for ExtensionArea {
	fn default() -> Self {
		ExtensionArea {
			extension_size: EXT_AREA_MIN_SIZE as u16,
			author_name: FixedStr::new(NAME_WIDTH, true),
			author_comments: TgaComment::default(),
			date_time: TgaDateTime::default(),
			job_name: FixedStr::new(NAME_WIDTH, true),
			job_time: TgaTime::default(),
			software_id: FixedStr::new(NAME_WIDTH, true),
			software_version: TgaSoftVersion::default(),
			key_color: TgaColorKey::default(),
			pixel_aspect_ratio: TgaFraction::EMPTY,
			gamma: TgaFraction::EMPTY,
			color_correction_offset: 0,
			postage_stamp_offset: 0,
			scan_line_offset: 0,
			attr_type: AttrType::NoAlpha,
			other_data: vec![],
			scan_line_table: None,
			postage_stamp: None,
			color_correction_table: None,
		}
	}
}
