use std::fmt;
use std::io::Cursor;

use image::codecs::bmp::{BmpDecoder, BmpEncoder};
use image::{ColorType, ExtendedColorType, ImageDecoder, ImageError, Limits, Rgb, RgbImage};

/// Size of the photo region on the employee form.
pub const PHOTO_WIDTH: u32 = 80;
pub const PHOTO_HEIGHT: u32 = 96;
pub const PLACEHOLDER_RGB: (u8, u8, u8) = (192, 192, 192);

/// Only 24-bit bitmaps are displayed.
pub const SUPPORTED_BIT_COUNT: u16 = 24;

/// Largest photo side accepted before any pixel buffer is allocated.
pub const MAX_PHOTO_SIDE: u32 = 2048;

// biBitCount inside BITMAPINFOHEADER
const BIT_COUNT_OFFSET: usize = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapInfo {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug)]
pub enum BitmapError {
    Decode(ImageError),
    Encode(ImageError),
    UnsupportedColor(ColorType),
    UnsupportedBitCount(u16),
}

impl fmt::Display for BitmapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitmapError::Decode(err) => write!(f, "bitmap could not be decoded: {}", err),
            BitmapError::Encode(err) => write!(f, "bitmap could not be encoded: {}", err),
            BitmapError::UnsupportedColor(color) => write!(f, "unsupported bitmap colour type {:?}", color),
            BitmapError::UnsupportedBitCount(bits) => {
                write!(f, "only {}-bit bitmaps are supported, got {}-bit", SUPPORTED_BIT_COUNT, bits)
            }
        }
    }
}

impl std::error::Error for BitmapError {}

fn photo_limits() -> Limits {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_PHOTO_SIDE);
    limits.max_image_height = Some(MAX_PHOTO_SIDE);
    limits
}

// The decoder expands palettes to Rgb8, so the header still decides the depth.
fn bit_count(bytes: &[u8]) -> u16 {
    match bytes.get(BIT_COUNT_OFFSET..BIT_COUNT_OFFSET + 2) {
        Some(raw) => u16::from_le_bytes([raw[0], raw[1]]),
        None => 0,
    }
}

/// Decodes the whole bitmap and checks it can be displayed.
pub fn parse(bytes: &[u8]) -> Result<BitmapInfo, BitmapError> {
    let mut decoder = BmpDecoder::new(Cursor::new(bytes)).map_err(BitmapError::Decode)?;
    decoder.set_limits(photo_limits()).map_err(BitmapError::Decode)?;

    let color = decoder.color_type();
    if color != ColorType::Rgb8 {
        return Err(BitmapError::UnsupportedColor(color));
    }
    let bits = bit_count(bytes);
    if bits != SUPPORTED_BIT_COUNT {
        return Err(BitmapError::UnsupportedBitCount(bits));
    }

    let (width, height) = decoder.dimensions();
    let mut pixels = vec![0u8; decoder.total_bytes() as usize];
    decoder.read_image(&mut pixels).map_err(BitmapError::Decode)?;

    Ok(BitmapInfo { width, height })
}

/// Writes `image` as an uncompressed 24-bit bitmap.
pub fn encode_image(image: &RgbImage) -> Result<Vec<u8>, BitmapError> {
    let mut out = Vec::new();
    BmpEncoder::new(&mut out)
        .encode(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgb8)
        .map_err(BitmapError::Encode)?;
    Ok(out)
}

/// Encodes a 24-bit bitmap, asking `pixel` for the colour at (x, y)
/// with y = 0 being the top row.
pub fn encode<F>(width: u32, height: u32, pixel: F) -> Result<Vec<u8>, BitmapError>
where
    F: Fn(u32, u32) -> (u8, u8, u8),
{
    let image = RgbImage::from_fn(width, height, |x, y| {
        let (r, g, b) = pixel(x, y);
        Rgb([r, g, b])
    });
    encode_image(&image)
}

pub fn encode_solid(width: u32, height: u32, rgb: (u8, u8, u8)) -> Result<Vec<u8>, BitmapError> {
    encode(width, height, |_, _| rgb)
}

/// Grey photo region shown when an employee has no displayable photo.
pub fn placeholder() -> Result<Vec<u8>, BitmapError> {
    encode_solid(PHOTO_WIDTH, PHOTO_HEIGHT, PLACEHOLDER_RGB)
}
