//! Decoding of local image files into raw bitmaps the texture list accepts.
//!
//! Each supported format has its own decoder with a `load` step (read the
//! file) and a `decode` step (fill a `RawImage`), and every decoded image is
//! scaled to power of two dimensions before it is handed out.

use image::imageops::{self, FilterType};
use image::{self as codec, DynamicImage};
use std::fs;
use std::io;
use std::path::Path;

/// Textures are never scaled below this size on either axis.
pub const MIN_IMAGE_SIZE: u32 = 4;

/// Largest texture dimension the renderer accepts.
pub const MAX_IMAGE_SIZE: u32 = 2048;

/// A dimension is only rounded up to the next power of two if it is larger
/// than this factor times the lower one.
const POWER_OF_TWO_BIAS: f32 = 1.75;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Bmp,
    Tga,
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Determines the format from the file extension, if it is supported.
    pub fn from_path(path: &Path) -> Option<ImageFormat> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "bmp" => Some(ImageFormat::Bmp),
            "tga" => Some(ImageFormat::Tga),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            _ => None,
        }
    }
}

#[derive(Debug, Fail)]
pub enum DecodeError {
    #[fail(display = "Reading image file failed: {}", _0)]
    Io(#[cause] io::Error),

    #[fail(display = "Decoding image failed: {}", _0)]
    Codec(#[cause] codec::ImageError),

    #[fail(display = "Decode called before load.")]
    NotLoaded,

    #[fail(display = "Unsupported number of color components: {}", _0)]
    Components(u8),
}

/// Uncompressed 8 bit per channel pixel data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawImage {
    width: u32,
    height: u32,
    components: u8,
    data: Vec<u8>,
}

impl RawImage {
    pub fn new() -> Self {
        RawImage::default()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn components(&self) -> u8 {
        self.components
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..]
    }

    fn set_from(&mut self, img: DynamicImage) {
        let (width, height) = (img.width(), img.height());
        if img.color().has_alpha() {
            self.components = 4;
            self.data = img.into_rgba8().into_raw();
        } else {
            self.components = 3;
            self.data = img.into_rgb8().into_raw();
        }
        self.width = width;
        self.height = height;
    }

    /// Scales the image so both sides are powers of two, preferring to round
    /// down, and never exceeding `max_dim` (itself capped at `MAX_IMAGE_SIZE`).
    pub fn biased_scale_to_power_of_two(&mut self, max_dim: u32) {
        let new_width = biased_dim_to_power_of_two(self.width, max_dim);
        let new_height = biased_dim_to_power_of_two(self.height, max_dim);
        if new_width == self.width && new_height == self.height {
            return;
        }

        let data = ::std::mem::replace(&mut self.data, Vec::new());
        let scaled = match self.components {
            4 => codec::RgbaImage::from_raw(self.width, self.height, data)
                .map(|img| imageops::resize(&img, new_width, new_height, FilterType::Triangle))
                .map(|img| img.into_raw()),
            _ => codec::RgbImage::from_raw(self.width, self.height, data)
                .map(|img| imageops::resize(&img, new_width, new_height, FilterType::Triangle))
                .map(|img| img.into_raw()),
        };
        // The buffer always matches the dimensions, `set_from` guarantees it.
        if let Some(data) = scaled {
            self.data = data;
            self.width = new_width;
            self.height = new_height;
        }
    }
}

pub fn biased_dim_to_power_of_two(curr_dim: u32, max_dim: u32) -> u32 {
    let max_dim = max_dim
        .max(MIN_IMAGE_SIZE)
        .min(MAX_IMAGE_SIZE)
        .next_power_of_two();
    let mut larger_dim = max_dim;
    let mut smaller_dim = max_dim;
    while smaller_dim > curr_dim && smaller_dim > MIN_IMAGE_SIZE {
        larger_dim = smaller_dim;
        smaller_dim >>= 1;
    }

    if curr_dim as f32 / smaller_dim as f32 > POWER_OF_TWO_BIAS {
        larger_dim
    } else {
        smaller_dim
    }
}

/// A decoder for one image format.
pub trait ImageDecoder {
    /// Reads the encoded file into memory.
    fn load(&mut self, path: &Path) -> Result<(), DecodeError>;

    /// Decodes the previously loaded data into `target`.
    fn decode(&mut self, target: &mut RawImage) -> Result<(), DecodeError>;
}

/// Holds the encoded bytes of a file of one fixed format.
struct Encoded {
    format: codec::ImageFormat,
    bytes: Option<Vec<u8>>,
}

impl Encoded {
    fn new(format: codec::ImageFormat) -> Self {
        Encoded {
            format,
            bytes: None,
        }
    }

    fn load(&mut self, path: &Path) -> Result<(), DecodeError> {
        self.bytes = Some(fs::read(path).map_err(DecodeError::Io)?);
        Ok(())
    }

    fn decode(&self) -> Result<DynamicImage, DecodeError> {
        let bytes = self.bytes.as_ref().ok_or(DecodeError::NotLoaded)?;
        codec::load_from_memory_with_format(&bytes[..], self.format).map_err(DecodeError::Codec)
    }
}

pub struct BmpDecoder(Encoded);
pub struct TgaDecoder(Encoded);
pub struct JpegDecoder(Encoded);
pub struct PngDecoder(Encoded);

impl BmpDecoder {
    pub fn new() -> Self {
        BmpDecoder(Encoded::new(codec::ImageFormat::Bmp))
    }
}

impl Default for BmpDecoder {
    fn default() -> Self {
        BmpDecoder::new()
    }
}

impl TgaDecoder {
    pub fn new() -> Self {
        TgaDecoder(Encoded::new(codec::ImageFormat::Tga))
    }
}

impl Default for TgaDecoder {
    fn default() -> Self {
        TgaDecoder::new()
    }
}

impl JpegDecoder {
    pub fn new() -> Self {
        JpegDecoder(Encoded::new(codec::ImageFormat::Jpeg))
    }
}

impl Default for JpegDecoder {
    fn default() -> Self {
        JpegDecoder::new()
    }
}

impl PngDecoder {
    pub fn new() -> Self {
        PngDecoder(Encoded::new(codec::ImageFormat::Png))
    }
}

impl Default for PngDecoder {
    fn default() -> Self {
        PngDecoder::new()
    }
}

impl ImageDecoder for BmpDecoder {
    fn load(&mut self, path: &Path) -> Result<(), DecodeError> {
        self.0.load(path)
    }

    fn decode(&mut self, target: &mut RawImage) -> Result<(), DecodeError> {
        target.set_from(self.0.decode()?);
        Ok(())
    }
}

impl ImageDecoder for TgaDecoder {
    fn load(&mut self, path: &Path) -> Result<(), DecodeError> {
        self.0.load(path)
    }

    /// Only RGB and RGBA targa files are usable as textures.
    fn decode(&mut self, target: &mut RawImage) -> Result<(), DecodeError> {
        let img = self.0.decode()?;
        match img.color().channel_count() {
            3 | 4 => {
                target.set_from(img);
                Ok(())
            }
            n => Err(DecodeError::Components(n)),
        }
    }
}

impl ImageDecoder for JpegDecoder {
    fn load(&mut self, path: &Path) -> Result<(), DecodeError> {
        self.0.load(path)
    }

    fn decode(&mut self, target: &mut RawImage) -> Result<(), DecodeError> {
        target.set_from(self.0.decode()?);
        Ok(())
    }
}

impl ImageDecoder for PngDecoder {
    fn load(&mut self, path: &Path) -> Result<(), DecodeError> {
        self.0.load(path)
    }

    fn decode(&mut self, target: &mut RawImage) -> Result<(), DecodeError> {
        target.set_from(self.0.decode()?);
        Ok(())
    }
}

fn decoder_for(format: ImageFormat) -> Box<dyn ImageDecoder> {
    match format {
        ImageFormat::Bmp => Box::new(BmpDecoder::new()),
        ImageFormat::Tga => Box::new(TgaDecoder::new()),
        ImageFormat::Jpeg => Box::new(JpegDecoder::new()),
        ImageFormat::Png => Box::new(PngDecoder::new()),
    }
}

/// Loads and decodes `path` with the decoder for `format`, then applies the
/// power of two resize.
pub fn decode_bitmap(
    path: &Path,
    format: ImageFormat,
    max_dim: u32,
) -> Result<RawImage, DecodeError> {
    let mut decoder = decoder_for(format);
    let mut raw = RawImage::new();
    decoder.load(path)?;
    decoder.decode(&mut raw)?;
    raw.biased_scale_to_power_of_two(max_dim);
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_rgb(dir: &TempDir, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.path().join(name);
        RgbImage::from_pixel(w, h, Rgb([200, 10, 10])).save(&path).unwrap();
        path
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ImageFormat::from_path(Path::new("a/b.PNG")), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_path(Path::new("b.jpeg")), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_path(Path::new("b.jpg")), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_path(Path::new("b.tga")), Some(ImageFormat::Tga));
        assert_eq!(ImageFormat::from_path(Path::new("b.bmp")), Some(ImageFormat::Bmp));
        assert_eq!(ImageFormat::from_path(Path::new("b.gif")), None);
        assert_eq!(ImageFormat::from_path(Path::new("no_extension")), None);
    }

    #[test]
    fn power_of_two_bias() {
        assert_eq!(biased_dim_to_power_of_two(256, 1024), 256);
        // 300 / 256 is below the bias, round down.
        assert_eq!(biased_dim_to_power_of_two(300, 1024), 256);
        // 500 / 256 is above it, round up.
        assert_eq!(biased_dim_to_power_of_two(500, 1024), 512);
        assert_eq!(biased_dim_to_power_of_two(5000, 1024), 1024);
        assert_eq!(biased_dim_to_power_of_two(1, 1024), MIN_IMAGE_SIZE);
    }

    #[test]
    fn cap_is_clamped_to_renderer_limit() {
        assert_eq!(biased_dim_to_power_of_two(300, u32::MAX), 256);
        assert_eq!(biased_dim_to_power_of_two(300, 3_000_000_000), 256);
        assert_eq!(biased_dim_to_power_of_two(100_000, u32::MAX), MAX_IMAGE_SIZE);
        assert_eq!(biased_dim_to_power_of_two(300, 0), MIN_IMAGE_SIZE);
    }

    #[test]
    fn decodes_png_and_resizes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("alpha.png");
        RgbaImage::from_pixel(100, 30, Rgba([1, 2, 3, 128])).save(&path).unwrap();

        let raw = decode_bitmap(&path, ImageFormat::Png, 1024).unwrap();
        assert_eq!((raw.width(), raw.height()), (64, 32));
        assert_eq!(raw.components(), 4);
        assert_eq!(raw.data().len(), 64 * 32 * 4);
    }

    #[test]
    fn decodes_bmp_jpeg_and_tga() {
        let dir = TempDir::new().unwrap();
        for (name, format) in &[
            ("a.bmp", ImageFormat::Bmp),
            ("a.jpg", ImageFormat::Jpeg),
            ("a.tga", ImageFormat::Tga),
        ] {
            let path = write_rgb(&dir, name, 16, 16);
            let raw = decode_bitmap(&path, *format, 1024).unwrap();
            assert_eq!((raw.width(), raw.height(), raw.components()), (16, 16, 3));
        }
    }

    #[test]
    fn caps_at_max_dimension() {
        let dir = TempDir::new().unwrap();
        let path = write_rgb(&dir, "big.png", 64, 64);
        let raw = decode_bitmap(&path, ImageFormat::Png, 16).unwrap();
        assert_eq!((raw.width(), raw.height()), (16, 16));
    }

    #[test]
    fn grayscale_tga_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gray.tga");
        GrayImage::from_pixel(8, 8, Luma([7])).save(&path).unwrap();
        match decode_bitmap(&path, ImageFormat::Tga, 1024) {
            Err(DecodeError::Components(1)) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn wrong_content_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        fs::write(&path, b"definitely not a png").unwrap();
        assert!(decode_bitmap(&path, ImageFormat::Png, 1024).is_err());
    }

    #[test]
    fn decode_before_load() {
        let mut raw = RawImage::new();
        match PngDecoder::default().decode(&mut raw) {
            Err(DecodeError::NotLoaded) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }
}
