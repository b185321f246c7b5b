//! Raster metadata and alpha decoding for PNG and TIFF files, plus PDF page size.

use crate::error::{ValidateError, ValidateResult};
use crate::pdf::pdf_info;
use dtfprep_core::units::{CM_PER_INCH, DEFAULT_DPI, ppm_to_dpi, px_to_cm};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tiff::decoder::ifd::Value;
use tiff::decoder::{Decoder as TiffDecoder, DecodingResult};
use tiff::tags::Tag;

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    Png,
    Tiff,
    /// Vector pages; size comes from the first page, pixels are derived.
    Pdf,
}

impl RasterFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(RasterFormat::Png),
            "tif" | "tiff" => Some(RasterFormat::Tiff),
            "pdf" => Some(RasterFormat::Pdf),
            _ => None,
        }
    }

    /// Detect format from a path's extension.
    pub fn from_path(path: &Path) -> ValidateResult<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| ValidateError::UnsupportedFormat(path.to_path_buf()))
    }
}

/// Pixel size and resolution of a raster file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterInfo {
    pub format: RasterFormat,
    pub width_px: u32,
    pub height_px: u32,
    /// Resolution in dots per inch.
    pub dpi: f64,
    /// False when the file had no usable density and `dpi` is the 72 DPI fallback.
    pub dpi_from_file: bool,
}

impl RasterInfo {
    pub fn new(format: RasterFormat, width_px: u32, height_px: u32, dpi: Option<f64>) -> Self {
        Self {
            format,
            width_px,
            height_px,
            dpi: dpi.unwrap_or(DEFAULT_DPI),
            dpi_from_file: dpi.is_some(),
        }
    }

    /// Printed width in centimeters.
    pub fn width_cm(&self) -> f64 {
        px_to_cm(self.width_px as f64, self.dpi)
    }

    /// Printed height in centimeters.
    pub fn height_cm(&self) -> f64 {
        px_to_cm(self.height_px as f64, self.dpi)
    }
}

/// Per-pixel alpha, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaMask {
    width: u32,
    height: u32,
    alpha: Vec<u8>,
}

impl AlphaMask {
    /// Wrap an alpha plane of `width * height` bytes.
    pub fn new(width: u32, height: u32, alpha: Vec<u8>) -> ValidateResult<Self> {
        if alpha.len() != width as usize * height as usize {
            return Err(ValidateError::UnsupportedLayout(format!(
                "expected {} alpha samples for {}x{}, got {}",
                width as usize * height as usize,
                width,
                height,
                alpha.len()
            )));
        }
        Ok(Self { width, height, alpha })
    }

    /// A mask for an image without an alpha channel.
    pub fn opaque(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            alpha: vec![u8::MAX; width as usize * height as usize],
        }
    }

    /// Pick the alpha sample out of interleaved rows of `stride` bytes.
    pub fn from_rows(
        width: u32,
        height: u32,
        samples: &[u8],
        stride: usize,
        channels: usize,
        alpha_index: usize,
    ) -> ValidateResult<Self> {
        let mut alpha = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height as usize {
            for x in 0..width as usize {
                let sample = samples
                    .get(y * stride + x * channels + alpha_index)
                    .ok_or_else(|| ValidateError::UnsupportedLayout("pixel buffer too short".to_string()))?;
                alpha.push(*sample);
            }
        }
        Self::new(width, height, alpha)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Alpha at `(x, y)`, or `None` outside the mask.
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.alpha.get(y as usize * self.width as usize + x as usize).copied()
    }

    /// Rows of alpha samples, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        // chunks_exact(0) panics
        self.alpha.chunks_exact(self.width.max(1) as usize)
    }
}

/// Read pixel size and resolution without decoding pixel data.
pub fn read_info(path: &Path) -> ValidateResult<RasterInfo> {
    match RasterFormat::from_path(path)? {
        RasterFormat::Png => png_info(open(path)?),
        RasterFormat::Tiff => tiff_info(open(path)?),
        RasterFormat::Pdf => pdf_info(&fs::read(path)?),
    }
}

/// Decode the alpha plane. PDF pages have none.
pub fn read_alpha(path: &Path) -> ValidateResult<AlphaMask> {
    match RasterFormat::from_path(path)? {
        RasterFormat::Png => png_alpha(open(path)?),
        RasterFormat::Tiff => tiff_alpha(open(path)?),
        RasterFormat::Pdf => Err(ValidateError::UnsupportedLayout("PDF pages have no alpha channel".to_string())),
    }
}

fn open(path: &Path) -> ValidateResult<BufReader<File>> {
    Ok(BufReader::new(File::open(path)?))
}

/// PNG size and `pHYs` density.
pub fn png_info<R: Read>(reader: R) -> ValidateResult<RasterInfo> {
    let reader = png::Decoder::new(reader).read_info()?;
    let info = reader.info();
    let dpi = info
        .pixel_dims
        .filter(|dims| matches!(dims.unit, png::Unit::Meter) && dims.xppu > 0)
        .map(|dims| ppm_to_dpi(dims.xppu as f64));
    Ok(RasterInfo::new(RasterFormat::Png, info.width, info.height, dpi))
}

/// PNG alpha, with palettes and `tRNS` expanded.
pub fn png_alpha<R: Read>(reader: R) -> ValidateResult<AlphaMask> {
    let mut decoder = png::Decoder::new(reader);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut buf)?;

    let alpha_index = match frame.color_type {
        png::ColorType::Rgba => 3,
        png::ColorType::GrayscaleAlpha => 1,
        _ => return Ok(AlphaMask::opaque(frame.width, frame.height)),
    };
    AlphaMask::from_rows(
        frame.width,
        frame.height,
        &buf,
        frame.line_size,
        frame.color_type.samples(),
        alpha_index,
    )
}

/// Convert a TIFF resolution and `ResolutionUnit` to DPI.
///
/// A missing unit means inches; unit 1 (none) carries no physical size.
pub fn resolution_to_dpi(resolution: f64, unit: Option<u16>) -> Option<f64> {
    let dpi = match unit.unwrap_or(2) {
        2 => resolution,
        3 => resolution * CM_PER_INCH,
        _ => return None,
    };
    (dpi.is_finite() && dpi > 0.0).then_some(dpi)
}

fn tiff_dpi<R: Read + Seek>(decoder: &mut TiffDecoder<R>) -> ValidateResult<Option<f64>> {
    let resolution = match decoder.find_tag(Tag::XResolution)? {
        Some(Value::Rational(n, d)) if d != 0 => n as f64 / d as f64,
        Some(Value::Unsigned(n)) => n as f64,
        Some(Value::Short(n)) => n as f64,
        _ => return Ok(None),
    };
    let unit = decoder.find_tag_unsigned::<u16>(Tag::ResolutionUnit)?;
    Ok(resolution_to_dpi(resolution, unit))
}

/// TIFF size and resolution tags.
pub fn tiff_info<R: Read + Seek>(reader: R) -> ValidateResult<RasterInfo> {
    let mut decoder = TiffDecoder::new(reader)?;
    let (width, height) = decoder.dimensions()?;
    let dpi = tiff_dpi(&mut decoder)?;
    Ok(RasterInfo::new(RasterFormat::Tiff, width, height, dpi))
}

/// TIFF alpha. Layouts without an alpha channel are treated as opaque.
pub fn tiff_alpha<R: Read + Seek>(reader: R) -> ValidateResult<AlphaMask> {
    let mut decoder = TiffDecoder::new(reader)?;
    let (width, height) = decoder.dimensions()?;
    let (channels, alpha_index) = match decoder.colortype()? {
        tiff::ColorType::RGBA(_) => (4, 3),
        tiff::ColorType::GrayA(_) => (2, 1),
        _ => return Ok(AlphaMask::opaque(width, height)),
    };

    let stride = width as usize * channels;
    match decoder.read_image()? {
        DecodingResult::U8(data) => AlphaMask::from_rows(width, height, &data, stride, channels, alpha_index),
        DecodingResult::U16(data) => {
            // Keep any non-zero alpha non-zero after narrowing
            let narrowed: Vec<u8> = data
                .iter()
                .map(|&v| if v == 0 { 0 } else { ((v >> 8) as u8).max(1) })
                .collect();
            AlphaMask::from_rows(width, height, &narrowed, stride, channels, alpha_index)
        }
        _ => Err(ValidateError::UnsupportedLayout("TIFF sample format".to_string())),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;
    use tiff::encoder::{TiffEncoder, colortype};

    /// RGBA image with the given opaque pixels.
    pub(crate) fn rgba_with_opaque(width: u32, height: u32, opaque: &[(u32, u32)]) -> Vec<u8> {
        let mut data = vec![0u8; (width * height * 4) as usize];
        for &(x, y) in opaque {
            let idx = ((y * width + x) * 4) as usize;
            data[idx..idx + 4].copy_from_slice(&[255, 0, 0, 255]);
        }
        data
    }

    pub(crate) fn encode_png(width: u32, height: u32, rgba: &[u8], pixels_per_meter: Option<u32>) -> Vec<u8> {
        let mut data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut data, width, height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            if let Some(ppm) = pixels_per_meter {
                let mut phys = Vec::with_capacity(9);
                phys.extend_from_slice(&ppm.to_be_bytes());
                phys.extend_from_slice(&ppm.to_be_bytes());
                phys.push(1); // unit: meter
                writer.write_chunk(png::chunk::pHYs, &phys).unwrap();
            }
            writer.write_image_data(rgba).unwrap();
        }
        data
    }

    pub(crate) fn encode_tiff(width: u32, height: u32, rgba: &[u8]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        TiffEncoder::new(&mut cursor)
            .unwrap()
            .write_image::<colortype::RGBA8>(width, height, rgba)
            .unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(RasterFormat::from_path(Path::new("a/b.PNG")).unwrap(), RasterFormat::Png);
        assert_eq!(RasterFormat::from_path(Path::new("scan.tif")).unwrap(), RasterFormat::Tiff);
        assert_eq!(RasterFormat::from_path(Path::new("sheet.Pdf")).unwrap(), RasterFormat::Pdf);
        assert!(matches!(
            RasterFormat::from_path(Path::new("logo.svg")),
            Err(ValidateError::UnsupportedFormat(_))
        ));
        assert!(RasterFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_png_info_with_density() {
        let png = encode_png(600, 300, &rgba_with_opaque(600, 300, &[]), Some(11811));
        let info = png_info(Cursor::new(png)).unwrap();
        assert_eq!((info.width_px, info.height_px), (600, 300));
        assert!(info.dpi_from_file);
        assert!((info.dpi - 300.0).abs() < 0.01);
        assert!((info.width_cm() - 5.08).abs() < 0.01);
    }

    #[test]
    fn test_png_info_defaults_to_72() {
        let png = encode_png(72, 144, &rgba_with_opaque(72, 144, &[]), None);
        let info = png_info(Cursor::new(png)).unwrap();
        assert!(!info.dpi_from_file);
        assert_eq!(info.dpi, 72.0);
        assert!((info.height_cm() - 5.08).abs() < 1e-9);
    }

    #[test]
    fn test_png_alpha() {
        let png = encode_png(4, 3, &rgba_with_opaque(4, 3, &[(1, 2)]), None);
        let mask = png_alpha(Cursor::new(png)).unwrap();
        assert_eq!((mask.width(), mask.height()), (4, 3));
        assert_eq!(mask.get(1, 2), Some(255));
        assert_eq!(mask.get(0, 0), Some(0));
    }

    #[test]
    fn test_tiff_info_and_alpha() {
        let tiff = encode_tiff(5, 4, &rgba_with_opaque(5, 4, &[(4, 0)]));
        let info = tiff_info(Cursor::new(tiff.clone())).unwrap();
        assert_eq!(info.format, RasterFormat::Tiff);
        assert_eq!((info.width_px, info.height_px), (5, 4));

        let mask = tiff_alpha(Cursor::new(tiff)).unwrap();
        assert_eq!(mask.get(4, 0), Some(255));
        assert_eq!(mask.get(0, 3), Some(0));
    }

    #[test]
    fn test_resolution_to_dpi() {
        assert_eq!(resolution_to_dpi(300.0, Some(2)), Some(300.0));
        assert_eq!(resolution_to_dpi(300.0, None), Some(300.0));
        assert!((resolution_to_dpi(118.11, Some(3)).unwrap() - 300.0).abs() < 0.01);
        assert_eq!(resolution_to_dpi(1.0, Some(1)), None);
        assert_eq!(resolution_to_dpi(0.0, Some(2)), None);
    }

    #[test]
    fn test_alpha_mask_length_checked() {
        assert!(AlphaMask::new(2, 2, vec![0; 3]).is_err());
        assert!(AlphaMask::from_rows(2, 2, &[0; 7], 4, 2, 1).is_err());
        assert_eq!(AlphaMask::opaque(2, 1).get(1, 0), Some(255));
    }

    #[test]
    fn test_alpha_mask_get_out_of_range() {
        let mask = AlphaMask::opaque(3, 2);
        assert_eq!(mask.get(3, 0), None);
        assert_eq!(mask.get(0, 2), None);
        assert_eq!(mask.get(u32::MAX, u32::MAX), None);
    }
}
