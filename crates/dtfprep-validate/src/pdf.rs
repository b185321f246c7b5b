//! Page geometry of PDF files.
//!
//! PDFs have no pixel grid. The first page's MediaBox gives the physical size
//! and pixels are derived at [`PDF_ASSUMED_DPI`].

use crate::error::{ValidateError, ValidateResult};
use crate::raster::{RasterFormat, RasterInfo};
use lopdf::{Dictionary, Document, Object, ObjectId};

/// PDF user space units per inch.
pub const PDF_POINTS_PER_INCH: f64 = 72.0;

/// Resolution assumed for PDF pages.
pub const PDF_ASSUMED_DPI: f64 = 300.0;

/// Page tree depth at which MediaBox inheritance gives up.
const MAX_PAGE_TREE_DEPTH: usize = 32;

/// Size of the first page, converted to pixels at [`PDF_ASSUMED_DPI`].
pub fn pdf_info(bytes: &[u8]) -> ValidateResult<RasterInfo> {
    let doc = Document::load_mem(bytes)?;
    let page_id = doc
        .get_pages()
        .into_values()
        .next()
        .ok_or_else(|| ValidateError::UnsupportedLayout("PDF has no pages".to_string()))?;
    let (width_pt, height_pt) = page_size(&doc, page_id)?;
    log::debug!("PDF first page is {}x{} pt", width_pt, height_pt);

    let to_px = |pt: f64| (pt / PDF_POINTS_PER_INCH * PDF_ASSUMED_DPI).round() as u32;
    Ok(RasterInfo {
        format: RasterFormat::Pdf,
        width_px: to_px(width_pt),
        height_px: to_px(height_pt),
        dpi: PDF_ASSUMED_DPI,
        dpi_from_file: false,
    })
}

/// Page width and height in points. MediaBox may be inherited from the page tree.
fn page_size(doc: &Document, page_id: ObjectId) -> ValidateResult<(f64, f64)> {
    let mut node: &Dictionary = doc.get_dictionary(page_id)?;
    for _ in 0..MAX_PAGE_TREE_DEPTH {
        if let Ok(media_box) = node.get(b"MediaBox") {
            return media_box_size(doc, media_box);
        }
        let parent = node
            .get(b"Parent")
            .and_then(Object::as_reference)
            .map_err(|_| missing_media_box())?;
        node = doc.get_dictionary(parent)?;
    }
    Err(missing_media_box())
}

fn missing_media_box() -> ValidateError {
    ValidateError::UnsupportedLayout("PDF page has no MediaBox".to_string())
}

fn media_box_size(doc: &Document, media_box: &Object) -> ValidateResult<(f64, f64)> {
    let media_box = match media_box {
        Object::Reference(id) => doc.get_object(*id)?,
        other => other,
    };
    let coords: Option<Vec<f64>> = media_box.as_array()?.iter().map(number).collect();
    match coords.as_deref() {
        Some(&[x0, y0, x1, y1]) => Ok(((x1 - x0).abs(), (y1 - y0).abs())),
        _ => Err(ValidateError::UnsupportedLayout("malformed PDF MediaBox".to_string())),
    }
}

fn number(obj: &Object) -> Option<f64> {
    match *obj {
        Object::Integer(n) => Some(n as f64),
        Object::Real(n) => Some(n as f64),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::dictionary;

    /// One-page PDF. With `inherit`, the MediaBox sits on the page tree root.
    pub(crate) fn encode_pdf(width_pt: i64, height_pt: i64, inherit: bool) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let media_box = Object::Array(vec![0.into(), 0.into(), width_pt.into(), height_pt.into()]);

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        };
        let mut pages = dictionary! {
            "Type" => "Pages",
            "Count" => 1,
        };
        if inherit {
            pages.set("MediaBox", media_box);
        } else {
            page.set("MediaBox", media_box);
        }
        let page_id = doc.add_object(page);
        pages.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_pdf_info_a4() {
        let info = pdf_info(&encode_pdf(595, 842, false)).unwrap();
        assert_eq!(info.format, RasterFormat::Pdf);
        assert_eq!(info.dpi, PDF_ASSUMED_DPI);
        assert!(!info.dpi_from_file);
        assert_eq!((info.width_px, info.height_px), (2479, 3508));
        assert!((info.width_cm() - 595.0 / 72.0 * 2.54).abs() < 0.01);
        assert!((info.height_cm() - 842.0 / 72.0 * 2.54).abs() < 0.01);
    }

    #[test]
    fn test_pdf_info_inherited_media_box() {
        let info = pdf_info(&encode_pdf(72, 144, true)).unwrap();
        assert_eq!((info.width_px, info.height_px), (300, 600));
    }

    #[test]
    fn test_pdf_info_rejects_garbage() {
        assert!(matches!(pdf_info(b"not a pdf"), Err(ValidateError::Pdf(_))));
    }
}
