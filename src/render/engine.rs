//! PDF engine adapter over MuPDF
//!
//! Wraps a single in-memory document. One instance lives inside the
//! render worker thread; it has no concurrency of its own and assumes
//! one outstanding operation at a time.

use mupdf::{Colorspace, Document, Matrix, Pixmap};

use super::request::WorkerFault;

/// Single-document PDF engine: bytes in, page count and PNG pages out.
pub struct PdfEngine {
    doc: Option<Document>,
    page_count: usize,
}

impl PdfEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            doc: None,
            page_count: 0,
        }
    }

    /// Whether a document is currently loaded
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.doc.is_some()
    }

    /// Parse `bytes` as a PDF and replace any previously loaded document.
    ///
    /// Returns the page count. On parse failure the previous document
    /// (if any) stays loaded.
    pub fn load(&mut self, bytes: &[u8]) -> Result<usize, WorkerFault> {
        let doc = Document::from_bytes(bytes, "application/pdf")?;
        let count = doc.page_count()? as usize;

        self.doc = Some(doc);
        self.page_count = count;
        Ok(count)
    }

    /// Page count of the loaded document
    pub fn page_count(&self) -> Result<usize, WorkerFault> {
        if self.doc.is_none() {
            return Err(WorkerFault::NoDocument);
        }
        Ok(self.page_count)
    }

    /// Render page `page` at `scale` and encode it as PNG.
    ///
    /// `scale` is a positive multiplier over the page's native raster
    /// resolution; no automatic scale negotiation happens here.
    pub fn render_page(&self, page: usize, scale: f32) -> Result<Vec<u8>, WorkerFault> {
        let doc = self.doc.as_ref().ok_or(WorkerFault::NoDocument)?;

        if !scale.is_finite() || scale <= 0.0 {
            return Err(WorkerFault::InvalidScale { scale });
        }
        if page >= self.page_count {
            return Err(WorkerFault::PageOutOfRange {
                page,
                page_count: self.page_count,
            });
        }

        let loaded = doc.load_page(page as i32)?;
        let transform = Matrix::new_scale(scale, scale);
        let rgb = Colorspace::device_rgb();
        let pixmap = loaded.to_pixmap(&transform, &rgb, false, false)?;

        let pixels = pixmap_to_rgb(&pixmap)?;
        encode_png(pixmap.width(), pixmap.height(), &pixels)
    }
}

impl Default for PdfEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Flatten a pixmap into tightly packed RGB rows, dropping any alpha
/// channel and stride padding.
fn pixmap_to_rgb(pixmap: &Pixmap) -> Result<Vec<u8>, WorkerFault> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(WorkerFault::generic(format!(
            "pixmap has {n} channels, need at least 3"
        )));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if row_bytes > stride || samples.len() < stride.saturating_mul(height) {
        return Err(WorkerFault::generic(format!(
            "pixmap samples shorter than {width}x{height} at stride {stride}"
        )));
    }

    let mut out = Vec::with_capacity(width * height * 3);
    for row in samples.chunks(stride).take(height) {
        let pixels = &row[..row_bytes];
        if n == 3 {
            out.extend_from_slice(pixels);
        } else {
            for px in pixels.chunks_exact(n) {
                out.extend_from_slice(&px[..3]);
            }
        }
    }

    Ok(out)
}

fn encode_png(width: u32, height: u32, rgb: &[u8]) -> Result<Vec<u8>, WorkerFault> {
    let mut png_data: Vec<u8> = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Fast);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(rgb)?;
    }
    Ok(png_data)
}
