//! Rasterization logic executed inside the page-worker sandbox
//!
//! This code runs in its own process with untrusted input; it must never be
//! called from the server process. The binary entry point is
//! `src/bin/page_worker.rs`.

use std::io::{BufRead, BufReader, Write};
use std::process::ExitCode;

use mupdf::{Colorspace, Document, Matrix};

use super::protocol::{FailureKind, RasterJob, WorkerFailure};

/// Decode the document and render the requested page to PNG bytes.
pub fn rasterize(pdf: &[u8], job: &RasterJob) -> Result<Vec<u8>, WorkerFailure> {
    let doc = Document::from_bytes(pdf, "application/pdf")
        .map_err(|e| WorkerFailure::decode(format!("failed to open document: {}", e)))?;

    let page_count = doc
        .page_count()
        .map_err(|e| WorkerFailure::decode(format!("failed to read page count: {}", e)))?;
    if job.page < 1 || job.page > page_count as i64 {
        return Err(WorkerFailure::decode(format!(
            "page {} out of range (document has {} pages)",
            job.page, page_count
        )));
    }

    let page = doc
        .load_page((job.page - 1) as i32)
        .map_err(|e| WorkerFailure::decode(format!("failed to load page {}: {}", job.page, e)))?;

    let matrix = Matrix::new_scale(job.scale, job.scale);
    let colorspace = Colorspace::device_rgb();
    let pixmap = page
        .to_pixmap(&matrix, &colorspace, true, true)
        .map_err(|e| WorkerFailure::decode(format!("failed to render page {}: {}", job.page, e)))?;

    encode_pixmap_png(&pixmap)
        .map_err(|e| WorkerFailure::internal(format!("PNG encoding failed: {}", e)))
}

/// Stdio protocol loop: one job line, then document bytes to EOF.
pub fn run() -> ExitCode {
    let stdin = std::io::stdin();
    let mut reader = BufReader::new(stdin.lock());

    let result = read_job(&mut reader).and_then(|(job, pdf)| rasterize(&pdf, &job));

    match result {
        Ok(png) => {
            let mut stdout = std::io::stdout().lock();
            if stdout.write_all(&png).and_then(|_| stdout.flush()).is_err() {
                // Parent went away; nothing left to report to.
                return ExitCode::from(1);
            }
            ExitCode::SUCCESS
        }
        Err(failure) => {
            let line = serde_json::to_string(&failure)
                .unwrap_or_else(|_| r#"{"kind":"internal","message":"unreportable"}"#.to_string());
            eprintln!("{}", line);
            match failure.kind {
                FailureKind::Decode => ExitCode::from(2),
                FailureKind::Internal => ExitCode::from(1),
            }
        }
    }
}

fn read_job<R: BufRead>(reader: &mut R) -> Result<(RasterJob, Vec<u8>), WorkerFailure> {
    let mut header = String::new();
    reader
        .read_line(&mut header)
        .map_err(|e| WorkerFailure::internal(format!("failed to read job header: {}", e)))?;
    let job: RasterJob = serde_json::from_str(header.trim())
        .map_err(|e| WorkerFailure::internal(format!("invalid job header: {}", e)))?;

    let mut pdf = Vec::new();
    reader
        .read_to_end(&mut pdf)
        .map_err(|e| WorkerFailure::internal(format!("failed to read document bytes: {}", e)))?;
    if pdf.is_empty() {
        return Err(WorkerFailure::decode("empty document"));
    }

    Ok((job, pdf))
}

/// Convert a MuPDF pixmap into PNG bytes via an RGBA buffer.
fn encode_pixmap_png(pixmap: &mupdf::Pixmap) -> Result<Vec<u8>, String> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize;

    let mut rgba_buffer = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height as usize {
        for x in 0..width as usize {
            let offset = (y * width as usize + x) * n;
            let r = samples.get(offset).copied().unwrap_or(0);
            let g = samples.get(offset + 1).copied().unwrap_or(0);
            let b = samples.get(offset + 2).copied().unwrap_or(0);
            let a = if n >= 4 {
                samples.get(offset + 3).copied().unwrap_or(255)
            } else {
                255
            };
            rgba_buffer.extend_from_slice(&[r, g, b, a]);
        }
    }

    let img = image::RgbaImage::from_raw(width, height, rgba_buffer)
        .ok_or_else(|| "failed to create image buffer".to_string())?;

    let mut output = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut output), image::ImageFormat::Png)
        .map_err(|e| e.to_string())?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_job_splits_header_and_body() {
        let mut input: Vec<u8> = b"{\"page\":3,\"scale\":3.6}\n".to_vec();
        input.extend_from_slice(b"%PDF-1.4 fake body");
        let (job, pdf) = read_job(&mut std::io::Cursor::new(input)).unwrap();
        assert_eq!(job.page, 3);
        assert_eq!(pdf, b"%PDF-1.4 fake body");
    }

    #[test]
    fn empty_body_is_a_decode_failure() {
        let input: Vec<u8> = b"{\"page\":1,\"scale\":1.0}\n".to_vec();
        let err = read_job(&mut std::io::Cursor::new(input)).unwrap_err();
        assert_eq!(err.kind, FailureKind::Decode);
    }

    #[test]
    fn bad_header_is_an_internal_failure() {
        let input: Vec<u8> = b"not json\nrest".to_vec();
        let err = read_job(&mut std::io::Cursor::new(input)).unwrap_err();
        assert_eq!(err.kind, FailureKind::Internal);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let job = RasterJob { page: 1, scale: 1.0 };
        let err = rasterize(b"this is not a pdf", &job).unwrap_err();
        assert_eq!(err.kind, FailureKind::Decode);
    }
}
