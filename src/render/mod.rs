//! Page render pipeline
//!
//! Orchestrated per request: access check, sandboxed rasterization of the
//! requested page, watermark compositing, PNG encoding. The rasterizer runs
//! untrusted PDF bytes in a separate supervised process (see
//! [`sandbox::SandboxPool`]); everything after that operates on our own
//! bitmap and stays in-process on the blocking thread pool.

pub mod access;
pub mod protocol;
pub mod sandbox;
pub mod watermark;
pub mod worker;

use std::io::Cursor;

use thiserror::Error;

use protocol::RasterJob;
use sandbox::SandboxPool;
use watermark::Watermarker;

/// Failures inside the render pipeline.
///
/// All variants surface to callers as a generic rendering failure; the
/// distinction matters for server-side logs and tests.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The byte stream is not a valid document or the page does not exist.
    #[error("Failed to decode document: {0}")]
    Decode(String),

    /// The sandboxed render exceeded its wall-clock bound.
    #[error("Render timed out after {0}s")]
    Timeout(u64),

    /// The sandbox crashed or misbehaved.
    #[error("Render sandbox failure: {0}")]
    Sandbox(String),
}

/// Geometry applied to every render, independent of source page size.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub scale: f32,
    pub device_scale: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: 1.8,
            device_scale: 2.0,
        }
    }
}

impl RenderOptions {
    /// Effective raster scale handed to the worker.
    pub fn effective_scale(&self) -> f32 {
        self.scale * self.device_scale
    }
}

/// Rasterizer + compositor, shared across requests.
pub struct Renderer {
    pool: SandboxPool,
    watermarker: Watermarker,
    options: RenderOptions,
}

impl Renderer {
    pub fn new(pool: SandboxPool, options: RenderOptions) -> Self {
        Self {
            pool,
            watermarker: Watermarker::new(),
            options,
        }
    }

    pub fn pool(&self) -> &SandboxPool {
        &self.pool
    }

    /// Render one page of `pdf` and stamp `label` over it.
    ///
    /// `page` is 1-based and must already be clamped by the caller.
    pub async fn render_page(
        &self,
        pdf: Vec<u8>,
        page: i64,
        label: String,
    ) -> Result<Vec<u8>, RenderError> {
        let job = RasterJob {
            page,
            scale: self.options.effective_scale(),
        };

        let png = self.pool.rasterize(pdf, &job).await?;

        // The bitmap is our own worker's output from here on; stamping and
        // re-encoding are CPU-bound, so keep them off the async runtime.
        let watermarker = self.watermarker.clone();
        tokio::task::spawn_blocking(move || {
            let mut bitmap = image::load_from_memory(&png)
                .map_err(|e| RenderError::Sandbox(format!("worker produced invalid image: {}", e)))?
                .into_rgba8();

            watermarker.stamp(&mut bitmap, &label);

            let mut out = Vec::new();
            image::DynamicImage::ImageRgba8(bitmap)
                .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
                .map_err(|e| RenderError::Sandbox(format!("PNG encoding failed: {}", e)))?;
            Ok(out)
        })
        .await
        .map_err(|e| RenderError::Sandbox(format!("task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_scale_combines_both_factors() {
        let options = RenderOptions::default();
        assert!((options.effective_scale() - 3.6).abs() < f32::EPSILON);
    }
}
