//! Sandboxed rasterization pool
//!
//! Untrusted PDF bytes are decoded in a separate `page-worker` process with
//! a supervised lifecycle: spawn, send job, await result under a wall-clock
//! timeout, reap. The child is spawned with `kill_on_drop`, so cancellation
//! (client disconnect) and timeout both terminate it; the active-sandbox
//! counter is decremented by an RAII guard on every exit path.
//!
//! A semaphore bounds how many workers may be live at once, so a burst of
//! page requests cannot exhaust the host.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::time::timeout;

use super::protocol::{FailureKind, RasterJob, WorkerFailure};
use super::RenderError;

/// Shared pool of render sandboxes.
#[derive(Clone)]
pub struct SandboxPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    worker: PathBuf,
    render_timeout: Duration,
    capacity: usize,
    semaphore: Semaphore,
    /// Workers currently live (spawned, not yet reaped or killed).
    active: AtomicUsize,
    /// Workers ever spawned, for tests and operability.
    launched: AtomicUsize,
}

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy)]
pub struct SandboxStats {
    pub active: usize,
    pub launched: usize,
    pub capacity: usize,
}

impl SandboxPool {
    pub fn new(worker: impl Into<PathBuf>, render_timeout: Duration, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(PoolInner {
                worker: worker.into(),
                render_timeout,
                capacity,
                semaphore: Semaphore::new(capacity),
                active: AtomicUsize::new(0),
                launched: AtomicUsize::new(0),
            }),
        }
    }

    /// Sibling of the running server binary, the layout `cargo build`
    /// and the release bundle both produce.
    pub fn default_worker_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_default()
            .join("page-worker")
    }

    pub fn stats(&self) -> SandboxStats {
        SandboxStats {
            active: self.inner.active.load(Ordering::SeqCst),
            launched: self.inner.launched.load(Ordering::SeqCst),
            capacity: self.inner.capacity,
        }
    }

    /// Rasterize one page in a fresh worker process. Returns PNG bytes.
    pub async fn rasterize(&self, pdf: Vec<u8>, job: &RasterJob) -> Result<Vec<u8>, RenderError> {
        let _permit = self
            .inner
            .semaphore
            .acquire()
            .await
            .map_err(|_| RenderError::Sandbox("render pool is shut down".to_string()))?;

        let mut child = Command::new(&self.inner.worker)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                RenderError::Sandbox(format!(
                    "failed to spawn worker {}: {}",
                    self.inner.worker.display(),
                    e
                ))
            })?;

        self.inner.launched.fetch_add(1, Ordering::SeqCst);
        let _guard = ActiveGuard::arm(&self.inner.active);

        // Feed the job header and the document, then close stdin so the
        // worker sees EOF. Write errors mean the child died early; the exit
        // status below carries the real failure.
        if let Some(mut stdin) = child.stdin.take() {
            let mut header = serde_json::to_vec(job)
                .map_err(|e| RenderError::Sandbox(format!("job serialization failed: {}", e)))?;
            header.push(b'\n');
            let _ = stdin.write_all(&header).await;
            let _ = stdin.write_all(&pdf).await;
            let _ = stdin.shutdown().await;
        }

        // On timeout the wait future is dropped, which drops the child and
        // kills it (kill_on_drop). The same applies when the whole request
        // future is dropped because the client went away.
        let output = match timeout(self.inner.render_timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(RenderError::Sandbox(format!("failed to reap worker: {}", e))),
            Err(_) => {
                tracing::warn!(
                    "render sandbox exceeded {}s, killing worker",
                    self.inner.render_timeout.as_secs()
                );
                return Err(RenderError::Timeout(self.inner.render_timeout.as_secs()));
            }
        };

        if output.status.success() {
            if output.stdout.is_empty() {
                return Err(RenderError::Sandbox(
                    "worker exited cleanly without producing an image".to_string(),
                ));
            }
            return Ok(output.stdout);
        }

        Err(classify_failure(&output.status, &output.stderr))
    }
}

/// Decrements the active counter no matter how the render ends.
struct ActiveGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> ActiveGuard<'a> {
    fn arm(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

fn classify_failure(status: &std::process::ExitStatus, stderr: &[u8]) -> RenderError {
    let first_line = stderr
        .split(|&b| b == b'\n')
        .next()
        .unwrap_or_default();

    if let Ok(failure) = serde_json::from_slice::<WorkerFailure>(first_line) {
        return match failure.kind {
            FailureKind::Decode => RenderError::Decode(failure.message),
            FailureKind::Internal => RenderError::Sandbox(failure.message),
        };
    }

    let noise = String::from_utf8_lossy(first_line);
    RenderError::Sandbox(format!(
        "worker terminated abnormally ({}): {}",
        status,
        noise.chars().take(200).collect::<String>()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_start_at_baseline() {
        let pool = SandboxPool::new("/nonexistent/page-worker", Duration::from_secs(15), 4);
        let stats = pool.stats();
        assert_eq!(stats.active, 0);
        assert_eq!(stats.launched, 0);
        assert_eq!(stats.capacity, 4);
    }

    #[test]
    fn capacity_floor_is_one() {
        let pool = SandboxPool::new("/nonexistent/page-worker", Duration::from_secs(15), 0);
        assert_eq!(pool.stats().capacity, 1);
    }

    #[tokio::test]
    async fn missing_worker_is_a_sandbox_error() {
        let pool = SandboxPool::new("/nonexistent/page-worker", Duration::from_secs(1), 1);
        let job = RasterJob { page: 1, scale: 1.0 };
        let err = pool.rasterize(b"%PDF-".to_vec(), &job).await.unwrap_err();
        assert!(matches!(err, RenderError::Sandbox(_)));
        assert_eq!(pool.stats().active, 0);
        assert_eq!(pool.stats().launched, 0);
    }

    #[test]
    fn decode_failures_are_classified() {
        // Simulated worker exit: status comes from a real quick process.
        let status = std::process::Command::new("false").status().unwrap();
        let line = serde_json::to_vec(&WorkerFailure::decode("page 9 out of range")).unwrap();
        assert!(matches!(
            classify_failure(&status, &line),
            RenderError::Decode(_)
        ));
    }

    #[test]
    fn garbage_stderr_is_a_sandbox_failure() {
        let status = std::process::Command::new("false").status().unwrap();
        assert!(matches!(
            classify_failure(&status, b"segfault or whatever"),
            RenderError::Sandbox(_)
        ));
    }
}
