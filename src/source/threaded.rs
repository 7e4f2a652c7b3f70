use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};

use crate::foundation::core::{CanvasGeometry, Frame, PixelRect};
use crate::foundation::error::{TurntableError, TurntableResult};
use crate::source::surface::RasterSource;

enum RenderCommand {
    Rotate(f64),
    Snapshot(PixelRect, Sender<TurntableResult<Frame>>),
    Shutdown,
}

/// Runs a [`RasterSource`] on a dedicated render thread.
///
/// `set_rotation` only posts the new angle; the render thread applies it and redraws on its own
/// schedule. Snapshots are served in command order, after every rotation posted before them.
pub struct ThreadedSource {
    geometry: CanvasGeometry,
    commands: Sender<RenderCommand>,
    alive: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ThreadedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadedSource")
            .field("geometry", &self.geometry)
            .field("alive", &self.alive.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl ThreadedSource {
    /// Move `source` onto a new render thread.
    pub fn spawn<S>(source: S) -> TurntableResult<Self>
    where
        S: RasterSource + Send + 'static,
    {
        let geometry = source.dimensions().ok_or_else(|| {
            TurntableError::source_unavailable("render surface has no dimensions")
        })?;
        let (tx, rx) = unbounded();
        let alive = Arc::new(AtomicBool::new(true));
        let worker_alive = Arc::clone(&alive);

        let worker = std::thread::Builder::new()
            .name("turntable-render".to_string())
            .spawn(move || {
                let _alive = AliveFlag(worker_alive);
                render_loop(source, rx);
            })
            .map_err(|e| {
                TurntableError::source_unavailable(format!("failed to spawn render thread: {e}"))
            })?;

        Ok(Self {
            geometry,
            commands: tx,
            alive,
            worker: Some(worker),
        })
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn send(&self, cmd: RenderCommand) -> TurntableResult<()> {
        self.commands
            .send(cmd)
            .map_err(|_| TurntableError::source_unavailable("render thread has exited"))
    }
}

impl RasterSource for ThreadedSource {
    fn dimensions(&self) -> Option<CanvasGeometry> {
        self.is_alive().then_some(self.geometry)
    }

    fn set_rotation(&mut self, angle: f64) -> TurntableResult<()> {
        self.send(RenderCommand::Rotate(angle))
    }

    fn snapshot_pixels(&mut self, rect: PixelRect) -> TurntableResult<Frame> {
        let (reply_tx, reply_rx) = bounded(1);
        self.send(RenderCommand::Snapshot(rect, reply_tx))?;
        reply_rx.recv().map_err(|_| {
            TurntableError::source_unavailable("render thread exited before presenting a frame")
        })?
    }
}

impl Drop for ThreadedSource {
    fn drop(&mut self) {
        let _ = self.commands.send(RenderCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

struct AliveFlag(Arc<AtomicBool>);

impl Drop for AliveFlag {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn render_loop<S: RasterSource>(mut source: S, rx: Receiver<RenderCommand>) {
    let mut failed: Option<TurntableError> = None;
    let mut queued: Option<RenderCommand> = None;
    loop {
        let cmd = match queued.take() {
            Some(cmd) => cmd,
            None => match rx.recv() {
                Ok(cmd) => cmd,
                Err(_) => return,
            },
        };
        match cmd {
            RenderCommand::Rotate(mut angle) => {
                // Only the newest queued rotation is worth drawing.
                while let Ok(next) = rx.try_recv() {
                    if let RenderCommand::Rotate(a) = next {
                        angle = a;
                    } else {
                        queued = Some(next);
                        break;
                    }
                }
                failed = source.set_rotation(angle).err();
                if let Some(e) = &failed {
                    tracing::warn!(error = %e, "render thread failed to apply rotation");
                }
            }
            RenderCommand::Snapshot(rect, reply) => {
                let result = match failed.take() {
                    Some(e) => Err(e),
                    None => source.snapshot_pixels(rect),
                };
                let _ = reply.send(result);
            }
            RenderCommand::Shutdown => return,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/threaded.rs"]
mod tests;
