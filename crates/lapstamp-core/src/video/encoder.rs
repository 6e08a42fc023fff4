use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};

use anyhow::{bail, Context, Result};
use image::RgbImage;
use tracing::{debug, info, warn};

/// Frame rate used when the source reports a non-positive one.
const FALLBACK_FPS: f64 = 25.0;

/// Encodes frames to an H.264 stream by piping raw RGB24 data into the
/// ffmpeg CLI, which muxes packets in arrival order.
pub struct VideoEncoder {
    child: Child,
    stdin: Option<BufWriter<ChildStdin>>,
    width: u32,
    height: u32,
    frame_bytes: usize,
    frame_count: u64,
    finished: bool,
}

impl VideoEncoder {
    /// Open the output container and create one H.264 video stream of the
    /// given dimensions.
    pub fn create(path: &Path, width: u32, height: u32, fps: f64) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("invalid output dimensions: {width}x{height}");
        }

        let fps = if fps > 0.0 { fps } else { FALLBACK_FPS };

        info!(?path, width, height, fps, "spawning ffmpeg encoder process");

        let mut child = Command::new("ffmpeg")
            .args(["-y", "-f", "rawvideo", "-pix_fmt", "rgb24", "-s"])
            .arg(format!("{width}x{height}"))
            .arg("-r")
            .arg(format!("{fps}"))
            .args([
                "-i", "pipe:0",
                "-c:v", "libx264",
                "-pix_fmt", "yuv420p",
                "-v", "error",
            ])
            .arg(path)
            .stdin(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("failed to spawn ffmpeg — is ffmpeg installed?")?;

        let stdin = child
            .stdin
            .take()
            .context("ffmpeg stdin not available")?;

        Ok(Self {
            child,
            stdin: Some(BufWriter::new(stdin)),
            width,
            height,
            frame_bytes: (width as usize) * (height as usize) * 3,
            frame_count: 0,
            finished: false,
        })
    }

    /// Queue one frame for encoding. Frames must arrive in presentation order.
    pub fn write_frame(&mut self, image: &RgbImage) -> Result<()> {
        if image.width() != self.width || image.height() != self.height {
            bail!(
                "frame size {}x{} does not match output stream {}x{}",
                image.width(),
                image.height(),
                self.width,
                self.height,
            );
        }

        let stdin = self
            .stdin
            .as_mut()
            .context("encoder already finished")?;

        debug_assert_eq!(image.as_raw().len(), self.frame_bytes);
        stdin
            .write_all(image.as_raw())
            .with_context(|| format!("failed to write frame {} to ffmpeg pipe", self.frame_count))?;

        debug!(frame_number = self.frame_count, "encoded frame queued");
        self.frame_count += 1;
        Ok(())
    }

    /// Signal end-of-stream, drain buffered packets, and close the container.
    pub fn finish(mut self) -> Result<()> {
        let mut stdin = self.stdin.take().context("encoder already finished")?;

        // Dropping stdin after the flush is the end-of-stream signal.
        stdin.flush().context("failed to flush ffmpeg pipe")?;
        drop(stdin);

        let mut stderr = String::new();
        if let Some(mut pipe) = self.child.stderr.take() {
            let _ = pipe.read_to_string(&mut stderr);
        }

        let status = self
            .child
            .wait()
            .context("failed to wait for ffmpeg encoder")?;
        self.finished = true;

        if !status.success() {
            bail!("ffmpeg encoder exited with {status}: {}", stderr.trim());
        }

        info!(total_frames = self.frame_count, "video encoder closed");
        Ok(())
    }
}

impl Drop for VideoEncoder {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!(
            frames_written = self.frame_count,
            "encoder dropped without finishing, discarding output"
        );
        drop(self.stdin.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
