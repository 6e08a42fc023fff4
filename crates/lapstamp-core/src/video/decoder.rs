use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use anyhow::{bail, Context, Result};
use image::RgbImage;
use tracing::{debug, error, info, warn};

use super::frame::Frame;

/// Geometry and rate of the first video stream, as reported by ffprobe.
struct SourceInfo {
    width: u32,
    height: u32,
    fps: f64,
}

fn probe(path: &Path) -> Result<SourceInfo> {
    info!(?path, "probing input with ffprobe");

    let output = Command::new("ffprobe")
        .args([
            "-v", "error",
            "-select_streams", "v:0",
            "-show_entries", "stream=width,height,r_frame_rate",
            "-of", "csv=p=0",
        ])
        .arg(path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .context("failed to run ffprobe — is ffmpeg installed?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!(%stderr, ?path, "ffprobe failed");
        bail!("ffprobe failed: {stderr}");
    }

    // One csv line: "width,height,num/den"
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut fields = stdout.trim().split(',');
    let (Some(w), Some(h), Some(rate)) = (fields.next(), fields.next(), fields.next()) else {
        error!(%stdout, "unexpected ffprobe output, expected width,height,fps");
        bail!("unexpected ffprobe output: {stdout}");
    };

    let width: u32 = w.parse().context("failed to parse width")?;
    let height: u32 = h.parse().context("failed to parse height")?;
    let fps = parse_frame_rate(rate).with_context(|| format!("bad frame rate {rate:?}"))?;

    if fps <= 0.0 {
        warn!(fps, ?path, "source reports a non-positive frame rate");
    }

    info!(width, height, fps, "probe completed");
    Ok(SourceInfo { width, height, fps })
}

/// ffprobe reports `r_frame_rate` as a rational like "30000/1001".
fn parse_frame_rate(rate: &str) -> Result<f64> {
    let Some((num, den)) = rate.split_once('/') else {
        return rate.parse::<f64>().map_err(Into::into);
    };
    let num: f64 = num.parse()?;
    let den: f64 = den.parse()?;
    Ok(if den > 0.0 { num / den } else { 0.0 })
}

/// Decodes video frames by piping raw RGB24 data out of the ffmpeg CLI.
///
/// Frames come out forward-only and exactly once, numbered from zero.
/// Container timestamps are not surfaced: elapsed time is the caller's
/// business, derived from the frame number and a fixed interval.
pub struct VideoDecoder {
    child: Child,
    width: u32,
    height: u32,
    fps: f64,
    next_frame_number: u64,
    frame_bytes: usize,
}

impl VideoDecoder {
    /// Open a video file and start decoding its first video stream.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("input video does not exist: {}", path.display());
        }

        let info = probe(path)?;
        if info.width == 0 || info.height == 0 {
            bail!("invalid video dimensions: {}x{}", info.width, info.height);
        }

        let child = Command::new("ffmpeg")
            .arg("-i")
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-v", "error", "pipe:1"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("failed to spawn ffmpeg — is ffmpeg installed?")?;

        let frame_bytes = (info.width as usize) * (info.height as usize) * 3;

        info!(
            ?path,
            width = info.width,
            height = info.height,
            fps = info.fps,
            frame_bytes,
            "video decoder opened"
        );

        Ok(Self {
            child,
            width: info.width,
            height: info.height,
            fps: info.fps,
            next_frame_number: 0,
            frame_bytes,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Source frame rate, used only to preserve playback speed on the output.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Read the next frame from the pipe, or `None` once the video is done.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        let stdout = self
            .child
            .stdout
            .as_mut()
            .context("ffmpeg stdout not available")?;

        let mut buf = vec![0u8; self.frame_bytes];
        let mut filled = 0;

        while filled < self.frame_bytes {
            match stdout.read(&mut buf[filled..]) {
                Ok(0) if filled == 0 => {
                    info!(total_frames = self.next_frame_number, "video stream ended");
                    return Ok(None);
                }
                Ok(0) => {
                    error!(
                        read_bytes = filled,
                        expected_bytes = self.frame_bytes,
                        frame = self.next_frame_number,
                        "ffmpeg stream ended mid-frame"
                    );
                    bail!(
                        "ffmpeg stream ended mid-frame (read {filled}/{} bytes)",
                        self.frame_bytes,
                    );
                }
                Ok(n) => filled += n,
                Err(e) => {
                    error!(frame = self.next_frame_number, %e, "failed to read from ffmpeg pipe");
                    return Err(e).context("failed to read from ffmpeg pipe");
                }
            }
        }

        let image = RgbImage::from_raw(self.width, self.height, buf)
            .context("failed to create RgbImage from raw frame data")?;

        let frame_number = self.next_frame_number;
        self.next_frame_number += 1;

        debug!(frame_number, "decoded frame");

        Ok(Some(Frame {
            image,
            frame_number,
        }))
    }
}

impl Drop for VideoDecoder {
    fn drop(&mut self) {
        info!(total_frames = self.next_frame_number, "closing video decoder");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
