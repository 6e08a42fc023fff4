use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::config::OverlayConfig;
use crate::overlay::Overlay;
use crate::timestamp::format_elapsed;
use crate::video::decoder::VideoDecoder;
use crate::video::encoder::VideoEncoder;

/// Parameters for one transcoding run.
pub struct RunConfig {
    /// Wall clock seconds represented by each successive frame.
    pub interval_seconds: f64,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Stop after this many frames, or None for the entire video.
    pub max_frames: Option<u64>,
}

/// Derive the default output path: `clip.mov` becomes `clip-timestamped.mov`
/// in the same directory. The base name is the stem up to its first dot.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let base = stem.split('.').next().unwrap_or(stem);
    let name = match input.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{base}-timestamped.{ext}"),
        None => format!("{base}-timestamped"),
    };
    input.with_file_name(name)
}

/// Run the decode, stamp, encode pipeline over the whole input.
///
/// Strictly sequential: each frame is decoded, stamped with its elapsed
/// time, and handed to the encoder before the next is fetched. Returns the
/// number of frames written. Both containers are closed on every exit path;
/// only a clean run drains the encoder.
pub fn run(overlay_config: &OverlayConfig, run: &RunConfig) -> Result<u64> {
    if run.interval_seconds <= 0.0 {
        bail!("frame interval must be positive, got {}", run.interval_seconds);
    }

    info!(
        input = ?run.input,
        output = ?run.output,
        interval_seconds = run.interval_seconds,
        max_frames = ?run.max_frames,
        "pipeline starting"
    );

    let mut decoder = VideoDecoder::open(&run.input).context("failed to open input video")?;
    let overlay = Overlay::new(overlay_config, decoder.height())
        .context("failed to prepare timestamp overlay")?;
    let mut encoder =
        VideoEncoder::create(&run.output, decoder.width(), decoder.height(), decoder.fps())
            .context("failed to open output video")?;

    let mut written: u64 = 0;
    loop {
        if let Some(max) = run.max_frames {
            if written >= max {
                info!(max_frames = max, "frame cutoff reached");
                break;
            }
        }

        let Some(mut frame) = decoder.next_frame()? else {
            break;
        };

        let timestamp = format_elapsed(frame.frame_number, run.interval_seconds);
        debug!(frame_number = frame.frame_number, %timestamp, "stamping frame");

        overlay.stamp(&mut frame.image, &timestamp);
        encoder.write_frame(&frame.image)?;
        written += 1;
    }

    encoder.finish().context("failed to flush output video")?;

    info!(frames = written, output = ?run.output, "pipeline complete");
    Ok(written)
}
