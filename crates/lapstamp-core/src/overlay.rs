//! Burns the timestamp string into frame pixels.

use ab_glyph::{FontVec, PxScale};
use anyhow::{bail, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use tracing::{info, warn};

use crate::config::OverlayConfig;

/// Glyph height in pixels at `scale_factor` 1.0.
const BASE_TEXT_PX: f32 = 24.0;

/// Well-known locations of a sans-serif face, tried in order.
const FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Timestamp renderer with style resolved once per run.
///
/// The configured origin is relative to the bottom-left corner of the frame;
/// the draw primitive wants top-left coordinates, so the y axis is flipped
/// here at construction rather than per frame.
pub struct Overlay {
    font: FontVec,
    origin: (i32, i32),
    scale: PxScale,
    color: Rgb<u8>,
    stroke_radius: i32,
}

impl Overlay {
    pub fn new(config: &OverlayConfig, frame_height: u32) -> Result<Self> {
        let font = load_font()?;
        let origin = translate_origin(config.origin_px, frame_height);
        let scale = PxScale::from(BASE_TEXT_PX * config.scale_factor);
        let color = Rgb(config.color_rgb_uint8);

        info!(
            ?origin,
            scale = scale.y,
            color = ?config.color_rgb_uint8,
            thickness = config.thickness_px,
            "overlay style resolved"
        );

        Ok(Self {
            font,
            origin,
            scale,
            color,
            stroke_radius: (config.thickness_px / 2) as i32,
        })
    }

    /// Draw `text` into the frame at the resolved origin.
    ///
    /// The draw primitive has no stroke-width parameter, so thickness is
    /// emulated by re-stroking the glyphs at one-pixel offsets.
    pub fn stamp(&self, image: &mut RgbImage, text: &str) {
        let (x, y) = self.origin;
        let r = self.stroke_radius;
        for dy in -r..=r {
            for dx in -r..=r {
                draw_text_mut(image, self.color, x + dx, y + dy, self.scale, &self.font, text);
            }
        }
    }
}

/// Flip a bottom-left-relative origin to top-left pixel coordinates.
pub fn translate_origin(origin_px: [i32; 2], frame_height: u32) -> (i32, i32) {
    (origin_px[0], frame_height as i32 - origin_px[1] + 1)
}

fn load_font() -> Result<FontVec> {
    for path in FONT_PATHS {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(_) => continue,
        };
        match FontVec::try_from_vec(data) {
            Ok(font) => {
                info!(path, "loaded overlay font");
                return Ok(font);
            }
            Err(e) => {
                warn!(path, %e, "failed to parse font file");
            }
        }
    }
    bail!("no usable sans-serif font found (tried {FONT_PATHS:?})");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_flips_to_top_left() {
        // Frame height H, configured (x, y) -> draw origin (x, H - y + 1).
        assert_eq!(translate_origin([25, 25], 1080), (25, 1056));
        assert_eq!(translate_origin([0, 1], 100), (0, 100));
        assert_eq!(translate_origin([10, 100], 100), (10, 1));
    }

    #[test]
    fn stamp_marks_pixels_near_origin() {
        let config = OverlayConfig {
            origin_px: [5, 55],
            scale_factor: 1.0,
            color_rgb_uint8: [255, 0, 0],
            thickness_px: 1,
        };
        let Ok(overlay) = Overlay::new(&config, 60) else {
            eprintln!("no system font available, skipping");
            return;
        };

        let mut image = RgbImage::from_pixel(120, 60, Rgb([0, 0, 0]));
        overlay.stamp(&mut image, "00:01:30");

        let stamped = image.pixels().filter(|p| p.0[0] > 128).count();
        assert!(stamped > 0, "expected red pixels after stamping");

        // Everything drawn sits at or below the translated origin row.
        let (_, draw_y) = translate_origin(config.origin_px, 60);
        for (_, y, p) in image.enumerate_pixels() {
            if p.0[0] > 128 {
                assert!((y as i32) >= draw_y);
            }
        }
    }

    #[test]
    fn thickness_spreads_the_stroke() {
        let thin = OverlayConfig {
            origin_px: [5, 55],
            scale_factor: 1.0,
            color_rgb_uint8: [255, 255, 255],
            thickness_px: 1,
        };
        let thick = OverlayConfig {
            thickness_px: 5,
            ..thin.clone()
        };
        let (Ok(a), Ok(b)) = (Overlay::new(&thin, 60), Overlay::new(&thick, 60)) else {
            eprintln!("no system font available, skipping");
            return;
        };

        let mut thin_img = RgbImage::from_pixel(120, 60, Rgb([0, 0, 0]));
        let mut thick_img = thin_img.clone();
        a.stamp(&mut thin_img, "00:00:00");
        b.stamp(&mut thick_img, "00:00:00");

        let lit = |img: &RgbImage| img.pixels().filter(|p| p.0[0] > 128).count();
        assert!(lit(&thick_img) > lit(&thin_img));
    }
}
