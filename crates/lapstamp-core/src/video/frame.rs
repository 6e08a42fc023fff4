use image::RgbImage;

/// A single decoded video frame.
pub struct Frame {
    /// Interleaved RGB pixel data.
    pub image: RgbImage,
    /// Position in the source, 0-based and strictly increasing.
    pub frame_number: u64,
}
