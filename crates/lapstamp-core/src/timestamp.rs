//! Elapsed-time formatting for timelapse frames.

const HUNDREDTHS_PER_HOUR: u64 = 60 * 60 * 100;
const HUNDREDTHS_PER_MINUTE: u64 = 60 * 100;
const HUNDREDTHS_PER_SECOND: u64 = 100;

/// Format the elapsed wall-clock time of a frame as zero-padded `HH:MM:SS`.
///
/// Elapsed time is `frame_number * interval_seconds`. The value is carried
/// internally in hundredths of a second and truncated toward zero, so
/// `(1, 0.999)` formats as `00:00:00`, not `00:00:01`. Hours of 100 or more
/// simply widen the field.
///
/// Callers guarantee a positive interval; negative inputs are undefined.
pub fn format_elapsed(frame_number: u64, interval_seconds: f64) -> String {
    let elapsed_seconds = frame_number as f64 * interval_seconds;
    let hundredths = (elapsed_seconds * 100.0).trunc() as u64;

    let hours = hundredths / HUNDREDTHS_PER_HOUR;
    let remainder = hundredths % HUNDREDTHS_PER_HOUR;
    let minutes = remainder / HUNDREDTHS_PER_MINUTE;
    let remainder = remainder % HUNDREDTHS_PER_MINUTE;
    let seconds = remainder / HUNDREDTHS_PER_SECOND;

    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_frame_is_zero() {
        assert_eq!(format_elapsed(0, 1.0), "00:00:00");
    }

    #[test]
    fn whole_second_intervals() {
        assert_eq!(format_elapsed(90, 1.0), "00:01:30");
        assert_eq!(format_elapsed(3600, 1.0), "01:00:00");
        assert_eq!(format_elapsed(59, 1.0), "00:00:59");
        assert_eq!(format_elapsed(61, 1.0), "00:01:01");
    }

    #[test]
    fn interval_scales_elapsed_time() {
        // 54000 frames at 2s each = 108000s = 30h exactly.
        assert_eq!(format_elapsed(54000, 2.0), "30:00:00");
        assert_eq!(format_elapsed(4, 0.5), "00:00:02");
    }

    #[test]
    fn fractional_seconds_truncate() {
        assert_eq!(format_elapsed(1, 0.999), "00:00:00");
        assert_eq!(format_elapsed(1, 1.999), "00:00:01");
        assert_eq!(format_elapsed(3, 0.4), "00:00:01");
    }

    #[test]
    fn hours_widen_past_two_digits() {
        // 360000s = 100h. Accepted boundary behavior: the field widens.
        assert_eq!(format_elapsed(360000, 1.0), "100:00:00");
    }
}
