/// Hidden character count implied by a redaction width, calibrated on a
/// reference box of known text length.
///
/// Rounds half away from zero (`f64::round`). Negative or zero widths pass
/// through unclamped. A zero-length reference, or one whose per-character
/// width is zero or not finite, yields 0.
pub fn estimate_hidden_length(
    redaction_width: f64,
    reference_width: f64,
    reference_text_length: usize,
) -> i64 {
    if reference_text_length == 0 {
        return 0;
    }
    let avg_char_width = average_char_width(reference_width, reference_text_length);
    if avg_char_width == 0.0 || !avg_char_width.is_finite() {
        return 0;
    }
    let estimate = (redaction_width / avg_char_width).round();
    if estimate.is_finite() {
        estimate as i64
    } else {
        0
    }
}

pub fn average_char_width(reference_width: f64, reference_text_length: usize) -> f64 {
    if reference_text_length == 0 {
        return 0.0;
    }
    reference_width / reference_text_length as f64
}
