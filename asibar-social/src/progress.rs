//! Progress-bar rendering for coverage posts.

pub const FULL_GLYPH: char = '▓';
pub const EMPTY_GLYPH: char = '░';
/// Nominal bar width in glyphs. Ratios above 1 produce longer bars.
pub const BAR_WIDTH: usize = 20;
/// Longest bar ever drawn: one tweet's worth of glyphs.
pub const MAX_BAR_GLYPHS: usize = 280;
const PERCENT_SIGNIFICANT_DIGITS: usize = 4;

/// Render `ratio` as `<bar> %<percentage>`, Turkish style.
///
/// The percentage has four significant digits and a decimal comma, and the percent
/// sign goes in front of the number.
///
/// ```
/// use asibar_social::format_progress;
///
/// assert_eq!(format_progress(0.5), "▓▓▓▓▓▓▓▓▓▓░░░░░░░░░░ %50,00");
/// ```
pub fn format_progress(ratio: f64) -> String {
    let bar = render_bar(filled_segments(ratio));
    let percentage =
        format_significant(ratio * 100.0, PERCENT_SIGNIFICANT_DIGITS).replace('.', ",");
    let text = format!("{bar} %{percentage}");
    tracing::debug!(ratio, %text, "progress.rendered");
    text
}

fn filled_segments(ratio: f64) -> usize {
    let full = (ratio * BAR_WIDTH as f64).floor();
    if full.is_finite() && full > 0.0 {
        full.min(MAX_BAR_GLYPHS as f64) as usize
    } else {
        0
    }
}

fn render_bar(full: usize) -> String {
    let full = full.min(MAX_BAR_GLYPHS);
    let empty = BAR_WIDTH.saturating_sub(full);
    let mut bar = String::with_capacity((full + empty) * FULL_GLYPH.len_utf8());
    bar.extend(std::iter::repeat_n(FULL_GLYPH, full));
    bar.extend(std::iter::repeat_n(EMPTY_GLYPH, empty));
    bar
}

/// Format `value` with `digits` significant digits, keeping trailing zeros.
///
/// Values whose decimal exponent is below -4 or at least `digits` switch to
/// exponent notation, like C's `%g` (`1.235e+04`, `1.230e-05`).
pub fn format_significant(value: f64, digits: usize) -> String {
    let digits = digits.max(1);
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return format!("{:.*}", digits - 1, 0.0);
    }

    // The exponent has to come from the rounded value: 99.996 rounds to 100.0.
    let scientific = format!("{:.*e}", digits - 1, value);
    let exponent: i32 = scientific
        .rsplit_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);

    if exponent < -4 || exponent >= digits as i32 {
        let mantissa = scientific.split_once('e').map_or(scientific.as_str(), |(m, _)| m);
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
    } else {
        let decimals = (digits as i32 - 1 - exponent) as usize;
        format!("{value:.decimals$}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(full: usize, empty: usize) -> String {
        format!(
            "{}{}",
            FULL_GLYPH.to_string().repeat(full),
            EMPTY_GLYPH.to_string().repeat(empty)
        )
    }

    #[test]
    fn empty_half_and_full() {
        assert_eq!(format_progress(0.0), format!("{} %0,000", bar(0, 20)));
        assert_eq!(format_progress(0.5), format!("{} %50,00", bar(10, 10)));
        assert_eq!(format_progress(1.0), format!("{} %100,0", bar(20, 0)));
    }

    #[test]
    fn partial_segments_round_down() {
        assert_eq!(format_progress(0.1403), format!("{} %14,03", bar(2, 18)));
        assert_eq!(format_progress(0.0499), format!("{} %4,990", bar(0, 20)));
        assert_eq!(format_progress(0.05), format!("{} %5,000", bar(1, 19)));
    }

    #[test]
    fn bar_grows_past_nominal_width() {
        assert_eq!(format_progress(1.5), format!("{} %150,0", bar(30, 0)));
        assert_eq!(format_progress(150.0), format!("{} %1,500e+04", bar(280, 0)));
    }

    #[test]
    fn huge_ratios_are_capped() {
        let text = format_progress(1e30);
        assert_eq!(text, format!("{} %1,000e+32", bar(MAX_BAR_GLYPHS, 0)));
        assert_eq!(render_bar(usize::MAX).chars().count(), MAX_BAR_GLYPHS);
    }

    #[test]
    fn odd_inputs_do_not_panic() {
        assert_eq!(format_progress(-0.1), format!("{} %-10,00", bar(0, 20)));
        assert_eq!(format_progress(f64::NAN), format!("{} %NaN", bar(0, 20)));
        assert_eq!(format_progress(f64::INFINITY), format!("{} %inf", bar(0, 20)));
    }

    #[test]
    fn significant_digits() {
        assert_eq!(format_significant(0.0, 4), "0.000");
        assert_eq!(format_significant(14.03, 4), "14.03");
        assert_eq!(format_significant(99.996, 4), "100.0");
        assert_eq!(format_significant(0.001, 4), "0.001000");
        assert_eq!(format_significant(0.0000123, 4), "1.230e-05");
        assert_eq!(format_significant(12345.6, 4), "1.235e+04");
        assert_eq!(format_significant(-2.5e-120, 2), "-2.5e-120");
    }
}
