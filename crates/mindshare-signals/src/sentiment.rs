//! The one sentiment classifier every component labels with.

use mindshare_core::SentimentLabel;

/// Magnitudes at or below this are read as a `[-1, 1]` score.
const UNIT_SCALE_MAX: f64 = 1.2;
const UNIT_POSITIVE: f64 = 0.1;
const UNIT_NEGATIVE: f64 = -0.1;
const PERCENT_POSITIVE: f64 = 66.0;
const PERCENT_NEGATIVE: f64 = 33.0;

/// Map a raw provider score to a label.
///
/// Providers disagree on scale, so the magnitude picks one: `|v| <= 1.2` is a
/// `[-1, 1]` score with a ±0.1 neutral band, anything larger is a `[0, 100]`
/// score with thresholds at 33 and 66. Missing or NaN is neutral.
#[must_use]
pub fn classify(value: Option<f64>) -> SentimentLabel {
    let Some(v) = value.filter(|v| !v.is_nan()) else {
        return SentimentLabel::Neutral;
    };

    if v.abs() <= UNIT_SCALE_MAX {
        if v > UNIT_POSITIVE {
            SentimentLabel::Positive
        } else if v < UNIT_NEGATIVE {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    } else if v >= PERCENT_POSITIVE {
        SentimentLabel::Positive
    } else if v <= PERCENT_NEGATIVE {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}
