use crate::sources::LooseValue;

/// Parses a decorated numeric cell (`"$1,234.50"`, `" 12 "`, `42`).
///
/// Currency symbols, thousands separators and whitespace are stripped, then
/// the longest numeric prefix is read. Absent, `"null"` or unparseable input
/// yields 0; the result is always finite.
pub fn numeric_value(raw: Option<&LooseValue>) -> f64 {
    parse_loose(raw, false)
}

/// Like [`numeric_value`], additionally stripping a percent sign (`"12.3%"`).
pub fn percent_value(raw: Option<&LooseValue>) -> f64 {
    parse_loose(raw, true)
}

/// Parses a bare string with the same rules as [`numeric_value`].
pub fn parse_numeric(text: &str) -> f64 {
    parse_text(text, false)
}

/// Parses a bare string with the same rules as [`percent_value`].
pub fn parse_percent(text: &str) -> f64 {
    parse_text(text, true)
}

fn parse_loose(raw: Option<&LooseValue>, strip_percent: bool) -> f64 {
    match raw {
        Some(LooseValue::Number(number)) => finite_or_zero(*number),
        Some(LooseValue::Text(text)) => parse_text(text, strip_percent),
        Some(LooseValue::Flag(_)) | Some(LooseValue::Null) | None => 0.0,
    }
}

fn parse_text(text: &str, strip_percent: bool) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| {
            !(c.is_whitespace()
                || matches!(c, '$' | ',' | '€' | '£')
                || (strip_percent && *c == '%'))
        })
        .collect();
    if cleaned.is_empty() || cleaned.eq_ignore_ascii_case("null") {
        return 0.0;
    }
    leading_float(&cleaned)
        .and_then(|prefix| prefix.parse::<f64>().ok())
        .map(finite_or_zero)
        .unwrap_or(0.0)
}

// Longest prefix shaped like `[+-]digits[.digits][e[+-]digits]`.
fn leading_float(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut end = 0usize;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    Some(&text[..end])
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Per-post counters shared by campaign posts and organic analytics posts.
pub trait EngagementSample {
    fn views(&self) -> f64;
    fn likes(&self) -> f64;
    fn comments(&self) -> f64;
    fn shares(&self) -> f64;

    fn engagements(&self) -> f64 {
        self.likes() + self.comments() + self.shares()
    }
}

impl<T: EngagementSample + ?Sized> EngagementSample for &T {
    fn views(&self) -> f64 {
        (**self).views()
    }

    fn likes(&self) -> f64 {
        (**self).likes()
    }

    fn comments(&self) -> f64 {
        (**self).comments()
    }

    fn shares(&self) -> f64 {
        (**self).shares()
    }

    fn engagements(&self) -> f64 {
        (**self).engagements()
    }
}

pub fn total_impressions<S: EngagementSample>(samples: &[S]) -> f64 {
    samples.iter().map(EngagementSample::views).sum()
}

pub fn total_engagements<S: EngagementSample>(samples: &[S]) -> f64 {
    samples.iter().map(EngagementSample::engagements).sum()
}

/// Sum of likes, comments and shares over sum of views, as a percentage.
pub fn engagement_rate<S: EngagementSample>(samples: &[S]) -> f64 {
    ratio(total_engagements(samples), total_impressions(samples)) * 100.0
}

pub fn cost_per_engagement<S: EngagementSample>(samples: &[S], total_spend: f64) -> f64 {
    if total_spend <= 0.0 {
        return 0.0;
    }
    ratio(total_spend, total_engagements(samples))
}

pub fn cost_per_thousand_views<S: EngagementSample>(samples: &[S], total_spend: f64) -> f64 {
    if total_spend <= 0.0 {
        return 0.0;
    }
    ratio(total_spend, total_impressions(samples)) * 1000.0
}

/// `numerator / denominator`, or 0 when the denominator is not positive.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    finite_or_zero(numerator / denominator)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
