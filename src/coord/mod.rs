#![forbid(unsafe_code)]

//! Degrees-minutes-seconds text as used by GNIS records and command scripts.
//!
//! Latitudes are written `DDMMSSH` with `H` one of `N`/`S`; longitudes are
//! `DDDMMSSH` with `H` one of `E`/`W`. Both convert to signed arc-seconds where
//! south and west are negative.

use std::fmt;

/// Errors produced while parsing DMS coordinate text.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordError {
    /// Empty text or `Unknown`.
    #[error("coordinate is missing")]
    Missing,
    /// Wrong number of characters for the axis.
    #[error("{axis} `{text}` must be {expected} characters")]
    Length {
        /// Axis being parsed.
        axis: Axis,
        /// Text as written.
        text: String,
        /// Required length.
        expected: usize,
    },
    /// Degrees, minutes or seconds are not all digits.
    #[error("{axis} `{text}` has non-digit degrees, minutes or seconds")]
    Digits {
        /// Axis being parsed.
        axis: Axis,
        /// Text as written.
        text: String,
    },
    /// Hemisphere letter does not fit the axis.
    #[error("{axis} `{text}` has unknown hemisphere `{found}`")]
    Hemisphere {
        /// Axis being parsed.
        axis: Axis,
        /// Text as written.
        text: String,
        /// Letter found.
        found: char,
    },
    /// Minutes or seconds of 60 or more, or degrees past the pole or antimeridian.
    #[error("{axis} `{text}` is out of range")]
    OutOfRange {
        /// Axis being parsed.
        axis: Axis,
        /// Text as written.
        text: String,
    },
}

/// Which of the two coordinate axes a value belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Axis {
    /// North/south, `y`.
    Latitude,
    /// East/west, `x`.
    Longitude,
}

impl Axis {
    fn degree_digits(self) -> usize {
        match self {
            Axis::Latitude => 2,
            Axis::Longitude => 3,
        }
    }

    fn max_degrees(self) -> i64 {
        match self {
            Axis::Latitude => 90,
            Axis::Longitude => 180,
        }
    }

    /// Hemisphere letters, positive first.
    fn hemispheres(self) -> (char, char) {
        match self {
            Axis::Latitude => ('N', 'S'),
            Axis::Longitude => ('E', 'W'),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Latitude => f.write_str("latitude"),
            Axis::Longitude => f.write_str("longitude"),
        }
    }
}

/// Parses `DDMMSS[N|S]` into signed seconds.
pub fn parse_latitude(text: &str) -> Result<i64, CoordError> {
    parse_dms(text, Axis::Latitude)
}

/// Parses `DDDMMSS[E|W]` into signed seconds.
pub fn parse_longitude(text: &str) -> Result<i64, CoordError> {
    parse_dms(text, Axis::Longitude)
}

fn parse_dms(text: &str, axis: Axis) -> Result<i64, CoordError> {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("unknown") {
        return Err(CoordError::Missing);
    }
    let deg_len = axis.degree_digits();
    let expected = deg_len + 5;
    if !text.is_ascii() || text.len() != expected {
        return Err(CoordError::Length {
            axis,
            text: text.to_owned(),
            expected,
        });
    }
    let (digits, hemisphere) = text.split_at(expected - 1);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoordError::Digits {
            axis,
            text: text.to_owned(),
        });
    }
    let field = |range: std::ops::Range<usize>| -> i64 {
        digits[range]
            .bytes()
            .fold(0, |acc, b| acc * 10 + i64::from(b - b'0'))
    };
    let degrees = field(0..deg_len);
    let minutes = field(deg_len..deg_len + 2);
    let seconds = field(deg_len + 2..deg_len + 4);
    let total = degrees * 3600 + minutes * 60 + seconds;
    if minutes >= 60 || seconds >= 60 || total > axis.max_degrees() * 3600 {
        return Err(CoordError::OutOfRange {
            axis,
            text: text.to_owned(),
        });
    }
    let (positive, negative) = axis.hemispheres();
    match hemisphere.chars().next() {
        Some(h) if h == positive => Ok(total),
        Some(h) if h == negative => Ok(-total),
        Some(found) => Err(CoordError::Hemisphere {
            axis,
            text: text.to_owned(),
            found,
        }),
        None => Err(CoordError::Missing),
    }
}

/// Renders signed latitude seconds as `38d 21m 48s North`.
pub fn format_latitude(seconds: i64) -> String {
    format_dms(seconds, "North", "South")
}

/// Renders signed longitude seconds as `79d 31m 9s West`.
pub fn format_longitude(seconds: i64) -> String {
    format_dms(seconds, "East", "West")
}

fn format_dms(seconds: i64, positive: &str, negative: &str) -> String {
    let hemisphere = if seconds < 0 { negative } else { positive };
    let abs = seconds.unsigned_abs();
    format!(
        "{}d {}m {}s {hemisphere}",
        abs / 3600,
        (abs % 3600) / 60,
        abs % 60
    )
}
