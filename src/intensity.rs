//! How much of each word to emphasize.
//!
//! A word's emphasized prefix length depends on the configured
//! [`IntensityLevel`] and on which size bucket the word falls into. Short
//! function words ("the", "and", ...) are always emphasized whole.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Articles, conjunctions and short prepositions. Emphasized in full at every level.
pub const SHORT_WORDS: [&str; 14] = [
    "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

/// Named intensity setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IntensityLevel {
    Glance,
    #[default]
    Focus,
    Deep,
}

/// Word size bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeBucket {
    /// Up to 3 characters.
    Small,
    /// 4 to 7 characters. The 4–5 and 6–7 ranges share one ratio.
    Medium,
    /// More than 7 characters.
    Large,
}

impl SizeBucket {
    pub fn for_len(len: usize) -> Self {
        match len {
            0..=3 => Self::Small,
            4..=7 => Self::Medium,
            _ => Self::Large,
        }
    }
}

/// Emphasis ratios per bucket, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratios {
    pub small: u32,
    pub medium: u32,
    pub large: u32,
}

impl Ratios {
    pub fn percent(&self, bucket: SizeBucket) -> u32 {
        match bucket {
            SizeBucket::Small => self.small,
            SizeBucket::Medium => self.medium,
            SizeBucket::Large => self.large,
        }
    }

    /// Ratio as a fraction in (0, 1].
    pub fn ratio(&self, bucket: SizeBucket) -> f64 {
        f64::from(self.percent(bucket)) / 100.0
    }
}

impl IntensityLevel {
    pub const ALL: [IntensityLevel; 3] = [Self::Glance, Self::Focus, Self::Deep];

    pub fn ratios(self) -> Ratios {
        match self {
            Self::Glance => Ratios {
                small: 30,
                medium: 25,
                large: 20,
            },
            Self::Focus => Ratios {
                small: 60,
                medium: 50,
                large: 40,
            },
            Self::Deep => Ratios {
                small: 80,
                medium: 70,
                large: 60,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Glance => "Glance",
            Self::Focus => "Focus",
            Self::Deep => "Deep",
        }
    }
}

impl fmt::Display for IntensityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntensityLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidLevel(s.to_string()))
    }
}

/// Whether a word is one of the [`SHORT_WORDS`], ignoring case.
pub fn is_short_word(word: &str) -> bool {
    SHORT_WORDS.iter().any(|w| w.eq_ignore_ascii_case(word))
}

/// Number of leading characters of `word` to emphasize.
///
/// Always within `0..=word.chars().count()`. The ceiling is computed in
/// integer percent so no float rounding can push a result past the exact value.
///
/// ```
/// use bionic::{IntensityLevel, bold_length};
///
/// assert_eq!(bold_length("running", IntensityLevel::Focus), 4);
/// assert_eq!(bold_length("information", IntensityLevel::Focus), 5);
/// assert_eq!(bold_length("the", IntensityLevel::Deep), 3);
/// ```
pub fn bold_length(word: &str, level: IntensityLevel) -> usize {
    let len = word.chars().count();
    if is_short_word(word) {
        return len;
    }

    let percent = level.ratios().percent(SizeBucket::for_len(len)) as usize;
    (len * percent).div_ceil(100).min(len)
}
