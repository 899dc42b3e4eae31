//! Interval-style version ranges for embedded dependency declarations.
//!
//! Declarations use the bracket notation `[1.0,2.0)`, `(,1.5]`, `[1.2]` or a
//! bare minimum version `1.0`. Concrete versions are `semver::Version`;
//! short forms like `1.0` are padded to `1.0.0` when parsed.

use semver::Version;
use serde::Deserialize;
use serde::de;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeParseError {
    #[error("empty version range")]
    Empty,
    #[error("invalid version `{0}`: {1}")]
    InvalidVersion(String, String),
    #[error("malformed version range `{0}`")]
    Malformed(String),
}

/// Parse a version, padding missing minor/patch components (`1` / `1.0`).
pub fn parse_version_lenient(s: &str) -> Result<Version, RangeParseError> {
    let s = s.trim();
    let padded = match s.split('.').count() {
        1 => format!("{s}.0.0"),
        2 => format!("{s}.0"),
        _ => s.to_string(),
    };
    Version::parse(&padded).map_err(|e| RangeParseError::InvalidVersion(s.to_string(), e.to_string()))
}

/// One end of a range: the version plus whether it is included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub version: Version,
    pub inclusive: bool,
}

/// A contiguous version interval with optional bounds on either side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

impl VersionRange {
    /// The unbounded range, containing every version.
    pub fn any() -> Self {
        Self { lower: None, upper: None }
    }

    pub fn exact(version: Version) -> Self {
        Self {
            lower: Some(Bound { version: version.clone(), inclusive: true }),
            upper: Some(Bound { version, inclusive: true }),
        }
    }

    /// `[version,)`: what a bare version in a declaration means.
    pub fn at_least(version: Version) -> Self {
        Self {
            lower: Some(Bound { version, inclusive: true }),
            upper: None,
        }
    }

    pub fn contains(&self, version: &Version) -> bool {
        if let Some(lower) = &self.lower {
            if version < &lower.version || (version == &lower.version && !lower.inclusive) {
                return false;
            }
        }
        if let Some(upper) = &self.upper {
            if version > &upper.version || (version == &upper.version && !upper.inclusive) {
                return false;
            }
        }
        true
    }

    /// A range is empty when its bounds cross, or meet without both being
    /// inclusive.
    pub fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Some(lower), Some(upper)) => {
                lower.version > upper.version
                    || (lower.version == upper.version && !(lower.inclusive && upper.inclusive))
            }
            _ => false,
        }
    }

    /// Intersect two ranges: the tighter lower bound with the tighter upper
    /// bound. The result may be empty.
    pub fn intersect(&self, other: &VersionRange) -> VersionRange {
        let lower = match (&self.lower, &other.lower) {
            (Some(a), Some(b)) => {
                if a.version > b.version || (a.version == b.version && !a.inclusive) {
                    Some(a.clone())
                } else {
                    Some(b.clone())
                }
            }
            (Some(a), None) => Some(a.clone()),
            (None, b) => b.clone(),
        };
        let upper = match (&self.upper, &other.upper) {
            (Some(a), Some(b)) => {
                if a.version < b.version || (a.version == b.version && !a.inclusive) {
                    Some(a.clone())
                } else {
                    Some(b.clone())
                }
            }
            (Some(a), None) => Some(a.clone()),
            (None, b) => b.clone(),
        };
        VersionRange { lower, upper }
    }
}

impl FromStr for VersionRange {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(RangeParseError::Empty);
        }

        let starts_bracket = s.starts_with('[') || s.starts_with('(');
        let ends_bracket = s.ends_with(']') || s.ends_with(')');
        if !starts_bracket && !ends_bracket {
            // Bare version: a minimum requirement.
            return Ok(VersionRange::at_least(parse_version_lenient(s)?));
        }
        if !(starts_bracket && ends_bracket) {
            return Err(RangeParseError::Malformed(s.to_string()));
        }

        let lower_inclusive = s.starts_with('[');
        let upper_inclusive = s.ends_with(']');
        let inner = &s[1..s.len() - 1];

        let parts: Vec<&str> = inner.split(',').collect();
        match parts.as_slice() {
            // `[1.2]`: exactly this version.
            [single] if !single.trim().is_empty() => {
                if !(lower_inclusive && upper_inclusive) {
                    return Err(RangeParseError::Malformed(s.to_string()));
                }
                Ok(VersionRange::exact(parse_version_lenient(single)?))
            }
            [low, high] => {
                let lower = if low.trim().is_empty() {
                    None
                } else {
                    Some(Bound {
                        version: parse_version_lenient(low)?,
                        inclusive: lower_inclusive,
                    })
                };
                let upper = if high.trim().is_empty() {
                    None
                } else {
                    Some(Bound {
                        version: parse_version_lenient(high)?,
                        inclusive: upper_inclusive,
                    })
                };
                Ok(VersionRange { lower, upper })
            }
            _ => Err(RangeParseError::Malformed(s.to_string())),
        }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.lower, &self.upper) {
            (None, None) => write!(f, "(,)"),
            (lower, upper) => {
                match lower {
                    Some(b) => write!(f, "{}{}", if b.inclusive { '[' } else { '(' }, b.version)?,
                    None => write!(f, "(")?,
                }
                write!(f, ",")?;
                match upper {
                    Some(b) => write!(f, "{}{}", b.version, if b.inclusive { ']' } else { ')' }),
                    None => write!(f, ")"),
                }
            }
        }
    }
}

impl<'de> Deserialize<'de> for VersionRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
