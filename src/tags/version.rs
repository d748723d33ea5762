//! Strict release-tag versions.
//!
//! A tag is accepted only if it matches `N.N[.N][(a|b)N]`, where each `N` is a
//! decimal number. A missing patch component means `0`. Versions render in a
//! canonical three-component form, so `1.0` and `1.0.0` are the same tag.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Why a tag string is not a version.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    #[error("expected 2 or 3 dot-separated components, found {0}")]
    ComponentCount(usize),

    #[error("component {0:?} is not a decimal number")]
    InvalidNumber(String),

    #[error("pre-release {0:?} must be `a` or `b` followed by a number")]
    InvalidPreRelease(String),
}

/// Stage of a pre-release. Alpha sorts before beta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreReleaseKind {
    Alpha,
    Beta,
}

impl PreReleaseKind {
    fn marker(self) -> char {
        match self {
            PreReleaseKind::Alpha => 'a',
            PreReleaseKind::Beta => 'b',
        }
    }
}

/// A pre-release suffix such as `a1` or `b3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PreRelease {
    pub kind: PreReleaseKind,
    pub number: u64,
}

impl fmt::Display for PreRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.marker(), self.number)
    }
}

/// A parsed release tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre_release: Option<PreRelease>,
}

impl TagVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        TagVersion {
            major,
            minor,
            patch,
            pre_release: None,
        }
    }

    pub fn with_pre_release(mut self, kind: PreReleaseKind, number: u64) -> Self {
        self.pre_release = Some(PreRelease { kind, number });
        self
    }
}

impl Ord for TagVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre_release, &other.pre_release) {
                (None, None) => Ordering::Equal,
                // A final release is newer than any of its pre-releases.
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for TagVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TagVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre_release {
            write!(f, "{pre}")?;
        }
        Ok(())
    }
}

impl FromStr for TagVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (release, pre_release) = match s.find(['a', 'b']) {
            Some(idx) => (&s[..idx], Some(parse_pre_release(&s[idx..])?)),
            None => (s, None),
        };

        let components: Vec<&str> = release.split('.').collect();
        let (major, minor, patch) = match components.as_slice() {
            [major, minor] => (parse_number(major)?, parse_number(minor)?, 0),
            [major, minor, patch] => (
                parse_number(major)?,
                parse_number(minor)?,
                parse_number(patch)?,
            ),
            other => return Err(VersionParseError::ComponentCount(other.len())),
        };

        Ok(TagVersion {
            major,
            minor,
            patch,
            pre_release,
        })
    }
}

fn parse_number(s: &str) -> Result<u64, VersionParseError> {
    // `u64::from_str` accepts a leading `+`, which the grammar does not.
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionParseError::InvalidNumber(s.to_string()));
    }
    s.parse()
        .map_err(|_| VersionParseError::InvalidNumber(s.to_string()))
}

fn parse_pre_release(s: &str) -> Result<PreRelease, VersionParseError> {
    let kind = match s.as_bytes().first() {
        Some(b'a') => PreReleaseKind::Alpha,
        Some(b'b') => PreReleaseKind::Beta,
        _ => return Err(VersionParseError::InvalidPreRelease(s.to_string())),
    };
    let number =
        parse_number(&s[1..]).map_err(|_| VersionParseError::InvalidPreRelease(s.to_string()))?;
    Ok(PreRelease { kind, number })
}
