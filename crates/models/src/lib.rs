use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use thiserror::Error;

/// Tenant identifier as stored by the domain database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(pub u64);

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CompanyId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Content-type identifier used to select a backend (portraits, videos, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingKey(String);

impl RoutingKey {
    pub const PORTRAITS: &'static str = "portraits";
    pub const VIDEOS: &'static str = "videos";
    pub const PREVIEWS: &'static str = "previews";
    pub const MARKERS: &'static str = "markers";

    /// Content types every fresh routing document knows about
    pub const BUILTIN: [&'static str; 4] =
        [Self::PORTRAITS, Self::VIDEOS, Self::PREVIEWS, Self::MARKERS];

    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn portraits() -> Self {
        Self::new(Self::PORTRAITS)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RoutingKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoutingKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Path is empty")]
    Empty,

    #[error("Invalid path segment '{segment}': {reason}")]
    InvalidSegment { segment: String, reason: &'static str },
}

const MAX_SEGMENT_LEN: usize = 255;

/// Checks that `segment` can be used as one component of a [`ProvisionedPath`]
pub fn validate_segment(segment: &str) -> Result<(), PathError> {
    let invalid = |reason| {
        Err(PathError::InvalidSegment {
            segment: segment.to_string(),
            reason,
        })
    };

    if segment.is_empty() {
        return invalid("empty segment");
    }
    if segment == "." || segment == ".." {
        return invalid("relative segment");
    }
    if segment.len() > MAX_SEGMENT_LEN {
        return invalid("segment too long");
    }
    if segment.contains(['/', '\\']) {
        return invalid("contains a path separator");
    }
    // ':' would let a scheme or drive prefix ("s3:", "disk:", "C:") leak in
    if segment.contains(':') {
        return invalid("contains ':'");
    }
    if segment.chars().any(char::is_control) {
        return invalid("contains control characters");
    }
    Ok(())
}

/// Relative, backend-agnostic storage location: `company/category/order/subfolder/...`
///
/// The same string is interpreted by every adapter relative to its own root, so
/// it never carries a bucket, a scheme or a leading slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProvisionedPath(String);

impl ProvisionedPath {
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::Empty);
        }
        for segment in raw.split('/') {
            validate_segment(segment)?;
        }
        Ok(Self(raw.to_string()))
    }

    pub fn from_segments<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut joined = String::new();
        for segment in segments {
            let segment = segment.as_ref();
            validate_segment(segment)?;
            if !joined.is_empty() {
                joined.push('/');
            }
            joined.push_str(segment);
        }
        if joined.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(Self(joined))
    }

    pub fn join(&self, segment: &str) -> Result<Self, PathError> {
        validate_segment(segment)?;
        Ok(Self(format!("{}/{}", self.0, segment)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// First segment, i.e. the company slug for provisioned hierarchies
    pub fn top_level(&self) -> &str {
        self.0.split('/').next().unwrap_or(&self.0)
    }

    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    pub fn parent(&self) -> Option<Self> {
        self.0
            .rsplit_once('/')
            .map(|(parent, _)| Self(parent.to_string()))
    }

    /// Every prefix of this path, shortest first, including the path itself
    pub fn chain(&self) -> Vec<Self> {
        let mut chain = Vec::with_capacity(self.depth());
        let mut current = String::with_capacity(self.0.len());
        for segment in self.segments() {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            chain.push(Self(current.clone()));
        }
        chain
    }

    /// True when this path equals `prefix` or lives underneath it
    pub fn is_within(&self, prefix: &str) -> bool {
        self.0 == prefix
            || (self.0.starts_with(prefix) && self.0.as_bytes().get(prefix.len()) == Some(&b'/'))
    }
}

impl fmt::Display for ProvisionedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProvisionedPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProvisionedPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProvisionedPath> for String {
    fn from(value: ProvisionedPath) -> Self {
        value.0
    }
}
