//! Navigation URIs.
//!
//! A navigation URI is a `/`-separated list of segments, each a page name
//! with an optional inline query: `Shell/Inbox?folder=work/Message?id=7`.
//!
//! - A leading `/` makes the URI absolute, which replaces the application's
//!   main page. Anything else is relative to the page navigating.
//! - A leading `../` pops one level; every `../` in such a URI becomes one
//!   [`REMOVE_SEGMENT`].
//! - Segment names are percent-decoded. Inline queries stay encoded until
//!   [`Segment::parameters`] parses them.
//!
//! Parsing produces an immutable [`NavigationUri`]. The engine walks it with a
//! [`SegmentCursor`], which only ever moves forward.

use crate::parameters::NavigationParameters;
use percent_encoding::percent_decode_str;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

/// Segment name that removes one page from the enclosing stack.
pub const REMOVE_SEGMENT: &str = "__Remove";

const RELATIVE_POP: &str = "../";
const REMOVE_INSTRUCTION: &str = "__Remove/";
const VIRTUAL_AUTHORITY: &str = "http://localhost";

/// Errors raised while parsing a navigation URI.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UriError {
    /// The input is neither a valid absolute URI nor a valid relative path.
    #[error("can't parse navigation uri '{uri}'")]
    Malformed {
        uri: String,
        #[source]
        source: url::ParseError,
    },
    /// Fragments have no meaning in a navigation path.
    #[error("navigation uri '{uri}' carries a fragment '#{fragment}'")]
    Fragment { uri: String, fragment: String },
}

/// One path component of a navigation URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    name: String,
    raw_query: String,
}

impl Segment {
    pub fn new(name: impl Into<String>, raw_query: impl Into<String>) -> Self {
        Segment {
            name: name.into(),
            raw_query: raw_query.into(),
        }
    }

    /// Splits `name?query` at the first `?` and decodes the name.
    pub fn parse(raw: &str) -> Self {
        let (name, raw_query) = raw.split_once('?').unwrap_or((raw, ""));
        Segment {
            name: percent_decode_str(name).decode_utf8_lossy().into_owned(),
            raw_query: raw_query.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The inline query, still percent-encoded and without the `?`.
    pub fn raw_query(&self) -> &str {
        &self.raw_query
    }

    pub fn is_remove(&self) -> bool {
        self.name == REMOVE_SEGMENT
    }

    /// Parses the inline query. Every call returns a fresh bag.
    pub fn parameters(&self) -> NavigationParameters {
        NavigationParameters::parse(&self.raw_query)
    }

    pub fn has_parameter(&self, key: &str) -> bool {
        self.parameters().contains_key(key)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.raw_query.is_empty() {
            write!(f, "?{}", self.raw_query)?;
        }
        Ok(())
    }
}

/// A parsed navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationUri {
    segments: Arc<[Segment]>,
    absolute: bool,
}

impl NavigationUri {
    /// Parses a path or URI.
    ///
    /// Inputs starting with `/` are resolved against a virtual authority so
    /// they need no real origin. Other inputs are absolute if they carry a
    /// scheme and relative otherwise. Empty (or blank) input yields an empty
    /// relative URI.
    ///
    /// # Errors
    ///
    /// Returns [`UriError::Malformed`] if the input can't be interpreted and
    /// [`UriError::Fragment`] if it ends in a `#fragment`.
    pub fn parse(input: &str) -> Result<Self, UriError> {
        let rewritten = if input.starts_with(RELATIVE_POP) {
            input.replace(RELATIVE_POP, REMOVE_INSTRUCTION)
        } else {
            input.to_string()
        };
        let trimmed = rewritten.trim();
        if trimmed.is_empty() {
            return Ok(NavigationUri {
                segments: Arc::from(Vec::new()),
                absolute: false,
            });
        }

        let malformed = |source| UriError::Malformed {
            uri: input.to_string(),
            source,
        };

        let (url, absolute) = if trimmed.starts_with('/') {
            let url = Url::parse(&format!("{}{}", VIRTUAL_AUTHORITY, trimmed)).map_err(malformed)?;
            (url, true)
        } else {
            match Url::parse(trimmed) {
                Ok(url) => (url, true),
                Err(url::ParseError::RelativeUrlWithoutBase) => {
                    let base = Url::parse(&format!("{}/", VIRTUAL_AUTHORITY)).map_err(malformed)?;
                    (base.join(trimmed).map_err(malformed)?, false)
                }
                Err(err) => return Err(malformed(err)),
            }
        };

        if let Some(fragment) = url.fragment() {
            return Err(UriError::Fragment {
                uri: input.to_string(),
                fragment: fragment.to_string(),
            });
        }

        let mut path_and_query = url.path().to_string();
        if let Some(query) = url.query() {
            path_and_query.push('?');
            path_and_query.push_str(query);
        }

        let segments: Vec<Segment> = path_and_query
            .split('/')
            .filter(|part| !part.is_empty())
            .map(Segment::parse)
            .collect();

        Ok(NavigationUri {
            segments: Arc::from(segments),
            absolute,
        })
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns a cursor positioned before the first segment.
    pub fn cursor(&self) -> SegmentCursor {
        SegmentCursor {
            segments: Arc::clone(&self.segments),
            position: 0,
        }
    }
}

impl FromStr for NavigationUri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NavigationUri::parse(s)
    }
}

impl fmt::Display for NavigationUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            f.write_str("/")?;
        }
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Forward-only position in a segment list.
#[derive(Debug, Clone)]
pub struct SegmentCursor {
    segments: Arc<[Segment]>,
    position: usize,
}

impl SegmentCursor {
    /// A cursor over segments that don't come from a parsed URI, such as
    /// segments deferred for modal navigation.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        SegmentCursor {
            segments: Arc::from(segments),
            position: 0,
        }
    }

    /// Returns the next segment and advances past it.
    pub fn next_segment(&mut self) -> Option<Segment> {
        let segment = self.segments.get(self.position).cloned()?;
        self.position += 1;
        Some(segment)
    }

    pub fn peek(&self) -> Option<&Segment> {
        self.segments.get(self.position)
    }

    pub fn is_empty(&self) -> bool {
        self.position >= self.segments.len()
    }

    pub fn remaining(&self) -> &[Segment] {
        self.segments.get(self.position..).unwrap_or(&[])
    }

    /// True unless every remaining segment is a remove marker.
    pub fn can_remove_and_push(&self) -> bool {
        self.remaining().iter().any(|segment| !segment.is_remove())
    }

    /// Takes every remaining segment, leaving the cursor empty.
    pub fn drain(&mut self) -> Vec<Segment> {
        let rest = self.remaining().to_vec();
        self.position = self.segments.len();
        rest
    }
}
