//! Link header parsing (RFC 5988)
//!
//! Canvas describes pagination through the `Link` response header:
//!
//! ```text
//! <https://x.instructure.com/api/v1/courses?page=1&per_page=10>; rel="current",
//! <https://x.instructure.com/api/v1/courses?page=2&per_page=10>; rel="next",
//! <https://x.instructure.com/api/v1/courses?page=1&per_page=10>; rel="first",
//! <https://x.instructure.com/api/v1/courses?page=45&per_page=10>; rel="last"
//! ```

use crate::error::{Error, Result};
use crate::types::PAGE_PARAM;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;
use url::Url;

static LINK_TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<\s*([^>]*?)\s*>\s*;\s*rel\s*=\s*"?([A-Za-z]+)"?"#).unwrap()
});

// Relative link targets are resolved against this so the query can be read
static RELATIVE_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("http://localhost/").unwrap());

/// A pagination relation name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Current,
    First,
    Prev,
    Next,
    Last,
}

impl Relation {
    /// Parse a `rel` value; unknown names yield `None`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "current" => Some(Self::Current),
            "first" => Some(Self::First),
            "prev" => Some(Self::Prev),
            "next" => Some(Self::Next),
            "last" => Some(Self::Last),
            _ => None,
        }
    }

    /// The `rel` value as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::First => "first",
            Self::Prev => "prev",
            Self::Next => "next",
            Self::Last => "last",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One relation extracted from a Link header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    /// Relation name
    pub relation: Relation,
    /// Target URL exactly as sent
    pub url: String,
    /// Value of the `page` query parameter
    pub page: u32,
}

impl PageLink {
    /// Build a link from a raw target URL, extracting its page number
    pub fn parse(relation: Relation, url: &str) -> Result<Self> {
        let parsed = Url::options()
            .base_url(Some(&RELATIVE_BASE))
            .parse(url)
            .map_err(|e| {
                Error::malformed_links(format!("rel=\"{relation}\": bad URL {url:?}: {e}"))
            })?;

        let raw_page = parsed
            .query_pairs()
            .find(|(key, _)| key == PAGE_PARAM)
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| {
                Error::malformed_links(format!("rel=\"{relation}\": no page parameter in {url:?}"))
            })?;

        let page = raw_page.parse::<u32>().map_err(|_| {
            Error::malformed_links(format!(
                "rel=\"{relation}\": page {raw_page:?} is not a page number"
            ))
        })?;

        Ok(Self {
            relation,
            url: url.to_string(),
            page,
        })
    }
}

/// The full set of relations for one response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkSet {
    pub current: PageLink,
    pub first: PageLink,
    pub last: PageLink,
    /// Absent on the last page
    pub next: Option<PageLink>,
    pub prev: Option<PageLink>,
}

impl LinkSet {
    /// Parse a raw `Link` header value.
    ///
    /// Every recognized relation must carry a numeric `page` parameter or
    /// the whole header is rejected with `MalformedPaginationMetadata`.
    /// `current`, `first` and `last` are required; `next` and `prev` are
    /// optional. Unrecognized relations are ignored.
    pub fn parse(header: &str) -> Result<Self> {
        let mut current = None;
        let mut first = None;
        let mut prev = None;
        let mut next = None;
        let mut last = None;

        for caps in LINK_TOKEN_REGEX.captures_iter(header) {
            let Some(relation) = Relation::from_name(&caps[2]) else {
                continue;
            };
            let link = PageLink::parse(relation, &caps[1])?;
            let slot = match relation {
                Relation::Current => &mut current,
                Relation::First => &mut first,
                Relation::Prev => &mut prev,
                Relation::Next => &mut next,
                Relation::Last => &mut last,
            };
            if slot.is_none() {
                *slot = Some(link);
            }
        }

        Ok(Self {
            current: current.ok_or_else(|| Error::missing_relation(Relation::Current.as_str()))?,
            first: first.ok_or_else(|| Error::missing_relation(Relation::First.as_str()))?,
            last: last.ok_or_else(|| Error::missing_relation(Relation::Last.as_str()))?,
            next,
            prev,
        })
    }

    /// Total number of pages in the collection
    pub fn total_pages(&self) -> u32 {
        self.last.page
    }

    /// True when this response is the final page
    pub fn is_last_page(&self) -> bool {
        self.next.is_none()
    }

    /// Look up a relation by name
    pub fn get(&self, relation: Relation) -> Option<&PageLink> {
        match relation {
            Relation::Current => Some(&self.current),
            Relation::First => Some(&self.first),
            Relation::Last => Some(&self.last),
            Relation::Next => self.next.as_ref(),
            Relation::Prev => self.prev.as_ref(),
        }
    }
}
