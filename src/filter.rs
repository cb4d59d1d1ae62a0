// caninject/src/filter.rs
//
// This file is part of the Rust 'caninject' tool.
//
// Licensed under the MIT license:
//   <LICENSE or http://opensource.org/licenses/MIT>
// This file may not be copied, modified, or distributed except according
// to those terms.

//! Frame ID filtering.

use crate::Frame;
use itertools::Itertools;
use std::{collections::BTreeSet, fmt, str::FromStr};

/// A set of CAN IDs to inject, compared without regard to case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    ids: BTreeSet<String>,
}

impl FilterSet {
    /// Creates a filter from a list of hex IDs.
    ///
    /// Blank entries are ignored.
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids = ids
            .into_iter()
            .map(|id| id.as_ref().trim().to_uppercase())
            .filter(|id| !id.is_empty())
            .collect();
        Self { ids }
    }

    /// Whether the filter has no IDs, and so would pass nothing.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The number of distinct IDs.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the ID is in the set.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(&id.to_uppercase())
    }

    /// Whether the frame should be injected.
    pub fn matches(&self, frame: &Frame) -> bool {
        self.contains(frame.id())
    }
}

/// Parses a comma-separated list, like "180,5C5,60D".
impl FromStr for FilterSet {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s.split(',')))
    }
}

impl fmt::Display for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ids.iter().join(", "))
    }
}

/////////////////////////////////////////////////////////////////////////////
