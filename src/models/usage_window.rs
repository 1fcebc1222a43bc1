// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Usage windows: date-bounded rules linking an equipment tag to an item.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Strip every whitespace character from a tag.
///
/// Tags are normalized when they are stored, never when they are compared.
pub fn normalize_tag(tag: &str) -> String {
    tag.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Split a ride's comma-joined tag list into normalized tags.
pub fn parse_tag_csv(csv: &str) -> Vec<String> {
    normalize_tag(csv)
        .split(',')
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Set of tag values seen on rides, used to flag windows naming unknown gear.
#[derive(Debug, Clone, Default)]
pub struct KnownTags {
    tags: BTreeSet<String>,
}

impl KnownTags {
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn insert_csv(&mut self, csv: &str) {
        self.tags.extend(parse_tag_csv(csv));
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for KnownTags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().map(|t| normalize_tag(t.as_ref())).collect(),
        }
    }
}

/// A tag match rule with optional start and end dates (both inclusive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageWindow {
    tag: String,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
    #[serde(skip)]
    tag_is_known: bool,
}

impl UsageWindow {
    /// An unbounded window for `tag`.
    pub fn new(tag: &str) -> Self {
        Self::bounded(tag, None, None)
    }

    pub fn bounded(tag: &str, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self {
            tag: normalize_tag(tag),
            start,
            end,
            tag_is_known: false,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn set_tag(&mut self, tag: &str, known: &KnownTags) {
        self.tag = normalize_tag(tag);
        self.refresh_known(known);
    }

    /// Whether `date` falls inside the window; an unset bound is open-ended.
    pub fn is_within(&self, date: NaiveDate) -> bool {
        let after_start = self.start.map_or(true, |start| start <= date);
        let before_end = self.end.map_or(true, |end| date <= end);
        after_start && before_end
    }

    /// Whether a ride with these tags on `date` is covered by this window.
    pub fn matches(&self, ride_tags: &[String], date: NaiveDate) -> bool {
        ride_tags.iter().any(|t| *t == self.tag) && self.is_within(date)
    }

    /// False only when both bounds are set and the end precedes the start.
    pub fn range_is_valid(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => end >= start,
            _ => true,
        }
    }

    pub fn tag_is_known(&self) -> bool {
        self.tag_is_known
    }

    pub fn refresh_known(&mut self, known: &KnownTags) {
        self.tag_is_known = known.contains(&self.tag);
    }
}
