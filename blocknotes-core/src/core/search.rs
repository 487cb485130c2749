//! Substring search over page titles and block content.
//!
//! [`Persistence::search_content`] produces raw per-page matches;
//! [`search_pages`] condenses them into one [`SearchResult`] per page for a
//! results list.
//!
//! Matching is case-insensitive and works on characters, not bytes, so
//! snippet windows never split a UTF-8 sequence. Each character is folded to
//! the first character of its lowercase mapping, which keeps positions in
//! the folded text aligned with the original.

use crate::{KeyValueStore, Page, Persistence, Result};
use serde::{Deserialize, Serialize};

/// Marker prepended to a snippet whose window does not start at the beginning of the block.
pub const ELLIPSIS: &str = "...";

/// Where in a page a match was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchLocation {
    /// The page title matched; the snippet is the whole title.
    Title,
    /// The block with this ID matched.
    Block(String),
}

impl MatchLocation {
    pub fn block_id(&self) -> Option<&str> {
        match self {
            Self::Title => None,
            Self::Block(id) => Some(id),
        }
    }
}

/// One hit inside a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMatch {
    pub location: MatchLocation,
    pub snippet: String,
}

/// Every hit inside one page, title first, then blocks in content order.
#[derive(Debug, Clone, PartialEq)]
pub struct PageMatches {
    pub page: Page,
    pub matches: Vec<ContentMatch>,
}

/// One row of a search results list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub page_id: String,
    pub page_title: String,
    /// Location of the first hit in the page.
    pub location: MatchLocation,
    /// Snippet of the first hit in the page.
    pub snippet: String,
    /// Total hits in the page.
    pub match_count: usize,
}

impl PageMatches {
    /// Condenses the hits into one result row: first hit, total count.
    /// Returns `None` when there are no hits.
    pub fn into_result(self) -> Option<SearchResult> {
        let match_count = self.matches.len();
        let first = self.matches.into_iter().next()?;
        Some(SearchResult {
            page_id: self.page.id,
            page_title: self.page.title,
            location: first.location,
            snippet: first.snippet,
            match_count,
        })
    }
}

/// Runs `query` against the stored pages and returns one result per matching page.
///
/// Results follow collection order; pages are not re-ranked.
pub fn search_pages<S: KeyValueStore>(
    persistence: &Persistence<S>,
    query: &str,
) -> Result<Vec<SearchResult>> {
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }
    let results = persistence
        .search_content(query)?
        .into_iter()
        .filter_map(PageMatches::into_result)
        .collect();
    Ok(results)
}

/// Lowercase-folds `text` one character at a time.
pub(crate) fn fold(text: &str) -> Vec<char> {
    text.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}

/// Character index of the first occurrence of `needle` in `haystack`.
fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Cuts `context` characters either side of the match at `index`.
fn snippet_around(text: &[char], index: usize, match_len: usize, context: usize) -> String {
    let start = index.saturating_sub(context);
    let end = (index + match_len + context).min(text.len());
    let window: String = text[start..end].iter().collect();
    if start > 0 {
        format!("{ELLIPSIS}{window}")
    } else {
        window
    }
}

/// Collects every match of the folded `needle` inside `page`.
pub(crate) fn match_page(page: &Page, needle: &[char], context: usize) -> Vec<ContentMatch> {
    let mut matches = Vec::new();

    if find_chars(&fold(&page.title), needle).is_some() {
        matches.push(ContentMatch {
            location: MatchLocation::Title,
            snippet: page.title.clone(),
        });
    }

    for block in &page.content {
        let folded = fold(&block.content);
        if let Some(index) = find_chars(&folded, needle) {
            let original: Vec<char> = block.content.chars().collect();
            matches.push(ContentMatch {
                location: MatchLocation::Block(block.id.clone()),
                snippet: snippet_around(&original, index, needle.len(), context),
            });
        }
    }

    matches
}
