/**
 * Tier 1: Keyword Blocklist
 *
 * Case-insensitive matching of content against the admin-configured term
 * list. Runs locally, has no external dependency and cannot fail.
 *
 * In whole-word mode an occurrence only counts when the characters on both
 * sides of it are not letters or digits (or are the edge of the text), so
 * `"ass"` matches `"ass!"` but not `"class"`. Multi-word terms such as
 * `"scam link"` are matched the same way.
 */

use std::collections::BTreeSet;

use crate::shared::moderation::{BlocklistMatch, MatchMode};

/// Match `text` against `terms`, returning every term that occurs
pub fn match_blocklist(text: &str, terms: &BTreeSet<String>, mode: MatchMode) -> BlocklistMatch {
    let haystack = text.to_lowercase();
    if haystack.trim().is_empty() {
        return BlocklistMatch::default();
    }

    let matches: Vec<String> = terms
        .iter()
        .filter_map(|term| {
            let needle = term.trim().to_lowercase();
            if needle.is_empty() {
                return None;
            }
            let found = match mode {
                MatchMode::Substring => haystack.contains(&needle),
                MatchMode::WholeWord => contains_whole_word(&haystack, &needle),
            };
            found.then(|| term.clone())
        })
        .collect();

    BlocklistMatch {
        matched: !matches.is_empty(),
        matches,
    }
}

fn contains_whole_word(haystack: &str, needle: &str) -> bool {
    let mut from = 0;
    while let Some(offset) = haystack[from..].find(needle) {
        let begin = from + offset;
        let end = begin + needle.len();

        let open_before = haystack[..begin]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let open_after = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if open_before && open_after {
            return true;
        }

        // Step one character so overlapping occurrences are still seen
        from = begin + haystack[begin..].chars().next().map_or(1, char::len_utf8);
    }
    false
}
