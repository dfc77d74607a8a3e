use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use log::{debug, trace};

use crate::Note;

/// Notes whose title or content contains `term`, ignoring case, in their
/// original order. An empty term matches everything.
pub fn filter_notes<'a>(notes: &'a [Note], term: &str) -> Vec<&'a Note> {
    let needle = term.to_lowercase();
    notes
        .iter()
        .filter(|note| {
            needle.is_empty()
                || note.title.to_lowercase().contains(&needle)
                || note.content.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Ranks notes against `term` with fuzzy matching, best match first.
/// Title matches weigh twice as much as content matches.
pub fn fuzzy_search<'a>(notes: &'a [Note], term: &str) -> Vec<&'a Note> {
    if term.is_empty() {
        return notes.iter().collect();
    }

    let matcher = SkimMatcherV2::default().ignore_case();

    let mut scored: Vec<(i64, &Note)> = notes
        .iter()
        .filter_map(|note| {
            let title_score = matcher.fuzzy_match(&note.title, term).unwrap_or(0);
            let content_score = matcher.fuzzy_match(&note.content, term).unwrap_or(0);
            let score = title_score * 2 + content_score;
            trace!("Note {} scored {}", note.id, score);
            (score > 0).then_some((score, note))
        })
        .collect();

    // stable, so equal scores keep list order
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    debug!("Fuzzy search '{}' matched {} notes", term, scored.len());
    scored.into_iter().map(|(_, note)| note).collect()
}
