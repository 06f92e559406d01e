// Cross-source deduplication and the composite ranking key.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::post::SourceName;
use crate::models::search::PostMatch;

/// Collapses matches sharing a permalink into one row.
///
/// The higher-scored instance is kept (the first one seen on a tie); every other source
/// it appeared in is recorded in `also_seen_in`.
pub fn dedupe(matches: Vec<PostMatch>) -> Vec<PostMatch> {
    let mut kept: Vec<PostMatch> = Vec::with_capacity(matches.len());
    let mut by_permalink: HashMap<String, usize> = HashMap::new();

    for candidate in matches {
        let Some(&i) = by_permalink.get(&candidate.post.permalink) else {
            by_permalink.insert(candidate.post.permalink.clone(), kept.len());
            kept.push(candidate);
            continue;
        };

        let existing = &mut kept[i];
        if candidate.post.score > existing.post.score {
            let displaced = std::mem::replace(existing, candidate);
            for source in displaced.also_seen_in {
                note_source(existing, source);
            }
            note_source(existing, displaced.post.source_name);
        } else {
            note_source(existing, candidate.post.source_name);
        }
    }

    kept
}

fn note_source(row: &mut PostMatch, source: SourceName) {
    if source != row.post.source_name && !row.also_seen_in.contains(&source) {
        row.also_seen_in.push(source);
    }
}

/// Sorts best-first.
pub fn rank(matches: &mut [PostMatch]) {
    matches.sort_by(compare);
}

/// Date confidence desc, then score desc, then newest first, then permalink asc.
pub fn compare(a: &PostMatch, b: &PostMatch) -> Ordering {
    b.fact
        .confidence_of_date
        .total_cmp(&a.fact.confidence_of_date)
        .then_with(|| b.post.score.cmp(&a.post.score))
        .then_with(|| b.post.created_at.cmp(&a.post.created_at))
        .then_with(|| a.post.permalink.cmp(&b.post.permalink))
}
