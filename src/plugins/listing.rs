//! Grouping of active questions for the `faq show` cards.

use crate::core::interfaces::PinyinKey;

/// Buckets in display order; every bucket is always present.
pub const INITIAL_BUCKETS: [&str; 7] = ["abcde", "fghij", "klmno", "pqrst", "uvwxyz", "0-9", "#"];

fn first_char_key(question: &str, keys: &dyn PinyinKey) -> String {
    question
        .chars()
        .next()
        .map(|c| keys.key(c.encode_utf8(&mut [0u8; 4])).to_lowercase())
        .unwrap_or_default()
}

fn bucket_for(key: &str) -> usize {
    match key.chars().next() {
        Some('a'..='e') => 0,
        Some('f'..='j') => 1,
        Some('k'..='o') => 2,
        Some('p'..='t') => 3,
        Some('u'..='z') => 4,
        Some('0'..='9') => 5,
        _ => 6,
    }
}

/// Sorts by the romanized first character (stable, so ties keep input order)
/// and partitions into [`INITIAL_BUCKETS`].
pub fn group_by_initial(questions: Vec<String>, keys: &dyn PinyinKey) -> Vec<(String, Vec<String>)> {
    let mut keyed: Vec<(String, String)> = questions
        .into_iter()
        .map(|q| (first_char_key(&q, keys), q))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    let mut groups: Vec<(String, Vec<String>)> = INITIAL_BUCKETS
        .iter()
        .map(|b| (b.to_string(), Vec::new()))
        .collect();
    for (key, q) in keyed {
        groups[bucket_for(&key)].1.push(q);
    }
    groups
}

/// Groups `(question, tag)` pairs by tag, tags ordered by first appearance.
pub fn group_by_tag(entries: Vec<(String, String)>) -> Vec<(String, Vec<String>)> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for (question, tag) in entries {
        match groups.iter_mut().find(|(t, _)| *t == tag) {
            Some((_, qs)) => qs.push(question),
            None => groups.push((tag, vec![question])),
        }
    }
    groups
}
