//! Extractive summaries: sentences are picked verbatim by keyword coverage and
//! returned in their original order.

use crate::tokenizer::Tokenizer;
use std::collections::HashSet;

pub const DEFAULT_SENTENCES: usize = 3;

/// Split at runs of `.`, `!` or `?` followed by whitespace or the end of the
/// text. Sentences keep their terminal punctuation and are trimmed.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if matches!(next, '.' | '!' | '?') {
                end = j + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        let at_boundary = chars.peek().map_or(true, |&(_, next)| next.is_whitespace());
        if at_boundary {
            push_trimmed(&mut sentences, &text[start..end]);
            start = end;
        }
    }
    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, s: &'a str) {
    let s = s.trim();
    if !s.is_empty() {
        out.push(s);
    }
}

/// Pick `count` sentences of `text` by the summed weight of the distinct
/// `keywords` (normalized terms) each one contains. Ties go to the earlier
/// sentence. The result keeps document order.
pub fn summarize(text: &str, keywords: &[(String, f64)], tokenizer: &Tokenizer, count: usize) -> Vec<String> {
    let sentences = split_sentences(text);
    if sentences.len() <= count {
        return sentences.into_iter().map(String::from).collect();
    }

    let mut scored: Vec<(usize, f64)> = sentences
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let terms: HashSet<String> = tokenizer.normalize(s).into_iter().collect();
            let score = keywords.iter().filter(|(k, _)| terms.contains(k)).map(|(_, w)| w).sum();
            (i, score)
        })
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut chosen: Vec<usize> = scored.into_iter().take(count).map(|(i, _)| i).collect();
    chosen.sort_unstable();
    chosen.into_iter().map(|i| sentences[i].to_string()).collect()
}
