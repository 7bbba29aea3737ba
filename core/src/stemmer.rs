//! Stemming: a dictionary-assisted Indonesian affix stripper in the
//! Nazief-Adriani family, with Snowball English from `rust-stemmers` as an
//! alternative.

use lazy_static::lazy_static;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

lazy_static! {
    static ref ROOTS: HashSet<&'static str> = include_str!("../data/kata-dasar.txt")
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();
    static ref SNOWBALL_EN: Stemmer = Stemmer::create(Algorithm::English);
}

const PARTICLES: &[&str] = &["lah", "kah", "tah", "pun"];
const POSSESSIVES: &[&str] = &["nya", "ku", "mu"];
const DERIVATIONAL: &[&str] = &["kan", "an", "i"];
const MAX_PREFIXES: usize = 3;
/// Shortest remainder an affix may leave behind.
const MIN_STEM: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StemmerKind {
    #[default]
    Indonesian,
    English,
    None,
}

/// Stemmer selected by [`StemmerKind`].
#[derive(Debug, Clone, Default)]
pub struct WordStemmer {
    kind: StemmerKind,
    indonesian: IndonesianStemmer,
}

impl WordStemmer {
    pub fn new(kind: StemmerKind) -> Self {
        Self { kind, indonesian: IndonesianStemmer::default() }
    }

    /// Extra dictionary roots for the Indonesian stemmer.
    pub fn with_roots<I, S>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.indonesian = self.indonesian.with_roots(roots);
        self
    }

    /// Reads one root per line; blank lines and `#` comments are skipped.
    pub fn with_roots_file<P: AsRef<Path>>(self, path: P) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let stemmer = self.with_roots(text.lines());
        tracing::debug!(path = %path.as_ref().display(), count = stemmer.indonesian.extra_roots.len(), "loaded extra roots");
        Ok(stemmer)
    }

    pub fn extra_roots(&self) -> Vec<String> {
        self.indonesian.extra_roots()
    }

    pub fn kind(&self) -> StemmerKind {
        self.kind
    }

    pub fn stem(&self, word: &str) -> String {
        match self.kind {
            StemmerKind::Indonesian => self.indonesian.stem(word),
            StemmerKind::English => SNOWBALL_EN.stem(word).into_owned(),
            StemmerKind::None => word.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndonesianStemmer {
    extra_roots: HashSet<String>,
}

impl IndonesianStemmer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roots<I, S>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for root in roots {
            let root = root.as_ref().trim().to_lowercase();
            if !root.is_empty() && !root.starts_with('#') {
                self.extra_roots.insert(root);
            }
        }
        self
    }

    /// Caller-supplied roots, sorted, so they can be persisted alongside an index.
    pub fn extra_roots(&self) -> Vec<String> {
        let mut roots: Vec<String> = self.extra_roots.iter().cloned().collect();
        roots.sort();
        roots
    }

    fn is_root(&self, word: &str) -> bool {
        ROOTS.contains(word) || self.extra_roots.contains(word)
    }

    pub fn stem(&self, word: &str) -> String {
        if char_len(word) <= MIN_STEM || self.is_root(word) {
            return word.to_string();
        }

        let no_particle = strip_any_suffix(word, PARTICLES).map_or(word, |(w, _)| w);
        if self.is_root(no_particle) {
            return no_particle.to_string();
        }
        let inflected = strip_any_suffix(no_particle, POSSESSIVES).map_or(no_particle, |(w, _)| w);
        if self.is_root(inflected) {
            return inflected.to_string();
        }

        let (base, suffix) = match strip_any_suffix(inflected, DERIVATIONAL) {
            Some((w, s)) => (w, Some(s)),
            None => (inflected, None),
        };
        if suffix.is_some() && self.is_root(base) {
            return base.to_string();
        }
        if let Some(root) = self.find_root(base, suffix, 0, None) {
            return root;
        }

        if suffix.is_some() {
            // The "suffix" may be part of the root itself (dimakan -> makan).
            if let Some(root) = self.find_root(inflected, None, 0, None) {
                return root;
            }
            // -kan can also be a root ending in k followed by -an (kebijakan -> bijak).
            if suffix == Some("kan") {
                let with_k = format!("{base}k");
                if self.is_root(&with_k) {
                    return with_k;
                }
                if let Some(root) = self.find_root(&with_k, Some("an"), 0, None) {
                    return root;
                }
            }
        }

        let fallback = fallback_reading(inflected, base, suffix)
            .map_or_else(|| base.to_string(), |(w, s)| strip_prefixes_greedy(&w, s));
        if char_len(&fallback) >= MIN_STEM {
            fallback
        } else {
            word.to_string()
        }
    }

    /// Depth-first search over prefix recodings, stopping at the first dictionary hit.
    fn find_root(
        &self,
        word: &str,
        suffix: Option<&str>,
        depth: usize,
        previous: Option<&'static str>,
    ) -> Option<String> {
        if depth >= MAX_PREFIXES {
            return None;
        }
        let (family, candidates) = prefix_candidates(word)?;
        if previous == Some(family) || (depth == 0 && is_disallowed(family, suffix)) {
            return None;
        }
        for candidate in candidates {
            if char_len(&candidate) < 2 {
                continue;
            }
            if self.is_root(&candidate) {
                return Some(candidate);
            }
            if let Some(root) = self.find_root(&candidate, suffix, depth + 1, Some(family)) {
                return Some(root);
            }
        }
        None
    }
}

/// The first suffix reading whose prefix is allowed to combine with it:
/// the split as found, then -kan reread as k + -an, then no suffix at all.
fn fallback_reading(
    inflected: &str,
    base: &str,
    suffix: Option<&'static str>,
) -> Option<(String, Option<&'static str>)> {
    let mut readings = vec![(base.to_string(), suffix)];
    if suffix == Some("kan") {
        readings.push((format!("{base}k"), Some("an")));
    }
    if suffix.is_some() {
        readings.push((inflected.to_string(), None));
    }
    readings.into_iter().find(|(w, s)| {
        prefix_candidates(w).map_or(true, |(family, _)| !is_disallowed(family, *s))
    })
}

/// Best-effort stripping when the dictionary has no answer: always take the
/// first recoding alternative.
fn strip_prefixes_greedy(word: &str, suffix: Option<&str>) -> String {
    let mut current = word.to_string();
    let mut previous = None;
    for depth in 0..MAX_PREFIXES {
        let Some((family, candidates)) = prefix_candidates(&current) else { break };
        if previous == Some(family) || (depth == 0 && is_disallowed(family, suffix)) {
            break;
        }
        match candidates.into_iter().next() {
            Some(next) if char_len(&next) >= MIN_STEM => {
                current = next;
                previous = Some(family);
            }
            _ => break,
        }
    }
    current
}

fn strip_any_suffix<'a>(word: &'a str, suffixes: &[&'static str]) -> Option<(&'a str, &'static str)> {
    suffixes.iter().find_map(|s| {
        word.strip_suffix(s)
            .filter(|rest| char_len(rest) >= MIN_STEM)
            .map(|rest| (rest, *s))
    })
}

/// Prefix/suffix pairs that never combine in Indonesian morphology.
fn is_disallowed(family: &str, suffix: Option<&str>) -> bool {
    matches!(
        (family, suffix),
        ("be", Some("i"))
            | ("di", Some("an"))
            | ("ke", Some("i"))
            | ("ke", Some("kan"))
            | ("me", Some("an"))
            | ("se", Some("i"))
            | ("se", Some("kan"))
            | ("te", Some("an"))
    )
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn starts_with_vowel(s: &str) -> bool {
    s.chars().next().is_some_and(is_vowel)
}

fn starts_with_any(s: &str, letters: &[char]) -> bool {
    s.chars().next().is_some_and(|c| letters.contains(&c))
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// The prefix family matched at the start of `word` and the stems it may
/// decode to, most likely first.
fn prefix_candidates(word: &str) -> Option<(&'static str, Vec<String>)> {
    for (prefix, family) in [("di", "di"), ("ke", "ke"), ("se", "se")] {
        if let Some(rest) = word.strip_prefix(prefix) {
            return Some((family, vec![rest.to_string()]));
        }
    }
    if let Some(rest) = word.strip_prefix("ter") {
        return Some(("te", r_recoding(rest)));
    }
    if let Some(rest) = word.strip_prefix("ber") {
        return Some(("be", r_recoding(rest)));
    }
    if let Some(rest) = word.strip_prefix("bel").filter(|r| r.starts_with("ajar")) {
        return Some(("be", vec![rest.to_string()]));
    }
    if let Some(rest) = word.strip_prefix("be") {
        // be-C1erC2: bekerja -> kerja
        if !starts_with_vowel(rest) && rest.get(1..).is_some_and(|r| r.starts_with("er")) {
            return Some(("be", vec![rest.to_string()]));
        }
        return None;
    }
    if let Some(rest) = word.strip_prefix("me") {
        return nasal_candidates(rest).map(|c| ("me", c));
    }
    if let Some(rest) = word.strip_prefix("pe") {
        if let Some(after_r) = rest.strip_prefix('r') {
            return Some(("pe", r_recoding(after_r)));
        }
        if let Some(after_l) = rest.strip_prefix('l').filter(|r| r.starts_with("ajar")) {
            return Some(("pe", vec![after_l.to_string()]));
        }
        if let Some(candidates) = nasal_candidates(rest) {
            return Some(("pe", candidates));
        }
        // pe-C: pekerja -> kerja, petani -> tani
        if !starts_with_vowel(rest) && char_len(rest) >= 2 {
            return Some(("pe", vec![rest.to_string()]));
        }
    }
    None
}

/// ter-/ber-/per- followed by a vowel may have swallowed an initial r.
fn r_recoding(rest: &str) -> Vec<String> {
    if starts_with_vowel(rest) {
        vec![rest.to_string(), format!("r{rest}")]
    } else {
        vec![rest.to_string()]
    }
}

/// Nasal assimilation after me-/pe-: meng-, meny-, mem-, men-, plain me-.
fn nasal_candidates(rest: &str) -> Option<Vec<String>> {
    if let Some(r) = rest.strip_prefix("ng") {
        if starts_with_vowel(r) {
            return Some(vec![r.to_string(), format!("k{r}")]);
        }
        if starts_with_any(r, &['g', 'h', 'k', 'q']) {
            return Some(vec![r.to_string()]);
        }
        return None;
    }
    if let Some(r) = rest.strip_prefix("ny").filter(|r| starts_with_vowel(r)) {
        return Some(vec![format!("s{r}"), format!("ny{r}")]);
    }
    if let Some(r) = rest.strip_prefix('m') {
        if starts_with_any(r, &['b', 'f', 'p', 'v']) {
            return Some(vec![r.to_string()]);
        }
        if starts_with_vowel(r) {
            return Some(vec![format!("p{r}"), format!("m{r}")]);
        }
        return None;
    }
    if let Some(r) = rest.strip_prefix('n') {
        if starts_with_any(r, &['c', 'd', 'j', 's', 't', 'z']) {
            return Some(vec![r.to_string()]);
        }
        if starts_with_vowel(r) {
            return Some(vec![format!("t{r}"), format!("n{r}")]);
        }
        return None;
    }
    if starts_with_any(rest, &['l', 'r', 'w', 'y']) {
        return Some(vec![rest.to_string()]);
    }
    None
}
