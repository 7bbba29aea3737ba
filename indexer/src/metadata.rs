//! Title, author and date guessed from the opening text of an extracted PDF.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref AUTHOR_LABELS: Vec<Regex> = [
        r"(?im)^\s*penulis\s*[:\-]\s*(.+)$",
        r"(?im)^\s*oleh\s+(.+)$",
        r"(?im)^\s*author\s*[:\-]\s*(.+)$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect();
    static ref AUTHOR_STOP: Regex = Regex::new(r"(?i)[,;]|email:|universitas|faculty|department").expect("valid regex");
    static ref NAME_LINE: Regex = Regex::new(r"^[A-Z][A-Za-z.\- ]+$").expect("valid regex");
    static ref NUMERIC_DATE: Regex = Regex::new(r"\b(\d{1,2})[/\-](\d{1,2})[/\-](\d{4})\b").expect("valid regex");
    static ref DAY_MONTH_YEAR: Regex = Regex::new(&format!(r"(?i)\b(\d{{1,2}})\s+({MONTHS})\s+(\d{{4}})\b")).expect("valid regex");
    static ref MONTH_YEAR: Regex = Regex::new(&format!(r"(?i)\b({MONTHS})\s+(\d{{4}})\b")).expect("valid regex");
    static ref DATE_LABEL: Regex = Regex::new(r"(?im)^\s*tanggal\s*[:\-]\s*(.+)$").expect("valid regex");
    static ref YEAR: Regex = Regex::new(r"\b(19[89]\d|20\d{2})\b").expect("valid regex");
}

const MONTHS: &str = "januari|februari|maret|april|mei|juni|juli|agustus|september|oktober|november|desember";
/// Roughly the first three pages.
const OPENING_CHARS: usize = 4000;
const MAX_AUTHOR_CHARS: usize = 80;
const TITLE_LINES: usize = 10;
const AUTHOR_LINES: usize = 25;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    /// `YYYY-MM-DD`; a bare month or year fills the rest with `01`.
    pub date: Option<String>,
}

pub fn from_opening_text(text: &str) -> PdfMetadata {
    let opening: String = text.chars().take(OPENING_CHARS).collect();
    let title = find_title(&opening);
    let author = find_author(&opening, title.as_deref());
    let date = find_date(&opening);
    PdfMetadata { title, author, date }
}

fn non_empty_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}

/// First early line of a plausible heading length.
fn find_title(text: &str) -> Option<String> {
    non_empty_lines(text)
        .take(TITLE_LINES)
        .find(|l| (8..=150).contains(&l.chars().count()))
        .map(str::to_string)
}

fn find_author(text: &str, title: Option<&str>) -> Option<String> {
    let labelled = AUTHOR_LABELS.iter().find_map(|re| re.captures(text)).map(|caps| {
        let value = caps[1].trim();
        AUTHOR_STOP.split(value).next().unwrap_or(value).trim().to_string()
    });
    let author = labelled.filter(|a| !a.is_empty()).or_else(|| {
        non_empty_lines(text)
            .take(AUTHOR_LINES)
            .filter(|l| Some(*l) != title)
            .find(|l| (2..=6).contains(&l.split_whitespace().count()) && NAME_LINE.is_match(l))
            .map(str::to_string)
    })?;
    let collapsed = author.split_whitespace().collect::<Vec<_>>().join(" ");
    Some(collapsed.chars().take(MAX_AUTHOR_CHARS).collect())
}

fn month_number(name: &str) -> Option<u32> {
    MONTHS.split('|').position(|m| m.eq_ignore_ascii_case(name)).map(|i| i as u32 + 1)
}

fn iso(year: u32, month: u32, day: u32) -> Option<String> {
    ((1..=12).contains(&month) && (1..=31).contains(&day)).then(|| format!("{year:04}-{month:02}-{day:02}"))
}

fn find_date(text: &str) -> Option<String> {
    let numeric = NUMERIC_DATE.captures_iter(text).find_map(|c| {
        iso(c[3].parse().ok()?, c[2].parse().ok()?, c[1].parse().ok()?)
    });
    numeric
        .or_else(|| {
            DAY_MONTH_YEAR.captures_iter(text).find_map(|c| {
                iso(c[3].parse().ok()?, month_number(&c[2])?, c[1].parse().ok()?)
            })
        })
        .or_else(|| {
            let c = MONTH_YEAR.captures(text)?;
            iso(c[2].parse().ok()?, month_number(&c[1])?, 1)
        })
        .or_else(|| {
            // A labelled line's year beats the first year anywhere in the text.
            let label = DATE_LABEL.captures(text).map(|c| c[1].to_string());
            let year = label.as_deref().and_then(|l| YEAR.find(l)).or_else(|| YEAR.find(text))?;
            iso(year.as_str().parse().ok()?, 1, 1)
        })
}
