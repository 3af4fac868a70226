//! Named extraction rules shared by the segmenter and the field extractors.
//!
//! Each static below is one rule with one job. Composite lookups such as
//! [`find_location_from`] or [`find_date_ranges`] run their rules in a fixed order
//! and the first match wins, so a rule can be tuned without touching the others.

use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Separator used when several physical lines (or table columns) are folded into one fragment.
pub const COLUMN_GAP: &str = "  ";

/// Glyphs PDF and DOCX extraction commonly leave in front of list items.
pub const BULLET_GLYPHS: &[char] = &['•', '●', '○', '▪', '■', '◦', '‣', '∙', '➢', '►', '✓', '❖'];

/// Canonical glyph every recognised bullet prefix is rewritten to.
pub const BULLET: char = '•';

const MONTH: &str = r"(?:Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|June?|July?|Aug(?:ust)?|Sept?(?:ember)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)";

const RANGE_SEPARATOR: &str = r"(?:-{1,2}|–|—|\bto\b)";

/// `Sep 2016`, `Sep. 2016 – May 2020`, `June 2020 - Present`, `Jan 2019 to 2021`.
static MONTH_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = r"(?i)\b(?P<start>MONTH\.?\s?\d{4})(?:\s*SEP\s*(?P<end>present|current|now|MONTH\.?\s?\d{4}|\d{4}))?\b"
        .replace("MONTH", MONTH)
        .replace("SEP", RANGE_SEPARATOR);
    Regex::new(&pattern).expect("valid month range regex")
});

/// Fallback for year-only ranges: `2016 – 2020`, `2019 - Present`.
static YEAR_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = r"(?i)\b(?P<start>(?:19|20)\d{2})\s*SEP\s*(?P<end>present|current|now|(?:19|20)\d{2})\b"
        .replace("SEP", RANGE_SEPARATOR);
    Regex::new(&pattern).expect("valid year range regex")
});

/// Single capitalised word followed by a two-letter region code: `Boston, MA`.
/// Multi-word cities are recovered by [`extend_city_prefix`].
static CITY_STATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][a-zA-Z.'\-]*, ?[A-Z]{2}\b").expect("valid city/state regex")
});

/// Words that start multi-word city names (`San Francisco`, `Salt Lake City`, `St. Louis`).
const CITY_PREFIXES: &[&str] = &[
    "San", "Santa", "Los", "Las", "New", "Salt", "Lake", "Fort", "Ft.", "St.", "Saint", "El",
    "Palo", "Mountain", "Ann", "Long", "Grand", "Baton", "Des", "Little", "Kansas", "Oklahoma",
    "Jersey", "Menlo", "Redwood", "Cedar", "Coral", "College", "Silver", "Round", "Sioux",
    "Jefferson", "Carson", "Culver", "Daly", "Boca", "Chula", "Corpus", "Costa", "Rancho",
    "Thousand", "Overland", "Virginia", "Colorado", "Iowa", "Fall", "Glen", "West", "East",
    "North", "South", "Bay", "Ocean", "Newport", "Pompano", "Rio", "Del", "La",
];

const CAPITALIZED: &str = r"[A-Z][\w.&'’\-]*";
const SCHOOL_KEYWORD: &str = r"(?:University|College|Institute|School|Academy|Polytechnic)";

/// `Boston University`, `Georgia Institute of Technology`, `University of Texas at Austin`.
static SCHOOL: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = concat!(
        r"\b(?:",
        r"CAP(?:[ ]+(?:of|the|and|for|&|CAP))*?[ ]+KW(?:[ ]+of[ ]+(?:the[ ]+)?CAP(?:[ ]+CAP)*)?",
        r"|",
        r"KW[ ]+of[ ]+(?:the[ ]+)?CAP(?:[ ]+(?:at[ ]+)?CAP)*",
        r")\b"
    )
    .replace("CAP", CAPITALIZED)
    .replace("KW", SCHOOL_KEYWORD);
    Regex::new(&pattern).expect("valid school regex")
});

static DEGREE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\b(?:Bachelor(?:'s|’s)?|Master(?:'s|’s)?|Associate(?:'s|’s)?|Doctor(?:ate)?|",
        r"Ph\.?\s?D\.?|MBA|Diploma|Degree|",
        r"B\.\s?A\.|B\.\s?S\.|B\.\s?Sc\.?|M\.\s?S\.|M\.\s?A\.|M\.\s?Sc\.?|B\.\s?Tech|M\.\s?Tech)",
        r"[^,•\n]*"
    ))
    .expect("valid degree regex")
});

static DEGREE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:Minor in|Minor:|Major in|Major:|Concentration in)\s*[^,\n]+")
        .expect("valid minor/major regex")
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[A-Z0-9._%+\-]+@[A-Z0-9.\-]+\.[A-Z]{2,}\b").expect("valid email regex")
});

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\(?\d[\d ().\-]{6,}\d").expect("valid phone regex"));

static WEBSITE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:https?://[^\s|,;<>()]+|(?:www\.)?(?:linkedin|github)\.com/[^\s|,;<>()]+)")
        .expect("valid website regex")
});

const PHONE_MIN_DIGITS: usize = 7;
const PHONE_MAX_DIGITS: usize = 15;

// ────────────────────────────────────────────────────────────────────────────
// Dates
// ────────────────────────────────────────────────────────────────────────────

/// A recognised `<start> [– <end>]` date token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: String,
    pub end: Option<String>,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.end {
            Some(end) => write!(f, "{} – {}", self.start, end),
            None => f.write_str(&self.start),
        }
    }
}

/// A date range plus the byte span it occupied in the searched text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateMatch {
    pub span: Range<usize>,
    pub range: DateRange,
}

/// All date ranges in `text`, in order of appearance, without overlaps.
pub fn find_date_ranges(text: &str) -> Vec<DateMatch> {
    let mut found: Vec<DateMatch> = MONTH_RANGE
        .captures_iter(text)
        .filter_map(|caps| date_match(&caps))
        .collect();

    for candidate in YEAR_RANGE.captures_iter(text).filter_map(|caps| date_match(&caps)) {
        let overlaps = found
            .iter()
            .any(|m| candidate.span.start < m.span.end && m.span.start < candidate.span.end);
        if !overlaps {
            found.push(candidate);
        }
    }

    found.sort_by_key(|m| m.span.start);
    found
}

pub fn first_date_range(text: &str) -> Option<DateMatch> {
    find_date_ranges(text).into_iter().next()
}

pub fn contains_date_range(text: &str) -> bool {
    MONTH_RANGE.is_match(text) || YEAR_RANGE.is_match(text)
}

/// Joins the given date ranges with an en-dash, e.g. `Sep 2015 – May 2019`.
pub fn joined_dates(matches: &[DateMatch]) -> Option<String> {
    if matches.is_empty() {
        return None;
    }
    Some(
        matches
            .iter()
            .map(|m| m.range.to_string())
            .collect::<Vec<_>>()
            .join(" – "),
    )
}

/// Returns `text` with the given spans cut out.
pub fn remove_spans(text: &str, matches: &[DateMatch]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for m in matches {
        if m.span.start >= cursor {
            out.push_str(&text[cursor..m.span.start]);
            cursor = m.span.end;
        }
    }
    out.push_str(&text[cursor..]);
    out
}

fn date_match(caps: &Captures<'_>) -> Option<DateMatch> {
    let whole = caps.get(0)?;
    let start = tidy_date_part(caps.name("start")?.as_str());
    let end = caps.name("end").map(|m| tidy_date_part(m.as_str()));
    Some(DateMatch {
        span: whole.range(),
        range: DateRange { start, end },
    })
}

fn tidy_date_part(part: &str) -> String {
    let part = collapse_whitespace(part);
    match part.to_ascii_lowercase().as_str() {
        "present" | "current" | "now" => "Present".to_string(),
        _ => part,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Locations, schools, degrees
// ────────────────────────────────────────────────────────────────────────────

/// First `City, ST` token starting at or after byte offset `from`.
pub fn find_location_from(text: &str, from: usize) -> Option<Range<usize>> {
    let m = CITY_STATE.find_at(text, from)?;
    let start = extend_city_prefix(text, m.start()).max(from);
    Some(start..m.end())
}

pub fn find_location(text: &str) -> Option<Range<usize>> {
    find_location_from(text, 0)
}

/// Walks back over single-space separated words that commonly open a city name.
fn extend_city_prefix(text: &str, mut start: usize) -> usize {
    for _ in 0..2 {
        let Some(rest) = text[..start].strip_suffix(' ') else {
            break;
        };
        if rest.ends_with(char::is_whitespace) {
            break;
        }
        let word_start = rest
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        if CITY_PREFIXES.contains(&&rest[word_start..]) {
            start = word_start;
        } else {
            break;
        }
    }
    start
}

pub fn find_schools(text: &str) -> Vec<Range<usize>> {
    SCHOOL.find_iter(text).map(|m| m.range()).collect()
}

pub fn find_school(text: &str) -> Option<Range<usize>> {
    SCHOOL.find(text).map(|m| m.range())
}

/// Degree phrase, falling back to `Minor in …` / `Major in …` phrasing.
pub fn find_degree(text: &str) -> Option<String> {
    let raw = DEGREE
        .find(text)
        .or_else(|| DEGREE_FIELD.find(text))?
        .as_str();
    let degree = tidy_degree(raw);
    (!degree.is_empty()).then_some(degree)
}

fn tidy_degree(raw: &str) -> String {
    let mut degree = raw;
    for stop in ["|", COLUMN_GAP, " GPA", " gpa"] {
        if let Some(idx) = degree.find(stop) {
            degree = &degree[..idx];
        }
    }
    let mut degree = collapse_whitespace(degree);
    loop {
        let Some(last) = degree.chars().last() else {
            break;
        };
        let strip = match last {
            ',' | ';' | ':' | '–' | '-' | '(' => true,
            c if c.is_ascii_digit() => true,
            // keep the dot in abbreviations such as `B.S.`
            '.' => degree
                .chars()
                .rev()
                .nth(1)
                .is_some_and(|c| c.is_lowercase()),
            _ => false,
        };
        if !strip {
            break;
        }
        degree.pop();
        let trimmed = degree.trim_end().len();
        degree.truncate(trimmed);
    }
    degree
}

// ────────────────────────────────────────────────────────────────────────────
// Contact tokens
// ────────────────────────────────────────────────────────────────────────────

pub fn find_email(text: &str) -> Option<&str> {
    EMAIL.find(text).map(|m| m.as_str())
}

pub fn find_phone(text: &str) -> Option<&str> {
    PHONE.find_iter(text).map(|m| m.as_str().trim()).find(|candidate| {
        let digits = candidate.chars().filter(char::is_ascii_digit).count();
        (PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits)
    })
}

pub fn find_website(text: &str) -> Option<&str> {
    WEBSITE
        .find(text)
        .map(|m| m.as_str().trim_end_matches(['.', ':', '!', '?']))
}

// ────────────────────────────────────────────────────────────────────────────
// Bullets and whitespace
// ────────────────────────────────────────────────────────────────────────────

/// True when the line opens with a bullet glyph or a `- ` / `* ` list marker.
pub fn is_bullet_line(line: &str) -> bool {
    bullet_body(line).is_some()
}

/// Rewrites any recognised bullet prefix to the canonical `• ` form.
pub fn canonical_bullet(line: &str) -> String {
    match bullet_body(line) {
        Some(body) => format!("{BULLET} {body}"),
        None => line.to_string(),
    }
}

/// The line without its bullet prefix, or the trimmed line when it has none.
pub fn strip_bullet(line: &str) -> &str {
    bullet_body(line).unwrap_or_else(|| line.trim())
}

fn bullet_body(line: &str) -> Option<&str> {
    let line = line.trim_start();
    if let Some(rest) = line.strip_prefix(BULLET_GLYPHS) {
        return Some(rest.trim_start());
    }
    ["- ", "* ", "– "]
        .iter()
        .find_map(|marker| line.strip_prefix(*marker))
        .map(str::trim_start)
}

/// Splits text on bullet glyphs, returning the text before the first bullet and every bullet item.
pub fn split_bullets(text: &str) -> (&str, Vec<String>) {
    let mut parts = text.split(BULLET_GLYPHS);
    let head = parts.next().unwrap_or_default().trim();
    let items = parts
        .map(collapse_whitespace)
        .filter(|item| !item.is_empty())
        .collect();
    (head, items)
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trims whitespace and dangling separators left behind after a token is cut out.
pub fn trim_separators(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || matches!(c, '|' | ',' | ';' | ':' | '-' | '–' | '—' | '·'))
}
