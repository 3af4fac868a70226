//! Text normalization applied to extracted résumé text before segmentation.
//!
//! After [`normalize_text`] every line is trimmed, runs of horizontal whitespace are
//! reduced to either one space or one [`COLUMN_GAP`], and every upper-case heading
//! that extraction glued onto neighbouring text sits on its own line.
//!
//! Headings are found as whole runs of upper-case words, so `RESEARCH EXPERIENCE`
//! moves as one line while `USER EXPERIENCE DESIGNER` is left alone. A run followed
//! by a colon and more text is a label (`LANGUAGES: Python, Go`) and stays inline.

use std::sync::LazyLock;

use regex::Regex;

use crate::parser::patterns::COLUMN_GAP;
use crate::parser::segmenter::{heading_bucket, match_heading_keyword};

/// A single capital letter followed by more single capitals: `E D U C A T I O N`.
static SPACED_CAPITALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z](?:[ \t]+[A-Z]\b)+").expect("valid spaced capitals regex")
});

static WIDE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:[ \t]{2,}|\t)").expect("valid wide whitespace regex"));

/// Maximal run of upper-case words, allowing `&` joins.
static UPPERCASE_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][A-Z'/\-]*(?:(?: &)? [A-Z][A-Z'/\-]*)*\b").expect("valid upper-case run regex")
});

/// Joins glyphs that PDF extraction spaced apart: `"W O R K"` becomes `"WORK"`.
pub fn repair_spaced_capitals(text: &str) -> String {
    SPACED_CAPITALS
        .replace_all(text, |caps: &regex::Captures<'_>| {
            caps[0].split_whitespace().collect::<String>()
        })
        .into_owned()
}

/// Cleans raw extracted text into the line-atomic form the segmenter expects.
pub fn normalize_text(raw: &str) -> String {
    let text = raw
        .trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace(['\r', '\u{0b}', '\u{0c}'], "\n")
        .replace(['\u{a0}', '\u{2007}', '\u{202f}'], " ");

    let text = repair_spaced_capitals(&text);
    let lines: Vec<String> = text.lines().map(split_glued_headings).collect();

    lines
        .iter()
        .flat_map(|line| line.lines())
        .map(|line| WIDE_WHITESPACE.replace_all(line.trim(), COLUMN_GAP))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Moves upper-case headings that share a line with other text onto their own line.
fn split_glued_headings(line: &str) -> String {
    let line = line.trim();
    let mut out = String::with_capacity(line.len() + 4);
    let mut last = 0;

    for run in UPPERCASE_RUN.find_iter(line) {
        let rest = &line[run.end()..];
        if rest.strip_prefix(':').is_some_and(|label| !label.trim().is_empty()) {
            continue;
        }
        let Some(start) = heading_start(run.as_str()).map(|offset| run.start() + offset) else {
            continue;
        };
        let end = if rest.starts_with(':') { run.end() + 1 } else { run.end() };
        if line[..start].trim().is_empty() && line[end..].trim().is_empty() {
            continue;
        }

        out.push_str(&line[last..start]);
        out.push('\n');
        out.push_str(&line[start..end]);
        out.push('\n');
        last = end;
    }
    out.push_str(&line[last..]);
    out
}

/// Offset of the heading inside an upper-case run.
///
/// The whole run may be a qualified heading; otherwise only a trailing exact
/// keyword (`MA SKILLS` → `SKILLS`) is split off.
fn heading_start(run: &str) -> Option<usize> {
    if heading_bucket(run).is_some() {
        return Some(0);
    }
    run.match_indices(' ')
        .map(|(offset, _)| offset + 1)
        .find(|&offset| match_heading_keyword(&run[offset..]).is_some())
}
