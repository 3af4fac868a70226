//! Section segmenter: classifies normalized résumé lines into section buckets.
//!
//! The segmenter is a state machine folded over the input lines. The state is the
//! current bucket, the entry being assembled (experience and projects only) and
//! the fragments completed so far. [`step`] is the whole transition function:
//! it consumes one state and one line and returns the next state.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::parser::normalize::repair_spaced_capitals;
use crate::parser::patterns::{canonical_bullet, contains_date_range, is_bullet_line, COLUMN_GAP};

/// Lines longer than this are never headings, even when they reduce to a keyword.
pub const HEADING_MAX_WORDS: usize = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionBucket {
    #[default]
    Header,
    Education,
    Experience,
    Projects,
    Skills,
}

impl SectionBucket {
    pub const ALL: [SectionBucket; 5] = [
        SectionBucket::Header,
        SectionBucket::Education,
        SectionBucket::Experience,
        SectionBucket::Projects,
        SectionBucket::Skills,
    ];

    /// Buckets that can be entered through a heading.
    pub const TYPED: [SectionBucket; 4] = [
        SectionBucket::Education,
        SectionBucket::Experience,
        SectionBucket::Projects,
        SectionBucket::Skills,
    ];

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            SectionBucket::Header => &[],
            SectionBucket::Education => &[
                "education",
                "academic background",
                "studies",
                "qualifications",
                "certifications",
                "certification",
                "training",
                "academics",
            ],
            SectionBucket::Experience => &[
                "experience",
                "employment",
                "work history",
                "professional experience",
                "career",
                "work experience",
                "positions",
                "roles",
                "employment history",
            ],
            SectionBucket::Projects => &[
                "projects",
                "portfolio",
                "case studies",
                "accomplishments",
                "notable work",
                "personal projects",
                "initiatives",
            ],
            SectionBucket::Skills => &[
                "skills",
                "technical skills",
                "technologies",
                "competencies",
                "abilities",
                "tools",
                "languages",
                "proficiencies",
                "expertise",
            ],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SectionBucket::Header => "header",
            SectionBucket::Education => "education",
            SectionBucket::Experience => "experience",
            SectionBucket::Projects => "projects",
            SectionBucket::Skills => "skills",
        }
    }

    /// Experience and project lines are merged into one fragment per entry.
    fn merges_entries(self) -> bool {
        matches!(self, SectionBucket::Experience | SectionBucket::Projects)
    }
}

/// Ordered mapping from bucket to its fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sections {
    pub header: Vec<String>,
    pub education: Vec<String>,
    pub experience: Vec<String>,
    pub projects: Vec<String>,
    pub skills: Vec<String>,
}

impl Sections {
    pub fn get(&self, bucket: SectionBucket) -> &[String] {
        match bucket {
            SectionBucket::Header => &self.header,
            SectionBucket::Education => &self.education,
            SectionBucket::Experience => &self.experience,
            SectionBucket::Projects => &self.projects,
            SectionBucket::Skills => &self.skills,
        }
    }

    fn get_mut(&mut self, bucket: SectionBucket) -> &mut Vec<String> {
        match bucket {
            SectionBucket::Header => &mut self.header,
            SectionBucket::Education => &mut self.education,
            SectionBucket::Experience => &mut self.experience,
            SectionBucket::Projects => &mut self.projects,
            SectionBucket::Skills => &mut self.skills,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (SectionBucket, &[String])> + '_ {
        SectionBucket::ALL
            .into_iter()
            .map(move |bucket| (bucket, self.get(bucket)))
    }
}

/// Entry being assembled inside the experience or projects bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
struct EntryBuffer {
    text: String,
    has_date: bool,
    has_bullet: bool,
    ends_with_bullet: bool,
}

impl EntryBuffer {
    fn open(line: &str) -> Self {
        Self {
            text: String::new(),
            has_date: false,
            has_bullet: false,
            ends_with_bullet: false,
        }
        .append(line)
    }

    fn append(mut self, line: &str) -> Self {
        if !self.text.is_empty() {
            self.text.push_str(COLUMN_GAP);
        }
        self.text.push_str(line);
        self.ends_with_bullet = is_bullet_line(line);
        if self.ends_with_bullet {
            self.has_bullet = true;
        } else if contains_date_range(line) {
            self.has_date = true;
        }
        self
    }

    /// An entry is complete once its heading is closed by details.
    fn is_complete(&self, bucket: SectionBucket) -> bool {
        match bucket {
            SectionBucket::Experience => self.has_date && self.has_bullet,
            _ => self.has_bullet,
        }
    }

    fn starts_new_entry(&self, line: &str, bucket: SectionBucket) -> bool {
        if is_bullet_line(line) {
            return false;
        }
        if bucket == SectionBucket::Projects && line.contains('|') {
            return true;
        }
        if self.has_date && contains_date_range(line) {
            return true;
        }
        // A capitalised line right after a bullet closes even an undated entry;
        // lower-case lines there are wrapped bullet text.
        starts_uppercase(line) && (self.ends_with_bullet || self.is_complete(bucket))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentState {
    bucket: SectionBucket,
    open: Option<EntryBuffer>,
    sections: Sections,
}

impl SegmentState {
    pub fn bucket(&self) -> SectionBucket {
        self.bucket
    }

    fn flush(mut self) -> Self {
        if let Some(entry) = self.open.take() {
            self.sections.get_mut(self.bucket).push(entry.text);
        }
        self
    }

    pub fn finish(self) -> Sections {
        self.flush().sections
    }
}

/// Splits normalized text into buckets.
///
/// Lines are trimmed and blank lines dropped. Heading lines are consumed; every
/// other line lands in exactly one fragment of exactly one bucket.
pub fn segment(text: &str) -> Sections {
    let repaired = repair_spaced_capitals(text);
    repaired
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .fold(SegmentState::default(), step)
        .finish()
}

/// Transition function of the segmenter.
pub fn step(state: SegmentState, line: &str) -> SegmentState {
    if let Some(bucket) = heading_bucket(line) {
        let state = state.flush();
        debug!(from = state.bucket.as_str(), to = bucket.as_str(), "section heading");
        return SegmentState { bucket, ..state };
    }

    let mut state = state;
    let bucket = state.bucket;
    if !bucket.merges_entries() {
        state.sections.get_mut(bucket).push(line.to_string());
        return state;
    }

    let line = canonical_bullet(line);
    match state.open.take() {
        Some(entry) if entry.starts_new_entry(&line, bucket) => {
            state.sections.get_mut(bucket).push(entry.text);
            state.open = Some(EntryBuffer::open(&line));
        }
        Some(entry) => state.open = Some(entry.append(&line)),
        None => state.open = Some(EntryBuffer::open(&line)),
    }
    state
}

/// Bucket named by `line` when the line is a heading.
///
/// Besides exact keyword lines, an all-caps line is a heading when it ends in a
/// keyword (`RESEARCH EXPERIENCE`) or when the part before an `&` / `AND` join
/// does (`EXPERIENCE & LEADERSHIP`).
pub fn heading_bucket(line: &str) -> Option<SectionBucket> {
    let bucket = match_heading_keyword(line).or_else(|| qualified_heading(line))?;
    let words = line.split_whitespace().count();
    if words > HEADING_MAX_WORDS {
        debug!(line, words, "ignoring heading keyword on a long line");
        return None;
    }
    Some(bucket)
}

/// Keyword match on the lowercased, punctuation-free form of the line.
///
/// Spaces are ignored in the comparison so `w o r k  e x p e r i e n c e` still
/// matches `work experience`.
pub fn match_heading_keyword(line: &str) -> Option<SectionBucket> {
    let key = heading_key(line);
    if key.is_empty() {
        return None;
    }
    SectionBucket::TYPED.into_iter().find(|bucket| {
        bucket
            .keywords()
            .iter()
            .any(|keyword| keyword.replace(' ', "") == key)
    })
}

fn qualified_heading(line: &str) -> Option<SectionBucket> {
    let line = line.trim().trim_end_matches(':');
    let all_caps = line
        .chars()
        .all(|c| c.is_ascii_uppercase() || c == ' ' || c == '&');
    if line.is_empty() || !all_caps {
        return None;
    }

    let words: Vec<String> = line.split_whitespace().map(str::to_lowercase).collect();
    let head_len = words
        .iter()
        .position(|word| word == "&" || word == "and")
        .unwrap_or(words.len());
    let head = &words[..head_len];

    SectionBucket::TYPED
        .into_iter()
        .flat_map(|bucket| bucket.keywords().iter().map(move |keyword| (bucket, *keyword)))
        .filter(|(_, keyword)| {
            let keyword: Vec<&str> = keyword.split(' ').collect();
            let Some(qualifiers) = head.len().checked_sub(keyword.len()) else {
                return false;
            };
            // two-letter qualifiers are state codes or initials, not heading words
            head[..qualifiers].iter().all(|word| word.len() >= 3)
                && head[qualifiers..]
                    .iter()
                    .zip(&keyword)
                    .all(|(word, expected)| word == expected)
        })
        .max_by_key(|(_, keyword)| keyword.len())
        .map(|(bucket, _)| bucket)
}

fn heading_key(line: &str) -> String {
    line.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || *c == '&')
        .collect()
}

fn starts_uppercase(line: &str) -> bool {
    line.chars().next().is_some_and(char::is_uppercase)
}
