use tracing::debug;

use crate::models::resume::EducationEntry;
use crate::parser::patterns::{
    collapse_whitespace, contains_date_range, find_date_ranges, find_degree, find_location,
    find_location_from, find_school, find_schools, joined_dates, remove_spans, trim_separators,
    COLUMN_GAP,
};

/// Turns education fragments into entries, one per school.
///
/// The fragments are joined and cut into chunks at every line that opens with
/// (or contains) a school name. Each chunk is read independently; chunks that
/// carry no school are folded into their neighbours afterwards.
pub fn extract_education(fragments: &[String]) -> Vec<EducationEntry> {
    let text = fragments.join("\n");
    let drafts: Vec<EducationEntry> = chunks(&text).into_iter().map(read_chunk).collect();
    debug!(chunks = drafts.len(), "education chunks");
    fold_drafts(drafts)
}

fn chunks(text: &str) -> Vec<&str> {
    let mut starts: Vec<usize> = find_schools(text)
        .into_iter()
        .map(|span| text[..span.start].rfind('\n').map_or(0, |i| i + 1))
        .collect();
    starts.dedup();
    if starts.first() != Some(&0) {
        starts.insert(0, 0);
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            &text[start..end]
        })
        .filter(|chunk| !chunk.trim().is_empty())
        .collect()
}

fn read_chunk(chunk: &str) -> EducationEntry {
    let dates = find_date_ranges(chunk);
    let clean = remove_spans(chunk, &dates);

    let school = find_school(&clean);
    let location = match &school {
        Some(school) => find_location_from(&clean, school.end).or_else(|| find_location(&clean)),
        None => find_location(&clean),
    };

    let school = match (school, &location) {
        // a greedy school match can run into the city that follows it
        (Some(school), Some(loc)) if loc.start < school.end && loc.start > school.start => {
            let head = &clean[school.start..loc.start];
            Some(find_school(head).map_or(head, |inner| &head[inner]).to_string())
        }
        (Some(school), _) => Some(clean[school].to_string()),
        (None, _) => fallback_school(chunk, &clean, location.clone()),
    };

    EducationEntry {
        school: school
            .map(|s| collapse_whitespace(trim_separators(&s)))
            .filter(|s| !s.is_empty()),
        degree: find_degree(&clean),
        location: location.map(|loc| clean[loc].to_string()),
        dates: joined_dates(&dates),
    }
}

/// Institutions without a keyword (`MIT`, `Le Wagon`) are read from the first
/// line when that line is neither a degree nor a date.
fn fallback_school(
    chunk: &str,
    clean: &str,
    location: Option<std::ops::Range<usize>>,
) -> Option<String> {
    let first_raw = chunk.lines().next()?;
    if contains_date_range(first_raw) || find_degree(first_raw).is_some() {
        return None;
    }
    let first_len = clean.lines().next()?.len();
    let mut end = first_len;
    if let Some(loc) = location.filter(|loc| loc.start < first_len) {
        end = loc.start;
    }
    let line = &clean[..end];
    let line = [line.find(COLUMN_GAP), line.find('|')]
        .into_iter()
        .flatten()
        .min()
        .map_or(line, |cut| &line[..cut]);
    let candidate = trim_separators(line);
    candidate
        .chars()
        .next()
        .is_some_and(char::is_uppercase)
        .then(|| candidate.to_string())
}

fn fold_drafts(drafts: Vec<EducationEntry>) -> Vec<EducationEntry> {
    let mut entries: Vec<EducationEntry> = Vec::new();
    let mut orphan: Option<EducationEntry> = None;

    for draft in drafts.into_iter().filter(|draft| !draft.is_empty()) {
        if draft.school.is_some() {
            let mut entry = draft;
            if let Some(orphan) = orphan.take() {
                fill_missing(&mut entry, orphan);
            }
            entries.push(entry);
        } else if let Some(prev) = entries.last_mut() {
            absorb(prev, draft);
        } else {
            orphan = Some(match orphan.take() {
                Some(mut held) => {
                    absorb(&mut held, draft);
                    held
                }
                None => draft,
            });
        }
    }

    // nothing to attach to: keep it only if it names a degree
    if let Some(orphan) = orphan.filter(|orphan| orphan.degree.is_some()) {
        entries.push(orphan);
    }
    entries
}

/// Merges a continuation chunk into the entry before it.
fn absorb(target: &mut EducationEntry, draft: EducationEntry) {
    if let Some(extra) = draft.dates {
        target.dates = Some(match target.dates.take() {
            None => extra,
            Some(prev) if !prev.contains('–') => format!("{prev} – {extra}"),
            Some(prev) => format!("{prev} / {extra}"),
        });
    }
    fill_missing(
        target,
        EducationEntry {
            dates: None,
            ..draft
        },
    );
}

fn fill_missing(target: &mut EducationEntry, source: EducationEntry) {
    if target.school.is_none() {
        target.school = source.school;
    }
    if target.degree.is_none() {
        target.degree = source.degree;
    }
    if target.location.is_none() {
        target.location = source.location;
    }
    if target.dates.is_none() {
        target.dates = source.dates;
    }
}
