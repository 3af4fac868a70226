use crate::models::resume::ProjectEntry;
use crate::parser::patterns::{
    collapse_whitespace, find_date_ranges, joined_dates, remove_spans, split_bullets,
    trim_separators, COLUMN_GAP,
};

/// Bullets opening with one of these labels list technologies, not description.
const TECH_LABELS: &[&str] = &["technologies", "tech stack", "stack", "tech", "built with", "tools"];

/// A second pipe cell with more words than this is read as a description.
const TECH_CELL_MAX_WORDS: usize = 3;

pub fn extract_projects(fragments: &[String]) -> Vec<ProjectEntry> {
    fragments.iter().filter_map(|fragment| read_project(fragment)).collect()
}

fn read_project(fragment: &str) -> Option<ProjectEntry> {
    let (head, bullets) = split_bullets(fragment);
    let dates = find_date_ranges(head);
    let head = remove_spans(head, &dates);
    let head = trim_separators(&head);

    let (title, mut technologies, description) = split_head(head);

    let mut notes: Vec<String> = description.into_iter().collect();
    for bullet in bullets {
        match technology_bullet(&bullet) {
            Some(list) if technologies.is_none() => technologies = Some(list),
            _ => notes.push(bullet),
        }
    }
    let description = (!notes.is_empty()).then(|| notes.join("; "));

    if title.is_none() && description.is_none() {
        return None;
    }
    Some(ProjectEntry {
        title,
        description,
        technologies,
        dates: joined_dates(&dates),
    })
}

type HeadParts = (Option<String>, Option<Vec<String>>, Option<String>);

/// `title | technologies | description`, else `title: description` or
/// `title – description`, else a column gap, else the leading capitalised words.
fn split_head(head: &str) -> HeadParts {
    if head.contains('|') {
        let cells: Vec<&str> = head.split('|').map(str::trim).collect();
        let title = clean(cells[0]);
        return match cells.get(1..).unwrap_or_default() {
            [] => (title, None, None),
            [only] if !looks_like_tech_list(only) => (title, None, clean(only)),
            [tech, rest @ ..] => (title, split_technologies(tech), clean(&rest.join(" | "))),
        };
    }

    let split = [": ", " – ", " — ", " - ", COLUMN_GAP]
        .iter()
        .find_map(|sep| head.split_once(sep));
    if let Some((title, description)) = split {
        return (clean(title), None, clean(description));
    }

    let (title, description) = leading_capitalized(head);
    (clean(title), None, clean(description))
}

fn leading_capitalized(text: &str) -> (&str, &str) {
    let mut end = 0;
    for (start, word) in word_spans(text) {
        if !word.chars().next().is_some_and(|c| c.is_uppercase() || c.is_ascii_digit()) {
            break;
        }
        end = start + word.len();
    }
    (&text[..end], &text[end..])
}

fn word_spans(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split(' ')
        .scan(0, |offset, word| {
            let start = *offset;
            *offset += word.len() + 1;
            Some((start, word))
        })
        .filter(|(_, word)| !word.is_empty())
}

fn looks_like_tech_list(cell: &str) -> bool {
    cell.contains(',') || cell.split_whitespace().count() <= TECH_CELL_MAX_WORDS
}

/// Comma separated when commas are present, whitespace separated otherwise.
fn split_technologies(cell: &str) -> Option<Vec<String>> {
    let items: Vec<&str> = if cell.contains(',') {
        cell.split(',').collect()
    } else {
        cell.split_whitespace().collect()
    };

    let mut out: Vec<String> = Vec::new();
    for item in items {
        let item = collapse_whitespace(trim_separators(item));
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    (!out.is_empty()).then_some(out)
}

fn technology_bullet(bullet: &str) -> Option<Vec<String>> {
    let (label, list) = bullet.split_once(':')?;
    let label = label.trim().to_lowercase();
    if !TECH_LABELS.contains(&label.as_str()) {
        return None;
    }
    split_technologies(list)
}

fn clean(text: &str) -> Option<String> {
    let text = collapse_whitespace(trim_separators(text));
    (!text.is_empty()).then_some(text)
}
