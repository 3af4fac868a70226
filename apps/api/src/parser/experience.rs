use tracing::debug;

use crate::models::resume::ExperienceEntry;
use crate::parser::patterns::{
    collapse_whitespace, first_date_range, find_location, split_bullets, trim_separators,
    COLUMN_GAP,
};

/// Title, company and location read from the text around an entry's date range.
#[derive(Debug, Default, PartialEq, Eq)]
struct Identity {
    title: Option<String>,
    company: Option<String>,
    location: Option<String>,
}

/// Reads one entry per merged experience fragment.
///
/// A fragment with no title (or an undated, bullet-less line after an entry,
/// which is almost always a wrapped bullet) is folded into the previous
/// entry's details instead of becoming an entry of its own.
pub fn extract_experience(fragments: &[String]) -> Vec<ExperienceEntry> {
    let mut entries: Vec<ExperienceEntry> = Vec::new();

    for fragment in fragments {
        let (entry, dated, has_bullets) = read_fragment(fragment);
        let standalone = entry.title.is_some() && (dated || has_bullets || entries.is_empty());

        if standalone {
            entries.push(entry);
            continue;
        }
        match entries.last_mut() {
            Some(prev) => {
                debug!(fragment = %fragment, "folding experience fragment into previous entry");
                prev.details.extend(continuation_details(fragment));
            }
            None if carries_anything(&entry) => entries.push(entry),
            None => {}
        }
    }
    entries
}

fn read_fragment(fragment: &str) -> (ExperienceEntry, bool, bool) {
    let (head, details) = split_bullets(fragment);
    let has_bullets = !details.is_empty();

    let Some(date) = first_date_range(head) else {
        let identity = parse_identity(head);
        return (identity.into_entry(None, details), false, has_bullets);
    };

    let before = trim_separators(&head[..date.span.start]);
    let after = trim_separators(&head[date.span.end..]);
    let dates = Some(date.range.to_string());

    if before.is_empty() {
        // date-first layout: `Jan 2020 – Present  Software Engineer  Acme Corp`
        return (parse_identity(after).into_entry(dates, details), true, has_bullets);
    }

    let mut identity = parse_identity(before);
    let mut details = details;
    if !after.is_empty() {
        let location = find_location(after);
        if identity.location.is_none() {
            identity.location = location.clone().map(|loc| after[loc].to_string());
        }
        let rest = match location {
            Some(loc) => format!("{}{COLUMN_GAP}{}", &after[..loc.start], &after[loc.end..]),
            None => after.to_string(),
        };
        let rest = clean_field(&rest);
        match rest {
            Some(rest) if identity.company.is_none() => identity.company = Some(rest),
            Some(rest) => details.insert(0, rest),
            None => {}
        }
    }
    (identity.into_entry(dates, details), true, has_bullets)
}

/// Splits identity text into title, company and location.
///
/// The first matching separator wins: ` at ` / ` @ `, then `|`, then the last
/// column gap, then a dash, then the last comma. Without any of them the whole
/// text is the title.
fn parse_identity(text: &str) -> Identity {
    let location = find_location(text);
    let (prefix, suffix) = match &location {
        Some(loc) => (&text[..loc.start], &text[loc.end..]),
        None => (text, ""),
    };
    let prefix = trim_separators(prefix);

    let (title, company) = split_title_company(prefix);
    let title = title.or_else(|| clean_field(suffix));

    Identity {
        title,
        company,
        location: location.map(|loc| text[loc].to_string()),
    }
}

fn split_title_company(text: &str) -> (Option<String>, Option<String>) {
    if text.is_empty() {
        return (None, None);
    }
    let split = [" at ", " @ "]
        .iter()
        .find_map(|sep| text.split_once(sep))
        .or_else(|| text.split_once('|'))
        .or_else(|| text.rsplit_once(COLUMN_GAP))
        .or_else(|| [" – ", " — ", " - "].iter().find_map(|sep| text.split_once(sep)))
        .or_else(|| text.rsplit_once(", "));

    match split {
        Some((title, company)) => (clean_field(title), clean_field(company)),
        None => (clean_field(text), None),
    }
}

impl Identity {
    fn into_entry(self, dates: Option<String>, details: Vec<String>) -> ExperienceEntry {
        ExperienceEntry {
            title: self.title,
            company: self.company,
            location: self.location,
            dates,
            details,
        }
    }
}

fn clean_field(text: &str) -> Option<String> {
    let text = collapse_whitespace(trim_separators(text));
    (!text.is_empty()).then_some(text)
}

fn continuation_details(fragment: &str) -> Vec<String> {
    let (head, items) = split_bullets(fragment);
    clean_field(head).into_iter().chain(items).collect()
}

fn carries_anything(entry: &ExperienceEntry) -> bool {
    entry.company.is_some()
        || entry.location.is_some()
        || entry.dates.is_some()
        || !entry.details.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_stacked_identity_lines() {
        let entries = extract_experience(&lines(&[
            "Software Engineer  Acme Corp  Boston, MA  June 2020 – Present  • Built things",
        ]));
        assert_eq!(
            entries,
            vec![ExperienceEntry {
                title: Some("Software Engineer".to_string()),
                company: Some("Acme Corp".to_string()),
                location: Some("Boston, MA".to_string()),
                dates: Some("June 2020 – Present".to_string()),
                details: vec!["Built things".to_string()],
            }]
        );
    }

    #[test]
    fn test_title_at_company() {
        let entries = extract_experience(&lines(&[
            "Data Analyst at Globex Inc. Chicago, IL Jan 2018 - Dec 2019  • Built reports",
        ]));
        let entry = &entries[0];
        assert_eq!(entry.title.as_deref(), Some("Data Analyst"));
        assert_eq!(entry.company.as_deref(), Some("Globex Inc."));
        assert_eq!(entry.location.as_deref(), Some("Chicago, IL"));
        assert_eq!(entry.dates.as_deref(), Some("Jan 2018 – Dec 2019"));
    }

    #[test]
    fn test_company_after_date() {
        let entries = extract_experience(&lines(&[
            "Software Engineer June 2020 – Present  Acme Corp  San Francisco, CA  • Built things  • Shipped it",
        ]));
        let entry = &entries[0];
        assert_eq!(entry.title.as_deref(), Some("Software Engineer"));
        assert_eq!(entry.company.as_deref(), Some("Acme Corp"));
        assert_eq!(entry.location.as_deref(), Some("San Francisco, CA"));
        assert_eq!(entry.details, vec!["Built things", "Shipped it"]);
    }

    #[test]
    fn test_date_first_layout() {
        let entries = extract_experience(&lines(&["Jan 2020 – Present  Backend Engineer | Initech"]));
        assert_eq!(entries[0].title.as_deref(), Some("Backend Engineer"));
        assert_eq!(entries[0].company.as_deref(), Some("Initech"));
        assert_eq!(entries[0].dates.as_deref(), Some("Jan 2020 – Present"));
    }

    #[test]
    fn test_comma_separated_identity() {
        let entries = extract_experience(&lines(&["Teaching Assistant, State College 2016 - 2018"]));
        assert_eq!(entries[0].title.as_deref(), Some("Teaching Assistant"));
        assert_eq!(entries[0].company.as_deref(), Some("State College"));
        assert_eq!(entries[0].dates.as_deref(), Some("2016 – 2018"));
    }

    #[test]
    fn test_undated_line_after_entry_is_folded() {
        let entries = extract_experience(&lines(&[
            "Engineer Jan 2019 – Present  • Built a pipeline",
            "Reduced latency by 40%",
        ]));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].details, vec!["Built a pipeline", "Reduced latency by 40%"]);
    }

    #[test]
    fn test_titleless_fragment_is_folded() {
        let entries = extract_experience(&lines(&[
            "Engineer Jan 2019 – Present  • Built a pipeline",
            "• Mentored two interns",
        ]));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].details.len(), 2);
    }

    #[test]
    fn test_entries_without_dates_need_bullets() {
        let entries = extract_experience(&lines(&[
            "Freelance Developer  • Built sites",
            "Volunteer Tutor  • Taught math",
        ]));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].title.as_deref(), Some("Volunteer Tutor"));
    }

    #[test]
    fn test_empty_bucket() {
        assert!(extract_experience(&[]).is_empty());
    }
}
