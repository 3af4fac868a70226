use tracing::debug;

use crate::models::resume::SkillGroup;
use crate::parser::patterns::{collapse_whitespace, strip_bullet, COLUMN_GAP};

/// Reads `Category: item, item; item` lines into skill groups.
///
/// A line without a colon is dropped unless the line before it ended with a
/// list separator, in which case its items extend the previous group.
pub fn extract_skills(fragments: &[String]) -> Vec<SkillGroup> {
    let mut groups: Vec<SkillGroup> = Vec::new();
    let mut continues = false;

    for cell in fragments.iter().flat_map(|line| cells(strip_bullet(line))) {
        match cell.split_once(':') {
            Some((category, items)) => {
                let category = collapse_whitespace(category);
                let items = split_items(items);
                if category.is_empty() || items.is_empty() {
                    continues = false;
                    continue;
                }
                groups.push(SkillGroup { category, items });
            }
            None if continues => {
                if let Some(group) = groups.last_mut() {
                    group.items.extend(split_items(cell));
                }
            }
            None => debug!(line = cell, "skill line without a category ignored"),
        }
        continues = cell.trim_end().ends_with([',', ';']);
    }
    groups
}

/// Two-column layouts put several groups on one line; split where a new
/// `Category:` cell starts after a column gap.
fn cells(line: &str) -> Vec<&str> {
    let mut cells: Vec<&str> = Vec::new();
    let mut start = 0;
    let mut offset = 0;
    for (i, part) in line.split(COLUMN_GAP).enumerate() {
        if i > 0 && part.contains(':') && line[start..offset].contains(':') {
            cells.push(line[start..offset].trim());
            start = offset;
        }
        offset += part.len() + COLUMN_GAP.len();
    }
    cells.push(line[start..].trim());
    cells.retain(|cell| !cell.is_empty());
    cells
}

fn split_items(text: &str) -> Vec<String> {
    text.split([',', ';'])
        .map(collapse_whitespace)
        .filter(|item| !item.is_empty())
        .collect()
}
