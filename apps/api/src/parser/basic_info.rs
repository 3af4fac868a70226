use crate::models::resume::ContactInfo;
use crate::parser::patterns::{
    find_email, find_phone, find_website, trim_separators, BULLET_GLYPHS, COLUMN_GAP,
};

/// Pulls name, email, phone and website out of the header fragments.
///
/// The name is the first header line up to the first `|`, bullet, column gap or
/// contact token. A line that holds nothing but contact tokens is skipped. Contact tokens are searched across the whole header, so it does not matter
/// whether they share the name line or sit below it.
pub fn extract_basic_info(header: &[String]) -> ContactInfo {
    let name = header
        .iter()
        .map(|line| name_from_line(line))
        .find(|name| !name.is_empty())
        .unwrap_or_default();

    let joined = header.join(" ");
    ContactInfo {
        name,
        email: find_email(&joined).unwrap_or_default().to_string(),
        phone: find_phone(&joined).unwrap_or_default().to_string(),
        website: find_website(&joined).unwrap_or_default().to_string(),
    }
}

fn name_from_line(line: &str) -> String {
    let contact = [find_email(line), find_phone(line), find_website(line)]
        .into_iter()
        .flatten()
        .filter_map(|token| line.find(token));
    let cut = [line.find('|'), line.find(BULLET_GLYPHS), line.find(COLUMN_GAP)]
        .into_iter()
        .flatten()
        .chain(contact)
        .min()
        .unwrap_or(line.len());
    trim_separators(&line[..cut]).to_string()
}
