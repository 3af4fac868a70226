// Résumé parsing engine
// Implements: text normalization, section segmentation, per-bucket field extraction.
// Pure and synchronous: no I/O, no configuration, no state between calls.

pub mod basic_info;
pub mod education;
pub mod experience;
pub mod handlers;
pub mod normalize;
pub mod patterns;
pub mod projects;
pub mod segmenter;
pub mod skills;

use thiserror::Error;
use tracing::debug;

use crate::models::resume::ResumeRecord;
use crate::parser::segmenter::Sections;

/// Input the engine refuses to process. Heuristic misses are never errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("input text is empty")]
    EmptyInput,

    #[error("input is not text (NUL byte at offset {0})")]
    NotText(usize),
}

/// Full pipeline: validate, normalize, segment, extract.
pub fn parse_resume(raw: &str) -> Result<ResumeRecord, ParseError> {
    let sections = parse_sections(raw)?;
    Ok(extract_record(&sections))
}

/// Validates and segments `raw` without running the field extractors.
pub fn parse_sections(raw: &str) -> Result<Sections, ParseError> {
    validate(raw)?;
    let text = normalize::normalize_text(raw);
    Ok(segmenter::segment(&text))
}

/// Runs every field extractor over its bucket.
pub fn extract_record(sections: &Sections) -> ResumeRecord {
    let info = basic_info::extract_basic_info(&sections.header);
    let education = education::extract_education(&sections.education);
    let experience = experience::extract_experience(&sections.experience);
    let projects = projects::extract_projects(&sections.projects);
    let skills = skills::extract_skills(&sections.skills);

    debug!(
        education = education.len(),
        experience = experience.len(),
        projects = projects.len(),
        skills = skills.len(),
        "extracted résumé record"
    );

    ResumeRecord::new(info, education, experience, projects, skills)
}

fn validate(raw: &str) -> Result<(), ParseError> {
    if let Some(offset) = raw.find('\0') {
        return Err(ParseError::NotText(offset));
    }
    if raw.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{EducationEntry, ExperienceEntry, SkillGroup};

    const CLEAN: &str = "Jane Doe\njane@x.com\n555-000-1111\nEDUCATION\nBoston University Boston, MA\nB.S. in Computer Science\nSep 2016 – May 2020\nEXPERIENCE\nSoftware Engineer\nAcme Corp\nBoston, MA\nJune 2020 – Present\n• Built things\nSKILLS\nLanguages: Python, Go, Rust";

    #[test]
    fn test_clean_input_scenario() {
        let record = parse_resume(CLEAN).unwrap();

        assert_eq!(record.name, "Jane Doe");
        assert_eq!(record.contact.email, "jane@x.com");
        assert_eq!(record.contact.phone, "555-000-1111");

        assert_eq!(record.education.len(), 1);
        let education = &record.education[0];
        assert_eq!(education.school.as_deref(), Some("Boston University"));
        assert_eq!(education.dates.as_deref(), Some("Sep 2016 – May 2020"));

        assert_eq!(
            record.experience,
            vec![ExperienceEntry {
                title: Some("Software Engineer".to_string()),
                company: Some("Acme Corp".to_string()),
                location: Some("Boston, MA".to_string()),
                dates: Some("June 2020 – Present".to_string()),
                details: vec!["Built things".to_string()],
            }]
        );

        assert_eq!(
            record.skills,
            vec![SkillGroup {
                category: "Languages".to_string(),
                items: vec!["Python".to_string(), "Go".to_string(), "Rust".to_string()],
            }]
        );
        assert!(record.projects.is_empty());
        assert!(record.has_signal());
    }

    #[test]
    fn test_no_headings_yields_no_signal() {
        let record = parse_resume("I enjoy hiking and cooking.\nReach me any time.").unwrap();
        assert_eq!(record.name, "I enjoy hiking and cooking.");
        assert!(record.education.is_empty());
        assert!(record.experience.is_empty());
        assert!(record.projects.is_empty());
        assert!(record.skills.is_empty());
        assert!(!record.has_signal());
    }

    #[test]
    fn test_ocr_spaced_heading() {
        let record =
            parse_resume("Jane Doe\nE D U C A T I O N\nAcme University Boston, MA\nSep 2015\nMay 2019")
                .unwrap();
        assert_eq!(
            record.education,
            vec![EducationEntry {
                school: Some("Acme University".to_string()),
                degree: None,
                location: Some("Boston, MA".to_string()),
                dates: Some("Sep 2015 – May 2019".to_string()),
            }]
        );
    }

    #[test]
    fn test_single_line_extraction_output() {
        // text layers that lost every newline still split at upper-case headings
        let raw = "Jane Doe jane@x.com EDUCATION Boston University Boston, MA SKILLS Languages: Rust, Go";
        let record = parse_resume(raw).unwrap();
        assert_eq!(record.name, "Jane Doe");
        assert_eq!(record.contact.email, "jane@x.com");
        assert_eq!(record.education[0].school.as_deref(), Some("Boston University"));
        assert_eq!(record.skills[0].items, vec!["Rust", "Go"]);
    }

    #[test]
    fn test_upper_case_skill_categories() {
        let record = parse_resume("Jane Doe\nSKILLS\nLANGUAGES: Python, Go\nTOOLS: Git, Docker").unwrap();
        assert_eq!(
            record.skills,
            vec![
                SkillGroup {
                    category: "LANGUAGES".to_string(),
                    items: vec!["Python".to_string(), "Go".to_string()],
                },
                SkillGroup {
                    category: "TOOLS".to_string(),
                    items: vec!["Git".to_string(), "Docker".to_string()],
                },
            ]
        );
    }

    #[test]
    fn test_upper_case_title_with_keyword() {
        let raw = "Jane Doe\nEXPERIENCE\nUSER EXPERIENCE DESIGNER  Acme  Jan 2019 – Present\n• Led research";
        let record = parse_resume(raw).unwrap();
        assert_eq!(record.experience.len(), 1);
        assert_eq!(record.experience[0].title.as_deref(), Some("USER EXPERIENCE DESIGNER"));
        assert_eq!(record.experience[0].details, vec!["Led research"]);
    }

    #[test]
    fn test_qualified_headings() {
        let raw = "Jane Doe\nEXPERIENCE & LEADERSHIP\nSoftware Engineer  Acme Corp  Jan 2019 – Present\n• Built things\nRESEARCH EXPERIENCE\nResearch Assistant  Sep 2017 – May 2018\n• Ran trials\nEDUCATION AND TRAINING\nBoston University Boston, MA";
        let record = parse_resume(raw).unwrap();

        let titles: Vec<_> = record
            .experience
            .iter()
            .map(|entry| entry.title.as_deref())
            .collect();
        assert_eq!(titles, vec![Some("Software Engineer"), Some("Research Assistant")]);
        assert_eq!(record.experience[0].details, vec!["Built things"]);
        assert_eq!(record.experience[1].details, vec!["Ran trials"]);
        assert_eq!(record.education[0].school.as_deref(), Some("Boston University"));
    }

    #[test]
    fn test_undated_jobs_stay_separate() {
        let raw = "Jane Doe\nEXPERIENCE\nFreelance Developer\n• Built sites\nVolunteer Tutor\n• Taught math";
        let record = parse_resume(raw).unwrap();
        assert_eq!(
            record.experience,
            vec![
                ExperienceEntry {
                    title: Some("Freelance Developer".to_string()),
                    details: vec!["Built sites".to_string()],
                    ..Default::default()
                },
                ExperienceEntry {
                    title: Some("Volunteer Tutor".to_string()),
                    details: vec!["Taught math".to_string()],
                    ..Default::default()
                },
            ]
        );
    }

    #[test]
    fn test_parse_is_idempotent() {
        assert_eq!(parse_resume(CLEAN), parse_resume(CLEAN));
    }

    #[test]
    fn test_rejects_empty_and_binary_input() {
        assert_eq!(parse_resume("  \n\t "), Err(ParseError::EmptyInput));
        assert_eq!(parse_resume("%PDF\0\x01"), Err(ParseError::NotText(4)));
    }

    #[test]
    fn test_sections_exposes_buckets() {
        let sections = parse_sections(CLEAN).unwrap();
        assert_eq!(sections.header.len(), 3);
        assert_eq!(sections.experience.len(), 1);
        assert_eq!(sections.skills, vec!["Languages: Python, Go, Rust"]);
    }
}
