//! Heuristic structural segmentation of extracted text
//!
//! Lines are walked in order while a running byte offset is kept. Headings open
//! sections, bullet and numbered lines are grouped into lists, and everything else
//! is a paragraph owned by whichever section is open. Classification is keyword
//! based and approximate, which is why every section carries a confidence score.

use crate::config::SegmenterConfig;
use crate::error::{Result, ResumeIndexerError};
use crate::input::parser::is_fully_uppercase;
use crate::processing::document::{
    DocumentList, DocumentSection, DocumentStructure, Heading, ListItem, Paragraph, SectionType,
};
use aho_corasick::AhoCorasick;
use regex::Regex;

/// Keyword table in priority order: the earliest entry that occurs in a title wins.
const SECTION_KEYWORDS: &[(SectionType, &[&str])] = &[
    (SectionType::Contact, &["contact", "personal information", "personal details"]),
    (SectionType::Summary, &["summary", "profile", "objective", "about me"]),
    (SectionType::Experience, &["experience", "employment", "work history"]),
    (SectionType::Education, &["education", "academic", "qualifications"]),
    (SectionType::Skills, &["skills", "competencies", "technologies", "expertise"]),
    (SectionType::Projects, &["projects", "portfolio"]),
];

struct OpenSection {
    title: String,
    section_type: SectionType,
    start: usize,
}

pub struct StructuralSegmenter {
    config: SegmenterConfig,
    all_caps_regex: Regex,
    keyword_prefix_regex: Regex,
    list_item_regex: Regex,
    classifier: AhoCorasick,
    classifier_types: Vec<SectionType>,
}

impl Default for StructuralSegmenter {
    fn default() -> Self {
        Self::new(SegmenterConfig::default())
    }
}

impl StructuralSegmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        let all_caps_regex = Regex::new(r"^[A-Z\s]+$").expect("Invalid all-caps regex");
        let keyword_prefix_regex =
            Regex::new(r"(?i)^(summary|experience|education|skills|projects|contact)\b")
                .expect("Invalid section keyword regex");
        let list_item_regex =
            Regex::new(r"^(?:(?P<bullet>[-*+•])\s+|(?P<number>\d+)\.(?:\s+|$))(?P<text>.*)$")
                .expect("Invalid list item regex");

        let mut patterns = Vec::new();
        let mut classifier_types = Vec::new();
        for (section_type, keywords) in SECTION_KEYWORDS {
            for keyword in keywords.iter() {
                patterns.push(*keyword);
                classifier_types.push(*section_type);
            }
        }
        let classifier = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&patterns)
            .expect("Invalid section keyword patterns");

        Self {
            config,
            all_caps_regex,
            keyword_prefix_regex,
            list_item_regex,
            classifier,
            classifier_types,
        }
    }

    pub fn segment(&self, text: &str) -> Result<DocumentStructure> {
        let line_count = text.lines().count();
        if line_count > self.config.max_lines {
            return Err(ResumeIndexerError::InvalidInput(format!(
                "document has {} lines, segmentation limit is {}",
                line_count, self.config.max_lines
            )));
        }

        let mut structure = DocumentStructure::default();
        let mut open: Option<OpenSection> = None;
        let mut open_list: Option<DocumentList> = None;
        let mut offset = 0usize;

        for raw_line in text.split('\n') {
            let line_start = offset;
            offset += raw_line.len() + 1;

            let line = raw_line.trim();
            if line.is_empty() {
                flush_list(&mut open_list, &mut structure);
                continue;
            }
            let content_offset = line_start + (raw_line.len() - raw_line.trim_start().len());

            if self.is_heading(line) {
                flush_list(&mut open_list, &mut structure);
                if let Some(section) = open.take() {
                    let end = line_start.saturating_sub(1);
                    structure.sections.push(self.close_section(section, end, text));
                }

                structure.headings.push(Heading {
                    text: line.to_string(),
                    level: if is_fully_uppercase(line) { 1 } else { 2 },
                    offset: content_offset,
                });
                open = Some(OpenSection {
                    title: line.trim_end_matches(':').trim().to_string(),
                    section_type: self.classify(line),
                    start: offset.min(text.len()),
                });
            } else if let Some(caps) = self.list_item_regex.captures(line) {
                let ordered = caps.name("number").is_some();
                let item = ListItem {
                    text: caps["text"].trim().to_string(),
                    offset: content_offset,
                };

                match open_list.as_mut() {
                    Some(list) if list.ordered == ordered => list.items.push(item),
                    _ => {
                        flush_list(&mut open_list, &mut structure);
                        open_list = Some(DocumentList {
                            ordered,
                            offset: content_offset,
                            items: vec![item],
                        });
                    }
                }
            } else {
                flush_list(&mut open_list, &mut structure);
                structure.paragraphs.push(Paragraph {
                    text: line.to_string(),
                    offset: content_offset,
                    section_index: open.as_ref().map(|_| structure.sections.len()),
                });
            }
        }

        flush_list(&mut open_list, &mut structure);
        if let Some(section) = open.take() {
            structure.sections.push(self.close_section(section, text.len(), text));
        }

        Ok(structure)
    }

    /// Short line that is all caps, ends with a colon, or starts with a section keyword.
    pub fn is_heading(&self, line: &str) -> bool {
        line.chars().count() < self.config.heading_max_length
            && (is_fully_uppercase(line)
                || self.all_caps_regex.is_match(line)
                || line.ends_with(':')
                || self.keyword_prefix_regex.is_match(line))
    }

    pub fn classify(&self, title: &str) -> SectionType {
        self.classifier
            .find_overlapping_iter(title)
            .map(|m| m.pattern().as_usize())
            .min()
            .map(|idx| self.classifier_types[idx])
            .unwrap_or(SectionType::Other)
    }

    fn close_section(&self, section: OpenSection, end: usize, text: &str) -> DocumentSection {
        // An empty section ends where it starts.
        let end = end.max(section.start);
        DocumentSection {
            title: section.title,
            section_type: section.section_type,
            content: text[section.start..end].trim_end().to_string(),
            start_offset: section.start,
            end_offset: end,
            confidence: self.config.section_confidence,
        }
    }
}

fn flush_list(open_list: &mut Option<DocumentList>, structure: &mut DocumentStructure) {
    if let Some(list) = open_list.take() {
        structure.lists.push(list);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(text: &str) -> DocumentStructure {
        StructuralSegmenter::default().segment(text).unwrap()
    }

    #[test]
    fn test_two_sections_split_at_heading() {
        let structure = segment("EXPERIENCE:\nDid X\nDid Y\nEDUCATION:\nSchool Z");

        assert_eq!(structure.sections.len(), 2);
        let experience = &structure.sections[0];
        let education = &structure.sections[1];

        assert_eq!(experience.section_type, SectionType::Experience);
        assert_eq!(education.section_type, SectionType::Education);
        assert!(experience.content.contains("Did X"));
        assert!(experience.content.contains("Did Y"));
        assert!(!experience.content.contains("School Z"));
        assert_eq!(education.content, "School Z");
        assert_eq!(experience.title, "EXPERIENCE");
    }

    #[test]
    fn test_section_offsets_are_ordered_and_disjoint() {
        let text = "Jane Doe\nSUMMARY\nBuilder of things\n\nSKILLS\n- Rust\n- Go\nPROJECTS\nPROJECTS\n";
        let structure = segment(text);

        for pair in structure.sections.windows(2) {
            assert!(pair[0].start_offset <= pair[0].end_offset);
            assert!(pair[0].end_offset <= pair[1].start_offset);
        }
        for section in &structure.sections {
            assert!(section.end_offset <= text.len());
        }
    }

    #[test]
    fn test_empty_section_is_valid() {
        let structure = segment("SKILLS\nEDUCATION\nBoston University");

        assert_eq!(structure.sections.len(), 2);
        let skills = &structure.sections[0];
        assert_eq!(skills.content, "");
        assert_eq!(skills.start_offset, skills.end_offset);
    }

    #[test]
    fn test_lists_and_paragraphs() {
        let text = "Contact me below\nSkills\n- Rust\n* Python\n1. First\n2. Second\nLoves climbing";
        let structure = segment(text);

        // "Contact me below" is a keyword-prefixed heading, "Skills" another.
        assert_eq!(structure.headings.len(), 2);
        assert_eq!(structure.lists.len(), 2);
        assert!(!structure.lists[0].ordered);
        assert_eq!(structure.lists[0].items.len(), 2);
        assert_eq!(structure.lists[0].items[1].text, "Python");
        assert!(structure.lists[1].ordered);
        assert_eq!(structure.lists[1].items[0].text, "First");

        assert_eq!(structure.paragraphs.len(), 1);
        assert_eq!(structure.paragraphs[0].section_index, Some(1));
    }

    #[test]
    fn test_heading_takes_precedence_over_list_item() {
        let segmenter = StructuralSegmenter::default();
        assert!(segmenter.is_heading("- TOOLS"));

        let structure = segment("- TOOLS\n- hammer");
        assert_eq!(structure.headings.len(), 1);
        assert_eq!(structure.lists.len(), 1);
    }

    #[test]
    fn test_paragraph_before_first_heading_has_no_section() {
        let structure = segment("Jane Doe\njane@example.com\nSKILLS\nRust");
        assert_eq!(structure.paragraphs[0].section_index, None);
        assert_eq!(structure.paragraphs[2].section_index, Some(0));
    }

    #[test]
    fn test_classification_is_heuristic() {
        let segmenter = StructuralSegmenter::default();
        assert_eq!(segmenter.classify("Professional Experience"), SectionType::Experience);
        assert_eq!(segmenter.classify("technical skills"), SectionType::Skills);
        assert_eq!(segmenter.classify("Contact Information"), SectionType::Contact);
        assert_eq!(segmenter.classify("Hobbies"), SectionType::Other);
        // table order decides when several keywords appear
        assert_eq!(segmenter.classify("Skills and Experience"), SectionType::Experience);
    }

    #[test]
    fn test_keyword_prefix_needs_word_boundary() {
        let segmenter = StructuralSegmenter::default();
        assert!(segmenter.is_heading("Experience"));
        assert!(!segmenter.is_heading("Experienced engineer with a decade of work"));
    }

    #[test]
    fn test_confidence_is_constant() {
        let structure = segment("SUMMARY\nx\nOTHER STUFF\ny");
        assert!(structure.sections.iter().all(|s| (s.confidence - 0.8).abs() < f32::EPSILON));
    }

    #[test]
    fn test_line_limit() {
        let config = SegmenterConfig {
            max_lines: 2,
            ..SegmenterConfig::default()
        };
        let segmenter = StructuralSegmenter::new(config);
        assert!(segmenter.segment("a\nb\nc").is_err());
    }
}
