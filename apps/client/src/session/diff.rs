//! Structural dirty detection for edit sessions.
//!
//! Compares a working copy against the baseline snapshot field by
//! field: the flat personal-info block first (cheapest, short-circuits
//! most of the time), then the three ordered sequences. Order matters:
//! reordering two experiences is a real edit. Skills and certifications
//! are not inspected here: they are mutated through the quick-save
//! channel, never through the edit form.

use crate::models::cv::{CvRecord, Experience, Formation, LanguageSkill, PersonalInfo};

/// True when `working` differs from `baseline` in any edited field.
pub fn records_differ(working: &CvRecord, baseline: &CvRecord) -> bool {
    personal_differs(&working.personal, &baseline.personal)
        || experiences_differ(&working.experiences, &baseline.experiences)
        || formations_differ(&working.formations, &baseline.formations)
        || languages_differ(&working.languages, &baseline.languages)
}

fn personal_differs(a: &PersonalInfo, b: &PersonalInfo) -> bool {
    a.name != b.name || a.email != b.email || a.phone != b.phone || a.address != b.address
}

fn experiences_differ(a: &[Experience], b: &[Experience]) -> bool {
    a.len() != b.len()
        || a.iter().zip(b).any(|(x, y)| {
            x.period != y.period
                || x.role != y.role
                || x.company != y.company
                || x.description != y.description
        })
}

fn formations_differ(a: &[Formation], b: &[Formation]) -> bool {
    a.len() != b.len()
        || a.iter().zip(b).any(|(x, y)| {
            x.year != y.year
                || x.degree != y.degree
                || x.institution != y.institution
                || x.honors != y.honors
        })
}

fn languages_differ(a: &[LanguageSkill], b: &[LanguageSkill]) -> bool {
    a.len() != b.len()
        || a.iter().zip(b).any(|(x, y)| x.language != y.language || x.level != y.level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sample_record;

    #[test]
    fn test_identical_records_are_clean() {
        let a = sample_record("a");
        let b = a.clone();
        assert!(!records_differ(&a, &b));
    }

    #[test]
    fn test_personal_field_change_is_dirty() {
        let baseline = sample_record("a");
        let mut working = baseline.clone();
        working.personal.email = Some("new@example.com".to_string());
        assert!(records_differ(&working, &baseline));
    }

    #[test]
    fn test_experience_reorder_is_dirty() {
        let baseline = sample_record("a");
        let mut working = baseline.clone();
        assert!(working.experiences.len() >= 2);
        working.experiences.swap(0, 1);
        assert!(records_differ(&working, &baseline));
    }

    #[test]
    fn test_added_formation_is_dirty() {
        let baseline = sample_record("a");
        let mut working = baseline.clone();
        working.formations.push(Formation {
            year: "2024".into(),
            degree: "PhD".into(),
            institution: "MIT".into(),
            honors: String::new(),
        });
        assert!(records_differ(&working, &baseline));
    }

    #[test]
    fn test_language_level_change_is_dirty() {
        let baseline = sample_record("a");
        let mut working = baseline.clone();
        working.languages[0].level = Some("C2".into());
        assert!(records_differ(&working, &baseline));
    }

    #[test]
    fn test_skills_are_not_inspected() {
        let baseline = sample_record("a");
        let mut working = baseline.clone();
        working.skills.push("Kubernetes".into());
        working.certifications.push("CKA".into());
        assert!(!records_differ(&working, &baseline));
    }
}
