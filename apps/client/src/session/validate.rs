//! Structural validation of a working copy before it is submitted.
//!
//! Validation never mutates the record; it collects every violation so
//! the form can show all of them at once. A failed validation blocks
//! the save transition before any network call.

use crate::models::cv::CvRecord;

pub fn validate(record: &CvRecord) -> Vec<String> {
    let mut problems = Vec::new();

    if record.id.as_deref().map_or(true, |id| id.trim().is_empty()) {
        problems.push("The record has no identity and cannot be saved".to_string());
    }

    if let Some(email) = record.personal.email.as_deref() {
        if !email.trim().is_empty() && !email.contains('@') {
            problems.push(format!("'{email}' is not a valid email address"));
        }
    }

    for (index, language) in record.languages.iter().enumerate() {
        if language.language.trim().is_empty() {
            problems.push(format!("Language entry {} has no language name", index + 1));
        }
    }

    problems
}
