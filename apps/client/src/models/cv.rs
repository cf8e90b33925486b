#![allow(dead_code)]

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A structured CV record as served by the extraction backend.
///
/// Field names on the wire are the backend's French identifiers; the
/// struct keeps English names and maps them with `serde(rename)`. The
/// backend echoes the full record on every mutating call, so this type
/// is both the request and the response body for full updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvRecord {
    /// Absent on records built locally from a selected file that has
    /// not been uploaded yet.
    #[serde(default)]
    pub id: Option<String>,

    #[serde(rename = "informations_personnelles", default)]
    pub personal: PersonalInfo,

    #[serde(rename = "competences_techniques", default)]
    pub skills: Vec<String>,

    #[serde(rename = "experience_professionnelle", default)]
    pub experiences: Vec<Experience>,

    #[serde(rename = "formations_academiques", default)]
    pub formations: Vec<Formation>,

    #[serde(default)]
    pub certifications: Vec<String>,

    #[serde(rename = "competences_linguistiques", default)]
    pub languages: Vec<LanguageSkill>,

    #[serde(rename = "type_document", default = "default_document_type")]
    pub document_type: String,

    #[serde(rename = "metadonnees", default)]
    pub metadata: CvMetadata,

    #[serde(default)]
    pub nlp_enrichment: Option<Value>,

    #[serde(rename = "filename_original", default)]
    pub original_filename: Option<String>,

    #[serde(rename = "file_hash", default)]
    pub file_hash: Option<String>,

    #[serde(default)]
    pub status: RecordStatus,

    // The backend serializes naive `datetime.now()` values, so these
    // carry no timezone offset.
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

fn default_document_type() -> String {
    "CV".to_string()
}

impl CvRecord {
    /// Display name for filenames and headers, if extraction found one.
    pub fn person_name(&self) -> Option<&str> {
        self.personal.name.as_deref().filter(|n| !n.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    #[serde(rename = "nom", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "telephone", default)]
    pub phone: Option<String>,
    #[serde(rename = "adresse", default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    #[serde(rename = "periode", default)]
    pub period: String,
    #[serde(rename = "poste", default)]
    pub role: String,
    #[serde(rename = "entreprise", default)]
    pub company: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Formation {
    #[serde(rename = "annee", default)]
    pub year: String,
    #[serde(rename = "diplome", default)]
    pub degree: String,
    #[serde(rename = "etablissement", default)]
    pub institution: String,
    #[serde(rename = "mention", default)]
    pub honors: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageSkill {
    #[serde(rename = "langue", default)]
    pub language: String,
    #[serde(rename = "niveau", default)]
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CvMetadata {
    #[serde(rename = "nombre_mots", default)]
    pub word_count: u32,
    #[serde(rename = "date_extraction", default)]
    pub extracted_at: String,
    #[serde(rename = "apercu_texte", default)]
    pub text_preview: Option<String>,
    #[serde(rename = "taille_fichier_kb", default)]
    pub file_size_kb: f64,
}

/// Backend processing status of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Pending,
    Processing,
    Completed,
    Error,
    NotSaved,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Pending => "pending",
            RecordStatus::Processing => "processing",
            RecordStatus::Completed => "completed",
            RecordStatus::Error => "error",
            RecordStatus::NotSaved => "not_saved",
        }
    }
}

impl Default for RecordStatus {
    fn default() -> Self {
        RecordStatus::Processing
    }
}

#[cfg(test)]
impl CvRecord {
    /// Test builder: sets the original filename in place.
    pub fn with_filename(mut self, filename: &str) -> Self {
        self.original_filename = Some(filename.to_string());
        self
    }
}
