use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Document formats accepted on upload. Only `Pdf` and `Docx` can be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Pdf,
    Docx,
    Txt,
}

impl FileFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Pdf => "pdf",
            FileFormat::Docx => "docx",
            FileFormat::Txt => "txt",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            FileFormat::Pdf => "application/pdf",
            FileFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            FileFormat::Txt => "text/plain; charset=utf-8",
        }
    }

    /// Detects the format from the file extension, falling back to magic bytes
    /// when the name has no recognised extension.
    pub fn detect(filename: &str, bytes: &[u8]) -> Option<Self> {
        filename
            .rsplit_once('.')
            .and_then(|(_, ext)| ext.parse().ok())
            .or_else(|| {
                if bytes.starts_with(b"%PDF") {
                    Some(FileFormat::Pdf)
                } else if bytes.starts_with(b"PK\x03\x04") {
                    Some(FileFormat::Docx)
                } else {
                    None
                }
            })
    }
}

impl FromStr for FileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(FileFormat::Pdf),
            "docx" => Ok(FileFormat::Docx),
            "txt" => Ok(FileFormat::Txt),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }
}

impl FromStr for AnalysisStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AnalysisStatus::Pending),
            "processing" => Ok(AnalysisStatus::Processing),
            "completed" => Ok(AnalysisStatus::Completed),
            "failed" => Ok(AnalysisStatus::Failed),
            other => Err(format!("unknown analysis status '{other}'")),
        }
    }
}

/// Closed set of suggestion categories. Anything else fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SuggestionCategory {
    Skills,
    Experience,
    Keywords,
    Format,
    #[serde(rename = "Overall Fit")]
    OverallFit,
}

impl SuggestionCategory {
    pub const ALL: [SuggestionCategory; 5] = [
        SuggestionCategory::Skills,
        SuggestionCategory::Experience,
        SuggestionCategory::Keywords,
        SuggestionCategory::Format,
        SuggestionCategory::OverallFit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SuggestionCategory::Skills => "Skills",
            SuggestionCategory::Experience => "Experience",
            SuggestionCategory::Keywords => "Keywords",
            SuggestionCategory::Format => "Format",
            SuggestionCategory::OverallFit => "Overall Fit",
        }
    }

    /// Case-insensitive match on the label; "Formatting" and "Fit" are accepted spellings.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "skills" => Some(SuggestionCategory::Skills),
            "experience" => Some(SuggestionCategory::Experience),
            "keywords" => Some(SuggestionCategory::Keywords),
            "format" | "formatting" => Some(SuggestionCategory::Format),
            "overall fit" | "fit" => Some(SuggestionCategory::OverallFit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Impact {
    High,
    Medium,
    Low,
}

impl Impact {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Impact::High),
            "medium" => Some(Impact::Medium),
            "low" => Some(Impact::Low),
            _ => None,
        }
    }
}

/// One atomic improvement recommendation.
///
/// `id` is assigned at generation time; selection for optimization is by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: Uuid,
    pub category: SuggestionCategory,
    pub suggestion: String,
    pub details: String,
    pub impact: Impact,
}

/// One evaluation of a résumé against a job description.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resume_path: String,
    pub job_description_path: String,
    pub file_format: FileFormat,
    pub original_filename: String,
    pub status: AnalysisStatus,
    pub similarity_score: Option<f64>,
    pub suggestions: Vec<Suggestion>,
    pub results: Option<Value>,
    pub selected_suggestions: Vec<Uuid>,
    pub optimized_at: Option<DateTime<Utc>>,
    pub optimized_file_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Analysis {
    /// The message persisted in `results.error` when the pipeline failed.
    pub fn error_message(&self) -> Option<&str> {
        self.results.as_ref()?.get("error")?.as_str()
    }
}

/// Fields known at upload time, before the pipeline runs.
#[derive(Debug, Clone)]
pub struct NewAnalysis {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resume_path: String,
    pub job_description_path: String,
    pub file_format: FileFormat,
    pub original_filename: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct AnalysisRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resume_path: String,
    pub job_description_path: String,
    pub file_format: String,
    pub original_filename: String,
    pub status: String,
    pub similarity_score: Option<f64>,
    pub suggestions: sqlx::types::Json<Vec<Suggestion>>,
    pub results: Option<Value>,
    pub selected_suggestions: Vec<Uuid>,
    pub optimized_at: Option<DateTime<Utc>>,
    pub optimized_file_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AnalysisRow> for Analysis {
    type Error = anyhow::Error;

    fn try_from(row: AnalysisRow) -> Result<Self, Self::Error> {
        Ok(Analysis {
            id: row.id,
            user_id: row.user_id,
            resume_path: row.resume_path,
            job_description_path: row.job_description_path,
            file_format: row
                .file_format
                .parse()
                .map_err(|f| anyhow::anyhow!("unknown file format '{f}' in analysis {}", row.id))?,
            original_filename: row.original_filename,
            status: row.status.parse().map_err(anyhow::Error::msg)?,
            similarity_score: row.similarity_score,
            suggestions: row.suggestions.0,
            results: row.results,
            selected_suggestions: row.selected_suggestions,
            optimized_at: row.optimized_at,
            optimized_file_name: row.optimized_file_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
