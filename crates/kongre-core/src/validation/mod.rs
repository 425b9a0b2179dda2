//! Submission validation rules
//!
//! The same rules run in the client before any network call and in the intake
//! handler before persistence. Checks are ordered and the first failure wins.

pub mod phone;

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{
    Degree, NewSubmission, Presentation, SubmissionPayload, UploadCategory,
};

pub use phone::normalize_turkish_phone;

pub const MIN_KEYWORDS: usize = 1;
pub const MAX_KEYWORDS: usize = 10;
pub const MAX_KEYWORD_CHARS: usize = 40;
pub const MAX_SUMMARY_WORDS: usize = 500;
pub const MIN_SUMMARY_CHARS: usize = 20;
pub const MAX_SUMMARY_CHARS: usize = 5000;
pub const MIN_FULL_NAME_CHARS: usize = 3;
pub const MIN_UNIVERSITY_CHARS: usize = 2;
pub const MIN_TITLE_CHARS: usize = 5;
pub const MIN_FILE_NAME_CHARS: usize = 3;
pub const MIN_FILE_PATH_CHARS: usize = 5;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"));

/// A rejected field together with a human-readable reason
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct InvalidField {
    pub field: &'static str,
    pub reason: String,
}

impl InvalidField {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }

    /// Whether the failure is a disallowed file type rather than a malformed field
    pub fn is_unsupported_type(&self) -> bool {
        self.field == "file_mime"
    }
}

/// Number of whitespace-delimited non-empty tokens
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or_default()
}

fn min_chars(field: &'static str, value: &str, min: usize) -> Result<(), InvalidField> {
    if value.chars().count() < min {
        return Err(InvalidField::new(
            field,
            format!("must be at least {} characters", min),
        ));
    }
    Ok(())
}

/// Field constraints for a submission
#[derive(Debug, Clone, Copy)]
pub struct ValidationRules {
    pub max_file_size: u64,
}

impl ValidationRules {
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    /// Check a candidate submission. Pure and deterministic.
    pub fn validate(&self, payload: &SubmissionPayload) -> Result<(), InvalidField> {
        // 1. required fields
        let required: [(&'static str, bool); 12] = [
            ("degree", present(&payload.degree)),
            ("full_name", present(&payload.full_name)),
            ("email", present(&payload.email)),
            ("university", present(&payload.university)),
            ("title", present(&payload.title)),
            ("presentation", present(&payload.presentation)),
            ("keywords", payload.keywords.is_some()),
            ("summary", present(&payload.summary)),
            ("file_name", present(&payload.file_name)),
            ("file_mime", present(&payload.file_mime)),
            ("file_size", payload.file_size.is_some()),
            ("file_path", present(&payload.file_path)),
        ];
        if let Some((field, _)) = required.iter().find(|(_, ok)| !ok) {
            return Err(InvalidField::new(*field, "is required"));
        }

        // 2. degree
        if text(&payload.degree).parse::<Degree>().is_err() {
            return Err(InvalidField::new(
                "degree",
                "must be one of lisans, yuksek_lisans, doktora",
            ));
        }

        // 3. presentation
        if text(&payload.presentation).parse::<Presentation>().is_err() {
            return Err(InvalidField::new(
                "presentation",
                "must be one of sozlu, poster",
            ));
        }

        // 4. email
        if !is_valid_email(text(&payload.email)) {
            return Err(InvalidField::new("email", "must be a valid email address"));
        }

        // 5. keywords
        let keywords = payload.keywords.as_deref().unwrap_or_default();
        if keywords.len() < MIN_KEYWORDS || keywords.len() > MAX_KEYWORDS {
            return Err(InvalidField::new(
                "keywords",
                format!(
                    "must contain between {} and {} entries",
                    MIN_KEYWORDS, MAX_KEYWORDS
                ),
            ));
        }
        if keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(InvalidField::new("keywords", "entries must not be empty"));
        }
        if keywords.iter().any(|k| k.trim().chars().count() > MAX_KEYWORD_CHARS) {
            return Err(InvalidField::new(
                "keywords",
                format!("entries must not exceed {} characters", MAX_KEYWORD_CHARS),
            ));
        }

        // 6. summary word count
        let summary = text(&payload.summary);
        if word_count(summary) > MAX_SUMMARY_WORDS {
            return Err(InvalidField::new(
                "summary",
                format!("must not exceed {} words", MAX_SUMMARY_WORDS),
            ));
        }

        // 7. file type
        if !UploadCategory::Submission.allows(text(&payload.file_mime)) {
            return Err(InvalidField::new(
                "file_mime",
                UploadCategory::Submission.rejection_message(),
            ));
        }

        self.check_bounds(payload)
    }

    /// Length and range bounds, checked after the ordered rules above.
    fn check_bounds(&self, payload: &SubmissionPayload) -> Result<(), InvalidField> {
        min_chars("full_name", text(&payload.full_name), MIN_FULL_NAME_CHARS)?;
        min_chars("university", text(&payload.university), MIN_UNIVERSITY_CHARS)?;
        min_chars("title", text(&payload.title), MIN_TITLE_CHARS)?;

        let summary_chars = text(&payload.summary).chars().count();
        if !(MIN_SUMMARY_CHARS..=MAX_SUMMARY_CHARS).contains(&summary_chars) {
            return Err(InvalidField::new(
                "summary",
                format!(
                    "must be between {} and {} characters",
                    MIN_SUMMARY_CHARS, MAX_SUMMARY_CHARS
                ),
            ));
        }

        min_chars("file_name", text(&payload.file_name), MIN_FILE_NAME_CHARS)?;

        let size = payload.file_size.unwrap_or_default();
        if size < 1 || size as u64 > self.max_file_size {
            return Err(InvalidField::new(
                "file_size",
                format!("must be between 1 and {} bytes", self.max_file_size),
            ));
        }

        min_chars("file_path", text(&payload.file_path), MIN_FILE_PATH_CHARS)?;

        if present(&payload.phone) && normalize_turkish_phone(text(&payload.phone)).is_none() {
            return Err(InvalidField::new(
                "phone",
                "must be a valid phone number",
            ));
        }

        Ok(())
    }

    /// Validate and convert into a record ready for persistence.
    pub fn into_new_submission(
        &self,
        payload: SubmissionPayload,
        ip: Option<String>,
        user_agent: Option<String>,
    ) -> Result<NewSubmission, InvalidField> {
        self.validate(&payload)?;

        let degree = text(&payload.degree)
            .parse()
            .map_err(|_| InvalidField::new("degree", "is invalid"))?;
        let presentation = text(&payload.presentation)
            .parse()
            .map_err(|_| InvalidField::new("presentation", "is invalid"))?;

        Ok(NewSubmission {
            degree,
            full_name: text(&payload.full_name).to_string(),
            phone: Some(text(&payload.phone).to_string()).filter(|p| !p.is_empty()),
            email: text(&payload.email).to_string(),
            university: text(&payload.university).to_string(),
            title: text(&payload.title).to_string(),
            presentation,
            keywords: payload
                .keywords
                .unwrap_or_default()
                .into_iter()
                .map(|k| k.trim().to_string())
                .collect(),
            summary: text(&payload.summary).to_string(),
            file_name: text(&payload.file_name).to_string(),
            file_mime: text(&payload.file_mime).to_string(),
            file_size: payload.file_size.unwrap_or_default(),
            file_path: text(&payload.file_path).to_string(),
            ip,
            user_agent,
        })
    }
}
