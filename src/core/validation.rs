use serde_json::Value;

pub const MIN_CONTENT_CHARS: usize = 50;
pub const MAX_CONTENT_CHARS: usize = 8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    MissingBody,
    InvalidType,
    TooShort,
    TooLong,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    pub fn message(&self) -> &'static str {
        match self.kind {
            ValidationErrorKind::MissingBody => "Request body is required",
            ValidationErrorKind::InvalidType => "Valid content is required",
            ValidationErrorKind::TooShort => "Content too short (min 50 characters)",
            ValidationErrorKind::TooLong => "Content too long (max 8000 characters)",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRequest {
    pub content: String,
    pub source_url: Option<String>,
}

fn err(kind: ValidationErrorKind) -> ValidationError {
    ValidationError { kind }
}

/// Checks the untrusted body before any external call is made. Lengths are
/// Unicode scalar counts of the trimmed content.
pub fn validate_summary_request(body: Option<&Value>) -> Result<SummaryRequest, ValidationError> {
    let Some(body) = body else {
        return Err(err(ValidationErrorKind::MissingBody));
    };
    if body.is_null() {
        return Err(err(ValidationErrorKind::MissingBody));
    }

    let content = match body.get("content") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) | None => return Err(err(ValidationErrorKind::InvalidType)),
    };
    if content.is_empty() {
        return Err(err(ValidationErrorKind::InvalidType));
    }

    let chars = content.chars().count();
    if chars < MIN_CONTENT_CHARS {
        return Err(err(ValidationErrorKind::TooShort));
    }
    if chars > MAX_CONTENT_CHARS {
        return Err(err(ValidationErrorKind::TooLong));
    }

    let source_url = match body.get("sourceUrl") {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        _ => None,
    };

    Ok(SummaryRequest { content, source_url })
}
