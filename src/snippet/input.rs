use super::item::{ImageKind, SnippetBody, SnippetKind};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldError {
    MissingTitle,
    MissingContent,
    MissingImage,
}

impl FieldError {
    pub fn message(&self) -> &'static str {
        match self {
            FieldError::MissingTitle => "Title is required",
            FieldError::MissingContent => "Content is required",
            FieldError::MissingImage => "Choose an image file or enter an image URL",
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid snippet: {}", describe(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

fn describe(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(FieldError::message)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    pub fn has(&self, field: FieldError) -> bool {
        self.fields.contains(&field)
    }
}

/// Raw add/edit input, carried explicitly through validation and save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnippetRequest {
    pub kind: SnippetKind,
    pub title: String,
    pub content: String,
    pub image_url: String,
    /// A selected or dropped file already converted to a data URL.
    pub image_file: Option<String>,
}

/// Output of a successful validation: trimmed title plus a well-formed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSnippet {
    pub title: String,
    pub body: SnippetBody,
}

impl SnippetRequest {
    pub fn text(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: SnippetKind::Text,
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn image_url(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind: SnippetKind::Image,
            title: title.into(),
            image_url: url.into(),
            ..Default::default()
        }
    }

    pub fn image_file(title: impl Into<String>, data_url: impl Into<String>) -> Self {
        Self {
            kind: SnippetKind::Image,
            title: title.into(),
            image_file: Some(data_url.into()),
            ..Default::default()
        }
    }

    /// Prefill a request from an existing body (edit form).
    pub fn from_body(title: &str, body: &SnippetBody) -> Self {
        match body {
            SnippetBody::Text { content } => Self::text(title, content.clone()),
            SnippetBody::Image {
                image_src,
                image_kind: ImageKind::DataUrl,
            } => Self::image_file(title, image_src.clone()),
            SnippetBody::Image {
                image_src,
                image_kind: ImageKind::Url,
            } => Self::image_url(title, image_src.clone()),
        }
    }

    /// Checks every rule before rejecting, so each bad field can be flagged.
    pub fn validate(&self) -> Result<ValidSnippet, ValidationError> {
        let mut fields = Vec::new();

        let title = self.title.trim();
        if title.is_empty() {
            fields.push(FieldError::MissingTitle);
        }

        let body = match self.kind {
            SnippetKind::Text => {
                let content = self.content.trim();
                if content.is_empty() {
                    fields.push(FieldError::MissingContent);
                    None
                } else {
                    Some(SnippetBody::Text {
                        content: content.to_string(),
                    })
                }
            }
            SnippetKind::Image => match self.resolve_image() {
                Some((image_src, image_kind)) => Some(SnippetBody::Image {
                    image_src,
                    image_kind,
                }),
                None => {
                    fields.push(FieldError::MissingImage);
                    None
                }
            },
        };

        match body {
            Some(body) if fields.is_empty() => Ok(ValidSnippet {
                title: title.to_string(),
                body,
            }),
            _ => Err(ValidationError { fields }),
        }
    }

    fn resolve_image(&self) -> Option<(String, ImageKind)> {
        if let Some(data_url) = self.image_file.as_deref().filter(|s| !s.is_empty()) {
            return Some((data_url.to_string(), ImageKind::DataUrl));
        }
        let url = self.image_url.trim();
        if url.is_empty() {
            None
        } else {
            Some((url.to_string(), ImageKind::Url))
        }
    }
}

#[derive(Debug, Error)]
pub enum ImageFileError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not an image")]
    NotAnImage { path: String },
}

/// Read an image file into a `data:<mime>;base64,...` URL. Non-images are rejected.
pub fn image_file_to_data_url(path: &Path) -> Result<String, ImageFileError> {
    let bytes = fs::read(path).map_err(|source| ImageFileError::Read {
        path: path.display().to_string(),
        source,
    })?;
    bytes_to_data_url(&bytes).ok_or_else(|| ImageFileError::NotAnImage {
        path: path.display().to_string(),
    })
}

pub fn bytes_to_data_url(bytes: &[u8]) -> Option<String> {
    let kind = infer::get(bytes)?;
    if kind.matcher_type() != infer::MatcherType::Image {
        return None;
    }
    Some(format!("data:{};base64,{}", kind.mime_type(), STANDARD.encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

    #[test]
    fn test_valid_text_is_trimmed() {
        let valid = SnippetRequest::text("  Note ", "\tHello\n").validate().unwrap();
        assert_eq!(valid.title, "Note");
        assert_eq!(
            valid.body,
            SnippetBody::Text {
                content: "Hello".to_string()
            }
        );
    }

    #[test]
    fn test_missing_title_only() {
        let err = SnippetRequest::text("", "Hello").validate().unwrap_err();
        assert_eq!(err.fields, vec![FieldError::MissingTitle]);
    }

    #[test]
    fn test_missing_title_for_image() {
        let err = SnippetRequest::image_url("   ", "https://x/y.png")
            .validate()
            .unwrap_err();
        assert_eq!(err.fields, vec![FieldError::MissingTitle]);
    }

    #[test]
    fn test_all_text_errors_collected() {
        let err = SnippetRequest::text(" ", "  ").validate().unwrap_err();
        assert_eq!(
            err.fields,
            vec![FieldError::MissingTitle, FieldError::MissingContent]
        );
    }

    #[test]
    fn test_all_image_errors_collected() {
        let err = SnippetRequest::image_url("", "").validate().unwrap_err();
        assert!(err.has(FieldError::MissingTitle));
        assert!(err.has(FieldError::MissingImage));
        assert!(!err.has(FieldError::MissingContent));
    }

    #[test]
    fn test_image_url_kind() {
        let valid = SnippetRequest::image_url("Logo", " https://x/y.png ")
            .validate()
            .unwrap();
        assert_eq!(
            valid.body,
            SnippetBody::Image {
                image_src: "https://x/y.png".to_string(),
                image_kind: ImageKind::Url,
            }
        );
    }

    #[test]
    fn test_file_takes_precedence_over_url() {
        let mut request = SnippetRequest::image_file("Pic", "data:image/png;base64,AAAA");
        request.image_url = "https://x/y.png".to_string();

        let valid = request.validate().unwrap();
        assert_eq!(
            valid.body,
            SnippetBody::Image {
                image_src: "data:image/png;base64,AAAA".to_string(),
                image_kind: ImageKind::DataUrl,
            }
        );
    }

    #[test]
    fn test_text_fields_ignored_for_image() {
        let mut request = SnippetRequest::image_url("Logo", "https://x/y.png");
        request.content = "left over".to_string();
        assert!(matches!(
            request.validate().unwrap().body,
            SnippetBody::Image { .. }
        ));
    }

    #[test]
    fn test_from_body_round_trips_kind() {
        let body = SnippetBody::Image {
            image_src: "data:image/png;base64,AAAA".to_string(),
            image_kind: ImageKind::DataUrl,
        };
        let request = SnippetRequest::from_body("Pic", &body);
        assert_eq!(request.kind, SnippetKind::Image);
        assert_eq!(request.validate().unwrap().body, body);
    }

    #[test]
    fn test_bytes_to_data_url_png() {
        let url = bytes_to_data_url(PNG_HEADER).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_bytes_to_data_url_rejects_text() {
        assert_eq!(bytes_to_data_url(b"just some text"), None);
    }

    #[test]
    fn test_image_file_to_data_url() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(PNG_HEADER).unwrap();

        let url = image_file_to_data_url(file.path()).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_image_file_missing() {
        let err = image_file_to_data_url(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, ImageFileError::Read { .. }));
    }
}
