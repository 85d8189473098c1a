//! Request body decoding for article drafts.
//!
//! JSON is the default; `application/x-www-form-urlencoded` bodies from HTML
//! forms are decoded as forms. An empty body decodes to an empty draft so the
//! caller reports validation failures rather than a parse failure.

use quill_core::ArticleDraft;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BodyError {
    #[error("unsupported content type `{0}`")]
    UnsupportedContentType(String),
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid form body: {0}")]
    Form(#[from] serde_html_form::de::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFormat {
    Json,
    UrlEncoded,
}

/// Decodes `body` into a draft according to the `Content-Type` header value.
///
/// A missing content type is treated as JSON.
pub fn parse_draft(content_type: Option<&str>, body: &[u8]) -> Result<ArticleDraft, BodyError> {
    let format = match content_type {
        Some(raw) => body_format(raw)?,
        None => BodyFormat::Json,
    };

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ArticleDraft::default());
    }

    match format {
        BodyFormat::Json => Ok(serde_json::from_slice(body)?),
        BodyFormat::UrlEncoded => Ok(serde_html_form::from_bytes(body)?),
    }
}

fn body_format(content_type: &str) -> Result<BodyFormat, BodyError> {
    let unsupported = || BodyError::UnsupportedContentType(content_type.to_string());
    let mime = content_type
        .parse::<mime::Mime>()
        .map_err(|_| unsupported())?;

    if mime.type_() != mime::APPLICATION {
        return Err(unsupported());
    }
    if mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON) {
        return Ok(BodyFormat::Json);
    }
    if mime.subtype() == mime::WWW_FORM_URLENCODED {
        return Ok(BodyFormat::UrlEncoded);
    }
    Err(unsupported())
}
