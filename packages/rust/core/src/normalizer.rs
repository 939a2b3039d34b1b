//! Candidate normalization: trims fields and guarantees a usable URL.

use tracing::debug;

use aitracker_shared::{
    CandidateRecord, Result, SourceTag, TrackerError,
    text::{is_absolute_http_url, slugify, truncate_chars},
};

/// Descriptions longer than this are cut (in characters).
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Stand-in URL for a record whose own URL is missing or malformed.
pub fn placeholder_url(source: SourceTag, name: &str) -> String {
    format!("https://placeholder/{}/{}", source.as_str(), slugify(name))
}

/// Ensure `record.url` is an absolute http(s) URL, substituting a placeholder otherwise.
pub(crate) fn ensure_url(record: &mut CandidateRecord) {
    if !is_absolute_http_url(&record.url) {
        let placeholder = placeholder_url(record.source, &record.name);
        debug!(
            name = %record.name,
            url = %record.url,
            %placeholder,
            "invalid url, using placeholder"
        );
        record.url = placeholder;
    } else {
        record.url = record.url.trim().to_string();
    }
}

/// Clean a raw candidate.
///
/// Fails only when the name is empty after trimming.
pub fn normalize(mut record: CandidateRecord) -> Result<CandidateRecord> {
    record.name = record.name.trim().to_string();
    if record.name.is_empty() {
        return Err(TrackerError::record_invalid(format!(
            "{} record has an empty name",
            record.source
        )));
    }

    let description = record.description.trim();
    record.description = truncate_chars(description, MAX_DESCRIPTION_CHARS).to_string();

    record.tags = record
        .tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    ensure_url(&mut record);
    Ok(record)
}
