//! Filename sanitization and content-type detection for uploads and serving.

/// Detect the content type of uploaded or served bytes.
///
/// Magic bytes win; extension-based detection covers text formats (which
/// have no magic bytes); otherwise the claimed type is trusted only when it
/// is not a binary format that should have been recognizable.
pub fn detect_content_type(filename: &str, data: &[u8], claimed: &str) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    if let Some(ext) = filename.rsplit('.').next() {
        if let Some(mime) = mime_from_extension(ext) {
            return mime.to_string();
        }
    }

    // A binary claim without matching magic bytes means the data does not
    // match the claim; downgrade rather than serve garbage as media.
    if claimed_is_binary(claimed) {
        return "application/octet-stream".to_string();
    }

    claimed.to_string()
}

/// Binary formats carry magic bytes; a claim in this set with no magic-byte
/// match is a mismatch.
fn claimed_is_binary(claimed: &str) -> bool {
    if claimed.starts_with("image/")
        || claimed.starts_with("audio/")
        || claimed.starts_with("video/")
    {
        return true;
    }
    matches!(
        claimed,
        "application/pdf"
            | "application/zip"
            | "application/gzip"
            | "application/x-tar"
            | "application/x-7z-compressed"
    )
}

/// Map text-only extensions to MIME types. Binary media formats are
/// intentionally excluded: they have magic bytes, so extension-only
/// detection would defeat the mismatch guard above.
fn mime_from_extension(ext: &str) -> Option<&'static str> {
    match ext.to_lowercase().as_str() {
        "txt" | "log" => Some("text/plain"),
        "csv" => Some("text/csv"),
        "md" | "markdown" => Some("text/markdown"),
        "html" | "htm" => Some("text/html"),
        "xml" => Some("application/xml"),
        "json" => Some("application/json"),
        "yaml" | "yml" => Some("application/yaml"),
        "toml" => Some("application/toml"),
        // SVG is text-based XML, safe to trust by extension
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Sanitize a client-supplied filename before it feeds a storage key or a
/// Content-Disposition header: path components stripped, control and shell
/// metacharacters replaced, length capped with the extension preserved.
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let sanitized = sanitized.trim();
    if sanitized.is_empty() {
        return "unnamed_file".to_string();
    }

    // Truncate over-long names, preserving a short extension when present.
    // Budgeted by bytes, cut at char boundaries.
    if sanitized.len() > 255 {
        let ext = sanitized
            .rfind('.')
            .map(|pos| &sanitized[pos..])
            .filter(|ext| ext.len() <= 32);
        let budget = 255 - ext.map_or(0, |e| e.len());
        let mut stem = String::with_capacity(budget);
        for c in sanitized.chars() {
            if stem.len() + c.len_utf8() > budget {
                break;
            }
            stem.push(c);
        }
        return match ext {
            Some(ext) => format!("{stem}{ext}"),
            None => stem,
        };
    }

    sanitized.to_string()
}
