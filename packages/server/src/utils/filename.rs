/// Resolve a download content type from a filename.
///
/// The archive recognizes exactly one extension: `.pdf`. Everything else is
/// served as a generic byte stream.
pub fn content_type_for(filename: &str) -> &'static str {
    match file_extension(filename) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Extension of a filename, without the dot. `None` when there is no
/// extension or the name is a bare dotfile.
pub fn file_extension(filename: &str) -> Option<&str> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext)
}

/// Build a `Content-Disposition: attachment` header value for a download
/// named after the project, carrying the stored file's extension.
pub fn attachment_disposition(project_name: &str, extension: Option<&str>) -> String {
    let filename = match extension {
        Some(ext) => format!("{project_name}.{ext}"),
        None => project_name.to_string(),
    };

    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => String::from(b as char),
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("attachment; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}
