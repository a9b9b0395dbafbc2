use std::path::Path;

pub const PREVIEW_LENGTH: usize = 200;

const SIZE_UNITS: [&str; 5] = ["octets", "Ko", "Mo", "Go", "To"];
const SIZE_BASE: u64 = 1000;

const TEXT_EXTENSIONS: &[&str] = &[".txt", ".md", ".json", ".csv", ".xml", ".yml", ".yaml"];

const MOBILE_USER_AGENT_MARKERS: &[&str] = &["mobi", "android", "iphone", "ipad", "ipod"];

/// Human readable size using decimal (base 1000) French units, e.g. `1.5 Ko`.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return format!("0 {}", SIZE_UNITS[0]);
    }

    let mut exponent = 0;
    let mut divisor = 1u64;
    while exponent < SIZE_UNITS.len() - 1 && bytes / divisor >= SIZE_BASE {
        divisor *= SIZE_BASE;
        exponent += 1;
    }

    let value = format!("{:.2}", bytes as f64 / divisor as f64);
    let value = value.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", value, SIZE_UNITS[exponent])
}

pub fn is_text_file(name: &str, mime_type: &str) -> bool {
    mime_type.starts_with("text/") || TEXT_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

pub fn is_image(mime_type: &str) -> bool {
    mime_type.starts_with("image/")
}

/// Keeps the first `max_chars` characters, appending `...` only when something was cut.
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    let user_agent = user_agent.to_lowercase();
    MOBILE_USER_AGENT_MARKERS
        .iter()
        .any(|marker| user_agent.contains(marker))
}

pub fn guess_mime(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        // Images
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "heic" => "image/heic",
        // Videos
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        // Audio
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        // Text
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "xml" => "application/xml",
        "json" => "application/json",
        "yml" | "yaml" => "application/yaml",
        // Documents and archives
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "zip" => "application/zip",
        "tar" => "application/x-tar",
        "gz" => "application/gzip",
        _ => "application/octet-stream",
    }
}

/// Name of a file without everything after its first `.`.
pub fn stem_before_first_dot(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// Last path component of a remote file name, so it can't escape the target directory.
pub fn safe_file_name(name: &str) -> String {
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    match name {
        "" | "." | ".." => "download".to_string(),
        name => name.to_string(),
    }
}

/// `photo.jpg` becomes `photo (2).jpg` for `n = 2`.
pub fn numbered_name(name: &str, n: usize) -> String {
    match name.rfind('.') {
        Some(dot) if dot > 0 => format!("{} ({}){}", &name[..dot], n, &name[dot..]),
        _ => format!("{} ({})", name, n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name("../../etc/passwd"), "passwd");
        assert_eq!(safe_file_name("dir\\report.pdf"), "report.pdf");
        assert_eq!(safe_file_name(".."), "download");
        assert_eq!(safe_file_name("plain.txt"), "plain.txt");
    }

    #[test]
    fn test_numbered_name() {
        assert_eq!(numbered_name("photo.jpg", 2), "photo (2).jpg");
        assert_eq!(numbered_name("archive.tar.gz", 3), "archive.tar (3).gz");
        assert_eq!(numbered_name(".env", 2), ".env (2)");
        assert_eq!(numbered_name("README", 2), "README (2)");
    }

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(0), "0 octets");
        assert_eq!(format_size(999), "999 octets");
        assert_eq!(format_size(1000), "1 Ko");
        assert_eq!(format_size(1500), "1.5 Ko");
        assert_eq!(format_size(1_000_000), "1 Mo");
        assert_eq!(format_size(1_234_567), "1.23 Mo");
        assert_eq!(format_size(2_000_000_000), "2 Go");
        assert_eq!(format_size(3_000_000_000_000), "3 To");
    }

    #[test]
    fn test_text_file_detection() {
        assert!(is_text_file("notes.bin", "text/plain"));
        assert!(is_text_file("config.yaml", ""));
        assert!(is_text_file("data.json", "application/json"));
        assert!(!is_text_file("photo.jpg", "image/jpeg"));
        assert!(!is_text_file("archive.tar.gz", "application/gzip"));
    }

    #[test]
    fn test_truncate_preview() {
        let long = "a".repeat(250);
        let preview = truncate_preview(&long, PREVIEW_LENGTH);
        assert_eq!(preview, format!("{}...", "a".repeat(200)));

        let exact = "b".repeat(200);
        assert_eq!(truncate_preview(&exact, PREVIEW_LENGTH), exact);

        assert_eq!(truncate_preview("short", PREVIEW_LENGTH), "short");
    }

    #[test]
    fn test_truncate_preview_counts_characters() {
        let accented = "é".repeat(201);
        let preview = truncate_preview(&accented, PREVIEW_LENGTH);
        assert_eq!(preview.chars().count(), 203);
        assert!(preview.ends_with("é..."));
    }

    #[test]
    fn test_mobile_user_agent() {
        assert!(is_mobile_user_agent(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)"
        ));
        assert!(is_mobile_user_agent("Mozilla/5.0 (Linux; ANDROID 14)"));
        assert!(is_mobile_user_agent("Something Mobile Safari"));
        assert!(!is_mobile_user_agent("threef/0.4.2"));
    }

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime("IMG_001.JPG"), "image/jpeg");
        assert_eq!(guess_mime("readme.md"), "text/markdown");
        assert_eq!(guess_mime("Makefile"), "application/octet-stream");
    }

    #[test]
    fn test_stem_before_first_dot() {
        assert_eq!(stem_before_first_dot("holiday.photos.tar.gz"), "holiday");
        assert_eq!(stem_before_first_dot("README"), "README");
    }
}
