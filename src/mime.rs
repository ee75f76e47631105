use std::io::Read;
use std::path::Path;

const SNIFF_LEN: usize = 8192;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
	Text,
	Image,
	OtherBinary,
}

/// Determine the MIME type of a file: sniff the leading bytes first, fall
/// back to the extension table, and finally to application/octet-stream.
pub fn detect_mime(path: &Path) -> String {
	if let Some(sniffed) = sniff_content(path) {
		return sniffed;
	}
	if let Some(guessed) = mime_guess::from_path(path).first_raw() {
		return guessed.to_string();
	}
	"application/octet-stream".to_string()
}

fn sniff_content(path: &Path) -> Option<String> {
	let mut buf = [0u8; SNIFF_LEN];
	let mut file = std::fs::File::open(path).ok()?;
	let len = file.read(&mut buf).ok()?;
	let head = &buf[..len];
	if let Some(kind) = infer::get(head) {
		return Some(kind.mime_type().to_string());
	}
	if len == 0 || looks_like_text(head) {
		return Some("text/plain; charset=utf-8".to_string());
	}
	None
}

fn looks_like_text(head: &[u8]) -> bool {
	if head.contains(&0) {
		return false;
	}
	match std::str::from_utf8(head) {
		Ok(_) => true,
		// A multi-byte character cut off at the buffer edge is still text.
		Err(err) => err.error_len().is_none(),
	}
}

pub fn classify(mime_type: &str) -> FileKind {
	if is_text_file(mime_type) {
		FileKind::Text
	}
	else if is_image_file(mime_type) {
		FileKind::Image
	}
	else {
		FileKind::OtherBinary
	}
}

/// Text is a union: text/*, a fixed set of textual application types,
/// structured-syntax suffixes, and application/x-* script-ish subtypes.
pub fn is_text_file(mime_type: &str) -> bool {
	let essence = mime_type.split(';').next().unwrap_or(mime_type).trim();
	if essence.starts_with("text/") {
		return true;
	}
	const TEXT_APPLICATION_TYPES: &[&str] = &[
		"application/json",
		"application/xml",
		"application/javascript",
		"application/x-javascript",
		"application/typescript",
		"application/x-typescript",
		"application/x-yaml",
		"application/yaml",
		"application/toml",
		"application/x-sh",
		"application/x-shellscript",
	];
	if TEXT_APPLICATION_TYPES.contains(&essence) {
		return true;
	}
	if essence.contains("+xml") || essence.contains("+json") || essence.contains("+yaml") {
		return true;
	}
	if essence.starts_with("application/x-")
		&& (essence.contains("script") || essence.contains("source") || essence.contains("code")) {
		return true;
	}
	false
}

pub fn is_image_file(mime_type: &str) -> bool {
	mime_type.starts_with("image/")
}
