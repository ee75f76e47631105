use crate::mime::{self, FileKind};
use anyhow::Result;
use base64::Engine;
use serde_json::{json, Value};
use std::path::Path;

pub const MAX_INLINE_SIZE: u64 = 5 * 1024 * 1024;
pub const MAX_BASE64_SIZE: u64 = 1024 * 1024;

pub fn resource_uri(path: &Path) -> String {
	format!("file://{}", path.display())
}

pub fn text_item(text: impl Into<String>) -> Value {
	json!({
		"type": "text",
		"text": text.into()
	})
}

pub fn image_item(mime_type: &str, data: String) -> Value {
	json!({
		"type": "image",
		"data": data,
		"mimeType": mime_type
	})
}

pub fn text_resource_item(uri: &str, mime_type: &str, text: impl Into<String>) -> Value {
	json!({
		"type": "resource",
		"resource": {
			"uri": uri,
			"mimeType": mime_type,
			"text": text.into()
		}
	})
}

pub fn blob_resource_item(uri: &str, mime_type: &str, blob: String) -> Value {
	json!({
		"type": "resource",
		"resource": {
			"uri": uri,
			"mimeType": mime_type,
			"blob": blob
		}
	})
}

pub fn success(content: Vec<Value>) -> Value {
	json!({
		"content": content
	})
}

pub fn error(message: impl Into<String>) -> Value {
	json!({
		"content": [text_item(message)],
		"isError": true
	})
}

pub fn encode_base64(bytes: &[u8]) -> String {
	base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// The single decision table behind every read-like tool: inline text under
/// MAX_INLINE, inline base64 under MAX_BASE64, resource reference otherwise.
pub async fn shape_file_read(valid: &Path) -> Result<Vec<Value>> {
	let meta = tokio::fs::metadata(valid).await?;
	let uri = resource_uri(valid);
	if meta.is_dir() {
		return Ok(vec![
			text_item(format!(
				"This is a directory. Use the resource URI to browse its contents: {}",
				uri
			)),
			text_resource_item(&uri, "text/plain", format!("Directory: {}", valid.display())),
		]);
	}
	if meta.len() > MAX_INLINE_SIZE {
		return Ok(vec![
			text_item(format!(
				"File is too large to display inline ({} bytes). Access it via resource URI: {}",
				meta.len(),
				uri
			)),
			text_resource_item(
				&uri,
				"text/plain",
				format!("Large file: {} ({} bytes)", valid.display(), meta.len())
			),
		]);
	}
	let mime_type = mime::detect_mime(valid);
	let describe = format!("{} ({}, {} bytes)", valid.display(), mime_type, meta.len());
	match mime::classify(&mime_type) {
		FileKind::Text => {
			let content = tokio::fs::read(valid).await?;
			Ok(vec![text_item(String::from_utf8_lossy(&content).to_string())])
		}
		FileKind::Image => {
			if meta.len() <= MAX_BASE64_SIZE {
				let content = tokio::fs::read(valid).await?;
				Ok(vec![
					text_item(format!("Image file: {}", describe)),
					image_item(&mime_type, encode_base64(&content)),
				])
			}
			else {
				Ok(vec![
					text_item(format!(
						"Image file is too large to embed inline ({} bytes). Access it via resource URI: {}",
						meta.len(),
						uri
					)),
					text_resource_item(&uri, "text/plain", format!("Image file: {}", describe)),
				])
			}
		}
		FileKind::OtherBinary => {
			if meta.len() <= MAX_BASE64_SIZE {
				let content = tokio::fs::read(valid).await?;
				Ok(vec![
					text_item(format!("Binary file: {}", describe)),
					blob_resource_item(&uri, &mime_type, encode_base64(&content)),
				])
			}
			else {
				Ok(vec![
					text_item(format!(
						"Binary file: {}. Access it via resource URI: {}",
						describe, uri
					)),
					text_resource_item(&uri, "text/plain", format!("Binary file: {}", describe)),
				])
			}
		}
	}
}

/// resources/read contents for a validated path, same thresholds as the tool
/// surface but expressed as resource contents instead of tool content items.
pub async fn shape_resource_read(uri: &str, valid: &Path) -> Result<Value> {
	let meta = tokio::fs::metadata(valid).await?;
	if meta.is_dir() {
		let listing = directory_listing(valid).await?;
		return Ok(json!({
			"contents": [
				{
					"uri": uri,
					"mimeType": "text/plain",
					"text": listing
				}
			]
		}));
	}
	if meta.len() > MAX_INLINE_SIZE {
		return Ok(json!({
			"contents": [
				{
					"uri": uri,
					"mimeType": "text/plain",
					"text": format!(
						"File is too large to display inline ({} bytes). Use the read_file tool to access specific portions.",
						meta.len()
					)
				}
			]
		}));
	}
	let mime_type = mime::detect_mime(valid);
	let content = tokio::fs::read(valid).await?;
	if mime::is_text_file(&mime_type) {
		return Ok(json!({
			"contents": [
				{
					"uri": uri,
					"mimeType": mime_type,
					"text": String::from_utf8_lossy(&content).to_string()
				}
			]
		}));
	}
	if meta.len() <= MAX_BASE64_SIZE {
		return Ok(json!({
			"contents": [
				{
					"uri": uri,
					"mimeType": mime_type,
					"blob": encode_base64(&content)
				}
			]
		}));
	}
	Ok(json!({
		"contents": [
			{
				"uri": uri,
				"mimeType": "text/plain",
				"text": format!(
					"Binary file ({}, {} bytes). Use the read_file tool to access specific portions.",
					mime_type,
					meta.len()
				)
			}
		]
	}))
}

/// Plain-text directory listing with per-entry resource URIs.
pub async fn directory_listing(valid: &Path) -> Result<String> {
	let mut reader = tokio::fs::read_dir(valid).await?;
	let mut entries = Vec::new();
	while let Some(entry) = reader.next_entry().await? {
		entries.push(entry);
	}
	entries.sort_by_key(|entry| entry.file_name());
	let mut out = format!("Directory listing for: {}\n\n", valid.display());
	for entry in entries {
		let name = entry.file_name().to_string_lossy().to_string();
		let uri = resource_uri(&entry.path());
		match entry.metadata().await {
			Ok(meta) if meta.is_dir() => {
				out.push_str(&format!("[DIR]  {} ({})\n", name, uri));
			}
			Ok(meta) => {
				out.push_str(&format!("[FILE] {} ({}) - {} bytes\n", name, uri, meta.len()));
			}
			Err(_) => {
				out.push_str(&format!("[FILE] {} ({})\n", name, uri));
			}
		}
	}
	Ok(out)
}
