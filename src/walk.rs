use crate::compare;
use crate::content::MAX_INLINE_SIZE;
use crate::mime;
use crate::sandbox::Sandbox;
use anyhow::{anyhow, Result};
use ignore::WalkBuilder;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

const MAX_HASH_SIZE: u64 = 100 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct FileNode {
	pub name: String,
	pub path: String,
	#[serde(rename = "type")]
	pub kind: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub size: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub modified: Option<String>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub children: Vec<FileNode>,
}

/// Depth-bounded tree builder. Every node passes through the sandbox again,
/// so a symlink is only descended when following is enabled and its resolved
/// target stays inside the allow-list; anything else is skipped.
pub fn build_tree(
	sandbox: &Sandbox,
	path: &str,
	max_depth: usize,
	current_depth: usize,
	follow_symlinks: bool) -> Result<FileNode> {
	let valid = sandbox.validate(path)?;
	let meta = std::fs::metadata(&valid)?;
	let name = valid.file_name()
		.map(|name| name.to_string_lossy().to_string())
		.unwrap_or_else(|| valid.display().to_string());
	let modified = meta.modified().ok().map(crate::fs::format_timestamp);
	if !meta.is_dir() {
		return Ok(FileNode {
			name,
			path: valid.display().to_string(),
			kind: "file",
			size: Some(meta.len()),
			modified,
			children: Vec::new(),
		});
	}
	let mut children = Vec::new();
	if current_depth < max_depth {
		let mut entries: Vec<_> = std::fs::read_dir(&valid)?
			.filter_map(|entry| entry.ok())
			.collect();
		entries.sort_by_key(|entry| entry.file_name());
		for entry in entries {
			let is_symlink = entry.file_type()
				.map(|file_type| file_type.is_symlink())
				.unwrap_or(false);
			if is_symlink && !follow_symlinks {
				continue;
			}
			let entry_path = entry.path().to_string_lossy().to_string();
			match build_tree(
				sandbox,
				&entry_path,
				max_depth,
				current_depth + 1,
				follow_symlinks
			) {
				Ok(child) => children.push(child),
				Err(_) => continue,
			}
		}
	}
	Ok(FileNode {
		name,
		path: valid.display().to_string(),
		kind: "directory",
		size: None,
		modified,
		children,
	})
}

fn walker(root: &Path) -> ignore::Walk {
	WalkBuilder::new(root)
		.standard_filters(false)
		.follow_links(false)
		.build()
}

/// Case-insensitive substring match on basenames, whole subtree.
pub fn search_files(sandbox: &Sandbox, root: &Path, pattern: &str) -> Vec<String> {
	let needle = pattern.to_lowercase();
	let mut results = Vec::new();
	for entry in walker(root) {
		let Ok(entry) = entry else {
			continue;
		};
		let path = entry.path();
		if sandbox.validate(&path.to_string_lossy()).is_err() {
			continue;
		}
		let Some(name) = path.file_name().map(|name| name.to_string_lossy().to_lowercase()) else {
			continue;
		};
		if name.contains(&needle) {
			results.push(path.display().to_string());
		}
	}
	results
}

#[derive(Debug, Serialize)]
pub struct SearchMatch {
	pub file: String,
	pub line_number: usize,
	pub line: String,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub context: Vec<String>,
	pub match_start: usize,
	pub match_end: usize,
}

pub struct SmartSearchResults {
	pub name_matches: Vec<String>,
	pub content_matches: Vec<SearchMatch>,
}

/// Regex search over basenames, optionally over the contents of text files
/// below the inline threshold. An invalid regex degrades to a literal
/// substring pattern instead of failing the call.
pub fn smart_search(
	sandbox: &Sandbox,
	root: &Path,
	pattern: &str,
	include_content: bool,
	file_types: &[String]) -> Result<SmartSearchResults> {
	let re = match Regex::new(pattern) {
		Ok(re) => re,
		Err(_) => Regex::new(&regex::escape(pattern))?,
	};
	let extensions: Vec<String> = file_types.iter()
		.map(
			|ext| {
				let lower = ext.to_lowercase();
				if lower.starts_with('.') {
					lower
				}
				else {
					format!(".{}", lower)
				}
			})
		.collect();
	let mut name_matches = Vec::new();
	let mut content_matches = Vec::new();
	for entry in walker(root) {
		let Ok(entry) = entry else {
			continue;
		};
		let path = entry.path();
		if sandbox.validate(&path.to_string_lossy()).is_err() {
			continue;
		}
		if !extensions.is_empty() {
			let ext = path.extension()
				.map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
				.unwrap_or_default();
			if !extensions.contains(&ext) {
				continue;
			}
		}
		let name = path.file_name()
			.map(|name| name.to_string_lossy().to_string())
			.unwrap_or_default();
		if re.is_match(&name) {
			name_matches.push(path.display().to_string());
		}
		if !include_content {
			continue;
		}
		let Ok(meta) = entry.metadata() else {
			continue;
		};
		if meta.is_dir() || meta.len() > MAX_INLINE_SIZE {
			continue;
		}
		if !mime::is_text_file(&mime::detect_mime(path)) {
			continue;
		}
		let Ok(bytes) = std::fs::read(path) else {
			continue;
		};
		let text = String::from_utf8_lossy(&bytes);
		for (index, line) in text.lines().enumerate() {
			if let Some(found) = re.find(line) {
				content_matches.push(SearchMatch {
					file: path.display().to_string(),
					line_number: index + 1,
					line: line.to_string(),
					context: Vec::new(),
					match_start: found.start(),
					match_end: found.end(),
				});
			}
		}
	}
	Ok(SmartSearchResults {
		name_matches,
		content_matches,
	})
}

/// Line-oriented regex search over text files with optional word boundaries,
/// case control, and surrounding context capture.
pub fn advanced_text_search(
	sandbox: &Sandbox,
	root: &Path,
	pattern: &str,
	case_sensitive: bool,
	whole_word: bool,
	include_context: bool,
	context_lines: usize) -> Result<Vec<SearchMatch>> {
	let full_pattern = if whole_word {
		format!(r"\b{}\b", pattern)
	}
	else {
		pattern.to_string()
	};
	let re = RegexBuilder::new(&full_pattern)
		.case_insensitive(!case_sensitive)
		.build()
		.map_err(|err| anyhow!("invalid regex pattern: {}", err))?;
	let mut matches = Vec::new();
	for entry in walker(root) {
		let Ok(entry) = entry else {
			continue;
		};
		let path = entry.path();
		if sandbox.validate(&path.to_string_lossy()).is_err() {
			continue;
		}
		let Ok(meta) = entry.metadata() else {
			continue;
		};
		if meta.is_dir() || meta.len() > MAX_INLINE_SIZE {
			continue;
		}
		if !mime::is_text_file(&mime::detect_mime(path)) {
			continue;
		}
		let Ok(bytes) = std::fs::read(path) else {
			continue;
		};
		let text = String::from_utf8_lossy(&bytes);
		let lines: Vec<&str> = text.lines().collect();
		for (index, line) in lines.iter().enumerate() {
			let Some(found) = re.find(line) else {
				continue;
			};
			let mut context = Vec::new();
			if include_context && context_lines > 0 {
				let start = index.saturating_sub(context_lines);
				let end = (index + context_lines + 1).min(lines.len());
				for neighbor in start..end {
					if neighbor != index {
						context.push(lines[neighbor].trim().to_string());
					}
				}
			}
			matches.push(SearchMatch {
				file: path.display().to_string(),
				line_number: index + 1,
				line: line.to_string(),
				context,
				match_start: found.start(),
				match_end: found.end(),
			});
		}
	}
	Ok(matches)
}

#[derive(Debug, Serialize)]
pub struct DuplicateGroup {
	pub hash: String,
	pub size: u64,
	pub files: Vec<String>,
	pub wasted_bytes: u64,
}

/// Group files by full-content MD5; only groups larger than one survive.
/// Files above 100 MiB are not hashed.
pub fn find_duplicates(sandbox: &Sandbox, root: &Path) -> Result<Vec<DuplicateGroup>> {
	let mut by_hash: HashMap<String, (u64, Vec<String>)> = HashMap::new();
	for entry in walker(root) {
		let Ok(entry) = entry else {
			continue;
		};
		let path = entry.path();
		if sandbox.validate(&path.to_string_lossy()).is_err() {
			continue;
		}
		let Ok(meta) = entry.metadata() else {
			continue;
		};
		if meta.is_dir() || meta.len() > MAX_HASH_SIZE {
			continue;
		}
		let Ok(hash) = compare::md5_of_file(path) else {
			continue;
		};
		let slot = by_hash.entry(hash).or_insert_with(|| (meta.len(), Vec::new()));
		slot.1.push(path.display().to_string());
	}
	let mut groups: Vec<DuplicateGroup> = by_hash.into_iter()
		.filter(|(_, (_, files))| files.len() > 1)
		.map(
			|(hash, (size, mut files))| {
				files.sort();
				let wasted_bytes = size * (files.len() as u64 - 1);
				DuplicateGroup {
					hash,
					size,
					files,
					wasted_bytes,
				}
			})
		.collect();
	groups.sort_by(|a, b| b.wasted_bytes.cmp(&a.wasted_bytes).then_with(|| a.hash.cmp(&b.hash)));
	Ok(groups)
}
