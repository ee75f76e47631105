use crate::mime;
use anyhow::Result;
use md5::{Digest, Md5};
use serde::Serialize;
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

const SIMILARITY_THRESHOLD: f64 = 0.6;

#[derive(Debug, Serialize)]
pub struct FileDiff {
	pub file1: String,
	pub file2: String,
	pub similarity: f64,
	pub added: Vec<String>,
	pub removed: Vec<String>,
	pub modified: Vec<String>,
	pub unchanged: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub diff: Option<String>,
}

/// Compare two files. Text files get a line-set diff with similarity pairing;
/// anything else is an MD5 equality check (100% identical or 0% similar).
pub fn compare_files(path1: &Path, path2: &Path, format: &str) -> Result<FileDiff> {
	let mime1 = mime::detect_mime(path1);
	let mime2 = mime::detect_mime(path2);
	if mime::is_text_file(&mime1) && mime::is_text_file(&mime2) {
		compare_text_files(path1, path2, format)
	}
	else {
		compare_binary_files(path1, path2)
	}
}

fn compare_text_files(path1: &Path, path2: &Path, format: &str) -> Result<FileDiff> {
	let content1 = String::from_utf8_lossy(&std::fs::read(path1)?).to_string();
	let content2 = String::from_utf8_lossy(&std::fs::read(path2)?).to_string();
	let lines1: Vec<String> = content1.lines().map(|line| line.trim().to_string()).collect();
	let lines2: Vec<String> = content2.lines().map(|line| line.trim().to_string()).collect();
	let set1: HashSet<&String> = lines1.iter().collect();
	let set2: HashSet<&String> = lines2.iter().collect();
	let mut added: Vec<String> = lines2.iter()
		.filter(|line| !set1.contains(line))
		.cloned()
		.collect();
	let removed: Vec<String> = lines1.iter()
		.filter(|line| !set2.contains(line))
		.cloned()
		.collect();
	let unchanged = lines1.iter().filter(|line| set2.contains(line)).count();
	let total = lines1.len() + lines2.len();
	let similarity = if total > 0 {
		(unchanged * 2) as f64 / total as f64 * 100.0
	}
	else {
		100.0
	};
	let (modified, used) = pair_modified_lines(&removed, &added);
	let mut used_indexes: Vec<usize> = used.into_iter().collect();
	used_indexes.sort_unstable_by(|a, b| b.cmp(a));
	for index in used_indexes {
		added.remove(index);
	}
	let diff = if format == "unified" && similarity < 100.0 {
		Some(unified_diff(&content1, &content2, path1, path2))
	}
	else {
		None
	};
	Ok(FileDiff {
		file1: path1.display().to_string(),
		file2: path2.display().to_string(),
		similarity,
		added,
		removed,
		modified,
		unchanged,
		diff,
	})
}

fn compare_binary_files(path1: &Path, path2: &Path) -> Result<FileDiff> {
	let hash1 = md5_of_file(path1)?;
	let hash2 = md5_of_file(path2)?;
	let identical = hash1 == hash2;
	Ok(FileDiff {
		file1: path1.display().to_string(),
		file2: path2.display().to_string(),
		similarity: if identical {
			100.0
		}
		else {
			0.0
		},
		added: if identical {
			Vec::new()
		}
		else {
			vec!["Binary files differ".to_string()]
		},
		removed: Vec::new(),
		modified: Vec::new(),
		unchanged: usize::from(identical),
		diff: None,
	})
}

/// Pair removed lines against their closest added counterpart. A pair above
/// the similarity threshold becomes a modified entry and consumes the added
/// line so it cannot match twice.
fn pair_modified_lines(removed: &[String], added: &[String]) -> (Vec<String>, HashSet<usize>) {
	let mut modified = Vec::new();
	let mut used: HashSet<usize> = HashSet::new();
	for removed_line in removed {
		let mut best: Option<(usize, f64)> = None;
		for (index, added_line) in added.iter().enumerate() {
			if used.contains(&index) {
				continue;
			}
			let similarity = string_similarity(removed_line, added_line);
			if similarity > SIMILARITY_THRESHOLD
				&& best.map(|(_, score)| similarity > score).unwrap_or(true) {
				best = Some((index, similarity));
			}
		}
		if let Some((index, _)) = best {
			modified.push(format!("{} -> {}", removed_line, added[index]));
			used.insert(index);
		}
	}
	(modified, used)
}

fn unified_diff(content1: &str, content2: &str, path1: &Path, path2: &Path) -> String {
	let diff = similar::TextDiff::from_lines(content1, content2);
	diff.unified_diff()
		.context_radius(3)
		.header(&format!("a/{}", path1.display()), &format!("b/{}", path2.display()))
		.to_string()
}

/// Levenshtein-normalized similarity in [0, 1].
pub fn string_similarity(a: &str, b: &str) -> f64 {
	if a == b {
		return 1.0;
	}
	if a.is_empty() || b.is_empty() {
		return 0.0;
	}
	let (longer, shorter) = if a.chars().count() >= b.chars().count() {
		(a, b)
	}
	else {
		(b, a)
	};
	let longer_len = longer.chars().count();
	let distance = levenshtein(longer, shorter);
	(longer_len - distance.min(longer_len)) as f64 / longer_len as f64
}

fn levenshtein(a: &str, b: &str) -> usize {
	let a: Vec<char> = a.chars().collect();
	let b: Vec<char> = b.chars().collect();
	let mut previous: Vec<usize> = (0..=b.len()).collect();
	let mut current = vec![0usize; b.len() + 1];
	for (i, ca) in a.iter().enumerate() {
		current[0] = i + 1;
		for (j, cb) in b.iter().enumerate() {
			let cost = usize::from(ca != cb);
			current[j + 1] = (previous[j + 1] + 1)
				.min(current[j] + 1)
				.min(previous[j] + cost);
		}
		std::mem::swap(&mut previous, &mut current);
	}
	previous[b.len()]
}

pub fn md5_of_file(path: &Path) -> Result<String> {
	let mut file = std::fs::File::open(path)?;
	let mut hasher = Md5::new();
	std::io::copy(&mut file, &mut hasher)?;
	Ok(hex::encode(hasher.finalize()))
}

/// Hex digests for the requested subset of {md5, sha1, sha256, sha512}.
/// Unrecognized names are skipped.
pub fn generate_checksums(path: &Path, algorithms: &[String]) -> Result<BTreeMap<String, String>> {
	let content = std::fs::read(path)?;
	let mut checksums = BTreeMap::new();
	for algorithm in algorithms {
		match algorithm.to_lowercase().as_str() {
			"md5" => {
				checksums.insert("md5".to_string(), hex::encode(Md5::digest(&content)));
			}
			"sha1" => {
				checksums.insert("sha1".to_string(), hex::encode(Sha1::digest(&content)));
			}
			"sha256" => {
				checksums.insert("sha256".to_string(), hex::encode(Sha256::digest(&content)));
			}
			"sha512" => {
				checksums.insert("sha512".to_string(), hex::encode(Sha512::digest(&content)));
			}
			_ => {}
		}
	}
	Ok(checksums)
}
