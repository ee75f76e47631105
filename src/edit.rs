use anyhow::{anyhow, Result};
use regex::Regex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confidence {
	High,
	Medium,
	Low,
	None,
}

impl Confidence {
	pub fn as_str(self) -> &'static str {
		match self {
			Confidence::High => "high",
			Confidence::Medium => "medium",
			Confidence::Low => "low",
			Confidence::None => "none",
		}
	}
}

#[derive(Debug)]
pub struct EditResult {
	pub modified_content: String,
	pub replacement_count: usize,
	pub confidence: Confidence,
	pub lines_affected: usize,
}

/// Replace `old_text` with `new_text` in `content` using a tiered match
/// strategy: exact literal first, then per-line matching that survives
/// indentation differences, then whitespace-collapsed matching, and finally a
/// whitespace-flexible regex. The first tier that produces replacements wins.
/// Line endings of all three inputs are normalized to `\n` up front.
pub fn apply_edit(content: &str, old_text: &str, new_text: &str) -> Result<EditResult> {
	if old_text.is_empty() {
		return Err(anyhow!("old_text cannot be empty"));
	}
	let content = normalize_line_endings(content);
	let old_text = normalize_line_endings(old_text);
	let new_text = normalize_line_endings(new_text);

	let exact = content.matches(old_text.as_str()).count();
	if exact > 0 {
		let modified = content.replace(&old_text, &new_text);
		let lines_affected = if old_text.contains('\n') {
			old_text.matches('\n').count() + 1
		}
		else {
			content.lines().filter(|line| line.contains(old_text.as_str())).count()
		};
		return Ok(EditResult {
			modified_content: modified,
			replacement_count: exact,
			confidence: Confidence::High,
			lines_affected,
		});
	}

	let trimmed_old = old_text.trim();
	let collapsed_old = collapse_whitespace(&old_text);
	let mut new_lines: Vec<String> = Vec::new();
	let mut replacements = 0usize;
	let mut lines_affected = 0usize;
	for line in content.split('\n') {
		let trimmed_line = line.trim();
		if trimmed_line == trimmed_old {
			let indent = indentation(line);
			new_lines.push(format!("{}{}", indent, new_text.trim()));
			replacements += 1;
			lines_affected += 1;
			continue;
		}
		if line.contains(old_text.as_str()) {
			replacements += line.matches(old_text.as_str()).count();
			new_lines.push(line.replace(&old_text, &new_text));
			lines_affected += 1;
			continue;
		}
		if !trimmed_old.is_empty() && line.contains(trimmed_old) {
			replacements += line.matches(trimmed_old).count();
			new_lines.push(line.replace(trimmed_old, &new_text));
			lines_affected += 1;
			continue;
		}
		if !collapsed_old.is_empty() && collapse_whitespace(line).contains(&collapsed_old) {
			new_lines.push(line.replacen(trimmed_old, new_text.trim(), 1));
			replacements += 1;
			lines_affected += 1;
			continue;
		}
		new_lines.push(line.to_string());
	}
	if replacements > 0 {
		return Ok(EditResult {
			modified_content: new_lines.join("\n"),
			replacement_count: replacements,
			confidence: Confidence::Medium,
			lines_affected,
		});
	}

	let mut pattern = regex::escape(&old_text);
	pattern = pattern.replace(' ', r"\s+");
	pattern = pattern.replace('\n', r"\s*\n\s*");
	if let Ok(re) = Regex::new(&pattern) {
		let ranges: Vec<(usize, usize)> = re.find_iter(&content)
			.map(|found| (found.start(), found.end()))
			.collect();
		if !ranges.is_empty() {
			let modified = re.replace_all(&content, |_: &regex::Captures| new_text.clone()).to_string();
			let lines_affected = affected_lines(&content, &ranges);
			return Ok(EditResult {
				modified_content: modified,
				replacement_count: ranges.len(),
				confidence: Confidence::Low,
				lines_affected,
			});
		}
	}

	Ok(EditResult {
		modified_content: content,
		replacement_count: 0,
		confidence: Confidence::None,
		lines_affected: 0,
	})
}

pub fn normalize_line_endings(text: &str) -> String {
	text.replace("\r\n", "\n").replace('\r', "\n")
}

fn indentation(line: &str) -> &str {
	let trimmed = line.trim_start_matches([' ', '\t']);
	&line[..line.len() - trimmed.len()]
}

fn collapse_whitespace(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut in_run = false;
	for ch in text.chars() {
		if ch.is_whitespace() {
			if !in_run && !out.is_empty() {
				out.push(' ');
			}
			in_run = true;
		}
		else {
			out.push(ch);
			in_run = false;
		}
	}
	if out.ends_with(' ') {
		out.pop();
	}
	out
}

fn affected_lines(content: &str, ranges: &[(usize, usize)]) -> usize {
	let mut lines = std::collections::BTreeSet::new();
	for (start, end) in ranges {
		let first = content[..*start].matches('\n').count();
		let span = content[*start..*end].matches('\n').count();
		for offset in 0..=span {
			lines.insert(first + offset);
		}
	}
	lines.len()
}
