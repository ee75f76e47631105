use anyhow::{anyhow, Result};
use std::path::{Component, Path, PathBuf};

/// One configured allow-list entry. Paths are normalized at startup and the
/// canonical (symlink-resolved) form is kept alongside the configured form so
/// confinement checks hold no matter which spelling a request resolves to.
#[derive(Clone, Debug)]
pub struct AllowedRoot {
	pub path: PathBuf,
	prefix: String,
	canon_prefix: String,
}

impl AllowedRoot {
	pub fn display(&self) -> String {
		self.path.to_string_lossy().to_string()
	}
}

/// The process-lifetime allow-list. Built once at startup, immutable after.
#[derive(Clone, Debug)]
pub struct Sandbox {
	roots: Vec<AllowedRoot>,
}

impl Sandbox {
	pub fn new(dirs: &[String]) -> Result<Self> {
		if dirs.is_empty() {
			return Err(anyhow!("at least one allowed directory is required"));
		}
		let cwd = std::env::current_dir()?;
		let mut roots = Vec::with_capacity(dirs.len());
		for dir in dirs {
			let absolute = absolutize(Path::new(dir), &cwd);
			let meta = std::fs::metadata(&absolute)
				.map_err(|err| anyhow!("failed to access directory {}: {}", absolute.display(), err))?;
			if !meta.is_dir() {
				return Err(anyhow!("path is not a directory: {}", absolute.display()));
			}
			let canon = std::fs::canonicalize(&absolute)?;
			roots.push(AllowedRoot {
				prefix: separator_terminated(&absolute),
				canon_prefix: separator_terminated(&canon),
				path: absolute,
			});
		}
		Ok(Self {
			roots
		})
	}

	pub fn roots(&self) -> &[AllowedRoot] {
		&self.roots
	}

	/// Lexical confinement check. The candidate is separator-terminated before
	/// the prefix comparison so /tmp/foo never matches /tmp/foobar.
	pub fn contains(&self, path: &Path) -> bool {
		let candidate = separator_terminated(path);
		self.roots
			.iter()
			.any(|root| candidate.starts_with(&root.prefix) || candidate.starts_with(&root.canon_prefix))
	}

	/// Validate a caller-supplied path and return the absolute path every
	/// later syscall must use. Ordering matters: lexical allow-list check
	/// first, then symlink resolution, then the allow-list check again on the
	/// resolved path. A path whose final component does not exist yet is
	/// accepted when its resolved parent sits inside the allow-list.
	pub fn validate(&self, requested: &str) -> Result<PathBuf> {
		let cwd = std::env::current_dir()?;
		let requested = if requested.is_empty() || requested == "." || requested == "./" {
			cwd.to_string_lossy().to_string()
		}
		else {
			requested.to_string()
		};
		let absolute = absolutize(Path::new(&requested), &cwd);
		if !self.contains(&absolute) {
			return Err(anyhow!(
				"access denied - path outside allowed directories: {}",
				absolute.display()
			));
		}
		match std::fs::canonicalize(&absolute) {
			Ok(real) => {
				if !self.contains(&real) {
					return Err(anyhow!("access denied - symlink target outside allowed directories"));
				}
				Ok(real)
			}
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
				let parent = absolute.parent()
					.ok_or_else(|| anyhow!("parent directory does not exist: {}", absolute.display()))?;
				let real_parent = std::fs::canonicalize(parent)
					.map_err(|_| anyhow!("parent directory does not exist: {}", parent.display()))?;
				if !self.contains(&real_parent) {
					return Err(anyhow!("access denied - parent directory outside allowed directories"));
				}
				Ok(absolute)
			}
			Err(err) => Err(err.into()),
		}
	}
}

fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
	if path.is_absolute() {
		normalize_path(path)
	}
	else {
		normalize_path(&cwd.join(path))
	}
}

fn separator_terminated(path: &Path) -> String {
	let mut text = path.to_string_lossy().to_string();
	if !text.ends_with(std::path::MAIN_SEPARATOR) {
		text.push(std::path::MAIN_SEPARATOR);
	}
	text
}

/// Lexical path cleanup without touching the filesystem: collapses `.`,
/// resolves `..` against the stack, preserves a leading root.
pub fn normalize_path(path: &Path) -> PathBuf {
	let mut stack: Vec<std::ffi::OsString> = Vec::new();
	let mut prefix: Option<std::ffi::OsString> = None;
	let mut absolute = false;
	for component in path.components() {
		match component {
			Component::Prefix(prefix_component) => {
				prefix = Some(prefix_component.as_os_str().to_os_string());
			}
			Component::RootDir => {
				absolute = true;
				stack.clear();
			}
			Component::CurDir => {}
			Component::ParentDir => {
				if !stack.is_empty() {
					stack.pop();
				}
				else if !absolute {
					stack.push(std::ffi::OsString::from(".."));
				}
			}
			Component::Normal(part) => stack.push(part.to_os_string()),
		}
	}
	let mut out = PathBuf::new();
	if let Some(prefix) = prefix {
		out.push(prefix);
	}
	if absolute {
		out.push(Path::new("/"));
	}
	for part in stack {
		out.push(part);
	}
	out
}
