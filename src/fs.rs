use anyhow::{anyhow, Result};
use filetime::{set_file_times, FileTime};
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::SystemTime;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub const MAX_CHUNK_SIZE: u64 = 1024 * 1024;

pub async fn write_file(path: &Path, content: &str) -> Result<u64> {
	if let Ok(meta) = fs::metadata(path).await {
		if meta.is_dir() {
			return Err(anyhow!("cannot write to a directory: {}", path.display()));
		}
	}
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent).await?;
	}
	fs::write(path, content).await?;
	Ok(content.len() as u64)
}

pub fn backup_path(path: &Path) -> PathBuf {
	let mut name = path.as_os_str().to_os_string();
	name.push(".backup");
	PathBuf::from(name)
}

fn tmp_path(path: &Path) -> PathBuf {
	let mut name = path.as_os_str().to_os_string();
	name.push(".tmp");
	PathBuf::from(name)
}

pub async fn create_backup(path: &Path) -> Result<PathBuf> {
	let backup = backup_path(path);
	fs::copy(path, &backup).await?;
	Ok(backup)
}

/// Atomic write: stage into `<path>.tmp`, rename over the target. The rename
/// is the only externally observable change. When `backup` is set and the
/// target already exists, a `<path>.backup` sibling is taken first and kept
/// on success; every failure path removes both the temp file and the backup.
pub async fn write_file_safe(path: &Path, content: &str, backup: bool) -> Result<(u64, Option<PathBuf>)> {
	let backup_file = if backup && fs::metadata(path).await.is_ok() {
		Some(create_backup(path).await?)
	}
	else {
		None
	};
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent).await?;
	}
	let tmp = tmp_path(path);
	if let Err(err) = fs::write(&tmp, content).await {
		let _ = fs::remove_file(&tmp).await;
		if let Some(backup_file) = &backup_file {
			let _ = fs::remove_file(backup_file).await;
		}
		return Err(err.into());
	}
	if let Err(err) = fs::rename(&tmp, path).await {
		let _ = fs::remove_file(&tmp).await;
		if let Some(backup_file) = &backup_file {
			let _ = fs::remove_file(backup_file).await;
		}
		return Err(err.into());
	}
	Ok((content.len() as u64, backup_file))
}

pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
	if let Some(parent) = to.parent() {
		fs::create_dir_all(parent).await?;
	}
	fs::copy(from, to).await?;
	let meta = fs::metadata(from).await?;
	fs::set_permissions(to, meta.permissions()).await?;
	let atime = FileTime::from_last_access_time(&meta);
	let mtime = FileTime::from_last_modification_time(&meta);
	set_file_times(to, atime, mtime)?;
	Ok(())
}

/// Recursive directory copy. Directories are recreated with their source
/// permissions; symlinked entries are skipped rather than followed.
pub fn copy_dir_recursive(from: PathBuf, to: PathBuf) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
	Box::pin(
		async move {
			fs::create_dir_all(&to).await?;
			let mut entries = fs::read_dir(&from).await?;
			while let Some(entry) = entries.next_entry().await? {
				let src = entry.path();
				let dst = to.join(entry.file_name());
				let file_type = entry.file_type().await?;
				if file_type.is_symlink() {
					continue;
				}
				if file_type.is_dir() {
					copy_dir_recursive(src, dst).await?;
				}
				else {
					copy_file(&src, &dst).await?;
				}
			}
			let meta = fs::metadata(&from).await?;
			fs::set_permissions(&to, meta.permissions()).await?;
			let atime = FileTime::from_last_access_time(&meta);
			let mtime = FileTime::from_last_modification_time(&meta);
			set_file_times(&to, atime, mtime)?;
			Ok(())
		}
	)
}

pub async fn copy_any(from: &Path, to: &Path) -> Result<()> {
	let meta = fs::metadata(from).await?;
	if meta.is_dir() {
		copy_dir_recursive(from.to_path_buf(), to.to_path_buf()).await
	}
	else {
		copy_file(from, to).await
	}
}

pub async fn move_path(from: &Path, to: &Path) -> Result<()> {
	if let Some(parent) = to.parent() {
		fs::create_dir_all(parent).await?;
	}
	match fs::rename(from, to).await {
		Ok(_) => return Ok(()),
		Err(err) => {
			if !is_cross_device(&err) {
				return Err(err.into());
			}
		}
	}
	let meta = fs::metadata(from).await?;
	if meta.is_dir() {
		copy_dir_recursive(from.to_path_buf(), to.to_path_buf()).await?;
		fs::remove_dir_all(from).await?;
	}
	else {
		copy_file(from, to).await?;
		fs::remove_file(from).await?;
	}
	Ok(())
}

fn is_cross_device(err: &std::io::Error) -> bool {
	err.raw_os_error() == Some(libc::EXDEV)
}

/// Stateless chunked write. Chunk zero creates or truncates the target; every
/// later chunk appends. The caller is responsible for ordering.
pub async fn chunked_write(
	path: &Path,
	content: &str,
	chunk_index: u64,
	total_chunks: u64) -> Result<(bool, u64)> {
	if chunk_index == 0 {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).await?;
		}
		fs::write(path, content).await?;
	}
	else {
		let mut file = fs::OpenOptions::new()
			.append(true)
			.open(path)
			.await?;
		file.write_all(content.as_bytes()).await?;
		file.flush().await?;
	}
	let completed = chunk_index + 1 >= total_chunks;
	let size = fs::metadata(path).await.map(|meta| meta.len()).unwrap_or(0);
	Ok((completed, size))
}

pub fn part_path(path: &Path, index: usize) -> PathBuf {
	PathBuf::from(format!("{}.part{:03}", path.display(), index))
}

/// Split into sequential `<path>.partNNN` files of exactly `chunk_size` bytes
/// except the last. Empty trailing parts are never produced.
pub async fn split_file(path: &Path, chunk_size: u64) -> Result<Vec<PathBuf>> {
	if chunk_size == 0 {
		return Err(anyhow!("chunk_size must be greater than 0"));
	}
	let mut source = fs::File::open(path).await?;
	let mut parts = Vec::new();
	let mut index = 0usize;
	let mut buf = vec![0u8; 64 * 1024];
	loop {
		let mut chunk: Vec<u8> = Vec::new();
		let mut remaining = chunk_size as usize;
		while remaining > 0 {
			let want = remaining.min(buf.len());
			let read = source.read(&mut buf[..want]).await?;
			if read == 0 {
				break;
			}
			chunk.extend_from_slice(&buf[..read]);
			remaining -= read;
		}
		if chunk.is_empty() {
			break;
		}
		let part = part_path(path, index);
		fs::write(&part, &chunk).await?;
		parts.push(part);
		if remaining > 0 {
			break;
		}
		index += 1;
	}
	Ok(parts)
}

/// Concatenate sources into the target in the order given. No check that the
/// inputs form a valid split.
pub async fn join_files(target: &Path, sources: &[PathBuf]) -> Result<u64> {
	if let Some(parent) = target.parent() {
		fs::create_dir_all(parent).await?;
	}
	let mut out = fs::File::create(target).await?;
	let mut total = 0u64;
	for source in sources {
		let mut input = fs::File::open(source).await?;
		total += tokio::io::copy(&mut input, &mut out).await?;
	}
	out.flush().await?;
	Ok(total)
}

#[derive(Debug, Serialize)]
pub struct WatchEvent {
	pub path: String,
	pub event: String,
	pub timestamp: String,
}

/// Poll-based watch: re-stat once per second until the timeout elapses. A
/// change in mtime emits `modified` and moves the baseline; a failed stat
/// emits `deleted` and ends the watch.
pub async fn watch_file(path: &Path, timeout_secs: u64) -> Result<Vec<WatchEvent>> {
	let meta = fs::metadata(path).await?;
	let mut baseline = FileTime::from_last_modification_time(&meta);
	let mut events = Vec::new();
	let started = std::time::Instant::now();
	while started.elapsed().as_secs() < timeout_secs {
		tokio::time::sleep(std::time::Duration::from_secs(1)).await;
		match fs::metadata(path).await {
			Ok(meta) => {
				let mtime = FileTime::from_last_modification_time(&meta);
				if mtime != baseline {
					events.push(WatchEvent {
						path: path.display().to_string(),
						event: "modified".to_string(),
						timestamp: modified_rfc3339(&meta),
					});
					baseline = mtime;
				}
			}
			Err(_) => {
				events.push(WatchEvent {
					path: path.display().to_string(),
					event: "deleted".to_string(),
					timestamp: chrono::Local::now().to_rfc3339(),
				});
				break;
			}
		}
	}
	Ok(events)
}

fn modified_rfc3339(meta: &std::fs::Metadata) -> String {
	meta.modified()
		.map(|time| chrono::DateTime::<chrono::Local>::from(time).to_rfc3339())
		.unwrap_or_else(|_| chrono::Local::now().to_rfc3339())
}

pub fn format_timestamp(time: SystemTime) -> String {
	chrono::DateTime::<chrono::Local>::from(time)
		.format("%Y-%m-%d %H:%M:%S")
		.to_string()
}
