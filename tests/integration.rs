use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

struct RpcClient {
	child: Child,
	stdin: ChildStdin,
	stdout: BufReader<ChildStdout>,
	next_id: u64,
}

impl RpcClient {
	fn spawn(roots: &[&Path]) -> Self {
		let bin = env!("CARGO_BIN_EXE_mcp-sandboxfs");
		let mut cmd = Command::new(bin);
		for root in roots {
			cmd.arg(root);
		}
		let mut child = cmd.env("MCP_OTEL_ENABLED", "false")
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.spawn()
			.expect("spawn mcp-sandboxfs");
		let stdin = child.stdin
			.take()
			.expect("stdin");
		let stdout = child.stdout
			.take()
			.expect("stdout");
		Self {
			child,
			stdin,
			stdout: BufReader::new(stdout),
			next_id: 1
		}
	}
	fn send(&mut self, method: &str, params: Value) -> Value {
		let id = self.next_id;
		self.next_id += 1;
		let req = json!({
			"jsonrpc": "2.0",
			"id": id,
			"method": method,
			"params": params
		});
		let line = serde_json::to_string(&req).expect("serialize request");
		writeln!(self.stdin, "{}", line).expect("write request");
		self.stdin
			.flush()
			.expect("flush request");
		let mut resp_line = String::new();
		loop {
			resp_line.clear();
			let bytes = self.stdout
				.read_line(&mut resp_line)
				.expect("read response");
			if bytes == 0 {
				panic!("mcp-sandboxfs exited unexpectedly");
			}
			let trimmed = resp_line.trim();
			if trimmed.is_empty() {
				continue;
			}
			let parsed: Value = match serde_json::from_str(trimmed) {
				Ok(value) => value,
				Err(_) => continue,
			};
			if parsed.get("id").and_then(Value::as_u64) == Some(id) {
				return parsed;
			}
		}
	}
	fn call(&mut self, tool: &str, arguments: Value) -> Value {
		let resp = self.send(
			"tools/call",
			json!({
				"name": tool,
				"arguments": arguments
			})
		);
		resp.get("result")
			.cloned()
			.unwrap_or_else(|| panic!("missing result: {}", resp))
	}
}

impl Drop for RpcClient {
	fn drop(&mut self) {
		let _ = self.child.kill();
	}
}

fn write_text(path: &Path, contents: &str) {
	std::fs::create_dir_all(path.parent().unwrap()).expect("create parent");
	std::fs::write(path, contents).expect("write file");
}

fn is_error(result: &Value) -> bool {
	result.get("isError")
		.and_then(Value::as_bool)
		.unwrap_or(false)
}

fn all_text(result: &Value) -> String {
	result.get("content")
		.and_then(Value::as_array)
		.map(
			|items| {
				items.iter()
					.filter_map(|item| item.get("text").and_then(Value::as_str))
					.collect::<Vec<_>>()
					.join("\n")
			})
		.unwrap_or_default()
}

#[test]
fn sandbox_rejects_sibling_prefix_trap() {
	let base = tempfile::tempdir().expect("tempdir");
	let allowed = base.path().join("data");
	let trap = base.path().join("data_secret");
	std::fs::create_dir_all(&allowed).expect("allowed");
	std::fs::create_dir_all(&trap).expect("trap");
	write_text(&trap.join("x"), "secret");
	let mut client = RpcClient::spawn(&[allowed.as_path()]);
	let result = client.call("read_file", json!({ "path": trap.join("x").to_string_lossy() }));
	assert!(is_error(&result));
	assert!(all_text(&result).contains("access denied - path outside allowed directories"));
}

#[cfg(unix)]
#[test]
fn sandbox_rejects_symlink_escape() {
	let base = tempfile::tempdir().expect("tempdir");
	let allowed = base.path().join("root");
	let outside = base.path().join("outside");
	std::fs::create_dir_all(&allowed).expect("root");
	std::fs::create_dir_all(&outside).expect("outside");
	write_text(&outside.join("secret.txt"), "secret");
	std::os::unix::fs::symlink(outside.join("secret.txt"), allowed.join("link")).expect("symlink");
	let mut client = RpcClient::spawn(&[allowed.as_path()]);
	let result = client.call("read_file", json!({ "path": allowed.join("link").to_string_lossy() }));
	assert!(is_error(&result));
	assert!(all_text(&result).contains("access denied - symlink target outside allowed directories"));
}

#[test]
fn read_file_returns_inline_text() {
	let root = tempfile::tempdir().expect("tempdir");
	write_text(&root.path().join("hello.txt"), "hello world\n");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call("read_file", json!({ "path": root.path().join("hello.txt").to_string_lossy() }));
	assert!(!is_error(&result));
	let content = result.get("content").and_then(Value::as_array).expect("content");
	assert_eq!(content.len(), 1);
	assert_eq!(content[0].get("text").and_then(Value::as_str), Some("hello world\n"));
}

#[test]
fn read_file_on_directory_returns_resource_reference() {
	let root = tempfile::tempdir().expect("tempdir");
	std::fs::create_dir_all(root.path().join("sub")).expect("sub");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call("read_file", json!({ "path": root.path().join("sub").to_string_lossy() }));
	assert!(!is_error(&result));
	let content = result.get("content").and_then(Value::as_array).expect("content");
	assert!(
		content
		.iter()
		.any(|item| item.get("type").and_then(Value::as_str) == Some("resource"))
	);
	assert!(all_text(&result).contains("This is a directory"));
}

#[test]
fn read_file_binary_embeds_blob_resource() {
	let root = tempfile::tempdir().expect("tempdir");
	let payload = [0u8, 1, 2, 3, 0, 255, 254, 7];
	std::fs::write(root.path().join("blob.bin"), payload).expect("write");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call("read_file", json!({ "path": root.path().join("blob.bin").to_string_lossy() }));
	assert!(!is_error(&result));
	let content = result.get("content").and_then(Value::as_array).expect("content");
	let resource = content.iter()
		.find(|item| item.get("type").and_then(Value::as_str) == Some("resource"))
		.and_then(|item| item.get("resource"))
		.expect("resource item");
	assert!(resource.get("blob").and_then(Value::as_str).is_some());
	assert!(
		resource.get("uri")
		.and_then(Value::as_str)
		.map(|uri| uri.starts_with("file://"))
		.unwrap_or(false)
	);
}

#[test]
fn write_file_reports_size() {
	let root = tempfile::tempdir().expect("tempdir");
	let target = root.path().join("out.txt");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call(
		"write_file",
		json!({
			"path": target.to_string_lossy(),
			"content": "payload"
		})
	);
	assert!(!is_error(&result));
	assert!(all_text(&result).contains("Successfully wrote 7 bytes"));
	assert_eq!(std::fs::read_to_string(&target).expect("read"), "payload");
}

#[test]
fn write_file_rejects_missing_parent() {
	let root = tempfile::tempdir().expect("tempdir");
	let target = root.path().join("deep/nested/out.txt");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call(
		"write_file",
		json!({
			"path": target.to_string_lossy(),
			"content": "payload"
		})
	);
	assert!(is_error(&result));
	assert!(all_text(&result).contains("parent directory does not exist"));
}

#[test]
fn write_file_rejects_directory_target() {
	let root = tempfile::tempdir().expect("tempdir");
	std::fs::create_dir_all(root.path().join("dir")).expect("dir");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call(
		"write_file",
		json!({
			"path": root.path().join("dir").to_string_lossy(),
			"content": "x"
		})
	);
	assert!(is_error(&result));
	assert!(all_text(&result).contains("cannot write to a directory"));
}

#[test]
fn edit_file_exact_match_reports_high_confidence() {
	let root = tempfile::tempdir().expect("tempdir");
	let file = root.path().join("sample.txt");
	write_text(&file, "This is line 1\nThis is line 2\n    This has indentation\nEnd");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call(
		"edit_file",
		json!({
			"path": file.to_string_lossy(),
			"old_text": "line 2",
			"new_text": "LINE TWO"
		})
	);
	assert!(!is_error(&result));
	let text = all_text(&result);
	assert!(text.contains("Changes: 1 replacement(s)"));
	assert!(text.contains("Match confidence: high"));
	assert!(text.contains("Lines affected: 1"));
	let current = std::fs::read_to_string(&file).expect("read");
	assert!(current.contains("This is LINE TWO"));
	assert!(current.contains("    This has indentation"));
}

#[test]
fn edit_file_no_match_leaves_file_and_no_backup() {
	let root = tempfile::tempdir().expect("tempdir");
	let file = root.path().join("sample.txt");
	write_text(&file, "This is line 1\nThis is line 2");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call(
		"edit_file",
		json!({
			"path": file.to_string_lossy(),
			"old_text": "non-existent text",
			"new_text": "x"
		})
	);
	assert!(is_error(&result));
	assert!(all_text(&result).contains("no matches found"));
	assert_eq!(std::fs::read_to_string(&file).expect("read"), "This is line 1\nThis is line 2");
	assert!(!root.path().join("sample.txt.backup").exists());
}

#[test]
fn edit_file_survives_indentation_differences() {
	let root = tempfile::tempdir().expect("tempdir");
	let file = root.path().join("code.rs");
	write_text(&file, "fn main() {\n    let x = 1;\n}\n");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call(
		"edit_file",
		json!({
			"path": file.to_string_lossy(),
			"old_text": "let x = 1;   ",
			"new_text": "let x = 2;"
		})
	);
	assert!(!is_error(&result));
	assert!(all_text(&result).contains("Match confidence: medium"));
	let current = std::fs::read_to_string(&file).expect("read");
	assert!(current.contains("    let x = 2;"));
}

#[test]
fn edit_file_coerces_wrapped_argument_types() {
	let root = tempfile::tempdir().expect("tempdir");
	let file = root.path().join("nums.txt");
	write_text(&file, "version 41 here");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call(
		"edit_file",
		json!({
			"path": file.to_string_lossy(),
			"old_text": 41,
			"new_text": 42
		})
	);
	assert!(!is_error(&result));
	assert_eq!(std::fs::read_to_string(&file).expect("read"), "version 42 here");
}

#[test]
fn edit_file_rejects_object_argument() {
	let root = tempfile::tempdir().expect("tempdir");
	write_text(&root.path().join("x.txt"), "content");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call(
		"edit_file",
		json!({
			"path": root.path().join("x.txt").to_string_lossy(),
			"old_text": { "wrapped": true },
			"new_text": "x"
		})
	);
	assert!(is_error(&result));
	let text = all_text(&result);
	assert!(text.contains("old_text"));
	assert!(text.contains("object"));
}

#[test]
fn create_and_list_directory() {
	let root = tempfile::tempdir().expect("tempdir");
	let mut client = RpcClient::spawn(&[root.path()]);
	let created = client.call(
		"create_directory",
		json!({ "path": root.path().join("newdir").to_string_lossy() })
	);
	assert!(!is_error(&created));
	write_text(&root.path().join("newdir/a.txt"), "aaa");
	let again = client.call(
		"create_directory",
		json!({ "path": root.path().join("newdir").to_string_lossy() })
	);
	assert!(all_text(&again).contains("already exists"));
	let listing = client.call(
		"list_directory",
		json!({ "path": root.path().join("newdir").to_string_lossy() })
	);
	let text = all_text(&listing);
	assert!(text.contains("[FILE] a.txt"));
	assert!(text.contains("3 bytes"));
}

#[test]
fn tree_respects_depth_bound() {
	let root = tempfile::tempdir().expect("tempdir");
	std::fs::create_dir_all(root.path().join("a/b/c")).expect("dirs");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call(
		"tree",
		json!({
			"path": root.path().to_string_lossy(),
			"depth": 2
		})
	);
	assert!(!is_error(&result));
	let text = all_text(&result);
	assert!(text.contains("\"name\": \"a\""));
	assert!(text.contains("\"name\": \"b\""));
	assert!(!text.contains("\"name\": \"c\""));
}

#[test]
fn search_files_matches_case_insensitively() {
	let root = tempfile::tempdir().expect("tempdir");
	write_text(&root.path().join("Report.TXT"), "x");
	write_text(&root.path().join("notes.md"), "x");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call(
		"search_files",
		json!({
			"path": root.path().to_string_lossy(),
			"pattern": "report"
		})
	);
	let text = all_text(&result);
	assert!(text.contains("Found 1 results"));
	assert!(text.contains("Report.TXT"));
}

#[test]
fn smart_search_finds_content_matches() {
	let root = tempfile::tempdir().expect("tempdir");
	write_text(&root.path().join("lib.rs"), "fn alpha() {}\nfn beta() {}\n");
	write_text(&root.path().join("notes.txt"), "alpha note\n");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call(
		"smart_search",
		json!({
			"path": root.path().to_string_lossy(),
			"pattern": "alpha",
			"include_content": true,
			"file_types": [".rs"]
		})
	);
	let text = all_text(&result);
	assert!(text.contains("Content matches (1)"));
	assert!(text.contains("lib.rs:1"));
	assert!(!text.contains("notes.txt"));
}

#[test]
fn advanced_text_search_includes_context() {
	let root = tempfile::tempdir().expect("tempdir");
	write_text(&root.path().join("data.txt"), "one\ntwo needle here\nthree\n");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call(
		"advanced_text_search",
		json!({
			"path": root.path().to_string_lossy(),
			"pattern": "NEEDLE",
			"include_context": true,
			"context_lines": 1
		})
	);
	let text = all_text(&result);
	assert!(text.contains("Found 1 matches"));
	assert!(text.contains("data.txt:2"));
	assert!(text.contains("| one"));
	assert!(text.contains("| three"));
}

#[test]
fn advanced_text_search_rejects_invalid_regex() {
	let root = tempfile::tempdir().expect("tempdir");
	write_text(&root.path().join("data.txt"), "text");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call(
		"advanced_text_search",
		json!({
			"path": root.path().to_string_lossy(),
			"pattern": "broken[",
		})
	);
	assert!(is_error(&result));
	assert!(all_text(&result).contains("invalid regex pattern"));
}

#[test]
fn read_multiple_files_reports_partial_failures_inline() {
	let root = tempfile::tempdir().expect("tempdir");
	write_text(&root.path().join("one.txt"), "alpha");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call(
		"read_multiple_files",
		json!({
			"paths": [
				root.path().join("one.txt").to_string_lossy(),
				root.path().join("missing.txt").to_string_lossy()
			]
		})
	);
	assert!(!is_error(&result));
	let text = all_text(&result);
	assert!(text.contains("--- File:"));
	assert!(text.contains("alpha"));
	assert!(text.contains("missing.txt"));
	assert!(text.contains("Error"));
}

#[test]
fn read_multiple_files_enforces_file_limit() {
	let root = tempfile::tempdir().expect("tempdir");
	let mut client = RpcClient::spawn(&[root.path()]);
	let paths: Vec<String> = (0..51)
		.map(|n| root.path().join(format!("f{}.txt", n)).to_string_lossy().to_string())
		.collect();
	let result = client.call("read_multiple_files", json!({ "paths": paths }));
	assert!(is_error(&result));
	assert!(all_text(&result).contains("Maximum is 50"));
}

#[test]
fn batch_operations_continue_after_failure() {
	let root = tempfile::tempdir().expect("tempdir");
	write_text(&root.path().join("a.txt"), "copy me");
	let missing = root.path().join("c_missing.txt");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call(
		"batch_operations",
		json!({
			"operations": [
				{
					"type": "copy",
					"from": root.path().join("a.txt").to_string_lossy(),
					"to": root.path().join("b.txt").to_string_lossy()
				},
				{
					"type": "rename",
					"from": missing.to_string_lossy(),
					"to": root.path().join("d.txt").to_string_lossy()
				}
			]
		})
	);
	assert!(!is_error(&result));
	let text = all_text(&result);
	assert!(text.contains("Successful: 1"));
	assert!(text.contains("Failed: 1"));
	assert!(text.contains("c_missing"));
	assert_eq!(std::fs::read_to_string(root.path().join("b.txt")).expect("copied"), "copy me");
}

#[test]
fn batch_operations_execute_in_declared_order() {
	let root = tempfile::tempdir().expect("tempdir");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call(
		"batch_operations",
		json!({
			"operations": [
				{
					"type": "write",
					"path": root.path().join("staged.txt").to_string_lossy(),
					"content": "staged"
				},
				{
					"type": "move",
					"from": root.path().join("staged.txt").to_string_lossy(),
					"to": root.path().join("final.txt").to_string_lossy()
				},
				{
					"type": "delete",
					"path": root.path().join("staged.txt").to_string_lossy()
				}
			]
		})
	);
	let text = all_text(&result);
	assert!(text.contains("Successful: 3"));
	assert!(text.contains("Already deleted"));
	assert_eq!(std::fs::read_to_string(root.path().join("final.txt")).expect("moved"), "staged");
}

#[test]
fn compare_files_reports_modified_pairs() {
	let root = tempfile::tempdir().expect("tempdir");
	write_text(&root.path().join("one.txt"), "alpha\nlet value = 1;\nomega\n");
	write_text(&root.path().join("two.txt"), "alpha\nlet value = 2;\nomega\n");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call(
		"compare_files",
		json!({
			"file1": root.path().join("one.txt").to_string_lossy(),
			"file2": root.path().join("two.txt").to_string_lossy()
		})
	);
	let text = all_text(&result);
	assert!(text.contains("Modified lines (1)"));
	assert!(text.contains("let value = 1; -> let value = 2;"));
	assert!(text.contains("Unchanged lines: 2"));
	assert!(text.contains("-let value = 1;"));
}

#[test]
fn compare_identical_files() {
	let root = tempfile::tempdir().expect("tempdir");
	write_text(&root.path().join("one.txt"), "same\n");
	write_text(&root.path().join("two.txt"), "same\n");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call(
		"compare_files",
		json!({
			"file1": root.path().join("one.txt").to_string_lossy(),
			"file2": root.path().join("two.txt").to_string_lossy()
		})
	);
	assert!(all_text(&result).contains("Files are identical"));
}

#[test]
fn generate_checksum_defaults_to_md5_and_sha256() {
	let root = tempfile::tempdir().expect("tempdir");
	write_text(&root.path().join("hello.txt"), "hello world");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call(
		"generate_checksum",
		json!({ "path": root.path().join("hello.txt").to_string_lossy() })
	);
	let text = all_text(&result);
	assert!(text.contains("5eb63bbbe01eeed093cb22bb8f5acdc3"));
	assert!(text.contains("b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"));
}

#[test]
fn find_duplicates_reports_wasted_space() {
	let root = tempfile::tempdir().expect("tempdir");
	write_text(&root.path().join("a.dat"), "identical-content");
	write_text(&root.path().join("b.dat"), "identical-content");
	write_text(&root.path().join("c.dat"), "unique-content");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call(
		"find_duplicates",
		json!({ "path": root.path().to_string_lossy() })
	);
	let text = all_text(&result);
	assert!(text.contains("Found 1 groups"));
	assert!(text.contains("a.dat"));
	assert!(text.contains("b.dat"));
	assert!(!text.contains("c.dat"));
}

#[test]
fn chunked_write_assembles_file() {
	let root = tempfile::tempdir().expect("tempdir");
	let target = root.path().join("assembled.txt");
	let mut client = RpcClient::spawn(&[root.path()]);
	let first = client.call(
		"chunked_write",
		json!({
			"path": target.to_string_lossy(),
			"content": "part-one ",
			"chunk_index": 0,
			"total_chunks": 2
		})
	);
	assert!(all_text(&first).contains("In progress"));
	let second = client.call(
		"chunked_write",
		json!({
			"path": target.to_string_lossy(),
			"content": "part-two",
			"chunk_index": 1,
			"total_chunks": 2
		})
	);
	assert!(all_text(&second).contains("Completed"));
	assert_eq!(std::fs::read_to_string(&target).expect("read"), "part-one part-two");
}

#[test]
fn split_then_join_roundtrips() {
	let root = tempfile::tempdir().expect("tempdir");
	let source = root.path().join("data.bin");
	let payload = "0123456789".repeat(100);
	write_text(&source, &payload);
	let mut client = RpcClient::spawn(&[root.path()]);
	let split = client.call(
		"split_file",
		json!({
			"path": source.to_string_lossy(),
			"chunk_size": 400
		})
	);
	assert!(all_text(&split).contains("Chunks: 3 files"));
	assert!(root.path().join("data.bin.part000").exists());
	assert!(root.path().join("data.bin.part002").exists());
	let join = client.call(
		"join_files",
		json!({
			"target_path": root.path().join("joined.bin").to_string_lossy(),
			"source_files": [
				root.path().join("data.bin.part000").to_string_lossy(),
				root.path().join("data.bin.part001").to_string_lossy(),
				root.path().join("data.bin.part002").to_string_lossy()
			]
		})
	);
	assert!(all_text(&join).contains("Total size: 1000 bytes"));
	assert_eq!(std::fs::read_to_string(root.path().join("joined.bin")).expect("read"), payload);
}

#[test]
fn write_file_safe_keeps_backup_and_removes_tmp() {
	let root = tempfile::tempdir().expect("tempdir");
	let target = root.path().join("safe.txt");
	write_text(&target, "before");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call(
		"write_file_safe",
		json!({
			"path": target.to_string_lossy(),
			"content": "after",
			"create_backup": true
		})
	);
	let text = all_text(&result);
	assert!(text.contains("Safe write completed"));
	assert!(text.contains("Backup:"));
	assert_eq!(std::fs::read_to_string(&target).expect("read"), "after");
	assert_eq!(
		std::fs::read_to_string(root.path().join("safe.txt.backup")).expect("backup"),
		"before"
	);
	assert!(!root.path().join("safe.txt.tmp").exists());
}

#[test]
fn list_allowed_directories_shows_all_roots() {
	let base = tempfile::tempdir().expect("tempdir");
	let first = base.path().join("first");
	let second = base.path().join("second");
	std::fs::create_dir_all(&first).expect("first");
	std::fs::create_dir_all(&second).expect("second");
	let mut client = RpcClient::spawn(&[first.as_path(), second.as_path()]);
	let result = client.call("list_allowed_directories", json!({}));
	let text = all_text(&result);
	assert!(text.contains("Allowed directories:"));
	assert!(text.contains(&first.to_string_lossy().to_string()));
	assert!(text.contains(&second.to_string_lossy().to_string()));
}

#[test]
fn get_file_info_reports_metadata() {
	let root = tempfile::tempdir().expect("tempdir");
	write_text(&root.path().join("info.json"), "{\"a\": 1}");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call(
		"get_file_info",
		json!({ "path": root.path().join("info.json").to_string_lossy() })
	);
	let text = all_text(&result);
	assert!(text.contains("Size: 8 bytes"));
	assert!(text.contains("IsFile: true"));
	assert!(text.contains("Resource URI: file://"));
}

#[test]
fn copy_file_recurses_into_directories() {
	let root = tempfile::tempdir().expect("tempdir");
	write_text(&root.path().join("src/nested/file.txt"), "data");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call(
		"copy_file",
		json!({
			"source": root.path().join("src").to_string_lossy(),
			"destination": root.path().join("dst").to_string_lossy()
		})
	);
	assert!(!is_error(&result));
	assert_eq!(
		std::fs::read_to_string(root.path().join("dst/nested/file.txt")).expect("copied"),
		"data"
	);
	assert_eq!(
		std::fs::read_to_string(root.path().join("src/nested/file.txt")).expect("source intact"),
		"data"
	);
}

#[test]
fn move_file_renames_within_root() {
	let root = tempfile::tempdir().expect("tempdir");
	write_text(&root.path().join("from.txt"), "contents");
	let mut client = RpcClient::spawn(&[root.path()]);
	std::fs::create_dir_all(root.path().join("sub")).expect("sub");
	let result = client.call(
		"move_file",
		json!({
			"source": root.path().join("from.txt").to_string_lossy(),
			"destination": root.path().join("sub/to.txt").to_string_lossy()
		})
	);
	assert!(!is_error(&result));
	assert!(!root.path().join("from.txt").exists());
	assert_eq!(
		std::fs::read_to_string(root.path().join("sub/to.txt")).expect("moved"),
		"contents"
	);
}

#[test]
fn delete_directory_requires_recursive_flag() {
	let root = tempfile::tempdir().expect("tempdir");
	std::fs::create_dir_all(root.path().join("dir")).expect("dir");
	let mut client = RpcClient::spawn(&[root.path()]);
	let refused = client.call(
		"delete_file",
		json!({ "path": root.path().join("dir").to_string_lossy() })
	);
	assert!(is_error(&refused));
	assert!(all_text(&refused).contains("recursive=true"));
	assert!(root.path().join("dir").exists());
	let deleted = client.call(
		"delete_file",
		json!({
			"path": root.path().join("dir").to_string_lossy(),
			"recursive": true
		})
	);
	assert!(!is_error(&deleted));
	assert!(!root.path().join("dir").exists());
}

#[test]
fn missing_required_argument_is_rejected() {
	let root = tempfile::tempdir().expect("tempdir");
	let mut client = RpcClient::spawn(&[root.path()]);
	let result = client.call("read_file", json!({}));
	assert!(is_error(&result));
	assert!(all_text(&result).contains("missing required parameter: path"));
}

#[test]
fn resources_read_resolves_through_sandbox() {
	let root = tempfile::tempdir().expect("tempdir");
	write_text(&root.path().join("doc.txt"), "resource body");
	let mut client = RpcClient::spawn(&[root.path()]);
	let uri = format!("file://{}", root.path().join("doc.txt").display());
	let resp = client.send("resources/read", json!({ "uri": uri }));
	let contents = resp.get("result")
		.and_then(|result| result.get("contents"))
		.and_then(Value::as_array)
		.expect("contents");
	assert_eq!(contents.len(), 1);
	assert_eq!(contents[0].get("text").and_then(Value::as_str), Some("resource body"));
	let outside = client.send("resources/read", json!({ "uri": "file:///etc/passwd" }));
	let error = outside.get("error").expect("error object");
	assert!(
		error.get("message")
		.and_then(Value::as_str)
		.unwrap_or("")
		.contains("access denied")
	);
}

#[test]
fn tools_list_covers_the_catalog() {
	let root = tempfile::tempdir().expect("tempdir");
	let mut client = RpcClient::spawn(&[root.path()]);
	let resp = client.send("tools/list", json!({}));
	let tools = resp.get("result")
		.and_then(|result| result.get("tools"))
		.and_then(Value::as_array)
		.expect("tools");
	let names: Vec<&str> = tools.iter()
		.filter_map(|tool| tool.get("name").and_then(Value::as_str))
		.collect();
	for expected in [
		"read_file",
		"write_file",
		"edit_file",
		"copy_file",
		"move_file",
		"delete_file",
		"list_directory",
		"create_directory",
		"tree",
		"search_files",
		"smart_search",
		"advanced_text_search",
		"find_duplicates",
		"get_file_info",
		"read_multiple_files",
		"list_allowed_directories",
		"compare_files",
		"generate_checksum",
		"watch_file",
		"batch_operations",
		"chunked_write",
		"split_file",
		"join_files",
		"write_file_safe",
	] {
		assert!(names.contains(&expected), "missing tool {}", expected);
	}
}

#[test]
fn watch_file_returns_after_bounded_timeout() {
	let root = tempfile::tempdir().expect("tempdir");
	write_text(&root.path().join("watched.txt"), "still");
	let mut client = RpcClient::spawn(&[root.path()]);
	let started = std::time::Instant::now();
	let result = client.call(
		"watch_file",
		json!({
			"path": root.path().join("watched.txt").to_string_lossy(),
			"timeout": 1
		})
	);
	assert!(started.elapsed().as_secs() < 5);
	assert!(all_text(&result).contains("monitored for 1s"));
}
