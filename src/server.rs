use crate::compare;
use crate::content;
use crate::edit;
use crate::fs;
use crate::mime;
use crate::protocol::{Request, Response};
use crate::sandbox::Sandbox;
use crate::walk;
use anyhow::{anyhow, Result};
use opentelemetry::global;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::resource::Resource;
use opentelemetry_sdk::trace as sdktrace;
use opentelemetry_semantic_conventions::resource as semconv;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info_span, Span};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const MAX_FILES_PER_READ: usize = 50;
const MAX_BATCH_OPERATIONS: usize = 50;
const DEFAULT_TREE_DEPTH: usize = 3;
const DEFAULT_CONTEXT_LINES: usize = 3;
const DEFAULT_WATCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug)]
struct ProtocolError {
	code: i64,
	message: String,
}

impl ProtocolError {
	fn new(code: i64, message: impl Into<String>) -> Self {
		Self {
			code,
			message: message.into()
		}
	}
}

impl std::fmt::Display for ProtocolError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.message)
	}
}

impl std::error::Error for ProtocolError {}

#[derive(Clone, Debug)]
pub struct Config {
	pub allowed_dirs: Vec<String>,
	pub otel_enabled: bool,
	pub otel_endpoint: String,
	pub otel_service_name: String,
	pub session_id: String,
}

pub fn load_config() -> Result<Config> {
	let allowed_dirs: Vec<String> = std::env::args()
		.skip(1)
		.filter(|arg| !arg.trim().is_empty())
		.collect();
	if allowed_dirs.is_empty() {
		return Err(anyhow!("usage: mcp-sandboxfs <allowed-directory> [allowed-directory ...]"));
	}
	let mut otel_enabled = true;
	let mut otel_endpoint = String::from("http://127.0.0.1:4317");
	let mut otel_service_name = String::from("mcp-sandboxfs");
	if let Ok(env_enabled) = std::env::var("MCP_OTEL_ENABLED") {
		if !env_enabled.trim().is_empty() {
			let value = env_enabled.to_lowercase();
			otel_enabled = value == "1" || value == "true" || value == "yes";
		}
	}
	if let Ok(env_endpoint) = std::env::var("MCP_OTEL_ENDPOINT") {
		if !env_endpoint.trim().is_empty() {
			otel_endpoint = env_endpoint;
		}
	}
	if let Ok(env_service) = std::env::var("MCP_OTEL_SERVICE_NAME") {
		if !env_service.trim().is_empty() {
			otel_service_name = env_service;
		}
	}
	Ok(Config {
		allowed_dirs,
		otel_enabled,
		otel_endpoint,
		otel_service_name,
		session_id: uuid::Uuid::new_v4().to_string(),
	})
}

pub fn init_tracing(config: &Config) {
	let _ = global::set_error_handler(|_| {});
	let resource = Resource::new(
		vec![
		opentelemetry::KeyValue::new(semconv::SERVICE_NAME, config.otel_service_name.clone()),
		opentelemetry::KeyValue::new(semconv::SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
		opentelemetry::KeyValue::new("mcp.session_id", config.session_id.clone()),
		]
	);
	let tracing_layer = if config.otel_enabled {
		let exporter = opentelemetry_otlp::new_exporter().tonic().with_endpoint(config.otel_endpoint.clone());
		let provider = opentelemetry_otlp::new_pipeline()
			.tracing()
			.with_exporter(exporter)
			.with_trace_config(sdktrace::Config::default().with_resource(resource))
			.install_batch(opentelemetry_sdk::runtime::Tokio)
			.ok();
		if let Some(tracer) = provider {
			if let Some(provider) = tracer.provider() {
				global::set_tracer_provider(provider);
			}
			Some(OpenTelemetryLayer::new(tracer))
		}
		else {
			None
		}
	}
	else {
		None
	};
	let fmt_layer = tracing_subscriber::fmt::layer()
		.with_target(false)
		.with_writer(std::io::stderr);
	let subscriber = tracing_subscriber::registry().with(fmt_layer);
	if let Some(layer) = tracing_layer {
		subscriber.with(layer).init();
	}
	else {
		subscriber.init();
	}
}

pub struct ServerState {
	pub sandbox: Sandbox,
	pub config: Config,
}

pub async fn run(config: Config) -> Result<()> {
	let sandbox = Sandbox::new(&config.allowed_dirs)?;
	let state = Arc::new(ServerState {
		sandbox,
		config
	});
	let stdin = io::stdin();
	let stdout = io::stdout();
	let mut reader = BufReader::new(stdin).lines();
	let mut writer = io::BufWriter::new(stdout);
	while let Some(line) = reader.next_line().await? {
		if line.trim().is_empty() {
			continue;
		}
		let req: Request = match serde_json::from_str(&line) {
			Ok(req) => req,
			Err(err) => {
				let resp = Response::err(Value::Null, -32700, err.to_string());
				write_response(&mut writer, resp).await?;
				continue;
			}
		};
		let resp = handle_request(&state, req).await;
		write_response(&mut writer, resp).await?;
	}
	Ok(())
}

async fn handle_request(state: &Arc<ServerState>, req: Request) -> Response {
	let method = req.method.clone();
	let tool_name = extract_tool_name(&method, &req.params);
	let span = info_span!(
		"mcp.request",
		"mcp.session_id" = %state.config.session_id,
		"mcp.method" = %method,
		"mcp.tool_name" = tool_name.as_deref().unwrap_or(""),
		"mcp.is_error" = tracing::field::Empty,
		"mcp.error_code" = tracing::field::Empty,
	);
	let _guard = span.enter();
	match route(state, &req).await {
		Ok(value) => {
			record_result(&span, &value);
			Response::ok(req.id, value)
		}
		Err(err) => {
			span.record("mcp.is_error", true);
			if let Some(protocol) = err.downcast_ref::<ProtocolError>() {
				Response::err(req.id, protocol.code, protocol.message.clone())
			}
			else {
				Response::err(req.id, -32000, err.to_string())
			}
		}
	}
}

async fn route(state: &Arc<ServerState>, req: &Request) -> Result<Value> {
	match req.method.as_str() {
		"initialize" => Ok(json!({
			"serverInfo": {
				"name": "mcp-sandboxfs",
				"version": env!("CARGO_PKG_VERSION")
			},
			"capabilities": {
				"resources": {
					"read": true,
					"list": true
				},
				"tools": {
					"list": true,
					"call": true
				}
			}
		})),
		"tools/list" => Ok(json!({
			"tools": tool_definitions(),
		})),
		"tools/call" => {
			let name = req.params
				.get("name")
				.and_then(Value::as_str)
				.ok_or_else(|| ProtocolError::new(-32602, "name is required"))?
				.to_string();
			let arguments = req.params
				.get("arguments")
				.cloned()
				.unwrap_or_else(|| json!({}));
			dispatch_tool(state.clone(), name, arguments).await
		}
		"resources/list" => Ok(resources_list(state)),
		"resources/read" => resources_read(state, req).await,
		_ => Err(ProtocolError::new(-32601, "method not found").into()),
	}
}

/// Tool execution runs on its own task so a panic in a handler becomes an
/// error envelope instead of tearing down the transport loop.
async fn dispatch_tool(state: Arc<ServerState>, name: String, arguments: Value) -> Result<Value> {
	let tool = name.clone();
	let handle = tokio::spawn(async move { execute_tool(state, &tool, &arguments).await });
	match handle.await {
		Ok(value) => Ok(value),
		Err(err) => {
			if err.is_panic() {
				Ok(content::error(format!("Error: tool {} failed unexpectedly", name)))
			}
			else {
				Err(anyhow!("tool {} was cancelled", name))
			}
		}
	}
}

async fn execute_tool(state: Arc<ServerState>, name: &str, args: &Value) -> Value {
	let outcome = match name {
		"read_file" => read_file_tool(&state, args).await,
		"write_file" => write_file_tool(&state, args).await,
		"edit_file" => edit_file_tool(&state, args).await,
		"copy_file" => copy_file_tool(&state, args).await,
		"move_file" => move_file_tool(&state, args).await,
		"delete_file" => delete_file_tool(&state, args).await,
		"list_directory" => list_directory_tool(&state, args).await,
		"create_directory" => create_directory_tool(&state, args).await,
		"tree" => tree_tool(&state, args).await,
		"search_files" => search_files_tool(&state, args).await,
		"smart_search" => smart_search_tool(&state, args).await,
		"advanced_text_search" => advanced_text_search_tool(&state, args).await,
		"find_duplicates" => find_duplicates_tool(&state, args).await,
		"get_file_info" => get_file_info_tool(&state, args).await,
		"read_multiple_files" => read_multiple_files_tool(&state, args).await,
		"list_allowed_directories" => list_allowed_directories_tool(&state).await,
		"compare_files" => compare_files_tool(&state, args).await,
		"generate_checksum" => generate_checksum_tool(&state, args).await,
		"watch_file" => watch_file_tool(&state, args).await,
		"batch_operations" => batch_operations_tool(&state, args).await,
		"chunked_write" => chunked_write_tool(&state, args).await,
		"split_file" => split_file_tool(&state, args).await,
		"join_files" => join_files_tool(&state, args).await,
		"write_file_safe" => write_file_safe_tool(&state, args).await,
		_ => Err(anyhow!("unknown tool: {}", name)),
	};
	match outcome {
		Ok(items) => content::success(items),
		Err(err) => content::error(format!("Error: {}", err)),
	}
}

fn resources_list(state: &Arc<ServerState>) -> Value {
	let resources: Vec<Value> = state.sandbox
		.roots()
		.iter()
		.map(
			|root| {
				json!({
					"uri": format!("file://{}", root.display()),
					"name": root.display(),
					"description": "Files and directories under an allowed root",
					"mimeType": "text/plain"
				})
			})
		.collect();
	json!({
		"resources": resources
	})
}

async fn resources_read(state: &Arc<ServerState>, req: &Request) -> Result<Value> {
	let uri = req.params
		.get("uri")
		.and_then(Value::as_str)
		.ok_or_else(|| ProtocolError::new(-32602, "uri is required"))?;
	let path = uri.strip_prefix("file://")
		.ok_or_else(|| ProtocolError::new(-32602, format!("unsupported URI scheme: {}", uri)))?;
	let valid = state.sandbox
		.validate(path)
		.map_err(|err| ProtocolError::new(-32000, err.to_string()))?;
	content::shape_resource_read(uri, &valid).await
}

// ---- argument coercion -------------------------------------------------

fn type_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

fn require_string(args: &Value, key: &str) -> Result<String> {
	match args.get(key) {
		None | Some(Value::Null) => Err(anyhow!("missing required parameter: {}", key)),
		Some(Value::String(text)) => Ok(text.clone()),
		Some(Value::Number(number)) => Ok(number.to_string()),
		Some(Value::Bool(flag)) => Ok(flag.to_string()),
		Some(other) => Err(anyhow!("parameter {} must be a string, got {}", key, type_name(other))),
	}
}

fn require_u64(args: &Value, key: &str) -> Result<u64> {
	match args.get(key) {
		None | Some(Value::Null) => Err(anyhow!("missing required parameter: {}", key)),
		Some(Value::Number(number)) => number.as_u64()
			.or_else(
				|| {
					number.as_f64()
						.filter(|value| *value >= 0.0)
						.map(|value| value as u64)
				})
			.ok_or_else(|| anyhow!("parameter {} must be a non-negative number", key)),
		Some(Value::String(text)) => text.trim()
			.parse::<u64>()
			.map_err(|_| anyhow!("parameter {} must be a non-negative number", key)),
		Some(other) => Err(anyhow!("parameter {} must be a number, got {}", key, type_name(other))),
	}
}

fn optional_u64(args: &Value, key: &str) -> Result<Option<u64>> {
	match args.get(key) {
		None | Some(Value::Null) => Ok(None),
		Some(_) => require_u64(args, key).map(Some),
	}
}

fn optional_bool(args: &Value, key: &str, default: bool) -> Result<bool> {
	match args.get(key) {
		None | Some(Value::Null) => Ok(default),
		Some(Value::Bool(flag)) => Ok(*flag),
		Some(Value::String(text)) => match text.to_lowercase().as_str() {
			"true" | "1" | "yes" => Ok(true),
			"false" | "0" | "no" => Ok(false),
			_ => Err(anyhow!("parameter {} must be a boolean, got string {:?}", key, text)),
		},
		Some(other) => Err(anyhow!("parameter {} must be a boolean, got {}", key, type_name(other))),
	}
}

fn optional_string_array(args: &Value, key: &str) -> Result<Vec<String>> {
	match args.get(key) {
		None | Some(Value::Null) => Ok(Vec::new()),
		Some(Value::Array(items)) => Ok(
			items.iter()
				.filter_map(|item| item.as_str().map(|text| text.to_string()))
				.collect()
		),
		Some(other) => Err(anyhow!("parameter {} must be an array, got {}", key, type_name(other))),
	}
}

// ---- tool handlers ------------------------------------------------------

async fn read_file_tool(state: &ServerState, args: &Value) -> Result<Vec<Value>> {
	let path = require_string(args, "path")?;
	let valid = state.sandbox.validate(&path)?;
	content::shape_file_read(&valid).await
}

async fn write_file_tool(state: &ServerState, args: &Value) -> Result<Vec<Value>> {
	let path = require_string(args, "path")?;
	let text = require_string(args, "content")?;
	let valid = state.sandbox.validate(&path)?;
	let size = fs::write_file(&valid, &text).await?;
	let uri = content::resource_uri(&valid);
	Ok(vec![
		content::text_item(format!("Successfully wrote {} bytes to {}", size, path)),
		content::text_resource_item(&uri, "text/plain", format!("File: {} ({} bytes)", valid.display(), size)),
	])
}

async fn edit_file_tool(state: &ServerState, args: &Value) -> Result<Vec<Value>> {
	let path = require_string(args, "path")?;
	let old_text = require_string(args, "old_text")?;
	let new_text = require_string(args, "new_text")?;
	let valid = state.sandbox.validate(&path)?;
	let meta = tokio::fs::metadata(&valid).await?;
	if meta.is_dir() {
		return Err(anyhow!("cannot edit directory"));
	}
	let backup = fs::create_backup(&valid).await
		.map_err(|err| anyhow!("could not create backup: {}", err))?;
	let bytes = match tokio::fs::read(&valid).await {
		Ok(bytes) => bytes,
		Err(err) => {
			let _ = tokio::fs::remove_file(&backup).await;
			return Err(err.into());
		}
	};
	let text = String::from_utf8_lossy(&bytes).to_string();
	let result = match edit::apply_edit(&text, &old_text, &new_text) {
		Ok(result) => result,
		Err(err) => {
			let _ = tokio::fs::remove_file(&backup).await;
			return Err(err);
		}
	};
	if result.confidence == edit::Confidence::None {
		let _ = tokio::fs::remove_file(&backup).await;
		return Err(anyhow!("no matches found for text: {:?}", old_text));
	}
	if let Err(err) = tokio::fs::write(&valid, &result.modified_content).await {
		let _ = tokio::fs::copy(&backup, &valid).await;
		let _ = tokio::fs::remove_file(&backup).await;
		return Err(err.into());
	}
	let _ = tokio::fs::remove_file(&backup).await;
	let uri = content::resource_uri(&valid);
	Ok(vec![
		content::text_item(format!(
			"Successfully edited {}\nChanges: {} replacement(s)\nMatch confidence: {}\nLines affected: {}",
			path,
			result.replacement_count,
			result.confidence.as_str(),
			result.lines_affected
		)),
		content::text_resource_item(&uri, "text/plain", format!("Edited: {}", valid.display())),
	])
}

async fn copy_file_tool(state: &ServerState, args: &Value) -> Result<Vec<Value>> {
	let source = require_string(args, "source")?;
	let destination = require_string(args, "destination")?;
	let valid_source = state.sandbox
		.validate(&source)
		.map_err(|err| anyhow!("source path: {}", err))?;
	let valid_dest = state.sandbox
		.validate(&destination)
		.map_err(|err| anyhow!("destination path: {}", err))?;
	fs::copy_any(&valid_source, &valid_dest).await?;
	let uri = content::resource_uri(&valid_dest);
	Ok(vec![
		content::text_item(format!("Successfully copied {} to {}", source, destination)),
		content::text_resource_item(&uri, "text/plain", format!("Copied: {}", valid_dest.display())),
	])
}

async fn move_file_tool(state: &ServerState, args: &Value) -> Result<Vec<Value>> {
	let source = require_string(args, "source")?;
	let destination = require_string(args, "destination")?;
	let valid_source = state.sandbox
		.validate(&source)
		.map_err(|err| anyhow!("source path: {}", err))?;
	let valid_dest = state.sandbox
		.validate(&destination)
		.map_err(|err| anyhow!("destination path: {}", err))?;
	fs::move_path(&valid_source, &valid_dest).await?;
	let uri = content::resource_uri(&valid_dest);
	Ok(vec![
		content::text_item(format!("Successfully moved {} to {}", source, destination)),
		content::text_resource_item(&uri, "text/plain", format!("Moved: {}", valid_dest.display())),
	])
}

async fn delete_file_tool(state: &ServerState, args: &Value) -> Result<Vec<Value>> {
	let path = require_string(args, "path")?;
	let recursive = optional_bool(args, "recursive", false)?;
	let valid = state.sandbox.validate(&path)?;
	let meta = match tokio::fs::metadata(&valid).await {
		Ok(meta) => meta,
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
			return Err(anyhow!("path does not exist: {}", path));
		}
		Err(err) => return Err(err.into()),
	};
	if meta.is_dir() {
		if !recursive {
			return Err(anyhow!("{} is a directory. Use recursive=true to delete directories.", path));
		}
		tokio::fs::remove_dir_all(&valid).await?;
		return Ok(vec![content::text_item(format!("Successfully deleted directory {}", path))]);
	}
	tokio::fs::remove_file(&valid).await?;
	Ok(vec![content::text_item(format!("Successfully deleted file {}", path))])
}

async fn list_directory_tool(state: &ServerState, args: &Value) -> Result<Vec<Value>> {
	let path = require_string(args, "path")?;
	let valid = state.sandbox.validate(&path)?;
	let meta = tokio::fs::metadata(&valid).await?;
	if !meta.is_dir() {
		return Err(anyhow!("path is not a directory: {}", path));
	}
	let listing = content::directory_listing(&valid).await?;
	let uri = content::resource_uri(&valid);
	Ok(vec![
		content::text_item(listing),
		content::text_resource_item(&uri, "text/plain", format!("Directory: {}", valid.display())),
	])
}

async fn create_directory_tool(state: &ServerState, args: &Value) -> Result<Vec<Value>> {
	let path = require_string(args, "path")?;
	let valid = state.sandbox.validate(&path)?;
	let uri = content::resource_uri(&valid);
	match tokio::fs::metadata(&valid).await {
		Ok(meta) if meta.is_dir() => {
			return Ok(vec![
				content::text_item(format!("Directory already exists: {}", path)),
				content::text_resource_item(&uri, "text/plain", format!("Directory: {}", valid.display())),
			]);
		}
		Ok(_) => {
			return Err(anyhow!("path exists but is not a directory: {}", path));
		}
		Err(_) => {}
	}
	tokio::fs::create_dir_all(&valid).await?;
	Ok(vec![
		content::text_item(format!("Successfully created directory {}", path)),
		content::text_resource_item(&uri, "text/plain", format!("Directory: {}", valid.display())),
	])
}

async fn tree_tool(state: &ServerState, args: &Value) -> Result<Vec<Value>> {
	let path = require_string(args, "path")?;
	let depth = optional_u64(args, "depth")?
		.map(|value| value as usize)
		.unwrap_or(DEFAULT_TREE_DEPTH);
	let follow_symlinks = optional_bool(args, "follow_symlinks", false)?;
	let valid = state.sandbox.validate(&path)?;
	let meta = tokio::fs::metadata(&valid).await?;
	if !meta.is_dir() {
		return Err(anyhow!("path is not a directory: {}", path));
	}
	let node = walk::build_tree(
		&state.sandbox,
		&valid.to_string_lossy(),
		depth,
		0,
		follow_symlinks
	)?;
	let rendered = serde_json::to_string_pretty(&node)?;
	let uri = content::resource_uri(&valid);
	Ok(vec![
		content::text_item(format!(
			"Directory tree for {} (max depth: {}):\n\n{}",
			valid.display(),
			depth,
			rendered
		)),
		content::text_resource_item(&uri, "application/json", rendered),
	])
}

async fn search_files_tool(state: &ServerState, args: &Value) -> Result<Vec<Value>> {
	let path = require_string(args, "path")?;
	let pattern = require_string(args, "pattern")?;
	let valid = state.sandbox.validate(&path)?;
	let meta = tokio::fs::metadata(&valid).await?;
	if !meta.is_dir() {
		return Err(anyhow!("search path must be a directory"));
	}
	let results = walk::search_files(&state.sandbox, &valid, &pattern);
	if results.is_empty() {
		return Ok(vec![content::text_item(format!(
			"No files found matching pattern '{}' in {}",
			pattern, path
		))]);
	}
	let mut out = format!("Found {} results:\n\n", results.len());
	for result in &results {
		let result_path = std::path::Path::new(result);
		let uri = content::resource_uri(result_path);
		match std::fs::metadata(result_path) {
			Ok(meta) if meta.is_dir() => {
				out.push_str(&format!("[DIR]  {} ({})\n", result, uri));
			}
			Ok(meta) => {
				out.push_str(&format!("[FILE] {} ({}) - {} bytes\n", result, uri, meta.len()));
			}
			Err(_) => {
				out.push_str(&format!("{} ({})\n", result, uri));
			}
		}
	}
	Ok(vec![content::text_item(out)])
}

async fn smart_search_tool(state: &ServerState, args: &Value) -> Result<Vec<Value>> {
	let path = require_string(args, "path")?;
	let pattern = require_string(args, "pattern")?;
	let include_content = optional_bool(args, "include_content", false)?;
	let file_types = optional_string_array(args, "file_types")?;
	let valid = state.sandbox.validate(&path)?;
	let results = walk::smart_search(
		&state.sandbox,
		&valid,
		&pattern,
		include_content,
		&file_types
	)?;
	if results.name_matches.is_empty() && results.content_matches.is_empty() {
		return Ok(vec![content::text_item(format!(
			"No matches found for pattern '{}' in {}",
			pattern, path
		))]);
	}
	let mut out = String::new();
	if !results.name_matches.is_empty() {
		out.push_str(&format!("File name matches ({}):\n", results.name_matches.len()));
		for name_match in &results.name_matches {
			let uri = content::resource_uri(std::path::Path::new(name_match));
			out.push_str(&format!("  {} ({})\n", name_match, uri));
		}
		out.push('\n');
	}
	if !results.content_matches.is_empty() {
		out.push_str(&format!("Content matches ({}):\n", results.content_matches.len()));
		for content_match in &results.content_matches {
			out.push_str(&format!(
				"  {}:{} - {}\n",
				content_match.file,
				content_match.line_number,
				content_match.line.trim()
			));
		}
	}
	Ok(vec![content::text_item(out)])
}

async fn advanced_text_search_tool(state: &ServerState, args: &Value) -> Result<Vec<Value>> {
	let path = require_string(args, "path")?;
	let pattern = require_string(args, "pattern")?;
	let case_sensitive = optional_bool(args, "case_sensitive", false)?;
	let whole_word = optional_bool(args, "whole_word", false)?;
	let include_context = optional_bool(args, "include_context", false)?;
	let context_lines = optional_u64(args, "context_lines")?
		.map(|value| value as usize)
		.unwrap_or(DEFAULT_CONTEXT_LINES);
	let valid = state.sandbox.validate(&path)?;
	let matches = walk::advanced_text_search(
		&state.sandbox,
		&valid,
		&pattern,
		case_sensitive,
		whole_word,
		include_context,
		context_lines
	)?;
	if matches.is_empty() {
		return Ok(vec![content::text_item(format!(
			"No matches found for pattern '{}' in {}",
			pattern, path
		))]);
	}
	let mut out = format!("Found {} matches for pattern '{}':\n\n", matches.len(), pattern);
	for found in &matches {
		out.push_str(&format!("{}:{}\n", found.file, found.line_number));
		out.push_str(&format!("   {}\n", found.line));
		if !found.context.is_empty() {
			out.push_str("   Context:\n");
			for line in &found.context {
				out.push_str(&format!("   | {}\n", line));
			}
		}
		out.push('\n');
	}
	Ok(vec![content::text_item(out)])
}

async fn find_duplicates_tool(state: &ServerState, args: &Value) -> Result<Vec<Value>> {
	let path = require_string(args, "path")?;
	let valid = state.sandbox.validate(&path)?;
	let groups = walk::find_duplicates(&state.sandbox, &valid)?;
	if groups.is_empty() {
		return Ok(vec![content::text_item("No duplicate files found")]);
	}
	let mut out = format!("Found {} groups of duplicate files:\n\n", groups.len());
	let mut total_wasted = 0u64;
	for group in &groups {
		let short_hash: String = group.hash.chars().take(16).collect();
		out.push_str(&format!("Hash: {}...\n", short_hash));
		out.push_str(&format!("   Size: {} bytes each\n", group.size));
		out.push_str(&format!("   Wasted space: {} bytes\n", group.wasted_bytes));
		total_wasted += group.wasted_bytes;
		for file in &group.files {
			out.push_str(&format!("   {}\n", file));
		}
		out.push('\n');
	}
	out.push_str(&format!(
		"Total wasted space: {} bytes ({:.2} MB)\n",
		total_wasted,
		total_wasted as f64 / (1024.0 * 1024.0)
	));
	Ok(vec![content::text_item(out)])
}

async fn get_file_info_tool(state: &ServerState, args: &Value) -> Result<Vec<Value>> {
	let path = require_string(args, "path")?;
	let valid = state.sandbox.validate(&path)?;
	let meta = tokio::fs::metadata(&valid).await?;
	let modified = meta.modified().ok();
	let created = meta.created().ok().or(modified);
	let accessed = meta.accessed().ok().or(modified);
	let stamp = |time: Option<std::time::SystemTime>| {
		time.map(fs::format_timestamp).unwrap_or_else(|| "unknown".to_string())
	};
	let mime_type = if meta.is_dir() {
		"directory".to_string()
	}
	else {
		mime::detect_mime(&valid)
	};
	let permissions = permissions_octal(&meta);
	let uri = content::resource_uri(&valid);
	let kind = if meta.is_dir() {
		"Directory"
	}
	else {
		"File"
	};
	Ok(vec![
		content::text_item(format!(
			"File information for: {}\n\nSize: {} bytes\nCreated: {}\nModified: {}\nAccessed: {}\nIsDirectory: {}\nIsFile: {}\nPermissions: {}\nMIME Type: {}\nResource URI: {}",
			valid.display(),
			meta.len(),
			stamp(created),
			stamp(modified),
			stamp(accessed),
			meta.is_dir(),
			!meta.is_dir(),
			permissions,
			mime_type,
			uri
		)),
		content::text_resource_item(
			&uri,
			"text/plain",
			format!("{}: {} ({}, {} bytes)", kind, valid.display(), mime_type, meta.len())
		),
	])
}

#[cfg(unix)]
fn permissions_octal(meta: &std::fs::Metadata) -> String {
	use std::os::unix::fs::PermissionsExt;
	format!("{:o}", meta.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn permissions_octal(meta: &std::fs::Metadata) -> String {
	if meta.permissions().readonly() {
		"readonly".to_string()
	}
	else {
		"writable".to_string()
	}
}

async fn read_multiple_files_tool(state: &ServerState, args: &Value) -> Result<Vec<Value>> {
	let paths = args.get("paths")
		.ok_or_else(|| anyhow!("missing required parameter: paths"))?;
	let paths = paths.as_array()
		.ok_or_else(|| anyhow!("parameter paths must be an array, got {}", type_name(paths)))?;
	if paths.is_empty() {
		return Err(anyhow!("no files specified to read"));
	}
	if paths.len() > MAX_FILES_PER_READ {
		return Err(anyhow!(
			"too many files requested. Maximum is {} files per request.",
			MAX_FILES_PER_READ
		));
	}
	let mut items = Vec::new();
	for entry in paths {
		let Some(path) = entry.as_str() else {
			return Err(anyhow!("each path must be a string, got {}", type_name(entry)));
		};
		let valid = match state.sandbox.validate(path) {
			Ok(valid) => valid,
			Err(err) => {
				items.push(content::text_item(format!("Error with path '{}': {}", path, err)));
				continue;
			}
		};
		items.push(content::text_item(format!("--- File: {} ---", path)));
		match content::shape_file_read(&valid).await {
			Ok(mut shaped) => items.append(&mut shaped),
			Err(err) => {
				items.push(content::text_item(format!("Error reading file '{}': {}", path, err)));
			}
		}
	}
	Ok(items)
}

async fn list_allowed_directories_tool(state: &ServerState) -> Result<Vec<Value>> {
	let mut out = String::from("Allowed directories:\n\n");
	for root in state.sandbox.roots() {
		let display = root.display();
		out.push_str(&format!("{} (file://{})\n", display, display));
	}
	Ok(vec![content::text_item(out)])
}

async fn compare_files_tool(state: &ServerState, args: &Value) -> Result<Vec<Value>> {
	let file1 = require_string(args, "file1")?;
	let file2 = require_string(args, "file2")?;
	let format = match args.get("format") {
		None | Some(Value::Null) => "unified".to_string(),
		Some(_) => require_string(args, "format")?,
	};
	let valid1 = state.sandbox
		.validate(&file1)
		.map_err(|err| anyhow!("file1: {}", err))?;
	let valid2 = state.sandbox
		.validate(&file2)
		.map_err(|err| anyhow!("file2: {}", err))?;
	if tokio::fs::metadata(&valid1).await.is_err() {
		return Err(anyhow!("file1 does not exist: {}", file1));
	}
	if tokio::fs::metadata(&valid2).await.is_err() {
		return Err(anyhow!("file2 does not exist: {}", file2));
	}
	let diff = compare::compare_files(&valid1, &valid2, &format)?;
	if diff.similarity >= 100.0 {
		return Ok(vec![content::text_item("Files are identical")]);
	}
	let mut out = String::from("File Comparison Results:\n\n");
	out.push_str(&format!("File 1: {}\n", file1));
	out.push_str(&format!("File 2: {}\n", file2));
	out.push_str(&format!("Similarity: {:.1}%\n\n", diff.similarity));
	if !diff.added.is_empty() {
		out.push_str(&format!("Added lines ({}):\n", diff.added.len()));
		for line in &diff.added {
			out.push_str(&format!("  + {}\n", line));
		}
		out.push('\n');
	}
	if !diff.removed.is_empty() {
		out.push_str(&format!("Removed lines ({}):\n", diff.removed.len()));
		for line in &diff.removed {
			out.push_str(&format!("  - {}\n", line));
		}
		out.push('\n');
	}
	if !diff.modified.is_empty() {
		out.push_str(&format!("Modified lines ({}):\n", diff.modified.len()));
		for line in &diff.modified {
			out.push_str(&format!("  ~ {}\n", line));
		}
		out.push('\n');
	}
	out.push_str(&format!("Unchanged lines: {}\n", diff.unchanged));
	let mut items = vec![content::text_item(out)];
	if let Some(unified) = diff.diff {
		items.push(content::text_item(unified));
	}
	Ok(items)
}

async fn generate_checksum_tool(state: &ServerState, args: &Value) -> Result<Vec<Value>> {
	let path = require_string(args, "path")?;
	let mut algorithms = optional_string_array(args, "algorithms")?;
	if algorithms.is_empty() {
		algorithms = vec!["md5".to_string(), "sha256".to_string()];
	}
	let valid = state.sandbox.validate(&path)?;
	let checksums = compare::generate_checksums(&valid, &algorithms)?;
	let rendered = serde_json::to_string_pretty(&checksums)?;
	Ok(vec![content::text_item(format!("File checksums:\n\n{}", rendered))])
}

async fn watch_file_tool(state: &ServerState, args: &Value) -> Result<Vec<Value>> {
	let path = require_string(args, "path")?;
	let timeout = optional_u64(args, "timeout")?
		.filter(|value| *value > 0)
		.unwrap_or(DEFAULT_WATCH_TIMEOUT_SECS);
	let valid = state.sandbox.validate(&path)?;
	let events = fs::watch_file(&valid, timeout).await
		.map_err(|err| anyhow!("cannot stat file: {}", err))?;
	let rendered = serde_json::to_string_pretty(&events)?;
	Ok(vec![content::text_item(format!(
		"File watch results (monitored for {}s):\n\n{}",
		timeout, rendered
	))])
}

async fn batch_operations_tool(state: &ServerState, args: &Value) -> Result<Vec<Value>> {
	let operations = args.get("operations")
		.ok_or_else(|| anyhow!("missing required parameter: operations"))?;
	let operations = operations.as_array()
		.ok_or_else(|| anyhow!("parameter operations must be an array, got {}", type_name(operations)))?;
	if operations.is_empty() {
		return Err(anyhow!("no operations specified"));
	}
	if operations.len() > MAX_BATCH_OPERATIONS {
		return Err(anyhow!("too many operations (max: {})", MAX_BATCH_OPERATIONS));
	}
	let mut results = Vec::new();
	let mut errors = Vec::new();
	for (index, operation) in operations.iter().enumerate() {
		let number = index + 1;
		if !operation.is_object() {
			errors.push(format!("Operation {}: invalid format", number));
			continue;
		}
		match process_batch_operation(state, operation, number).await {
			Ok(line) => results.push(line),
			Err(err) => errors.push(format!("Operation {}: {}", number, err)),
		}
	}
	let mut out = format!(
		"Batch operations completed\nSuccessful: {}\nFailed: {}\n\nResults:\n{}",
		results.len(),
		errors.len(),
		results.join("\n")
	);
	if !errors.is_empty() {
		out.push_str(&format!("\n\nErrors:\n{}", errors.join("\n")));
	}
	Ok(vec![content::text_item(out)])
}

async fn process_batch_operation(state: &ServerState, operation: &Value, number: usize) -> Result<String> {
	let op_type = operation.get("type")
		.and_then(Value::as_str)
		.ok_or_else(|| anyhow!("missing or invalid 'type' field"))?;
	match op_type.to_lowercase().as_str() {
		"rename" | "move" => {
			let from = require_string(operation, "from")?;
			let to = require_string(operation, "to")?;
			let valid_from = state.sandbox
				.validate(&from)
				.map_err(|err| anyhow!("invalid source path: {}", err))?;
			let valid_to = state.sandbox
				.validate(&to)
				.map_err(|err| anyhow!("invalid destination path: {}", err))?;
			fs::move_path(&valid_from, &valid_to).await
				.map_err(|err| anyhow!("move failed for {}: {}", from, err))?;
			Ok(format!("  {}. Moved: {} -> {}", number, from, to))
		}
		"copy" => {
			let from = require_string(operation, "from")?;
			let to = require_string(operation, "to")?;
			let valid_from = state.sandbox
				.validate(&from)
				.map_err(|err| anyhow!("invalid source path: {}", err))?;
			let valid_to = state.sandbox
				.validate(&to)
				.map_err(|err| anyhow!("invalid destination path: {}", err))?;
			fs::copy_any(&valid_from, &valid_to).await
				.map_err(|err| anyhow!("copy failed for {}: {}", from, err))?;
			Ok(format!("  {}. Copied: {} -> {}", number, from, to))
		}
		"delete" => {
			let path = require_string(operation, "path")?;
			let recursive = optional_bool(operation, "recursive", false)?;
			let valid = state.sandbox
				.validate(&path)
				.map_err(|err| anyhow!("invalid path: {}", err))?;
			let meta = match tokio::fs::metadata(&valid).await {
				Ok(meta) => meta,
				Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
					return Ok(format!("  {}. Already deleted: {}", number, path));
				}
				Err(err) => return Err(anyhow!("stat failed: {}", err)),
			};
			if meta.is_dir() {
				if !recursive {
					return Err(anyhow!("directory deletion requires recursive=true"));
				}
				tokio::fs::remove_dir_all(&valid).await
					.map_err(|err| anyhow!("delete directory failed: {}", err))?;
				Ok(format!("  {}. Deleted directory: {}", number, path))
			}
			else {
				tokio::fs::remove_file(&valid).await
					.map_err(|err| anyhow!("delete file failed: {}", err))?;
				Ok(format!("  {}. Deleted file: {}", number, path))
			}
		}
		"create_dir" | "mkdir" => {
			let path = require_string(operation, "path")?;
			let valid = state.sandbox
				.validate(&path)
				.map_err(|err| anyhow!("invalid path: {}", err))?;
			tokio::fs::create_dir_all(&valid).await
				.map_err(|err| anyhow!("create directory failed: {}", err))?;
			Ok(format!("  {}. Created directory: {}", number, path))
		}
		"write" => {
			let path = require_string(operation, "path")?;
			let text = require_string(operation, "content")?;
			let valid = state.sandbox
				.validate(&path)
				.map_err(|err| anyhow!("invalid path: {}", err))?;
			fs::write_file(&valid, &text).await
				.map_err(|err| anyhow!("write failed: {}", err))?;
			Ok(format!("  {}. Written: {} ({} bytes)", number, path, text.len()))
		}
		other => Err(anyhow!("unsupported operation type: {}", other)),
	}
}

async fn chunked_write_tool(state: &ServerState, args: &Value) -> Result<Vec<Value>> {
	let path = require_string(args, "path")?;
	let text = require_string(args, "content")?;
	if text.is_empty() {
		return Err(anyhow!("content is required"));
	}
	let chunk_index = require_u64(args, "chunk_index")?;
	let total_chunks = require_u64(args, "total_chunks")?;
	if total_chunks == 0 {
		return Err(anyhow!("total_chunks must be greater than 0"));
	}
	let valid = state.sandbox.validate(&path)?;
	let (completed, size) = fs::chunked_write(&valid, &text, chunk_index, total_chunks).await?;
	let status = if completed {
		"Completed"
	}
	else {
		"In progress"
	};
	Ok(vec![content::text_item(format!(
		"{} chunked write: {}\nChunk: {}/{}\nTotal size: {} bytes",
		status,
		path,
		chunk_index + 1,
		total_chunks,
		size
	))])
}

async fn split_file_tool(state: &ServerState, args: &Value) -> Result<Vec<Value>> {
	let path = require_string(args, "path")?;
	let chunk_size = optional_u64(args, "chunk_size")?
		.filter(|value| *value > 0)
		.unwrap_or(fs::MAX_CHUNK_SIZE);
	let valid = state.sandbox.validate(&path)?;
	let meta = tokio::fs::metadata(&valid).await?;
	if meta.is_dir() {
		return Err(anyhow!("cannot split directory"));
	}
	let parts = fs::split_file(&valid, chunk_size).await?;
	let mut out = format!(
		"Split completed: {}\nSource: {} bytes\nChunks: {} files\nChunk size: {} bytes\n",
		path,
		meta.len(),
		parts.len(),
		chunk_size
	);
	for part in &parts {
		out.push_str(&format!("  {}\n", part.display()));
	}
	Ok(vec![content::text_item(out)])
}

async fn join_files_tool(state: &ServerState, args: &Value) -> Result<Vec<Value>> {
	let target_path = require_string(args, "target_path")?;
	let sources = args.get("source_files")
		.ok_or_else(|| anyhow!("missing required parameter: source_files"))?;
	let sources = sources.as_array()
		.ok_or_else(|| anyhow!("parameter source_files must be an array, got {}", type_name(sources)))?;
	if sources.is_empty() {
		return Err(anyhow!("source_files is empty"));
	}
	let valid_target = state.sandbox
		.validate(&target_path)
		.map_err(|err| anyhow!("target: {}", err))?;
	let mut valid_sources = Vec::with_capacity(sources.len());
	for entry in sources {
		let Some(source) = entry.as_str() else {
			return Err(anyhow!("each source file must be a string, got {}", type_name(entry)));
		};
		let valid = state.sandbox
			.validate(source)
			.map_err(|err| anyhow!("source file {}: {}", source, err))?;
		valid_sources.push(valid);
	}
	let total = fs::join_files(&valid_target, &valid_sources).await?;
	Ok(vec![content::text_item(format!(
		"Join completed: {}\nSources: {} files\nTotal size: {} bytes",
		target_path,
		valid_sources.len(),
		total
	))])
}

async fn write_file_safe_tool(state: &ServerState, args: &Value) -> Result<Vec<Value>> {
	let path = require_string(args, "path")?;
	let text = require_string(args, "content")?;
	if text.is_empty() {
		return Err(anyhow!("content is required"));
	}
	let create_backup = optional_bool(args, "create_backup", false)?;
	let valid = state.sandbox.validate(&path)?;
	let (size, backup) = fs::write_file_safe(&valid, &text, create_backup).await?;
	let mut out = format!("Safe write completed: {}\nSize: {} bytes", path, size);
	if let Some(backup) = backup {
		out.push_str(&format!("\nBackup: {}", backup.display()));
	}
	Ok(vec![content::text_item(out)])
}

// ---- telemetry helpers --------------------------------------------------

fn extract_tool_name(method: &str, params: &Value) -> Option<String> {
	if method != "tools/call" {
		return None;
	}
	params.get("name")
		.and_then(Value::as_str)
		.map(|name| name.to_string())
}

fn record_result(span: &Span, result: &Value) {
	let is_error = result.get("isError")
		.and_then(Value::as_bool)
		.unwrap_or(false);
	span.record("mcp.is_error", is_error);
	if is_error {
		let message = result.get("content")
			.and_then(Value::as_array)
			.and_then(|items| items.first())
			.and_then(|item| item.get("text"))
			.and_then(Value::as_str)
			.unwrap_or("");
		span.record("mcp.error_code", error_code(message));
	}
}

fn error_code(message: &str) -> &'static str {
	let lower = message.to_lowercase();
	if lower.contains("access denied") {
		"ACCESS_DENIED"
	}
	else if lower.contains("missing required parameter") {
		"MISSING_ARGUMENT"
	}
	else if lower.contains("must be a") || lower.contains("must be an") {
		"INVALID_ARGUMENT"
	}
	else if lower.contains("no matches found") {
		"EDIT_NO_MATCH"
	}
	else if lower.contains("parent directory does not exist") {
		"PARENT_MISSING"
	}
	else if lower.contains("does not exist") || lower.contains("no such file") || lower.contains("not found") {
		"FILE_NOT_FOUND"
	}
	else if lower.contains("permission denied") {
		"PERMISSION_DENIED"
	}
	else if lower.contains("too many") {
		"LIMIT_EXCEEDED"
	}
	else {
		"EXECUTION_ERROR"
	}
}

async fn write_response(writer: &mut io::BufWriter<io::Stdout>, resp: Response) -> Result<()> {
	let payload = serde_json::to_string(&resp)?;
	writer.write_all(payload.as_bytes()).await?;
	writer.write_all(b"\n").await?;
	writer.flush().await?;
	Ok(())
}

// ---- tool catalog -------------------------------------------------------

fn path_property(description: &str) -> Value {
	json!({ "type": "string", "description": description })
}

fn tool_definitions() -> Vec<Value> {
	vec![
	json!({
		"name": "read_file",
		"description": "Read the complete contents of a file from the file system.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"path": path_property("Path to the file to read")
			},
			"required": ["path"]
		}
	}),
	json!({
		"name": "write_file",
		"description": "Create a new file or overwrite an existing file with new content.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"path": path_property("Path where to write the file"),
				"content": { "type": "string", "description": "Content to write to the file" }
			},
			"required": ["path", "content"]
		}
	}),
	json!({
		"name": "edit_file",
		"description": "Modify file content by replacing specific text without rewriting the entire file.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"path": path_property("Path to the file to edit"),
				"old_text": { "type": "string", "description": "Text to be replaced" },
				"new_text": { "type": "string", "description": "New text to replace with" }
			},
			"required": ["path", "old_text", "new_text"]
		}
	}),
	json!({
		"name": "copy_file",
		"description": "Copy files and directories.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"source": path_property("Source path of the file or directory"),
				"destination": path_property("Destination path")
			},
			"required": ["source", "destination"]
		}
	}),
	json!({
		"name": "move_file",
		"description": "Move or rename files and directories.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"source": path_property("Source path of the file or directory"),
				"destination": path_property("Destination path")
			},
			"required": ["source", "destination"]
		}
	}),
	json!({
		"name": "delete_file",
		"description": "Delete a file or directory from the file system.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"path": path_property("Path to the file or directory to delete"),
				"recursive": { "type": "boolean", "description": "Whether to recursively delete directories (default: false)" }
			},
			"required": ["path"]
		}
	}),
	json!({
		"name": "list_directory",
		"description": "Get a detailed listing of all files and directories in a specified path.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"path": path_property("Path of the directory to list")
			},
			"required": ["path"]
		}
	}),
	json!({
		"name": "create_directory",
		"description": "Create a new directory or ensure a directory exists.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"path": path_property("Path of the directory to create")
			},
			"required": ["path"]
		}
	}),
	json!({
		"name": "tree",
		"description": "Returns a hierarchical JSON representation of a directory structure.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"path": path_property("Path of the directory to traverse"),
				"depth": { "type": "number", "description": "Maximum depth to traverse (default: 3)" },
				"follow_symlinks": { "type": "boolean", "description": "Whether to follow symbolic links (default: false)" }
			},
			"required": ["path"]
		}
	}),
	json!({
		"name": "search_files",
		"description": "Recursively search for files and directories matching a pattern.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"path": path_property("Starting path for the search"),
				"pattern": { "type": "string", "description": "Search pattern to match against file names" }
			},
			"required": ["path", "pattern"]
		}
	}),
	json!({
		"name": "smart_search",
		"description": "Search with regex support, content matching, and file type filtering.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"path": path_property("Starting path for the search"),
				"pattern": { "type": "string", "description": "Search pattern (supports regex)" },
				"include_content": { "type": "boolean", "description": "Search within file contents (default: false)" },
				"file_types": { "type": "array", "items": { "type": "string" }, "description": "Filter by file extensions (e.g. ['.js', '.py'])" }
			},
			"required": ["path", "pattern"]
		}
	}),
	json!({
		"name": "advanced_text_search",
		"description": "Text search with regex, context capture, and precise matching options.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"path": path_property("Directory to search in"),
				"pattern": { "type": "string", "description": "Search pattern (regex supported)" },
				"case_sensitive": { "type": "boolean", "description": "Case sensitive search (default: false)" },
				"whole_word": { "type": "boolean", "description": "Match whole words only (default: false)" },
				"include_context": { "type": "boolean", "description": "Include surrounding lines for context (default: false)" },
				"context_lines": { "type": "number", "description": "Number of context lines to include (default: 3)" }
			},
			"required": ["path", "pattern"]
		}
	}),
	json!({
		"name": "find_duplicates",
		"description": "Find duplicate files by content hash.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"path": path_property("Directory to scan for duplicates")
			},
			"required": ["path"]
		}
	}),
	json!({
		"name": "get_file_info",
		"description": "Retrieve detailed metadata about a file or directory.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"path": path_property("Path to the file or directory")
			},
			"required": ["path"]
		}
	}),
	json!({
		"name": "read_multiple_files",
		"description": "Read the contents of multiple files in a single operation.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"paths": { "type": "array", "items": { "type": "string" }, "description": "List of file paths to read (max 50)" }
			},
			"required": ["paths"]
		}
	}),
	json!({
		"name": "list_allowed_directories",
		"description": "Returns the list of directories that this server is allowed to access.",
		"inputSchema": {
			"type": "object",
			"properties": {}
		}
	}),
	json!({
		"name": "compare_files",
		"description": "Compare two files with similarity analysis and an optional unified diff.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"file1": path_property("First file to compare"),
				"file2": path_property("Second file to compare"),
				"format": { "type": "string", "description": "Output format: 'unified' adds a unified diff (default: unified)" }
			},
			"required": ["file1", "file2"]
		}
	}),
	json!({
		"name": "generate_checksum",
		"description": "Generate checksums for file integrity verification.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"path": path_property("Path to the file"),
				"algorithms": { "type": "array", "items": { "type": "string" }, "description": "Hash algorithms: ['md5', 'sha1', 'sha256', 'sha512'] (default: md5, sha256)" }
			},
			"required": ["path"]
		}
	}),
	json!({
		"name": "watch_file",
		"description": "Monitor a file for changes within a bounded time window and return the events.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"path": path_property("File to monitor"),
				"timeout": { "type": "number", "description": "Maximum time to watch in seconds (default: 30)" }
			},
			"required": ["path"]
		}
	}),
	json!({
		"name": "batch_operations",
		"description": "Execute multiple file operations sequentially in a single call.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"operations": {
					"type": "array",
					"items": { "type": "object" },
					"description": "Operations to execute: [{type: 'rename|move|copy|delete|create_dir|mkdir|write', ...}] (max 50)"
				}
			},
			"required": ["operations"]
		}
	}),
	json!({
		"name": "chunked_write",
		"description": "Write a file in chunks; chunk 0 creates the file, later chunks append.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"path": path_property("Path to write"),
				"content": { "type": "string", "description": "Chunk content" },
				"chunk_index": { "type": "number", "description": "Zero-based chunk index" },
				"total_chunks": { "type": "number", "description": "Total number of chunks" }
			},
			"required": ["path", "content", "chunk_index", "total_chunks"]
		}
	}),
	json!({
		"name": "split_file",
		"description": "Split a file into sequential .partNNN chunk files.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"path": path_property("File to split"),
				"chunk_size": { "type": "number", "description": "Chunk size in bytes (default: 1 MiB)" }
			},
			"required": ["path"]
		}
	}),
	json!({
		"name": "join_files",
		"description": "Concatenate multiple files into a target file in the given order.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"target_path": path_property("Target file to create"),
				"source_files": { "type": "array", "items": { "type": "string" }, "description": "Source files in concatenation order" }
			},
			"required": ["target_path", "source_files"]
		}
	}),
	json!({
		"name": "write_file_safe",
		"description": "Atomic write via temp file and rename, with optional backup of the previous content.",
		"inputSchema": {
			"type": "object",
			"properties": {
				"path": path_property("Path to write"),
				"content": { "type": "string", "description": "Content to write" },
				"create_backup": { "type": "boolean", "description": "Keep a .backup of the pre-existing file (default: false)" }
			},
			"required": ["path", "content"]
		}
	})
	]
}
