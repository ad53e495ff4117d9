use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use deja_config::Config;

const SAMPLE_CONFIG_TOML: &str = r#"
[service]
log_level = "info"

[index]
backend = "local"
snapshot_path = "ticket_index.json"

[storage.qdrant]
url = "http://localhost:6334"
collection = "tickets"

[providers.embedding]
provider_id = "openai"
api_base = "https://api.openai.com"
api_key = "key"
path = "/v1/embeddings"
model = "text-embedding-3-small"
dimensions = 1536
timeout_ms = 10000

[providers.completion]
provider_id = "openai"
api_base = "https://api.openai.com"
api_key = "key"
path = "/v1/chat/completions"
model = "gpt-4o-mini"
temperature = 0.3
max_tokens = 1000
timeout_ms = 30000
"#;

fn sample_value() -> Value {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.")
}

fn render(value: &Value) -> String {
	toml::to_string(value).expect("Failed to render sample config.")
}

fn table_mut<'a>(value: &'a mut Value, keys: &[&str]) -> &'a mut toml::Table {
	let mut current = value;

	for key in keys {
		current = current
			.as_table_mut()
			.and_then(|table| table.get_mut(*key))
			.unwrap_or_else(|| panic!("Sample config must include [{key}]."));
	}

	current.as_table_mut().expect("Sample config section must be a table.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("deja_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.")
}

#[test]
fn sample_config_loads() {
	let path = write_temp_config(SAMPLE_CONFIG_TOML.to_string());
	let result = deja_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Expected sample config to load.");

	assert_eq!(cfg.providers.embedding.dimensions, 1536);
	assert_eq!(cfg.recommend.top_k, 5);
	assert_eq!(cfg.recommend.min_basis_count, 3);
	assert!((cfg.recommend.high_avg_threshold - 0.85).abs() < f32::EPSILON);
	assert!((cfg.recommend.medium_avg_threshold - 0.65).abs() < f32::EPSILON);
	assert_eq!(cfg.indexing.upsert_batch_size, 100);
}

#[test]
fn dimensions_must_be_positive() {
	let mut value = sample_value();

	table_mut(&mut value, &["providers", "embedding"])
		.insert("dimensions".to_string(), Value::Integer(0));

	let path = write_temp_config(render(&value));
	let result = deja_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected dimensions validation error.");

	assert!(
		err.to_string().contains("providers.embedding.dimensions must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn local_backend_requires_snapshot_path() {
	let mut value = sample_value();

	table_mut(&mut value, &["index"]).remove("snapshot_path");

	let path = write_temp_config(render(&value));
	let result = deja_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected snapshot_path validation error.");

	assert!(
		err.to_string().contains("index.snapshot_path must be set for the local backend."),
		"Unexpected error: {err}"
	);
}

#[test]
fn qdrant_backend_requires_storage_section() {
	let mut value = sample_value();

	table_mut(&mut value, &["index"])
		.insert("backend".to_string(), Value::String("qdrant".to_string()));
	value.as_table_mut().expect("Sample config must be a table.").remove("storage");

	let path = write_temp_config(render(&value));
	let result = deja_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected qdrant storage validation error.");

	assert!(
		err.to_string().contains("storage.qdrant must be set for the qdrant backend."),
		"Unexpected error: {err}"
	);
}

#[test]
fn provider_api_keys_must_be_non_empty() {
	let mut value = sample_value();

	table_mut(&mut value, &["providers", "completion"])
		.insert("api_key".to_string(), Value::String(" ".to_string()));

	let path = write_temp_config(render(&value));
	let result = deja_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected api_key validation error.");

	assert!(
		err.to_string().contains("Provider completion api_key must be non-empty."),
		"Unexpected error: {err}"
	);
}

#[test]
fn confidence_thresholds_must_be_ordered() {
	let mut cfg = base_config();

	cfg.recommend.high_avg_threshold = 0.5;
	cfg.recommend.medium_avg_threshold = 0.7;

	let err = deja_config::validate(&cfg).expect_err("Expected threshold ordering error.");

	assert!(
		err.to_string().contains(
			"recommend.high_avg_threshold must not be below recommend.medium_avg_threshold."
		),
		"Unexpected error: {err}"
	);
}

#[test]
fn confidence_thresholds_must_be_in_range() {
	let mut cfg = base_config();

	cfg.recommend.medium_avg_threshold = -0.1;

	let err = deja_config::validate(&cfg).expect_err("Expected threshold range error.");

	assert!(
		err.to_string().contains("recommend.medium_avg_threshold must be in the range 0.0-1.0."),
		"Unexpected error: {err}"
	);
}
