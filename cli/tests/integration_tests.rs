use std::fs;
use std::path::PathBuf;
use std::process::Output;

/// Helper to create a temp directory that is cleaned up on drop.
struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("flag_resolve_cli_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("failed to create temp dir");
        Self { path }
    }

    fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    fn write(&self, name: &str, contents: &str) -> String {
        let path = self.join(name);
        fs::write(&path, contents).expect("failed to write fixture");
        path.to_str().unwrap().to_string()
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Minimal application schema for resolution tests.
fn write_schema(dir: &TempDir) -> String {
    let json = serde_json::json!({
        "name": "deploy",
        "flags": [
            {"name": "region", "tag": {"default": "eu-west-1", "env": "DEPLOY_REGION"}},
            {"name": "dry-run"}
        ],
        "commands": [
            {
                "name": "push",
                "aliases": ["p"],
                "flags": [
                    {"name": "max-retries", "tag": {"default": "3"}},
                    {"name": "image", "tag": {"required": true}}
                ]
            }
        ]
    });
    dir.write("app.json", &serde_json::to_string_pretty(&json).unwrap())
}

fn flag_resolve(args: &[&str], envs: &[(&str, &str)]) -> Output {
    let mut cmd = std::process::Command::new(env!("CARGO_BIN_EXE_flag-resolve"));
    cmd.args(args).env_remove("DEPLOY_REGION").env_remove("RUST_LOG");
    for (key, value) in envs {
        cmd.env(key, value);
    }
    cmd.output().expect("failed to run flag-resolve")
}

fn values(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "flag-resolve failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let mut map = serde_json::Map::new();
    for entry in report["values"].as_array().unwrap() {
        map.insert(
            entry["flag"].as_str().unwrap().to_string(),
            serde_json::json!({"value": entry["value"], "origin": entry["origin"]}),
        );
    }
    serde_json::Value::Object(map)
}

// ---------------------------------------------------------------------------
// resolve
// ---------------------------------------------------------------------------

#[test]
fn resolve_layers_env_documents_and_defaults() {
    let dir = TempDir::new("layers");
    let schema = write_schema(&dir);
    let source = dir.write("values.yaml", "max_retries: 7\nimage: app:1.2\n");

    let output = flag_resolve(
        &["resolve", "--schema", &schema, "--source", &source, "--command", "p"],
        &[("DEPLOY_REGION", "us-east-2")],
    );
    let values = values(&output);

    assert_eq!(values["region"]["value"], "us-east-2");
    assert_eq!(values["region"]["origin"]["resolver"], "env");
    assert_eq!(values["max-retries"]["value"], 7);
    assert_eq!(values["image"]["value"], "app:1.2");
    assert!(values.get("dry-run").is_none());
}

#[test]
fn resolve_command_line_wins() {
    let dir = TempDir::new("literal");
    let schema = write_schema(&dir);
    let source = dir.write("values.json", r#"{"image": "from-file"}"#);

    let output = flag_resolve(
        &[
            "resolve", "--schema", &schema, "--source", &source, "--command", "push", "--set",
            "image=from-cli", "--set", "region=ap-south-1",
        ],
        &[("DEPLOY_REGION", "us-east-2")],
    );
    let values = values(&output);

    assert_eq!(values["image"]["value"], "from-cli");
    assert_eq!(values["image"]["origin"], "command_line");
    assert_eq!(values["region"]["value"], "ap-south-1");
}

#[test]
fn resolve_empty_env_falls_back_to_default() {
    let dir = TempDir::new("empty_env");
    let schema = write_schema(&dir);

    let output = flag_resolve(&["resolve", "--schema", &schema], &[("DEPLOY_REGION", "")]);
    let values = values(&output);

    assert_eq!(values["region"]["value"], "eu-west-1");
    assert_eq!(values["region"]["origin"]["resolver"], "defaults");
}

#[test]
fn resolve_missing_required_fails() {
    let dir = TempDir::new("required");
    let schema = write_schema(&dir);

    let output = flag_resolve(&["resolve", "--schema", &schema, "--command", "push"], &[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing required flag --image"), "stderr: {stderr}");
}

#[test]
fn resolve_with_chain_config() {
    let dir = TempDir::new("config");
    let schema = write_schema(&dir);
    dir.write("team.json", r#"{"region": "sa-east-1", "image": "team:latest"}"#);
    let config = dir.write(
        "chain.yaml",
        "version: \"1.0\"\nsources:\n  - kind: json\n    path: team.json\n  - kind: env\n  - kind: defaults\n",
    );

    let output = flag_resolve(
        &["resolve", "--schema", &schema, "--config", &config, "--command", "push"],
        &[("DEPLOY_REGION", "us-east-2")],
    );
    let values = values(&output);

    // The document is listed before env in this chain.
    assert_eq!(values["region"]["value"], "sa-east-1");
    assert_eq!(values["image"]["value"], "team:latest");
}

#[test]
fn resolve_yaml_output() {
    let dir = TempDir::new("yaml_out");
    let schema = write_schema(&dir);

    let output = flag_resolve(&["resolve", "--schema", &schema, "--format", "yaml"], &[]);
    assert!(output.status.success());
    let report: serde_yaml::Value = serde_yaml::from_slice(&output.stdout).unwrap();
    assert_eq!(report["command"].as_str(), Some("deploy"));
}

#[test]
fn resolve_unknown_command_fails() {
    let dir = TempDir::new("unknown_cmd");
    let schema = write_schema(&dir);

    let output = flag_resolve(&["resolve", "--schema", &schema, "--command", "pull"], &[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown command: deploy pull"));
}

#[test]
fn resolve_rejects_redeclared_flag() {
    let dir = TempDir::new("redeclared");
    let schema = dir.write(
        "app.json",
        r#"{
            "name": "tool",
            "flags": [{"name": "port", "tag": {"default": "80"}}],
            "commands": [{"name": "run", "flags": [{"name": "port", "tag": {"default": "90"}}]}]
        }"#,
    );

    let output = flag_resolve(&["resolve", "--schema", &schema, "--command", "run"], &[]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("duplicate flag in scope: port"), "stderr: {stderr}");
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn validate_accepts_clean_setup() {
    let dir = TempDir::new("validate_ok");
    let schema = write_schema(&dir);
    let source = dir.write("values.json", r#"{"max_retries": 2}"#);

    let output = flag_resolve(&["validate", "--schema", &schema, "--source", &source, "--strict"], &[]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "ok");
}

#[test]
fn validate_strict_rejects_unknown_key() {
    let dir = TempDir::new("validate_strict");
    let schema = write_schema(&dir);
    let source = dir.write("values.json", r#"{"max_retrys": 2}"#);

    let lenient = flag_resolve(&["validate", "--schema", &schema, "--source", &source], &[]);
    assert!(lenient.status.success());

    let strict = flag_resolve(&["validate", "--schema", &schema, "--source", &source, "--strict"], &[]);
    assert!(!strict.status.success());
    assert!(String::from_utf8_lossy(&strict.stderr).contains("max_retrys"));
}

#[test]
fn validate_config_refuses_source_options() {
    let dir = TempDir::new("validate_config_strict");
    let schema = write_schema(&dir);
    let source = dir.write("vals.json", r#"{"prot": 1}"#);
    let config = dir.write(
        "chain.yaml",
        "version: \"1.0\"\nsources:\n  - kind: json\n    path: vals.json\n",
    );

    let strict = flag_resolve(&["validate", "--schema", &schema, "--config", &config, "--strict"], &[]);
    assert!(!strict.status.success());
    assert!(strict.stdout.is_empty());
    assert!(String::from_utf8_lossy(&strict.stderr).contains("cannot be used with"));

    let extra = flag_resolve(
        &["validate", "--schema", &schema, "--config", &config, "--source", &source],
        &[],
    );
    assert!(!extra.status.success());

    // Strictness for configured sources lives in the chain file.
    let config = dir.write(
        "strict.yaml",
        "version: \"1.0\"\nsources:\n  - kind: json\n    path: vals.json\n    strict: true\n",
    );
    let output = flag_resolve(&["validate", "--schema", &schema, "--config", &config], &[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("prot"));
}

#[test]
fn validate_rejects_bad_schema() {
    let dir = TempDir::new("validate_schema");
    let schema = dir.write(
        "app.json",
        r#"{"name": "tool", "flags": [{"name": "Port"}]}"#,
    );

    let output = flag_resolve(&["validate", "--schema", &schema], &[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid flag name: Port"));
}

#[test]
fn malformed_source_is_reported() {
    let dir = TempDir::new("malformed");
    let schema = write_schema(&dir);
    let source = dir.write("values.json", "not json");

    let output = flag_resolve(&["resolve", "--schema", &schema, "--source", &source], &[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to load"));
}
