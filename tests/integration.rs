use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const GUIDE: &str = "\
Travel Safety Handbook
Edition 3

[Lost Passport]
Contact your embassy immediately.
File a police report for the loss.

[Fire Safety]
Use the stairs, never elevators.
Stay low under smoke.

[Theft]
Report to the nearest police station.

[Road Safety]
";

fn tripsafe_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("tripsafe");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    setup_with_knowledge(Some(GUIDE))
}

fn setup_with_knowledge(guide: Option<&str>) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let kb_dir = root.join("knowledge");
    fs::create_dir_all(&kb_dir).unwrap();

    if let Some(text) = guide {
        fs::write(kb_dir.join("knowledge.txt"), text).unwrap();
    }

    let config_content = format!(
        r#"[knowledge]
path = "{}/knowledge/knowledge.txt"

[server]
bind = "127.0.0.1:7332"
"#,
        root.display()
    );

    let config_path = config_dir.join("tripsafe.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_tripsafe(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = tripsafe_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run tripsafe binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_sections_lists_keys_in_order() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_tripsafe(&config_path, &["sections"]);
    assert!(success, "sections failed: stdout={}, stderr={}", stdout, stderr);

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec!["lost passport", "fire safety", "theft", "3 sections indexed"]
    );
}

#[test]
fn test_ask_returns_matching_section() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_tripsafe(&config_path, &["ask", "Fire in hotel"]);
    assert!(success, "ask failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.starts_with("[Fire Safety]\nUse the stairs, never elevators.\nStay low under smoke."));
    assert!(stdout.contains("Ask for more specific details"));
    assert!(!stdout.contains("Travel Safety Handbook"));
}

#[test]
fn test_ask_emergency_framing() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_tripsafe(&config_path, &["ask", "I lost my passport"]);
    assert!(success);
    assert!(stdout.starts_with("🚨 Emergency detected!"));
    assert!(stdout.contains("[Lost Passport]"));
    assert!(stdout.contains("Call 112 for immediate emergency help"));
}

#[test]
fn test_ask_body_match_with_explain() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) =
        run_tripsafe(&config_path, &["ask", "never elevators", "--explain"]);
    assert!(success);
    assert!(stdout.starts_with("[Fire Safety]"));
    assert!(stdout.contains("tier: body_match"));
}

#[test]
fn test_ask_no_guidance_greets() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_tripsafe(
        &config_path,
        &["ask", "xyzzy unrelated gibberish", "--language", "Japanese"],
    );
    assert!(success);
    assert!(stdout.starts_with("こんにちは！"));
}

#[test]
fn test_ask_strict_skips_weak_fuzzy() {
    let (_tmp, config_path) = setup_test_env();

    // "thefty" contains the key word "theft".
    let (stdout, _, success) = run_tripsafe(&config_path, &["ask", "thefty", "--explain"]);
    assert!(success);
    assert!(stdout.starts_with("[Theft]"));
    assert!(stdout.contains("tier: fuzzy"));

    // "safer" only shares its first four characters with "safety".
    let (stdout, _, success) = run_tripsafe(&config_path, &["ask", "safer", "--explain"]);
    assert!(success);
    assert!(stdout.starts_with("[Fire Safety]"));
    assert!(stdout.contains("tier: weak_fuzzy"));

    let (stdout, _, success) =
        run_tripsafe(&config_path, &["ask", "safer", "--explain", "--strict"]);
    assert!(success);
    assert!(stdout.contains("tier: not_found"));
    assert!(stdout.starts_with("Hello! I'm your Safety Assistant."));
}

#[test]
fn test_ask_is_deterministic() {
    let (_tmp, config_path) = setup_test_env();

    let (first, _, ok1) = run_tripsafe(&config_path, &["ask", "police", "--explain"]);
    let (second, _, ok2) = run_tripsafe(&config_path, &["ask", "police", "--explain"]);
    assert!(ok1 && ok2);
    assert_eq!(first, second);
}

#[test]
fn test_missing_knowledge_file_fails() {
    let (_tmp, config_path) = setup_with_knowledge(None);

    let (_, stderr, success) = run_tripsafe(&config_path, &["sections"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read knowledge file"));
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_tripsafe(&tmp.path().join("nope.toml"), &["sections"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_headerless_knowledge_is_unavailable() {
    let (_tmp, config_path) = setup_with_knowledge(Some("no headers here\njust prose\n"));

    let (stdout, _, success) = run_tripsafe(&config_path, &["sections"]);
    assert!(success);
    assert!(stdout.contains("0 sections indexed"));

    let (stdout, _, success) = run_tripsafe(&config_path, &["ask", "prose"]);
    assert!(success);
    assert!(stdout.starts_with("PDF knowledge base not available. Please seek professional help."));
}
