use std::{fs, path::Path, process::Command};

fn norm_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "")
}

fn golfstats() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_golfstats"));
    cmd.env_remove("GOLF_INPUT_DIR")
        .env_remove("GOLF_OUTPUT_DIR")
        .env("RUST_LOG", "info");
    cmd
}

fn seed(input: &Path) {
    fs::create_dir_all(input.join("users")).unwrap();
    fs::create_dir_all(input.join("courses")).unwrap();
    fs::create_dir_all(input.join("rounds").join("u1")).unwrap();
    fs::write(
        input.join("users").join("u1.json"),
        r#"{"id":"u1","name":"Ada","handicap":12.5,"joined":"2023-01-15","passwordHash":"x"}"#,
    )
    .unwrap();
    fs::write(
        input.join("courses").join("c1.json"),
        r#"{"id":"c1","name":"Old Links","holes":[{"holeNumber":1,"par":4,"distance":370}]}"#,
    )
    .unwrap();
    fs::write(
        input.join("rounds").join("u1").join("r1.json"),
        r#"{"id":"r1","userId":"u1","courseId":"c1","date":"2024-05-01","totalScore":82,
            "holeResults":[{"holeNumber":1,"score":4,"fairwayHit":true}]}"#,
    )
    .unwrap();
}

#[test]
fn build_success_writes_api_tree() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("records");
    let output = dir.path().join("api");
    seed(&input);

    let out = golfstats()
        .args([
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "build",
        ])
        .output()
        .unwrap();

    assert!(out.status.success());
    let stdout = norm_newlines(&String::from_utf8_lossy(&out.stdout));
    assert!(stdout.contains("done: 1 users, 1 rounds, 1 statistics"));

    let user: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output.join("users/u1.json")).unwrap()).unwrap();
    assert_eq!(user["statistics"]["fairwayHitRate"], 1.0);
    assert!(user.get("passwordHash").is_none());
    assert!(output.join("statistics/u1.json").exists());
}

#[test]
fn no_arguments_uses_project_layout() {
    let dir = tempfile::tempdir().unwrap();
    seed(&dir.path().join("data"));

    let out = golfstats().current_dir(dir.path()).output().unwrap();

    assert!(out.status.success());
    let index: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("public/api/index.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(index["resources"].as_array().unwrap().len(), 4);
}

#[test]
fn env_overrides_default_paths() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("records");
    let output = dir.path().join("site").join("api");
    seed(&input);

    let out = golfstats()
        .env("GOLF_INPUT_DIR", &input)
        .env("GOLF_OUTPUT_DIR", &output)
        .output()
        .unwrap();

    assert!(out.status.success());
    assert!(output.join("rounds/index.json").exists());
}

#[test]
fn malformed_record_exits_nonzero_with_stage_and_path() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("records");
    let output = dir.path().join("api");
    seed(&input);
    fs::write(input.join("rounds").join("u1").join("broken.json"), "{ nope").unwrap();

    let out = golfstats()
        .args(["-i", input.to_str().unwrap(), "-o", output.to_str().unwrap()])
        .output()
        .unwrap();

    assert!(!out.status.success());
    assert_eq!(out.status.code(), Some(1));

    let stderr = norm_newlines(&String::from_utf8_lossy(&out.stderr));
    assert!(stderr.contains("Error: pipeline failed: "));
    assert!(stderr.contains("Caused by:"));
    assert!(stderr.contains("load failed"));
    assert!(stderr.contains("E1001: invalid record json"));
    assert!(stderr.contains("broken.json"));
    assert!(!output.exists());
}

#[test]
fn unwritable_output_is_reported_stably() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("records");
    seed(&input);

    // 親がファイルなので出力ディレクトリを作れない。
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "").unwrap();
    let output = blocker.join("api");

    let out = golfstats()
        .args(["-i", input.to_str().unwrap(), "-o", output.to_str().unwrap()])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    let stderr = norm_newlines(&String::from_utf8_lossy(&out.stderr));
    assert!(stderr.contains("prepare-output failed"));
    assert!(stderr.contains("E2101: failed to create directory"));
}

#[test]
fn check_validates_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("records");
    let output = dir.path().join("api");
    seed(&input);

    let out = golfstats()
        .args([
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "check",
        ])
        .output()
        .unwrap();

    assert!(out.status.success());
    let stdout = norm_newlines(&String::from_utf8_lossy(&out.stdout));
    assert!(stdout.contains("ok: 1 users, 1 courses, 1 rounds, 1 with statistics"));
    assert!(!output.exists());
}

#[test]
fn help_mentions_subcommands() {
    let output = golfstats().arg("--help").output().unwrap();

    assert!(output.status.success());
    let stdout = norm_newlines(&String::from_utf8_lossy(&output.stdout));

    // 文言は clap 依存なので、サブコマンド名だけ確認する。
    assert!(stdout.contains("build"));
    assert!(stdout.contains("check"));
}

#[test]
fn warnings_go_to_stderr_and_progress_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("records");
    let output = dir.path().join("api");
    seed(&input);
    fs::write(
        input.join("rounds").join("u1").join("r2.json"),
        r#"{"id":"r2","userId":"u1","courseId":"closed","date":"2024-05-02","totalScore":90}"#,
    )
    .unwrap();

    let out = golfstats()
        .args(["-i", input.to_str().unwrap(), "-o", output.to_str().unwrap()])
        .output()
        .unwrap();

    assert!(out.status.success());
    let stdout = norm_newlines(&String::from_utf8_lossy(&out.stdout));
    let stderr = norm_newlines(&String::from_utf8_lossy(&out.stderr));
    assert!(stderr.contains("references unknown course closed"));
    assert!(!stdout.contains("unknown course"));
    assert!(stdout.contains("done: 1 users, 2 rounds, 1 statistics"));
    assert!(!stderr.contains("done:"));
    assert!(output.join("rounds").join("r2.json").exists());
}

#[test]
fn overlapping_roots_are_refused() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("site");
    let input = output.join("records");
    seed(&input);

    let out = golfstats()
        .args(["-i", input.to_str().unwrap(), "-o", output.to_str().unwrap()])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    let stderr = norm_newlines(&String::from_utf8_lossy(&out.stderr));
    assert!(stderr.contains("prepare-output failed"));
    assert!(stderr.contains("E3007"));
    assert!(input.join("users").join("u1.json").exists());
}
