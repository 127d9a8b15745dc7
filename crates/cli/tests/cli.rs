use assert_cmd::Command;

#[test]
fn config_prints_effective_settings() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("base.toml"), "[server]\nport = 9191\n").unwrap();

    let assert = Command::cargo_bin("folio")
        .unwrap()
        .args(["config", "--env", "local", "--config-dir"])
        .arg(dir.path())
        .env_remove("FOLIO__SERVER__PORT")
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(stdout.contains("port: 9191"), "{stdout}");
    assert!(stdout.contains("request_timeout_ms"), "{stdout}");
}

#[test]
fn unknown_environment_fails() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("folio")
        .unwrap()
        .args(["config", "--env", "staging-eu", "--config-dir"])
        .arg(dir.path())
        .assert()
        .failure();
}
