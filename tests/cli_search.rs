use predicates::prelude::*;

const CONFIG_VARS: &[&str] = &[
    "TMDB_API_KEY",
    "TMDB_BASE_URL",
    "TMDB_LANGUAGE",
    "JSONBIN_API_KEY",
    "JSONBIN_BASE_URL",
    "JSONBIN_MOVIES_ID",
    "JSONBIN_SERIES_ID",
    "BINFLIX_LOG",
];

fn binflix() -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("binflix");
    for name in CONFIG_VARS {
        cmd.env_remove(name);
    }
    cmd
}

#[test]
fn short_search_prints_empty_list_without_credentials() {
    binflix()
        .args(["search", "--query", "ab"])
        .assert()
        .success()
        .stdout("[]\n");
}

#[test]
fn list_without_configuration_fails() {
    binflix()
        .args(["list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not configured"));
}

#[test]
fn details_rejects_unknown_kind() {
    binflix()
        .args(["details", "--id", "550", "--kind", "documentary"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("documentary"));
}

#[test]
fn episode_url_requires_both_season_and_episode() {
    binflix()
        .args(["url", "--id", "1399", "--season", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--episode"));
}

#[test]
fn rust_log_debug_emits_debug_line_to_stderr() {
    binflix()
        .env("RUST_LOG", "debug")
        .args(["search", "--query", "ab"])
        .assert()
        .success()
        .stderr(predicate::str::contains("parsed cli"));
}
