use std::fs;

use assert_matches::assert_matches;
use camino_tempfile::tempdir;
use indoc::indoc;
use pretty_assertions::assert_eq;
use serial_test::serial;
use test_log::test;

use super::*;

struct EnvVarGuard {
    name: String,
    original_value: Option<String>,
}

impl EnvVarGuard {
    fn set(name: &str, value: &str) -> Self {
        let name = name.to_string();
        let original_value = std::env::var(&name).ok();
        unsafe { std::env::set_var(&name, value) };
        Self {
            name,
            original_value,
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        if let Some(ref original) = self.original_value {
            unsafe { std::env::set_var(&self.name, original) };
        } else {
            unsafe { std::env::remove_var(&self.name) };
        }
    }
}

fn envs(vars: &[(&str, &str)]) -> Vec<(String, String)> {
    vars.iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

const FILE: &str = indoc! {r#"
    [api]
    base_url = "http://file.example:8100"
    timeout_secs = 10

    [chat]
    user_id = "from-file"
    idle_timeout_secs = 20
"#};

#[test]
fn test_file_env_and_override_precedence() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, FILE).unwrap();

    let envs = envs(&[
        ("WL_CHAT_USER_ID", "from-env"),
        ("WL_CHAT_IDLE_TIMEOUT_SECS", "25"),
        ("HOME", "/home/alice"),
    ]);
    let overrides = vec![("chat.idle_timeout_secs".to_owned(), "40".to_owned())];

    let config = load(Some(path.as_std_path()), envs, &overrides).unwrap();

    // File only.
    assert_eq!(config.api.base_url, "http://file.example:8100");
    assert_eq!(config.api.timeout_secs, 10);
    // File, overridden by env.
    assert_eq!(config.chat.user_id, "from-env");
    // File and env, overridden by the assignment.
    assert_eq!(config.chat.idle_timeout_secs, 40);
    // Default.
    assert_eq!(config.chat.session_type, "general");
}

#[test]
fn test_missing_explicit_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nope.toml");

    assert_matches!(
        load(Some(path.as_std_path()), vec![], &[]),
        Err(Error::MissingFile(missing)) if missing == path.as_std_path()
    );
}

#[test]
fn test_unknown_file_key_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "[chat]\nmodel = \"gpt\"\n").unwrap();

    assert_matches!(load_file(path.as_std_path()), Err(Error::Toml { .. }));
}

#[test]
fn test_invalid_file_value_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "[stream]\nmax_line_length = 0\n").unwrap();

    assert_matches!(
        load(Some(path.as_std_path()), vec![], &[]),
        Err(Error::InvalidConfigValue { .. })
    );
}

#[test]
fn test_find_file_prefers_working_directory() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "").unwrap();

    assert_eq!(find_file(dir.path().as_std_path()), Some(path.into_std_path_buf()));
}

#[test]
fn test_env_names() {
    assert_eq!(env_name("api.base_url"), "WL_API_BASE_URL");
    assert_eq!(env_name("chat.idle_timeout_secs"), "WL_CHAT_IDLE_TIMEOUT_SECS");
}

#[test]
fn test_load_envs_ignores_unrelated_variables() {
    let mut config = Config::default();
    load_envs(&mut config, envs(&[("WL_LOG", "trace"), ("PATH", "/bin")])).unwrap();

    assert_eq!(config, Config::default());
}

#[test]
fn test_load_envs_rejects_invalid_values() {
    let mut config = Config::default();

    assert_matches!(
        load_envs(&mut config, envs(&[("WL_CHAT_USE_RAG", "maybe")])),
        Err(Error::InvalidConfigValue { key, .. }) if key == "chat.use_rag"
    );
}

#[test]
#[serial(env_vars)]
fn test_load_from_process_environment() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, FILE).unwrap();

    let _guard = EnvVarGuard::set("WL_API_BASE_URL", "http://env.example");
    let config = load(Some(path.as_std_path()), std::env::vars(), &[]).unwrap();

    assert_eq!(config.api.base_url, "http://env.example");
}

#[test]
fn test_parse_assignment() {
    assert_eq!(
        parse_assignment("chat.greeting=Hi = there").unwrap(),
        ("chat.greeting".to_owned(), "Hi = there".to_owned())
    );
    assert_eq!(
        parse_assignment("chat.greeting=").unwrap(),
        ("chat.greeting".to_owned(), String::new())
    );
    assert_matches!(parse_assignment("chat.greeting"), Err(Error::InvalidAssignment(_)));
    assert_matches!(parse_assignment("=value"), Err(Error::InvalidAssignment(_)));
}
