use std::fs;
use std::path::Path;

use engine::{parse_args, Config, Error};

fn args(list: &[&str]) -> impl Iterator<Item = String> {
    std::iter::once("engine".to_string())
        .chain(list.iter().map(|s| s.to_string()))
        .collect::<Vec<_>>()
        .into_iter()
}

fn write_config(name: &str, contents: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("engine-{name}-{}.toml", std::process::id()));
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn file_values_override_defaults() {
    let path = write_config(
        "override",
        r#"
client_width = 800
client_height = 600
title = "Test"
vsync_enabled = false
"#,
    );

    let config = Config::from_file(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(config.client_width(), 800);
    assert_eq!(config.client_height(), 600);
    assert_eq!(config.title(), "Test");
    assert!(!config.vsync_enabled());
    assert_eq!(config.max_srv_count(), 512);
    assert_eq!(config.asset_dir(), Path::new("assets"));
}

#[test]
fn flags_override_the_file() {
    let path = write_config("flags", "client_width = 800\ntarget_fps = 30\n");
    let path_arg = path.to_string_lossy().into_owned();

    let config = parse_args(args(&["--config", &path_arg, "--width", "1024", "--no-vsync"])).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(config.client_width(), 1024);
    assert_eq!(config.client_height(), 720);
    assert_eq!(config.target_fps(), 30);
    assert!(!config.vsync_enabled());
}

#[test]
fn missing_file_is_an_io_error() {
    let path = std::env::temp_dir().join("engine-does-not-exist.toml");
    assert!(matches!(Config::from_file(&path), Err(Error::Io(_))));
}

#[test]
fn malformed_file_is_a_config_error() {
    let path = write_config("malformed", "client_width = \"wide\"\n");
    let result = Config::from_file(&path);
    fs::remove_file(&path).unwrap();

    assert!(matches!(result, Err(Error::Config(_))));
}
