use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use httpframe::config::{Config, CONFIG_ENV, LISTEN_ENV};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn test_config_defaults() {
    let cfg = Config::load_from(lookup(&[])).unwrap();

    assert_eq!(cfg.listen_addr, "127.0.0.1:42069");
    assert_eq!(cfg.assets_dir, PathBuf::from("assets"));
    assert_eq!(cfg.upstream_url, "http://httpbin.org");
    assert_eq!(cfg.chunk_size, 1024);
    assert_eq!(cfg.upstream_timeout(), Duration::from_secs(10));
}

#[test]
fn test_config_listen_override() {
    let cfg = Config::load_from(lookup(&[(LISTEN_ENV, "0.0.0.0:3000")])).unwrap();

    assert_eq!(cfg.listen_addr, "0.0.0.0:3000");
}

#[test]
fn test_config_from_yaml_partial() {
    let cfg = Config::from_yaml("assets_dir: /srv/media\nchunk_size: 32\n").unwrap();

    assert_eq!(cfg.assets_dir, PathBuf::from("/srv/media"));
    assert_eq!(cfg.chunk_size, 32);
    assert_eq!(cfg.listen_addr, "127.0.0.1:42069");
}

#[test]
fn test_config_from_yaml_rejects_bad_values() {
    assert!(Config::from_yaml("chunk_size: 0\n").is_err());
    assert!(Config::from_yaml("upstream_url: nowhere\n").is_err());
    assert!(Config::from_yaml("chunk_size: [1, 2]\n").is_err());
}

#[test]
fn test_config_file_then_env_override() {
    let path = std::env::temp_dir().join(format!("httpframe-config-{}.yaml", std::process::id()));
    std::fs::write(
        &path,
        "listen_addr: 127.0.0.1:8000\nupstream_url: http://localhost:9000\nupstream_timeout_secs: 2\n",
    )
    .unwrap();
    let path_str = path.to_string_lossy().to_string();

    let cfg = Config::load_from(lookup(&[(CONFIG_ENV, path_str.as_str())])).unwrap();
    assert_eq!(cfg.listen_addr, "127.0.0.1:8000");
    assert_eq!(cfg.upstream_url, "http://localhost:9000");
    assert_eq!(cfg.upstream_timeout(), Duration::from_secs(2));

    let cfg = Config::load_from(lookup(&[(CONFIG_ENV, path_str.as_str()), (LISTEN_ENV, "0.0.0.0:5000")]))
        .unwrap();
    assert_eq!(cfg.listen_addr, "0.0.0.0:5000");

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_config_missing_file_is_an_error() {
    let result = Config::load_from(lookup(&[(CONFIG_ENV, "/definitely/not/here.yaml")]));

    assert!(result.is_err());
}
