use std::fs::File;
use std::io::Write;
use tempfile::tempdir;

use listening_insights::config::Config;

#[test]
fn config_from_path_parses_toml() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("cfg.toml");
    let mut f = File::create(&cfg_path).unwrap();
    let toml = r#"
client_id = "cid"
client_secret = "csecret"
listen_addr = "0.0.0.0:9000"
time_range = "short_term"
log_dir = "/tmp"
"#;
    f.write_all(toml.as_bytes()).unwrap();
    let cfg = Config::from_path(&cfg_path).expect("parse config");
    assert_eq!(cfg.listen_addr, "0.0.0.0:9000");
    assert_eq!(cfg.time_range, "short_term");
    assert_eq!(cfg.log_dir.as_deref().and_then(|p| p.to_str()), Some("/tmp"));
    // untouched fields fall back to defaults
    assert_eq!(cfg.top_tracks_limit, 50);
    assert_eq!(cfg.token_cache_ttl_secs, 3500);
    assert!(cfg.token_cache_enabled);
}

#[test]
fn empty_file_yields_defaults() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("empty.toml");
    File::create(&cfg_path).unwrap();
    let cfg = Config::from_path(&cfg_path).expect("parse config");
    assert_eq!(cfg.time_range, "medium_term");
    assert!(cfg.log_dir.is_none());
}

#[test]
fn invalid_time_range_rejected() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("bad.toml");
    std::fs::write(&cfg_path, "time_range = \"forever\"\n").unwrap();
    let err = Config::from_path(&cfg_path).unwrap_err();
    assert!(err.to_string().contains("time_range"));
}

#[test]
fn env_overrides_file_values() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("cfg.toml");
    std::fs::write(&cfg_path, "api_base = \"https://example.invalid/v1\"\n").unwrap();
    std::env::set_var("SPOTIFY_API_BASE", "http://127.0.0.1:1234/v1");
    let cfg = Config::from_path(&cfg_path).expect("parse config");
    std::env::remove_var("SPOTIFY_API_BASE");
    assert_eq!(cfg.api_base, "http://127.0.0.1:1234/v1");
}

#[test]
fn out_of_range_top_tracks_limit_rejected() {
    let td = tempdir().unwrap();
    for bad in ["0", "51", "500"] {
        let cfg_path = td.path().join(format!("limit_{}.toml", bad));
        std::fs::write(&cfg_path, format!("top_tracks_limit = {}\n", bad)).unwrap();
        let err = Config::from_path(&cfg_path).unwrap_err();
        assert!(err.to_string().contains("top_tracks_limit"), "{}", err);
    }
    let ok_path = td.path().join("limit_ok.toml");
    std::fs::write(&ok_path, "top_tracks_limit = 20\n").unwrap();
    assert_eq!(Config::from_path(&ok_path).unwrap().top_tracks_limit, 20);
}
