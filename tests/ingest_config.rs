// tests/ingest_config.rs
use opportunity_scraper::config::tuning::ENV_TUNING_PATH;
use opportunity_scraper::config::{load_tuning_default, load_tuning_from, ScraperTuning};
use std::{env, fs};

#[test]
fn parse_toml_and_json_paths() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("scraper.toml");
    fs::write(
        &p_toml,
        r#"
max_posts = 5
delay_min_ms = 8000
delay_max_ms = 1000
logs_tab = "RunLogs"
"#,
    )
    .unwrap();
    let t = load_tuning_from(&p_toml).unwrap();
    assert_eq!(t.max_posts, 5);
    assert_eq!((t.delay_min_ms, t.delay_max_ms), (1000, 8000));
    assert_eq!(t.logs_tab, "RunLogs");
    assert_eq!(t.items_tab, "Items");

    let p_json = dir.path().join("scraper.json");
    fs::write(&p_json, r#"{"timeout_ms": 1500, "utc_offset_hours": 0}"#).unwrap();
    let j = load_tuning_from(&p_json).unwrap();
    assert_eq!(j.timeout_ms, 1500);
    assert_eq!(j.utc_offset().local_minus_utc(), 0);
    assert_eq!(j.max_posts, 10);

    let p_bad = dir.path().join("scraper.yaml");
    fs::write(&p_bad, "max_posts: 1").unwrap();
    assert!(load_tuning_from(&p_bad).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Isolate CWD so the repo's own config/ is not picked up
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    env::remove_var(ENV_TUNING_PATH);

    // 1) Nothing on disk -> defaults
    assert_eq!(load_tuning_default().unwrap(), ScraperTuning::default());

    // 2) Fallback TOML in ./config/
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("scraper.toml"), "max_posts = 3").unwrap();
    assert_eq!(load_tuning_default().unwrap().max_posts, 3);

    // 3) Env wins
    let p_env = tmp.path().join("override.json");
    fs::write(&p_env, r#"{"max_posts": 7}"#).unwrap();
    env::set_var(ENV_TUNING_PATH, p_env.display().to_string());
    assert_eq!(load_tuning_default().unwrap().max_posts, 7);

    // 4) Env pointing nowhere is an error, not a silent default
    env::set_var(ENV_TUNING_PATH, tmp.path().join("missing.toml").display().to_string());
    assert!(load_tuning_default().is_err());
    env::remove_var(ENV_TUNING_PATH);

    env::set_current_dir(&old).unwrap();
}
