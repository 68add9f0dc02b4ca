//! Integration tests for configuration loading
//!
//! Environment variables are process-wide, so every test here runs serially.

use adsequencer::{AdsConfig, AdsError};
use adsequencer_integration_tests::TestFixture;
use anyhow::Result;
use serial_test::serial;

const VARS: [&str; 5] = [
    "ADSEQ_TIMEOUT",
    "ADSEQ_PREROLL_TIMEOUT",
    "ADSEQ_POSTROLL_TIMEOUT",
    "ADSEQ_DEBUG",
    "ADSEQ_STITCHED_ADS",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_env_overrides_defaults() {
    clear_env();
    std::env::set_var("ADSEQ_TIMEOUT", "250");
    std::env::set_var("ADSEQ_STITCHED_ADS", "yes");
    std::env::set_var("ADSEQ_DEBUG", "1");

    let config = AdsConfig::load(None);
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.timeout, 250);
    assert_eq!(config.preroll_timeout, 100);
    assert!(config.stitched_ads);
    assert!(config.debug);
}

#[test]
#[serial]
fn test_env_overrides_file() -> Result<()> {
    clear_env();
    let fixture = TestFixture::new()?;
    let path = fixture.write(
        "config.toml",
        "timeout = 1000\npostrollTimeout = 300\n",
    )?;
    std::env::set_var("ADSEQ_TIMEOUT", "2000");

    let config = AdsConfig::load(Some(&path));
    clear_env();

    let config = config?;
    assert_eq!(config.timeout, 2000);
    assert_eq!(config.postroll_timeout, 300);
    assert_eq!(config.preroll_timeout, 100);
    Ok(())
}

#[test]
#[serial]
fn test_invalid_env_value_is_rejected() {
    clear_env();
    std::env::set_var("ADSEQ_PREROLL_TIMEOUT", "soon");

    let result = AdsConfig::load(None);
    clear_env();

    match result {
        Err(AdsError::Config(message)) => assert!(message.contains("ADSEQ_PREROLL_TIMEOUT")),
        other => panic!("expected a config error, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_zero_timeout_from_env_fails_validation() {
    clear_env();
    std::env::set_var("ADSEQ_POSTROLL_TIMEOUT", "0");

    let result = AdsConfig::load(None);
    clear_env();

    assert!(matches!(result, Err(AdsError::Config(_))));
}

#[test]
#[serial]
fn test_saved_config_loads_back() -> Result<()> {
    clear_env();
    let fixture = TestFixture::new()?;
    let path = fixture.path().join("nested").join("config.toml");

    let config = AdsConfig {
        timeout: 4000,
        hide_surface_during_guard: true,
        ..AdsConfig::default()
    };
    config.save(&path)?;

    assert_eq!(AdsConfig::load(Some(&path))?, config);
    Ok(())
}
