// crates/translatable-config/tests/fallback_validation.rs
// ============================================================================
// Module: Fallback Config Validation Tests
// Description: Validate fallback directive settings and override resolution.
// Purpose: Ensure fallback configuration fails closed and resolves per type.
// ============================================================================

//! Fallback directive validation and resolution tests for
//! translatable-config.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use translatable_config::TranslatableConfig;
use translatable_core::FallbackDirective;
use translatable_core::Locale;

type TestResult = Result<(), String>;

fn parse_config(contents: &str) -> Result<TranslatableConfig, String> {
    toml::from_str(contents).map_err(|err| err.to_string())
}

fn assert_validate_fails(config: &TranslatableConfig, needle: &str) -> TestResult {
    match config.validate() {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(()) => Err(format!("expected validation failure containing {needle}")),
    }
}

#[test]
fn validate_rejects_empty_store_path() -> TestResult {
    let config = parse_config(
        r#"
[store]
path = ""

[fallback]
default_locale = "en"
"#,
    )?;
    assert_validate_fails(&config, "store.path must be non-empty")
}

#[test]
fn validate_rejects_zero_busy_timeout() -> TestResult {
    let config = parse_config(
        r#"
[store]
path = "translations.db"
busy_timeout_ms = 0

[fallback]
default_locale = "en"
"#,
    )?;
    assert_validate_fails(&config, "store.busy_timeout_ms must be greater than zero")
}

#[test]
fn validate_rejects_empty_default_locale() -> TestResult {
    let config = parse_config(
        r#"
[store]
path = "translations.db"

[fallback]
default_locale = "  "
"#,
    )?;
    assert_validate_fails(&config, "fallback.default_locale must be non-empty")
}

#[test]
fn validate_rejects_locale_behavior_without_locale() -> TestResult {
    let config = parse_config(
        r#"
[store]
path = "translations.db"

[fallback]
behavior = "locale"
default_locale = "en"
"#,
    )?;
    assert_validate_fails(&config, "fallback.locale must be non-empty when behavior is locale")
}

#[test]
fn validate_rejects_override_locale_behavior_without_locale() -> TestResult {
    let config = parse_config(
        r#"
[store]
path = "translations.db"

[fallback]
default_locale = "en"

[overrides.Post]
behavior = "locale"
"#,
    )?;
    assert_validate_fails(&config, "overrides.locale must be non-empty when behavior is locale")
}

#[test]
fn validate_rejects_empty_override_key() -> TestResult {
    let config = parse_config(
        r#"
[store]
path = "translations.db"

[fallback]
default_locale = "en"

[overrides." "]
behavior = "none"
"#,
    )?;
    assert_validate_fails(&config, "overrides keys must be non-empty entity-type tags")
}

#[test]
fn directive_resolution_honors_overrides() -> TestResult {
    let config = parse_config(
        r#"
[store]
path = "translations.db"

[fallback]
behavior = "default"
default_locale = "fr"
fallback_locale = "en"

[overrides.Post]
behavior = "none"

[overrides.Page]
behavior = "locale"
locale = "ar"
"#,
    )?;
    config.validate().map_err(|err| err.to_string())?;
    if config.directive_for(None) != FallbackDirective::DefaultLocale {
        return Err("global directive should fall back to the default locale".to_string());
    }
    if config.directive_for(Some("Post")) != FallbackDirective::Disabled {
        return Err("Post override should disable fallback".to_string());
    }
    let arabic = Locale::parse("ar").ok_or("parse ar")?;
    if config.directive_for(Some("Page")) != FallbackDirective::Locale(arabic) {
        return Err("Page override should name ar".to_string());
    }
    if config.directive_for(Some("Unknown")) != FallbackDirective::DefaultLocale {
        return Err("unknown types should use the global directive".to_string());
    }
    Ok(())
}

#[test]
fn locale_context_defaults_fallback_to_default_locale() -> TestResult {
    let config = parse_config(
        r#"
[store]
path = "translations.db"

[fallback]
behavior = "none"
default_locale = "en"
"#,
    )?;
    let ctx = config.locale_context().map_err(|err| err.to_string())?;
    if ctx.current_locale.as_str() != "en" || ctx.default_fallback_locale.as_str() != "en" {
        return Err("context should default both locales to en".to_string());
    }
    if ctx.default_directive != FallbackDirective::Disabled {
        return Err("context directive should mirror the configured behavior".to_string());
    }
    Ok(())
}

#[test]
fn locale_context_carries_the_named_fallback_locale() -> TestResult {
    let config = parse_config(
        r#"
[store]
path = "translations.db"

[fallback]
behavior = "default"
default_locale = "fr"
fallback_locale = "en"
"#,
    )?;
    let ctx = config.locale_context().map_err(|err| err.to_string())?;
    if ctx.current_locale.as_str() != "fr" || ctx.default_fallback_locale.as_str() != "en" {
        return Err("context locales should follow the fallback section".to_string());
    }
    Ok(())
}
