//! Config discovery and loading.
//!
//! Resolution order: project-local `liaison.{toml,yaml,yml,json}`, then the
//! user config directory, then pure defaults. After parsing, `${VAR}`
//! placeholders are substituted and the documented environment overrides are
//! applied on top, so a file is never required.

use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::schema::LiaisonConfig;

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["liaison.toml", "liaison.yaml", "liaison.yml", "liaison.json"];

/// Load config from an explicit path (any supported format), with `${ENV}`
/// substitution but without the environment overlay.
pub fn load_config(path: &Path) -> Result<LiaisonConfig, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover a config file, load it, and apply environment overrides.
///
/// Falls back to `LiaisonConfig::default()` (plus overrides) when no file
/// exists or the file fails to parse.
pub fn discover_and_load() -> LiaisonConfig {
    let mut config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            match load_config(&path) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                    LiaisonConfig::default()
                },
            }
        },
        None => {
            debug!("no config file found, using defaults");
            LiaisonConfig::default()
        },
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    config
}

fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    if let Some(dirs) = directories::ProjectDirs::from("", "", "liaison") {
        let config_dir = dirs.config_dir();
        for name in CONFIG_FILENAMES {
            let p = config_dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

fn parse_config(raw: &str, path: &Path) -> Result<LiaisonConfig, String> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| e.to_string()),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| e.to_string()),
        "json" => serde_json::from_str(raw).map_err(|e| e.to_string()),
        _ => Err(format!("unsupported config format: .{ext}")),
    }
}

// ── ${ENV} substitution ─────────────────────────────────────────────────────

/// Replace `${ENV_VAR}` placeholders in the raw config text. Unresolvable
/// placeholders are left as-is.
fn substitute_env(input: &str) -> String {
    substitute_with(input, |name| std::env::var(name).ok())
}

fn substitute_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                match lookup(name) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    },
                }
                rest = &after[end + 1..];
            },
            _ => {
                // No closing brace (or empty name) — emit literally.
                out.push_str("${");
                rest = after;
            },
        }
    }
    out.push_str(rest);
    out
}

// ── Environment overrides ───────────────────────────────────────────────────

/// Apply the documented `LIAISON_*` environment variables on top of the
/// loaded config. The lookup is injectable so tests can run without touching
/// the process environment.
pub fn apply_env_overrides(
    config: &mut LiaisonConfig,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let set_string = |target: &mut String, name: &str, lookup: &dyn Fn(&str) -> Option<String>| {
        if let Some(value) = lookup(name) {
            *target = value;
        }
    };
    let set_secret =
        |target: &mut Option<Secret<String>>, name: &str, lookup: &dyn Fn(&str) -> Option<String>| {
            if let Some(value) = lookup(name) {
                *target = Some(Secret::new(value));
            }
        };

    set_string(&mut config.server.bind, "LIAISON_BIND", &lookup);
    if let Some(port) = lookup("LIAISON_PORT").or_else(|| lookup("PORT")) {
        match port.parse() {
            Ok(port) => config.server.port = port,
            Err(_) => warn!(port = %port, "ignoring unparseable port override"),
        }
    }

    set_string(&mut config.broker.base_url, "LIAISON_BROKER_URL", &lookup);
    set_string(&mut config.broker.org, "LIAISON_BROKER_ORG", &lookup);
    set_string(&mut config.broker.env, "LIAISON_BROKER_ENV", &lookup);
    set_string(&mut config.broker.bot_key, "LIAISON_BROKER_BOT_KEY", &lookup);
    set_secret(&mut config.broker.api_key, "LIAISON_BROKER_API_KEY", &lookup);
    set_string(&mut config.broker.channel, "LIAISON_BROKER_CHANNEL", &lookup);
    set_string(&mut config.broker.locale, "LIAISON_BROKER_LOCALE", &lookup);

    set_string(
        &mut config.identity.token_url,
        "LIAISON_IDENTITY_TOKEN_URL",
        &lookup,
    );
    set_string(
        &mut config.identity.client_id,
        "LIAISON_IDENTITY_CLIENT_ID",
        &lookup,
    );
    set_secret(
        &mut config.identity.client_secret,
        "LIAISON_IDENTITY_CLIENT_SECRET",
        &lookup,
    );

    set_string(
        &mut config.storage.database_url,
        "LIAISON_DATABASE_URL",
        &lookup,
    );

    set_string(
        &mut config.platform.api_base,
        "LIAISON_PLATFORM_API_BASE",
        &lookup,
    );
    set_string(
        &mut config.platform.content_base,
        "LIAISON_PLATFORM_CONTENT_BASE",
        &lookup,
    );
    set_secret(
        &mut config.platform.channel_secret,
        "LIAISON_PLATFORM_CHANNEL_SECRET",
        &lookup,
    );
    set_secret(
        &mut config.platform.channel_token,
        "LIAISON_PLATFORM_CHANNEL_TOKEN",
        &lookup,
    );

    set_secret(
        &mut config.transcription.api_key,
        "LIAISON_STT_API_KEY",
        &lookup,
    );
    if let Some(base) = lookup("LIAISON_STT_API_BASE") {
        config.transcription.api_base = Some(base);
    }
    if let Some(model) = lookup("LIAISON_STT_MODEL") {
        config.transcription.model = Some(model);
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use {secrecy::ExposeSecret, std::io::Write};

    use super::*;

    #[test]
    fn test_substitute_known_var() {
        let lookup = |name: &str| (name == "BROKER_KEY").then(|| "k-123".to_string());
        assert_eq!(
            substitute_with("api_key = \"${BROKER_KEY}\"", lookup),
            "api_key = \"k-123\""
        );
    }

    #[test]
    fn test_substitute_leaves_unknown_var() {
        let out = substitute_with("${NOPE_XYZ}", |_| None);
        assert_eq!(out, "${NOPE_XYZ}");
    }

    #[test]
    fn test_substitute_unclosed_placeholder() {
        let out = substitute_with("prefix ${BROKEN", |_| Some("x".into()));
        assert_eq!(out, "prefix ${BROKEN");
    }

    #[test]
    fn test_substitute_no_placeholders() {
        assert_eq!(substitute_with("plain text", |_| None), "plain text");
    }

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            [server]
            port = 8080

            [broker]
            base_url = "https://broker.example.com"
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.broker.base_url, "https://broker.example.com");
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"server": {{"port": 9999}}}}"#).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.port, 9999);
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let mut file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        write!(file, "whatever").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let lookup = |name: &str| match name {
            "LIAISON_PORT" => Some("6001".to_string()),
            "LIAISON_BROKER_URL" => Some("https://override.example.com".to_string()),
            "LIAISON_BROKER_API_KEY" => Some("env-key".to_string()),
            _ => None,
        };

        let mut config = LiaisonConfig::default();
        apply_env_overrides(&mut config, lookup);

        assert_eq!(config.server.port, 6001);
        assert_eq!(config.broker.base_url, "https://override.example.com");
        assert_eq!(
            config.broker.api_key.unwrap().expose_secret(),
            "env-key"
        );
    }

    #[test]
    fn test_plain_port_fallback() {
        let lookup = |name: &str| (name == "PORT").then(|| "7777".to_string());
        let mut config = LiaisonConfig::default();
        apply_env_overrides(&mut config, lookup);
        assert_eq!(config.server.port, 7777);
    }

    #[test]
    fn test_bad_port_override_is_ignored() {
        let lookup = |name: &str| (name == "LIAISON_PORT").then(|| "not-a-port".to_string());
        let mut config = LiaisonConfig::default();
        apply_env_overrides(&mut config, lookup);
        assert_eq!(config.server.port, 5000);
    }
}
