//! Startup validation: the fields the bridge cannot run without, plus
//! warnings for degraded-but-legal configurations.

use crate::schema::LiaisonConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// One validation finding, addressed by dotted config path.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub path: &'static str,
    pub message: &'static str,
}

/// Check a loaded config. Errors mean the process cannot do useful work;
/// warnings mean a feature is off.
#[must_use]
pub fn validate(config: &LiaisonConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let mut require = |present: bool, path: &'static str| {
        if !present {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                path,
                message: "required field is not set",
            });
        }
    };

    require(!config.broker.base_url.is_empty(), "broker.base_url");
    require(!config.broker.org.is_empty(), "broker.org");
    require(!config.broker.env.is_empty(), "broker.env");
    require(!config.broker.bot_key.is_empty(), "broker.bot_key");
    require(config.broker.api_key.is_some(), "broker.api_key");
    require(!config.identity.token_url.is_empty(), "identity.token_url");
    require(!config.identity.client_id.is_empty(), "identity.client_id");
    require(
        config.identity.client_secret.is_some(),
        "identity.client_secret",
    );
    require(!config.platform.api_base.is_empty(), "platform.api_base");
    require(
        !config.platform.content_base.is_empty(),
        "platform.content_base",
    );
    require(
        config.platform.channel_token.is_some(),
        "platform.channel_token",
    );

    if config.platform.channel_secret.is_none() {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            path: "platform.channel_secret",
            message: "not set; webhook signatures will not be verified",
        });
    }
    if config.transcription.api_key.is_none() {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            path: "transcription.api_key",
            message: "not set; voice messages will be dropped",
        });
    }

    diagnostics
}

/// Returns `true` if any diagnostic is an error.
#[must_use]
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(|d| d.severity == Severity::Error)
}

#[cfg(test)]
mod tests {
    use {super::*, secrecy::Secret};

    fn complete_config() -> LiaisonConfig {
        let mut config = LiaisonConfig::default();
        config.broker.base_url = "https://broker.example.com".into();
        config.broker.org = "org-1".into();
        config.broker.env = "env-1".into();
        config.broker.bot_key = "bot-1".into();
        config.broker.api_key = Some(Secret::new("k".into()));
        config.identity.token_url = "https://idp.example.com/token".into();
        config.identity.client_id = "client-1".into();
        config.identity.client_secret = Some(Secret::new("s".into()));
        config.platform.api_base = "https://api.platform.example".into();
        config.platform.content_base = "https://data.platform.example".into();
        config.platform.channel_token = Some(Secret::new("t".into()));
        config.platform.channel_secret = Some(Secret::new("sec".into()));
        config.transcription.api_key = Some(Secret::new("stt".into()));
        config
    }

    #[test]
    fn test_complete_config_is_clean() {
        let diagnostics = validate(&complete_config());
        assert!(!has_errors(&diagnostics));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_empty_config_reports_all_required_fields() {
        let diagnostics = validate(&LiaisonConfig::default());
        assert!(has_errors(&diagnostics));
        assert!(diagnostics.iter().any(|d| d.path == "broker.base_url"));
        assert!(diagnostics.iter().any(|d| d.path == "identity.client_secret"));
        assert!(diagnostics.iter().any(|d| d.path == "platform.channel_token"));
    }

    #[test]
    fn test_optional_features_only_warn() {
        let mut config = complete_config();
        config.platform.channel_secret = None;
        config.transcription.api_key = None;

        let diagnostics = validate(&config);
        assert!(!has_errors(&diagnostics));
        assert_eq!(diagnostics.len(), 2);
        assert!(
            diagnostics
                .iter()
                .all(|d| d.severity == Severity::Warning)
        );
    }
}
