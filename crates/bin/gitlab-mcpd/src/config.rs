use clap::{ArgAction, Parser, builder::BoolishValueParser};
use gitlab_api::Url;
use std::error::Error;
use std::fmt;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "https://127.0.0.1";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser, Debug)]
#[command(name = "gitlab-mcpd", version, about = "GitLab MCP daemon.")]
struct CliArgs {
    /// Base URL of the GitLab instance.
    #[arg(long, env = "GITLAB_URL", default_value = DEFAULT_URL)]
    url: String,

    /// Personal, project or group access token. Empty means unauthenticated.
    #[arg(long, env = "GITLAB_TOKEN", default_value = "", hide_env_values = true)]
    token: String,

    /// Withhold every tool that can change GitLab state.
    #[arg(
        long,
        env = "GITLAB_READONLY",
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    readonly: bool,

    /// Per-request timeout in seconds; 0 or unset leaves requests unbounded.
    #[arg(long, env = "GITLAB_REQUEST_TIMEOUT_SECS")]
    request_timeout_secs: Option<u64>,

    /// Log filter directives, written to stderr. `RUST_LOG` wins when set.
    #[arg(long, env = "GITLAB_LOG", default_value = DEFAULT_LOG_FILTER)]
    log_filter: String,
}

/// Runtime configuration loaded from CLI arguments and environment variables.
#[derive(Clone)]
pub struct GitlabConfig {
    pub url: Url,
    pub token: String,
    pub readonly: bool,
    pub request_timeout: Option<Duration>,
    pub log_filter: String,
}

impl fmt::Debug for GitlabConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitlabConfig")
            .field("url", &self.url.as_str())
            .field("token", &if self.token.is_empty() { "<empty>" } else { "<redacted>" })
            .field("readonly", &self.readonly)
            .field("request_timeout", &self.request_timeout)
            .field("log_filter", &self.log_filter)
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    MissingSetting(&'static str),
    InvalidSetting { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSetting(name) => write!(f, "missing required setting: {name}"),
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value}")
            }
        }
    }
}

impl Error for ConfigError {}

impl GitlabConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::try_from(args)
    }

    /// Filter directives to install: a usable `RUST_LOG` value, else the configured filter.
    pub fn effective_log_filter<'a>(&'a self, rust_log: Option<&'a str>) -> &'a str {
        match rust_log.map(str::trim) {
            Some(directives) if !directives.is_empty() && EnvFilter::try_new(directives).is_ok() => {
                directives
            }
            _ => &self.log_filter,
        }
    }
}

impl TryFrom<CliArgs> for GitlabConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let raw_url = args.url.trim();
        if raw_url.is_empty() {
            return Err(ConfigError::MissingSetting("GITLAB_URL"));
        }
        let invalid_url = || ConfigError::InvalidSetting {
            name: "GITLAB_URL",
            value: raw_url.to_string(),
        };
        let url = Url::parse(raw_url).map_err(|_| invalid_url())?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(invalid_url());
        }

        let request_timeout = match args.request_timeout_secs {
            None | Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
        };

        let log_filter = args.log_filter.trim().to_string();
        if log_filter.is_empty() || EnvFilter::try_new(&log_filter).is_err() {
            return Err(ConfigError::InvalidSetting {
                name: "GITLAB_LOG",
                value: args.log_filter,
            });
        }

        Ok(Self {
            url,
            token: args.token.trim().to_string(),
            readonly: args.readonly,
            request_timeout,
            log_filter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, FromArgMatches};

    fn base_args() -> CliArgs {
        CliArgs {
            url: DEFAULT_URL.to_string(),
            token: String::new(),
            readonly: true,
            request_timeout_secs: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    #[test]
    fn defaults_are_readonly_and_unauthenticated() {
        let config = GitlabConfig::try_from(base_args()).expect("config should parse");

        assert_eq!(config.url.as_str(), "https://127.0.0.1/");
        assert!(config.token.is_empty());
        assert!(config.readonly);
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn zero_timeout_means_unbounded() {
        let mut args = base_args();
        args.request_timeout_secs = Some(0);
        assert!(GitlabConfig::try_from(args).expect("config").request_timeout.is_none());

        let mut args = base_args();
        args.request_timeout_secs = Some(30);
        assert_eq!(
            GitlabConfig::try_from(args).expect("config").request_timeout,
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn rejects_blank_url() {
        let mut args = base_args();
        args.url = "  ".to_string();
        assert!(matches!(
            GitlabConfig::try_from(args),
            Err(ConfigError::MissingSetting("GITLAB_URL"))
        ));
    }

    #[test]
    fn rejects_non_http_url() {
        for url in ["ftp://gitlab.example.com", "gitlab.example.com", "mailto:ops@example.com"] {
            let mut args = base_args();
            args.url = url.to_string();
            assert!(
                matches!(
                    GitlabConfig::try_from(args),
                    Err(ConfigError::InvalidSetting { name: "GITLAB_URL", .. })
                ),
                "{url}"
            );
        }
    }

    #[test]
    fn rejects_unparsable_log_filter() {
        let mut args = base_args();
        args.log_filter = "gitlab_mcp=loud".to_string();
        assert!(matches!(
            GitlabConfig::try_from(args),
            Err(ConfigError::InvalidSetting { name: "GITLAB_LOG", .. })
        ));
    }

    #[test]
    fn debug_never_prints_token() {
        let mut args = base_args();
        args.token = "glpat-secret".to_string();
        let config = GitlabConfig::try_from(args).expect("config");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("glpat-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    fn parse_without_env(argv: &[&str]) -> CliArgs {
        let command = CliArgs::command().mut_args(|arg| arg.env(None::<&'static str>));
        let matches = command.try_get_matches_from(argv).expect("parses");
        CliArgs::from_arg_matches(&matches).expect("matches map to args")
    }

    #[test]
    fn readonly_flag_accepts_explicit_false() {
        assert!(!parse_without_env(&["gitlab-mcpd", "--readonly=false"]).readonly);
        assert!(parse_without_env(&["gitlab-mcpd", "--readonly"]).readonly);
        assert!(parse_without_env(&["gitlab-mcpd"]).readonly);
    }

    #[test]
    fn rust_log_overrides_configured_filter() {
        let config = GitlabConfig::try_from(base_args()).expect("config");

        assert_eq!(config.effective_log_filter(Some("gitlab_mcp=debug")), "gitlab_mcp=debug");
        assert_eq!(config.effective_log_filter(None), DEFAULT_LOG_FILTER);
        assert_eq!(config.effective_log_filter(Some("  ")), DEFAULT_LOG_FILTER);
        assert_eq!(config.effective_log_filter(Some("gitlab_mcp=loud")), DEFAULT_LOG_FILTER);
    }
}
