//! Loader for asibar configuration with YAML + environment overlays.
//!
//! Sources, lowest precedence first:
//!
//! 1. serde defaults on the structs below,
//! 2. an optional YAML file (`${VAR}` placeholders are expanded),
//! 3. `ASIBAR__`-prefixed env vars, e.g. `ASIBAR__SOURCE__TIMEOUT_SECS=10`,
//! 4. the plain variables cron jobs already export: `LOGGING_LEVEL`,
//!    `TWITTER_CONSUMER_KEY`, `TWITTER_CONSUMER_SECRET`, `TWITTER_ACCESS_KEY`,
//!    `TWITTER_SECRET_KEY`.
use asibar_common::observability::LogFormat;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

pub const DEFAULT_STATUS_URL: &str = "https://covid19asi.saglik.gov.tr/";
pub const DEFAULT_CONTAINER_SELECTOR: &str = ".svg-turkiye-haritasi";
/// Registered population on 2020-12-31 (TÜİK address based census).
pub const DEFAULT_POPULATION: u64 = 83_614_362;
pub const DEFAULT_TWITTER_API_BASE: &str = "https://api.twitter.com";

/// Plain env vars mapped onto config keys.
const LEGACY_ENV: [(&str, &str); 4] = [
    ("TWITTER_CONSUMER_KEY", "twitter.consumer_key"),
    ("TWITTER_CONSUMER_SECRET", "twitter.consumer_secret"),
    ("TWITTER_ACCESS_KEY", "twitter.access_key"),
    ("TWITTER_SECRET_KEY", "twitter.secret_key"),
];
const LEGACY_LEVEL_ENV: &str = "LOGGING_LEVEL";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub twitter: TwitterConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Python-style numeric level; see `asibar_common::observability::filter_for_level`.
    #[serde(default = "default_level", deserialize_with = "lenient::number")]
    pub level: i64,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            dir: None,
        }
    }
}

/// Where the vaccination numbers come from.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_status_url")]
    pub url: String,
    #[serde(default = "default_selector")]
    pub selector: String,
    #[serde(default = "default_population", deserialize_with = "lenient::number")]
    pub population: u64,
    #[serde(default = "default_timeout_secs", deserialize_with = "lenient::number")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_status_url(),
            selector: default_selector(),
            population: default_population(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct TwitterConfig {
    #[serde(default = "default_twitter_api_base", deserialize_with = "lenient::string")]
    pub api_base: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub consumer_key: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub consumer_secret: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub access_key: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub secret_key: String,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            api_base: default_twitter_api_base(),
            consumer_key: String::new(),
            consumer_secret: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
        }
    }
}

impl fmt::Debug for TwitterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mask(s: &str) -> &'static str {
            if s.is_empty() { "<unset>" } else { "<redacted>" }
        }
        f.debug_struct("TwitterConfig")
            .field("api_base", &self.api_base)
            .field("consumer_key", &mask(&self.consumer_key))
            .field("consumer_secret", &mask(&self.consumer_secret))
            .field("access_key", &mask(&self.access_key))
            .field("secret_key", &mask(&self.secret_key))
            .finish()
    }
}

fn default_level() -> i64 {
    20
}
fn default_status_url() -> String {
    DEFAULT_STATUS_URL.into()
}
fn default_selector() -> String {
    DEFAULT_CONTAINER_SELECTOR.into()
}
fn default_population() -> u64 {
    DEFAULT_POPULATION
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_twitter_api_base() -> String {
    DEFAULT_TWITTER_API_BASE.into()
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is not a valid http(s) URL: {value}")]
    InvalidUrl { field: &'static str, value: String },
    #[error("source.selector must not be empty")]
    EmptySelector,
    #[error("source.population must be greater than zero")]
    ZeroPopulation,
    #[error("source.timeout_secs must be greater than zero")]
    ZeroTimeout,
    #[error("missing twitter credential {0}")]
    MissingCredential(&'static str),
}

impl AppConfig {
    /// Check everything that would otherwise fail late, at the network boundary.
    ///
    /// Credentials are only required when the run is going to post.
    pub fn validate(&self, require_credentials: bool) -> Result<(), ValidationError> {
        check_url("source.url", &self.source.url)?;
        check_url("twitter.api_base", &self.twitter.api_base)?;
        if self.source.selector.trim().is_empty() {
            return Err(ValidationError::EmptySelector);
        }
        if self.source.population == 0 {
            return Err(ValidationError::ZeroPopulation);
        }
        if self.source.timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout);
        }
        if require_credentials {
            let t = &self.twitter;
            let fields = [
                (LEGACY_ENV[0].0, &t.consumer_key),
                (LEGACY_ENV[1].0, &t.consumer_secret),
                (LEGACY_ENV[2].0, &t.access_key),
                (LEGACY_ENV[3].0, &t.secret_key),
            ];
            if let Some((name, _)) = fields.iter().find(|(_, v)| v.trim().is_empty()) {
                return Err(ValidationError::MissingCredential(*name));
            }
        }
        Ok(())
    }
}

fn check_url(field: &'static str, value: &str) -> Result<(), ValidationError> {
    match Url::parse(value) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => Ok(()),
        _ => Err(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        }),
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Scalars arrive as text from env vars and as typed values from YAML; accept both.
mod lenient {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};
    use std::fmt::Display;
    use std::str::FromStr;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        UInt(u64),
        Float(f64),
        Bool(bool),
    }

    impl Scalar {
        fn into_text(self) -> String {
            match self {
                Scalar::Text(s) => s,
                Scalar::Int(i) => i.to_string(),
                Scalar::UInt(u) => u.to_string(),
                Scalar::Float(f) => f.to_string(),
                Scalar::Bool(b) => b.to_string(),
            }
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Scalar::deserialize(d).map(Scalar::into_text)
    }

    pub fn number<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
        T::Err: Display,
    {
        let text = Scalar::deserialize(d)?.into_text();
        text.trim()
            .parse()
            .map_err(|e| D::Error::custom(format!("{text:?} is not a valid number: {e}")))
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct AsibarConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for AsibarConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AsibarConfigLoader {
    /// Start from built-in defaults; env overlays are applied in [`load`](Self::load).
    ///
    /// ```
    /// use asibar_config::{AsibarConfigLoader, DEFAULT_POPULATION};
    ///
    /// let config = AsibarConfigLoader::new()
    ///     .with_yaml_str("source:\n  timeout_secs: 5")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.source.timeout_secs, 5);
    /// assert_eq!(config.source.population, DEFAULT_POPULATION);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P, required: bool) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(required));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into [`AppConfig`].
    ///
    /// ```
    /// use asibar_config::AsibarConfigLoader;
    ///
    /// unsafe { std::env::set_var("ASIBAR_DOC_KEY", "injected-from-env"); }
    ///
    /// let config = AsibarConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// twitter:
    ///   consumer_key: "${ASIBAR_DOC_KEY}"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.twitter.consumer_key, "injected-from-env");
    ///
    /// unsafe { std::env::remove_var("ASIBAR_DOC_KEY"); }
    /// ```
    pub fn load(self) -> Result<AppConfig, ConfigError> {
        // Env values stay strings; `lenient` turns the numeric ones into numbers.
        let mut builder = self
            .builder
            .add_source(Environment::with_prefix("ASIBAR").separator("__"));

        if let Some(raw) = non_empty_env(LEGACY_LEVEL_ENV) {
            let level: i64 = raw.trim().parse().map_err(|_| {
                ConfigError::Message(format!("{LEGACY_LEVEL_ENV} must be an integer, got {raw:?}"))
            })?;
            builder = builder.set_override("logging.level", level)?;
        }
        for (var, key) in LEGACY_ENV {
            builder = builder.set_override_option(key, non_empty_env(var))?;
        }

        let cfg = builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_nested_placeholders() {
        temp_env::with_vars(
            [
                ("ASIBAR_T_HOST", Some("example.org")),
                ("ASIBAR_T_PATH", Some("asi")),
            ],
            || {
                let mut v = json!({
                    "source": { "url": "https://${ASIBAR_T_HOST}/${ASIBAR_T_PATH}" },
                    "list": ["$ASIBAR_T_PATH", 7, null]
                });
                expand_env_in_value(&mut v);
                assert_eq!(v["source"]["url"], json!("https://example.org/asi"));
                assert_eq!(v["list"], json!(["asi", 7, null]));
            },
        );
    }

    #[test]
    fn expansion_terminates_on_cycles() {
        temp_env::with_vars(
            [
                ("ASIBAR_T_A", Some("${ASIBAR_T_B}")),
                ("ASIBAR_T_B", Some("${ASIBAR_T_A}")),
            ],
            || {
                let mut v = json!("k=${ASIBAR_T_A}");
                expand_env_in_value(&mut v);
                assert!(v.as_str().unwrap().contains("${"));
            },
        );
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("secret-${ASIBAR_T_DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("secret-${ASIBAR_T_DOES_NOT_EXIST}"));
    }

    fn with_credentials() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.twitter.consumer_key = "ck".into();
        cfg.twitter.consumer_secret = "cs".into();
        cfg.twitter.access_key = "ak".into();
        cfg.twitter.secret_key = "sk".into();
        cfg
    }

    #[test]
    fn defaults_are_valid_without_credentials() {
        assert_eq!(AppConfig::default().validate(false), Ok(()));
        assert_eq!(with_credentials().validate(true), Ok(()));
    }

    #[test]
    fn first_missing_credential_is_reported_by_env_name() {
        let mut cfg = with_credentials();
        cfg.twitter.access_key = "  ".into();
        assert_eq!(
            cfg.validate(true),
            Err(ValidationError::MissingCredential("TWITTER_ACCESS_KEY"))
        );
        assert_eq!(
            AppConfig::default().validate(true),
            Err(ValidationError::MissingCredential("TWITTER_CONSUMER_KEY"))
        );
    }

    #[test]
    fn rejects_bad_source_settings() {
        let mut cfg = AppConfig::default();
        cfg.source.population = 0;
        assert_eq!(cfg.validate(false), Err(ValidationError::ZeroPopulation));

        let mut cfg = AppConfig::default();
        cfg.source.url = "ftp://example.org".into();
        assert!(matches!(
            cfg.validate(false),
            Err(ValidationError::InvalidUrl { field: "source.url", .. })
        ));

        let mut cfg = AppConfig::default();
        cfg.source.selector = "".into();
        assert_eq!(cfg.validate(false), Err(ValidationError::EmptySelector));
    }

    #[test]
    fn scalars_are_accepted_as_text_or_numbers() {
        let cfg: AppConfig = serde_json::from_value(json!({
            "logging": { "level": "300" },
            "source": { "population": "1000", "timeout_secs": 5 },
            "twitter": { "consumer_key": 1234567890, "access_key": "0042" }
        }))
        .unwrap();
        assert_eq!(cfg.logging.level, 300);
        assert_eq!(cfg.source.population, 1000);
        assert_eq!(cfg.source.timeout_secs, 5);
        assert_eq!(cfg.twitter.consumer_key, "1234567890");
        assert_eq!(cfg.twitter.access_key, "0042");

        let err = serde_json::from_value::<AppConfig>(json!({
            "source": { "population": "-3" }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("\"-3\""), "{err}");
    }

    #[test]
    fn debug_output_never_contains_secrets() {
        let rendered = format!("{:?}", with_credentials());
        assert!(rendered.contains("<redacted>"));
        for secret in ["\"ck\"", "\"cs\"", "\"ak\"", "\"sk\""] {
            assert!(!rendered.contains(secret), "{secret} leaked: {rendered}");
        }
    }
}
