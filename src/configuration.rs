use crate::error::ConfigError;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    #[serde(default)]
    pub jwt: JwtSettings,
    #[serde(default)]
    pub users: Vec<UserSettings>,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

/// JWT authentication settings
///
/// Every field defaults so that a missing value is reported by
/// `JwtAuth::builder(..).build()` as a `ConfigError`, not a parse failure.
#[derive(serde::Deserialize, Clone, Debug, Default)]
pub struct JwtSettings {
    #[serde(default)]
    pub realm: String,
    #[serde(default)]
    pub signing_algorithm: Option<String>, // HS256 | HS384 | HS512, HS256 if unset
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub token_lifetime_secs: i64, // 0 means one hour
    #[serde(default)]
    pub max_refresh_secs: i64, // 0 disables refresh
}

/// A user accepted by the in-memory credential store
#[derive(serde::Deserialize, Clone, Debug)]
pub struct UserSettings {
    pub username: String,
    pub password_hash: String, // bcrypt
}

/// Load settings from `configuration.{toml,yaml,json}` overlaid with
/// `APP_`-prefixed environment variables, e.g. `APP_JWT__SECRET`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    Ok(settings.try_deserialize::<Settings>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Config, File, FileFormat};

    fn parse(json: &str) -> Result<Settings, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(json, FileFormat::Json))
            .build()?;
        Ok(settings.try_deserialize::<Settings>()?)
    }

    #[test]
    fn test_full_settings() {
        let settings = parse(
            r#"{
                "application": { "host": "0.0.0.0", "port": 8000 },
                "jwt": {
                    "realm": "test zone",
                    "signing_algorithm": "HS512",
                    "secret": "secret key",
                    "token_lifetime_secs": 900,
                    "max_refresh_secs": 86400
                },
                "users": [ { "username": "alice", "password_hash": "$2b$04$abc" } ]
            }"#,
        )
        .expect("Failed to parse settings");

        assert_eq!(settings.application.address(), "0.0.0.0:8000");
        assert_eq!(settings.jwt.realm, "test zone");
        assert_eq!(settings.jwt.signing_algorithm.as_deref(), Some("HS512"));
        assert_eq!(settings.jwt.token_lifetime_secs, 900);
        assert_eq!(settings.jwt.max_refresh_secs, 86400);
        assert_eq!(settings.users.len(), 1);
        assert_eq!(settings.users[0].username, "alice");
    }

    #[test]
    fn test_optional_fields_default() {
        let settings = parse(r#"{ "application": { "port": 8000 }, "jwt": {} }"#)
            .expect("Failed to parse settings");

        assert_eq!(settings.application.host, "127.0.0.1");
        assert!(settings.jwt.realm.is_empty());
        assert!(settings.jwt.signing_algorithm.is_none());
        assert_eq!(settings.jwt.max_refresh_secs, 0);
        assert!(settings.users.is_empty());
    }

    #[test]
    fn test_missing_section_is_load_error() {
        let result = parse(r#"{ "jwt": {} }"#);
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
