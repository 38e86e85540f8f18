//! Database connection descriptor

use percent_encoding::percent_decode_str;
use secrecy::SecretString;
use url::Url;

use crate::config::env::EnvSource;
use crate::errors::ConfigError;

/// Primary connection string variable
pub const CONNECTION_STRING_VAR: &str = "MYSQL_PUBLIC_URL";

const NAME_VARS: &[&str] = &["MYSQLDATABASE", "MYSQL_DATABASE"];
const USER_VARS: &[&str] = &["MYSQLUSER"];
const PASSWORD_VARS: &[&str] = &["MYSQLPASSWORD", "MYSQL_ROOT_PASSWORD"];
const HOST_VARS: &[&str] = &["MYSQLHOST"];
const PORT_VARS: &[&str] = &["MYSQLPORT"];

pub const DEFAULT_PORT: &str = "3306";

/// Resolved database credentials, derived once per provisioning run
#[derive(Debug)]
pub struct ConnectionDescriptor {
    pub host: String,
    pub port: String,
    pub name: String,
    pub user: String,
    pub password: SecretString,
}

impl ConnectionDescriptor {
    /// Resolve the descriptor from the environment.
    ///
    /// Each field takes the first non-empty value of its discrete variables,
    /// then falls back to the connection string.
    pub fn resolve(env: &dyn EnvSource) -> Result<Self, ConfigError> {
        let parsed = match env.non_empty(CONNECTION_STRING_VAR) {
            Some(raw) => Some(UrlParts::parse(&raw)?),
            None => None,
        };
        let from_url = |pick: fn(&UrlParts) -> Option<String>| parsed.as_ref().and_then(pick);

        let name = env.first_of(NAME_VARS).or_else(|| from_url(|p| p.name.clone()));
        let user = env.first_of(USER_VARS).or_else(|| from_url(|p| p.user.clone()));
        let password = env
            .first_of(PASSWORD_VARS)
            .or_else(|| from_url(|p| p.password.clone()));
        let host = env.first_of(HOST_VARS).or_else(|| from_url(|p| p.host.clone()));
        let port = env
            .first_of(PORT_VARS)
            .or_else(|| from_url(|p| p.port.clone()))
            .unwrap_or_else(|| DEFAULT_PORT.to_string());

        let require = |value: Option<String>, field: &'static str| {
            value.ok_or(if parsed.is_some() {
                ConfigError::MissingField(field)
            } else {
                ConfigError::MissingConnectionString(CONNECTION_STRING_VAR)
            })
        };

        Ok(Self {
            name: require(name, "name")?,
            user: require(user, "user")?,
            password: SecretString::from(require(password, "password")?),
            host: require(host, "host")?,
            port,
        })
    }

    /// `host:port` as WordPress expects in `DB_HOST`
    pub fn host_with_port(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Fields extracted from the connection string, empty ones dropped
struct UrlParts {
    host: Option<String>,
    port: Option<String>,
    name: Option<String>,
    user: Option<String>,
    password: Option<String>,
}

impl UrlParts {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(raw)
            .map_err(|e| ConfigError::InvalidConnectionString(e.to_string()))?;

        Ok(Self {
            host: url.host_str().and_then(non_empty),
            port: url.port().map(|port| port.to_string()),
            name: non_empty(url.path().trim_start_matches('/')),
            user: decode(url.username())?,
            password: match url.password() {
                Some(password) => decode(password)?,
                None => None,
            },
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn decode(value: &str) -> Result<Option<String>, ConfigError> {
    let decoded = percent_decode_str(value)
        .decode_utf8()
        .map_err(|e| ConfigError::InvalidConnectionString(e.to_string()))?;
    Ok(non_empty(&decoded))
}
