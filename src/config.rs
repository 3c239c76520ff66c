use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};

pub const DEFAULT_DATABASE: &str = "alumni_db";

/// One connection parameter: the variables consulted in order, then a literal.
#[derive(Debug, Clone, Copy)]
pub struct Setting {
    pub sources: &'static [&'static str],
    pub default: &'static str,
}

impl Setting {
    /// First non-empty source wins; an empty variable counts as unset.
    pub fn lookup<'a>(&self, vars: &'a HashMap<String, String>) -> Option<&'a str> {
        self.sources
            .iter()
            .filter_map(|name| vars.get(*name))
            .map(String::as_str)
            .find(|value| !value.is_empty())
    }

    pub fn resolve(&self, vars: &HashMap<String, String>) -> String {
        self.lookup(vars).unwrap_or(self.default).to_string()
    }
}

pub const HOST: Setting = Setting {
    sources: &["MYSQLHOST", "DB_HOST"],
    default: "localhost",
};

pub const USER: Setting = Setting {
    sources: &["MYSQLUSER", "DB_USER"],
    default: "root",
};

pub const PORT: Setting = Setting {
    sources: &["MYSQLPORT", "DB_PORT"],
    default: "3306",
};

pub const DATABASE: Setting = Setting {
    sources: &["MYSQLDATABASE", "DB_NAME"],
    default: DEFAULT_DATABASE,
};

const PASSWORD_SOURCES: &[&str] = &["MYSQLPASSWORD", "DB_PASSWORD"];

/// Password used when neither password variable is set.
///
/// `create-db` has always fallen back to the literal `mysql` while every other
/// tool falls back to an empty password. Both are kept and the first one logs
/// a warning when it kicks in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordDefault {
    Provisioning,
    Empty,
}

impl PasswordDefault {
    pub fn setting(self) -> Setting {
        let default = match self {
            Self::Provisioning => "mysql",
            Self::Empty => "",
        };
        Setting {
            sources: PASSWORD_SOURCES,
            default,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

impl ConnectionConfig {
    pub fn resolve(vars: &HashMap<String, String>, password: PasswordDefault) -> DbResult<Self> {
        let raw_port = PORT.resolve(vars);
        let port = raw_port.trim().parse::<u16>().map_err(|_| {
            DbError::config(format!("MYSQLPORT/DB_PORT must be a port number, got {raw_port:?}"))
        })?;

        let password_setting = password.setting();
        if password == PasswordDefault::Provisioning && password_setting.lookup(vars).is_none() {
            warn!(
                "no MYSQLPASSWORD/DB_PASSWORD set, falling back to the provisioning default password \
                 (the other tools default to an empty password)"
            );
        }

        Ok(Self {
            host: HOST.resolve(vars),
            port,
            user: USER.resolve(vars),
            password: password_setting.resolve(vars),
            database: DATABASE.resolve(vars),
        })
    }

    pub fn from_env(password: PasswordDefault) -> DbResult<Self> {
        Self::resolve(&env_snapshot(), password)
    }
}

/// Process environment as UTF-8 pairs. Variables that are not valid Unicode
/// cannot be one of ours and are skipped.
fn env_snapshot() -> HashMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

/// Seeds the process environment from `.env` files.
///
/// The current directory is checked first, then `~/.alumni-db/.env`. Neither
/// overrides variables that are already set.
pub fn load_dotenv() {
    let mut loaded_from = Vec::new();

    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded .env from {}", path.display());
        loaded_from.push(path.display().to_string());
    }

    if let Some(home) = dirs::home_dir() {
        let env_file = home.join(".alumni-db").join(".env");
        if env_file.exists() {
            match dotenvy::from_path(&env_file) {
                Ok(()) => loaded_from.push(env_file.display().to_string()),
                Err(e) => debug!("Failed to load {}: {}", env_file.display(), e),
            }
        }
    }

    if loaded_from.is_empty() {
        debug!("No .env file found, using process environment only");
    } else {
        info!("Loaded environment from: {}", loaded_from.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ConnectionConfig::resolve(&HashMap::new(), PasswordDefault::Empty).unwrap();
        assert_eq!(
            config,
            ConnectionConfig {
                host: "localhost".into(),
                port: 3306,
                user: "root".into(),
                password: String::new(),
                database: "alumni_db".into(),
            }
        );
    }

    #[test]
    fn provisioning_password_default() {
        let config =
            ConnectionConfig::resolve(&HashMap::new(), PasswordDefault::Provisioning).unwrap();
        assert_eq!(config.password, "mysql");
    }

    #[test]
    fn primary_beats_alias() {
        let env = vars(&[
            ("MYSQLHOST", "db.internal"),
            ("DB_HOST", "legacy.internal"),
            ("MYSQLPORT", "3307"),
            ("DB_PORT", "3308"),
        ]);
        let config = ConnectionConfig::resolve(&env, PasswordDefault::Empty).unwrap();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 3307);
    }

    #[test]
    fn alias_used_when_primary_missing() {
        let env = vars(&[
            ("DB_USER", "alumni"),
            ("DB_PASSWORD", "s3cret"),
            ("DB_NAME", "alumni_test"),
        ]);
        let config = ConnectionConfig::resolve(&env, PasswordDefault::Provisioning).unwrap();
        assert_eq!(config.user, "alumni");
        assert_eq!(config.password, "s3cret");
        assert_eq!(config.database, "alumni_test");
    }

    #[test]
    fn empty_variable_falls_through() {
        let env = vars(&[("MYSQLHOST", ""), ("DB_HOST", "fallback"), ("MYSQLPASSWORD", "")]);
        let config = ConnectionConfig::resolve(&env, PasswordDefault::Provisioning).unwrap();
        assert_eq!(config.host, "fallback");
        assert_eq!(config.password, "mysql");
    }

    #[test]
    fn bad_port_is_rejected() {
        let env = vars(&[("MYSQLPORT", "not-a-port")]);
        let err = ConnectionConfig::resolve(&env, PasswordDefault::Empty).unwrap_err();
        assert!(matches!(err, DbError::Config(_)));

        let env = vars(&[("DB_PORT", "70000")]);
        assert!(ConnectionConfig::resolve(&env, PasswordDefault::Empty).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn non_unicode_variables_are_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        // SAFETY: no other test in this crate reads or writes this variable.
        unsafe {
            std::env::set_var("ALUMNI_DB_TEST_NOT_UTF8", OsStr::from_bytes(b"\xff\xfe"));
        }

        let snapshot = env_snapshot();
        assert!(!snapshot.contains_key("ALUMNI_DB_TEST_NOT_UTF8"));
        assert!(ConnectionConfig::from_env(PasswordDefault::Empty).is_ok());

        unsafe {
            std::env::remove_var("ALUMNI_DB_TEST_NOT_UTF8");
        }
    }

    #[test]
    fn debug_hides_password() {
        let env = vars(&[("MYSQLPASSWORD", "hunter2")]);
        let config = ConnectionConfig::resolve(&env, PasswordDefault::Empty).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
