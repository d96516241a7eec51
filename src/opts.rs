//! Connection options.

use url::Url;

use crate::buffer_set::{BufferSet, DEFAULT_MAX_MESSAGE_SIZE};
use crate::error::Error;
use crate::protocol::frontend::StartupMessage;

/// Connection options for PostgreSQL.
#[derive(Debug, Clone)]
pub struct Opts {
    /// Hostname or IP address, for the transport layer.
    ///
    /// Default: `""`
    pub host: String,

    /// Port number for the PostgreSQL server, for the transport layer.
    ///
    /// Default: `5432`
    pub port: u16,

    /// Username for authentication.
    ///
    /// Default: `""`
    pub user: String,

    /// Database name to use.
    ///
    /// Default: `None`
    pub database: Option<String>,

    /// Password for authentication.
    ///
    /// Default: `None`
    pub password: Option<String>,

    /// Application name to report to the server.
    ///
    /// Default: `None`
    pub application_name: Option<String>,

    /// Largest inbound message payload, in bytes, for
    /// [`BufferSet::with_max_message_size`].
    ///
    /// Default: [`DEFAULT_MAX_MESSAGE_SIZE`] (1 GiB)
    pub max_message_size: usize,

    /// Additional startup parameters.
    ///
    /// Default: `[]`
    pub params: Vec<(String, String)>,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 5432,
            user: String::new(),
            database: None,
            password: None,
            application_name: None,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            params: Vec::new(),
        }
    }
}

impl Opts {
    /// Build the StartupMessage options for these settings.
    ///
    /// Always requests `client_encoding=UTF8`, since every text field is
    /// decoded as UTF-8.
    pub fn startup_message(&self) -> StartupMessage {
        let mut msg = StartupMessage::new();
        msg.set("user", self.user.as_str());
        msg.set("client_encoding", "UTF8");

        if let Some(db) = &self.database {
            msg.set("database", db.as_str());
        }

        if let Some(app) = &self.application_name {
            msg.set("application_name", app.as_str());
        }

        for (name, value) in &self.params {
            msg.set(name.as_str(), value.as_str());
        }

        msg
    }

    /// Connection buffers sized by these options.
    pub fn buffer_set(&self) -> BufferSet {
        BufferSet::with_max_message_size(self.max_message_size)
    }
}

impl TryFrom<&Url> for Opts {
    type Error = Error;

    /// Parse a PostgreSQL connection URL.
    ///
    /// Format: `postgres://[user[:password]@]host[:port][/database][?param1=value1&param2=value2&..]`
    ///
    /// `application_name` and `max_message_size` are recognized; every other
    /// query parameter is sent as a startup parameter.
    fn try_from(url: &Url) -> Result<Self, Self::Error> {
        if !["postgres", "postgresql", "pg"].contains(&url.scheme()) {
            return Err(Error::InvalidUsage(format!(
                "Invalid scheme: expected 'postgres://' or 'pg://', got '{}://'",
                url.scheme()
            )));
        }

        let mut opts = Opts {
            host: url.host_str().unwrap_or("localhost").to_string(),
            port: url.port().unwrap_or(5432),
            user: url.username().to_string(),
            password: url.password().map(|s| s.to_string()),
            database: url
                .path()
                .strip_prefix('/')
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string()),
            ..Opts::default()
        };

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "application_name" => {
                    opts.application_name = Some(value.to_string());
                }
                "max_message_size" => {
                    opts.max_message_size = value.parse().map_err(|e| {
                        Error::InvalidUsage(format!("Invalid max_message_size {value:?}: {e}"))
                    })?;
                }
                _ => {
                    opts.params.push((key.to_string(), value.to_string()));
                }
            }
        }

        Ok(opts)
    }
}

impl TryFrom<&str> for Opts {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let url = Url::parse(s).map_err(|e| Error::InvalidUsage(format!("Invalid URL: {}", e)))?;
        Self::try_from(&url)
    }
}
