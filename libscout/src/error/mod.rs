//! Error types for Scout
//!
//! Every failure in the retrieval pipeline is expressed as a [`ScoutError`].
//! Network, authentication, status and decode failures form the retrieval
//! family: they are reported per branch through the result stream and never
//! abort unrelated repositories or tags. Invalid URLs and unknown output
//! formats are returned synchronously before any task is spawned.

use thiserror::Error;


/// Main error type for Scout operations
#[derive(Error, Debug)]
pub enum ScoutError {
    /// Network-related errors (connection, timeout, DNS)
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Authentication errors (401, 403)
    #[error("Authentication error (status: {status_code:?}): {message}")]
    Authentication {
        message: String,
        status_code: Option<u16>,
    },

    /// Resource not found errors (404)
    #[error("{resource_type} not found: {name}")]
    NotFound { resource_type: String, name: String },

    /// Rate limiting errors (429)
    #[error("Rate limit: {message}")]
    RateLimit {
        message: String,
        retry_after: Option<u64>,
    },

    /// Server errors (500, 502, 503, 504)
    #[error("Server error (status: {status_code}): {message}")]
    Server { message: String, status_code: u16 },

    /// Validation errors (malformed response bodies, mismatched names)
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors (invalid config file, missing runtime)
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The server URL is malformed; raised before any request is issued.
    #[error("Invalid server URL: '{url}'")]
    InvalidUrl { url: String },

    /// The requested render format is not one of text, json or yaml.
    #[error("Invalid output format: '{format}' (expected text, json or yaml)")]
    InvalidOutputFormat { format: String },

    /// The search was cancelled before this unit of work completed.
    #[error("Search cancelled")]
    Cancelled,
}

/// Result type alias for Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

impl ScoutError {
    /// Creates a new network error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libscout::error::ScoutError;
    ///
    /// let err = ScoutError::network("connection refused");
    /// assert!(matches!(err, ScoutError::Network { .. }));
    /// ```
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new network error with a source error.
    pub fn network_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new authentication error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libscout::error::ScoutError;
    ///
    /// let err = ScoutError::authentication("invalid credentials", Some(401));
    /// assert!(matches!(err, ScoutError::Authentication { .. }));
    /// ```
    pub fn authentication<S: Into<String>>(message: S, status_code: Option<u16>) -> Self {
        Self::Authentication {
            message: message.into(),
            status_code,
        }
    }

    /// Creates a new not found error.
    pub fn not_found<S: Into<String>>(resource_type: S, name: S) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }

    /// Creates a new rate limit error.
    pub fn rate_limit<S: Into<String>>(message: S, retry_after: Option<u64>) -> Self {
        Self::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    /// Creates a new server error.
    pub fn server<S: Into<String>>(message: S, status_code: u16) -> Self {
        Self::Server {
            message: message.into(),
            status_code,
        }
    }

    /// Creates a new validation error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libscout::error::ScoutError;
    ///
    /// let err = ScoutError::validation("invalid manifest format");
    /// assert!(matches!(err, ScoutError::Validation { .. }));
    /// ```
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new validation error with a source error.
    pub fn validation_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Validation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S, path: Option<S>) -> Self {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: None,
        }
    }

    /// Creates a new configuration error with a source error.
    pub fn config_with_source<S, E>(message: S, path: Option<S>, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an invalid URL error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libscout::error::ScoutError;
    ///
    /// let err = ScoutError::invalid_url("not a url");
    /// assert_eq!(err.to_string(), "Invalid server URL: 'not a url'");
    /// ```
    pub fn invalid_url<S: Into<String>>(url: S) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an invalid output format error.
    pub fn invalid_output_format<S: Into<String>>(format: S) -> Self {
        Self::InvalidOutputFormat {
            format: format.into(),
        }
    }

    /// Returns true for failures of a catalog, tag-list or manifest call.
    ///
    /// These are isolated to the branch that produced them.
    pub fn is_retrieval(&self) -> bool {
        matches!(
            self,
            Self::Network { .. }
                | Self::Authentication { .. }
                | Self::NotFound { .. }
                | Self::RateLimit { .. }
                | Self::Server { .. }
                | Self::Validation { .. }
        )
    }
}

impl From<config::ConfigError> for ScoutError {
    fn from(err: config::ConfigError) -> Self {
        ScoutError::config_with_source("Failed to build configuration", None, err)
    }
}
