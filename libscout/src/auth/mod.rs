//! Credentials for registry requests.
//!
//! Only static credentials are supported: anonymous access or HTTP Basic
//! authentication. Credentials live in memory for the duration of a search
//! and are never written anywhere.

use base64::{Engine as _, engine::general_purpose};

#[cfg(test)]
mod tests;

/// Credentials for registry authentication.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Credentials {
    /// No authentication (anonymous access)
    #[default]
    Anonymous,

    /// HTTP Basic authentication with username and password
    Basic {
        /// Username for authentication
        username: String,
        /// Password for authentication
        password: String,
    },
}

impl Credentials {
    /// Creates anonymous credentials.
    pub fn anonymous() -> Self {
        Self::Anonymous
    }

    /// Creates Basic authentication credentials.
    ///
    /// # Examples
    ///
    /// ```
    /// use libscout::auth::Credentials;
    ///
    /// let creds = Credentials::basic("username", "password");
    /// assert!(creds.to_header_value().is_some());
    /// ```
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Builds credentials from a username/password pair as the CLI receives them.
    ///
    /// An empty username means anonymous access.
    ///
    /// # Examples
    ///
    /// ```
    /// use libscout::auth::Credentials;
    ///
    /// assert_eq!(Credentials::from_pair("", ""), Credentials::Anonymous);
    /// assert_eq!(
    ///     Credentials::from_pair("admin", "secret"),
    ///     Credentials::basic("admin", "secret")
    /// );
    /// ```
    pub fn from_pair(username: &str, password: &str) -> Self {
        if username.is_empty() {
            Self::Anonymous
        } else {
            Self::basic(username, password)
        }
    }

    /// Returns the Authorization header value for these credentials.
    pub fn to_header_value(&self) -> Option<String> {
        match self {
            Self::Anonymous => None,
            Self::Basic { username, password } => {
                let credentials = format!("{}:{}", username, password);
                let encoded = general_purpose::STANDARD.encode(credentials);
                Some(format!("Basic {}", encoded))
            }
        }
    }

    /// Returns the username, if any.
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Basic { username, .. } => Some(username),
        }
    }
}

// Passwords must not leak through `{:?}` in logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}
