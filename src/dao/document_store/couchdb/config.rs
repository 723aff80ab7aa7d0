/// Runtime configuration describing how to connect to CouchDB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouchConfig {
    /// Server URL without a trailing slash.
    pub base_url: String,
    /// Database holding every entity document.
    pub database: String,
    /// Basic auth user.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
}

impl CouchConfig {
    /// Construct a configuration from explicit base URL and database name.
    pub fn new(base_url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            database: database.into(),
            username: None,
            password: None,
        }
    }

    /// Attach basic-auth credentials to the configuration.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}
