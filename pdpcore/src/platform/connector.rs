use std::time::Duration;

/// Options for establishing the connection to a store.
#[derive(Clone, Debug)]
pub struct ConnectorOption {
    pub auto_create_db: bool,
    pub url: String,
    /// Create the uniqueness constraint over (subject, object, action).
    pub unique_policies: bool,
    /// Total attempts made before giving up on connecting.
    pub connect_attempts: u32,
    pub connect_delay: Duration,
}

impl Default for ConnectorOption {
    fn default() -> Self {
        Self {
            auto_create_db: false,
            url: String::new(),
            unique_policies: false,
            connect_attempts: 1,
            connect_delay: Duration::from_secs(1),
        }
    }
}

impl ConnectorOption {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auto_create_db(mut self, auto_create_db: bool) -> Self {
        self.auto_create_db = auto_create_db;
        self
    }

    pub fn url(mut self, url: String) -> Self {
        self.url = url;
        self
    }

    pub fn unique_policies(mut self, unique_policies: bool) -> Self {
        self.unique_policies = unique_policies;
        self
    }

    pub fn connect_attempts(mut self, connect_attempts: u32) -> Self {
        self.connect_attempts = connect_attempts.max(1);
        self
    }

    pub fn connect_delay(mut self, connect_delay: Duration) -> Self {
        self.connect_delay = connect_delay;
        self
    }
}

impl<T> From<T> for ConnectorOption
where
    T: ToString
{
    fn from(v: T) -> Self {
        Self::new().url(v.to_string())
    }
}
