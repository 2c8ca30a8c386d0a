use thiserror::Error;

#[derive(Error, Debug)]
pub enum TicketDeskError {
    // Filter errors
    #[error("cannot add more than {cap} filters; remove one first")]
    FilterLimitExceeded { cap: usize },

    #[error("unknown filter field '{0}'")]
    UnknownFilterField(String),

    #[error("invalid filter operator '{0}'")]
    InvalidOperator(String),

    #[error("invalid sort order '{0}'")]
    InvalidSortOrder(String),

    #[error("filter schema error: {0}")]
    Schema(String),

    // List and edit errors
    #[error("failed to load tickets: {0}")]
    Fetch(String),

    #[error("failed to save ticket: {0}")]
    Commit(String),

    #[error("no quick edit is open")]
    NoQuickEdit,

    #[error("{0} cannot be cleared; pick another value")]
    FieldNotClearable(&'static str),

    #[error("ticket '{0}' is not on the current page")]
    TicketNotVisible(String),

    #[error("no tickets selected")]
    EmptySelection,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl TicketDeskError {
    pub fn invalid_operator(s: String) -> Self {
        TicketDeskError::InvalidOperator(s)
    }

    pub fn invalid_sort_order(s: String) -> Self {
        TicketDeskError::InvalidSortOrder(s)
    }

    /// Whether this error is something the agent should see and act on.
    ///
    /// Everything else is absorbed (and logged) by the console.
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            TicketDeskError::FilterLimitExceeded { .. }
                | TicketDeskError::Fetch(_)
                | TicketDeskError::Commit(_)
                | TicketDeskError::FieldNotClearable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TicketDeskError>;
