use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriadError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Transport error: {0}")]
    TransportError(#[from] reqwest::Error),

    #[error("Remote endpoint returned HTTP {status}")]
    HttpStatusError { status: u16 },

    #[error("XML-RPC protocol error: {message}")]
    ProtocolError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Remote call failed: {message}")]
    RemoteError { message: String },
}

impl From<quick_xml::Error> for TriadError {
    fn from(e: quick_xml::Error) -> Self {
        TriadError::ProtocolError {
            message: format!("malformed XML: {}", e),
        }
    }
}

pub type Result<T> = std::result::Result<T, TriadError>;

impl TriadError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        TriadError::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        TriadError::ProtocolError {
            message: message.into(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            TriadError::InvalidArgument { message } => format!("Invalid input: {}", message),
            TriadError::InvalidConfigValueError { .. }
            | TriadError::TomlError(_) => format!("Configuration problem: {}", self),
            TriadError::TransportError(_) | TriadError::HttpStatusError { .. } => {
                format!("Could not reach the remote endpoint: {}", self)
            }
            TriadError::ProtocolError { .. } | TriadError::RemoteError { .. } => {
                format!("The remote endpoint answered unexpectedly: {}", self)
            }
            TriadError::IoError(e) => format!("File access failed: {}", e),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            TriadError::InvalidArgument { .. } => "Enter a whole number >= 0",
            TriadError::InvalidConfigValueError { .. }
            | TriadError::TomlError(_) => "Check the configuration file and command line flags",
            TriadError::TransportError(_) | TriadError::HttpStatusError { .. } => {
                "Make sure the receiver is running and the endpoint URL is correct"
            }
            TriadError::ProtocolError { .. } | TriadError::RemoteError { .. } => {
                "Verify that the endpoint speaks XML-RPC and exposes the configured method"
            }
            TriadError::IoError(_) => "Check that the path exists and is readable",
        }
    }
}
