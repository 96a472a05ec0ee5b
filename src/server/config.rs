use super::RequestsLoggingLevel;
use crate::spotify::UserDataLimits;

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    /// Browser destination after a successful `/callback`.
    pub frontend_url: String,
    pub user_data_limits: UserDataLimits,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3000,
            frontend_url: "http://localhost:5173".to_string(),
            user_data_limits: UserDataLimits::default(),
        }
    }
}
