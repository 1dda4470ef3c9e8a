//! Blocking HTTP plumbing shared by remote model backends.

mod remote_generator;

pub use remote_generator::RemoteGenerator;

use std::time::Duration;

use serde::Deserialize;

/// Error body returned by text-generation servers.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_type: Option<String>,
}

pub fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

/// Readable description of a failed request, including the server's error body when it has one.
pub fn describe_http_error(error: ureq::Error) -> String {
    match error {
        ureq::Error::Status(code, response) => {
            if let Ok(err_response) = response.into_json::<ErrorResponse>() {
                match err_response.error_type {
                    Some(kind) => format!("HTTP {code} - {kind}: {}", err_response.error),
                    None => format!("HTTP {code}: {}", err_response.error),
                }
            } else {
                format!("HTTP error: {code}")
            }
        }
        ureq::Error::Transport(transport) => format!("transport error: {transport}"),
    }
}
