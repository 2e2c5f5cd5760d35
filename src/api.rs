// API client module: a small blocking HTTP client for the Slack Web API.
// Only `users.setPhoto` is needed, so the client stays synchronous and
// keeps no per-user state; the token travels with each call.

use reqwest::blocking::{multipart, Client};
use serde::Deserialize;

/// Error codes meaning the token itself is unusable. A profile failing
/// with one of these is removed from the credential store.
pub const DEAD_CREDENTIAL_CODES: &[&str] =
    &["invalid_auth", "not_authed", "token_revoked", "missing_scope"];

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Slack returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Slack API error: {code}")]
    Slack { code: String },
}

impl ApiError {
    /// Error code reported by Slack, if the call got that far.
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Slack { code } => Some(code),
            _ => None,
        }
    }

    pub fn is_dead_credential(&self) -> bool {
        self.code()
            .map(|c| DEAD_CREDENTIAL_CODES.contains(&c))
            .unwrap_or(false)
    }
}

/// Human hint for the error codes users can act on.
pub fn describe_code(code: &str) -> Option<&'static str> {
    match code {
        "invalid_auth" | "not_authed" => {
            Some("The token appears to be invalid or expired. Please try again with a new token.")
        }
        "token_revoked" => Some("The token has been revoked. Please generate a new one."),
        "missing_scope" => {
            Some("The token doesn't have the required scope. Make sure it has 'users.profile:write'.")
        }
        _ => None,
    }
}

/// Anything able to set a profile photo for the account behind a token.
pub trait PhotoApi {
    fn set_photo(&self, token: &str, file_name: &str, image: Vec<u8>) -> Result<(), ApiError>;
}

/// Body shape shared by every Slack Web API method.
#[derive(Deserialize, Debug)]
pub struct SlackResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl SlackResponse {
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.ok {
            Ok(())
        } else {
            Err(ApiError::Slack {
                code: self.error.unwrap_or_else(|| "unknown_error".into()),
            })
        }
    }
}

/// Blocking Slack client pointed at a Web API base URL.
#[derive(Clone)]
pub struct SlackClient {
    client: Client,
    base_url: String,
}

impl SlackClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder().build()?;
        Ok(SlackClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }
}

impl PhotoApi for SlackClient {
    /// Upload `image` with `users.setPhoto` as multipart/form-data.
    fn set_photo(&self, token: &str, file_name: &str, image: Vec<u8>) -> Result<(), ApiError> {
        let part = multipart::Part::bytes(image)
            .file_name(file_name.to_string())
            .mime_str("image/png")?;
        let form = multipart::Form::new().part("image", part);

        let res = self
            .client
            .post(self.method_url("users.setPhoto"))
            .bearer_auth(token)
            .multipart(form)
            .send()?;

        let status = res.status();
        let body = res.text().unwrap_or_default();
        match serde_json::from_str::<SlackResponse>(&body) {
            Ok(parsed) => parsed.into_result(),
            Err(_) if !status.is_success() => Err(ApiError::Status {
                status: status.as_u16(),
                body,
            }),
            Err(_) => Err(ApiError::Slack {
                code: "invalid_response".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_response_is_success() {
        let resp: SlackResponse = serde_json::from_str(r#"{"ok":true}"#).unwrap();
        assert!(resp.into_result().is_ok());
    }

    #[test]
    fn error_response_carries_code() {
        let resp: SlackResponse =
            serde_json::from_str(r#"{"ok":false,"error":"token_revoked"}"#).unwrap();
        let err = resp.into_result().unwrap_err();
        assert_eq!(err.code(), Some("token_revoked"));
        assert!(err.is_dead_credential());
    }

    #[test]
    fn missing_code_is_unknown() {
        let resp: SlackResponse = serde_json::from_str(r#"{"ok":false}"#).unwrap();
        let err = resp.into_result().unwrap_err();
        assert_eq!(err.code(), Some("unknown_error"));
        assert!(!err.is_dead_credential());
    }

    #[test]
    fn rate_limit_is_not_a_dead_credential() {
        let err = ApiError::Slack {
            code: "ratelimited".into(),
        };
        assert!(!err.is_dead_credential());
        assert!(describe_code("ratelimited").is_none());
    }

    #[test]
    fn every_dead_code_has_a_hint() {
        for code in DEAD_CREDENTIAL_CODES {
            assert!(describe_code(code).is_some(), "{code}");
        }
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = SlackClient::new("http://localhost:9999/api/").unwrap();
        assert_eq!(
            client.method_url("users.setPhoto"),
            "http://localhost:9999/api/users.setPhoto"
        );
    }
}
