use secrecy::{ExposeSecret, SecretString};

/// HTTP Basic credentials for the WiGLE API.
///
/// WiGLE issues an "API name" / "API token" pair per account; both go
/// into the `Authorization: Basic` header on every request.
#[derive(Debug, Clone)]
pub struct Credentials {
    name: String,
    token: SecretString,
}

impl Credentials {
    pub fn new(name: impl Into<String>, token: SecretString) -> Self {
        Self {
            name: name.into(),
            token,
        }
    }

    /// The API name (user part of the Basic pair).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply the Basic auth header to a request builder.
    pub(crate) fn apply(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.basic_auth(&self.name, Some(self.token.expose_secret()))
    }
}
