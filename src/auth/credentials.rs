//! Credential model: static API key or OAuth client-credentials pair.

// self
use crate::{_prelude::*, auth::Secret, error::ConfigError};

/// Authentication mode implied by a [`Credentials`] value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialMode {
	/// Long-lived key sent as the `apiKey` query parameter.
	StaticKey,
	/// Short-lived bearer token obtained via the client-credentials grant.
	#[serde(rename = "oauth")]
	OAuth,
}
impl CredentialMode {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::StaticKey => "static_key",
			Self::OAuth => "oauth",
		}
	}
}
impl Display for CredentialMode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Validated static API key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiKey(Secret);
impl ApiKey {
	/// Key value. Callers must avoid logging it.
	pub fn value(&self) -> &Secret {
		&self.0
	}
}

/// Validated OAuth access key id + secret pair.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
	id: String,
	secret: Secret,
}
impl ClientCredentials {
	/// Access key id sent as `client_id`.
	pub fn id(&self) -> &str {
		&self.id
	}

	/// Access key secret sent as `client_secret`.
	pub fn secret(&self) -> &Secret {
		&self.secret
	}
}
impl Debug for ClientCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCredentials")
			.field("id", &self.id)
			.field("secret", &self.secret)
			.finish()
	}
}

/// Credentials fixed at provider construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
	/// Static API key mode.
	StaticKey(ApiKey),
	/// OAuth client-credentials mode.
	OAuthClientCredentials(ClientCredentials),
}
impl Credentials {
	/// Builds static-key credentials, rejecting blank keys.
	pub fn static_key(value: impl Into<String>) -> Result<Self, ConfigError> {
		let secret = Secret::new(value);

		if secret.is_blank() {
			return Err(ConfigError::EmptyCredential { field: "api_key" });
		}

		Ok(Self::StaticKey(ApiKey(secret)))
	}

	/// Builds OAuth client-credentials, rejecting a blank id or secret.
	pub fn oauth_client_credentials(
		id: impl Into<String>,
		secret: impl Into<String>,
	) -> Result<Self, ConfigError> {
		let id = id.into();
		let secret = Secret::new(secret);

		if id.trim().is_empty() {
			return Err(ConfigError::EmptyCredential { field: "access_key_id" });
		}
		if secret.is_blank() {
			return Err(ConfigError::EmptyCredential { field: "access_key_secret" });
		}

		Ok(Self::OAuthClientCredentials(ClientCredentials { id, secret }))
	}

	/// Mode implied by the variant.
	pub fn mode(&self) -> CredentialMode {
		match self {
			Self::StaticKey(_) => CredentialMode::StaticKey,
			Self::OAuthClientCredentials(_) => CredentialMode::OAuth,
		}
	}
}
