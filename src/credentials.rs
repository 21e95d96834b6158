use super::error::{
    CredentialsFileSnafu, DecodeSnafu, HttpSnafu, MetadataSnafu, Result, TokenSnafu,
};
use goauth::auth::JwtClaims;
use goauth::credentials::Credentials;
use goauth::scopes::Scope;
use reqwest::blocking::Client;
use smpl_jwt::Jwt;
use snafu::ResultExt;
use std::fmt;
use std::path::{Path, PathBuf};

pub const GOOGLE_APPLICATION_CREDENTIALS_KEY: &'static str = "GOOGLE_APPLICATION_CREDENTIALS";

const METADATA_TOKEN_URL: &'static str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// An OAuth2 bearer token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new<S: Into<String>>(token: S) -> AccessToken {
        AccessToken(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Anything that can hand out a token for the Cloud SQL Admin API
pub trait TokenProvider {
    fn access_token(&self) -> Result<AccessToken>;

    /// Human readable origin of the tokens, for logs
    fn describe(&self) -> String;
}

/// A token handed to us up front
#[derive(Debug, Clone)]
pub struct StaticToken(AccessToken);

impl StaticToken {
    pub fn new<S: Into<String>>(token: S) -> StaticToken {
        StaticToken(AccessToken::new(token))
    }
}

impl TokenProvider for StaticToken {
    fn access_token(&self) -> Result<AccessToken> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        String::from("explicit access token")
    }
}

/// Service account key file, exchanged for a token through the
/// JWT bearer grant
pub struct ServiceAccount {
    path: PathBuf,
    credentials: Credentials,
}

impl ServiceAccount {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<ServiceAccount> {
        let path = path.as_ref().to_path_buf();
        let credentials = match Credentials::from_file(&*path.to_string_lossy()) {
            Ok(credentials) => credentials,
            Err(e) => {
                return CredentialsFileSnafu {
                    path,
                    reason: format!("{:?}", e),
                }
                .fail()
            }
        };
        Ok(ServiceAccount { path, credentials })
    }
}

impl TokenProvider for ServiceAccount {
    fn access_token(&self) -> Result<AccessToken> {
        let claims = JwtClaims::new(
            self.credentials.iss(),
            &Scope::CloudPlatform,
            self.credentials.token_uri(),
            None,
            None,
        );
        let rsa_key = match self.credentials.rsa_key() {
            Ok(rsa_key) => rsa_key,
            Err(e) => {
                return CredentialsFileSnafu {
                    path: self.path.clone(),
                    reason: format!("Failed to get RSA private key: {:?}", e),
                }
                .fail()
            }
        };
        let jwt = Jwt::new(claims, rsa_key, None);
        // cool, we have a signed assertion; trade it in
        match goauth::get_token_blocking(&jwt, &self.credentials) {
            Ok(token) => Ok(AccessToken::new(token.access_token())),
            Err(e) => TokenSnafu {
                reason: format!("{:?}", e),
            }
            .fail(),
        }
    }

    fn describe(&self) -> String {
        format!("service account key {}", self.path.display())
    }
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// The metadata server available to Cloud Functions, Cloud Run and GCE
#[derive(Debug, Clone)]
pub struct MetadataServer {
    client: Client,
    token_url: String,
}

impl Default for MetadataServer {
    fn default() -> Self {
        MetadataServer::with_token_url(METADATA_TOKEN_URL)
    }
}

impl MetadataServer {
    pub fn new() -> MetadataServer {
        MetadataServer::default()
    }

    pub fn with_token_url<S: Into<String>>(token_url: S) -> MetadataServer {
        MetadataServer {
            client: Client::new(),
            token_url: token_url.into(),
        }
    }
}

impl TokenProvider for MetadataServer {
    fn access_token(&self) -> Result<AccessToken> {
        let url = &*self.token_url;
        let response = self
            .client
            .get(url)
            .header("Metadata-Flavor", "Google")
            .send()
            .context(HttpSnafu { url })?;
        let status = response.status();
        let body = response.text().context(HttpSnafu { url })?;
        if !status.is_success() {
            return MetadataSnafu {
                status: status.as_u16(),
                body,
            }
            .fail();
        }
        let token: MetadataToken = serde_json::from_str(&body).context(DecodeSnafu)?;
        Ok(AccessToken::new(token.access_token))
    }

    fn describe(&self) -> String {
        format!("metadata server {}", self.token_url)
    }
}

/// Application default credentials: a key file named by
/// `GOOGLE_APPLICATION_CREDENTIALS` wins, otherwise the metadata server.
pub fn default_provider<F>(lookup: F) -> Result<Box<dyn TokenProvider>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(GOOGLE_APPLICATION_CREDENTIALS_KEY).filter(|path| !path.trim().is_empty()) {
        Some(path) => Ok(Box::new(ServiceAccount::from_file(path)?)),
        None => Ok(Box::new(MetadataServer::new())),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;
    use crate::http_double::serve;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    const TOKEN_PATH: &'static str = "/computeMetadata/v1/instance/service-accounts/default/token";

    #[test]
    fn debug_hides_secret() {
        let token = AccessToken::new("ya29.very-secret");
        assert_eq!(format!("{:?}", token), "AccessToken(<redacted>)");
        assert_eq!(token.secret(), "ya29.very-secret");
    }

    #[test]
    fn static_token_is_returned_as_is() {
        let provider = StaticToken::new("ya29.token");
        assert_eq!(provider.access_token().unwrap().secret(), "ya29.token");
    }

    #[test]
    fn default_falls_back_to_metadata_server() {
        let provider = default_provider(|_| None).unwrap();
        assert!(provider.describe().starts_with("metadata server"));

        let provider = default_provider(|_| Some(String::from(" "))).unwrap();
        assert!(provider.describe().starts_with("metadata server"));
    }

    #[test]
    fn default_with_missing_key_file_fails() {
        let result = default_provider(|key| {
            if key == GOOGLE_APPLICATION_CREDENTIALS_KEY {
                Some(String::from("/nonexistent/sqlbackup/key.json"))
            } else {
                None
            }
        });
        match result {
            Err(Error::CredentialsFile { path, .. }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/sqlbackup/key.json"))
            }
            Err(other) => panic!("unexpected error: {:?}", other),
            Ok(_) => panic!("expected missing key file to fail"),
        }
    }

    #[test]
    fn unreachable_metadata_server_fails() {
        let provider = MetadataServer::with_token_url("http://127.0.0.1:9/token");
        match provider.access_token() {
            Err(Error::Http { url, .. }) => assert_eq!(url, "http://127.0.0.1:9/token"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn metadata_server_sends_flavor_header_and_reads_token() {
        let (_runtime, server) = serve(vec![Mock::given(method("GET"))
            .and(path(TOKEN_PATH))
            .and(header("metadata-flavor", "Google"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.from-metadata",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))]);

        let provider = MetadataServer::with_token_url(format!("{}{}", server.uri(), TOKEN_PATH));
        assert_eq!(provider.access_token().unwrap().secret(), "ya29.from-metadata");
    }

    #[test]
    fn metadata_server_refusal_keeps_status() {
        let (_runtime, server) = serve(vec![Mock::given(method("GET"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_string("no service account"))]);

        let provider = MetadataServer::with_token_url(format!("{}{}", server.uri(), TOKEN_PATH));
        match provider.access_token() {
            Err(Error::Metadata { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "no service account");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
