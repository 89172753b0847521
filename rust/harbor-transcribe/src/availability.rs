use std::fmt::Debug;

/// The client id that ships in default configuration; it means "not set"
pub const PLACEHOLDER_CLIENT_ID: &str = "dummy-id";

/// The client secret that ships in default configuration
pub const PLACEHOLDER_CLIENT_SECRET: &str = "dummy-secret";

/// The bucket name that ships in default configuration
pub const PLACEHOLDER_BUCKET: &str = "dummy-bucket";

/// The identity, secret and destination namespace a [crate::Transcriber]
/// operates with. Immutable once handed to a [crate::Transcriber].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// The object store namespace that job inputs and outputs live in
    pub bucket: Option<String>,
}

impl Credentials {
    pub fn new<I, S, B>(client_id: I, client_secret: S, bucket: B) -> Self
    where
        I: Into<String>,
        S: Into<String>,
        B: Into<String>,
    {
        Credentials {
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            bucket: Some(bucket.into()),
        }
    }

    pub fn is_available(&self) -> bool {
        is_available(self)
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("bucket", &self.bucket)
            .finish()
    }
}

/// Whether `credentials` are complete enough to use: the client id, client
/// secret and bucket must all be set, and none may still be its placeholder.
/// Partial configuration counts as unavailable.
///
/// This makes no network calls and is recomputed on every call.
pub fn is_available(credentials: &Credentials) -> bool {
    is_configured(&credentials.client_id, PLACEHOLDER_CLIENT_ID)
        && is_configured(&credentials.client_secret, PLACEHOLDER_CLIENT_SECRET)
        && is_configured(&credentials.bucket, PLACEHOLDER_BUCKET)
}

fn is_configured(value: &Option<String>, placeholder: &str) -> bool {
    matches!(value.as_deref(), Some(value) if value != placeholder)
}
