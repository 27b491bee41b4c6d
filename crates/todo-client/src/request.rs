//! Outbound request descriptors.

use std::time::Duration;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde::Serialize;

use crate::error::{Error, Result};

/// Basic-auth credential pair. Takes precedence over token auth.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Per-call options for the generic request helpers.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Never attach or refresh a token for this call.
    pub skip_auth: bool,
    /// Explicit basic-auth credentials.
    pub basic_auth: Option<BasicAuth>,
    /// Override the client's default timeout.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Options for a call that goes out without credentials.
    pub fn anonymous() -> Self {
        Self {
            skip_auth: true,
            ..Default::default()
        }
    }

    /// Options for a call authenticated with basic auth.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            basic_auth: Some(BasicAuth::new(username, password)),
            ..Default::default()
        }
    }
}

/// A file to send as one part of a multipart body.
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Guessed from `file_name` when unset.
    pub mime_type: Option<String>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// The explicit MIME type, else one guessed from the file name.
    pub fn content_type(&self) -> String {
        match &self.mime_type {
            Some(mime) => mime.clone(),
            None => mime_guess::from_path(&self.file_name)
                .first_or_octet_stream()
                .to_string(),
        }
    }
}

impl std::fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileUpload")
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// One field of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    Text { name: String, value: String },
    File { name: String, file: FileUpload },
}

/// Request body, kept in owned form so a replay can rebuild it.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(serde_json::Value),
    Multipart(Vec<FormPart>),
}

/// Build the reqwest form for one attempt.
pub(crate) fn build_form(parts: &[FormPart]) -> Result<Form> {
    let mut form = Form::new();
    for part in parts {
        form = match part {
            FormPart::Text { name, value } => form.text(name.clone(), value.clone()),
            FormPart::File { name, file } => {
                let body = Part::bytes(file.bytes.clone())
                    .file_name(file.file_name.clone())
                    .mime_str(&file.content_type())
                    .map_err(|e| Error::InvalidRequest(format!("Invalid MIME type: {}", e)))?;
                form.part(name.clone(), body)
            }
        };
    }
    Ok(form)
}

/// A request as it travels through the client pipeline.
///
/// Each descriptor is owned by exactly one caller. Replays after a refresh
/// clone or move the caller's own descriptor, never a shared one.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    /// Path relative to the API prefix, e.g. `todos/3`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
    pub basic_auth: Option<BasicAuth>,
    pub timeout: Option<Duration>,
    /// Never attach or refresh a token for this request.
    pub skip_auth: bool,
    /// Already replayed once after a refresh.
    pub retried: bool,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            basic_auth: None,
            timeout: None,
            skip_auth: false,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(RequestBody::Json(serde_json::to_value(body)?));
        Ok(self)
    }

    /// Attach a multipart form body.
    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = Some(RequestBody::Multipart(parts));
        self
    }

    /// Attach query parameters from a serializable struct.
    ///
    /// The value must serialize to a flat object; `None` fields are skipped
    /// and sequences repeat the key.
    pub fn query<Q: Serialize + ?Sized>(mut self, query: &Q) -> Result<Self> {
        let value = serde_json::to_value(query)?;
        let serde_json::Value::Object(map) = value else {
            return Err(Error::InvalidRequest(
                "query parameters must serialize to an object".to_string(),
            ));
        };

        for (key, value) in map {
            match value {
                serde_json::Value::Null => {}
                serde_json::Value::Array(items) => {
                    for item in items {
                        self.query.push((key.clone(), scalar_to_string(&key, item)?));
                    }
                }
                other => self.query.push((key.clone(), scalar_to_string(&key, other)?)),
            }
        }
        Ok(self)
    }

    /// Apply per-call options.
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.skip_auth = options.skip_auth;
        self.basic_auth = options.basic_auth;
        if options.timeout.is_some() {
            self.timeout = options.timeout;
        }
        self
    }

    /// Mark the request as anonymous.
    pub fn skip_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }

    /// Set an explicit bearer token, replacing any existing auth header.
    pub fn set_bearer(&mut self, token: &str) {
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(value) => {
                self.headers.insert(AUTHORIZATION, value);
            }
            Err(_) => {
                tracing::warn!(path = %self.path, "Refusing to attach malformed bearer token");
                self.headers.remove(AUTHORIZATION);
            }
        }
    }

    /// Whether an auth header is already present.
    pub fn has_authorization(&self) -> bool {
        self.headers.contains_key(AUTHORIZATION)
    }
}

fn scalar_to_string(key: &str, value: serde_json::Value) -> Result<String> {
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        _ => Err(Error::InvalidRequest(format!(
            "query parameter '{}' must be a scalar",
            key
        ))),
    }
}
