use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use reqwest::blocking::{Body, Client, RequestBuilder, Response};
use reqwest::{header, StatusCode};
use serde::Deserialize;
use serde_json::json;
use syncker_domain::{
    CredentialProvider, ProgressFn, RemoteError, RemoteLister, RemoteObject, RemoteTransfer,
};
use tracing::{debug, trace};
use url::Url;

use crate::config::DriveConfig;

const LIST_FIELDS: &str = "files(id,name,mimeType)";
const UPLOAD_CONTENT_TYPE: &str = "application/octet-stream";
const CHUNK: usize = 64 * 1024;

/// Google Drive v3 over blocking HTTP.
pub struct DriveClient {
    http: Client,
    api_base: String,
    upload_base: String,
    credentials: Box<dyn CredentialProvider>,
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<RemoteObject>,
}

#[derive(Deserialize)]
struct FileId {
    id: String,
}

#[derive(Deserialize)]
struct FileName {
    name: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: String,
}

/// 403 reasons that mean the token, not the request, is at fault.
const AUTH_REASONS: &[&str] = &["authError", "insufficientPermissions", "invalidCredentials"];

impl ErrorBody {
    fn is_auth_failure(&self) -> bool {
        self.errors
            .iter()
            .any(|detail| AUTH_REASONS.contains(&detail.reason.as_str()))
    }
}

impl DriveClient {
    #[must_use]
    pub fn new(http: Client, config: &DriveConfig, credentials: Box<dyn CredentialProvider>) -> Self {
        Self {
            http,
            api_base: config.api_base.clone(),
            upload_base: config.upload_base.clone(),
            credentials,
        }
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, RemoteError> {
        let token = self.credentials.access_token()?;
        Ok(request.bearer_auth(token))
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = self.authorized(request)?.send().map_err(transport)?;
        check(response)
    }

    /// Starts a resumable upload session and returns its upload URL.
    fn open_session(
        &self,
        request: RequestBuilder,
        metadata: &serde_json::Value,
        len: u64,
    ) -> Result<String, RemoteError> {
        let response = self.send(
            request
                .header("X-Upload-Content-Type", UPLOAD_CONTENT_TYPE)
                .header("X-Upload-Content-Length", len.to_string())
                .json(metadata),
        )?;
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| RemoteError::Api {
                status: response.status().as_u16(),
                message: "resumable upload session did not return a Location header".into(),
            })?;
        Ok(location.to_string())
    }

    fn put_content(&self, session: &str, source: &Path, len: u64) -> Result<Response, RemoteError> {
        let file = File::open(source)
            .map_err(|err| RemoteError::Transport(format!("reading {}: {err}", source.display())))?;
        debug!(bytes = len, source = %source.display(), "uploading content");
        self.send(
            self.http
                .put(session)
                .header(header::CONTENT_TYPE, UPLOAD_CONTENT_TYPE)
                .body(Body::sized(file, len)),
        )
    }
}

impl RemoteLister for DriveClient {
    fn list_children(&self, parent_id: &str, name: &str) -> Result<Vec<RemoteObject>, RemoteError> {
        let mut url = endpoint(&self.api_base, &["files"])?;
        url.query_pairs_mut()
            .append_pair("q", &children_query(parent_id, name))
            .append_pair("fields", LIST_FIELDS)
            .append_pair("spaces", "drive");
        trace!(%url, "listing Drive folder");
        let listing: FileList = self.send(self.http.get(url))?.json().map_err(transport)?;
        Ok(listing.files)
    }
}

impl RemoteTransfer for DriveClient {
    fn create(&self, parent_id: &str, name: &str, source: &Path) -> Result<String, RemoteError> {
        let len = content_length(source)?;
        let mut url = endpoint(&self.upload_base, &["files"])?;
        url.query_pairs_mut()
            .append_pair("uploadType", "resumable")
            .append_pair("fields", "id");
        let metadata = json!({ "name": name, "parents": [parent_id] });
        let session = self.open_session(self.http.post(url), &metadata, len)?;
        let created: FileId = self
            .put_content(&session, source, len)?
            .json()
            .map_err(transport)?;
        Ok(created.id)
    }

    fn update(&self, id: &str, source: &Path) -> Result<(), RemoteError> {
        let len = content_length(source)?;
        let mut url = endpoint(&self.upload_base, &["files", id])?;
        url.query_pairs_mut()
            .append_pair("uploadType", "resumable")
            .append_pair("fields", "id");
        let session = self.open_session(self.http.patch(url), &json!({}), len)?;
        self.put_content(&session, source, len)?;
        Ok(())
    }

    fn download(
        &self,
        id: &str,
        sink: &mut dyn Write,
        progress: &mut ProgressFn<'_>,
    ) -> Result<u64, RemoteError> {
        let mut url = endpoint(&self.api_base, &["files", id])?;
        url.query_pairs_mut().append_pair("alt", "media");
        let mut response = self.send(self.http.get(url))?;
        let total = response.content_length();
        let mut written: u64 = 0;
        let mut buffer = vec![0_u8; CHUNK];
        progress(0, total);
        loop {
            let read = response
                .read(&mut buffer)
                .map_err(|err| RemoteError::Transport(format!("stream error for {id}: {err}")))?;
            if read == 0 {
                break;
            }
            sink.write_all(&buffer[..read])
                .map_err(|err| RemoteError::Transport(format!("writing {id}: {err}")))?;
            written += read as u64;
            progress(written, total);
        }
        Ok(written)
    }

    fn copy(&self, id: &str, name: &str) -> Result<String, RemoteError> {
        let mut url = endpoint(&self.api_base, &["files", id, "copy"])?;
        url.query_pairs_mut().append_pair("fields", "id");
        let copied: FileId = self
            .send(self.http.post(url).json(&json!({ "name": name })))?
            .json()
            .map_err(transport)?;
        Ok(copied.id)
    }

    fn name_of(&self, id: &str) -> Result<String, RemoteError> {
        let mut url = endpoint(&self.api_base, &["files", id])?;
        url.query_pairs_mut().append_pair("fields", "name");
        let file: FileName = self.send(self.http.get(url))?.json().map_err(transport)?;
        Ok(file.name)
    }
}

/// Drive query selecting `name` inside `parent_id`, owned by the user and
/// not trashed.
pub(crate) fn children_query(parent_id: &str, name: &str) -> String {
    format!(
        "'me' in owners and trashed = false and '{}' in parents and name = '{}'",
        escape_literal(parent_id),
        escape_literal(name)
    )
}

fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn endpoint(base: &str, segments: &[&str]) -> Result<Url, RemoteError> {
    let mut url = Url::parse(base)
        .map_err(|err| RemoteError::Transport(format!("invalid Drive endpoint {base}: {err}")))?;
    url.path_segments_mut()
        .map_err(|()| RemoteError::Transport(format!("invalid Drive endpoint {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn content_length(source: &Path) -> Result<u64, RemoteError> {
    source
        .metadata()
        .map(|meta| meta.len())
        .map_err(|err| RemoteError::Transport(format!("reading {}: {err}", source.display())))
}

fn transport(err: reqwest::Error) -> RemoteError {
    RemoteError::Transport(err.to_string())
}

fn check(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    let error = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error)
        .unwrap_or_default();
    let auth_failure = status == StatusCode::UNAUTHORIZED
        || (status == StatusCode::FORBIDDEN && error.is_auth_failure());
    let message = Some(error.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    if auth_failure {
        return Err(RemoteError::Authentication(format!(
            "Drive rejected the stored credentials ({message}), run `syncker auth` to reauthenticate"
        )));
    }
    Err(RemoteError::Api {
        status: status.as_u16(),
        message,
    })
}
