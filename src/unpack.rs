//! Client for the UnpackMe decryption service.
//!
//! Obfuscated chart files are exchanged for plaintext through a remote
//! service: authenticate, look up the decrypt command, upload the file as a
//! task, poll the task until it completes, download the result. The polling
//! loop has no retry bound; a task that never completes blocks the caller
//! indefinitely, so callers needing responsiveness must impose their own
//! timeout around the exchange.
//!
//! [`cache::CachedDecryptor`] wraps this client behind the
//! [`crate::chart::Decryptor`] contract with a local content-addressed cache,
//! so each distinct encrypted buffer hits the network at most once.

pub mod cache;

use std::time::Duration;

use serde::Deserialize;

use crate::chart::DecryptError;

/// Interval between task-status polls.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Task status value marking a finished decryption.
const STATUS_COMPLETED: &str = "completed";

/// Connection settings for the UnpackMe service.
#[derive(Debug, Clone)]
pub struct UnpackAuth {
    /// Service base URL.
    pub url: String,
    /// Account login.
    pub login: String,
    /// Account password.
    pub password: String,
}

impl Default for UnpackAuth {
    fn default() -> Self {
        Self {
            url: "http://api.unpackme.shadosoft-tm.com".into(),
            login: "djmaxeditor".into(),
            password: "djmaxeditor".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    token: String,
}

/// One command the service offers to authenticated clients.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandEntry {
    /// Identifier used to create tasks.
    #[serde(rename = "commandId")]
    pub command_id: u64,
    /// Human-readable title, e.g. `DJMax *.pt decrypt`.
    #[serde(rename = "commandTitle")]
    pub command_title: String,
}

#[derive(Debug, Deserialize)]
struct TaskCreated {
    #[serde(rename = "taskId")]
    task_id: u64,
}

#[derive(Debug, Deserialize)]
struct TaskChecked {
    #[serde(rename = "taskStatus")]
    task_status: String,
}

/// Thin HTTP client over the service's wire contract.
pub struct UnpackClient {
    auth: UnpackAuth,
    agent: ureq::Agent,
    token: Option<String>,
}

impl std::fmt::Debug for UnpackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnpackClient")
            .field("auth", &self.auth)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl UnpackClient {
    /// Create a client with the given connection settings.
    #[must_use]
    pub fn new(auth: UnpackAuth) -> Self {
        Self {
            auth,
            agent: ureq::Agent::new_with_defaults(),
            token: None,
        }
    }

    /// Reuse a previously issued token instead of authenticating again.
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// The current session token, if any.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.auth.url.trim_end_matches('/'), path)
    }

    fn require_token(&self) -> Result<&str, DecryptError> {
        self.token
            .as_deref()
            .ok_or_else(|| DecryptError::Auth("not authenticated".into()))
    }

    /// Authenticate and store the issued token.
    ///
    /// # Errors
    ///
    /// [`DecryptError::Auth`] when the service rejects the credentials or
    /// returns an unusable body.
    pub fn authenticate(&mut self) -> Result<String, DecryptError> {
        let body: TokenBody = self
            .agent
            .post(self.endpoint("auth"))
            .send_form([
                ("login", self.auth.login.as_str()),
                ("password", self.auth.password.as_str()),
            ])
            .map_err(|err| DecryptError::Auth(err.to_string()))?
            .body_mut()
            .read_json()
            .map_err(|err| DecryptError::Auth(err.to_string()))?;
        log::debug!("authenticated against {}", self.auth.url);
        self.token = Some(body.token.clone());
        Ok(body.token)
    }

    /// List the commands available to this account.
    ///
    /// # Errors
    ///
    /// [`DecryptError::Service`] on transport or decoding failure.
    pub fn available_commands(&self) -> Result<Vec<CommandEntry>, DecryptError> {
        let token = self.require_token()?;
        self.agent
            .get(self.endpoint("command/available"))
            .header("Token", token)
            .call()
            .map_err(|err| DecryptError::Service(err.to_string()))?
            .body_mut()
            .read_json()
            .map_err(|err| DecryptError::Service(err.to_string()))
    }

    /// Upload `file` as a new task for `command_id` and return the task id.
    ///
    /// The service expects the upload as a `multipart/form-data` body with a
    /// single `file` field.
    ///
    /// # Errors
    ///
    /// [`DecryptError::Service`] on transport or decoding failure.
    pub fn create_task(&self, command_id: u64, file: &[u8]) -> Result<u64, DecryptError> {
        let token = self.require_token()?;
        let (boundary, body) = multipart_file_body(file);
        let created: TaskCreated = self
            .agent
            .post(self.endpoint(&format!("task/create/{command_id}")))
            .header("Token", token)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .send(&body[..])
            .map_err(|err| DecryptError::Service(err.to_string()))?
            .body_mut()
            .read_json()
            .map_err(|err| DecryptError::Service(err.to_string()))?;
        Ok(created.task_id)
    }

    /// Fetch the status string of a task.
    ///
    /// # Errors
    ///
    /// [`DecryptError::Service`] on transport or decoding failure.
    pub fn task_status(&self, task_id: u64) -> Result<String, DecryptError> {
        let token = self.require_token()?;
        let checked: TaskChecked = self
            .agent
            .get(self.endpoint(&format!("task/{task_id}")))
            .header("Token", token)
            .call()
            .map_err(|err| DecryptError::Service(err.to_string()))?
            .body_mut()
            .read_json()
            .map_err(|err| DecryptError::Service(err.to_string()))?;
        Ok(checked.task_status)
    }

    /// Download the output of a completed task.
    ///
    /// # Errors
    ///
    /// [`DecryptError::Service`] on transport failure.
    pub fn download_task(&self, task_id: u64) -> Result<Vec<u8>, DecryptError> {
        let token = self.require_token()?;
        self.agent
            .get(self.endpoint(&format!("task/{task_id}/download")))
            .header("Token", token)
            .call()
            .map_err(|err| DecryptError::Service(err.to_string()))?
            .body_mut()
            .read_to_vec()
            .map_err(|err| DecryptError::Service(err.to_string()))
    }

    /// Run one full exchange: create a task, poll it to completion at a
    /// fixed 500ms interval, download the result.
    ///
    /// Polls without bound; a stuck task blocks forever.
    ///
    /// # Errors
    ///
    /// [`DecryptError::Service`] on any failed request.
    pub fn exchange(&self, command_id: u64, file: &[u8]) -> Result<Vec<u8>, DecryptError> {
        let task_id = self.create_task(command_id, file)?;
        loop {
            let status = self.task_status(task_id)?;
            if status == STATUS_COMPLETED {
                break;
            }
            log::trace!("task {task_id} still {status}, polling again");
            std::thread::sleep(POLL_INTERVAL);
        }
        self.download_task(task_id)
    }
}

/// Wrap `file` into a `multipart/form-data` body with one `file` field.
///
/// The boundary is derived from the content's digest so it cannot occur
/// inside the payload.
fn multipart_file_body(file: &[u8]) -> (String, Vec<u8>) {
    use sha2::{Digest, Sha256};

    let boundary = format!("pt-rs-{}", hex::encode(&Sha256::digest(file)[..16]));
    let mut body = Vec::with_capacity(file.len() + boundary.len() * 2 + 128);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"file\"; filename=\"test\"\r\n");
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(file);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (boundary, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn multipart_body_carries_the_file_field() {
        let payload = b"\x00\x01PTFF\xff";
        let (boundary, body) = multipart_file_body(payload);

        let text = String::from_utf8_lossy(&body);
        assert!(text.starts_with(&format!("--{boundary}\r\n")));
        assert!(text.contains("Content-Disposition: form-data; name=\"file\"; filename=\"test\""));
        assert!(text.ends_with(&format!("\r\n--{boundary}--\r\n")));

        let header_end = body
            .windows(4)
            .position(|window| window == b"\r\n\r\n")
            .unwrap()
            + 4;
        let payload_end = body.len() - (boundary.len() + 8);
        assert_eq!(&body[header_end..payload_end], payload);
    }

    #[test]
    fn multipart_boundary_tracks_the_content() {
        let (a, _) = multipart_file_body(b"one");
        let (b, _) = multipart_file_body(b"two");
        assert_ne!(a, b);
    }
}
