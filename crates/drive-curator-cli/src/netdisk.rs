//! Thin blocking HTTP client for the netdisk provider. All decision logic
//! lives in the core; this wrapper only shuttles requests and maps the
//! provider's errno values onto the typed remote errors the executor
//! understands.

use std::env;

use drive_curator_core::remote::{MoveRequest, RemoteEntry, RemoteError, RemoteFs};
use serde_json::Value;

const BASE_URL: &str = "https://pan.baidu.com/rest/2.0/xpan";

/// Provider errno for "already exists" from the create endpoint.
const ERRNO_CREATE_EXISTS: i64 = -8;
/// Provider errno for "already exists" from the file manager.
const ERRNO_EXISTS: i64 = 31061;
/// Provider errno for "no such file or directory".
const ERRNO_NOT_FOUND: i64 = 31066;

pub struct NetdiskClient {
    http: reqwest::blocking::Client,
    access_token: String,
}

impl NetdiskClient {
    pub fn new(access_token: String) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            access_token,
        }
    }

    /// Token comes from the environment (`.env` is loaded at startup); the
    /// OAuth dance that produces it is outside this binary.
    pub fn from_env() -> Result<Self, RemoteError> {
        let token = env::var("NETDISK_ACCESS_TOKEN")
            .map_err(|_| RemoteError::Transport("NETDISK_ACCESS_TOKEN is not set".to_string()))?;
        Ok(Self::new(token))
    }

    fn file_manager(&self, opera: &str, filelist: &Value) -> Result<(), RemoteError> {
        let form = [
            ("async", "0".to_string()),
            ("filelist", filelist.to_string()),
            ("ondup", "fail".to_string()),
        ];
        let response = self
            .http
            .post(format!("{}/file", BASE_URL))
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("method", "filemanager"),
                ("opera", opera),
            ])
            .form(&form)
            .send()
            .map_err(transport)?;
        let payload: Value = response.json().map_err(transport)?;
        check_errno(&payload, opera)
    }
}

fn transport(err: reqwest::Error) -> RemoteError {
    RemoteError::Transport(err.to_string())
}

fn check_errno(payload: &Value, context: &str) -> Result<(), RemoteError> {
    let errno = payload.get("errno").and_then(Value::as_i64).unwrap_or(0);
    match errno {
        0 => Ok(()),
        ERRNO_EXISTS | ERRNO_CREATE_EXISTS => Err(RemoteError::AlreadyExists(context.to_string())),
        ERRNO_NOT_FOUND => Err(RemoteError::NotFound(context.to_string())),
        code => Err(RemoteError::Api {
            code,
            message: format!("{} failed", context),
        }),
    }
}

impl RemoteFs for NetdiskClient {
    fn list_directory(&self, path: &str) -> Result<Vec<RemoteEntry>, RemoteError> {
        let response = self
            .http
            .get(format!("{}/file", BASE_URL))
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("method", "list"),
                ("dir", path),
                ("web", "web"),
            ])
            .send()
            .map_err(transport)?;
        let payload: Value = response.json().map_err(transport)?;
        check_errno(&payload, path)?;

        let entries = payload
            .get("list")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(entries
            .iter()
            .map(|entry| RemoteEntry {
                fsid: entry.get("fs_id").and_then(Value::as_i64).unwrap_or(0),
                path: entry
                    .get("path")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                size: entry.get("size").and_then(Value::as_i64).unwrap_or(0),
                is_dir: entry.get("isdir").and_then(Value::as_i64).unwrap_or(0) == 1,
                content_hash: entry
                    .get("md5")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                server_mtime: entry
                    .get("server_mtime")
                    .and_then(Value::as_i64)
                    .unwrap_or(0),
            })
            .collect())
    }

    fn create_directory(&self, path: &str) -> Result<(), RemoteError> {
        let form = [("path", path), ("size", "0"), ("isdir", "1")];
        let response = self
            .http
            .post(format!("{}/file", BASE_URL))
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("method", "create"),
            ])
            .form(&form)
            .send()
            .map_err(transport)?;
        let payload: Value = response.json().map_err(transport)?;
        check_errno(&payload, path)
    }

    fn move_or_rename(&self, requests: &[MoveRequest]) -> Result<(), RemoteError> {
        let filelist =
            serde_json::to_value(requests).map_err(|e| RemoteError::Transport(e.to_string()))?;
        self.file_manager("move", &filelist)
    }

    fn delete_batch(&self, paths: &[String]) -> Result<(), RemoteError> {
        let filelist =
            serde_json::to_value(paths).map_err(|e| RemoteError::Transport(e.to_string()))?;
        self.file_manager("delete", &filelist)
    }
}
