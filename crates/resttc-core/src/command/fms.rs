// File service download

use std::path::PathBuf;

use super::{CommandKind, Reply, Request, TcCommand};
use crate::error::CoreError;

/// Fetch a file from the file service and write it to `destination`.
///
/// `source` is resolved against the file service root, so both absolute
/// links and server-relative paths work.
#[derive(Debug, Clone)]
pub struct DownloadFile {
    source: String,
    destination: PathBuf,
}

impl DownloadFile {
    pub fn new(source: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

impl TcCommand for DownloadFile {
    const KIND: CommandKind = CommandKind::DownloadFile;
    type Output = PathBuf;

    fn request(&self) -> Result<Request, CoreError> {
        Ok(Request::Download(self.source.clone()))
    }

    /// Write the payload; returns the path written.
    async fn decode(&self, reply: Reply) -> Result<PathBuf, CoreError> {
        let bytes = reply.into_bytes(Self::KIND)?;
        if let Some(parent) = self.destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| CoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&self.destination, bytes)
            .await
            .map_err(|source| CoreError::Io {
                path: self.destination.clone(),
                source,
            })?;
        Ok(self.destination.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn payload_is_written_under_new_folder() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("specimages/REQ_A/REQ_A_1.png");
        let cmd = DownloadFile::new("/fms/fmsdownload/x.png", dest.clone());

        let written = cmd.decode(Reply::Bytes(vec![1, 2, 3])).await.unwrap();
        assert_eq!(written, dest);
        assert_eq!(std::fs::read(&dest).unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn json_reply_is_rejected() {
        let cmd = DownloadFile::new("x", "/tmp/never");
        let err = cmd
            .decode(Reply::Json(serde_json::json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Decode { command: CommandKind::DownloadFile, .. }));
    }
}
