//! Errors - エラー型と分類

use thiserror::Error;

use crate::ports::{DirectoryError, MailError, QueueError};

/// ErrorKind は実行エラーの運用分類
///
/// - Transient: 一時的なエラー（次の機会に自然回復しうる）
/// - Permanent: 恒久的なエラー（同じ入力では何度やっても失敗）
/// - Infrastructure: インフラエラー（Redis / Postgres の障害）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Permanent,
    Infrastructure,
}

#[derive(Debug, Error)]
#[error("event codec: {0}")]
pub struct CodecError(#[from] serde_json::Error);

/// Umbrella error for the pipeline.
///
/// Nothing here ever reaches an HTTP caller; the worker logs it and moves on.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Mail(#[from] MailError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl NotifyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NotifyError::Queue(_) | NotifyError::Directory(_) => ErrorKind::Infrastructure,
            NotifyError::Mail(_) => ErrorKind::Transient,
            NotifyError::Codec(_) => ErrorKind::Permanent,
        }
    }
}
