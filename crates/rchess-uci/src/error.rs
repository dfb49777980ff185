use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// UCI エンジンとの入出力で起こり得るエラー。
///
/// 探索タスクはこれらをすべて `bestmove None` に畳み込むため、
/// 呼び出し側に生のまま届くのは `EngineProcess` を直接使う場合のみ。
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to spawn engine at {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{label}: engine has no {pipe} pipe")]
    MissingPipe { label: String, pipe: &'static str },

    #[error("{label}: failed to write to engine: {source}")]
    Write {
        label: String,
        #[source]
        source: io::Error,
    },

    #[error("{label}: engine read timeout while waiting for {waiting_for}")]
    Timeout {
        label: String,
        waiting_for: &'static str,
    },

    #[error("{label}: engine exited unexpectedly")]
    Terminated { label: String },

    #[error("failed to start search thread: {0}")]
    Thread(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
