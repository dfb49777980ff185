use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// 貼り付けられた FEN を受け付けられない理由。
#[derive(Debug, Error)]
pub enum FenError {
    #[error("invalid FEN: {0}")]
    Syntax(String),
    #[error("illegal position: {0}")]
    Position(String),
}

/// 定跡ファイルの読み込みエラー。定跡が引けないだけなので呼び出し側はログに留める。
#[derive(Debug, Error)]
pub enum BookError {
    #[error("failed to read opening book {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("opening book {path} is truncated ({len} bytes is not a multiple of 16)")]
    Truncated { path: PathBuf, len: usize },
}
