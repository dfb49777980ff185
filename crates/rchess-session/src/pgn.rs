use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use shakmaty::Color;

use crate::clock::format_clock;
use crate::record::{MoveRecord, MoveSource};

const LINE_WIDTH: usize = 80;

/// PGN のタグ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameHeaders {
    pub event: String,
    pub site: String,
    pub date: String,
    pub round: String,
    pub white: String,
    pub black: String,
    pub result: String,
    pub white_time_control: Option<String>,
    pub black_time_control: Option<String>,
    pub termination: Option<String>,
    /// 貼り付けた局面から始めたときだけ入る。
    pub fen: Option<String>,
}

impl GameHeaders {
    pub fn new(event: &str, site: &str, white: &str, black: &str) -> Self {
        Self {
            event: event.to_string(),
            site: site.to_string(),
            date: chrono::Local::now().format("%Y.%m.%d").to_string(),
            round: "-".to_string(),
            white: white.to_string(),
            black: black.to_string(),
            result: "*".to_string(),
            white_time_control: None,
            black_time_control: None,
            termination: None,
            fen: None,
        }
    }

    fn tags(&self) -> Vec<(&'static str, &str)> {
        let mut tags = vec![
            ("Event", self.event.as_str()),
            ("Site", self.site.as_str()),
            ("Date", self.date.as_str()),
            ("Round", self.round.as_str()),
            ("White", self.white.as_str()),
            ("Black", self.black.as_str()),
            ("Result", self.result.as_str()),
        ];
        if let Some(tc) = &self.white_time_control {
            tags.push(("WhiteTimeControl", tc.as_str()));
        }
        if let Some(tc) = &self.black_time_control {
            tags.push(("BlackTimeControl", tc.as_str()));
        }
        if let Some(t) = &self.termination {
            tags.push(("Termination", t.as_str()));
        }
        if let Some(fen) = &self.fen {
            tags.push(("SetUp", "1"));
            tags.push(("FEN", fen.as_str()));
        }
        tags
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// 1 局分の PGN テキスト。各手に `[%clk]` コメント、定跡手には `book` を付ける。
pub fn render_pgn(headers: &GameHeaders, record: &MoveRecord) -> String {
    let mut out = String::new();
    for (name, value) in headers.tags() {
        out.push_str(&format!("[{name} \"{}\"]\n", escape(value)));
    }
    out.push('\n');

    let mut tokens = Vec::with_capacity(record.len() * 3 + 1);
    for (number, entry) in record.numbered() {
        // コメントの直後なので黒の手にも手数を付け直す
        match entry.side {
            Color::White => tokens.push(format!("{number}.")),
            Color::Black => tokens.push(format!("{number}...")),
        }
        tokens.push(entry.san.clone());
        let mut comment = format!("[%clk {}]", format_clock(entry.clock_after_ms));
        if entry.source == MoveSource::Book {
            comment.push_str(" book");
        }
        tokens.push(format!("{{{comment}}}"));
    }
    tokens.push(headers.result.clone());

    let mut line = String::new();
    for token in tokens {
        if !line.is_empty() && line.len() + 1 + token.len() > LINE_WIDTH {
            out.push_str(&line);
            out.push('\n');
            line.clear();
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&token);
    }
    out.push_str(&line);
    out.push('\n');
    out
}

/// 終局・中断した対局の保存先。
pub trait GameSink: Send {
    fn save(&mut self, headers: &GameHeaders, record: &MoveRecord) -> Result<()>;
}

/// PGN ファイルに 1 局ずつ追記する。
#[derive(Debug, Clone)]
pub struct PgnFile {
    path: PathBuf,
}

impl PgnFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GameSink for PgnFile {
    fn save(&mut self, headers: &GameHeaders, record: &MoveRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        writeln!(file, "{}", render_pgn(headers, record))
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        log::info!("game saved to {}", self.path.display());
        Ok(())
    }
}
