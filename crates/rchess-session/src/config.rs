//! 設定ファイル（TOML）。
//!
//! すべてのセクションは省略でき、省略時は既定値になる。

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use rchess_uci::EngineConfig;
use serde::{Deserialize, Serialize};
use shakmaty::Color;

use crate::book::{BookAdvisor, PolyglotBook};
use crate::clock::TimeControl;
use crate::session::SessionSettings;

pub const MIN_DEPTH: u32 = 1;
/// この値は深さ無制限として扱う。
pub const MAX_DEPTH: u32 = 1000;

/// 深さ指定を 1..=1000 に丸める。1000 は無制限（`None`）。
pub fn clamp_depth(depth: u32) -> Option<u32> {
    let depth = depth.clamp(MIN_DEPTH, MAX_DEPTH);
    if depth == MAX_DEPTH { None } else { Some(depth) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    #[default]
    White,
    Black,
}

impl From<PlayerColor> for Color {
    fn from(c: PlayerColor) -> Self {
        match c {
            PlayerColor::White => Color::White,
            PlayerColor::Black => Color::Black,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PlayerSection {
    pub name: String,
    pub color: PlayerColor,
}

impl Default for PlayerSection {
    fn default() -> Self {
        Self { name: "Human".to_string(), color: PlayerColor::White }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct EngineSection {
    /// `[[engines]]` の中から選ぶ名前。未指定なら先頭。
    pub name: Option<String>,
    /// 1..=1000。1000 か未指定で無制限。
    pub max_depth: Option<u32>,
    pub stream_info: bool,
    pub move_delay_ms: u64,
    /// 人間が黒でも Go を待たずにエンジンに指させる。
    pub auto_go: bool,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self { name: None, max_depth: None, stream_info: true, move_delay_ms: 3000, auto_go: false }
    }
}

/// `[[engines]]` の 1 エントリ。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineEntry {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    /// UCI オプション。文字列・整数・小数・真偽値を受け付ける。
    #[serde(default)]
    pub options: BTreeMap<String, toml::Value>,
}

impl EngineEntry {
    pub fn to_engine_config(&self) -> EngineConfig {
        let mut options = Vec::with_capacity(self.options.len());
        for (name, value) in &self.options {
            let text = match value {
                toml::Value::String(s) => s.clone(),
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                other => {
                    log::warn!(
                        "engine {}: option {name} has unsupported value {other}, skipped",
                        self.name
                    );
                    continue;
                }
            };
            options.push((name.clone(), text));
        }
        EngineConfig {
            name: self.name.clone(),
            path: self.path.clone(),
            args: self.args.clone(),
            working_dir: self.working_dir.clone(),
            options,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TimeSection {
    pub human: TimeControl,
    pub engine: TimeControl,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BookSection {
    pub path: Option<PathBuf>,
    pub enabled: bool,
    pub max_ply: u32,
    pub random: bool,
}

impl Default for BookSection {
    fn default() -> Self {
        Self { path: None, enabled: true, max_ply: 8, random: true }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PgnSection {
    pub path: PathBuf,
    pub event: String,
    pub site: String,
}

impl Default for PgnSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("rchess_games.pgn"),
            event: "Human vs computer".to_string(),
            site: "?".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AppConfig {
    pub player: PlayerSection,
    pub engine: EngineSection,
    pub engines: Vec<EngineEntry>,
    pub time: TimeSection,
    pub book: BookSection,
    pub pgn: PgnSection,
}

impl AppConfig {
    /// ファイルがなければ既定値。壊れていればエラー。
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("config {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read config {}", path.display()));
            }
        };
        let config = Self::from_toml_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(depth) = self.engine.max_depth {
            if !(MIN_DEPTH..=MAX_DEPTH).contains(&depth) {
                bail!("engine.max_depth must be in {MIN_DEPTH}..={MAX_DEPTH}, got {depth}");
            }
        }
        if let Some(name) = &self.engine.name {
            if self.find_engine(name).is_none() {
                bail!("engine.name {name:?} does not match any [[engines]] entry");
            }
        }
        for (i, entry) in self.engines.iter().enumerate() {
            if self.engines[..i].iter().any(|e| e.name == entry.name) {
                bail!("duplicate engine name {:?}", entry.name);
            }
        }
        Ok(())
    }

    pub fn find_engine(&self, name: &str) -> Option<&EngineEntry> {
        self.engines.iter().find(|e| e.name == name)
    }

    pub fn selected_engine(&self) -> Option<&EngineEntry> {
        match &self.engine.name {
            Some(name) => self.find_engine(name),
            None => self.engines.first(),
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            user_name: self.player.name.clone(),
            human_color: self.player.color.into(),
            event: self.pgn.event.clone(),
            site: self.pgn.site.clone(),
            engines: self.engines.iter().map(EngineEntry::to_engine_config).collect(),
            engine: self.selected_engine().map(EngineEntry::to_engine_config),
            max_depth: self.engine.max_depth.and_then(clamp_depth),
            stream_info: self.engine.stream_info,
            move_delay: Duration::from_millis(self.engine.move_delay_ms),
            human_time: self.time.human,
            engine_time: self.time.engine,
            auto_go: self.engine.auto_go,
            book_random: self.book.random,
        }
    }

    /// 定跡が無効か未設定なら `None`。ファイルの有無は問い合わせ時に判定する。
    pub fn book_advisor(&self) -> Option<BookAdvisor> {
        if !self.book.enabled {
            return None;
        }
        let path = self.book.path.as_ref()?;
        Some(BookAdvisor::new(PolyglotBook::new(path), self.book.max_ply))
    }
}
