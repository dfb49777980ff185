use std::collections::HashSet;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::error::{EngineError, Result};

pub const ENGINE_READY_TIMEOUT: Duration = Duration::from_secs(30);
pub const ENGINE_QUIT_TIMEOUT: Duration = Duration::from_millis(300);
pub const ENGINE_QUIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// GUI 側が管理するため設定ファイルからは送らないオプション（小文字で比較）。
pub const MANAGED_OPTIONS: &[&str] =
    &["ponder", "uci_chess960", "multipv", "uci_analysemode", "ownbook"];

/// エンジンプロセス起動時の設定。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineConfig {
    /// 表示用の名前。ログのラベルにも使う。
    pub name: String,
    pub path: PathBuf,
    pub args: Vec<String>,
    /// 未指定なら実行ファイルのあるディレクトリ。
    pub working_dir: Option<PathBuf>,
    /// `setoption` で送る (Name, Value)。
    pub options: Vec<(String, String)>,
}

impl EngineConfig {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self { name: name.into(), path: path.into(), ..Default::default() }
    }

    fn resolved_working_dir(&self) -> Option<&Path> {
        match &self.working_dir {
            Some(dir) => Some(dir.as_path()),
            None => self.path.parent().filter(|p| !p.as_os_str().is_empty()),
        }
    }

    fn label(&self) -> String {
        if self.name.is_empty() {
            self.path.display().to_string()
        } else {
            self.name.clone()
        }
    }
}

/// 1 本の UCI エンジンに対する入出力をカプセル化する。
pub struct EngineProcess {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    rx: Receiver<String>,
    opt_names: HashSet<String>,
    id_name: Option<String>,
    closed: bool,
    pub label: String,
}

impl EngineProcess {
    /// 起動して `uci` ハンドシェイク、オプション設定、`isready` 同期まで行う。
    pub fn spawn(cfg: &EngineConfig) -> Result<Self> {
        let label = cfg.label();
        let mut cmd = Command::new(&cfg.path);
        cmd.args(&cfg.args).stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::null());
        if let Some(dir) = cfg.resolved_working_dir() {
            cmd.current_dir(dir);
        }
        let mut child = cmd
            .spawn()
            .map_err(|source| EngineError::Spawn { path: cfg.path.clone(), source })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::MissingPipe { label: label.clone(), pipe: "stdin" })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::MissingPipe { label: label.clone(), pipe: "stdout" })?;

        let (tx, rx) = crossbeam_channel::unbounded::<String>();
        let reader = std::thread::Builder::new()
            .name(format!("{label}-stdout"))
            .spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    match line {
                        Ok(l) => {
                            if tx.send(l).is_err() {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }
            });
        if let Err(e) = reader {
            let _ = child.kill();
            let _ = child.wait();
            return Err(EngineError::Thread(e));
        }

        let mut proc = Self {
            child,
            stdin: BufWriter::new(stdin),
            rx,
            opt_names: HashSet::new(),
            id_name: None,
            closed: false,
            label,
        };
        proc.initialize(cfg)?;
        Ok(proc)
    }

    fn initialize(&mut self, cfg: &EngineConfig) -> Result<()> {
        self.write_line("uci")?;
        loop {
            let line = self.recv_line(ENGINE_READY_TIMEOUT, "uciok")?;
            if let Some(rest) = line.strip_prefix("id name ") {
                self.id_name = Some(rest.trim().to_string());
            } else if let Some(rest) = line.strip_prefix("option ") {
                if let Some(name) = parse_option_name(rest) {
                    self.opt_names.insert(name.to_ascii_lowercase());
                }
            } else if line.trim() == "uciok" {
                break;
            }
        }
        for (name, value) in &cfg.options {
            if MANAGED_OPTIONS.contains(&name.to_ascii_lowercase().as_str()) {
                log::debug!("{}: option {name} is managed by the GUI, skipped", self.label);
                continue;
            }
            self.set_option_if_available(name, value)?;
        }
        self.sync_ready()?;
        self.write_line("ucinewgame")?;
        log::info!(
            "{}: ready ({})",
            self.label,
            self.id_name.as_deref().unwrap_or("unknown engine")
        );
        Ok(())
    }

    /// `id name` で名乗った名前。
    pub fn id_name(&self) -> Option<&str> {
        self.id_name.as_deref()
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.opt_names.contains(&name.to_ascii_lowercase())
    }

    /// エンジンが宣言しているオプションだけ送る。未対応は警告して読み飛ばす。
    pub fn set_option_if_available(&mut self, name: &str, value: &str) -> Result<()> {
        if self.has_option(name) {
            self.write_line(&format!("setoption name {name} value {value}"))?;
        } else {
            log::warn!("{}: engine does not support option {name}, skipped", self.label);
        }
        Ok(())
    }

    pub fn sync_ready(&mut self) -> Result<()> {
        self.write_line("isready")?;
        loop {
            let line = self.recv_line(ENGINE_READY_TIMEOUT, "readyok")?;
            if line.trim() == "readyok" {
                break;
            }
        }
        Ok(())
    }

    pub fn recv_line(&self, timeout: Duration, waiting_for: &'static str) -> Result<String> {
        match self.rx.recv_timeout(timeout) {
            Ok(line) => Ok(line),
            Err(RecvTimeoutError::Timeout) => {
                Err(EngineError::Timeout { label: self.label.clone(), waiting_for })
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(EngineError::Terminated { label: self.label.clone() })
            }
        }
    }

    /// タイムアウトなら `Ok(None)`。プロセスが終了していればエラー。
    pub fn poll_line(&self, timeout: Duration) -> Result<Option<String>> {
        match self.rx.recv_timeout(timeout) {
            Ok(line) => Ok(Some(line)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                Err(EngineError::Terminated { label: self.label.clone() })
            }
        }
    }

    pub fn write_line(&mut self, msg: &str) -> Result<()> {
        let label = &self.label;
        let write = |stdin: &mut BufWriter<ChildStdin>| -> std::io::Result<()> {
            stdin.write_all(msg.as_bytes())?;
            stdin.write_all(b"\n")?;
            stdin.flush()
        };
        write(&mut self.stdin).map_err(|source| EngineError::Write { label: label.clone(), source })
    }

    /// `quit` を送り、猶予内に終了しなければ kill する。何度呼んでもよい。
    pub fn quit(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let _ = self.write_line("quit");
        let deadline = Instant::now() + ENGINE_QUIT_TIMEOUT;
        while Instant::now() < deadline {
            if let Ok(Some(_)) = self.child.try_wait() {
                log::debug!("{}: engine exited", self.label);
                return;
            }
            std::thread::sleep(ENGINE_QUIT_POLL_INTERVAL);
        }
        log::debug!("{}: engine did not exit in time, killing", self.label);
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        self.quit();
    }
}

/// `option name <Name...> type ...` からオプション名を取り出す。
pub fn parse_option_name(line: &str) -> Option<String> {
    let mut tokens = line.split_whitespace().peekable();
    while let Some(tok) = tokens.next() {
        if tok == "name" {
            let mut parts = Vec::new();
            while let Some(next) = tokens.next_if(|t| *t != "type") {
                parts.push(next);
            }
            if !parts.is_empty() {
                return Some(parts.join(" "));
            }
        }
    }
    None
}
