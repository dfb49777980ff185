//! バックグラウンドで 1 手分の探索を行うタスク。
//!
//! 呼び出し側とはタスク専用の bounded channel だけでやり取りする。
//! 最後に届くメッセージは必ず [`SearchEvent::BestMove`] で、エンジンの起動失敗や
//! 異常終了でも `BestMove(None)` が送られる。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Move};

use crate::error::{EngineError, Result};
use crate::info::{InfoLine, InfoSnapshot};
use crate::limit::SearchLimit;
use crate::process::{EngineConfig, EngineProcess};
use crate::report::{PV_LENGTH, SearchReport, pv_to_san, uci_to_move};

/// stop フラグ・時間・深さを確認する間隔。
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// 探索開始から結果を返すまでの最短時間。
pub const DEFAULT_MOVE_DELAY: Duration = Duration::from_secs(3);
/// `stop` 送信後に `bestmove` を待つ上限。
pub const ENGINE_STOP_TIMEOUT: Duration = Duration::from_secs(5);
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// 探索タスクから呼び出し側へ流れるイベント。
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    Depth(u32),
    /// ポーン単位。
    Score(f64),
    /// SAN の読み筋。
    Pv(String),
    /// 探索開始からの経過秒。
    Time(f64),
    Nps(u64),
    /// score・pv・depth が揃った後の要約。
    InfoAll(SearchReport),
    /// 終端メッセージ。`None` はエンジンが手を返せなかったことを表す。
    BestMove(Option<Move>),
}

/// 探索タスクへの入力。
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub engine: EngineConfig,
    pub position: Chess,
    pub limit: SearchLimit,
    /// true なら info を逐次流す。false なら 1 回の go で結果だけ受け取る。
    pub stream_info: bool,
    pub move_delay: Duration,
}

impl SearchRequest {
    pub fn new(engine: EngineConfig, position: Chess, limit: SearchLimit) -> Self {
        Self { engine, position, limit, stream_info: true, move_delay: DEFAULT_MOVE_DELAY }
    }
}

/// 実行中の探索タスク。
pub struct SearchTask {
    handle: Option<JoinHandle<()>>,
    stop_flag: Arc<AtomicBool>,
    /// 結果を待たずに片付けるときだけ立てる。move delay も待たない。
    abandon_flag: Arc<AtomicBool>,
    events: Receiver<SearchEvent>,
}

impl SearchTask {
    pub fn spawn(request: SearchRequest) -> Result<Self> {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let abandon_flag = Arc::new(AtomicBool::new(false));
        let (tx, rx) = crossbeam_channel::bounded(EVENT_CHANNEL_CAPACITY);
        let flags = StopFlags { stop: Arc::clone(&stop_flag), abandon: Arc::clone(&abandon_flag) };
        let handle = thread::Builder::new()
            .name("engine-search".to_string())
            .spawn(move || {
                let worker = SearchWorker::new(request, flags, tx);
                worker.run();
            })
            .map_err(EngineError::Thread)?;
        Ok(Self { handle: Some(handle), stop_flag, abandon_flag, events: rx })
    }

    /// このタスク専用のイベント受信口。
    pub fn events(&self) -> &Receiver<SearchEvent> {
        &self.events
    }

    /// 探索の打ち切りを依頼する。`POLL_INTERVAL` 以内に反映される。
    /// 手は返るが、move delay までは待つ。
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// 探索を止めてスレッドを回収する。スレッド側がエンジンに `quit` を送る。
    /// 未読のイベントは捨て、move delay も待たない。何度呼んでもよい。
    pub fn quit(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.abandon_flag.store(true, Ordering::SeqCst);
        self.stop();
        // チャネルが詰まってワーカーが send でブロックしないよう読み捨てながら待つ。
        while !handle.is_finished() {
            match self.events.recv_timeout(Duration::from_millis(10)) {
                Ok(_) | Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
            }
        }
        if handle.join().is_err() {
            log::error!("engine search thread panicked");
        }
        while self.events.try_recv().is_ok() {}
    }
}

impl Drop for SearchTask {
    fn drop(&mut self) {
        self.quit();
    }
}

enum StopReason {
    Requested,
    TimeLimit,
    DepthLimit,
}

struct StopFlags {
    stop: Arc<AtomicBool>,
    abandon: Arc<AtomicBool>,
}

struct SearchWorker {
    request: SearchRequest,
    fen: String,
    flags: StopFlags,
    tx: Sender<SearchEvent>,
    start: Instant,
    report: SearchReport,
}

impl SearchWorker {
    fn new(request: SearchRequest, flags: StopFlags, tx: Sender<SearchEvent>) -> Self {
        let fen = Fen::from_position(request.position.clone(), EnPassantMode::Legal).to_string();
        Self { request, fen, flags, tx, start: Instant::now(), report: SearchReport::default() }
    }

    fn stop_requested(&self) -> bool {
        self.flags.stop.load(Ordering::SeqCst)
    }

    fn abandoned(&self) -> bool {
        self.flags.abandon.load(Ordering::SeqCst)
    }

    fn emit(&self, event: SearchEvent) {
        // 受信側が既に quit していれば捨てる。
        let _ = self.tx.send(event);
    }

    fn run(mut self) {
        let best = match EngineProcess::spawn(&self.request.engine) {
            Ok(mut engine) => {
                // 持ち時間と move delay は起動・初期化の後から数える
                self.start = Instant::now();
                let best = self.search(&mut engine);
                engine.quit();
                best
            }
            Err(e) => {
                log::error!("{e}");
                None
            }
        };
        self.wait_move_delay();
        log::info!(
            "bestmove {}",
            best.as_ref()
                .map_or_else(|| "(none)".to_string(), |m| m.to_uci(CastlingMode::Standard).to_string())
        );
        self.emit(SearchEvent::BestMove(best));
    }

    fn search(&mut self, engine: &mut EngineProcess) -> Option<Move> {
        let result = if self.request.stream_info {
            match self.analyse(engine) {
                Ok(None) => {
                    log::warn!("{}: analysis ended without a move, falling back to play", engine.label);
                    self.play(engine)
                }
                other => other,
            }
        } else {
            self.play(engine)
        };
        match result {
            Ok(best) => best,
            Err(e) => {
                log::error!("{e}");
                None
            }
        }
    }

    fn start_go(&self, engine: &mut EngineProcess) -> Result<()> {
        engine.write_line(&format!("position fen {}", self.fen))?;
        engine.write_line(&self.request.limit.go_command())
    }

    /// info を逐次流すモード。
    fn analyse(&mut self, engine: &mut EngineProcess) -> Result<Option<Move>> {
        self.start_go(engine)?;
        let mut best: Option<Move> = None;
        let reason = loop {
            if let Some(line) = engine.poll_line(POLL_INTERVAL)? {
                if let Some(rest) = line.strip_prefix("bestmove") {
                    // エンジンが自分で探索を終えた。使えない手なら読み筋では補わない。
                    return Ok(self.parse_bestmove(rest));
                }
                if let Some(info) = InfoLine::parse(&line) {
                    if let Some(m) = self.absorb(&info) {
                        best = Some(m);
                    }
                    if let Some(reason) = self.check_stop(info.depth) {
                        break reason;
                    }
                    continue;
                }
            }
            if let Some(reason) = self.check_stop(None) {
                break reason;
            }
        };
        match reason {
            StopReason::Requested => log::info!("{}: search stop requested", engine.label),
            StopReason::TimeLimit => log::info!("{}: max time limit is reached", engine.label),
            StopReason::DepthLimit => log::info!("{}: max depth limit is reached", engine.label),
        }
        if let Some(m) = self.halt(engine)? {
            best = Some(m);
        }
        Ok(best)
    }

    /// 打ち切り条件を順に確認する: stop 要求、持ち時間、深さ。
    fn check_stop(&self, depth: Option<u32>) -> Option<StopReason> {
        if self.stop_requested() {
            return Some(StopReason::Requested);
        }
        if let Some(budget) = self.request.limit.time_budget() {
            if self.start.elapsed() >= budget {
                return Some(StopReason::TimeLimit);
            }
        }
        if depth.is_some_and(|d| self.request.limit.depth_reached(d)) {
            return Some(StopReason::DepthLimit);
        }
        None
    }

    /// `stop` を送って `bestmove` まで読み捨てる。
    fn halt(&mut self, engine: &mut EngineProcess) -> Result<Option<Move>> {
        engine.write_line("stop")?;
        let deadline = Instant::now() + ENGINE_STOP_TIMEOUT;
        while Instant::now() < deadline {
            if let Some(line) = engine.poll_line(POLL_INTERVAL)? {
                if let Some(rest) = line.strip_prefix("bestmove") {
                    return Ok(self.parse_bestmove(rest));
                }
            }
        }
        Err(EngineError::Timeout { label: engine.label.clone(), waiting_for: "bestmove" })
    }

    /// info 1 行を SearchReport に反映し、各フィールドのイベントを流す。
    /// 読み筋の先頭手が合法なら返す。
    fn absorb(&mut self, info: &InfoLine) -> Option<Move> {
        if !info.is_primary() || info.string.is_some() {
            return None;
        }
        if let Some(depth) = info.depth {
            self.report.depth = Some(depth);
            self.emit(SearchEvent::Depth(depth));
        }
        if let Some(score) = info.score {
            let pawns = score.pawns();
            self.report.score = Some(pawns);
            self.emit(SearchEvent::Score(pawns));
        }
        let elapsed = match info.time_ms {
            Some(ms) => ms as f64 / 1000.0,
            None => self.start.elapsed().as_secs_f64(),
        };
        self.report.elapsed_sec = Some(elapsed);
        self.emit(SearchEvent::Time(elapsed));
        if let Some(nps) = info.nps {
            self.report.nps = Some(nps);
            self.emit(SearchEvent::Nps(nps));
        }
        let mut head = None;
        if let Some(pv) = info.usable_pv() {
            if let Some(san) = pv_to_san(&self.request.position, pv, PV_LENGTH) {
                self.report.pv = Some(san.clone());
                self.emit(SearchEvent::Pv(san));
            }
            head = uci_to_move(&self.request.position, &pv[0]);
            if head.is_none() {
                log::warn!("ignoring illegal pv head {}", pv[0]);
            }
        }
        if self.report.is_complete() {
            self.emit(SearchEvent::InfoAll(self.report.clone()));
        }
        head
    }

    /// 1 回の go で結果だけ受け取るモード。stop 要求は `stop` コマンドとして転送する。
    fn play(&mut self, engine: &mut EngineProcess) -> Result<Option<Move>> {
        self.start_go(engine)?;
        let mut snapshot = InfoSnapshot::default();
        let mut stop_sent_at: Option<Instant> = None;
        let bestmove = loop {
            if stop_sent_at.is_none() && self.stop_requested() {
                engine.write_line("stop")?;
                stop_sent_at = Some(Instant::now());
            }
            if stop_sent_at.is_some_and(|t| t.elapsed() >= ENGINE_STOP_TIMEOUT) {
                return Err(EngineError::Timeout {
                    label: engine.label.clone(),
                    waiting_for: "bestmove",
                });
            }
            let Some(line) = engine.poll_line(POLL_INTERVAL)? else {
                continue;
            };
            if let Some(rest) = line.strip_prefix("bestmove") {
                break rest.to_string();
            }
            if let Some(info) = InfoLine::parse(&line) {
                snapshot.update(&info);
            }
        };

        let depth = snapshot.depth.unwrap_or_else(|| {
            log::warn!("{}: depth is missing, using 1", engine.label);
            1
        });
        let score = snapshot.score.map(|s| s.pawns()).unwrap_or_else(|| {
            log::warn!("{}: score is missing, using 0.0", engine.label);
            0.0
        });
        let elapsed = match snapshot.time_ms {
            Some(ms) => ms as f64 / 1000.0,
            None => {
                log::warn!("{}: time is missing, using wall clock", engine.label);
                self.start.elapsed().as_secs_f64()
            }
        };
        self.report.depth = Some(depth);
        self.report.score = Some(score);
        self.report.elapsed_sec = Some(elapsed);
        if snapshot.nps.is_some() {
            self.report.nps = snapshot.nps;
        }
        match pv_to_san(&self.request.position, &snapshot.pv, PV_LENGTH) {
            Some(pv) => {
                self.report.pv = Some(pv);
                self.emit(SearchEvent::InfoAll(self.report.clone()));
            }
            None => log::warn!("{}: pv is missing", engine.label),
        }
        Ok(self.parse_bestmove(&bestmove))
    }

    fn parse_bestmove(&self, rest: &str) -> Option<Move> {
        let text = rest.split_whitespace().next()?;
        let m = uci_to_move(&self.request.position, text);
        if m.is_none() {
            log::warn!("engine returned unusable bestmove {text}");
        }
        m
    }

    /// 探索開始から `move_delay` 経つまで待つ。stop 要求でも待つが、quit なら待たない。
    fn wait_move_delay(&self) {
        let floor = self.request.move_delay;
        loop {
            let elapsed = self.start.elapsed();
            if elapsed >= floor || self.abandoned() {
                break;
            }
            thread::sleep((floor - elapsed).min(POLL_INTERVAL));
        }
    }
}
