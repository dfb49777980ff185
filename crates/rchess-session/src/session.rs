//! 人間対エンジンの対局ループ。
//!
//! 局面・棋譜・時計はこのスレッドだけが持つ。エンジン探索は手番ごとに
//! [`SearchTask`] を立ち上げ、UI イベントと探索イベントを `select!` で待ち合わせる。

use std::fmt;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use rchess_uci::search::{DEFAULT_MOVE_DELAY, POLL_INTERVAL};
use rchess_uci::{EngineConfig, SearchEvent, SearchLimit, SearchReport, SearchRequest, SearchTask};
use shakmaty::{CastlingMode, Color, Move, Role, Square};

use crate::book::BookAdvisor;
use crate::clock::{Clock, TimeControl};
use crate::config::clamp_depth;
use crate::display::{DisplayBoard, coords_of, square_at};
use crate::event::{MenuAction, Side, UiEvent};
use crate::pgn::{GameHeaders, GameSink};
use crate::presenter::{Notice, Presenter, SessionView};
use crate::record::{MoveRecord, MoveSource, RecordEntry};
use crate::rules::RulesBoard;

/// 対局をまたいで保持する設定。
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub user_name: String,
    pub human_color: Color,
    pub event: String,
    pub site: String,
    /// 選択できるエンジン。
    pub engines: Vec<EngineConfig>,
    /// 次の探索で使うエンジン。
    pub engine: Option<EngineConfig>,
    /// `None` は無制限。
    pub max_depth: Option<u32>,
    pub stream_info: bool,
    pub move_delay: Duration,
    pub human_time: TimeControl,
    pub engine_time: TimeControl,
    pub auto_go: bool,
    pub book_random: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            user_name: "Human".to_string(),
            human_color: Color::White,
            event: "Human vs computer".to_string(),
            site: "?".to_string(),
            engines: Vec::new(),
            engine: None,
            max_depth: None,
            stream_info: true,
            move_delay: DEFAULT_MOVE_DELAY,
            human_time: TimeControl::default(),
            engine_time: TimeControl::default(),
            auto_go: false,
            book_random: true,
        }
    }
}

/// 終局・中断の後にどうするか。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    NewGame,
    ExitGame,
    ExitApp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// チェックメイトなどルール上の終局。理由文字列付き。
    Rules(&'static str),
    Resignation,
    UserWins,
    UserDraws,
    /// 新規対局・終了による中断。
    Abandoned,
}

impl Termination {
    /// PGN の `Termination` タグ値。
    pub fn pgn_value(&self) -> &'static str {
        match self {
            Termination::Rules(_) | Termination::Resignation => "normal",
            Termination::UserWins | Termination::UserDraws => "adjudication",
            Termination::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Rules(reason) => f.write_str(reason),
            Termination::Resignation => f.write_str("resignation"),
            Termination::UserWins => f.write_str("adjudicated win"),
            Termination::UserDraws => f.write_str("adjudicated draw"),
            Termination::Abandoned => f.write_str("abandoned"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ending {
    Decided { result: &'static str, termination: Termination },
    Interrupted(NextAction),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnState {
    /// 人間が黒で、エンジンの初手を Go 待ち。
    AwaitingEngineGo,
    HumanTurn,
    EngineTurn,
    /// エンジンが手を返せなかった。エンジンの選び直しか終了を待つ。
    EngineFailed,
    GameOver(Ending),
}

/// `play_game` の結果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameEnd {
    pub result: &'static str,
    pub termination: Termination,
    pub next: NextAction,
    pub plies: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingGo,
    Human,
    Engine,
    Failed,
}

/// 1 局分の状態。新規対局のたびに作り直す。
struct Game {
    board: RulesBoard,
    display: DisplayBoard,
    record: MoveRecord,
    headers: GameHeaders,
    human_clock: Clock,
    engine_clock: Clock,
    selected: Option<Square>,
    status: String,
    report: SearchReport,
    book_moves: String,
    last_tick: Instant,
}

impl Game {
    fn new(settings: &SessionSettings) -> Self {
        let board = RulesBoard::new();
        let display = DisplayBoard::from_position(board.position());
        let record = MoveRecord::new(board.fullmove_number(), board.turn());
        Self {
            board,
            display,
            record,
            headers: headers_for(settings),
            human_clock: Clock::new(settings.human_time),
            engine_clock: Clock::new(settings.engine_time),
            selected: None,
            status: String::new(),
            report: SearchReport::default(),
            book_moves: String::new(),
            last_tick: Instant::now(),
        }
    }
}

fn engine_name(settings: &SessionSettings) -> &str {
    settings.engine.as_ref().map_or("Engine", |e| e.name.as_str())
}

fn headers_for(settings: &SessionSettings) -> GameHeaders {
    let engine = engine_name(settings);
    let (white, black, white_tc, black_tc) = match settings.human_color {
        Color::White => (&settings.user_name[..], engine, settings.human_time, settings.engine_time),
        Color::Black => (engine, &settings.user_name[..], settings.engine_time, settings.human_time),
    };
    let mut headers = GameHeaders::new(&settings.event, &settings.site, white, black);
    headers.white_time_control = Some(white_tc.pgn_tag());
    headers.black_time_control = Some(black_tc.pgn_tag());
    headers
}

pub struct Session<P: Presenter> {
    settings: SessionSettings,
    presenter: P,
    events: Receiver<UiEvent>,
    sink: Box<dyn GameSink>,
    book: Option<BookAdvisor>,
    game: Game,
}

impl<P: Presenter> Session<P> {
    pub fn new(
        settings: SessionSettings,
        presenter: P,
        events: Receiver<UiEvent>,
        sink: impl GameSink + 'static,
    ) -> Self {
        let game = Game::new(&settings);
        Self { settings, presenter, events, sink: Box::new(sink), book: None, game }
    }

    pub fn with_book(mut self, book: BookAdvisor) -> Self {
        self.book = Some(book);
        self
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// `ExitApp` を受けるまで対局を繰り返す。
    pub fn run(&mut self) {
        loop {
            let end = self.play_game();
            log::info!("game ended: {} ({}), {} plies", end.result, end.termination, end.plies);
            match end.next {
                NextAction::NewGame => continue,
                NextAction::ExitApp => break,
                NextAction::ExitGame => {
                    if self.idle() != NextAction::NewGame {
                        break;
                    }
                }
            }
        }
        log::info!("session closed");
    }

    /// 1 局指して終局処理まで行う。
    pub fn play_game(&mut self) -> GameEnd {
        self.game = Game::new(&self.settings);
        self.refresh_book_listing();
        log::info!(
            "new game: {} vs {}",
            self.game.headers.white,
            self.game.headers.black
        );
        let mut state = self.state_for_position();
        let ending = loop {
            state = match state {
                TurnState::AwaitingEngineGo => self.await_engine_go(),
                TurnState::HumanTurn => self.human_turn(),
                TurnState::EngineTurn => self.engine_turn(),
                TurnState::EngineFailed => self.engine_failed(),
                TurnState::GameOver(ending) => break ending,
            };
        };
        self.finish(ending)
    }

    fn state_for_position(&self) -> TurnState {
        let board = &self.game.board;
        if let Some(reason) = board.termination(true) {
            return TurnState::GameOver(Ending::Decided {
                result: board.result(true),
                termination: Termination::Rules(reason),
            });
        }
        if board.turn() == self.settings.human_color {
            TurnState::HumanTurn
        } else if self.settings.auto_go || !self.game.record.is_empty() {
            TurnState::EngineTurn
        } else {
            TurnState::AwaitingEngineGo
        }
    }

    fn finish(&mut self, ending: Ending) -> GameEnd {
        self.game.selected = None;
        let (result, termination, next) = match ending {
            Ending::Decided { result, termination } => (result, termination, None),
            Ending::Interrupted(next) => ("*", Termination::Abandoned, Some(next)),
        };
        self.game.headers.result = result.to_string();
        self.game.headers.termination = Some(termination.pgn_value().to_string());
        if next.is_none() || !self.game.record.is_empty() {
            self.persist();
        }
        self.game.status = format!("Game over: {result} ({termination})");
        let next = match next {
            Some(next) => next,
            None => {
                self.presenter.notify(&Notice::info("Game over", format!("{result}, {termination}")));
                self.await_next_action()
            }
        };
        GameEnd { result, termination, next, plies: self.game.record.len() }
    }

    fn persist(&mut self) {
        if let Err(e) = self.sink.save(&self.game.headers, &self.game.record) {
            log::error!("failed to save game: {e:#}");
            self.presenter.notify(&Notice::error("Save failed", format!("{e:#}")));
        }
    }

    /// 時計を実時間で進める。`side` 以外の時計は止まっている。
    fn tick(&mut self, side: Option<Side>) {
        let now = Instant::now();
        let delta = now.duration_since(self.game.last_tick).as_millis();
        self.game.last_tick = now;
        let delta = u64::try_from(delta).unwrap_or(u64::MAX);
        match side {
            Some(Side::Human) => self.game.human_clock.tick(delta),
            Some(Side::Engine) => self.game.engine_clock.tick(delta),
            None => {}
        }
    }

    fn side_of(&self, color: Color) -> Side {
        if color == self.settings.human_color { Side::Human } else { Side::Engine }
    }

    fn render(&mut self) {
        let view = SessionView {
            status: self.game.status.clone(),
            human_clock: self.game.human_clock.display(),
            engine_clock: self.game.engine_clock.display(),
            move_list: self.game.record.move_list_text(),
            search_info: self.game.report.summary_line().unwrap_or_default(),
            book_moves: self.game.book_moves.clone(),
            board: *self.game.display.rows(),
            selected: self.game.selected.map(coords_of),
        };
        self.presenter.render(&view);
    }

    /// UI イベントを 1 つ待つ。切断されたら `ExitApp` 扱い。
    fn next_ui_event(&mut self, side: Option<Side>) -> Result<Option<UiEvent>, NextAction> {
        self.tick(side);
        self.render();
        match self.events.recv_timeout(POLL_INTERVAL) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                log::info!("ui channel closed");
                Err(NextAction::ExitApp)
            }
        }
    }

    fn await_engine_go(&mut self) -> TurnState {
        self.game.status = "Press Go to let the engine move".to_string();
        loop {
            match self.next_ui_event(None) {
                Err(next) => return TurnState::GameOver(Ending::Interrupted(next)),
                Ok(Some(UiEvent::Menu(action))) => {
                    if let Some(next) = self.handle_menu(action, Phase::AwaitingGo) {
                        return next;
                    }
                }
                Ok(_) => {}
            }
        }
    }

    fn human_turn(&mut self) -> TurnState {
        self.game.status = format!("{} to move, your turn", color_name(self.game.board.turn()));
        loop {
            match self.next_ui_event(Some(Side::Human)) {
                Err(next) => return TurnState::GameOver(Ending::Interrupted(next)),
                Ok(Some(UiEvent::SquareSelected { row, col })) => {
                    if let Some(next) = self.select_square(row, col) {
                        return next;
                    }
                }
                Ok(Some(UiEvent::Menu(action))) => {
                    if let Some(next) = self.handle_menu(action, Phase::Human) {
                        return next;
                    }
                }
                Ok(Some(UiEvent::TimerTick)) | Ok(None) => {}
            }
        }
    }

    /// 2 回のクリックで from/to を決める。同じマスをもう一度選ぶと取り消し。
    fn select_square(&mut self, row: usize, col: usize) -> Option<TurnState> {
        let sq = square_at(row, col)?;
        let turn = self.game.board.turn();
        let Some(from) = self.game.selected.take() else {
            if self.game.board.piece_at(sq).is_some_and(|p| p.color == turn) {
                self.game.selected = Some(sq);
            }
            return None;
        };
        if from == sq {
            return None;
        }
        let promotion = if self.game.board.is_promotion_move(from, sq) {
            Some(self.presenter.choose_promotion(turn).unwrap_or(Role::Queen))
        } else {
            None
        };
        match self.game.board.resolve(from, sq, promotion) {
            Some(m) => {
                self.apply_move(&m, MoveSource::Human);
                Some(self.state_for_position())
            }
            None => {
                log::debug!("illegal move {from}{sq}");
                self.presenter.notify(&Notice::warning(
                    "Illegal move",
                    format!("{from}{sq} is not legal in this position"),
                ));
                None
            }
        }
    }

    fn engine_turn(&mut self) -> TurnState {
        self.game.status = "Engine is thinking...".to_string();
        if let Some(m) = self.book_move() {
            self.apply_move(&m, MoveSource::Book);
            return self.state_for_position();
        }
        let Some(engine) = self.settings.engine.clone() else {
            self.presenter.notify(&Notice::error(
                "No engine",
                "No engine is configured. Select an engine to continue.",
            ));
            return TurnState::EngineFailed;
        };
        let clock = &self.game.engine_clock;
        let limit = SearchLimit {
            max_depth: self.settings.max_depth,
            base_ms: clock.base_ms(),
            inc_ms: clock.increment_ms(),
            discipline: clock.discipline(),
        };
        let mut request = SearchRequest::new(engine, self.game.board.position().clone(), limit);
        request.stream_info = self.settings.stream_info;
        request.move_delay = self.settings.move_delay;
        let mut task = match SearchTask::spawn(request) {
            Ok(task) => task,
            Err(e) => {
                log::error!("{e}");
                return self.engine_failure(&e.to_string());
            }
        };
        self.game.report = SearchReport::default();

        let search_events = task.events().clone();
        let ui_events = self.events.clone();
        loop {
            self.tick(Some(Side::Engine));
            self.render();
            crossbeam_channel::select! {
                recv(search_events) -> msg => match msg {
                    Ok(SearchEvent::BestMove(Some(m))) => {
                        task.quit();
                        if !self.game.board.is_legal(&m) {
                            return self.engine_failure("the engine returned an illegal move");
                        }
                        self.apply_move(&m, MoveSource::Engine);
                        return self.state_for_position();
                    }
                    Ok(SearchEvent::BestMove(None)) | Err(_) => {
                        task.quit();
                        return self.engine_failure("the engine did not return a move");
                    }
                    Ok(event) => self.absorb_search_event(event),
                },
                recv(ui_events) -> msg => match msg {
                    Ok(UiEvent::Menu(MenuAction::MoveNow)) => {
                        log::info!("move now requested");
                        task.stop();
                    }
                    Ok(UiEvent::Menu(action)) => {
                        if let Some(next) = self.handle_menu(action, Phase::Engine) {
                            task.quit();
                            return next;
                        }
                    }
                    Ok(_) => {}
                    Err(_) => {
                        task.quit();
                        return TurnState::GameOver(Ending::Interrupted(NextAction::ExitApp));
                    }
                },
                default(POLL_INTERVAL) => {}
            }
        }
    }

    fn absorb_search_event(&mut self, event: SearchEvent) {
        let report = &mut self.game.report;
        match event {
            SearchEvent::Depth(depth) => report.depth = Some(depth),
            SearchEvent::Score(score) => report.score = Some(score),
            SearchEvent::Pv(pv) => report.pv = Some(pv),
            SearchEvent::Time(sec) => report.elapsed_sec = Some(sec),
            SearchEvent::Nps(nps) => report.nps = Some(nps),
            SearchEvent::InfoAll(full) => *report = full,
            SearchEvent::BestMove(_) => {}
        }
    }

    fn engine_failure(&mut self, detail: &str) -> TurnState {
        let name = engine_name(&self.settings).to_string();
        self.presenter.notify(&Notice::error(
            "Engine error",
            format!("{name}: {detail}. Select another engine to continue."),
        ));
        TurnState::EngineFailed
    }

    fn engine_failed(&mut self) -> TurnState {
        self.game.status = "Engine failed, select another engine".to_string();
        loop {
            match self.next_ui_event(None) {
                Err(next) => return TurnState::GameOver(Ending::Interrupted(next)),
                Ok(Some(UiEvent::Menu(action))) => {
                    if let Some(next) = self.handle_menu(action, Phase::Failed) {
                        return next;
                    }
                }
                Ok(_) => {}
            }
        }
    }

    /// 定跡が引ければエンジンより優先する。
    fn book_move(&self) -> Option<Move> {
        let book = self.book.as_ref()?;
        let ply = u32::try_from(self.game.record.len()).unwrap_or(u32::MAX);
        let m = book.get_move(self.game.board.position(), ply, self.settings.book_random)?;
        self.game.board.is_legal(&m).then_some(m)
    }

    fn refresh_book_listing(&mut self) {
        let ply = u32::try_from(self.game.record.len()).unwrap_or(u32::MAX);
        self.game.book_moves = self
            .book
            .as_ref()
            .and_then(|b| b.listing(self.game.board.position(), ply))
            .unwrap_or_default();
    }

    fn apply_move(&mut self, m: &Move, source: MoveSource) {
        let mover = self.game.board.turn();
        let side = self.side_of(mover);
        self.tick(Some(side));
        let san = self.game.board.san(m);
        let uci = m.to_uci(CastlingMode::Standard).to_string();
        self.game.display.apply(m, mover);
        self.game.board.push(m);
        let clock = match side {
            Side::Human => &mut self.game.human_clock,
            Side::Engine => &mut self.game.engine_clock,
        };
        clock.update_base();
        let clock_after_ms = clock.base_ms();
        log::info!("{} played {san} ({uci}, {source:?})", color_name(mover));
        self.game.status = match source {
            MoveSource::Human => format!("You played {san}"),
            MoveSource::Engine => format!("Engine played {san}"),
            MoveSource::Book => format!("Engine played {san} from book"),
        };
        self.game.record.push(RecordEntry { uci, san, side: mover, clock_after_ms, source });
        self.refresh_book_listing();
        self.render();
    }

    fn decided(&self, human_wins: Option<bool>, termination: Termination) -> TurnState {
        let result = match (human_wins, self.settings.human_color) {
            (None, _) => "1/2-1/2",
            (Some(true), Color::White) | (Some(false), Color::Black) => "1-0",
            (Some(true), Color::Black) | (Some(false), Color::White) => "0-1",
        };
        TurnState::GameOver(Ending::Decided { result, termination })
    }

    /// 手番に関係なく受け付けるメニュー操作。状態が変わるときだけ `Some`。
    fn handle_menu(&mut self, action: MenuAction, phase: Phase) -> Option<TurnState> {
        match action {
            MenuAction::NewGame => Some(TurnState::GameOver(Ending::Interrupted(NextAction::NewGame))),
            MenuAction::ExitGame => Some(TurnState::GameOver(Ending::Interrupted(NextAction::ExitGame))),
            MenuAction::ExitApp => Some(TurnState::GameOver(Ending::Interrupted(NextAction::ExitApp))),
            MenuAction::Resign => Some(self.decided(Some(false), Termination::Resignation)),
            MenuAction::AdjudicateWin => Some(self.decided(Some(true), Termination::UserWins)),
            MenuAction::AdjudicateDraw => Some(self.decided(None, Termination::UserDraws)),
            MenuAction::Go if phase == Phase::AwaitingGo => Some(TurnState::EngineTurn),
            MenuAction::PasteFen(text) => self.paste_fen(&text, phase),
            MenuAction::SelectEngine(name) => {
                let selected = self.select_engine(&name);
                (selected && phase == Phase::Failed).then_some(TurnState::EngineTurn)
            }
            MenuAction::SaveGame => {
                self.save_snapshot();
                None
            }
            action @ (MenuAction::SetDepth(_) | MenuAction::SetTimeControl { .. }) => {
                self.configure(action);
                None
            }
            other => {
                log::debug!("ignoring {other:?} in {phase:?}");
                None
            }
        }
    }

    /// 指し手が 1 つもない間だけ局面を差し替えられる。
    fn paste_fen(&mut self, text: &str, phase: Phase) -> Option<TurnState> {
        if !matches!(phase, Phase::Human | Phase::AwaitingGo) || !self.game.record.is_empty() {
            self.presenter.notify(&Notice::warning(
                "Paste FEN",
                "A position can only be pasted before the first move.",
            ));
            return None;
        }
        let board = match RulesBoard::from_fen(text) {
            Ok(board) => board,
            Err(e) => {
                log::info!("rejected fen {text:?}: {e}");
                self.presenter.notify(&Notice::error("Invalid FEN", e.to_string()));
                return None;
            }
        };
        let fen = board.fen();
        log::info!("position set from fen {fen}");
        self.game.display = DisplayBoard::from_position(board.position());
        self.game.record = MoveRecord::new(board.fullmove_number(), board.turn());
        self.game.board = board;
        self.game.selected = None;
        self.game.headers.fen = Some(fen);
        self.refresh_book_listing();
        Some(self.state_for_position())
    }

    fn select_engine(&mut self, name: &str) -> bool {
        let Some(engine) = self.settings.engines.iter().find(|e| e.name == name).cloned() else {
            self.presenter.notify(&Notice::warning("Select engine", format!("unknown engine {name:?}")));
            return false;
        };
        log::info!("engine {name} selected");
        self.settings.engine = Some(engine);
        let header = match self.settings.human_color {
            Color::White => &mut self.game.headers.black,
            Color::Black => &mut self.game.headers.white,
        };
        *header = name.to_string();
        true
    }

    fn configure(&mut self, action: MenuAction) {
        match action {
            MenuAction::SetDepth(depth) => {
                self.settings.max_depth = clamp_depth(depth);
                let text = self.settings.max_depth.map_or("unlimited".to_string(), |d| d.to_string());
                log::info!("max depth set to {text}");
                self.presenter.notify(&Notice::info("Depth", format!("max depth is {text}")));
            }
            MenuAction::SetTimeControl { side, control } => {
                match side {
                    Side::Human => self.settings.human_time = control,
                    Side::Engine => self.settings.engine_time = control,
                }
                if self.game.record.is_empty() {
                    match side {
                        Side::Human => self.game.human_clock = Clock::new(control),
                        Side::Engine => self.game.engine_clock = Clock::new(control),
                    }
                    let fen = self.game.headers.fen.take();
                    let mut headers = headers_for(&self.settings);
                    headers.fen = fen;
                    self.game.headers = headers;
                }
                log::info!("{side:?} time control set to {}", control.pgn_tag());
            }
            _ => {}
        }
    }

    /// 途中の棋譜を `*` で書き出す。
    fn save_snapshot(&mut self) {
        let mut headers = self.game.headers.clone();
        headers.result = "*".to_string();
        match self.sink.save(&headers, &self.game.record) {
            Ok(()) => self.presenter.notify(&Notice::info("Save game", "game saved")),
            Err(e) => {
                log::error!("failed to save game: {e:#}");
                self.presenter.notify(&Notice::error("Save failed", format!("{e:#}")));
            }
        }
    }

    /// 終局後、次の操作を待つ。設定変更はここでも受け付ける。
    fn await_next_action(&mut self) -> NextAction {
        loop {
            let action = match self.next_ui_event(None) {
                Err(next) => return next,
                Ok(Some(UiEvent::Menu(action))) => action,
                Ok(_) => continue,
            };
            match action {
                MenuAction::NewGame => return NextAction::NewGame,
                MenuAction::ExitGame => return NextAction::ExitGame,
                MenuAction::ExitApp => return NextAction::ExitApp,
                MenuAction::SelectEngine(name) => {
                    self.select_engine(&name);
                }
                MenuAction::SaveGame => self.persist(),
                action @ (MenuAction::SetDepth(_) | MenuAction::SetTimeControl { .. }) => {
                    self.configure(action)
                }
                other => log::debug!("ignoring {other:?} after game over"),
            }
        }
    }

    /// 対局外。新規対局か終了を待つ。
    fn idle(&mut self) -> NextAction {
        self.game.status = "Start a new game or exit".to_string();
        match self.await_next_action() {
            NextAction::ExitGame => NextAction::ExitApp,
            next => next,
        }
    }
}

fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rchess_uci::TimeDiscipline;

    #[test]
    fn termination_tags() {
        assert_eq!(Termination::Rules("checkmate").pgn_value(), "normal");
        assert_eq!(Termination::Resignation.pgn_value(), "normal");
        assert_eq!(Termination::UserDraws.pgn_value(), "adjudication");
        assert_eq!(Termination::Abandoned.pgn_value(), "abandoned");
        assert_eq!(Termination::Rules("stalemate").to_string(), "stalemate");
    }

    #[test]
    fn headers_follow_human_color() {
        let mut settings = SessionSettings {
            engine: Some(EngineConfig::new("Mock", "/bin/false")),
            ..SessionSettings::default()
        };
        settings.engine_time =
            TimeControl { discipline: TimeDiscipline::TimePerMove, base_ms: 5_000, inc_ms: 0 };
        let h = headers_for(&settings);
        assert_eq!((h.white.as_str(), h.black.as_str()), ("Human", "Mock"));
        assert_eq!(h.black_time_control.as_deref(), Some("*5"));

        settings.human_color = Color::Black;
        let h = headers_for(&settings);
        assert_eq!((h.white.as_str(), h.black.as_str()), ("Mock", "Human"));
        assert_eq!(h.white_time_control.as_deref(), Some("*5"));
        assert_eq!(h.black_time_control.as_deref(), Some("300+10"));
    }
}
