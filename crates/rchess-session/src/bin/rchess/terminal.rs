//! 標準入出力で遊ぶための最小の表示層。

use std::io::{self, BufRead};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Sender, TrySendError};
use rchess_session::display::{ascii_board, coords_of};
use rchess_session::{
    MenuAction, Notice, NoticeLevel, Presenter, SessionView, Side, TimeControl, UiEvent,
};
use rchess_uci::TimeDiscipline;
use shakmaty::{Color, Role, Square};

pub const HELP: &str = "\
commands:
  e2e4, e7e8q            move (from/to, optional promotion piece)
  new | resign | go | now | win | draw | save
  fen <FEN>              set the position before the first move
  depth <N>              engine max depth (1000 = unlimited)
  tc human|engine <fischer|delay|time_per_move|classical> <base_ms> <inc_ms>
  engine <name>          select a configured engine
  exit | quit            leave the game / the program";

/// 入力行 1 つ分。指し手は 2 つのマス選択になる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub events: Vec<UiEvent>,
    pub promotion: Option<Role>,
}

impl From<MenuAction> for Command {
    fn from(action: MenuAction) -> Self {
        Self { events: vec![action.into()], promotion: None }
    }
}

fn square_event(sq: Square) -> UiEvent {
    let (row, col) = coords_of(sq);
    UiEvent::SquareSelected { row, col }
}

fn parse_move(text: &str) -> Option<Command> {
    let from: Square = text.get(0..2)?.parse().ok()?;
    let to: Square = text.get(2..4)?.parse().ok()?;
    let promotion = match text.get(4..) {
        Some("") | None => None,
        Some(p) if p.len() == 1 => Some(Role::from_char(p.chars().next()?)?),
        Some(_) => return None,
    };
    Some(Command { events: vec![square_event(from), square_event(to)], promotion })
}

fn parse_discipline(text: &str) -> Option<TimeDiscipline> {
    [
        TimeDiscipline::Fischer,
        TimeDiscipline::Delay,
        TimeDiscipline::TimePerMove,
        TimeDiscipline::Classical,
    ]
    .into_iter()
    .find(|d| d.label() == text)
}

fn parse_time_control(args: &[&str]) -> Result<MenuAction, String> {
    let [side, discipline, base, inc] = args else {
        return Err("usage: tc human|engine <discipline> <base_ms> <inc_ms>".to_string());
    };
    let side = match *side {
        "human" => Side::Human,
        "engine" => Side::Engine,
        other => return Err(format!("unknown side {other}")),
    };
    let discipline =
        parse_discipline(discipline).ok_or_else(|| format!("unknown time control {discipline}"))?;
    let base_ms = base.parse().map_err(|_| format!("bad base time {base}"))?;
    let inc_ms = inc.parse().map_err(|_| format!("bad increment {inc}"))?;
    Ok(MenuAction::SetTimeControl { side, control: TimeControl { discipline, base_ms, inc_ms } })
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let action = match head {
        "new" => MenuAction::NewGame,
        "resign" => MenuAction::Resign,
        "go" => MenuAction::Go,
        "now" => MenuAction::MoveNow,
        "win" => MenuAction::AdjudicateWin,
        "draw" => MenuAction::AdjudicateDraw,
        "save" => MenuAction::SaveGame,
        "exit" => MenuAction::ExitGame,
        "quit" => MenuAction::ExitApp,
        "fen" if !rest.is_empty() => MenuAction::PasteFen(rest.to_string()),
        "engine" if !rest.is_empty() => MenuAction::SelectEngine(rest.to_string()),
        "depth" => MenuAction::SetDepth(rest.parse().map_err(|_| format!("bad depth {rest:?}"))?),
        "tc" => parse_time_control(&rest.split_whitespace().collect::<Vec<_>>())?,
        "help" => return Err(HELP.to_string()),
        _ => return parse_move(head).ok_or_else(|| format!("unknown command {line:?}")),
    };
    Ok(action.into())
}

/// 入力スレッドと表示層で共有する、次の成りの指定。
#[derive(Debug, Clone, Default)]
pub struct PendingPromotion(Arc<Mutex<Option<Role>>>);

impl PendingPromotion {
    fn lock(&self) -> MutexGuard<'_, Option<Role>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set(&self, role: Option<Role>) {
        *self.lock() = role;
    }

    fn take(&self) -> Option<Role> {
        self.lock().take()
    }
}

pub fn spawn_stdin_reader(tx: Sender<UiEvent>, promotion: PendingPromotion) -> JoinHandle<()> {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log::error!("stdin read error: {e}");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            log::debug!("Received: {}", line.trim());
            let command = match parse_command(&line) {
                Ok(command) => command,
                Err(message) => {
                    println!("{message}");
                    continue;
                }
            };
            if command.promotion.is_some() {
                promotion.set(command.promotion);
            }
            for event in command.events {
                match tx.try_send(event) {
                    Ok(()) => {}
                    Err(TrySendError::Full(event)) => {
                        log::warn!("event channel full, dropping {event:?}");
                    }
                    Err(TrySendError::Disconnected(_)) => {
                        log::debug!("event channel disconnected, exiting stdin reader");
                        return;
                    }
                }
            }
        }
        log::debug!("stdin closed");
    })
}

/// 変化があった項目だけを標準出力に書く。
pub struct TerminalPresenter {
    last: SessionView,
    promotion: PendingPromotion,
}

impl TerminalPresenter {
    pub fn new(promotion: PendingPromotion) -> Self {
        Self { last: SessionView::default(), promotion }
    }
}

impl Presenter for TerminalPresenter {
    fn render(&mut self, view: &SessionView) {
        let board_changed = view.board != self.last.board || view.move_list != self.last.move_list;
        if board_changed {
            println!();
            print!("{}", ascii_board(&view.board));
            if !view.move_list.is_empty() {
                println!("moves: {}", view.move_list.trim_end());
            }
        }
        if board_changed || view.status != self.last.status {
            println!("you {} | engine {}", view.human_clock, view.engine_clock);
            println!("{}", view.status);
        }
        if !view.search_info.is_empty() && view.search_info != self.last.search_info {
            println!("  {}", view.search_info);
        }
        if !view.book_moves.is_empty() && view.book_moves != self.last.book_moves {
            print!("{}", view.book_moves);
        }
        self.last = view.clone();
    }

    fn notify(&mut self, notice: &Notice) {
        let tag = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        println!("[{tag}] {}: {}", notice.title, notice.message);
    }

    fn choose_promotion(&mut self, _color: Color) -> Option<Role> {
        self.promotion.take()
    }
}
