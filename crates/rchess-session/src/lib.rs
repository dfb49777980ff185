//! 人間対 UCI エンジンの対局セッション。
//!
//! 時計・定跡・棋譜・PGN 保存と、手番を回す [`Session`] を提供する。
//! 表示層は [`Presenter`] を実装し、入力を [`UiEvent`] としてチャネルに流す。

pub mod book;
pub mod clock;
pub mod config;
pub mod display;
pub mod error;
pub mod event;
pub mod pgn;
pub mod presenter;
pub mod record;
pub mod rules;
pub mod session;

pub use book::{BookAdvisor, BookEntry, BookSource, PolyglotBook};
pub use clock::{Clock, TimeControl, format_clock};
pub use config::AppConfig;
pub use display::DisplayBoard;
pub use error::{BookError, FenError};
pub use event::{MenuAction, Side, UiEvent};
pub use pgn::{GameHeaders, GameSink, PgnFile, render_pgn};
pub use presenter::{Notice, NoticeLevel, Presenter, SessionView};
pub use record::{MoveRecord, MoveSource, RecordEntry};
pub use rules::RulesBoard;
pub use session::{Ending, GameEnd, NextAction, Session, SessionSettings, Termination, TurnState};
