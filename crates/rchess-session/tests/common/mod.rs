//! Common test utilities: a session running on its own thread, a recording
//! presenter, an in-memory game sink and a scripted UCI engine.

#![allow(dead_code)] // These utilities may be used by various test files

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::Sender;
use rchess_session::display::coords_of;
use rchess_session::{
    BookAdvisor, BookEntry, BookError, BookSource, GameEnd, GameHeaders, GameSink, MoveRecord,
    Notice, Presenter, Session, SessionSettings, SessionView, UiEvent,
};
use rchess_uci::EngineConfig;
use rchess_uci::report::uci_to_move;
use shakmaty::{Chess, Color, Role, Square};
use tempfile::TempDir;

pub const T_EVENT: Duration = Duration::from_secs(10);
const T_POLL: Duration = Duration::from_millis(20);

#[derive(Debug, Default)]
pub struct Seen {
    pub view: SessionView,
    pub statuses: Vec<String>,
    pub notices: Vec<Notice>,
    pub promotion_prompts: usize,
}

pub struct RecordingPresenter {
    seen: Arc<Mutex<Seen>>,
    promotion: Option<Role>,
}

impl Presenter for RecordingPresenter {
    fn render(&mut self, view: &SessionView) {
        let mut seen = self.seen.lock().unwrap();
        if seen.statuses.last() != Some(&view.status) {
            seen.statuses.push(view.status.clone());
        }
        seen.view = view.clone();
    }

    fn notify(&mut self, notice: &Notice) {
        self.seen.lock().unwrap().notices.push(notice.clone());
    }

    fn choose_promotion(&mut self, _color: Color) -> Option<Role> {
        self.seen.lock().unwrap().promotion_prompts += 1;
        self.promotion
    }
}

pub type SavedGames = Arc<Mutex<Vec<(GameHeaders, MoveRecord)>>>;

pub struct MemorySink(SavedGames);

impl GameSink for MemorySink {
    fn save(&mut self, headers: &GameHeaders, record: &MoveRecord) -> Result<()> {
        self.0.lock().unwrap().push((headers.clone(), record.clone()));
        Ok(())
    }
}

/// Answers every position with the same move, when it is legal there.
pub struct FixedBook(pub &'static str);

impl BookSource for FixedBook {
    fn entries(&self, pos: &Chess) -> std::result::Result<Vec<BookEntry>, BookError> {
        Ok(uci_to_move(pos, self.0).map(|mv| BookEntry { mv, weight: 1 }).into_iter().collect())
    }
}

/// Counts every lookup that reaches the book source.
pub struct CountingBook(pub FixedBook, pub Arc<AtomicUsize>);

impl BookSource for CountingBook {
    fn entries(&self, pos: &Chess) -> std::result::Result<Vec<BookEntry>, BookError> {
        self.1.fetch_add(1, Ordering::SeqCst);
        self.0.entries(pos)
    }
}

pub struct Harness {
    tx: Sender<UiEvent>,
    pub seen: Arc<Mutex<Seen>>,
    pub games: SavedGames,
    handle: JoinHandle<GameEnd>,
}

impl Harness {
    pub fn start(settings: SessionSettings) -> Self {
        Self::start_with(settings, None, None)
    }

    pub fn start_with(
        settings: SessionSettings,
        book: Option<BookAdvisor>,
        promotion: Option<Role>,
    ) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let seen = Arc::new(Mutex::new(Seen::default()));
        let games = SavedGames::default();
        let presenter = RecordingPresenter { seen: Arc::clone(&seen), promotion };
        let sink = MemorySink(Arc::clone(&games));
        let handle = thread::Builder::new()
            .name("session".to_string())
            .spawn(move || {
                let mut session = Session::new(settings, presenter, rx, sink);
                if let Some(book) = book {
                    session = session.with_book(book);
                }
                session.play_game()
            })
            .expect("Failed to spawn session thread");
        Self { tx, seen, games, handle }
    }

    pub fn send(&self, event: impl Into<UiEvent>) {
        self.tx.send(event.into()).expect("session is gone");
    }

    /// Clicks the two squares of a move, e.g. `play("e2", "e4")`.
    pub fn play(&self, from: &str, to: &str) {
        for name in [from, to] {
            let sq: Square = name.parse().expect("square name");
            let (row, col) = coords_of(sq);
            self.send(UiEvent::SquareSelected { row, col });
        }
    }

    pub fn wait_for(&self, what: &str, cond: impl Fn(&Seen) -> bool) {
        let start = Instant::now();
        while start.elapsed() < T_EVENT {
            if cond(&self.seen.lock().unwrap()) {
                return;
            }
            thread::sleep(T_POLL);
        }
        panic!("Timed out waiting for {what}: {:?}", self.seen.lock().unwrap());
    }

    pub fn wait_for_moves(&self, text: &str) {
        self.wait_for(text, |s| s.view.move_list == text);
    }

    pub fn finish(self) -> GameEnd {
        self.handle.join().expect("session thread panicked")
    }
}

pub fn settings(engine: Option<EngineConfig>) -> SessionSettings {
    SessionSettings {
        engines: engine.iter().cloned().collect(),
        engine,
        move_delay: Duration::ZERO,
        book_random: false,
        ..SessionSettings::default()
    }
}

pub fn broken_engine() -> EngineConfig {
    EngineConfig::new("broken", "/nonexistent/engine/binary")
}

/// A fake engine run through `/bin/sh`. `go_body` is a shell snippet run on
/// every `go`; `stop_body` on `stop`.
pub struct MockEngine {
    _dir: TempDir,
    script: PathBuf,
}

impl MockEngine {
    pub fn new(go_body: &str, stop_body: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let script = dir.path().join("mock_engine.sh");
        let body = format!(
            r#"while IFS= read -r line; do
  case "$line" in
    uci)
      echo "id name MockEngine 1.0"
      echo "uciok"
      ;;
    isready)
      echo "readyok"
      ;;
    go*)
{go_body}
      ;;
    stop)
{stop_body}
      ;;
    quit)
      exit 0
      ;;
  esac
done
"#
        );
        fs::write(&script, body).expect("Failed to write mock engine");
        Self { _dir: dir, script }
    }

    /// Answers every `go` with one info line and `bestmove`.
    pub fn replying(bestmove: &str) -> Self {
        Self::new(
            &format!(
                "      echo \"info depth 1 score cp 15 time 1 nps 1000 pv {bestmove}\"\n      echo \"bestmove {bestmove}\""
            ),
            "      :",
        )
    }

    /// Reports one info line and waits for `stop`.
    pub fn answer_on_stop(bestmove: &str) -> Self {
        Self::new(
            &format!("      echo \"info depth 4 score cp -30 time 2 nps 1000 pv {bestmove}\""),
            &format!("      echo \"bestmove {bestmove}\""),
        )
    }

    pub fn config(&self, name: &str) -> EngineConfig {
        EngineConfig {
            name: name.to_string(),
            path: PathBuf::from("/bin/sh"),
            args: vec![self.script.display().to_string()],
            working_dir: None,
            options: Vec::new(),
        }
    }
}
