//! Common test utilities: a scripted UCI engine run through `/bin/sh`.

#![allow(dead_code)] // These utilities may be used by various test files

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use rchess_uci::{EngineConfig, SearchEvent, SearchTask};
use shakmaty::Move;
use tempfile::TempDir;

// Timeout constants for CI stability
pub const T_EVENT: Duration = Duration::from_secs(10); // Whole search upper bound
pub const T_SLACK: Duration = Duration::from_millis(700); // Scheduling slack for timing asserts

/// A fake engine whose `go` and `stop` handling is given as shell snippets.
/// Every line the engine receives is appended to `log`.
pub struct MockEngine {
    _dir: TempDir,
    pub script: PathBuf,
    pub log: PathBuf,
}

impl MockEngine {
    pub fn new(go_body: &str, stop_body: &str) -> Self {
        Self::with_isready("      echo \"readyok\"", go_body, stop_body)
    }

    /// Like `new`, with a custom `isready` answer (e.g. a slow start-up).
    pub fn with_isready(isready_body: &str, go_body: &str, stop_body: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let script = dir.path().join("mock_engine.sh");
        let log = dir.path().join("received.log");
        let body = format!(
            r#"n=0
while IFS= read -r line; do
  printf '%s\n' "$line" >> '{log}'
  case "$line" in
    uci)
      echo "id name MockEngine 1.0"
      echo "option name Hash type spin default 16 min 1 max 1024"
      echo "option name MultiPV type spin default 1 min 1 max 500"
      echo "option name Skill Level type spin default 20 min 0 max 20"
      echo "uciok"
      ;;
    isready)
{isready_body}
      ;;
    go*)
      n=$((n+1))
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
"#,
            log = log.display(),
        );
        fs::write(&script, body).expect("Failed to write mock engine");
        Self { _dir: dir, script, log }
    }

    /// Reports depths 1..=`depths` with a fixed PV, then finishes by itself.
    pub fn finishing(depths: u32, pv: &str, bestmove: &str) -> Self {
        let mut go = String::new();
        for d in 1..=depths {
            go.push_str(&format!(
                "      echo \"info depth {d} seldepth {d} multipv 1 score cp {} nodes {} nps 500000 time {} pv {pv}\"\n",
                10 + d,
                d * 1000,
                d * 5
            ));
        }
        go.push_str(&format!("      echo \"bestmove {bestmove}\"\n"));
        Self::new(&go, "      :")
    }

    /// Reports depths 1..=`depths`, then waits for `stop` before answering.
    pub fn answer_on_stop(depths: u32, pv: &str, bestmove: &str) -> Self {
        let mut go = String::new();
        for d in 1..=depths {
            go.push_str(&format!(
                "      echo \"info depth {d} score cp 20 time {} nps 400000 pv {pv}\"\n",
                d * 3
            ));
        }
        if go.is_empty() {
            go.push_str("      :\n");
        }
        Self::new(&go, &format!("      echo \"bestmove {bestmove}\""))
    }

    pub fn config(&self) -> EngineConfig {
        EngineConfig {
            name: "mock".to_string(),
            path: PathBuf::from("/bin/sh"),
            args: vec![self.script.display().to_string()],
            working_dir: None,
            options: Vec::new(),
        }
    }

    /// Lines the engine has received so far.
    pub fn received(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(|l| l.to_string())
            .collect()
    }
}

/// Collect events until the terminal bestmove. Returns the events before it,
/// the move and the time it took.
pub fn collect_until_bestmove(task: &SearchTask) -> (Vec<SearchEvent>, Option<Move>, Duration) {
    let start = Instant::now();
    let mut events = Vec::new();
    loop {
        let remaining = T_EVENT.checked_sub(start.elapsed()).expect("Timed out waiting for bestmove");
        match task.events().recv_timeout(remaining) {
            Ok(SearchEvent::BestMove(m)) => return (events, m, start.elapsed()),
            Ok(other) => events.push(other),
            Err(e) => panic!("Search channel failed before bestmove: {e}"),
        }
    }
}
