use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 持ち時間の方式。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeDiscipline {
    /// 着手ごとに加算（フィッシャー）。
    #[default]
    Fischer,
    /// 遅延方式。加算分は消費時間を上限に相殺するだけで持ち時間は増えない。
    Delay,
    /// 1 手ごとに一定時間。
    TimePerMove,
    /// 加算なし。
    Classical,
}

impl TimeDiscipline {
    pub fn label(self) -> &'static str {
        match self {
            TimeDiscipline::Fischer => "fischer",
            TimeDiscipline::Delay => "delay",
            TimeDiscipline::TimePerMove => "time_per_move",
            TimeDiscipline::Classical => "classical",
        }
    }
}

impl fmt::Display for TimeDiscipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// エンジン 1 手分の探索制限。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimit {
    /// `None` は深さ無制限。
    pub max_depth: Option<u32>,
    /// エンジン側の残り時間、TimePerMove では 1 手の持ち時間。
    pub base_ms: u64,
    pub inc_ms: i64,
    pub discipline: TimeDiscipline,
}

impl SearchLimit {
    /// `go` コマンド文字列を組み立てる。負の加算は 0 として送る。
    pub fn go_command(&self) -> String {
        let inc = self.inc_ms.max(0);
        let mut cmd = match self.discipline {
            TimeDiscipline::Fischer | TimeDiscipline::Delay => format!(
                "go wtime {base} btime {base} winc {inc} binc {inc}",
                base = self.base_ms
            ),
            TimeDiscipline::Classical => {
                format!("go wtime {base} btime {base}", base = self.base_ms)
            }
            TimeDiscipline::TimePerMove => format!("go movetime {}", self.base_ms),
        };
        if let Some(depth) = self.max_depth {
            cmd.push_str(&format!(" depth {depth}"));
        }
        cmd
    }

    /// 探索タスク自身が打ち切るべき経過時間。加算のある方式はエンジン任せ。
    pub fn time_budget(&self) -> Option<Duration> {
        match self.discipline {
            TimeDiscipline::TimePerMove | TimeDiscipline::Classical => {
                Some(Duration::from_millis(self.base_ms))
            }
            TimeDiscipline::Fischer | TimeDiscipline::Delay => None,
        }
    }

    pub fn depth_reached(&self, depth: u32) -> bool {
        self.max_depth.is_some_and(|max| depth >= max)
    }
}
