use rchess_uci::TimeDiscipline;
use serde::{Deserialize, Serialize};

/// 片側の持ち時間設定。設定ファイルの `[time.human]` / `[time.engine]` に対応する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeControl {
    pub discipline: TimeDiscipline,
    pub base_ms: u64,
    /// 0 や負も許す。
    pub inc_ms: i64,
}

impl Default for TimeControl {
    fn default() -> Self {
        Self { discipline: TimeDiscipline::Fischer, base_ms: 5 * 60 * 1000, inc_ms: 10_000 }
    }
}

impl TimeControl {
    /// PGN の `WhiteTimeControl` / `BlackTimeControl` タグ値。
    pub fn pgn_tag(&self) -> String {
        let base = self.base_ms / 1000;
        let inc = self.inc_ms.max(0) / 1000;
        match self.discipline {
            TimeDiscipline::Fischer => format!("{base}+{inc}"),
            TimeDiscipline::Delay => format!("{base}+d{inc}"),
            TimeDiscipline::TimePerMove => format!("*{base}"),
            TimeDiscipline::Classical => format!("{base}"),
        }
    }
}

/// 片側の時計。
///
/// `tick` は経過を積むだけで、持ち時間を減らすのは着手完了時の `update_base` だけ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clock {
    discipline: TimeDiscipline,
    base_ms: u64,
    initial_base_ms: u64,
    increment_ms: i64,
    elapsed_ms: u64,
}

impl Clock {
    pub fn new(tc: TimeControl) -> Self {
        Self {
            discipline: tc.discipline,
            base_ms: tc.base_ms,
            initial_base_ms: tc.base_ms,
            increment_ms: tc.inc_ms,
            elapsed_ms: 0,
        }
    }

    pub fn discipline(&self) -> TimeDiscipline {
        self.discipline
    }

    pub fn base_ms(&self) -> u64 {
        self.base_ms
    }

    pub fn increment_ms(&self) -> i64 {
        self.increment_ms
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn tick(&mut self, delta_ms: u64) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms);
    }

    /// 手番側が 1 手指し終えたときに 1 回だけ呼ぶ。経過はリセットされる。
    pub fn update_base(&mut self) {
        let base = i128::from(self.base_ms);
        let inc = i128::from(self.increment_ms);
        let elapsed = i128::from(self.elapsed_ms);
        let next = match self.discipline {
            TimeDiscipline::Fischer => base + inc - elapsed,
            TimeDiscipline::Delay => base + (inc - elapsed).min(0),
            TimeDiscipline::TimePerMove => i128::from(self.initial_base_ms),
            TimeDiscipline::Classical => base - elapsed,
        };
        self.base_ms = u64::try_from(next.max(0)).unwrap_or(u64::MAX);
        self.elapsed_ms = 0;
    }

    /// 表示用の残り時間。
    pub fn remaining_ms(&self) -> u64 {
        self.base_ms.saturating_sub(self.elapsed_ms)
    }

    /// 時間切れかどうか。表示にだけ使い、勝敗判定はしない。
    pub fn is_flagged(&self) -> bool {
        self.remaining_ms() == 0
    }

    pub fn display(&self) -> String {
        let text = format_clock(self.remaining_ms());
        if self.is_flagged() { format!("{text} (flag)") } else { text }
    }
}

/// ミリ秒を `h:mm:ss` にする。
pub fn format_clock(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(discipline: TimeDiscipline, base_ms: u64, inc_ms: i64) -> Clock {
        Clock::new(TimeControl { discipline, base_ms, inc_ms })
    }

    #[test]
    fn fischer_adds_increment_after_the_move() {
        let mut c = clock(TimeDiscipline::Fischer, 60_000, 2_000);
        c.tick(5_000);
        c.tick(1_500);
        assert_eq!(c.base_ms(), 60_000);
        assert_eq!(c.remaining_ms(), 53_500);
        c.update_base();
        assert_eq!(c.base_ms(), 55_500);
        assert_eq!(c.elapsed_ms(), 0);
    }

    #[test]
    fn delay_never_banks_time() {
        let mut c = clock(TimeDiscipline::Delay, 60_000, 5_000);
        c.tick(3_000);
        c.update_base();
        assert_eq!(c.base_ms(), 60_000);
        c.tick(8_000);
        c.update_base();
        assert_eq!(c.base_ms(), 57_000);
    }

    #[test]
    fn time_per_move_always_resets() {
        let mut c = clock(TimeDiscipline::TimePerMove, 10_000, 0);
        c.tick(25_000);
        assert!(c.is_flagged());
        c.update_base();
        assert_eq!(c.base_ms(), 10_000);
        c.tick(1);
        c.update_base();
        assert_eq!(c.base_ms(), 10_000);
    }

    #[test]
    fn base_never_goes_negative() {
        let mut c = clock(TimeDiscipline::Classical, 1_000, 0);
        c.tick(4_000);
        c.update_base();
        assert_eq!(c.base_ms(), 0);

        let mut f = clock(TimeDiscipline::Fischer, 1_000, -3_000);
        f.tick(10);
        f.update_base();
        assert_eq!(f.base_ms(), 0);
        assert!(f.display().ends_with("(flag)"));
    }

    #[test]
    fn clock_text_and_pgn_tags() {
        assert_eq!(format_clock(0), "0:00:00");
        assert_eq!(format_clock(299_999), "0:04:59");
        assert_eq!(format_clock(3_723_000), "1:02:03");
        let tc = TimeControl { discipline: TimeDiscipline::Fischer, base_ms: 300_000, inc_ms: 2_000 };
        assert_eq!(tc.pgn_tag(), "300+2");
        let per_move = TimeControl { discipline: TimeDiscipline::TimePerMove, base_ms: 15_000, inc_ms: 0 };
        assert_eq!(per_move.pgn_tag(), "*15");
    }
}
