use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{Chess, Move};

/// 表示する PV の最大手数。
pub const PV_LENGTH: usize = 9;

/// 進行中の探索の要約。info を受け取るたびにフィールド単位で上書きされる。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchReport {
    pub depth: Option<u32>,
    /// 手番側から見たポーン単位の評価値。
    pub score: Option<f64>,
    /// SAN の読み筋（手数番号なし）。
    pub pv: Option<String>,
    pub elapsed_sec: Option<f64>,
    pub nps: Option<u64>,
}

impl SearchReport {
    /// score・pv・depth が揃っているか。
    pub fn is_complete(&self) -> bool {
        self.score.is_some() && self.pv.is_some() && self.depth.is_some()
    }

    /// `+0.34 | 12 | 1.5s | e4 e5 Nf3` 形式の 1 行。揃っていなければ `None`。
    pub fn summary_line(&self) -> Option<String> {
        let (Some(score), Some(depth), Some(pv)) = (self.score, self.depth, self.pv.as_deref())
        else {
            return None;
        };
        let time = self.elapsed_sec.unwrap_or(0.0);
        Some(format!("{score:+5.2} | {depth} | {time:0.1}s | {pv}"))
    }
}

/// UCI 表記の手を局面上の合法手に変換する。非合法・解析不能なら `None`。
pub fn uci_to_move(position: &Chess, text: &str) -> Option<Move> {
    let uci: UciMove = text.parse().ok()?;
    uci.to_move(position).ok()
}

/// UCI の読み筋を先頭 `max_len` 手まで SAN に変換する。途中で非合法手に当たればそこで切る。
pub fn pv_to_san(position: &Chess, pv: &[String], max_len: usize) -> Option<String> {
    let mut pos = position.clone();
    let mut sans = Vec::with_capacity(max_len.min(pv.len()));
    for text in pv.iter().take(max_len) {
        let Some(m) = uci_to_move(&pos, text) else {
            break;
        };
        sans.push(SanPlus::from_move_and_play_unchecked(&mut pos, &m).to_string());
    }
    if sans.is_empty() { None } else { Some(sans.join(" ")) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pv(moves: &[&str]) -> Vec<String> {
        moves.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn summary_line_needs_score_depth_and_pv() {
        let mut report = SearchReport { depth: Some(12), score: Some(0.34), ..Default::default() };
        assert!(report.summary_line().is_none());
        report.pv = Some("e4 e5 Nf3".to_string());
        report.elapsed_sec = Some(1.46);
        assert_eq!(report.summary_line().unwrap(), "+0.34 | 12 | 1.5s | e4 e5 Nf3");
        report.score = Some(-2.5);
        assert!(report.summary_line().unwrap().starts_with("-2.50 |"));
    }

    #[test]
    fn pv_is_truncated_and_stops_at_illegal_moves() {
        let start = Chess::default();
        let line = pv(&["e2e4", "e7e5", "g1f3", "b8c6", "f1b5"]);
        assert_eq!(pv_to_san(&start, &line, 3).as_deref(), Some("e4 e5 Nf3"));
        let broken = pv(&["e2e4", "e2e4", "g1f3"]);
        assert_eq!(pv_to_san(&start, &broken, PV_LENGTH).as_deref(), Some("e4"));
        assert!(pv_to_san(&start, &pv(&["zz"]), PV_LENGTH).is_none());
    }

    #[test]
    fn uci_moves_are_checked_for_legality() {
        let start = Chess::default();
        assert!(uci_to_move(&start, "e2e4").is_some());
        assert!(uci_to_move(&start, "e2e5").is_none());
        assert!(uci_to_move(&start, "(none)").is_none());
    }
}
