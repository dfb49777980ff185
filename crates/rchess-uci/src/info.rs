/// mate スコアを centipawn に換算するときの基準値。
pub const MATE_SCORE: i32 = 32000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Cp(i32),
    /// 正なら手番側が n 手で詰ませる、0 以下なら詰まされる。
    Mate(i32),
}

impl Score {
    /// mate を `mate_score` 基準の centipawn に換算する。
    pub fn centipawns(self, mate_score: i32) -> i32 {
        match self {
            Score::Cp(cp) => cp,
            Score::Mate(n) if n > 0 => mate_score - n,
            Score::Mate(n) => -mate_score - n,
        }
    }

    /// 表示用のポーン単位スコア。
    pub fn pawns(self) -> f64 {
        f64::from(self.centipawns(MATE_SCORE)) / 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Lower,
    Upper,
}

/// `info` 行 1 本ぶんの解析結果。行に現れたフィールドだけが埋まる。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfoLine {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    pub multipv: Option<u32>,
    pub score: Option<Score>,
    pub bound: Option<Bound>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    pub time_ms: Option<u64>,
    pub pv: Vec<String>,
    pub string: Option<String>,
}

impl InfoLine {
    /// `info` で始まらない行は `None`。
    pub fn parse(line: &str) -> Option<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.first().copied() != Some("info") {
            return None;
        }
        let mut info = InfoLine::default();
        let mut i = 1;
        while i < tokens.len() {
            match tokens[i] {
                "depth" => {
                    info.depth = tokens.get(i + 1).and_then(|t| t.parse().ok());
                    i += 1;
                }
                "seldepth" => {
                    info.seldepth = tokens.get(i + 1).and_then(|t| t.parse().ok());
                    i += 1;
                }
                "multipv" => {
                    info.multipv = tokens.get(i + 1).and_then(|t| t.parse().ok());
                    i += 1;
                }
                "nodes" => {
                    info.nodes = tokens.get(i + 1).and_then(|t| t.parse().ok());
                    i += 1;
                }
                "nps" => {
                    info.nps = tokens.get(i + 1).and_then(|t| t.parse().ok());
                    i += 1;
                }
                "time" => {
                    info.time_ms = tokens.get(i + 1).and_then(|t| t.parse().ok());
                    i += 1;
                }
                "score" => {
                    let value = tokens.get(i + 2).and_then(|t| t.parse::<i32>().ok());
                    info.score = match (tokens.get(i + 1).copied(), value) {
                        (Some("cp"), Some(v)) => Some(Score::Cp(v)),
                        (Some("mate"), Some(v)) => Some(Score::Mate(v)),
                        _ => None,
                    };
                    i += 2;
                    match tokens.get(i + 1).copied() {
                        Some("lowerbound") => {
                            info.bound = Some(Bound::Lower);
                            i += 1;
                        }
                        Some("upperbound") => {
                            info.bound = Some(Bound::Upper);
                            i += 1;
                        }
                        _ => {}
                    }
                }
                "pv" => {
                    info.pv = tokens[i + 1..].iter().map(|t| t.to_string()).collect();
                    break;
                }
                "string" => {
                    info.string = Some(tokens[i + 1..].join(" "));
                    break;
                }
                _ => {}
            }
            i += 1;
        }
        Some(info)
    }

    /// multipv 2 以降の行は表示に使わない。
    pub fn is_primary(&self) -> bool {
        self.multipv.unwrap_or(1) == 1
    }

    /// bound 付きスコアと一緒に来た PV は信用しない。
    pub fn usable_pv(&self) -> Option<&[String]> {
        if self.bound.is_some() || self.pv.is_empty() {
            None
        } else {
            Some(&self.pv)
        }
    }
}

/// 複数の info 行を multipv=1 について累積したもの。
#[derive(Debug, Default, Clone)]
pub struct InfoSnapshot {
    pub depth: Option<u32>,
    pub score: Option<Score>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    pub time_ms: Option<u64>,
    pub pv: Vec<String>,
}

impl InfoSnapshot {
    pub fn update(&mut self, info: &InfoLine) {
        if !info.is_primary() || info.string.is_some() {
            return;
        }
        if info.depth.is_some() {
            self.depth = info.depth;
        }
        if info.score.is_some() {
            self.score = info.score;
        }
        if info.nodes.is_some() {
            self.nodes = info.nodes;
        }
        if info.nps.is_some() {
            self.nps = info.nps;
        }
        if info.time_ms.is_some() {
            self.time_ms = info.time_ms;
        }
        if let Some(pv) = info.usable_pv() {
            self.pv = pv.to_vec();
        }
    }
}
