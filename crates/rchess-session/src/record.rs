use shakmaty::Color;

/// 指し手の出どころ。PGN のコメントと棋譜表示で使う。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSource {
    Human,
    Engine,
    Book,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry {
    pub uci: String,
    pub san: String,
    pub side: Color,
    /// 着手後の持ち時間。
    pub clock_after_ms: u64,
    pub source: MoveSource,
}

/// 1 局分の棋譜。追記のみで、書いたエントリは変更しない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    start_fullmove: u32,
    start_turn: Color,
    entries: Vec<RecordEntry>,
}

impl Default for MoveRecord {
    fn default() -> Self {
        Self::new(1, Color::White)
    }
}

impl MoveRecord {
    pub fn new(start_fullmove: u32, start_turn: Color) -> Self {
        Self { start_fullmove, start_turn, entries: Vec::new() }
    }

    pub fn push(&mut self, entry: RecordEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[RecordEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn start_fullmove(&self) -> u32 {
        self.start_fullmove
    }

    pub fn start_turn(&self) -> Color {
        self.start_turn
    }

    /// `(手数, エントリ)` を順に返す。黒番開始でも手数は正しく進む。
    pub fn numbered(&self) -> impl Iterator<Item = (u32, &RecordEntry)> {
        let mut number = self.start_fullmove;
        self.entries.iter().map(move |e| {
            let n = number;
            if e.side == Color::Black {
                number += 1;
            }
            (n, e)
        })
    }

    /// 棋譜パネル用の `1. e4 e5 2. Nf3 ` 形式。
    pub fn move_list_text(&self) -> String {
        let mut out = String::new();
        for (i, (number, entry)) in self.numbered().enumerate() {
            match entry.side {
                Color::White => out.push_str(&format!("{number}. {} ", entry.san)),
                Color::Black if i == 0 => out.push_str(&format!("{number}... {} ", entry.san)),
                Color::Black => out.push_str(&format!("{} ", entry.san)),
            }
        }
        out
    }
}
