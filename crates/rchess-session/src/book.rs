//! 定跡。
//!
//! データ源は [`BookSource`] で差し替えられる。標準では Polyglot 形式の `.bin` を
//! 問い合わせのたびに開いて引く（16 バイトのビッグエンディアンエントリがキー順に並ぶ）。

use std::fs;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ReadBytesExt};
use rand::Rng;
use rand::seq::IndexedRandom;
use shakmaty::{Chess, File, Move, Position, Rank, Role, Square};

use crate::error::BookError;
use crate::rules::{RulesBoard, repetition_key};

pub const ENTRY_SIZE: usize = 16;

/// 1 局面に対する定跡手の候補。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookEntry {
    pub mv: Move,
    pub weight: u16,
}

pub trait BookSource: Send {
    /// 局面に登録された手を登録順に返す。登録がなければ空。
    fn entries(&self, pos: &Chess) -> Result<Vec<BookEntry>, BookError>;
}

/// Polyglot 形式の定跡ファイル。
#[derive(Debug, Clone)]
pub struct PolyglotBook {
    path: PathBuf,
}

impl PolyglotBook {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PolyglotBook {
    fn io_error(&self, source: io::Error) -> BookError {
        BookError::Io { path: self.path.clone(), source }
    }
}

impl BookSource for PolyglotBook {
    /// ファイル全体は読まず、キーの二分探索で該当エントリだけ読む。
    fn entries(&self, pos: &Chess) -> Result<Vec<BookEntry>, BookError> {
        let mut file = fs::File::open(&self.path).map_err(|e| self.io_error(e))?;
        let len = file.metadata().map_err(|e| self.io_error(e))?.len();
        if len % ENTRY_SIZE as u64 != 0 {
            let len = usize::try_from(len).unwrap_or(usize::MAX);
            return Err(BookError::Truncated { path: self.path.clone(), len });
        }
        let key = repetition_key(pos);
        let count = len / ENTRY_SIZE as u64;
        let mut key_at = |i: u64| -> io::Result<u64> {
            file.seek(SeekFrom::Start(i * ENTRY_SIZE as u64))?;
            file.read_u64::<BigEndian>()
        };

        // lower bound
        let (mut lo, mut hi) = (0, count);
        while lo < hi {
            let mid = (lo + hi) / 2;
            if key_at(mid).map_err(|e| self.io_error(e))? < key { lo = mid + 1 } else { hi = mid }
        }

        let mut found = Vec::new();
        if lo == count {
            return Ok(found);
        }
        let mut reader = BufReader::new(file);
        reader
            .seek(SeekFrom::Start(lo * ENTRY_SIZE as u64))
            .map_err(|e| self.io_error(e))?;
        for _ in lo..count {
            let mut entry = [0u8; ENTRY_SIZE];
            reader.read_exact(&mut entry).map_err(|e| self.io_error(e))?;
            let mut fields = &entry[..];
            let (entry_key, raw, weight) = read_fields(&mut fields).map_err(|e| self.io_error(e))?;
            if entry_key != key {
                break;
            }
            match decode_move(pos, raw) {
                Some(mv) => found.push(BookEntry { mv, weight }),
                None => log::debug!("skipping book move {raw:#06x}: not legal here"),
            }
        }
        Ok(found)
    }
}

/// (キー, 手, 重み)。残りの learn 欄は使わない。
fn read_fields(entry: &mut &[u8]) -> io::Result<(u64, u16, u16)> {
    let key = entry.read_u64::<BigEndian>()?;
    let raw = entry.read_u16::<BigEndian>()?;
    let weight = entry.read_u16::<BigEndian>()?;
    Ok((key, raw, weight))
}

/// Polyglot の 16bit 手を局面上の合法手に解決する。
/// キャスリングは王がルークを取る形で記録されており、shakmaty の `Move::Castle` と一致する。
fn decode_move(pos: &Chess, raw: u16) -> Option<Move> {
    let field = |shift: u16| u32::from((raw >> shift) & 7);
    let to = Square::from_coords(File::new(field(0)), Rank::new(field(3)));
    let from = Square::from_coords(File::new(field(6)), Rank::new(field(9)));
    let promotion = match field(12) {
        0 => None,
        1 => Some(Role::Knight),
        2 => Some(Role::Bishop),
        3 => Some(Role::Rook),
        4 => Some(Role::Queen),
        _ => return None,
    };
    pos.legal_moves()
        .into_iter()
        .find(|m| m.from() == Some(from) && m.to() == to && m.promotion() == promotion)
}

/// 定跡から手を選ぶ。状態を持たず、局面も変えない。
pub struct BookAdvisor {
    source: Box<dyn BookSource>,
    max_ply: u32,
}

impl BookAdvisor {
    pub fn new(source: impl BookSource + 'static, max_ply: u32) -> Self {
        Self { source: Box::new(source), max_ply }
    }

    pub fn max_ply(&self) -> u32 {
        self.max_ply
    }

    /// `ply` は既に指された半手数。`max_ply` を超えたら引かない。
    pub fn get_move(&self, pos: &Chess, ply: u32, randomize: bool) -> Option<Move> {
        self.get_move_with(pos, ply, randomize, &mut rand::rng())
    }

    pub fn get_move_with<R: Rng + ?Sized>(
        &self,
        pos: &Chess,
        ply: u32,
        randomize: bool,
        rng: &mut R,
    ) -> Option<Move> {
        if ply > self.max_ply {
            return None;
        }
        let entries = self.candidates(pos)?;
        if randomize {
            entries.choose_weighted(rng, |e| u32::from(e.weight)).ok().map(|e| e.mv.clone())
        } else {
            // 重みが同じなら先に登録されたほう
            let mut best = &entries[0];
            for entry in &entries[1..] {
                if entry.weight > best.weight {
                    best = entry;
                }
            }
            Some(best.mv.clone())
        }
    }

    /// 重み 0 の手は候補にしない。読めなければログに残して `None`。
    fn candidates(&self, pos: &Chess) -> Option<Vec<BookEntry>> {
        match self.source.entries(pos) {
            Ok(entries) => {
                let entries: Vec<BookEntry> = entries.into_iter().filter(|e| e.weight > 0).collect();
                if entries.is_empty() { None } else { Some(entries) }
            }
            Err(e) => {
                log::warn!("{e}");
                None
            }
        }
    }

    /// 定跡パネル用の一覧（`move  weight  share%`）。`max_ply` を超えたらファイルを開かない。
    pub fn listing(&self, pos: &Chess, ply: u32) -> Option<String> {
        if ply > self.max_ply {
            return None;
        }
        let entries = self.candidates(pos)?;
        let total: u32 = entries.iter().map(|e| u32::from(e.weight)).sum();
        let board = RulesBoard::from_position(pos.clone());
        let mut out = format!("{:<8}{:>7}{:>9}\n", "move", "weight", "share");
        for e in &entries {
            let share = f64::from(e.weight) * 100.0 / f64::from(total);
            out.push_str(&format!("{:<8}{:>7}{:>8.1}%\n", board.san(&e.mv), e.weight, share));
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use shakmaty::uci::UciMove;

    fn uci(pos: &Chess, text: &str) -> Move {
        text.parse::<UciMove>().unwrap().to_move(pos).unwrap()
    }

    fn encode(m: &Move) -> u16 {
        let from = m.from().unwrap();
        let to = m.to();
        let promo = match m.promotion() {
            None => 0,
            Some(Role::Knight) => 1,
            Some(Role::Bishop) => 2,
            Some(Role::Rook) => 3,
            _ => 4,
        };
        (to.file() as u16)
            | (to.rank() as u16) << 3
            | (from.file() as u16) << 6
            | (from.rank() as u16) << 9
            | promo << 12
    }

    /// (局面, 手, 重み) をキー順に並べて書き出す。
    fn write_book(dir: &Path, entries: &[(Chess, &str, u16)]) -> PathBuf {
        let mut rows: Vec<(u64, u16, u16)> = entries
            .iter()
            .map(|(pos, text, weight)| (repetition_key(pos), encode(&uci(pos, text)), *weight))
            .collect();
        rows.sort_by_key(|r| r.0);
        let mut bytes = Vec::new();
        for (key, mv, weight) in rows {
            bytes.write_u64::<BigEndian>(key).unwrap();
            bytes.write_u16::<BigEndian>(mv).unwrap();
            bytes.write_u16::<BigEndian>(weight).unwrap();
            bytes.write_u32::<BigEndian>(0).unwrap();
        }
        let path = dir.join("book.bin");
        fs::write(&path, bytes).unwrap();
        path
    }

    fn after(moves: &[&str]) -> Chess {
        let mut pos = Chess::default();
        for text in moves {
            let m = uci(&pos, text);
            pos.play_unchecked(&m);
        }
        pos
    }

    #[test]
    fn start_position_uses_polyglot_key() {
        assert_eq!(repetition_key(&Chess::default()), 0x463b_9618_1691_fc9c);
    }

    #[test]
    fn best_weight_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let four = after(&["e2e4", "e7e5", "g1f3", "b8c6"]);
        let path = write_book(
            dir.path(),
            &[
                (Chess::default(), "e2e4", 100),
                (Chess::default(), "d2d4", 60),
                (four.clone(), "f1b5", 100),
            ],
        );
        let advisor = BookAdvisor::new(PolyglotBook::new(path), 8);
        for _ in 0..5 {
            assert_eq!(advisor.get_move(&four, 4, false), Some(uci(&four, "f1b5")));
        }
        assert_eq!(
            advisor.get_move(&Chess::default(), 0, false),
            Some(uci(&Chess::default(), "e2e4"))
        );
        assert_eq!(advisor.get_move(&four, 9, false), None);
        assert_eq!(advisor.get_move(&after(&["a2a3"]), 1, false), None);
    }

    #[test]
    fn random_choice_skips_zero_weights() {
        let dir = tempfile::tempdir().unwrap();
        let start = Chess::default();
        let path = write_book(
            dir.path(),
            &[(start.clone(), "e2e4", 0), (start.clone(), "c2c4", 7), (start.clone(), "g1f3", 0)],
        );
        let advisor = BookAdvisor::new(PolyglotBook::new(path), 8);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(
                advisor.get_move_with(&start, 0, true, &mut rng),
                Some(uci(&start, "c2c4"))
            );
        }
    }

    #[test]
    fn castling_entries_decode_to_castle_moves() {
        let dir = tempfile::tempdir().unwrap();
        let pos = after(&["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "f8c5"]);
        let castle = uci(&pos, "e1g1");
        assert!(castle.is_castle());
        let path = write_book(dir.path(), &[(pos.clone(), "e1g1", 10)]);
        let advisor = BookAdvisor::new(PolyglotBook::new(path), 20);
        assert_eq!(advisor.get_move(&pos, 6, false), Some(castle));
    }

    #[test]
    fn missing_or_truncated_book_is_a_soft_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = BookAdvisor::new(PolyglotBook::new(dir.path().join("none.bin")), 8);
        assert_eq!(missing.get_move(&Chess::default(), 0, false), None);
        assert!(missing.listing(&Chess::default(), 0).is_none());

        let path = dir.path().join("short.bin");
        fs::write(&path, [0u8; 10]).unwrap();
        let book = PolyglotBook::new(&path);
        assert!(matches!(book.entries(&Chess::default()), Err(BookError::Truncated { len: 10, .. })));
    }

    #[test]
    fn lookup_in_a_large_book_finds_every_entry_of_the_key() {
        let dir = tempfile::tempdir().unwrap();
        let start = Chess::default();
        let e4 = after(&["e2e4"]);
        let mut bytes = Vec::new();
        // 開始局面のキーの前後に無関係なエントリを大量に置く
        let key = repetition_key(&start);
        let mut rows: Vec<(u64, u16, u16)> = (0..20_000u64)
            .map(|i| (i.wrapping_mul(0x9e37_79b9_7f4a_7c15), 0, 1))
            .filter(|r| r.0 != key)
            .collect();
        rows.push((key, encode(&uci(&start, "e2e4")), 5));
        rows.push((key, encode(&uci(&start, "c2c4")), 9));
        rows.push((repetition_key(&e4), encode(&uci(&e4, "c7c5")), 4));
        rows.sort_by_key(|r| r.0);
        for (key, mv, weight) in rows {
            bytes.write_u64::<BigEndian>(key).unwrap();
            bytes.write_u16::<BigEndian>(mv).unwrap();
            bytes.write_u16::<BigEndian>(weight).unwrap();
            bytes.write_u32::<BigEndian>(0).unwrap();
        }
        let path = dir.path().join("large.bin");
        fs::write(&path, bytes).unwrap();

        let book = PolyglotBook::new(&path);
        let found = book.entries(&start).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].mv, uci(&start, "e2e4"));
        assert_eq!(found[1].mv, uci(&start, "c2c4"));
        let advisor = BookAdvisor::new(book, 8);
        assert_eq!(advisor.get_move(&e4, 1, false), Some(uci(&e4, "c7c5")));
        assert_eq!(advisor.get_move(&after(&["a2a3"]), 1, false), None);
    }

    #[test]
    fn listing_shows_san_and_share() {
        let dir = tempfile::tempdir().unwrap();
        let start = Chess::default();
        let path = write_book(dir.path(), &[(start.clone(), "e2e4", 3), (start.clone(), "d2d4", 1)]);
        let advisor = BookAdvisor::new(PolyglotBook::new(path), 8);
        assert!(advisor.listing(&start, 9).is_none());
        let text = advisor.listing(&start, 0).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("e4") && lines[1].ends_with("75.0%"));
        assert!(lines[2].starts_with("d4") && lines[2].ends_with("25.0%"));
    }
}
