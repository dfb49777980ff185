use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{
    CastlingMode, Chess, Color, EnPassantMode, Move, MoveList, Piece, Position, Rank, Role, Square,
};

use crate::error::FenError;

/// 50 手ルールの請求に必要な半手数。
const FIFTY_MOVE_PLIES: u32 = 100;
/// 請求なしで引き分けになる半手数。
const SEVENTY_FIVE_MOVE_PLIES: u32 = 150;

/// 対局中の唯一の局面。shakmaty の局面に千日手判定用の履歴を添えたもの。
#[derive(Debug, Clone)]
pub struct RulesBoard {
    pos: Chess,
    history: Vec<u64>,
}

impl Default for RulesBoard {
    fn default() -> Self {
        Self::from_position(Chess::default())
    }
}

impl RulesBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_position(pos: Chess) -> Self {
        let key = repetition_key(&pos);
        Self { pos, history: vec![key] }
    }

    pub fn from_fen(text: &str) -> Result<Self, FenError> {
        let fen: Fen = text.trim().parse().map_err(|e| FenError::Syntax(format!("{e}")))?;
        let pos: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|e| FenError::Position(format!("{e}")))?;
        Ok(Self::from_position(pos))
    }

    pub fn fen(&self) -> String {
        Fen::from_position(self.pos.clone(), EnPassantMode::Legal).to_string()
    }

    pub fn position(&self) -> &Chess {
        &self.pos
    }

    pub fn turn(&self) -> Color {
        self.pos.turn()
    }

    pub fn fullmove_number(&self) -> u32 {
        self.pos.fullmoves().get()
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.pos.board().piece_at(sq)
    }

    pub fn piece_type_at(&self, sq: Square) -> Option<Role> {
        self.pos.board().role_at(sq)
    }

    pub fn legal_moves(&self) -> MoveList {
        self.pos.legal_moves()
    }

    pub fn is_legal(&self, m: &Move) -> bool {
        self.pos.is_legal(m)
    }

    /// 盤上の from/to（と成り駒）を合法手に解決する。キャスリングは王の移動先で指定する。
    pub fn resolve(&self, from: Square, to: Square, promotion: Option<Role>) -> Option<Move> {
        let m = UciMove::Normal { from, to, promotion }.to_move(&self.pos).ok()?;
        self.is_legal(&m).then_some(m)
    }

    /// 手番側のポーンが最終段に到達する合法手か。塞がれた前進や空の斜めは含まない。
    pub fn is_promotion_move(&self, from: Square, to: Square) -> bool {
        let turn = self.turn();
        let last_rank = match turn {
            Color::White => Rank::Eighth,
            Color::Black => Rank::First,
        };
        self.piece_at(from) == Some(Piece { color: turn, role: Role::Pawn })
            && to.rank() == last_rank
            && self.resolve(from, to, Some(Role::Queen)).is_some()
    }

    /// チェック記号付きの SAN。局面は変えない。
    pub fn san(&self, m: &Move) -> String {
        let mut pos = self.pos.clone();
        SanPlus::from_move_and_play_unchecked(&mut pos, m).to_string()
    }

    pub fn is_castling(&self, m: &Move) -> bool {
        m.is_castle()
    }

    pub fn is_en_passant(&self, m: &Move) -> bool {
        m.is_en_passant()
    }

    /// 合法性は呼び出し側で確認済みであること。
    pub fn push(&mut self, m: &Move) {
        self.pos.play_unchecked(m);
        self.history.push(repetition_key(&self.pos));
    }

    fn repetitions(&self) -> usize {
        let Some(current) = self.history.last() else {
            return 0;
        };
        self.history.iter().filter(|k| *k == current).count()
    }

    pub fn can_claim_draw(&self) -> bool {
        self.pos.halfmoves() >= FIFTY_MOVE_PLIES || self.repetitions() >= 3
    }

    /// 終局理由。`claim_draw` なら 50 手ルールと 3 回同一局面も含める。
    pub fn termination(&self, claim_draw: bool) -> Option<&'static str> {
        if self.pos.is_checkmate() {
            Some("checkmate")
        } else if self.pos.is_stalemate() {
            Some("stalemate")
        } else if self.pos.is_insufficient_material() {
            Some("insufficient material")
        } else if self.pos.halfmoves() >= SEVENTY_FIVE_MOVE_PLIES {
            Some("seventy-five-move rule")
        } else if self.repetitions() >= 5 {
            Some("fivefold repetition")
        } else if claim_draw && self.pos.halfmoves() >= FIFTY_MOVE_PLIES {
            Some("fifty-move rule")
        } else if claim_draw && self.repetitions() >= 3 {
            Some("threefold repetition")
        } else {
            None
        }
    }

    pub fn is_game_over(&self, claim_draw: bool) -> bool {
        self.termination(claim_draw).is_some()
    }

    /// `1-0` / `0-1` / `1/2-1/2`、終局していなければ `*`。
    pub fn result(&self, claim_draw: bool) -> &'static str {
        if !self.is_game_over(claim_draw) {
            "*"
        } else if self.pos.is_checkmate() {
            match self.turn() {
                Color::White => "0-1",
                Color::Black => "1-0",
            }
        } else {
            "1/2-1/2"
        }
    }
}

/// 千日手判定のキー。Polyglot 互換の Zobrist ハッシュをそのまま使う。
pub fn repetition_key(pos: &Chess) -> u64 {
    pos.zobrist_hash::<Zobrist64>(EnPassantMode::Legal).0
}
