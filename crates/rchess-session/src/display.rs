use shakmaty::{Chess, Color, File, Move, Piece, Position, Rank, Role, Square};

/// 画面上の行・列（row 0 が 8 段目）をマスに変換する。
pub fn square_at(row: usize, col: usize) -> Option<Square> {
    if row >= 8 || col >= 8 {
        return None;
    }
    Some(Square::from_coords(File::new(col as u32), Rank::new(7 - row as u32)))
}

pub fn coords_of(sq: Square) -> (usize, usize) {
    (7 - sq.rank() as usize, sq.file() as usize)
}

/// 表示用の 8x8 盤面。局面から作り直さず、指し手ごとに差分で更新する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayBoard {
    squares: [[Option<Piece>; 8]; 8],
}

impl DisplayBoard {
    pub fn from_position(pos: &Chess) -> Self {
        let mut squares = [[None; 8]; 8];
        for sq in Square::ALL {
            let (row, col) = coords_of(sq);
            squares[row][col] = pos.board().piece_at(sq);
        }
        Self { squares }
    }

    pub fn piece(&self, row: usize, col: usize) -> Option<Piece> {
        self.squares.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    pub fn rows(&self) -> &[[Option<Piece>; 8]; 8] {
        &self.squares
    }

    fn take(&mut self, sq: Square) -> Option<Piece> {
        let (row, col) = coords_of(sq);
        self.squares[row][col].take()
    }

    fn put(&mut self, sq: Square, piece: Option<Piece>) {
        let (row, col) = coords_of(sq);
        self.squares[row][col] = piece;
    }

    /// `mover` の指し手を反映する。キャスリングのルーク移動、アンパッサンで取られる
    /// ポーンの除去、成りの駒の置き換えもここで行う。
    pub fn apply(&mut self, m: &Move, mover: Color) {
        match *m {
            Move::Castle { king, rook } => {
                let rank = king.rank();
                let (king_file, rook_file) =
                    if rook.file() > king.file() { (File::G, File::F) } else { (File::C, File::D) };
                self.take(king);
                self.take(rook);
                self.put(Square::from_coords(king_file, rank), Some(Piece { color: mover, role: Role::King }));
                self.put(Square::from_coords(rook_file, rank), Some(Piece { color: mover, role: Role::Rook }));
            }
            Move::EnPassant { from, to } => {
                let pawn = self.take(from);
                self.put(to, pawn);
                // 取られたポーンは移動元と同じ段、移動先と同じ筋にいる
                self.take(Square::from_coords(to.file(), from.rank()));
            }
            Move::Normal { role, from, to, promotion, .. } => {
                self.take(from);
                let placed = Piece { color: mover, role: promotion.unwrap_or(role) };
                self.put(to, Some(placed));
            }
            Move::Put { role, to } => {
                self.put(to, Some(Piece { color: mover, role }));
            }
        }
    }

    /// ターミナル向けの ASCII 表示。白は大文字。
    pub fn render_ascii(&self) -> String {
        ascii_board(&self.squares)
    }
}

/// 8x8 の配列（row 0 が 8 段目）を ASCII にする。
pub fn ascii_board(squares: &[[Option<Piece>; 8]; 8]) -> String {
    let mut out = String::new();
    for (row, pieces) in squares.iter().enumerate() {
        out.push_str(&format!("{} ", 8 - row));
        for piece in pieces {
            out.push(' ');
            out.push(piece.map_or('.', |p| p.char()));
        }
        out.push('\n');
    }
    out.push_str("   a b c d e f g h\n");
    out
}
