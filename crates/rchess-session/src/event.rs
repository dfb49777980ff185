use crate::clock::TimeControl;

/// 表示層から対局ループへ届く入力。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// row 0 が 8 段目、col 0 が a 筋。
    SquareSelected { row: usize, col: usize },
    Menu(MenuAction),
    /// 画面更新の催促。時計は実時間で進むので中身はない。
    TimerTick,
}

/// 時間設定を変える対象。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Human,
    Engine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    NewGame,
    Resign,
    /// 人間が黒のとき、エンジンに初手を指させる。
    Go,
    /// 探索を打ち切って今の最善手を指させる。
    MoveNow,
    PasteFen(String),
    SetDepth(u32),
    SetTimeControl { side: Side, control: TimeControl },
    /// 設定済みエンジンを名前で選ぶ。
    SelectEngine(String),
    AdjudicateWin,
    AdjudicateDraw,
    SaveGame,
    ExitGame,
    ExitApp,
}

impl From<MenuAction> for UiEvent {
    fn from(action: MenuAction) -> Self {
        UiEvent::Menu(action)
    }
}
