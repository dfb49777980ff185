use shakmaty::{Color, Piece, Role};

/// 対局ループが毎周回表示層に渡す内容。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionView {
    pub status: String,
    pub human_clock: String,
    pub engine_clock: String,
    pub move_list: String,
    pub search_info: String,
    pub book_moves: String,
    /// row 0 が 8 段目。
    pub board: [[Option<Piece>; 8]; 8],
    pub selected: Option<(usize, usize)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    /// ユーザーの操作が必要なもの。
    Error,
}

/// ユーザーに見せる通知。GUI ならモーダルで出す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, title: title.into(), message: message.into() }
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, title: title.into(), message: message.into() }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, title: title.into(), message: message.into() }
    }
}

/// 表示層。対局ループと同じスレッドから呼ばれる。
pub trait Presenter {
    fn render(&mut self, view: &SessionView);

    fn notify(&mut self, notice: &Notice);

    /// 成る駒を選ばせる。`None` ならクイーン。
    fn choose_promotion(&mut self, color: Color) -> Option<Role>;
}
