use crate::config::{COLS, DISCRETE_KEYS, ROWS};
use crate::event::CursorDirection;
use crate::keycodes::KC;

/// Matrix layout, indexed `[row][col]`
pub const MATRIX_LAYOUT: [[KC; COLS]; ROWS] = [
    [KC::K4, KC::K5, KC::K7, KC::K6, KC::K8, KC::K9, KC::K0],
    [KC::Rr, KC::Tt, KC::Uu, KC::Yy, KC::Ii, KC::Oo, KC::Pp],
    [KC::Ff, KC::Gg, KC::Comma, KC::Hh, KC::Period, KC::Ll, KC::Enter],
    [KC::K3, KC::Ee, KC::Cc, KC::Dd, KC::LShift, KC::Mm, KC::UpArr],
    [KC::K2, KC::Escape, KC::LAlt, KC::Tab, KC::Vv, KC::LCtrl, KC::Backspace],
    [KC::K1, KC::Qq, KC::Fn, KC::Zz, KC::Bb, KC::Nn, KC::RShift],
];

/// Discrete switches, in pin order
pub const DISCRETE_LAYOUT: [KC; DISCRETE_KEYS] = [
    KC::Ww,
    KC::Aa,
    KC::Ss,
    KC::Xx,
    KC::Jj,
    KC::Kk,
    KC::MoClick,
    KC::MoDown,
    KC::MoUp,
    KC::MoRight,
    KC::MoLeft,
];

/// Discrete switches that double as cursor directions
pub const CURSOR_KEYS: [(usize, CursorDirection); 5] = [
    (0, CursorDirection::Up),
    (1, CursorDirection::Down),
    (2, CursorDirection::Left),
    (3, CursorDirection::Right),
    (4, CursorDirection::Center),
];

pub fn matrix_keycode(row: usize, col: usize) -> KC {
    MATRIX_LAYOUT
        .get(row)
        .and_then(|r| r.get(col))
        .copied()
        .unwrap_or(KC::No)
}

pub fn discrete_keycode(index: usize) -> KC {
    DISCRETE_LAYOUT.get(index).copied().unwrap_or(KC::No)
}

/// Cursor direction bound to a discrete switch, if any
pub fn cursor_direction(index: usize) -> Option<CursorDirection> {
    CURSOR_KEYS
        .iter()
        .find(|(key, _)| *key == index)
        .map(|(_, direction)| *direction)
}
