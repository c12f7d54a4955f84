use usbd_hid::descriptor::KeyboardUsage;

/// Modifier mask bits as reported in every event and in register 0x03
pub const MOD_CTRL: u8 = 1 << 0;
pub const MOD_SHIFT: u8 = 1 << 1;
pub const MOD_ALT: u8 = 1 << 2;
pub const MOD_GUI: u8 = 1 << 3;
pub const MOD_FN: u8 = 1 << 4;

/// Logical keycodes.
///
/// Standard keys carry their HID usage id so a host can forward them
/// untouched. Keys with no HID meaning live in the vendor range from 0xF0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(defmt::Format))]
#[repr(u8)]
pub enum KC {
    /// No key at this position
    No = 0x00,

    // ------------------------------------------------------------------------
    // 0x04‑0x1D: Alphanumeric keys
    Aa = KeyboardUsage::KeyboardAa as u8,
    Bb = KeyboardUsage::KeyboardBb as u8,
    Cc = KeyboardUsage::KeyboardCc as u8,
    Dd = KeyboardUsage::KeyboardDd as u8,
    Ee = KeyboardUsage::KeyboardEe as u8,
    Ff = KeyboardUsage::KeyboardFf as u8,
    Gg = KeyboardUsage::KeyboardGg as u8,
    Hh = KeyboardUsage::KeyboardHh as u8,
    Ii = KeyboardUsage::KeyboardIi as u8,
    Jj = KeyboardUsage::KeyboardJj as u8,
    Kk = KeyboardUsage::KeyboardKk as u8,
    Ll = KeyboardUsage::KeyboardLl as u8,
    Mm = KeyboardUsage::KeyboardMm as u8,
    Nn = KeyboardUsage::KeyboardNn as u8,
    Oo = KeyboardUsage::KeyboardOo as u8,
    Pp = KeyboardUsage::KeyboardPp as u8,
    Qq = KeyboardUsage::KeyboardQq as u8,
    Rr = KeyboardUsage::KeyboardRr as u8,
    Ss = KeyboardUsage::KeyboardSs as u8,
    Tt = KeyboardUsage::KeyboardTt as u8,
    Uu = KeyboardUsage::KeyboardUu as u8,
    Vv = KeyboardUsage::KeyboardVv as u8,
    Ww = KeyboardUsage::KeyboardWw as u8,
    Xx = KeyboardUsage::KeyboardXx as u8,
    Yy = KeyboardUsage::KeyboardYy as u8,
    Zz = KeyboardUsage::KeyboardZz as u8,

    // ------------------------------------------------------------------------
    // 0x1E‑0x27: Number row
    K1 = KeyboardUsage::Keyboard1Exclamation as u8,
    K2 = KeyboardUsage::Keyboard2At as u8,
    K3 = KeyboardUsage::Keyboard3Hash as u8,
    K4 = KeyboardUsage::Keyboard4Dollar as u8,
    K5 = KeyboardUsage::Keyboard5Percent as u8,
    K6 = KeyboardUsage::Keyboard6Caret as u8,
    K7 = KeyboardUsage::Keyboard7Ampersand as u8,
    K8 = KeyboardUsage::Keyboard8Asterisk as u8,
    K9 = KeyboardUsage::Keyboard9OpenParens as u8,
    K0 = KeyboardUsage::Keyboard0CloseParens as u8,

    // ------------------------------------------------------------------------
    // 0x28‑0x38: Control and symbol keys
    Enter = KeyboardUsage::KeyboardEnter as u8,
    Escape = KeyboardUsage::KeyboardEscape as u8,
    Backspace = KeyboardUsage::KeyboardBackspace as u8,
    Tab = KeyboardUsage::KeyboardTab as u8,
    Space = KeyboardUsage::KeyboardSpacebar as u8,
    Comma = KeyboardUsage::KeyboardCommaLess as u8,
    Period = KeyboardUsage::KeyboardPeriodGreater as u8,
    Fslash = KeyboardUsage::KeyboardSlashQuestion as u8,

    // ------------------------------------------------------------------------
    // 0x4F‑0x52: Arrows
    RightArr = KeyboardUsage::KeyboardRightArrow as u8,
    LeftArr = KeyboardUsage::KeyboardLeftArrow as u8,
    DownArr = KeyboardUsage::KeyboardDownArrow as u8,
    UpArr = KeyboardUsage::KeyboardUpArrow as u8,

    // ------------------------------------------------------------------------
    // 0xE0‑0xE7: Modifier keys
    LCtrl = KeyboardUsage::KeyboardLeftControl as u8,
    LShift = KeyboardUsage::KeyboardLeftShift as u8,
    LAlt = KeyboardUsage::KeyboardLeftAlt as u8,
    LGUI = KeyboardUsage::KeyboardLeftGUI as u8,
    RCtrl = KeyboardUsage::KeyboardRightControl as u8,
    RShift = KeyboardUsage::KeyboardRightShift as u8,
    RAlt = KeyboardUsage::KeyboardRightAlt as u8,
    RGUI = KeyboardUsage::KeyboardRightGUI as u8,

    // -----------------------------------------------------------------------
    // Custom Internal Keycodes
    /// Function modifier
    Fn = 0xF0,
    LayerToggle = 0xF1,
    Macro0 = 0xF2,
    Macro1 = 0xF3,
    /// Pointer emulation keys, consumed by the host side mouse logic
    MoClick = 0xF4,
    MoUp = 0xF5,
    MoDown = 0xF6,
    MoLeft = 0xF7,
    MoRight = 0xF8,
}

impl KC {
    /// Bit this key owns in the modifier mask, 0 for ordinary keys
    pub fn get_modifier(&self) -> u8 {
        match self {
            KC::LCtrl | KC::RCtrl => MOD_CTRL,
            KC::LShift | KC::RShift => MOD_SHIFT,
            KC::LAlt | KC::RAlt => MOD_ALT,
            KC::LGUI | KC::RGUI => MOD_GUI,
            KC::Fn => MOD_FN,
            _ => 0x00,
        }
    }
}

pub enum KeyType {
    None,
    Modifier,
    Key,
}

impl KeyType {
    pub fn check_type(key: &KC) -> KeyType {
        match *key {
            KC::No => KeyType::None,

            // return Modifier key type
            KC::LShift
            | KC::LCtrl
            | KC::LAlt
            | KC::LGUI
            | KC::RShift
            | KC::RCtrl
            | KC::RAlt
            | KC::RGUI
            | KC::Fn => KeyType::Modifier,

            _ => KeyType::Key,
        }
    }
}
