//! Toolkit-independent input vocabulary.
//!
//! The front end translates its native pointer and key events into
//! [`InputEvent`]s; key presses are resolved to logical [`Shortcut`]s by a
//! [`Keymap`] so the editor never sees platform key codes.

use crate::geometry::Point;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    KeyDown { key: Key, modifiers: Modifiers },
    /// A toolbar button or menu entry bound to a logical action.
    Shortcut(Shortcut),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Delete,
    Backspace,
    Escape,
    Space,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Z,
    S,
    G,
    Other,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    /// The Command key on macOS, the Windows/Super key elsewhere.
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn delta(self, step: i32) -> (i32, i32) {
        match self {
            Direction::Left => (-step, 0),
            Direction::Right => (step, 0),
            Direction::Up => (0, -step),
            Direction::Down => (0, step),
        }
    }
}

/// Logical editor actions, independent of how they are triggered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shortcut {
    Undo,
    Redo,
    DeleteSelected,
    ToggleMode,
    Deselect,
    Move { direction: Direction, fast: bool },
    Save,
    ClearAll,
    UndoLastCreated,
    Greyscale,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    Mac,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::Mac
        } else {
            Platform::Other
        }
    }
}

/// Resolves raw key presses to shortcuts. Command-style bindings use Cmd on
/// macOS and Ctrl elsewhere.
#[derive(Clone, Copy, Debug)]
pub struct Keymap {
    platform: Platform,
}

impl Keymap {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    fn command(&self, m: Modifiers) -> bool {
        match self.platform {
            Platform::Mac => m.meta,
            Platform::Other => m.ctrl,
        }
    }

    pub fn resolve(&self, key: Key, m: Modifiers) -> Option<Shortcut> {
        let cmd = self.command(m);
        let shortcut = match key {
            Key::Delete if cmd => Shortcut::ClearAll,
            Key::Delete => Shortcut::DeleteSelected,
            Key::Backspace if self.platform == Platform::Mac && m.meta => {
                Shortcut::DeleteSelected
            }
            Key::Z if cmd && m.shift => Shortcut::Redo,
            Key::Z if cmd => Shortcut::Undo,
            Key::S if cmd => Shortcut::Save,
            Key::G if !cmd && !m.alt => Shortcut::Greyscale,
            Key::Space => Shortcut::ToggleMode,
            Key::Escape => Shortcut::Deselect,
            Key::ArrowLeft => Self::movement(Direction::Left, m),
            Key::ArrowRight => Self::movement(Direction::Right, m),
            Key::ArrowUp => Self::movement(Direction::Up, m),
            Key::ArrowDown => Self::movement(Direction::Down, m),
            _ => return None,
        };
        Some(shortcut)
    }

    fn movement(direction: Direction, m: Modifiers) -> Shortcut {
        Shortcut::Move {
            direction,
            fast: m.shift,
        }
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new(Platform::current())
    }
}
