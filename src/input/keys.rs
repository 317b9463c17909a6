//! Keyboard input model for the global shortcut contract.

/// A key as the shortcut layer cares about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character (excluding space, which has its own role).
    Char(char),
    Space,
    Enter,
    Escape,
    /// Anything else (arrows, function keys, bare modifiers).
    Other,
}

/// One key press as delivered by the host shell, with the focus context the
/// shortcut rules depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
    pub shift: bool,
    /// Whether a text-editable element currently has focus. Global
    /// shortcuts that would steal characters are suppressed when it does.
    pub editable_focused: bool,
}

impl KeyInput {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            alt: false,
            meta: false,
            shift: false,
            editable_focused: false,
        }
    }

    pub fn ch(c: char) -> Self {
        Self::plain(Key::Char(c))
    }

    pub fn in_editable(mut self) -> Self {
        self.editable_focused = true;
        self
    }

    /// Whether any chording modifier is held. Shift is excluded: it is how
    /// capitals are typed.
    pub fn chorded(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_is_not_a_chord() {
        let mut k = KeyInput::ch('A');
        k.shift = true;
        assert!(!k.chorded());
        k.ctrl = true;
        assert!(k.chorded());
    }
}
