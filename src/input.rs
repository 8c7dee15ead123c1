//! Key bindings: arrows, vim (hjkl) and wasd.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use mergetui::Direction;

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Move(Direction),
    NewGame,
    Quit,
    None,
}

/// Map key event to game action.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL {
        return match code {
            KeyCode::Char('c') => Action::Quit,
            _ => Action::None,
        };
    }
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('n' | 'r') => Action::NewGame,
        KeyCode::Up | KeyCode::Char('k' | 'w') => Action::Move(Direction::Up),
        KeyCode::Down | KeyCode::Char('j' | 's') => Action::Move(Direction::Down),
        KeyCode::Left | KeyCode::Char('h' | 'a') => Action::Move(Direction::Left),
        KeyCode::Right | KeyCode::Char('l' | 'd') => Action::Move(Direction::Right),
        _ => Action::None,
    }
}
