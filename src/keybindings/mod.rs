use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// All bindable actions in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    // Navigation
    MoveUp,
    MoveDown,
    JumpTop,
    JumpBottom,

    // Snippets
    Copy,
    NewItem,
    EditItem,
    Delete,
    RetrySave,

    // Search
    FocusSearch,
    ClearSearch,
    SearchConfirm,

    // UI
    ToggleHelp,
    CloseHelp,
    Quit,

    // Form / text input
    EditCancel,
    EditConfirm,
    EditBackspace,
    EditDelete,
    EditLeft,
    EditRight,
    EditHome,
    EditEnd,
    NextField,
    PrevField,
    ToggleKind,
    InsertNewline,
}

const ACTION_NAMES: &[(Action, &str)] = &[
    (Action::MoveUp, "move_up"),
    (Action::MoveDown, "move_down"),
    (Action::JumpTop, "jump_top"),
    (Action::JumpBottom, "jump_bottom"),
    (Action::Copy, "copy"),
    (Action::NewItem, "new_item"),
    (Action::EditItem, "edit_item"),
    (Action::Delete, "delete"),
    (Action::RetrySave, "retry_save"),
    (Action::FocusSearch, "focus_search"),
    (Action::ClearSearch, "clear_search"),
    (Action::SearchConfirm, "search_confirm"),
    (Action::ToggleHelp, "toggle_help"),
    (Action::CloseHelp, "close_help"),
    (Action::Quit, "quit"),
    (Action::EditCancel, "edit_cancel"),
    (Action::EditConfirm, "edit_confirm"),
    (Action::EditBackspace, "edit_backspace"),
    (Action::EditDelete, "edit_delete"),
    (Action::EditLeft, "edit_left"),
    (Action::EditRight, "edit_right"),
    (Action::EditHome, "edit_home"),
    (Action::EditEnd, "edit_end"),
    (Action::NextField, "next_field"),
    (Action::PrevField, "prev_field"),
    (Action::ToggleKind, "toggle_kind"),
    (Action::InsertNewline, "insert_newline"),
];

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = ACTION_NAMES
            .iter()
            .find(|(action, _)| action == self)
            .map(|(_, name)| *name)
            .unwrap_or("unknown");
        write!(f, "{}", name)
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        ACTION_NAMES
            .iter()
            .find(|(_, name)| *name == lower)
            .map(|(action, _)| *action)
            .ok_or_else(|| format!("Unknown action: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        // Terminals report BackTab and uppercase chars with SHIFT set; the key itself carries it.
        let modifiers = match event.code {
            KeyCode::BackTab | KeyCode::Char(_) => event.modifiers - KeyModifiers::SHIFT,
            _ => event.modifiers,
        };
        Self {
            code: event.code,
            modifiers,
        }
    }
}

impl fmt::Display for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if self.modifiers.contains(KeyModifiers::CONTROL) {
            parts.push("C");
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            parts.push("A");
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            parts.push("S");
        }

        let key_str = match self.code {
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Up => "Up".to_string(),
            KeyCode::Down => "Down".to_string(),
            KeyCode::Left => "Left".to_string(),
            KeyCode::Right => "Right".to_string(),
            KeyCode::Tab => "Tab".to_string(),
            KeyCode::BackTab => "S-Tab".to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Backspace => "BS".to_string(),
            KeyCode::Home => "Home".to_string(),
            KeyCode::End => "End".to_string(),
            KeyCode::Delete => "Del".to_string(),
            KeyCode::F(n) => format!("F{}", n),
            _ => format!("{:?}", self.code),
        };

        parts.push(&key_str);

        if parts.len() > 1 || key_str.len() > 1 {
            write!(f, "<{}>", parts.join("-"))
        } else {
            write!(f, "{}", key_str)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySequence(pub Vec<KeyBinding>);

impl KeySequence {
    pub fn is_single(&self) -> bool {
        self.0.len() == 1
    }
}

/// Parse key sequence: "d", "dd", "<C-d>", "<C-d><C-d>", "g g", etc.
impl FromStr for KeySequence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut keys = Vec::new();
        let mut chars = s.trim().chars();

        while let Some(c) = chars.next() {
            match c {
                ' ' => continue,
                '<' => {
                    let mut bracket_content = String::from("<");
                    for inner in chars.by_ref() {
                        bracket_content.push(inner);
                        if inner == '>' {
                            break;
                        }
                    }
                    keys.push(bracket_content.parse::<KeyBinding>()?);
                }
                c => keys.push(KeyBinding::new(KeyCode::Char(c), KeyModifiers::NONE)),
            }
        }

        if keys.is_empty() {
            return Err("Empty key sequence".to_string());
        }

        if keys.len() > 2 {
            return Err("Key sequences longer than 2 are not supported".to_string());
        }

        Ok(KeySequence(keys))
    }
}

impl FromStr for KeyBinding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(inner) = s.strip_prefix('<').and_then(|rest| rest.strip_suffix('>')) {
            return parse_bracket_notation(inner);
        }

        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(KeyBinding::new(KeyCode::Char(c), KeyModifiers::NONE)),
            _ => Err(format!("Invalid key binding: {}", s)),
        }
    }
}

fn parse_bracket_notation(s: &str) -> Result<KeyBinding, String> {
    let parts: Vec<&str> = s.split('-').collect();
    let Some((key_part, modifier_parts)) = parts.split_last() else {
        return Err("Empty key binding".to_string());
    };

    let mut modifiers = KeyModifiers::NONE;
    for part in modifier_parts {
        match part.to_uppercase().as_str() {
            "C" | "CTRL" | "CONTROL" => modifiers |= KeyModifiers::CONTROL,
            "A" | "ALT" | "M" | "META" => modifiers |= KeyModifiers::ALT,
            "S" | "SHIFT" => modifiers |= KeyModifiers::SHIFT,
            _ => return Err(format!("Unknown modifier: {}", part)),
        }
    }

    let code = parse_key_code(key_part)?;

    Ok(KeyBinding::new(code, modifiers))
}

fn parse_key_code(s: &str) -> Result<KeyCode, String> {
    let s_lower = s.to_lowercase();

    match s_lower.as_str() {
        "space" => Ok(KeyCode::Char(' ')),
        "tab" => Ok(KeyCode::Tab),
        "backtab" => Ok(KeyCode::BackTab),
        "enter" | "return" | "cr" => Ok(KeyCode::Enter),
        "esc" | "escape" => Ok(KeyCode::Esc),
        "bs" | "backspace" => Ok(KeyCode::Backspace),
        "up" => Ok(KeyCode::Up),
        "down" => Ok(KeyCode::Down),
        "left" => Ok(KeyCode::Left),
        "right" => Ok(KeyCode::Right),
        "home" => Ok(KeyCode::Home),
        "end" => Ok(KeyCode::End),
        "del" | "delete" => Ok(KeyCode::Delete),
        "pageup" | "pgup" => Ok(KeyCode::PageUp),
        "pagedown" | "pgdn" => Ok(KeyCode::PageDown),
        f if f.starts_with('f') && f.len() > 1 => {
            let n: u8 = f[1..].parse().map_err(|_| format!("Invalid F key: {}", s))?;
            Ok(KeyCode::F(n))
        }
        _ => {
            // Single characters keep their case so "G" and "g" stay distinct.
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(KeyCode::Char(c)),
                _ => Err(format!("Unknown key: {}", s)),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLookupResult {
    Action(Action),
    Pending,
    None,
}

#[derive(Debug, Clone)]
pub struct KeybindingCache {
    navigate_single: HashMap<KeyBinding, Action>,
    navigate_sequences: HashMap<KeyBinding, HashMap<KeyBinding, Action>>,
    navigate_sequence_starters: HashSet<KeyBinding>,

    edit_single: HashMap<KeyBinding, Action>,

    search_single: HashMap<KeyBinding, Action>,
}

fn single_bindings(bindings: &HashMap<String, String>) -> HashMap<KeyBinding, Action> {
    bindings
        .iter()
        .filter_map(|(key_str, action_str)| {
            let seq = key_str.parse::<KeySequence>().ok()?;
            let action = action_str.parse::<Action>().ok()?;
            seq.is_single().then(|| (seq.0[0], action))
        })
        .collect()
}

impl KeybindingCache {
    pub fn from_config(config: &KeybindingsConfig) -> Self {
        let mut navigate_single = HashMap::new();
        let mut navigate_sequences: HashMap<KeyBinding, HashMap<KeyBinding, Action>> =
            HashMap::new();
        let mut navigate_sequence_starters = HashSet::new();

        for (key_str, action_str) in &config.navigate {
            if let (Ok(seq), Ok(action)) =
                (key_str.parse::<KeySequence>(), action_str.parse::<Action>())
            {
                if seq.is_single() {
                    navigate_single.insert(seq.0[0], action);
                } else {
                    let first = seq.0[0];
                    let second = seq.0[1];
                    navigate_sequence_starters.insert(first);
                    navigate_sequences
                        .entry(first)
                        .or_default()
                        .insert(second, action);
                }
            }
        }

        Self {
            navigate_single,
            navigate_sequences,
            navigate_sequence_starters,
            edit_single: single_bindings(&config.edit),
            search_single: single_bindings(&config.search),
        }
    }

    pub fn lookup_navigate(&self, event: &KeyEvent, pending: Option<KeyBinding>) -> KeyLookupResult {
        let binding = KeyBinding::from_event(event);

        if let Some(first_key) = pending {
            if let Some(&action) = self
                .navigate_sequences
                .get(&first_key)
                .and_then(|second_map| second_map.get(&binding))
            {
                return KeyLookupResult::Action(action);
            }
            return KeyLookupResult::None;
        }

        if self.navigate_sequence_starters.contains(&binding) {
            return KeyLookupResult::Pending;
        }

        if let Some(&action) = self.navigate_single.get(&binding) {
            return KeyLookupResult::Action(action);
        }

        KeyLookupResult::None
    }

    /// Single-key action bound under `navigate`, ignoring sequences.
    pub fn navigate_single_action(&self, event: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(event);
        self.navigate_single.get(&binding).copied()
    }

    pub fn get_edit_action(&self, event: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(event);
        self.edit_single.get(&binding).copied()
    }

    /// Search-specific bindings win; cursor movement falls through to the edit map.
    pub fn get_search_action(&self, event: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(event);
        self.search_single
            .get(&binding)
            .or_else(|| self.edit_single.get(&binding))
            .copied()
    }

    /// Keys bound to `action` in the navigate map, for the help overlay.
    pub fn keys_for(&self, action: Action) -> Vec<String> {
        let mut keys: Vec<String> = self
            .navigate_single
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|(k, _)| k.to_string())
            .chain(self.navigate_sequences.iter().flat_map(|(first, seconds)| {
                seconds
                    .iter()
                    .filter(|(_, a)| **a == action)
                    .map(move |(second, _)| format!("{}{}", first, second))
            }))
            .collect();
        keys.sort();
        keys
    }
}

impl Default for KeybindingCache {
    fn default() -> Self {
        Self::from_config(&KeybindingsConfig::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeybindingsConfig {
    #[serde(default = "default_navigate_bindings")]
    pub navigate: HashMap<String, String>,

    #[serde(default = "default_edit_bindings")]
    pub edit: HashMap<String, String>,

    #[serde(default = "default_search_bindings")]
    pub search: HashMap<String, String>,
}

impl Default for KeybindingsConfig {
    fn default() -> Self {
        Self {
            navigate: default_navigate_bindings(),
            edit: default_edit_bindings(),
            search: default_search_bindings(),
        }
    }
}

impl KeybindingsConfig {
    /// User entries override defaults key by key; unbound defaults stay.
    pub fn merge_with_defaults(self) -> Self {
        fn merge(
            mut base: HashMap<String, String>,
            overrides: HashMap<String, String>,
        ) -> HashMap<String, String> {
            base.extend(overrides);
            base
        }

        let defaults = Self::default();
        Self {
            navigate: merge(defaults.navigate, self.navigate),
            edit: merge(defaults.edit, self.edit),
            search: merge(defaults.search, self.search),
        }
    }
}

fn default_navigate_bindings() -> HashMap<String, String> {
    let mut m = HashMap::new();

    m.insert("k".to_string(), "move_up".to_string());
    m.insert("j".to_string(), "move_down".to_string());
    m.insert("<Up>".to_string(), "move_up".to_string());
    m.insert("<Down>".to_string(), "move_down".to_string());
    m.insert("gg".to_string(), "jump_top".to_string());
    m.insert("G".to_string(), "jump_bottom".to_string());
    m.insert("y".to_string(), "copy".to_string());
    m.insert("<Enter>".to_string(), "copy".to_string());
    m.insert("n".to_string(), "new_item".to_string());
    m.insert("a".to_string(), "new_item".to_string());
    m.insert("e".to_string(), "edit_item".to_string());
    m.insert("i".to_string(), "edit_item".to_string());
    m.insert("dd".to_string(), "delete".to_string());
    m.insert("<Del>".to_string(), "delete".to_string());
    m.insert("r".to_string(), "retry_save".to_string());
    m.insert("/".to_string(), "focus_search".to_string());
    m.insert("?".to_string(), "toggle_help".to_string());
    m.insert("<Esc>".to_string(), "close_help".to_string());
    m.insert("q".to_string(), "quit".to_string());

    m
}

fn default_edit_bindings() -> HashMap<String, String> {
    let mut m = HashMap::new();

    m.insert("<Esc>".to_string(), "edit_cancel".to_string());
    m.insert("<Enter>".to_string(), "edit_confirm".to_string());
    m.insert("<BS>".to_string(), "edit_backspace".to_string());
    m.insert("<Del>".to_string(), "edit_delete".to_string());
    m.insert("<Left>".to_string(), "edit_left".to_string());
    m.insert("<Right>".to_string(), "edit_right".to_string());
    m.insert("<Home>".to_string(), "edit_home".to_string());
    m.insert("<End>".to_string(), "edit_end".to_string());
    m.insert("<Tab>".to_string(), "next_field".to_string());
    m.insert("<Down>".to_string(), "next_field".to_string());
    m.insert("<BackTab>".to_string(), "prev_field".to_string());
    m.insert("<Up>".to_string(), "prev_field".to_string());
    m.insert("<C-t>".to_string(), "toggle_kind".to_string());
    m.insert("<A-Enter>".to_string(), "insert_newline".to_string());
    m.insert("<C-j>".to_string(), "insert_newline".to_string());

    m
}

fn default_search_bindings() -> HashMap<String, String> {
    let mut m = HashMap::new();

    m.insert("<Esc>".to_string(), "clear_search".to_string());
    m.insert("<Enter>".to_string(), "search_confirm".to_string());
    m.insert("<Up>".to_string(), "move_up".to_string());
    m.insert("<Down>".to_string(), "move_down".to_string());

    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_key() {
        let binding: KeyBinding = "j".parse().unwrap();
        assert_eq!(binding.code, KeyCode::Char('j'));
        assert_eq!(binding.modifiers, KeyModifiers::NONE);
    }

    #[test]
    fn test_parse_modifier_key() {
        let binding: KeyBinding = "<C-t>".parse().unwrap();
        assert_eq!(binding.code, KeyCode::Char('t'));
        assert!(binding.modifiers.contains(KeyModifiers::CONTROL));
    }

    #[test]
    fn test_parse_keeps_char_case() {
        let binding: KeyBinding = "G".parse().unwrap();
        assert_eq!(binding.code, KeyCode::Char('G'));
    }

    #[test]
    fn test_parse_sequence_double() {
        let seq: KeySequence = "dd".parse().unwrap();
        assert!(!seq.is_single());
        assert_eq!(seq.0[0].code, KeyCode::Char('d'));
        assert_eq!(seq.0[1].code, KeyCode::Char('d'));
    }

    #[test]
    fn test_parse_sequence_brackets() {
        let seq: KeySequence = "<C-d><C-d>".parse().unwrap();
        assert_eq!(seq.0.len(), 2);
        assert!(seq.0[1].modifiers.contains(KeyModifiers::CONTROL));
    }

    #[test]
    fn test_parse_rejects_long_sequence() {
        assert!("ddd".parse::<KeySequence>().is_err());
        assert!("".parse::<KeySequence>().is_err());
    }

    #[test]
    fn test_enter_copies_in_navigate() {
        let cache = KeybindingCache::default();

        let event = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(
            cache.lookup_navigate(&event, None),
            KeyLookupResult::Action(Action::Copy)
        );
    }

    #[test]
    fn test_shifted_char_matches_uppercase_binding() {
        let cache = KeybindingCache::default();

        let event = KeyEvent::new(KeyCode::Char('G'), KeyModifiers::SHIFT);
        assert_eq!(
            cache.lookup_navigate(&event, None),
            KeyLookupResult::Action(Action::JumpBottom)
        );
    }

    #[test]
    fn test_cache_sequence_lookup() {
        let cache = KeybindingCache::default();

        let d_event = KeyEvent::new(KeyCode::Char('d'), KeyModifiers::NONE);
        let d_binding = KeyBinding::from_event(&d_event);

        assert_eq!(cache.lookup_navigate(&d_event, None), KeyLookupResult::Pending);
        assert_eq!(
            cache.lookup_navigate(&d_event, Some(d_binding)),
            KeyLookupResult::Action(Action::Delete)
        );
    }

    #[test]
    fn test_search_falls_through_to_edit_map() {
        let cache = KeybindingCache::default();

        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        let bs = KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE);
        assert_eq!(cache.get_search_action(&esc), Some(Action::ClearSearch));
        assert_eq!(cache.get_search_action(&bs), Some(Action::EditBackspace));
    }

    #[test]
    fn test_merge_with_defaults_overrides_and_keeps() {
        let mut navigate = HashMap::new();
        navigate.insert("c".to_string(), "copy".to_string());
        let config = KeybindingsConfig {
            navigate,
            edit: HashMap::new(),
            search: HashMap::new(),
        }
        .merge_with_defaults();

        let cache = KeybindingCache::from_config(&config);
        let c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);
        let y = KeyEvent::new(KeyCode::Char('y'), KeyModifiers::NONE);
        assert_eq!(cache.navigate_single_action(&c), Some(Action::Copy));
        assert_eq!(cache.navigate_single_action(&y), Some(Action::Copy));
    }

    #[test]
    fn test_newline_chords_in_edit_map() {
        let cache = KeybindingCache::default();

        let alt_enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT);
        let ctrl_j = KeyEvent::new(KeyCode::Char('j'), KeyModifiers::CONTROL);
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(cache.get_edit_action(&alt_enter), Some(Action::InsertNewline));
        assert_eq!(cache.get_edit_action(&ctrl_j), Some(Action::InsertNewline));
        assert_eq!(cache.get_edit_action(&enter), Some(Action::EditConfirm));
    }

    #[test]
    fn test_keys_for_help() {
        let cache = KeybindingCache::default();
        assert_eq!(cache.keys_for(Action::Delete), vec!["<Del>", "dd"]);
    }

    #[test]
    fn test_action_roundtrip() {
        for (action, _) in ACTION_NAMES {
            let parsed: Action = action.to_string().parse().unwrap();
            assert_eq!(*action, parsed);
        }
    }
}
