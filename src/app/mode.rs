use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Navigate, // Browse, copy, open the form, delete
    Search,        // Typing into the search box
    Form,          // Add/edit modal
    ConfirmDelete, // Blocking yes/no prompt
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Navigate => write!(f, "NAVIGATE"),
            Mode::Search => write!(f, "SEARCH"),
            Mode::Form => write!(f, "FORM"),
            Mode::ConfirmDelete => write!(f, "DELETE?"),
        }
    }
}
