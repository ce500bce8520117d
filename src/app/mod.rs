pub mod event;
pub mod form;
pub mod mode;
pub mod state;

pub use form::{FormField, FormTarget, SnippetForm, TextInput};
pub use mode::Mode;
pub use state::AppState;
