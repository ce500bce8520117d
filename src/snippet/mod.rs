pub mod input;
pub mod item;
pub mod search;

pub use input::{FieldError, SnippetRequest, ValidSnippet, ValidationError};
pub use item::{ImageKind, Snippet, SnippetBody, SnippetId, SnippetKind};
