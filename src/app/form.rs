use crate::snippet::input::{ImageFileError, image_file_to_data_url};
use crate::snippet::{
    FieldError, ImageKind, Snippet, SnippetBody, SnippetId, SnippetKind, SnippetRequest,
    ValidationError,
};
use crate::utils::unicode::{next_char_boundary, prev_char_boundary};
use std::path::Path;

/// Text buffer with a byte cursor kept on char boundaries. Only the content
/// field ever holds newlines; line-wise keys act on the cursor's line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    pub value: String,
    pub cursor: usize,
}

impl TextInput {
    pub fn with_value(value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.len();
        Self { value, cursor }
    }

    pub fn insert(&mut self, c: char) {
        self.value.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let prev = prev_char_boundary(&self.value, self.cursor);
            self.value.replace_range(prev..self.cursor, "");
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.value.len() {
            let next = next_char_boundary(&self.value, self.cursor);
            self.value.replace_range(self.cursor..next, "");
        }
    }

    pub fn left(&mut self) {
        self.cursor = prev_char_boundary(&self.value, self.cursor);
    }

    pub fn right(&mut self) {
        self.cursor = next_char_boundary(&self.value, self.cursor);
    }

    pub fn insert_str(&mut self, text: &str) {
        self.value.insert_str(self.cursor, text);
        self.cursor += text.len();
    }

    pub fn home(&mut self) {
        self.cursor = self.value[..self.cursor]
            .rfind('\n')
            .map_or(0, |i| i + 1);
    }

    pub fn end(&mut self) {
        self.cursor += self.value[self.cursor..]
            .find('\n')
            .unwrap_or(self.value.len() - self.cursor);
    }

    /// Zero-based line of the cursor and the text before it on that line.
    pub fn cursor_line(&self) -> (usize, &str) {
        let before = &self.value[..self.cursor];
        let line = before.matches('\n').count();
        let start = before.rfind('\n').map_or(0, |i| i + 1);
        (line, &before[start..])
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormTarget {
    Create,
    Update(SnippetId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Kind,
    Content,
    ImageUrl,
    ImageFile,
}

impl FormField {
    pub fn label(&self) -> &'static str {
        match self {
            FormField::Title => "Title",
            FormField::Kind => "Type",
            FormField::Content => "Content",
            FormField::ImageUrl => "Image URL",
            FormField::ImageFile => "Image file",
        }
    }
}

/// Add/edit modal state. Everything a save needs travels in here.
#[derive(Debug, Clone)]
pub struct SnippetForm {
    pub target: FormTarget,
    pub kind: SnippetKind,
    pub title: TextInput,
    pub content: TextInput,
    pub image_url: TextInput,
    pub image_path: TextInput,
    /// Embedded image carried over from the snippet being edited.
    pub embedded_image: Option<String>,
    pub focus: FormField,
    pub errors: Vec<FieldError>,
    pub file_error: Option<String>,
}

impl SnippetForm {
    pub fn create() -> Self {
        Self {
            target: FormTarget::Create,
            kind: SnippetKind::Text,
            title: TextInput::default(),
            content: TextInput::default(),
            image_url: TextInput::default(),
            image_path: TextInput::default(),
            embedded_image: None,
            focus: FormField::Title,
            errors: Vec::new(),
            file_error: None,
        }
    }

    pub fn edit(snippet: &Snippet) -> Self {
        let mut form = Self::create();
        form.target = FormTarget::Update(snippet.id.clone());
        form.kind = snippet.kind();
        form.title = TextInput::with_value(snippet.title.clone());

        match &snippet.body {
            SnippetBody::Text { content } => {
                form.content = TextInput::with_value(content.clone());
            }
            SnippetBody::Image {
                image_src,
                image_kind: ImageKind::Url,
            } => {
                form.image_url = TextInput::with_value(image_src.clone());
            }
            SnippetBody::Image {
                image_src,
                image_kind: ImageKind::DataUrl,
            } => {
                form.embedded_image = Some(image_src.clone());
            }
        }
        form
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.target, FormTarget::Update(_))
    }

    pub fn visible_fields(&self) -> &'static [FormField] {
        match self.kind {
            SnippetKind::Text => &[FormField::Title, FormField::Kind, FormField::Content],
            SnippetKind::Image => &[
                FormField::Title,
                FormField::Kind,
                FormField::ImageUrl,
                FormField::ImageFile,
            ],
        }
    }

    pub fn next_field(&mut self) {
        self.step_focus(1);
    }

    pub fn prev_field(&mut self) {
        let len = self.visible_fields().len();
        self.step_focus(len - 1);
    }

    fn step_focus(&mut self, by: usize) {
        let fields = self.visible_fields();
        let current = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(current + by) % fields.len()];
    }

    /// Switch between text and image, keeping whatever was typed in both.
    pub fn toggle_kind(&mut self) {
        self.kind = self.kind.toggle();
        self.errors
            .retain(|e| !matches!(e, FieldError::MissingContent | FieldError::MissingImage));
        self.file_error = None;
        if !self.visible_fields().contains(&self.focus) {
            self.focus = FormField::Kind;
        }
    }

    pub fn focused_input_mut(&mut self) -> Option<&mut TextInput> {
        match self.focus {
            FormField::Title => Some(&mut self.title),
            FormField::Kind => None,
            FormField::Content => Some(&mut self.content),
            FormField::ImageUrl => Some(&mut self.image_url),
            FormField::ImageFile => Some(&mut self.image_path),
        }
    }

    pub fn input(&self, field: FormField) -> Option<&TextInput> {
        match field {
            FormField::Title => Some(&self.title),
            FormField::Kind => None,
            FormField::Content => Some(&self.content),
            FormField::ImageUrl => Some(&self.image_url),
            FormField::ImageFile => Some(&self.image_path),
        }
    }

    /// Backspace on an empty file field drops the carried-over embedded image.
    pub fn backspace(&mut self) {
        if self.focus == FormField::ImageFile && self.image_path.is_empty() {
            self.embedded_image = None;
            return;
        }
        if let Some(input) = self.focused_input_mut() {
            input.backspace();
        }
    }

    /// Newlines are only meaningful in the content field.
    pub fn insert_newline(&mut self) {
        if self.focus == FormField::Content {
            self.content.insert('\n');
        }
    }

    /// Insert pasted text at the cursor. Single-line fields get line breaks as spaces.
    pub fn paste(&mut self, text: &str) {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        let multi_line = self.focus == FormField::Content;
        if let Some(input) = self.focused_input_mut() {
            if multi_line {
                input.insert_str(&normalized);
            } else {
                input.insert_str(&normalized.replace('\n', " "));
            }
        }
    }

    /// Build the request. A typed file path is read into a data URL, but only
    /// for image snippets; hidden image fields never block a text save.
    pub fn to_request(&self) -> Result<SnippetRequest, ImageFileError> {
        let image_file = match (self.kind, self.image_path.as_str().trim()) {
            (SnippetKind::Text, _) => None,
            (SnippetKind::Image, "") => self.embedded_image.clone(),
            (SnippetKind::Image, path) => Some(image_file_to_data_url(Path::new(path))?),
        };

        Ok(SnippetRequest {
            kind: self.kind,
            title: self.title.value.clone(),
            content: self.content.value.clone(),
            image_url: self.image_url.value.clone(),
            image_file,
        })
    }

    pub fn set_errors(&mut self, error: &ValidationError) {
        self.errors = error.fields.clone();
        self.focus = match self.errors.first() {
            Some(FieldError::MissingTitle) => FormField::Title,
            Some(FieldError::MissingContent) => FormField::Content,
            Some(FieldError::MissingImage) => FormField::ImageUrl,
            None => self.focus,
        };
    }

    pub fn field_error(&self, field: FormField) -> Option<&str> {
        if field == FormField::ImageFile {
            return self.file_error.as_deref();
        }
        let wanted = match field {
            FormField::Title => FieldError::MissingTitle,
            FormField::Content => FieldError::MissingContent,
            FormField::ImageUrl => FieldError::MissingImage,
            FormField::Kind | FormField::ImageFile => return None,
        };
        self.errors
            .iter()
            .find(|e| **e == wanted)
            .map(FieldError::message)
    }
}
