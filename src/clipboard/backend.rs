use super::image::DecodedImage;
use super::{ClipboardBackend, ClipboardError};
use arboard::{Clipboard, ImageData};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use crossterm::{execute, style::Print};
use std::io::{self, IsTerminal};
use std::sync::Mutex;
use std::time::Duration;

/// System clipboard through `arboard`. The handle is kept for the lifetime of
/// the backend; on X11/Wayland contents only survive while it is alive.
#[derive(Default)]
pub struct ArboardBackend {
    clipboard: Mutex<Option<Clipboard>>,
    hold: Option<Duration>,
}

impl ArboardBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// On X11/Wayland each write blocks until another program takes the
    /// clipboard or `hold` elapses, so a short-lived process can exit
    /// without its contents vanishing. Other platforms ignore `hold`.
    pub fn holding(hold: Duration) -> Self {
        Self {
            clipboard: Mutex::default(),
            hold: (!hold.is_zero()).then_some(hold),
        }
    }

    pub fn hold(&self) -> Option<Duration> {
        self.hold
    }

    fn with_clipboard<T>(
        &self,
        f: impl FnOnce(&mut Clipboard) -> Result<T, arboard::Error>,
    ) -> Result<T, ClipboardError> {
        let mut guard = self
            .clipboard
            .lock()
            .map_err(|_| ClipboardError::Unavailable("clipboard lock poisoned".to_string()))?;

        if guard.is_none() {
            let clipboard = Clipboard::new()
                .map_err(|e| ClipboardError::Unavailable(format!("failed to access system clipboard: {e}")))?;
            *guard = Some(clipboard);
        }

        match guard.as_mut() {
            Some(clipboard) => f(clipboard).map_err(|e| ClipboardError::Rejected(e.to_string())),
            None => Err(ClipboardError::Unavailable("system clipboard not initialised".to_string())),
        }
    }
}

impl ClipboardBackend for ArboardBackend {
    fn name(&self) -> &'static str {
        "system"
    }

    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        match self.hold {
            #[cfg(target_os = "linux")]
            Some(hold) => {
                use arboard::SetExtLinux;
                let deadline = std::time::Instant::now() + hold;
                self.with_clipboard(|cb| cb.set().wait_until(deadline).text(text))
            }
            _ => self.with_clipboard(|cb| cb.set_text(text)),
        }
    }

    fn set_image(&self, image: &DecodedImage) -> Result<(), ClipboardError> {
        let data = ImageData {
            width: image.width,
            height: image.height,
            bytes: image.rgba.as_slice().into(),
        };
        match self.hold {
            #[cfg(target_os = "linux")]
            Some(hold) => {
                use arboard::SetExtLinux;
                let deadline = std::time::Instant::now() + hold;
                self.with_clipboard(|cb| cb.set().wait_until(deadline).image(data))
            }
            _ => self.with_clipboard(|cb| cb.set_image(data)),
        }
    }

    fn selected_text(&self) -> Result<String, ClipboardError> {
        #[cfg(target_os = "linux")]
        {
            use arboard::{GetExtLinux, LinuxClipboardKind};
            self.with_clipboard(|cb| cb.get().clipboard(LinuxClipboardKind::Primary).text())
        }
        #[cfg(not(target_os = "linux"))]
        {
            self.with_clipboard(|cb| cb.get_text())
        }
    }
}

/// Terminal fallback: the OSC 52 escape asks the hosting terminal to set its
/// clipboard. Text only, and only when stdout is a terminal.
#[derive(Debug, Default)]
pub struct Osc52Backend;

impl ClipboardBackend for Osc52Backend {
    fn name(&self) -> &'static str {
        "osc52"
    }

    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut stdout = io::stdout();
        if !stdout.is_terminal() {
            return Err(ClipboardError::Unavailable("stdout is not a terminal".to_string()));
        }
        execute!(stdout, Print(osc52_sequence(text))).map_err(|e| ClipboardError::Rejected(e.to_string()))
    }

    fn set_image(&self, _image: &DecodedImage) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unsupported("osc52 cannot carry images"))
    }

    fn selected_text(&self) -> Result<String, ClipboardError> {
        Err(ClipboardError::Unsupported("osc52 cannot read the selection"))
    }
}

pub fn osc52_sequence(text: &str) -> String {
    let encoded = STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x1b\\")
}
