//! Projection of a todo list into visual rows, and the renderers that draw them.
//!
//! Rendering is a pure function of the current list: every call to
//! [`Renderer::render`] receives the complete set of rows and replaces whatever
//! was drawn before. No diffing happens here.

pub mod html;
pub mod text;

pub use html::HtmlRenderer;
pub use text::TextRenderer;

use chrono::{Local, Locale, Utc};

use crate::core::{SyncError, Todo};

/// Shown for a date the client cannot interpret, as a browser would.
pub const INVALID_DATE: &str = "Invalid Date";

/// One rendered todo: checkbox state, text and the formatted date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoRow {
    /// Toggling the row's checkbox toggles this id.
    pub id: i64,
    pub checked: bool,
    pub text: String,
    pub date: String,
}

pub trait Renderer: Send {
    fn render(&mut self, rows: &[TodoRow]);
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn render(&mut self, rows: &[TodoRow]) {
        (**self).render(rows)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Local,
    Utc,
}

/// Formats todo dates with a locale's short date representation.
#[derive(Debug, Clone, Copy)]
pub struct DateFormatter {
    locale: Locale,
    zone: Zone,
}

impl DateFormatter {
    pub fn new(locale: Locale, zone: Zone) -> Self {
        Self { locale, zone }
    }

    /// Builds a formatter from a POSIX locale name such as `en_US` or `de_DE`,
    /// in the viewer's local timezone.
    pub fn for_locale(name: &str) -> Result<Self, SyncError> {
        let locale =
            Locale::try_from(name).map_err(|_| SyncError::InvalidLocale(name.to_string()))?;
        Ok(Self::new(locale, Zone::Local))
    }

    pub fn with_zone(self, zone: Zone) -> Self {
        Self { zone, ..self }
    }

    pub fn format(&self, todo: &Todo) -> String {
        let Some(instant) = todo.date.to_datetime() else {
            return INVALID_DATE.to_string();
        };
        match self.zone {
            Zone::Local => instant
                .with_timezone(&Local)
                .format_localized("%x", self.locale)
                .to_string(),
            Zone::Utc => instant
                .with_timezone(&Utc)
                .format_localized("%x", self.locale)
                .to_string(),
        }
    }
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self::new(Locale::en_US, Zone::Local)
    }
}

pub fn project(todos: &[Todo], dates: &DateFormatter) -> Vec<TodoRow> {
    todos
        .iter()
        .map(|todo| TodoRow {
            id: todo.id,
            checked: todo.completed,
            text: todo.text.clone(),
            date: dates.format(todo),
        })
        .collect()
}
