use std::io::Write;

use super::{Renderer, TodoRow};

/// Draws rows as `[x] text  date` lines, clearing the screen first when
/// attached to a terminal.
pub struct TextRenderer<W: Write + Send> {
    out: W,
    clear: bool,
}

impl<W: Write + Send> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, clear: false }
    }

    /// Emits an ANSI clear-screen before every frame.
    pub fn clearing(out: W) -> Self {
        Self { out, clear: true }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, rows: &[TodoRow]) -> std::io::Result<()> {
        if self.clear {
            write!(self.out, "\x1b[2J\x1b[H")?;
        }
        for row in rows {
            let mark = if row.checked { 'x' } else { ' ' };
            writeln!(self.out, "[{mark}] {:>4}  {}  {}", row.id, row.text, row.date)?;
        }
        self.out.flush()
    }
}

impl<W: Write + Send> Renderer for TextRenderer<W> {
    fn render(&mut self, rows: &[TodoRow]) {
        if let Err(e) = self.draw(rows) {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %e, "Failed to draw todo list");
            #[cfg(not(feature = "tracing"))]
            let _ = e;
        }
    }
}
