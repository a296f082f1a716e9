use std::fmt::Write;

use super::{Renderer, TodoRow};

/// Renders the contents of the `#todos` container as an HTML fragment.
///
/// Each row is a `div.todo-item` holding a checkbox wired to
/// `toggleTodo(id)`, the text and the formatted date. Completed rows also carry
/// the `completed` class.
#[derive(Debug, Default)]
pub struct HtmlRenderer {
    document: String,
    frames: usize,
}

impl HtmlRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The fragment produced by the latest render.
    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl Renderer for HtmlRenderer {
    fn render(&mut self, rows: &[TodoRow]) {
        let mut html = String::new();
        for row in rows {
            let class = if row.checked { "todo-item completed" } else { "todo-item" };
            let checked = if row.checked { " checked" } else { "" };
            // Writing into a String cannot fail.
            let _ = write!(
                html,
                r#"<div class="{class}"><input type="checkbox"{checked} onchange="toggleTodo({id})"><span class="todo-text">{text}</span><span class="todo-date">{date}</span></div>"#,
                id = row.id,
                text = escape(&row.text),
                date = escape(&row.date),
            );
        }
        self.document = html;
        self.frames += 1;
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
