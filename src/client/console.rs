//! Terminal output for the chat loop.
//!
//! Draws the banner, the input prompt, framed answers and errors. Colors are
//! only emitted when writing to a terminal.

use crossterm::{
    queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
};
use std::fmt::Display;
use std::io::{self, Stdout, Write};

/// Widest panel we draw, even on very wide terminals.
const MAX_WIDTH: usize = 100;

/// Styled writer for the interactive session.
pub struct Console<W: Write> {
    out: W,
    styled: bool,
    width: usize,
}

impl Console<Stdout> {
    /// Console on stdout, styled only when stdout is a TTY.
    pub fn stdout() -> Self {
        let styled = atty::is(atty::Stream::Stdout);
        let width = crossterm::terminal::size()
            .map(|(cols, _)| cols as usize)
            .unwrap_or(MAX_WIDTH)
            .min(MAX_WIDTH);
        Self::new(io::stdout(), styled, width)
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W, styled: bool, width: usize) -> Self {
        Self {
            out,
            styled,
            width: width.max(20),
        }
    }

    /// Session banner naming the model.
    pub fn banner(&mut self, model: &str) -> io::Result<()> {
        let text = format!(
            "TeachMeFinance — LLM-only (model: {}) — type 'exit' to quit",
            model
        );
        self.panel(None, &text, Color::Magenta)
    }

    /// Input prompt, left on the current line.
    pub fn prompt(&mut self) -> io::Result<()> {
        self.paint("You", Color::Cyan, true)?;
        write!(self.out, ": ")?;
        self.out.flush()
    }

    /// Frame an answer in the assistant panel.
    pub fn answer(&mut self, text: &str) -> io::Result<()> {
        self.panel(Some("TeachMeFinance"), text, Color::Cyan)
    }

    /// Report a failed exchange.
    pub fn error(&mut self, err: &dyn Display) -> io::Result<()> {
        self.paint("Error:", Color::Red, false)?;
        writeln!(self.out, " {}", err)?;
        self.out.flush()
    }

    /// Finish a prompt line left open by end of input.
    pub fn line_break(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        self.out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&mut self, text: &str, color: Color, bold: bool) -> io::Result<()> {
        if !self.styled {
            return write!(self.out, "{}", text);
        }
        if bold {
            queue!(self.out, SetAttribute(Attribute::Bold))?;
        }
        queue!(
            self.out,
            SetForegroundColor(color),
            Print(text),
            ResetColor,
            SetAttribute(Attribute::Reset)
        )
    }

    fn panel(&mut self, title: Option<&str>, body: &str, color: Color) -> io::Result<()> {
        let inner_max = self.width - 4;
        let lines: Vec<String> = body
            .lines()
            .flat_map(|line| wrap(line, inner_max))
            .collect();

        let title = title.map(|t| format!(" {} ", t)).unwrap_or_default();
        let inner = lines
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0)
            .max(title.chars().count() + 2)
            .min(inner_max);

        let top = format!(
            "╭─{}{}─╮",
            title,
            "─".repeat(inner.saturating_sub(title.chars().count()))
        );
        self.paint(&top, color, false)?;
        writeln!(self.out)?;

        for line in &lines {
            let pad = inner.saturating_sub(line.chars().count());
            self.paint("│", color, false)?;
            write!(self.out, " {}{} ", line, " ".repeat(pad))?;
            self.paint("│", color, false)?;
            writeln!(self.out)?;
        }

        let bottom = format!("╰{}╯", "─".repeat(inner + 2));
        self.paint(&bottom, color, false)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

/// Greedy word wrap. Lines that fit are kept verbatim; longer lines keep
/// their indentation on every row and words longer than a row are split.
fn wrap(line: &str, width: usize) -> Vec<String> {
    let line = line.trim_end();
    if line.chars().count() <= width {
        return vec![line.to_string()];
    }

    let body = line.trim_start();
    let indent = &line[..line.len() - body.len()];
    let indent_len = indent.chars().count();
    // Keep at least half a row for text on deeply indented lines.
    let (indent, indent_len) = if indent_len * 2 > width { ("", 0) } else { (indent, indent_len) };
    let room = width - indent_len;

    let mut rows: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in body.split(' ').filter(|w| !w.is_empty()) {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > room {
            if current_len > 0 {
                rows.push(format!("{}{}", indent, std::mem::take(&mut current)));
                current_len = 0;
            }
            let head: String = word.drain(..room).collect();
            rows.push(format!("{}{}", indent, head));
        }
        if word.is_empty() {
            continue;
        }

        let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
        if needed > room {
            rows.push(format!("{}{}", indent, std::mem::take(&mut current)));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }

    if current_len > 0 || rows.is_empty() {
        rows.push(format!("{}{}", indent, current));
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(width: usize, f: impl FnOnce(&mut Console<Vec<u8>>) -> io::Result<()>) -> String {
        let mut console = Console::new(Vec::new(), false, width);
        f(&mut console).unwrap();
        String::from_utf8(console.into_inner()).unwrap()
    }

    #[test]
    fn test_banner_names_model() {
        let out = render(100, |c| c.banner("qwen2.5:7b-instruct"));
        assert!(out.contains("model: qwen2.5:7b-instruct"));
        assert!(out.contains("type 'exit' to quit"));
    }

    #[test]
    fn test_answer_panel() {
        let out = render(40, |c| c.answer("Spend less\nthan you earn."));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("╭─ TeachMeFinance "));
        assert_eq!(lines[1], format!("│ {:<18} │", "Spend less"));
        assert_eq!(lines[2], format!("│ {:<18} │", "than you earn."));
        assert!(lines[3].starts_with("╰"));
        // All rows are the same width.
        let widths: Vec<usize> = lines.iter().map(|l| l.chars().count()).collect();
        assert!(widths.iter().all(|w| *w == widths[0]), "{:?}", widths);
    }

    #[test]
    fn test_error_line() {
        let out = render(40, |c| c.error(&"connection refused"));
        assert_eq!(out, "Error: connection refused\n");
    }

    #[test]
    fn test_unstyled_has_no_escape_codes() {
        let out = render(40, |c| {
            c.prompt()?;
            c.answer("hi")
        });
        assert!(!out.contains('\x1b'));
        assert!(out.starts_with("You: "));
    }

    #[test]
    fn test_styled_prompt_uses_color() {
        let mut console = Console::new(Vec::new(), true, 40);
        console.prompt().unwrap();
        let out = String::from_utf8(console.into_inner()).unwrap();
        assert!(out.contains('\x1b'));
        assert!(out.contains("You"));
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("a bb ccc", 4), vec!["a bb", "ccc"]);
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("", 4), vec![""]);
        assert_eq!(wrap("50/30/20 rule", 20), vec!["50/30/20 rule"]);
    }

    #[test]
    fn test_wrap_keeps_layout_that_fits() {
        assert_eq!(wrap("    - nested bullet", 40), vec!["    - nested bullet"]);
        assert_eq!(wrap("| Rate |  Years |", 40), vec!["| Rate |  Years |"]);
        assert_eq!(wrap("    let x = 1;   ", 40), vec!["    let x = 1;"]);
    }

    #[test]
    fn test_wrap_indents_continuation_rows() {
        assert_eq!(
            wrap("  - save three to six months", 14),
            vec!["  - save three", "  to six", "  months"]
        );
    }

    #[test]
    fn test_answer_panel_keeps_indentation() {
        let out = render(40, |c| c.answer("Steps:\n  1. Budget\n    a. Needs"));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[2], format!("│ {:<18} │", "  1. Budget"));
        assert_eq!(lines[3], format!("│ {:<18} │", "    a. Needs"));
    }
}
