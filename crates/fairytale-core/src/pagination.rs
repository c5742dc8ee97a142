//! Pagination utilities.
//!
//! Text is wrapped greedily into lines that fit the viewport width, then the
//! lines are stacked into pages that fit its height. Everything here is a
//! pure function of (text, layout): a resize simply paginates again.
//!
//! Layout assumes a fixed glyph advance, which is what the reader's bitmap
//! fonts give us. A blank line in the source marks a paragraph break.

use serde::{Deserialize, Serialize};
use std::str::{Lines, SplitWhitespace};

/// Screen area available for body text, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

/// Glyph advance and line height of the body font, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontMetrics {
    pub advance: f32,
    pub line_height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub viewport: Viewport,
    pub font: FontMetrics,
}

impl Layout {
    pub fn new(viewport: Viewport, font: FontMetrics) -> Self {
        Self { viewport, font }
    }

    /// Characters per line; never less than one.
    pub fn columns(&self) -> usize {
        cells(self.viewport.width, self.font.advance)
    }

    /// Lines per page; never less than one.
    pub fn rows(&self) -> usize {
        cells(self.viewport.height, self.font.line_height)
    }
}

fn cells(extent: f32, cell: f32) -> usize {
    if !(extent.is_finite() && cell.is_finite()) || cell <= 0.0 {
        return 1;
    }
    ((extent / cell).floor() as usize).max(1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub chapter: usize,
    pub lines: Vec<String>,
}

impl Page {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Word(&'a str),
    ParagraphBreak,
}

/// Words of the source in order, with a break between paragraphs. Leading
/// and trailing blank lines produce nothing.
#[derive(Debug, Clone)]
struct Tokens<'a> {
    source: Lines<'a>,
    words: SplitWhitespace<'a>,
    seen_word: bool,
    pending_break: bool,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            source: text.lines(),
            words: "".split_whitespace(),
            seen_word: false,
            pending_break: false,
        }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        loop {
            if let Some(word) = self.words.next() {
                self.seen_word = true;
                return Some(Token::Word(word));
            }
            let line = self.source.next()?;
            if line.trim().is_empty() {
                self.pending_break |= self.seen_word;
                continue;
            }
            self.words = line.split_whitespace();
            if std::mem::take(&mut self.pending_break) {
                return Some(Token::ParagraphBreak);
            }
        }
    }
}

/// Greedy word wrap. A paragraph break ends the line and leaves one blank
/// line behind it. A word wider than the viewport gets a line to itself.
#[derive(Debug, Clone)]
struct WrappedLines<'a> {
    tokens: Tokens<'a>,
    columns: usize,
    carried: Option<&'a str>,
    blank_pending: bool,
}

impl<'a> Iterator for WrappedLines<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if std::mem::take(&mut self.blank_pending) {
            return Some(String::new());
        }
        let mut line = String::new();
        let mut width = 0usize;
        loop {
            let token = match self.carried.take() {
                Some(word) => Token::Word(word),
                None => match self.tokens.next() {
                    Some(token) => token,
                    None => break,
                },
            };
            match token {
                Token::ParagraphBreak => {
                    if line.is_empty() {
                        continue;
                    }
                    self.blank_pending = true;
                    return Some(line);
                }
                Token::Word(word) => {
                    let len = word.chars().count();
                    if line.is_empty() {
                        line.push_str(word);
                        width = len;
                    } else if width + 1 + len <= self.columns {
                        line.push(' ');
                        line.push_str(word);
                        width += 1 + len;
                    } else {
                        self.carried = Some(word);
                        return Some(line);
                    }
                }
            }
        }
        if line.is_empty() { None } else { Some(line) }
    }
}

/// Lazy, finite page sequence for one chapter. Cloning it restarts from the
/// same point; a chapter without text still has one empty page.
#[derive(Debug, Clone)]
pub struct Pages<'a> {
    chapter: usize,
    lines: WrappedLines<'a>,
    rows: usize,
    emitted: bool,
}

impl Iterator for Pages<'_> {
    type Item = Page;

    fn next(&mut self) -> Option<Page> {
        let mut lines = Vec::with_capacity(self.rows);
        while lines.len() < self.rows {
            let Some(line) = self.lines.next() else {
                break;
            };
            // Paragraph gaps are dropped at the top of a page.
            if lines.is_empty() && line.is_empty() {
                continue;
            }
            lines.push(line);
        }
        if lines.is_empty() && self.emitted {
            return None;
        }
        self.emitted = true;
        Some(Page {
            chapter: self.chapter,
            lines,
        })
    }
}

/// Paginate a chapter's text for the given layout.
pub fn paginate<'a>(chapter: usize, text: &'a str, layout: &Layout) -> Pages<'a> {
    Pages {
        chapter,
        lines: WrappedLines {
            tokens: Tokens::new(text),
            columns: layout.columns(),
            carried: None,
            blank_pending: false,
        },
        rows: layout.rows(),
        emitted: false,
    }
}

/// Number of pages the chapter occupies under `layout`.
pub fn page_count(text: &str, layout: &Layout) -> usize {
    paginate(0, text, layout).count()
}
