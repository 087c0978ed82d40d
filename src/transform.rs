//! Text run to emphasis fragments.
//!
//! A run is cut into whitespace, single punctuation marks, and word-boundary
//! delimited chunks. Pure ASCII alphabetic chunks become an emphasized prefix
//! plus a plain suffix; everything else passes through untouched.

use crate::dom::escape_text;
use crate::intensity::{IntensityLevel, bold_length};

/// Punctuation emitted as single, unwrapped tokens.
pub const PUNCTUATION: [char; 6] = ['.', ',', '!', '?', ';', ':'];

/// Class carried by the emphasized prefix element.
pub const BOLD_CLASS: &str = "bionic-bold";

/// Inline style of the emphasized prefix: inert box, heavier weight only.
pub const BOLD_STYLE: &str =
    "display: contents !important; font-weight: 700 !important; color: inherit;";

/// Inline style keeping whitespace from collapsing inside inline wrappers.
pub const SPACE_STYLE: &str = "white-space: pre-wrap";

/// One lexical piece of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Whitespace(&'a str),
    Punctuation(&'a str),
    /// Run of `[A-Za-z0-9_]`.
    Word(&'a str),
    /// Run of anything else.
    Other(&'a str),
}

impl<'a> Token<'a> {
    pub fn as_str(&self) -> &'a str {
        match *self {
            Token::Whitespace(s) | Token::Punctuation(s) | Token::Word(s) | Token::Other(s) => s,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Class {
    Space,
    Punct,
    Word,
    Other,
}

fn classify(c: char) -> Class {
    if c.is_whitespace() {
        Class::Space
    } else if PUNCTUATION.contains(&c) {
        Class::Punct
    } else if c.is_ascii_alphanumeric() || c == '_' {
        Class::Word
    } else {
        Class::Other
    }
}

/// Split a text run into tokens. Concatenating the tokens yields `text`.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let class = classify(c);
        let mut end = start + c.len_utf8();
        if class != Class::Punct {
            while let Some(&(i, next)) = chars.peek() {
                if classify(next) != class {
                    break;
                }
                end = i + next.len_utf8();
                chars.next();
            }
        }

        let piece = &text[start..end];
        tokens.push(match class {
            Class::Space => Token::Whitespace(piece),
            Class::Punct => Token::Punctuation(piece),
            Class::Word => Token::Word(piece),
            Class::Other => Token::Other(piece),
        });
    }

    tokens
}

/// Rendered output for one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'a> {
    /// Whitespace, wrapped so it survives inline styling.
    Space(&'a str),
    /// Text emitted as-is.
    Verbatim(&'a str),
    /// A word split into an emphasized prefix and a plain suffix.
    Emphasis { bold: &'a str, rest: &'a str },
}

impl Fragment<'_> {
    /// Write this fragment's markup.
    pub fn write_markup(&self, out: &mut String) {
        match *self {
            Fragment::Space(ws) => {
                out.push_str("<span style=\"");
                out.push_str(SPACE_STYLE);
                out.push_str("\">");
                out.push_str(ws);
                out.push_str("</span>");
            }
            Fragment::Verbatim(text) => out.push_str(&escape_text(text)),
            Fragment::Emphasis { bold, rest } => {
                out.push_str("<span class=\"");
                out.push_str(BOLD_CLASS);
                out.push_str("\" style=\"");
                out.push_str(BOLD_STYLE);
                out.push_str("\">");
                out.push_str(bold);
                out.push_str("</span>");
                out.push_str(rest);
            }
        }
    }

    pub fn push_plain(&self, out: &mut String) {
        match *self {
            Fragment::Space(s) | Fragment::Verbatim(s) => out.push_str(s),
            Fragment::Emphasis { bold, rest } => {
                out.push_str(bold);
                out.push_str(rest);
            }
        }
    }
}

fn is_alphabetic_word(word: &str) -> bool {
    !word.is_empty() && word.bytes().all(|b| b.is_ascii_alphabetic())
}

/// Renders text runs at a fixed intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transformer {
    pub level: IntensityLevel,
}

impl Transformer {
    pub fn new(level: IntensityLevel) -> Self {
        Self { level }
    }

    /// Fragments for every token of `text`, in order.
    pub fn render<'a>(&self, text: &'a str) -> Vec<Fragment<'a>> {
        tokenize(text)
            .into_iter()
            .map(|token| match token {
                Token::Whitespace(ws) => Fragment::Space(ws),
                Token::Word(word) if is_alphabetic_word(word) => {
                    // ASCII only, so the char count is a byte index
                    let (bold, rest) = word.split_at(bold_length(word, self.level));
                    Fragment::Emphasis { bold, rest }
                }
                other => Fragment::Verbatim(other.as_str()),
            })
            .collect()
    }

    /// Markup string for `text`.
    ///
    /// ```
    /// use bionic::{IntensityLevel, Transformer};
    ///
    /// let markup = Transformer::new(IntensityLevel::Focus).render_markup("Hi!");
    /// assert!(markup.starts_with("<span class=\"bionic-bold\""));
    /// assert!(markup.ends_with(">Hi</span>!"));
    /// ```
    pub fn render_markup(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() * 4);
        for fragment in self.render(text) {
            fragment.write_markup(&mut out);
        }
        out
    }
}

/// Text of a fragment list with all emphasis removed.
pub fn plain_text(fragments: &[Fragment<'_>]) -> String {
    let mut out = String::new();
    for fragment in fragments {
        fragment.push_plain(&mut out);
    }
    out
}
