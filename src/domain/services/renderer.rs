#[cfg(test)]
#[path = "renderer_test.rs"]
mod tests;

use std::fs::File;
use std::io::BufReader;

use anyhow::bail;
use anyhow::Result;
use syntect::easy::HighlightLines;
use syntect::highlighting::Theme;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::as_24_bit_terminal_escaped;
use syntect::util::LinesWithEndings;
use yansi::Paint;

use crate::domain::models::EntryKind;
use crate::domain::models::GeneratedCode;
use crate::domain::models::Role;
use crate::domain::models::TranscriptEntry;

#[derive(Default)]
pub struct Themes {}

impl Themes {
    pub fn list() -> Vec<String> {
        let mut themes = ThemeSet::load_defaults()
            .themes
            .keys()
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();
        themes.sort();

        return themes;
    }

    fn get_from_file(theme_file: &str) -> Result<Theme> {
        let file = File::open(theme_file)?;
        let mut reader = BufReader::new(file);
        let theme = ThemeSet::load_from_reader(&mut reader)?;

        return Ok(theme);
    }

    pub fn get(theme_name: &str, theme_file: &str) -> Result<Theme> {
        if !theme_file.is_empty() {
            return Themes::get_from_file(theme_file);
        }

        let mut themes = ThemeSet::load_defaults().themes;
        if let Some(theme) = themes.remove(theme_name) {
            return Ok(theme);
        }

        bail!(format!("Theme {theme_name} does not exist"));
    }
}

/// Formats transcript entries for the terminal. Without a theme, output is
/// plain text with no escape codes.
pub struct Renderer {
    syntaxes: SyntaxSet,
    theme: Option<Theme>,
}

impl Renderer {
    pub fn new(theme: Theme) -> Renderer {
        return Renderer {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            theme: Some(theme),
        };
    }

    pub fn plain() -> Renderer {
        return Renderer {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            theme: None,
        };
    }

    fn paint(&self, text: String, paint: fn(String) -> Paint<String>) -> String {
        if self.theme.is_none() {
            return text;
        }

        return paint(text).to_string();
    }

    pub fn entry(&self, entry: &TranscriptEntry, code_number: Option<usize>) -> String {
        let label = match entry.role() {
            Role::User => self.paint(entry.role().to_string(), |e| return Paint::cyan(e).bold()),
            Role::Assistant => {
                self.paint(entry.role().to_string(), |e| return Paint::magenta(e).bold())
            }
        };

        let text = match entry.kind() {
            EntryKind::Normal => entry.text().to_string(),
            EntryKind::Error => self.paint(entry.text().to_string(), Paint::red),
        };

        let mut res = format!("{label}: {text}");
        if let Some(code) = entry.code() {
            let mut header = format!("{}.{}", code.language, code.language.extension());
            if let Some(number) = code_number {
                header = format!("({number}) {header}");
            }

            res = format!(
                "{res}\n{}\n{}",
                self.paint(header, |e| return Paint::new(e).dimmed()),
                self.highlight(code)
            );
        }

        return res;
    }

    pub fn notice(&self, text: &str) -> String {
        return self.paint(text.to_string(), |e| return Paint::new(e).dimmed());
    }

    pub fn error(&self, text: &str) -> String {
        return self.paint(text.to_string(), Paint::red);
    }

    fn highlight(&self, code: &GeneratedCode) -> String {
        let theme = match &self.theme {
            Some(theme) => theme,
            None => return code.source.to_string(),
        };

        let syntax = self
            .syntaxes
            .find_syntax_by_extension(code.language.extension())
            .unwrap_or_else(|| return self.syntaxes.find_syntax_plain_text());
        let mut highlighter = HighlightLines::new(syntax, theme);

        let mut res = "".to_string();
        for line in LinesWithEndings::from(&code.source) {
            match highlighter.highlight_line(line, &self.syntaxes) {
                Ok(ranges) => res += &as_24_bit_terminal_escaped(&ranges[..], false),
                Err(err) => {
                    tracing::warn!(error = ?err, "Failed to highlight code");
                    return code.source.to_string();
                }
            }
        }
        res += "\x1b[0m";

        return res;
    }
}
