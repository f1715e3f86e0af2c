#[cfg(test)]
#[path = "language_test.rs"]
mod tests;

use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

/// Target language for generated code.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum Language {
    #[default]
    Python,
    Lua,
}

impl Language {
    pub fn parse(text: &str) -> Option<Language> {
        let needle = text.trim().to_lowercase();
        if needle == "py" {
            return Some(Language::Python);
        }

        return Language::iter().find(|e| return e.to_string() == needle);
    }

    pub fn title(&self) -> &'static str {
        match self {
            Language::Python => return "Python",
            Language::Lua => return "Lua",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Language::Python => return "py",
            Language::Lua => return "lua",
        }
    }

    pub fn default_file_name(&self) -> String {
        return format!("code.{}", self.extension());
    }
}
