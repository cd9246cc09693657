use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A worksheet column, stored as a 1-based index (A = 1).
///
/// Deserializes from and serializes to Excel letters. The letters are checked
/// for syntax only; the physical width of a sheet is never consulted here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Column(u32);

fn letters_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z]{1,4}$").expect("static regex"))
}

impl Column {
    /// Parse Excel column letters (`"A"`, `"AB"`, case-insensitive).
    pub fn parse(letters: &str) -> Result<Self, String> {
        let letters = letters.trim();
        if !letters_pattern().is_match(letters) {
            return Err(format!("invalid column letters: {:?}", letters));
        }
        let index = letters
            .to_ascii_uppercase()
            .bytes()
            .fold(0u32, |acc, b| acc * 26 + u32::from(b - b'A' + 1));
        Ok(Column(index))
    }

    /// Build from a 1-based index.
    pub fn from_index(index: u32) -> Self {
        Column(index.max(1))
    }

    /// 1-based index.
    pub fn index(self) -> u32 {
        self.0
    }

    /// 0-based offset into a row vector.
    pub fn offset(self) -> usize {
        (self.0 - 1) as usize
    }

    /// Excel letters for this column (1→A, 26→Z, 27→AA).
    pub fn letters(self) -> String {
        let mut result = String::new();
        let mut num = self.0;
        while num > 0 {
            let remainder = (num - 1) % 26;
            result.insert(0, (b'A' + remainder as u8) as char);
            num = (num - 1) / 26;
        }
        result
    }
}

impl TryFrom<String> for Column {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Column::parse(&value)
    }
}

impl From<Column> for String {
    fn from(column: Column) -> Self {
        column.letters()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.letters())
    }
}
