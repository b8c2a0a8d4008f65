use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a title is turned into its comparison key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Trim leading and trailing whitespace; internal spacing must match.
    #[default]
    Trim,
    /// Drop every whitespace character, so titles wrapped differently in two
    /// exports still compare equal.
    StripWhitespace,
}

impl Normalization {
    pub fn key(&self, title: &str) -> String {
        match self {
            Normalization::Trim => title.trim().to_string(),
            Normalization::StripWhitespace => {
                title.chars().filter(|c| !c.is_whitespace()).collect()
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Normalization::Trim => "trim",
            Normalization::StripWhitespace => "strip_whitespace",
        }
    }
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Normalization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "trim" | "exact" => Ok(Normalization::Trim),
            "strip_whitespace" | "whitespace" | "fuzzy" => Ok(Normalization::StripWhitespace),
            other => Err(format!("unknown normalization: {}", other)),
        }
    }
}
