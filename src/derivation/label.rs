use std::{fmt, str::FromStr};

use thiserror::Error;

/// A line number with an optional lowercase suffix, as in `3` or `3a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineLabel {
    number: u32,
    suffix: Option<char>,
}

impl LineLabel {
    pub fn new(number: u32, suffix: Option<char>) -> Self {
        Self { number, suffix }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn suffix(&self) -> Option<char> {
        self.suffix
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{0}` is not a line label")]
pub struct LabelError(pub String);

impl FromStr for LineLabel {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, rest) = s.split_at(digits_end);

        let number = digits.parse().map_err(|_| LabelError(s.to_string()))?;
        let mut rest = rest.chars();
        let suffix = match (rest.next(), rest.next()) {
            (None, _) => None,
            (Some(c), None) if c.is_ascii_lowercase() => Some(c),
            _ => return Err(LabelError(s.to_string())),
        };

        Ok(Self { number, suffix })
    }
}

impl fmt::Display for LineLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number)?;
        if let Some(suffix) = self.suffix {
            write!(f, "{suffix}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels() {
        assert_eq!("12".parse(), Ok(LineLabel::new(12, None)));
        assert_eq!(" 3a ".parse(), Ok(LineLabel::new(3, Some('a'))));
        assert!("a".parse::<LineLabel>().is_err());
        assert!("3ab".parse::<LineLabel>().is_err());
        assert!("3A".parse::<LineLabel>().is_err());
        assert!("".parse::<LineLabel>().is_err());
    }

    #[test]
    fn labels_print_back() {
        assert_eq!(LineLabel::new(4, Some('b')).to_string(), "4b");
        assert_eq!(LineLabel::new(4, None).to_string(), "4");
    }
}
