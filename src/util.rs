pub fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

const SUPERSCRIPT_DIGITS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];
const SUBSCRIPT_DIGITS: [char; 10] = ['₀', '₁', '₂', '₃', '₄', '₅', '₆', '₇', '₈', '₉'];

pub fn superscript(n: usize) -> String {
    n.to_string()
        .chars()
        .map(|d| SUPERSCRIPT_DIGITS[d as usize - '0' as usize])
        .collect()
}

pub fn subscript_digit(d: char) -> char {
    SUBSCRIPT_DIGITS[d as usize - '0' as usize]
}

/// The ASCII digit a Unicode superscript digit stands for.
pub fn from_superscript(c: char) -> Option<char> {
    SUPERSCRIPT_DIGITS
        .iter()
        .position(|&s| s == c)
        .map(|i| (b'0' + i as u8) as char)
}

/// The ASCII digit a Unicode subscript digit stands for.
pub fn from_subscript(c: char) -> Option<char> {
    SUBSCRIPT_DIGITS
        .iter()
        .position(|&s| s == c)
        .map(|i| (b'0' + i as u8) as char)
}

pub mod ansi {
    pub const ANSI_RESET: &str = "\x1b[0m";
    pub const ANSI_RED: &str = "\x1b[31m";
    pub const ANSI_GREEN: &str = "\x1b[32m";
    pub const ANSI_GRAY: &str = "\x1b[90m";
    pub const ANSI_BOLD: &str = "\x1b[1m";
    pub const ANSI_ITALIC: &str = "\x1b[3m";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superscripts_round_trip_through_ascii() {
        assert_eq!(superscript(12), "¹²");
        let digits: String = superscript(305).chars().filter_map(from_superscript).collect();
        assert_eq!(digits, "305");
        assert_eq!(from_subscript(subscript_digit('7')), Some('7'));
        assert_eq!(from_superscript('a'), None);
    }
}
