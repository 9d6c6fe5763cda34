use std::sync::LazyLock;
use ustr::Ustr;

macro_rules! str_const {
    ($($name:ident = $str:literal);*; ) => {
        $(pub static $name: LazyLock<Ustr> = LazyLock::new(|| Ustr::from($str));)*
    };
}

// Citation keywords:
str_const! {
    PREMISE = "PR";
    ASSUMPTION = "A";
}

// Symbols:
str_const! {
    CONDITIONAL = "→";
    TURNSTILE = "⊢";
    INTERDERIVABLE = "⊣⊢";
}

// Schema placeholders used by the substitution axioms:
str_const! {
    SCHEMA_FUNCTION = "𝒽";
    SCHEMA_RELATION = "ℛ";
    SCHEMA_LEFT = "𝓈";
    SCHEMA_RIGHT = "𝓉";
    SCHEMA_ARG_1 = "𝓊₁";
    SCHEMA_ARG_2 = "𝓊₂";
    SCHEMA_ARG_3 = "𝓊₃";
}

// Exit strategy markers, in their plain and mathematical italic spellings.
pub const GOAL_MARKERS: [char; 2] = ['g', '𝑔'];
pub const CONTRADICTION_MARKERS: [char; 2] = ['c', '𝑐'];

pub const RANGE_DASHES: [char; 3] = ['-', '–', '—'];
