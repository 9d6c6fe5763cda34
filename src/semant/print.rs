use std::fmt::{self, Display, Write};

use crate::{lang::Language, semant::expr::Expr, semant::expr::ExprKind, util::superscript};

/// An expression printed in the surface syntax of a language, alternating
/// bracket pairs by nesting level.
pub struct Printed<'a> {
    expr: &'a Expr,
    lang: Option<&'a Language>,
}

impl Expr {
    pub fn display<'a>(&'a self, lang: &'a Language) -> Printed<'a> {
        Printed {
            expr: self,
            lang: Some(lang),
        }
    }
}

impl Display for Printed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expr(f, self.expr, self.lang)
    }
}

/// Without a language every binary node gets round brackets.
impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expr(f, self, None)
    }
}

fn write_expr(f: &mut impl Write, expr: &Expr, lang: Option<&Language>) -> fmt::Result {
    let children = expr.children();
    match expr.kind() {
        ExprKind::Binary => {
            let (open, close) = match lang {
                Some(lang) => {
                    let (open, close) = lang.brackets_at(expr.level().saturating_sub(1));
                    (open.as_str(), close.as_str())
                }
                None => ("(", ")"),
            };
            f.write_str(open)?;
            write_expr(f, &children[0], lang)?;
            write!(f, " {} ", expr.symbol())?;
            write_expr(f, &children[1], lang)?;
            f.write_str(close)
        }
        ExprKind::Relation if children.len() == 2 && is_identity(expr, lang) => {
            write_expr(f, &children[0], lang)?;
            write!(f, " {} ", expr.symbol())?;
            write_expr(f, &children[1], lang)
        }
        ExprKind::Function | ExprKind::SchemaFunction => {
            write!(f, "{}{}", expr.symbol(), superscript(children.len()))?;
            for child in children {
                write_expr(f, child, lang)?;
            }
            Ok(())
        }
        _ => {
            f.write_str(expr.symbol().as_str())?;
            for child in children {
                write_expr(f, child, lang)?;
            }
            Ok(())
        }
    }
}

fn is_identity(expr: &Expr, lang: Option<&Language>) -> bool {
    match lang.and_then(|l| l.identity()) {
        Some(identity) => expr.symbol() == identity,
        None => expr.symbol() == "=",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lang::{META, QUANTIFICATIONAL, SENTENTIAL},
        parse::{StyledText, parse_one, parse_str},
    };
    use proptest::prelude::*;

    #[test]
    fn brackets_alternate_by_level() {
        let lang = Language::from_toml(SENTENTIAL).unwrap();
        let e = parse_str("((A ∧ B) → ~(C ∨ (D ↔ E)))", &lang).unwrap();
        assert_eq!(e.display(&lang).to_string(), "{(A ∧ B) → ~[C ∨ (D ↔ E)]}");
        assert_eq!(e.to_string(), "((A ∧ B) → ~(C ∨ (D ↔ E)))");
    }

    #[test]
    fn terms_and_quantifiers() {
        let lang = Language::from_toml(QUANTIFICATIONAL).unwrap();
        let e = parse_str("∀x(F(x, h^1a) → g^2xy = b_1)", &lang).unwrap();
        assert_eq!(e.display(&lang).to_string(), "∀x(Fxh¹a → g²xy = b₁)");
    }

    #[test]
    fn schema_printing() {
        let meta = Language::from_toml(META).unwrap();
        let e = parse_str("(𝓈 = 𝓉 → 𝒽^1𝓈 = 𝒽^1𝓉)", &meta).unwrap();
        assert_eq!(e.display(&meta).to_string(), "(𝓈 = 𝓉 → 𝒽¹𝓈 = 𝒽¹𝓉)");
    }

    fn term() -> BoxedStrategy<String> {
        let leaf = prop_oneof![
            Just("a".to_string()),
            Just("b".to_string()),
            Just("x".to_string()),
            Just("y".to_string()),
        ];
        leaf.prop_recursive(2, 6, 2, |inner| {
            prop_oneof![
                inner.clone().prop_map(|t| format!("h^1{t}")),
                (inner.clone(), inner).prop_map(|(s, t)| format!("g^2{s}{t}")),
            ]
        })
        .boxed()
    }

    fn formula() -> BoxedStrategy<String> {
        let leaf = prop_oneof![
            Just("A".to_string()),
            Just("B_2".to_string()),
            Just("⊥".to_string()),
            term().prop_map(|t| format!("F{t}")),
            (term(), term()).prop_map(|(s, t)| format!("G({s}, {t})")),
            (term(), term()).prop_map(|(s, t)| format!("{s} = {t}")),
        ];
        leaf.prop_recursive(4, 24, 2, |inner| {
            prop_oneof![
                inner.clone().prop_map(|f| format!("~{f}")),
                inner.clone().prop_map(|f| format!("∀x{f}")),
                inner.clone().prop_map(|f| format!("∃y{f}")),
                (inner.clone(), inner.clone()).prop_map(|(f, g)| format!("({f} ∧ {g})")),
                (inner.clone(), inner).prop_map(|(f, g)| format!("[{f} → {g}]")),
            ]
        })
        .boxed()
    }

    proptest! {
        #[test]
        fn printing_reparses_to_an_equal_tree(text in formula()) {
            let lang = Language::from_toml(QUANTIFICATIONAL).unwrap();
            let parsed = parse_str(&text, &lang).unwrap();
            let printed = parsed.display(&lang).to_string();
            let reparsed = parse_one(&StyledText::from_markup(&printed), &lang).unwrap();
            prop_assert_eq!(&reparsed, &parsed);
            prop_assert_eq!(reparsed.display(&lang).to_string(), printed);
        }
    }
}
