use std::hash::{Hash, Hasher};

use ustr::Ustr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprKind {
    /// A sentence letter, or the contradiction glyph.
    Atom,
    /// A relation letter applied to terms. Identity is a relation whose
    /// symbol is the language's identity glyph.
    Relation,
    Unary,
    Binary,
    /// Children are the bound variable and the body.
    Quantifier,
    Constant,
    Variable,
    Function,
    SchemaSentence,
    SchemaTerm,
    SchemaVariable,
    SchemaFunction,
    SchemaRelation,
}

impl ExprKind {
    pub fn is_term(self) -> bool {
        matches!(
            self,
            ExprKind::Constant
                | ExprKind::Variable
                | ExprKind::Function
                | ExprKind::SchemaTerm
                | ExprKind::SchemaVariable
                | ExprKind::SchemaFunction
        )
    }

    pub fn is_formula(self) -> bool {
        !self.is_term()
    }

    pub fn is_schema(self) -> bool {
        matches!(
            self,
            ExprKind::SchemaSentence
                | ExprKind::SchemaTerm
                | ExprKind::SchemaVariable
                | ExprKind::SchemaFunction
                | ExprKind::SchemaRelation
        )
    }
}

/// A formula or term. Immutable once built.
///
/// `level` counts the binary connectives on the longest path down from this
/// node and only steers which bracket pair is printed; equality and hashing
/// ignore it.
#[derive(Debug, Clone, Eq)]
pub struct Expr {
    kind: ExprKind,
    symbol: Ustr,
    children: Vec<Expr>,
    level: u32,
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.symbol == other.symbol && self.children == other.children
    }
}

impl Hash for Expr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.symbol.hash(state);
        self.children.hash(state);
    }
}

impl Expr {
    pub fn new(kind: ExprKind, symbol: Ustr, children: Vec<Expr>) -> Self {
        let below = children.iter().map(|c| c.level).max().unwrap_or(0);
        let level = if kind == ExprKind::Binary {
            below + 1
        } else {
            below
        };
        Self {
            kind,
            symbol,
            children,
            level,
        }
    }

    pub fn leaf(kind: ExprKind, symbol: Ustr) -> Self {
        Self::new(kind, symbol, Vec::new())
    }

    pub fn atom(symbol: &str) -> Self {
        Self::leaf(ExprKind::Atom, Ustr::from(symbol))
    }

    pub fn unary(symbol: Ustr, child: Expr) -> Self {
        Self::new(ExprKind::Unary, symbol, vec![child])
    }

    pub fn binary(symbol: Ustr, left: Expr, right: Expr) -> Self {
        Self::new(ExprKind::Binary, symbol, vec![left, right])
    }

    pub fn quantifier(symbol: Ustr, variable: Expr, body: Expr) -> Self {
        Self::new(ExprKind::Quantifier, symbol, vec![variable, body])
    }

    pub fn relation(symbol: Ustr, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::Relation, symbol, args)
    }

    pub fn kind(&self) -> ExprKind {
        self.kind
    }

    pub fn symbol(&self) -> Ustr {
        self.symbol
    }

    pub fn children(&self) -> &[Expr] {
        &self.children
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn arity(&self) -> usize {
        self.children.len()
    }

    pub fn is_term(&self) -> bool {
        self.kind.is_term()
    }

    pub fn is_variable(&self) -> bool {
        self.kind == ExprKind::Variable
    }

    pub fn is_binary(&self, symbol: Ustr) -> bool {
        self.kind == ExprKind::Binary && self.symbol == symbol
    }

    pub fn is_identity(&self, identity: Ustr) -> bool {
        self.kind == ExprKind::Relation && self.symbol == identity && self.children.len() == 2
    }

    /// The bound variable and body of a quantified formula.
    pub fn as_quantified(&self) -> Option<(&Expr, &Expr)> {
        match (self.kind, self.children.as_slice()) {
            (ExprKind::Quantifier, [var, body]) => Some((var, body)),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<(&Expr, &Expr)> {
        match (self.kind, self.children.as_slice()) {
            (ExprKind::Binary, [left, right]) => Some((left, right)),
            _ => None,
        }
    }

    /// Same head, same number of children.
    pub fn same_head(&self, other: &Expr) -> bool {
        self.kind == other.kind
            && self.symbol == other.symbol
            && self.children.len() == other.children.len()
    }

    pub fn with_children(&self, children: Vec<Expr>) -> Expr {
        Expr::new(self.kind, self.symbol, children)
    }

    /// Does `other` occur anywhere in this expression, bound or free?
    pub fn contains(&self, other: &Expr) -> bool {
        self == other || self.children.iter().any(|c| c.contains(other))
    }

    /// Every node in pre-order.
    pub fn walk(&self) -> Box<dyn Iterator<Item = &Expr> + '_> {
        Box::new(std::iter::once(self).chain(self.children.iter().flat_map(|c| c.walk())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Expr {
        Expr::leaf(ExprKind::Variable, Ustr::from(name))
    }

    #[test]
    fn equality_ignores_level() {
        let a = Expr::binary(Ustr::from("∧"), Expr::atom("A"), Expr::atom("B"));
        let b = Expr::binary(Ustr::from("∧"), Expr::atom("A"), Expr::atom("B"));
        let nested = Expr::binary(Ustr::from("→"), a.clone(), Expr::atom("C"));
        assert_eq!(a, b);
        assert_eq!(a.level(), 1);
        assert_eq!(nested.level(), 2);
        assert_eq!(&nested.children()[0], &a);
    }

    #[test]
    fn levels_pass_through_other_nodes() {
        let inner = Expr::binary(Ustr::from("∧"), Expr::atom("A"), Expr::atom("B"));
        let negated = Expr::unary(Ustr::from("~"), inner);
        assert_eq!(negated.level(), 1);
        let quantified = Expr::quantifier(Ustr::from("∀"), var("x"), negated);
        assert_eq!(quantified.level(), 1);
    }

    #[test]
    fn accessors() {
        let fx = Expr::relation(Ustr::from("F"), vec![var("x")]);
        let all = Expr::quantifier(Ustr::from("∀"), var("x"), fx.clone());
        let (v, body) = all.as_quantified().unwrap();
        assert_eq!(v, &var("x"));
        assert_eq!(body, &fx);
        assert!(all.contains(&var("x")));
        assert_eq!(all.walk().count(), 4);
        assert!(fx.as_binary().is_none());
    }
}
