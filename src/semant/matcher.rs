use rustc_hash::FxHashMap;
use thiserror::Error;
use ustr::Ustr;

use crate::semant::expr::{Expr, ExprKind};

/// Bindings from schema placeholders to the expressions they stand for.
/// One session lives for exactly one matching attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingSession {
    bindings: FxHashMap<Ustr, Expr>,
}

impl BindingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, placeholder: Ustr) -> Option<&Expr> {
        self.bindings.get(&placeholder)
    }

    /// Bind a placeholder, or confirm an existing binding. Returns whether
    /// the binding is consistent.
    pub fn bind(&mut self, placeholder: Ustr, value: &Expr) -> bool {
        match self.bindings.get(&placeholder) {
            Some(bound) => bound == value,
            None => {
                self.bindings.insert(placeholder, value.clone());
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Ustr, &Expr)> {
        self.bindings.iter().map(|(k, v)| (*k, v))
    }

    /// Replace every bound placeholder in `schema`. Unbound placeholders
    /// make the instantiation fail.
    pub fn instantiate(&self, schema: &Expr) -> Option<Expr> {
        match schema.kind() {
            ExprKind::SchemaSentence | ExprKind::SchemaTerm | ExprKind::SchemaVariable => {
                self.get(schema.symbol()).cloned()
            }
            ExprKind::SchemaFunction | ExprKind::SchemaRelation => {
                let head = self.get(schema.symbol())?;
                let children = schema
                    .children()
                    .iter()
                    .map(|c| self.instantiate(c))
                    .collect::<Option<Vec<_>>>()?;
                Some(head.with_children(children))
            }
            _ => {
                let children = schema
                    .children()
                    .iter()
                    .map(|c| self.instantiate(c))
                    .collect::<Option<Vec<_>>>()?;
                Some(schema.with_children(children))
            }
        }
    }
}

/// The outcome of matching a concrete expression against a schema whose root
/// is compatible with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchOutcome {
    /// Every node matched and every placeholder was bound consistently.
    pub full: bool,
    /// Every literal node matched; some placeholder may still have met two
    /// different values.
    pub sufficient: bool,
    /// Literal nodes that matched.
    pub progress: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("the formula does not have the required main connective")]
pub struct FormMismatch;

/// Match `concrete` against `schema`, recording bindings in `session`.
pub fn match_form(
    schema: &Expr,
    concrete: &Expr,
    session: &mut BindingSession,
) -> Result<MatchOutcome, FormMismatch> {
    if !root_compatible(schema, concrete) {
        return Err(FormMismatch);
    }

    let mut walk = Walk {
        session,
        literal: true,
        consistent: true,
        progress: 0,
    };
    walk.visit(schema, concrete);

    Ok(MatchOutcome {
        full: walk.literal && walk.consistent,
        sufficient: walk.literal,
        progress: walk.progress,
    })
}

/// Whether `concrete` matches `schema` fully.
pub fn matches(schema: &Expr, concrete: &Expr, session: &mut BindingSession) -> bool {
    match_form(schema, concrete, session).is_ok_and(|o| o.full)
}

fn root_compatible(schema: &Expr, concrete: &Expr) -> bool {
    match schema.kind() {
        ExprKind::SchemaSentence => concrete.kind().is_formula(),
        ExprKind::SchemaTerm => concrete.is_term(),
        ExprKind::SchemaVariable => concrete.kind() == ExprKind::Variable,
        ExprKind::SchemaFunction => {
            concrete.kind() == ExprKind::Function && concrete.arity() == schema.arity()
        }
        ExprKind::SchemaRelation => {
            concrete.kind() == ExprKind::Relation && concrete.arity() == schema.arity()
        }
        _ => schema.same_head(concrete),
    }
}

struct Walk<'s> {
    session: &'s mut BindingSession,
    literal: bool,
    consistent: bool,
    progress: usize,
}

impl Walk<'_> {
    fn visit(&mut self, schema: &Expr, concrete: &Expr) {
        if !root_compatible(schema, concrete) {
            self.literal = false;
            return;
        }

        match schema.kind() {
            ExprKind::SchemaSentence | ExprKind::SchemaTerm | ExprKind::SchemaVariable => {
                self.bind(schema.symbol(), concrete);
            }
            ExprKind::SchemaFunction | ExprKind::SchemaRelation => {
                // The placeholder stands for the symbol alone.
                let head = Expr::leaf(concrete.kind(), concrete.symbol());
                self.bind(schema.symbol(), &head);
                self.visit_children(schema, concrete);
            }
            _ => {
                self.progress += 1;
                self.visit_children(schema, concrete);
            }
        }
    }

    fn visit_children(&mut self, schema: &Expr, concrete: &Expr) {
        for (s, c) in schema.children().iter().zip(concrete.children()) {
            self.visit(s, c);
        }
    }

    fn bind(&mut self, placeholder: Ustr, value: &Expr) {
        if !self.session.bind(placeholder, value) {
            self.consistent = false;
        }
    }
}
