//! Rules whose forms cannot be written as a fixed schema: quantifier
//! instantiation, identity elimination and the substitution axioms.

use itertools::Itertools;
use ustr::Ustr;

use crate::{
    rules::{
        CheckError, Culprit, Mismatch, Rule, SpecialRule, StrategyError, Subject,
        checker::{Cited, LineContext},
        first_success, generic,
    },
    semant::{
        expr::{Expr, ExprKind},
        free_vars::{InstanceError, Instantiation, instance_term, is_free_in, is_identity_replacement},
        matcher::{BindingSession, match_form},
    },
    strings::{
        CONDITIONAL, SCHEMA_ARG_1, SCHEMA_ARG_2, SCHEMA_ARG_3, SCHEMA_FUNCTION, SCHEMA_LEFT,
        SCHEMA_RELATION, SCHEMA_RIGHT,
    },
};

/// Highest arity the substitution axioms are generated for.
const MAX_SUBSTITUTION_ARITY: usize = 3;

pub(super) fn apply(rule: &Rule, special: SpecialRule, ctx: &LineContext) -> Result<(), CheckError> {
    match special {
        SpecialRule::UniversalElim => universal_elim(rule, ctx),
        SpecialRule::UniversalIntro => universal_intro(rule, ctx),
        SpecialRule::ExistentialIntro => existential_intro(rule, ctx),
        SpecialRule::ExistentialElim => {
            generic::strategies(rule, ctx)?;
            existential_elim(rule, ctx)
        }
        SpecialRule::IdentityElim => identity_elim(rule, ctx),
        SpecialRule::UniversalInstanceAxiom => universal_instance_axiom(rule, ctx),
        SpecialRule::FunctionSubstitution => substitution_axiom(rule, ctx, false),
        SpecialRule::RelationSubstitution => substitution_axiom(rule, ctx, true),
    }
}

fn mismatch(
    rule: &Rule,
    ctx: &LineContext,
    cited: Cited,
    expected: String,
    progress: usize,
) -> CheckError {
    CheckError::mismatch(Mismatch {
        rule: rule.name(),
        subject: ctx.subject(cited),
        found: cited.formula.clone(),
        expected,
        progress,
        sufficient: false,
    })
}

fn single_line<'a>(rule: &Rule, ctx: &LineContext<'a>) -> Result<Cited<'a>, CheckError> {
    match ctx.lines.as_slice() {
        [cited] => Ok(*cited),
        _ => Err(CheckError::CitationShape {
            rule: rule.name(),
            cites: "one line".to_string(),
        }),
    }
}

/// The bound variable and body of `cited`, which must be quantified by
/// `quantifier`.
fn quantified<'a>(
    rule: &Rule,
    ctx: &LineContext,
    cited: Cited<'a>,
    quantifier: Option<Ustr>,
    what: &str,
) -> Result<(&'a Expr, &'a Expr), CheckError> {
    match (quantifier, cited.formula.as_quantified()) {
        (Some(q), Some(parts)) if cited.formula.symbol() == q => Ok(parts),
        _ => Err(mismatch(rule, ctx, cited, what.to_string(), 0)),
    }
}

fn capture_or_mismatch(
    err: InstanceError,
    rule: &Rule,
    ctx: &LineContext,
    cited: Cited,
    expected: String,
) -> CheckError {
    match err {
        InstanceError::Captured(variable) => CheckError::FreeVariableCapture {
            variable,
            culprit: Culprit::Capture,
        },
        InstanceError::Inconsistent => mismatch(rule, ctx, cited, expected, 1),
        InstanceError::Mismatch => mismatch(rule, ctx, cited, expected, 0),
    }
}

fn universal_elim(rule: &Rule, ctx: &LineContext) -> Result<(), CheckError> {
    let cited = single_line(rule, ctx)?;
    let (var, body) = quantified(
        rule,
        ctx,
        cited,
        ctx.ruleset.object().universal(),
        "a universally quantified formula",
    )?;

    instance_term(body, var, ctx.formula)
        .map(|_| ())
        .map_err(|err| {
            let expected = format!("{} with a term in place of {}", ctx.show(body), var);
            capture_or_mismatch(err, rule, ctx, ctx.this_line(), expected)
        })
}

fn existential_intro(rule: &Rule, ctx: &LineContext) -> Result<(), CheckError> {
    let cited = single_line(rule, ctx)?;
    let this = ctx.this_line();
    let (var, body) = quantified(
        rule,
        ctx,
        this,
        ctx.ruleset.object().existential(),
        "an existentially quantified formula",
    )?;

    instance_term(body, var, cited.formula)
        .map(|_| ())
        .map_err(|err| {
            let expected = format!(
                "a quantification over {} of line {}, with {} in place of some occurrences of one term",
                var, cited.label, var
            );
            capture_or_mismatch(err, rule, ctx, this, expected)
        })
}

/// The variable that `instance` puts in place of `var`, which must be a
/// variable for the generalizing rules. `None` when the quantifier is
/// vacuous.
fn instantiating_variable(
    rule: &Rule,
    ctx: &LineContext,
    body: &Expr,
    var: &Expr,
    instance: Cited,
    subject: Cited,
) -> Result<Option<Expr>, CheckError> {
    let expected = || format!("{} with a variable in place of {}", ctx.show(body), var);
    match instance_term(body, var, instance.formula) {
        Ok(Instantiation::Vacuous) => Ok(None),
        Ok(Instantiation::Term(term)) if term.is_variable() => Ok(Some(term)),
        Ok(Instantiation::Term(_)) => Err(mismatch(rule, ctx, subject, expected(), 1)),
        Err(err) => Err(capture_or_mismatch(err, rule, ctx, subject, expected())),
    }
}

fn universal_intro(rule: &Rule, ctx: &LineContext) -> Result<(), CheckError> {
    let cited = single_line(rule, ctx)?;
    let this = ctx.this_line();
    let (var, body) = quantified(
        rule,
        ctx,
        this,
        ctx.ruleset.object().universal(),
        "a universally quantified formula",
    )?;

    let Some(instance) = instantiating_variable(rule, ctx, body, var, cited, cited)? else {
        return Ok(());
    };
    generic::not_free_in_assumptions(&instance, ctx)?;
    if is_free_in(&instance, ctx.formula) {
        return Err(CheckError::FreeVariableCapture {
            variable: instance.symbol(),
            culprit: Culprit::ThisLine,
        });
    }
    Ok(())
}

fn existential_elim(rule: &Rule, ctx: &LineContext) -> Result<(), CheckError> {
    let (cited, (top, bottom)) = match (ctx.lines.as_slice(), ctx.blocks.as_slice()) {
        ([cited], [block]) => (*cited, *block),
        _ => {
            return Err(CheckError::CitationShape {
                rule: rule.name(),
                cites: "one line and one subderivation".to_string(),
            });
        }
    };

    if let Some(strategy) = ctx.strategy(top.index)
        && let Some(announced) = strategy.line
        && announced != cited.label
    {
        return Err(StrategyError::OtherLine {
            top: top.label,
            announced,
            cited: cited.label,
        }
        .into());
    }

    let (var, body) = quantified(
        rule,
        ctx,
        cited,
        ctx.ruleset.object().existential(),
        "an existentially quantified formula",
    )?;
    let instance = instantiating_variable(rule, ctx, body, var, top, top)?;

    if ctx.formula != bottom.formula {
        return Err(mismatch(
            rule,
            ctx,
            ctx.this_line(),
            format!("{}, the last line of the subderivation", ctx.show(bottom.formula)),
            2,
        ));
    }

    let Some(instance) = instance else {
        return Ok(());
    };
    let variable = instance.symbol();
    if is_free_in(&instance, cited.formula) {
        return Err(CheckError::FreeVariableCapture {
            variable,
            culprit: Culprit::Line(cited.label),
        });
    }
    if is_free_in(&instance, ctx.formula) {
        return Err(CheckError::FreeVariableCapture {
            variable,
            culprit: Culprit::ThisLine,
        });
    }
    generic::not_free_in_assumptions(&instance, ctx)
}

fn identity_elim(rule: &Rule, ctx: &LineContext) -> Result<(), CheckError> {
    let [a, b] = ctx.lines.as_slice() else {
        return Err(CheckError::CitationShape {
            rule: rule.name(),
            cites: "two lines".to_string(),
        });
    };
    let identity = ctx.ruleset.object().identity();

    first_success(
        [(*a, *b), (*b, *a)],
        |(equation, before)| {
            let (s, t) = match (identity, equation.formula.children()) {
                (Some(id), [s, t]) if equation.formula.is_identity(id) => (s, t),
                _ => return Err(mismatch(rule, ctx, equation, "an identity".to_string(), 0)),
            };
            if is_identity_replacement(before.formula, ctx.formula, s, t)
                || is_identity_replacement(before.formula, ctx.formula, t, s)
            {
                Ok(())
            } else {
                Err(mismatch(
                    rule,
                    ctx,
                    ctx.this_line(),
                    format!(
                        "line {} with occurrences of {} and {} exchanged",
                        before.label,
                        ctx.show(s),
                        ctx.show(t)
                    ),
                    1,
                ))
            }
        },
        CheckError::CitationShape {
            rule: rule.name(),
            cites: "two lines".to_string(),
        },
    )
}

fn universal_instance_axiom(rule: &Rule, ctx: &LineContext) -> Result<(), CheckError> {
    let this = ctx.this_line();
    let expected = || {
        format!(
            "a conditional from a universal formula to one of its instances, as in (∀𝓍𝒫 {} 𝒫)",
            *CONDITIONAL
        )
    };

    let (antecedent, consequent) = match this.formula.as_binary() {
        Some(parts) if this.formula.is_binary(*CONDITIONAL) => parts,
        _ => return Err(mismatch(rule, ctx, this, expected(), 0)),
    };
    let (var, body) = match (ctx.ruleset.object().universal(), antecedent.as_quantified()) {
        (Some(q), Some(parts)) if antecedent.symbol() == q => parts,
        _ => return Err(mismatch(rule, ctx, this, expected(), 1)),
    };

    instance_term(body, var, consequent)
        .map(|_| ())
        .map_err(|err| capture_or_mismatch(err, rule, ctx, this, expected()))
}

fn schema_arg(i: usize) -> Ustr {
    match i {
        0 => *SCHEMA_ARG_1,
        1 => *SCHEMA_ARG_2,
        _ => *SCHEMA_ARG_3,
    }
}

/// `(𝓈 = 𝓉 → 𝒽(…𝓈…) = 𝒽(…𝓉…))`, or with `ℛ` and `→` in place of `𝒽` and
/// `=`, for each arity and argument position.
fn substitution_forms(identity: Ustr, relation: bool) -> Vec<Expr> {
    let s = Expr::leaf(ExprKind::SchemaTerm, *SCHEMA_LEFT);
    let t = Expr::leaf(ExprKind::SchemaTerm, *SCHEMA_RIGHT);

    (1..=MAX_SUBSTITUTION_ARITY)
        .flat_map(|arity| (0..arity).map(move |pos| (arity, pos)))
        .map(|(arity, pos)| {
            let args = |at: &Expr| -> Vec<Expr> {
                (0..arity)
                    .map(|i| {
                        if i == pos {
                            at.clone()
                        } else {
                            Expr::leaf(ExprKind::SchemaTerm, schema_arg(i))
                        }
                    })
                    .collect()
            };
            let consequent = if relation {
                let apply = |at| Expr::new(ExprKind::SchemaRelation, *SCHEMA_RELATION, args(at));
                Expr::binary(*CONDITIONAL, apply(&s), apply(&t))
            } else {
                let apply = |at| Expr::new(ExprKind::SchemaFunction, *SCHEMA_FUNCTION, args(at));
                Expr::relation(identity, vec![apply(&s), apply(&t)])
            };
            Expr::binary(
                *CONDITIONAL,
                Expr::relation(identity, vec![s.clone(), t.clone()]),
                consequent,
            )
        })
        .collect()
}

/// The arity of the substituted symbol in a line shaped like a substitution
/// axiom, if it has that shape.
fn substituted_arity(line: &Expr, relation: bool) -> Option<usize> {
    let (_, consequent) = line.as_binary()?;
    let applied = consequent.children().first()?;
    let kind = if relation { ExprKind::Relation } else { ExprKind::Function };
    (applied.kind() == kind).then(|| applied.arity())
}

fn substitution_axiom(rule: &Rule, ctx: &LineContext, relation: bool) -> Result<(), CheckError> {
    let this = ctx.this_line();
    let Some(identity) = ctx.ruleset.object().identity() else {
        return Err(CheckError::CapabilityLimit(format!(
            "{} needs a language with identity",
            rule.name()
        )));
    };

    if let Some(arity) = substituted_arity(this.formula, relation)
        && arity > MAX_SUBSTITUTION_ARITY
    {
        return Err(CheckError::CapabilityLimit(format!(
            "{} is only available for {} symbols of up to {} places, not {}",
            rule.name(),
            if relation { "relation" } else { "function" },
            MAX_SUBSTITUTION_ARITY,
            arity
        )));
    }

    let forms = substitution_forms(identity, relation);
    let expected = forms
        .iter()
        .take(3)
        .map(|f| ctx.show_schema(f))
        .join(", ");
    first_success(
        forms.iter(),
        |form| {
            let mut session = BindingSession::new();
            match match_form(form, this.formula, &mut session) {
                Ok(outcome) if outcome.full => Ok(()),
                Ok(outcome) => Err(CheckError::mismatch(Mismatch {
                    rule: rule.name(),
                    subject: Subject::ThisLine,
                    found: this.formula.clone(),
                    expected: format!("one of {expected}, …"),
                    progress: outcome.progress,
                    sufficient: outcome.sufficient,
                })),
                Err(_) => Err(mismatch(rule, ctx, this, format!("one of {expected}, …"), 0)),
            }
        },
        CheckError::CapabilityLimit(format!("{} has no forms", rule.name())),
    )
}
