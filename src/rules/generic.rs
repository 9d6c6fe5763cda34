use tracing::trace;

use crate::{
    derivation::{LineRole, StructureError},
    rules::{
        CheckError, Culprit, Form, Mismatch, ReplacementForm, Rule, SideCondition, StrategyError,
        Subject,
        checker::{Cited, LineContext},
        first_success, orderings,
    },
    semant::{
        expr::Expr,
        free_vars::is_free_in,
        matcher::{BindingSession, match_form, matches},
        replace::{ReplacementFailure, replacement_check_with},
    },
};

pub(super) fn premise(ctx: &LineContext) -> Result<(), CheckError> {
    let line = ctx.derivation.line(ctx.index);
    if line.depth > 0 {
        return Err(StructureError::PremiseInSubderivation(line.label).into());
    }
    if ctx.ruleset.premises_first()
        && let Some(step) = ctx.derivation.lines()[..ctx.index]
            .iter()
            .find(|l| l.role != LineRole::Premise)
    {
        return Err(StructureError::PremiseAfterStep {
            premise: line.label,
            step: step.label,
        }
        .into());
    }
    Ok(())
}

pub(super) fn assumption(ctx: &LineContext) -> Result<(), CheckError> {
    let line = ctx.derivation.line(ctx.index);
    if line.depth == 0 || !ctx.derivation.opens_scope(ctx.index) {
        return Err(StructureError::AssumptionAtTopLevel(line.label).into());
    }

    let Some(strategy) = ctx.citation.strategy else {
        return if ctx.ruleset.generic_assumptions() {
            Ok(())
        } else {
            Err(StrategyError::Missing.into())
        };
    };

    let closing = ctx
        .ruleset
        .rule_named(strategy.rule)
        .ok_or(StrategyError::UnknownRule(strategy.rule))?;
    match closing.closing_marker() {
        None => Err(StrategyError::NotClosing(closing.name()).into()),
        Some(marker) if marker != strategy.marker => Err(StrategyError::WrongMarker {
            rule: closing.name(),
            expected: marker,
        }
        .into()),
        Some(_) => Ok(()),
    }
}

/// Every cited subderivation was opened by an assumption announcing `rule`.
pub(super) fn strategies(rule: &Rule, ctx: &LineContext) -> Result<(), CheckError> {
    for (top, _) in &ctx.blocks {
        match ctx.strategy(top.index) {
            Some(strategy) if !rule.is_named(strategy.rule) => {
                return Err(StrategyError::OtherRule {
                    top: top.label,
                    announced: strategy.rule,
                    rule: rule.name(),
                }
                .into());
            }
            Some(_) => {}
            None if !ctx.citation_readable(top.index) => {
                return Err(StrategyError::Unreadable(top.label).into());
            }
            None if ctx.ruleset.generic_assumptions() => {}
            None => return Err(StrategyError::Missing.into()),
        }
    }
    Ok(())
}

/// Match the cited lines, the cited subderivations and the line itself
/// against one of `forms`, in any citation order.
pub(super) fn inference(rule: &Rule, forms: &[Form], ctx: &LineContext) -> Result<(), CheckError> {
    let line_orders = &orderings(&ctx.lines);
    let block_orders = &orderings(&ctx.blocks);

    let candidates = forms.iter().flat_map(|form| {
        line_orders.iter().flat_map(move |lines| {
            block_orders
                .iter()
                .map(move |blocks| (form, lines.as_slice(), blocks.as_slice()))
        })
    });

    first_success(
        candidates,
        |(form, lines, blocks)| attempt(rule, form, lines, blocks, ctx),
        CheckError::CapabilityLimit(format!("{} has no forms", rule.name())),
    )
}

fn attempt(
    rule: &Rule,
    form: &Form,
    lines: &[Cited],
    blocks: &[(Cited, Cited)],
    ctx: &LineContext,
) -> Result<(), CheckError> {
    let mut pairs: Vec<(&Expr, Cited)> = Vec::new();
    pairs.extend(form.inputs.iter().zip(lines.iter().copied()));
    for ((top_schema, bottom_schema), (top, bottom)) in form.subs.iter().zip(blocks) {
        pairs.push((top_schema, *top));
        pairs.push((bottom_schema, *bottom));
    }
    pairs.push((&form.output, ctx.this_line()));

    let mut session = BindingSession::new();
    let mut progress = 0;
    for (schema, cited) in pairs {
        let before = session.clone();
        let failure = match match_form(schema, cited.formula, &mut session) {
            Ok(outcome) if outcome.full => {
                progress += outcome.progress;
                continue;
            }
            Ok(outcome) => (progress + outcome.progress, outcome.sufficient),
            Err(_) => (progress, false),
        };
        trace!(rule = %rule.name(), line = %cited.label, "form rejected");
        return Err(CheckError::mismatch(Mismatch {
            rule: rule.name(),
            subject: ctx.subject(cited),
            found: cited.formula.clone(),
            expected: ctx.describe(schema, &before),
            progress: failure.0,
            sufficient: failure.1,
        }));
    }

    check_side_conditions(&form.side, &session, ctx)
}

pub(super) fn check_side_conditions(
    side: &[SideCondition],
    session: &BindingSession,
    ctx: &LineContext,
) -> Result<(), CheckError> {
    for condition in side {
        match condition {
            SideCondition::NotFree { variable, within } => {
                let (Some(var), Some(formula)) = (session.get(*variable), session.get(*within))
                else {
                    continue;
                };
                if is_free_in(var, formula) {
                    return Err(CheckError::FreeVariableCapture {
                        variable: var.symbol(),
                        culprit: Culprit::Formula(formula.clone()),
                    });
                }
            }
            SideCondition::NotFreeInAssumptions { variable } => {
                let Some(var) = session.get(*variable) else {
                    continue;
                };
                not_free_in_assumptions(var, ctx)?;
            }
        }
    }
    Ok(())
}

pub(super) fn not_free_in_assumptions(var: &Expr, ctx: &LineContext) -> Result<(), CheckError> {
    for k in ctx.derivation.undischarged_assumptions(ctx.index) {
        let line = ctx.derivation.line(k);
        if let Some(formula) = line.formula()
            && is_free_in(var, formula)
        {
            return Err(CheckError::FreeVariableCapture {
                variable: var.symbol(),
                culprit: Culprit::Assumption(line.label),
            });
        }
    }
    Ok(())
}

/// The line is the cited line with one part rewritten by one of the
/// equivalences, in either direction.
pub(super) fn replacement(
    rule: &Rule,
    forms: &[ReplacementForm],
    ctx: &LineContext,
) -> Result<(), CheckError> {
    let [cited] = ctx.lines.as_slice() else {
        return Err(CheckError::CitationShape {
            rule: rule.name(),
            cites: "one line".to_string(),
        });
    };
    let after = ctx.formula;

    let candidates = forms
        .iter()
        .flat_map(|form| [(form, &form.left, &form.right), (form, &form.right, &form.left)]);

    first_success(
        candidates,
        |(form, left, right)| {
            let side_ok =
                |session: &BindingSession| check_side_conditions(&form.side, session, ctx).is_ok();
            match replacement_check_with(left, right, cited.formula, after, side_ok) {
                Ok(_) => Ok(()),
                Err(ReplacementFailure::SideCondition(session)) => {
                    check_side_conditions(&form.side, &session, ctx)
                }
                Err(ReplacementFailure::NotAReplacement) => {
                    Err(CheckError::mismatch(Mismatch {
                        rule: rule.name(),
                        subject: Subject::ThisLine,
                        found: after.clone(),
                        expected: format!(
                            "line {} with one part {} rewritten as {}",
                            cited.label,
                            ctx.show_schema(left),
                            ctx.show_schema(right)
                        ),
                        progress: resemblance(left, right, cited.formula, after),
                        sufficient: false,
                    }))
                }
            }
        },
        CheckError::CapabilityLimit(format!("{} has no equivalences", rule.name())),
    )
}

/// How close a failed rewrite came: one point when `left` occurs in
/// `before`, one when `right` occurs in `after`.
fn resemblance(left: &Expr, right: &Expr, before: &Expr, after: &Expr) -> usize {
    let occurs = |schema: &Expr, formula: &Expr| {
        formula
            .walk()
            .any(|part| matches(schema, part, &mut BindingSession::new()))
    };
    occurs(left, before) as usize + occurs(right, after) as usize
}
