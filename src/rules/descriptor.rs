//! The TOML form of a rule and its compilation into a [`Rule`].

use serde::Deserialize;
use thiserror::Error;
use ustr::Ustr;

use crate::{
    lang::Language,
    parse::{ParseFailure, StyledText, parse_one},
    rules::{
        Form, ReplacementForm, Rule, RuleShape, SideCondition, SpecialRule,
        citation::ExitMarker,
    },
    semant::expr::Expr,
    strings::{INTERDERIVABLE, TURNSTILE},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Axiom,
    Inference,
    Closing,
    Replacement,
    Special,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDef {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub kind: RuleKind,
    /// Exit strategy marker of a closing rule, `g` or `c`.
    #[serde(default)]
    pub marker: Option<char>,
    #[serde(default)]
    pub forms: Vec<FormDef>,
    #[serde(default)]
    pub equivalences: Vec<EquivalenceDef>,
    #[serde(default)]
    pub special: Option<SpecialRule>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormDef {
    #[serde(default)]
    pub lines: Vec<String>,
    /// Each subderivation as `[first line, last line]`.
    #[serde(default)]
    pub subs: Vec<[String; 2]>,
    pub infer: String,
    /// `[variable, formula]` pairs.
    #[serde(default)]
    pub not_free: Vec<[String; 2]>,
    #[serde(default)]
    pub not_free_in_assumptions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EquivalenceDef {
    pub left: String,
    pub right: String,
    #[serde(default)]
    pub not_free: Vec<[String; 2]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("rule {rule}: cannot read the form `{text}`: {failure}")]
    Form {
        rule: String,
        text: String,
        failure: ParseFailure,
    },
    #[error("rule {rule}: {reason}")]
    Shape { rule: String, reason: &'static str },
    #[error("rule {rule}: the side condition names `{placeholder}`, which its form does not use")]
    UnknownPlaceholder { rule: String, placeholder: String },
}

impl RuleDef {
    pub fn compile(&self, meta: &Language) -> Result<Rule, DescriptorError> {
        let shape_error = |reason| DescriptorError::Shape {
            rule: self.name.clone(),
            reason,
        };

        let shape = match self.kind {
            RuleKind::Axiom => {
                let forms = self.compile_forms(meta)?;
                if forms.iter().any(|f| !f.inputs.is_empty() || !f.subs.is_empty()) {
                    return Err(shape_error("an axiom cites nothing"));
                }
                RuleShape::Axiom(forms)
            }
            RuleKind::Inference => {
                let forms = self.compile_forms(meta)?;
                if forms.iter().any(|f| !f.subs.is_empty()) {
                    return Err(shape_error("an inference cites no subderivations"));
                }
                if forms.iter().any(|f| f.inputs.is_empty()) {
                    return Err(shape_error("an inference cites at least one line"));
                }
                RuleShape::Inference(forms)
            }
            RuleKind::Closing => {
                let marker = self
                    .marker
                    .and_then(ExitMarker::from_char)
                    .ok_or_else(|| shape_error("a closing rule needs a marker, `g` or `c`"))?;
                let forms = self.compile_forms(meta)?;
                if forms.iter().any(|f| f.subs.is_empty()) {
                    return Err(shape_error("a closing rule cites a subderivation"));
                }
                RuleShape::Closing { forms, marker }
            }
            RuleKind::Replacement => {
                if self.equivalences.is_empty() {
                    return Err(shape_error("a replacement rule needs equivalences"));
                }
                let forms = self
                    .equivalences
                    .iter()
                    .map(|eq| self.compile_equivalence(eq, meta))
                    .collect::<Result<_, _>>()?;
                RuleShape::Replacement(forms)
            }
            RuleKind::Special => RuleShape::Special(
                self.special
                    .ok_or_else(|| shape_error("a special rule names its evaluator"))?,
            ),
        };

        if !matches!(self.kind, RuleKind::Closing) && self.marker.is_some() {
            return Err(shape_error("only closing rules have a marker"));
        }

        Ok(Rule::new(
            Ustr::from(self.name.as_str()),
            self.aliases.iter().map(|a| Ustr::from(a.as_str())).collect(),
            shape,
        ))
    }

    fn schema(&self, text: &str, meta: &Language) -> Result<Expr, DescriptorError> {
        parse_one(&StyledText::from_markup(text), meta).map_err(|failure| DescriptorError::Form {
            rule: self.name.clone(),
            text: text.to_string(),
            failure,
        })
    }

    /// A single placeholder such as `𝓍`, which must occur in `within`.
    fn placeholder(&self, text: &str, within: &[&Expr]) -> Result<Ustr, DescriptorError> {
        let symbol = Ustr::from(text.trim());
        if within
            .iter()
            .any(|e| e.walk().any(|node| node.kind().is_schema() && node.symbol() == symbol))
        {
            Ok(symbol)
        } else {
            Err(DescriptorError::UnknownPlaceholder {
                rule: self.name.clone(),
                placeholder: text.to_string(),
            })
        }
    }

    fn compile_forms(&self, meta: &Language) -> Result<Vec<Form>, DescriptorError> {
        if self.forms.is_empty() {
            return Err(DescriptorError::Shape {
                rule: self.name.clone(),
                reason: "the rule needs at least one form",
            });
        }

        let forms = self
            .forms
            .iter()
            .map(|def| {
                let inputs = def
                    .lines
                    .iter()
                    .map(|t| self.schema(t, meta))
                    .collect::<Result<Vec<_>, _>>()?;
                let subs = def
                    .subs
                    .iter()
                    .map(|[top, bottom]| Ok((self.schema(top, meta)?, self.schema(bottom, meta)?)))
                    .collect::<Result<Vec<_>, DescriptorError>>()?;
                let output = self.schema(&def.infer, meta)?;

                let mut all: Vec<&Expr> = inputs.iter().collect();
                all.extend(subs.iter().flat_map(|(t, b)| [t, b]));
                all.push(&output);

                let mut side = Vec::new();
                for [variable, within] in &def.not_free {
                    side.push(SideCondition::NotFree {
                        variable: self.placeholder(variable, &all)?,
                        within: self.placeholder(within, &all)?,
                    });
                }
                for variable in &def.not_free_in_assumptions {
                    side.push(SideCondition::NotFreeInAssumptions {
                        variable: self.placeholder(variable, &all)?,
                    });
                }

                Ok(Form {
                    inputs,
                    subs,
                    output,
                    side,
                })
            })
            .collect::<Result<Vec<_>, DescriptorError>>()?;

        let counts = |f: &Form| (f.inputs.len(), f.subs.len());
        if forms.iter().any(|f| counts(f) != counts(&forms[0])) {
            return Err(DescriptorError::Shape {
                rule: self.name.clone(),
                reason: "every form must cite the same number of lines and subderivations",
            });
        }
        Ok(forms)
    }

    fn compile_equivalence(
        &self,
        def: &EquivalenceDef,
        meta: &Language,
    ) -> Result<ReplacementForm, DescriptorError> {
        let left = self.schema(&def.left, meta)?;
        let right = self.schema(&def.right, meta)?;
        let side = def
            .not_free
            .iter()
            .map(|[variable, within]| {
                Ok(SideCondition::NotFree {
                    variable: self.placeholder(variable, &[&left, &right])?,
                    within: self.placeholder(within, &[&left, &right])?,
                })
            })
            .collect::<Result<_, DescriptorError>>()?;
        Ok(ReplacementForm { left, right, side })
    }
}

impl Form {
    /// `𝒫, [𝒬 ⊢ ℛ] ∴ 𝒮`, subderivations in square brackets.
    pub fn display(&self, meta: &Language) -> String {
        let mut parts: Vec<String> = self
            .inputs
            .iter()
            .map(|e| e.display(meta).to_string())
            .collect();
        parts.extend(self.subs.iter().map(|(top, bottom)| {
            format!(
                "[{} {} {}]",
                top.display(meta),
                *TURNSTILE,
                bottom.display(meta)
            )
        }));
        let premises = parts.join(", ");
        let conclusion = self.output.display(meta);
        if premises.is_empty() {
            format!("∴ {conclusion}")
        } else {
            format!("{premises} ∴ {conclusion}")
        }
    }
}

impl ReplacementForm {
    pub fn display(&self, meta: &Language) -> String {
        format!(
            "{} {} {}",
            self.left.display(meta),
            *INTERDERIVABLE,
            self.right.display(meta)
        )
    }
}
