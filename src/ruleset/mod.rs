//! Named bundles of rules for one logical system.

mod registry;

pub use registry::{Registry, RegistryError};

use std::sync::Arc;

use ustr::Ustr;

use crate::{
    lang::Language,
    rules::{
        CheckError, Rule,
        citation::{Citation, ItemKind},
        describe_cites,
    },
};

/// A citation that is well-formed but almost certainly not what the
/// student meant, with the advice to give instead of a generic failure.
#[derive(Debug, Clone)]
pub struct Mistake {
    pub rule: Ustr,
    pub cites: Vec<ItemKind>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Ruleset {
    name: Ustr,
    description: String,
    object: Arc<Language>,
    meta: Arc<Language>,
    premises_first: bool,
    generic_assumptions: bool,
    rules: Vec<Rule>,
    mistakes: Vec<Mistake>,
}

impl Ruleset {
    pub fn name(&self) -> Ustr {
        self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn object(&self) -> &Language {
        &self.object
    }

    pub fn meta(&self) -> &Language {
        &self.meta
    }

    /// Premises may only follow premises.
    pub fn premises_first(&self) -> bool {
        self.premises_first
    }

    /// Assumptions need not announce an exit strategy.
    pub fn generic_assumptions(&self) -> bool {
        self.generic_assumptions
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn mistakes(&self) -> &[Mistake] {
        &self.mistakes
    }

    /// The first rule called `name`, by name or alias.
    pub fn rule_named(&self, name: Ustr) -> Option<&Rule> {
        self.rules.iter().find(|r| r.is_named(name))
    }

    /// The rule a citation invokes. A known rule cited with the wrong items
    /// is reported as a common mistake when one is recorded for exactly that
    /// shape, and otherwise by saying what the rule cites.
    pub fn resolve(&self, citation: &Citation) -> Result<&Rule, CheckError> {
        let shape = citation.shape();
        let mut named = self.rules.iter().filter(|r| r.is_named(citation.rule)).peekable();

        let Some(first) = named.peek().copied() else {
            return Err(CheckError::UnknownRule {
                rule: citation.rule,
                ruleset: self.name,
            });
        };
        if let Some(rule) = named.find(|r| r.accepts_shape(&shape)) {
            return Ok(rule);
        }

        if let Some(mistake) = self
            .mistakes
            .iter()
            .find(|m| first.is_named(m.rule) && m.cites == shape)
        {
            return Err(CheckError::CommonMistake {
                rule: first.name(),
                message: mistake.message.clone(),
            });
        }

        Err(CheckError::CitationShape {
            rule: first.name(),
            cites: describe_cites(first.cites()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nd() -> Ruleset {
        Registry::builtin().unwrap().ruleset("ND").unwrap().clone()
    }

    fn resolve(rules: &Ruleset, text: &str) -> Result<Ustr, CheckError> {
        rules.resolve(&text.parse().unwrap()).map(|r| r.name())
    }

    #[test]
    fn resolves_by_name_and_alias() {
        let nd = nd();
        assert_eq!(resolve(&nd, "3, 4 →E"), Ok(Ustr::from("→E")));
        assert_eq!(resolve(&nd, "3, 4 ->E"), Ok(Ustr::from("→E")));
        assert_eq!(resolve(&nd, "PR"), Ok(Ustr::from("PR")));
        assert_eq!(resolve(&nd, "A (g, →I)"), Ok(Ustr::from("A")));
    }

    #[test]
    fn unknown_rules_name_the_ruleset() {
        assert_eq!(
            resolve(&nd(), "3 Zap"),
            Err(CheckError::UnknownRule {
                rule: Ustr::from("Zap"),
                ruleset: Ustr::from("ND"),
            })
        );
    }

    #[test]
    fn wrong_shapes_say_what_the_rule_cites() {
        assert_eq!(
            resolve(&nd(), "3 →E"),
            Err(CheckError::CitationShape {
                rule: Ustr::from("→E"),
                cites: "two lines".to_string(),
            })
        );
    }

    #[test]
    fn recorded_mistakes_take_precedence() {
        assert!(matches!(
            resolve(&nd(), "1-2 →E"),
            Err(CheckError::CommonMistake { .. })
        ));
    }
}
