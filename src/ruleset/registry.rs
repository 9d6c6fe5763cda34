use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use ustr::Ustr;

use crate::{
    lang::{Language, LanguageError, META, QUANTIFICATIONAL, SENTENTIAL},
    parse::{ParseFailure, StyledText, parse},
    rules::{
        Rule, RuleShape,
        citation::ItemKind,
        descriptor::{DescriptorError, RuleDef},
    },
    ruleset::{Mistake, Ruleset},
    semant::expr::Expr,
    strings::{ASSUMPTION, PREMISE},
};

pub const AD: &str = include_str!("defs/ad.toml");
pub const ND: &str = include_str!("defs/nd.toml");
pub const ND_PLUS: &str = include_str!("defs/nd_plus.toml");
pub const NDQ: &str = include_str!("defs/ndq.toml");

const META_LANGUAGE: &str = "meta";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Language(#[from] LanguageError),
    #[error("failed to read ruleset file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed ruleset: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("ruleset {ruleset}: {source}")]
    Rule {
        ruleset: Ustr,
        source: DescriptorError,
    },
    #[error("ruleset {ruleset} is written in the unknown language `{language}`")]
    UnknownLanguage { ruleset: Ustr, language: Ustr },
    #[error("ruleset {0} names no language and extends no ruleset")]
    MissingLanguage(Ustr),
    #[error("ruleset {ruleset} extends the unknown ruleset `{base}`")]
    UnknownBase { ruleset: Ustr, base: Ustr },
    #[error("ruleset {0} is defined twice")]
    DuplicateRuleset(Ustr),
    #[error("ruleset {ruleset} records a mistake for the unknown rule `{rule}`")]
    MistakeForUnknownRule { ruleset: Ustr, rule: Ustr },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesetDef {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    extends: Option<String>,
    #[serde(default)]
    premises_first: Option<bool>,
    #[serde(default)]
    generic_assumptions: Option<bool>,
    #[serde(default, rename = "rule")]
    rules: Vec<RuleDef>,
    #[serde(default, rename = "mistake")]
    mistakes: Vec<MistakeDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MistakeDef {
    rule: String,
    cites: Vec<ItemKind>,
    message: String,
}

/// Every language and ruleset known to the checker. Built once at startup
/// and read-only afterwards.
#[derive(Debug)]
pub struct Registry {
    languages: FxHashMap<Ustr, Arc<Language>>,
    rulesets: Vec<Ruleset>,
}

impl Registry {
    /// The built-in languages and the `AD`, `ND`, `ND+` and `NDQ` rulesets.
    pub fn builtin() -> Result<Self, RegistryError> {
        let mut registry = Self {
            languages: FxHashMap::default(),
            rulesets: Vec::new(),
        };
        for text in [SENTENTIAL, QUANTIFICATIONAL, META] {
            let lang = Language::from_toml(text)?;
            registry.languages.insert(lang.name(), Arc::new(lang));
        }
        for text in [AD, ND, ND_PLUS, NDQ] {
            registry.load_ruleset(text)?;
        }
        Ok(registry)
    }

    pub fn language(&self, name: &str) -> Option<&Language> {
        self.languages.get(&Ustr::from(name)).map(|l| l.as_ref())
    }

    pub fn ruleset(&self, name: &str) -> Option<&Ruleset> {
        self.rulesets.iter().find(|r| r.name().as_str() == name)
    }

    pub fn rulesets(&self) -> &[Ruleset] {
        &self.rulesets
    }

    /// Parse formulas in the named language.
    pub fn parse(&self, text: &str, language: &str) -> Result<Vec<Expr>, ParseFailure> {
        let lang = self
            .language(language)
            .ok_or_else(|| ParseFailure::UnknownLanguage(Ustr::from(language)))?;
        parse(&StyledText::from_markup(text), lang)
    }

    pub fn load_ruleset_file(&mut self, path: &Path) -> Result<Ustr, RegistryError> {
        let text = fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_ruleset(&text)
    }

    /// Add a ruleset written in TOML. A ruleset that extends another starts
    /// from its rules; a rule of the same name replaces the inherited one.
    pub fn load_ruleset(&mut self, text: &str) -> Result<Ustr, RegistryError> {
        let def: RulesetDef = toml::from_str(text)?;
        let name = Ustr::from(def.name.as_str());
        if self.ruleset(name.as_str()).is_some() {
            return Err(RegistryError::DuplicateRuleset(name));
        }

        let base = match &def.extends {
            Some(base) => Some(self.ruleset(base).ok_or_else(|| RegistryError::UnknownBase {
                ruleset: name,
                base: Ustr::from(base.as_str()),
            })?),
            None => None,
        };

        let object = match (&def.language, base) {
            (Some(language), _) => self
                .languages
                .get(&Ustr::from(language.as_str()))
                .cloned()
                .ok_or_else(|| RegistryError::UnknownLanguage {
                    ruleset: name,
                    language: Ustr::from(language.as_str()),
                })?,
            (None, Some(base)) => base.object.clone(),
            (None, None) => return Err(RegistryError::MissingLanguage(name)),
        };
        let meta = self
            .languages
            .get(&Ustr::from(META_LANGUAGE))
            .cloned()
            .ok_or_else(|| RegistryError::UnknownLanguage {
                ruleset: name,
                language: Ustr::from(META_LANGUAGE),
            })?;

        let mut rules: Vec<Rule> = match base {
            Some(base) => base.rules.clone(),
            None => vec![
                Rule::new(*PREMISE, vec![], RuleShape::Premise),
                Rule::new(*ASSUMPTION, vec![], RuleShape::Assumption),
            ],
        };
        for rule_def in &def.rules {
            let rule = rule_def
                .compile(&meta)
                .map_err(|source| RegistryError::Rule {
                    ruleset: name,
                    source,
                })?;
            match rules.iter_mut().find(|r| r.name() == rule.name()) {
                Some(existing) => *existing = rule,
                None => rules.push(rule),
            }
        }

        let mut mistakes = base.map(|b| b.mistakes.clone()).unwrap_or_default();
        for mistake in def.mistakes {
            let rule = Ustr::from(mistake.rule.as_str());
            if !rules.iter().any(|r| r.is_named(rule)) {
                return Err(RegistryError::MistakeForUnknownRule {
                    ruleset: name,
                    rule,
                });
            }
            mistakes.push(Mistake {
                rule,
                cites: mistake.cites,
                message: mistake.message,
            });
        }

        let ruleset = Ruleset {
            name,
            description: def.description,
            object,
            meta,
            premises_first: def
                .premises_first
                .or(base.map(|b| b.premises_first))
                .unwrap_or(false),
            generic_assumptions: def
                .generic_assumptions
                .or(base.map(|b| b.generic_assumptions))
                .unwrap_or(false),
            rules,
            mistakes,
        };
        debug!(ruleset = %name, rules = ruleset.rules.len(), "loaded ruleset");
        self.rulesets.push(ruleset);
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn builtins_load() {
        let registry = Registry::builtin().unwrap();
        let names: Vec<_> = registry.rulesets().iter().map(|r| r.name().as_str()).collect();
        assert_eq!(names, vec!["AD", "ND", "ND+", "NDQ"]);
        assert!(registry.ruleset("AD").unwrap().premises_first());
        assert_eq!(registry.ruleset("NDQ").unwrap().object().name().as_str(), "quantificational");
    }

    #[test]
    fn extension_inherits_rules() {
        let registry = Registry::builtin().unwrap();
        let nd = registry.ruleset("ND").unwrap();
        let plus = registry.ruleset("ND+").unwrap();
        let ndq = registry.ruleset("NDQ").unwrap();
        for rule in nd.rules() {
            assert!(plus.rule_named(rule.name()).is_some(), "{} missing", rule.name());
        }
        assert!(ndq.rule_named(Ustr::from("Com")).is_some());
        assert!(ndq.rule_named(Ustr::from("∀I")).is_some());
        assert!(plus.rule_named(Ustr::from("∀I")).is_none());
    }

    #[test]
    fn parse_by_language_name() {
        let registry = Registry::builtin().unwrap();
        let exprs = registry.parse("A ∧ B, ~C", "sentential").unwrap();
        assert_eq!(exprs.len(), 2);
        assert_eq!(
            registry.parse("A", "klingon"),
            Err(ParseFailure::UnknownLanguage(Ustr::from("klingon")))
        );
    }

    #[test]
    fn user_rulesets_extend_builtins() {
        let mut registry = Registry::builtin().unwrap();
        let name = registry
            .load_ruleset(indoc! {r#"
                name = "ND-lite"
                extends = "ND"
                generic_assumptions = true

                [[rule]]
                name = "DNE"
                kind = "inference"
                forms = [{ lines = ["~~𝒫"], infer = "𝒫" }]
            "#})
            .unwrap();
        let lite = registry.ruleset(name.as_str()).unwrap();
        assert!(lite.generic_assumptions());
        assert!(lite.rule_named(Ustr::from("DNE")).is_some());
        assert!(lite.rule_named(Ustr::from("→I")).is_some());
    }

    #[test]
    fn bad_rulesets_are_rejected() {
        let mut registry = Registry::builtin().unwrap();
        assert!(matches!(
            registry.load_ruleset("name = \"X\"\nextends = \"Nope\""),
            Err(RegistryError::UnknownBase { .. })
        ));
        assert!(matches!(
            registry.load_ruleset("name = \"X\"\nlanguage = \"klingon\""),
            Err(RegistryError::UnknownLanguage { .. })
        ));
        assert!(matches!(
            registry.load_ruleset("name = \"ND\"\nlanguage = \"sentential\""),
            Err(RegistryError::DuplicateRuleset(_))
        ));
        assert!(matches!(
            registry.load_ruleset("name = \"X\"\nlanguage = \"sentential\"\nbogus = 1"),
            Err(RegistryError::Toml(_))
        ));
        assert!(matches!(
            registry.load_ruleset(indoc! {r#"
                name = "X"
                language = "sentential"

                [[mistake]]
                rule = "Zap"
                cites = ["line"]
                message = "no"
            "#}),
            Err(RegistryError::MistakeForUnknownRule { .. })
        ));
    }
}
