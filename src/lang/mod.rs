//! Static descriptions of formal languages: which glyphs are connectives,
//! quantifiers and brackets, which letters are sentence letters, constants,
//! variables and so on. Both the object language of proof lines and the
//! meta-language of rule templates are described this way.

use aho_corasick::{AhoCorasick, MatchKind, StartKind};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;
use ustr::Ustr;

use crate::semant::expr::ExprKind;

pub const SENTENTIAL: &str = include_str!("sentential.toml");
pub const QUANTIFICATIONAL: &str = include_str!("quantificational.toml");
pub const META: &str = include_str!("meta.toml");

#[derive(Debug, Error)]
pub enum LanguageError {
    #[error("malformed language definition: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("glyph `{glyph}` is declared twice in language `{language}`")]
    DuplicateGlyph { language: Ustr, glyph: Ustr },
    #[error("glyph `{glyph}` of language `{language}` clashes with a letter")]
    GlyphIsLetter { language: Ustr, glyph: Ustr },
    #[error("connective `{glyph}` of language `{language}` has arity {arity}; only 1 and 2 are supported")]
    BadArity {
        language: Ustr,
        glyph: Ustr,
        arity: usize,
    },
    #[error("language `{0}` declares no bracket pair")]
    NoBrackets(Ustr),
    #[error("language `{0}` has a glyph that is the empty string")]
    EmptyGlyph(Ustr),
    #[error("could not build the glyph matcher for language `{language}`: {source}")]
    Matcher {
        language: Ustr,
        source: aho_corasick::BuildError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantifierKind {
    Universal,
    Existential,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConnectiveDef {
    glyph: String,
    #[serde(default)]
    aliases: Vec<String>,
    arity: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct QuantifierDef {
    glyph: String,
    #[serde(default)]
    aliases: Vec<String>,
    kind: QuantifierKind,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDef {
    #[serde(default)]
    sentences: String,
    #[serde(default)]
    terms: String,
    #[serde(default)]
    variables: String,
    #[serde(default)]
    functions: String,
    #[serde(default)]
    relations: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct LanguageDef {
    name: String,
    #[serde(default)]
    sentence_letters: String,
    #[serde(default)]
    relations: bool,
    #[serde(default)]
    constants: String,
    #[serde(default)]
    variables: String,
    #[serde(default)]
    functions: String,
    contradiction: Option<String>,
    #[serde(default)]
    contradiction_aliases: Vec<String>,
    identity: Option<String>,
    brackets: Vec<[String; 2]>,
    comma: String,
    #[serde(default)]
    dividers: Vec<String>,
    #[serde(default)]
    outer_brackets_optional: bool,
    #[serde(default, rename = "connective")]
    connectives: Vec<ConnectiveDef>,
    #[serde(default, rename = "quantifier")]
    quantifiers: Vec<QuantifierDef>,
    #[serde(default)]
    schema: SchemaDef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connective {
    glyph: Ustr,
    arity: usize,
}

impl Connective {
    pub fn glyph(&self) -> Ustr {
        self.glyph
    }

    pub fn arity(&self) -> usize {
        self.arity
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantifier {
    glyph: Ustr,
    kind: QuantifierKind,
}

impl Quantifier {
    pub fn glyph(&self) -> Ustr {
        self.glyph
    }

    pub fn kind(&self) -> QuantifierKind {
        self.kind
    }
}

/// What a matched glyph means to the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlyphRole {
    Connective(usize),
    Quantifier(usize),
    Open(usize),
    Close(usize),
    Comma,
    Divider,
    Contradiction,
    Identity,
}

/// The roles a single letter can play. A lowercase letter is often both a
/// constant (or variable) and a function letter; the superscript that
/// follows it decides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LetterClass {
    pub sentence: bool,
    pub relation: bool,
    pub constant: bool,
    pub variable: bool,
    pub function: bool,
    pub schema: Option<ExprKind>,
}

impl LetterClass {
    pub fn starts_term(&self) -> bool {
        self.constant
            || self.variable
            || self.function
            || matches!(
                self.schema,
                Some(ExprKind::SchemaTerm | ExprKind::SchemaVariable | ExprKind::SchemaFunction)
            )
    }
}

#[derive(Debug, Clone)]
pub struct Language {
    name: Ustr,
    connectives: Vec<Connective>,
    quantifiers: Vec<Quantifier>,
    brackets: Vec<(Ustr, Ustr)>,
    comma: Ustr,
    contradiction: Option<Ustr>,
    identity: Option<Ustr>,
    outer_brackets_optional: bool,
    letters: FxHashMap<char, LetterClass>,
    glyph_roles: Vec<GlyphRole>,
    matcher: AhoCorasick,
}

impl Language {
    pub fn from_toml(text: &str) -> Result<Self, LanguageError> {
        let def: LanguageDef = toml::from_str(text)?;
        Self::from_def(def)
    }

    fn from_def(def: LanguageDef) -> Result<Self, LanguageError> {
        let name = Ustr::from(&def.name);

        let mut letters: FxHashMap<char, LetterClass> = FxHashMap::default();
        let mut mark = |set: &str, apply: &dyn Fn(&mut LetterClass)| {
            for c in set.chars() {
                apply(letters.entry(c).or_default());
            }
        };
        mark(&def.sentence_letters, &|l| l.sentence = true);
        if def.relations {
            mark(&def.sentence_letters, &|l| l.relation = true);
        }
        mark(&def.constants, &|l| l.constant = true);
        mark(&def.variables, &|l| l.variable = true);
        mark(&def.functions, &|l| l.function = true);
        mark(&def.schema.sentences, &|l| l.schema = Some(ExprKind::SchemaSentence));
        mark(&def.schema.terms, &|l| l.schema = Some(ExprKind::SchemaTerm));
        mark(&def.schema.variables, &|l| l.schema = Some(ExprKind::SchemaVariable));
        mark(&def.schema.functions, &|l| l.schema = Some(ExprKind::SchemaFunction));
        mark(&def.schema.relations, &|l| l.schema = Some(ExprKind::SchemaRelation));

        if def.brackets.is_empty() {
            return Err(LanguageError::NoBrackets(name));
        }

        let mut patterns: Vec<Ustr> = Vec::new();
        let mut glyph_roles = Vec::new();
        let mut add = |glyph: &str, role: GlyphRole| -> Result<(), LanguageError> {
            let glyph = Ustr::from(glyph);
            if glyph.is_empty() {
                return Err(LanguageError::EmptyGlyph(name));
            }
            if patterns.contains(&glyph) {
                return Err(LanguageError::DuplicateGlyph {
                    language: name,
                    glyph,
                });
            }
            if glyph.chars().count() == 1 && glyph.chars().all(|c| letters.contains_key(&c)) {
                return Err(LanguageError::GlyphIsLetter {
                    language: name,
                    glyph,
                });
            }
            patterns.push(glyph);
            glyph_roles.push(role);
            Ok(())
        };

        let mut connectives = Vec::new();
        for (i, conn) in def.connectives.iter().enumerate() {
            if conn.arity != 1 && conn.arity != 2 {
                return Err(LanguageError::BadArity {
                    language: name,
                    glyph: Ustr::from(&conn.glyph),
                    arity: conn.arity,
                });
            }
            add(&conn.glyph, GlyphRole::Connective(i))?;
            for alias in &conn.aliases {
                add(alias, GlyphRole::Connective(i))?;
            }
            connectives.push(Connective {
                glyph: Ustr::from(&conn.glyph),
                arity: conn.arity,
            });
        }

        let mut quantifiers = Vec::new();
        for (i, quant) in def.quantifiers.iter().enumerate() {
            add(&quant.glyph, GlyphRole::Quantifier(i))?;
            for alias in &quant.aliases {
                add(alias, GlyphRole::Quantifier(i))?;
            }
            quantifiers.push(Quantifier {
                glyph: Ustr::from(&quant.glyph),
                kind: quant.kind,
            });
        }

        let mut brackets = Vec::new();
        for (i, [open, close]) in def.brackets.iter().enumerate() {
            add(open, GlyphRole::Open(i))?;
            add(close, GlyphRole::Close(i))?;
            brackets.push((Ustr::from(open), Ustr::from(close)));
        }

        add(&def.comma, GlyphRole::Comma)?;
        for divider in &def.dividers {
            add(divider, GlyphRole::Divider)?;
        }
        if let Some(contradiction) = &def.contradiction {
            add(contradiction, GlyphRole::Contradiction)?;
            for alias in &def.contradiction_aliases {
                add(alias, GlyphRole::Contradiction)?;
            }
        }
        if let Some(identity) = &def.identity {
            add(identity, GlyphRole::Identity)?;
        }

        let matcher = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .start_kind(StartKind::Anchored)
            .build(patterns.iter().map(|p| p.as_str()))
            .map_err(|source| LanguageError::Matcher {
                language: name,
                source,
            })?;

        Ok(Self {
            name,
            connectives,
            quantifiers,
            brackets,
            comma: Ustr::from(&def.comma),
            contradiction: def.contradiction.as_deref().map(Ustr::from),
            identity: def.identity.as_deref().map(Ustr::from),
            outer_brackets_optional: def.outer_brackets_optional,
            letters,
            glyph_roles,
            matcher,
        })
    }

    pub fn name(&self) -> Ustr {
        self.name
    }

    pub fn connective(&self, idx: usize) -> &Connective {
        &self.connectives[idx]
    }

    pub fn connectives(&self) -> &[Connective] {
        &self.connectives
    }

    pub fn quantifier(&self, idx: usize) -> &Quantifier {
        &self.quantifiers[idx]
    }

    pub fn quantifier_kind(&self, glyph: Ustr) -> Option<QuantifierKind> {
        self.quantifiers
            .iter()
            .find(|q| q.glyph == glyph)
            .map(|q| q.kind)
    }

    pub fn universal(&self) -> Option<Ustr> {
        self.quantifier_of_kind(QuantifierKind::Universal)
    }

    pub fn existential(&self) -> Option<Ustr> {
        self.quantifier_of_kind(QuantifierKind::Existential)
    }

    fn quantifier_of_kind(&self, kind: QuantifierKind) -> Option<Ustr> {
        self.quantifiers
            .iter()
            .find(|q| q.kind == kind)
            .map(|q| q.glyph)
    }

    pub fn brackets(&self) -> &[(Ustr, Ustr)] {
        &self.brackets
    }

    /// The bracket pair used for a binary node at the given nesting level.
    pub fn brackets_at(&self, level: u32) -> (Ustr, Ustr) {
        self.brackets[level as usize % self.brackets.len()]
    }

    pub fn comma(&self) -> Ustr {
        self.comma
    }

    pub fn contradiction(&self) -> Option<Ustr> {
        self.contradiction
    }

    pub fn identity(&self) -> Option<Ustr> {
        self.identity
    }

    pub fn outer_brackets_optional(&self) -> bool {
        self.outer_brackets_optional
    }

    pub fn letter_class(&self, c: char) -> LetterClass {
        self.letters.get(&c).copied().unwrap_or_default()
    }

    pub(crate) fn glyph_matcher(&self) -> &AhoCorasick {
        &self.matcher
    }

    pub(crate) fn glyph_role(&self, pattern: usize) -> GlyphRole {
        self.glyph_roles[pattern]
    }
}
