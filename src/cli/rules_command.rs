use crate::{
    cli::CliError,
    config::FitchConfig,
    rules::{Rule, RuleShape, SpecialRule, describe_cites},
    ruleset::{Registry, Ruleset},
    util::ansi::{ANSI_BOLD, ANSI_GRAY, ANSI_RESET},
};
use argh::FromArgs;
use itertools::Itertools;

/// List the rulesets, or the rules of one ruleset.
#[derive(FromArgs)]
#[argh(subcommand, name = "rules")]
pub struct RulesCommand {
    /// the ruleset to show.
    #[argh(positional)]
    ruleset: Option<String>,
}

pub fn run_rules(cmd: RulesCommand) -> Result<bool, CliError> {
    let config = FitchConfig::discover()?;
    let mut registry = Registry::builtin()?;
    for path in config.rulesets() {
        registry.load_ruleset_file(path)?;
    }

    match cmd.ruleset {
        None => {
            for ruleset in registry.rulesets() {
                println!(
                    "{ANSI_BOLD}{}{ANSI_RESET} {ANSI_GRAY}({}){ANSI_RESET} {}",
                    ruleset.name(),
                    ruleset.object().name(),
                    ruleset.description()
                );
            }
        }
        Some(name) => {
            let ruleset = registry
                .ruleset(&name)
                .ok_or(CliError::UnknownRuleset(name))?;
            show_ruleset(ruleset);
        }
    }

    Ok(true)
}

fn show_ruleset(ruleset: &Ruleset) {
    println!("{ANSI_BOLD}{}{ANSI_RESET}: {}", ruleset.name(), ruleset.description());
    if ruleset.premises_first() {
        println!("Premises must come before every other line.");
    }
    println!();

    for rule in ruleset.rules() {
        show_rule(ruleset, rule);
    }

    if !ruleset.mistakes().is_empty() {
        println!();
        println!("{ANSI_BOLD}Common mistakes{ANSI_RESET}");
        for mistake in ruleset.mistakes() {
            println!(
                "  {} citing {}: {}",
                mistake.rule,
                describe_cites(&mistake.cites),
                mistake.message
            );
        }
    }
}

fn show_rule(ruleset: &Ruleset, rule: &Rule) {
    let aliases = if rule.aliases().is_empty() {
        String::new()
    } else {
        format!(" {ANSI_GRAY}({}){ANSI_RESET}", rule.aliases().iter().join(", "))
    };
    let cites = if rule.cites().is_empty() {
        "cites nothing".to_string()
    } else {
        format!("cites {}", describe_cites(rule.cites()))
    };
    println!("{ANSI_BOLD}{}{ANSI_RESET}{aliases}, {cites}", rule.name());

    let meta = ruleset.meta();
    let forms: Vec<String> = match rule.shape() {
        RuleShape::Premise => vec!["any formula, as a premise".to_string()],
        RuleShape::Assumption => vec!["any formula, opening a subderivation".to_string()],
        RuleShape::Axiom(forms) | RuleShape::Inference(forms) => {
            forms.iter().map(|f| f.display(meta)).collect()
        }
        RuleShape::Closing { forms, marker } => forms
            .iter()
            .map(|f| format!("{}  (assumptions announce it with {marker})", f.display(meta)))
            .collect(),
        RuleShape::Replacement(forms) => forms.iter().map(|f| f.display(meta)).collect(),
        RuleShape::Special(special) => vec![special_summary(*special).to_string()],
    };
    for form in forms {
        println!("    {form}");
    }
}

fn special_summary(special: SpecialRule) -> &'static str {
    match special {
        SpecialRule::UniversalElim => "∀xφ ∴ φ with a term for x",
        SpecialRule::UniversalIntro => "φ with a fresh variable for x ∴ ∀xφ",
        SpecialRule::ExistentialIntro => "φ with a term for x ∴ ∃xφ",
        SpecialRule::ExistentialElim => "∃xφ, [φ with a fresh variable for x ⊢ ψ] ∴ ψ",
        SpecialRule::IdentityElim => "t = u, φ ∴ φ with some t replaced by u",
        SpecialRule::UniversalInstanceAxiom => "∴ (∀xφ → φ with a term for x)",
        SpecialRule::FunctionSubstitution => "∴ (t = u → f(..t..) = f(..u..))",
        SpecialRule::RelationSubstitution => "∴ (t = u → (R(..t..) → R(..u..)))",
    }
}
