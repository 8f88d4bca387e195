//! # Prompt Catalog
//!
//! Fixed guidance texts keyed by the transition they introduce.
//!
//! The catalog is built once at startup, optionally patched with overrides
//! from configuration, and then only read. The engine borrows it; nothing
//! mutates it after construction.
//!
//! ## Keys
//!
//! | Key | Canonical form | Used when |
//! |-----|----------------|-----------|
//! | `Stage(s)` | `<stage>` | advancing into `s` |
//! | `Refinement` | `implementation_refinement` | staying in implementation |
//! | `Loopback { target, from }` | `<target>_loopback_from_<from>` | accepted loopback |

use crate::{LoopbackTarget, OccamError, Stage};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;

// =============================================================================
// GUIDANCE KEY
// =============================================================================

const REFINEMENT_KEY: &str = "implementation_refinement";
const LOOPBACK_INFIX: &str = "_loopback_from_";

/// Identifier of one guidance text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GuidanceKey {
    /// Plain guidance for entering a stage.
    Stage(Stage),
    /// Guidance for another pass over the implementation.
    Refinement,
    /// Guidance for an accepted loopback from `from` into `target`.
    Loopback { target: LoopbackTarget, from: Stage },
}

impl GuidanceKey {
    /// Compose the key for a transition.
    ///
    /// An accepted loopback wins over refinement; refinement applies only
    /// when the next stage is `Implementation`.
    #[must_use]
    pub fn resolve(next: Stage, refinement: bool, loopback_from: Option<Stage>) -> Self {
        match (loopback_from, next.as_loopback_target()) {
            (Some(from), Some(target)) => GuidanceKey::Loopback { target, from },
            _ if refinement && next == Stage::Implementation => GuidanceKey::Refinement,
            _ => GuidanceKey::Stage(next),
        }
    }

    /// The less specific key to try when this one has no text.
    #[must_use]
    pub fn fallback(&self) -> Option<GuidanceKey> {
        match self {
            GuidanceKey::Stage(_) => None,
            GuidanceKey::Refinement => Some(GuidanceKey::Stage(Stage::Implementation)),
            GuidanceKey::Loopback { target, .. } => Some(GuidanceKey::Stage(target.stage())),
        }
    }
}

impl std::fmt::Display for GuidanceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuidanceKey::Stage(stage) => f.write_str(stage.as_str()),
            GuidanceKey::Refinement => f.write_str(REFINEMENT_KEY),
            GuidanceKey::Loopback { target, from } => {
                write!(f, "{}{}{}", target, LOOPBACK_INFIX, from)
            }
        }
    }
}

impl FromStr for GuidanceKey {
    type Err = OccamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == REFINEMENT_KEY {
            return Ok(GuidanceKey::Refinement);
        }

        let unknown = || OccamError::UnknownGuidanceKey(s.to_string());

        if let Some((target, from)) = s.split_once(LOOPBACK_INFIX) {
            let target = target.parse::<LoopbackTarget>().map_err(|_| unknown())?;
            let from = from.parse::<Stage>().map_err(|_| unknown())?;
            return Ok(GuidanceKey::Loopback { target, from });
        }

        s.parse::<Stage>().map(GuidanceKey::Stage).map_err(|_| unknown())
    }
}

// =============================================================================
// STANDARD GUIDANCE TEXTS
// =============================================================================

const CONTEXT_ANALYSIS: &str = "Start by understanding the ground you are standing on. Restate the user's request in your own words, then survey the relevant parts of the project: languages, frameworks, existing components, conventions, and constraints. Note anything that could be reused and anything that limits the possible solutions. Do not propose solutions yet; only gather the context needed to define the outcome.";

const OUTCOME_DEFINITION: &str = "Now that you've analyzed the context, the next step is crucial for ensuring we build the right thing simply: Clearly define the desired outcome. Focus specifically on the *minimal viable* result required by the user's request *at this time*. Specify clear, measurable success criteria. If any part of the outcome remains ambiguous based on the request and context, explicitly list the questions needing user clarification. Ensure your definition is thorough before proceeding.";

const SOLUTION_EXPLORATION: &str = "With a clear outcome defined, let's explore potential paths. Generate 2-3 distinct approaches to achieve this outcome. Start with the most direct and minimal approach possible. For others, consider different strategies but always evaluate if existing project patterns, abstractions, or components (identified during context analysis) can be effectively reused. Briefly outline the implementation strategy and key changes for each approach. Ensure your exploration covers a reasonable range of alternatives before proceeding.";

const SIMPLICITY_EVALUATION: &str = "Now, critically evaluate the explored approaches using Occam's Razor principles. The goal is to find the *simplest* solution that is also *fully effective*. Compare the approaches based on: **Simplicity** (considering code directness, conceptual understandability, consistency with existing patterns, number/complexity of dependencies, estimated computational efficiency/directness, and the cost/benefit of reuse vs. new code) and **Effectiveness** (how robustly it meets the defined outcome, acknowledging any project constraints identified earlier). Justify your choice for the simplest *effective* approach by explaining why it strikes the best balance, and briefly explain why the other options were rejected (e.g., too complex, ineffective, poor fit). **Explicitly note any significant complexities you are consciously avoiding by selecting the recommended path.** If no approach offers a good balance, consider requesting a loop back to 'solution_exploration' with refined criteria. Ensure your evaluation is rigorous before proceeding.";

const IMPLEMENTATION: &str = "The evaluation points to the simplest effective path. Now, proceed to implement this chosen solution. **Focus strictly on executing this plan.** Adhere only to the code, patterns, and logic necessary to achieve the defined outcome. Avoid introducing unrelated changes, premature abstractions, or unrequested features ('gold plating'). Prepare a concise summary of the implementation details upon completion. Ensure your implementation plan is clear before starting.";

const IMPLEMENTATION_REFINEMENT: &str = "Review the code you've just implemented. Does it faithfully represent the simplest effective approach chosen earlier? **If any minor clarifications or constraints emerged during implementation, ensure the code adapts appropriately without introducing significant new complexity.** Could any part be further simplified while still fully meeting the outcome? If the implementation is complete, minimal, and effective, summarize the key changes made and set 'next_thought_needed' to false. If further refinement or adaptation is needed, describe the specific next implementation step required.";

const REPORTING_ISSUE: &str = "It seems the request cannot be completed as planned. Summarize the blocking issue clearly and concisely so it can be presented effectively to the user. Explain *why* the original request cannot be fulfilled as specified, referencing specific constraints or findings from your analysis if applicable. Set 'next_thought_needed' to false.";

const EXPLORATION_AFTER_EVALUATION: &str = "Your evaluation indicated previous options were not sufficiently simple or effective. **Using the specific feedback from your evaluation (the reasons for rejection and complexities noted),** let's explore again. Generate 1-2 *new* or significantly revised approaches. Focus specifically on overcoming those previously identified limitations (e.g., finding ways to reduce complexity, improve effectiveness, enable better reuse, or work within constraints). Remember to leverage existing project abstractions where beneficial.";

const OUTCOME_AFTER_IMPLEMENTATION: &str = "Implementation revealed a potential misunderstanding or issue with the defined outcome. **Based on the implementation challenges encountered (explain them in your thought),** let's revisit and refine the desired outcome. Clearly restate the outcome, incorporating necessary adjustments or clarifications. If user input is now needed, specify the questions.";

// =============================================================================
// PROMPT CATALOG
// =============================================================================

/// Immutable mapping from guidance key to guidance text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptCatalog {
    prompts: BTreeMap<GuidanceKey, String>,
}

impl Default for PromptCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Shape of a TOML prompt file: a `[prompts]` table of canonical keys.
#[derive(Debug, Default, Deserialize)]
struct PromptFile {
    #[serde(default)]
    prompts: BTreeMap<String, String>,
}

impl PromptCatalog {
    /// The built-in guidance texts.
    #[must_use]
    pub fn standard() -> Self {
        Self::from_entries([
            (GuidanceKey::Stage(Stage::ContextAnalysis), CONTEXT_ANALYSIS),
            (GuidanceKey::Stage(Stage::OutcomeDefinition), OUTCOME_DEFINITION),
            (GuidanceKey::Stage(Stage::SolutionExploration), SOLUTION_EXPLORATION),
            (GuidanceKey::Stage(Stage::SimplicityEvaluation), SIMPLICITY_EVALUATION),
            (GuidanceKey::Stage(Stage::Implementation), IMPLEMENTATION),
            (GuidanceKey::Stage(Stage::ReportingIssue), REPORTING_ISSUE),
            (GuidanceKey::Refinement, IMPLEMENTATION_REFINEMENT),
            (
                GuidanceKey::Loopback {
                    target: LoopbackTarget::SolutionExploration,
                    from: Stage::SimplicityEvaluation,
                },
                EXPLORATION_AFTER_EVALUATION,
            ),
            (
                GuidanceKey::Loopback {
                    target: LoopbackTarget::OutcomeDefinition,
                    from: Stage::Implementation,
                },
                OUTCOME_AFTER_IMPLEMENTATION,
            ),
        ])
    }

    /// A catalog holding exactly the given entries.
    #[must_use]
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (GuidanceKey, S)>,
        S: Into<String>,
    {
        Self {
            prompts: entries
                .into_iter()
                .map(|(key, text)| (key, text.into()))
                .collect(),
        }
    }

    /// Replace or add texts by canonical key.
    ///
    /// Consumes the catalog and returns the patched one, so overrides can
    /// only be applied while the catalog is being built.
    pub fn with_overrides<I, K, V>(mut self, overrides: I) -> Result<Self, OccamError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, text) in overrides {
            let key: GuidanceKey = key.as_ref().parse()?;
            let text = text.into();
            if text.trim().is_empty() {
                return Err(OccamError::Config(format!(
                    "prompt override for '{}' is empty",
                    key
                )));
            }
            self.prompts.insert(key, text);
        }
        Ok(self)
    }

    /// The standard catalog patched with the `[prompts]` table of a TOML
    /// document.
    pub fn from_toml_str(document: &str) -> Result<Self, OccamError> {
        let file: PromptFile =
            toml::from_str(document).map_err(|e| OccamError::Config(e.to_string()))?;
        Self::standard().with_overrides(file.prompts)
    }

    /// Get the text for a key.
    #[must_use]
    pub fn lookup(&self, key: &GuidanceKey) -> Option<&str> {
        self.prompts.get(key).map(String::as_str)
    }

    /// All entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&GuidanceKey, &str)> {
        self.prompts.iter().map(|(key, text)| (key, text.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn standard_catalog_has_distinct_required_texts() {
        let catalog = PromptCatalog::standard();
        let required = [
            GuidanceKey::Stage(Stage::ContextAnalysis),
            GuidanceKey::Stage(Stage::OutcomeDefinition),
            GuidanceKey::Stage(Stage::SolutionExploration),
            GuidanceKey::Stage(Stage::SimplicityEvaluation),
            GuidanceKey::Stage(Stage::Implementation),
            GuidanceKey::Refinement,
            GuidanceKey::Loopback {
                target: LoopbackTarget::SolutionExploration,
                from: Stage::SimplicityEvaluation,
            },
            GuidanceKey::Loopback {
                target: LoopbackTarget::OutcomeDefinition,
                from: Stage::Implementation,
            },
        ];

        let texts: BTreeSet<&str> = required
            .iter()
            .map(|key| catalog.lookup(key).expect("required key"))
            .collect();
        assert_eq!(texts.len(), required.len());
    }

    #[test]
    fn resolve_prefers_loopback_then_refinement() {
        assert_eq!(
            GuidanceKey::resolve(
                Stage::SolutionExploration,
                false,
                Some(Stage::SimplicityEvaluation)
            ),
            GuidanceKey::Loopback {
                target: LoopbackTarget::SolutionExploration,
                from: Stage::SimplicityEvaluation,
            }
        );
        assert_eq!(
            GuidanceKey::resolve(Stage::Implementation, true, None),
            GuidanceKey::Refinement
        );
        assert_eq!(
            GuidanceKey::resolve(Stage::Implementation, false, None),
            GuidanceKey::Stage(Stage::Implementation)
        );
        assert_eq!(
            GuidanceKey::resolve(Stage::OutcomeDefinition, true, None),
            GuidanceKey::Stage(Stage::OutcomeDefinition)
        );
    }

    #[test]
    fn canonical_form_round_trips() {
        let catalog = PromptCatalog::standard();
        for (key, _) in catalog.iter() {
            let text = key.to_string();
            assert_eq!(text.parse::<GuidanceKey>().expect("parse"), *key);
        }
        assert_eq!(
            GuidanceKey::Loopback {
                target: LoopbackTarget::OutcomeDefinition,
                from: Stage::Implementation,
            }
            .to_string(),
            "outcome_definition_loopback_from_implementation"
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        for bad in [
            "",
            "implementation_refinements",
            "reporting_issue_loopback_from_implementation",
            "solution_exploration_loopback_from_nowhere",
        ] {
            assert!(
                matches!(
                    bad.parse::<GuidanceKey>(),
                    Err(OccamError::UnknownGuidanceKey(_))
                ),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn overrides_replace_texts() {
        let catalog = PromptCatalog::standard()
            .with_overrides([("implementation_refinement", "Tighten it up.")])
            .expect("override");
        assert_eq!(
            catalog.lookup(&GuidanceKey::Refinement),
            Some("Tighten it up.")
        );
        assert_eq!(catalog.len(), PromptCatalog::standard().len());
    }

    #[test]
    fn overrides_reject_unknown_or_empty() {
        assert!(
            PromptCatalog::standard()
                .with_overrides([("warp_speed", "Go.")])
                .is_err()
        );
        assert!(
            PromptCatalog::standard()
                .with_overrides([("implementation", "   ")])
                .is_err()
        );
    }

    #[test]
    fn toml_document_applies_prompts_table() {
        let document = r#"
            [prompts]
            context_analysis = "Look around first."
            simplicity_evaluation_loopback_from_implementation = "Re-weigh the options."
        "#;
        let catalog = PromptCatalog::from_toml_str(document).expect("parse");
        assert_eq!(
            catalog.lookup(&GuidanceKey::Stage(Stage::ContextAnalysis)),
            Some("Look around first.")
        );
        assert_eq!(
            catalog.lookup(&GuidanceKey::Loopback {
                target: LoopbackTarget::SimplicityEvaluation,
                from: Stage::Implementation,
            }),
            Some("Re-weigh the options.")
        );
        assert_eq!(catalog.len(), PromptCatalog::standard().len() + 1);
    }

    #[test]
    fn standard_texts_are_stable() {
        let catalog = PromptCatalog::standard();
        assert_eq!(
            catalog.lookup(&GuidanceKey::Stage(Stage::Implementation)),
            Some(
                "The evaluation points to the simplest effective path. Now, proceed to implement \
                 this chosen solution. **Focus strictly on executing this plan.** Adhere only to \
                 the code, patterns, and logic necessary to achieve the defined outcome. Avoid \
                 introducing unrelated changes, premature abstractions, or unrequested features \
                 ('gold plating'). Prepare a concise summary of the implementation details upon \
                 completion. Ensure your implementation plan is clear before starting."
            )
        );

        let outcome_loopback = catalog
            .lookup(&GuidanceKey::Loopback {
                target: LoopbackTarget::OutcomeDefinition,
                from: Stage::Implementation,
            })
            .expect("loopback text");
        assert!(outcome_loopback.starts_with(
            "Implementation revealed a potential misunderstanding or issue with the defined outcome."
        ));
        assert!(outcome_loopback.ends_with("If user input is now needed, specify the questions."));

        // Texts are stored bare, without surrounding quotes.
        for (_, text) in catalog.iter() {
            assert!(!text.starts_with('"') && !text.ends_with('"'));
        }
    }

    #[test]
    fn toml_without_prompts_table_is_standard() {
        let catalog = PromptCatalog::from_toml_str("").expect("parse");
        assert_eq!(catalog, PromptCatalog::standard());
    }
}
