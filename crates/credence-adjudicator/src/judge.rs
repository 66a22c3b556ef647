//! Lexical contradiction judge
//!
//! The default `ContradictionJudge`: a deliberately conservative lexical
//! heuristic that flags polarity-flipped propositions about the same
//! subject ("always returns true" vs "never returns true"). It stands in
//! for genuine semantic judgment; richer judges plug in through the same
//! trait without touching the engine.

use credence_domain::traits::ContradictionJudge;
use credence_domain::{
    Claim, ContradictionFinding, ContradictionSeverity, ContradictionType,
};

/// Token pairs treated as polarity flips
const ANTONYM_PAIRS: [(&str, &str); 6] = [
    ("always", "never"),
    ("true", "false"),
    ("enabled", "disabled"),
    ("can", "cannot"),
    ("succeeds", "fails"),
    ("present", "absent"),
];

fn is_antonym_pair(a: &str, b: &str) -> bool {
    ANTONYM_PAIRS
        .iter()
        .any(|&(x, y)| (a == x && b == y) || (a == y && b == x))
}

fn normalize(proposition: &str) -> Vec<String> {
    proposition
        .to_lowercase()
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Lexical polarity-flip contradiction detection
///
/// Two propositions conflict when, token for token, they are identical
/// except at exactly one position holding an antonym pair. Requiring an
/// otherwise matching proposition keeps false positives rare at the cost of
/// recall - the intended trade for an automated blocker.
#[derive(Debug, Clone, Default)]
pub struct LexicalNegationJudge;

impl ContradictionJudge for LexicalNegationJudge {
    fn judge(&self, candidate: &Claim, existing: &Claim) -> Option<ContradictionFinding> {
        if !candidate.subject.same_as(&existing.subject) {
            return None;
        }

        let a = normalize(&candidate.proposition);
        let b = normalize(&existing.proposition);
        if a.len() != b.len() || a.is_empty() {
            return None;
        }

        let mut flips = 0;
        for (token_a, token_b) in a.iter().zip(&b) {
            if token_a == token_b {
                continue;
            }
            if is_antonym_pair(token_a, token_b) {
                flips += 1;
            } else {
                // Any non-antonym difference means the propositions are
                // about different things; stay silent
                return None;
            }
        }

        if flips == 1 {
            Some(ContradictionFinding {
                contradiction_type: ContradictionType::Direct,
                severity: ContradictionSeverity::Blocking,
                description: format!(
                    "polarity flip on {} '{}': \"{}\" vs \"{}\"",
                    candidate.subject.kind,
                    candidate.subject.identifier,
                    candidate.proposition,
                    existing.proposition
                ),
            })
        } else {
            None
        }
    }
}
