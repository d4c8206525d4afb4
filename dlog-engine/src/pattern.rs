//! Glob pattern sets with negation.
//!
//! Patterns are compiled once per query. Matching a candidate against a
//! list walks it in order; the first pattern that matches decides. A
//! matching negated pattern aborts the whole list, so a negation shadows
//! every pattern after it.

use crate::error::{EngineError, Result};
use globset::{Glob, GlobMatcher};

/// Result of matching one candidate against a pattern list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// A positive pattern matched.
    Match,
    /// No pattern matched.
    NoMatch,
    /// A negated pattern matched; the outer iteration stops here.
    BreakOuter,
}

#[derive(Debug, Clone)]
struct CompiledPattern {
    matcher: GlobMatcher,
    negated: bool,
}

/// An ordered, pre-compiled pattern list.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<CompiledPattern>,
    has_positive: bool,
}

impl PatternSet {
    /// Compile a pattern list; a leading `!` marks a negated pattern.
    pub fn compile(patterns: &[String]) -> Result<PatternSet> {
        let mut compiled = Vec::with_capacity(patterns.len());
        let mut has_positive = false;

        for pattern in patterns {
            let (negated, text) = match pattern.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, pattern.as_str()),
            };
            has_positive |= !negated;

            let matcher = Glob::new(text)
                .map_err(|source| EngineError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })?
                .compile_matcher();

            compiled.push(CompiledPattern { matcher, negated });
        }

        Ok(PatternSet {
            patterns: compiled,
            has_positive,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Match one candidate against the list.
    ///
    /// A list that holds only negated patterns admits every candidate none
    /// of them matches; otherwise at least one positive pattern has to
    /// match.
    pub fn verdict(&self, candidate: &str) -> Verdict {
        for pattern in &self.patterns {
            if pattern.matcher.is_match(candidate) {
                if pattern.negated {
                    return Verdict::BreakOuter;
                }
                return Verdict::Match;
            }
        }

        if self.has_positive {
            Verdict::NoMatch
        } else {
            Verdict::Match
        }
    }

    /// Whether the candidate passes the list; an empty list passes all.
    pub fn accepts(&self, candidate: &str) -> bool {
        self.is_empty() || self.verdict(candidate) == Verdict::Match
    }
}
