//! Maps per-template match results to a single UI state

use super::matcher::{MatchRegion, MatchResult, TemplateMatcher};
use crate::capture::Frame;
use crate::game_automation::config::Binding;
use crate::game_automation::types::UiState;

/// What the resolver decided for one frame.
#[derive(Debug, Clone)]
pub struct Resolution<'a, S> {
    pub state: S,
    /// The winning binding, absent when the state is unknown
    pub binding: Option<&'a Binding<S>>,
    /// The winning match, absent when the state is unknown
    pub result: Option<MatchResult>,
    /// Winner's confidence, or the best miss when nothing matched
    pub confidence: f32,
}

impl<S> Resolution<'_, S> {
    pub fn hit(&self) -> Option<&MatchRegion> {
        self.result.as_ref().and_then(MatchResult::region)
    }

    pub fn template(&self) -> Option<&str> {
        self.result.as_ref().map(|r| r.template.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StateResolver {
    matcher: TemplateMatcher,
}

impl StateResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the state shown in `frame`.
    ///
    /// Bindings are grouped by ascending priority whatever order they arrive
    /// in. Groups are tried in order and the first group with any match
    /// decides. Inside a group the highest confidence wins and an exact tie
    /// goes to the binding declared first.
    pub fn resolve<'a, S: UiState>(
        &self,
        frame: &Frame,
        bindings: &'a [Binding<S>],
    ) -> Resolution<'a, S> {
        let mut best_miss = 0.0f32;
        // Stable, so declaration order survives inside a priority
        let mut ordered: Vec<&'a Binding<S>> = bindings.iter().collect();
        ordered.sort_by_key(|b| b.priority);

        for group in ordered.chunk_by(|a, b| a.priority == b.priority) {
            let mut winner: Option<(&'a Binding<S>, MatchResult)> = None;
            for &binding in group {
                let result = self.matcher.match_template(frame, &binding.template);
                if !result.is_match() {
                    best_miss = best_miss.max(result.confidence);
                    continue;
                }
                let better = winner
                    .as_ref()
                    .is_none_or(|(_, current)| result.confidence > current.confidence);
                if better {
                    winner = Some((binding, result));
                }
            }

            if let Some((binding, result)) = winner {
                return Resolution {
                    state: binding.state,
                    binding: Some(binding),
                    confidence: result.confidence,
                    result: Some(result),
                };
            }
        }

        Resolution {
            state: S::UNKNOWN,
            binding: None,
            result: None,
            confidence: best_miss,
        }
    }
}
