//! Stream aggregation — reducing one round's fragments into a result.
//!
//! The model's streaming wire format fragments tool calls across deltas:
//! argument text accumulates by `index`, while the call `id` may arrive
//! only with a later fragment for that index. The aggregator therefore
//! keys accumulation by `index` and finalizes identity by `id` — that
//! two-key scheme is a protocol requirement, since tool results must be
//! matched back to requests by id afterwards.

use std::collections::BTreeMap;
use wayfarer_core::message::ToolCallRequest;
use wayfarer_core::provider::{FinishReason, StreamFragment};

/// A tool call being assembled from fragments for one `index`.
#[derive(Debug, Default)]
struct PartialCall {
    id: String,
    name: String,
    arguments: String,
}

/// Reduces the fragments of one streamed round.
///
/// Feed every fragment to [`ingest`](Self::ingest) in stream order, then
/// call [`finish`](Self::finish) for the accumulated text, the tool calls
/// in ascending index order, and the terminal reason.
#[derive(Debug, Default)]
pub struct RoundAggregator {
    content: String,
    calls: BTreeMap<u32, PartialCall>,
    finish_reason: Option<FinishReason>,
}

/// The reduced result of one round.
#[derive(Debug)]
pub struct RoundOutcome {
    /// All text content, concatenated in stream order.
    pub content: String,

    /// Completed tool-call requests in ascending index order. A request
    /// whose name never arrived is still emitted; invoking it fails
    /// downstream, which is the dispatcher's concern.
    pub calls: Vec<ToolCallRequest>,

    /// The most recent non-null finish reason seen, if any.
    pub finish_reason: Option<FinishReason>,
}

impl RoundAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one fragment into the round state.
    pub fn ingest(&mut self, fragment: &StreamFragment) {
        for tc in &fragment.tool_calls {
            let entry = self.calls.entry(tc.index).or_default();
            // First non-empty value wins; a later empty delta never
            // clobbers it.
            if entry.id.is_empty() {
                if let Some(id) = tc.id.as_deref().filter(|s| !s.is_empty()) {
                    entry.id = id.to_string();
                }
            }
            if entry.name.is_empty() {
                if let Some(name) = tc.name.as_deref().filter(|s| !s.is_empty()) {
                    entry.name = name.to_string();
                }
            }
            if let Some(args) = &tc.arguments {
                entry.arguments.push_str(args);
            }
        }

        if let Some(content) = &fragment.content {
            self.content.push_str(content);
        }

        if let Some(reason) = &fragment.finish_reason {
            self.finish_reason = Some(reason.clone());
        }
    }

    /// Whether any tool-call fragment has been seen this round.
    ///
    /// The runner uses this to suppress streaming of text that accompanies
    /// tool calls — such text is commentary, not the final answer.
    pub fn has_tool_calls(&self) -> bool {
        !self.calls.is_empty()
    }

    /// Finalize the round. Tool calls come out in ascending index order.
    pub fn finish(self) -> RoundOutcome {
        let calls = self
            .calls
            .into_iter()
            .map(|(index, partial)| ToolCallRequest {
                id: partial.id,
                index,
                name: partial.name,
                arguments: partial.arguments,
            })
            .collect();

        RoundOutcome {
            content: self.content,
            calls,
            finish_reason: self.finish_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_core::provider::ToolCallFragment;

    fn call_frag(
        index: u32,
        id: Option<&str>,
        name: Option<&str>,
        arguments: Option<&str>,
    ) -> StreamFragment {
        StreamFragment {
            content: None,
            tool_calls: vec![ToolCallFragment {
                index,
                id: id.map(String::from),
                name: name.map(String::from),
                arguments: arguments.map(String::from),
            }],
            finish_reason: None,
        }
    }

    #[test]
    fn accumulates_text_in_order() {
        let mut agg = RoundAggregator::new();
        agg.ingest(&StreamFragment::text("Hello, "));
        agg.ingest(&StreamFragment::text("world"));
        agg.ingest(&StreamFragment::finish(FinishReason::Stop));

        let outcome = agg.finish();
        assert_eq!(outcome.content, "Hello, world");
        assert!(outcome.calls.is_empty());
        assert_eq!(outcome.finish_reason, Some(FinishReason::Stop));
    }

    #[test]
    fn assembles_fragmented_tool_call() {
        let mut agg = RoundAggregator::new();
        agg.ingest(&call_frag(0, Some("call_1"), Some("search_places"), Some("{\"loc")));
        agg.ingest(&call_frag(0, None, None, Some("ation\":\"Rome\"}")));
        agg.ingest(&StreamFragment::finish(FinishReason::ToolCalls));

        let outcome = agg.finish();
        assert_eq!(outcome.calls.len(), 1);
        let call = &outcome.calls[0];
        assert_eq!(call.id, "call_1");
        assert_eq!(call.name, "search_places");
        assert_eq!(call.arguments, "{\"location\":\"Rome\"}");
    }

    #[test]
    fn id_arriving_after_arguments_is_applied() {
        // The id may arrive after the first arguments fragment for an
        // index — accumulation is keyed by index, not id.
        let mut agg = RoundAggregator::new();
        agg.ingest(&call_frag(0, None, None, Some("{\"a\":")));
        agg.ingest(&call_frag(0, Some("call_late"), Some("tool"), Some("1}")));

        let outcome = agg.finish();
        assert_eq!(outcome.calls[0].id, "call_late");
        assert_eq!(outcome.calls[0].arguments, "{\"a\":1}");
    }

    #[test]
    fn first_nonempty_identity_wins() {
        let mut agg = RoundAggregator::new();
        agg.ingest(&call_frag(0, Some("call_1"), Some("tool_a"), None));
        agg.ingest(&call_frag(0, Some("call_other"), Some("tool_b"), None));

        let outcome = agg.finish();
        assert_eq!(outcome.calls[0].id, "call_1");
        assert_eq!(outcome.calls[0].name, "tool_a");
    }

    #[test]
    fn calls_emitted_in_index_order() {
        let mut agg = RoundAggregator::new();
        agg.ingest(&call_frag(2, Some("call_c"), Some("t"), None));
        agg.ingest(&call_frag(0, Some("call_a"), Some("t"), None));
        agg.ingest(&call_frag(1, Some("call_b"), Some("t"), None));

        let outcome = agg.finish();
        let ids: Vec<_> = outcome.calls.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["call_a", "call_b", "call_c"]);
    }

    #[test]
    fn chunking_invariance() {
        // The same argument text split differently across fragments must
        // accumulate to the same string.
        let pieces_a = ["{\"location\"", ": \"Rome\", \"category\"", ": \"museum\"}"];
        let pieces_b = ["{\"location\": \"Rome\"", ", \"category\": \"museum\"}"];

        let run = |pieces: &[&str]| {
            let mut agg = RoundAggregator::new();
            agg.ingest(&call_frag(0, Some("call_1"), Some("search_places"), None));
            for p in pieces {
                agg.ingest(&call_frag(0, None, None, Some(p)));
            }
            agg.finish().calls[0].arguments.clone()
        };

        assert_eq!(run(&pieces_a), run(&pieces_b));
        assert_eq!(
            run(&pieces_a),
            "{\"location\": \"Rome\", \"category\": \"museum\"}"
        );
    }

    #[test]
    fn nameless_call_still_emitted() {
        let mut agg = RoundAggregator::new();
        agg.ingest(&call_frag(0, Some("call_1"), None, Some("{}")));

        let outcome = agg.finish();
        assert_eq!(outcome.calls.len(), 1);
        assert!(outcome.calls[0].name.is_empty());
        assert_eq!(outcome.calls[0].arguments, "{}");
    }

    #[test]
    fn latest_finish_reason_wins() {
        let mut agg = RoundAggregator::new();
        agg.ingest(&StreamFragment::finish(FinishReason::Other("length".into())));
        agg.ingest(&StreamFragment::finish(FinishReason::Stop));
        assert_eq!(agg.finish().finish_reason, Some(FinishReason::Stop));
    }

    #[test]
    fn has_tool_calls_tracks_first_fragment() {
        let mut agg = RoundAggregator::new();
        assert!(!agg.has_tool_calls());
        agg.ingest(&StreamFragment::text("thinking..."));
        assert!(!agg.has_tool_calls());
        agg.ingest(&call_frag(0, Some("call_1"), Some("t"), None));
        assert!(agg.has_tool_calls());
    }
}
