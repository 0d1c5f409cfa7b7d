//! Wires the three concrete drivers and their parsers into the registries
//! `acr-core` defines, so a caller never has to hand-assemble one.

use std::sync::Arc;

use acr_core::{BackendRegistry, ParserRegistry};

use crate::drivers::{ExecDriver, SingleShotDriver, StdinDriver};
use crate::parsers::{
    JsonlReviewParser, JsonlSummaryParser, PlainTextReviewParser, SingleJsonReviewParser,
    SingleJsonSummaryParser, StdinEnvelopeSummaryParser,
};

/// Binary names the three built-in drivers are configured to invoke. A
/// caller wiring a different binary builds its own registries instead of
/// using this convenience constructor.
pub struct BinaryNames {
    pub stdin_diff: String,
    pub exec_json: String,
    pub single_shot: String,
}

pub fn build_registries(binaries: BinaryNames) -> (BackendRegistry, Arc<ParserRegistry>) {
    let mut backends = BackendRegistry::new();
    backends.register(Arc::new(StdinDriver::new(binaries.stdin_diff)));
    backends.register(Arc::new(ExecDriver::new(binaries.exec_json)));
    backends.register(Arc::new(SingleShotDriver::new(binaries.single_shot)));

    let mut parsers = ParserRegistry::new();

    parsers.register_review("stdin-diff", |stdout, reviewer_id| {
        Box::new(PlainTextReviewParser::new(stdout, reviewer_id)) as Box<dyn acr_core::ReviewParser>
    });
    parsers.register_summary("stdin-diff", || {
        Box::new(StdinEnvelopeSummaryParser) as Box<dyn acr_core::SummaryParser>
    });

    parsers.register_review("exec-json", |stdout, reviewer_id| {
        Box::new(JsonlReviewParser::new(stdout, reviewer_id)) as Box<dyn acr_core::ReviewParser>
    });
    parsers.register_summary("exec-json", || {
        Box::new(JsonlSummaryParser) as Box<dyn acr_core::SummaryParser>
    });

    parsers.register_review("single-shot", |stdout, reviewer_id| {
        Box::new(SingleJsonReviewParser::new(stdout, reviewer_id)) as Box<dyn acr_core::ReviewParser>
    });
    parsers.register_summary("single-shot", || {
        Box::new(SingleJsonSummaryParser) as Box<dyn acr_core::SummaryParser>
    });

    (backends, Arc::new(parsers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_all_three_drivers_under_their_own_names() {
        let (backends, parsers) = build_registries(BinaryNames {
            stdin_diff: "stdin-bin".to_string(),
            exec_json: "exec-bin".to_string(),
            single_shot: "single-bin".to_string(),
        });
        let mut names = backends.names();
        names.sort_unstable();
        assert_eq!(names, vec!["exec-json", "single-shot", "stdin-diff"]);

        assert!(parsers.summary_parser_for("stdin-diff").is_ok());
        assert!(parsers.summary_parser_for("exec-json").is_ok());
        assert!(parsers.summary_parser_for("single-shot").is_ok());
    }
}
