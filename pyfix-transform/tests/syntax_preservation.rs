//! Cross-pass properties: every rewriter preserves syntax validity and the
//! text-level passes are idempotent.

use pyfix_transform::{
    CallRewriter, DocstringSynthesizer, MutableDefaultRepairer, Transformer,
    UnusedImportRemover, python,
};
use pyfix_types::StepParams;

const FIXTURE: &str = r#""""Inventory helpers."""
import os
import sys, json
from collections import OrderedDict, defaultdict


class Inventory:
    def __init__(self, items=[]):
        self.items = items

    def __repr__(self):
        return "Inventory(%d)" % len(self.items)

    def merge(self, extra={}, *args, **kwargs):
        counts = defaultdict(int)
        for key in extra:
            counts[key] += 1
        print(counts)
        return counts


def test_merge():
    inv = Inventory()
    print(inv)


def main(argv=None): return sys.exit(0)
"#;

fn rewriters() -> Vec<Box<dyn Transformer>> {
    vec![
        Box::new(DocstringSynthesizer),
        Box::new(UnusedImportRemover),
        Box::new(MutableDefaultRepairer),
        Box::new(CallRewriter::print_to_logging()),
    ]
}

#[test]
fn every_rewriter_output_parses() {
    for rewriter in rewriters() {
        let out = rewriter
            .transform(FIXTURE, &StepParams::new())
            .unwrap_or_else(|e| panic!("{} failed: {e}", rewriter.metadata().name));
        assert!(
            python::parses_cleanly(&out),
            "{} produced non-parsing output:\n{out}",
            rewriter.metadata().name
        );
    }
}

#[test]
fn every_rewriter_is_idempotent_on_its_own_output() {
    for rewriter in rewriters() {
        let once = rewriter.transform(FIXTURE, &StepParams::new()).expect("first run");
        let twice = rewriter.transform(&once, &StepParams::new()).expect("second run");
        assert_eq!(
            once, twice,
            "{} is not idempotent",
            rewriter.metadata().name
        );
    }
}

#[test]
fn passes_compose_in_sequence() {
    let mut current = FIXTURE.to_string();
    for rewriter in rewriters() {
        current = rewriter.transform(&current, &StepParams::new()).expect("compose");
        assert!(python::parses_cleanly(&current));
    }

    // The composed result shows all four passes' fingerprints.
    assert!(current.contains("Initializes a new Inventory instance."));
    assert!(current.contains("logging.info"));
    assert!(current.contains("if items is None:"));
    assert!(!current.contains("import os\n"));
    assert!(!current.contains("OrderedDict"));
}

#[test]
fn rewriters_never_panic_on_degenerate_inputs() {
    for rewriter in rewriters() {
        for source in ["", "\n", "# only a comment\n", "x = 1\n"] {
            let out = rewriter.transform(source, &StepParams::new());
            match out {
                Ok(text) => assert!(python::parses_cleanly(&text) || text.is_empty()),
                Err(e) => panic!(
                    "{} rejected benign input {source:?}: {e}",
                    rewriter.metadata().name
                ),
            }
        }
    }
}
