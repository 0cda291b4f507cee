use crate::core::components::ComponentSlot;
use crate::core::types::PropertyRef;
use crate::core::values::PropertyTag;
use log::debug;

/// Pair of properties that wiring by convention would connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoConnectCandidate {
    pub source: PropertyRef,
    pub target: PropertyRef,
    pub feedback: bool,
}

/// Output and input names match when equal, or equal once a trailing
/// `Out` / `In` is removed
pub fn names_match(output: &str, input: &str) -> bool {
    if output == input {
        return true;
    }
    let output = output.strip_suffix("Out").unwrap_or(output);
    let input = input.strip_suffix("In").unwrap_or(input);
    !output.is_empty() && output == input
}

/// Every Output(a)/Input(b) and Output(b)/Input(a) pair with matching names.
///
/// Plain cells pair with plain cells and feedback cells with feedback cells.
pub fn candidates(a: &ComponentSlot, b: &ComponentSlot) -> Vec<AutoConnectCandidate> {
    let mut found = Vec::new();
    collect(a, b, &mut found);
    if a.name() != b.name() {
        collect(b, a, &mut found);
    }
    found
}

fn collect(from: &ComponentSlot, to: &ComponentSlot, found: &mut Vec<AutoConnectCandidate>) {
    for output in from.properties().with_tag(PropertyTag::Output) {
        for input in to.properties().with_tag(PropertyTag::Input) {
            if !names_match(output.name(), input.name()) {
                continue;
            }
            if output.is_feedback() != input.is_feedback() {
                debug!(
                    "Skipping {}\\{} -> {}\\{}: only one side has a feedback slot",
                    from.name(),
                    output.name(),
                    to.name(),
                    input.name()
                );
                continue;
            }
            found.push(AutoConnectCandidate {
                source: PropertyRef::new(from.name(), output.name()),
                target: PropertyRef::new(to.name(), input.name()),
                feedback: output.is_feedback(),
            });
        }
    }
}
