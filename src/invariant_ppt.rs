//! Runtime invariant checking with contract-test support.
//!
//! Production code asserts its invariants through [`assert_invariant!`];
//! every check is recorded, and contract tests call [`contract_test`] to
//! prove that exercising a code path actually verified the invariants it
//! claims to hold. Used here for the scanner's one-way engine latch, the
//! engine's one-terminal-callback contract, and the picker's window rules.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::thread_local;

thread_local! {
    static CHECKED: RefCell<BTreeSet<(String, String)>> = RefCell::new(BTreeSet::new());
}

/// Assert an invariant and record that it was checked.
///
/// Takes the condition, a stable description of the invariant, and the
/// checking context (module or function name). Panics when the condition
/// is false.
#[macro_export]
macro_rules! assert_invariant {
    ($condition:expr, $message:expr, $context:expr) => {
        $crate::invariant_ppt::record_and_check($condition, $message, $context)
    };
}

#[doc(hidden)]
pub fn record_and_check(condition: bool, message: &str, context: &str) {
    CHECKED.with(|log| {
        log.borrow_mut()
            .insert((context.to_string(), message.to_string()));
    });

    if !condition {
        panic!("invariant violated in {}: {}", context, message);
    }
}

/// Fail unless every listed invariant was checked on this thread.
///
/// Call after driving the code under test; `required` entries must match
/// the descriptions passed to [`assert_invariant!`] exactly.
pub fn contract_test(test_name: &str, required: &[&str]) {
    let checked = CHECKED.with(|log| log.borrow().clone());

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|message| !checked.iter().any(|(_, m)| m == message))
        .collect();

    if !missing.is_empty() {
        panic!(
            "contract {} incomplete; invariants never checked:\n  - {}",
            test_name,
            missing.join("\n  - ")
        );
    }
}

/// Invariant descriptions checked so far on this thread, with contexts.
pub fn checked_invariants() -> Vec<String> {
    CHECKED.with(|log| {
        log.borrow()
            .iter()
            .map(|(context, message)| format!("{}: {}", context, message))
            .collect()
    })
}

/// Clear the per-thread invariant log between test runs.
pub fn clear_invariant_log() {
    CHECKED.with(|log| log.borrow_mut().clear());
}
