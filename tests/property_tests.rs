//! Property-based tests for the console test runner
//!
//! These tests use proptest to check invariants of the line classifier, the placeholder pass and
//! help-text normalization across many generated inputs.

use std::path::PathBuf;

use console_test_runner::driver::help::{check_contains, normalize_whitespace};
use console_test_runner::runner::{LineClassifier, LineKind};
use console_test_runner::runner::classify::AUTHORIZATION_MARKERS;
use console_test_runner::runspec::template::TemplateContext;
use proptest::prelude::*;

// =============================================================================
// Classifier Properties
// =============================================================================

mod classifier_tests {
    use super::*;

    proptest! {
        /// Property: a line carrying an authorization marker is always an authorization line,
        /// whatever surrounds it (including generic error markers).
        #[test]
        fn authorization_marker_always_wins(
            prefix in "[ -~]{0,20}",
            suffix in "[ -~]{0,20}",
            marker in proptest::sample::select(AUTHORIZATION_MARKERS),
        ) {
            let line = format!("{prefix}ERROR {marker}{suffix}");
            prop_assert_eq!(LineClassifier::default().classify(&line), Some(LineKind::Authorization));
        }

        /// Property: lowercase text without markers is never classified.
        #[test]
        fn plain_lines_pass_through(line in "[a-z0-9 .:]{0,60}") {
            prop_assume!(!line.contains("unauthorized"));
            prop_assume!(!line.contains("failed to authorize"));
            prop_assume!(!line.contains("authorization failed"));
            prop_assume!(!line.contains("authentication failed"));
            prop_assert_eq!(LineClassifier::default().classify(&line), None);
        }
    }
}

// =============================================================================
// Template Properties
// =============================================================================

mod template_tests {
    use super::*;

    proptest! {
        /// Property: text without braces renders unchanged, even with no sources configured.
        #[test]
        fn brace_free_text_is_untouched(text in "[^{}]{0,80}") {
            let rendered = TemplateContext::default().render(&text).unwrap();
            prop_assert_eq!(rendered, text);
        }

        /// Property: `{INPUT}` is replaced by the supplied directory and nothing else changes.
        #[test]
        fn input_placeholder_substitution(
            prefix in "[a-z/._-]{0,20}",
            suffix in "[a-z/._-]{0,20}",
            dir in "/[a-z]{1,10}(/[a-z]{1,10}){0,3}",
        ) {
            let context = TemplateContext::for_input(PathBuf::from(&dir));
            let rendered = context.render(&format!("{prefix}{{INPUT}}{suffix}")).unwrap();
            prop_assert_eq!(rendered, format!("{prefix}{dir}{suffix}"));
        }

        /// Property: without an input source `{INPUT}` survives verbatim.
        #[test]
        fn deferred_input_is_left_verbatim(prefix in "[a-z]{0,10}") {
            let text = format!("{prefix}{{INPUT}}/file");
            prop_assert_eq!(TemplateContext::default().render(&text).unwrap(), text);
        }
    }
}

// =============================================================================
// Help Text Properties
// =============================================================================

mod help_tests {
    use super::*;

    proptest! {
        /// Property: normalization is idempotent and leaves no runs of whitespace.
        #[test]
        fn normalization_is_idempotent(text in "[ \t\r\na-zA-Z<>-]{0,80}") {
            let once = normalize_whitespace(&text);
            prop_assert_eq!(normalize_whitespace(&once), once.clone());
            prop_assert!(!once.contains("  "));
            prop_assert_eq!(once.trim(), once.as_str());
        }

        /// Property: re-wrapping words never breaks containment.
        #[test]
        fn relayout_still_matches(words in proptest::collection::vec("[a-zA-Z<>-]{1,8}", 1..10)) {
            let actual = words.join("\n    ");
            let expected = words.join(" ");
            prop_assert!(check_contains(&actual, &expected).is_ok());
        }
    }
}
