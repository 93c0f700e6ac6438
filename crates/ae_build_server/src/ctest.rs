//! Parses `ctest` output for its pass/fail summary line, the same way the
//! original recipe runner scraped its captured output instead of
//! inspecting the process exit code directly.

/// Result of scanning a `ctest` run's captured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    /// The summary line was found and reported 100% passing.
    Passed,
    /// The summary line was found and reported some failures.
    Failed,
    /// No `"tests failed out of"` line appeared at all; `ctest` may not
    /// have run any tests, or its output format didn't match.
    Indeterminate,
}

impl TestOutcome {
    /// Collapses to a plain pass/fail for recipe step dispatch, matching
    /// the original's behavior of treating an unparseable result as a
    /// failure rather than surfacing the ambiguity to the caller.
    #[must_use]
    pub fn succeeded(self) -> bool {
        matches!(self, TestOutcome::Passed)
    }
}

/// Scan `output` for the `ctest` summary line and classify the run.
#[must_use]
pub fn parse_ctest_output(output: &str) -> TestOutcome {
    for line in output.lines() {
        if line.contains("tests failed out of") {
            return if line.contains("100% tests passed") { TestOutcome::Passed } else { TestOutcome::Failed };
        }
    }
    TestOutcome::Indeterminate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_passing_is_recognized() {
        let output = "Total Test time = 1.2 sec\n100% tests passed, 0 tests failed out of 12\n";
        assert_eq!(parse_ctest_output(output), TestOutcome::Passed);
    }

    #[test]
    fn partial_failure_is_recognized() {
        let output = "75% tests passed, 3 tests failed out of 12\n";
        assert_eq!(parse_ctest_output(output), TestOutcome::Failed);
    }

    #[test]
    fn missing_summary_line_is_indeterminate() {
        let output = "error: CMakeCache.txt not found\n";
        assert_eq!(parse_ctest_output(output), TestOutcome::Indeterminate);
        assert!(!parse_ctest_output(output).succeeded());
    }
}
