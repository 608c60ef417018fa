use crate::suite_metadata::TestCase;
use crate::suite_registrar::{create_configured_test, RegisteredTest, TestFramework};

/// An insertion-ordered collection of test cases registered as a unit.
#[derive(Debug, Clone)]
pub struct TestSuite {
    name: String,
    cases: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cases: Vec::new(),
        }
    }

    pub fn with_case(mut self, case: TestCase) -> Self {
        self.add_case(case);
        self
    }

    pub fn add_case(&mut self, case: TestCase) {
        self.cases.push(case);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }
}

/// Derives a human-readable display name from a case identifier by
/// splitting on capitalization boundaries and underscores and lowercasing:
/// `mobileLoginTest` and `mobile_login_test` both become
/// `mobile login test`.
pub fn display_name(ident: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    for ch in ident.chars() {
        if ch == '_' || ch == '-' || ch.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if ch.is_ascii_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(ch.to_ascii_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words.join(" ")
}

/// Registers every case of the suite, in declaration order, under its
/// derived display name. Order only affects display grouping.
pub fn register_suite(
    framework: &mut dyn TestFramework,
    suite: &TestSuite,
) -> Vec<RegisteredTest> {
    tracing::debug!(
        suite = suite.name(),
        cases = suite.cases.len(),
        "registering test suite"
    );
    suite
        .cases()
        .iter()
        .map(|case| {
            let name = display_name(case.ident());
            create_configured_test(framework, case, &name)
        })
        .collect()
}
