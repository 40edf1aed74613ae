//! Scripted sites shared across integration tests.

use crosswave_driver::{Reporter, TestReport};
use crosswave_headless::{HeadlessBrowser, ScriptedPage};

/// Two origins: site-a renders immediately, site-b's heading only becomes
/// visible on the third query, modeling asynchronous rendering.
pub fn two_origin_browser() -> HeadlessBrowser {
    HeadlessBrowser::new()
        .with_page(ScriptedPage::new("http://site-a/").element("h1", "Site A"))
        .with_page(
            ScriptedPage::new("http://site-b/")
                .element_visible_from("h1", "Expected Title", 3),
        )
}

/// Captures every report the runner emits.
pub struct CollectingReporter {
    pub reports: Vec<TestReport>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self {
            reports: Vec::new(),
        }
    }
}

impl Reporter for CollectingReporter {
    fn report(&mut self, report: &TestReport) {
        self.reports.push(report.clone());
    }
}
