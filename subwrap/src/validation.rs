use std::collections::HashSet;

use subwrap_types::Catalog;

use crate::report::NAME_WIDTH;
use crate::resources::SENTINEL;
use crate::shader::{references, RESULT_NAME};
use crate::Error;

pub fn validate(catalog: &Catalog) -> Result<(), Error> {
    let mut names = HashSet::new();

    for case in &catalog.cases {
        if case.name.is_empty() {
            return Err(Error::InvalidCatalog("case with empty name".into()));
        }

        if !names.insert(case.name.as_str()) {
            return Err(Error::InvalidCatalog(format!(
                "duplicate case name '{}'",
                case.name
            )));
        }

        // The fixed-width table does not truncate.
        if case.name.chars().count() > NAME_WIDTH {
            return Err(Error::InvalidCatalog(format!(
                "case name '{}' is wider than {NAME_WIDTH} characters",
                case.name
            )));
        }

        if case.snippet.trim().is_empty() {
            return Err(Error::InvalidCatalog(format!(
                "case '{}' has an empty snippet",
                case.name
            )));
        }

        // An unreferenced result binding is dropped from the inferred layout.
        // Mentions inside comments do not count.
        if !references(&case.snippet, RESULT_NAME) {
            return Err(Error::InvalidCatalog(format!(
                "case '{}' never references `{RESULT_NAME}`",
                case.name
            )));
        }

        // An unwritten result buffer must never look like a pass.
        if case.expected == SENTINEL {
            return Err(Error::InvalidCatalog(format!(
                "case '{}' expects the sentinel value {SENTINEL:#x}",
                case.name
            )));
        }
    }

    Ok(())
}
