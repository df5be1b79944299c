//! List the category buckets.

use crate::cli::output::{self, Styled};
use pagesure::category;

pub fn run(search: Option<&str>) {
    let matches = category::search(search.unwrap_or(""));
    if output::is_json() {
        output::print_json(&matches);
        return;
    }

    let s = Styled::new();
    if matches.is_empty() {
        eprintln!("  No category matches {:?}.", search.unwrap_or(""));
        return;
    }
    for c in matches {
        println!(
            "  {} {} {}",
            s.bold(&format!("{:<12}", c.key.as_str())),
            c.display,
            s.dim(&format!("/ {}", c.display_fr))
        );
    }
}
