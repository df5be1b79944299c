//! CLI subcommand implementations for the `pagesure` binary.

pub mod categories_cmd;
pub mod doctor;
pub mod output;
pub mod scrape_cmd;
pub mod serve;
