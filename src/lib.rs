pub mod cohort;
pub mod config;
pub mod process;
pub mod schema;

pub use cohort::Cohort;
pub use config::ParserConfig;
pub use process::{load_report, parse_batch, parse_report};
pub use schema::{ParsedReport, Records, SchemaType};
