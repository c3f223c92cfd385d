mod runner;

pub use runner::{MIN_RUN_YEARS, RunConfig, found, run};
