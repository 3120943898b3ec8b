//! Sample dataset seeding.
//!
//! # Data Flow
//! ```text
//! GET  {endpoint}/metadata/workflow   → sample present? → done
//! POST {endpoint}/metadata/taskdefs   (task definition array)
//! POST {endpoint}/metadata/workflow   (once per workflow definition)
//! ```

pub mod bundle;
pub mod seeder;

pub use bundle::{SampleBundle, TaskDef};
pub use seeder::{SampleSeeder, SeedError, SeedOutcome, SeedPaths};
