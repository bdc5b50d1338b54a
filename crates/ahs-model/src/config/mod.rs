mod run;
pub use run::{PersistOptions, RunConfig};
