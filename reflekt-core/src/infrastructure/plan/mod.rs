pub mod discovery;
pub mod writer;

pub use discovery::PlanDiscovery;
pub use writer::PlanFileWriter;
