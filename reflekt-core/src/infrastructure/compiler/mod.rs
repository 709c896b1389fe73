pub mod jinja;

pub use jinja::JinjaChecker;
