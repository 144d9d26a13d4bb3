// External provider integration
pub mod providers;
