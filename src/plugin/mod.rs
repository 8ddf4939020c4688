pub mod catalog;
pub mod error;
pub mod installer;
pub mod lifecycle;
pub mod manager;
pub mod store;
pub mod supervisor;

pub use manager::PluginManager;
