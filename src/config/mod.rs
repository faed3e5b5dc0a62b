pub mod persona;
pub mod proc_loader;
pub mod proc_validator;
pub mod settings;

pub use persona::{PersonaSettings, ServiceConfig};
