pub mod access;
pub mod extension;
pub mod scope;
