pub mod archive;
pub mod crypto;
pub mod error;
pub mod keystore;
pub mod pipeline;
