pub mod compiler;
pub mod manifest;
pub mod sink;
