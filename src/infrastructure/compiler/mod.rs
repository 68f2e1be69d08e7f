mod command_compiler;
mod passthrough_compiler;

pub use command_compiler::CommandCompiler;
pub use passthrough_compiler::PassthroughCompiler;
