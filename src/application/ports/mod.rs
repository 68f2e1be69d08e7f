mod compiler;
mod output_sink;

pub use compiler::{CompileError, Compiler};
pub use output_sink::{OutputSink, SinkError};

#[cfg(test)]
pub use compiler::MockCompiler;
#[cfg(test)]
pub use output_sink::MockOutputSink;
