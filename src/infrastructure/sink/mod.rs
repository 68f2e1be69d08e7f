mod file_sink;
mod memory_sink;

pub use file_sink::FileSink;
pub use memory_sink::MemorySink;
