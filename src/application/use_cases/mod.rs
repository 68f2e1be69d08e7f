mod assemble_executable;

pub use assemble_executable::{
    AssembleExecutableUseCase, AssemblyReport, AssemblyRequest, SegmentRecord,
    DEFAULT_COPY_BUFFER_SIZE,
};
