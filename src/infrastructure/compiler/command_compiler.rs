use async_trait::async_trait;
use bytes::Bytes;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::application::ports::{CompileError, Compiler};
use crate::domain::entities::Target;

/// Compiler delegating to an external program.
///
/// The source is written to the child's stdin and its stdout becomes the
/// compiled bytes. The child sees the runtime options, one per line, in
/// `STUB_PACKER_OPTIONS`, and the target in `STUB_PACKER_PLATFORM` and
/// `STUB_PACKER_ARCH` when set.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: String,
    args: Vec<String>,
}

impl CommandCompiler {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Parse a whitespace separated command line; `None` when it is blank
    pub fn from_command_line(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait]
impl Compiler for CommandCompiler {
    async fn compile(
        &self,
        options: &[String],
        target: &Target,
        source: Bytes,
    ) -> Result<Bytes, CompileError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .env("STUB_PACKER_OPTIONS", options.join("\n"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(platform) = &target.platform {
            command.env("STUB_PACKER_PLATFORM", platform);
        }
        if let Some(arch) = &target.arch {
            command.env("STUB_PACKER_ARCH", arch);
        }

        debug!(program = %self.program, size = source.len(), "Spawning compiler");
        let mut child = command.spawn()?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| CompileError::Failed("compiler stdin unavailable".to_string()))?;

        // stdin is fed concurrently with draining stdout and stderr
        let feed = async move {
            let result = stdin.write_all(&source).await;
            drop(stdin);
            result
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CompileError::Failed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        if let Err(e) = fed {
            // The child may exit without reading all of its input
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(CompileError::Io(e));
            }
            warn!(program = %self.program, "Compiler closed stdin before reading all input");
        }

        Ok(Bytes::from(output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_command_line() {
        let compiler = CommandCompiler::from_command_line("  node  compile.js --fast ").unwrap();
        assert_eq!(compiler.program(), "node");
        assert_eq!(compiler.args(), ["compile.js", "--fast"]);
        assert!(CommandCompiler::from_command_line("   ").is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdout_becomes_output() {
        let compiler = CommandCompiler::new("cat", Vec::new());
        let compiled = compiler
            .compile(&[], &Target::new("stub", "out"), Bytes::from("source text"))
            .await
            .unwrap();
        assert_eq!(compiled, Bytes::from("source text"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_environment_is_forwarded() {
        let compiler = CommandCompiler::new(
            "sh",
            vec![
                "-c".to_string(),
                "printf '%s|%s|%s' \"$STUB_PACKER_OPTIONS\" \"$STUB_PACKER_PLATFORM\" \"$STUB_PACKER_ARCH\"".to_string(),
            ],
        );
        let target = Target::new("stub", "out")
            .with_platform("linux")
            .with_arch("x64");
        let compiled = compiler
            .compile(&["--a".to_string()], &target, Bytes::new())
            .await
            .unwrap();
        assert_eq!(compiled, Bytes::from("--a|linux|x64"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_failure() {
        let compiler = CommandCompiler::new(
            "sh",
            vec!["-c".to_string(), "echo 'syntax error' >&2; exit 3".to_string()],
        );
        let err = compiler
            .compile(&[], &Target::new("stub", "out"), Bytes::from("("))
            .await
            .unwrap_err();
        match err {
            CompileError::Failed(message) => assert!(message.contains("syntax error")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_io_error() {
        let compiler = CommandCompiler::new("/nonexistent/compiler-binary", Vec::new());
        let err = compiler
            .compile(&[], &Target::new("stub", "out"), Bytes::from("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, CompileError::Io(_)));
    }
}
