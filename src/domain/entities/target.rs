use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Build target: the runtime stub, the destination, and the platform
/// descriptor forwarded verbatim to the compile collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub stub_path: PathBuf,
    pub output_path: PathBuf,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
}

impl Target {
    pub fn new(stub_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            stub_path: stub_path.into(),
            output_path: output_path.into(),
            platform: None,
            arch: None,
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = Some(arch.into());
        self
    }
}
