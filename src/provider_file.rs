//! Provider configuration injected into a module for the lifetime of a test.
//!
//! Modules under test leave the provider block out on purpose; terraform refuses
//! to initialise without one, so the harness writes a minimal block next to the
//! module and removes it again when the case is over.

use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

pub const DEFAULT_PROVIDER_FILE: &str = "provider.tf";
pub const DEFAULT_PROVIDER_NAME: &str = "azurerm";

/// Sub-blocks emitted inside the provider block, each left empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderOption {
    Features,
    Custom(String),
}

impl ProviderOption {
    pub fn from_block_name(name: &str) -> Self {
        match name {
            "features" => ProviderOption::Features,
            other => ProviderOption::Custom(other.to_string()),
        }
    }

    pub fn block_name(&self) -> &str {
        match self {
            ProviderOption::Features => "features",
            ProviderOption::Custom(name) => name.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawProviderBlock")]
pub struct ProviderBlock {
    pub name: String,
    pub options: Vec<ProviderOption>,
}

#[derive(Deserialize)]
struct RawProviderBlock {
    name: String,
    #[serde(default)]
    options: Option<Vec<ProviderOption>>,
}

impl From<RawProviderBlock> for ProviderBlock {
    fn from(raw: RawProviderBlock) -> Self {
        let block = ProviderBlock::new(raw.name);
        match raw.options {
            Some(options) => block.with_options(options),
            None => block,
        }
    }
}

/// Only azurerm requires the (empty) `features` block; other providers reject it.
fn default_options(name: &str) -> Vec<ProviderOption> {
    if name == DEFAULT_PROVIDER_NAME {
        vec![ProviderOption::Features]
    } else {
        Vec::new()
    }
}

impl Default for ProviderBlock {
    fn default() -> Self {
        Self::new(DEFAULT_PROVIDER_NAME)
    }
}

impl ProviderBlock {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            options: default_options(&name),
            name,
        }
    }

    pub fn with_options(mut self, options: Vec<ProviderOption>) -> Self {
        self.options = options;
        self
    }

    /// Render the block in terraform's native syntax.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("provider {:?} {{\n", self.name));
        for option in &self.options {
            out.push_str(&format!("  {} {{\n  }}\n", option.block_name()));
        }
        out.push_str("}\n");
        out
    }
}

#[derive(Debug)]
pub struct ProviderFile {
    path: PathBuf,
    file: Option<File>,
    block: ProviderBlock,
}

impl ProviderFile {
    /// Open (or create) `path` for writing with mode 0644, seeded with the default block.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, HarnessError> {
        Self::with_block(path, ProviderBlock::default())
    }

    pub fn with_block(
        path: impl Into<PathBuf>,
        block: ProviderBlock,
    ) -> Result<Self, HarnessError> {
        let path = path.into();
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o644);
        }
        let file = options
            .open(&path)
            .map_err(|source| HarnessError::ProviderFile {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            path,
            file: Some(file),
            block,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn block(&self) -> &ProviderBlock {
        &self.block
    }

    /// Serialize the block into the file. The handle is dropped (closed) on every
    /// path out of here, so a second call reopens the file.
    pub fn create(&mut self) -> Result<(), HarnessError> {
        let mut file = match self.file.take() {
            Some(file) => file,
            None => File::create(&self.path).map_err(|source| HarnessError::ProviderFile {
                path: self.path.clone(),
                source,
            })?,
        };
        file.write_all(self.block.render().as_bytes())
            .and_then(|_| file.flush())
            .map_err(|source| HarnessError::ProviderFile {
                path: self.path.clone(),
                source,
            })?;
        tracing::debug!(
            target: "tfharness",
            path = %self.path.display(),
            provider = %self.block.name,
            "provider file written"
        );
        Ok(())
    }

    /// Remove the file. A file that is already gone is not an error.
    pub fn delete(&mut self) -> Result<(), HarnessError> {
        self.file.take();
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(
                    target: "tfharness",
                    path = %self.path.display(),
                    "provider file removed"
                );
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(HarnessError::io(
                format!("remove {}", self.path.display()),
                source,
            )),
        }
    }
}
