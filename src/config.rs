// Fri Jan 16 2026 - Alex

use crate::structure::FlattenOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    X86,
    X64,
}

impl Target {
    pub fn pointer_width(self) -> u32 {
        match self {
            Self::X86 => 4,
            Self::X64 => 8,
        }
    }

    /// Conditional compilation symbol defined while laying out for this target.
    pub fn define(self) -> &'static str {
        match self {
            Self::X86 => "X86",
            Self::X64 => "X64",
        }
    }
}

impl FromStr for Target {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x86" | "win32" | "i386" => Ok(Self::X86),
            "x64" | "amd64" | "x86_64" => Ok(Self::X64),
            other => Err(ConfigError::Invalid(format!("unknown target {}", other))),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X86 => write!(f, "x86"),
            Self::X64 => write!(f, "x64"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Declaration source text.
    Source,
    /// The rewritten unit as JSON.
    Json,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "source" | "cs" => Ok(Self::Source),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Invalid(format!("unknown output format {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub target: Target,
    pub inline_nested_structs: bool,
    pub pad_trailing: bool,
    /// Extra conditional symbols; the target's own symbol is always added.
    pub defines: Vec<String>,
    pub output_format: OutputFormat,
    pub pretty_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: Target::X64,
            inline_nested_structs: true,
            pad_trailing: true,
            defines: Vec::new(),
            output_format: OutputFormat::Source,
            pretty_json: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for define in &self.defines {
            let valid = define.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && define.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(ConfigError::Invalid(format!("'{}' is not a valid conditional symbol", define)));
            }
        }
        let other = match self.target {
            Target::X86 => Target::X64,
            Target::X64 => Target::X86,
        };
        if self.defines.iter().any(|d| d == other.define()) {
            return Err(ConfigError::Invalid(format!(
                "{} is defined while targeting {}",
                other.define(),
                self.target
            )));
        }
        Ok(())
    }

    pub fn flatten_options(&self) -> FlattenOptions {
        FlattenOptions::for_pointer_width(self.target.pointer_width())
            .with_inline_nested_structs(self.inline_nested_structs)
            .with_pad_trailing(self.pad_trailing)
    }

    pub fn active_defines(&self) -> Vec<String> {
        let mut defines = vec![self.target.define().to_string()];
        for define in &self.defines {
            if !defines.contains(define) {
                defines.push(define.clone());
            }
        }
        defines
    }
}
