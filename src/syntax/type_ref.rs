// Fri Jan 16 2026 - Alex

use crate::syntax::SyntaxError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static TYPE_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)\s*((?:\*\s*)*)$")
        .expect("type reference pattern is valid")
});

/// A type reference exactly as written in a declaration: a possibly dotted
/// name followed by zero or more pointer stars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeRef {
    name: String,
    pointer_depth: u8,
}

impl TypeRef {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            pointer_depth: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pointer_depth(&self) -> u8 {
        self.pointer_depth
    }

    pub fn is_pointer(&self) -> bool {
        self.pointer_depth > 0
    }

    pub fn pointer_to(&self) -> Result<Self, SyntaxError> {
        let pointer_depth = self
            .pointer_depth
            .checked_add(1)
            .ok_or_else(|| SyntaxError::MalformedTypeRef(format!("{}*", self)))?;
        Ok(Self {
            name: self.name.clone(),
            pointer_depth,
        })
    }

    pub fn pointee(&self) -> Option<Self> {
        if self.pointer_depth == 0 {
            return None;
        }
        Some(Self {
            name: self.name.clone(),
            pointer_depth: self.pointer_depth - 1,
        })
    }
}

impl FromStr for TypeRef {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = TYPE_REF
            .captures(s.trim())
            .ok_or_else(|| SyntaxError::MalformedTypeRef(s.to_string()))?;
        let stars = caps.get(2).map_or(0, |m| m.as_str().matches('*').count());
        let pointer_depth =
            u8::try_from(stars).map_err(|_| SyntaxError::MalformedTypeRef(s.to_string()))?;
        Ok(Self {
            name: caps[1].to_string(),
            pointer_depth,
        })
    }
}

impl TryFrom<String> for TypeRef {
    type Error = SyntaxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for _ in 0..self.pointer_depth {
            write!(f, "*")?;
        }
        Ok(())
    }
}
