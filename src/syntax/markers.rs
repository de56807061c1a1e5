// Fri Jan 16 2026 - Alex

use crate::syntax::SyntaxError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Flatten,
    Union,
    AnonymousStruct,
}

impl MarkerKind {
    pub const ALL: [MarkerKind; 3] = [Self::Flatten, Self::Union, Self::AnonymousStruct];

    pub fn attribute_name(self) -> &'static str {
        match self {
            Self::Flatten => "Flatten",
            Self::Union => "Union",
            Self::AnonymousStruct => "AnonymousStruct",
        }
    }

    /// Accepts the short form and the `...Attribute` form of a marker name.
    pub fn from_attribute_name(name: &str) -> Option<Self> {
        let short = name.strip_suffix("Attribute").unwrap_or(name);
        Self::ALL.into_iter().find(|kind| kind.attribute_name() == short)
    }
}

/// The intent markers carried by a declaration. They steer the pass and are
/// erased from its output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Markers {
    pub flatten: bool,
    pub union: bool,
    pub anonymous: bool,
}

impl Markers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        !self.flatten && !self.union && !self.anonymous
    }

    pub fn has(&self, kind: MarkerKind) -> bool {
        match kind {
            MarkerKind::Flatten => self.flatten,
            MarkerKind::Union => self.union,
            MarkerKind::AnonymousStruct => self.anonymous,
        }
    }

    pub fn with(mut self, kind: MarkerKind) -> Self {
        match kind {
            MarkerKind::Flatten => self.flatten = true,
            MarkerKind::Union => self.union = true,
            MarkerKind::AnonymousStruct => self.anonymous = true,
        }
        self
    }

    pub fn kinds(&self) -> impl Iterator<Item = MarkerKind> + '_ {
        MarkerKind::ALL.into_iter().filter(move |kind| self.has(*kind))
    }
}

impl TryFrom<Vec<String>> for Markers {
    type Error = SyntaxError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        names.iter().try_fold(Markers::none(), |markers, name| {
            MarkerKind::from_attribute_name(name)
                .map(|kind| markers.with(kind))
                .ok_or_else(|| SyntaxError::UnknownMarker(name.clone()))
        })
    }
}

impl From<Markers> for Vec<String> {
    fn from(markers: Markers) -> Self {
        markers.kinds().map(|kind| kind.attribute_name().to_string()).collect()
    }
}

/// A class deriving from `Attribute` whose name is one of the markers only
/// exists to make the markers compile; the pass removes it.
pub fn is_marker_declaration(name: &str, base: Option<&str>) -> bool {
    let derives_attribute = matches!(base, Some("Attribute") | Some("System.Attribute"));
    derives_attribute && MarkerKind::from_attribute_name(name).is_some()
}
