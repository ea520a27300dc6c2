//! Qualified identifiers, attribute categories and domains.
//!
//! Every node in the state graph, every attribute and every peer entry is
//! addressed by a [`QualifiedName`] of the form `Namespace.Name[:guid]`.
//! A name carrying a guid identifies one physical instance of a kind and is
//! never a graph node itself; it only appears as a bookkeeping marker.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for identifier parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("Empty identifier")]
    Empty,
    #[error("Identifier has no namespace: {0}")]
    MissingNamespace(String),
    #[error("Identifier has an empty name: {0}")]
    EmptyName(String),
    #[error("Identifier has an empty guid: {0}")]
    EmptyGuid(String),
}

/// Separator between the kind and the instance guid.
const GUID_SEPARATOR: char = ':';

/// Wildcard name matching every name of a namespace.
pub const ANY_NAME: &str = "*";

/// A canonicalized `(namespace, name[, guid])` key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QualifiedName {
    namespace: String,
    name: String,
    guid: Option<String>,
}

impl QualifiedName {
    /// Create a guid-less identifier.
    pub fn new(namespace: impl AsRef<str>, name: impl AsRef<str>) -> Self {
        Self {
            namespace: canonical(namespace.as_ref()),
            name: canonical(name.as_ref()),
            guid: None,
        }
    }

    /// Parse `Namespace.Name[:guid]`.
    pub fn parse(text: &str) -> Result<Self, IdentifierError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(IdentifierError::Empty);
        }

        let (kind, guid) = match text.split_once(GUID_SEPARATOR) {
            Some((kind, guid)) => {
                let guid = guid.trim();
                if guid.is_empty() {
                    return Err(IdentifierError::EmptyGuid(text.to_string()));
                }
                (kind, Some(guid.to_string()))
            }
            None => (text, None),
        };

        let (namespace, name) = kind
            .rsplit_once('.')
            .ok_or_else(|| IdentifierError::MissingNamespace(text.to_string()))?;
        if namespace.trim().is_empty() {
            return Err(IdentifierError::MissingNamespace(text.to_string()));
        }
        if name.trim().is_empty() {
            return Err(IdentifierError::EmptyName(text.to_string()));
        }

        Ok(Self {
            namespace: canonical(namespace),
            name: canonical(name),
            guid,
        })
    }

    /// The same kind, qualified with an instance guid.
    pub fn with_guid(&self, guid: impl Into<String>) -> Self {
        Self {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            guid: Some(guid.into()),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn guid(&self) -> Option<&str> {
        self.guid.as_deref()
    }

    /// The identifier without its guid.
    pub fn kind(&self) -> QualifiedName {
        Self {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            guid: None,
        }
    }

    /// Whether this identifier names one physical instance.
    pub fn is_instance(&self) -> bool {
        self.guid.is_some()
    }

    /// Whether this identifier is a wildcard over its namespace.
    pub fn is_wildcard(&self) -> bool {
        self.name == ANY_NAME
    }

    /// Membership test: equal, or an instance of the guid-less `other`.
    pub fn is(&self, other: &QualifiedName) -> bool {
        if self == other {
            return true;
        }
        other.guid.is_none() && self.namespace == other.namespace && self.name == other.name
    }

    /// Whether this identifier shares the kind of `other`.
    pub fn same_kind(&self, other: &QualifiedName) -> bool {
        self.namespace == other.namespace && self.name == other.name
    }

    /// The closed attribute category of this identifier's namespace, if any.
    pub fn category(&self) -> Option<Category> {
        Category::from_namespace(&self.namespace)
    }
}

fn canonical(part: &str) -> String {
    part.trim().to_lowercase()
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)?;
        if let Some(guid) = &self.guid {
            write!(f, "{GUID_SEPARATOR}{guid}")?;
        }
        Ok(())
    }
}

impl FromStr for QualifiedName {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for QualifiedName {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<QualifiedName> for String {
    fn from(value: QualifiedName) -> Self {
        value.to_string()
    }
}

// ============================================================================
// Categories
// ============================================================================

/// Closed set of attribute categories.
///
/// A category matches every identifier whose namespace belongs to it, so
/// `is(Category::Toys)` holds for any state linked with any toy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Body,
    Toys,
    Clothes,
    Shoes,
    Accessories,
    Household,
    Gadgets,
    Posture,
    Features,
    Materials,
    Purpose,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Body,
        Category::Toys,
        Category::Clothes,
        Category::Shoes,
        Category::Accessories,
        Category::Household,
        Category::Gadgets,
        Category::Posture,
        Category::Features,
        Category::Materials,
        Category::Purpose,
    ];

    /// The canonical namespace for this category.
    pub fn namespace(&self) -> &'static str {
        match self {
            Category::Body => "body",
            Category::Toys => "toys",
            Category::Clothes => "clothes",
            Category::Shoes => "shoes",
            Category::Accessories => "accessories",
            Category::Household => "household",
            Category::Gadgets => "gadgets",
            Category::Posture => "posture",
            Category::Features => "features",
            Category::Materials => "materials",
            Category::Purpose => "purpose",
        }
    }

    /// Look up a category by namespace (case-insensitive).
    pub fn from_namespace(namespace: &str) -> Option<Category> {
        let namespace = namespace.to_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.namespace() == namespace)
    }

    /// Whether `name` is an instance of this category.
    pub fn contains(&self, name: &QualifiedName) -> bool {
        name.namespace() == self.namespace()
    }

    /// An identifier in this category's namespace.
    pub fn name(&self, name: &str) -> QualifiedName {
        QualifiedName::new(self.namespace(), name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.namespace())
    }
}

/// A single requested attribute in an `is()` query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Matches any identifier of the category.
    Category(Category),
    /// Matches the identifier itself, an instance of it, or (with a `*`
    /// name) any identifier of its namespace.
    Name(QualifiedName),
}

impl From<Category> for Attribute {
    fn from(value: Category) -> Self {
        Attribute::Category(value)
    }
}

impl From<QualifiedName> for Attribute {
    fn from(value: QualifiedName) -> Self {
        Attribute::Name(value)
    }
}

impl From<&QualifiedName> for Attribute {
    fn from(value: &QualifiedName) -> Self {
        Attribute::Name(value.clone())
    }
}

// ============================================================================
// Domains
// ============================================================================

/// A namespace partition of the whole state graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Domain(String);

impl Domain {
    /// The default domain.
    pub const DEFAULT: &'static str = "";
    /// Reserved domain holding last-used shadow records.
    pub const LAST_USED: &'static str = "LastUsed";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn default_domain() -> Self {
        Self::new(Self::DEFAULT)
    }

    pub fn last_used() -> Self {
        Self::new(Self::LAST_USED)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Domain {
    fn default() -> Self {
        Self::default_domain()
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse an identifier literal, panicking on malformed input.
///
/// Intended for statically known names in tests and catalogs.
#[macro_export]
macro_rules! name {
    ($text:expr) => {
        match $crate::QualifiedName::parse($text) {
            Ok(name) => name,
            Err(err) => panic!("invalid identifier literal {:?}: {}", $text, err),
        }
    };
}
