use std::{
    borrow::Borrow,
    fmt::{Debug, Display, Formatter},
};

/// The name of a program unit, such as `pkg.sub.Foo`.
///
/// Names arrive both in dotted form (`pkg.sub.Foo`) and in slash-separated internal form
/// (`pkg/sub/Foo`). Both normalize to the dotted form, and [`QualifiedName::internal`] recovers
/// the internal one.
#[derive(Clone, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub struct QualifiedName(String);

impl QualifiedName {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.contains('/') {
            QualifiedName(name.replace('/', "."))
        } else {
            QualifiedName(name)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn internal(&self) -> String {
        self.0.replace('.', "/")
    }

    /// The part after the last separator.
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl Debug for QualifiedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for QualifiedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for QualifiedName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for QualifiedName {
    fn from(name: &str) -> Self {
        QualifiedName::new(name)
    }
}

impl From<String> for QualifiedName {
    fn from(name: String) -> Self {
        QualifiedName::new(name)
    }
}

impl From<QualifiedName> for String {
    fn from(name: QualifiedName) -> Self {
        name.0
    }
}

/// A namespace prefix holding the rewritten copies of program units.
///
/// `shadow.pkg.Foo` always denotes the rewritten variant of `pkg.Foo`, so stripping the prefix
/// yields the original name.
#[derive(Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub struct ShadowNamespace {
    prefix: String,
    internal_prefix: String,
}

impl ShadowNamespace {
    pub const DEFAULT_PREFIX: &'static str = "interleave.tran$f*rmed.";

    /// Accepts either form and with or without the trailing separator.
    pub fn new(prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into().replace('/', ".");
        if !prefix.ends_with('.') {
            prefix.push('.');
        }
        let internal_prefix = prefix.replace('.', "/");
        ShadowNamespace {
            prefix,
            internal_prefix,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn internal_prefix(&self) -> &str {
        &self.internal_prefix
    }

    pub fn contains(&self, name: &QualifiedName) -> bool {
        name.starts_with(&self.prefix)
    }

    /// Returns the name of the unit before it was rewritten.
    pub fn original(&self, name: &QualifiedName) -> QualifiedName {
        match name.as_str().strip_prefix(self.prefix.as_str()) {
            Some(stripped) => QualifiedName(stripped.to_string()),
            None => name.clone(),
        }
    }

    pub fn shadow(&self, name: &QualifiedName) -> QualifiedName {
        if self.contains(name) {
            return name.clone();
        }
        QualifiedName(format!("{}{}", self.prefix, name))
    }

    pub fn contains_internal(&self, internal_name: &str) -> bool {
        internal_name.starts_with(&self.internal_prefix)
    }

    /// Internal-form counterpart of [`ShadowNamespace::original`].
    pub fn original_internal<'a>(&self, internal_name: &'a str) -> &'a str {
        internal_name
            .strip_prefix(self.internal_prefix.as_str())
            .unwrap_or(internal_name)
    }

    pub fn shadow_internal(&self, internal_name: &str) -> String {
        if self.contains_internal(internal_name) {
            return internal_name.to_string();
        }
        format!("{}{}", self.internal_prefix, internal_name)
    }
}

impl Default for ShadowNamespace {
    fn default() -> Self {
        ShadowNamespace::new(Self::DEFAULT_PREFIX)
    }
}

impl Debug for ShadowNamespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.prefix, f)
    }
}

impl From<String> for ShadowNamespace {
    fn from(prefix: String) -> Self {
        ShadowNamespace::new(prefix)
    }
}

impl From<ShadowNamespace> for String {
    fn from(shadow: ShadowNamespace) -> Self {
        shadow.prefix
    }
}
