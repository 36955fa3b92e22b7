use parking_lot::RwLock;
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::OnceLock;

/// A GraphQL identifier.
///
/// Names are interned: every `Name` created from equal text shares one
/// reference-counted allocation, so cloning and comparing them is cheap.
#[derive(Clone, Eq, PartialOrd, Ord, Hash)]
pub struct Name(Arc<str>);

/// Tried to create a [`Name`] from a string that is not in valid
/// [GraphQL name](https://spec.graphql.org/October2021/#Name) syntax.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[error("`{0}` is not a valid GraphQL name")]
pub struct InvalidNameError(pub String);

type Table = RwLock<hashbrown::HashSet<Arc<str>>>;

fn interner() -> &'static Table {
    static INTERNER: OnceLock<Table> = OnceLock::new();
    INTERNER.get_or_init(Default::default)
}

/// Returns the shared allocation for `value`, inserting it on first use.
///
/// The table only grows: distinct names stay allocated for the life of the
/// process.
fn intern(value: &str) -> Arc<str> {
    if let Some(interned) = interner().read().get(value) {
        return interned.clone();
    }
    interner()
        .write()
        .get_or_insert_with(value, |value: &str| Arc::from(value))
        .clone()
}

impl Name {
    /// Create a name without checking its syntax.
    pub fn new(value: &str) -> Self {
        Self(intern(value))
    }

    /// Create a name, checking that `value` is a valid GraphQL name.
    pub fn try_new(value: &str) -> Result<Self, InvalidNameError> {
        if Self::valid_syntax(value) {
            Ok(Self::new(value))
        } else {
            Err(InvalidNameError(value.to_owned()))
        }
    }

    /// Returns whether the given string is a valid GraphQL name.
    ///
    /// <https://spec.graphql.org/October2021/#Name>
    pub fn valid_syntax(value: &str) -> bool {
        let mut chars = value.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        (first.is_ascii_alphabetic() || first == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl Deref for Name {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<&Name> for Name {
    fn from(value: &Name) -> Self {
        value.clone()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_names_share_storage() {
        let a = Name::new("hero");
        let b = Name::new(&String::from("hero"));
        assert!(Arc::ptr_eq(&a.0, &b.0));
        assert_eq!(a, b);
    }

    #[test]
    fn validates_syntax() {
        assert!(Name::valid_syntax("_private1"));
        assert!(Name::valid_syntax("Query"));
        assert!(!Name::valid_syntax("1st"));
        assert!(!Name::valid_syntax(""));
        assert!(!Name::valid_syntax("è_é"));
        assert_eq!(
            Name::try_new("a-b").unwrap_err().to_string(),
            "`a-b` is not a valid GraphQL name"
        );
    }
}
