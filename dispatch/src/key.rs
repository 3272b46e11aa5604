//! Identifiers used to index dispatch tables.
//!
//! Both keys are cheap to clone (`Arc<str>`) and compare by content, so a key
//! built from a string literal at the call site matches one stored at
//! registration time.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

macro_rules! string_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(name: impl AsRef<str>) -> Self {
                Self(Arc::from(name.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), &*self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self::new(name)
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self(Arc::from(name))
            }
        }

        impl From<&$name> for $name {
            fn from(key: &$name) -> Self {
                key.clone()
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_key! {
    /// Opaque operation identifier (e.g. `"add"`, `"reduce-sum"`, or a pass name).
    ///
    /// Every key owns an independent dispatch table.
    DispatchKey
}

string_key! {
    /// Declared type of a dispatch operand.
    ///
    /// Types are related to each other only through a [`TypeHierarchy`](crate::TypeHierarchy).
    TypeKey
}

/// Values that can be dispatched on.
///
/// Implementors report their *concrete* declared type; the registry walks the
/// ancestor chain from there.
pub trait Classify {
    fn type_key(&self) -> TypeKey;
}

impl<T: Classify + ?Sized> Classify for &T {
    fn type_key(&self) -> TypeKey {
        (**self).type_key()
    }
}

impl<T: Classify + ?Sized> Classify for Box<T> {
    fn type_key(&self) -> TypeKey {
        (**self).type_key()
    }
}

impl<T: Classify + ?Sized> Classify for Arc<T> {
    fn type_key(&self) -> TypeKey {
        (**self).type_key()
    }
}
