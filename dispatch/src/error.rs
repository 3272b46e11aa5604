use snafu::Snafu;

use crate::{DispatchKey, TypeKey};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// No type in the operand's ancestor chain has a handler.
    ///
    /// Recoverable: callers typically fall back to an identity treatment.
    #[snafu(display("no handler registered for '{key}' on ({})", join(types)))]
    DispatchNotFound { key: DispatchKey, types: Vec<TypeKey> },

    /// Ranking by left-then-right and by right-then-left picked different handlers.
    #[snafu(display(
        "ambiguous dispatch for '{key}': ({}, {}) vs ({}, {}); register a handler for ({}, {}) to disambiguate",
        left_first.0, left_first.1, right_first.0, right_first.1, suggested.0, suggested.1
    ))]
    AmbiguousDispatch {
        key: DispatchKey,
        left_first: (TypeKey, TypeKey),
        right_first: (TypeKey, TypeKey),
        suggested: (TypeKey, TypeKey),
    },

    /// A type was declared under a parent that is not declared yet.
    #[snafu(display("cannot declare type '{ty}': parent '{parent}' is not declared"))]
    UnknownParent { ty: TypeKey, parent: TypeKey },

    /// A type was re-declared with a different parent.
    #[snafu(display("type '{ty}' is already declared with parent {existing:?}, cannot re-declare with {requested:?}"))]
    ConflictingParent { ty: TypeKey, existing: Option<TypeKey>, requested: Option<TypeKey> },
}

impl Error {
    /// Whether this is the recoverable "no handler" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DispatchNotFound { .. })
    }
}

fn join(types: &[TypeKey]) -> String {
    types.iter().map(TypeKey::as_str).collect::<Vec<_>>().join(", ")
}
