//! Dispatcher: maps raw (access method, kind) tags to the handlers that
//! understand them.
//!
//! The registry is an explicitly constructed, immutable value built once
//! at startup and threaded through as context. There is no process-wide
//! handler table and nothing is registered at runtime; the set of access
//! methods is closed and versioned with the on-disk format.
//!
//! An unrecognized access method means the log stream is corrupt or was
//! produced by an incompatible build; recovery aborts. An unrecognized
//! kind under a recognized access method is equally fatal for replay
//! (forward compatibility between producer and replay engine is not
//! assumed) but non-fatal for diagnostics, which report "unknown" and
//! continue.

use thiserror::Error;

use crate::describe;
use crate::record::{AccessMethod, RecordKind};

/// Resolution failure. Both variants are fatal on the replay path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The access-method tag is not in the registry.
    #[error("unrecognized access method tag {0}; log stream is from an incompatible build")]
    UnknownAccessMethod(u8),

    /// The kind tag is outside the access method's closed enumeration.
    #[error("unrecognized record kind {kind_tag} for access method {method}")]
    UnknownKind {
        /// The recognized access method
        method: AccessMethod,
        /// The unrecognized kind tag
        kind_tag: u8,
    },
}

/// One registered access method: its tag, name, and kind tables.
struct MethodEntry {
    method: AccessMethod,
    resolve: fn(u8) -> Option<RecordKind>,
    identify: fn(u8) -> Option<&'static str>,
}

/// Immutable handler registry over the closed set of access methods.
pub struct Registry {
    entries: Vec<MethodEntry>,
}

impl Registry {
    /// Builds the registry with both access methods. This is the only
    /// constructor; the registry never changes afterwards.
    pub fn new() -> Self {
        Self {
            entries: vec![
                MethodEntry {
                    method: AccessMethod::Ordered,
                    resolve: |tag| RecordKind::resolve(AccessMethod::Ordered, tag),
                    identify: describe::identify_ordered,
                },
                MethodEntry {
                    method: AccessMethod::Hierarchical,
                    resolve: |tag| RecordKind::resolve(AccessMethod::Hierarchical, tag),
                    identify: describe::identify_hierarchical,
                },
            ],
        }
    }

    fn entry(&self, method_tag: u8) -> Result<&MethodEntry, DispatchError> {
        self.entries
            .iter()
            .find(|e| e.method.as_u8() == method_tag)
            .ok_or(DispatchError::UnknownAccessMethod(method_tag))
    }

    /// Number of registered access methods.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no access method is registered (never, after `new`).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The access method behind a raw tag.
    pub fn access_method(&self, method_tag: u8) -> Result<AccessMethod, DispatchError> {
        Ok(self.entry(method_tag)?.method)
    }

    /// Resolves raw tags to a typed kind: the replay-path lookup, where
    /// both unknown cases are errors.
    pub fn resolve(&self, method_tag: u8, kind_tag: u8) -> Result<RecordKind, DispatchError> {
        let entry = self.entry(method_tag)?;
        (entry.resolve)(kind_tag).ok_or(DispatchError::UnknownKind {
            method: entry.method,
            kind_tag,
        })
    }

    /// Diagnostics-path lookup: `Ok(None)` for an unknown kind under a
    /// known access method, so inspection tooling can degrade instead of
    /// aborting. The access method itself must still be known.
    pub fn identify(
        &self,
        method_tag: u8,
        kind_tag: u8,
    ) -> Result<Option<&'static str>, DispatchError> {
        let entry = self.entry(method_tag)?;
        Ok((entry.identify)(kind_tag))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{HierarchicalKind, OrderedKind};

    #[test]
    fn test_registry_contains_exactly_two_methods() {
        let registry = Registry::new();
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_resolve_every_known_kind() {
        let registry = Registry::new();
        for kind in OrderedKind::ALL {
            assert_eq!(
                registry.resolve(0, kind.as_u8()).unwrap(),
                RecordKind::Ordered(kind)
            );
        }
        for kind in HierarchicalKind::ALL {
            assert_eq!(
                registry.resolve(1, kind.as_u8()).unwrap(),
                RecordKind::Hierarchical(kind)
            );
        }
    }

    #[test]
    fn test_unknown_access_method_is_fatal() {
        let registry = Registry::new();
        assert_eq!(
            registry.resolve(7, 0),
            Err(DispatchError::UnknownAccessMethod(7))
        );
        // Even the diagnostics path cannot proceed without a known method.
        assert!(registry.identify(7, 0).is_err());
    }

    #[test]
    fn test_unknown_kind_under_known_method() {
        let registry = Registry::new();
        assert_eq!(
            registry.resolve(0, 99),
            Err(DispatchError::UnknownKind {
                method: AccessMethod::Ordered,
                kind_tag: 99,
            })
        );
        // Diagnostics degrade to "unknown" instead of failing.
        assert_eq!(registry.identify(0, 99).unwrap(), None);
        assert_eq!(registry.identify(0, 0).unwrap(), Some("INSERT_LEAF"));
    }
}
