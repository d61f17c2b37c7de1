//! File type registry.
//!
//! Holds every descriptor the scanner knows about, in registration order.
//! Formats are added through explicit calls at startup; nothing is discovered
//! at runtime.

use std::sync::Arc;

use crate::error::{CoreError, Result};
use crate::formats::{LinkFormat, PrefetchFormat};
use crate::traits::FileTypeDescriptor;

/// Registry of carvable file types keyed by name.
///
/// Registration order matters: when two descriptors match at the same offset
/// the first registered one is reported first.
///
/// # Example
///
/// ```
/// use carvel_core::TypeRegistry;
///
/// let registry = TypeRegistry::with_defaults();
/// assert_eq!(registry.names(), vec!["lnk", "prefetch"]);
/// assert_eq!(registry.window_size(), 4);
/// assert!(registry.lookup("jpeg").is_err());
/// ```
#[derive(Clone, Default)]
pub struct TypeRegistry {
    descriptors: Vec<Arc<dyn FileTypeDescriptor>>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in shortcut and prefetch formats.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.descriptors.push(Arc::new(LinkFormat));
        registry.descriptors.push(Arc::new(PrefetchFormat));
        registry
    }

    /// Registers a new descriptor.
    pub fn register<D>(&mut self, descriptor: D) -> Result<()>
    where
        D: FileTypeDescriptor + 'static,
    {
        self.register_shared(Arc::new(descriptor))
    }

    /// Registers a descriptor that is already shared elsewhere.
    pub fn register_shared(&mut self, descriptor: Arc<dyn FileTypeDescriptor>) -> Result<()> {
        let name = descriptor.name();

        if descriptor.signature().is_empty() {
            return Err(CoreError::EmptySignature(name.to_string()));
        }

        if self.descriptors.iter().any(|d| d.name() == name) {
            return Err(CoreError::DuplicateTypeName(name.to_string()));
        }

        tracing::debug!(
            name,
            signature_len = descriptor.signature().len(),
            offset_adjustment = descriptor.offset_adjustment(),
            "registered file type"
        );
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Finds a descriptor by name.
    pub fn lookup(&self, name: &str) -> Result<&Arc<dyn FileTypeDescriptor>> {
        self.descriptors
            .iter()
            .find(|d| d.name() == name)
            .ok_or_else(|| self.unsupported(name))
    }

    /// Returns a registry restricted to the given names, keeping registration order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        for name in names {
            self.lookup(name.as_ref())?;
        }

        let descriptors = self
            .descriptors
            .iter()
            .filter(|d| names.iter().any(|n| n.as_ref() == d.name()))
            .cloned()
            .collect();

        Ok(Self { descriptors })
    }

    /// Returns all descriptors in registration order.
    pub fn all(&self) -> &[Arc<dyn FileTypeDescriptor>] {
        &self.descriptors
    }

    pub fn names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name()).collect()
    }

    /// Width of the scan window: the longest registered signature.
    pub fn window_size(&self) -> usize {
        self.descriptors
            .iter()
            .map(|d| d.signature().len())
            .max()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    fn unsupported(&self, name: &str) -> CoreError {
        CoreError::UnsupportedType {
            name: name.to_string(),
            registered: self.names().into_iter().map(String::from).collect(),
        }
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.names())
            .finish()
    }
}
