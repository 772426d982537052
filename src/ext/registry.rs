use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;

use super::{builtin, ExtensionHandler, ParsePriority, Validity};
use crate::Error;

/// Static description of one extension.
#[derive(Clone)]
pub struct ExtensionDescriptor {
    pub id: u16,
    pub name: Cow<'static, str>,
    pub validity: Validity,
    pub priority: ParsePriority,
    pub handler: Arc<dyn ExtensionHandler>,
}

impl ExtensionDescriptor {
    pub fn new<H>(
        id: u16,
        name: impl Into<Cow<'static, str>>,
        validity: Validity,
        priority: ParsePriority,
        handler: H,
    ) -> Self
    where
        H: ExtensionHandler + 'static,
    {
        ExtensionDescriptor {
            id,
            name: name.into(),
            validity,
            priority,
            handler: Arc::new(handler),
        }
    }

    /// Whether the extension may appear in a message with these bits.
    pub(crate) fn allows(&self, message: Validity, family: Validity) -> bool {
        self.validity.contains(message) && self.validity.contains(family)
    }
}

impl fmt::Debug for ExtensionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionDescriptor")
            .field("id", &format_args!("{:#06x}", self.id))
            .field("name", &self.name)
            .field("validity", &self.validity)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Immutable table of extension descriptors, in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    descriptors: Vec<ExtensionDescriptor>,
}

static DEFAULT_REGISTRY: Lazy<Arc<Registry>> = Lazy::new(|| {
    Arc::new(Registry {
        descriptors: builtin::descriptors(),
    })
});

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// The process wide registry holding the built-in extensions.
    pub fn default_shared() -> Arc<Registry> {
        DEFAULT_REGISTRY.clone()
    }

    pub fn get(&self, id: u16) -> Option<&ExtensionDescriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtensionDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Builds a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    descriptors: Vec<ExtensionDescriptor>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the built-in extensions.
    pub fn with_builtin(mut self) -> Result<Self, Error> {
        for descriptor in builtin::descriptors() {
            self = self.register(descriptor)?;
        }
        Ok(self)
    }

    /// Add a descriptor. Ids must be unique.
    pub fn register(mut self, descriptor: ExtensionDescriptor) -> Result<Self, Error> {
        if self.descriptors.iter().any(|d| d.id == descriptor.id) {
            return Err(Error::AlreadyRegistered(descriptor.id));
        }
        debug!(
            "Registering extension {} ({:#06x})",
            descriptor.name, descriptor.id
        );
        self.descriptors.push(descriptor);
        Ok(self)
    }

    pub fn build(self) -> Arc<Registry> {
        Arc::new(Registry {
            descriptors: self.descriptors,
        })
    }
}
