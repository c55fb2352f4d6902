use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{EngineError, ImagineError, Result};
use crate::models::{OperationSet, Params};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Operations implemented by the data-model layer (e.g. `thumbnail`).
    Model,
    /// Generic operations of the image-processing engine (e.g. `crop`).
    Engine,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Model => "model",
            ProviderKind::Engine => "engine",
        }
    }
}

/// A collaborator exposing a closed set of named image operations.
pub trait CapabilityProvider<H>: Send + Sync {
    /// Every operation name this provider accepts in [`apply`](Self::apply).
    fn operations(&self) -> &[&'static str];

    /// Mutates `image` in place. Errors are handed back to the caller as is.
    fn apply(&self, operation: &str, image: &mut H, params: &Params) -> Result<(), EngineError>;
}

/// Operation name to provider bindings, fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct CapabilityTable {
    bindings: IndexMap<String, ProviderKind>,
}

impl CapabilityTable {
    /// Fails when a name is bound to both providers.
    pub fn build<M, E>(model: M, engine: E) -> Result<Self>
    where
        M: IntoIterator,
        M::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let mut bindings = IndexMap::new();
        for name in model {
            bind(&mut bindings, name.as_ref(), ProviderKind::Model)?;
        }
        for name in engine {
            bind(&mut bindings, name.as_ref(), ProviderKind::Engine)?;
        }
        Ok(Self { bindings })
    }

    pub fn resolve(&self, operation: &str) -> Result<ProviderKind> {
        self.bindings
            .get(operation)
            .copied()
            .ok_or_else(|| ImagineError::UnsupportedOperation(operation.to_string()))
    }

    /// Checks every operation name without applying anything.
    pub fn ensure_supported(&self, operations: &OperationSet) -> Result<()> {
        for name in operations.names() {
            self.resolve(name)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ProviderKind)> {
        self.bindings.iter().map(|(name, kind)| (name.as_str(), *kind))
    }
}

fn bind(bindings: &mut IndexMap<String, ProviderKind>, name: &str, kind: ProviderKind) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ImagineError::Config("empty operation name in capability list".into()));
    }
    match bindings.get(name) {
        Some(existing) if *existing != kind => Err(ImagineError::Config(format!(
            "operation `{}` is bound to both the {} and the {} provider",
            name,
            existing.as_str(),
            kind.as_str()
        ))),
        Some(_) => Ok(()),
        None => {
            bindings.insert(name.to_string(), kind);
            Ok(())
        }
    }
}
