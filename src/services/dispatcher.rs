//! Applies an [`OperationSet`] to an open image handle.
//!
//! Per invocation the dispatcher moves through
//! `Start -> BeforeHook -> (Resolving -> Applying) x N -> AfterHook -> Done`; any step may end
//! in `Aborted` (error) or `ShortCircuited` (an observer vetoed). Nothing is
//! retried and nothing is rolled back: after an error the handle is in whatever
//! state the failing provider left it and should be discarded.

use tracing::{debug, warn};

use super::capabilities::{CapabilityProvider, CapabilityTable, ProviderKind};
use crate::error::{ImagineError, Result};
use crate::models::{OperationSet, Params};

/// Observer verdict.
#[derive(Debug, Clone, PartialEq)]
pub enum Hook<R> {
    Continue,
    /// Stop the pipeline and hand `R` to the caller instead.
    ShortCircuit(R),
}

/// Extension points around operation dispatch. All default to `Continue`.
pub trait ApplyObserver<H, R>: Send + Sync {
    /// Runs once per pipeline, before any operation, even for an empty set.
    fn before_operations(&self, _operations: &OperationSet, _image: &H) -> Hook<R> {
        Hook::Continue
    }

    fn before_apply(&self, _operation: &str, _params: &Params, _image: &H) -> Hook<R> {
        Hook::Continue
    }

    fn after_apply(&self, _operations: &OperationSet, _image: &H) -> Hook<R> {
        Hook::Continue
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<R> {
    /// Every operation was applied to the handle.
    Applied { operations: usize },
    ShortCircuited(R),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Start,
    BeforeHook,
    Resolving,
    Applying,
    AfterHook,
    Done,
    Aborted,
    ShortCircuited,
}

struct Progress {
    state: DispatchState,
}

impl Progress {
    fn new() -> Self {
        Self {
            state: DispatchState::Start,
        }
    }

    fn to(&mut self, next: DispatchState, operation: Option<&str>) {
        debug!(
            "Dispatch {:?} -> {:?}{}",
            self.state,
            next,
            operation.map(|op| format!(" ({})", op)).unwrap_or_default()
        );
        self.state = next;
    }
}

pub struct Dispatcher<H, R> {
    model: Box<dyn CapabilityProvider<H>>,
    engine: Box<dyn CapabilityProvider<H>>,
    table: CapabilityTable,
    observers: Vec<Box<dyn ApplyObserver<H, R>>>,
    max_operations: Option<usize>,
}

impl<H, R> Dispatcher<H, R> {
    /// Builds the binding table from both providers; a name offered by both is
    /// a configuration error.
    pub fn new(
        model: Box<dyn CapabilityProvider<H>>,
        engine: Box<dyn CapabilityProvider<H>>,
    ) -> Result<Self> {
        let table = CapabilityTable::build(
            model.operations().iter().copied(),
            engine.operations().iter().copied(),
        )?;
        Ok(Self {
            model,
            engine,
            table,
            observers: Vec::new(),
            max_operations: None,
        })
    }

    /// Observers run in registration order.
    pub fn with_observer(mut self, observer: Box<dyn ApplyObserver<H, R>>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn with_max_operations(mut self, max: usize) -> Self {
        self.max_operations = Some(max);
        self
    }

    pub fn capabilities(&self) -> &CapabilityTable {
        &self.table
    }

    pub fn apply(&self, operations: &OperationSet, image: &mut H) -> Result<Outcome<R>> {
        let mut progress = Progress::new();

        if let Some(max) = self.max_operations {
            if operations.len() > max {
                progress.to(DispatchState::Aborted, None);
                return Err(ImagineError::InvalidInput(format!(
                    "{} operations requested, at most {} allowed",
                    operations.len(),
                    max
                )));
            }
        }

        progress.to(DispatchState::BeforeHook, None);
        if let Some(result) = self.first_veto(|o| o.before_operations(operations, image)) {
            progress.to(DispatchState::ShortCircuited, None);
            return Ok(Outcome::ShortCircuited(result));
        }

        let mut applied = 0;
        for (name, params) in operations.iter() {
            if let Some(result) = self.first_veto(|o| o.before_apply(name, params, image)) {
                progress.to(DispatchState::ShortCircuited, Some(name));
                return Ok(Outcome::ShortCircuited(result));
            }

            progress.to(DispatchState::Resolving, Some(name));
            let kind = match self.table.resolve(name) {
                Ok(kind) => kind,
                Err(err) => {
                    progress.to(DispatchState::Aborted, Some(name));
                    warn!("Unsupported image operation `{}`", name);
                    return Err(err);
                }
            };

            progress.to(DispatchState::Applying, Some(name));
            let provider = match kind {
                ProviderKind::Model => &self.model,
                ProviderKind::Engine => &self.engine,
            };
            if let Err(err) = provider.apply(name, image, params) {
                progress.to(DispatchState::Aborted, Some(name));
                warn!("Image operation `{}` failed: {}", name, err);
                return Err(ImagineError::Engine(err));
            }
            applied += 1;
        }

        progress.to(DispatchState::AfterHook, None);
        if let Some(result) = self.first_veto(|o| o.after_apply(operations, image)) {
            progress.to(DispatchState::ShortCircuited, None);
            return Ok(Outcome::ShortCircuited(result));
        }

        progress.to(DispatchState::Done, None);
        Ok(Outcome::Applied { operations: applied })
    }

    fn first_veto<F>(&self, mut hook: F) -> Option<R>
    where
        F: FnMut(&dyn ApplyObserver<H, R>) -> Hook<R>,
    {
        for observer in &self.observers {
            if let Hook::ShortCircuit(result) = hook(observer.as_ref()) {
                return Some(result);
            }
        }
        None
    }
}
