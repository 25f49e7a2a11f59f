use super::core::{Middleware, Middlewares};
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};

/// A middleware with an id, so a [`Stack`] can address it.
#[derive(Clone)]
pub struct Wrapper {
    id: String,
    middleware: Arc<dyn Middleware>,
    data: Option<Value>,
}

impl Wrapper {
    pub fn new<M: Middleware + 'static>(id: impl Into<String>, middleware: M) -> Self {
        Self {
            id: id.into(),
            middleware: Arc::new(middleware),
            data: None,
        }
    }

    /// Attach arbitrary metadata (e.g. for documentation tooling).
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn middleware(&self) -> Arc<dyn Middleware> {
        Arc::clone(&self.middleware)
    }

    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }
}

/// Editable, id-addressed middleware list.
///
/// Positional inserts that cannot find their anchor id append instead and
/// report `false`.
#[derive(Default)]
pub struct Stack {
    wrappers: RwLock<Vec<Wrapper>>,
}

impl Stack {
    #[must_use]
    pub fn new(wrappers: Vec<Wrapper>) -> Self {
        Self {
            wrappers: RwLock::new(wrappers),
        }
    }

    /// Ids in order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.read().iter().map(|w| w.id.clone()).collect()
    }

    #[must_use]
    pub fn wrappers(&self) -> Vec<Wrapper> {
        self.read().clone()
    }

    /// Snapshot as a [`Middlewares`] chain.
    #[must_use]
    pub fn middlewares(&self) -> Middlewares {
        Middlewares::from(
            self.read()
                .iter()
                .map(Wrapper::middleware)
                .collect::<Vec<_>>(),
        )
    }

    pub fn add_wrapper(&self, wrapper: Wrapper) -> &Self {
        self.write().push(wrapper);
        self
    }

    pub fn insert_before(&self, id: &str, wrapper: Wrapper) -> bool {
        let mut list = self.write();
        match list.iter().position(|w| w.id == id) {
            Some(pos) => {
                list.insert(pos, wrapper);
                true
            }
            None => {
                list.push(wrapper);
                false
            }
        }
    }

    pub fn insert_after(&self, id: &str, wrapper: Wrapper) -> bool {
        let mut list = self.write();
        match list.iter().position(|w| w.id == id) {
            Some(pos) => {
                list.insert(pos + 1, wrapper);
                true
            }
            None => {
                list.push(wrapper);
                false
            }
        }
    }

    /// Remove the first wrapper with `id`.
    pub fn remove(&self, id: &str) -> bool {
        let mut list = self.write();
        match list.iter().position(|w| w.id == id) {
            Some(pos) => {
                list.remove(pos);
                true
            }
            None => false,
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Wrapper>> {
        self.wrappers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Wrapper>> {
        self.wrappers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clone for Stack {
    fn clone(&self) -> Self {
        Self::new(self.wrappers())
    }
}
