//! Type identifier registry.
//!
//! Hands out a 16-bit id per distinct Rust type, in first-use order,
//! starting at 1 (0 is never assigned). Ids are a run-local alias: two
//! sessions only agree on them when they share a registry, or when both
//! sides request their types in the same order.

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::error::{FxsdError, Result};

#[derive(Debug)]
struct RegistryState {
    ids: HashMap<TypeId, u16>,
    names: HashMap<u16, &'static str>,
    next: u16,
}

/// Assigns monotonically increasing ids to types on first request.
#[derive(Debug)]
pub struct TypeIdRegistry {
    state: Mutex<RegistryState>,
}

static GLOBAL: OnceLock<Arc<TypeIdRegistry>> = OnceLock::new();

impl Default for TypeIdRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeIdRegistry {
    /// Create an isolated registry whose first id is 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                ids: HashMap::new(),
                names: HashMap::new(),
                next: 1,
            }),
        }
    }

    /// The process-wide registry. Created on first use and never reset.
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::new())))
    }

    /// Id for `T`, assigning the next free one if `T` has not been seen.
    pub fn id_for<T: 'static>(&self) -> Result<u16> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(&id) = state.ids.get(&TypeId::of::<T>()) {
            return Ok(id);
        }
        // 0 is reserved, so wrapping back to it means the space is used up.
        let id = state.next;
        if id == 0 {
            return Err(FxsdError::TypeIdsExhausted);
        }
        state.next = id.wrapping_add(1);
        state.ids.insert(TypeId::of::<T>(), id);
        state.names.insert(id, type_name::<T>());
        Ok(id)
    }

    /// Rust type name behind an id handed out by this registry.
    #[must_use]
    pub fn type_name(&self, id: u16) -> Option<&'static str> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.names.get(&id).copied()
    }

    /// Number of ids handed out so far.
    #[must_use]
    pub fn len(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
