use crate::{type_of, HashMap, TypeId};
use std::any::{type_name, Any};

/// A data container that knows how to construct its own empty state.
///
/// Containers that need run configuration (rate tables, districts, aggregates) are built
/// explicitly and stored with [`Context::insert_data_container`] instead.
pub trait DataPlugin: Any {
    /// A constant reference to a constructor
    #[allow(non_upper_case_globals)]
    const new: &'static dyn Fn() -> Self;
}

/// Owns all state of a single model run. Each component lives in the context as a data
/// container keyed by its type, and the `Context*Ext` traits implement operations over them.
/// Dropping the context ends the run.
pub struct Context {
    // This is actually a `HashMap<TypeId, Box<T>>` where the key is `type_of::<T>()`.
    data_plugins: HashMap<TypeId, Box<dyn Any>>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    #[must_use]
    pub fn new() -> Self {
        Context {
            data_plugins: HashMap::default(),
        }
    }

    /// Stores `value` as the data container for `T`, returning the previous container if any.
    pub fn insert_data_container<T: Any>(&mut self, value: T) -> Option<T> {
        self.data_plugins
            .insert(type_of::<T>(), Box::new(value))
            .and_then(|previous| previous.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    /// Returns a mutable reference for the data container for `T`, creating it if it doesn't exist yet.
    pub fn get_data_container_mut<T: DataPlugin>(&mut self) -> &mut T {
        self.data_plugins
            .entry(type_of::<T>())
            .or_insert_with(|| Box::new((T::new)()))
            .downcast_mut::<T>()
            .unwrap() // Will never panic as data container has the matching type
    }

    /// Returns a reference to the data container for `T` if it exists.
    #[must_use]
    pub fn get_data_container<T: Any>(&self) -> Option<&T> {
        self.data_plugins
            .get(&type_of::<T>())
            .and_then(|data| data.downcast_ref::<T>())
    }

    /// Returns a reference to a data container the model cannot run without.
    ///
    /// Panics if the container was never inserted, which means the context was not initialized.
    #[must_use]
    pub fn expect_data_container<T: Any>(&self) -> &T {
        self.get_data_container::<T>()
            .unwrap_or_else(|| panic!("{} has not been initialized", type_name::<T>()))
    }

    /// Mutable version of [`Context::expect_data_container`].
    pub fn expect_data_container_mut<T: Any>(&mut self) -> &mut T {
        self.data_plugins
            .get_mut(&type_of::<T>())
            .and_then(|data| data.downcast_mut::<T>())
            .unwrap_or_else(|| panic!("{} has not been initialized", type_name::<T>()))
    }
}
