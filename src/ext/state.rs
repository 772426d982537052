use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use crate::Error;

type Entry = Box<dyn Any + Send + Sync>;

/// Per-session extension data keyed by extension id.
///
/// `current` belongs to the running handshake, `resumed` was restored from
/// a packed session.
#[derive(Default)]
pub struct ExtensionState {
    current: HashMap<u16, Entry>,
    resumed: HashMap<u16, Entry>,
}

fn downcast<T: Any>(id: u16, entry: Option<&Entry>) -> Result<Option<&T>, Error> {
    match entry {
        None => Ok(None),
        Some(entry) => {
            let any: &(dyn Any + Send + Sync) = &**entry;
            any.downcast_ref::<T>()
                .map(Some)
                .ok_or(Error::ExtensionStateType(id))
        }
    }
}

impl ExtensionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Any>(&self, id: u16) -> Result<Option<&T>, Error> {
        downcast(id, self.current.get(&id))
    }

    pub fn get_mut<T: Any>(&mut self, id: u16) -> Result<Option<&mut T>, Error> {
        match self.current.get_mut(&id) {
            None => Ok(None),
            Some(entry) => {
                let any: &mut (dyn Any + Send + Sync) = &mut **entry;
                any.downcast_mut::<T>()
                    .map(Some)
                    .ok_or(Error::ExtensionStateType(id))
            }
        }
    }

    /// Set the state of `id`, replacing what was there.
    pub fn set<T: Any + Send + Sync>(&mut self, id: u16, value: T) {
        self.current.insert(id, Box::new(value));
    }

    pub fn remove(&mut self, id: u16) -> bool {
        self.current.remove(&id).is_some()
    }

    pub fn contains(&self, id: u16) -> bool {
        self.current.contains_key(&id)
    }

    pub fn resumed<T: Any>(&self, id: u16) -> Result<Option<&T>, Error> {
        downcast(id, self.resumed.get(&id))
    }

    pub(crate) fn get_raw(&self, id: u16) -> Option<&(dyn Any + Send + Sync)> {
        self.current.get(&id).map(|e| &**e)
    }

    pub(crate) fn set_resumed_boxed(&mut self, id: u16, value: Entry) {
        self.resumed.insert(id, value);
    }
}

impl fmt::Debug for ExtensionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut current: Vec<_> = self.current.keys().collect();
        current.sort();
        let mut resumed: Vec<_> = self.resumed.keys().collect();
        resumed.sort();
        f.debug_struct("ExtensionState")
            .field("current", &current)
            .field("resumed", &resumed)
            .finish()
    }
}
