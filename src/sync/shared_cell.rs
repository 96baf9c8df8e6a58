use parking_lot::{Mutex, RwLock};

/// One value shared between threads with snapshot reads and
/// copy-modify-publish writes.
///
/// Readers only contend with the short publish step of a writer. Writers
/// serialize on a separate mutex, so a slow `modify` closure blocks other
/// writers but never readers.
#[derive(Debug, Default)]
pub struct SharedCell<T> {
    value: RwLock<T>,
    writer: Mutex<()>,
}

impl<T: Clone> SharedCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
            writer: Mutex::new(()),
        }
    }

    /// Snapshot of the current value
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Compute a new value from a private copy and publish it
    pub fn modify<F: FnOnce(T) -> T>(&self, f: F) {
        let _writer = self.writer.lock();
        let copy = self.value.read().clone();
        let updated = f(copy);
        *self.value.write() = updated;
    }

    /// Unconditionally publish `value`
    pub fn assign(&self, value: T) {
        let _writer = self.writer.lock();
        *self.value.write() = value;
    }

    /// Publish `value` and return what it replaced
    pub fn replace(&self, value: T) -> T {
        let _writer = self.writer.lock();
        std::mem::replace(&mut *self.value.write(), value)
    }
}

impl<T: Clone> SharedCell<Option<T>> {
    /// Consume the pending value, leaving `None`
    pub fn take(&self) -> Option<T> {
        let _writer = self.writer.lock();
        if self.value.read().is_none() {
            return None;
        }
        self.value.write().take()
    }
}
