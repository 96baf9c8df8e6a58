use std::collections::BTreeMap;

use super::error::RenderError;
use super::OUTPUT_SLOT;

/// Anything that can live in an argument slot and knows its byte size
pub trait SizedBuffer {
    fn size(&self) -> usize;
}

/// Kernel argument slot -> input buffer. Slot 0 never holds a buffer.
pub struct BufferTable<B> {
    slots: BTreeMap<u32, B>,
}

impl<B: SizedBuffer> BufferTable<B> {
    pub fn new() -> Self {
        BufferTable { slots: BTreeMap::new() }
    }

    /// Drop whatever is bound to `slot`, then bind the result of `create`.
    ///
    /// The previous buffer is gone before `create` runs, so two buffers for one
    /// slot never coexist. If `create` fails the slot is left empty.
    pub fn replace_with<F>(&mut self, slot: u32, size: usize, create: F) -> Result<&B, RenderError>
    where
        F: FnOnce(usize) -> Result<B, RenderError>,
    {
        if slot == OUTPUT_SLOT {
            return Err(RenderError::ReservedSlot);
        }
        if size == 0 {
            return Err(RenderError::EmptyBuffer { slot });
        }
        drop(self.slots.remove(&slot));
        let buffer = create(size)?;
        Ok(self.slots.entry(slot).or_insert(buffer))
    }

    /// Buffer at `slot`, checked to have room for `len` bytes
    pub fn writable(&mut self, slot: u32, len: usize) -> Result<&mut B, RenderError> {
        if slot == OUTPUT_SLOT {
            return Err(RenderError::ReservedSlot);
        }
        let buffer = self.slots.get_mut(&slot).ok_or(RenderError::UnboundSlot { slot })?;
        if len > buffer.size() {
            return Err(RenderError::WriteOutOfBounds { slot, len, size: buffer.size() });
        }
        Ok(buffer)
    }

    pub fn get(&self, slot: u32) -> Option<&B> {
        self.slots.get(&slot)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<B: SizedBuffer> Default for BufferTable<B> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    struct FakeBuffer {
        size: usize,
        live: Rc<Cell<usize>>,
    }

    impl FakeBuffer {
        fn create(size: usize, live: &Rc<Cell<usize>>) -> Result<FakeBuffer, RenderError> {
            live.set(live.get() + 1);
            Ok(FakeBuffer { size, live: Rc::clone(live) })
        }
    }

    impl SizedBuffer for FakeBuffer {
        fn size(&self) -> usize {
            self.size
        }
    }

    impl Drop for FakeBuffer {
        fn drop(&mut self) {
            self.live.set(self.live.get() - 1);
        }
    }

    #[test]
    fn rebinding_frees_old_buffer_before_creating_new() {
        let live = Rc::new(Cell::new(0));
        let mut table = BufferTable::new();

        table.replace_with(5, 64, |size| FakeBuffer::create(size, &live)).unwrap();
        assert_eq!(live.get(), 1);

        table
            .replace_with(5, 128, |size| {
                assert_eq!(live.get(), 0, "old buffer still alive while creating its replacement");
                FakeBuffer::create(size, &live)
            })
            .unwrap();
        assert_eq!(live.get(), 1);
        assert_eq!(table.len(), 1);

        // the new size is what writes are checked against
        assert!(table.writable(5, 128).is_ok());
        assert!(matches!(
            table.writable(5, 129),
            Err(RenderError::WriteOutOfBounds { slot: 5, len: 129, size: 128 })
        ));
    }

    #[test]
    fn failed_creation_leaves_slot_empty() {
        let live = Rc::new(Cell::new(0));
        let mut table = BufferTable::new();
        table.replace_with(7, 16, |size| FakeBuffer::create(size, &live)).unwrap();

        let result = table.replace_with(7, 32, |_| Err(RenderError::Cl { context: "clCreateBuffer", code: -4 }));
        assert!(result.is_err());
        assert_eq!(live.get(), 0);
        assert!(table.get(7).is_none());
    }

    #[test]
    fn output_slot_is_reserved() {
        let live = Rc::new(Cell::new(0));
        let mut table = BufferTable::new();
        let result = table.replace_with(OUTPUT_SLOT, 16, |size| FakeBuffer::create(size, &live));
        assert!(matches!(result, Err(RenderError::ReservedSlot)));
        assert!(matches!(table.writable(OUTPUT_SLOT, 4), Err(RenderError::ReservedSlot)));
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn zero_sized_buffers_are_rejected() {
        let live = Rc::new(Cell::new(0));
        let mut table = BufferTable::new();
        let result = table.replace_with(3, 0, |size| FakeBuffer::create(size, &live));
        assert!(matches!(result, Err(RenderError::EmptyBuffer { slot: 3 })));
        assert!(table.is_empty());
    }

    #[test]
    fn writes_to_unbound_slots_fail() {
        let mut table: BufferTable<FakeBuffer> = BufferTable::new();
        assert!(matches!(table.writable(11, 4), Err(RenderError::UnboundSlot { slot: 11 })));
    }
}
