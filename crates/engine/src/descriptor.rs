use crate::error::{Error, Result};

/// Hands out descriptor slot indices of a fixed-size heap.
///
/// Slots are never freed: textures and views live for the whole process, so a
/// monotonically advancing cursor is enough to guarantee each slot is used once.
/// The first `reserved` slots are kept for views created outside the allocator.
#[derive(Debug)]
pub struct SlotAllocator {
    name: String,
    capacity: u32,
    reserved: u32,
    next: u32,
}

impl SlotAllocator {
    pub fn new(name: impl Into<String>, capacity: u32, reserved: u32) -> Self {
        assert!(capacity > 0);
        assert!(reserved <= capacity);

        Self {
            name: name.into(),
            capacity,
            reserved,
            next: reserved,
        }
    }

    pub fn allocate(&mut self) -> Result<u32> {
        if self.next >= self.capacity {
            return Err(Error::DescriptorHeapFull {
                name: self.name.clone(),
                capacity: self.capacity,
            });
        }
        let index = self.next;
        self.next += 1;
        Ok(index)
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn reserved(&self) -> u32 {
        self.reserved
    }

    pub fn allocated(&self) -> u32 {
        self.next - self.reserved
    }

    pub fn remaining(&self) -> u32 {
        self.capacity - self.next
    }
}

/// Byte offset of slot `index` from the start of a heap whose descriptors are
/// `increment` bytes apart.
pub fn slot_offset(increment: u32, index: u32) -> u64 {
    u64::from(increment) * u64::from(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn slots_are_unique_and_skip_reserved_prefix() {
        let mut slots = SlotAllocator::new("srv", 16, 1);
        let mut seen = HashSet::new();
        while let Ok(i) = slots.allocate() {
            assert!(i >= 1);
            assert!(i < 16);
            assert!(seen.insert(i), "slot {i} handed out twice");
        }
        assert_eq!(seen.len(), 15);
        assert_eq!(slots.allocated(), 15);
        assert_eq!(slots.remaining(), 0);
    }

    #[test]
    fn exhaustion_is_an_error() {
        let mut slots = SlotAllocator::new("rtv", 2, 0);
        slots.allocate().unwrap();
        slots.allocate().unwrap();
        match slots.allocate() {
            Err(Error::DescriptorHeapFull { name, capacity }) => {
                assert_eq!(name, "rtv");
                assert_eq!(capacity, 2);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        // still full on a second attempt
        assert!(slots.allocate().is_err());
    }

    #[test]
    fn fully_reserved_heap_has_no_free_slots() {
        let mut slots = SlotAllocator::new("imgui", 1, 1);
        assert_eq!(slots.remaining(), 0);
        assert!(slots.allocate().is_err());
    }

    #[test]
    fn offsets_scale_with_increment() {
        assert_eq!(slot_offset(32, 0), 0);
        assert_eq!(slot_offset(32, 3), 96);
        assert_eq!(slot_offset(u32::MAX, 2), 2 * u64::from(u32::MAX));
    }
}
