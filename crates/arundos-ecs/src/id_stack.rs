//! Fixed-capacity stack of free ids.
//!
//! Each manager owns one [`IdStack`] seeded with every id in `[0, capacity)`,
//! arranged so that id 0 is handed out first.

/// Failures of the id stack. Both indicate a capacity or bookkeeping bug in
/// the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdStackError {
    /// Every id is in use.
    #[error("{kind} id stack underflow: all {capacity} ids are in use")]
    StackUnderflow { kind: &'static str, capacity: usize },

    /// An id was released into a stack that already holds every id.
    #[error("{kind} id stack overflow: cannot release {id}, all {capacity} ids are already free")]
    StackOverflow {
        kind: &'static str,
        id: usize,
        capacity: usize,
    },

    /// An id outside `[0, capacity)` was released.
    #[error("{kind} id {id} is outside the stack capacity of {capacity}")]
    OutOfRange {
        kind: &'static str,
        id: usize,
        capacity: usize,
    },
}

/// Stack of ids available for allocation.
///
/// Releasing an id the caller does not hold is not detected; it duplicates
/// the id and corrupts later allocations.
#[derive(Debug, Clone)]
pub struct IdStack {
    kind: &'static str,
    capacity: usize,
    free: Vec<usize>,
}

impl IdStack {
    /// Create a stack holding every id in `[0, capacity)`. `kind` names the
    /// ids in error messages.
    pub fn new(kind: &'static str, capacity: usize) -> Self {
        Self {
            kind,
            capacity,
            free: (0..capacity).rev().collect(),
        }
    }

    /// Pop the next free id.
    pub fn allocate(&mut self) -> Result<usize, IdStackError> {
        self.free.pop().ok_or(IdStackError::StackUnderflow {
            kind: self.kind,
            capacity: self.capacity,
        })
    }

    /// Push `id` back so it can be allocated again.
    pub fn release(&mut self, id: usize) -> Result<(), IdStackError> {
        if id >= self.capacity {
            return Err(IdStackError::OutOfRange {
                kind: self.kind,
                id,
                capacity: self.capacity,
            });
        }
        if self.free.len() >= self.capacity {
            return Err(IdStackError::StackOverflow {
                kind: self.kind,
                id,
                capacity: self.capacity,
            });
        }
        self.free.push(id);
        Ok(())
    }

    /// Number of ids available.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Number of ids handed out.
    pub fn in_use(&self) -> usize {
        self.capacity - self.free.len()
    }

    /// Total number of ids.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_handed_out_from_zero() {
        let mut stack = IdStack::new("test", 4);
        assert_eq!(stack.allocate().unwrap(), 0);
        assert_eq!(stack.allocate().unwrap(), 1);
        assert_eq!(stack.in_use(), 2);
        assert_eq!(stack.available(), 2);
    }

    #[test]
    fn exhausting_the_stack_underflows() {
        let mut stack = IdStack::new("test", 3);
        for _ in 0..3 {
            stack.allocate().unwrap();
        }
        assert_eq!(
            stack.allocate().unwrap_err(),
            IdStackError::StackUnderflow {
                kind: "test",
                capacity: 3
            }
        );
    }

    #[test]
    fn released_id_is_reused_next() {
        let mut stack = IdStack::new("test", 8);
        let a = stack.allocate().unwrap();
        let _b = stack.allocate().unwrap();
        stack.release(a).unwrap();
        assert_eq!(stack.allocate().unwrap(), a);
    }

    #[test]
    fn releasing_into_a_full_stack_overflows() {
        let mut stack = IdStack::new("test", 2);
        assert!(matches!(
            stack.release(1),
            Err(IdStackError::StackOverflow { id: 1, .. })
        ));
    }

    #[test]
    fn releasing_an_out_of_range_id_fails() {
        let mut stack = IdStack::new("test", 2);
        stack.allocate().unwrap();
        assert!(matches!(
            stack.release(2),
            Err(IdStackError::OutOfRange { id: 2, .. })
        ));
    }
}
