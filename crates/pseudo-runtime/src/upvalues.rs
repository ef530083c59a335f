//! Open-upvalue list protocol (spec §4.2, §9 "Upvalues as an open/closed
//! state machine", testable properties 5/6/7).
//!
//! The list is singly-linked through `UpvalueObj::open_next`, strictly
//! decreasing in `location`, starting at `Vm::open_upvalues`. `capture`
//! reuses an existing open upvalue for a slot if one is already on the list;
//! `close` walks from the head while `location >= boundary`, since the list's
//! sort order guarantees everything that needs closing is a prefix.

use pseudo_core::{Obj, Value};
use std::ptr::NonNull;

/// Finds or creates the open upvalue for `slot`, inserting it at the
/// position that keeps the list sorted by decreasing `location`.
pub fn capture(
    heap: &mut pseudo_core::Heap,
    head: &mut Option<NonNull<Obj>>,
    slot: usize,
) -> NonNull<Obj> {
    let mut prev: Option<NonNull<Obj>> = None;
    let mut cursor = *head;

    while let Some(ptr) = cursor {
        let uv = unsafe { ptr.as_ref() }
            .as_upvalue()
            .expect("open_upvalues list must only contain Upvalue objects");
        let loc = uv
            .borrow()
            .location()
            .expect("open_upvalues list must only contain OPEN upvalues");
        if loc == slot {
            return ptr;
        }
        if loc < slot {
            break;
        }
        prev = cursor;
        cursor = uv.borrow().open_next;
    }

    let new_ptr = heap.alloc_upvalue(slot);
    {
        let uv = unsafe { new_ptr.as_ref() }.as_upvalue().unwrap();
        uv.borrow_mut().open_next = cursor;
    }
    match prev {
        Some(p) => {
            let puv = unsafe { p.as_ref() }.as_upvalue().unwrap();
            puv.borrow_mut().open_next = Some(new_ptr);
        }
        None => *head = Some(new_ptr),
    }
    new_ptr
}

/// Closes every open upvalue whose `location >= boundary`, copying the
/// current stack value into it (spec §4.2 `close(boundary)`).
pub fn close(heap_stack: &[Value], head: &mut Option<NonNull<Obj>>, boundary: usize) {
    while let Some(ptr) = *head {
        let uv = unsafe { ptr.as_ref() }.as_upvalue().unwrap();
        let loc = match uv.borrow().location() {
            Some(l) if l >= boundary => l,
            _ => break,
        };
        let next = uv.borrow().open_next;
        let value = heap_stack[loc];
        uv.borrow_mut().close(value);
        *head = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pseudo_core::Heap;

    #[test]
    fn capture_reuses_same_slot() {
        let mut heap = Heap::new();
        let mut head = None;
        let a = capture(&mut heap, &mut head, 5);
        let b = capture(&mut heap, &mut head, 5);
        assert_eq!(a, b);
    }

    #[test]
    fn list_stays_sorted_decreasing() {
        let mut heap = Heap::new();
        let mut head = None;
        capture(&mut heap, &mut head, 2);
        capture(&mut heap, &mut head, 8);
        capture(&mut heap, &mut head, 5);

        let mut locs = Vec::new();
        let mut cursor = head;
        while let Some(ptr) = cursor {
            let uv = unsafe { ptr.as_ref() }.as_upvalue().unwrap();
            locs.push(uv.borrow().location().unwrap());
            cursor = uv.borrow().open_next;
        }
        assert_eq!(locs, vec![8, 5, 2]);
    }

    #[test]
    fn close_removes_everything_at_or_above_boundary() {
        let mut heap = Heap::new();
        let mut head = None;
        capture(&mut heap, &mut head, 2);
        capture(&mut heap, &mut head, 8);
        capture(&mut heap, &mut head, 5);
        let stack = vec![Value::NIL; 10];

        close(&stack, &mut head, 5);

        // Only slot 2 remains open.
        let ptr = head.unwrap();
        let uv = unsafe { ptr.as_ref() }.as_upvalue().unwrap();
        assert_eq!(uv.borrow().location(), Some(2));
        assert!(uv.borrow().open_next.is_none());
    }
}
