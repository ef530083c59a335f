//! The object heap: allocation and the intrusive linked list of all live
//! objects (spec §3.2, §3.3).
//!
//! Every heap object carries a three-field header — type tag, GC-mark bit,
//! and a `next` pointer threading it into a process-wide list — and
//! allocation prepends to that list. GC scheduling, the write barrier, and
//! the reachability walk are deliberately left to the embedder (spec §1); this
//! module only provides the mechanics a mark-sweep pass needs: `iter()` to
//! visit every live object and `sweep()` to free the unmarked ones.
//!
//! Objects are heap-allocated with `Box::into_raw` and referenced afterwards
//! through raw pointers (`Value::obj` stores one directly), because the VM's
//! object graph is not a tree: a class's methods, a closure's upvalues, an
//! instance's class — these are shared, cyclic references that `Box`/`Rc`
//! ownership can't express without leaking or runtime borrow panics. This is
//! the same trade the teacher's runtime makes, there in service of an FFI
//! boundary; here in service of the heap's intrusive linked list. Safety is
//! upheld by a single invariant: `sweep` never frees an object whose `marked`
//! bit a full mark pass set, and the VM is responsible for marking every root
//! spec §9 names (value stack, frames, open upvalues, globals, inline
//! caches, the current exception, the chunk's constants) before sweeping.

use crate::objects::*;
use std::cell::Cell;
use std::ptr::NonNull;

pub struct Obj {
    pub tag: ObjType,
    pub marked: Cell<bool>,
    pub next: Cell<Option<NonNull<Obj>>>,
    pub payload: ObjPayload,
}

macro_rules! accessor {
    ($name:ident, $variant:ident, $t:ty) => {
        pub fn $name(&self) -> Option<&$t> {
            match &self.payload {
                ObjPayload::$variant(v) => Some(v),
                _ => None,
            }
        }
    };
}

impl Obj {
    accessor!(as_string, String, StringObj);
    accessor!(as_array, Array, std::cell::RefCell<ArrayObj>);
    accessor!(as_dict, Dict, std::cell::RefCell<DictObj>);
    accessor!(as_range, Range, Cell<RangeObj>);
    accessor!(as_function, Function, FunctionObj);
    accessor!(as_upvalue, Upvalue, std::cell::RefCell<UpvalueObj>);
    accessor!(as_closure, Closure, ClosureObj);
    accessor!(as_class, Class, std::cell::RefCell<ClassObj>);
    accessor!(as_instance, Instance, std::cell::RefCell<InstanceObj>);
    accessor!(as_bound_method, BoundMethod, BoundMethodObj);
    accessor!(as_generator, Generator, std::cell::RefCell<GeneratorObj>);
    accessor!(as_promise, Promise, std::cell::RefCell<PromiseObj>);
    accessor!(as_module, Module, std::cell::RefCell<ModuleObj>);
    accessor!(as_bytes, Bytes, std::cell::RefCell<BytesObj>);
    accessor!(as_native, Native, NativeObj);
}

/// Live-object counters for `report` / `set_debug_mode` output (SPEC_FULL.md
/// §B.2/§C), grounded on the teacher's `memory_stats.rs` registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapStats {
    pub live_objects: usize,
    pub bytes_allocated: usize,
    pub sweeps: usize,
    pub freed_total: usize,
}

pub struct Heap {
    head: Option<NonNull<Obj>>,
    stats: HeapStats,
}

impl Heap {
    pub fn new() -> Self {
        Heap {
            head: None,
            stats: HeapStats::default(),
        }
    }

    pub fn stats(&self) -> HeapStats {
        self.stats
    }

    fn push(&mut self, tag: ObjType, payload: ObjPayload) -> NonNull<Obj> {
        let obj = Box::new(Obj {
            tag,
            marked: Cell::new(false),
            next: Cell::new(self.head),
            payload,
        });
        let ptr = NonNull::from(Box::leak(obj));
        self.head = Some(ptr);
        self.stats.live_objects += 1;
        self.stats.bytes_allocated += std::mem::size_of::<Obj>();
        ptr
    }

    pub fn alloc_string(&mut self, s: impl Into<Box<str>>) -> NonNull<Obj> {
        self.push(ObjType::String, ObjPayload::String(StringObj::new(s)))
    }

    pub fn alloc_array(&mut self, values: Vec<crate::value::Value>) -> NonNull<Obj> {
        self.push(
            ObjType::Array,
            ObjPayload::Array(std::cell::RefCell::new(ArrayObj::with_values(values))),
        )
    }

    pub fn alloc_dict(&mut self) -> NonNull<Obj> {
        self.push(
            ObjType::Dict,
            ObjPayload::Dict(std::cell::RefCell::new(DictObj::new())),
        )
    }

    pub fn alloc_range(&mut self, start: i32, end: i32) -> NonNull<Obj> {
        self.push(
            ObjType::Range,
            ObjPayload::Range(Cell::new(RangeObj::new(start, end))),
        )
    }

    pub fn alloc_function(&mut self, f: FunctionObj) -> NonNull<Obj> {
        self.push(ObjType::Function, ObjPayload::Function(f))
    }

    pub fn alloc_upvalue(&mut self, slot: usize) -> NonNull<Obj> {
        self.push(
            ObjType::Upvalue,
            ObjPayload::Upvalue(std::cell::RefCell::new(UpvalueObj::new_open(slot))),
        )
    }

    pub fn alloc_closure(&mut self, c: ClosureObj) -> NonNull<Obj> {
        self.push(ObjType::Closure, ObjPayload::Closure(c))
    }

    pub fn alloc_class(&mut self, name: impl Into<Box<str>>) -> NonNull<Obj> {
        self.push(
            ObjType::Class,
            ObjPayload::Class(std::cell::RefCell::new(ClassObj::new(name))),
        )
    }

    pub fn alloc_instance(&mut self, class: NonNull<Obj>) -> NonNull<Obj> {
        self.push(
            ObjType::Instance,
            ObjPayload::Instance(std::cell::RefCell::new(InstanceObj::new(class))),
        )
    }

    pub fn alloc_bound_method(&mut self, b: BoundMethodObj) -> NonNull<Obj> {
        self.push(ObjType::BoundMethod, ObjPayload::BoundMethod(b))
    }

    pub fn alloc_generator(&mut self, g: GeneratorObj) -> NonNull<Obj> {
        self.push(
            ObjType::Generator,
            ObjPayload::Generator(std::cell::RefCell::new(g)),
        )
    }

    pub fn alloc_promise(&mut self) -> NonNull<Obj> {
        self.push(
            ObjType::Promise,
            ObjPayload::Promise(std::cell::RefCell::new(PromiseObj::pending())),
        )
    }

    pub fn alloc_module(&mut self, m: ModuleObj) -> NonNull<Obj> {
        self.push(ObjType::Module, ObjPayload::Module(std::cell::RefCell::new(m)))
    }

    pub fn alloc_bytes(&mut self, b: BytesObj) -> NonNull<Obj> {
        self.push(ObjType::Bytes, ObjPayload::Bytes(std::cell::RefCell::new(b)))
    }

    pub fn alloc_native(&mut self, n: NativeObj) -> NonNull<Obj> {
        self.push(ObjType::Native, ObjPayload::Native(n))
    }

    /// Visits every object currently on the list, in allocation order (most
    /// recently allocated first, since allocation prepends).
    pub fn iter(&self) -> HeapIter {
        HeapIter { next: self.head }
    }

    /// Clears every object's mark bit ahead of a fresh mark phase.
    pub fn unmark_all(&self) {
        for obj in self.iter() {
            unsafe { obj.as_ref().marked.set(false) };
        }
    }

    pub fn mark(&self, ptr: NonNull<Obj>) {
        unsafe { ptr.as_ref().marked.set(true) };
    }

    /// Frees every unmarked object, re-threading the list around the
    /// survivors. The caller must have completed a full mark pass first.
    ///
    /// # Safety
    /// Every live `Value`/pointer the VM still holds into this heap must
    /// have had its referent marked before calling this, or the freed memory
    /// will be referenced after this call returns.
    pub unsafe fn sweep(&mut self) {
        let mut survivors_head: Option<NonNull<Obj>> = None;
        let mut survivors_tail: Option<NonNull<Obj>> = None;
        let mut cursor = self.head;
        let mut freed = 0usize;
        let mut live = 0usize;

        while let Some(ptr) = cursor {
            let next = unsafe { ptr.as_ref().next.get() };
            if unsafe { ptr.as_ref().marked.get() } {
                unsafe { ptr.as_ref().marked.set(false) };
                unsafe { ptr.as_ref().next.set(None) };
                match survivors_tail {
                    Some(tail) => unsafe { tail.as_ref().next.set(Some(ptr)) },
                    None => survivors_head = Some(ptr),
                }
                survivors_tail = Some(ptr);
                live += 1;
            } else {
                // Re-box and drop so the payload's destructors run.
                drop(unsafe { Box::from_raw(ptr.as_ptr()) });
                freed += 1;
            }
            cursor = next;
        }

        self.head = survivors_head;
        self.stats.sweeps += 1;
        self.stats.freed_total += freed;
        self.stats.live_objects = live;
        self.stats.bytes_allocated = live * std::mem::size_of::<Obj>();
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Heap {
    fn drop(&mut self) {
        let mut cursor = self.head;
        while let Some(ptr) = cursor {
            let next = unsafe { ptr.as_ref().next.get() };
            drop(unsafe { Box::from_raw(ptr.as_ptr()) });
            cursor = next;
        }
    }
}

pub struct HeapIter {
    next: Option<NonNull<Obj>>,
}

impl Iterator for HeapIter {
    type Item = NonNull<Obj>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = unsafe { current.as_ref().next.get() };
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_prepends_to_the_list() {
        let mut heap = Heap::new();
        let a = heap.alloc_string("a");
        let b = heap.alloc_string("b");
        let list: Vec<_> = heap.iter().collect();
        assert_eq!(list, vec![b, a]);
    }

    #[test]
    fn sweep_frees_unmarked_and_keeps_marked() {
        let mut heap = Heap::new();
        let keep = heap.alloc_string("keep");
        let _drop_me = heap.alloc_string("drop");
        heap.unmark_all();
        heap.mark(keep);
        unsafe { heap.sweep() };
        let list: Vec<_> = heap.iter().collect();
        assert_eq!(list, vec![keep]);
        assert_eq!(heap.stats().live_objects, 1);
        assert_eq!(heap.stats().freed_total, 1);
    }
}
