//! Per-thread execution context storage
//!
//! Every engine entry point asks for the context active on the calling
//! thread. The first request on a thread allocates a single-slot cell and
//! pins it in thread-local storage; later requests hand out the same cell,
//! so repeated get/set is a direct slot access instead of a keyed lookup.
//!
//! The slot is typed `dyn Any`, never the engine's concrete context type.
//! Clearing the slot releases the context even though the cell itself lives
//! until the thread exits.
//!
//! `CellHandle` is `!Send`: a handle obtained on one thread cannot be moved
//! to another, so a context written on thread A is never readable on B.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::descriptor::LoaderDomain;

/// Contents of a context cell
pub type ContextSlot = Option<Arc<dyn Any + Send + Sync>>;

#[derive(Default)]
struct ContextCell {
    context: RefCell<ContextSlot>,
    domain: RefCell<Option<LoaderDomain>>,
}

thread_local! {
    static CONTEXT_CELL: Rc<ContextCell> = Rc::new(ContextCell::default());
}

/// Handle to the calling thread's context cell
#[derive(Clone)]
pub struct CellHandle {
    cell: Rc<ContextCell>,
}

impl CellHandle {
    /// Read the stored context if it is of type `C`
    pub fn get<C: Any + Send + Sync>(&self) -> Option<Arc<C>> {
        let slot = self.cell.context.borrow();
        slot.as_ref()
            .and_then(|ctx| Arc::clone(ctx).downcast::<C>().ok())
    }

    /// Store a context, or clear the slot with `None`
    pub fn set<C: Any + Send + Sync>(&self, ctx: Option<Arc<C>>) {
        *self.cell.context.borrow_mut() = ctx.map(|c| c as Arc<dyn Any + Send + Sync>);
    }

    /// Store a context and return whatever was stored before
    pub fn replace(&self, ctx: ContextSlot) -> ContextSlot {
        self.cell.context.replace(ctx)
    }

    /// Whether a context is currently stored
    pub fn is_set(&self) -> bool {
        self.cell.context.borrow().is_some()
    }

    /// Whether two handles refer to the same cell
    pub fn same_cell(&self, other: &CellHandle) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl std::fmt::Debug for CellHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellHandle")
            .field("cell", &Rc::as_ptr(&self.cell))
            .field("is_set", &self.is_set())
            .finish()
    }
}

/// Get (creating on first use) the calling thread's context cell
pub fn get_context_cell() -> CellHandle {
    CONTEXT_CELL.with(|cell| CellHandle {
        cell: Rc::clone(cell),
    })
}

/// Read the context stored in `cell`
pub fn read_context<C: Any + Send + Sync>(cell: &CellHandle) -> Option<Arc<C>> {
    cell.get()
}

/// Write `ctx` into `cell`; `None` clears it
pub fn write_context<C: Any + Send + Sync>(cell: &CellHandle, ctx: Option<Arc<C>>) {
    cell.set(ctx)
}

/// Domain the calling thread resolves application types in, if one was set
pub fn thread_domain() -> Option<LoaderDomain> {
    CONTEXT_CELL.with(|cell| cell.domain.borrow().clone())
}

/// Set the calling thread's domain and return the previous one
pub fn set_thread_domain(domain: Option<LoaderDomain>) -> Option<LoaderDomain> {
    CONTEXT_CELL.with(|cell| cell.domain.replace(domain))
}
