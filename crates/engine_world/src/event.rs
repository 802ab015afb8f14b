//! Synchronous multicast event channels.
//!
//! A [`Signal`] delivers each fired value to every connected handler, in
//! connection order, on the caller's stack. Delivery iterates over a copy of
//! the handler list taken at fire time, so handlers may connect or disconnect
//! (themselves or others) while a fire is in progress. A handler disconnected
//! mid-fire still receives the value that fire is delivering.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use engine_component::{ComponentTypeId, EntityId, GroupId};

type Handler<T> = Rc<dyn Fn(&T)>;

struct Slots<T> {
    next_id: Cell<u64>,
    handlers: RefCell<Vec<(u64, Handler<T>)>>,
}

/// Type-erased view of a signal's handler list, held weakly by [`Connection`].
trait Disconnect {
    fn disconnect(&self, id: u64);
    fn is_connected(&self, id: u64) -> bool;
}

impl<T> Disconnect for Slots<T> {
    fn disconnect(&self, id: u64) {
        self.handlers.borrow_mut().retain(|(slot, _)| *slot != id);
    }

    fn is_connected(&self, id: u64) -> bool {
        self.handlers.borrow().iter().any(|(slot, _)| *slot == id)
    }
}

/// An ordered, synchronous publish/subscribe channel carrying `T`.
pub struct Signal<T> {
    slots: Rc<Slots<T>>,
}

impl<T: 'static> Signal<T> {
    /// Create a signal with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Rc::new(Slots {
                next_id: Cell::new(1),
                handlers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Connect a handler. It runs after every handler connected before it.
    pub fn connect(&self, handler: impl Fn(&T) + 'static) -> Connection {
        let id = self.slots.next_id.get();
        self.slots.next_id.set(id + 1);
        let handler: Handler<T> = Rc::new(handler);
        self.slots.handlers.borrow_mut().push((id, handler));

        let slots: Rc<dyn Disconnect> = self.slots.clone();
        Connection {
            id,
            slots: Rc::downgrade(&slots),
        }
    }

    /// Invoke every currently connected handler with `value`.
    pub fn fire(&self, value: &T) {
        let handlers: Vec<Handler<T>> = self
            .slots
            .handlers
            .borrow()
            .iter()
            .map(|(_, handler)| Rc::clone(handler))
            .collect();
        for handler in handlers {
            handler(value);
        }
    }

    /// Disconnect every handler.
    pub fn disconnect_all(&self) {
        self.slots.handlers.borrow_mut().clear();
    }

    /// Returns the number of connected handlers.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.slots.handlers.borrow().len()
    }
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.slots.handlers.borrow().len())
            .finish()
    }
}

/// A handle to one connected handler.
///
/// Dropping the handle does not disconnect; call [`Connection::disconnect`].
pub struct Connection {
    id: u64,
    slots: Weak<dyn Disconnect>,
}

impl Connection {
    /// Disconnect the handler. Safe to call repeatedly, during delivery, and
    /// after the signal itself is gone.
    pub fn disconnect(&self) {
        if let Some(slots) = self.slots.upgrade() {
            slots.disconnect(self.id);
        }
    }

    /// Returns `true` while the handler is still connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.slots
            .upgrade()
            .is_some_and(|slots| slots.is_connected(self.id))
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// A lifecycle change observed by the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorldEvent {
    /// A new entity was spawned (or resurrected by a revert).
    EntitySpawned(EntityId),
    /// An entity was despawned.
    EntityDespawned(EntityId),
    /// A component was attached to an entity (or restored by a revert).
    ComponentAdded(EntityId, ComponentTypeId),
    /// A component was detached from an entity.
    ComponentRemoved(EntityId, ComponentTypeId),
    /// An entity joined a group.
    EntityAddedToGroup(EntityId, GroupId),
    /// An entity left a group.
    EntityRemovedFromGroup(EntityId, GroupId),
}

/// The world's observer surface: one signal per event kind, plus `any`,
/// which carries every event after its kind-specific signal has fired.
#[derive(Debug, Default)]
pub struct WorldEvents {
    /// Fired with the spawned entity.
    pub entity_spawned: Signal<EntityId>,
    /// Fired with the despawned entity.
    pub entity_despawned: Signal<EntityId>,
    /// Fired with the entity and the attached component.
    pub component_added: Signal<(EntityId, ComponentTypeId)>,
    /// Fired with the entity and the detached component.
    pub component_removed: Signal<(EntityId, ComponentTypeId)>,
    /// Fired with the entity and the group it joined.
    pub entity_added_to_group: Signal<(EntityId, GroupId)>,
    /// Fired with the entity and the group it left.
    pub entity_removed_from_group: Signal<(EntityId, GroupId)>,
    /// Fired for every event.
    pub any: Signal<WorldEvent>,
}

impl WorldEvents {
    pub(crate) fn emit(&self, event: WorldEvent) {
        match event {
            WorldEvent::EntitySpawned(e) => self.entity_spawned.fire(&e),
            WorldEvent::EntityDespawned(e) => self.entity_despawned.fire(&e),
            WorldEvent::ComponentAdded(e, c) => self.component_added.fire(&(e, c)),
            WorldEvent::ComponentRemoved(e, c) => self.component_removed.fire(&(e, c)),
            WorldEvent::EntityAddedToGroup(e, g) => self.entity_added_to_group.fire(&(e, g)),
            WorldEvent::EntityRemovedFromGroup(e, g) => {
                self.entity_removed_from_group.fire(&(e, g));
            }
        }
        self.any.fire(&event);
    }
}
