//! Scoped event-listener registrations.
//!
//! Registering a listener may take a capability from the surface. Each
//! registration hands back a [`ListenerId`]; passing it to
//! [`ListenerRegistry::dispose`] is the only way to undo it. Owners keep
//! their ids and dispose them newest first.

use tracing::{debug, warn};

use crate::surface::{Capability, Surface};
use crate::{AsciiscapeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Resize,
    Keys,
    Pointer,
    Visibility,
}

impl ListenerKind {
    /// Capability the surface must grant before events arrive.
    pub fn capability(&self) -> Option<Capability> {
        match self {
            ListenerKind::Pointer => Some(Capability::PointerEvents),
            ListenerKind::Visibility => Some(Capability::FocusEvents),
            ListenerKind::Resize | ListenerKind::Keys => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug)]
struct Registration {
    id: ListenerId,
    kind: ListenerKind,
}

#[derive(Debug, Default)]
pub struct ListenerRegistry {
    active: Vec<Registration>,
    next_id: u64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: Surface>(&mut self, surface: &mut S, kind: ListenerKind) -> Result<ListenerId> {
        if let Some(capability) = kind.capability() {
            surface.acquire(capability).map_err(|e| {
                AsciiscapeError::Listener(format!("{:?} listener: {}", kind, e))
            })?;
        }
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.active.push(Registration { id, kind });
        debug!(?kind, "listener registered");
        Ok(id)
    }

    /// Remove one registration. Returns `false` if it was already gone.
    pub fn dispose<S: Surface>(&mut self, surface: &mut S, id: ListenerId) -> bool {
        let Some(pos) = self.active.iter().position(|r| r.id == id) else {
            return false;
        };
        let registration = self.active.remove(pos);
        release(surface, registration.kind);
        true
    }

    pub fn is_registered(&self, kind: ListenerKind) -> bool {
        self.active.iter().any(|r| r.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

fn release<S: Surface>(surface: &mut S, kind: ListenerKind) {
    if let Some(capability) = kind.capability() {
        if let Err(e) = surface.release(capability) {
            warn!(?kind, "failed to release listener capability: {}", e);
        }
    }
    debug!(?kind, "listener disposed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{CapabilityEvent, HeadlessSurface};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_disposing_ids_in_reverse_releases_everything() {
        let mut surface = HeadlessSurface::new(10, 5);
        let log = surface.capability_log();
        let mut registry = ListenerRegistry::new();
        let ids: Vec<ListenerId> = [
            ListenerKind::Resize,
            ListenerKind::Keys,
            ListenerKind::Pointer,
            ListenerKind::Visibility,
        ]
        .into_iter()
        .map(|kind| registry.register(&mut surface, kind).unwrap())
        .collect();
        assert_eq!(surface.held().len(), 2);

        for id in ids.into_iter().rev() {
            assert!(registry.dispose(&mut surface, id));
        }
        assert!(registry.is_empty());
        assert!(surface.held().is_empty());
        assert_eq!(
            log.events(),
            vec![
                CapabilityEvent::Acquired(Capability::PointerEvents),
                CapabilityEvent::Acquired(Capability::FocusEvents),
                CapabilityEvent::Released(Capability::FocusEvents),
                CapabilityEvent::Released(Capability::PointerEvents),
            ]
        );
    }

    #[test]
    fn test_refused_capability_is_a_listener_error() {
        let mut surface = HeadlessSurface::new(10, 5).refusing(Capability::PointerEvents);
        let mut registry = ListenerRegistry::new();
        let err = registry.register(&mut surface, ListenerKind::Pointer).unwrap_err();
        assert!(matches!(err, AsciiscapeError::Listener(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_dispose_single() {
        let mut surface = HeadlessSurface::new(10, 5);
        let mut registry = ListenerRegistry::new();
        let id = registry.register(&mut surface, ListenerKind::Pointer).unwrap();
        assert!(registry.is_registered(ListenerKind::Pointer));
        assert!(registry.dispose(&mut surface, id));
        assert!(!registry.dispose(&mut surface, id));
        assert!(!registry.is_registered(ListenerKind::Pointer));
        assert!(surface.held().is_empty());
    }
}
