use bevy_ecs::prelude::{Entity, Resource};
use glam::Vec4;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeEvent {
    ProxiesCreated { emitter: Entity, count: usize },
    ProxiesCleared { emitter: Entity, count: usize },
    /// `sample` is `None` for a coarse hit, otherwise the texel color and whether it passed the cutoff.
    ProxyHit { emitter: Entity, proxy: Entity, sample: Option<(Vec4, bool)> },
    ObjectDespawned { entity: Entity },
}

impl ProbeEvent {
    pub fn is_accepted_hit(&self) -> bool {
        matches!(self, ProbeEvent::ProxyHit { sample: None, .. } | ProbeEvent::ProxyHit { sample: Some((_, true)), .. })
    }
}

impl fmt::Display for ProbeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeEvent::ProxiesCreated { emitter, count } => {
                write!(f, "ProxiesCreated emitter={} count={}", emitter.index(), count)
            }
            ProbeEvent::ProxiesCleared { emitter, count } => {
                write!(f, "ProxiesCleared emitter={} count={}", emitter.index(), count)
            }
            ProbeEvent::ProxyHit { emitter, proxy, sample: None } => {
                write!(f, "ProxyHit emitter={} proxy={} coarse", emitter.index(), proxy.index())
            }
            ProbeEvent::ProxyHit { emitter, proxy, sample: Some((color, accepted)) } => {
                write!(
                    f,
                    "ProxyHit emitter={} proxy={} rgba=({:.3}, {:.3}, {:.3}, {:.3}) accepted={}",
                    emitter.index(),
                    proxy.index(),
                    color.x,
                    color.y,
                    color.z,
                    color.w,
                    accepted
                )
            }
            ProbeEvent::ObjectDespawned { entity } => write!(f, "ObjectDespawned entity={}", entity.index()),
        }
    }
}

#[derive(Default, Resource)]
pub struct EventBus {
    events: Vec<ProbeEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: ProbeEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<ProbeEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
