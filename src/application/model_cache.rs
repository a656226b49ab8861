use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::info;

use crate::application::ports::PoseEnginePort;
use crate::domain::{errors::DomainResult, model::ModelVariant};

struct Slot {
    variant: ModelVariant,
    engine: Option<Arc<dyn PoseEnginePort>>,
    // Serializa las cargas de esta variante.
    loading: Arc<Mutex<()>>,
}

/// Caché acotada de motores cargados, indexada por variante.
/// Expulsa el menos usado recientemente cuando se supera la capacidad.
pub struct ModelCache {
    capacity: usize,
    // El frente es el más reciente. Puede contener huecos aún sin motor.
    slots: Mutex<VecDeque<Slot>>,
}

impl ModelCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            slots: Mutex::new(VecDeque::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Número de motores cargados.
    pub fn len(&self) -> usize {
        self.slots.lock().iter().filter(|s| s.engine.is_some()).count()
    }

    pub fn contains(&self, variant: ModelVariant) -> bool {
        self.slots
            .lock()
            .iter()
            .any(|s| s.variant == variant && s.engine.is_some())
    }

    /// Devuelve el motor en caché o lo carga con `load`.
    ///
    /// El mapa sólo se bloquea para buscar y reordenar. La carga se hace con el
    /// lock de la variante: dos peticiones simultáneas del mismo modelo no lo
    /// cargan dos veces, y las demás variantes siguen respondiendo mientras tanto.
    pub fn get_or_load<F>(&self, variant: ModelVariant, load: F) -> DomainResult<Arc<dyn PoseEnginePort>>
    where
        F: FnOnce() -> DomainResult<Arc<dyn PoseEnginePort>>,
    {
        let loading = {
            let mut slots = self.slots.lock();
            if let Some(engine) = Self::touch(&mut slots, variant) {
                return Ok(engine);
            }
            match slots.iter().find(|s| s.variant == variant) {
                Some(slot) => slot.loading.clone(),
                None => {
                    let loading = Arc::new(Mutex::new(()));
                    slots.push_front(Slot {
                        variant,
                        engine: None,
                        loading: loading.clone(),
                    });
                    loading
                }
            }
        };

        let _guard = loading.lock();
        // Otra petición pudo terminar la carga mientras esperábamos.
        if let Some(engine) = Self::touch(&mut self.slots.lock(), variant) {
            return Ok(engine);
        }

        match load() {
            Ok(engine) => {
                let mut slots = self.slots.lock();
                let pos = slots.iter().position(|s| s.variant == variant);
                let mut slot = pos.and_then(|p| slots.remove(p)).unwrap_or(Slot {
                    variant,
                    engine: None,
                    loading: loading.clone(),
                });
                slot.engine = Some(engine.clone());
                slots.push_front(slot);
                self.trim(&mut slots);
                Ok(engine)
            }
            Err(e) => {
                let mut slots = self.slots.lock();
                slots.retain(|s| {
                    !(s.variant == variant && s.engine.is_none() && Arc::ptr_eq(&s.loading, &loading))
                });
                Err(e)
            }
        }
    }

    pub fn evict(&self, variant: ModelVariant) -> bool {
        let mut slots = self.slots.lock();
        let before = slots.len();
        slots.retain(|s| s.variant != variant);
        before != slots.len()
    }

    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    /// Si la variante está cargada, la pasa al frente y devuelve el motor.
    fn touch(slots: &mut VecDeque<Slot>, variant: ModelVariant) -> Option<Arc<dyn PoseEnginePort>> {
        let pos = slots
            .iter()
            .position(|s| s.variant == variant && s.engine.is_some())?;
        let slot = slots.remove(pos)?;
        let engine = slot.engine.clone();
        slots.push_front(slot);
        engine
    }

    fn trim(&self, slots: &mut VecDeque<Slot>) {
        while slots.iter().filter(|s| s.engine.is_some()).count() > self.capacity {
            let Some(pos) = slots.iter().rposition(|s| s.engine.is_some()) else {
                break;
            };
            if let Some(evicted) = slots.remove(pos) {
                info!("ModelCache: expulsado {} (capacidad {})", evicted.variant, self.capacity);
            }
        }
    }
}
