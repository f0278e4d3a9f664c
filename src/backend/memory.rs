//! In-memory property server
//!
//! Keeps windows, atoms and properties in process and answers requests the
//! way an X server would: type-checked fetches, a transfer-size limit, and
//! write errors that are reported after the fact instead of by the call.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::backend::{BackendError, FetchError, PropertyBackend, RawProperty, WindowRef};
use crate::config::Config;
use crate::prop::types::{Format, WireType};

const ROOT_WINDOW: u32 = 0x0000_0100;
const FIRST_CLIENT_WINDOW: u32 = 0x0040_0001;

/// An error raised by a queued store or delete.
#[derive(Debug)]
pub struct AsyncError {
    pub window: WindowRef,
    pub key: String,
    pub error: BackendError,
}

#[derive(Debug)]
struct StoredProperty {
    type_atom: u32,
    format: Format,
    data: Vec<u8>,
}

#[derive(Debug)]
struct State {
    atom_names: Vec<String>,
    atom_ids: HashMap<String, u32>,
    windows: HashSet<u32>,
    next_window: u32,
    properties: HashMap<(u32, u32), StoredProperty>,
    errors: Vec<AsyncError>,
}

impl State {
    fn intern(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.atom_ids.get(name) {
            return id;
        }
        self.atom_names.push(name.to_string());
        // Atom 0 is None.
        let id = self.atom_names.len() as u32;
        self.atom_ids.insert(name.to_string(), id);
        id
    }

    fn atom_name(&self, id: u32) -> Option<&str> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.atom_names.get(index).map(String::as_str)
    }
}

/// In-memory [`PropertyBackend`] with a single root window.
#[derive(Debug)]
pub struct MemoryBackend {
    state: RefCell<State>,
    max_transfer_bytes: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_limit(config.max_transfer_bytes)
    }

    /// Fetches of more than `max_transfer_bytes` fail with `PropertyOverflow`.
    pub fn with_limit(max_transfer_bytes: usize) -> Self {
        Self {
            state: RefCell::new(State {
                atom_names: Vec::new(),
                atom_ids: HashMap::new(),
                windows: HashSet::from([ROOT_WINDOW]),
                next_window: FIRST_CLIENT_WINDOW,
                properties: HashMap::new(),
                errors: Vec::new(),
            }),
            max_transfer_bytes,
        }
    }

    pub fn root(&self) -> WindowRef {
        WindowRef::from_raw(ROOT_WINDOW)
    }

    pub fn create_window(&self) -> WindowRef {
        let mut state = self.state.borrow_mut();
        let id = state.next_window;
        state.next_window += 1;
        state.windows.insert(id);
        debug!("Created window 0x{:x}", id);
        WindowRef::from_raw(id)
    }

    /// Destroy `window` along with its properties.
    pub fn destroy_window(&self, window: WindowRef) {
        let mut state = self.state.borrow_mut();
        state.windows.remove(&window.id());
        state.properties.retain(|(w, _), _| *w != window.id());
        debug!("Destroyed window {}", window);
    }

    /// Drain errors raised by earlier stores and deletes.
    pub fn take_errors(&self) -> Vec<AsyncError> {
        std::mem::take(&mut self.state.borrow_mut().errors)
    }

    /// Raw contents of a property, regardless of its type.
    pub fn raw_property(&self, target: WindowRef, key: &str) -> Option<RawProperty> {
        let state = self.state.borrow();
        let key_atom = *state.atom_ids.get(key)?;
        let prop = state.properties.get(&(target.id(), key_atom))?;
        let type_name = state.atom_name(prop.type_atom)?.to_string();
        Some(RawProperty::new(type_name, prop.format, prop.data.clone()))
    }

    fn queue_error(state: &mut State, window: WindowRef, key: &str, error: BackendError) {
        warn!("Request on window {} for {} failed: {}", window, key, error);
        state.errors.push(AsyncError {
            window,
            key: key.to_string(),
            error,
        });
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyBackend for MemoryBackend {
    fn fetch(&self, target: WindowRef, key: &str, wire_type: WireType) -> Result<Vec<u8>, FetchError> {
        let state = self.state.borrow();
        if !state.windows.contains(&target.id()) {
            return Err(FetchError::Transport(format!("BadWindow {}", target)));
        }
        let key_atom = state.atom_ids.get(key).ok_or(FetchError::NoSuchProperty)?;
        let prop = state
            .properties
            .get(&(target.id(), *key_atom))
            .ok_or(FetchError::NoSuchProperty)?;

        if let WireType::Named(requested) = wire_type {
            let stored = state.atom_name(prop.type_atom).unwrap_or_default();
            if stored != requested {
                return Err(FetchError::BadPropertyType {
                    requested: requested.to_string(),
                    stored: stored.to_string(),
                });
            }
        }
        if prop.data.len() > self.max_transfer_bytes {
            return Err(FetchError::PropertyOverflow {
                limit: self.max_transfer_bytes,
            });
        }
        Ok(prop.data.clone())
    }

    fn store(&self, target: WindowRef, key: &str, raw: RawProperty) -> Result<(), BackendError> {
        if raw.data.len() % raw.format.unit_bytes() != 0 {
            return Err(BackendError::BadLength {
                format: raw.format.bits(),
                len: raw.data.len(),
            });
        }
        let mut state = self.state.borrow_mut();
        let key_atom = state.intern(key);
        let type_atom = state.intern(&raw.type_name);
        if !state.windows.contains(&target.id()) {
            Self::queue_error(&mut state, target, key, BackendError::BadWindow(target.id()));
            return Ok(());
        }
        state.properties.insert(
            (target.id(), key_atom),
            StoredProperty {
                type_atom,
                format: raw.format,
                data: raw.data,
            },
        );
        Ok(())
    }

    fn delete(&self, target: WindowRef, key: &str) -> Result<(), BackendError> {
        let mut state = self.state.borrow_mut();
        if !state.windows.contains(&target.id()) {
            Self::queue_error(&mut state, target, key, BackendError::BadWindow(target.id()));
            return Ok(());
        }
        if let Some(&key_atom) = state.atom_ids.get(key) {
            state.properties.remove(&(target.id(), key_atom));
        }
        Ok(())
    }

    fn atom_id(&self, name: &str) -> Result<u32, BackendError> {
        Ok(self.state.borrow_mut().intern(name))
    }

    fn atom_name(&self, id: u32) -> Result<String, BackendError> {
        self.state
            .borrow()
            .atom_name(id)
            .map(str::to_string)
            .ok_or(BackendError::UnknownAtom(id))
    }

    fn window_handle(&self, id: u32) -> Result<WindowRef, BackendError> {
        if self.state.borrow().windows.contains(&id) {
            Ok(WindowRef::from_raw(id))
        } else {
            Err(BackendError::BadWindow(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: &[u8] = b"\x01\x02\x03\x04\x05\x06\x07\x08";

    #[test]
    fn test_property_lifecycle() {
        let backend = MemoryBackend::new();
        let root = backend.root();
        let asdf = WireType::Named("ASDF");
        let ghjk = WireType::Named("GHJK");

        assert_eq!(backend.fetch(root, "ASDF", asdf), Err(FetchError::NoSuchProperty));

        backend
            .store(root, "ASDF", RawProperty::new("GHJK", Format::ThirtyTwo, DATA.to_vec()))
            .unwrap();
        assert!(matches!(
            backend.fetch(root, "ASDF", asdf),
            Err(FetchError::BadPropertyType { .. })
        ));

        for format in [Format::Eight, Format::Sixteen, Format::ThirtyTwo] {
            backend
                .store(root, "ASDF", RawProperty::new("GHJK", format, DATA.to_vec()))
                .unwrap();
            assert_eq!(backend.fetch(root, "ASDF", ghjk).unwrap(), DATA);
            assert_eq!(backend.raw_property(root, "ASDF").unwrap().format, format);
        }

        backend.delete(root, "ASDF").unwrap();
        assert_eq!(backend.fetch(root, "ASDF", ghjk), Err(FetchError::NoSuchProperty));
    }

    #[test]
    fn test_any_type_matches_everything() {
        let backend = MemoryBackend::new();
        let root = backend.root();
        backend
            .store(root, "ASDF", RawProperty::new("GHJK", Format::Eight, DATA.to_vec()))
            .unwrap();
        assert_eq!(backend.fetch(root, "ASDF", WireType::Any).unwrap(), DATA);
    }

    #[test]
    fn test_empty_property() {
        let backend = MemoryBackend::new();
        let window = backend.create_window();
        backend
            .store(window, "ASDF", RawProperty::new("GHJK", Format::ThirtyTwo, Vec::new()))
            .unwrap();
        assert_eq!(backend.fetch(window, "ASDF", WireType::Named("GHJK")).unwrap(), b"");
        assert!(matches!(
            backend.fetch(window, "ASDF", WireType::Named("ASDF")),
            Err(FetchError::BadPropertyType { .. })
        ));
    }

    #[test]
    fn test_destroyed_window() {
        let backend = MemoryBackend::new();
        let window = backend.create_window();
        backend.destroy_window(window);
        assert!(matches!(
            backend.fetch(window, "ASDF", WireType::Named("ASDF")),
            Err(FetchError::Transport(_))
        ));
        assert!(backend.window_handle(window.id()).is_err());

        backend
            .store(window, "ASDF", RawProperty::new("GHJK", Format::Eight, DATA.to_vec()))
            .unwrap();
        backend.delete(window, "ASDF").unwrap();
        let errors = backend.take_errors();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0].error, BackendError::BadWindow(_)));
        assert!(backend.take_errors().is_empty());
    }

    #[test]
    fn test_limit_from_config() {
        let config = Config {
            max_transfer_bytes: 8,
            ..Config::default()
        };
        let backend = MemoryBackend::from_config(&config);
        let root = backend.root();
        backend
            .store(root, "ASDF", RawProperty::new("GHJK", Format::ThirtyTwo, DATA.to_vec()))
            .unwrap();
        assert_eq!(backend.fetch(root, "ASDF", WireType::Named("GHJK")).unwrap(), DATA);
        backend
            .store(root, "ASDF", RawProperty::new("GHJK", Format::ThirtyTwo, vec![0; 12]))
            .unwrap();
        assert_eq!(
            backend.fetch(root, "ASDF", WireType::Named("GHJK")),
            Err(FetchError::PropertyOverflow { limit: 8 })
        );
    }

    #[test]
    fn test_transfer_limit() {
        let backend = MemoryBackend::with_limit(1024);
        let root = backend.root();
        backend
            .store(root, "ASDF", RawProperty::new("GHJK", Format::ThirtyTwo, vec![0; 512 * 1024]))
            .unwrap();
        assert_eq!(
            backend.fetch(root, "ASDF", WireType::Named("GHJK")),
            Err(FetchError::PropertyOverflow { limit: 1024 })
        );
    }

    #[test]
    fn test_misaligned_store_is_rejected() {
        let backend = MemoryBackend::new();
        let err = backend
            .store(backend.root(), "ASDF", RawProperty::new("GHJK", Format::ThirtyTwo, vec![0; 6]))
            .unwrap_err();
        assert!(matches!(err, BackendError::BadLength { format: 32, len: 6 }));
    }

    #[test]
    fn test_atoms() {
        let backend = MemoryBackend::new();
        let a = backend.atom_id("ASDF").unwrap();
        let b = backend.atom_id("GHJK").unwrap();
        assert_ne!(a, b);
        assert_ne!(a, 0);
        assert_eq!(backend.atom_id("ASDF").unwrap(), a);
        assert_eq!(backend.atom_name(b).unwrap(), "GHJK");
        assert!(matches!(backend.atom_name(0), Err(BackendError::UnknownAtom(0))));
    }

    #[test]
    fn test_window_handles() {
        let backend = MemoryBackend::new();
        let window = backend.create_window();
        assert_eq!(backend.window_handle(window.id()).unwrap(), window);
        assert_eq!(backend.window_handle(backend.root().id()).unwrap(), backend.root());
        assert!(matches!(backend.window_handle(0), Err(BackendError::BadWindow(0))));
    }
}
