//! Property Module
//!
//! Typed get/set of window properties on top of a [`PropertyBackend`].

pub mod codec;
pub mod error;
pub mod hints;
pub mod icons;
pub mod strut;
pub mod types;
pub mod value;

use tracing::{debug, info, warn};

use crate::backend::{FetchError, PropertyBackend, WindowRef};
use crate::config::Config;
use crate::prop::error::PropError;
use crate::prop::types::{REGISTRY, TypeRegistry, TypeSpec};
use crate::prop::value::PropertyValue;

/// Typed property access for one display.
pub struct PropertyStore<B> {
    backend: B,
    registry: &'static TypeRegistry,
    preview_bytes: usize,
}

impl<B: PropertyBackend> PropertyStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, &Config::default())
    }

    pub fn with_config(backend: B, config: &Config) -> Self {
        Self {
            backend,
            registry: &REGISTRY,
            preview_bytes: config.preview_bytes,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Read `key` from `target` as `spec`.
    ///
    /// Returns `Ok(None)` when the property is missing, stored with a
    /// different type, or the window is gone, and also when an icon property
    /// holds no image. Oversized properties and data that does not decode as
    /// `spec` are errors.
    pub fn get(&self, target: WindowRef, key: &str, spec: impl Into<TypeSpec>) -> Result<Option<PropertyValue>, PropError> {
        let spec = spec.into();
        let descriptor = self.registry.descriptor(spec.prop_type());

        let data = match self.backend.fetch(target, key, descriptor.wire_type) {
            Ok(data) => data,
            Err(FetchError::PropertyOverflow { limit }) => {
                warn!("Property {} on window {} is larger than {} bytes", key, target, limit);
                return Err(PropError::Overflow {
                    key: key.to_string(),
                    limit,
                });
            }
            Err(e) => {
                info!(
                    "Missing window or missing property or wrong property type {} ({}): {}",
                    key, spec, e
                );
                return Ok(None);
            }
        };

        match codec::decode(&self.backend, spec, &data) {
            Ok(value) => {
                debug!("Read {} ({}) from window {}: {} bytes", key, spec, target, data.len());
                Ok(value)
            }
            Err(source) => {
                warn!(
                    "Error parsing property {} (type {}); this may be a misbehaving application. Data: {}",
                    key,
                    spec,
                    preview(&data, self.preview_bytes)
                );
                Err(PropError::Decode {
                    key: key.to_string(),
                    spec,
                    source,
                })
            }
        }
    }

    /// Write `value` to `key` on `target` as `spec`.
    ///
    /// The store is queued without waiting for the server: only failures to
    /// issue the request are returned here.
    pub fn set(
        &self,
        target: WindowRef,
        key: &str,
        spec: impl Into<TypeSpec>,
        value: impl Into<PropertyValue>,
    ) -> Result<(), PropError> {
        let spec = spec.into();
        let value = value.into();
        let raw = codec::encode(&self.backend, spec, &value).map_err(|source| PropError::Encode {
            key: key.to_string(),
            spec,
            source,
        })?;
        debug!(
            "Writing {} ({}) to window {}: type {} format {} {} bytes",
            key,
            spec,
            target,
            raw.type_name,
            raw.format.bits(),
            raw.data.len()
        );
        self.backend.store(target, key, raw)?;
        Ok(())
    }

    pub fn delete(&self, target: WindowRef, key: &str) -> Result<(), PropError> {
        debug!("Deleting {} from window {}", key, target);
        self.backend.delete(target, key)?;
        Ok(())
    }
}

/// Render the first `limit` bytes of `data` for a log line.
fn preview(data: &[u8], limit: usize) -> String {
    let head = &data[..data.len().min(limit)];
    let suffix = if data.len() > limit { "[...]" } else { "" };
    let printable = head.iter().all(|&b| b == 0 || b.is_ascii_graphic() || b == b' ');
    if printable {
        format!("{:?}{}", String::from_utf8_lossy(head), suffix)
    } else {
        let hex: String = head.iter().map(|b| format!("{:02x}", b)).collect();
        format!("{}{}", hex, suffix)
    }
}
