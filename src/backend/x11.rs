//! X11 Backend
//!
//! Property access on a live X server through x11rb.

use anyhow::{Context, Result};
use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use crate::backend::{BackendError, FetchError, PropertyBackend, RawProperty, WindowRef};
use crate::config::Config;
use crate::prop::types::WireType;

/// [`PropertyBackend`] over an X11 connection.
pub struct X11Backend<C: Connection> {
    conn: C,
    root: Window,
    max_transfer_bytes: usize,
}

impl X11Backend<RustConnection> {
    /// Connect to `display` (or `$DISPLAY`) and use its default screen.
    pub fn connect(display: Option<&str>, config: &Config) -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(display).context("Failed to connect to X server")?;
        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .context("X server has no such screen")?
            .root;
        info!("Connected to X server, screen {} root 0x{:x}", screen_num, root);
        Ok(Self::new(conn, root, config))
    }
}

impl<C: Connection> X11Backend<C> {
    pub fn new(conn: C, root: Window, config: &Config) -> Self {
        Self {
            conn,
            root,
            max_transfer_bytes: config.max_transfer_bytes,
        }
    }

    pub fn root(&self) -> WindowRef {
        WindowRef::from_raw(self.root)
    }

    fn intern(&self, name: &str) -> Result<Atom, BackendError> {
        Ok(self.conn.intern_atom(false, name.as_bytes())?.reply()?.atom)
    }

    fn transport<E: std::fmt::Display>(e: E) -> FetchError {
        FetchError::Transport(e.to_string())
    }
}

impl<C: Connection> PropertyBackend for X11Backend<C> {
    fn fetch(&self, target: WindowRef, key: &str, wire_type: WireType) -> Result<Vec<u8>, FetchError> {
        let key_atom = self.intern(key).map_err(Self::transport)?;
        let type_atom = match wire_type {
            WireType::Any => Atom::from(AtomEnum::ANY),
            WireType::Named(name) => self.intern(name).map_err(Self::transport)?,
        };

        // Lengths are in 32-bit units; anything left over is an overflow.
        let long_length = u32::try_from(self.max_transfer_bytes / 4).unwrap_or(u32::MAX);
        let reply = self
            .conn
            .get_property(false, target.id(), key_atom, type_atom, 0, long_length)
            .map_err(Self::transport)?
            .reply()
            .map_err(Self::transport)?;

        if reply.type_ == x11rb::NONE {
            return Err(FetchError::NoSuchProperty);
        }
        if type_atom != Atom::from(AtomEnum::ANY) && reply.type_ != type_atom {
            let stored = self
                .atom_name(reply.type_)
                .unwrap_or_else(|_| reply.type_.to_string());
            return Err(FetchError::BadPropertyType {
                requested: wire_type.to_string(),
                stored,
            });
        }
        if reply.bytes_after != 0 {
            return Err(FetchError::PropertyOverflow {
                limit: self.max_transfer_bytes,
            });
        }

        debug!(
            "GetProperty {} on {}: format {} {} bytes",
            key,
            target,
            reply.format,
            reply.value.len()
        );
        Ok(reply.value)
    }

    fn store(&self, target: WindowRef, key: &str, raw: RawProperty) -> Result<(), BackendError> {
        let unit = raw.format.unit_bytes();
        if raw.data.len() % unit != 0 {
            return Err(BackendError::BadLength {
                format: raw.format.bits(),
                len: raw.data.len(),
            });
        }
        let key_atom = self.intern(key)?;
        let type_atom = self.intern(&raw.type_name)?;
        let data_len = u32::try_from(raw.data.len() / unit).map_err(|_| BackendError::BadLength {
            format: raw.format.bits(),
            len: raw.data.len(),
        })?;

        // The cookie is dropped unchecked: an X error for this request shows
        // up on the event queue.
        self.conn.change_property(
            PropMode::REPLACE,
            target.id(),
            key_atom,
            type_atom,
            raw.format.bits(),
            data_len,
            &raw.data,
        )?;
        self.conn.flush()?;
        Ok(())
    }

    fn delete(&self, target: WindowRef, key: &str) -> Result<(), BackendError> {
        let key_atom = self.intern(key)?;
        self.conn.delete_property(target.id(), key_atom)?;
        self.conn.flush()?;
        Ok(())
    }

    fn atom_id(&self, name: &str) -> Result<u32, BackendError> {
        self.intern(name)
    }

    fn atom_name(&self, id: u32) -> Result<String, BackendError> {
        let reply = self.conn.get_atom_name(id)?.reply()?;
        Ok(String::from_utf8_lossy(&reply.name).into_owned())
    }

    fn window_handle(&self, id: u32) -> Result<WindowRef, BackendError> {
        if id == x11rb::NONE {
            return Err(BackendError::BadWindow(id));
        }
        match self.conn.get_geometry(id)?.reply() {
            Ok(_) => Ok(WindowRef::from_raw(id)),
            Err(ReplyError::X11Error(_)) => Err(BackendError::BadWindow(id)),
            Err(e) => Err(e.into()),
        }
    }
}
