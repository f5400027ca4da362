//! Lazily opened, shared i2c bus handle.
//!
//! The bus is opened on first use and the same connection is handed to
//! every later caller. The cache is an ordinary owned value: the daemon
//! builds one at startup and the service borrows it for each transfer.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::hw_trait::{I2c, I2cOpener};
use crate::tracing::prelude::*;
use crate::types::I2cAddress;

/// Board revision selecting which i2c bus the header is wired to.
///
/// The original 256 MB Model B (revision 1) routes the header i2c pins to
/// bus 0; every later board uses bus 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusVersion(u8);

impl BusVersion {
    pub const fn new(version: u8) -> Self {
        Self(version)
    }

    /// Bus number for this revision.
    pub const fn bus_number(self) -> u8 {
        match self.0 {
            1 => 0,
            _ => 1,
        }
    }
}

impl Default for BusVersion {
    fn default() -> Self {
        Self(2)
    }
}

/// Shared reference to an open bus.
///
/// Clones refer to the same connection. Transfers through any clone are
/// serialized on the connection's lock.
#[derive(Clone)]
pub struct BusHandle {
    bus: u8,
    inner: Arc<tokio::sync::Mutex<Box<dyn I2c>>>,
}

impl BusHandle {
    fn new(bus: u8, i2c: Box<dyn I2c>) -> Self {
        Self {
            bus,
            inner: Arc::new(tokio::sync::Mutex::new(i2c)),
        }
    }

    /// Bus number this handle was opened on.
    pub fn bus(&self) -> u8 {
        self.bus
    }

    /// Whether two handles share one connection.
    pub fn ptr_eq(&self, other: &BusHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Write one byte to the device at `address`.
    pub async fn write_byte(&self, address: I2cAddress, value: u8) -> Result<()> {
        self.inner.lock().await.write_byte(address, value).await
    }

    /// Read one byte from the device at `address`.
    pub async fn read_byte(&self, address: I2cAddress) -> Result<u8> {
        self.inner.lock().await.read_byte(address).await
    }
}

impl std::fmt::Debug for BusHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusHandle").field("bus", &self.bus).finish()
    }
}

/// Single-slot cache holding the one open bus.
pub struct BusCache {
    opener: Box<dyn I2cOpener>,
    slot: Mutex<Option<BusHandle>>,
}

impl BusCache {
    /// Create an empty cache. Nothing is opened until [`BusCache::acquire`].
    pub fn new(opener: impl I2cOpener + 'static) -> Self {
        Self {
            opener: Box::new(opener),
            slot: Mutex::new(None),
        }
    }

    /// Return the open bus, opening it first if the cache is empty.
    ///
    /// The first successful open fixes the bus for the life of the cache.
    /// Asking for a different bus afterwards fails with
    /// [`Error::BusConflict`] and leaves the open handle in place. A failed
    /// open leaves the cache empty.
    pub fn acquire(&self, version: BusVersion) -> Result<BusHandle> {
        let requested = version.bus_number();
        let mut slot = self.slot.lock();

        if let Some(handle) = slot.as_ref() {
            if handle.bus() == requested {
                return Ok(handle.clone());
            }
            warn!(
                open = handle.bus(),
                requested, "Refusing to open a second i2c bus"
            );
            return Err(Error::BusConflict {
                open: handle.bus(),
                requested,
            });
        }

        debug!(bus = requested, "Opening i2c bus");
        let handle = BusHandle::new(requested, self.opener.open(requested)?);
        *slot = Some(handle.clone());
        info!(bus = requested, "i2c bus ready");
        Ok(handle)
    }

    /// The open bus, if any, without opening one.
    pub fn current(&self) -> Option<BusHandle> {
        self.slot.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw_trait::mock::{I2cOp, MockOpener};
    use test_case::test_case;

    #[test_case(1, 0 ; "revision one uses bus zero")]
    #[test_case(2, 1 ; "revision two uses bus one")]
    #[test_case(0, 1 ; "zero falls through")]
    #[test_case(255, 1 ; "anything else falls through")]
    fn test_bus_number(version: u8, bus: u8) {
        assert_eq!(BusVersion::new(version).bus_number(), bus);
    }

    #[test]
    fn test_empty_until_acquired() {
        let opener = MockOpener::new();
        let cache = BusCache::new(opener.clone());

        assert!(cache.current().is_none());
        assert_eq!(opener.open_count(), 0);
    }

    #[test]
    fn test_acquire_is_idempotent() {
        let opener = MockOpener::new();
        let cache = BusCache::new(opener.clone());

        let first = cache.acquire(BusVersion::default()).unwrap();
        let second = cache.acquire(BusVersion::default()).unwrap();

        assert!(first.ptr_eq(&second));
        assert_eq!(opener.open_count(), 1);
        assert!(cache.current().unwrap().ptr_eq(&first));
    }

    #[test]
    fn test_equivalent_versions_share_handle() {
        let opener = MockOpener::new();
        let cache = BusCache::new(opener.clone());

        let a = cache.acquire(BusVersion::new(2)).unwrap();
        let b = cache.acquire(BusVersion::new(3)).unwrap();

        assert!(a.ptr_eq(&b));
        assert_eq!(opener.open_count(), 1);
    }

    #[test]
    fn test_first_open_wins_and_conflict_is_reported() {
        let opener = MockOpener::new();
        let cache = BusCache::new(opener.clone());

        let first = cache.acquire(BusVersion::new(1)).unwrap();
        assert_eq!(first.bus(), 0);

        let err = cache.acquire(BusVersion::new(2)).unwrap_err();
        assert!(matches!(
            err,
            Error::BusConflict {
                open: 0,
                requested: 1
            }
        ));

        let current = cache.current().unwrap();
        assert_eq!(current.bus(), 0);
        assert!(current.ptr_eq(&first));
        assert_eq!(opener.open_count(), 1);
    }

    #[test]
    fn test_failed_open_leaves_cache_empty() {
        let cache = BusCache::new(MockOpener::failing());

        let err = cache.acquire(BusVersion::default()).unwrap_err();
        assert!(matches!(err, Error::Hardware(_)));
        assert!(cache.current().is_none());
    }

    #[tokio::test]
    async fn test_clones_share_connection() {
        let opener = MockOpener::new();
        let cache = BusCache::new(opener.clone());
        let addr = I2cAddress::new(0x20).unwrap();

        let writer = cache.acquire(BusVersion::default()).unwrap();
        let reader = cache.acquire(BusVersion::default()).unwrap();

        writer.write_byte(addr, 0x5A).await.unwrap();
        assert_eq!(reader.read_byte(addr).await.unwrap(), 0x5A);
        assert_eq!(
            opener.ops(),
            vec![
                I2cOp::Write {
                    bus: 1,
                    address: 0x20,
                    value: 0x5A
                },
                I2cOp::Read {
                    bus: 1,
                    address: 0x20
                },
            ]
        );
    }
}
