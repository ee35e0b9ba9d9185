use ethers_core::types::Address;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-address exclusive locks. Entries are dropped once nobody holds or
/// waits for them.
#[derive(Default)]
pub struct InFlight {
    locks: parking_lot::Mutex<HashMap<Address, Arc<Mutex<()>>>>,
}

pub struct InFlightGuard<'a> {
    owner: &'a InFlight,
    address: Address,
    guard: Option<OwnedMutexGuard<()>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other caller holds the lock for `address`.
    pub async fn acquire(&self, address: Address) -> InFlightGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(address).or_default())
        };
        let guard = lock.lock_owned().await;
        InFlightGuard {
            owner: self,
            address,
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().len()
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut locks = self.owner.locks.lock();
        drop(self.guard.take());
        let unused = locks
            .get(&self.address)
            .map(|lock| Arc::strong_count(lock) == 1)
            .unwrap_or(false);
        if unused {
            locks.remove(&self.address);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn same_address_is_exclusive() {
        let in_flight = InFlight::new();
        let address = Address::repeat_byte(1);

        let guard = in_flight.acquire(address).await;
        assert!(
            timeout(Duration::from_millis(50), in_flight.acquire(address))
                .await
                .is_err(),
            "second acquire must wait"
        );
        drop(guard);
        let _guard = timeout(Duration::from_millis(50), in_flight.acquire(address))
            .await
            .expect("lock was released");
    }

    #[tokio::test]
    async fn different_addresses_do_not_block() {
        let in_flight = InFlight::new();
        let _first = in_flight.acquire(Address::repeat_byte(1)).await;
        let _second = timeout(
            Duration::from_millis(50),
            in_flight.acquire(Address::repeat_byte(2)),
        )
        .await
        .expect("independent addresses");
        assert_eq!(in_flight.len(), 2);
    }

    #[tokio::test]
    async fn released_locks_are_removed() {
        let in_flight = InFlight::new();
        drop(in_flight.acquire(Address::repeat_byte(1)).await);
        assert_eq!(in_flight.len(), 0);
    }
}
