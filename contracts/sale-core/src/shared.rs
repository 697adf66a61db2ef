use std::fmt::Debug;
use std::sync::Arc;

use casper_types::{U256, U512};
use parking_lot::Mutex;

use crate::error::Result;
use crate::purchase::{self, Quote, Receipt};
use crate::settlement::Settlement;
use crate::state::{SaleConfig, SaleState};

/// A sale that many threads may buy from.
///
/// Every purchase holds the sale's lock from pricing through settlement to
/// the state update, so each one sees the `total_sold` left by the previous
/// one. Clones share the same sale.
#[derive(Debug)]
pub struct SharedSale<A> {
    state: Arc<Mutex<SaleState<A>>>,
}

impl<A> Clone for SharedSale<A> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<A: Clone + Debug> SharedSale<A> {
    pub fn new(config: SaleConfig<A>) -> Result<Self> {
        Ok(Self::from_state(SaleState::new(config)?))
    }

    pub fn from_state(state: SaleState<A>) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Buy `amount` units. `settlement` runs while the sale is locked.
    pub fn purchase<S>(
        &self,
        buyer: A,
        amount: U256,
        payment: U512,
        now: u64,
        settlement: &mut S,
    ) -> Result<Receipt<A>>
    where
        S: Settlement<A> + ?Sized,
    {
        let mut state = self.state.lock();
        purchase::purchase(&mut *state, buyer, amount, payment, now, settlement)
    }

    pub fn quote(&self, amount: U256) -> Result<Quote> {
        purchase::quote(&*self.state.lock(), amount)
    }

    pub fn total_sold(&self) -> U256 {
        self.state.lock().total_sold()
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> SaleState<A> {
        self.state.lock().clone()
    }
}
