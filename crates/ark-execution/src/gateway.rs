//! Gateway contract: the boundary between the order manager and whatever
//! actually talks to a broker (simulator, paper, live adapter).
//!
//! Calls are synchronous. `Ok(())` means the gateway accepted the request;
//! there is no asynchronous acknowledgement modelled here. Fill and status
//! reports come back separately through the strategy callbacks.

use std::fmt;

use crate::types::{EntrustId, Order};

/// A refusal reported by the gateway for a single request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayError {
    pub message: String,
}

impl GatewayError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gateway refused: {}", self.message)
    }
}

impl std::error::Error for GatewayError {}

/// Implemented by simulators and broker adapters.
pub trait OrderGateway {
    /// Submit one entrust order. The order carries its minted ids.
    fn place_order(&mut self, order: &Order) -> Result<(), GatewayError>;

    /// Cancel one entrust order by id.
    fn cancel_order(&mut self, entrust_id: EntrustId) -> Result<(), GatewayError>;
}

impl<G: OrderGateway + ?Sized> OrderGateway for Box<G> {
    fn place_order(&mut self, order: &Order) -> Result<(), GatewayError> {
        (**self).place_order(order)
    }

    fn cancel_order(&mut self, entrust_id: EntrustId) -> Result<(), GatewayError> {
        (**self).cancel_order(entrust_id)
    }
}
