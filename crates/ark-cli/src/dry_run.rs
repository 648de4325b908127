use ark_execution::{EntrustId, GatewayError, Order, OrderGateway};
use tracing::debug;

/// Accepts every order and cancel, keeps what it was sent.
#[derive(Debug, Default)]
pub struct DryRunGateway {
    orders: Vec<Order>,
    cancelled: Vec<EntrustId>,
}

impl DryRunGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    #[cfg(test)]
    pub fn cancelled(&self) -> &[EntrustId] {
        &self.cancelled
    }
}

impl OrderGateway for DryRunGateway {
    fn place_order(&mut self, order: &Order) -> Result<(), GatewayError> {
        debug!(symbol = %order.symbol, side = %order.side, size = order.size, price = order.price, "dry-run order");
        self.orders.push(order.clone());
        Ok(())
    }

    fn cancel_order(&mut self, entrust_id: EntrustId) -> Result<(), GatewayError> {
        self.cancelled.push(entrust_id);
        debug!(%entrust_id, cancelled = self.cancelled.len(), "dry-run cancel");
        Ok(())
    }
}
