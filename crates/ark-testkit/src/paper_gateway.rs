//! Deterministic paper gateway.
//!
//! Accepts everything unless told otherwise, remembers what it saw, and can
//! turn the open orders into fills at the order price (plus optional
//! slippage). No randomness, no IO.

use std::collections::BTreeSet;

use ark_execution::{
    EntrustId, GatewayError, Order, OrderGateway, OrderStatus, OrderStatusInd, TradeInd,
};
use tracing::debug;

#[derive(Clone, Debug, Default)]
pub struct PaperGateway {
    placed: Vec<Order>,
    cancelled: Vec<EntrustId>,
    open: Vec<Order>,
    reject_symbols: BTreeSet<String>,
    refuse_cancel: BTreeSet<EntrustId>,
    /// Added to buys and subtracted from sells on fill.
    slippage: f64,
    /// Commission per unit of traded notional.
    commission_rate: f64,
}

impl PaperGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every order for `symbol`.
    pub fn reject_symbol(mut self, symbol: &str) -> Self {
        self.reject_symbols.insert(symbol.to_string());
        self
    }

    pub fn with_slippage(mut self, slippage: f64) -> Self {
        self.slippage = slippage;
        self
    }

    pub fn with_commission_rate(mut self, rate: f64) -> Self {
        self.commission_rate = rate;
        self
    }

    /// Make the next cancel of `entrust_id` fail.
    pub fn refuse_cancel(&mut self, entrust_id: EntrustId) {
        self.refuse_cancel.insert(entrust_id);
    }

    /// Every order that reached the gateway, refused ones included.
    pub fn placed(&self) -> &[Order] {
        &self.placed
    }

    pub fn cancelled(&self) -> &[EntrustId] {
        &self.cancelled
    }

    pub fn open_orders(&self) -> &[Order] {
        &self.open
    }

    /// Fill every open order completely and forget it.
    pub fn fill_all(&mut self, fill_time: u32) -> Vec<TradeInd> {
        let slippage = self.slippage;
        let rate = self.commission_rate;
        self.open
            .drain(..)
            .filter_map(|o| {
                let entrust_id = o.entrust_id?;
                let fill_price = o.price + slippage * o.side.sign() as f64;
                Some(TradeInd {
                    entrust_id,
                    symbol: o.symbol,
                    side: o.side,
                    fill_price,
                    fill_size: o.size,
                    fill_date: o.entrust_date,
                    fill_time,
                    commission: fill_price * o.size as f64 * rate,
                })
            })
            .collect()
    }

    /// Acknowledge every open order without filling it.
    pub fn accept_all(&self) -> Vec<OrderStatusInd> {
        self.open
            .iter()
            .filter_map(|o| o.entrust_id)
            .map(|entrust_id| OrderStatusInd {
                entrust_id,
                status: OrderStatus::Accepted,
                fill_size: 0,
            })
            .collect()
    }
}

impl OrderGateway for PaperGateway {
    fn place_order(&mut self, order: &Order) -> Result<(), GatewayError> {
        self.placed.push(order.clone());
        if self.reject_symbols.contains(&order.symbol) {
            return Err(GatewayError::new(format!("{} is not tradable", order.symbol)));
        }
        debug!(symbol = %order.symbol, side = %order.side, size = order.size, "paper accept");
        self.open.push(order.clone());
        Ok(())
    }

    fn cancel_order(&mut self, entrust_id: EntrustId) -> Result<(), GatewayError> {
        if self.refuse_cancel.remove(&entrust_id) {
            return Err(GatewayError::new(format!("entrust {entrust_id} already traded")));
        }
        self.open.retain(|o| o.entrust_id != Some(entrust_id));
        self.cancelled.push(entrust_id);
        Ok(())
    }
}
