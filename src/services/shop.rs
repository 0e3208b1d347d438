//! Soft-currency shop. Prices come from the server-side catalog, never the
//! client, and funds are checked before anything mutates.

use std::sync::Arc;

use log::info;

use crate::catalog::{Catalog, Currency};
use crate::logutil::escape_log;
use crate::room::RoomError;
use crate::store::Gateway;

#[derive(Debug, Clone, Copy)]
pub struct PurchaseOutcome {
    pub cost: i64,
    pub new_balance: i64,
}

/// Coin-for-item purchases. Gem-priced items must go through IAP instead.
pub struct ShopService {
    catalog: Arc<Catalog>,
    store: Arc<dyn Gateway>,
}

impl ShopService {
    pub fn new(catalog: Arc<Catalog>, store: Arc<dyn Gateway>) -> Self {
        Self { catalog, store }
    }

    /// Debit `price * quantity` coins and credit the item into inventory.
    /// The funds check happens before any mutation, so a failed purchase is
    /// observable as fully unchanged balances.
    pub fn buy_item(
        &self,
        owner_id: &str,
        item_id: &str,
        quantity: u32,
    ) -> Result<PurchaseOutcome, RoomError> {
        let def = self
            .catalog
            .item(item_id)
            .ok_or_else(|| RoomError::UnknownItem(item_id.to_string()))?;
        if def.currency != Currency::Coins {
            return Err(RoomError::WrongCurrency);
        }

        let cost = def.price * i64::from(quantity);
        let user = self
            .store
            .user(owner_id)?
            .ok_or(RoomError::UserNotFound)?;
        if user.coins < cost {
            return Err(RoomError::InsufficientCoins);
        }

        let new_balance = self.store.adjust_coins(owner_id, -cost)?;
        self.store.credit_item(owner_id, item_id, quantity)?;
        info!(
            "shop: {} bought {}x{} for {} coins (balance {})",
            escape_log(owner_id),
            quantity,
            escape_log(item_id),
            cost,
            new_balance
        );

        Ok(PurchaseOutcome { cost, new_balance })
    }
}
