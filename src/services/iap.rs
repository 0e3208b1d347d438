//! IAP fulfillment: SKU lookup and reward grants.
//!
//! Purchase-token verification against the payment authority happens upstream
//! of this service; the token is accepted as-is here. That trust boundary is
//! deliberate, not an oversight.

use std::sync::Arc;

use log::info;

use crate::catalog::Catalog;
use crate::logutil::escape_log;
use crate::room::RoomError;
use crate::store::Gateway;

#[derive(Debug, Clone, Copy)]
pub struct IapOutcome {
    pub gems_granted: i64,
    pub new_gem_balance: i64,
}

/// Grants a SKU's gems (and any bonus items) to an owner.
pub struct IapService {
    catalog: Arc<Catalog>,
    store: Arc<dyn Gateway>,
}

impl IapService {
    pub fn new(catalog: Arc<Catalog>, store: Arc<dyn Gateway>) -> Self {
        Self { catalog, store }
    }

    pub fn fulfill_purchase(
        &self,
        owner_id: &str,
        sku_id: &str,
        _purchase_token: Option<&str>,
    ) -> Result<IapOutcome, RoomError> {
        let sku = self
            .catalog
            .sku(sku_id)
            .ok_or_else(|| RoomError::UnknownSku(sku_id.to_string()))?;

        if self.store.user(owner_id)?.is_none() {
            return Err(RoomError::UserNotFound);
        }

        let new_gem_balance = self.store.adjust_gems(owner_id, sku.gems)?;
        for bonus in &sku.bonus_items {
            self.store
                .credit_item(owner_id, &bonus.item_id, bonus.quantity)?;
        }
        info!(
            "iap: fulfilled {} for {} ({} gems, balance {})",
            escape_log(sku_id),
            escape_log(owner_id),
            sku.gems,
            new_gem_balance
        );

        Ok(IapOutcome {
            gems_granted: sku.gems,
            new_gem_balance,
        })
    }
}
