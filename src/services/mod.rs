//! Transaction services and progression rules.
//!
//! [`growth`] and [`incubation`] are pure: every function takes the current
//! time (and for gacha, the random draw) as a parameter so tests can drive
//! them deterministically. [`shop`] and [`iap`] compose the catalog with the
//! persistence gateway and are invoked from inside a room handler, which
//! serializes them per owner.

pub mod growth;
pub mod iap;
pub mod incubation;
pub mod shop;

pub use growth::{check_growth, validate_harvest, GrowthStage, GrowthStatus};
pub use iap::{IapOutcome, IapService};
pub use incubation::{
    calculate_hunger, check_hatch, open_egg, roll_gacha, HatchStage, HatchStatus,
};
pub use shop::{PurchaseOutcome, ShopService};
