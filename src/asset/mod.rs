//! Everything for tracking assets and liabilities: the domain types and
//! database functions, the pages for listing, creating, editing and settling
//! them, and the endpoints the pages talk to.

mod assets_page;
pub(crate) mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod refresh_endpoint;
mod settle_endpoint;
mod settle_page;

pub use assets_page::get_assets_page;
pub use core::{
    ASSET_TYPES, Asset, AssetType, DEFAULT_CURRENCY, NetWorthSummary, SettlementPayment,
    adjust_asset_value, create_asset, create_asset_table, delete_asset, get_asset, get_assets,
    get_assets_by_type, settle_asset, summarize_assets, update_asset,
};
pub use create_endpoint::create_asset_endpoint;
pub use create_page::get_new_asset_page;
pub use delete_endpoint::delete_asset_endpoint;
pub use edit_endpoint::edit_asset_endpoint;
pub use edit_page::get_edit_asset_page;
pub use refresh_endpoint::refresh_prices_endpoint;
pub use settle_endpoint::settle_asset_endpoint;
pub use settle_page::get_settle_asset_page;
