//! Backend-neutral domain types.
//!
//! Submodules:
//! - [`price`]: decimal money with a display string
//! - [`product`]: products, images, attributes, stock, rating
//! - [`catalog`]: categories (flat arena tree) and brands
//! - [`cart`]: carts, cart items, totals, coupons
//! - [`customer`]: users, addresses, auth payloads
//! - [`checkout`]: checkout sessions and shipping/payment methods
//! - [`order`]: immutable order snapshots and statuses
//! - [`query`]: list-query parameters and paginated results

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod customer;
pub mod order;
pub mod price;
pub mod product;
pub mod query;

pub use cart::*;
pub use catalog::*;
pub use checkout::*;
pub use customer::*;
pub use order::*;
pub use price::*;
pub use product::*;
pub use query::*;
