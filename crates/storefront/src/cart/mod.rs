//! Cart synchronization.
//!
//! - [`protocol`]: the remote contract and failure classification
//! - [`manager`]: local cart state, persistence and expiry recovery
//! - [`store`]: the durable slot the manager writes through
//! - [`wire`] and [`http_remote`]: the JSON form of the protocol spoken by
//!   `POST /api/cart`

pub mod http_remote;
pub mod manager;
pub mod protocol;
pub mod store;
pub mod wire;

pub use http_remote::HttpCartRemote;
pub use manager::{CartError, CartManager, CartState, MutationOutcome};
pub use protocol::{CartRemote, SyncError, indicates_expired_cart};
pub use store::{CART_SLOT, CartStore, FileCartStore, MemoryCartStore, StoreError};
pub use wire::{CartAction, CartActionRequest, CartResponse, ErrorResponse, InvalidCartRequest};
