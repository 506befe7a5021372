//-----------------------------------------------------------------------------
// Transaction construction, signing and broadcast
//-----------------------------------------------------------------------------

pub mod broadcast;
pub mod builder;

pub use broadcast::{BroadcastMode, Broadcaster, Response as BroadcastResponse};
pub use builder::TxBuilder;
