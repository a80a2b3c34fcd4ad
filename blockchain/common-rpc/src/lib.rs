pub mod rpc;
pub use rpc::*;

pub mod connection_pool;
pub use connection_pool::*;

pub mod batch;
pub use batch::*;
