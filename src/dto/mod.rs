pub mod common;
pub mod decimal_serde;
pub mod market;
pub mod order;
pub mod rpc;

pub use common::*;
pub use market::*;
pub use order::*;
pub use rpc::{JsonRpcRequest, JsonRpcResponse, LoginResponse, RpcError};
