//! 按链ID或名称解析 EVM 链，生成钱包切换参数，并检测链的 RPC 端点。

pub mod chains;
pub mod error;
pub mod query;
pub mod report;
pub mod resolver;
pub mod rpc;
pub mod stats;
pub mod wallet;
