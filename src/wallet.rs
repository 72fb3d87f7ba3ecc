use crate::chains::ChainRecord;
use serde_json::{json, Value};

/// 钱包使用的十六进制链ID (例如 137 -> "0x89")
pub fn hex_chain_id(chain_id: u64) -> String {
    format!("0x{:x}", chain_id)
}

/// `wallet_switchEthereumChain` (EIP-3326) 的参数
pub fn switch_chain_params(chain: &ChainRecord) -> Value {
    json!([{ "chainId": hex_chain_id(chain.chain_id) }])
}

/// `wallet_addEthereumChain` (EIP-3085) 的参数
///
/// 钱包不接受 WebSocket 地址和带占位符的模板地址，这里只保留 HTTP(S) 端点。
pub fn add_chain_params(chain: &ChainRecord) -> Value {
    let rpc_urls: Vec<&str> = chain.http_rpc_urls().collect();
    let explorer_urls: Vec<&str> = if chain.info_url.is_empty() {
        vec![]
    } else {
        vec![chain.info_url.as_str()]
    };

    json!([{
        "chainId": hex_chain_id(chain.chain_id),
        "chainName": chain.name,
        "nativeCurrency": chain.native_currency,
        "rpcUrls": rpc_urls,
        "blockExplorerUrls": explorer_urls,
    }])
}
