use crate::error::CatalogError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// 内置的链目录 (chainlist 格式)
const EMBEDDED_CHAINS: &str = include_str!("../data/chains.json");

/// RPC 连接类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionType {
    /// HTTP/HTTPS 连接
    Http,
    /// WebSocket 连接
    WebSocket,
}

impl ConnectionType {
    /// 根据URL自动确定连接类型
    pub fn from_url(rpc_url: &str) -> Self {
        let lower = rpc_url.trim().to_ascii_lowercase();
        if lower.starts_with("ws://") || lower.starts_with("wss://") {
            ConnectionType::WebSocket
        } else {
            ConnectionType::Http
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConnectionType::Http => "HTTP",
            ConnectionType::WebSocket => "WebSocket",
        }
    }
}

/// 原生代币描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    /// 代币名称 (例如 "Ether")
    pub name: String,
    /// 代币符号 (例如 "ETH")
    pub symbol: String,
    /// 精度
    pub decimals: u8,
}

/// ChainRecord 表示目录中的一条区块链
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainRecord {
    /// 链ID (例如 1 表示以太坊主网)
    #[serde(rename = "chainId")]
    pub chain_id: u64,
    /// 显示名称
    pub name: String,
    /// 短名称 (例如 "eth")
    #[serde(rename = "shortName", default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    /// 原生代币
    #[serde(rename = "nativeCurrency")]
    pub native_currency: NativeCurrency,
    /// RPC 端点 URL 列表
    #[serde(default)]
    pub rpc: Vec<String>,
    /// 区块浏览器 / 信息页 URL
    #[serde(rename = "infoURL", default)]
    pub info_url: String,
}

impl ChainRecord {
    /// 可以直接使用的 HTTP(S) 端点，跳过带 `${...}` 占位符的模板地址
    pub fn http_rpc_urls(&self) -> impl Iterator<Item = &str> {
        self.rpc
            .iter()
            .map(String::as_str)
            .filter(|url| !is_templated(url))
            .filter(|url| ConnectionType::from_url(url) == ConnectionType::Http)
    }
}

/// RPC 地址中是否包含需要替换的 API key 占位符
pub fn is_templated(rpc_url: &str) -> bool {
    rpc_url.contains("${")
}

/// 已校验的、非空且不可变的链目录
#[derive(Debug, Clone)]
pub struct ChainCatalog {
    chains: Vec<ChainRecord>,
}

impl ChainCatalog {
    /// 校验并创建链目录
    pub fn new(chains: Vec<ChainRecord>) -> Result<Self, CatalogError> {
        if chains.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen_ids = HashSet::new();
        let mut seen_names = HashSet::new();
        for chain in &chains {
            if chain.chain_id == 0 {
                return Err(CatalogError::InvalidChainId {
                    name: chain.name.clone(),
                    chain_id: chain.chain_id,
                });
            }
            if chain.name.trim().is_empty() {
                return Err(CatalogError::EmptyName {
                    chain_id: chain.chain_id,
                });
            }
            if !seen_ids.insert(chain.chain_id) {
                return Err(CatalogError::DuplicateChainId(chain.chain_id));
            }
            if !seen_names.insert(chain.name.to_lowercase()) {
                return Err(CatalogError::DuplicateName(chain.name.clone()));
            }
        }

        debug!("链目录校验通过，共 {} 条链", chains.len());
        Ok(Self { chains })
    }

    /// 加载内置链目录
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_json_str(EMBEDDED_CHAINS)
    }

    /// 从 chainlist 格式的 JSON 字符串加载
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let chains: Vec<ChainRecord> = serde_json::from_str(json)?;
        Self::new(chains)
    }

    /// 从 chainlist 格式的 JSON 文件加载
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&json)?;
        info!("从 {} 加载了 {} 条链", path.display(), catalog.len());
        Ok(catalog)
    }

    /// 指定路径时从文件加载，否则使用内置目录
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::embedded(),
        }
    }

    pub fn records(&self) -> &[ChainRecord] {
        &self.chains
    }

    /// 默认链：目录中的第一条
    pub fn default_chain(&self) -> &ChainRecord {
        // new() 保证目录非空
        &self.chains[0]
    }

    pub fn get(&self, chain_id: u64) -> Option<&ChainRecord> {
        self.chains.iter().find(|chain| chain.chain_id == chain_id)
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// new() 拒绝空目录，因此恒为 false
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

#[cfg(test)]
impl ChainRecord {
    /// 创建一条只有基础字段的链记录
    pub fn new(chain_id: u64, name: &str, symbol: &str) -> Self {
        Self {
            chain_id,
            name: name.to_string(),
            short_name: None,
            native_currency: NativeCurrency {
                name: symbol.to_string(),
                symbol: symbol.to_string(),
                decimals: 18,
            },
            rpc: Vec::new(),
            info_url: String::new(),
        }
    }

    pub fn with_short_name(mut self, short_name: &str) -> Self {
        self.short_name = Some(short_name.to_string());
        self
    }

    pub fn with_rpc(mut self, rpc_url: &str) -> Self {
        self.rpc.push(rpc_url.to_string());
        self
    }

    pub fn with_info_url(mut self, info_url: &str) -> Self {
        self.info_url = info_url.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn embedded_catalog_starts_with_ethereum() {
        let catalog = ChainCatalog::embedded().unwrap();
        assert!(catalog.len() > 5);
        assert!(!catalog.is_empty());
        assert_eq!(catalog.default_chain().chain_id, 1);
        assert_eq!(catalog.get(137).unwrap().short_name.as_deref(), Some("matic"));
        assert!(catalog.get(999_999_999).is_none());
    }

    #[test]
    fn parses_chainlist_shape_with_missing_optional_fields() {
        let json = r#"[
            {"name": "Devnet", "chainId": 31337,
             "nativeCurrency": {"name": "Ether", "symbol": "ETH", "decimals": 18}}
        ]"#;
        let catalog = ChainCatalog::from_json_str(json).unwrap();
        let chain = catalog.default_chain();
        assert_eq!(chain.name, "Devnet");
        assert!(chain.short_name.is_none());
        assert!(chain.rpc.is_empty());
        assert_eq!(chain.info_url, "");
    }

    #[test]
    fn rejects_empty_catalog() {
        assert!(matches!(ChainCatalog::new(vec![]), Err(CatalogError::Empty)));
        assert!(matches!(
            ChainCatalog::from_json_str("[]"),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn rejects_duplicates_and_invalid_entries() {
        let dup_id = vec![ChainRecord::new(1, "A", "ETH"), ChainRecord::new(1, "B", "ETH")];
        assert!(matches!(
            ChainCatalog::new(dup_id),
            Err(CatalogError::DuplicateChainId(1))
        ));

        let dup_name = vec![
            ChainRecord::new(1, "Ethereum", "ETH"),
            ChainRecord::new(2, "ETHEREUM", "ETH"),
        ];
        assert!(matches!(
            ChainCatalog::new(dup_name),
            Err(CatalogError::DuplicateName(name)) if name == "ETHEREUM"
        ));

        assert!(matches!(
            ChainCatalog::new(vec![ChainRecord::new(0, "Zero", "ETH")]),
            Err(CatalogError::InvalidChainId { chain_id: 0, .. })
        ));
        assert!(matches!(
            ChainCatalog::new(vec![ChainRecord::new(5, "  ", "ETH")]),
            Err(CatalogError::EmptyName { chain_id: 5 })
        ));
    }

    #[test]
    fn loads_catalog_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"name": "Local", "chainId": 1337, "shortName": "local",
                 "nativeCurrency": {{"name": "Ether", "symbol": "ETH", "decimals": 18}},
                 "rpc": ["http://127.0.0.1:8545"], "infoURL": ""}}]"#
        )
        .unwrap();

        let catalog = ChainCatalog::load(Some(file.path())).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.default_chain().rpc, vec!["http://127.0.0.1:8545"]);
    }

    #[test]
    fn missing_file_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            ChainCatalog::from_path(&missing),
            Err(CatalogError::Io { .. })
        ));
    }

    #[test]
    fn http_rpc_urls_skip_websocket_and_templates() {
        let chain = ChainRecord::new(1, "Ethereum", "ETH")
            .with_rpc("https://a.example")
            .with_rpc("wss://b.example")
            .with_rpc("https://c.example/${API_KEY}")
            .with_rpc("HTTP://d.example");
        let urls: Vec<_> = chain.http_rpc_urls().collect();
        assert_eq!(urls, vec!["https://a.example", "HTTP://d.example"]);
    }

    #[test]
    fn connection_type_from_scheme() {
        assert_eq!(ConnectionType::from_url("wss://x"), ConnectionType::WebSocket);
        assert_eq!(ConnectionType::from_url("WS://x"), ConnectionType::WebSocket);
        assert_eq!(ConnectionType::from_url("https://x"), ConnectionType::Http);
        assert_eq!(ConnectionType::from_url("x"), ConnectionType::Http);
    }
}
