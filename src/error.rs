use std::path::PathBuf;
use thiserror::Error;

/// 加载或校验链目录时可能出现的错误
#[derive(Debug, Error)]
pub enum CatalogError {
    /// 读取链目录文件失败
    #[error("无法读取链目录文件 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 链目录 JSON 格式错误
    #[error("解析链目录 JSON 失败: {0}")]
    Json(#[from] serde_json::Error),

    /// 链目录为空
    #[error("链目录为空，至少需要一条链")]
    Empty,

    /// 链 ID 必须为正整数
    #[error("链 \"{name}\" 的链ID无效: {chain_id}")]
    InvalidChainId { name: String, chain_id: u64 },

    /// 链名称为空
    #[error("链ID {chain_id} 的名称为空")]
    EmptyName { chain_id: u64 },

    #[error("链ID重复: {0}")]
    DuplicateChainId(u64),

    #[error("链名称重复 (忽略大小写): {0}")]
    DuplicateName(String),
}
