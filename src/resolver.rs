use crate::chains::{ChainCatalog, ChainRecord};
use crate::query::ChainQuery;
use log::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// 匹配方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// 链ID精确命中
    ChainId,
    /// 链ID未命中，回退到默认链
    Fallback,
    /// 名称或短名称精确命中 (忽略大小写和变音符号)
    ExactName,
    /// 按编辑距离选出的最近名称
    Fuzzy { distance: usize },
}

impl MatchKind {
    pub fn label(self) -> String {
        match self {
            MatchKind::ChainId => "链ID匹配".to_string(),
            MatchKind::Fallback => "未找到，使用默认链".to_string(),
            MatchKind::ExactName => "名称匹配".to_string(),
            MatchKind::Fuzzy { distance } => format!("模糊匹配 (编辑距离 {})", distance),
        }
    }
}

/// 解析结果
#[derive(Debug, Clone, Copy)]
pub struct MatchResult<'a> {
    pub chain: &'a ChainRecord,
    pub kind: MatchKind,
}

/// 将查询解析为目录中唯一的一条链，永不失败
pub fn resolve<'a>(query: &ChainQuery, catalog: &'a ChainCatalog) -> &'a ChainRecord {
    resolve_match(query, catalog).chain
}

/// 与 [`resolve`] 相同，但同时返回匹配方式
pub fn resolve_match<'a>(query: &ChainQuery, catalog: &'a ChainCatalog) -> MatchResult<'a> {
    let result = match query {
        ChainQuery::Numeric(id) => resolve_by_id(*id, catalog),
        ChainQuery::Text(name) => resolve_by_name(name, catalog),
    };

    debug!(
        "{} -> {} ({}) [{}]",
        query,
        result.chain.name,
        result.chain.chain_id,
        result.kind.label()
    );
    result
}

fn resolve_by_id(id: i128, catalog: &ChainCatalog) -> MatchResult<'_> {
    let found = u64::try_from(id).ok().and_then(|id| catalog.get(id));
    match found {
        Some(chain) => MatchResult {
            chain,
            kind: MatchKind::ChainId,
        },
        None => MatchResult {
            chain: catalog.default_chain(),
            kind: MatchKind::Fallback,
        },
    }
}

fn resolve_by_name<'a>(name: &str, catalog: &'a ChainCatalog) -> MatchResult<'a> {
    let wanted = fold_base(name);
    let exact = catalog.records().iter().find(|chain| {
        fold_base(&chain.name) == wanted
            || chain
                .short_name
                .as_deref()
                .is_some_and(|short| fold_base(short) == wanted)
    });
    if let Some(chain) = exact {
        return MatchResult {
            chain,
            kind: MatchKind::ExactName,
        };
    }

    let query = name.to_lowercase();
    let mut best = catalog.default_chain();
    let mut best_distance = usize::MAX;
    for chain in catalog.records() {
        let distance = levenshtein(&query, &chain.name.to_lowercase());
        // 严格小于：距离相同时保留目录中靠前的链
        if distance < best_distance {
            best = chain;
            best_distance = distance;
        }
    }

    MatchResult {
        chain: best,
        kind: MatchKind::Fuzzy {
            distance: best_distance,
        },
    }
}

/// 归一到基础字母：去掉变音符号并转小写
fn fold_base(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Levenshtein 编辑距离，按 Unicode 字符计数
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    // 只保留动态规划表的上一行
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
