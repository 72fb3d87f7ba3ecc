use crate::chains::{ChainCatalog, ChainRecord};
use crate::resolver::MatchResult;
use crate::wallet::hex_chain_id;
use anyhow::Result;
use itertools::Itertools;
use prettytable::{format, Cell, Row, Table};
use std::fs::File;
use std::path::Path;

fn short_name(chain: &ChainRecord) -> &str {
    chain.short_name.as_deref().unwrap_or("-")
}

/// 打印单条链的解析结果
pub fn print_match(query: &str, result: &MatchResult<'_>) {
    let chain = result.chain;

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);

    let rows = [
        ("查询", query.to_string()),
        ("匹配方式", result.kind.label()),
        ("名称", chain.name.clone()),
        ("短名称", short_name(chain).to_string()),
        ("链ID", format!("{} ({})", chain.chain_id, hex_chain_id(chain.chain_id))),
        (
            "原生代币",
            format!(
                "{} ({}, {} 位精度)",
                chain.native_currency.name,
                chain.native_currency.symbol,
                chain.native_currency.decimals
            ),
        ),
        ("RPC", chain.rpc.iter().join("\n")),
        ("浏览器", chain.info_url.clone()),
    ];

    for (label, value) in rows {
        table.add_row(Row::new(vec![
            Cell::new(label).style_spec("FgBrightCyan"),
            Cell::new(&value),
        ]));
    }

    table.printstd();
}

/// 在控制台中打印整个链目录
pub fn print_catalog(catalog: &ChainCatalog) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);

    table.add_row(Row::new(vec![
        Cell::new("链ID"),
        Cell::new("名称"),
        Cell::new("短名称"),
        Cell::new("代币"),
        Cell::new("RPC数"),
        Cell::new("浏览器"),
    ]));

    for (i, chain) in catalog.records().iter().enumerate() {
        // 第一条为默认链
        let name = if i == 0 {
            format!("{} (默认)", chain.name)
        } else {
            chain.name.clone()
        };
        table.add_row(Row::new(vec![
            Cell::new(&chain.chain_id.to_string()),
            Cell::new(&name),
            Cell::new(short_name(chain)),
            Cell::new(&chain.native_currency.symbol),
            Cell::new(&chain.rpc.len().to_string()),
            Cell::new(&chain.info_url),
        ]));
    }

    table.printstd();
}

/// 将链目录写入 CSV 文件
pub fn write_catalog_csv(catalog: &ChainCatalog, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record([
        "chain_id",
        "hex_chain_id",
        "name",
        "short_name",
        "symbol",
        "decimals",
        "rpc",
        "info_url",
    ])?;

    for chain in catalog.records() {
        wtr.write_record([
            chain.chain_id.to_string(),
            hex_chain_id(chain.chain_id),
            chain.name.clone(),
            chain.short_name.clone().unwrap_or_default(),
            chain.native_currency.symbol.clone(),
            chain.native_currency.decimals.to_string(),
            chain.rpc.iter().join(" "),
            chain.info_url.clone(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_csv_keeps_catalog_order() {
        let catalog = ChainCatalog::new(vec![
            ChainRecord::new(10, "OP Mainnet", "ETH").with_short_name("oeth"),
            ChainRecord::new(1, "Ethereum", "ETH")
                .with_rpc("https://a")
                .with_rpc("https://b"),
        ])
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chains.csv");
        write_catalog_csv(&catalog, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "10,0xa,OP Mainnet,oeth,ETH,18,,");
        assert_eq!(lines[2], "1,0x1,Ethereum,,ETH,18,https://a https://b,");
    }
}
