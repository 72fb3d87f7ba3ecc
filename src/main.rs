use anyhow::{Context, Result};
use chain_switch::chains::ChainCatalog;
use chain_switch::query::ChainQuery;
use chain_switch::{report, resolver, rpc, stats, wallet};
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "chain-switch",
    about = "按链ID或名称查找 EVM 链，生成钱包切换参数并检测 RPC 端点",
    version
)]
struct Cli {
    /// chainlist 格式的链目录 JSON 文件，不指定时使用内置目录
    #[clap(long, global = true, env = "CHAIN_SWITCH_CHAINS")]
    chains: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 解析链ID或链名称 (支持模糊匹配)
    Resolve {
        /// 链ID (十进制或 0x 十六进制) 或链名称
        query: String,

        /// 输出格式
        #[clap(short = 'f', long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// 列出链目录
    List {
        /// CSV 输出文件路径
        #[clap(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// 解析链后检测其 RPC 端点 (eth_chainId)
    Probe {
        /// 链ID (十进制或 0x 十六进制) 或链名称
        query: String,

        /// 每个端点测试次数
        #[clap(short = 'c', long, default_value = "5")]
        count: usize,

        /// CSV 输出文件路径
        #[clap(short = 'o', long)]
        output: Option<PathBuf>,

        /// 并发检测所有端点
        #[clap(long)]
        concurrent: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    /// 表格
    Table,
    /// 链记录 JSON
    Json,
    /// wallet_switchEthereumChain 参数
    Switch,
    /// wallet_addEthereumChain 参数
    Add,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 解析命令行参数
    let cli = Cli::parse();
    debug!("命令行参数: {:?}", cli);

    let catalog = ChainCatalog::load(cli.chains.as_deref()).context("加载链目录失败")?;

    match cli.command {
        Command::Resolve { query, format } => run_resolve(&catalog, &query, format)?,
        Command::List { output } => {
            report::print_catalog(&catalog);
            if let Some(output) = output {
                report::write_catalog_csv(&catalog, &output)?;
                println!("\n链目录已保存到: {}", output.display());
            }
        }
        Command::Probe {
            query,
            count,
            output,
            concurrent,
        } => run_probe(&catalog, &query, count, output, concurrent).await?,
    }

    Ok(())
}

fn run_resolve(catalog: &ChainCatalog, raw_query: &str, format: OutputFormat) -> Result<()> {
    let query = ChainQuery::parse(raw_query);
    let result = resolver::resolve_match(&query, catalog);

    match format {
        OutputFormat::Table => report::print_match(raw_query, &result),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result.chain)?),
        OutputFormat::Switch => println!(
            "{}",
            serde_json::to_string_pretty(&wallet::switch_chain_params(result.chain))?
        ),
        OutputFormat::Add => println!(
            "{}",
            serde_json::to_string_pretty(&wallet::add_chain_params(result.chain))?
        ),
    }

    Ok(())
}

async fn run_probe(
    catalog: &ChainCatalog,
    raw_query: &str,
    count: usize,
    output: Option<PathBuf>,
    concurrent: bool,
) -> Result<()> {
    let query = ChainQuery::parse(raw_query);
    let result = resolver::resolve_match(&query, catalog);
    let chain = result.chain;

    info!(
        "{} -> {} (链ID {}, {})",
        raw_query,
        chain.name,
        chain.chain_id,
        result.kind.label()
    );
    println!("每个端点测试次数: {}", count);
    println!("-----------------------------");

    let results = if concurrent {
        rpc::probe_chain_concurrent(chain, count).await?
    } else {
        rpc::probe_chain(chain, count).await?
    };

    // 计算统计数据
    let stats = stats::calculate_stats(&results);

    if let Some(output) = &output {
        stats::write_to_csv(&stats, output)?;
    }

    stats::print_stats(&stats);

    match output {
        Some(output) => println!("\n检测完成！结果已保存到: {}", output.display()),
        None => println!("\n检测完成！"),
    }

    Ok(())
}
