use crate::rpc::ProbeResult;
use anyhow::Result;
use itertools::Itertools;
use prettytable::{format, Cell, Row, Table};
use statrs::statistics::Statistics;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// 一个端点的探测统计指标
#[derive(Debug, Clone)]
pub struct EndpointStats {
    /// 链名称
    pub chain: String,
    /// 端点URL
    pub endpoint: String,
    /// 连接类型
    pub connection: String,
    /// 调用次数
    pub call_count: usize,
    /// 成功调用次数
    pub success_count: usize,
    /// 返回链ID与目录不一致的次数
    pub mismatch_count: usize,
    /// 最小延迟（毫秒）
    pub min_latency: f64,
    /// 最大延迟（毫秒）
    pub max_latency: f64,
    /// 平均延迟（毫秒）
    pub avg_latency: f64,
    /// 中位数延迟（毫秒）
    pub median_latency: f64,
    /// 95 百分位延迟（毫秒）
    pub p95_latency: f64,
    /// 成功率
    pub success_rate: f64,
}

/// 已排序延迟的中位数
fn median(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        0.0
    } else if sorted.len() % 2 == 0 {
        let mid = sorted.len() / 2;
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[sorted.len() / 2]
    }
}

/// 已排序延迟的 95 百分位
fn p95(sorted: &[f64]) -> f64 {
    let index = (sorted.len() as f64 * 0.95) as usize;
    match sorted.get(index) {
        Some(value) => *value,
        None => sorted.last().copied().unwrap_or(0.0),
    }
}

/// 根据探测结果计算每个端点的统计指标
pub fn calculate_stats(results: &[ProbeResult]) -> Vec<EndpointStats> {
    let mut stats_map: HashMap<(String, String), Vec<&ProbeResult>> = HashMap::new();

    // 按链和端点分组结果
    for result in results {
        let key = (result.chain.clone(), result.endpoint.clone());
        stats_map.entry(key).or_default().push(result);
    }

    stats_map
        .into_iter()
        .map(|((chain, endpoint), group_results)| {
            let call_count = group_results.len();
            let connection = group_results[0].connection_type.label().to_string();
            let success_results: Vec<_> = group_results.iter().filter(|r| r.success).collect();
            let success_count = success_results.len();
            let mismatch_count = success_results.iter().filter(|r| !r.chain_id_matches()).count();
            let success_rate = success_count as f64 / call_count as f64;

            // 没有成功的结果，延迟全部记为零
            if success_count == 0 {
                return EndpointStats {
                    chain,
                    endpoint,
                    connection,
                    call_count,
                    success_count,
                    mismatch_count,
                    min_latency: 0.0,
                    max_latency: 0.0,
                    avg_latency: 0.0,
                    median_latency: 0.0,
                    p95_latency: 0.0,
                    success_rate,
                };
            }

            let mut latencies: Vec<f64> = success_results.iter().map(|r| r.latency_ms).collect();
            latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

            EndpointStats {
                chain,
                endpoint,
                connection,
                call_count,
                success_count,
                mismatch_count,
                min_latency: Statistics::min(latencies.iter()),
                max_latency: Statistics::max(latencies.iter()),
                avg_latency: Statistics::mean(latencies.iter()),
                median_latency: median(&latencies),
                p95_latency: p95(&latencies),
                success_rate,
            }
        })
        .sorted_by(|a, b| {
            a.chain.cmp(&b.chain).then_with(|| {
                // 先按成功率排序（降序），再按平均延迟排序（升序）
                b.success_rate
                    .partial_cmp(&a.success_rate)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| {
                        a.avg_latency
                            .partial_cmp(&b.avg_latency)
                            .unwrap_or(Ordering::Equal)
                    })
                    .then_with(|| a.endpoint.cmp(&b.endpoint))
            })
        })
        .collect()
}

/// 将统计数据写入 CSV 文件
pub fn write_to_csv(stats: &[EndpointStats], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record([
        "chain",
        "endpoint",
        "connection",
        "call_count",
        "success_count",
        "chain_id_mismatches",
        "min_latency_ms",
        "max_latency_ms",
        "avg_latency_ms",
        "median_latency_ms",
        "p95_latency_ms",
        "success_rate_percent",
    ])?;

    for stat in stats {
        wtr.write_record([
            stat.chain.clone(),
            stat.endpoint.clone(),
            stat.connection.clone(),
            stat.call_count.to_string(),
            stat.success_count.to_string(),
            stat.mismatch_count.to_string(),
            format!("{:.2}", stat.min_latency),
            format!("{:.2}", stat.max_latency),
            format!("{:.2}", stat.avg_latency),
            format!("{:.2}", stat.median_latency),
            format!("{:.2}", stat.p95_latency),
            format!("{:.2}", stat.success_rate * 100.0),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// 在控制台中打印统计数据
pub fn print_stats(stats: &[EndpointStats]) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);

    table.add_row(Row::new(vec![
        Cell::new("端点"),
        Cell::new("类型"),
        Cell::new("调用次数"),
        Cell::new("成功次数"),
        Cell::new("成功率"),
        Cell::new("链ID不符"),
        Cell::new("最小延迟(ms)"),
        Cell::new("平均延迟(ms)"),
        Cell::new("中位数延迟(ms)"),
        Cell::new("P95延迟(ms)"),
    ]));

    // 分链显示
    let chain_groups = stats.iter().group_by(|s| &s.chain);

    for (chain, group) in &chain_groups {
        let chain_stats: Vec<_> = group.collect();

        table.add_row(Row::new(vec![
            Cell::new(&format!("== {} ==", chain)).style_spec("FgBrightCyan"),
            Cell::new(&format!("端点数: {}", chain_stats.len())).style_spec("FgBrightCyan"),
        ]));

        for stat in chain_stats {
            // 根据成功率设置颜色
            let success_rate_color = if stat.success_rate >= 0.9 {
                "Fg=Green"
            } else if stat.success_rate >= 0.5 {
                "Fg=Yellow"
            } else {
                "Fg=Red"
            };
            let mismatch_color = if stat.mismatch_count > 0 { "Fg=Red" } else { "" };

            table.add_row(Row::new(vec![
                Cell::new(&stat.endpoint),
                Cell::new(&stat.connection),
                Cell::new(&stat.call_count.to_string()),
                Cell::new(&stat.success_count.to_string()),
                Cell::new(&format!("{:.2}%", stat.success_rate * 100.0))
                    .style_spec(success_rate_color),
                Cell::new(&stat.mismatch_count.to_string()).style_spec(mismatch_color),
                Cell::new(&format!("{:.2}", stat.min_latency)),
                Cell::new(&format!("{:.2}", stat.avg_latency)),
                Cell::new(&format!("{:.2}", stat.median_latency)),
                Cell::new(&format!("{:.2}", stat.p95_latency)),
            ]));
        }
    }

    table.printstd();
}
