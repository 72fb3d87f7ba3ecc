use crate::chains::{is_templated, ChainRecord, ConnectionType};
use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use futures::future::{self, Either};
use futures::{pin_mut, SinkExt, StreamExt};
use log::{debug, info, warn};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const WS_TIMEOUT: Duration = Duration::from_secs(15);
const PROBE_INTERVAL: Duration = Duration::from_millis(100);

/// 待探测的 RPC 端点
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub url: String,
    pub connection_type: ConnectionType,
}

impl Endpoint {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            connection_type: ConnectionType::from_url(url),
        }
    }
}

/// 一次 eth_chainId 探测的结果
#[derive(Debug, Clone)]
pub struct ProbeResult {
    /// 链名称
    pub chain: String,
    /// 期望的链ID
    pub expected_chain_id: u64,
    /// 端点URL
    pub endpoint: String,
    pub connection_type: ConnectionType,
    /// 调用是否成功
    pub success: bool,
    /// 调用延迟（毫秒）
    pub latency_ms: f64,
    /// 端点返回的链ID
    pub reported_chain_id: Option<u64>,
    /// 如果调用失败，则包含错误信息
    pub error: Option<String>,
    /// 时间戳
    pub timestamp: chrono::DateTime<Utc>,
}

impl ProbeResult {
    fn failed(chain: &ChainRecord, endpoint: &Endpoint, error: String) -> Self {
        Self {
            chain: chain.name.clone(),
            expected_chain_id: chain.chain_id,
            endpoint: endpoint.url.clone(),
            connection_type: endpoint.connection_type,
            success: false,
            latency_ms: 0.0,
            reported_chain_id: None,
            error: Some(error),
            timestamp: Utc::now(),
        }
    }

    /// 端点返回的链ID与目录一致
    pub fn chain_id_matches(&self) -> bool {
        self.reported_chain_id == Some(self.expected_chain_id)
    }
}

/// 列出链的可探测端点，跳过带占位符的模板地址
pub fn probe_endpoints(chain: &ChainRecord) -> Vec<Endpoint> {
    chain
        .rpc
        .iter()
        .filter(|url| {
            if is_templated(url) {
                warn!("跳过需要 API key 的端点: {}", url);
                false
            } else {
                true
            }
        })
        .map(|url| Endpoint::new(url))
        .collect()
}

fn chain_id_request() -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "eth_chainId",
        "params": []
    })
}

/// 解析 eth_chainId 响应，返回链ID或节点返回的错误信息
pub fn parse_chain_id_response(response_body: &Value) -> Result<u64> {
    if let Some(error) = response_body.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("未知错误");
        bail!("RPC 返回错误: {}", message);
    }

    let result = response_body
        .get("result")
        .and_then(|r| r.as_str())
        .ok_or_else(|| anyhow!("响应中缺少 result 字段"))?;

    let digits = result
        .strip_prefix("0x")
        .or_else(|| result.strip_prefix("0X"))
        .ok_or_else(|| anyhow!("链ID不是十六进制: {}", result))?;

    u64::from_str_radix(digits, 16).with_context(|| format!("解析链ID失败: {}", result))
}

/// 通过HTTP发送 eth_chainId 请求
async fn send_http_rpc_request(client: &Client, rpc_url: &str) -> Result<(f64, Value)> {
    let start = Instant::now();

    let response = client
        .post(rpc_url)
        .json(&chain_id_request())
        .timeout(HTTP_TIMEOUT)
        .send()
        .await
        .context("发送 HTTP RPC 请求失败")?;

    let latency = start.elapsed().as_secs_f64() * 1000.0;

    let response_body: Value = response
        .json()
        .await
        .context("解析 HTTP RPC 响应失败")?;

    Ok((latency, response_body))
}

/// 通过WebSocket发送 eth_chainId 请求
async fn send_ws_rpc_request(rpc_url: &str) -> Result<(f64, Value)> {
    let start = Instant::now();

    let url = Url::parse(rpc_url).context("解析WebSocket URL失败")?;

    debug!("连接WebSocket: {}", rpc_url);
    let (mut ws_stream, _) = connect_async(url)
        .await
        .map_err(|e| anyhow!("连接WebSocket失败: {}", e))?;

    ws_stream
        .send(Message::Text(chain_id_request().to_string()))
        .await
        .map_err(|e| anyhow!("发送WebSocket消息失败: {}", e))?;

    let response_future = ws_stream.next();
    let timeout = tokio::time::sleep(WS_TIMEOUT);
    pin_mut!(response_future);
    pin_mut!(timeout);

    let response = match future::select(response_future, timeout).await {
        Either::Left((Some(Ok(response)), _)) => response,
        Either::Left((Some(Err(e)), _)) => return Err(anyhow!("WebSocket响应错误: {}", e)),
        Either::Left((None, _)) => return Err(anyhow!("WebSocket连接已关闭")),
        Either::Right((_, _)) => {
            return Err(anyhow!("WebSocket请求超时({}秒)", WS_TIMEOUT.as_secs()))
        }
    };

    let latency = start.elapsed().as_secs_f64() * 1000.0;

    let response_text = match response {
        Message::Text(text) => text,
        _ => return Err(anyhow!("收到非文本WebSocket响应")),
    };

    let response_body: Value =
        serde_json::from_str(&response_text).context("解析WebSocket响应JSON失败")?;

    if let Err(e) = ws_stream.send(Message::Close(None)).await {
        debug!("关闭WebSocket连接失败: {}", e);
    }

    Ok((latency, response_body))
}

/// 对单个端点做一次探测，传输层错误向上返回
async fn probe_once(
    client: &Client,
    chain: &ChainRecord,
    endpoint: &Endpoint,
) -> Result<ProbeResult> {
    let (latency_ms, response_body) = match endpoint.connection_type {
        ConnectionType::Http => send_http_rpc_request(client, &endpoint.url).await?,
        ConnectionType::WebSocket => send_ws_rpc_request(&endpoint.url).await?,
    };

    let (success, reported_chain_id, error) = match parse_chain_id_response(&response_body) {
        Ok(id) => (true, Some(id), None),
        Err(e) => (false, None, Some(e.to_string())),
    };

    Ok(ProbeResult {
        chain: chain.name.clone(),
        expected_chain_id: chain.chain_id,
        endpoint: endpoint.url.clone(),
        connection_type: endpoint.connection_type,
        success,
        latency_ms,
        reported_chain_id,
        error,
        timestamp: Utc::now(),
    })
}

/// 对单个端点重复探测 count 次
async fn probe_endpoint(
    client: &Client,
    chain: &ChainRecord,
    endpoint: &Endpoint,
    count: usize,
) -> Vec<ProbeResult> {
    let mut results = Vec::with_capacity(count);

    for attempt in 0..count {
        if let Some(pause) = pause_before(attempt) {
            tokio::time::sleep(pause).await;
        }

        match probe_once(client, chain, endpoint).await {
            Ok(result) => {
                if let Some(reported) = result.reported_chain_id {
                    if reported != chain.chain_id {
                        warn!(
                            "{} 返回的链ID {} 与期望的 {} 不一致",
                            endpoint.url, reported, chain.chain_id
                        );
                    }
                }
                results.push(result);
            }
            Err(e) => {
                results.push(ProbeResult::failed(chain, endpoint, format!("探测失败: {:#}", e)));

                // WebSocket 第一次就连不上，后续尝试没有意义
                if attempt == 0 && endpoint.connection_type == ConnectionType::WebSocket {
                    warn!("WebSocket端点无法连接，跳过剩余探测: {} ({:#})", endpoint.url, e);
                    break;
                }
            }
        }
    }

    results
}

/// 两次探测之间的间隔，第一次之前不等待
fn pause_before(attempt: usize) -> Option<Duration> {
    (attempt > 0).then_some(PROBE_INTERVAL)
}

fn log_summary(endpoint: &Endpoint, results: &[ProbeResult], count: usize) {
    let success_count = results.iter().filter(|r| r.success).count();
    let avg_latency = if success_count > 0 {
        let total: f64 = results.iter().filter(|r| r.success).map(|r| r.latency_ms).sum();
        total / success_count as f64
    } else {
        0.0
    };
    info!(
        "{} ({}) 完成 ({}/{}成功, 平均: {:.2}ms)",
        endpoint.url,
        endpoint.connection_type.label(),
        success_count,
        count,
        avg_latency
    );
}

/// 依次探测链的所有端点
pub async fn probe_chain(chain: &ChainRecord, count: usize) -> Result<Vec<ProbeResult>> {
    let endpoints = probe_endpoints(chain);
    if endpoints.is_empty() {
        bail!("链 {} 没有可探测的 RPC 端点", chain.name);
    }

    let client = Client::new();
    let mut all_results = Vec::new();

    info!("开始探测 {} 的 {} 个端点", chain.name, endpoints.len());
    for (i, endpoint) in endpoints.iter().enumerate() {
        info!("[{}/{}] 探测端点: {}", i + 1, endpoints.len(), endpoint.url);
        let results = probe_endpoint(&client, chain, endpoint, count).await;
        log_summary(endpoint, &results, count);
        all_results.extend(results);
    }

    Ok(all_results)
}

/// 并发探测链的所有端点
pub async fn probe_chain_concurrent(chain: &ChainRecord, count: usize) -> Result<Vec<ProbeResult>> {
    let endpoints = probe_endpoints(chain);
    if endpoints.is_empty() {
        bail!("链 {} 没有可探测的 RPC 端点", chain.name);
    }

    let client = Client::new();
    info!("并发探测 {} 的 {} 个端点", chain.name, endpoints.len());

    let futures = endpoints.iter().map(|endpoint| {
        let client = &client;
        async move {
            let results = probe_endpoint(client, chain, endpoint, count).await;
            log_summary(endpoint, &results, count);
            results
        }
    });

    let all_results = future::join_all(futures).await.into_iter().flatten().collect();
    Ok(all_results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_chain_id_result() {
        let body = json!({"jsonrpc": "2.0", "id": 1, "result": "0x89"});
        assert_eq!(parse_chain_id_response(&body).unwrap(), 137);
    }

    #[test]
    fn rpc_error_is_reported() {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32601, "message": "method not found"}
        });
        let err = parse_chain_id_response(&body).unwrap_err();
        assert!(err.to_string().contains("method not found"));
    }

    #[test]
    fn malformed_results_are_rejected() {
        assert!(parse_chain_id_response(&json!({"id": 1})).is_err());
        assert!(parse_chain_id_response(&json!({"result": "137"})).is_err());
        assert!(parse_chain_id_response(&json!({"result": "0xzz"})).is_err());
        assert!(parse_chain_id_response(&json!({"result": 137})).is_err());
    }

    #[test]
    fn endpoints_skip_templates_and_detect_websocket() {
        let chain = ChainRecord::new(1, "Ethereum", "ETH")
            .with_rpc("https://eth.example")
            .with_rpc("wss://eth.example/ws")
            .with_rpc("https://mainnet.infura.io/v3/${INFURA_API_KEY}");

        let endpoints = probe_endpoints(&chain);
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0].connection_type, ConnectionType::Http);
        assert_eq!(endpoints[1].connection_type, ConnectionType::WebSocket);
    }

    #[test]
    fn pauses_only_between_attempts() {
        assert_eq!(pause_before(0), None);
        assert_eq!(pause_before(1), Some(PROBE_INTERVAL));

        let pauses = (0..5).filter_map(pause_before).count();
        assert_eq!(pauses, 4);
        assert_eq!((0..1).filter_map(pause_before).count(), 0);
    }

    #[test]
    fn failed_result_never_matches_chain_id() {
        let chain = ChainRecord::new(1, "Ethereum", "ETH");
        let result = ProbeResult::failed(&chain, &Endpoint::new("https://x"), "boom".to_string());
        assert!(!result.success);
        assert!(!result.chain_id_matches());
        assert_eq!(result.error.as_deref(), Some("boom"));
    }
}
