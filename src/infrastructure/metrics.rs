// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

use crate::config::settings::MetricsSettings;

/// 初始化指标系统
///
/// 启用时安装 Prometheus 导出器并注册业务计数器。
/// 地址无效或端口被占用时只记录警告，服务照常启动。
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        info!("Metrics exporter disabled");
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!(
                "Invalid metrics address {}: {}. Metrics exporter not started.",
                settings.listen_addr, e
            );
            return;
        }
    };

    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!(
            "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
            e
        );
        return;
    }

    describe_metrics();
    info!("Metrics exporter listening on {}", addr);
}

fn describe_metrics() {
    describe_counter!("tickets_created_total", "Total number of tickets created");
    describe_counter!(
        "ticket_updates_total",
        "Total number of accepted ticket updates"
    );
    describe_counter!(
        "ticket_version_conflicts_total",
        "Total number of ticket updates rejected with a version mismatch"
    );
    describe_counter!("comments_created_total", "Total number of comments added");
    describe_counter!(
        "audit_write_failures_total",
        "Total number of audit entries that failed to persist"
    );
    describe_counter!(
        "idempotency_replays_total",
        "Total number of responses replayed from the idempotency cache"
    );
    describe_counter!("users_registered_total", "Total number of registered users");
}
