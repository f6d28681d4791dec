// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::settings::IdempotencySettings;

/// 缓存的响应
///
/// `headers` 保存原响应中可重放的头部（含 content-type）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// 单个幂等键的槽位
///
/// 首个写入者初始化 `cell`，其余请求等待后重放同一结果。
/// 写入者在完成前被取消时 `cell` 保持未初始化，下一个等待者接手执行。
struct Slot {
    cell: OnceCell<CachedResponse>,
    created_at: Instant,
}

impl Slot {
    fn new(now: Instant) -> Self {
        Self {
            cell: OnceCell::new(),
            created_at: now,
        }
    }

    fn is_completed(&self) -> bool {
        self.cell.initialized()
    }

    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        self.is_completed() && now.duration_since(self.created_at) > ttl
    }
}

/// 执行结果
#[derive(Debug, Clone)]
pub struct IdempotentOutcome {
    pub response: CachedResponse,
    /// 为 true 表示响应来自缓存
    pub replayed: bool,
}

/// 幂等缓存
///
/// 进程内的键到响应映射，按 TTL 过期，容量超限时淘汰最早完成的条目。
/// 未完成的条目不会被淘汰。
pub struct IdempotencyCache {
    entries: DashMap<String, Arc<Slot>>,
    /// 按完成顺序排列的已完成槽位，淘汰时从队首弹出
    completed: Mutex<VecDeque<(String, Arc<Slot>)>>,
    ttl: Duration,
    max_entries: usize,
}

impl IdempotencyCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            completed: Mutex::new(VecDeque::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn from_settings(settings: &IdempotencySettings) -> Self {
        Self::new(
            Duration::from_secs(settings.ttl_seconds),
            settings.max_entries,
        )
    }

    /// 查询已完成的缓存响应
    pub fn lookup(&self, key: &str) -> Option<CachedResponse> {
        let slot = self.entries.get(key)?;
        if slot.is_expired(Instant::now(), self.ttl) {
            return None;
        }
        slot.cell.get().cloned()
    }

    /// 记录响应，先写入者胜出
    ///
    /// # 返回值
    ///
    /// 本次写入生效返回 `true`，键已有结果返回 `false`
    pub fn record(&self, key: &str, response: CachedResponse) -> bool {
        let slot = self.slot_for(key);
        let stored = slot.cell.set(response).is_ok();
        if stored {
            self.mark_completed(key, slot);
        }
        stored
    }

    /// 以单写者语义执行请求
    ///
    /// 同一个键同时只有一个 `execute` 在运行；其余调用者等待并得到同一个响应。
    pub async fn get_or_execute<F, Fut>(&self, key: &str, execute: F) -> IdempotentOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CachedResponse>,
    {
        let slot = self.slot_for(key);

        let mut executed = false;
        let response = slot
            .cell
            .get_or_init(|| {
                executed = true;
                execute()
            })
            .await
            .clone();

        if executed {
            self.mark_completed(key, slot);
        }

        IdempotentOutcome {
            response,
            replayed: !executed,
        }
    }

    /// 删除所有过期条目，返回删除数量
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, slot| !slot.is_expired(now, self.ttl));
        self.completed_queue()
            .retain(|(_, slot)| !slot.is_expired(now, self.ttl));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 启动后台清理任务
    pub fn spawn_sweeper(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let purged = self.purge_expired();
                if purged > 0 {
                    debug!("Purged {} expired idempotency entries", purged);
                }
            }
        })
    }

    fn slot_for(&self, key: &str) -> Arc<Slot> {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Slot::new(now)));

        if entry.is_expired(now, self.ttl) {
            *entry = Arc::new(Slot::new(now));
        }

        Arc::clone(entry.value())
    }

    fn completed_queue(&self) -> MutexGuard<'_, VecDeque<(String, Arc<Slot>)>> {
        self.completed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mark_completed(&self, key: &str, slot: Arc<Slot>) {
        let mut queue = self.completed_queue();
        queue.push_back((key.to_string(), slot));
        self.evict_if_needed(&mut queue);
    }

    /// 从队首开始淘汰，直到条目数回到容量以内
    ///
    /// 队列中的槽位若已被清理或替换则直接丢弃，不影响映射。
    fn evict_if_needed(&self, queue: &mut VecDeque<(String, Arc<Slot>)>) {
        let mut evicted = 0;
        while self.entries.len() > self.max_entries {
            let Some((key, slot)) = queue.pop_front() else {
                break;
            };
            if self
                .entries
                .remove_if(&key, |_, current| Arc::ptr_eq(current, &slot))
                .is_some()
            {
                evicted += 1;
            }
        }

        if evicted > 0 {
            debug!("Evicted {} idempotency entries", evicted);
        }
    }
}
