// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::CrawlTask;
use parking_lot::Mutex;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use tokio::time::Instant;

/// 出队结果
#[derive(Debug)]
pub enum Popped {
    /// 有就绪任务
    Task(CrawlTask),
    /// 队列非空但均未到期，给出最近的就绪时刻
    WaitUntil(Instant),
    /// 队列为空
    Empty,
}

struct Entry {
    ready_at: Instant,
    priority: i32,
    seq: u64,
    task: CrawlTask,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    /// 就绪时刻早者优先；同刻按优先级降序；再同按入队顺序
    fn cmp(&self, other: &Self) -> Ordering {
        self.ready_at
            .cmp(&other.ready_at)
            .then_with(|| other.priority.cmp(&self.priority))
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// 内存任务队列
///
/// 按（就绪时刻，优先级）排序的延迟队列。重试任务带着
/// 未来的就绪时刻回到同一个队列，在到期之前不会被弹出，
/// 与新任务之间不存在单独的重试通道。
pub struct TaskQueue {
    inner: Mutex<QueueInner>,
}

struct QueueInner {
    heap: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
}

impl TaskQueue {
    /// 创建新的空队列
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                heap: BinaryHeap::new(),
                next_seq: 0,
            }),
        }
    }

    /// 任务入队
    ///
    /// # 参数
    ///
    /// * `task` - 待调度任务
    /// * `ready_at` - 任务可被弹出的最早时刻
    pub fn push(&self, task: CrawlTask, ready_at: Instant) {
        let mut inner = self.inner.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.heap.push(Reverse(Entry {
            ready_at,
            priority: task.priority,
            seq,
            task,
        }));
    }

    /// 弹出一个就绪任务
    ///
    /// # 参数
    ///
    /// * `now` - 当前时刻
    ///
    /// # 返回值
    ///
    /// * `Popped::Task` - 最优先的就绪任务
    /// * `Popped::WaitUntil` - 暂无就绪任务时最近的就绪时刻
    /// * `Popped::Empty` - 队列为空
    pub fn pop_ready(&self, now: Instant) -> Popped {
        let mut inner = self.inner.lock();
        match inner.heap.peek() {
            None => return Popped::Empty,
            Some(Reverse(entry)) if entry.ready_at > now => {
                return Popped::WaitUntil(entry.ready_at)
            }
            Some(_) => {}
        }
        match inner.heap.pop() {
            Some(Reverse(entry)) => Popped::Task(entry.task),
            None => Popped::Empty,
        }
    }

    /// 清空队列并取出全部任务（无视就绪时刻）
    ///
    /// 取消运行时用于给未执行的任务补发终态。
    pub fn drain(&self) -> Vec<CrawlTask> {
        let mut inner = self.inner.lock();
        inner
            .heap
            .drain()
            .map(|Reverse(entry)| entry.task)
            .collect()
    }

    /// 队列中的任务数（含未就绪）
    pub fn len(&self) -> usize {
        self.inner.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
