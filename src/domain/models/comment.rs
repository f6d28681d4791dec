// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 工单评论
///
/// 只追加，不修改也不删除。`parent_id` 指向同一工单下的另一条评论，构成回复树。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i32,
    pub ticket_id: Uuid,
    pub parent_id: Option<i32>,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<FixedOffset>,
}

/// 待写入的评论
#[derive(Debug, Clone)]
pub struct NewComment {
    pub ticket_id: Uuid,
    pub parent_id: Option<i32>,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<FixedOffset>,
}
