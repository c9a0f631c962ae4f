//! ルーム・卓の変更通知。
//!
//! 変更内容そのものは配信せず「再取得してほしい」ことだけを伝える。
//! クライアントは受信したら該当リソースを GET し直す。

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, RwLock};

use axum::response::sse::Event;
use futures_util::Stream;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::types::{RoomId, TableId};

/// トピックごとのバッファ。溢れた購読者には `resync` を送る。
const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum ChangeEvent {
    /// メンバー追加・卓作成
    RoomUpdated { room_id: String },
    /// 着席・退席・BOT追加・状態変更
    TableUpdated { table_id: String },
    GameRecorded { table_id: String },
    MatchRecorded { table_id: String },
    /// 取りこぼしがあったので全体を取り直す
    Resync,
}

impl ChangeEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::RoomUpdated { .. } => "room-updated",
            Self::TableUpdated { .. } => "table-updated",
            Self::GameRecorded { .. } => "game-recorded",
            Self::MatchRecorded { .. } => "match-recorded",
            Self::Resync => "resync",
        }
    }
}

pub fn room_topic(room_id: &RoomId) -> String {
    format!("room:{room_id}")
}

pub fn table_topic(table_id: &TableId) -> String {
    format!("table:{table_id}")
}

/// In-process fan-out of [ChangeEvent]s keyed by topic.
#[derive(Clone, Default)]
pub struct EventHub {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<ChangeEvent>>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// 購読のたびに、購読者のいなくなったトピックを片付ける。
    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<ChangeEvent> {
        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        channels.retain(|_, sender| sender.receiver_count() > 0);
        channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// 購読者がいなければ何もしない。最後の購読者が去ったチャンネルはここで片付ける。
    pub fn publish(&self, topic: &str, event: ChangeEvent) {
        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        let Some(sender) = channels.get(topic) else {
            return;
        };
        if sender.send(event).is_err() {
            channels.remove(topic);
        }
    }

    /// 卓の変更は卓とルームの両方に流す（ルーム画面に卓の状態が出るため）。
    pub fn publish_table(&self, room_id: &RoomId, table_id: &TableId, event: ChangeEvent) {
        self.publish(&table_topic(table_id), event.clone());
        self.publish(&room_topic(room_id), event);
    }

    /// 購読者のいないトピックを削除し、削除件数を返す。定期クリーンアップから呼ぶ。
    pub fn prune(&self) -> usize {
        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        let before = channels.len();
        channels.retain(|_, sender| sender.receiver_count() > 0);
        before - channels.len()
    }

    #[cfg(test)]
    fn topic_count(&self) -> usize {
        self.channels.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

fn to_sse(event: &ChangeEvent) -> Event {
    let data = serde_json::to_string(event).unwrap_or_else(|e| {
        tracing::warn!("failed to serialize change event: {e}");
        r#"{"type":"resync"}"#.to_string()
    });
    Event::default().event(event.name()).data(data)
}

/// broadcast 受信を SSE のイベント列に変換する。送信側が消えたら終了。
pub fn sse_stream(
    rx: broadcast::Receiver<ChangeEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    futures_util::stream::unfold(rx, |mut rx| async move {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "subscriber lagged, requesting resync");
                ChangeEvent::Resync
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        };
        Some((Ok(to_sse(&event)), rx))
    })
}
