//! ルーム・卓・記録の操作。ハンドラから呼ばれ、検証・権限確認・DB更新・変更通知を行う。

pub mod records;
pub mod rooms;
pub mod tables;
pub mod users;

use jansou_common::code::RoomCode;

use crate::AppState;
use crate::db;
use crate::db::models::{RoomRow, TableRow};
use crate::error::AppError;
use crate::types::{RoomId, TableId, UserId};

/// コードから有効期限内のルームを引く。期限切れも存在しないものとして扱う。
pub(crate) async fn live_room(state: &AppState, code: &str) -> Result<RoomRow, AppError> {
    let code = RoomCode::parse(code)?;
    db::rooms::get_live_room_by_code(&state.pool, code.as_str())
        .await?
        .ok_or_else(|| AppError::NotFound("room not found".into()))
}

pub(crate) async fn require_member(
    state: &AppState,
    room_id: &RoomId,
    user_id: &UserId,
) -> Result<(), AppError> {
    if !db::rooms::is_member(&state.pool, room_id, user_id).await? {
        return Err(AppError::Forbidden("not a member of this room".into()));
    }
    Ok(())
}

/// 卓を取得し、呼び出し元がその卓のルームのメンバーであることを確認する。
pub(crate) async fn member_table(
    state: &AppState,
    table_id: &TableId,
    user_id: &UserId,
) -> Result<(TableRow, RoomId), AppError> {
    let table = db::tables::get_table(&state.pool, table_id)
        .await?
        .ok_or_else(|| AppError::NotFound("table not found".into()))?;
    let room_id = RoomId(table.room_id.clone());
    require_member(state, &room_id, user_id).await?;
    Ok((table, room_id))
}
