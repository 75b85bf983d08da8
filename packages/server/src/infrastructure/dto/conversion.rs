//! Conversion from domain snapshots to HTTP DTOs.

use tsunagi_shared::time::millis_to_jst_rfc3339;

use crate::domain::{MemberSnapshot, RoomSnapshot, Timestamp};
use crate::infrastructure::dto::http::{MemberDetailDto, RoomDetailDto, RoomSummaryDto};

fn format_timestamp(timestamp: Timestamp) -> String {
    millis_to_jst_rfc3339(timestamp.value()).unwrap_or_default()
}

impl From<RoomSnapshot> for RoomSummaryDto {
    fn from(snapshot: RoomSnapshot) -> Self {
        Self {
            name: snapshot.name.into_string(),
            members: snapshot
                .members
                .into_iter()
                .map(|member| member.name.into_string())
                .collect(),
            created_at: format_timestamp(snapshot.created_at),
        }
    }
}

impl From<MemberSnapshot> for MemberDetailDto {
    fn from(member: MemberSnapshot) -> Self {
        Self {
            name: member.name.into_string(),
            joined_at: format_timestamp(member.joined_at),
        }
    }
}

impl From<RoomSnapshot> for RoomDetailDto {
    fn from(snapshot: RoomSnapshot) -> Self {
        Self {
            name: snapshot.name.into_string(),
            members: snapshot.members.into_iter().map(Into::into).collect(),
            created_at: format_timestamp(snapshot.created_at),
        }
    }
}
