use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 经纬度坐标
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// 求助请求
///
/// 生命周期字段（status / current_volunteer_id / current_volunteer_index）
/// 只能通过仓储的 transition 操作修改，version 字段用于乐观并发控制。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpRequest {
    pub id: String,
    pub owner_id: String,
    pub location: Option<GeoPoint>,
    /// 请求者档案，作为排序上下文原样传递
    pub resume: serde_json::Value,
    pub status: RequestStatus,
    pub current_volunteer_id: Option<String>,
    pub current_volunteer_index: i64,
    pub last_response: Option<String>,
    pub last_responder_id: Option<String>,
    pub last_responded_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HelpRequest {
    pub fn new(id: impl Into<String>, owner_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            location: None,
            resume: serde_json::json!({}),
            status: RequestStatus::Open,
            current_volunteer_id: None,
            current_volunteer_index: 0,
            last_response: None,
            last_responder_id: None,
            last_responded_at: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            RequestStatus::Assigned | RequestStatus::NoVolunteers
        )
    }
}

/// 求助请求生命周期状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RequestStatus {
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "processing")]
    Processing,
    #[serde(rename = "awaiting_volunteer")]
    AwaitingVolunteer,
    #[serde(rename = "assigned")]
    Assigned,
    #[serde(rename = "no_volunteers")]
    NoVolunteers,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Open => "open",
            RequestStatus::Processing => "processing",
            RequestStatus::AwaitingVolunteer => "awaiting_volunteer",
            RequestStatus::Assigned => "assigned",
            RequestStatus::NoVolunteers => "no_volunteers",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl sqlx::Type<sqlx::Sqlite> for RequestStatus {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <str as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for RequestStatus {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        match s {
            "open" => Ok(RequestStatus::Open),
            "processing" => Ok(RequestStatus::Processing),
            "awaiting_volunteer" => Ok(RequestStatus::AwaitingVolunteer),
            "assigned" => Ok(RequestStatus::Assigned),
            "no_volunteers" => Ok(RequestStatus::NoVolunteers),
            _ => Err(format!("Invalid request status: {s}").into()),
        }
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for RequestStatus {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Sqlite>>::encode(self.as_str(), buf)
    }
}

/// 志愿者目录记录
///
/// 池构建器读取的原始志愿者行，资格过滤（is_volunteer + approved）在仓储查询中完成。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolunteerRecord {
    pub id: String,
    pub username: Option<String>,
    pub location: Option<GeoPoint>,
    pub skills: Option<String>,
    pub experience: Option<String>,
    pub languages: Option<String>,
    pub notes: Option<String>,
    pub is_volunteer: bool,
    pub volunteer_status: String,
}

/// 候选志愿者记录（未排序）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    pub volunteer_id: String,
    pub distance_km: f64,
    pub profile: CandidateProfile,
}

/// 候选志愿者档案，原样传递给排序服务，核心不解释其内容
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub username: Option<String>,
    pub skills: Option<String>,
    pub experience: Option<String>,
    pub languages: Option<String>,
    pub notes: Option<String>,
}

/// 排序结果中的单个候选人
///
/// 线上格式为camelCase，四个字段全部必填，缺失或类型不符即解析失败。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCandidate {
    pub volunteer_id: String,
    pub score: f64,
    pub distance_km: f64,
    pub reason: String,
}

/// 排序结果
///
/// 每个请求恰好创建一次，创建后不可变；index 0 为最优候选。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedList {
    pub request_id: String,
    pub ranked: Vec<RankedCandidate>,
    pub created_at: DateTime<Utc>,
}

impl RankedList {
    pub fn new(request_id: impl Into<String>, ranked: Vec<RankedCandidate>) -> Self {
        Self {
            request_id: request_id.into(),
            ranked,
            created_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    pub fn volunteer_at(&self, index: i64) -> Option<&RankedCandidate> {
        usize::try_from(index).ok().and_then(|i| self.ranked.get(i))
    }
}
