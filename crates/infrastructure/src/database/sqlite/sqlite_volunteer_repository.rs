use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use dispatch_core::{DispatchError, DispatchResult};
use dispatch_domain::entities::{GeoPoint, VolunteerRecord};
use dispatch_domain::repositories::VolunteerRepository;

pub struct SqliteVolunteerRepository {
    pool: SqlitePool,
}

impl SqliteVolunteerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_volunteer(row: &sqlx::sqlite::SqliteRow) -> DispatchResult<VolunteerRecord> {
        let location_lat: Option<f64> = row.try_get("location_lat")?;
        let location_lng: Option<f64> = row.try_get("location_lng")?;
        let location = match (location_lat, location_lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        };

        Ok(VolunteerRecord {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            location,
            skills: row.try_get("skills")?,
            experience: row.try_get("experience")?,
            languages: row.try_get("languages")?,
            notes: row.try_get("notes")?,
            is_volunteer: row.try_get("is_volunteer")?,
            volunteer_status: row.try_get("volunteer_status")?,
        })
    }

    /// 写入志愿者目录记录（志愿者注册流程在本核心范围之外，测试和种子数据使用）
    pub async fn create(&self, volunteer: &VolunteerRecord) -> DispatchResult<()> {
        sqlx::query(
            r#"
            INSERT INTO volunteers (id, username, location_lat, location_lng,
                                    skills, experience, languages, notes,
                                    is_volunteer, volunteer_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&volunteer.id)
        .bind(&volunteer.username)
        .bind(volunteer.location.map(|l| l.lat))
        .bind(volunteer.location.map(|l| l.lng))
        .bind(&volunteer.skills)
        .bind(&volunteer.experience)
        .bind(&volunteer.languages)
        .bind(&volunteer.notes)
        .bind(volunteer.is_volunteer)
        .bind(&volunteer.volunteer_status)
        .execute(&self.pool)
        .await
        .map_err(DispatchError::Database)?;
        Ok(())
    }
}

#[async_trait]
impl VolunteerRepository for SqliteVolunteerRepository {
    async fn get_approved_volunteers(&self) -> DispatchResult<Vec<VolunteerRecord>> {
        let rows = sqlx::query(
            "SELECT id, username, location_lat, location_lng, skills, experience,
                    languages, notes, is_volunteer, volunteer_status
             FROM volunteers
             WHERE is_volunteer = 1 AND volunteer_status = 'approved'",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DispatchError::Database)?;

        rows.iter().map(Self::row_to_volunteer).collect()
    }
}
