//! Event repository (数据库访问层)

use crate::{
    error::AppError,
    models::event::{CreateEventRequest, Event, EventFilters, EventWithStats, UpdateEventRequest},
};
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// 事件列表查询共用的 SELECT 前缀：事件行 + 组织者姓名 + 有效报名数
const EVENT_WITH_STATS_SELECT: &str = r#"
    SELECT
        e.*,
        (u.first_name || ' ' || u.last_name) AS organizer_name,
        COALESCE(en.cnt, 0) AS active_enrollments
    FROM events e
    JOIN users u ON u.id = e.organizer_id
    LEFT JOIN (
        SELECT event_id, COUNT(*) AS cnt
        FROM enrollments
        WHERE active
        GROUP BY event_id
    ) en ON en.event_id = e.id
"#;

pub struct EventRepository {
    db: PgPool,
}

impl EventRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 创建事件
    pub async fn create(
        &self,
        organizer_id: Uuid,
        req: &CreateEventRequest,
    ) -> Result<Event, AppError> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (
                kind, title, description, start_date, end_date,
                start_time, end_time, venue, total_seats,
                organizer_id, professor_id, banner_path
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(req.kind.as_str())
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.start_date)
        .bind(req.end_date)
        .bind(req.start_time)
        .bind(req.end_time)
        .bind(&req.venue)
        .bind(req.total_seats)
        .bind(organizer_id)
        .bind(req.professor_id)
        .bind(&req.banner_path)
        .fetch_one(&self.db)
        .await?;

        Ok(event)
    }

    /// 更新事件（组织者字段不可变更）
    pub async fn update(&self, id: Uuid, req: &UpdateEventRequest) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET
                kind = COALESCE($2, kind),
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                start_date = COALESCE($5, start_date),
                end_date = COALESCE($6, end_date),
                start_time = COALESCE($7, start_time),
                end_time = COALESCE($8, end_time),
                venue = COALESCE($9, venue),
                total_seats = COALESCE($10, total_seats),
                professor_id = COALESCE($11, professor_id),
                banner_path = COALESCE($12, banner_path),
                active = COALESCE($13, active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(req.kind.map(|k| k.as_str()))
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.start_date)
        .bind(req.end_date)
        .bind(req.start_time)
        .bind(req.end_time)
        .bind(&req.venue)
        .bind(req.total_seats)
        .bind(req.professor_id)
        .bind(&req.banner_path)
        .bind(req.active)
        .fetch_optional(&self.db)
        .await?;

        Ok(event)
    }

    /// 根据 ID 查找事件
    pub async fn find_by_id(&self, id: &Uuid) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(event)
    }

    /// 根据 ID 查找事件（附带统计信息）
    pub async fn find_with_stats(&self, id: &Uuid) -> Result<Option<EventWithStats>, AppError> {
        let query = format!("{} WHERE e.id = $1", EVENT_WITH_STATS_SELECT);

        let event = sqlx::query_as::<_, EventWithStats>(&query)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(event)
    }

    /// 删除事件（报名级联删除）
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 公开事件列表：仅有效事件，支持搜索/类型/状态过滤
    pub async fn list(
        &self,
        filters: &EventFilters,
        today: NaiveDate,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<EventWithStats>, AppError> {
        let mut query = format!("{} WHERE e.active", EVENT_WITH_STATS_SELECT);
        let mut index = 0;

        if filters.search.is_some() {
            index += 1;
            query.push_str(&format!(
                " AND (e.title ILIKE ${} OR e.description ILIKE ${})",
                index, index
            ));
        }
        if filters.kind.is_some() {
            index += 1;
            query.push_str(&format!(" AND e.kind = ${}", index));
        }
        match filters.status.as_deref() {
            Some("open") => {
                index += 1;
                query.push_str(&format!(" AND e.start_date >= ${}", index));
            }
            Some("closed") => {
                index += 1;
                query.push_str(&format!(" AND e.start_date < ${}", index));
            }
            _ => {}
        }

        query.push_str(&format!(
            " ORDER BY e.start_date, e.start_time LIMIT ${} OFFSET ${}",
            index + 1,
            index + 2
        ));

        let mut query_builder = sqlx::query_as::<_, EventWithStats>(&query);

        if let Some(search) = &filters.search {
            query_builder = query_builder.bind(format!("%{}%", search));
        }
        if let Some(kind) = filters.kind {
            query_builder = query_builder.bind(kind.as_str());
        }
        if matches!(filters.status.as_deref(), Some("open") | Some("closed")) {
            query_builder = query_builder.bind(today);
        }

        let events = query_builder.bind(limit).bind(offset).fetch_all(&self.db).await?;

        Ok(events)
    }

    /// API 事件列表：仅有效且尚未开始的事件
    pub async fn list_upcoming(
        &self,
        today: NaiveDate,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<EventWithStats>, AppError> {
        let query = format!(
            "{} WHERE e.active AND e.start_date >= $1 ORDER BY e.start_date, e.start_time LIMIT $2 OFFSET $3",
            EVENT_WITH_STATS_SELECT
        );

        let events = sqlx::query_as::<_, EventWithStats>(&query)
            .bind(today)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await?;

        Ok(events)
    }

    /// 某组织者的事件列表
    pub async fn list_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<EventWithStats>, AppError> {
        let query = format!(
            "{} WHERE e.organizer_id = $1 ORDER BY e.start_date DESC, e.start_time",
            EVENT_WITH_STATS_SELECT
        );

        let events = sqlx::query_as::<_, EventWithStats>(&query)
            .bind(organizer_id)
            .fetch_all(&self.db)
            .await?;

        Ok(events)
    }

    /// 统计有效事件数量
    pub async fn count_active(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query("SELECT COUNT(*) FROM events WHERE active")
            .fetch_one(&self.db)
            .await?
            .get(0);

        Ok(count)
    }
}
