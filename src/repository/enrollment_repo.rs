//! Enrollment repository (数据库访问层)
//!
//! 报名创建在单个事务内完成容量检查与插入：先对事件行加锁，
//! 再统计有效报名数，避免并发请求同时通过容量检查导致超额。

use crate::{
    error::AppError,
    models::{
        enrollment::{Enrollment, EnrollmentWithEvent, EnrollmentWithUser},
        event::Event,
    },
};
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub struct EnrollmentRepository {
    db: PgPool,
}

impl EnrollmentRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 在容量允许的前提下创建报名（事务 + 事件行锁）
    ///
    /// 服务层已完成角色与重复报名等资格检查；容量与事件状态在锁内复查，
    /// 因为它们可能在检查与插入之间被并发请求改变。
    pub async fn enroll_within_capacity(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        today: NaiveDate,
    ) -> Result<Enrollment, AppError> {
        let mut tx = self.db.begin().await?;

        // 锁定事件行：同一事件的并发报名在此串行化
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1 FOR UPDATE")
            .bind(event_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found("event"))?;

        if !event.active {
            return Err(AppError::validation("event: is no longer active"));
        }

        if event.has_ended(today) {
            return Err(AppError::validation("event: has already taken place"));
        }

        let taken: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM enrollments WHERE event_id = $1 AND active")
                .bind(event_id)
                .fetch_one(&mut *tx)
                .await?;

        if taken >= event.total_seats as i64 {
            return Err(AppError::validation("event: has no seats available"));
        }

        let duplicate: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM enrollments WHERE user_id = $1 AND event_id = $2 AND active",
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?;

        if duplicate.is_some() {
            return Err(AppError::validation("enrollment: already enrolled in this event"));
        }

        let enrollment = sqlx::query_as::<_, Enrollment>(
            r#"
            INSERT INTO enrollments (user_id, event_id)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(enrollment)
    }

    /// 取消报名：仅限本人的有效报名，逻辑删除
    pub async fn cancel(
        &self,
        enrollment_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Enrollment>, AppError> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            r#"
            UPDATE enrollments
            SET active = FALSE, cancelled_at = NOW()
            WHERE id = $1 AND user_id = $2 AND active
            RETURNING *
            "#,
        )
        .bind(enrollment_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(enrollment)
    }

    /// 根据 ID 查找报名
    pub async fn find_by_id(&self, id: &Uuid) -> Result<Option<Enrollment>, AppError> {
        let enrollment = sqlx::query_as::<_, Enrollment>("SELECT * FROM enrollments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(enrollment)
    }

    /// 查找某用户在某事件的有效报名
    pub async fn find_active(
        &self,
        user_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<Enrollment>, AppError> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            "SELECT * FROM enrollments WHERE user_id = $1 AND event_id = $2 AND active",
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(enrollment)
    }

    /// 某用户的全部报名（含已取消），附带事件摘要
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<EnrollmentWithEvent>, AppError> {
        let enrollments = sqlx::query_as::<_, EnrollmentWithEvent>(
            r#"
            SELECT
                en.id, en.event_id, en.active, en.enrolled_at, en.cancelled_at,
                e.title AS event_title, e.kind AS event_kind,
                e.start_date, e.end_date, e.start_time, e.venue
            FROM enrollments en
            JOIN events e ON e.id = en.event_id
            WHERE en.user_id = $1
            ORDER BY en.enrolled_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(enrollments)
    }

    /// 某用户的有效报名，附带事件摘要
    pub async fn list_active_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<EnrollmentWithEvent>, AppError> {
        let enrollments = sqlx::query_as::<_, EnrollmentWithEvent>(
            r#"
            SELECT
                en.id, en.event_id, en.active, en.enrolled_at, en.cancelled_at,
                e.title AS event_title, e.kind AS event_kind,
                e.start_date, e.end_date, e.start_time, e.venue
            FROM enrollments en
            JOIN events e ON e.id = en.event_id
            WHERE en.user_id = $1 AND en.active
            ORDER BY en.enrolled_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(enrollments)
    }

    /// 某事件的有效报名名单，附带参与者信息与证书状态
    pub async fn list_active_by_event(
        &self,
        event_id: Uuid,
    ) -> Result<Vec<EnrollmentWithUser>, AppError> {
        let enrollments = sqlx::query_as::<_, EnrollmentWithUser>(
            r#"
            SELECT
                en.id, en.user_id, en.active, en.enrolled_at,
                u.username, u.first_name, u.last_name, u.email, u.institution,
                c.id AS certificate_id
            FROM enrollments en
            JOIN users u ON u.id = en.user_id
            LEFT JOIN certificates c ON c.enrollment_id = en.id
            WHERE en.event_id = $1 AND en.active
            ORDER BY en.enrolled_at
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.db)
        .await?;

        Ok(enrollments)
    }

    /// 某事件的有效报名数
    pub async fn count_active_for_event(&self, event_id: Uuid) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query("SELECT COUNT(*) FROM enrollments WHERE event_id = $1 AND active")
                .bind(event_id)
                .fetch_one(&self.db)
                .await?
                .get(0);

        Ok(count)
    }

    /// 某组织者名下所有事件的有效报名数（仪表盘）
    pub async fn count_active_for_organizer(&self, organizer_id: Uuid) -> Result<i64, AppError> {
        let count: i64 = sqlx::query(
            r#"
            SELECT COUNT(*)
            FROM enrollments en
            JOIN events e ON e.id = en.event_id
            WHERE e.organizer_id = $1 AND en.active
            "#,
        )
        .bind(organizer_id)
        .fetch_one(&self.db)
        .await?
        .get(0);

        Ok(count)
    }
}
