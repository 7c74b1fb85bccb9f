//! 数据模型模块
//! 用户、事件、报名、证书、审计与认证相关模型

pub mod audit;
pub mod auth;
pub mod certificate;
pub mod enrollment;
pub mod event;
pub mod user;

use serde::Deserialize;

/// 通用分页参数
#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    pub fn limit(&self, default: i64, max: i64) -> i64 {
        self.limit.unwrap_or(default).clamp(1, max)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::Pagination;

    #[test]
    fn test_pagination_defaults_and_clamping() {
        let p = Pagination::default();
        assert_eq!(p.limit(50, 100), 50);
        assert_eq!(p.offset(), 0);

        let p = Pagination {
            limit: Some(1000),
            offset: Some(-5),
        };
        assert_eq!(p.limit(50, 100), 100);
        assert_eq!(p.offset(), 0);
    }
}
