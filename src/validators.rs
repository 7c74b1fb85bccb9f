//! 自定义字段校验器
//! 密码强度与电话号码格式

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use validator::ValidationError;

static LETTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-zA-Z]").unwrap());
static DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").unwrap());
static SPECIAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[!@#$%^&*(),.?":{}|<>]"#).unwrap());

// 接受 (XX) XXXXX-XXXX / (XX) XXXX-XXXX 或纯数字形式
static PHONE_MASKED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\(\d{2}\)\s?\d{4,5}-\d{4}$").unwrap());
static PHONE_PLAIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?\d{10,11}$").unwrap());

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// 强密码校验：最少 8 位，包含字母、数字和特殊字符
pub fn validate_strong_password(value: &str) -> Result<(), ValidationError> {
    if value.len() < 8 {
        return Err(error("password_too_short", "must be at least 8 characters"));
    }

    if !LETTER_RE.is_match(value) {
        return Err(error("password_no_letter", "must contain at least one letter"));
    }

    if !DIGIT_RE.is_match(value) {
        return Err(error("password_no_digit", "must contain at least one digit"));
    }

    if !SPECIAL_RE.is_match(value) {
        return Err(error(
            "password_no_special",
            "must contain at least one special character",
        ));
    }

    Ok(())
}

/// 电话号码校验：区号加号码共 10-11 位数字
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();

    if !(10..=11).contains(&digits.len()) {
        return Err(error(
            "invalid_phone_length",
            "must contain 10 or 11 digits (area code + number)",
        ));
    }

    if !PHONE_MASKED_RE.is_match(value) && !PHONE_PLAIN_RE.is_match(value) {
        return Err(error(
            "invalid_phone_format",
            "must look like (XX) XXXXX-XXXX or a plain digit string",
        ));
    }

    Ok(())
}
