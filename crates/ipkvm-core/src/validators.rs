//! Request input validation.
//!
//! Every function returns [`ApiError::Validation`] on rejection, which the
//! response layer maps to HTTP 400.

use serde_json::Value;

use crate::errors::{ApiError, ApiResult};
use crate::types::{AtxButton, AtxPowerAction};

/// Validate a username: `[a-z_][a-z0-9_-]*`, at most 32 chars.
pub fn valid_user(user: &str) -> ApiResult<String> {
    let mut chars = user.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    let tail_ok = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if head_ok && tail_ok && user.len() <= 32 {
        Ok(user.to_owned())
    } else {
        Err(ApiError::Validation(format!("invalid user name: {user:?}")))
    }
}

/// Validate a password (presence only; content is the auth backend's concern).
pub fn valid_passwd(passwd: &str) -> ApiResult<String> {
    Ok(passwd.to_owned())
}

/// Validate an auth token: exactly 64 lowercase hex chars.
pub fn valid_auth_token(token: &str) -> ApiResult<String> {
    if token.len() == 64
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    {
        Ok(token.to_owned())
    } else {
        Err(ApiError::Validation("invalid auth token".into()))
    }
}

/// Validate an MSD image name: `[A-Za-z0-9._-]+`, no leading dot, ≤ 255 chars.
pub fn valid_msd_image_name(name: &str) -> ApiResult<String> {
    let chars_ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-');
    if chars_ok && !name.starts_with('.') && name.len() <= 255 {
        Ok(name.to_owned())
    } else {
        Err(ApiError::Validation(format!("invalid image name: {name:?}")))
    }
}

/// Validate a log seek offset (seconds back from now).
pub fn valid_log_seek(seek: &str) -> ApiResult<u64> {
    seek.parse::<u64>()
        .map_err(|_| ApiError::Validation(format!("invalid log seek: {seek:?}")))
}

/// Validate a bool-like string: true/false, 1/0, yes/no, on/off.
pub fn valid_bool(value: &str) -> ApiResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ApiError::Validation(format!("invalid bool: {value:?}"))),
    }
}

/// Validate a bool-like JSON value (real bool or bool-like string).
pub fn valid_bool_value(value: &Value) -> ApiResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => valid_bool(s),
        other => Err(ApiError::Validation(format!("invalid bool: {other}"))),
    }
}

/// Validate a stream quality percentage: 1..=100.
pub fn valid_stream_quality(value: &str) -> ApiResult<u32> {
    match value.parse::<u32>() {
        Ok(q) if (1..=100).contains(&q) => Ok(q),
        _ => Err(ApiError::Validation(format!("invalid quality: {value:?}"))),
    }
}

/// Validate a desired frame rate: 0..=120 (0 = unlimited).
pub fn valid_stream_fps(value: &str) -> ApiResult<u32> {
    match value.parse::<u32>() {
        Ok(fps) if fps <= 120 => Ok(fps),
        _ => Err(ApiError::Validation(format!("invalid fps: {value:?}"))),
    }
}

/// Validate an HID key name: `[A-Za-z0-9]+`, at most 32 chars.
pub fn valid_hid_key(key: &str) -> ApiResult<String> {
    if !key.is_empty() && key.len() <= 32 && key.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(key.to_owned())
    } else {
        Err(ApiError::Validation(format!("invalid key: {key:?}")))
    }
}

/// Validate a mouse button name.
pub fn valid_hid_mouse_button(button: &str) -> ApiResult<String> {
    match button {
        "left" | "right" | "middle" | "up" | "down" => Ok(button.to_owned()),
        _ => Err(ApiError::Validation(format!("invalid mouse button: {button:?}"))),
    }
}

/// Validate an absolute mouse coordinate: -32768..=32767.
pub fn valid_hid_mouse_move(value: i64) -> ApiResult<i32> {
    if (-32768..=32767).contains(&value) {
        #[allow(clippy::cast_possible_truncation)]
        Ok(value as i32)
    } else {
        Err(ApiError::Validation(format!("mouse move out of range: {value}")))
    }
}

/// Validate a mouse wheel delta: -127..=127.
pub fn valid_hid_mouse_wheel(value: i64) -> ApiResult<i32> {
    if (-127..=127).contains(&value) {
        #[allow(clippy::cast_possible_truncation)]
        Ok(value as i32)
    } else {
        Err(ApiError::Validation(format!("mouse wheel out of range: {value}")))
    }
}

/// Validate an ATX power action name.
pub fn valid_atx_power_action(value: &str) -> ApiResult<AtxPowerAction> {
    match value {
        "on" => Ok(AtxPowerAction::On),
        "off" => Ok(AtxPowerAction::Off),
        "off_hard" => Ok(AtxPowerAction::OffHard),
        "reset_hard" => Ok(AtxPowerAction::ResetHard),
        _ => Err(ApiError::Validation(format!("invalid power action: {value:?}"))),
    }
}

/// Validate an ATX button name.
pub fn valid_atx_button(value: &str) -> ApiResult<AtxButton> {
    match value {
        "power" => Ok(AtxButton::Power),
        "power_long" => Ok(AtxButton::PowerLong),
        "reset" => Ok(AtxButton::Reset),
        _ => Err(ApiError::Validation(format!("invalid button: {value:?}"))),
    }
}
