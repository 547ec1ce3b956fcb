use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Stable machine-readable code, present on failures that have one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            code: None,
        }
    }

    pub fn error_with_code(message: impl Into<String>, code: &'static str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            code: Some(code),
        }
    }
}

/// Generic success payload for operations with nothing else to return.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct RequestVerificationRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetSubmit {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct VerificationStatusDto {
    pub status: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookmarkRequest {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub show_text: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeleteBookmarkRequest {
    pub id: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookmarkRequest {
    pub id: i32,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub show_text: bool,
}

#[derive(Debug, Serialize)]
pub struct BookmarkDto {
    pub id: i32,
    pub title: String,
    pub url: String,
    pub icon_url: Option<String>,
    pub show_text: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<crate::db::Bookmark> for BookmarkDto {
    fn from(bookmark: crate::db::Bookmark) -> Self {
        Self {
            id: bookmark.id,
            title: bookmark.title,
            url: bookmark.url,
            icon_url: bookmark.icon_url,
            show_text: bookmark.show_text,
            created_at: bookmark.created_at,
            updated_at: bookmark.updated_at,
        }
    }
}
