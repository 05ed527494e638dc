//! Notification boundary for finished export tasks.
//!
//! Mail delivery itself lives outside this crate; the worker only talks
//! to this trait. The default production wiring logs, which keeps the
//! worker testable and the SMTP integration swappable.

use async_trait::async_trait;

use crate::entity::{app_user, export_task};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn export_completed(
        &self,
        user: &app_user::Model,
        dataset_name: &str,
        task: &export_task::Model,
    );

    async fn export_failed(
        &self,
        user: &app_user::Model,
        dataset_name: &str,
        task: &export_task::Model,
        error: &str,
    );
}

/// Logs the notification instead of delivering mail.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn export_completed(
        &self,
        user: &app_user::Model,
        dataset_name: &str,
        task: &export_task::Model,
    ) {
        tracing::info!(
            user = %user.username,
            dataset = %dataset_name,
            task = %task.id,
            file = task.file_path.as_deref().unwrap_or(""),
            "export completed notification"
        );
    }

    async fn export_failed(
        &self,
        user: &app_user::Model,
        dataset_name: &str,
        task: &export_task::Model,
        error: &str,
    ) {
        tracing::warn!(
            user = %user.username,
            dataset = %dataset_name,
            task = %task.id,
            error = %error,
            "export failed notification"
        );
    }
}
