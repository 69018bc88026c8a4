use axum_helpers::Normalize;
use domain_notifications::{CancellationToken, EventType, UserNotifier};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::task::TaskTracker;
use tracing::error;
use uuid::Uuid;
use validator::Validate;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, ListUsersQuery, Pagination, UpdateUser, User, UserPage};
use crate::repository::UserRepository;

/// Service layer for User business logic
///
/// Every successful mutation is followed by a notification. The notifier
/// returns `()`, so delivery trouble can never change what the caller gets.
///
/// Delivery runs on a task of its own. The caller waits for it, but a caller
/// that goes away (client disconnect, request timeout) does not abandon it:
/// the event is still delivered or dead-lettered.
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
    notifier: Arc<dyn UserNotifier>,
    shutdown: CancellationToken,
    deliveries: TaskTracker,
    notify_deadline: Option<Duration>,
}

impl<R: UserRepository> UserService<R> {
    /// `shutdown` is the parent of every delivery's cancellation token;
    /// cancelling it cuts pending retries short and sends those events to the
    /// dead-letter store.
    pub fn new(repository: R, notifier: Arc<dyn UserNotifier>, shutdown: CancellationToken) -> Self {
        Self {
            repository: Arc::new(repository),
            notifier,
            shutdown,
            deliveries: TaskTracker::new(),
            notify_deadline: None,
        }
    }

    /// Track delivery tasks on `tracker` so shutdown can wait for them.
    pub fn with_delivery_tracker(mut self, tracker: TaskTracker) -> Self {
        self.deliveries = tracker;
        self
    }

    /// Cancel a delivery that is still retrying after `deadline`.
    ///
    /// Keep this below the request timeout so the response is written after
    /// the event has been published or dead-lettered.
    pub fn with_notify_deadline(mut self, deadline: Duration) -> Self {
        self.notify_deadline = Some(deadline);
        self
    }

    async fn notify(&self, event_type: EventType, user_id: Uuid) {
        let notifier = self.notifier.clone();
        let cancel = self.shutdown.child_token();
        let deadline = self.notify_deadline;

        let delivery = self.deliveries.spawn(async move {
            let notify = notifier.notify(event_type, user_id, &cancel);
            tokio::pin!(notify);

            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout(deadline, &mut notify).await.is_err() {
                        // Remaining retries are cancelled; the event is dead-lettered
                        cancel.cancel();
                        notify.await;
                    }
                }
                None => notify.await,
            }
        });

        if let Err(err) = delivery.await {
            error!(%user_id, %event_type, error = %err, "User event delivery task failed");
        }
    }

    pub async fn create_user(&self, mut input: CreateUser) -> UserResult<User> {
        input.normalize();
        input.validate()?;

        if self.repository.email_exists(&input.email).await? {
            return Err(UserError::DuplicateEmail(input.email));
        }

        let created = self.repository.create(User::new(input)).await?;

        self.notify(EventType::UserCreated, created.id).await;

        Ok(created)
    }

    pub async fn get_user(&self, id: Uuid) -> UserResult<User> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    pub async fn list_users(&self, query: ListUsersQuery) -> UserResult<UserPage> {
        let limit = query.limit();
        let offset = query.offset();

        let total = self.repository.count().await?;
        let data = self.repository.list(limit, offset).await?;

        Ok(UserPage {
            data,
            pagination: Pagination {
                total,
                limit,
                offset,
            },
        })
    }

    pub async fn update_user(&self, id: Uuid, mut input: UpdateUser) -> UserResult<User> {
        input.normalize();
        input.validate()?;

        let mut user = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        if let Some(ref new_email) = input.email
            && *new_email != user.email
            && self.repository.email_exists(new_email).await?
        {
            return Err(UserError::DuplicateEmail(new_email.clone()));
        }

        user.apply_update(input);
        let updated = self.repository.update(user).await?;

        self.notify(EventType::UserUpdated, updated.id).await;

        Ok(updated)
    }

    pub async fn delete_user(&self, id: Uuid) -> UserResult<()> {
        if !self.repository.delete(id).await? {
            return Err(UserError::NotFound(id));
        }

        self.notify(EventType::UserDeleted, id).await;

        Ok(())
    }
}
