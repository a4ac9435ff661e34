//! Business logic services

pub mod books;
pub mod email;
pub mod loans;
pub mod notifications;

use std::sync::Arc;

use crate::{config::NotificationsConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub loans: loans::LoansService,
    pub notifications: notifications::LateLoanNotifier,
}

impl Services {
    /// Create all services with the given repository and mail transport
    pub fn new(
        repository: Repository,
        mailer: Arc<dyn email::MailSender>,
        notifications_config: NotificationsConfig,
    ) -> Self {
        let loans = loans::LoansService::new(repository.clone());
        Self {
            books: books::BooksService::new(repository),
            notifications: notifications::LateLoanNotifier::new(
                loans.clone(),
                mailer,
                notifications_config,
            ),
            loans,
        }
    }
}
