//! Daily overdue loan notification job

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use tokio::task::JoinHandle;

use super::{email::MailSender, loans::LoansService};
use crate::{
    config::NotificationsConfig,
    error::{AppError, AppResult},
    models::Loan,
};

#[derive(Clone)]
pub struct LateLoanNotifier {
    loans: LoansService,
    mailer: Arc<dyn MailSender>,
    config: NotificationsConfig,
}

impl LateLoanNotifier {
    pub fn new(loans: LoansService, mailer: Arc<dyn MailSender>, config: NotificationsConfig) -> Self {
        Self {
            loans,
            mailer,
            config,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.recipients.is_empty()
    }

    /// Send one e-mail listing every overdue loan. Returns the number of loans reported.
    pub async fn notify_late_loans(&self) -> AppResult<usize> {
        let late = self.loans.get_all_late_loans().await?;
        if late.is_empty() {
            tracing::debug!("No overdue loans");
            return Ok(0);
        }

        let body = compose_message(&late, &self.config.recipients);
        self.mailer
            .send(&self.config.subject, &body, &self.config.recipients)
            .await?;

        tracing::info!(loans = late.len(), "Overdue loan notification sent");
        Ok(late.len())
    }

    /// Run the job every day at the configured time until the runtime shuts down
    pub fn spawn(self) -> AppResult<JoinHandle<()>> {
        let send_at = self
            .config
            .send_time()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(tokio::spawn(async move {
            loop {
                let wait = until_next_run(Utc::now(), send_at);
                tracing::debug!(seconds = wait.as_secs(), "Next overdue loan check scheduled");
                tokio::time::sleep(wait).await;

                if let Err(e) = self.notify_late_loans().await {
                    tracing::error!("Overdue loan notification failed: {}", e);
                }
            }
        }))
    }
}

/// Plain-text body naming each overdue loan and the recipients
pub fn compose_message(late: &[Loan], recipients: &[String]) -> String {
    let mut body = String::from(
        "Attention! The following loans are overdue. \
         Please return the books as soon as possible.\n\n",
    );
    for loan in late {
        let _ = writeln!(
            body,
            "- \"{}\" (ISBN {}) loaned to {} on {}",
            loan.book.title, loan.book.isbn, loan.customer, loan.loan_date
        );
    }
    let _ = write!(body, "\nSent to: {}\n", recipients.join(", "));
    body
}

/// Time left until the next occurrence of `at` (UTC), strictly after `now`
pub fn until_next_run(now: DateTime<Utc>, at: NaiveTime) -> std::time::Duration {
    let mut next = now.date_naive().and_time(at).and_utc();
    if next <= now {
        next += Duration::days(1);
    }
    (next - now).to_std().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::Book,
        repository::Repository,
        services::{email::MockMailSender, loans::today},
    };
    use chrono::{NaiveDate, TimeZone};

    fn config(recipients: &[&str]) -> NotificationsConfig {
        NotificationsConfig {
            recipients: recipients.iter().map(|r| r.to_string()).collect(),
            ..Default::default()
        }
    }

    async fn loans_with_one_late() -> LoansService {
        let repository = Repository::in_memory();
        let service = LoansService::new(repository.clone());
        let book = repository
            .books
            .insert(&Book::new("Titulo", "Autor", "123456789"))
            .await
            .unwrap();
        service
            .save(&Loan::new(book, "Fulano", today() - Duration::days(5)))
            .await
            .unwrap();
        service
    }

    #[tokio::test]
    async fn sends_one_mail_per_batch() {
        let mut mailer = MockMailSender::new();
        mailer
            .expect_send()
            .withf(|subject, body, recipients| {
                subject == "Book with overdue loan"
                    && body.contains("Titulo")
                    && body.contains("Fulano")
                    && recipients.to_vec() == vec!["ops@library.local".to_string()]
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let notifier = LateLoanNotifier::new(
            loans_with_one_late().await,
            Arc::new(mailer),
            config(&["ops@library.local"]),
        );

        assert_eq!(notifier.notify_late_loans().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn nothing_sent_without_late_loans() {
        let mut mailer = MockMailSender::new();
        mailer.expect_send().never();

        let notifier = LateLoanNotifier::new(
            LoansService::new(Repository::in_memory()),
            Arc::new(mailer),
            config(&["ops@library.local"]),
        );

        assert_eq!(notifier.notify_late_loans().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let mut mailer = MockMailSender::new();
        mailer
            .expect_send()
            .times(1)
            .returning(|_, _, _| Err(AppError::Mail("connection refused".to_string())));

        let notifier = LateLoanNotifier::new(
            loans_with_one_late().await,
            Arc::new(mailer),
            config(&["ops@library.local"]),
        );

        assert!(matches!(
            notifier.notify_late_loans().await,
            Err(AppError::Mail(_))
        ));
    }

    #[test]
    fn disabled_without_recipients() {
        let notifier = LateLoanNotifier::new(
            LoansService::new(Repository::in_memory()),
            Arc::new(MockMailSender::new()),
            config(&[]),
        );
        assert!(!notifier.is_enabled());
    }

    #[test]
    fn message_names_loans_and_recipients() {
        let loan = Loan::new(
            Book::new("Titulo", "Autor", "123456789").with_id(1),
            "Fulano",
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        );
        let body = compose_message(&[loan], &["a@x.org".to_string(), "b@x.org".to_string()]);

        assert!(body.contains("\"Titulo\" (ISBN 123456789) loaned to Fulano on 2024-01-02"));
        assert!(body.contains("Sent to: a@x.org, b@x.org"));
    }

    #[test]
    fn next_run_is_later_today_or_tomorrow() {
        let at = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 23, 0, 0).unwrap();
        assert_eq!(until_next_run(now, at).as_secs(), 3600);

        let at_noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        let morning = Utc.with_ymd_and_hms(2024, 1, 1, 11, 30, 0).unwrap();
        assert_eq!(until_next_run(morning, at_noon).as_secs(), 1800);

        let exactly = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(until_next_run(exactly, at_noon).as_secs(), 86_400);
    }
}
