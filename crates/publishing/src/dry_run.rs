use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;

use crate::{
    clock::Clock,
    coordinator::{Finalizer, Validated, validate_all},
    report::{CoordinatorReport, EventPublication},
};

/// Runs the validate phase and reports what would be sent, without sending.
#[derive(Clone)]
pub struct DryRunCoordinator {
    timeout: Duration,
    finalizer: Finalizer,
}

impl DryRunCoordinator {
    pub fn new(timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            timeout,
            finalizer: Finalizer { clock },
        }
    }

    pub async fn run(
        &self,
        publications: Vec<EventPublication>,
    ) -> CoordinatorReport<EventPublication> {
        let validated = validate_all(publications, self.timeout, &CancellationToken::new()).await;
        let reports = validated
            .into_iter()
            .map(|v| match v {
                Validated::Ready {
                    publication,
                    message,
                } => self.finalizer.completed(publication, message),
                Validated::Rejected {
                    publication,
                    reason,
                } => self.finalizer.failed(publication, reason),
            })
            .collect();
        CoordinatorReport::new(reports)
    }
}
