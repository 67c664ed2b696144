use {
    anyhow::Result,
    clap::Subcommand,
    reshare_publishing::{EventReport, PublishingService, RecapReport},
    uuid::Uuid,
};

#[derive(Subcommand)]
pub enum RetryAction {
    /// Re-run one FAILED publication.
    Publication {
        /// Publication id.
        id: Uuid,
    },
    /// Re-run every channel whose latest publication of the event FAILED.
    Event {
        /// Internal event id.
        id: Uuid,
    },
}

/// Publish the next event, if the selection policy allows one now.
pub async fn start(service: &PublishingService) -> Result<bool> {
    match service.publish_next().await? {
        Some(report) => {
            print_event_report(&report);
            Ok(report.successful())
        },
        None => {
            println!("Nothing to publish.");
            Ok(true)
        },
    }
}

pub async fn publish(service: &PublishingService, id: Uuid, channels: &[String]) -> Result<bool> {
    let report = service.publish_specific(id, selected(channels)).await?;
    print_event_report(&report);
    Ok(report.successful())
}

/// Print what each channel would receive, without sending it.
pub async fn format(service: &PublishingService, id: Uuid, channels: &[String]) -> Result<bool> {
    let report = service.dry_run(id, selected(channels)).await?;
    for entry in report.reports() {
        let channel = entry.publication.channel_name();
        match (&entry.published_content, &entry.reason) {
            (Some(content), _) => println!("── {channel} ──\n{content}\n"),
            (None, reason) => println!(
                "── {channel} ── FAILED: {}\n",
                reason.as_deref().unwrap_or("unknown")
            ),
        }
    }
    Ok(report.successful())
}

pub async fn recap(service: &PublishingService, channels: &[String]) -> Result<bool> {
    match service.recap(selected(channels)).await? {
        Some(report) => {
            print_recap_report(&report);
            Ok(report.successful())
        },
        None => {
            println!("No upcoming published events.");
            Ok(true)
        },
    }
}

pub async fn retry(service: &PublishingService, action: RetryAction) -> Result<bool> {
    match action {
        RetryAction::Publication { id } => {
            let report = service.retry_publication(id).await?;
            print_event_report(&report);
            Ok(report.successful())
        },
        RetryAction::Event { id } => match service.retry_event(id).await? {
            Some(report) => {
                print_event_report(&report);
                Ok(report.successful())
            },
            None => {
                println!("No failed publications for event {id}.");
                Ok(true)
            },
        },
    }
}

fn selected(channels: &[String]) -> Option<&[String]> {
    (!channels.is_empty()).then_some(channels)
}

fn print_event_report(report: &EventReport) {
    if let Some(first) = report.reports().first() {
        let event = &first.publication.event;
        println!("{} ({})", event.name(), event.id());
    }
    for entry in report.reports() {
        let publication = &entry.publication.publication;
        match &entry.reason {
            Some(reason) => println!(
                "  {:<10} {:<9} {}  {reason}",
                publication.channel, entry.status, publication.id
            ),
            None => println!(
                "  {:<10} {:<9} {}",
                publication.channel, entry.status, publication.id
            ),
        }
    }
}

fn print_recap_report(report: &RecapReport) {
    for entry in report.reports() {
        let recap = &entry.publication;
        match &entry.reason {
            Some(reason) => println!(
                "  {:<10} {:<9} {reason}",
                recap.channel.name(),
                entry.status
            ),
            None => println!(
                "  {:<10} {:<9} {} event(s)",
                recap.channel.name(),
                entry.status,
                recap.events.len()
            ),
        }
    }
}
