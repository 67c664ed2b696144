//! Event status derivation.
//!
//! An event's status is never stored. It is recomputed from its publications
//! every time the event is read.

use std::collections::{BTreeMap, BTreeSet};

use reshare_common::types::{Event, EventPublicationStatus, Publication, PublicationStatus};

use crate::{Error, Result};

/// Derive the aggregate status from the set of publication statuses.
pub fn resolve_status(
    statuses: impl IntoIterator<Item = PublicationStatus>,
) -> Result<EventPublicationStatus> {
    let distinct: BTreeSet<PublicationStatus> = statuses.into_iter().collect();
    let distinct: Vec<PublicationStatus> = distinct.into_iter().collect();

    match distinct.as_slice() {
        [] | [PublicationStatus::Waiting] => Ok(EventPublicationStatus::Waiting),
        [PublicationStatus::Completed] => Ok(EventPublicationStatus::Completed),
        [PublicationStatus::Failed] => Ok(EventPublicationStatus::Failed),
        [PublicationStatus::Failed, PublicationStatus::Completed] => {
            Ok(EventPublicationStatus::Partial)
        },
        other => Err(Error::invariant(format!(
            "cannot derive an event status from publication statuses {other:?}"
        ))),
    }
}

/// Recompute `status` and `publication_time` of `event` from `publications`.
///
/// When a channel has several concluded publications the latest timestamp
/// wins.
pub fn hydrate_event(event: Event, publications: &[Publication]) -> Result<Event> {
    let status = resolve_status(publications.iter().map(|p| p.status))?;

    let mut times = BTreeMap::new();
    for publication in publications.iter().filter(|p| p.is_concluded()) {
        let Some(at) = publication.timestamp else {
            continue;
        };
        times
            .entry(publication.channel.clone())
            .and_modify(|t| {
                if at > *t {
                    *t = at;
                }
            })
            .or_insert(at);
    }

    Ok(event.with_publication_state(status, times))
}
