use {
    reshare_channels::ChannelRegistry,
    reshare_common::types::{Event, Publication},
};

use crate::{Error, Result, report::EventPublication};

/// Creates publication placeholders and binds them to registered channels.
#[derive(Debug, Clone, Default)]
pub struct PublicationBuilder {
    registry: ChannelRegistry,
}

impl PublicationBuilder {
    pub fn new(registry: ChannelRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// One WAITING publication of `event` per channel name, in input order.
    pub fn build<S: AsRef<str>>(event: &Event, channels: &[S]) -> Vec<Publication> {
        channels
            .iter()
            .map(|name| Publication::waiting(event.id(), name.as_ref()))
            .collect()
    }

    /// Attach each publication to its channel.
    pub fn bind(
        &self,
        event: &Event,
        publications: Vec<Publication>,
    ) -> Result<Vec<EventPublication>> {
        publications
            .into_iter()
            .map(|publication| {
                if publication.event_id != event.id() {
                    return Err(Error::invariant(format!(
                        "publication {} belongs to event {}, not {}",
                        publication.id,
                        publication.event_id,
                        event.id()
                    )));
                }
                let channel = self
                    .registry
                    .get(&publication.channel)
                    .cloned()
                    .ok_or_else(|| Error::unknown_channel(&publication.channel))?;
                Ok(EventPublication {
                    publication,
                    event: event.clone(),
                    channel,
                })
            })
            .collect()
    }

    /// [`Self::build`] then [`Self::bind`].
    pub fn publications<S: AsRef<str>>(
        &self,
        event: &Event,
        channels: &[S],
    ) -> Result<Vec<EventPublication>> {
        self.bind(event, Self::build(event, channels))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::testing::{MockChannel, event},
        reshare_common::types::PublicationStatus,
    };

    fn builder() -> PublicationBuilder {
        let mut registry = ChannelRegistry::default();
        registry.register(MockChannel::ok("telegram").channel());
        registry.register(MockChannel::ok("zulip").channel());
        PublicationBuilder::new(registry)
    }

    #[test]
    fn build_one_waiting_placeholder_per_channel() {
        let e = event("E");
        let publications = PublicationBuilder::build(&e, &["zulip", "telegram"]);
        assert_eq!(publications.len(), 2);
        assert_eq!(publications[0].channel, "zulip");
        assert_eq!(publications[1].channel, "telegram");
        assert!(publications.iter().all(|p| p.status == PublicationStatus::Waiting));
        assert!(publications.iter().all(|p| p.event_id == e.id()));
        assert_ne!(publications[0].id, publications[1].id);
    }

    #[test]
    fn bind_resolves_channels() {
        let e = event("E");
        let bound = builder().publications(&e, &["telegram", "zulip"]).unwrap();
        let names: Vec<_> = bound.iter().map(EventPublication::channel_name).collect();
        assert_eq!(names, vec!["telegram", "zulip"]);
    }

    #[test]
    fn unknown_channel_is_an_error() {
        let e = event("E");
        let err = builder().publications(&e, &["facebook"]).unwrap_err();
        assert!(matches!(err, Error::UnknownChannel { name } if name == "facebook"));
    }

    #[test]
    fn bind_rejects_publication_of_another_event() {
        let e = event("E");
        let other = event("F");
        let publications = PublicationBuilder::build(&other, &["telegram"]);
        let err = builder().bind(&e, publications).unwrap_err();
        assert!(matches!(err, Error::InvariantViolation { .. }));
    }
}
