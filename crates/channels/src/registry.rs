use crate::plugin::Channel;

/// Registry of configured channels, kept in registration order.
#[derive(Debug, Clone, Default)]
pub struct ChannelRegistry {
    channels: Vec<Channel>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel, replacing any previous channel with the same name
    /// in place.
    pub fn register(&mut self, channel: Channel) {
        match self.channels.iter_mut().find(|c| c.name() == channel.name()) {
            Some(existing) => *existing = channel,
            None => self.channels.push(channel),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name() == name)
    }

    pub fn list(&self) -> Vec<&str> {
        self.channels.iter().map(Channel::name).collect()
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }
}
