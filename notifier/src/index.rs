//! Online/offline channel lists kept sorted with stable positions.

use std::collections::HashMap;

use twitch_client::api::{Channel, ChannelId};

/// Which list a channel is shown in, and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelStatus {
    pub online: bool,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ListEntry {
    channel_id: ChannelId,
    label: String,
    sort_key: String,
}

impl ListEntry {
    fn new(channel: &Channel) -> Self {
        Self {
            channel_id: channel.id,
            label: channel.list_label(),
            sort_key: channel.display_name.to_lowercase(),
        }
    }

    fn orders_before(&self, other: &ListEntry) -> bool {
        (&self.sort_key, self.channel_id) < (&other.sort_key, other.channel_id)
    }
}

/// Two groups (online, offline) partitioning the followed channels.
///
/// Each group is sorted case-insensitively by display name, and every
/// channel's recorded index is its position in its group.
#[derive(Debug, Default)]
pub struct OnlineOfflineIndex {
    online: Vec<ListEntry>,
    offline: Vec<ListEntry>,
    status: HashMap<ChannelId, ChannelStatus>,
}

impl OnlineOfflineIndex {
    /// Seed the index with every channel offline, in the given order.
    ///
    /// `channels` must already be sorted the way the groups are.
    pub fn new(channels: &[Channel]) -> Self {
        let offline: Vec<ListEntry> = channels.iter().map(ListEntry::new).collect();
        let status = offline
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                (
                    entry.channel_id,
                    ChannelStatus {
                        online: false,
                        index,
                    },
                )
            })
            .collect();

        Self {
            online: Vec::new(),
            offline,
            status,
        }
    }

    pub fn status(&self, channel_id: ChannelId) -> Option<ChannelStatus> {
        self.status.get(&channel_id).copied()
    }

    /// Move a channel into the online or offline group.
    ///
    /// Returns false, changing nothing, if the channel is unknown or
    /// already in that group.
    pub fn move_channel(&mut self, channel_id: ChannelId, to_online: bool) -> bool {
        let Some(current) = self.status(channel_id) else {
            return false;
        };
        if current.online == to_online {
            return false;
        }

        // take it out of the old group; later entries move up by one
        let from = self.group_mut(current.online);
        let entry = from.remove(current.index);
        let shifted: Vec<ChannelId> = from[current.index..]
            .iter()
            .map(|e| e.channel_id)
            .collect();
        for id in shifted {
            if let Some(s) = self.status.get_mut(&id) {
                s.index -= 1;
            }
        }

        // insert it into the new group; entries at or after it move down by one
        let into = self.group_mut(to_online);
        let position = into.partition_point(|e| e.orders_before(&entry));
        into.insert(position, entry);
        let shifted: Vec<ChannelId> = into[position + 1..]
            .iter()
            .map(|e| e.channel_id)
            .collect();
        for id in shifted {
            if let Some(s) = self.status.get_mut(&id) {
                s.index += 1;
            }
        }

        self.status.insert(
            channel_id,
            ChannelStatus {
                online: to_online,
                index: position,
            },
        );
        true
    }

    /// Channel shown at `index` of a group.
    pub fn channel_at(&self, online: bool, index: usize) -> Option<ChannelId> {
        self.group(online).get(index).map(|e| e.channel_id)
    }

    /// Display lines of a group, in order.
    pub fn labels(&self, online: bool) -> Vec<&str> {
        self.group(online).iter().map(|e| e.label.as_str()).collect()
    }

    pub fn online_ids(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.online.iter().map(|e| e.channel_id)
    }

    pub fn len(&self, online: bool) -> usize {
        self.group(online).len()
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_empty()
    }

    fn group(&self, online: bool) -> &Vec<ListEntry> {
        if online { &self.online } else { &self.offline }
    }

    fn group_mut(&mut self, online: bool) -> &mut Vec<ListEntry> {
        if online {
            &mut self.online
        } else {
            &mut self.offline
        }
    }
}

#[cfg(test)]
impl OnlineOfflineIndex {
    /// Panic unless both groups are sorted and every recorded index matches.
    pub(crate) fn assert_consistent(&self) {
        for online in [true, false] {
            let group = self.group(online);
            for pair in group.windows(2) {
                assert!(
                    !pair[1].orders_before(&pair[0]),
                    "group online={online} out of order: {:?}",
                    self.labels(online)
                );
            }
            for (index, entry) in group.iter().enumerate() {
                assert_eq!(
                    self.status[&entry.channel_id],
                    ChannelStatus { online, index },
                    "stale status for {}",
                    entry.label
                );
            }
        }
        assert_eq!(self.status.len(), self.online.len() + self.offline.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(id: ChannelId, name: &str) -> Channel {
        Channel {
            id,
            display_name: name.to_string(),
            url: format!("https://www.twitch.tv/{}", name.to_lowercase()),
            status: None,
            logo: None,
        }
    }

    fn sorted(mut channels: Vec<Channel>) -> Vec<Channel> {
        channels.sort_by_cached_key(|c| (c.display_name.to_lowercase(), c.id));
        channels
    }

    #[test]
    fn starts_with_everything_offline() {
        let index = OnlineOfflineIndex::new(&sorted(vec![channel(2, "beta"), channel(1, "Alpha")]));
        assert_eq!(index.labels(false), vec!["Alpha (1)", "beta (2)"]);
        assert!(index.labels(true).is_empty());
        assert_eq!(
            index.status(2),
            Some(ChannelStatus {
                online: false,
                index: 1
            })
        );
        index.assert_consistent();
    }

    #[test]
    fn moves_keep_both_groups_sorted() {
        let mut index = OnlineOfflineIndex::new(&sorted(vec![
            channel(1, "alpha"),
            channel(2, "Bravo"),
            channel(3, "charlie"),
            channel(4, "DELTA"),
        ]));

        assert!(index.move_channel(3, true));
        assert!(index.move_channel(1, true));
        assert!(index.move_channel(4, true));
        assert_eq!(index.labels(true), vec!["alpha (1)", "charlie (3)", "DELTA (4)"]);
        assert_eq!(index.labels(false), vec!["Bravo (2)"]);
        index.assert_consistent();

        assert!(index.move_channel(3, false));
        assert_eq!(index.labels(false), vec!["Bravo (2)", "charlie (3)"]);
        assert_eq!(index.channel_at(true, 1), Some(4));
        index.assert_consistent();
    }

    #[test]
    fn moving_unknown_or_same_group_is_a_no_op() {
        let mut index = OnlineOfflineIndex::new(&[channel(1, "solo")]);
        assert!(!index.move_channel(99, true));
        assert!(!index.move_channel(1, false));
        assert!(index.move_channel(1, true));
        assert!(!index.move_channel(1, true));
        index.assert_consistent();
    }

    #[test]
    fn equal_names_are_ordered_by_id() {
        let mut index = OnlineOfflineIndex::new(&sorted(vec![
            channel(9, "twin"),
            channel(3, "Twin"),
            channel(5, "TWIN"),
        ]));
        for id in [9, 5, 3] {
            index.move_channel(id, true);
        }
        assert_eq!(index.online_ids().collect::<Vec<_>>(), vec![3, 5, 9]);
        index.assert_consistent();
    }

    #[test]
    fn any_sequence_of_moves_stays_consistent() {
        let names = [
            "zulu", "Echo", "alpha", "Mike", "kilo", "ECHO2", "bravo", "Yankee", "hotel", "India",
        ];
        let channels: Vec<Channel> = names
            .iter()
            .enumerate()
            .map(|(i, name)| channel(i as ChannelId + 1, name))
            .collect();
        let mut index = OnlineOfflineIndex::new(&sorted(channels));

        // deterministic pseudo-random walk over (channel, target group)
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let id = seed % names.len() as u64 + 1;
            let to_online = (seed >> 32) & 1 == 1;
            index.move_channel(id, to_online);
            index.assert_consistent();
        }
        assert_eq!(index.len(true) + index.len(false), names.len());
    }
}
