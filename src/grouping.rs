//! # Album Grouping Module
//!
//! Partitions a finalized item sequence into album-sized groups. Chunking is
//! purely sequential: arrival order is preserved and nothing is repacked for
//! tighter fits. Voice items break out into singleton groups because the
//! media-group endpoint refuses them.

use crate::media::MediaItem;

/// Split `items` into consecutive groups of at most `max_group_size`.
///
/// Every voice item becomes its own group, closing whatever group was open
/// at that point. Concatenating the returned groups reproduces `items`
/// exactly.
pub fn partition_into_groups(items: Vec<MediaItem>, max_group_size: usize) -> Vec<Vec<MediaItem>> {
    let max_group_size = max_group_size.max(1);
    let mut groups = Vec::new();
    let mut current: Vec<MediaItem> = Vec::new();

    for item in items {
        if !item.kind.is_groupable() {
            if !current.is_empty() {
                groups.push(std::mem::take(&mut current));
            }
            groups.push(vec![item]);
            continue;
        }

        current.push(item);
        if current.len() >= max_group_size {
            groups.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        groups.push(current);
    }

    groups
}
