use crate::io::manifest;
use crate::types::SceneRecord;
use std::collections::BTreeSet;

/// Removes redundant acquisitions sharing an identical start time
/// (identical-instant re-acquisitions of the same pass).
///
/// Each later record with a previously seen start time forms a pair with the
/// nearest earlier record at that instant not already dropped, so every
/// duplicate gets resolved even in three-way ties. The member whose manifest
/// slice number is the sentinel "0" (not yet assigned to a slice) is dropped;
/// when neither or both report "0", the earlier index is dropped. Each
/// resolution removes one of the two, so at most one record per instant
/// survives and the operation is idempotent.
pub fn dedup_records(records: Vec<SceneRecord>) -> Vec<SceneRecord> {
    let mut drops: BTreeSet<usize> = BTreeSet::new();

    for idx in 1..records.len() {
        let prev_idx = match (0..idx)
            .rev()
            .find(|p| !drops.contains(p) && records[*p].start_time == records[idx].start_time)
        {
            Some(p) => p,
            None => continue,
        };
        drops.insert(resolve_duplicate(&records, prev_idx, idx));
    }

    if drops.is_empty() {
        log::info!("no duplicates in file list");
        return records;
    }
    log::info!("dropping {} duplicate acquisition(s): {:?}", drops.len(), drops);

    records
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !drops.contains(i))
        .map(|(_, r)| r)
        .collect()
}

fn resolve_duplicate(records: &[SceneRecord], prev_idx: usize, curr_idx: usize) -> usize {
    let prev_slice = manifest::slice_number(records[prev_idx].scene_dir());
    let curr_slice = manifest::slice_number(records[curr_idx].scene_dir());

    let prev_unassigned = prev_slice.as_deref() == Some("0");
    let curr_unassigned = curr_slice.as_deref() == Some("0");

    match (prev_unassigned, curr_unassigned) {
        (true, false) => prev_idx,
        (false, true) => curr_idx,
        // neither or both unassigned: the earlier index goes
        _ => prev_idx,
    }
}
