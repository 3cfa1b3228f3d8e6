use std::collections::HashSet;

use crate::models::TimeSlot;

/// Fixed slots minus booked ones, in slot order.
pub fn free_slots(booked: &[TimeSlot]) -> Vec<TimeSlot> {
    let taken: HashSet<TimeSlot> = booked.iter().copied().collect();

    TimeSlot::ALL
        .iter()
        .copied()
        .filter(|slot| !taken.contains(slot))
        .collect()
}
