//! crates/mentorship_core/src/services/availability.rs
//!
//! Mentor-owned recurring availability and the bookable options derived from it.

use crate::domain::{Actor, Availability, DaySlots, Role, SlotOption};
use crate::ports::{Clock, DatabaseService, PortError, PortResult};
use crate::schedule::{resolve_next_occurrence, SameDayPolicy, TimeRange, Weekday};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// A weekday entry as submitted by a client, before validation.
#[derive(Debug, Clone, Default)]
pub struct DaySlotsInput {
    pub day: Option<String>,
    pub times: Option<Vec<TimeRangeInput>>,
}

#[derive(Debug, Clone, Default)]
pub struct TimeRangeInput {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Clone)]
pub struct AvailabilityService {
    db: Arc<dyn DatabaseService>,
    clock: Arc<dyn Clock>,
    policy: SameDayPolicy,
}

impl AvailabilityService {
    pub fn new(db: Arc<dyn DatabaseService>, clock: Arc<dyn Clock>, policy: SameDayPolicy) -> Self {
        Self { db, clock, policy }
    }

    /// Creates or fully replaces the caller's availability.
    /// Returns `true` alongside the record when it was newly created.
    pub async fn set(
        &self,
        actor: Actor,
        slots: Option<Vec<DaySlotsInput>>,
    ) -> PortResult<(Availability, bool)> {
        require_mentor(actor)?;
        let slots = parse_slots(slots)?;
        let (availability, created) = self.db.upsert_availability(actor.user_id, slots).await?;
        info!(
            "Availability for mentor {} {} ({} day(s))",
            actor.user_id,
            if created { "created" } else { "replaced" },
            availability.slots.len()
        );
        Ok((availability, created))
    }

    pub async fn get_mine(&self, actor: Actor) -> PortResult<Availability> {
        self.db
            .get_availability(actor.user_id)
            .await?
            .ok_or_else(|| PortError::NotFound("No availability found".to_string()))
    }

    /// A mentor without a record simply has no slots.
    pub async fn get_for_mentor(&self, mentor_id: Uuid) -> PortResult<Vec<DaySlots>> {
        Ok(self
            .db
            .get_availability(mentor_id)
            .await?
            .map(|a| a.slots)
            .unwrap_or_default())
    }

    pub async fn delete(&self, actor: Actor) -> PortResult<()> {
        require_mentor(actor)?;
        if !self.db.delete_availability(actor.user_id).await? {
            return Err(PortError::NotFound(
                "No availability found to delete".to_string(),
            ));
        }
        info!("Availability for mentor {} deleted", actor.user_id);
        Ok(())
    }

    /// Every recurring window of the mentor, resolved to its next occurrence and
    /// sorted soonest first.
    pub async fn upcoming_options(&self, mentor_id: Uuid) -> PortResult<Vec<SlotOption>> {
        let Some(availability) = self.db.get_availability(mentor_id).await? else {
            return Ok(Vec::new());
        };
        let now = self.clock.now();
        let mut options: Vec<SlotOption> = availability
            .tokens()
            .map(|slot| SlotOption {
                next_occurrence: resolve_next_occurrence(slot.weekday, slot.start(), now, self.policy),
                slot,
            })
            .collect();
        options.sort_by_key(|o| o.next_occurrence);
        Ok(options)
    }
}

fn require_mentor(actor: Actor) -> PortResult<()> {
    if actor.role != Role::Mentor {
        return Err(PortError::Unauthorized(
            "Only mentors can manage availability".to_string(),
        ));
    }
    Ok(())
}

/// Validates client-submitted slots. Entries for the same weekday are merged,
/// identical windows collapse into one, and days left without windows are dropped.
pub fn parse_slots(input: Option<Vec<DaySlotsInput>>) -> PortResult<Vec<DaySlots>> {
    let input =
        input.ok_or_else(|| PortError::Validation("Slots must be an array".to_string()))?;

    let mut days: Vec<DaySlots> = Vec::new();
    for entry in input {
        let (Some(day), Some(times)) = (entry.day, entry.times) else {
            return Err(PortError::Validation(
                "Each slot must include a day and times array".to_string(),
            ));
        };
        let day: Weekday = day.parse()?;

        let mut ranges = Vec::with_capacity(times.len());
        for time in times {
            let (Some(start), Some(end)) = (time.start, time.end) else {
                return Err(PortError::Validation(
                    "Each time must include start and end".to_string(),
                ));
            };
            ranges.push(TimeRange::parse(&start, &end)?);
        }

        let slot = match days.iter_mut().position(|d| d.day == day) {
            Some(i) => &mut days[i],
            None => {
                days.push(DaySlots { day, times: Vec::new() });
                let last = days.len() - 1;
                &mut days[last]
            }
        };
        for range in ranges {
            if !slot.times.contains(&range) {
                slot.times.push(range);
            }
        }
    }

    days.retain(|d| !d.times.is_empty());
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: &str, end: &str) -> TimeRangeInput {
        TimeRangeInput {
            start: Some(start.to_string()),
            end: Some(end.to_string()),
        }
    }

    fn day(name: &str, times: Vec<TimeRangeInput>) -> DaySlotsInput {
        DaySlotsInput {
            day: Some(name.to_string()),
            times: Some(times),
        }
    }

    #[test]
    fn missing_slots_is_rejected() {
        assert_eq!(
            parse_slots(None),
            Err(PortError::Validation("Slots must be an array".to_string()))
        );
    }

    #[test]
    fn entry_without_times_is_rejected() {
        let input = vec![DaySlotsInput {
            day: Some("Monday".to_string()),
            times: None,
        }];
        assert_eq!(
            parse_slots(Some(input)),
            Err(PortError::Validation(
                "Each slot must include a day and times array".to_string()
            ))
        );
    }

    #[test]
    fn time_without_end_is_rejected() {
        let input = vec![day(
            "Monday",
            vec![TimeRangeInput {
                start: Some("09:00".to_string()),
                end: None,
            }],
        )];
        assert_eq!(
            parse_slots(Some(input)),
            Err(PortError::Validation(
                "Each time must include start and end".to_string()
            ))
        );
    }

    #[test]
    fn inverted_window_is_rejected() {
        let input = vec![day("Monday", vec![range("10:00", "09:00")])];
        assert!(matches!(parse_slots(Some(input)), Err(PortError::Validation(_))));
    }

    #[test]
    fn same_day_entries_merge_and_empty_days_drop() {
        let input = vec![
            day("Monday", vec![range("09:00", "10:00")]),
            day("Tuesday", vec![]),
            day("monday", vec![range("09:00", "10:00"), range("11:00", "12:00")]),
        ];
        let days = parse_slots(Some(input)).unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].day, Weekday::Monday);
        assert_eq!(days[0].times.len(), 2);
    }
}
