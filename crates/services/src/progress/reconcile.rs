use std::collections::HashMap;

use grammar_core::model::{Module, ModuleId, ModuleProgress, ModuleProgressRecord, ModuleWithProgress};
use tracing::debug;

/// Join the catalog with the sparse progress feed.
///
/// Output follows `modules` one-to-one and in order. Modules without a record
/// get a zeroed, not started view. When the feed repeats a module id the
/// first record wins.
#[must_use]
pub fn reconcile(modules: &[Module], records: &[ModuleProgressRecord]) -> Vec<ModuleWithProgress> {
    let mut by_module: HashMap<ModuleId, &ModuleProgressRecord> = HashMap::with_capacity(records.len());
    for record in records {
        by_module.entry(record.module_id).or_insert(record);
    }

    modules
        .iter()
        .map(|module| {
            let progress = match by_module.get(&module.id) {
                Some(record) => derive(module, record),
                None => {
                    debug!(module_id = %module.id, "no progress record, using zeroed progress");
                    ModuleProgress::not_started(module)
                }
            };
            ModuleWithProgress {
                module: module.clone(),
                progress,
            }
        })
        .collect()
}

fn derive(module: &Module, record: &ModuleProgressRecord) -> ModuleProgress {
    let total = record.total_lessons;
    let completed = record.completed_lessons.min(total);
    let pct = record
        .progress_percentage
        .and_then(feed_percentage)
        .unwrap_or_else(|| percentage(completed, total));

    ModuleProgress::new(
        module.id,
        total,
        completed,
        pct,
        record.last_accessed,
        estimated_completion(module.duration_minutes(), pct),
    )
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn feed_percentage(value: f64) -> Option<u8> {
    value
        .is_finite()
        .then(|| value.round().clamp(0.0, 100.0) as u8)
}

/// `round(100 * completed / total)`, zero for an empty module.
#[must_use]
pub fn percentage(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = u64::from(completed.min(total));
    let total = u64::from(total);
    let rounded = (200 * completed + total) / (2 * total);
    u8::try_from(rounded).unwrap_or(100)
}

/// Minutes left: `ceil(duration * (100 - percentage) / 100)`.
#[must_use]
pub fn estimated_completion(duration_minutes: u32, percentage: u8) -> u32 {
    let remaining = u64::from(100 - percentage.min(100));
    let minutes = (u64::from(duration_minutes) * remaining).div_ceil(100);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grammar_core::model::ProgressStatus;

    fn module(order: u32, duration: u32) -> Module {
        Module::new(ModuleId::generate(), format!("Module {order}"), order, 5)
            .with_estimated_duration(duration)
    }

    #[test]
    fn estimated_time_scales_with_percentage() {
        assert_eq!(estimated_completion(120, 60), 48);
        assert_eq!(estimated_completion(120, 100), 0);
        assert_eq!(estimated_completion(120, 0), 120);
        assert_eq!(estimated_completion(10, 33), 7);
    }

    #[test]
    fn percentage_rounds_and_guards_zero_total() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(9, 3), 100);
    }

    #[test]
    fn missing_record_yields_zeroed_view() {
        let modules = vec![module(1, 120), module(2, 90)];
        let records = vec![ModuleProgressRecord::new(modules[0].id, 5, 2)];

        let list = reconcile(&modules, &records);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].status(), ProgressStatus::InProgress);
        assert_eq!(list[0].progress.progress_percentage(), 40);
        assert_eq!(list[0].progress.estimated_completion_time(), 72);

        let untouched = &list[1].progress;
        assert_eq!(untouched.status(), ProgressStatus::NotStarted);
        assert_eq!(untouched.progress_percentage(), 0);
        assert_eq!(untouched.estimated_completion_time(), 90);
    }

    #[test]
    fn feed_percentage_wins_over_counts() {
        let modules = vec![module(1, 120)];
        let records = vec![ModuleProgressRecord::new(modules[0].id, 5, 1).with_percentage(60.0)];
        let list = reconcile(&modules, &records);
        assert_eq!(list[0].progress.progress_percentage(), 60);
        assert_eq!(list[0].progress.estimated_completion_time(), 48);
    }

    #[test]
    fn overfull_counts_are_clamped() {
        let modules = vec![module(1, 60)];
        let records = vec![ModuleProgressRecord::new(modules[0].id, 4, 7)];
        let list = reconcile(&modules, &records);
        let progress = &list[0].progress;
        assert_eq!(progress.completed_lessons(), 4);
        assert_eq!(progress.status(), ProgressStatus::Completed);
        assert_eq!(progress.estimated_completion_time(), 0);
    }

    #[test]
    fn output_follows_catalog_order() {
        let modules = vec![module(2, 10), module(1, 10)];
        let records = vec![
            ModuleProgressRecord::new(modules[1].id, 5, 5),
            ModuleProgressRecord::new(modules[0].id, 5, 0),
        ];
        let list = reconcile(&modules, &records);
        assert_eq!(list[0].order(), 2);
        assert_eq!(list[1].order(), 1);
        assert_eq!(list[1].status(), ProgressStatus::Completed);
    }
}
