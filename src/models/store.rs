use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::models::{
    date::DateKey,
    task::{Task, TaskTime},
};

/// Key under which the serialized store lives in the persistence surface
pub const STORE_KEY: &str = "tasksByDate";

/// Every planned task, grouped by day.
///
/// A snapshot is never mutated in place: each operation returns the next
/// snapshot. Days with no tasks are not represented, and each day's tasks are
/// kept in the order produced by [`sort_tasks`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskStore {
    tasks_by_date: BTreeMap<DateKey, Vec<Task>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks_by_date.is_empty()
    }

    /// Number of days holding at least one task
    pub fn day_count(&self) -> usize {
        self.tasks_by_date.len()
    }

    pub fn task_count(&self) -> usize {
        self.tasks_by_date.values().map(Vec::len).sum()
    }

    /// Days in calendar order, each with its tasks
    pub fn days(&self) -> impl Iterator<Item = (DateKey, &[Task])> {
        self.tasks_by_date
            .iter()
            .map(|(date, tasks)| (*date, tasks.as_slice()))
    }

    pub fn tasks(&self, date: DateKey) -> Option<&[Task]> {
        self.tasks_by_date.get(&date).map(Vec::as_slice)
    }

    pub fn task(&self, date: DateKey, index: usize) -> Option<&Task> {
        self.tasks_by_date.get(&date).and_then(|tasks| tasks.get(index))
    }

    /// Adds a task to `date`. Blank text or a blank/unparseable date leaves
    /// the store unchanged.
    #[tracing::instrument(skip(self, text))]
    pub fn add_task(&self, date: &str, text: &str, time: Option<TaskTime>) -> Self {
        if text.trim().is_empty() || date.trim().is_empty() {
            debug!("rejected task with blank text or date");
            return self.clone();
        }
        let Ok(date) = date.parse::<DateKey>() else {
            debug!("rejected task with unparseable date");
            return self.clone();
        };

        let mut next = self.clone();
        let tasks = next.tasks_by_date.entry(date).or_default();
        tasks.push(Task::new(text, time));
        *tasks = sort_tasks(tasks);
        next
    }

    /// Flips completion of the task at `index`. Unknown dates and out of
    /// range indexes are ignored.
    #[tracing::instrument(skip(self))]
    pub fn toggle_completed(&self, date: DateKey, index: usize) -> Self {
        let mut next = self.clone();
        let Some(tasks) = next.tasks_by_date.get_mut(&date) else {
            debug!("no tasks on this date, ignoring toggle");
            return next;
        };
        let len = tasks.len();
        let Some(task) = tasks.get_mut(index) else {
            debug!(len, "index out of range, ignoring toggle");
            return next;
        };

        task.completed = !task.completed;
        *tasks = sort_tasks(tasks);
        next
    }

    /// Removes the task at `index`, dropping the day once it is empty.
    /// Unknown dates and out of range indexes are ignored.
    #[tracing::instrument(skip(self))]
    pub fn remove_task(&self, date: DateKey, index: usize) -> Self {
        let mut next = self.clone();
        let Some(tasks) = next.tasks_by_date.get_mut(&date) else {
            debug!("no tasks on this date, ignoring removal");
            return next;
        };
        if index >= tasks.len() {
            debug!(len = tasks.len(), "index out of range, ignoring removal");
            return next;
        }

        tasks.remove(index);
        if tasks.is_empty() {
            next.tasks_by_date.remove(&date);
        }
        next
    }

    #[tracing::instrument(skip(self))]
    pub fn remove_day(&self, date: DateKey) -> Self {
        let mut next = self.clone();
        next.tasks_by_date.remove(&date);
        next
    }

    pub fn serialize(&self) -> String {
        // Keys and values are plain strings and booleans, so encoding cannot fail
        serde_json::to_string(&self.tasks_by_date).unwrap_or_else(|_| String::from("{}"))
    }

    /// Parses a serialized store. Absent or malformed input yields an empty
    /// store; blank tasks and empty days written by other tools are dropped.
    pub fn deserialize(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };

        let parsed: BTreeMap<DateKey, Vec<Task>> = match serde_json::from_str(raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "stored tasks are corrupt, starting from an empty store");
                return Self::default();
            }
        };

        let mut tasks_by_date = BTreeMap::new();
        for (date, tasks) in parsed {
            let before = tasks.len();
            let tasks: Vec<Task> = tasks
                .into_iter()
                .filter(|t| !t.text.trim().is_empty())
                .map(|t| Task {
                    text: t.text.trim().to_string(),
                    ..t
                })
                .collect();
            if tasks.len() != before {
                warn!(%date, dropped = before - tasks.len(), "dropped tasks with blank text");
            }
            if !tasks.is_empty() {
                tasks_by_date.insert(date, sort_tasks(&tasks));
            }
        }

        Self { tasks_by_date }
    }
}

/// Orders a day's tasks: open before completed, then timed (earliest first)
/// before untimed. Ties keep their current relative order.
pub fn sort_tasks(tasks: &[Task]) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by_key(|task| {
        let schedule = match task.time {
            Some(time) => (false, time.minutes_since_midnight()),
            None => (true, 0),
        };
        (task.completed, schedule)
    });
    sorted
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const DAY: &str = "2024-06-15";

    fn key(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    fn time(s: &str) -> Option<TaskTime> {
        Some(s.parse().unwrap())
    }

    fn task(text: &str, completed: bool, at: Option<&str>) -> Task {
        Task {
            text: text.to_string(),
            completed,
            time: at.map(|s| s.parse().unwrap()),
        }
    }

    fn texts(store: &TaskStore, date: &str) -> Vec<String> {
        store
            .tasks(key(date))
            .unwrap_or_default()
            .iter()
            .map(|t| t.text.clone())
            .collect()
    }

    fn is_well_ordered(tasks: &[Task]) -> bool {
        tasks.windows(2).all(|pair| {
            let (a, b) = (&pair[0], &pair[1]);
            if a.completed != b.completed {
                return !a.completed;
            }
            match (a.time, b.time) {
                (Some(x), Some(y)) => x <= y,
                (Some(_), None) | (None, None) => true,
                (None, Some(_)) => false,
            }
        })
    }

    #[test]
    fn test_add_task_to_empty_store() {
        let store = TaskStore::new().add_task(DAY, "Buy milk", None);

        assert_eq!(store.day_count(), 1);
        assert_eq!(
            store.tasks(key(DAY)),
            Some(&[task("Buy milk", false, None)][..])
        );
    }

    #[test]
    fn test_add_task_trims_text() {
        let store = TaskStore::new().add_task(DAY, "   Buy milk  ", None);
        assert_eq!(texts(&store, DAY), vec!["Buy milk"]);
    }

    #[test]
    fn test_add_task_rejects_blank_text_or_date() {
        let store = TaskStore::new().add_task(DAY, "Existing", None);

        assert_eq!(store.add_task("2024-01-01", "", None), store);
        assert_eq!(store.add_task("2024-01-01", "   \t", None), store);
        assert_eq!(store.add_task("", "task", None), store);
        assert_eq!(store.add_task("not a date", "task", None), store);
    }

    #[test]
    fn test_add_task_does_not_touch_original_snapshot() {
        let original = TaskStore::new().add_task(DAY, "First", None);
        let next = original.add_task(DAY, "Second", None);

        assert_eq!(texts(&original, DAY), vec!["First"]);
        assert_eq!(texts(&next, DAY), vec!["First", "Second"]);
    }

    #[test]
    fn test_add_task_places_timed_before_untimed() {
        let store = TaskStore::new()
            .add_task(DAY, "Whenever", None)
            .add_task(DAY, "Lunch", time("12:30"))
            .add_task(DAY, "Breakfast", time("07:45"));

        assert_eq!(texts(&store, DAY), vec!["Breakfast", "Lunch", "Whenever"]);
    }

    #[test]
    fn test_sort_by_time_of_day() {
        let sorted = sort_tasks(&[
            task("A", false, Some("09:00")),
            task("B", false, Some("08:00")),
        ]);
        assert_eq!(
            sorted,
            vec![task("B", false, Some("08:00")), task("A", false, Some("09:00"))]
        );
    }

    #[test]
    fn test_sort_keeps_untimed_ties_stable() {
        let sorted = sort_tasks(&[
            task("c", false, None),
            task("a", false, None),
            task("b", false, None),
        ]);
        let order: Vec<&str> = sorted.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_sort_is_well_ordered_for_every_mix() {
        let times = [None, Some("06:00"), Some("13:20"), Some("23:59")];
        let mut pool = Vec::new();
        for (i, at) in times.iter().enumerate() {
            for completed in [false, true] {
                pool.push(task(&format!("t{i}{completed}"), completed, *at));
            }
        }

        // Every rotation and reversal of the pool, at every length
        for len in 1..=pool.len() {
            for start in 0..pool.len() {
                let mut sample: Vec<Task> =
                    pool.iter().cycle().skip(start).take(len).cloned().collect();
                assert!(is_well_ordered(&sort_tasks(&sample)));
                sample.reverse();
                assert!(is_well_ordered(&sort_tasks(&sample)));
            }
        }
    }

    #[test]
    fn test_toggle_moves_task_after_open_ones() {
        let store = TaskStore::new()
            .add_task(DAY, "First", None)
            .add_task(DAY, "Second", None);

        let toggled = store.toggle_completed(key(DAY), 0);

        assert_eq!(
            toggled.tasks(key(DAY)).unwrap(),
            &[task("Second", false, None), task("First", true, None)][..]
        );
    }

    #[test]
    fn test_toggle_lands_before_existing_completed_tasks() {
        let store = TaskStore::new()
            .add_task(DAY, "Done already", None)
            .add_task(DAY, "Open", None)
            .add_task(DAY, "Also open", None);
        let store = store.toggle_completed(key(DAY), 0);
        assert_eq!(texts(&store, DAY), vec!["Open", "Also open", "Done already"]);

        let store = store.toggle_completed(key(DAY), 0);
        assert_eq!(texts(&store, DAY), vec!["Also open", "Open", "Done already"]);
        assert!(is_well_ordered(store.tasks(key(DAY)).unwrap()));
    }

    #[test]
    fn test_toggle_twice_reopens_task() {
        let store = TaskStore::new()
            .add_task(DAY, "Only", None)
            .toggle_completed(key(DAY), 0)
            .toggle_completed(key(DAY), 0);
        assert_eq!(store.task(key(DAY), 0), Some(&task("Only", false, None)));
    }

    #[test]
    fn test_toggle_out_of_range_is_ignored() {
        let store = TaskStore::new().add_task(DAY, "Only", None);

        assert_eq!(store.toggle_completed(key(DAY), 1), store);
        assert_eq!(store.toggle_completed(key("2030-01-01"), 0), store);
    }

    #[test]
    fn test_remove_last_task_drops_day() {
        let store = TaskStore::new().add_task(DAY, "Only", None);

        let removed = store.remove_task(key(DAY), 0);

        assert!(removed.tasks(key(DAY)).is_none());
        assert!(removed.is_empty());
    }

    #[test]
    fn test_remove_task_keeps_remaining_order() {
        let store = TaskStore::new()
            .add_task(DAY, "A", time("08:00"))
            .add_task(DAY, "B", time("09:00"))
            .add_task(DAY, "C", None);

        let removed = store.remove_task(key(DAY), 1);

        assert_eq!(texts(&removed, DAY), vec!["A", "C"]);
    }

    #[test]
    fn test_remove_task_out_of_range_is_ignored() {
        let store = TaskStore::new().add_task(DAY, "Only", None);

        assert_eq!(store.remove_task(key(DAY), 5), store);
        assert_eq!(store.remove_task(key("2030-01-01"), 0), store);
    }

    #[test]
    fn test_remove_day_drops_every_task() {
        let store = TaskStore::new()
            .add_task(DAY, "A", None)
            .add_task(DAY, "B", None)
            .add_task("2024-06-16", "Tomorrow", None);

        let removed = store.remove_day(key(DAY));

        assert!(removed.tasks(key(DAY)).is_none());
        assert_eq!(texts(&removed, "2024-06-16"), vec!["Tomorrow"]);
        assert_eq!(removed.remove_day(key("1999-01-01")), removed);
    }

    #[test]
    fn test_no_day_is_ever_empty() {
        let days = ["2024-06-14", "2024-06-15"];
        let mut store = TaskStore::new();

        for round in 0..24usize {
            let day = days[round % days.len()];
            store = if round % 3 == 2 {
                store.remove_task(key(day), round % 2)
            } else {
                store.add_task(day, &format!("task {round}"), None)
            };
            assert!(store.days().all(|(_, tasks)| !tasks.is_empty()));
        }

        for day in days {
            while store.tasks(key(day)).is_some() {
                store = store.remove_task(key(day), 0);
                assert!(store.days().all(|(_, tasks)| !tasks.is_empty()));
            }
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_days_are_listed_chronologically() {
        let store = TaskStore::new()
            .add_task("2024-12-01", "December", None)
            .add_task("2024-01-09", "January", None)
            .add_task("2024-06-15", "June", None);

        let dates: Vec<String> = store.days().map(|(date, _)| date.to_string()).collect();

        assert_eq!(dates, vec!["2024-01-09", "2024-06-15", "2024-12-01"]);
    }

    #[test]
    fn test_serialize_round_trip() {
        let store = TaskStore::new()
            .add_task(DAY, "Buy milk", None)
            .add_task(DAY, "Dentist", time("14:15"))
            .add_task("2024-07-01", "Holiday", None)
            .toggle_completed(key(DAY), 1);

        let restored = TaskStore::deserialize(Some(&store.serialize()));

        assert_eq!(restored, store);
        assert_eq!(TaskStore::deserialize(Some(&TaskStore::new().serialize())), TaskStore::new());
    }

    #[test]
    fn test_serialized_shape() {
        let store = TaskStore::new().add_task(DAY, "Buy milk", time("08:00"));
        assert_eq!(
            store.serialize(),
            r#"{"2024-06-15":[{"text":"Buy milk","completed":false,"time":"08:00"}]}"#
        );
    }

    #[test]
    fn test_deserialize_absent_or_corrupt_is_empty() {
        assert!(TaskStore::deserialize(None).is_empty());
        assert!(TaskStore::deserialize(Some("")).is_empty());
        assert!(TaskStore::deserialize(Some("{ not json")).is_empty());
        assert!(TaskStore::deserialize(Some(r#"{"yesterday":[]}"#)).is_empty());
        assert!(TaskStore::deserialize(Some("[1,2,3]")).is_empty());
    }

    #[test]
    fn test_deserialize_restores_invariants() {
        let raw = r#"{
            "2024-06-15": [
                {"text": "Done", "completed": true},
                {"text": "   "},
                {"text": " Open ", "completed": false}
            ],
            "2024-06-16": []
        }"#;

        let store = TaskStore::deserialize(Some(raw));

        assert_eq!(store.day_count(), 1);
        assert_eq!(texts(&store, DAY), vec!["Open", "Done"]);
    }
}
