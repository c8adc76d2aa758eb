//! Task descriptor table

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::{TaskId, TASK_COUNT};

/// Descriptor of one task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskDescriptor {
    pub id: TaskId,
    pub name: &'static str,
    pub priority: u8,
    pub created: bool,
    /// Deepest stack usage seen, in bytes
    pub stack_high_water: u32,
}

impl TaskDescriptor {
    const fn new(id: TaskId) -> Self {
        Self {
            id,
            name: id.name(),
            priority: id.initial_priority(),
            created: false,
            stack_high_water: 0,
        }
    }
}

/// Registry errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskError {
    /// Task was already created once
    AlreadyCreated(TaskId),
    /// Operation needs a created task
    NotCreated(TaskId),
    /// Another task already runs at that priority
    PriorityInUse { task: TaskId, holder: TaskId },
}

/// Error from [`TaskRegistry::create`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CreateError<E> {
    Registry(TaskError),
    /// The executor refused the task
    Spawn(E),
}

impl<E> From<TaskError> for CreateError<E> {
    fn from(err: TaskError) -> Self {
        CreateError::Registry(err)
    }
}

/// Table of all task descriptors
pub struct TaskRegistry {
    table: Mutex<CriticalSectionRawMutex, RefCell<[TaskDescriptor; TASK_COUNT]>>,
}

impl TaskRegistry {
    pub const fn new() -> Self {
        Self {
            table: Mutex::new(RefCell::new([
                TaskDescriptor::new(TaskId::Shell),
                TaskDescriptor::new(TaskId::UdpEcho),
                TaskDescriptor::new(TaskId::Stats),
                TaskDescriptor::new(TaskId::StackMonitor),
            ])),
        }
    }

    /// Flip a descriptor to created; allowed exactly once per task
    pub fn mark_created(&self, id: TaskId) -> Result<(), TaskError> {
        self.table.lock(|cell| {
            let mut table = cell.borrow_mut();
            let entry = &mut table[id.index()];
            if entry.created {
                return Err(TaskError::AlreadyCreated(id));
            }
            entry.created = true;
            Ok(())
        })
    }

    /// Create a task through `spawn`, recording it in the table
    ///
    /// The descriptor only counts as created when `spawn` succeeds.
    pub fn create<E>(
        &self,
        id: TaskId,
        spawn: impl FnOnce() -> Result<(), E>,
    ) -> Result<(), CreateError<E>> {
        if self.get(id).created {
            return Err(TaskError::AlreadyCreated(id).into());
        }
        spawn().map_err(CreateError::Spawn)?;
        self.mark_created(id)?;
        Ok(())
    }

    /// Change a task's priority
    ///
    /// Priorities stay distinct across all tasks.
    pub fn set_priority(&self, id: TaskId, priority: u8) -> Result<(), TaskError> {
        self.table.lock(|cell| {
            let mut table = cell.borrow_mut();
            if !table[id.index()].created {
                return Err(TaskError::NotCreated(id));
            }
            if let Some(holder) = table
                .iter()
                .find(|d| d.id != id && d.priority == priority)
            {
                return Err(TaskError::PriorityInUse {
                    task: id,
                    holder: holder.id,
                });
            }
            table[id.index()].priority = priority;
            Ok(())
        })
    }

    /// Raise a task's recorded high-water mark; never lowers it
    pub fn record_high_water(&self, id: TaskId, bytes: u32) {
        self.table.lock(|cell| {
            let mut table = cell.borrow_mut();
            let entry = &mut table[id.index()];
            if entry.created && bytes > entry.stack_high_water {
                entry.stack_high_water = bytes;
            }
        });
    }

    pub fn get(&self, id: TaskId) -> TaskDescriptor {
        self.table.lock(|cell| cell.borrow()[id.index()])
    }

    /// Copy of the whole table
    pub fn snapshot(&self) -> [TaskDescriptor; TASK_COUNT] {
        self.table.lock(|cell| *cell.borrow())
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::priority;

    #[test]
    fn test_initial_priorities_are_distinct() {
        let registry = TaskRegistry::new();
        let table = registry.snapshot();
        for (i, a) in table.iter().enumerate() {
            assert!(!a.created);
            for b in &table[i + 1..] {
                assert_ne!(a.priority, b.priority);
            }
        }
    }

    #[test]
    fn test_create_only_once() {
        let registry = TaskRegistry::new();
        assert_eq!(registry.mark_created(TaskId::Stats), Ok(()));
        assert_eq!(
            registry.mark_created(TaskId::Stats),
            Err(TaskError::AlreadyCreated(TaskId::Stats))
        );
        assert!(registry.get(TaskId::Stats).created);
    }

    #[test]
    fn test_create_runs_spawn_once() {
        let registry = TaskRegistry::new();
        let mut spawned = 0;
        let result: Result<(), CreateError<()>> = registry.create(TaskId::UdpEcho, || {
            spawned += 1;
            Ok(())
        });
        assert_eq!(result, Ok(()));

        let again: Result<(), CreateError<()>> = registry.create(TaskId::UdpEcho, || {
            spawned += 1;
            Ok(())
        });
        assert_eq!(
            again,
            Err(CreateError::Registry(TaskError::AlreadyCreated(
                TaskId::UdpEcho
            )))
        );
        assert_eq!(spawned, 1);
    }

    #[test]
    fn test_failed_spawn_leaves_task_uncreated() {
        let registry = TaskRegistry::new();
        let result = registry.create(TaskId::Stats, || Err("busy"));
        assert_eq!(result, Err(CreateError::Spawn("busy")));
        assert!(!registry.get(TaskId::Stats).created);
    }

    #[test]
    fn test_lower_supervisor_priority() {
        let registry = TaskRegistry::new();
        registry.mark_created(TaskId::Shell).unwrap();
        assert_eq!(registry.get(TaskId::Shell).priority, priority::BOOT);

        registry
            .set_priority(TaskId::Shell, priority::SHELL)
            .unwrap();
        assert_eq!(registry.get(TaskId::Shell).priority, priority::SHELL);
    }

    #[test]
    fn test_priority_collision_rejected() {
        let registry = TaskRegistry::new();
        registry.mark_created(TaskId::Shell).unwrap();
        assert_eq!(
            registry.set_priority(TaskId::Shell, priority::UDP_ECHO),
            Err(TaskError::PriorityInUse {
                task: TaskId::Shell,
                holder: TaskId::UdpEcho
            })
        );
        assert_eq!(registry.get(TaskId::Shell).priority, priority::BOOT);
    }

    #[test]
    fn test_priority_change_needs_created_task() {
        let registry = TaskRegistry::new();
        assert_eq!(
            registry.set_priority(TaskId::Stats, 3),
            Err(TaskError::NotCreated(TaskId::Stats))
        );
    }

    #[test]
    fn test_high_water_is_monotonic() {
        let registry = TaskRegistry::new();
        registry.mark_created(TaskId::UdpEcho).unwrap();
        registry.record_high_water(TaskId::UdpEcho, 800);
        registry.record_high_water(TaskId::UdpEcho, 600);
        assert_eq!(registry.get(TaskId::UdpEcho).stack_high_water, 800);

        // Ignored until the task exists
        registry.record_high_water(TaskId::Stats, 900);
        assert_eq!(registry.get(TaskId::Stats).stack_high_water, 0);
    }
}
