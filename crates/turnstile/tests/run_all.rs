//! Integration tests for spawn, gate release and join-all

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use turnstile::{FatalPolicy, Runtime, RuntimeOptions, Word};

fn runtime() -> Runtime {
    Runtime::new(RuntimeOptions {
        fatal_policy: FatalPolicy::Panic,
        ..RuntimeOptions::default()
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Registry drains back to the initiating task
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_noop_tasks_leave_only_main() {
    for n in [0usize, 1, 2, 7, 32] {
        let rt = runtime();
        for i in 0..n {
            rt.spawn(&format!("noop-{}", i), || {});
        }
        assert_eq!(rt.task_count(), n + 1);

        rt.run_all_threads();
        assert_eq!(rt.task_count(), 1, "registry not drained for n = {}", n);
        assert_eq!(rt.live_tasks(), 0);
    }
}

#[test]
fn test_three_named_tasks_increment_counter() {
    let rt = runtime();
    let counter = Arc::new(AtomicUsize::new(0));

    for name in ["A", "B", "C"] {
        let counter = counter.clone();
        rt.spawn(name, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }
    rt.run_all_threads();

    assert_eq!(counter.load(Ordering::SeqCst), 3);
    assert_eq!(rt.task_count(), 1);
}

// ────────────────────────────────────────────────────────────────────────────
// Transitive completion
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_children_spawned_by_tasks_are_awaited() {
    const PARENTS: usize = 4;
    const CHILDREN: usize = 5;

    let rt = runtime();
    let finished = Arc::new(AtomicUsize::new(0));

    for p in 0..PARENTS {
        let task_rt = rt.clone();
        let finished = finished.clone();
        rt.spawn(&format!("parent-{}", p), move || {
            for c in 0..CHILDREN {
                let finished = finished.clone();
                task_rt.spawn(&format!("child-{}-{}", p, c), move || {
                    thread::sleep(Duration::from_millis(10));
                    finished.fetch_add(1, Ordering::SeqCst);
                });
            }
            // Parent returns at once; its children are still parked or running
            finished.fetch_add(1, Ordering::SeqCst);
        });
    }

    rt.run_all_threads();
    assert_eq!(finished.load(Ordering::SeqCst), PARENTS + PARENTS * CHILDREN);
    assert_eq!(rt.task_count(), 1);
}

fn spawn_tree(rt: &Runtime, depth: usize, width: usize, visited: &Arc<AtomicUsize>) {
    if depth == 0 {
        return;
    }
    for i in 0..width {
        let task_rt = rt.clone();
        let visited = visited.clone();
        rt.spawn(&format!("node-{}-{}", depth, i), move || {
            visited.fetch_add(1, Ordering::SeqCst);
            spawn_tree(&task_rt, depth - 1, width, &visited);
        });
    }
}

#[test]
fn test_deep_task_tree() {
    let rt = runtime();
    let visited = Arc::new(AtomicUsize::new(0));

    // 3 + 9 + 27 nodes
    spawn_tree(&rt, 3, 3, &visited);
    rt.run_all_threads();

    assert_eq!(visited.load(Ordering::SeqCst), 39);
    assert_eq!(rt.task_count(), 1);
}

// ────────────────────────────────────────────────────────────────────────────
// Names and arguments
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_each_task_sees_its_own_name() {
    let rt = runtime();
    let mismatches = Arc::new(AtomicUsize::new(0));

    for i in 0..10 {
        let name = format!("worker-{}", i);
        let expected = name.clone();
        let task_rt = rt.clone();
        let mismatches = mismatches.clone();
        rt.spawn(&name, move || {
            if task_rt.current_task_name() != expected {
                mismatches.fetch_add(1, Ordering::SeqCst);
            }
        });
    }
    rt.run_all_threads();
    assert_eq!(mismatches.load(Ordering::SeqCst), 0);
}

#[test]
fn test_word_args_carry_shared_state_index() {
    let rt = runtime();
    let slots: Arc<Vec<AtomicUsize>> = Arc::new((0..4).map(|_| AtomicUsize::new(0)).collect());

    for slot in 0..4 {
        let slots = slots.clone();
        rt.spawn_with_args(
            &format!("slot-{}", slot),
            move |args: &[Word]| {
                slots[args[0]].store(args[1], Ordering::SeqCst);
            },
            &[slot, slot * 10],
        );
    }
    rt.run_all_threads();

    let values: Vec<usize> = slots.iter().map(|v| v.load(Ordering::SeqCst)).collect();
    assert_eq!(values, vec![0, 10, 20, 30]);
}

#[test]
#[should_panic(expected = "at most 8 are supported")]
fn test_nine_args_rejected_at_spawn() {
    let rt = runtime();
    rt.spawn_with_args("nine", |_: &[Word]| {}, &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
}

// ────────────────────────────────────────────────────────────────────────────
// Gate behaviour
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_nothing_runs_before_release() {
    let rt = runtime();
    let started = Arc::new(AtomicUsize::new(0));

    for i in 0..8 {
        let started = started.clone();
        rt.spawn(&format!("gated-{}", i), move || {
            started.fetch_add(1, Ordering::SeqCst);
        });
    }

    thread::sleep(Duration::from_millis(50));
    assert_eq!(started.load(Ordering::SeqCst), 0);

    rt.release_all();
    rt.wait_for_all();
    assert_eq!(started.load(Ordering::SeqCst), 8);
}

#[test]
fn test_sleeping_tasks_finish_before_return() {
    let rt = runtime();
    let done = Arc::new(AtomicUsize::new(0));

    for i in 0..3 {
        let task_rt = rt.clone();
        let done = done.clone();
        rt.spawn(&format!("sleeper-{}", i), move || {
            task_rt.sleep_micros(5_000 * (i + 1) as u64);
            done.fetch_add(1, Ordering::SeqCst);
        });
    }
    rt.run_all_threads();
    assert_eq!(done.load(Ordering::SeqCst), 3);
}

#[test]
fn test_runtimes_are_isolated() {
    let first = runtime();
    let second = runtime();

    first.spawn("only-in-first", || {});
    assert_eq!(first.task_count(), 2);
    assert_eq!(second.task_count(), 1);

    second.run_all_threads();
    assert!(!first.is_released());
    first.run_all_threads();
    assert_eq!(first.task_count(), 1);
}
