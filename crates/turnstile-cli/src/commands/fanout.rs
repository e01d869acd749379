//! `turnstile fanout`: every task spawns `width` children until `depth`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use turnstile::{Runtime, RuntimeOptions};

/// Nodes in a full tree below the root: width + width^2 + ... + width^depth
pub fn expected_nodes(width: usize, depth: usize) -> usize {
    (1..=depth).map(|level| width.pow(level as u32)).sum()
}

fn spawn_level(rt: &Runtime, prefix: &str, width: usize, depth: usize, visited: &Arc<AtomicUsize>) {
    if depth == 0 {
        return;
    }
    for child in 0..width {
        let name = format!("{}.{}", prefix, child);
        let task_rt = rt.clone();
        let visited = visited.clone();
        let child_prefix = name.clone();
        rt.spawn(&name, move || {
            visited.fetch_add(1, Ordering::SeqCst);
            spawn_level(&task_rt, &child_prefix, width, depth - 1, &visited);
        });
    }
}

pub fn execute(width: usize, depth: usize, trace: bool) -> anyhow::Result<()> {
    let mut options = RuntimeOptions::from_env();
    options.trace |= trace;
    let rt = Runtime::new(options);

    let visited = Arc::new(AtomicUsize::new(0));
    spawn_level(&rt, "t", width, depth, &visited);
    rt.run_all_threads();

    let ran = visited.load(Ordering::SeqCst);
    let expected = expected_nodes(width, depth);
    anyhow::ensure!(ran == expected, "{} of {} tasks ran", ran, expected);
    anyhow::ensure!(
        rt.task_count() == 1,
        "{} tasks still registered after join",
        rt.task_count()
    );

    println!("{} tasks ran (width {}, depth {})", ran, width, depth);
    Ok(())
}
