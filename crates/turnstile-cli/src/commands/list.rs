//! `turnstile list`: show the registries while tasks are parked.

use std::io::{self, Write};
use turnstile::{Runtime, RuntimeOptions};

pub fn execute(tasks: usize, trace: bool) -> anyhow::Result<()> {
    let mut options = RuntimeOptions::from_env();
    options.trace |= trace;
    let rt = Runtime::new(options);

    let progress = rt.semaphore_new("progress", 0);
    for i in 0..tasks {
        let (task_rt, progress) = (rt.clone(), progress.clone());
        rt.spawn(&format!("parked {}", i + 1), move || {
            task_rt.semaphore_signal(&progress);
        });
    }

    {
        let mut out = io::stdout().lock();
        writeln!(out, "Tasks:")?;
        rt.list_tasks(&mut out)?;
        writeln!(out)?;
        writeln!(out, "Semaphores:")?;
        rt.list_semaphores(&mut out)?;
    }

    rt.run_all_threads();
    anyhow::ensure!(
        progress.value() == tasks,
        "{} of {} tasks signalled",
        progress.value(),
        tasks
    );
    rt.semaphore_free(&progress);

    println!("Released {} tasks", tasks);
    Ok(())
}
