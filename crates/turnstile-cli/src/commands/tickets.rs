//! `turnstile tickets`: agents selling from a shared ticket pool.
//!
//! Uses the process-wide package: a semaphore serves as the lock on the
//! pool, and the shared random generator is only touched under `protect!`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use turnstile::{global, protect, Word};

/// Longest pause, in microseconds, an agent takes between sales
const MAX_PAUSE_MICROS: u64 = 2_000;

pub struct TicketOptions {
    pub agents: usize,
    pub tickets: usize,
    pub seed: u64,
    pub trace: bool,
}

pub fn execute(options: TicketOptions) -> anyhow::Result<()> {
    anyhow::ensure!(options.agents > 0, "at least one agent is required");

    global::init(options.trace);

    let remaining = Arc::new(AtomicUsize::new(options.tickets));
    let sold: Arc<Vec<AtomicUsize>> =
        Arc::new((0..options.agents).map(|_| AtomicUsize::new(0)).collect());
    let rng = Arc::new(Mutex::new(StdRng::seed_from_u64(options.seed)));
    let pool_lock = global::semaphore_new("ticket pool", 1);

    for agent in 0..options.agents {
        let remaining = remaining.clone();
        let sold = sold.clone();
        let rng = rng.clone();
        let pool_lock = pool_lock.clone();

        global::spawn_with_args(
            &format!("Agent {}", agent + 1),
            move |args: &[Word]| {
                let me = args[0];
                loop {
                    let pause = protect! {
                        rng.lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .gen_range(0..=MAX_PAUSE_MICROS)
                    };
                    global::sleep_micros(pause);

                    global::semaphore_wait(&pool_lock);
                    let left = remaining.load(Ordering::Relaxed);
                    if left == 0 {
                        global::semaphore_signal(&pool_lock);
                        break;
                    }
                    remaining.store(left - 1, Ordering::Relaxed);
                    sold[me].fetch_add(1, Ordering::Relaxed);
                    println!("{} sold one ({} left)", global::current_task_name(), left - 1);
                    global::semaphore_signal(&pool_lock);
                }
                println!("{} notices all tickets sold and goes home", global::current_task_name());
            },
            &[agent],
        );
    }

    global::run_all_threads();
    global::semaphore_free(&pool_lock);

    let total: usize = sold.iter().map(|count| count.load(Ordering::Relaxed)).sum();
    for (agent, count) in sold.iter().enumerate() {
        println!("Agent {:<3} {:>4}", agent + 1, count.load(Ordering::Relaxed));
    }
    anyhow::ensure!(
        total == options.tickets,
        "sold {} tickets out of {}",
        total,
        options.tickets
    );
    println!("All done! {} tickets sold by {} agents", total, options.agents);

    Ok(())
}
