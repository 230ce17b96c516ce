use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// One decoded-payload dispatch job: "parse the next frame, classify, and
/// route it", queued by the producer thread and run by a worker. Jobs are
/// independent; nothing about the pool promises order between them.
pub type Job = Box<dyn FnOnce() + Send>;

struct Shared {
  queue: Mutex<VecDeque<Job>>,
  cvar: Condvar,
  stopping: AtomicBool,
}

/// Fixed-size pool of worker threads pulling jobs off a shared queue,
/// generalizing the `rx_queue`/`rx_cvar` pattern the teacher uses for its
/// single-slot receive queue to an N-worker job queue.
pub struct WorkerPool {
  shared: Arc<Shared>,
  handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
  pub fn new(size: usize) -> Self {
    let size = size.max(1);
    let shared = Arc::new(Shared {
      queue: Mutex::new(VecDeque::new()),
      cvar: Condvar::new(),
      stopping: AtomicBool::new(false),
    });
    let handles = (0..size)
      .map(|idx| {
        let shared = Arc::clone(&shared);
        thread::Builder::new()
          .name(format!("lsp-endpoint-worker-{idx}"))
          .spawn(move || worker_loop(shared))
          .expect("spawn worker thread")
      })
      .collect();
    WorkerPool { shared, handles }
  }

  pub fn submit(&self, job: Job) {
    if self.shared.stopping.load(Ordering::SeqCst) {
      return;
    }
    let mut queue = self.shared.queue.lock();
    queue.push_back(job);
    self.shared.cvar.notify_one();
  }

  /// Stops accepting new work, discards unstarted jobs, and joins every
  /// worker thread after its in-flight job (if any) completes. Matches the
  /// "best-effort drain" language in the shutdown sequence.
  pub fn shutdown(mut self) {
    self.shared.stopping.store(true, Ordering::SeqCst);
    self.shared.queue.lock().clear();
    self.shared.cvar.notify_all();
    for handle in self.handles.drain(..) {
      let _ = handle.join();
    }
  }
}

fn worker_loop(shared: Arc<Shared>) {
  loop {
    let job = {
      let mut queue = shared.queue.lock();
      loop {
        if let Some(job) = queue.pop_front() {
          break Some(job);
        }
        if shared.stopping.load(Ordering::SeqCst) {
          break None;
        }
        shared.cvar.wait(&mut queue);
      }
    };
    match job {
      Some(job) => job(),
      None => return,
    }
  }
}
