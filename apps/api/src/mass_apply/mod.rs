// Mass apply: bulk resume processing.
// A fixed-size worker pool (pool) runs the per-resume pipeline (processor)
// while the coordinator chunks the submitted files, tracks progress, and
// persists all successful applications in one batch write (sink).

pub mod coordinator;
pub mod handlers;
pub mod pool;
pub mod processor;
pub mod progress;
pub mod sink;
