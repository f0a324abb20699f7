// ── Status store ──

mod cache;

pub use cache::StatusCache;
