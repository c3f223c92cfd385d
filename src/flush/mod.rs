mod jsonl;
mod snapshot;

pub use jsonl::flush_to_jsonl;
pub use snapshot::CommunitySnapshot;
