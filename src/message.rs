//! Records handed to the dispatcher by the embedding host.

mod sink_record;

pub use sink_record::SinkRecord;
